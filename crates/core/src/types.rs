//! Row model of the primary store
//!
//! This module defines the foundational types:
//! - RowKey: string row identifier
//! - Cell: one column value, optionally pinned to a version
//! - RowMutation: pending write against one row
//! - RowSnapshot: every stored version of a row, as returned by read-back
//! - CartographyEntry: reference mapping row from the relational store

use std::collections::BTreeMap;
use std::fmt;

/// Row identifier in the primary store
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RowKey(String);

impl RowKey {
    /// Create a row key
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    /// Borrow the key as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for RowKey {
    fn from(key: &str) -> Self {
        Self(key.to_string())
    }
}

impl From<String> for RowKey {
    fn from(key: String) -> Self {
        Self(key)
    }
}

impl fmt::Display for RowKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Column identity: (family, qualifier)
pub type ColumnId = (String, String);

/// One column value
///
/// A cell with `version == None` is version-less: the store stamps it with
/// its own version at write time.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Cell {
    /// Column family
    pub family: String,
    /// Column qualifier
    pub qualifier: String,
    /// Explicit version, if any
    pub version: Option<u64>,
    /// Raw value
    pub value: Vec<u8>,
}

impl Cell {
    /// Create a version-less cell
    pub fn new(
        family: impl Into<String>,
        qualifier: impl Into<String>,
        value: impl Into<Vec<u8>>,
    ) -> Self {
        Self {
            family: family.into(),
            qualifier: qualifier.into(),
            version: None,
            value: value.into(),
        }
    }

    /// Create a cell pinned to an explicit version
    pub fn versioned(
        family: impl Into<String>,
        qualifier: impl Into<String>,
        version: u64,
        value: impl Into<Vec<u8>>,
    ) -> Self {
        Self {
            version: Some(version),
            ..Self::new(family, qualifier, value)
        }
    }

    /// Column identity of this cell
    pub fn column(&self) -> ColumnId {
        (self.family.clone(), self.qualifier.clone())
    }

    /// Copy of this cell with the version stripped
    pub fn without_version(&self) -> Cell {
        Cell {
            version: None,
            ..self.clone()
        }
    }
}

/// Keep the newest of `cells` per column.
///
/// A version-less cell outranks any explicit version since the store will
/// stamp it at write time. Ties go to the later cell in the list.
fn newest_per_column<'a>(cells: impl Iterator<Item = &'a Cell>) -> BTreeMap<ColumnId, &'a Cell> {
    let mut newest: BTreeMap<ColumnId, &Cell> = BTreeMap::new();
    for cell in cells {
        let column = cell.column();
        let replace = match newest.get(&column) {
            None => true,
            Some(current) => rank(cell) >= rank(current),
        };
        if replace {
            newest.insert(column, cell);
        }
    }
    newest
}

fn rank(cell: &Cell) -> (bool, u64) {
    match cell.version {
        None => (true, 0),
        Some(v) => (false, v),
    }
}

/// Pending write operation against one row of the primary store
///
/// Mutations for the same key are replaced in the write buffer, never merged.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RowMutation {
    key: RowKey,
    cells: Vec<Cell>,
}

impl RowMutation {
    /// Create an empty mutation for `key`
    pub fn new(key: impl Into<RowKey>) -> Self {
        Self {
            key: key.into(),
            cells: Vec::new(),
        }
    }

    /// Add a version-less cell
    pub fn with_cell(
        mut self,
        family: impl Into<String>,
        qualifier: impl Into<String>,
        value: impl Into<Vec<u8>>,
    ) -> Self {
        self.cells.push(Cell::new(family, qualifier, value));
        self
    }

    /// Add a cell pinned to an explicit version
    pub fn with_versioned_cell(
        mut self,
        family: impl Into<String>,
        qualifier: impl Into<String>,
        version: u64,
        value: impl Into<Vec<u8>>,
    ) -> Self {
        self.cells.push(Cell::versioned(family, qualifier, version, value));
        self
    }

    /// Append a cell
    pub fn push(&mut self, cell: Cell) {
        self.cells.push(cell);
    }

    /// Row key this mutation targets
    pub fn key(&self) -> &RowKey {
        &self.key
    }

    /// Cells in insertion order
    pub fn cells(&self) -> &[Cell] {
        &self.cells
    }

    /// Whether the mutation carries no cells
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Whether no cell carries an explicit version
    pub fn is_version_less(&self) -> bool {
        self.cells.iter().all(|c| c.version.is_none())
    }

    /// Collapse to one version-less cell per column, newest value kept
    pub fn collapse(&self) -> RowMutation {
        RowMutation {
            key: self.key.clone(),
            cells: newest_per_column(self.cells.iter())
                .into_values()
                .map(Cell::without_version)
                .collect(),
        }
    }
}

/// Stored state of one row: every version of every column
///
/// An absent row is an empty snapshot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RowSnapshot {
    key: RowKey,
    cells: Vec<Cell>,
}

impl RowSnapshot {
    /// Create a snapshot from stored cells
    pub fn new(key: impl Into<RowKey>, cells: Vec<Cell>) -> Self {
        Self {
            key: key.into(),
            cells,
        }
    }

    /// Empty snapshot for a row that does not exist
    pub fn empty(key: impl Into<RowKey>) -> Self {
        Self::new(key, Vec::new())
    }

    /// Row key
    pub fn key(&self) -> &RowKey {
        &self.key
    }

    /// All stored cells, every version
    pub fn cells(&self) -> &[Cell] {
        &self.cells
    }

    /// Whether the row exists
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Latest stored value for a column
    pub fn latest(&self, family: &str, qualifier: &str) -> Option<&Cell> {
        self.cells
            .iter()
            .filter(|c| c.family == family && c.qualifier == qualifier)
            .max_by_key(|c| rank(c))
    }

    /// Collapse to a version-less mutation holding the latest value per column
    pub fn to_version_less(&self) -> RowMutation {
        RowMutation {
            key: self.key.clone(),
            cells: newest_per_column(self.cells.iter())
                .into_values()
                .map(Cell::without_version)
                .collect(),
        }
    }
}

/// Reference mapping: an identifier associated with a strategy and a template
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CartographyEntry {
    /// Identifier (multimap key)
    pub id: String,
    /// Processing strategy
    pub strategy: String,
    /// Template string
    pub template: String,
}

impl CartographyEntry {
    /// Create an entry
    pub fn new(
        id: impl Into<String>,
        strategy: impl Into<String>,
        template: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            strategy: strategy.into(),
            template: template.into(),
        }
    }
}
