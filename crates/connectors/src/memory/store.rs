//! In-memory multi-version row store.

use crate::traits::StoreConnector;
use bhc_core::{
    Cell, ConnectorError, ConnectorResult, KerberosParams, RowKey, RowMutation, RowSnapshot,
};
use parking_lot::Mutex;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::Arc;

const BACKEND: &str = "store";

/// Failures to inject into the store.
#[derive(Debug, Default)]
pub struct StoreFaults {
    /// `connect` fails
    pub fail_connect: bool,
    /// `disconnect` fails
    pub fail_disconnect: bool,
    /// `multi_put` fails when targeting one of these tables
    pub fail_put_tables: HashSet<String>,
    /// `get_row` fails
    pub fail_get: bool,
}

/// Store contents and call history.
#[derive(Debug, Default)]
pub struct StoreState {
    /// table -> row -> every stored cell version
    pub tables: HashMap<String, BTreeMap<RowKey, Vec<Cell>>>,
    /// Successful `multi_put` calls as (table, batch size)
    pub puts: Vec<(String, usize)>,
    /// Number of `get_row` calls
    pub reads: usize,
    /// Number of successful connects
    pub connects: usize,
    /// Number of disconnect attempts
    pub disconnects: usize,
    /// Parameters of every connector built by the factory
    pub constructed: Vec<KerberosParams>,
    /// Injected failures
    pub faults: StoreFaults,
    clock: u64,
}

impl StoreState {
    /// Latest snapshot of a row as the store would return it.
    pub fn row(&self, table: &str, key: &str) -> RowSnapshot {
        let key = RowKey::from(key);
        let cells = self
            .tables
            .get(table)
            .and_then(|t| t.get(&key))
            .cloned()
            .unwrap_or_default();
        RowSnapshot::new(key, cells)
    }

    /// Number of rows in a table.
    pub fn row_count(&self, table: &str) -> usize {
        self.tables.get(table).map_or(0, BTreeMap::len)
    }

    /// Seed a stored cell directly, bypassing `multi_put`.
    pub fn seed(&mut self, table: &str, key: &str, cell: Cell) {
        let version = match cell.version {
            Some(v) => v,
            None => self.tick(),
        };
        let cells = self
            .tables
            .entry(table.to_string())
            .or_default()
            .entry(RowKey::from(key))
            .or_default();
        store_cell(
            cells,
            Cell {
                version: Some(version),
                ..cell
            },
        );
    }

    fn tick(&mut self) -> u64 {
        self.clock += 1;
        self.clock
    }
}

/// Store a cell, replacing any cell with the same column and version.
fn store_cell(cells: &mut Vec<Cell>, cell: Cell) {
    cells.retain(|c| {
        !(c.family == cell.family && c.qualifier == cell.qualifier && c.version == cell.version)
    });
    cells.push(cell);
}

/// [`StoreConnector`] over [`StoreState`].
pub struct MemoryStore {
    state: Arc<Mutex<StoreState>>,
    table: Option<String>,
    connected: bool,
}

impl MemoryStore {
    /// Connector over shared state.
    pub fn new(state: Arc<Mutex<StoreState>>) -> Self {
        Self {
            state,
            table: None,
            connected: false,
        }
    }

    fn target(&self) -> ConnectorResult<&str> {
        if !self.connected {
            return Err(ConnectorError::NotConnected { backend: BACKEND });
        }
        self.table.as_deref().ok_or(ConnectorError::TableNotSet)
    }
}

impl StoreConnector for MemoryStore {
    fn connect(&mut self) -> ConnectorResult<()> {
        let mut state = self.state.lock();
        if state.faults.fail_connect {
            return Err(ConnectorError::connect(BACKEND, "injected connect failure"));
        }
        state.connects += 1;
        self.connected = true;
        Ok(())
    }

    fn disconnect(&mut self) -> ConnectorResult<()> {
        let mut state = self.state.lock();
        state.disconnects += 1;
        if state.faults.fail_disconnect {
            return Err(ConnectorError::injected("store disconnect"));
        }
        self.connected = false;
        Ok(())
    }

    fn is_connected(&self) -> bool {
        self.connected
    }

    fn set_table(&mut self, table: &str) {
        self.table = Some(table.to_string());
    }

    fn table(&self) -> Option<&str> {
        self.table.as_deref()
    }

    fn multi_put(&mut self, batch: &[RowMutation]) -> ConnectorResult<()> {
        let table = self.target()?.to_string();
        let mut state = self.state.lock();
        if state.faults.fail_put_tables.contains(&table) {
            return Err(ConnectorError::injected(format!("multi_put on {}", table)));
        }

        for mutation in batch {
            // One server timestamp per mutation, as a real region server would
            let stamp = state.tick();
            let rows = state.tables.entry(table.clone()).or_default();
            let cells = rows.entry(mutation.key().clone()).or_default();
            for cell in mutation.cells() {
                store_cell(
                    cells,
                    Cell {
                        version: Some(cell.version.unwrap_or(stamp)),
                        ..cell.clone()
                    },
                );
            }
        }
        state.puts.push((table, batch.len()));
        Ok(())
    }

    fn get_row(&self, key: &RowKey) -> ConnectorResult<RowSnapshot> {
        let table = self.target()?;
        let mut state = self.state.lock();
        state.reads += 1;
        if state.faults.fail_get {
            return Err(ConnectorError::injected(format!("get_row {}", key)));
        }
        Ok(state.row(table, key.as_str()))
    }
}
