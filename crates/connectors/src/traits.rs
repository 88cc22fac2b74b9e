//! Connector trait definitions.
//!
//! Every connector is a blocking client. Handles are created once per
//! backend kind and shared behind a mutex by the engine, so all traits
//! require `Send`.

use bhc_core::{ConnectorResult, RowKey, RowMutation, RowSnapshot};
use std::io;

/// Primary row store client.
pub trait StoreConnector: Send {
    /// Establish the connection.
    fn connect(&mut self) -> ConnectorResult<()>;

    /// Close the connection.
    fn disconnect(&mut self) -> ConnectorResult<()>;

    /// Whether the last `connect` succeeded and no `disconnect` followed.
    fn is_connected(&self) -> bool;

    /// Select the table subsequent reads and writes target.
    fn set_table(&mut self, table: &str);

    /// Currently selected table.
    fn table(&self) -> Option<&str>;

    /// Write a batch of row mutations to the current table.
    ///
    /// The batch is submitted as one unit: on error the caller must assume
    /// none of it is durable.
    fn multi_put(&mut self, batch: &[RowMutation]) -> ConnectorResult<()>;

    /// Read every stored version of a row from the current table.
    ///
    /// An absent row is returned as an empty snapshot, not an error. A row
    /// written by a successful `multi_put` must be visible to the next call.
    fn get_row(&self, key: &RowKey) -> ConnectorResult<RowSnapshot>;
}

/// Writable stream returned by [`FilesystemConnector::open_appender`].
///
/// Writes are buffered; `flush` makes them visible to readers of the file.
pub trait AppendStream: io::Write + Send {
    /// Flush and close the stream. Writes after `close` fail.
    fn close(&mut self) -> io::Result<()>;

    /// Whether `close` has succeeded.
    fn is_closed(&self) -> bool;
}

/// Distributed filesystem client.
pub trait FilesystemConnector: Send {
    /// Establish the connection.
    fn connect(&mut self) -> ConnectorResult<()>;

    /// Close the connection.
    fn disconnect(&mut self) -> ConnectorResult<()>;

    /// Whether the connector is usable.
    fn is_connected(&self) -> bool;

    /// Open `path` for appending, creating it if needed.
    fn open_appender(&mut self, path: &str) -> ConnectorResult<Box<dyn AppendStream>>;

    /// Rewrite `path` in place keeping only the first occurrence of each line.
    ///
    /// Returns the number of lines removed. Not safe while writers are
    /// still appending to the file.
    fn remove_duplicate_lines(&mut self, path: &str) -> ConnectorResult<usize>;
}

/// One row of a relational result set.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SqlRow {
    columns: Vec<Option<String>>,
}

impl SqlRow {
    /// Create a row from column values.
    pub fn new(columns: Vec<Option<String>>) -> Self {
        Self { columns }
    }

    /// Create a row whose columns are all non-null.
    pub fn from_strs(columns: &[&str]) -> Self {
        Self {
            columns: columns.iter().map(|c| Some(c.to_string())).collect(),
        }
    }

    /// Column value by zero-based index; `None` for SQL NULL or out of range.
    pub fn get(&self, index: usize) -> Option<&str> {
        self.columns.get(index).and_then(|c| c.as_deref())
    }

    /// Number of columns.
    pub fn len(&self) -> usize {
        self.columns.len()
    }

    /// Whether the row has no columns.
    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }
}

/// Relational reporting store client.
pub trait RelationalConnector: Send {
    /// Establish the connection.
    fn connect(&mut self) -> ConnectorResult<()>;

    /// Close the connection.
    fn disconnect(&mut self) -> ConnectorResult<()>;

    /// Whether the connector is usable.
    fn is_connected(&self) -> bool;

    /// Execute a stored procedure and collect its result rows.
    fn procedure(&mut self, name: &str) -> ConnectorResult<Vec<SqlRow>>;

    /// Execute a data-modifying statement; returns affected row count.
    fn execute_update(&mut self, sql: &str) -> ConnectorResult<u64>;
}

/// Message queue client.
pub trait QueueConnector: Send {
    /// Establish the connection.
    fn connect(&mut self) -> ConnectorResult<()>;

    /// Close the connection.
    fn disconnect(&mut self) -> ConnectorResult<()>;

    /// Whether the connector is usable.
    fn is_connected(&self) -> bool;

    /// Select the topic produced to.
    fn set_topic(&mut self, topic: &str);

    /// Currently selected topic.
    fn topic(&self) -> Option<&str>;
}
