//! Flush controller
//!
//! Drains the write buffer into the primary table and, depending on the
//! [`FlushMode`], reconciles the committed rows into the staging table.
//!
//! ## Reconciliation
//!
//! For every buffered key the primary row is read back and collapsed to one
//! version-less cell per column. That collapsed row is authoritative for
//! every column it holds. Columns present only in the buffered mutation are
//! added version-less with the buffered value.
//!
//! ## Failure semantics
//!
//! Every failure is logged where it happens and returned as a
//! [`FlushError`]. The buffer is cleared only after every write of the mode
//! succeeded; otherwise it is left exactly as it was.

use crate::buffer::WriteBuffer;
use crate::config::ConfigProvider;
use crate::connectors::ConnectorCache;
use crate::logging::LogSink;
use bhc_core::{
    ColumnId, ConfigError, ConnectorError, ErrorClass, PropertyName, RowKey, RowMutation,
    RowSnapshot,
};
use std::collections::BTreeSet;
use std::sync::Arc;
use thiserror::Error;
use tracing::debug;

/// Which tables a flush writes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlushMode {
    /// Commit to the primary table only
    Plain,
    /// Commit to primary, then write the reconciled rows to staging
    Delta,
    /// Reconcile against primary and write to staging; primary is untouched
    StagingOnly,
}

impl FlushMode {
    /// Whether the mode commits the buffer to the primary table
    pub fn writes_primary(&self) -> bool {
        matches!(self, FlushMode::Plain | FlushMode::Delta)
    }

    /// Whether the mode writes reconciled rows to the staging table
    pub fn writes_staging(&self) -> bool {
        matches!(self, FlushMode::Delta | FlushMode::StagingOnly)
    }
}

/// Result of a successful flush
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlushOutcome {
    /// Nothing was buffered; no backend was touched
    Empty,
    /// Every write of the mode succeeded and the buffer was cleared
    Committed {
        /// Rows written to the primary table
        primary_rows: usize,
        /// Rows written to the staging table
        staging_rows: usize,
    },
}

/// Flush failures; the buffer is unchanged in every case
#[derive(Debug, Error)]
pub enum FlushError {
    /// A target table name is not configured
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Batch write to the primary table failed
    #[error("could not commit contacts to table {table}: {source}")]
    PrimaryCommit {
        /// Primary table
        table: String,
        /// Underlying failure
        #[source]
        source: ConnectorError,
    },

    /// Reading back a committed row failed
    #[error("could not read row {key} from table {table}: {source}")]
    ReadBack {
        /// Table read from
        table: String,
        /// Row being read
        key: RowKey,
        /// Underlying failure
        #[source]
        source: ConnectorError,
    },

    /// Batch write to the staging table failed
    #[error("could not commit reconciled contacts to table {table}: {source}")]
    StagingCommit {
        /// Staging table
        table: String,
        /// Underlying failure
        #[source]
        source: ConnectorError,
    },
}

impl FlushError {
    /// Classification the failure was logged under
    pub fn class(&self) -> ErrorClass {
        match self {
            FlushError::Config(_) => ErrorClass::Config,
            _ => ErrorClass::Store,
        }
    }
}

/// Table names a flush writes to
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlushTargets {
    /// Primary table
    pub primary: String,
    /// Staging table, resolved only for modes that write it
    pub staging: Option<String>,
}

impl FlushTargets {
    /// Resolve the tables `mode` needs; a missing name is logged by `config`
    pub fn resolve(config: &ConfigProvider, mode: FlushMode) -> Result<Self, ConfigError> {
        let primary = config.require(PropertyName::HbaseContactsTable)?.to_string();
        let staging = if mode.writes_staging() {
            Some(config.require(PropertyName::HbaseContactsTempTable)?.to_string())
        } else {
            None
        };
        Ok(Self { primary, staging })
    }
}

/// Merge a read-back row with the buffered mutation for the same key.
///
/// The result is version-less. Read-back columns win; columns only present
/// in `buffered` keep their newest buffered value.
pub fn reconcile(read_back: &RowSnapshot, buffered: &RowMutation) -> RowMutation {
    let mut merged = read_back.to_version_less();
    let stored: BTreeSet<ColumnId> = merged.cells().iter().map(|c| c.column()).collect();
    for cell in buffered.collapse().cells() {
        if !stored.contains(&cell.column()) {
            merged.push(cell.clone());
        }
    }
    merged
}

/// Drains a [`WriteBuffer`] through the cached store handle
pub struct FlushController {
    config: Arc<ConfigProvider>,
    log: Arc<dyn LogSink>,
}

impl FlushController {
    /// Controller resolving table names from `config`
    pub fn new(config: Arc<ConfigProvider>, log: Arc<dyn LogSink>) -> Self {
        Self { config, log }
    }

    /// Flush `buffer` according to `mode`.
    ///
    /// An empty buffer logs one data warning and touches no backend. Table
    /// names are resolved before anything is written.
    pub fn flush(
        &self,
        buffer: &mut WriteBuffer,
        connectors: &ConnectorCache,
        mode: FlushMode,
    ) -> Result<FlushOutcome, FlushError> {
        if buffer.is_empty() {
            self.log
                .warn(ErrorClass::Data, "No contacts to write: the write buffer is empty");
            return Ok(FlushOutcome::Empty);
        }

        let targets = FlushTargets::resolve(&self.config, mode)?;
        let batch = buffer.mutations();
        let store = connectors.store();
        let mut store = store.lock();

        let mut primary_rows = 0;
        if mode.writes_primary() {
            store.set_table(&targets.primary);
            if let Err(source) = store.multi_put(&batch) {
                return Err(self.fail(FlushError::PrimaryCommit {
                    table: targets.primary,
                    source,
                }));
            }
            primary_rows = batch.len();
            debug!(
                target: "bhc::flush",
                table = %targets.primary,
                rows = primary_rows,
                "committed"
            );
        }

        let mut staging_rows = 0;
        if let Some(staging) = targets.staging {
            store.set_table(&targets.primary);
            let mut reconciled = Vec::with_capacity(batch.len());
            for mutation in &batch {
                match store.get_row(mutation.key()) {
                    Ok(snapshot) => reconciled.push(reconcile(&snapshot, mutation)),
                    Err(source) => {
                        return Err(self.fail(FlushError::ReadBack {
                            table: targets.primary,
                            key: mutation.key().clone(),
                            source,
                        }));
                    }
                }
            }

            store.set_table(&staging);
            if let Err(source) = store.multi_put(&reconciled) {
                return Err(self.fail(FlushError::StagingCommit {
                    table: staging,
                    source,
                }));
            }
            staging_rows = reconciled.len();
            debug!(target: "bhc::flush", table = %staging, rows = staging_rows, "committed");
        }

        buffer.reset();
        Ok(FlushOutcome::Committed {
            primary_rows,
            staging_rows,
        })
    }

    fn fail(&self, err: FlushError) -> FlushError {
        self.log.error(err.class(), &err.to_string());
        err
    }
}
