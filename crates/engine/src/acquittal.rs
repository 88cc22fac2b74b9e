//! Acquittal reporting
//!
//! An acquittal is the completion marker a batch job writes into the
//! reporting store once it has processed a target table.

use crate::config::ConfigProvider;
use crate::connectors::ConnectorCache;
use crate::error::{ContextError, ContextResult};
use crate::logging::LogSink;
use bhc_connectors::RelationalConnector;
use bhc_core::{ConnectorResult, Environment, ErrorClass, PropertyName, SqlParams};
use chrono::NaiveDateTime;
use tracing::debug;

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.3f";

fn quote(value: &str) -> String {
    format!("'{}'", value.replace('\'', "''"))
}

/// Build the insert statement for one acquittal row
pub fn acquittal_statement(
    acquittal_table: &str,
    target_table: &str,
    action: &str,
    timestamp: NaiveDateTime,
) -> String {
    format!(
        "INSERT INTO {} (TABLE_CIBLE, ACTION, [DATE/HEURE]) VALUES({},{},{})",
        acquittal_table,
        quote(target_table),
        quote(action),
        quote(&timestamp.format(TIMESTAMP_FORMAT).to_string()),
    )
}

/// Writes acquittal rows for the current environment
pub struct AcquittalReporter<'a> {
    config: &'a ConfigProvider,
    connectors: &'a ConnectorCache,
    environment: &'a Environment,
    log: &'a dyn LogSink,
}

impl<'a> AcquittalReporter<'a> {
    /// Reporter over the context's configuration and connector cache
    pub fn new(
        config: &'a ConfigProvider,
        connectors: &'a ConnectorCache,
        environment: &'a Environment,
        log: &'a dyn LogSink,
    ) -> Self {
        Self {
            config,
            connectors,
            environment,
            log,
        }
    }

    /// Record that `action` completed on `table` at `timestamp`.
    ///
    /// In production the row is written over a fresh connection built from
    /// the override parameters, which is closed afterwards. Elsewhere the
    /// cached reporting handle is used. Failures are logged under
    /// [`ErrorClass::Relational`].
    pub fn report(
        &self,
        table: &str,
        action: &str,
        timestamp: NaiveDateTime,
    ) -> ContextResult<()> {
        let acquittal_table = self.config.require(PropertyName::SqlServerAcquittalTable)?;
        let sql = acquittal_statement(acquittal_table, table, action, timestamp);

        let written = match self.environment {
            Environment::Production { acquittal_override } => {
                self.write_bypassing_cache(acquittal_override, &sql)
            }
            Environment::Other(_) => self.connectors.relational().lock().execute_update(&sql),
        };

        match written {
            Ok(_) => {
                debug!(target: "bhc::context", table, action, "acquittal written");
                Ok(())
            }
            Err(e) => {
                self.log.error(
                    ErrorClass::Relational,
                    &format!("Could not write acquittal for table {}: {}", table, e),
                );
                Err(ContextError::Acquittal(e))
            }
        }
    }

    fn write_bypassing_cache(&self, params: &SqlParams, sql: &str) -> ConnectorResult<u64> {
        let mut connection: Box<dyn RelationalConnector> =
            self.connectors.factory().relational(params);
        if let Err(e) = connection.connect() {
            self.log.error(
                ErrorClass::Relational,
                &format!("Unable to open acquittal connection: {}", e),
            );
        }
        let written = connection.execute_update(sql);
        if let Err(e) = connection.disconnect() {
            self.log.error(
                ErrorClass::Relational,
                &format!("Unable to close acquittal connection: {}", e),
            );
        }
        written
    }
}
