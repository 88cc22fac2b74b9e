//! Cartography load
//!
//! The cartography maps an identifier to the set of (strategy, template)
//! pairs that apply to it. It is read once from a stored procedure in the
//! cartography database and never modified afterwards.

use crate::config::ConfigProvider;
use crate::error::{ContextError, ContextResult};
use crate::logging::LogSink;
use bhc_connectors::{ConnectorFactory, SqlRow};
use bhc_core::{CartographyEntry, ErrorClass, PropertyName};
use std::collections::{BTreeSet, HashMap};
use tracing::debug;

/// Identifier to every entry registered for it
pub type CartographyMap = HashMap<String, BTreeSet<CartographyEntry>>;

const ID_COLUMN: usize = 0;
const TEMPLATE_COLUMN: usize = 1;
const STRATEGY_COLUMN: usize = 2;

/// Load the cartography over a one-shot connection.
///
/// The connection is closed once the rows are read. Rows with a null id
/// are skipped with a data warning; null template or strategy read as "".
pub(crate) fn load(
    config: &ConfigProvider,
    factory: &dyn ConnectorFactory,
    log: &dyn LogSink,
) -> ContextResult<CartographyMap> {
    let procedure = config.require(PropertyName::SqlServerCartographyProcedure)?;
    let params = config.sql_params(PropertyName::SqlServerCartographyDb);

    let mut connection = factory.relational(&params);
    let fetched = connection
        .connect()
        .and_then(|()| connection.procedure(procedure));
    if let Err(e) = connection.disconnect() {
        log.error(
            ErrorClass::Relational,
            &format!("Unable to close cartography connection: {}", e),
        );
    }

    let rows = fetched.map_err(|e| {
        let message = format!("Unable to load cartography from {}: {}", procedure, e);
        log.error(ErrorClass::Relational, &message);
        ContextError::Cartography(message)
    })?;

    let map = build(&rows, log);
    debug!(target: "bhc::context", ids = map.len(), "cartography loaded");
    Ok(map)
}

fn build(rows: &[SqlRow], log: &dyn LogSink) -> CartographyMap {
    let mut map = CartographyMap::new();
    for (index, row) in rows.iter().enumerate() {
        let Some(id) = row.get(ID_COLUMN) else {
            log.warn(
                ErrorClass::Data,
                &format!("Cartography row {} has no identifier, skipped", index),
            );
            continue;
        };
        let entry = CartographyEntry::new(
            id,
            row.get(STRATEGY_COLUMN).unwrap_or_default(),
            row.get(TEMPLATE_COLUMN).unwrap_or_default(),
        );
        map.entry(id.to_string()).or_default().insert(entry);
    }
    map
}
