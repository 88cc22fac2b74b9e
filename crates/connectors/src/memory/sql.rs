//! In-memory relational store.

use crate::traits::{RelationalConnector, SqlRow};
use bhc_core::{ConnectorError, ConnectorResult, SqlParams};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;

const BACKEND: &str = "relational";

/// Failures to inject into the relational store.
#[derive(Debug, Default)]
pub struct SqlFaults {
    /// `connect` fails
    pub fail_connect: bool,
    /// `disconnect` fails
    pub fail_disconnect: bool,
    /// `procedure` fails
    pub fail_procedure: bool,
    /// `execute_update` fails
    pub fail_update: bool,
}

/// A statement that reached the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutedStatement {
    /// Index into [`SqlState::constructed`] of the connector that ran it
    pub connection: usize,
    /// Database the connector targeted
    pub database: Option<String>,
    /// Statement text
    pub sql: String,
}

/// Procedures, executed statements and call history.
#[derive(Debug, Default)]
pub struct SqlState {
    /// Stored procedure name -> result rows
    pub procedures: HashMap<String, Vec<SqlRow>>,
    /// Statements accepted by `execute_update`, in order
    pub executed: Vec<ExecutedStatement>,
    /// Parameters of every connector built by the factory
    pub constructed: Vec<SqlParams>,
    /// Number of successful connects
    pub connects: usize,
    /// Number of disconnect attempts
    pub disconnects: usize,
    /// Injected failures
    pub faults: SqlFaults,
}

/// [`RelationalConnector`] over [`SqlState`].
pub struct MemoryRelational {
    state: Arc<Mutex<SqlState>>,
    params: SqlParams,
    connection: usize,
    connected: bool,
}

impl MemoryRelational {
    /// Connector over shared state.
    ///
    /// Must be called after `params` has been recorded in
    /// [`SqlState::constructed`]; the connector identifies itself by that index.
    pub fn new(state: Arc<Mutex<SqlState>>, params: SqlParams) -> Self {
        let connection = state.lock().constructed.len().saturating_sub(1);
        Self {
            state,
            params,
            connection,
            connected: false,
        }
    }

    fn ensure_connected(&self) -> ConnectorResult<()> {
        if self.connected {
            Ok(())
        } else {
            Err(ConnectorError::NotConnected { backend: BACKEND })
        }
    }
}

impl RelationalConnector for MemoryRelational {
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
            return Err(ConnectorError::injected("relational disconnect"));
        }
        self.connected = false;
        Ok(())
    }

    fn is_connected(&self) -> bool {
        self.connected
    }

    fn procedure(&mut self, name: &str) -> ConnectorResult<Vec<SqlRow>> {
        self.ensure_connected()?;
        let state = self.state.lock();
        if state.faults.fail_procedure {
            return Err(ConnectorError::Sql(format!("procedure {} failed", name)));
        }
        state
            .procedures
            .get(name)
            .cloned()
            .ok_or_else(|| ConnectorError::Sql(format!("unknown procedure {}", name)))
    }

    fn execute_update(&mut self, sql: &str) -> ConnectorResult<u64> {
        self.ensure_connected()?;
        let mut state = self.state.lock();
        if state.faults.fail_update {
            return Err(ConnectorError::Sql("update rejected".to_string()));
        }
        state.executed.push(ExecutedStatement {
            connection: self.connection,
            database: self.params.database.clone(),
            sql: sql.to_string(),
        });
        Ok(1)
    }
}
