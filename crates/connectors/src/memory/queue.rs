//! In-memory message queue.

use crate::traits::QueueConnector;
use bhc_core::{ConnectorError, ConnectorResult, QueueParams};
use parking_lot::Mutex;
use std::sync::Arc;

const BACKEND: &str = "queue";

/// Failures to inject into the queue.
#[derive(Debug, Default)]
pub struct QueueFaults {
    /// `connect` fails
    pub fail_connect: bool,
    /// `disconnect` fails
    pub fail_disconnect: bool,
}

/// Queue call history.
#[derive(Debug, Default)]
pub struct QueueState {
    /// Parameters of every connector built by the factory
    pub constructed: Vec<QueueParams>,
    /// Topics set, in order
    pub topics: Vec<String>,
    /// Number of successful connects
    pub connects: usize,
    /// Number of disconnect attempts
    pub disconnects: usize,
    /// Injected failures
    pub faults: QueueFaults,
}

/// [`QueueConnector`] over [`QueueState`].
pub struct MemoryQueue {
    state: Arc<Mutex<QueueState>>,
    topic: Option<String>,
    connected: bool,
}

impl MemoryQueue {
    /// Connector over shared state.
    pub fn new(state: Arc<Mutex<QueueState>>) -> Self {
        Self {
            state,
            topic: None,
            connected: false,
        }
    }
}

impl QueueConnector for MemoryQueue {
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
            return Err(ConnectorError::injected("queue disconnect"));
        }
        self.connected = false;
        Ok(())
    }

    fn is_connected(&self) -> bool {
        self.connected
    }

    fn set_topic(&mut self, topic: &str) {
        self.state.lock().topics.push(topic.to_string());
        self.topic = Some(topic.to_string());
    }

    fn topic(&self) -> Option<&str> {
        self.topic.as_deref()
    }
}
