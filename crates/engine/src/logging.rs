//! Log sinks and the logger cache
//!
//! Every failure in the engine is reported through a [`LogSink`] with an
//! [`ErrorClass`]. The production sink is [`ProcessLogger`], which emits
//! `tracing` events tagged with the originating component and logical
//! process. Loggers are cached per `(component, process)` pair by
//! [`LoggerRegistry`].

use bhc_core::ErrorClass;
use dashmap::DashMap;
use std::sync::Arc;
use tracing::{error, warn};

/// Fire-and-forget failure reporting.
///
/// Implementations must never panic or block on I/O failures of their own.
pub trait LogSink: Send + Sync {
    /// Report an error.
    fn error(&self, class: ErrorClass, message: &str);

    /// Report a warning.
    fn warn(&self, class: ErrorClass, message: &str);
}

/// Where log events are routed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogDestination {
    /// Operator console
    Console,
    /// Durable log collected with the batch outputs
    Durable,
}

impl LogDestination {
    /// Destination named by the `application.logs` property.
    ///
    /// `"console"` selects the console; any other value selects the durable
    /// log. An absent property falls back to the console.
    pub fn from_property(value: Option<&str>) -> Self {
        match value {
            Some("console") | None => LogDestination::Console,
            Some(_) => LogDestination::Durable,
        }
    }
}

/// Logger bound to one component and one logical process
#[derive(Debug)]
pub struct ProcessLogger {
    component: String,
    process: String,
    destination: LogDestination,
}

impl ProcessLogger {
    /// Create a logger
    pub fn new(
        component: impl Into<String>,
        process: impl Into<String>,
        destination: LogDestination,
    ) -> Self {
        Self {
            component: component.into(),
            process: process.into(),
            destination,
        }
    }

    /// Originating component
    pub fn component(&self) -> &str {
        &self.component
    }

    /// Logical process name
    pub fn process(&self) -> &str {
        &self.process
    }

    /// Destination
    pub fn destination(&self) -> LogDestination {
        self.destination
    }
}

impl LogSink for ProcessLogger {
    fn error(&self, class: ErrorClass, message: &str) {
        match self.destination {
            LogDestination::Console => error!(
                target: "bhc::console",
                classification = %class,
                component = %self.component,
                process = %self.process,
                "{}",
                message
            ),
            LogDestination::Durable => error!(
                target: "bhc::durable",
                classification = %class,
                component = %self.component,
                process = %self.process,
                "{}",
                message
            ),
        }
    }

    fn warn(&self, class: ErrorClass, message: &str) {
        match self.destination {
            LogDestination::Console => warn!(
                target: "bhc::console",
                classification = %class,
                component = %self.component,
                process = %self.process,
                "{}",
                message
            ),
            LogDestination::Durable => warn!(
                target: "bhc::durable",
                classification = %class,
                component = %self.component,
                process = %self.process,
                "{}",
                message
            ),
        }
    }
}

/// Cache of loggers keyed by `(component, process)`
///
/// Requesting the same pair twice returns the same `Arc`.
#[derive(Debug)]
pub struct LoggerRegistry {
    destination: LogDestination,
    loggers: DashMap<(String, String), Arc<ProcessLogger>>,
}

impl LoggerRegistry {
    /// Registry whose loggers all route to `destination`
    pub fn new(destination: LogDestination) -> Self {
        Self {
            destination,
            loggers: DashMap::new(),
        }
    }

    /// Destination of every logger built by this registry
    pub fn destination(&self) -> LogDestination {
        self.destination
    }

    /// Cached logger for a component and process
    pub fn get(&self, component: &str, process: &str) -> Arc<ProcessLogger> {
        let key = (component.to_string(), process.to_string());
        let entry = self
            .loggers
            .entry(key)
            .or_insert_with(|| Arc::new(ProcessLogger::new(component, process, self.destination)));
        Arc::clone(entry.value())
    }

    /// Cached logger for a component identified by type
    pub fn for_type<T: ?Sized>(&self, process: &str) -> Arc<ProcessLogger> {
        self.get(std::any::type_name::<T>(), process)
    }

    /// Number of cached loggers
    pub fn len(&self) -> usize {
        self.loggers.len()
    }

    /// Whether no logger has been requested yet
    pub fn is_empty(&self) -> bool {
        self.loggers.is_empty()
    }
}
