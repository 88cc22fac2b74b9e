//! Test support: a log sink that records every event.
//!
//! Used by unit and integration tests to assert on what was logged and with
//! which classification.

use crate::logging::LogSink;
use bhc_core::ErrorClass;
use parking_lot::Mutex;

/// Severity of a recorded event
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    /// Recorded through [`LogSink::error`]
    Error,
    /// Recorded through [`LogSink::warn`]
    Warn,
}

/// One recorded event
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoggedEvent {
    /// Severity
    pub level: LogLevel,
    /// Classification
    pub class: ErrorClass,
    /// Free-text detail
    pub message: String,
}

/// [`LogSink`] keeping every event in memory
#[derive(Debug, Default)]
pub struct RecordingSink {
    events: Mutex<Vec<LoggedEvent>>,
}

impl RecordingSink {
    /// Empty sink
    pub fn new() -> Self {
        Self::default()
    }

    /// All events, in order
    pub fn events(&self) -> Vec<LoggedEvent> {
        self.events.lock().clone()
    }

    /// Events at `level` with classification `class`
    pub fn matching(&self, level: LogLevel, class: ErrorClass) -> Vec<LoggedEvent> {
        self.events
            .lock()
            .iter()
            .filter(|e| e.level == level && e.class == class)
            .cloned()
            .collect()
    }

    /// Number of errors recorded
    pub fn error_count(&self) -> usize {
        self.events
            .lock()
            .iter()
            .filter(|e| e.level == LogLevel::Error)
            .count()
    }

    fn record(&self, level: LogLevel, class: ErrorClass, message: &str) {
        self.events.lock().push(LoggedEvent {
            level,
            class,
            message: message.to_string(),
        });
    }
}

impl LogSink for RecordingSink {
    fn error(&self, class: ErrorClass, message: &str) {
        self.record(LogLevel::Error, class, message);
    }

    fn warn(&self, class: ErrorClass, message: &str) {
        self.record(LogLevel::Warn, class, message);
    }
}
