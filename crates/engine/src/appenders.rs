//! Append-target registry
//!
//! At most one open stream per path. Streams are opened through the cached
//! filesystem handle on first request and kept until
//! [`AppendRegistry::close_all`] closes them.

use crate::connectors::ConnectorCache;
use crate::error::{ContextError, ContextResult};
use crate::logging::LogSink;
use bhc_connectors::AppendStream;
use bhc_core::ErrorClass;
use parking_lot::Mutex;
use std::collections::BTreeMap;
use std::io::Write;
use std::sync::Arc;
use tracing::debug;

/// Shared append stream
pub type SharedAppender = Arc<Mutex<Box<dyn AppendStream>>>;

/// Outcome of [`AppendRegistry::remove_duplicates`]
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DedupReport {
    /// Paths deduplicated successfully, with the number of lines removed
    pub deduplicated: Vec<(String, usize)>,
    /// Paths whose deduplication failed
    pub failed: Vec<String>,
}

impl DedupReport {
    /// Total lines removed across all paths
    pub fn lines_removed(&self) -> usize {
        self.deduplicated.iter().map(|(_, n)| n).sum()
    }
}

/// Cache of append streams keyed by path
pub struct AppendRegistry {
    appenders: Mutex<BTreeMap<String, SharedAppender>>,
    log: Arc<dyn LogSink>,
}

impl AppendRegistry {
    /// Empty registry
    pub fn new(log: Arc<dyn LogSink>) -> Self {
        Self {
            appenders: Mutex::new(BTreeMap::new()),
            log,
        }
    }

    /// Stream for `path`, opened on first request.
    ///
    /// An open failure is logged under [`ErrorClass::Filesystem`] and
    /// nothing is cached, so a later call retries.
    pub fn appender(
        &self,
        path: &str,
        connectors: &ConnectorCache,
    ) -> ContextResult<SharedAppender> {
        let mut appenders = self.appenders.lock();
        if let Some(stream) = appenders.get(path) {
            return Ok(Arc::clone(stream));
        }

        let filesystem = connectors.filesystem();
        let opened = filesystem.lock().open_appender(path);
        match opened {
            Ok(stream) => {
                let stream: SharedAppender = Arc::new(Mutex::new(stream));
                appenders.insert(path.to_string(), Arc::clone(&stream));
                debug!(target: "bhc::fs", path, "opened appender");
                Ok(stream)
            }
            Err(source) => {
                self.log.error(
                    ErrorClass::Filesystem,
                    &format!("Unable to open file appender for path {}: {}", path, source),
                );
                Err(ContextError::Appender {
                    path: path.to_string(),
                    source,
                })
            }
        }
    }

    /// Tracked paths, in order
    pub fn paths(&self) -> Vec<String> {
        self.appenders.lock().keys().cloned().collect()
    }

    /// Number of tracked streams
    pub fn len(&self) -> usize {
        self.appenders.lock().len()
    }

    /// Whether no stream is tracked
    pub fn is_empty(&self) -> bool {
        self.appenders.lock().is_empty()
    }

    /// Remove duplicate lines from every tracked file.
    ///
    /// Each stream is flushed first so its buffered lines take part. A
    /// failure on one path is logged and the remaining paths are still
    /// processed. Callers must not append concurrently.
    pub fn remove_duplicates(&self, connectors: &ConnectorCache) -> DedupReport {
        let appenders = self.appenders.lock();
        let mut report = DedupReport::default();
        if appenders.is_empty() {
            return report;
        }

        let filesystem = connectors.filesystem();
        for (path, stream) in appenders.iter() {
            if let Err(e) = stream.lock().flush() {
                self.log.error(
                    ErrorClass::Filesystem,
                    &format!("Unable to flush {} before duplicate removal: {}", path, e),
                );
            }
            let removed = filesystem.lock().remove_duplicate_lines(path);
            match removed {
                Ok(removed) => report.deduplicated.push((path.clone(), removed)),
                Err(e) => {
                    self.log.error(
                        ErrorClass::Filesystem,
                        &format!("Unable to remove duplicate lines from {}: {}", path, e),
                    );
                    report.failed.push(path.clone());
                }
            }
        }
        report
    }

    /// Close every tracked stream when archival is enabled.
    ///
    /// With archival disabled nothing happens and streams stay usable.
    /// Closed streams leave the registry; a stream whose close failed is
    /// logged and kept. Returns the number of failures.
    pub fn close_all(&self, archival_enabled: bool) -> usize {
        if !archival_enabled {
            return 0;
        }

        let mut failures = 0;
        let mut appenders = self.appenders.lock();
        appenders.retain(|path, stream| match stream.lock().close() {
            Ok(()) => false,
            Err(e) => {
                self.log.error(
                    ErrorClass::Filesystem,
                    &format!("Unable to close file appender for path {}: {}", path, e),
                );
                failures += 1;
                true
            }
        });
        failures
    }
}
