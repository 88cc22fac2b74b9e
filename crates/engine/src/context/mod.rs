//! Application context
//!
//! [`ApplicationContext`] is the one access point of a batch run: it owns
//! the configuration, the logger cache, the connector handles, the write
//! buffer, the append streams and the cartography, and has a single
//! teardown path, [`ApplicationContext::close_context`].
//!
//! Contexts are built explicitly and shared through `Arc`:
//!
//! ```ignore
//! let ctx = ApplicationContext::builder(factory).properties(props).build();
//! ctx.puts().put(mutation);
//! ctx.flush_contacts(FlushMode::Delta)?;
//! ctx.close_context();
//! ```
//!
//! Call sites that cannot be handed the context use the process-wide slot
//! in [`global`].

mod builder;
pub mod global;

pub use builder::ContextBuilder;

use crate::acquittal::AcquittalReporter;
use crate::appenders::{AppendRegistry, DedupReport, SharedAppender};
use crate::buffer::WriteBuffer;
use crate::cartography::{self, CartographyMap};
use crate::config::ConfigProvider;
use crate::connectors::{
    ConnectorCache, SharedFilesystem, SharedQueue, SharedRelational, SharedStore,
};
use crate::error::ContextResult;
use crate::flush::{FlushController, FlushError, FlushMode, FlushOutcome};
use crate::logging::{LogSink, LoggerRegistry, ProcessLogger};
use bhc_connectors::ConnectorFactory;
use bhc_core::{Environment, Properties};
use chrono::{Local, NaiveDateTime};
use once_cell::sync::OnceCell;
use parking_lot::{Mutex, MutexGuard};
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::info;

/// Process name of the context's own logger
pub const GLOBAL_PROCESS: &str = "CONTACT_PROCESS_GLOBAL";

/// Component name of the context's own logger
pub(crate) const CONTEXT_COMPONENT: &str = "ApplicationContext";

/// Shared state of one batch run
pub struct ApplicationContext {
    config: Arc<ConfigProvider>,
    environment: Environment,
    loggers: LoggerRegistry,
    log: Arc<dyn LogSink>,
    connectors: ConnectorCache,
    buffer: Mutex<WriteBuffer>,
    appenders: AppendRegistry,
    flusher: FlushController,
    cartography: OnceCell<CartographyMap>,
    closed: AtomicBool,
}

impl ApplicationContext {
    /// Start configuring a context over `factory`
    pub fn builder(factory: Arc<dyn ConnectorFactory>) -> ContextBuilder {
        ContextBuilder::new(factory)
    }

    /// Context over already loaded properties, logging through its own logger
    pub fn new(properties: Properties, factory: Arc<dyn ConnectorFactory>) -> Arc<Self> {
        ContextBuilder::new(factory).properties(properties).build()
    }

    /// Context configured from a TOML properties file
    pub fn open(
        path: impl AsRef<Path>,
        factory: Arc<dyn ConnectorFactory>,
    ) -> ContextResult<Arc<Self>> {
        let properties = Properties::from_file(path.as_ref())?;
        Ok(Self::new(properties, factory))
    }

    // ========================================================================
    // Configuration and logging
    // ========================================================================

    /// Logged configuration access
    pub fn config(&self) -> &ConfigProvider {
        &self.config
    }

    /// Raw properties
    pub fn properties(&self) -> &Properties {
        self.config.properties()
    }

    /// Deployment environment
    pub fn environment(&self) -> &Environment {
        &self.environment
    }

    /// Cached logger for a component and logical process
    pub fn logger(&self, component: &str, process: &str) -> Arc<ProcessLogger> {
        self.loggers.get(component, process)
    }

    /// Cached logger named after `T`
    pub fn logger_for<T: ?Sized>(&self, process: &str) -> Arc<ProcessLogger> {
        self.loggers.for_type::<T>(process)
    }

    /// Sink the context reports its own failures to
    pub fn log(&self) -> &Arc<dyn LogSink> {
        &self.log
    }

    /// Whether file appenders are closed at shutdown
    pub fn archival_enabled(&self) -> bool {
        self.config.archival_enabled()
    }

    // ========================================================================
    // Connectors
    // ========================================================================

    /// Connector handle cache
    pub fn connectors(&self) -> &ConnectorCache {
        &self.connectors
    }

    /// Primary store handle, connected on first use
    pub fn store(&self) -> SharedStore {
        self.connectors.store()
    }

    /// Filesystem handle, connected on first use
    pub fn filesystem(&self) -> SharedFilesystem {
        self.connectors.filesystem()
    }

    /// Reporting database handle, connected on first use
    pub fn relational(&self) -> SharedRelational {
        self.connectors.relational()
    }

    /// Queue handle bound to the first topic requested
    pub fn queue(&self, topic: &str) -> SharedQueue {
        self.connectors.queue(topic)
    }

    // ========================================================================
    // Buffer and flush
    // ========================================================================

    /// Exclusive access to the write buffer.
    ///
    /// Hold the guard across a put and [`ApplicationContext::flush_locked`]
    /// to make them atomic. Do not call
    /// [`ApplicationContext::flush_contacts`] while holding it.
    pub fn puts(&self) -> MutexGuard<'_, WriteBuffer> {
        self.buffer.lock()
    }

    /// Flush the write buffer
    pub fn flush_contacts(&self, mode: FlushMode) -> Result<FlushOutcome, FlushError> {
        let mut buffer = self.buffer.lock();
        self.flush_locked(&mut buffer, mode)
    }

    /// Flush a buffer the caller already holds
    pub fn flush_locked(
        &self,
        buffer: &mut WriteBuffer,
        mode: FlushMode,
    ) -> Result<FlushOutcome, FlushError> {
        self.flusher.flush(buffer, &self.connectors, mode)
    }

    // ========================================================================
    // Append streams
    // ========================================================================

    /// Append stream for `path`, opened on first request
    pub fn appender(&self, path: &str) -> ContextResult<SharedAppender> {
        self.appenders.appender(path, &self.connectors)
    }

    /// Paths with an open append stream
    pub fn appender_paths(&self) -> Vec<String> {
        self.appenders.paths()
    }

    /// Remove duplicate lines from every tracked file
    pub fn remove_duplicates(&self) -> DedupReport {
        self.appenders.remove_duplicates(&self.connectors)
    }

    // ========================================================================
    // Reporting store
    // ========================================================================

    /// Record that `action` completed on `table` now
    pub fn acquittal(&self, table: &str, action: &str) -> ContextResult<()> {
        self.acquittal_at(table, action, Local::now().naive_local())
    }

    /// Record that `action` completed on `table` at `timestamp`
    pub fn acquittal_at(
        &self,
        table: &str,
        action: &str,
        timestamp: NaiveDateTime,
    ) -> ContextResult<()> {
        AcquittalReporter::new(
            &self.config,
            &self.connectors,
            &self.environment,
            self.log.as_ref(),
        )
        .report(table, action, timestamp)
    }

    /// Cartography, loaded on first successful call.
    ///
    /// A failed load is logged, returned and retried by the next call.
    pub fn cartography(&self) -> ContextResult<&CartographyMap> {
        self.cartography.get_or_try_init(|| {
            cartography::load(
                &self.config,
                self.connectors.factory().as_ref(),
                self.log.as_ref(),
            )
        })
    }

    // ========================================================================
    // Shutdown
    // ========================================================================

    /// Close appenders (when archival is enabled), then every connector.
    ///
    /// Every step runs even if an earlier one failed. Returns the number of
    /// failures logged; later calls do nothing and return 0.
    pub fn close_context(&self) -> usize {
        if self.closed.swap(true, Ordering::SeqCst) {
            return 0;
        }
        let failures =
            self.appenders.close_all(self.archival_enabled()) + self.connectors.close_all();
        info!(target: "bhc::context", failures, "context closed");
        failures
    }

    /// Whether `close_context` has run
    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }
}

impl std::fmt::Debug for ApplicationContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApplicationContext")
            .field("environment", &self.environment)
            .field("pending", &self.buffer.try_lock().map(|b| b.len()))
            .field("appenders", &self.appenders.len())
            .field("closed", &self.is_closed())
            .finish()
    }
}
