//! Connector handle cache
//!
//! One handle per backend kind, built through the [`ConnectorFactory`] and
//! connected on first request, then reused until [`ConnectorCache::close_all`].
//! Connect failures are logged and the (disconnected) handle is still
//! returned and cached; the next operation on it fails and is logged there.

use crate::config::ConfigProvider;
use crate::logging::LogSink;
use bhc_connectors::{
    ConnectorFactory, FilesystemConnector, QueueConnector, RelationalConnector, StoreConnector,
};
use bhc_core::{ConnectorResult, ErrorClass, PropertyName};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::debug;
use uuid::Uuid;

/// Shared primary store handle
pub type SharedStore = Arc<Mutex<Box<dyn StoreConnector>>>;
/// Shared filesystem handle
pub type SharedFilesystem = Arc<Mutex<Box<dyn FilesystemConnector>>>;
/// Shared relational handle
pub type SharedRelational = Arc<Mutex<Box<dyn RelationalConnector>>>;
/// Shared queue handle
pub type SharedQueue = Arc<Mutex<Box<dyn QueueConnector>>>;

/// Lazily connected handles, one per backend kind
pub struct ConnectorCache {
    factory: Arc<dyn ConnectorFactory>,
    config: Arc<ConfigProvider>,
    log: Arc<dyn LogSink>,
    store: Mutex<Option<SharedStore>>,
    filesystem: Mutex<Option<SharedFilesystem>>,
    relational: Mutex<Option<SharedRelational>>,
    queue: Mutex<Option<SharedQueue>>,
    closed: AtomicBool,
}

impl ConnectorCache {
    /// Empty cache; nothing is constructed until first use
    pub fn new(
        factory: Arc<dyn ConnectorFactory>,
        config: Arc<ConfigProvider>,
        log: Arc<dyn LogSink>,
    ) -> Self {
        Self {
            factory,
            config,
            log,
            store: Mutex::new(None),
            filesystem: Mutex::new(None),
            relational: Mutex::new(None),
            queue: Mutex::new(None),
            closed: AtomicBool::new(false),
        }
    }

    /// Factory used to build handles, also used for one-shot connections
    pub fn factory(&self) -> &Arc<dyn ConnectorFactory> {
        &self.factory
    }

    /// Primary store handle
    pub fn store(&self) -> SharedStore {
        let mut slot = self.store.lock();
        if let Some(handle) = slot.as_ref() {
            return Arc::clone(handle);
        }
        let mut connector = self.factory.store(&self.config.kerberos_params());
        self.report_connect(ErrorClass::Store, "store", connector.connect());
        let handle: SharedStore = Arc::new(Mutex::new(connector));
        *slot = Some(Arc::clone(&handle));
        handle
    }

    /// Filesystem handle
    pub fn filesystem(&self) -> SharedFilesystem {
        let mut slot = self.filesystem.lock();
        if let Some(handle) = slot.as_ref() {
            return Arc::clone(handle);
        }
        let mut connector = self.factory.filesystem(&self.config.kerberos_params());
        self.report_connect(ErrorClass::Filesystem, "filesystem", connector.connect());
        let handle: SharedFilesystem = Arc::new(Mutex::new(connector));
        *slot = Some(Arc::clone(&handle));
        handle
    }

    /// Relational handle on the reporting database
    pub fn relational(&self) -> SharedRelational {
        let mut slot = self.relational.lock();
        if let Some(handle) = slot.as_ref() {
            return Arc::clone(handle);
        }
        let params = self.config.sql_params(PropertyName::SqlServerReportingDb);
        let mut connector = self.factory.relational(&params);
        self.report_connect(ErrorClass::Relational, "relational", connector.connect());
        let handle: SharedRelational = Arc::new(Mutex::new(connector));
        *slot = Some(Arc::clone(&handle));
        handle
    }

    /// Queue handle producing to `topic`.
    ///
    /// The topic of the first call is kept; a later call naming another
    /// topic gets the same handle and a warning.
    pub fn queue(&self, topic: &str) -> SharedQueue {
        let mut slot = self.queue.lock();
        if let Some(handle) = slot.as_ref() {
            let current = handle.lock().topic().map(str::to_string);
            if current.as_deref() != Some(topic) {
                self.log.warn(
                    ErrorClass::Queue,
                    &format!(
                        "Queue handle already bound to topic {:?}, ignoring {}",
                        current, topic
                    ),
                );
            }
            return Arc::clone(handle);
        }
        let client_id = Uuid::new_v4().to_string();
        let mut connector = self.factory.queue(&self.config.queue_params(client_id));
        connector.set_topic(topic);
        self.report_connect(ErrorClass::Queue, "queue", connector.connect());
        let handle: SharedQueue = Arc::new(Mutex::new(connector));
        *slot = Some(Arc::clone(&handle));
        handle
    }

    /// Disconnect every constructed handle.
    ///
    /// Order is store, filesystem, relational, queue. A failing disconnect
    /// is logged and the remaining handles are still closed. Returns the
    /// number of failures; a second call does nothing and returns 0.
    pub fn close_all(&self) -> usize {
        if self.closed.swap(true, Ordering::SeqCst) {
            return 0;
        }
        let mut failures = 0;
        if let Some(handle) = self.store.lock().as_ref() {
            failures += self.report_close(ErrorClass::Store, "store", handle.lock().disconnect());
        }
        if let Some(handle) = self.filesystem.lock().as_ref() {
            failures +=
                self.report_close(ErrorClass::Filesystem, "filesystem", handle.lock().disconnect());
        }
        if let Some(handle) = self.relational.lock().as_ref() {
            failures +=
                self.report_close(ErrorClass::Relational, "relational", handle.lock().disconnect());
        }
        if let Some(handle) = self.queue.lock().as_ref() {
            failures += self.report_close(ErrorClass::Queue, "queue", handle.lock().disconnect());
        }
        failures
    }

    /// Whether `close_all` has run
    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    fn report_connect(&self, class: ErrorClass, backend: &str, result: ConnectorResult<()>) {
        match result {
            Ok(()) => debug!(target: "bhc::context", backend, "connected"),
            Err(e) => self
                .log
                .error(class, &format!("Unable to connect to {}: {}", backend, e)),
        }
    }

    fn report_close(&self, class: ErrorClass, backend: &str, result: ConnectorResult<()>) -> usize {
        match result {
            Ok(()) => {
                debug!(target: "bhc::context", backend, "disconnected");
                0
            }
            Err(e) => {
                self.log
                    .error(class, &format!("Unable to close {} connection: {}", backend, e));
                1
            }
        }
    }
}
