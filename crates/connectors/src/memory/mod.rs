//! In-process backends
//!
//! Every backend kind has an in-memory implementation whose state lives in
//! a shared [`MemoryBackends`] handle. Connectors built by [`MemoryFactory`]
//! write into that state, so a caller can keep a clone of the handle,
//! inspect what reached each backend, and inject failures per operation.
//!
//! ```ignore
//! let backends = MemoryBackends::new();
//! let factory = MemoryFactory::new(backends.clone());
//! backends.store().faults.fail_put_tables.insert("contacts_tmp".into());
//! ```

mod fs;
mod queue;
mod sql;
mod store;

pub use fs::{FsFaults, FsState, MemoryFilesystem};
pub use queue::{MemoryQueue, QueueFaults, QueueState};
pub use sql::{ExecutedStatement, MemoryRelational, SqlFaults, SqlState};
pub use store::{MemoryStore, StoreFaults, StoreState};

use crate::factory::ConnectorFactory;
use crate::local::LocalFilesystem;
use crate::traits::{FilesystemConnector, QueueConnector, RelationalConnector, StoreConnector};
use bhc_core::{KerberosParams, QueueParams, SqlParams};
use parking_lot::{Mutex, MutexGuard};
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Default)]
struct BackendsInner {
    store: Arc<Mutex<StoreState>>,
    fs: Arc<Mutex<FsState>>,
    sql: Arc<Mutex<SqlState>>,
    queue: Arc<Mutex<QueueState>>,
}

/// Shared state of every in-process backend.
///
/// Cloning is cheap and clones observe the same state.
#[derive(Clone, Default)]
pub struct MemoryBackends {
    inner: Arc<BackendsInner>,
}

impl MemoryBackends {
    /// Fresh, empty backends with no faults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Row store state.
    pub fn store(&self) -> MutexGuard<'_, StoreState> {
        self.inner.store.lock()
    }

    /// Filesystem state.
    pub fn fs(&self) -> MutexGuard<'_, FsState> {
        self.inner.fs.lock()
    }

    /// Relational store state.
    pub fn sql(&self) -> MutexGuard<'_, SqlState> {
        self.inner.sql.lock()
    }

    /// Queue state.
    pub fn queue(&self) -> MutexGuard<'_, QueueState> {
        self.inner.queue.lock()
    }
}

/// [`ConnectorFactory`] producing in-process connectors.
///
/// With [`MemoryFactory::with_local_filesystem`] the filesystem connector is
/// a [`LocalFilesystem`] instead, so appended files land on disk.
#[derive(Clone)]
pub struct MemoryFactory {
    backends: MemoryBackends,
    local_root: Option<PathBuf>,
}

impl MemoryFactory {
    /// Factory writing into `backends`.
    pub fn new(backends: MemoryBackends) -> Self {
        Self {
            backends,
            local_root: None,
        }
    }

    /// Use a local directory for the filesystem connector.
    pub fn with_local_filesystem(mut self, root: impl Into<PathBuf>) -> Self {
        self.local_root = Some(root.into());
        self
    }

    /// Backends this factory writes into.
    pub fn backends(&self) -> &MemoryBackends {
        &self.backends
    }
}

impl ConnectorFactory for MemoryFactory {
    fn store(&self, params: &KerberosParams) -> Box<dyn StoreConnector> {
        self.backends.store().constructed.push(params.clone());
        Box::new(MemoryStore::new(Arc::clone(&self.backends.inner.store)))
    }

    fn filesystem(&self, params: &KerberosParams) -> Box<dyn FilesystemConnector> {
        self.backends.fs().constructed.push(params.clone());
        match &self.local_root {
            Some(root) => Box::new(LocalFilesystem::new(root.clone())),
            None => Box::new(MemoryFilesystem::new(Arc::clone(&self.backends.inner.fs))),
        }
    }

    fn relational(&self, params: &SqlParams) -> Box<dyn RelationalConnector> {
        self.backends.sql().constructed.push(params.clone());
        Box::new(MemoryRelational::new(
            Arc::clone(&self.backends.inner.sql),
            params.clone(),
        ))
    }

    fn queue(&self, params: &QueueParams) -> Box<dyn QueueConnector> {
        self.backends.queue().constructed.push(params.clone());
        Box::new(MemoryQueue::new(Arc::clone(&self.backends.inner.queue)))
    }
}
