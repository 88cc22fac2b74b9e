//! In-memory append-only filesystem.

use crate::dedup::dedup_lines;
use crate::traits::{AppendStream, FilesystemConnector};
use bhc_core::{ConnectorError, ConnectorResult, KerberosParams};
use parking_lot::Mutex;
use std::collections::{BTreeMap, HashSet};
use std::io::{self, Write};
use std::sync::Arc;

const BACKEND: &str = "filesystem";

/// Failures to inject into the filesystem.
#[derive(Debug, Default)]
pub struct FsFaults {
    /// `connect` fails
    pub fail_connect: bool,
    /// `disconnect` fails
    pub fail_disconnect: bool,
    /// `open_appender` fails for these paths
    pub fail_open: HashSet<String>,
    /// Appender `close` fails for these paths
    pub fail_close: HashSet<String>,
    /// `remove_duplicate_lines` fails for these paths
    pub fail_dedup: HashSet<String>,
}

/// File contents and call history.
#[derive(Debug, Default)]
pub struct FsState {
    /// path -> flushed bytes
    pub files: BTreeMap<String, Vec<u8>>,
    /// Paths passed to `open_appender`, in order
    pub opened: Vec<String>,
    /// Paths whose appender `close` was attempted, in order
    pub close_attempts: Vec<String>,
    /// Paths passed to `remove_duplicate_lines`, in order
    pub dedup_calls: Vec<String>,
    /// Number of disconnect attempts
    pub disconnects: usize,
    /// Parameters of every connector built by the factory
    pub constructed: Vec<KerberosParams>,
    /// Injected failures
    pub faults: FsFaults,
}

impl FsState {
    /// Flushed content of a file as text, empty if absent.
    pub fn content(&self, path: &str) -> String {
        self.files
            .get(path)
            .map(|bytes| String::from_utf8_lossy(bytes).into_owned())
            .unwrap_or_default()
    }
}

/// [`FilesystemConnector`] over [`FsState`].
pub struct MemoryFilesystem {
    state: Arc<Mutex<FsState>>,
    connected: bool,
}

impl MemoryFilesystem {
    /// Connector over shared state.
    pub fn new(state: Arc<Mutex<FsState>>) -> Self {
        Self {
            state,
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

impl FilesystemConnector for MemoryFilesystem {
    fn connect(&mut self) -> ConnectorResult<()> {
        if self.state.lock().faults.fail_connect {
            return Err(ConnectorError::connect(BACKEND, "injected connect failure"));
        }
        self.connected = true;
        Ok(())
    }

    fn disconnect(&mut self) -> ConnectorResult<()> {
        let mut state = self.state.lock();
        state.disconnects += 1;
        if state.faults.fail_disconnect {
            return Err(ConnectorError::injected("filesystem disconnect"));
        }
        self.connected = false;
        Ok(())
    }

    fn is_connected(&self) -> bool {
        self.connected
    }

    fn open_appender(&mut self, path: &str) -> ConnectorResult<Box<dyn AppendStream>> {
        self.ensure_connected()?;
        let mut state = self.state.lock();
        state.opened.push(path.to_string());
        if state.faults.fail_open.contains(path) {
            let err = io::Error::new(io::ErrorKind::PermissionDenied, format!("open {}", path));
            return Err(err.into());
        }
        state.files.entry(path.to_string()).or_default();
        Ok(Box::new(MemoryAppender {
            state: Arc::clone(&self.state),
            path: path.to_string(),
            pending: Vec::new(),
            closed: false,
        }))
    }

    fn remove_duplicate_lines(&mut self, path: &str) -> ConnectorResult<usize> {
        self.ensure_connected()?;
        let mut state = self.state.lock();
        state.dedup_calls.push(path.to_string());
        if state.faults.fail_dedup.contains(path) {
            return Err(ConnectorError::injected(format!("dedup {}", path)));
        }
        let content = state
            .files
            .get_mut(path)
            .ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, path.to_string()))?;
        let (deduped, removed) = dedup_lines(content);
        *content = deduped;
        Ok(removed)
    }
}

/// Buffered appender; bytes become visible in [`FsState::files`] on flush.
struct MemoryAppender {
    state: Arc<Mutex<FsState>>,
    path: String,
    pending: Vec<u8>,
    closed: bool,
}

impl Write for MemoryAppender {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        if self.closed {
            return Err(io::Error::new(io::ErrorKind::BrokenPipe, "appender is closed"));
        }
        self.pending.extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        if self.pending.is_empty() {
            return Ok(());
        }
        self.state
            .lock()
            .files
            .entry(self.path.clone())
            .or_default()
            .extend_from_slice(&self.pending);
        self.pending.clear();
        Ok(())
    }
}

impl AppendStream for MemoryAppender {
    fn close(&mut self) -> io::Result<()> {
        {
            let mut state = self.state.lock();
            state.close_attempts.push(self.path.clone());
            if state.faults.fail_close.contains(&self.path) {
                return Err(io::Error::new(io::ErrorKind::Other, format!("close {}", self.path)));
            }
        }
        self.flush()?;
        self.closed = true;
        Ok(())
    }

    fn is_closed(&self) -> bool {
        self.closed
    }
}
