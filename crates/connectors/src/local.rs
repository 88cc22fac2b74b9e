//! Filesystem connector over a local directory
//!
//! Paths handed to the connector are resolved under a root directory, so
//! absolute distributed-filesystem paths like `/data/out/contacts.csv` map to
//! `<root>/data/out/contacts.csv`. Duplicate removal rewrites the file in
//! place (truncate + write) rather than replacing it, so append handles that
//! are still open keep pointing at the live file.

use crate::dedup::dedup_lines;
use crate::traits::{AppendStream, FilesystemConnector};
use bhc_core::{ConnectorError, ConnectorResult};
use std::fs::{self, File, OpenOptions};
use std::io::{self, BufWriter, Write};
use std::path::PathBuf;
use tracing::debug;

const BACKEND: &str = "filesystem";

/// Filesystem connector rooted at a local directory.
#[derive(Debug)]
pub struct LocalFilesystem {
    root: PathBuf,
    connected: bool,
}

impl LocalFilesystem {
    /// Create a connector rooted at `root`. Nothing touches disk until `connect`.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            connected: false,
        }
    }

    /// Resolve a connector path to a local path under the root.
    pub fn resolve(&self, path: &str) -> PathBuf {
        self.root.join(path.trim_start_matches('/'))
    }

    fn ensure_connected(&self) -> ConnectorResult<()> {
        if self.connected {
            Ok(())
        } else {
            Err(ConnectorError::NotConnected { backend: BACKEND })
        }
    }
}

impl FilesystemConnector for LocalFilesystem {
    fn connect(&mut self) -> ConnectorResult<()> {
        fs::create_dir_all(&self.root).map_err(|e| {
            ConnectorError::connect(BACKEND, format!("{}: {}", self.root.display(), e))
        })?;
        self.connected = true;
        Ok(())
    }

    fn disconnect(&mut self) -> ConnectorResult<()> {
        self.connected = false;
        Ok(())
    }

    fn is_connected(&self) -> bool {
        self.connected
    }

    fn open_appender(&mut self, path: &str) -> ConnectorResult<Box<dyn AppendStream>> {
        self.ensure_connected()?;
        let local = self.resolve(path);
        if let Some(parent) = local.parent() {
            fs::create_dir_all(parent)?;
        }
        let file = OpenOptions::new().create(true).append(true).open(&local)?;
        Ok(Box::new(LocalAppender {
            writer: Some(BufWriter::new(file)),
        }))
    }

    fn remove_duplicate_lines(&mut self, path: &str) -> ConnectorResult<usize> {
        self.ensure_connected()?;
        let local = self.resolve(path);
        let content = fs::read(&local)?;
        let (deduped, removed) = dedup_lines(&content);
        if removed > 0 {
            fs::write(&local, deduped)?;
        }
        debug!(target: "bhc::fs", path = %local.display(), removed, "Removed duplicate lines");
        Ok(removed)
    }
}

/// Buffered append handle on a local file.
struct LocalAppender {
    writer: Option<BufWriter<File>>,
}

fn closed_error() -> io::Error {
    io::Error::new(io::ErrorKind::BrokenPipe, "appender is closed")
}

impl Write for LocalAppender {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match self.writer.as_mut() {
            Some(w) => w.write(buf),
            None => Err(closed_error()),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        match self.writer.as_mut() {
            Some(w) => w.flush(),
            None => Err(closed_error()),
        }
    }
}

impl AppendStream for LocalAppender {
    fn close(&mut self) -> io::Result<()> {
        match self.writer.take() {
            Some(mut w) => w.flush(),
            None => Ok(()),
        }
    }

    fn is_closed(&self) -> bool {
        self.writer.is_none()
    }
}
