//! Error types for the engine
//!
//! Every variant has already been logged by the time it is returned; the
//! caller decides whether it is fatal.

use crate::flush::FlushError;
use bhc_core::{ConfigError, ConnectorError};
use thiserror::Error;

/// Result type alias for context operations
pub type ContextResult<T> = std::result::Result<T, ContextError>;

/// Errors returned by [`ApplicationContext`](crate::ApplicationContext) operations
#[derive(Debug, Error)]
pub enum ContextError {
    /// Missing or invalid configuration
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Append stream could not be opened
    #[error("unable to open file appender for path {path}: {source}")]
    Appender {
        /// Requested path
        path: String,
        /// Underlying failure
        #[source]
        source: ConnectorError,
    },

    /// Cartography could not be loaded
    #[error("cartography lookup failed: {0}")]
    Cartography(String),

    /// Flush failed; the write buffer is unchanged
    #[error(transparent)]
    Flush(#[from] FlushError),

    /// Acquittal row could not be written
    #[error("could not write acquittal: {0}")]
    Acquittal(#[source] ConnectorError),
}
