//! Error types for the contacts loader
//!
//! Connectors report failures as [`ConnectorError`]; configuration problems
//! are [`ConfigError`]. Neither is allowed to escape the engine unlogged:
//! the engine converts them into log events tagged with an [`ErrorClass`].
//! We use `thiserror` for `Display` and `Error` implementations.

use crate::config::PropertyName;
use std::fmt;
use std::io;
use thiserror::Error;

/// Result type alias for connector operations
pub type ConnectorResult<T> = std::result::Result<T, ConnectorError>;

/// Classification carried by every logged failure
///
/// Operators filter the log stream on these values, so they are stable
/// identifiers rather than free text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ErrorClass {
    /// Primary row store (connect, commit, read-back)
    Store,
    /// Distributed filesystem (appenders, duplicate removal)
    Filesystem,
    /// Relational reporting store (acquittal, cartography)
    Relational,
    /// Message queue
    Queue,
    /// Missing or malformed configuration
    Config,
    /// Data warning (e.g. flushing an empty buffer)
    Data,
}

impl ErrorClass {
    /// Stable identifier used in log output
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorClass::Store => "ERROR_STORE",
            ErrorClass::Filesystem => "ERROR_FILESYSTEM",
            ErrorClass::Relational => "ERROR_RELATIONAL",
            ErrorClass::Queue => "ERROR_QUEUE",
            ErrorClass::Config => "ERROR_OTHER",
            ErrorClass::Data => "WARNING_DATA",
        }
    }
}

impl fmt::Display for ErrorClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Errors raised by backend connectors
#[derive(Debug, Error)]
pub enum ConnectorError {
    /// Operation attempted on a handle that is not connected
    #[error("{backend} connector is not connected")]
    NotConnected {
        /// Backend kind name
        backend: &'static str,
    },

    /// Connection could not be established
    #[error("could not connect to {backend}: {detail}")]
    Connect {
        /// Backend kind name
        backend: &'static str,
        /// Underlying failure
        detail: String,
    },

    /// I/O error from the underlying client
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Store operation issued before `set_table`
    #[error("no target table selected")]
    TableNotSet,

    /// SQL statement or procedure failed
    #[error("SQL error: {0}")]
    Sql(String),

    /// Failure injected by an in-process backend
    #[error("injected failure: {0}")]
    Injected(String),
}

impl ConnectorError {
    /// Create a connect error for a backend kind
    pub fn connect(backend: &'static str, detail: impl Into<String>) -> Self {
        ConnectorError::Connect {
            backend,
            detail: detail.into(),
        }
    }

    /// Create an injected failure
    pub fn injected(detail: impl Into<String>) -> Self {
        ConnectorError::Injected(detail.into())
    }
}

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Properties file could not be read
    #[error("unable to read properties file '{path}': {source}")]
    Read {
        /// File path
        path: String,
        /// Underlying I/O error
        #[source]
        source: io::Error,
    },

    /// Properties file is not valid TOML
    #[error("unable to parse properties file: {0}")]
    Parse(#[from] toml::de::Error),

    /// Property is not defined
    #[error("property '{0}' is not defined")]
    Missing(PropertyName),

    /// Property is defined but its value cannot be interpreted
    #[error("property '{name}' has invalid value '{value}'")]
    Invalid {
        /// Property name
        name: PropertyName,
        /// Offending value
        value: String,
    },
}
