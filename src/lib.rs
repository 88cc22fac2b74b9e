//! BHC contacts loader - write buffering and flush control
//!
//! Loads contact records into a row-oriented store. A batch job builds one
//! [`ApplicationContext`], puts row mutations into its write buffer, flushes
//! them to the primary table (optionally reconciling into a staging table),
//! writes acquittals to the reporting store and closes the context.
//!
//! # Quick Start
//!
//! ```ignore
//! use bhc_contacts::{ApplicationContext, FlushMode, MemoryBackends, MemoryFactory, RowMutation};
//!
//! let factory = Arc::new(MemoryFactory::new(MemoryBackends::new()));
//! let ctx = ApplicationContext::open("bhc.toml", factory)?;
//!
//! ctx.puts().put(RowMutation::new("contact-1").with_cell("c", "status", "sent"));
//! ctx.flush_contacts(FlushMode::Delta)?;
//! ctx.acquittal("contacts", "LOAD")?;
//! ctx.close_context();
//! ```
//!
//! # Architecture
//!
//! - `bhc-core`: row model, error classes, configuration
//! - `bhc-connectors`: backend traits, connector factory, reference backends
//! - `bhc-engine`: connector cache, write buffer, flush controller, context

pub use bhc_connectors::{
    AppendStream, ConnectorFactory, FilesystemConnector, LocalFilesystem, MemoryBackends,
    MemoryFactory, QueueConnector, RelationalConnector, SqlRow, StoreConnector,
};
pub use bhc_core::{
    ArchivalFlag, CartographyEntry, Cell, ConfigError, ConfigFile, ConnectorError, Environment,
    ErrorClass, Properties, PropertyName, RowKey, RowMutation, RowSnapshot, CONFIG_FILE_NAME,
};
pub use bhc_engine::*;
