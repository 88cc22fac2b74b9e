//! Backend connectors for the contacts loader
//!
//! The engine talks to four external backends through the traits defined
//! here. The real clients (row store, distributed filesystem, relational
//! reporting store, message queue) are opaque: the engine only needs
//! connect/disconnect and a handful of read/write operations.
//!
//! - [`traits`]: one trait per backend kind, plus [`AppendStream`]
//! - [`factory`]: [`ConnectorFactory`], the seam through which handles are built
//! - [`local`]: filesystem connector over a local directory
//! - [`memory`]: in-process backends with inspectable state and fault injection

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod dedup;
pub mod factory;
pub mod local;
pub mod memory;
pub mod traits;

pub use dedup::dedup_lines;
pub use factory::ConnectorFactory;
pub use local::LocalFilesystem;
pub use memory::{MemoryBackends, MemoryFactory};
pub use traits::{
    AppendStream, FilesystemConnector, QueueConnector, RelationalConnector, SqlRow,
    StoreConnector,
};
