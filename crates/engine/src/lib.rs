//! Flush engine for the contacts loader
//!
//! This crate orchestrates all lower layers:
//! - ApplicationContext: one access point with a single startup and teardown path
//! - WriteBuffer: pending row mutations keyed by row
//! - FlushController: plain, delta and staging-only commits
//! - ConnectorCache: one lazily connected handle per backend kind
//! - AppendRegistry: cached append streams and duplicate removal
//! - Acquittal: completion markers in the reporting store
//! - Cartography: reference mapping loaded once
//! - Logging: log sinks and the per-(component, process) logger cache
//!
//! Failures are logged with an [`ErrorClass`](bhc_core::ErrorClass) at the
//! point of I/O and returned as explicit results; nothing in this crate
//! aborts the caller's control flow.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod acquittal;
pub mod appenders;
pub mod buffer;
pub mod cartography;
pub mod config;
pub mod connectors;
pub mod context;
pub mod error;
pub mod flush;
pub mod logging;
pub mod testing;

pub use acquittal::{acquittal_statement, AcquittalReporter};
pub use appenders::{AppendRegistry, DedupReport, SharedAppender};
pub use buffer::WriteBuffer;
pub use cartography::CartographyMap;
pub use config::ConfigProvider;
pub use connectors::{ConnectorCache, SharedFilesystem, SharedQueue, SharedRelational, SharedStore};
pub use context::{ApplicationContext, ContextBuilder, GLOBAL_PROCESS};
pub use error::{ContextError, ContextResult};
pub use flush::{reconcile, FlushController, FlushError, FlushMode, FlushOutcome, FlushTargets};
pub use logging::{LogDestination, LogSink, LoggerRegistry, ProcessLogger};
