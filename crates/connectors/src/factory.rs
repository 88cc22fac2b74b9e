//! Connector construction seam.

use crate::traits::{FilesystemConnector, QueueConnector, RelationalConnector, StoreConnector};
use bhc_core::{KerberosParams, QueueParams, SqlParams};

/// Builds unconnected connector handles from configuration.
///
/// Construction never fails; connection errors surface from `connect()`.
/// The engine calls each method at most once per backend kind, except
/// [`ConnectorFactory::relational`], which also serves the one-shot
/// cartography and production acquittal connections.
pub trait ConnectorFactory: Send + Sync {
    /// Primary row store client.
    fn store(&self, params: &KerberosParams) -> Box<dyn StoreConnector>;

    /// Distributed filesystem client.
    fn filesystem(&self, params: &KerberosParams) -> Box<dyn FilesystemConnector>;

    /// Relational store client.
    fn relational(&self, params: &SqlParams) -> Box<dyn RelationalConnector>;

    /// Message queue client.
    fn queue(&self, params: &QueueParams) -> Box<dyn QueueConnector>;
}
