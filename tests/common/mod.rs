//! Shared test utilities for the integration suites.
//!
//! Import via `#[path = "../common/mod.rs"] mod common;` from a suite's main.rs.

#![allow(dead_code)]
#![allow(unused_imports)]

pub use bhc_contacts::testing::{LogLevel, LoggedEvent, RecordingSink};
pub use bhc_contacts::{
    ApplicationContext, Cell, ErrorClass, FlushMode, FlushOutcome, MemoryBackends, MemoryFactory,
    Properties, PropertyName, RowKey, RowMutation, StoreConnector,
};
use std::sync::{Arc, Once};
use tempfile::TempDir;

// ============================================================================
// Initialization
// ============================================================================

static INIT_TRACING: Once = Once::new();

/// Route `tracing` output through the test harness writer.
pub fn init_tracing() {
    INIT_TRACING.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_test_writer()
            .with_max_level(tracing::Level::DEBUG)
            .try_init();
    });
}

pub const PRIMARY: &str = "contacts";
pub const STAGING: &str = "contacts_tmp";
pub const CARTOGRAPHY_PROCEDURE: &str = "ps_cartography";

/// Configuration with every property the loader reads, outside production.
pub fn full_properties() -> Properties {
    Properties::from_toml_str(
        r#"
[application]
logs = "console"
archival = true
env_name = "Rec"

[kerberos]
user = "loader"
keytab = "/etc/security/keytabs/loader.keytab"

[hbase]
contacts_table = "contacts"
contacts_temp_table = "contacts_tmp"

[kafka]
zookeeper_quorum = "zk01:2181"
brokers_list = "kafka01:9092"

[sqlserver]
host = "sql01"
instance = "MAIN"
user = "report"
password = "report-pw"
cartography_db = "cartography"
cartography_procedure = "ps_cartography"
reporting_db = "reporting"
acquittal_table = "ACQUITTEMENT"
"#,
    )
    .expect("test properties parse")
}

/// [`full_properties`] switched to production with override parameters.
pub fn production_properties() -> Properties {
    full_properties()
        .with(PropertyName::ApplicationEnvName, "Prod")
        .with(PropertyName::AcquittalOverrideHost, "sql-prod")
        .with(PropertyName::AcquittalOverrideInstance, "PROD")
        .with(PropertyName::AcquittalOverrideUser, "acq")
        .with(PropertyName::AcquittalOverridePassword, "acq-pw")
        .with(PropertyName::AcquittalOverrideDatabase, "acquittals")
}

// ============================================================================
// TestContext - context over in-memory backends
// ============================================================================

/// Context wired to in-memory backends and a recording sink.
pub struct TestContext {
    pub ctx: Arc<ApplicationContext>,
    pub backends: MemoryBackends,
    pub sink: Arc<RecordingSink>,
    pub dir: Option<TempDir>,
}

impl TestContext {
    /// Context over [`full_properties`].
    pub fn new() -> Self {
        Self::with_properties(full_properties())
    }

    /// Context over explicit properties.
    pub fn with_properties(properties: Properties) -> Self {
        init_tracing();
        let backends = MemoryBackends::new();
        let sink = Arc::new(RecordingSink::new());
        let ctx = ApplicationContext::builder(Arc::new(MemoryFactory::new(backends.clone())))
            .properties(properties)
            .sink(sink.clone())
            .build();
        Self {
            ctx,
            backends,
            sink,
            dir: None,
        }
    }

    /// Context whose filesystem connector writes under a temporary directory.
    pub fn with_local_filesystem(properties: Properties) -> Self {
        init_tracing();
        let dir = TempDir::new().expect("temp dir");
        let backends = MemoryBackends::new();
        let sink = Arc::new(RecordingSink::new());
        let factory = MemoryFactory::new(backends.clone()).with_local_filesystem(dir.path());
        let ctx = ApplicationContext::builder(Arc::new(factory))
            .properties(properties)
            .sink(sink.clone())
            .build();
        Self {
            ctx,
            backends,
            sink,
            dir: Some(dir),
        }
    }

    /// Buffer a mutation.
    pub fn put(&self, mutation: RowMutation) {
        self.ctx.puts().put(mutation);
    }

    /// Number of pending rows.
    pub fn pending(&self) -> usize {
        self.ctx.puts().len()
    }

    /// Errors logged under `class`.
    pub fn errors(&self, class: ErrorClass) -> Vec<LoggedEvent> {
        self.sink.matching(LogLevel::Error, class)
    }

    /// Warnings logged under `class`.
    pub fn warnings(&self, class: ErrorClass) -> Vec<LoggedEvent> {
        self.sink.matching(LogLevel::Warn, class)
    }
}

/// Contact row with a status and a channel.
pub fn contact(key: &str, status: &str, channel: &str) -> RowMutation {
    RowMutation::new(key)
        .with_cell("c", "status", status)
        .with_cell("c", "channel", channel)
}

/// Latest stored value of a column, as a string.
pub fn stored(
    backends: &MemoryBackends,
    table: &str,
    key: &str,
    qualifier: &str,
) -> Option<String> {
    backends
        .store()
        .row(table, key)
        .latest("c", qualifier)
        .map(|c| String::from_utf8_lossy(&c.value).into_owned())
}
