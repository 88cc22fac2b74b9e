//! Context construction, loggers and shutdown.

use crate::common::*;
use bhc_contacts::{ContextError, LogDestination, GLOBAL_PROCESS};
use std::io::Write;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Barrier};
use tempfile::TempDir;

struct ContactLoader;

// ============================================================================
// Construction
// ============================================================================

#[test]
fn open_reads_toml_properties() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join(bhc_contacts::CONFIG_FILE_NAME);
    std::fs::write(&path, Properties::default_toml()).unwrap();

    let ctx = ApplicationContext::open(&path, Arc::new(MemoryFactory::new(MemoryBackends::new())))
        .unwrap();

    assert_eq!(
        ctx.properties().get(PropertyName::HbaseContactsTable),
        Some(PRIMARY)
    );
    assert!(!ctx.archival_enabled());
    assert_eq!(ctx.environment().name(), "Dev");
}

#[test]
fn open_missing_file_is_a_config_error() {
    let dir = TempDir::new().unwrap();
    let result = ApplicationContext::open(
        dir.path().join("absent.toml"),
        Arc::new(MemoryFactory::new(MemoryBackends::new())),
    );
    assert!(matches!(result, Err(ContextError::Config(_))));
}

#[test]
fn building_a_context_connects_nothing() {
    let t = TestContext::new();
    assert!(t.backends.store().constructed.is_empty());
    assert!(t.backends.fs().constructed.is_empty());
    assert!(t.backends.sql().constructed.is_empty());
    assert!(t.backends.queue().constructed.is_empty());
    assert_eq!(t.pending(), 0);
}

// ============================================================================
// Loggers
// ============================================================================

#[test]
fn same_logger_pair_returns_same_instance() {
    let t = TestContext::new();

    let a = t.ctx.logger("ContactLoader", "daily");
    let b = t.ctx.logger("ContactLoader", "daily");
    let other = t.ctx.logger("ContactLoader", GLOBAL_PROCESS);

    assert!(Arc::ptr_eq(&a, &b));
    assert!(!Arc::ptr_eq(&a, &other));

    let typed = t.ctx.logger_for::<ContactLoader>("daily");
    assert!(Arc::ptr_eq(&typed, &t.ctx.logger_for::<ContactLoader>("daily")));
}

#[test]
fn logger_destination_follows_properties() {
    let console = TestContext::new();
    assert_eq!(
        console.ctx.logger("c", "p").destination(),
        LogDestination::Console
    );

    let durable = TestContext::with_properties(
        full_properties().with(PropertyName::ApplicationLogs, "hdfs"),
    );
    assert_eq!(
        durable.ctx.logger("c", "p").destination(),
        LogDestination::Durable
    );
}

// ============================================================================
// Shutdown
// ============================================================================

#[test]
fn close_context_disconnects_every_backend_despite_failures() {
    let t = TestContext::new();
    t.ctx.store();
    t.ctx.filesystem();
    t.ctx.relational();
    t.ctx.queue("contacts-out");
    t.backends.store().faults.fail_disconnect = true;
    t.backends.fs().faults.fail_disconnect = true;

    let failures = t.ctx.close_context();

    assert_eq!(failures, 2);
    assert_eq!(t.backends.store().disconnects, 1);
    assert_eq!(t.backends.fs().disconnects, 1);
    assert_eq!(t.backends.sql().disconnects, 1);
    assert_eq!(t.backends.queue().disconnects, 1);
    assert_eq!(t.errors(ErrorClass::Store).len(), 1);
    assert_eq!(t.errors(ErrorClass::Filesystem).len(), 1);
}

#[test]
fn close_context_runs_once() {
    let t = TestContext::new();
    t.ctx.store();
    t.ctx.appender("/out/a.csv").unwrap();

    t.ctx.close_context();
    assert_eq!(t.ctx.close_context(), 0);

    assert!(t.ctx.is_closed());
    assert_eq!(t.backends.store().disconnects, 1);
    assert_eq!(t.backends.fs().close_attempts.len(), 1);
}

#[test]
fn close_context_flushes_appender_content() {
    let t = TestContext::with_local_filesystem(full_properties());
    let stream = t.ctx.appender("/out/acq.log").unwrap();
    stream.lock().write_all(b"done\n").unwrap();

    assert_eq!(t.ctx.close_context(), 0);

    let path = t.dir.as_ref().unwrap().path().join("out/acq.log");
    assert_eq!(std::fs::read_to_string(path).unwrap(), "done\n");
}

// ============================================================================
// Process-wide slot
// ============================================================================

// The only test in this binary touching the global slot.
#[test]
fn global_context_is_built_once_under_contention() {
    let dir = TempDir::new().unwrap();
    let failed = ApplicationContext::global_or_try_init(|| {
        ApplicationContext::open(
            dir.path().join("absent.toml"),
            Arc::new(MemoryFactory::new(MemoryBackends::new())),
        )
    });
    assert!(matches!(failed, Err(ContextError::Config(_))));
    assert!(ApplicationContext::global().is_none());

    let builds = Arc::new(AtomicUsize::new(0));
    let barrier = Arc::new(Barrier::new(8));
    let backends = MemoryBackends::new();

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let builds = Arc::clone(&builds);
            let barrier = Arc::clone(&barrier);
            let backends = backends.clone();
            std::thread::spawn(move || {
                barrier.wait();
                let ctx = ApplicationContext::global_or_init(|| {
                    builds.fetch_add(1, Ordering::SeqCst);
                    let factory = Arc::new(MemoryFactory::new(backends));
                    ApplicationContext::new(full_properties(), factory)
                });
                Arc::as_ptr(ctx) as usize
            })
        })
        .collect();

    let pointers: Vec<usize> = handles.into_iter().map(|h| h.join().unwrap()).collect();

    assert_eq!(builds.load(Ordering::SeqCst), 1);
    assert!(pointers.windows(2).all(|w| w[0] == w[1]));
    let global = ApplicationContext::global().unwrap();
    assert_eq!(Arc::as_ptr(global) as usize, pointers[0]);

    let again = ApplicationContext::global_or_try_init(|| unreachable!()).unwrap();
    assert!(Arc::ptr_eq(again, global));
}
