//! Connector handle cache through the context.

use crate::common::*;
use std::sync::Arc;

#[test]
fn each_backend_kind_is_built_once() {
    let t = TestContext::new();

    for _ in 0..3 {
        t.ctx.store();
        t.ctx.filesystem();
        t.ctx.relational();
        t.ctx.queue("contacts-out");
    }

    assert_eq!(t.backends.store().constructed.len(), 1);
    assert_eq!(t.backends.fs().constructed.len(), 1);
    assert_eq!(t.backends.sql().constructed.len(), 1);
    assert_eq!(t.backends.queue().constructed.len(), 1);
    assert!(t.sink.events().is_empty());
}

#[test]
fn store_and_filesystem_share_kerberos_credentials() {
    let t = TestContext::new();
    t.ctx.store();
    t.ctx.filesystem();

    let store = t.backends.store().constructed[0].clone();
    let fs = t.backends.fs().constructed[0].clone();
    assert_eq!(store, fs);
    assert_eq!(store.user.as_deref(), Some("loader"));
}

#[test]
fn connect_failure_is_logged_with_the_backend_class() {
    let t = TestContext::new();
    t.backends.fs().faults.fail_connect = true;
    t.backends.queue().faults.fail_connect = true;

    assert!(!t.ctx.filesystem().lock().is_connected());
    assert!(!t.ctx.queue("contacts-out").lock().is_connected());

    assert_eq!(t.errors(ErrorClass::Filesystem).len(), 1);
    assert_eq!(t.errors(ErrorClass::Queue).len(), 1);
}

#[test]
fn missing_connection_properties_are_logged() {
    let t = TestContext::with_properties(Properties::new());

    t.ctx.store();

    // kerberos.user and kerberos.keytab
    assert_eq!(t.errors(ErrorClass::Config).len(), 2);
}

#[test]
fn queue_topic_is_fixed_by_first_request() {
    let t = TestContext::new();

    let first = t.ctx.queue("contacts-out");
    let second = t.ctx.queue("contacts-retry");

    assert!(Arc::ptr_eq(&first, &second));
    assert_eq!(first.lock().topic(), Some("contacts-out"));
    assert_eq!(t.backends.queue().topics, vec!["contacts-out".to_string()]);
    assert_eq!(t.warnings(ErrorClass::Queue).len(), 1);
}

#[test]
fn queue_client_ids_are_random() {
    let a = TestContext::new();
    let b = TestContext::new();
    a.ctx.queue("t");
    b.ctx.queue("t");

    let id_a = a.backends.queue().constructed[0].client_id.clone();
    let id_b = b.backends.queue().constructed[0].client_id.clone();
    assert_ne!(id_a, id_b);
    assert_eq!(
        a.backends.queue().constructed[0].zookeeper_quorum.as_deref(),
        Some("zk01:2181")
    );
}
