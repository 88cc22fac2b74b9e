//! Flush controller through the context.

use crate::common::*;
use bhc_contacts::{FlushError, RowSnapshot, WriteBuffer};

// ============================================================================
// Plain
// ============================================================================

#[test]
fn empty_flush_writes_nothing_and_warns_once() {
    let t = TestContext::new();

    let outcome = t.ctx.flush_contacts(FlushMode::Plain).unwrap();

    assert_eq!(outcome, FlushOutcome::Empty);
    assert_eq!(t.warnings(ErrorClass::Data).len(), 1);
    assert_eq!(t.sink.events().len(), 1);
    let store = t.backends.store();
    assert!(store.puts.is_empty());
    assert!(store.constructed.is_empty());
}

#[test]
fn repeated_key_keeps_last_mutation_only() {
    let t = TestContext::new();
    t.put(RowMutation::new("row1").with_cell("c", "status", "A"));
    t.put(RowMutation::new("row1").with_cell("c", "channel", "B"));

    {
        let buffer = t.ctx.puts();
        let all = buffer.get_all();
        assert_eq!(all.len(), 1);
        assert_eq!(all[&RowKey::from("row1")].cells()[0].qualifier, "channel");
    }

    t.ctx.flush_contacts(FlushMode::Plain).unwrap();

    let row = t.backends.store().row(PRIMARY, "row1");
    assert_eq!(row.cells().len(), 1);
    assert_eq!(stored(&t.backends, PRIMARY, "row1", "channel").as_deref(), Some("B"));
    assert!(row.latest("c", "status").is_none());
}

#[test]
fn plain_flush_commits_one_batch_and_clears() {
    let t = TestContext::new();
    t.put(contact("a", "sent", "mail"));
    t.put(contact("b", "queued", "sms"));
    t.put(contact("c", "sent", "push"));

    let outcome = t.ctx.flush_contacts(FlushMode::Plain).unwrap();

    assert_eq!(
        outcome,
        FlushOutcome::Committed {
            primary_rows: 3,
            staging_rows: 0
        }
    );
    assert_eq!(t.pending(), 0);
    assert_eq!(t.backends.store().puts, vec![(PRIMARY.to_string(), 3)]);
    assert_eq!(t.backends.store().row_count(STAGING), 0);
    assert!(t.sink.events().is_empty());
}

#[test]
fn failed_plain_flush_is_retry_safe() {
    let t = TestContext::new();
    t.put(contact("a", "sent", "mail"));
    t.put(RowMutation::new("b").with_versioned_cell("c", "status", 9, "queued"));
    let before: WriteBuffer = t.ctx.puts().clone();
    t.backends.store().faults.fail_put_tables.insert(PRIMARY.into());

    let err = t.ctx.flush_contacts(FlushMode::Plain).unwrap_err();

    assert!(matches!(err, FlushError::PrimaryCommit { .. }));
    assert_eq!(*t.ctx.puts(), before);
    assert_eq!(t.errors(ErrorClass::Store).len(), 1);

    // Same batch goes through once the store recovers
    t.backends.store().faults.fail_put_tables.clear();
    t.ctx.flush_contacts(FlushMode::Plain).unwrap();
    assert_eq!(t.pending(), 0);
    assert_eq!(stored(&t.backends, PRIMARY, "b", "status").as_deref(), Some("queued"));
}

#[test]
fn flush_against_disconnected_store_fails_and_keeps_buffer() {
    let t = TestContext::new();
    t.backends.store().faults.fail_connect = true;
    t.put(contact("a", "sent", "mail"));

    assert!(t.ctx.flush_contacts(FlushMode::Plain).is_err());

    assert_eq!(t.pending(), 1);
    // One for the connect, one for the commit
    assert_eq!(t.errors(ErrorClass::Store).len(), 2);
}

// ============================================================================
// Delta
// ============================================================================

#[test]
fn delta_flush_writes_reconciled_rows_to_staging() {
    let t = TestContext::new();
    t.backends
        .store()
        .seed(PRIMARY, "a", Cell::versioned("c", "origin", 1, "import"));
    t.put(contact("a", "sent", "mail"));
    t.put(contact("b", "queued", "sms"));

    let outcome = t.ctx.flush_contacts(FlushMode::Delta).unwrap();

    assert_eq!(
        outcome,
        FlushOutcome::Committed {
            primary_rows: 2,
            staging_rows: 2
        }
    );
    assert_eq!(
        t.backends.store().puts,
        vec![(PRIMARY.to_string(), 2), (STAGING.to_string(), 2)]
    );
    assert_eq!(t.pending(), 0);

    // Staging carries the whole primary row, not only the buffered columns
    assert_eq!(stored(&t.backends, STAGING, "a", "origin").as_deref(), Some("import"));
    assert_eq!(stored(&t.backends, STAGING, "a", "status").as_deref(), Some("sent"));
    assert_eq!(stored(&t.backends, STAGING, "b", "channel").as_deref(), Some("sms"));
}

#[test]
fn delta_flush_collapses_multi_version_rows() {
    let t = TestContext::new();
    t.put(
        RowMutation::new("a")
            .with_versioned_cell("c", "status", 1, "queued")
            .with_versioned_cell("c", "status", 5, "delivered")
            .with_versioned_cell("c", "status", 3, "sent"),
    );

    t.ctx.flush_contacts(FlushMode::Delta).unwrap();

    let primary: RowSnapshot = t.backends.store().row(PRIMARY, "a");
    assert_eq!(primary.cells().len(), 3);

    // One cell per column in staging, stamped by the store
    let staging = t.backends.store().row(STAGING, "a");
    assert_eq!(staging.cells().len(), 1);
    assert_eq!(staging.cells()[0].value, b"delivered".to_vec());
}

#[test]
fn delta_staging_failure_keeps_buffer_after_primary_commit() {
    let t = TestContext::new();
    t.put(contact("a", "sent", "mail"));
    let before: WriteBuffer = t.ctx.puts().clone();
    t.backends.store().faults.fail_put_tables.insert(STAGING.into());

    let err = t.ctx.flush_contacts(FlushMode::Delta).unwrap_err();

    assert!(matches!(err, FlushError::StagingCommit { .. }));
    assert_eq!(err.class(), ErrorClass::Store);
    assert_eq!(t.backends.store().puts, vec![(PRIMARY.to_string(), 1)]);
    assert_eq!(*t.ctx.puts(), before);
    assert_eq!(t.errors(ErrorClass::Store).len(), 1);
}

#[test]
fn delta_read_back_failure_keeps_buffer() {
    let t = TestContext::new();
    t.put(contact("a", "sent", "mail"));
    t.backends.store().faults.fail_get = true;

    let err = t.ctx.flush_contacts(FlushMode::Delta).unwrap_err();

    match err {
        FlushError::ReadBack { table, key, .. } => {
            assert_eq!(table, PRIMARY);
            assert_eq!(key, RowKey::from("a"));
        }
        other => panic!("unexpected error: {other}"),
    }
    assert_eq!(t.pending(), 1);
    assert_eq!(t.backends.store().row_count(STAGING), 0);
}

#[test]
fn buffered_values_are_not_rewritten_by_reconciliation() {
    let t = TestContext::new();
    t.backends
        .store()
        .seed(PRIMARY, "a", Cell::versioned("c", "status", u64::MAX, "pinned"));
    t.put(RowMutation::new("a").with_cell("c", "status", "sent"));
    t.backends.store().faults.fail_put_tables.insert(STAGING.into());

    assert!(t.ctx.flush_contacts(FlushMode::Delta).is_err());

    let buffer = t.ctx.puts();
    let pending = buffer.get(&RowKey::from("a")).unwrap();
    assert_eq!(pending.cells()[0].value, b"sent".to_vec());
}

#[test]
fn staging_only_flush_skips_primary() {
    let t = TestContext::new();
    t.backends
        .store()
        .seed(PRIMARY, "a", Cell::versioned("c", "status", 2, "delivered"));
    t.put(contact("a", "sent", "mail"));

    t.ctx.flush_contacts(FlushMode::StagingOnly).unwrap();

    assert_eq!(t.backends.store().puts, vec![(STAGING.to_string(), 1)]);
    assert_eq!(stored(&t.backends, STAGING, "a", "status").as_deref(), Some("delivered"));
    assert_eq!(stored(&t.backends, STAGING, "a", "channel").as_deref(), Some("mail"));
    assert_eq!(stored(&t.backends, PRIMARY, "a", "channel"), None);
    assert_eq!(t.ctx.store().lock().table(), Some(STAGING));
}

#[test]
fn missing_table_names_abort_before_writing() {
    let t = TestContext::with_properties(
        Properties::new().with(PropertyName::HbaseContactsTable, PRIMARY),
    );
    t.put(contact("a", "sent", "mail"));

    let err = t.ctx.flush_contacts(FlushMode::Delta).unwrap_err();

    assert!(matches!(err, FlushError::Config(_)));
    assert_eq!(t.errors(ErrorClass::Config).len(), 1);
    assert!(t.backends.store().puts.is_empty());
    assert_eq!(t.pending(), 1);
}

// ============================================================================
// Locking
// ============================================================================

#[test]
fn put_then_flush_under_one_guard() {
    let t = TestContext::new();

    let outcome = {
        let mut buffer = t.ctx.puts();
        buffer.put(contact("a", "sent", "mail"));
        t.ctx.flush_locked(&mut buffer, FlushMode::Plain).unwrap()
    };

    assert_eq!(
        outcome,
        FlushOutcome::Committed {
            primary_rows: 1,
            staging_rows: 0
        }
    );
    assert_eq!(t.pending(), 0);
}

#[test]
fn concurrent_producers_serialize_on_the_buffer() {
    let t = TestContext::new();

    std::thread::scope(|s| {
        for worker in 0..4 {
            let ctx = &t.ctx;
            s.spawn(move || {
                for i in 0..25 {
                    let mut buffer = ctx.puts();
                    buffer.put(contact(&format!("w{worker}-{i}"), "sent", "mail"));
                    ctx.flush_locked(&mut buffer, FlushMode::Plain).unwrap();
                }
            });
        }
    });

    assert_eq!(t.backends.store().row_count(PRIMARY), 100);
    assert_eq!(t.backends.store().puts.len(), 100);
}
