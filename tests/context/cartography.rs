//! Cartography load through the context.

use crate::common::*;
use bhc_contacts::{CartographyEntry, ContextError, SqlRow};

fn seed_cartography(t: &TestContext) {
    t.backends.sql().procedures.insert(
        CARTOGRAPHY_PROCEDURE.to_string(),
        vec![
            SqlRow::from_strs(&["EMAIL", "tpl_email_v2", "merge"]),
            SqlRow::from_strs(&["EMAIL", "tpl_email_v1", "replace"]),
            SqlRow::from_strs(&["SMS", "tpl_sms", "merge"]),
        ],
    );
}

#[test]
fn cartography_loads_once_over_a_dedicated_connection() {
    let t = TestContext::new();
    seed_cartography(&t);

    let map = t.ctx.cartography().unwrap();
    assert_eq!(map.len(), 2);
    assert_eq!(map["EMAIL"].len(), 2);
    assert!(map["SMS"].contains(&CartographyEntry::new("SMS", "merge", "tpl_sms")));

    // Second call is served from the cache
    let again = t.ctx.cartography().unwrap();
    assert!(std::ptr::eq(map, again));

    let sql = t.backends.sql();
    assert_eq!(sql.constructed.len(), 1);
    assert_eq!(sql.constructed[0].database.as_deref(), Some("cartography"));
    assert_eq!(sql.disconnects, 1);
}

#[test]
fn cartography_failure_is_returned_and_retried() {
    let t = TestContext::new();
    seed_cartography(&t);
    t.backends.sql().faults.fail_procedure = true;

    let err = t.ctx.cartography().unwrap_err();
    assert!(matches!(err, ContextError::Cartography(_)));
    assert_eq!(t.errors(ErrorClass::Relational).len(), 1);

    t.backends.sql().faults.fail_procedure = false;
    let map = t.ctx.cartography().unwrap();
    assert_eq!(map.len(), 2);
    assert_eq!(t.backends.sql().constructed.len(), 2);
}

#[test]
fn cartography_connect_failure_is_fatal_for_the_caller() {
    let t = TestContext::new();
    seed_cartography(&t);
    t.backends.sql().faults.fail_connect = true;

    assert!(matches!(
        t.ctx.cartography(),
        Err(ContextError::Cartography(_))
    ));
    // The connection is still released
    assert_eq!(t.backends.sql().disconnects, 1);
}

#[test]
fn cartography_without_procedure_name_is_a_config_error() {
    let t = TestContext::with_properties(Properties::new());

    assert!(matches!(t.ctx.cartography(), Err(ContextError::Config(_))));
    assert!(t.backends.sql().constructed.is_empty());
}
