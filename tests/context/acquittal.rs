//! Acquittal routing per environment.

use crate::common::*;
use bhc_contacts::{ConfigError, ContextError, Environment};
use chrono::NaiveDate;

fn at() -> chrono::NaiveDateTime {
    NaiveDate::from_ymd_opt(2024, 11, 2)
        .and_then(|d| d.and_hms_milli_opt(23, 59, 58, 7))
        .unwrap()
}

#[test]
fn non_production_reuses_cached_reporting_handle() {
    let t = TestContext::new();
    assert_eq!(t.ctx.environment(), &Environment::Other("Rec".into()));

    t.ctx.acquittal_at("contacts", "START", at()).unwrap();
    t.ctx.acquittal_at("contacts", "END", at()).unwrap();

    let sql = t.backends.sql();
    assert_eq!(sql.constructed.len(), 1);
    assert_eq!(sql.constructed[0].database.as_deref(), Some("reporting"));
    assert_eq!(sql.executed.len(), 2);
    assert!(sql.executed.iter().all(|s| s.connection == 0));
    assert_eq!(
        sql.executed[0].sql,
        "INSERT INTO ACQUITTEMENT (TABLE_CIBLE, ACTION, [DATE/HEURE]) \
         VALUES('contacts','START','2024-11-02 23:59:58.007')"
    );
    // The cached handle stays open for the rest of the run
    assert_eq!(sql.disconnects, 0);
}

#[test]
fn production_opens_a_fresh_bypass_connection() {
    let t = TestContext::with_properties(production_properties());
    assert!(t.ctx.environment().is_production());

    // Make sure a cached reporting handle exists and is not used
    let _cached = t.ctx.relational();
    t.ctx.acquittal_at("contacts", "LOAD", at()).unwrap();
    t.ctx.acquittal_at("contacts", "LOAD", at()).unwrap();

    let sql = t.backends.sql();
    assert_eq!(sql.constructed.len(), 3);
    assert_eq!(sql.constructed[1].host.as_deref(), Some("sql-prod"));
    assert_eq!(sql.constructed[1].database.as_deref(), Some("acquittals"));
    assert_eq!(sql.constructed[1].user.as_deref(), Some("acq"));
    let connections: Vec<_> = sql.executed.iter().map(|s| s.connection).collect();
    assert_eq!(connections, vec![1, 2]);
    // Each bypass connection is closed after its write
    assert_eq!(sql.disconnects, 2);
}

#[test]
fn production_connect_failure_still_attempts_the_write() {
    let t = TestContext::with_properties(production_properties());
    t.backends.sql().faults.fail_connect = true;

    let err = t.ctx.acquittal_at("contacts", "LOAD", at()).unwrap_err();

    assert!(matches!(err, ContextError::Acquittal(_)));
    // Connect failure, then the write failure
    assert_eq!(t.errors(ErrorClass::Relational).len(), 2);
    assert_eq!(t.backends.sql().constructed.len(), 1);
    assert_eq!(t.backends.sql().disconnects, 1);
}

#[test]
fn write_failure_is_logged_and_returned() {
    let t = TestContext::new();
    t.backends.sql().faults.fail_update = true;

    let err = t.ctx.acquittal("contacts", "LOAD").unwrap_err();

    assert!(matches!(err, ContextError::Acquittal(_)));
    let errors = t.errors(ErrorClass::Relational);
    assert_eq!(errors.len(), 1);
    assert!(errors[0].message.contains("contacts"));
}

#[test]
fn missing_acquittal_table_is_a_config_error() {
    let t = TestContext::with_properties(Properties::new());

    let err = t.ctx.acquittal("contacts", "LOAD").unwrap_err();

    assert!(matches!(
        err,
        ContextError::Config(ConfigError::Missing(PropertyName::SqlServerAcquittalTable))
    ));
    assert!(t.backends.sql().executed.is_empty());
}
