//! User Transaction Tests
//!
//! One logical identifier per physical transaction, allocated lazily from
//! the sequence and persisted to the audit table the moment it is first
//! asked for.

use crate::common;
use relica::{AuditConfig, BackendEvent, Error, SqlValue};
use std::sync::Arc;

#[test]
fn identifier_is_allocated_once_and_persisted_immediately() {
    let (mut conn, backend) = common::open_conn();
    conn.begin_transaction().unwrap();
    assert_eq!(backend.log().count_containing("INSERT INTO UserTransaction"), 0);

    let id = conn.user_transaction_id().unwrap();
    assert_eq!(backend.log().count_containing("INSERT INTO UserTransaction"), 1);

    // Repeated asks hit the cache, not the backend.
    assert_eq!(conn.user_transaction_id().unwrap(), id);
    assert_eq!(conn.user_transaction_id().unwrap(), id);
    assert_eq!(backend.log().count_containing("INSERT INTO UserTransaction"), 1);
    conn.commit_transaction().unwrap();
}

#[test]
fn each_physical_transaction_gets_its_own_identifier() {
    let (mut conn, _backend) = common::open_conn();
    conn.begin_transaction().unwrap();
    let first = conn.user_transaction_id().unwrap();
    conn.commit_transaction().unwrap();

    conn.begin_transaction().unwrap();
    let second = conn.user_transaction_id().unwrap();
    conn.rollback_transaction().unwrap();

    conn.begin_transaction().unwrap();
    let third = conn.user_transaction_id().unwrap();
    conn.rollback_transaction().unwrap();

    assert_ne!(first, second);
    assert_ne!(second, third);
}

#[test]
fn nested_levels_share_the_outer_identifier() {
    let (mut conn, _backend) = common::open_conn();
    conn.begin_transaction().unwrap();
    let outer = conn.user_transaction_id().unwrap();
    conn.begin_transaction().unwrap();
    assert_eq!(conn.user_transaction_id().unwrap(), outer);
    assert!(conn.user_transaction_is_current(outer));
    conn.commit_transaction().unwrap();
    conn.commit_transaction().unwrap();
}

#[test]
fn outside_a_transaction_the_ask_is_a_contract_violation() {
    let (mut conn, _backend) = common::open_conn();
    assert!(matches!(conn.user_transaction_id(), Err(Error::Contract(_))));
    assert!(!conn.user_transaction_is_current(1));
}

#[test]
fn acting_user_is_recorded_on_the_audit_row() {
    let (mut conn, backend) = common::open_conn_with(
        Arc::new(relica::SqlServerDialect::new()),
        AuditConfig::default().with_acting_user("j.doe"),
    );
    conn.begin_transaction().unwrap();
    conn.user_transaction_id().unwrap();

    let insert = backend
        .log()
        .snapshot()
        .into_iter()
        .find_map(|e| match e {
            BackendEvent::Execute { sql, params, .. }
                if sql.starts_with("INSERT INTO UserTransaction") =>
            {
                Some(params)
            }
            _ => None,
        })
        .expect("audit insert recorded");
    assert!(insert
        .iter()
        .any(|p| p.value == SqlValue::Text("j.doe".into())));
    conn.rollback_transaction().unwrap();
}

#[test]
fn missing_acting_user_is_stored_as_null() {
    let (mut conn, backend) = common::open_conn();
    conn.begin_transaction().unwrap();
    conn.user_transaction_id().unwrap();
    let insert = backend
        .log()
        .snapshot()
        .into_iter()
        .find_map(|e| match e {
            BackendEvent::Execute { sql, params, .. }
                if sql.starts_with("INSERT INTO UserTransaction") =>
            {
                Some(params)
            }
            _ => None,
        })
        .expect("audit insert recorded");
    assert_eq!(insert[2].value, SqlValue::Null);
    conn.rollback_transaction().unwrap();
}

#[test]
fn custom_audit_layout_is_honored() {
    let audit = AuditConfig {
        user_transaction_table: "AUDIT_TXN".into(),
        user_transaction_id_column: "TXN_ID".into(),
        user_transaction_created_column: "CREATED".into(),
        user_transaction_user_column: "LOGIN".into(),
        ..AuditConfig::default()
    };
    let (mut conn, backend) =
        common::open_conn_with(Arc::new(relica::SqlServerDialect::new()), audit);
    conn.begin_transaction().unwrap();
    conn.user_transaction_id().unwrap();
    assert_eq!(
        backend
            .log()
            .count_containing("INSERT INTO AUDIT_TXN (TXN_ID, CREATED, LOGIN)"),
        1
    );
    conn.rollback_transaction().unwrap();
}
