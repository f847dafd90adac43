//! Nested Transaction Tests
//!
//! Strict LIFO nesting: one physical transaction per outermost begin,
//! savepoints for every deeper level, level-local rollback, and the dead
//! flag suppressing redundant rollbacks after a backend abort.

use crate::common;
use proptest::prelude::*;
use relica::{
    AuditConfig, BackendError, Error, ErrorCategory, MySqlDialect, OracleDialect, Statement,
    UnitOutcome,
};
use std::sync::Arc;

// ============================================================================
// Physical-transaction boundaries
// ============================================================================

#[test]
fn outermost_begin_is_the_only_physical_begin() {
    let (mut conn, backend) = common::open_conn();
    conn.begin_transaction().unwrap();
    conn.begin_transaction().unwrap();
    conn.begin_transaction().unwrap();
    assert_eq!(backend.log().begin_count(), 1);

    conn.commit_transaction().unwrap();
    conn.commit_transaction().unwrap();
    assert_eq!(backend.log().commit_count(), 0);
    conn.commit_transaction().unwrap();
    assert_eq!(backend.log().commit_count(), 1);
}

#[test]
fn savepoint_names_follow_the_nesting_level() {
    let (mut conn, backend) = common::open_conn();
    conn.begin_transaction().unwrap();
    conn.begin_transaction().unwrap();
    conn.begin_transaction().unwrap();
    assert_eq!(backend.log().count_containing("SAVE TRANSACTION child1"), 1);
    assert_eq!(backend.log().count_containing("SAVE TRANSACTION child2"), 1);

    // Rolling back the innermost level reuses its own savepoint name.
    conn.rollback_transaction().unwrap();
    assert_eq!(
        backend.log().count_containing("ROLLBACK TRANSACTION child2"),
        1
    );

    // Beginning again at that level allocates child2 a second time.
    conn.begin_transaction().unwrap();
    assert_eq!(backend.log().count_containing("SAVE TRANSACTION child2"), 2);
    conn.rollback_transaction().unwrap();
    conn.rollback_transaction().unwrap();
    conn.rollback_transaction().unwrap();
}

#[test]
fn inner_rollback_leaves_outer_transaction_committable() {
    let (mut conn, backend) = common::open_conn();
    conn.begin_transaction().unwrap();
    conn.execute(&Statement::raw("INSERT INTO Item (ID) VALUES (1)"))
        .unwrap();
    conn.begin_transaction().unwrap();
    conn.execute(&Statement::raw("INSERT INTO Item (ID) VALUES (2)"))
        .unwrap();
    conn.rollback_transaction().unwrap();
    conn.commit_transaction().unwrap();
    assert_eq!(backend.log().commit_count(), 1);
    assert_eq!(backend.log().rollback_count(), 0);
}

#[test]
fn mismatched_commit_is_a_contract_violation() {
    let (mut conn, _backend) = common::open_conn();
    assert!(matches!(conn.commit_transaction(), Err(Error::Contract(_))));
    conn.begin_transaction().unwrap();
    conn.commit_transaction().unwrap();
    assert!(matches!(conn.commit_transaction(), Err(Error::Contract(_))));
}

// ============================================================================
// Dialect-specific savepoint SQL
// ============================================================================

#[test]
fn oracle_nesting_uses_savepoint_syntax() {
    let (mut conn, backend) =
        common::open_conn_with(Arc::new(OracleDialect::new()), AuditConfig::default());
    conn.begin_transaction().unwrap();
    conn.begin_transaction().unwrap();
    assert_eq!(backend.log().count_containing("SAVEPOINT child1"), 1);
    conn.rollback_transaction().unwrap();
    assert_eq!(
        backend.log().count_containing("ROLLBACK TO SAVEPOINT child1"),
        1
    );
    conn.rollback_transaction().unwrap();
}

#[test]
fn mysql_inner_commit_releases_the_savepoint() {
    let (mut conn, backend) =
        common::open_conn_with(Arc::new(MySqlDialect::new()), AuditConfig::default());
    conn.begin_transaction().unwrap();
    conn.begin_transaction().unwrap();
    conn.commit_transaction().unwrap();
    assert_eq!(
        backend.log().count_containing("RELEASE SAVEPOINT child1"),
        1
    );
    conn.commit_transaction().unwrap();
}

// ============================================================================
// Dead transactions
// ============================================================================

#[test]
fn backend_abort_suppresses_all_further_rollbacks() {
    let (mut conn, backend) = common::open_conn();
    conn.begin_transaction().unwrap();
    conn.begin_transaction().unwrap();
    backend.fail_matching(
        "DELETE FROM Item",
        BackendError::with_code(3930, "uncommittable transaction"),
    );
    let err = conn
        .execute(&Statement::raw("DELETE FROM Item"))
        .unwrap_err();
    assert!(matches!(
        err,
        Error::Backend {
            category: ErrorCategory::TransactionDoomed,
            ..
        }
    ));
    assert!(conn.is_transaction_dead());

    backend.log().clear();
    conn.rollback_transaction().unwrap();
    conn.rollback_transaction().unwrap();
    assert_eq!(backend.log().rollback_count(), 0);
    assert_eq!(backend.log().count_containing("ROLLBACK TRANSACTION"), 0);

    // The next transaction starts clean.
    conn.begin_transaction().unwrap();
    assert!(!conn.is_transaction_dead());
    conn.rollback_transaction().unwrap();
}

// ============================================================================
// Units of work
// ============================================================================

#[test]
fn nested_units_of_work_compose() {
    let (mut conn, backend) = common::open_conn();
    let outcome = conn
        .execute_in_transaction(|conn| {
            let inner = conn.execute_in_transaction::<(), _>(|conn| {
                conn.execute(&Statement::raw("UPDATE Item SET A = 1"))?;
                Ok(UnitOutcome::Rollback("inner gave up".into()))
            })?;
            assert_eq!(inner, None);
            Ok(UnitOutcome::Commit("outer"))
        })
        .unwrap();
    assert_eq!(outcome, Some("outer"));
    assert_eq!(backend.log().commit_count(), 1);
    assert_eq!(
        backend.log().count_containing("ROLLBACK TRANSACTION child1"),
        1
    );
}

// ============================================================================
// Properties
// ============================================================================

proptest! {
    /// Any balanced sequence of begin/commit/rollback keeps the tracked
    /// nesting level consistent and ends every physical transaction with
    /// exactly one physical commit or rollback.
    #[test]
    fn nesting_level_tracks_any_balanced_sequence(
        actions in proptest::collection::vec(0u8..3, 1..48)
    ) {
        let (mut conn, backend) = common::open_conn();
        let mut level = 0usize;
        for action in actions {
            match action {
                0 if level < 6 => {
                    conn.begin_transaction().unwrap();
                    level += 1;
                }
                1 if level > 0 => {
                    conn.commit_transaction().unwrap();
                    level -= 1;
                }
                2 if level > 0 => {
                    conn.rollback_transaction().unwrap();
                    level -= 1;
                }
                _ => {}
            }
            prop_assert_eq!(conn.nesting_level(), level);
            prop_assert_eq!(conn.in_transaction(), level > 0);
        }
        while level > 0 {
            conn.rollback_transaction().unwrap();
            level -= 1;
        }
        prop_assert_eq!(conn.nesting_level(), 0);
        prop_assert_eq!(
            backend.log().begin_count(),
            backend.log().commit_count() + backend.log().rollback_count()
        );
    }
}
