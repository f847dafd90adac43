//! Retry Policy Tests
//!
//! Deadlock-victim units of work are re-run from a clean slate; nothing
//! else is ever retried.

use crate::common;
use relica::{BackendError, Error, RetryPolicy, Statement, UnitOutcome};
use std::time::Duration;

fn policy() -> RetryPolicy {
    RetryPolicy::with_delay(Duration::ZERO)
}

#[test]
fn deadlock_victim_is_rerun_until_it_commits() {
    let (mut conn, backend) = common::open_conn();
    // Two consecutive deadlocks, then clear.
    backend.fail_matching("UPDATE Item", BackendError::with_code(1205, "deadlock victim"));
    backend.fail_matching("UPDATE Item", BackendError::with_code(1205, "deadlock victim"));

    let mut attempts = 0;
    let value = policy()
        .run(&mut conn, |conn| {
            attempts += 1;
            conn.execute_in_transaction(|conn| {
                conn.execute(&Statement::raw("UPDATE Item SET Stock = Stock - 1"))?;
                Ok(UnitOutcome::Commit(attempts))
            })
        })
        .unwrap();

    assert_eq!(value, Some(3));
    assert_eq!(backend.log().begin_count(), 3);
    assert_eq!(backend.log().rollback_count(), 2);
    assert_eq!(backend.log().commit_count(), 1);
}

#[test]
fn snapshot_conflict_counts_as_concurrency() {
    let (mut conn, backend) = common::open_conn();
    backend.fail_matching(
        "UPDATE Item",
        BackendError::with_code(3960, "snapshot isolation conflict"),
    );
    let value = policy()
        .run(&mut conn, |conn| {
            conn.execute_in_transaction(|conn| {
                conn.execute(&Statement::raw("UPDATE Item SET A = 1"))?;
                Ok(UnitOutcome::Commit(()))
            })
        })
        .unwrap();
    assert_eq!(value, Some(()));
    assert_eq!(backend.log().begin_count(), 2);
}

#[test]
fn timeout_is_not_retried() {
    let (mut conn, backend) = common::open_conn();
    backend.fail_matching("UPDATE Item", BackendError::with_code(-2, "timeout expired"));
    let mut attempts = 0;
    let err = policy()
        .run::<Option<()>, _>(&mut conn, |conn| {
            attempts += 1;
            conn.execute_in_transaction(|conn| {
                conn.execute(&Statement::raw("UPDATE Item SET A = 1"))?;
                Ok(UnitOutcome::Commit(()))
            })
        })
        .unwrap_err();
    assert!(matches!(err, Error::Timeout { .. }));
    assert_eq!(attempts, 1);
}

#[test]
fn commit_time_validation_failure_is_not_retried() {
    let (mut conn, _backend) = common::open_conn();
    let mut attempts = 0;
    let err = policy()
        .run::<Option<()>, _>(&mut conn, |conn| {
            attempts += 1;
            conn.execute_in_transaction(|conn| {
                conn.add_commit_time_validation("CheckBudget", |_| {
                    Ok(Some("budget exceeded".into()))
                })?;
                Ok(UnitOutcome::Commit(()))
            })
        })
        .unwrap_err();
    assert!(matches!(err, Error::CommitValidation { .. }));
    assert_eq!(attempts, 1);
}

#[test]
fn capped_policy_gives_up_with_the_last_error() {
    let (mut conn, backend) = common::open_conn();
    for _ in 0..5 {
        backend.fail_matching("UPDATE Item", BackendError::with_code(1205, "deadlock victim"));
    }
    let err = policy()
        .max_attempts(3)
        .run::<Option<()>, _>(&mut conn, |conn| {
            conn.execute_in_transaction(|conn| {
                conn.execute(&Statement::raw("UPDATE Item SET A = 1"))?;
                Ok(UnitOutcome::Commit(()))
            })
        })
        .unwrap_err();
    assert!(err.is_concurrency());
    assert_eq!(backend.log().begin_count(), 3);
}

#[test]
fn running_inside_an_open_transaction_is_refused() {
    let (mut conn, _backend) = common::open_conn();
    conn.begin_transaction().unwrap();
    let err = policy().run::<(), _>(&mut conn, |_| Ok(())).unwrap_err();
    assert!(matches!(err, Error::Contract(_)));
    conn.rollback_transaction().unwrap();
}
