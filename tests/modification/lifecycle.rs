//! Modification Lifecycle Tests
//!
//! Mode transitions and statement emission of a single modification
//! object.

use crate::common;
use relica::{
    BackendError, Error, Modification, ModificationMode, NoLogic, SqlValue, UnitOutcome,
};

#[test]
fn insert_then_successive_updates_target_the_created_row() {
    let (mut conn, backend) = common::open_conn();
    conn.begin_transaction().unwrap();

    let mut m = Modification::for_insert(common::item_descriptor());
    m.set("ID", 7i64).unwrap();
    m.set("Code", "B-17").unwrap();
    m.set("Name", "bolt").unwrap();
    m.execute(&mut conn, &NoLogic).unwrap();
    assert_eq!(m.mode(), ModificationMode::Update);
    assert_eq!(
        backend
            .log()
            .count_containing("INSERT INTO Item (ID, Code, Name)"),
        1
    );

    backend.log().clear();
    m.set("Name", "hex bolt").unwrap();
    m.execute(&mut conn, &NoLogic).unwrap();
    assert_eq!(
        backend
            .log()
            .statements()
            .iter()
            .filter(|s| s.as_str() == "UPDATE Item SET Name = @p1 WHERE ID = @p2")
            .count(),
        1
    );

    // Repeating the same value afterwards is a no-op.
    backend.log().clear();
    m.set("Name", "hex bolt").unwrap();
    m.execute(&mut conn, &NoLogic).unwrap();
    assert_eq!(backend.log().count_containing("UPDATE"), 0);
    conn.commit_transaction().unwrap();
}

#[test]
fn generated_identity_keys_the_subsequent_updates() {
    let (mut conn, backend) = common::open_conn();
    conn.begin_transaction().unwrap();
    backend.push_scalar(Some(SqlValue::I64(512)));

    let mut m = Modification::for_insert(
        common::item_descriptor().with_identity("ID").unwrap(),
    );
    m.set("Code", "B-17").unwrap();
    m.execute(&mut conn, &NoLogic).unwrap();
    assert_eq!(m.get("ID"), Some(&SqlValue::I64(512)));

    backend.log().clear();
    m.set("Name", "bolt").unwrap();
    m.execute(&mut conn, &NoLogic).unwrap();
    let insert = backend
        .log()
        .snapshot()
        .into_iter()
        .find_map(|e| match e {
            relica::BackendEvent::Execute { sql, params, .. } if sql.starts_with("UPDATE") => {
                Some(params)
            }
            _ => None,
        })
        .expect("update recorded");
    assert_eq!(insert[1].value, SqlValue::I64(512));
    conn.commit_transaction().unwrap();
}

#[test]
fn single_row_update_conditions_come_from_the_key() {
    let (mut conn, backend) = common::open_conn();
    conn.begin_transaction().unwrap();
    let mut m = Modification::for_single_row_update(
        common::item_descriptor(),
        common::item_current_values(),
    )
    .unwrap();
    m.set("Code", "B-18").unwrap();
    m.execute(&mut conn, &NoLogic).unwrap();
    assert_eq!(
        backend
            .log()
            .count_containing("UPDATE Item SET Code = @p1 WHERE ID = @p2"),
        1
    );
    conn.commit_transaction().unwrap();
}

#[test]
fn reassigning_current_values_to_a_fresh_object_emits_nothing() {
    let (mut conn, backend) = common::open_conn();
    conn.begin_transaction().unwrap();
    let mut m = Modification::for_single_row_update(
        common::item_descriptor(),
        common::item_current_values(),
    )
    .unwrap();
    // The row already holds these values; the object was just built and
    // has executed nothing yet.
    m.set("Code", "B-17").unwrap();
    m.set("Name", "washer").unwrap();
    assert!(!m.is_dirty());
    m.execute(&mut conn, &NoLogic).unwrap();
    assert!(backend.log().statements().is_empty());
    conn.commit_transaction().unwrap();
}

#[test]
fn single_row_update_without_its_key_value_is_refused() {
    let err = Modification::for_single_row_update(
        common::item_descriptor(),
        vec![("Code".into(), SqlValue::Text("B-17".into()))],
    )
    .unwrap_err();
    assert!(matches!(err, Error::Contract(_)));
}

#[test]
fn single_row_update_rejects_unknown_columns() {
    let err = Modification::for_single_row_update(
        common::item_descriptor(),
        vec![
            ("ID".into(), SqlValue::I64(7)),
            ("Color".into(), SqlValue::Text("red".into())),
        ],
    )
    .unwrap_err();
    assert!(matches!(err, Error::Contract(_)));
}

#[test]
fn long_running_modification_flags_every_statement_it_emits() {
    let (mut conn, backend) = common::open_conn();
    conn.begin_transaction().unwrap();
    let mut m = Modification::for_single_row_update(
        common::item_descriptor(),
        common::item_current_values(),
    )
    .unwrap();
    m.set_long_running(true);
    m.set("Name", "bolt").unwrap();
    m.execute(&mut conn, &NoLogic).unwrap();
    let flagged = backend
        .log()
        .snapshot()
        .into_iter()
        .find_map(|e| match e {
            relica::BackendEvent::Execute {
                sql, long_running, ..
            } if sql.starts_with("UPDATE Item") => Some(long_running),
            _ => None,
        })
        .expect("update recorded");
    assert!(flagged);
    conn.commit_transaction().unwrap();
}

#[test]
fn friendly_message_replaces_the_constraint_violation() {
    let (mut conn, backend) = common::open_conn();
    conn.begin_transaction().unwrap();
    backend.fail_matching(
        "INSERT INTO Item",
        BackendError::with_code(2627, "Violation of UNIQUE KEY constraint")
            .constraint("UQ_Item_Code"),
    );
    let descriptor = common::item_descriptor()
        .with_constraint_message("UQ_Item_Code", "An item with this code already exists.");
    let mut m = Modification::for_insert(descriptor);
    m.set("ID", 7i64).unwrap();
    m.set("Code", "B-17").unwrap();
    let err = m.execute(&mut conn, &NoLogic).unwrap_err();
    assert!(matches!(err, Error::DataModification { .. }));
    assert_eq!(err.to_string(), "An item with this code already exists.");
    conn.rollback_transaction().unwrap();
}

#[test]
fn modification_failure_leaves_the_transaction_usable() {
    let (mut conn, backend) = common::open_conn();
    backend.fail_matching(
        "INSERT INTO Item",
        BackendError::with_code(2627, "duplicate").constraint("UQ_Item_Code"),
    );
    let outcome = conn
        .execute_in_transaction(|conn| {
            let mut m = Modification::for_insert(
                common::item_descriptor()
                    .with_constraint_message("UQ_Item_Code", "Duplicate item code."),
            );
            m.set("ID", 7i64)?;
            m.set("Code", "B-17")?;
            match m.execute(conn, &NoLogic) {
                Err(Error::DataModification { message }) => Ok(UnitOutcome::Rollback(message)),
                other => {
                    other?;
                    Ok(UnitOutcome::Commit(()))
                }
            }
        })
        .unwrap();
    assert_eq!(outcome, None);
    assert_eq!(backend.log().rollback_count(), 1);
}
