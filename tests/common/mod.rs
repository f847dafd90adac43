//! Shared test utilities for all integration test suites.
//!
//! Import via `mod common;` from any test's main.rs.

#![allow(dead_code)]

use relica::{
    AuditConfig, BackendKind, Connection, ConnectionProfile, CounterSequence, Dialect,
    MockBackend, SqlServerDialect, SqlValue, TableDescriptor,
};
use std::sync::Arc;

/// Profile against the mock backend; the database name shows up in error
/// diagnostics.
pub fn profile() -> ConnectionProfile {
    ConnectionProfile::new(BackendKind::SqlServer, "db01", "erp")
}

/// An open connection over a fresh mock backend, SQL-Server dialect,
/// counter-backed sequence starting at 100, event log cleared.
pub fn open_conn() -> (Connection, MockBackend) {
    open_conn_with(Arc::new(SqlServerDialect::new()), AuditConfig::default())
}

/// Same as [`open_conn`] with an explicit dialect and audit layout.
pub fn open_conn_with(dialect: Arc<dyn Dialect>, audit: AuditConfig) -> (Connection, MockBackend) {
    let backend = MockBackend::new();
    let mut conn = Connection::new(
        Box::new(backend.clone()),
        dialect,
        profile(),
        audit,
        Arc::new(CounterSequence::starting_at(100)),
    );
    conn.open().expect("mock backend open");
    backend.log().clear();
    (conn, backend)
}

/// Plain three-column table keyed on ID.
pub fn item_descriptor() -> TableDescriptor {
    TableDescriptor::new(
        "Item",
        vec!["ID".into(), "Code".into(), "Name".into()],
        vec!["ID".into()],
    )
    .expect("valid descriptor")
}

/// The same table with copy-on-write revisioning enabled.
pub fn revisioned_item_descriptor() -> TableDescriptor {
    item_descriptor().with_revisioning()
}

/// Current values of the canonical item row keyed by ID 7, as a
/// single-row update wants them.
pub fn item_current_values() -> Vec<(String, SqlValue)> {
    vec![
        ("ID".into(), SqlValue::I64(7)),
        ("Code".into(), SqlValue::Text("B-17".into())),
        ("Name".into(), SqlValue::Text("washer".into())),
    ]
}
