//! Dialect adapters for the supported backend families
//!
//! A `Dialect` translates the core's backend-neutral operations into
//! vendor SQL: connection strings, isolation levels, savepoints, parameter
//! placeholders, identity and sequence retrieval, and error-code
//! classification. One implementation exists per [`BackendKind`]; the
//! connection selects it at construction time through the
//! [`BackendRegistry`], never by runtime type inspection.

pub mod codes;
pub mod mysql;
pub mod oracle;
pub mod registry;
pub mod sqlserver;

pub use codes::ErrorCodeConfig;
pub use mysql::MySqlDialect;
pub use oracle::OracleDialect;
pub use registry::BackendRegistry;
pub use sqlserver::SqlServerDialect;

use relica_core::config::{BackendKind, ConnectionProfile, IsolationLevel};
use relica_core::error::{BackendError, ErrorCategory};

/// Vendor-specific SQL generation and error classification.
///
/// Object-safe; the connection holds an `Arc<dyn Dialect>` selected once
/// at construction.
pub trait Dialect: Send + Sync + std::fmt::Debug {
    /// The backend family this dialect serves.
    fn kind(&self) -> BackendKind;

    /// Build the driver connection string from a profile. The connection
    /// hands this string to `Backend::open` when it establishes the
    /// physical link.
    fn connection_string(&self, profile: &ConnectionProfile) -> String;

    /// Statements applied once after the connection opens (session-level
    /// case sensitivity, time zone, and similar settings).
    fn session_setup(&self) -> Vec<String> {
        Vec::new()
    }

    /// Isolation level for the outermost transaction: snapshot-style
    /// optimistic isolation where the backend supports it, read-committed
    /// otherwise.
    fn begin_isolation(&self) -> IsolationLevel;

    /// `SET TRANSACTION ISOLATION LEVEL` text for a level. Backend
    /// drivers whose native begin call takes no isolation argument issue
    /// this statement inside `Backend::begin`; `None` when the level is
    /// the backend's default and needs no statement.
    fn isolation_sql(&self, level: IsolationLevel) -> Option<String>;

    /// Create a named savepoint.
    fn create_savepoint_sql(&self, name: &str) -> String;

    /// Roll back to a named savepoint without ending the transaction.
    fn rollback_to_savepoint_sql(&self, name: &str) -> String;

    /// Release a named savepoint on inner commit, for backends that keep
    /// savepoints allocated until released.
    fn release_savepoint_sql(&self, _name: &str) -> Option<String> {
        None
    }

    /// Placeholder text for the parameter at `index` (1-based) named
    /// `name`.
    fn placeholder(&self, index: usize, name: &str) -> String;

    /// Statement fetching the identity value generated by the immediately
    /// preceding insert, where the backend generates identities.
    fn identity_fetch_sql(&self, table: &str, column: &str) -> Option<String>;

    /// Statement yielding the next value of a named sequence.
    fn next_sequence_sql(&self, sequence: &str) -> String;

    /// Categorize a raw backend error.
    fn categorize(&self, error: &BackendError) -> ErrorCategory;

    /// Violated constraint name, when the error carries one.
    fn constraint_name(&self, error: &BackendError) -> Option<String> {
        error.constraint.clone()
    }
}
