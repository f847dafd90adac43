//! Relica - Transactional data-access core
//!
//! Relica layers nested transactions, commit-time validation, deadlock
//! retry, copy-on-write revision history, and modification objects over a
//! swappable backend, with one dialect adapter per supported backend
//! family.
//!
//! # Quick Start
//!
//! ```ignore
//! use relica::{
//!     AuditConfig, BackendRegistry, Connection, ConnectionProfile,
//!     BackendKind, DialectSequence, UnitOutcome,
//! };
//! use std::sync::Arc;
//!
//! let profile = ConnectionProfile::new(BackendKind::SqlServer, "db01", "erp");
//! let dialect = BackendRegistry::builtin().resolve_default(profile.backend)?;
//! let mut conn = Connection::new(
//!     backend,
//!     dialect,
//!     profile,
//!     AuditConfig::default(),
//!     Arc::new(DialectSequence::new("MainSequence")),
//! );
//! conn.open()?;
//!
//! conn.execute_in_transaction(|conn| {
//!     // ... issue statements, register commit-time validations ...
//!     Ok(UnitOutcome::Commit(()))
//! })?;
//! ```
//!
//! # Architecture
//!
//! The workspace splits along the seams of the domain: `relica-core`
//! holds values, statements, and the error taxonomy; `relica-dialect`
//! the per-backend SQL and error-code adapters; `relica-backend` the
//! physical command-execution trait (plus the scriptable test double);
//! `relica-conn` the connection and transaction manager; `relica-revision`
//! the copy-on-write history; and `relica-access` the modification
//! objects and access state. This facade re-exports the public surface.

pub use relica_access::state;
pub use relica_access::{
    AccessState, ChangeSet, Modification, ModificationLogic, ModificationMode, NoLogic,
    OverrideGuard, SharedState, TableDescriptor,
};
pub use relica_backend::{Backend, BackendEvent, BackendResult, EventLog, MockBackend};
pub use relica_conn::{
    Connection, CounterSequence, DialectSequence, RetryPolicy, SequenceSource, ValidationCheck,
};
pub use relica_core::{
    AuditConfig, BackendError, BackendKind, CommandContext, Condition, ConnectionProfile, Error,
    ErrorCategory, IsolationLevel, Result, Row, SqlParam, SqlValue, Statement, UnitOutcome,
    ValidationFailure,
};
pub use relica_dialect::{
    BackendRegistry, Dialect, ErrorCodeConfig, MySqlDialect, OracleDialect, SqlServerDialect,
};
pub use relica_revision::{CopySummary, RevisionHistory, RevisionedTable};
