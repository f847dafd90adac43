//! Core types for Relica
//!
//! This crate defines the foundational types used throughout the
//! data-access core:
//! - SqlValue / SqlParam / Row: values flowing through commands and results
//! - Statement: parameterized SQL with a long-running marker
//! - Condition: the equality conditions modification objects filter by
//! - BackendKind / IsolationLevel / ConnectionProfile: connection config
//! - AuditConfig: revision and user-transaction table layout
//! - Error: the error taxonomy (connection, concurrency, timeout,
//!   data-modification, contract)
//! - UnitOutcome: explicit commit-or-rollback outcome for transactional
//!   units of work

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod audit;
pub mod config;
pub mod error;
pub mod statement;
pub mod value;

// Re-export commonly used types
pub use audit::AuditConfig;
pub use config::{BackendKind, ConnectionProfile, IsolationLevel};
pub use error::{
    BackendError, CommandContext, Error, ErrorCategory, Result, ValidationFailure,
};
pub use statement::{Statement, UnitOutcome};
pub use value::{Condition, Row, SqlParam, SqlValue};
