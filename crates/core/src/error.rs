//! Error taxonomy for the data-access core
//!
//! Every backend exception is caught at the point of command execution,
//! categorized through the active dialect, and re-thrown with diagnostic
//! context (command text, parameter values, target database). Nothing is
//! silently swallowed except the dead-transaction condition handled inside
//! the connection's rollback path.
//!
//! We use `thiserror` for automatic `Display` and `Error` trait
//! implementations.

use crate::statement::Statement;
use crate::value::SqlParam;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Result type alias for data-access operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Raw error reported by a backend driver.
///
/// This is the shape the consumed command-execution primitive surfaces;
/// the dialect turns it into an [`ErrorCategory`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackendError {
    /// Vendor-specific error code, when the driver reports one.
    pub code: Option<i32>,
    /// Driver-provided message text.
    pub message: String,
    /// Violated constraint name, when the driver reports one.
    pub constraint: Option<String>,
}

impl BackendError {
    /// An error with only a message.
    pub fn message(message: impl Into<String>) -> Self {
        BackendError {
            code: None,
            message: message.into(),
            constraint: None,
        }
    }

    /// An error with a vendor code.
    pub fn with_code(code: i32, message: impl Into<String>) -> Self {
        BackendError {
            code: Some(code),
            message: message.into(),
            constraint: None,
        }
    }

    /// Attach a violated constraint name.
    pub fn constraint(mut self, name: impl Into<String>) -> Self {
        self.constraint = Some(name.into());
        self
    }
}

impl fmt::Display for BackendError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.code {
            Some(code) => write!(f, "[{}] {}", code, self.message),
            None => write!(f, "{}", self.message),
        }
    }
}

/// Category assigned to a backend error by the dialect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ErrorCategory {
    /// Deadlock or optimistic-isolation conflict; eligible for retry.
    Concurrency,
    /// Command exceeded its allotted time.
    Timeout,
    /// The physical connection was severed mid-command.
    ConnectionLost,
    /// The backend unilaterally rolled the transaction back; further
    /// rollback attempts are redundant.
    TransactionDoomed,
    /// Constraint violation (unique key, foreign key, check).
    Constraint,
    /// Anything the dialect cannot classify.
    Other,
}

/// Diagnostic context attached to command-level failures.
#[derive(Debug, Clone, PartialEq)]
pub struct CommandContext {
    /// The failing command text.
    pub command_text: String,
    /// Parameter values at the time of failure.
    pub params: Vec<SqlParam>,
}

impl CommandContext {
    /// Capture context from a statement.
    pub fn from_statement(stmt: &Statement) -> Self {
        CommandContext {
            command_text: stmt.sql.clone(),
            params: stmt.params.clone(),
        }
    }
}

impl fmt::Display for CommandContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "command: {}", self.command_text)?;
        if !self.params.is_empty() {
            write!(f, "; params:")?;
            for p in &self.params {
                write!(f, " {}={}", p.name, p.value)?;
            }
        }
        Ok(())
    }
}

/// One failed commit-time validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationFailure {
    /// Name the validation was registered under.
    pub name: String,
    /// Message the check reported.
    pub message: String,
}

fn join_failures(failures: &[ValidationFailure]) -> String {
    failures
        .iter()
        .map(|f| format!("{}: {}", f.name, f.message))
        .collect::<Vec<_>>()
        .join("; ")
}

/// Error type for the data-access core.
#[derive(Debug, Error)]
pub enum Error {
    /// Cannot reach or authenticate to the backend, or the link was severed.
    /// Recoverable by the caller retrying later, never by the deadlock
    /// retry policy.
    #[error("connection failure against '{database}': {detail}")]
    ConnectionFailure {
        /// Target database name.
        database: String,
        /// Human-readable diagnostic.
        detail: String,
    },

    /// Deadlock or snapshot conflict; the only category the retry policy
    /// acts on.
    #[error("concurrency conflict against '{database}': {detail} ({context})")]
    Concurrency {
        /// Target database name.
        database: String,
        /// Backend-reported detail.
        detail: String,
        /// Failing command and parameters.
        context: CommandContext,
    },

    /// A command exceeded its allotted time.
    #[error("command timed out against '{database}': {detail} ({context})")]
    Timeout {
        /// Target database name.
        database: String,
        /// Backend-reported detail.
        detail: String,
        /// Failing command and parameters.
        context: CommandContext,
    },

    /// Translated constraint violation with a user-facing message.
    #[error("{message}")]
    DataModification {
        /// The configured friendly message.
        message: String,
    },

    /// One or more commit-time validations reported a failure; the
    /// transaction was rolled back.
    #[error("commit-time validation failed: {}", join_failures(.failures))]
    CommitValidation {
        /// Every failing check, in registration order.
        failures: Vec<ValidationFailure>,
    },

    /// A categorized backend error that is not one of the dedicated
    /// variants, wrapped with diagnostics.
    #[error("backend error ({category:?}) against '{database}': {detail} ({context})")]
    Backend {
        /// Category the dialect assigned.
        category: ErrorCategory,
        /// Violated constraint name, when known.
        constraint: Option<String>,
        /// Target database name.
        database: String,
        /// Backend-reported detail.
        detail: String,
        /// Failing command and parameters.
        context: CommandContext,
    },

    /// Misuse of the API (commit without begin, validation outside a
    /// transaction). Always fatal, never caught by policy.
    #[error("contract violation: {0}")]
    Contract(String),

    /// Invalid or missing configuration.
    #[error("configuration error: {0}")]
    Config(String),
}

impl Error {
    /// Shorthand for a contract violation.
    pub fn contract(detail: impl Into<String>) -> Self {
        Error::Contract(detail.into())
    }

    /// A backend result that does not have the shape the core expects
    /// (e.g. a sequence query returning a non-integer).
    pub fn unexpected_result(
        database: impl Into<String>,
        detail: impl Into<String>,
        stmt: &Statement,
    ) -> Self {
        Error::Backend {
            category: ErrorCategory::Other,
            constraint: None,
            database: database.into(),
            detail: detail.into(),
            context: CommandContext::from_statement(stmt),
        }
    }

    /// True for the one category the retry policy may act on.
    pub fn is_concurrency(&self) -> bool {
        matches!(self, Error::Concurrency { .. })
    }
}
