//! Parameterized SQL statements

use crate::value::{SqlParam, SqlValue};
use std::fmt;

/// A SQL command with its parameters.
///
/// Statements are always parameterized; the core never interpolates values
/// into command text. `long_running` marks maintenance commands that should
/// run without the profile's command timeout.
#[derive(Debug, Clone, PartialEq)]
pub struct Statement {
    /// Command text with dialect-specific placeholders already in place.
    pub sql: String,
    /// Parameters in placeholder order.
    pub params: Vec<SqlParam>,
    /// Disable the command timeout for this statement.
    pub long_running: bool,
}

impl Statement {
    /// A statement without parameters.
    pub fn raw(sql: impl Into<String>) -> Self {
        Statement {
            sql: sql.into(),
            params: Vec::new(),
            long_running: false,
        }
    }

    /// A statement with parameters.
    pub fn with_params(sql: impl Into<String>, params: Vec<SqlParam>) -> Self {
        Statement {
            sql: sql.into(),
            params,
            long_running: false,
        }
    }

    /// Mark the statement as long-running (no command timeout).
    pub fn long_running(mut self) -> Self {
        self.long_running = true;
        self
    }
}

impl fmt::Display for Statement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.sql)?;
        if !self.params.is_empty() {
            write!(f, " [")?;
            for (i, p) in self.params.iter().enumerate() {
                if i > 0 {
                    write!(f, ", ")?;
                }
                write!(f, "{}={}", p.name, p.value)?;
            }
            write!(f, "]")?;
        }
        Ok(())
    }
}

/// Outcome of a transactional unit of work.
///
/// Returned by closures passed to `execute_in_transaction`. A `Rollback`
/// outcome is an expected control path, not a failure; errors are reported
/// through `Result` instead.
#[derive(Debug, Clone, PartialEq)]
pub enum UnitOutcome<T> {
    /// Commit the transaction and yield the value.
    Commit(T),
    /// Roll the transaction back for the stated reason.
    Rollback(String),
}
