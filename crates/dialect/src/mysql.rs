//! MySQL-like dialect

use crate::codes::ErrorCodeConfig;
use crate::Dialect;
use relica_core::config::{BackendKind, ConnectionProfile, IsolationLevel};
use relica_core::error::{BackendError, ErrorCategory};

/// Dialect for MySQL-like backends (MariaDB-style sequences).
///
/// Read-committed outermost transactions, standard `SAVEPOINT` /
/// `RELEASE SAVEPOINT`, positional `?` parameters, and
/// `LAST_INSERT_ID()` for generated identities.
#[derive(Debug, Clone)]
pub struct MySqlDialect {
    codes: ErrorCodeConfig,
}

impl MySqlDialect {
    /// Dialect with the shipped error-code defaults.
    pub fn new() -> Self {
        Self::with_codes(ErrorCodeConfig::mysql())
    }

    /// Dialect with deployment-specific error-code sets.
    pub fn with_codes(codes: ErrorCodeConfig) -> Self {
        MySqlDialect { codes }
    }
}

impl Default for MySqlDialect {
    fn default() -> Self {
        Self::new()
    }
}

impl Dialect for MySqlDialect {
    fn kind(&self) -> BackendKind {
        BackendKind::MySql
    }

    fn connection_string(&self, profile: &ConnectionProfile) -> String {
        let mut parts = vec![
            format!("Server={}", profile.server),
            format!("Database={}", profile.database),
        ];
        if let Some(user) = &profile.user {
            parts.push(format!("Uid={}", user));
        }
        if let Some(password) = &profile.password {
            parts.push(format!("Pwd={}", password));
        }
        parts.join(";")
    }

    fn session_setup(&self) -> Vec<String> {
        vec![
            "SET NAMES utf8mb4".to_string(),
            "SET time_zone = '+00:00'".to_string(),
        ]
    }

    fn begin_isolation(&self) -> IsolationLevel {
        IsolationLevel::ReadCommitted
    }

    fn isolation_sql(&self, level: IsolationLevel) -> Option<String> {
        let name = match level {
            IsolationLevel::ReadCommitted => "READ COMMITTED",
            IsolationLevel::Serializable => "SERIALIZABLE",
            IsolationLevel::Snapshot => return None,
        };
        Some(format!("SET TRANSACTION ISOLATION LEVEL {}", name))
    }

    fn create_savepoint_sql(&self, name: &str) -> String {
        format!("SAVEPOINT {}", name)
    }

    fn rollback_to_savepoint_sql(&self, name: &str) -> String {
        format!("ROLLBACK TO SAVEPOINT {}", name)
    }

    fn release_savepoint_sql(&self, name: &str) -> Option<String> {
        Some(format!("RELEASE SAVEPOINT {}", name))
    }

    fn placeholder(&self, _index: usize, _name: &str) -> String {
        "?".to_string()
    }

    fn identity_fetch_sql(&self, _table: &str, _column: &str) -> Option<String> {
        Some("SELECT LAST_INSERT_ID()".to_string())
    }

    fn next_sequence_sql(&self, sequence: &str) -> String {
        format!("SELECT NEXT VALUE FOR {}", sequence)
    }

    fn categorize(&self, error: &BackendError) -> ErrorCategory {
        self.codes.classify(error)
    }
}
