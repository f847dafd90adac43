//! Oracle-like dialect

use crate::codes::ErrorCodeConfig;
use crate::Dialect;
use relica_core::config::{BackendKind, ConnectionProfile, IsolationLevel};
use relica_core::error::{BackendError, ErrorCategory};

/// Dialect for Oracle-like backends.
///
/// Read-committed outermost transactions (no snapshot begin), `SAVEPOINT`
/// savepoints, `:name` parameters, identifiers from sequences rather than
/// identity fetch.
#[derive(Debug, Clone)]
pub struct OracleDialect {
    codes: ErrorCodeConfig,
}

impl OracleDialect {
    /// Dialect with the shipped error-code defaults.
    pub fn new() -> Self {
        Self::with_codes(ErrorCodeConfig::oracle())
    }

    /// Dialect with deployment-specific error-code sets.
    pub fn with_codes(codes: ErrorCodeConfig) -> Self {
        OracleDialect { codes }
    }
}

impl Default for OracleDialect {
    fn default() -> Self {
        Self::new()
    }
}

impl Dialect for OracleDialect {
    fn kind(&self) -> BackendKind {
        BackendKind::Oracle
    }

    fn connection_string(&self, profile: &ConnectionProfile) -> String {
        let mut parts = vec![format!("Data Source={}/{}", profile.server, profile.database)];
        match (&profile.user, &profile.password) {
            (Some(user), Some(password)) => {
                parts.push(format!("User Id={}", user));
                parts.push(format!("Password={}", password));
            }
            _ => parts.push("Integrated Security=yes".to_string()),
        }
        parts.join(";")
    }

    fn session_setup(&self) -> Vec<String> {
        // Binary sorting keeps string comparisons consistent with the
        // other backends; the session runs in UTC.
        vec![
            "ALTER SESSION SET NLS_SORT = BINARY".to_string(),
            "ALTER SESSION SET TIME_ZONE = 'UTC'".to_string(),
        ]
    }

    fn begin_isolation(&self) -> IsolationLevel {
        IsolationLevel::ReadCommitted
    }

    fn isolation_sql(&self, level: IsolationLevel) -> Option<String> {
        match level {
            IsolationLevel::ReadCommitted => {
                Some("SET TRANSACTION ISOLATION LEVEL READ COMMITTED".to_string())
            }
            IsolationLevel::Serializable => {
                Some("SET TRANSACTION ISOLATION LEVEL SERIALIZABLE".to_string())
            }
            // No snapshot statement; read consistency is the default.
            IsolationLevel::Snapshot => None,
        }
    }

    fn create_savepoint_sql(&self, name: &str) -> String {
        format!("SAVEPOINT {}", name)
    }

    fn rollback_to_savepoint_sql(&self, name: &str) -> String {
        format!("ROLLBACK TO SAVEPOINT {}", name)
    }

    fn placeholder(&self, _index: usize, name: &str) -> String {
        format!(":{}", name)
    }

    fn identity_fetch_sql(&self, _table: &str, _column: &str) -> Option<String> {
        // Keys come from sequences allocated before the insert.
        None
    }

    fn next_sequence_sql(&self, sequence: &str) -> String {
        format!("SELECT {}.NEXTVAL FROM DUAL", sequence)
    }

    fn categorize(&self, error: &BackendError) -> ErrorCategory {
        self.codes.classify(error)
    }
}
