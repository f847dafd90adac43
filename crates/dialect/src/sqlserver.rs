//! SQL-Server-like dialect

use crate::codes::ErrorCodeConfig;
use crate::Dialect;
use relica_core::config::{BackendKind, ConnectionProfile, IsolationLevel};
use relica_core::error::{BackendError, ErrorCategory};

/// Dialect for SQL-Server-like backends.
///
/// Uses snapshot isolation for the outermost transaction, `SAVE
/// TRANSACTION` savepoints (no release statement exists), `@name`
/// parameters, and `SCOPE_IDENTITY()` for generated identities.
#[derive(Debug, Clone)]
pub struct SqlServerDialect {
    codes: ErrorCodeConfig,
}

impl SqlServerDialect {
    /// Dialect with the shipped error-code defaults.
    pub fn new() -> Self {
        Self::with_codes(ErrorCodeConfig::sql_server())
    }

    /// Dialect with deployment-specific error-code sets.
    pub fn with_codes(codes: ErrorCodeConfig) -> Self {
        SqlServerDialect { codes }
    }
}

impl Default for SqlServerDialect {
    fn default() -> Self {
        Self::new()
    }
}

impl Dialect for SqlServerDialect {
    fn kind(&self) -> BackendKind {
        BackendKind::SqlServer
    }

    fn connection_string(&self, profile: &ConnectionProfile) -> String {
        let mut parts = vec![
            format!("Data Source={}", profile.server),
            format!("Initial Catalog={}", profile.database),
        ];
        match (&profile.user, &profile.password) {
            (Some(user), Some(password)) => {
                parts.push(format!("User ID={}", user));
                parts.push(format!("Password={}", password));
            }
            _ => parts.push("Integrated Security=SSPI".to_string()),
        }
        if let Some(app) = &profile.application_name {
            parts.push(format!("Application Name={}", app));
        }
        parts.join(";")
    }

    fn session_setup(&self) -> Vec<String> {
        // Deferred constraint checking is not available; keep severe errors
        // aborting the batch so the doomed-transaction detection works.
        vec!["SET XACT_ABORT ON".to_string()]
    }

    fn begin_isolation(&self) -> IsolationLevel {
        IsolationLevel::Snapshot
    }

    fn isolation_sql(&self, level: IsolationLevel) -> Option<String> {
        let name = match level {
            IsolationLevel::ReadCommitted => "READ COMMITTED",
            IsolationLevel::Snapshot => "SNAPSHOT",
            IsolationLevel::Serializable => "SERIALIZABLE",
        };
        Some(format!("SET TRANSACTION ISOLATION LEVEL {}", name))
    }

    fn create_savepoint_sql(&self, name: &str) -> String {
        format!("SAVE TRANSACTION {}", name)
    }

    fn rollback_to_savepoint_sql(&self, name: &str) -> String {
        format!("ROLLBACK TRANSACTION {}", name)
    }

    fn placeholder(&self, _index: usize, name: &str) -> String {
        format!("@{}", name)
    }

    fn identity_fetch_sql(&self, _table: &str, _column: &str) -> Option<String> {
        Some("SELECT SCOPE_IDENTITY()".to_string())
    }

    fn next_sequence_sql(&self, sequence: &str) -> String {
        format!("SELECT NEXT VALUE FOR {}", sequence)
    }

    fn categorize(&self, error: &BackendError) -> ErrorCategory {
        self.codes.classify(error)
    }
}
