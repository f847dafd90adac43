//! Vendor error-code classification
//!
//! Which codes mean "deadlock", "timeout", or "the backend already rolled
//! the transaction back" varies per vendor and occasionally per version.
//! The sets are data, not hard-coded branches: a deployment can override
//! them when a backend behaves differently than the shipped defaults
//! assume.

use relica_core::error::{BackendError, ErrorCategory};
use serde::{Deserialize, Serialize};

/// Error-code sets driving [`classify`](ErrorCodeConfig::classify).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ErrorCodeConfig {
    /// Deadlocks and optimistic-isolation conflicts.
    pub concurrency: Vec<i32>,
    /// Command timeouts.
    pub timeout: Vec<i32>,
    /// Severed or unreachable connections.
    pub connection_lost: Vec<i32>,
    /// The backend has already rolled the physical transaction back.
    pub transaction_doomed: Vec<i32>,
    /// Constraint violations (unique key, foreign key, check).
    pub constraint: Vec<i32>,
}

impl ErrorCodeConfig {
    /// Defaults for SQL-Server-like backends.
    ///
    /// 1205 deadlock victim, 3960 snapshot update conflict, -2 client
    /// timeout, 3930 uncommittable transaction, 2627/547 key and
    /// referential constraint violations.
    pub fn sql_server() -> Self {
        ErrorCodeConfig {
            concurrency: vec![1205, 3960],
            timeout: vec![-2],
            connection_lost: vec![64, 233, 10053, 10054, 10060],
            transaction_doomed: vec![3930],
            constraint: vec![547, 2601, 2627],
        }
    }

    /// Defaults for Oracle-like backends.
    ///
    /// ORA-00060 deadlock, ORA-08177 cannot serialize, ORA-02049
    /// distributed lock timeout, ORA-03113/03114 lost contact,
    /// ORA-02091 transaction rolled back, ORA-00001/02291 constraints.
    pub fn oracle() -> Self {
        ErrorCodeConfig {
            concurrency: vec![60, 8177],
            timeout: vec![1013, 2049],
            connection_lost: vec![28, 3113, 3114],
            transaction_doomed: vec![2091],
            constraint: vec![1, 2290, 2291],
        }
    }

    /// Defaults for MySQL-like backends.
    ///
    /// 1213 deadlock, 1205 lock wait timeout (surfaced as concurrency: the
    /// waiting statement lost a race), 3024 query timeout, 2006/2013 lost
    /// server, 1062/1451/1452 constraints. No doomed set: these backends
    /// keep the transaction open after statement-level errors.
    pub fn mysql() -> Self {
        ErrorCodeConfig {
            concurrency: vec![1205, 1213],
            timeout: vec![3024],
            connection_lost: vec![2006, 2013],
            transaction_doomed: vec![],
            constraint: vec![1062, 1451, 1452],
        }
    }

    /// Classify a backend error against the configured sets.
    ///
    /// An error carrying a constraint name is a constraint violation even
    /// when its code is not listed; drivers report names more reliably
    /// than codes across versions.
    pub fn classify(&self, error: &BackendError) -> ErrorCategory {
        if error.constraint.is_some() {
            return ErrorCategory::Constraint;
        }
        let Some(code) = error.code else {
            return ErrorCategory::Other;
        };
        if self.concurrency.contains(&code) {
            ErrorCategory::Concurrency
        } else if self.timeout.contains(&code) {
            ErrorCategory::Timeout
        } else if self.connection_lost.contains(&code) {
            ErrorCategory::ConnectionLost
        } else if self.transaction_doomed.contains(&code) {
            ErrorCategory::TransactionDoomed
        } else if self.constraint.contains(&code) {
            ErrorCategory::Constraint
        } else {
            ErrorCategory::Other
        }
    }
}
