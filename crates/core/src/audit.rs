//! Audit-table layout
//!
//! Revisioned schemas persist two metadata tables: a revision table
//! (revision id, points-to id, owning user transaction) and a user-
//! transaction table (id, timestamp, acting user). Their names and columns
//! are configuration, not assumptions baked into the SQL builders.

use serde::{Deserialize, Serialize};

/// Names of the audit tables and columns for one revisioned schema,
/// plus the acting user recorded on new user transactions.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditConfig {
    /// User-transaction table name.
    pub user_transaction_table: String,
    /// Identifier column of the user-transaction table.
    pub user_transaction_id_column: String,
    /// Creation-timestamp column of the user-transaction table.
    pub user_transaction_created_column: String,
    /// Acting-user column of the user-transaction table.
    pub user_transaction_user_column: String,
    /// Revision-metadata table name.
    pub revision_table: String,
    /// Revision identifier column.
    pub revision_id_column: String,
    /// Supersede pointer column; NULL marks the latest revision.
    pub revision_points_to_column: String,
    /// Owning user-transaction column of the revision table.
    pub revision_user_transaction_column: String,
    /// User recorded on newly allocated user transactions.
    pub acting_user: Option<String>,
}

impl Default for AuditConfig {
    fn default() -> Self {
        AuditConfig {
            user_transaction_table: "UserTransaction".into(),
            user_transaction_id_column: "ID".into(),
            user_transaction_created_column: "CreatedAt".into(),
            user_transaction_user_column: "Username".into(),
            revision_table: "Revision".into(),
            revision_id_column: "ID".into(),
            revision_points_to_column: "PointsTo".into(),
            revision_user_transaction_column: "UserTransactionID".into(),
            acting_user: None,
        }
    }
}

impl AuditConfig {
    /// Set the acting user recorded on new user transactions.
    pub fn with_acting_user(mut self, user: impl Into<String>) -> Self {
        self.acting_user = Some(user.into());
        self
    }
}
