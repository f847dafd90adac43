//! Connection and transaction manager
//!
//! A `Connection` owns one physical backend link and everything scoped to
//! it: the transaction nesting stack, the dead flag, the ordered list of
//! commit-time validations, and the cached user-transaction identifier.
//!
//! Nesting follows strict LIFO savepoint discipline: the first
//! `begin_transaction` starts a real transaction, every deeper one issues
//! a savepoint named `child<level>`. Commit-time validations run exactly
//! once, in registration order, immediately before the physical commit of
//! the outermost transaction.

use crate::sequence::SequenceSource;
use crate::sql;
use chrono::Utc;
use relica_backend::Backend;
use relica_core::audit::AuditConfig;
use relica_core::config::ConnectionProfile;
use relica_core::error::{
    BackendError, CommandContext, Error, ErrorCategory, Result, ValidationFailure,
};
use relica_core::statement::{Statement, UnitOutcome};
use relica_core::value::{Row, SqlValue};
use relica_dialect::Dialect;
use std::sync::Arc;

/// Deferred business-rule check, run once before the outermost commit.
///
/// The check returns `Ok(None)` on success and `Ok(Some(message))` on a
/// rule violation; an `Err` aborts the commit outright.
pub type ValidationCheck = Box<dyn Fn(&mut Connection) -> Result<Option<String>> + Send>;

struct CommitValidation {
    name: String,
    check: ValidationCheck,
}

/// One nesting level of the logical transaction.
///
/// The outermost frame has no savepoint; every deeper frame carries the
/// savepoint name that rolls it back individually.
struct Frame {
    savepoint: Option<String>,
}

/// One physical database connection with nested-transaction bookkeeping.
pub struct Connection {
    backend: Box<dyn Backend>,
    dialect: Arc<dyn Dialect>,
    profile: ConnectionProfile,
    audit: AuditConfig,
    sequence: Arc<dyn SequenceSource>,
    frames: Vec<Frame>,
    /// Set when the backend reports it has already rolled the physical
    /// transaction back; suppresses redundant rollback attempts.
    dead: bool,
    validations: Vec<CommitValidation>,
    user_txn_id: Option<i64>,
}

impl Connection {
    /// Assemble a connection from its parts. The backend is not opened.
    pub fn new(
        backend: Box<dyn Backend>,
        dialect: Arc<dyn Dialect>,
        profile: ConnectionProfile,
        audit: AuditConfig,
        sequence: Arc<dyn SequenceSource>,
    ) -> Self {
        Connection {
            backend,
            dialect,
            profile,
            audit,
            sequence,
            frames: Vec::new(),
            dead: false,
            validations: Vec::new(),
            user_txn_id: None,
        }
    }

    /// The active dialect.
    pub fn dialect(&self) -> &dyn Dialect {
        self.dialect.as_ref()
    }

    /// Audit-table layout for this connection's schema.
    pub fn audit(&self) -> &AuditConfig {
        &self.audit
    }

    /// Target database name, for diagnostics.
    pub fn database_name(&self) -> &str {
        &self.profile.database
    }

    /// Current transaction nesting level; 0 means no transaction.
    pub fn nesting_level(&self) -> usize {
        self.frames.len()
    }

    /// True while any transaction frame is open.
    pub fn in_transaction(&self) -> bool {
        !self.frames.is_empty()
    }

    /// True once the backend has unilaterally rolled the physical
    /// transaction back.
    pub fn is_transaction_dead(&self) -> bool {
        self.dead
    }

    /// Number of commit-time validations still pending.
    pub fn pending_validation_count(&self) -> usize {
        self.validations.len()
    }

    // ------------------------------------------------------------------
    // Lifecycle
    // ------------------------------------------------------------------

    /// Establish the physical connection and apply the dialect's one-time
    /// session settings. The driver string is built by the dialect from
    /// the connection profile.
    pub fn open(&mut self) -> Result<()> {
        if self.backend.is_open() {
            return Err(Error::contract("open() called on an open connection"));
        }
        let connection_string = self.dialect.connection_string(&self.profile);
        self.backend
            .open(&connection_string)
            .map_err(|e| Error::ConnectionFailure {
                database: self.profile.database.clone(),
                detail: format!("cannot open connection to '{}': {}", self.profile.server, e),
            })?;
        for setup in self.dialect.session_setup() {
            self.execute(&Statement::raw(setup))?;
        }
        tracing::debug!(
            database = %self.profile.database,
            backend = %self.profile.backend,
            "connection opened"
        );
        Ok(())
    }

    /// Tear the physical connection down.
    pub fn close(&mut self) -> Result<()> {
        if self.in_transaction() {
            return Err(Error::contract("close() called inside a transaction"));
        }
        self.backend.close().map_err(|e| Error::ConnectionFailure {
            database: self.profile.database.clone(),
            detail: format!("error closing connection: {}", e),
        })
    }

    /// True while the physical connection is established.
    pub fn is_open(&self) -> bool {
        self.backend.is_open()
    }

    // ------------------------------------------------------------------
    // Transactions
    // ------------------------------------------------------------------

    /// Begin a transaction: a real one at level 0, a savepoint deeper.
    pub fn begin_transaction(&mut self) -> Result<()> {
        if self.frames.is_empty() {
            self.dead = false;
            self.validations.clear();
            self.user_txn_id = None;
            let isolation = self.dialect.begin_isolation();
            if let Err(e) = self.backend.begin(isolation) {
                return Err(self.control_error(e, "BEGIN TRANSACTION"));
            }
            self.frames.push(Frame { savepoint: None });
            tracing::debug!(?isolation, "transaction begun");
        } else {
            let name = format!("child{}", self.frames.len());
            let stmt = Statement::raw(self.dialect.create_savepoint_sql(&name));
            self.execute(&stmt)?;
            tracing::debug!(savepoint = %name, nesting = self.frames.len() + 1, "savepoint created");
            self.frames.push(Frame {
                savepoint: Some(name),
            });
        }
        Ok(())
    }

    /// Commit one nesting level. At the outermost level this runs every
    /// registered commit-time validation in insertion order and only then
    /// physically commits; any failure rolls the whole transaction back.
    pub fn commit_transaction(&mut self) -> Result<()> {
        if self.frames.is_empty() {
            return Err(Error::contract(
                "commit_transaction() called without a matching begin_transaction()",
            ));
        }
        if self.frames.len() > 1 {
            let frame = self.frames.pop().unwrap_or(Frame { savepoint: None });
            if let Some(name) = frame.savepoint {
                if !self.dead {
                    if let Some(release) = self.dialect.release_savepoint_sql(&name) {
                        self.execute(&Statement::raw(release))?;
                    }
                }
                tracing::trace!(savepoint = %name, nesting = self.frames.len(), "inner commit");
            }
            return Ok(());
        }

        // Outermost frame: validations run while the transaction is still
        // open, then the physical commit ends it.
        let validation = self.run_validations();
        self.frames.pop();
        match validation {
            Ok(()) => {
                if let Err(e) = self.backend.commit() {
                    let translated = self.control_error(e, "COMMIT");
                    self.clear_transaction_state();
                    return Err(translated);
                }
                self.clear_transaction_state();
                tracing::debug!("transaction committed");
                Ok(())
            }
            Err(e) => {
                if !self.dead {
                    if let Err(rollback_err) = self.backend.rollback() {
                        tracing::error!(
                            error = %rollback_err,
                            "rollback after failed commit-time validation also failed"
                        );
                    }
                }
                self.clear_transaction_state();
                Err(e)
            }
        }
    }

    /// Roll one nesting level back. At the outermost level this rolls the
    /// physical transaction back (unless the backend already did) and
    /// clears all transaction-scoped state.
    pub fn rollback_transaction(&mut self) -> Result<()> {
        let frame = self.frames.pop().ok_or_else(|| {
            Error::contract("rollback_transaction() called without a matching begin_transaction()")
        })?;
        if self.frames.is_empty() {
            if self.dead {
                tracing::debug!("physical transaction already rolled back by the backend");
            } else if let Err(e) = self.backend.rollback() {
                if self.dialect.categorize(&e) == ErrorCategory::TransactionDoomed {
                    tracing::debug!(error = %e, "rollback raced a backend abort; treating as rolled back");
                } else {
                    let translated = self.control_error(e, "ROLLBACK");
                    self.clear_transaction_state();
                    return Err(translated);
                }
            }
            self.clear_transaction_state();
            tracing::debug!("transaction rolled back");
            Ok(())
        } else {
            if let Some(name) = frame.savepoint {
                if self.dead {
                    tracing::trace!(savepoint = %name, "skipping savepoint rollback on dead transaction");
                } else {
                    let stmt = Statement::raw(self.dialect.rollback_to_savepoint_sql(&name));
                    if let Err(e) = self.execute(&stmt) {
                        // The statement may be what discovers the abort.
                        if self.dead {
                            tracing::debug!(savepoint = %name, "savepoint rollback found the transaction dead");
                        } else {
                            return Err(e);
                        }
                    }
                }
            }
            Ok(())
        }
    }

    /// Begin, run the unit, and finish according to its outcome: commit on
    /// `Commit`, roll back without failure on `Rollback`, roll back and
    /// propagate on error.
    pub fn execute_in_transaction<T, F>(&mut self, unit: F) -> Result<Option<T>>
    where
        F: FnOnce(&mut Connection) -> Result<UnitOutcome<T>>,
    {
        self.begin_transaction()?;
        match unit(self) {
            Ok(UnitOutcome::Commit(value)) => {
                self.commit_transaction()?;
                Ok(Some(value))
            }
            Ok(UnitOutcome::Rollback(reason)) => {
                tracing::debug!(%reason, "unit of work requested rollback");
                self.rollback_transaction()?;
                Ok(None)
            }
            Err(e) => {
                if let Err(rollback_err) = self.rollback_transaction() {
                    tracing::error!(error = %rollback_err, "rollback after failed unit of work also failed");
                }
                Err(e)
            }
        }
    }

    // ------------------------------------------------------------------
    // Commit-time validations
    // ------------------------------------------------------------------

    /// Register a deferred check to run once before the outermost commit.
    pub fn add_commit_time_validation<F>(&mut self, name: impl Into<String>, check: F) -> Result<()>
    where
        F: Fn(&mut Connection) -> Result<Option<String>> + Send + 'static,
    {
        if self.frames.is_empty() {
            return Err(Error::contract(
                "add_commit_time_validation() called outside a transaction",
            ));
        }
        self.validations.push(CommitValidation {
            name: name.into(),
            check: Box::new(check),
        });
        Ok(())
    }

    /// Force the pending validations to run now and clear the list, so
    /// they do not run again at commit. Used before operations (such as
    /// cascading deletes) that would invalidate the data the checks read.
    pub fn pre_execute_commit_time_validations(&mut self) -> Result<()> {
        if self.frames.is_empty() {
            return Err(Error::contract(
                "pre_execute_commit_time_validations() called outside a transaction",
            ));
        }
        self.run_validations()
    }

    fn run_validations(&mut self) -> Result<()> {
        if self.validations.is_empty() {
            return Ok(());
        }
        let checks = std::mem::take(&mut self.validations);
        let mut failures = Vec::new();
        for validation in checks {
            tracing::trace!(name = %validation.name, "running commit-time validation");
            if let Some(message) = (validation.check)(self)? {
                failures.push(ValidationFailure {
                    name: validation.name,
                    message,
                });
            }
        }
        if failures.is_empty() {
            Ok(())
        } else {
            tracing::warn!(count = failures.len(), "commit-time validations failed");
            Err(Error::CommitValidation { failures })
        }
    }

    // ------------------------------------------------------------------
    // User transactions
    // ------------------------------------------------------------------

    /// The logical transaction identifier for the current physical
    /// transaction, allocated and persisted on first demand and cached
    /// until the transaction ends.
    pub fn user_transaction_id(&mut self) -> Result<i64> {
        if self.frames.is_empty() {
            return Err(Error::contract(
                "user_transaction_id() called outside a transaction",
            ));
        }
        if let Some(id) = self.user_txn_id {
            return Ok(id);
        }
        let id = self.next_sequence_value()?;
        let audit = self.audit.clone();
        let user = match &audit.acting_user {
            Some(user) => SqlValue::Text(user.clone()),
            None => SqlValue::Null,
        };
        let stmt = sql::insert_statement(
            self.dialect.as_ref(),
            &audit.user_transaction_table,
            &[
                (audit.user_transaction_id_column, SqlValue::I64(id)),
                (
                    audit.user_transaction_created_column,
                    SqlValue::DateTime(Utc::now()),
                ),
                (audit.user_transaction_user_column, user),
            ],
        );
        self.execute(&stmt)?;
        self.user_txn_id = Some(id);
        tracing::debug!(user_txn_id = id, "user transaction allocated");
        Ok(id)
    }

    /// True when `id` is the user transaction of the current physical
    /// transaction.
    pub fn user_transaction_is_current(&self, id: i64) -> bool {
        self.user_txn_id == Some(id)
    }

    /// Allocate the next value of the hosting system's main sequence.
    pub fn next_sequence_value(&mut self) -> Result<i64> {
        let sequence = Arc::clone(&self.sequence);
        sequence.next_value(self)
    }

    // ------------------------------------------------------------------
    // Command execution
    // ------------------------------------------------------------------

    /// Execute a non-query command; returns the affected row count.
    pub fn execute(&mut self, stmt: &Statement) -> Result<u64> {
        match self.backend.execute(stmt) {
            Ok(rows) => {
                tracing::trace!(rows, sql = %stmt.sql, "execute");
                Ok(rows)
            }
            Err(e) => Err(self.translate_backend_error(e, stmt)),
        }
    }

    /// Execute a scalar query.
    pub fn query_scalar(&mut self, stmt: &Statement) -> Result<Option<SqlValue>> {
        match self.backend.query_scalar(stmt) {
            Ok(value) => Ok(value),
            Err(e) => Err(self.translate_backend_error(e, stmt)),
        }
    }

    /// Execute a reader query.
    pub fn query_rows(&mut self, stmt: &Statement) -> Result<Vec<Row>> {
        match self.backend.query_rows(stmt) {
            Ok(rows) => Ok(rows),
            Err(e) => Err(self.translate_backend_error(e, stmt)),
        }
    }

    // ------------------------------------------------------------------
    // Error translation
    // ------------------------------------------------------------------

    fn control_error(&mut self, error: BackendError, operation: &str) -> Error {
        let stmt = Statement::raw(operation);
        self.translate_backend_error(error, &stmt)
    }

    fn translate_backend_error(&mut self, error: BackendError, stmt: &Statement) -> Error {
        let category = self.dialect.categorize(&error);
        let context = CommandContext::from_statement(stmt);
        let database = self.profile.database.clone();
        match category {
            ErrorCategory::Concurrency => Error::Concurrency {
                database,
                detail: error.to_string(),
                context,
            },
            ErrorCategory::Timeout => Error::Timeout {
                database,
                detail: error.to_string(),
                context,
            },
            ErrorCategory::ConnectionLost => Error::ConnectionFailure {
                database,
                detail: format!("{} ({})", error, context),
            },
            ErrorCategory::TransactionDoomed => {
                if self.in_transaction() {
                    self.dead = true;
                    tracing::warn!(
                        detail = %error,
                        "backend rolled the transaction back; marking it dead"
                    );
                }
                Error::Backend {
                    category,
                    constraint: None,
                    database,
                    detail: error.to_string(),
                    context,
                }
            }
            ErrorCategory::Constraint => Error::Backend {
                category,
                constraint: self.dialect.constraint_name(&error),
                database,
                detail: error.to_string(),
                context,
            },
            ErrorCategory::Other => Error::Backend {
                category,
                constraint: None,
                database,
                detail: error.to_string(),
                context,
            },
        }
    }

    fn clear_transaction_state(&mut self) {
        self.validations.clear();
        self.user_txn_id = None;
        self.dead = false;
    }
}
