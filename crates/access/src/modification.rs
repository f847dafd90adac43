//! Modification objects
//!
//! A `Modification` accumulates column assignments against one row of one
//! table and, on `execute`, emits the single INSERT or UPDATE the
//! assignments amount to. It starts in insert or update mode, flips to
//! update after a successful insert, and diffs pending assignments
//! against the last persisted state so an update that changes nothing
//! emits no statement at all.
//!
//! Revisioned tables get their copy-on-write archiving here: an insert
//! allocates and records the row's first revision, an update archives the
//! live revision before touching it.

use crate::changeset::ChangeSet;
use crate::descriptor::TableDescriptor;
use relica_conn::sql;
use relica_conn::Connection;
use relica_core::error::{Error, Result};
use relica_core::statement::Statement;
use relica_core::value::{Condition, SqlValue};
use relica_revision::RevisionHistory;

/// Whether `execute` emits an INSERT or an UPDATE.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModificationMode {
    /// The row does not exist yet.
    Insert,
    /// The row exists; only dirty columns are written.
    Update,
}

/// Domain hooks around a modification's statement.
///
/// All hooks default to no-ops; implementations override the ones they
/// need. Hooks run inside the caller's transaction, before the mode
/// flips.
pub trait ModificationLogic {
    /// Runs before the INSERT statement.
    fn before_insert(&self, _conn: &mut Connection, _m: &mut Modification) -> Result<()> {
        Ok(())
    }

    /// Runs after a successful INSERT, with generated keys available.
    fn after_insert(&self, _conn: &mut Connection, _m: &mut Modification) -> Result<()> {
        Ok(())
    }

    /// Runs before the UPDATE statement (also when the update turns out
    /// to be a no-op).
    fn before_update(&self, _conn: &mut Connection, _m: &mut Modification) -> Result<()> {
        Ok(())
    }

    /// Runs after the UPDATE statement (or the skipped no-op).
    fn after_update(&self, _conn: &mut Connection, _m: &mut Modification) -> Result<()> {
        Ok(())
    }
}

/// Logic with every hook left at its default.
pub struct NoLogic;

impl ModificationLogic for NoLogic {}

/// One pending row modification.
#[derive(Debug, Clone)]
pub struct Modification {
    descriptor: TableDescriptor,
    mode: ModificationMode,
    baseline: ChangeSet,
    changes: ChangeSet,
    conditions: Vec<Condition>,
    long_running: bool,
}

impl Modification {
    /// A modification inserting a new row.
    pub fn for_insert(descriptor: TableDescriptor) -> Self {
        Modification {
            descriptor,
            mode: ModificationMode::Insert,
            baseline: ChangeSet::new(),
            changes: ChangeSet::new(),
            conditions: Vec::new(),
            long_running: false,
        }
    }

    /// A modification updating the rows matched by `conditions`.
    ///
    /// Condition values are seeded into the persisted state, so setting a
    /// conditioned column to the value it already filters on stays a
    /// no-op.
    pub fn for_update(descriptor: TableDescriptor, conditions: Vec<Condition>) -> Self {
        let mut baseline = ChangeSet::new();
        for condition in &conditions {
            baseline.set(condition.column.clone(), condition.value.clone());
        }
        Modification {
            descriptor,
            mode: ModificationMode::Update,
            baseline,
            changes: ChangeSet::new(),
            conditions,
            long_running: false,
        }
    }

    /// A modification updating the single row whose current values are
    /// given. Every key column must be among them; conditions are derived
    /// from the key subset. Nothing starts dirty, so re-assigning a value
    /// the row already holds emits no statement.
    pub fn for_single_row_update(
        descriptor: TableDescriptor,
        current_values: Vec<(String, SqlValue)>,
    ) -> Result<Self> {
        let mut baseline = ChangeSet::new();
        for (column, value) in current_values {
            if !descriptor.columns.contains(&column) {
                return Err(Error::contract(format!(
                    "column '{}' does not exist on table '{}'",
                    column, descriptor.name
                )));
            }
            baseline.set(column, value);
        }
        let mut conditions = Vec::with_capacity(descriptor.key_columns.len());
        for key in &descriptor.key_columns {
            let value = baseline.get(key).ok_or_else(|| {
                Error::contract(format!(
                    "key column '{}' of table '{}' has no current value",
                    key, descriptor.name
                ))
            })?;
            conditions.push(Condition {
                column: key.clone(),
                value: value.clone(),
            });
        }
        Ok(Modification {
            descriptor,
            mode: ModificationMode::Update,
            baseline,
            changes: ChangeSet::new(),
            conditions,
            long_running: false,
        })
    }

    /// The mode the next `execute` will run in.
    pub fn mode(&self) -> ModificationMode {
        self.mode
    }

    /// The table this modification targets.
    pub fn descriptor(&self) -> &TableDescriptor {
        &self.descriptor
    }

    /// Assign a column for the next `execute`.
    pub fn set(&mut self, column: impl Into<String>, value: impl Into<SqlValue>) -> Result<()> {
        let column = column.into();
        if !self.descriptor.columns.contains(&column) {
            return Err(Error::contract(format!(
                "column '{}' does not exist on table '{}'",
                column, self.descriptor.name
            )));
        }
        self.changes.set(column, value.into());
        Ok(())
    }

    /// Current value of a column: a pending assignment if present, the
    /// persisted state otherwise.
    pub fn get(&self, column: &str) -> Option<&SqlValue> {
        self.changes.get(column).or_else(|| self.baseline.get(column))
    }

    /// Mark the emitted statement as long-running, lifting the command
    /// timeout for maintenance-sized writes.
    pub fn set_long_running(&mut self, long_running: bool) {
        self.long_running = long_running;
    }

    /// True when a pending assignment would change the persisted state.
    pub fn is_dirty(&self) -> bool {
        self.changes
            .iter()
            .any(|(column, value)| self.baseline.get(column) != Some(value))
    }

    /// Emit the statement the pending assignments amount to, wrapped in
    /// the given domain hooks. After a successful insert the modification
    /// is in update mode, keyed to the row it created.
    pub fn execute(&mut self, conn: &mut Connection, logic: &dyn ModificationLogic) -> Result<()> {
        if !conn.in_transaction() {
            return Err(Error::contract(
                "modification executed outside a transaction",
            ));
        }
        match self.mode {
            ModificationMode::Insert => {
                logic.before_insert(conn, self)?;
                self.run_insert(conn)?;
                logic.after_insert(conn, self)?;
            }
            ModificationMode::Update => {
                logic.before_update(conn, self)?;
                self.run_update(conn)?;
                logic.after_update(conn, self)?;
            }
        }
        Ok(())
    }

    /// [`execute`](Self::execute) with every hook left at its default.
    pub fn execute_without_logic(&mut self, conn: &mut Connection) -> Result<()> {
        self.execute(conn, &NoLogic)
    }

    fn run_insert(&mut self, conn: &mut Connection) -> Result<()> {
        if self.descriptor.revisioned {
            let table = self.descriptor.revisioned_table()?;
            let revision = RevisionHistory::new(conn).record_insert()?;
            self.changes.set(table.revision_column, SqlValue::I64(revision));
        }
        if self.changes.is_empty() {
            return Err(Error::contract(format!(
                "insert into '{}' with no column values",
                self.descriptor.name
            )));
        }
        let assignments: Vec<(String, SqlValue)> = self
            .changes
            .iter()
            .map(|(c, v)| (c.to_string(), v.clone()))
            .collect();
        let mut stmt = sql::insert_statement(conn.dialect(), &self.descriptor.name, &assignments);
        if self.long_running {
            stmt = stmt.long_running();
        }
        self.run_statement(conn, &stmt)?;
        self.fetch_identity(conn)?;
        self.changes.drain_into(&mut self.baseline);

        let mut conditions = Vec::with_capacity(self.descriptor.key_columns.len());
        for key in &self.descriptor.key_columns {
            let value = self.baseline.get(key).ok_or_else(|| {
                Error::contract(format!(
                    "key column '{}' of table '{}' has no value after insert",
                    key, self.descriptor.name
                ))
            })?;
            conditions.push(Condition {
                column: key.clone(),
                value: value.clone(),
            });
        }
        self.conditions = conditions;
        self.mode = ModificationMode::Update;
        tracing::debug!(table = %self.descriptor.name, "row inserted");
        Ok(())
    }

    /// Retrieve the backend-generated key of the insert just executed,
    /// when the descriptor declares one and no explicit value was given.
    fn fetch_identity(&mut self, conn: &mut Connection) -> Result<()> {
        let identity = match &self.descriptor.identity_column {
            Some(column) if !self.changes.contains(column) => column.clone(),
            _ => return Ok(()),
        };
        let fetch = conn
            .dialect()
            .identity_fetch_sql(&self.descriptor.name, &identity)
            .ok_or_else(|| {
                Error::Config(format!(
                    "table '{}' declares identity column '{}' but the backend \
                     does not generate identities; assign the key explicitly",
                    self.descriptor.name, identity
                ))
            })?;
        let stmt = Statement::raw(fetch);
        let value = conn.query_scalar(&stmt)?;
        let id = value.as_ref().and_then(SqlValue::as_i64).ok_or_else(|| {
            Error::unexpected_result(
                conn.database_name().to_string(),
                "identity query returned a non-integer",
                &stmt,
            )
        })?;
        self.changes.set(identity, SqlValue::I64(id));
        Ok(())
    }

    fn run_update(&mut self, conn: &mut Connection) -> Result<()> {
        let dirty: Vec<(String, SqlValue)> = self
            .changes
            .iter()
            .filter(|&(column, value)| {
                !self.descriptor.is_key(column) && self.baseline.get(column) != Some(value)
            })
            .map(|(c, v)| (c.to_string(), v.clone()))
            .collect();
        if dirty.is_empty() {
            tracing::trace!(table = %self.descriptor.name, "no dirty columns; update skipped");
            self.changes.drain_into(&mut self.baseline);
            return Ok(());
        }
        if self.descriptor.revisioned {
            let table = self.descriptor.revisioned_table()?;
            RevisionHistory::new(conn).copy_latest_revisions(&table, &self.conditions)?;
        }
        let mut stmt = sql::update_statement(
            conn.dialect(),
            &self.descriptor.name,
            &dirty,
            &self.conditions,
        );
        if self.long_running {
            stmt = stmt.long_running();
        }
        let affected = self.run_statement(conn, &stmt)?;
        if affected == 0 {
            tracing::warn!(table = %self.descriptor.name, "update matched no rows");
        }
        self.changes.drain_into(&mut self.baseline);
        tracing::debug!(table = %self.descriptor.name, columns = dirty.len(), "row updated");
        Ok(())
    }

    fn run_statement(&self, conn: &mut Connection, stmt: &Statement) -> Result<u64> {
        conn.execute(stmt).map_err(|e| self.translate(e))
    }

    /// Replace a recognized constraint violation with its registered
    /// user-facing message.
    fn translate(&self, error: Error) -> Error {
        if let Error::Backend {
            constraint: Some(name),
            ..
        } = &error
        {
            if let Some(message) = self.descriptor.friendly_message(name) {
                return Error::DataModification {
                    message: message.to_string(),
                };
            }
        }
        error
    }
}
