//! Copy-on-write revision archiving
//!
//! Every revisioned row carries a revision identifier; a revision is live
//! while its metadata row has a NULL supersede pointer. Before the first
//! modification of a row inside a user transaction, the live revision is
//! archived: a copy gets a fresh identifier, its metadata points at the
//! live revision and keeps the previous owner, and the live revision's
//! metadata is reparented to the current user transaction. A second
//! modification inside the same user transaction finds the live revision
//! already owned and archives nothing, so each user transaction produces
//! at most one archived copy per row.

use crate::tables::RevisionedTable;
use relica_conn::sql;
use relica_conn::Connection;
use relica_core::error::{Error, Result};
use relica_core::statement::Statement;
use relica_core::value::{Condition, SqlValue};

/// Outcome of one archiving pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CopySummary {
    /// Live revisions archived by this pass.
    pub copied: usize,
    /// Live revisions already owned by the current user transaction.
    pub skipped: usize,
}

/// Archiving operations over one connection.
///
/// Borrows the connection mutably for the duration of the pass; all
/// statements run inside the caller's transaction.
pub struct RevisionHistory<'c> {
    conn: &'c mut Connection,
}

impl<'c> RevisionHistory<'c> {
    /// Archiver over the given connection.
    pub fn new(conn: &'c mut Connection) -> Self {
        RevisionHistory { conn }
    }

    /// Allocate a revision identifier for a brand-new row and persist its
    /// metadata: no supersede pointer, owned by the current user
    /// transaction. Returns the identifier for the caller to store in the
    /// row's revision column.
    pub fn record_insert(&mut self) -> Result<i64> {
        let owner = self.conn.user_transaction_id()?;
        let id = self.conn.next_sequence_value()?;
        let audit = self.conn.audit().clone();
        let stmt = sql::insert_statement(
            self.conn.dialect(),
            &audit.revision_table,
            &[
                (audit.revision_id_column, SqlValue::I64(id)),
                (audit.revision_points_to_column, SqlValue::Null),
                (audit.revision_user_transaction_column, SqlValue::I64(owner)),
            ],
        );
        self.conn.execute(&stmt)?;
        tracing::trace!(revision = id, user_txn = owner, "revision recorded for insert");
        Ok(id)
    }

    /// Archive every live revision of `table` matched by `conditions`
    /// that is not yet owned by the current user transaction.
    pub fn copy_latest_revisions(
        &mut self,
        table: &RevisionedTable,
        conditions: &[Condition],
    ) -> Result<CopySummary> {
        let current = self.conn.user_transaction_id()?;
        let mut summary = CopySummary::default();
        for revision in self.live_revisions(table, conditions)? {
            let owner = self.revision_owner(revision)?;
            if owner == current {
                summary.skipped += 1;
                continue;
            }
            self.archive_revision(table, revision, owner, current)?;
            summary.copied += 1;
        }
        tracing::debug!(
            table = %table.table,
            copied = summary.copied,
            skipped = summary.skipped,
            "copy-on-write pass finished"
        );
        Ok(summary)
    }

    /// Revision identifiers of the matched live rows. A revision is live
    /// when its metadata supersede pointer is NULL.
    fn live_revisions(
        &mut self,
        table: &RevisionedTable,
        conditions: &[Condition],
    ) -> Result<Vec<i64>> {
        let audit = self.conn.audit().clone();
        let (where_sql, params) = sql::where_clause(self.conn.dialect(), 1, conditions);
        let mut text = format!(
            "SELECT t.{rev} FROM {table} t INNER JOIN {meta} m ON m.{id} = t.{rev} \
             WHERE m.{points_to} IS NULL",
            rev = table.revision_column,
            table = table.table,
            meta = audit.revision_table,
            id = audit.revision_id_column,
            points_to = audit.revision_points_to_column,
        );
        if !where_sql.is_empty() {
            text.push_str(" AND ");
            text.push_str(&where_sql);
        }
        let stmt = Statement::with_params(text, params);
        let rows = self.conn.query_rows(&stmt)?;
        let mut revisions = Vec::with_capacity(rows.len());
        for row in rows {
            let id = row.i64(0).ok_or_else(|| {
                Error::unexpected_result(
                    self.conn.database_name().to_string(),
                    "revision query returned a non-integer identifier",
                    &stmt,
                )
            })?;
            revisions.push(id);
        }
        Ok(revisions)
    }

    fn revision_owner(&mut self, revision: i64) -> Result<i64> {
        let audit = self.conn.audit().clone();
        let placeholder = self.conn.dialect().placeholder(1, "p1");
        let stmt = Statement::with_params(
            format!(
                "SELECT {owner} FROM {meta} WHERE {id} = {ph}",
                owner = audit.revision_user_transaction_column,
                meta = audit.revision_table,
                id = audit.revision_id_column,
                ph = placeholder,
            ),
            vec![relica_core::value::SqlParam::new("p1", SqlValue::I64(revision))],
        );
        let value = self.conn.query_scalar(&stmt)?;
        value.as_ref().and_then(SqlValue::as_i64).ok_or_else(|| {
            Error::unexpected_result(
                self.conn.database_name().to_string(),
                format!("no owner recorded for revision {}", revision),
                &stmt,
            )
        })
    }

    /// The archiving step itself: a copy with a fresh identifier points at
    /// the live revision and keeps the previous owner, then the live
    /// revision moves to the current user transaction.
    fn archive_revision(
        &mut self,
        table: &RevisionedTable,
        revision: i64,
        previous_owner: i64,
        current: i64,
    ) -> Result<()> {
        let copy_id = self.conn.next_sequence_value()?;
        let audit = self.conn.audit().clone();

        let metadata = sql::insert_statement(
            self.conn.dialect(),
            &audit.revision_table,
            &[
                (audit.revision_id_column.clone(), SqlValue::I64(copy_id)),
                (
                    audit.revision_points_to_column.clone(),
                    SqlValue::I64(revision),
                ),
                (
                    audit.revision_user_transaction_column.clone(),
                    SqlValue::I64(previous_owner),
                ),
            ],
        );
        self.conn.execute(&metadata)?;

        // Single round trip per copy: the data travels server-side.
        let columns = table.data_columns.join(", ");
        let ph1 = self.conn.dialect().placeholder(1, "p1");
        let ph2 = self.conn.dialect().placeholder(2, "p2");
        let data_copy = Statement::with_params(
            format!(
                "INSERT INTO {table} ({rev}, {columns}) SELECT {ph1}, {columns} \
                 FROM {table} WHERE {rev} = {ph2}",
                table = table.table,
                rev = table.revision_column,
                columns = columns,
                ph1 = ph1,
                ph2 = ph2,
            ),
            vec![
                relica_core::value::SqlParam::new("p1", SqlValue::I64(copy_id)),
                relica_core::value::SqlParam::new("p2", SqlValue::I64(revision)),
            ],
        );
        self.conn.execute(&data_copy)?;

        let reparent = sql::update_statement(
            self.conn.dialect(),
            &audit.revision_table,
            &[(
                audit.revision_user_transaction_column.clone(),
                SqlValue::I64(current),
            )],
            &[Condition {
                column: audit.revision_id_column.clone(),
                value: SqlValue::I64(revision),
            }],
        );
        self.conn.execute(&reparent)?;
        tracing::trace!(
            revision,
            copy = copy_id,
            previous_owner,
            "live revision archived"
        );
        Ok(())
    }
}
