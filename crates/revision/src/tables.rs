//! Revisioned-table descriptions

use relica_core::error::{Error, Result};

/// Layout of one revisioned data table.
///
/// The revision column holds the revision identifier; a row is live when
/// its revision's metadata has a NULL supersede pointer. The data columns
/// are everything copied verbatim when a revision is archived.
#[derive(Debug, Clone)]
pub struct RevisionedTable {
    /// Data table name.
    pub table: String,
    /// Column holding the revision identifier.
    pub revision_column: String,
    /// Columns copied when archiving a revision, excluding the revision
    /// column itself.
    pub data_columns: Vec<String>,
}

impl RevisionedTable {
    /// Describe a revisioned table.
    pub fn new(
        table: impl Into<String>,
        revision_column: impl Into<String>,
        data_columns: Vec<String>,
    ) -> Result<Self> {
        let table = table.into();
        let revision_column = revision_column.into();
        if data_columns.is_empty() {
            return Err(Error::Config(format!(
                "revisioned table '{}' needs at least one data column",
                table
            )));
        }
        if data_columns.iter().any(|c| c == &revision_column) {
            return Err(Error::Config(format!(
                "revision column '{}' of table '{}' must not appear among its data columns",
                revision_column, table
            )));
        }
        Ok(RevisionedTable {
            table,
            revision_column,
            data_columns,
        })
    }
}
