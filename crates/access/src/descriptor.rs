//! Table descriptors
//!
//! A descriptor names a table's columns, its key, whether the backend
//! generates the key (identity), whether the table is revisioned, and the
//! friendly messages registered for its constraints. Modification objects
//! never inspect the schema at runtime; everything they need is declared
//! here.

use relica_core::error::{Error, Result};
use relica_revision::RevisionedTable;
use std::collections::HashMap;

/// Static description of one writable table.
#[derive(Debug, Clone)]
pub struct TableDescriptor {
    /// Table name.
    pub name: String,
    /// Every writable column, keys included.
    pub columns: Vec<String>,
    /// Key columns identifying a single row.
    pub key_columns: Vec<String>,
    /// Key column whose value the backend generates on insert.
    pub identity_column: Option<String>,
    /// True when the table participates in copy-on-write revisioning.
    pub revisioned: bool,
    /// Friendly message per violated-constraint name.
    pub constraint_messages: HashMap<String, String>,
}

impl TableDescriptor {
    /// Describe a table. Key columns must be a subset of the columns.
    pub fn new(
        name: impl Into<String>,
        columns: Vec<String>,
        key_columns: Vec<String>,
    ) -> Result<Self> {
        let name = name.into();
        if key_columns.is_empty() {
            return Err(Error::Config(format!(
                "table '{}' needs at least one key column",
                name
            )));
        }
        if let Some(missing) = key_columns.iter().find(|k| !columns.contains(k)) {
            return Err(Error::Config(format!(
                "key column '{}' of table '{}' is not among its columns",
                missing, name
            )));
        }
        Ok(TableDescriptor {
            name,
            columns,
            key_columns,
            identity_column: None,
            revisioned: false,
            constraint_messages: HashMap::new(),
        })
    }

    /// Mark a key column as backend-generated on insert.
    pub fn with_identity(mut self, column: impl Into<String>) -> Result<Self> {
        let column = column.into();
        if !self.key_columns.contains(&column) {
            return Err(Error::Config(format!(
                "identity column '{}' of table '{}' must be a key column",
                column, self.name
            )));
        }
        self.identity_column = Some(column);
        Ok(self)
    }

    /// Enable copy-on-write revisioning; the first key column is the
    /// revision identifier.
    pub fn with_revisioning(mut self) -> Self {
        self.revisioned = true;
        self
    }

    /// Register the friendly message shown when the named constraint is
    /// violated.
    pub fn with_constraint_message(
        mut self,
        constraint: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        self.constraint_messages
            .insert(constraint.into(), message.into());
        self
    }

    /// True when the column is part of the key.
    pub fn is_key(&self, column: &str) -> bool {
        self.key_columns.iter().any(|k| k == column)
    }

    /// Friendly message for a violated constraint, when one is registered.
    pub fn friendly_message(&self, constraint: &str) -> Option<&str> {
        self.constraint_messages.get(constraint).map(String::as_str)
    }

    /// The revisioning view of this table.
    pub fn revisioned_table(&self) -> Result<RevisionedTable> {
        if !self.revisioned {
            return Err(Error::contract(format!(
                "table '{}' is not revisioned",
                self.name
            )));
        }
        let revision_column = self.key_columns[0].clone();
        let data_columns = self
            .columns
            .iter()
            .filter(|c| **c != revision_column)
            .cloned()
            .collect();
        RevisionedTable::new(self.name.clone(), revision_column, data_columns)
    }
}
