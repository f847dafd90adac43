//! Ordered column change set
//!
//! A change set records column assignments in first-set order; setting a
//! column again overwrites its value in place. Modification objects use
//! one change set for pending assignments and one for the last persisted
//! state, and diff the two to decide what a statement must touch.

use relica_core::value::SqlValue;

/// Ordered set of column assignments.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChangeSet {
    entries: Vec<(String, SqlValue)>,
}

impl ChangeSet {
    /// An empty change set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Assign a column, keeping its original position if already set.
    pub fn set(&mut self, column: impl Into<String>, value: SqlValue) {
        let column = column.into();
        match self.entries.iter_mut().find(|(c, _)| *c == column) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((column, value)),
        }
    }

    /// Value assigned to a column, if any.
    pub fn get(&self, column: &str) -> Option<&SqlValue> {
        self.entries
            .iter()
            .find(|(c, _)| c == column)
            .map(|(_, v)| v)
    }

    /// True when a column has an assignment.
    pub fn contains(&self, column: &str) -> bool {
        self.get(column).is_some()
    }

    /// True when nothing is assigned.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of assigned columns.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Assignments in first-set order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &SqlValue)> {
        self.entries.iter().map(|(c, v)| (c.as_str(), v))
    }

    /// Drop every assignment.
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Move every assignment into `target`, leaving this set empty.
    pub fn drain_into(&mut self, target: &mut ChangeSet) {
        for (column, value) in self.entries.drain(..) {
            target.set(column, value);
        }
    }
}
