//! Sequence value allocation
//!
//! Identifiers for user transactions and revision copies come from one
//! schema-wide sequence. The production source queries the backend
//! through the dialect; tests substitute a plain counter.

use crate::connection::Connection;
use relica_core::error::{Error, Result};
use relica_core::statement::Statement;
use relica_core::value::SqlValue;
use std::sync::atomic::{AtomicI64, Ordering};

/// Allocator for the hosting system's main identifier sequence.
pub trait SequenceSource: Send + Sync {
    /// Allocate the next value.
    fn next_value(&self, conn: &mut Connection) -> Result<i64>;
}

/// Queries the backend sequence named at construction, using the SQL the
/// active dialect prescribes.
pub struct DialectSequence {
    sequence_name: String,
}

impl DialectSequence {
    /// Allocator for the named backend sequence.
    pub fn new(sequence_name: impl Into<String>) -> Self {
        DialectSequence {
            sequence_name: sequence_name.into(),
        }
    }
}

impl SequenceSource for DialectSequence {
    fn next_value(&self, conn: &mut Connection) -> Result<i64> {
        let sql = conn.dialect().next_sequence_sql(&self.sequence_name);
        let stmt = Statement::raw(sql);
        let value = conn.query_scalar(&stmt)?;
        match value {
            Some(SqlValue::I64(v)) => Ok(v),
            Some(SqlValue::I32(v)) => Ok(i64::from(v)),
            other => Err(Error::unexpected_result(
                conn.database_name().to_string(),
                format!("sequence query returned {:?}", other),
                &stmt,
            )),
        }
    }
}

/// In-process counter, for tests and tooling that never touch a backend.
pub struct CounterSequence {
    next: AtomicI64,
}

impl CounterSequence {
    /// A counter whose first allocated value is `first`.
    pub fn starting_at(first: i64) -> Self {
        CounterSequence {
            next: AtomicI64::new(first),
        }
    }
}

impl SequenceSource for CounterSequence {
    fn next_value(&self, _conn: &mut Connection) -> Result<i64> {
        Ok(self.next.fetch_add(1, Ordering::SeqCst))
    }
}
