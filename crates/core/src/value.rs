//! SQL value and row types
//!
//! `SqlValue` is the unified value enum carried in statement parameters and
//! returned from queries. It deliberately covers only the types the
//! data-access core itself needs; richer vendor types are the backend
//! driver's concern.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A single SQL-typed value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum SqlValue {
    /// SQL NULL.
    Null,
    /// 32-bit integer.
    I32(i32),
    /// 64-bit integer (also used for sequence-allocated identifiers).
    I64(i64),
    /// Double-precision float.
    F64(f64),
    /// Boolean / BIT.
    Bool(bool),
    /// Character data.
    Text(String),
    /// Binary data.
    Bytes(Vec<u8>),
    /// Timestamp with time zone, normalized to UTC.
    DateTime(DateTime<Utc>),
}

impl SqlValue {
    /// Interpret the value as a 64-bit integer, widening `I32` values.
    ///
    /// Returns `None` for every non-integer variant. Used for identifier
    /// columns, which the core always treats as 64-bit.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            SqlValue::I32(v) => Some(i64::from(*v)),
            SqlValue::I64(v) => Some(*v),
            _ => None,
        }
    }

    /// True if the value is SQL NULL.
    pub fn is_null(&self) -> bool {
        matches!(self, SqlValue::Null)
    }
}

impl fmt::Display for SqlValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SqlValue::Null => write!(f, "NULL"),
            SqlValue::I32(v) => write!(f, "{}", v),
            SqlValue::I64(v) => write!(f, "{}", v),
            SqlValue::F64(v) => write!(f, "{}", v),
            SqlValue::Bool(v) => write!(f, "{}", v),
            SqlValue::Text(v) => write!(f, "'{}'", v),
            SqlValue::Bytes(v) => write!(f, "<{} bytes>", v.len()),
            SqlValue::DateTime(v) => write!(f, "'{}'", v.to_rfc3339()),
        }
    }
}

impl From<i32> for SqlValue {
    fn from(v: i32) -> Self {
        SqlValue::I32(v)
    }
}

impl From<i64> for SqlValue {
    fn from(v: i64) -> Self {
        SqlValue::I64(v)
    }
}

impl From<&str> for SqlValue {
    fn from(v: &str) -> Self {
        SqlValue::Text(v.to_string())
    }
}

impl From<String> for SqlValue {
    fn from(v: String) -> Self {
        SqlValue::Text(v)
    }
}

impl From<bool> for SqlValue {
    fn from(v: bool) -> Self {
        SqlValue::Bool(v)
    }
}

/// A named statement parameter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SqlParam {
    /// Parameter name without any vendor prefix (`p1`, `p2`, ...).
    pub name: String,
    /// Parameter value.
    pub value: SqlValue,
}

impl SqlParam {
    /// Create a parameter.
    pub fn new(name: impl Into<String>, value: SqlValue) -> Self {
        SqlParam {
            name: name.into(),
            value,
        }
    }
}

/// One result row, positional.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Row {
    /// Column values in select-list order.
    pub values: Vec<SqlValue>,
}

impl Row {
    /// Create a row from values.
    pub fn new(values: Vec<SqlValue>) -> Self {
        Row { values }
    }

    /// Value at a position, if present.
    pub fn get(&self, index: usize) -> Option<&SqlValue> {
        self.values.get(index)
    }

    /// Integer value at a position, widening `I32`.
    pub fn i64(&self, index: usize) -> Option<i64> {
        self.get(index).and_then(SqlValue::as_i64)
    }
}

/// An equality condition over one column.
///
/// Modification objects and the revision-history manager only ever filter
/// by column equality; anything richer belongs to the (out-of-scope) query
/// layer.
#[derive(Debug, Clone, PartialEq)]
pub struct Condition {
    /// Column name.
    pub column: String,
    /// Value the column must equal.
    pub value: SqlValue,
}

impl Condition {
    /// Create an equality condition.
    pub fn equals(column: impl Into<String>, value: impl Into<SqlValue>) -> Self {
        Condition {
            column: column.into(),
            value: value.into(),
        }
    }
}
