//! Backend command-execution primitive
//!
//! `Backend` is the consumed interface per backend driver: connect,
//! begin/commit/rollback at the physical level, and execute
//! non-query/scalar/reader commands. Drivers report failures as raw
//! [`BackendError`]s; categorization happens a layer up, in the
//! connection, through the active dialect.
//!
//! The crate also ships [`MockBackend`], a recording and scriptable
//! double used by the test suites of every downstream crate.

pub mod mock;

pub use mock::{BackendEvent, EventLog, MockBackend};
pub use relica_core::error::BackendError;

use relica_core::config::IsolationLevel;
use relica_core::statement::Statement;
use relica_core::value::{Row, SqlValue};

/// Result type for raw backend calls.
pub type BackendResult<T> = std::result::Result<T, BackendError>;

/// One physical database link.
///
/// Implementations are synchronous and not thread-safe; a backend is
/// confined to the connection that owns it.
pub trait Backend: Send {
    /// Establish the physical connection.
    ///
    /// `connection_string` is the driver string the active dialect built
    /// from the connection profile.
    fn open(&mut self, connection_string: &str) -> BackendResult<()>;

    /// Tear the physical connection down.
    fn close(&mut self) -> BackendResult<()>;

    /// True while the physical connection is established.
    fn is_open(&self) -> bool;

    /// Start a physical transaction at the given isolation level.
    fn begin(&mut self, isolation: IsolationLevel) -> BackendResult<()>;

    /// Commit the physical transaction.
    fn commit(&mut self) -> BackendResult<()>;

    /// Roll the physical transaction back.
    fn rollback(&mut self) -> BackendResult<()>;

    /// Execute a non-query command; returns the affected row count.
    fn execute(&mut self, stmt: &Statement) -> BackendResult<u64>;

    /// Execute a scalar query; `None` when the result is empty or NULL.
    fn query_scalar(&mut self, stmt: &Statement) -> BackendResult<Option<SqlValue>>;

    /// Execute a reader query.
    fn query_rows(&mut self, stmt: &Statement) -> BackendResult<Vec<Row>>;
}
