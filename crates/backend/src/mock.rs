//! Recording, scriptable backend double
//!
//! `MockBackend` is a cheap handle over shared state: clones observe and
//! script the same backend, so a test can keep a handle while the
//! connection owns the boxed original. Tests script scalar/row responses
//! in FIFO order and arm failures against substrings of upcoming command
//! text; everything the backend is asked to do lands in the event log.

use crate::{Backend, BackendResult};
use parking_lot::Mutex;
use relica_core::config::IsolationLevel;
use relica_core::error::BackendError;
use relica_core::statement::Statement;
use relica_core::value::{Row, SqlParam, SqlValue};
use std::collections::VecDeque;
use std::sync::Arc;

/// One recorded backend call.
#[derive(Debug, Clone, PartialEq)]
pub enum BackendEvent {
    /// `open()` was called.
    Open,
    /// `close()` was called.
    Close,
    /// A physical transaction began at this isolation level.
    Begin(IsolationLevel),
    /// The physical transaction committed.
    Commit,
    /// The physical transaction rolled back.
    Rollback,
    /// A non-query command ran.
    Execute {
        /// Command text.
        sql: String,
        /// Parameters in placeholder order.
        params: Vec<SqlParam>,
        /// Long-running marker from the statement.
        long_running: bool,
    },
    /// A scalar query ran.
    QueryScalar {
        /// Command text.
        sql: String,
    },
    /// A reader query ran.
    QueryRows {
        /// Command text.
        sql: String,
    },
}

impl BackendEvent {
    fn sql(&self) -> Option<&str> {
        match self {
            BackendEvent::Execute { sql, .. }
            | BackendEvent::QueryScalar { sql }
            | BackendEvent::QueryRows { sql } => Some(sql),
            _ => None,
        }
    }
}

#[derive(Default)]
struct MockState {
    open: bool,
    connection_string: Option<String>,
    in_transaction: bool,
    events: Vec<BackendEvent>,
    scalars: VecDeque<Option<SqlValue>>,
    rows: VecDeque<Vec<Row>>,
    statement_failures: Vec<(String, BackendError)>,
    fail_open: Option<BackendError>,
    fail_begin: Option<BackendError>,
    fail_commit: Option<BackendError>,
    fail_rollback: Option<BackendError>,
}

impl MockState {
    fn take_statement_failure(&mut self, sql: &str) -> Option<BackendError> {
        let index = self
            .statement_failures
            .iter()
            .position(|(needle, _)| sql.contains(needle.as_str()))?;
        Some(self.statement_failures.remove(index).1)
    }
}

/// Scriptable in-memory backend for tests.
#[derive(Clone, Default)]
pub struct MockBackend {
    state: Arc<Mutex<MockState>>,
}

impl MockBackend {
    /// A fresh, closed backend.
    pub fn new() -> Self {
        Self::default()
    }

    /// A view over the shared event log.
    pub fn log(&self) -> EventLog {
        EventLog {
            state: Arc::clone(&self.state),
        }
    }

    /// True while a physical transaction is open.
    pub fn in_transaction(&self) -> bool {
        self.state.lock().in_transaction
    }

    /// The connection string the last `open()` received.
    pub fn connection_string(&self) -> Option<String> {
        self.state.lock().connection_string.clone()
    }

    /// Queue the response for the next scalar query.
    pub fn push_scalar(&self, value: Option<SqlValue>) {
        self.state.lock().scalars.push_back(value);
    }

    /// Queue the response for the next reader query.
    pub fn push_rows(&self, rows: Vec<Row>) {
        self.state.lock().rows.push_back(rows);
    }

    /// Fail the next statement whose text contains `needle`.
    pub fn fail_matching(&self, needle: impl Into<String>, error: BackendError) {
        self.state
            .lock()
            .statement_failures
            .push((needle.into(), error));
    }

    /// Fail the next `open()`.
    pub fn fail_open(&self, error: BackendError) {
        self.state.lock().fail_open = Some(error);
    }

    /// Fail the next `begin()`.
    pub fn fail_begin(&self, error: BackendError) {
        self.state.lock().fail_begin = Some(error);
    }

    /// Fail the next `commit()`.
    pub fn fail_commit(&self, error: BackendError) {
        self.state.lock().fail_commit = Some(error);
    }

    /// Fail the next `rollback()`.
    pub fn fail_rollback(&self, error: BackendError) {
        self.state.lock().fail_rollback = Some(error);
    }
}

impl Backend for MockBackend {
    fn open(&mut self, connection_string: &str) -> BackendResult<()> {
        let mut state = self.state.lock();
        state.events.push(BackendEvent::Open);
        state.connection_string = Some(connection_string.to_string());
        if let Some(err) = state.fail_open.take() {
            return Err(err);
        }
        state.open = true;
        Ok(())
    }

    fn close(&mut self) -> BackendResult<()> {
        let mut state = self.state.lock();
        state.events.push(BackendEvent::Close);
        state.open = false;
        state.in_transaction = false;
        Ok(())
    }

    fn is_open(&self) -> bool {
        self.state.lock().open
    }

    fn begin(&mut self, isolation: IsolationLevel) -> BackendResult<()> {
        let mut state = self.state.lock();
        state.events.push(BackendEvent::Begin(isolation));
        if let Some(err) = state.fail_begin.take() {
            return Err(err);
        }
        state.in_transaction = true;
        Ok(())
    }

    fn commit(&mut self) -> BackendResult<()> {
        let mut state = self.state.lock();
        state.events.push(BackendEvent::Commit);
        if let Some(err) = state.fail_commit.take() {
            return Err(err);
        }
        state.in_transaction = false;
        Ok(())
    }

    fn rollback(&mut self) -> BackendResult<()> {
        let mut state = self.state.lock();
        state.events.push(BackendEvent::Rollback);
        if let Some(err) = state.fail_rollback.take() {
            return Err(err);
        }
        state.in_transaction = false;
        Ok(())
    }

    fn execute(&mut self, stmt: &Statement) -> BackendResult<u64> {
        let mut state = self.state.lock();
        state.events.push(BackendEvent::Execute {
            sql: stmt.sql.clone(),
            params: stmt.params.clone(),
            long_running: stmt.long_running,
        });
        if let Some(err) = state.take_statement_failure(&stmt.sql) {
            return Err(err);
        }
        Ok(1)
    }

    fn query_scalar(&mut self, stmt: &Statement) -> BackendResult<Option<SqlValue>> {
        let mut state = self.state.lock();
        state.events.push(BackendEvent::QueryScalar {
            sql: stmt.sql.clone(),
        });
        if let Some(err) = state.take_statement_failure(&stmt.sql) {
            return Err(err);
        }
        Ok(state.scalars.pop_front().unwrap_or(None))
    }

    fn query_rows(&mut self, stmt: &Statement) -> BackendResult<Vec<Row>> {
        let mut state = self.state.lock();
        state.events.push(BackendEvent::QueryRows {
            sql: stmt.sql.clone(),
        });
        if let Some(err) = state.take_statement_failure(&stmt.sql) {
            return Err(err);
        }
        Ok(state.rows.pop_front().unwrap_or_default())
    }
}

/// Read-side view over a [`MockBackend`]'s recorded calls.
#[derive(Clone)]
pub struct EventLog {
    state: Arc<Mutex<MockState>>,
}

impl EventLog {
    /// Snapshot of every recorded event, in order.
    pub fn snapshot(&self) -> Vec<BackendEvent> {
        self.state.lock().events.clone()
    }

    /// Command text of every statement-level event, in order.
    pub fn statements(&self) -> Vec<String> {
        self.state
            .lock()
            .events
            .iter()
            .filter_map(|e| e.sql().map(str::to_string))
            .collect()
    }

    /// Number of statement-level events whose text contains `needle`.
    pub fn count_containing(&self, needle: &str) -> usize {
        self.state
            .lock()
            .events
            .iter()
            .filter(|e| e.sql().is_some_and(|sql| sql.contains(needle)))
            .count()
    }

    /// Number of physical begins.
    pub fn begin_count(&self) -> usize {
        self.count_event(|e| matches!(e, BackendEvent::Begin(_)))
    }

    /// Number of physical commits.
    pub fn commit_count(&self) -> usize {
        self.count_event(|e| matches!(e, BackendEvent::Commit))
    }

    /// Number of physical rollbacks.
    pub fn rollback_count(&self) -> usize {
        self.count_event(|e| matches!(e, BackendEvent::Rollback))
    }

    /// Forget everything recorded so far.
    pub fn clear(&self) {
        self.state.lock().events.clear();
    }

    fn count_event(&self, predicate: impl Fn(&BackendEvent) -> bool) -> usize {
        self.state.lock().events.iter().filter(|e| predicate(e)).count()
    }
}
