//! Deadlock retry policy
//!
//! Wraps a transactional unit of work and re-runs it when it fails with a
//! concurrency conflict. Only [`Error::Concurrency`] is retried; every
//! other failure propagates on first occurrence. The unit must own its
//! transaction, so the policy refuses to run inside one already open.

use crate::connection::Connection;
use relica_core::error::{Error, Result};
use std::time::Duration;

/// Retry policy for deadlock-prone units of work.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    delay: Duration,
    max_attempts: Option<u32>,
}

impl Default for RetryPolicy {
    /// Retry indefinitely, pausing one second between attempts.
    fn default() -> Self {
        RetryPolicy {
            delay: Duration::from_secs(1),
            max_attempts: None,
        }
    }
}

impl RetryPolicy {
    /// Policy with a custom pause between attempts.
    pub fn with_delay(delay: Duration) -> Self {
        RetryPolicy {
            delay,
            max_attempts: None,
        }
    }

    /// Cap the total number of attempts; the last failure propagates.
    pub fn max_attempts(mut self, attempts: u32) -> Self {
        self.max_attempts = Some(attempts);
        self
    }

    /// Run `unit` until it succeeds or fails non-retryably.
    ///
    /// The unit is responsible for beginning and finishing its own
    /// transaction (typically via
    /// [`Connection::execute_in_transaction`]); by the time a concurrency
    /// conflict surfaces here the transaction is already rolled back, so
    /// the next attempt starts clean.
    pub fn run<T, F>(&self, conn: &mut Connection, mut unit: F) -> Result<T>
    where
        F: FnMut(&mut Connection) -> Result<T>,
    {
        let mut attempt: u32 = 1;
        loop {
            if conn.in_transaction() {
                return Err(Error::contract(
                    "retry policy invoked inside an open transaction",
                ));
            }
            match unit(conn) {
                Ok(value) => return Ok(value),
                Err(e) if e.is_concurrency() => {
                    if let Some(max) = self.max_attempts {
                        if attempt >= max {
                            tracing::warn!(attempt, "concurrency conflict; attempts exhausted");
                            return Err(e);
                        }
                    }
                    tracing::warn!(
                        attempt,
                        delay_ms = self.delay.as_millis() as u64,
                        error = %e,
                        "concurrency conflict; retrying"
                    );
                    std::thread::sleep(self.delay);
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }
}
