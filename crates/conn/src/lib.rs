//! Connection and transaction management
//!
//! The center of the data-access core: [`Connection`] owns one physical
//! backend link and layers nested transactions (savepoints), commit-time
//! validations, user-transaction allocation, and dialect-driven error
//! translation on top of it. [`RetryPolicy`] re-runs deadlock-victim
//! units of work, and [`sql`] holds the parameterized statement builders
//! shared by the higher layers.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod connection;
pub mod retry;
pub mod sequence;
pub mod sql;

pub use connection::{Connection, ValidationCheck};
pub use retry::RetryPolicy;
pub use sequence::{CounterSequence, DialectSequence, SequenceSource};
