//! Copy-on-write revision history
//!
//! Revisioned tables keep every historical state of a row. Before a user
//! transaction first modifies a row, [`RevisionHistory`] archives its live
//! revision: the copy receives a fresh identifier and the previous owner,
//! the live revision is reparented to the current user transaction.
//! Archiving is idempotent per user transaction per row.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod history;
pub mod tables;

pub use history::{CopySummary, RevisionHistory};
pub use tables::RevisionedTable;
