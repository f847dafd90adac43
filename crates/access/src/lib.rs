//! Data-access methods: modification objects and access state
//!
//! The write-side API of the data-access core. [`Modification`]
//! accumulates column assignments against one row and emits the single
//! INSERT or UPDATE they amount to; [`TableDescriptor`] declares the
//! schema facts it needs; [`AccessState`] carries connection profiles and
//! cached state through a unit of data access, explicitly or via the
//! per-thread override stack in [`state`].

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod changeset;
pub mod descriptor;
pub mod modification;
pub mod state;

pub use changeset::ChangeSet;
pub use descriptor::TableDescriptor;
pub use modification::{Modification, ModificationLogic, ModificationMode, NoLogic};
pub use state::{current, push_override, AccessState, OverrideGuard, SharedState};
