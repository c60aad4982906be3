//! Built-in [`crate::state::StateAdapter`] implementations, one per
//! persistable kind.

pub mod components;
pub mod nodes;
