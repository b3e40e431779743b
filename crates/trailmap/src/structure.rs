//! Relationship structure built from an event list.
//!
//! The [`Lineage`] resolver is the first stage of the layout pipeline and the
//! only one that reads raw `parent_id` / `lateral_movement_target` strings.
//! Later stages work on the dense indices it hands out.

mod lineage;

pub use lineage::{Jump, Lineage};
