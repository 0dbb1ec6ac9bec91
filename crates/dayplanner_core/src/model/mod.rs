//! Planner domain model.
//!
//! # Responsibility
//! - Define the task and focus-area records shared by store and adapters.
//! - Own the persisted JSON record shape (`camelCase`, plural dates).
//!
//! # Invariants
//! - Task ids are unique integers within one snapshot.
//! - Focus areas are identified by trimmed, non-empty, unique names.
//! - `scheduled_dates` never holds duplicates or malformed dates.

pub mod focus_area;
pub mod snapshot;
pub mod task;
