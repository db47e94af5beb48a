//! Domain model for the task board.
//!
//! # Responsibility
//! - Define the records that repositories persist and the rebalancer reads.
//! - Keep validation rules next to the data they guard.
//!
//! # Invariants
//! - Every record is identified by a stable UUID that is never reused.
//! - Member capacity is owner-defined and never derived from load.

pub mod activity;
pub mod project;
pub mod task;
pub mod team;
mod validation;
pub mod workload;

pub use validation::ModelValidationError;

use uuid::Uuid;

/// Board owner (the user who owns teams and projects).
pub type UserId = Uuid;
/// Team identifier.
pub type TeamId = Uuid;
/// Team member identifier.
pub type MemberId = Uuid;
/// Project identifier.
pub type ProjectId = Uuid;
/// Task identifier.
pub type TaskId = Uuid;
/// Activity (audit row) identifier.
pub type ActivityId = Uuid;
