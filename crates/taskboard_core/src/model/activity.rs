//! Activity (audit trail) model.
//!
//! # Invariants
//! - Activities are append-only; nothing in core updates or reads them back
//!   to make decisions.

use super::{ActivityId, MemberId, TaskId, UserId};
use serde::{Deserialize, Serialize};

/// Kind of state transition captured by one activity row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivityKind {
    TaskCreated,
    TaskAssigned,
    TaskUnassigned,
    TaskReassigned,
    TaskStatusUpdated,
    TaskPriorityUpdated,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Activity {
    pub id: ActivityId,
    pub task_id: TaskId,
    /// Owner who triggered the change.
    pub actor_id: UserId,
    pub kind: ActivityKind,
    pub from_member_id: Option<MemberId>,
    pub to_member_id: Option<MemberId>,
    pub from_value: Option<String>,
    pub to_value: Option<String>,
    /// Epoch milliseconds.
    pub created_at: i64,
}
