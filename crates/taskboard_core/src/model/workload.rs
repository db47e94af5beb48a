//! Derived, per-run workload records.
//!
//! Nothing in this module is persisted directly: a `Reassignment` becomes
//! durable only as a task assignee change plus one activity row.

use super::task::TaskPriority;
use super::{MemberId, ProjectId, TaskId};
use serde::{Deserialize, Serialize};

/// One computed task move.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reassignment {
    pub task_id: TaskId,
    pub task_name: String,
    pub priority: TaskPriority,
    pub project_id: ProjectId,
    pub from_member_id: MemberId,
    pub to_member_id: MemberId,
}
