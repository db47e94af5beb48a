//! Task model.
//!
//! # Responsibility
//! - Define task priority/status and the load rules derived from them.
//!
//! # Invariants
//! - Only `TaskStatus::Done` removes a task from its assignee's load.
//! - Unassigned tasks never count as load.
//! - `TaskPriority::High` tasks are pinned to their current assignee.

use super::validation::{require_name, ModelValidationError};
use super::{MemberId, ProjectId, TaskId};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Task priority tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskPriority {
    Low,
    Medium,
    High,
}

impl TaskPriority {
    /// Whether the rebalancer may move a task of this priority.
    pub fn is_movable(self) -> bool {
        !matches!(self, Self::High)
    }

    /// Migration order: lower ranks leave an overloaded member first.
    pub fn migration_rank(self) -> u8 {
        match self {
            Self::Low => 0,
            Self::Medium => 1,
            Self::High => 2,
        }
    }
}

/// Task lifecycle state.
///
/// Non-exhaustive on purpose: new states may be added without touching load
/// accounting, which only cares about `Done`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[non_exhaustive]
pub enum TaskStatus {
    Pending,
    InProgress,
    Done,
    Cancelled,
}

impl TaskStatus {
    /// Returns whether a task in this state still occupies its assignee.
    pub fn counts_as_load(self) -> bool {
        !matches!(self, Self::Done)
    }
}

/// Unit of work inside one project.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    pub id: TaskId,
    pub project_id: ProjectId,
    pub name: String,
    pub priority: TaskPriority,
    pub status: TaskStatus,
    /// `None` means unassigned; such tasks carry no load.
    pub assignee_id: Option<MemberId>,
}

impl Task {
    /// Creates a pending, unassigned task with a generated id.
    pub fn new(project_id: ProjectId, name: impl Into<String>, priority: TaskPriority) -> Self {
        Self {
            id: Uuid::new_v4(),
            project_id,
            name: name.into(),
            priority,
            status: TaskStatus::Pending,
            assignee_id: None,
        }
    }

    /// Builder-style assignee setter.
    pub fn assigned_to(mut self, member_id: MemberId) -> Self {
        self.assignee_id = Some(member_id);
        self
    }

    /// Builder-style status setter.
    pub fn with_status(mut self, status: TaskStatus) -> Self {
        self.status = status;
        self
    }

    /// Returns whether this task counts toward its assignee's load.
    pub fn counts_as_load(&self) -> bool {
        self.assignee_id.is_some() && self.status.counts_as_load()
    }

    /// Returns whether the rebalancer is allowed to move this task.
    pub fn is_movable(&self) -> bool {
        self.counts_as_load() && self.priority.is_movable()
    }

    pub fn validate(&self) -> Result<(), ModelValidationError> {
        require_name("task name", &self.name)
    }
}
