//! Column codecs shared by the SQLite repositories.

use super::{RepoError, RepoResult};
use crate::model::activity::ActivityKind;
use crate::model::task::{TaskPriority, TaskStatus};
use uuid::Uuid;

pub(crate) fn parse_uuid(value: &str, column: &'static str) -> RepoResult<Uuid> {
    Uuid::parse_str(value)
        .map_err(|_| RepoError::InvalidData(format!("invalid uuid `{value}` in {column}")))
}

pub(crate) fn parse_optional_uuid(
    value: Option<String>,
    column: &'static str,
) -> RepoResult<Option<Uuid>> {
    value.map(|text| parse_uuid(&text, column)).transpose()
}

pub(crate) fn parse_flag(value: i64, column: &'static str) -> RepoResult<bool> {
    match value {
        0 => Ok(false),
        1 => Ok(true),
        other => Err(RepoError::InvalidData(format!(
            "invalid flag value `{other}` in {column}"
        ))),
    }
}

pub(crate) fn bool_to_int(value: bool) -> i64 {
    if value {
        1
    } else {
        0
    }
}

pub(crate) fn parse_capacity(value: i64) -> RepoResult<u32> {
    u32::try_from(value).map_err(|_| {
        RepoError::InvalidData(format!("invalid capacity `{value}` in team_members.capacity"))
    })
}

pub(crate) fn priority_to_db(priority: TaskPriority) -> &'static str {
    match priority {
        TaskPriority::Low => "low",
        TaskPriority::Medium => "medium",
        TaskPriority::High => "high",
    }
}

pub(crate) fn parse_priority(value: &str) -> RepoResult<TaskPriority> {
    match value {
        "low" => Ok(TaskPriority::Low),
        "medium" => Ok(TaskPriority::Medium),
        "high" => Ok(TaskPriority::High),
        other => Err(RepoError::InvalidData(format!(
            "invalid priority `{other}` in tasks.priority"
        ))),
    }
}

pub(crate) fn status_to_db(status: TaskStatus) -> &'static str {
    match status {
        TaskStatus::Pending => "pending",
        TaskStatus::InProgress => "in_progress",
        TaskStatus::Done => "done",
        TaskStatus::Cancelled => "cancelled",
    }
}

pub(crate) fn parse_status(value: &str) -> RepoResult<TaskStatus> {
    match value {
        "pending" => Ok(TaskStatus::Pending),
        "in_progress" => Ok(TaskStatus::InProgress),
        "done" => Ok(TaskStatus::Done),
        "cancelled" => Ok(TaskStatus::Cancelled),
        other => Err(RepoError::InvalidData(format!(
            "invalid status `{other}` in tasks.status"
        ))),
    }
}

pub(crate) fn activity_kind_to_db(kind: ActivityKind) -> &'static str {
    match kind {
        ActivityKind::TaskCreated => "task_created",
        ActivityKind::TaskAssigned => "task_assigned",
        ActivityKind::TaskUnassigned => "task_unassigned",
        ActivityKind::TaskReassigned => "task_reassigned",
        ActivityKind::TaskStatusUpdated => "task_status_updated",
        ActivityKind::TaskPriorityUpdated => "task_priority_updated",
    }
}

pub(crate) fn parse_activity_kind(value: &str) -> RepoResult<ActivityKind> {
    match value {
        "task_created" => Ok(ActivityKind::TaskCreated),
        "task_assigned" => Ok(ActivityKind::TaskAssigned),
        "task_unassigned" => Ok(ActivityKind::TaskUnassigned),
        "task_reassigned" => Ok(ActivityKind::TaskReassigned),
        "task_status_updated" => Ok(ActivityKind::TaskStatusUpdated),
        "task_priority_updated" => Ok(ActivityKind::TaskPriorityUpdated),
        other => Err(RepoError::InvalidData(format!(
            "invalid activity kind `{other}` in activities.kind"
        ))),
    }
}
