//! Workload repository: the storage side of rebalancing.
//!
//! # Responsibility
//! - Resolve owner-scoped projects together with their team members.
//! - Project current member load straight from `tasks` on every call.
//! - Apply a full set of reassignments and their audit rows atomically,
//!   refusing tasks that were completed or reassigned since planning.
//!
//! # Invariants
//! - Load is never cached: every count is a fresh query.
//! - `apply_reassignments` writes all moves and all activity rows, or nothing.
//! - Only `tasks.assignee_id`, `tasks.updated_at` and new `activities` rows
//!   are touched by `apply_reassignments`.

use super::board_repo::{insert_activity, list_project_tasks, list_team_members, parse_member_row};
use super::codec::{parse_flag, parse_uuid};
use super::{ensure_connection_ready, RepoError, RepoResult};
use crate::model::activity::ActivityKind;
use crate::model::project::Project;
use crate::model::task::Task;
use crate::model::team::TeamMember;
use crate::model::workload::Reassignment;
use crate::model::{MemberId, ProjectId, TaskId, UserId};
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, Row, Transaction, TransactionBehavior};
use std::collections::HashMap;

const PROJECT_SELECT_SQL: &str = "SELECT
    id,
    owner_id,
    team_id,
    name,
    is_active
FROM projects";

/// One project together with every member of the team staffing it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectScope {
    pub project: Project,
    /// Team members in creation order, active and inactive alike.
    pub members: Vec<TeamMember>,
}

/// Storage contract consumed by the rebalancing service.
pub trait WorkloadRepository {
    /// Loads one active project owned by `owner_id`.
    ///
    /// Returns `None` when the project does not exist, belongs to another
    /// owner, or is inactive.
    fn resolve_project_scope(
        &self,
        owner_id: UserId,
        project_id: ProjectId,
    ) -> RepoResult<Option<ProjectScope>>;
    /// Lists every active project of `owner_id` in creation order.
    fn list_owner_projects(&self, owner_id: UserId) -> RepoResult<Vec<ProjectScope>>;
    /// Lists every member of every team owned by `owner_id`.
    fn list_owner_members(&self, owner_id: UserId) -> RepoResult<Vec<TeamMember>>;
    /// Counts non-done assigned tasks per member across all projects.
    ///
    /// Every requested member is present in the result, with `0` when idle.
    fn count_active_load(&self, member_ids: &[MemberId]) -> RepoResult<HashMap<MemberId, u32>>;
    /// Lists non-done, assigned tasks of one project in creation order.
    fn list_movable_tasks(&self, project_id: ProjectId) -> RepoResult<Vec<Task>>;
    /// Persists every reassignment plus one audit activity per move.
    fn apply_reassignments(&self, actor_id: UserId, moves: &[Reassignment]) -> RepoResult<()>;
}

/// SQLite-backed workload repository.
pub struct SqliteWorkloadRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteWorkloadRepository<'conn> {
    /// Creates repository from a migrated connection.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_connection_ready(conn)?;
        Ok(Self { conn })
    }
}

impl WorkloadRepository for SqliteWorkloadRepository<'_> {
    fn resolve_project_scope(
        &self,
        owner_id: UserId,
        project_id: ProjectId,
    ) -> RepoResult<Option<ProjectScope>> {
        let mut stmt = self.conn.prepare(&format!(
            "{PROJECT_SELECT_SQL}
             WHERE id = ?1
               AND owner_id = ?2
               AND is_active = 1;"
        ))?;
        let mut rows = stmt.query(params![project_id.to_string(), owner_id.to_string()])?;
        let Some(row) = rows.next()? else {
            return Ok(None);
        };

        let project = parse_project_row(row)?;
        let members = list_team_members(self.conn, project.team_id)?;
        Ok(Some(ProjectScope { project, members }))
    }

    fn list_owner_projects(&self, owner_id: UserId) -> RepoResult<Vec<ProjectScope>> {
        let mut stmt = self.conn.prepare(&format!(
            "{PROJECT_SELECT_SQL}
             WHERE owner_id = ?1
               AND is_active = 1
             ORDER BY created_at ASC, rowid ASC;"
        ))?;
        let mut rows = stmt.query([owner_id.to_string()])?;
        let mut projects = Vec::new();
        while let Some(row) = rows.next()? {
            projects.push(parse_project_row(row)?);
        }

        projects
            .into_iter()
            .map(|project| {
                let members = list_team_members(self.conn, project.team_id)?;
                Ok(ProjectScope { project, members })
            })
            .collect()
    }

    fn list_owner_members(&self, owner_id: UserId) -> RepoResult<Vec<TeamMember>> {
        let mut stmt = self.conn.prepare(
            "SELECT
                m.id AS id,
                m.team_id AS team_id,
                m.name AS name,
                m.role AS role,
                m.capacity AS capacity,
                m.is_active AS is_active
             FROM team_members m
             INNER JOIN teams t ON t.id = m.team_id
             WHERE t.owner_id = ?1
             ORDER BY m.created_at ASC, m.rowid ASC;",
        )?;
        let mut rows = stmt.query([owner_id.to_string()])?;
        let mut members = Vec::new();
        while let Some(row) = rows.next()? {
            members.push(parse_member_row(row)?);
        }
        Ok(members)
    }

    fn count_active_load(&self, member_ids: &[MemberId]) -> RepoResult<HashMap<MemberId, u32>> {
        let mut loads: HashMap<MemberId, u32> = member_ids.iter().map(|id| (*id, 0)).collect();
        if member_ids.is_empty() {
            return Ok(loads);
        }

        let placeholders = vec!["?"; member_ids.len()].join(", ");
        let sql = format!(
            "SELECT assignee_id, COUNT(*) AS load
             FROM tasks
             WHERE assignee_id IN ({placeholders})
               AND status != 'done'
             GROUP BY assignee_id;"
        );
        let bind_values: Vec<Value> = member_ids
            .iter()
            .map(|id| Value::Text(id.to_string()))
            .collect();

        let mut stmt = self.conn.prepare(&sql)?;
        let mut rows = stmt.query(params_from_iter(bind_values))?;
        while let Some(row) = rows.next()? {
            let member_text: String = row.get("assignee_id")?;
            let member_id = parse_uuid(&member_text, "tasks.assignee_id")?;
            let count: i64 = row.get("load")?;
            let count = u32::try_from(count).map_err(|_| {
                RepoError::InvalidData(format!("task load `{count}` out of range for {member_id}"))
            })?;
            loads.insert(member_id, count);
        }

        Ok(loads)
    }

    fn list_movable_tasks(&self, project_id: ProjectId) -> RepoResult<Vec<Task>> {
        let tasks = list_project_tasks(self.conn, project_id)?;
        Ok(tasks.into_iter().filter(Task::counts_as_load).collect())
    }

    fn apply_reassignments(&self, actor_id: UserId, moves: &[Reassignment]) -> RepoResult<()> {
        if moves.is_empty() {
            return Ok(());
        }

        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;

        for (route, task_ids) in group_by_route(moves) {
            let updated = reassign_batch(&tx, route, &task_ids)?;
            if updated != task_ids.len() {
                return Err(RepoError::StaleWrite {
                    expected: task_ids.len(),
                    updated,
                });
            }
        }

        for change in moves {
            insert_activity(
                &tx,
                change.task_id,
                actor_id,
                ActivityKind::TaskReassigned,
                Some(change.from_member_id),
                Some(change.to_member_id),
                Some(change.from_member_id.to_string()),
                Some(change.to_member_id.to_string()),
            )?;
        }

        tx.commit()?;
        Ok(())
    }
}

/// Source and target member of one batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Route {
    from_member_id: MemberId,
    to_member_id: MemberId,
}

/// Groups task ids by (source, target), keeping first-seen route order.
fn group_by_route(moves: &[Reassignment]) -> Vec<(Route, Vec<TaskId>)> {
    let mut groups: Vec<(Route, Vec<TaskId>)> = Vec::new();
    for change in moves {
        let route = Route {
            from_member_id: change.from_member_id,
            to_member_id: change.to_member_id,
        };
        match groups.iter_mut().find(|(existing, _)| *existing == route) {
            Some((_, task_ids)) => task_ids.push(change.task_id),
            None => groups.push((route, vec![change.task_id])),
        }
    }
    groups
}

/// Moves still-open tasks that are still held by the planned source member.
fn reassign_batch(conn: &Connection, route: Route, task_ids: &[TaskId]) -> RepoResult<usize> {
    let placeholders = vec!["?"; task_ids.len()].join(", ");
    let sql = format!(
        "UPDATE tasks
         SET assignee_id = ?,
             updated_at = (strftime('%s', 'now') * 1000)
         WHERE assignee_id = ?
           AND status != 'done'
           AND id IN ({placeholders});"
    );
    let mut bind_values = Vec::with_capacity(task_ids.len() + 2);
    bind_values.push(Value::Text(route.to_member_id.to_string()));
    bind_values.push(Value::Text(route.from_member_id.to_string()));
    bind_values.extend(task_ids.iter().map(|id| Value::Text(id.to_string())));

    let updated = conn.execute(&sql, params_from_iter(bind_values))?;
    Ok(updated)
}

fn parse_project_row(row: &Row<'_>) -> RepoResult<Project> {
    let id: String = row.get("id")?;
    let owner_id: String = row.get("owner_id")?;
    let team_id: String = row.get("team_id")?;

    Ok(Project {
        id: parse_uuid(&id, "projects.id")?,
        owner_id: parse_uuid(&owner_id, "projects.owner_id")?,
        team_id: parse_uuid(&team_id, "projects.team_id")?,
        name: row.get("name")?,
        is_active: parse_flag(row.get("is_active")?, "projects.is_active")?,
    })
}
