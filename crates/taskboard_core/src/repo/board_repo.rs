//! Board repository contracts and SQLite implementation.
//!
//! # Responsibility
//! - Persist users, teams, members, projects and tasks.
//! - Record the matching audit activity whenever a task is created or its
//!   status changes.
//!
//! # Invariants
//! - Task writes and their activity rows commit in one transaction.
//! - Member and task listings are ordered by creation (`created_at, rowid`),
//!   which is the stable order the rebalancer depends on.

use super::codec::{
    activity_kind_to_db, bool_to_int, parse_capacity, parse_flag, parse_optional_uuid,
    parse_priority, parse_status, parse_uuid, priority_to_db, status_to_db,
};
use super::{ensure_connection_ready, RepoError, RepoResult};
use crate::model::activity::ActivityKind;
use crate::model::project::{Project, User};
use crate::model::task::{Task, TaskStatus};
use crate::model::team::{Team, TeamMember};
use crate::model::{MemberId, ProjectId, TaskId, TeamId, UserId};
use rusqlite::{params, Connection, OptionalExtension, Row, Transaction, TransactionBehavior};
use uuid::Uuid;

const TASK_SELECT_SQL: &str = "SELECT
    id,
    project_id,
    name,
    priority,
    status,
    assignee_id
FROM tasks";

const MEMBER_SELECT_SQL: &str = "SELECT
    id,
    team_id,
    name,
    role,
    capacity,
    is_active
FROM team_members";

/// Repository interface for board entities.
pub trait BoardRepository {
    fn create_user(&self, user: &User) -> RepoResult<UserId>;
    fn create_team(&self, team: &Team) -> RepoResult<TeamId>;
    /// Adds a member to an existing team.
    fn add_member(&self, member: &TeamMember) -> RepoResult<MemberId>;
    fn set_member_active(&self, member_id: MemberId, is_active: bool) -> RepoResult<()>;
    fn list_members(&self, team_id: TeamId) -> RepoResult<Vec<TeamMember>>;
    fn create_project(&self, project: &Project) -> RepoResult<ProjectId>;
    fn set_project_active(&self, project_id: ProjectId, is_active: bool) -> RepoResult<()>;
    /// Creates a task and its `task_created` activity atomically.
    ///
    /// An assignee must be a member of the team staffing the project.
    fn create_task(&self, actor_id: UserId, task: &Task) -> RepoResult<TaskId>;
    fn get_task(&self, task_id: TaskId) -> RepoResult<Option<Task>>;
    /// Changes task status and records a `task_status_updated` activity.
    fn update_task_status(
        &self,
        actor_id: UserId,
        task_id: TaskId,
        status: TaskStatus,
    ) -> RepoResult<()>;
}

/// SQLite-backed board repository.
pub struct SqliteBoardRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteBoardRepository<'conn> {
    /// Creates repository from a migrated connection.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_connection_ready(conn)?;
        Ok(Self { conn })
    }
}

impl BoardRepository for SqliteBoardRepository<'_> {
    fn create_user(&self, user: &User) -> RepoResult<UserId> {
        user.validate()?;
        self.conn.execute(
            "INSERT INTO users (id, display_name) VALUES (?1, ?2);",
            params![user.id.to_string(), user.display_name.trim()],
        )?;
        Ok(user.id)
    }

    fn create_team(&self, team: &Team) -> RepoResult<TeamId> {
        team.validate()?;
        ensure_exists(self.conn, "users", "user", team.owner_id)?;
        self.conn.execute(
            "INSERT INTO teams (id, owner_id, name, is_active) VALUES (?1, ?2, ?3, ?4);",
            params![
                team.id.to_string(),
                team.owner_id.to_string(),
                team.name.trim(),
                bool_to_int(team.is_active),
            ],
        )?;
        Ok(team.id)
    }

    fn add_member(&self, member: &TeamMember) -> RepoResult<MemberId> {
        member.validate()?;
        ensure_exists(self.conn, "teams", "team", member.team_id)?;
        self.conn.execute(
            "INSERT INTO team_members (id, team_id, name, role, capacity, is_active)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6);",
            params![
                member.id.to_string(),
                member.team_id.to_string(),
                member.name.trim(),
                member.role.as_deref(),
                i64::from(member.capacity),
                bool_to_int(member.is_active),
            ],
        )?;
        Ok(member.id)
    }

    fn set_member_active(&self, member_id: MemberId, is_active: bool) -> RepoResult<()> {
        let changed = self.conn.execute(
            "UPDATE team_members SET is_active = ?2 WHERE id = ?1;",
            params![member_id.to_string(), bool_to_int(is_active)],
        )?;
        if changed == 0 {
            return Err(RepoError::NotFound {
                entity: "team member",
                id: member_id,
            });
        }
        Ok(())
    }

    fn list_members(&self, team_id: TeamId) -> RepoResult<Vec<TeamMember>> {
        list_team_members(self.conn, team_id)
    }

    fn create_project(&self, project: &Project) -> RepoResult<ProjectId> {
        project.validate()?;
        ensure_exists(self.conn, "users", "user", project.owner_id)?;
        let team_owner: Option<String> = self
            .conn
            .query_row(
                "SELECT owner_id FROM teams WHERE id = ?1;",
                [project.team_id.to_string()],
                |row| row.get(0),
            )
            .optional()?;
        // A project may only be staffed by a team of the same owner.
        if team_owner.as_deref() != Some(project.owner_id.to_string().as_str()) {
            return Err(RepoError::NotFound {
                entity: "team",
                id: project.team_id,
            });
        }

        self.conn.execute(
            "INSERT INTO projects (id, owner_id, team_id, name, is_active)
             VALUES (?1, ?2, ?3, ?4, ?5);",
            params![
                project.id.to_string(),
                project.owner_id.to_string(),
                project.team_id.to_string(),
                project.name.trim(),
                bool_to_int(project.is_active),
            ],
        )?;
        Ok(project.id)
    }

    fn set_project_active(&self, project_id: ProjectId, is_active: bool) -> RepoResult<()> {
        let changed = self.conn.execute(
            "UPDATE projects SET is_active = ?2 WHERE id = ?1;",
            params![project_id.to_string(), bool_to_int(is_active)],
        )?;
        if changed == 0 {
            return Err(RepoError::NotFound {
                entity: "project",
                id: project_id,
            });
        }
        Ok(())
    }

    fn create_task(&self, actor_id: UserId, task: &Task) -> RepoResult<TaskId> {
        task.validate()?;

        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        ensure_exists(&tx, "projects", "project", task.project_id)?;
        if let Some(assignee_id) = task.assignee_id {
            ensure_project_staff(&tx, task.project_id, assignee_id)?;
        }

        tx.execute(
            "INSERT INTO tasks (id, project_id, name, priority, status, assignee_id)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6);",
            params![
                task.id.to_string(),
                task.project_id.to_string(),
                task.name.trim(),
                priority_to_db(task.priority),
                status_to_db(task.status),
                task.assignee_id.map(|id| id.to_string()),
            ],
        )?;
        insert_activity(
            &tx,
            task.id,
            actor_id,
            ActivityKind::TaskCreated,
            None,
            task.assignee_id,
            None,
            task.assignee_id.map(|id| id.to_string()),
        )?;

        tx.commit()?;
        Ok(task.id)
    }

    fn get_task(&self, task_id: TaskId) -> RepoResult<Option<Task>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{TASK_SELECT_SQL} WHERE id = ?1;"))?;
        let mut rows = stmt.query([task_id.to_string()])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_task_row(row)?));
        }
        Ok(None)
    }

    fn update_task_status(
        &self,
        actor_id: UserId,
        task_id: TaskId,
        status: TaskStatus,
    ) -> RepoResult<()> {
        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        let previous: String = tx
            .query_row(
                "SELECT status FROM tasks WHERE id = ?1;",
                [task_id.to_string()],
                |row| row.get(0),
            )
            .map_err(|err| match err {
                rusqlite::Error::QueryReturnedNoRows => RepoError::NotFound {
                    entity: "task",
                    id: task_id,
                },
                other => other.into(),
            })?;
        let previous = parse_status(&previous)?;
        if previous == status {
            return Ok(());
        }

        tx.execute(
            "UPDATE tasks
             SET status = ?2,
                 updated_at = (strftime('%s', 'now') * 1000)
             WHERE id = ?1;",
            params![task_id.to_string(), status_to_db(status)],
        )?;
        insert_activity(
            &tx,
            task_id,
            actor_id,
            ActivityKind::TaskStatusUpdated,
            None,
            None,
            Some(status_to_db(previous).to_string()),
            Some(status_to_db(status).to_string()),
        )?;

        tx.commit()?;
        Ok(())
    }
}

pub(crate) fn list_team_members(conn: &Connection, team_id: TeamId) -> RepoResult<Vec<TeamMember>> {
    let mut stmt = conn.prepare(&format!(
        "{MEMBER_SELECT_SQL}
         WHERE team_id = ?1
         ORDER BY created_at ASC, rowid ASC;"
    ))?;
    let mut rows = stmt.query([team_id.to_string()])?;
    let mut members = Vec::new();
    while let Some(row) = rows.next()? {
        members.push(parse_member_row(row)?);
    }
    Ok(members)
}

pub(crate) fn list_project_tasks(conn: &Connection, project_id: ProjectId) -> RepoResult<Vec<Task>> {
    let mut stmt = conn.prepare(&format!(
        "{TASK_SELECT_SQL}
         WHERE project_id = ?1
         ORDER BY created_at ASC, rowid ASC;"
    ))?;
    let mut rows = stmt.query([project_id.to_string()])?;
    let mut tasks = Vec::new();
    while let Some(row) = rows.next()? {
        tasks.push(parse_task_row(row)?);
    }
    Ok(tasks)
}

#[allow(clippy::too_many_arguments)]
pub(crate) fn insert_activity(
    conn: &Connection,
    task_id: TaskId,
    actor_id: UserId,
    kind: ActivityKind,
    from_member_id: Option<MemberId>,
    to_member_id: Option<MemberId>,
    from_value: Option<String>,
    to_value: Option<String>,
) -> RepoResult<()> {
    conn.execute(
        "INSERT INTO activities (
            id,
            task_id,
            actor_id,
            kind,
            from_member_id,
            to_member_id,
            from_value,
            to_value
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8);",
        params![
            Uuid::new_v4().to_string(),
            task_id.to_string(),
            actor_id.to_string(),
            activity_kind_to_db(kind),
            from_member_id.map(|id| id.to_string()),
            to_member_id.map(|id| id.to_string()),
            from_value,
            to_value,
        ],
    )?;
    Ok(())
}

fn ensure_exists(
    conn: &Connection,
    table: &'static str,
    entity: &'static str,
    id: Uuid,
) -> RepoResult<()> {
    let exists: i64 = conn.query_row(
        &format!("SELECT EXISTS(SELECT 1 FROM {table} WHERE id = ?1);"),
        [id.to_string()],
        |row| row.get(0),
    )?;
    if exists == 1 {
        Ok(())
    } else {
        Err(RepoError::NotFound { entity, id })
    }
}

/// The assignee must belong to the team staffing the project.
fn ensure_project_staff(
    conn: &Connection,
    project_id: ProjectId,
    member_id: MemberId,
) -> RepoResult<()> {
    let on_team: i64 = conn.query_row(
        "SELECT EXISTS(
            SELECT 1
            FROM team_members m
            INNER JOIN projects p ON p.team_id = m.team_id
            WHERE p.id = ?1 AND m.id = ?2
        );",
        params![project_id.to_string(), member_id.to_string()],
        |row| row.get(0),
    )?;
    if on_team == 1 {
        Ok(())
    } else {
        Err(RepoError::NotFound {
            entity: "team member",
            id: member_id,
        })
    }
}

pub(crate) fn parse_task_row(row: &Row<'_>) -> RepoResult<Task> {
    let id: String = row.get("id")?;
    let project_id: String = row.get("project_id")?;
    let priority: String = row.get("priority")?;
    let status: String = row.get("status")?;

    Ok(Task {
        id: parse_uuid(&id, "tasks.id")?,
        project_id: parse_uuid(&project_id, "tasks.project_id")?,
        name: row.get("name")?,
        priority: parse_priority(&priority)?,
        status: parse_status(&status)?,
        assignee_id: parse_optional_uuid(row.get("assignee_id")?, "tasks.assignee_id")?,
    })
}

pub(crate) fn parse_member_row(row: &Row<'_>) -> RepoResult<TeamMember> {
    let id: String = row.get("id")?;
    let team_id: String = row.get("team_id")?;

    Ok(TeamMember {
        id: parse_uuid(&id, "team_members.id")?,
        team_id: parse_uuid(&team_id, "team_members.team_id")?,
        name: row.get("name")?,
        role: row.get("role")?,
        capacity: parse_capacity(row.get("capacity")?)?,
        is_active: parse_flag(row.get("is_active")?, "team_members.is_active")?,
    })
}
