//! Read access to the activity (audit) trail.
//!
//! # Invariants
//! - Listings are newest first: `created_at DESC, rowid DESC`.
//! - The rebalancer never reads activities to make decisions.

use super::codec::{parse_activity_kind, parse_optional_uuid, parse_uuid};
use super::{ensure_connection_ready, RepoResult};
use crate::model::activity::Activity;
use crate::model::{TaskId, UserId};
use rusqlite::{params, Connection, Row};

const ACTIVITY_DEFAULT_LIMIT: u32 = 10;
const ACTIVITY_LIMIT_MAX: u32 = 50;

const ACTIVITY_SELECT_SQL: &str = "SELECT
    id,
    task_id,
    actor_id,
    kind,
    from_member_id,
    to_member_id,
    from_value,
    to_value,
    created_at
FROM activities";

pub trait ActivityRepository {
    /// Newest reassignment activities triggered by `owner_id`.
    fn list_recent_reassignments(
        &self,
        owner_id: UserId,
        limit: Option<u32>,
    ) -> RepoResult<Vec<Activity>>;
    /// Full history of one task.
    fn list_task_activities(&self, task_id: TaskId) -> RepoResult<Vec<Activity>>;
}

pub struct SqliteActivityRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteActivityRepository<'conn> {
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_connection_ready(conn)?;
        Ok(Self { conn })
    }
}

impl ActivityRepository for SqliteActivityRepository<'_> {
    fn list_recent_reassignments(
        &self,
        owner_id: UserId,
        limit: Option<u32>,
    ) -> RepoResult<Vec<Activity>> {
        let mut stmt = self.conn.prepare(&format!(
            "{ACTIVITY_SELECT_SQL}
             WHERE actor_id = ?1
               AND kind = 'task_reassigned'
             ORDER BY created_at DESC, rowid DESC
             LIMIT ?2;"
        ))?;
        let mut rows = stmt.query(params![
            owner_id.to_string(),
            i64::from(normalize_activity_limit(limit))
        ])?;
        let mut activities = Vec::new();
        while let Some(row) = rows.next()? {
            activities.push(parse_activity_row(row)?);
        }
        Ok(activities)
    }

    fn list_task_activities(&self, task_id: TaskId) -> RepoResult<Vec<Activity>> {
        let mut stmt = self.conn.prepare(&format!(
            "{ACTIVITY_SELECT_SQL}
             WHERE task_id = ?1
             ORDER BY created_at DESC, rowid DESC;"
        ))?;
        let mut rows = stmt.query([task_id.to_string()])?;
        let mut activities = Vec::new();
        while let Some(row) = rows.next()? {
            activities.push(parse_activity_row(row)?);
        }
        Ok(activities)
    }
}

/// Normalizes list limit: `None`/`0` fall back to 10, values clamp to 50.
pub fn normalize_activity_limit(limit: Option<u32>) -> u32 {
    match limit {
        Some(0) | None => ACTIVITY_DEFAULT_LIMIT,
        Some(value) => value.min(ACTIVITY_LIMIT_MAX),
    }
}

fn parse_activity_row(row: &Row<'_>) -> RepoResult<Activity> {
    let id: String = row.get("id")?;
    let task_id: String = row.get("task_id")?;
    let actor_id: String = row.get("actor_id")?;
    let kind: String = row.get("kind")?;

    Ok(Activity {
        id: parse_uuid(&id, "activities.id")?,
        task_id: parse_uuid(&task_id, "activities.task_id")?,
        actor_id: parse_uuid(&actor_id, "activities.actor_id")?,
        kind: parse_activity_kind(&kind)?,
        from_member_id: parse_optional_uuid(
            row.get("from_member_id")?,
            "activities.from_member_id",
        )?,
        to_member_id: parse_optional_uuid(row.get("to_member_id")?, "activities.to_member_id")?,
        from_value: row.get("from_value")?,
        to_value: row.get("to_value")?,
        created_at: row.get("created_at")?,
    })
}

#[cfg(test)]
mod tests {
    use super::normalize_activity_limit;

    #[test]
    fn activity_limit_defaults_and_clamps() {
        assert_eq!(normalize_activity_limit(None), 10);
        assert_eq!(normalize_activity_limit(Some(0)), 10);
        assert_eq!(normalize_activity_limit(Some(3)), 3);
        assert_eq!(normalize_activity_limit(Some(500)), 50);
    }
}
