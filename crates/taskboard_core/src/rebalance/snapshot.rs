//! Workload snapshot builder.
//!
//! # Responsibility
//! - Combine a project scope, its movable tasks and authoritative member load
//!   into one in-memory model for a single rebalancing pass.
//!
//! # Invariants
//! - Member load is cross-project: it comes from `LoadLedger`, never from the
//!   project's own task list.
//! - Member and task order follow the repository's creation order.

use crate::model::task::Task;
use crate::model::workload::Reassignment;
use crate::model::{MemberId, ProjectId};
use crate::repo::workload_repo::{ProjectScope, WorkloadRepository};
use crate::repo::RepoResult;
use std::collections::HashMap;

/// Per-member load count shared across every project of one run.
///
/// Seeded from storage once per run, then moved forward in memory as moves
/// are planned so later projects see earlier projects' decisions.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoadLedger {
    loads: HashMap<MemberId, u32>,
}

impl LoadLedger {
    /// Reads fresh cross-project load for `member_ids`.
    pub fn fetch<R: WorkloadRepository + ?Sized>(
        repo: &R,
        member_ids: &[MemberId],
    ) -> RepoResult<Self> {
        Ok(Self {
            loads: repo.count_active_load(member_ids)?,
        })
    }

    pub fn from_loads(loads: HashMap<MemberId, u32>) -> Self {
        Self { loads }
    }

    /// Current load; members never seen count as idle.
    pub fn load(&self, member_id: MemberId) -> u32 {
        self.loads.get(&member_id).copied().unwrap_or(0)
    }

    /// Moves one unit of load for every planned reassignment.
    pub fn record(&mut self, moves: &[Reassignment]) {
        for change in moves {
            let from = self.loads.entry(change.from_member_id).or_insert(0);
            *from = from.saturating_sub(1);
            *self.loads.entry(change.to_member_id).or_insert(0) += 1;
        }
    }
}

/// Load view of one member inside a snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MemberLoad {
    pub member_id: MemberId,
    pub capacity: u32,
    pub current_tasks: u32,
    /// Inactive members may shed work but never receive it.
    pub is_active: bool,
}

/// Everything the classifier and allocator need for one project.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkloadSnapshot {
    pub project_id: ProjectId,
    pub members: Vec<MemberLoad>,
    /// Non-done, assigned tasks of the project, HIGH priority included.
    pub tasks: Vec<Task>,
}

/// Builds the snapshot for one project scope.
pub fn build_snapshot<R: WorkloadRepository + ?Sized>(
    repo: &R,
    scope: &ProjectScope,
    ledger: &LoadLedger,
) -> RepoResult<WorkloadSnapshot> {
    let tasks = repo.list_movable_tasks(scope.project.id)?;
    let members = scope
        .members
        .iter()
        .map(|member| MemberLoad {
            member_id: member.id,
            capacity: member.capacity,
            current_tasks: ledger.load(member.id),
            is_active: member.is_active,
        })
        .collect();

    Ok(WorkloadSnapshot {
        project_id: scope.project.id,
        members,
        tasks,
    })
}

#[cfg(test)]
mod tests {
    use super::LoadLedger;
    use crate::model::task::TaskPriority;
    use crate::model::workload::Reassignment;
    use std::collections::HashMap;
    use uuid::Uuid;

    #[test]
    fn ledger_moves_load_between_members() {
        let from = Uuid::new_v4();
        let to = Uuid::new_v4();
        let mut ledger = LoadLedger::from_loads(HashMap::from([(from, 3), (to, 1)]));

        ledger.record(&[Reassignment {
            task_id: Uuid::new_v4(),
            task_name: "write report".to_string(),
            priority: TaskPriority::Low,
            project_id: Uuid::new_v4(),
            from_member_id: from,
            to_member_id: to,
        }]);

        assert_eq!(ledger.load(from), 2);
        assert_eq!(ledger.load(to), 2);
        assert_eq!(ledger.load(Uuid::new_v4()), 0);
    }
}
