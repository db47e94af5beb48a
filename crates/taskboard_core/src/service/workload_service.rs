//! Read-only workload views for dashboards.
//!
//! # Invariants
//! - Load shown here uses the same cross-project count as rebalancing.

use crate::model::{MemberId, ProjectId, UserId};
use crate::repo::workload_repo::WorkloadRepository;
use crate::repo::RepoResult;
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MemberWorkload {
    pub member_id: MemberId,
    pub name: String,
    pub role: Option<String>,
    pub capacity: u32,
    pub current_tasks: u32,
    pub is_active: bool,
}

impl MemberWorkload {
    pub fn is_overloaded(&self) -> bool {
        self.current_tasks > self.capacity
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProjectWorkload {
    pub project_id: ProjectId,
    pub name: String,
    pub members: Vec<MemberWorkload>,
}

pub struct WorkloadService<R: WorkloadRepository> {
    repo: R,
}

impl<R: WorkloadRepository> WorkloadService<R> {
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    /// Lists every active project with its members' capacity and load.
    pub fn workload_overview(&self, owner_id: UserId) -> RepoResult<Vec<ProjectWorkload>> {
        let scopes = self.repo.list_owner_projects(owner_id)?;
        let member_ids: Vec<MemberId> = scopes
            .iter()
            .flat_map(|scope| scope.members.iter().map(|member| member.id))
            .collect();
        let loads = self.repo.count_active_load(&member_ids)?;

        Ok(scopes
            .into_iter()
            .map(|scope| ProjectWorkload {
                project_id: scope.project.id,
                name: scope.project.name,
                members: scope
                    .members
                    .into_iter()
                    .map(|member| MemberWorkload {
                        current_tasks: loads.get(&member.id).copied().unwrap_or(0),
                        member_id: member.id,
                        name: member.name,
                        role: member.role,
                        capacity: member.capacity,
                        is_active: member.is_active,
                    })
                    .collect(),
            })
            .collect())
    }

    /// Counts the owner's members whose load exceeds capacity.
    pub fn overloaded_member_count(&self, owner_id: UserId) -> RepoResult<usize> {
        let members = self.repo.list_owner_members(owner_id)?;
        let member_ids: Vec<MemberId> = members.iter().map(|member| member.id).collect();
        let loads = self.repo.count_active_load(&member_ids)?;
        Ok(members
            .iter()
            .filter(|member| loads.get(&member.id).copied().unwrap_or(0) > member.capacity)
            .count())
    }
}
