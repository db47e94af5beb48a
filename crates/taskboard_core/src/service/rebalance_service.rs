//! Workload rebalancing use-case service.
//!
//! # Responsibility
//! - Resolve the owner's scope, run the rebalancing pipeline per project and
//!   commit every planned move with its audit row in one atomic unit.
//!
//! # Invariants
//! - Scope resolution failures abort before any computation or write.
//! - No overload means zero writes.
//! - The committed move set is exactly the planned move set, or nothing.
//! - Member load is read fresh per run and carried across projects of the
//!   same run in memory only.

use crate::model::workload::Reassignment;
use crate::model::{MemberId, ProjectId, UserId};
use crate::rebalance::snapshot::{build_snapshot, LoadLedger};
use crate::rebalance::{plan_project, RebalanceScope};
use crate::repo::workload_repo::{ProjectScope, WorkloadRepository};
use crate::repo::RepoError;
use log::{error, info, warn};
use serde::Serialize;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::time::Instant;

/// Errors from rebalancing runs.
#[derive(Debug)]
pub enum RebalanceError {
    /// Project is missing, inactive, or owned by someone else.
    ScopeNotFound {
        owner_id: UserId,
        project_id: ProjectId,
    },
    /// Reading the snapshot failed.
    Repo(RepoError),
    /// The atomic apply step failed; nothing was written.
    Commit(RepoError),
}

impl Display for RebalanceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ScopeNotFound {
                owner_id,
                project_id,
            } => write!(f, "project {project_id} not found for owner {owner_id}"),
            Self::Repo(err) => write!(f, "{err}"),
            Self::Commit(err) => write!(f, "rebalance commit failed: {err}"),
        }
    }
}

impl Error for RebalanceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::ScopeNotFound { .. } => None,
            Self::Repo(err) | Self::Commit(err) => Some(err),
        }
    }
}

impl From<RepoError> for RebalanceError {
    fn from(value: RepoError) -> Self {
        Self::Repo(value)
    }
}

/// A member still over capacity after the run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResidualOverload {
    pub member_id: MemberId,
    pub capacity: u32,
    pub current_tasks: u32,
    pub excess_tasks: u32,
}

/// Summary of a run that found at least one overloaded member.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RebalanceReport {
    pub projects_processed: usize,
    /// Distinct members found over capacity during the run.
    pub overloaded_member_count: usize,
    /// Committed moves, in planning order.
    pub moves: Vec<Reassignment>,
    /// Members left over capacity because free capacity or movable tasks ran
    /// out. Not an error.
    pub residual_overload: Vec<ResidualOverload>,
}

impl RebalanceReport {
    pub fn moved_count(&self) -> usize {
        self.moves.len()
    }

    pub fn is_fully_resolved(&self) -> bool {
        self.residual_overload.is_empty()
    }
}

/// Terminal outcome of a successful run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum RebalanceOutcome {
    /// Nothing over capacity; nothing written.
    NoOverload { projects_processed: usize },
    /// Overload found; zero or more moves committed.
    Rebalanced(RebalanceReport),
}

impl RebalanceOutcome {
    pub fn moves(&self) -> &[Reassignment] {
        match self {
            Self::NoOverload { .. } => &[],
            Self::Rebalanced(report) => &report.moves,
        }
    }

    pub fn moved_count(&self) -> usize {
        self.moves().len()
    }

    pub fn overloaded_member_count(&self) -> usize {
        match self {
            Self::NoOverload { .. } => 0,
            Self::Rebalanced(report) => report.overloaded_member_count,
        }
    }
}

/// Use-case service wrapping the rebalancing pipeline.
pub struct RebalanceService<R: WorkloadRepository> {
    repo: R,
}

impl<R: WorkloadRepository> RebalanceService<R> {
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    /// Rebalances one project of `owner_id`.
    ///
    /// Load is still counted across all projects, so a member saturated
    /// elsewhere is neither handed work nor ignored when over capacity.
    pub fn rebalance_project(
        &self,
        owner_id: UserId,
        project_id: ProjectId,
    ) -> Result<RebalanceOutcome, RebalanceError> {
        self.rebalance(owner_id, RebalanceScope::Project(project_id))
    }

    /// Rebalances every active project of `owner_id` and commits all moves
    /// in one transaction.
    pub fn rebalance_all_projects(
        &self,
        owner_id: UserId,
    ) -> Result<RebalanceOutcome, RebalanceError> {
        self.rebalance(owner_id, RebalanceScope::AllProjects)
    }

    /// Runs the pipeline for `scope`.
    ///
    /// # Side effects
    /// - On success with moves: task assignee updates plus one
    ///   `task_reassigned` activity per move, committed atomically.
    /// - Emits `rebalance` logging events with counts and duration.
    pub fn rebalance(
        &self,
        owner_id: UserId,
        scope: RebalanceScope,
    ) -> Result<RebalanceOutcome, RebalanceError> {
        let started_at = Instant::now();
        let label = scope_label(scope);
        info!("event=rebalance module=service status=start scope={label} owner_id={owner_id}");

        let result = self.run(owner_id, scope);
        let duration_ms = started_at.elapsed().as_millis();
        match &result {
            Ok(RebalanceOutcome::NoOverload { projects_processed }) => info!(
                "event=rebalance module=service status=ok scope={label} owner_id={owner_id} projects={projects_processed} overloaded=0 moved=0 duration_ms={duration_ms}"
            ),
            Ok(RebalanceOutcome::Rebalanced(report)) => {
                info!(
                    "event=rebalance module=service status=ok scope={label} owner_id={owner_id} projects={} overloaded={} moved={} residual={} duration_ms={duration_ms}",
                    report.projects_processed,
                    report.overloaded_member_count,
                    report.moved_count(),
                    report.residual_overload.len()
                );
                if !report.is_fully_resolved() {
                    warn!(
                        "event=rebalance module=service status=partial scope={label} owner_id={owner_id} residual={}",
                        report.residual_overload.len()
                    );
                }
            }
            Err(err) => error!(
                "event=rebalance module=service status=error scope={label} owner_id={owner_id} error_code={} duration_ms={duration_ms} error={err}",
                error_code(err)
            ),
        }
        result
    }

    fn run(
        &self,
        owner_id: UserId,
        scope: RebalanceScope,
    ) -> Result<RebalanceOutcome, RebalanceError> {
        let scopes = self.resolve_scopes(owner_id, scope)?;
        let mut ledger = LoadLedger::fetch(&self.repo, &distinct_member_ids(&scopes))?;

        // (member, capacity) in first-seen order, each member once.
        let mut overloaded: Vec<(MemberId, u32)> = Vec::new();
        let mut moves = Vec::new();
        for project_scope in &scopes {
            let snapshot = build_snapshot(&self.repo, project_scope, &ledger)?;
            let plan = plan_project(&snapshot);
            for member in &plan.overloaded {
                if !overloaded.iter().any(|(id, _)| *id == member.member_id) {
                    overloaded.push((member.member_id, member.capacity));
                }
            }
            ledger.record(&plan.moves);
            moves.extend(plan.moves);
        }

        if overloaded.is_empty() {
            return Ok(RebalanceOutcome::NoOverload {
                projects_processed: scopes.len(),
            });
        }

        let residual_overload = overloaded
            .iter()
            .filter_map(|&(member_id, capacity)| {
                let current_tasks = ledger.load(member_id);
                (current_tasks > capacity).then(|| ResidualOverload {
                    member_id,
                    capacity,
                    current_tasks,
                    excess_tasks: current_tasks - capacity,
                })
            })
            .collect();

        self.repo
            .apply_reassignments(owner_id, &moves)
            .map_err(RebalanceError::Commit)?;

        Ok(RebalanceOutcome::Rebalanced(RebalanceReport {
            projects_processed: scopes.len(),
            overloaded_member_count: overloaded.len(),
            moves,
            residual_overload,
        }))
    }

    fn resolve_scopes(
        &self,
        owner_id: UserId,
        scope: RebalanceScope,
    ) -> Result<Vec<ProjectScope>, RebalanceError> {
        match scope {
            RebalanceScope::Project(project_id) => {
                let resolved = self
                    .repo
                    .resolve_project_scope(owner_id, project_id)?
                    .ok_or(RebalanceError::ScopeNotFound {
                        owner_id,
                        project_id,
                    })?;
                Ok(vec![resolved])
            }
            RebalanceScope::AllProjects => Ok(self.repo.list_owner_projects(owner_id)?),
        }
    }
}

fn distinct_member_ids(scopes: &[ProjectScope]) -> Vec<MemberId> {
    let mut ids: Vec<MemberId> = Vec::new();
    for member in scopes.iter().flat_map(|scope| scope.members.iter()) {
        if !ids.contains(&member.id) {
            ids.push(member.id);
        }
    }
    ids
}

fn scope_label(scope: RebalanceScope) -> String {
    match scope {
        RebalanceScope::Project(project_id) => format!("project:{project_id}"),
        RebalanceScope::AllProjects => "all_projects".to_string(),
    }
}

fn error_code(err: &RebalanceError) -> &'static str {
    match err {
        RebalanceError::ScopeNotFound { .. } => "scope_not_found",
        RebalanceError::Repo(_) => "snapshot_failed",
        RebalanceError::Commit(_) => "commit_failed",
    }
}
