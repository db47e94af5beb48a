//! Workload rebalancing engine.
//!
//! # Responsibility
//! - Detect members over capacity and plan moves of their lower-priority
//!   tasks to members with spare capacity.
//!
//! # Invariants
//! - Everything in this module is pure computation over a snapshot; the only
//!   storage access is reading the snapshot itself.
//! - One pipeline serves both the single-project and all-projects variants;
//!   they differ only in `RebalanceScope`.
//!
//! Flow: `snapshot` -> `classify` -> `select` (per overloaded member) ->
//! `allocate`. Applying the plan is the service's job.

pub mod allocate;
pub mod classify;
pub mod select;
pub mod snapshot;

use crate::model::workload::Reassignment;
use crate::model::ProjectId;
use allocate::{allocate, AvailablePool};
use classify::{classify, OverloadedMember};
use snapshot::WorkloadSnapshot;

/// Which projects one rebalancing run covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RebalanceScope {
    /// One project of the owner.
    Project(ProjectId),
    /// Every active project of the owner, processed in creation order.
    AllProjects,
}

/// Planned outcome for one project.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProjectPlan {
    pub overloaded: Vec<OverloadedMember>,
    pub moves: Vec<Reassignment>,
}

/// Runs classification and allocation over one snapshot.
pub fn plan_project(snapshot: &WorkloadSnapshot) -> ProjectPlan {
    let classification = classify(snapshot);
    if !classification.needs_rebalancing() {
        return ProjectPlan::default();
    }

    let mut pool = AvailablePool::new(&classification.available);
    let moves = allocate(snapshot.project_id, &classification.overloaded, &mut pool);
    ProjectPlan {
        overloaded: classification.overloaded,
        moves,
    }
}
