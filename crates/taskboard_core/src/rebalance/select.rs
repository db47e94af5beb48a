//! Migration candidate selection for one overloaded member.
//!
//! # Invariants
//! - HIGH priority tasks are never candidates.
//! - LOW tasks come before MEDIUM; within a tier the input order is kept.
//! - At most `excess_tasks` candidates are returned.

use super::classify::OverloadedMember;
use crate::model::task::Task;

/// Returns every movable task of `tasks`, least critical first.
pub fn movable_candidates(tasks: &[Task]) -> Vec<&Task> {
    let mut candidates: Vec<&Task> = tasks.iter().filter(|task| task.is_movable()).collect();
    candidates.sort_by_key(|task| task.priority.migration_rank());
    candidates
}

/// Returns the tasks this member should shed in one pass.
///
/// When fewer movable tasks exist than the excess, the member simply stays
/// over capacity.
pub fn select_for_migration(member: &OverloadedMember) -> Vec<&Task> {
    let mut candidates = movable_candidates(&member.tasks);
    let quota = usize::try_from(member.excess_tasks).unwrap_or(usize::MAX);
    candidates.truncate(quota);
    candidates
}
