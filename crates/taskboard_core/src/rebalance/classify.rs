//! Overloaded/available classification.
//!
//! # Invariants
//! - A member is overloaded iff `current_tasks > capacity`, available iff
//!   `current_tasks < capacity` and active; a member at capacity is neither.
//! - `available` is sorted by `free_capacity` descending; equal values keep
//!   snapshot order.

use super::snapshot::WorkloadSnapshot;
use crate::model::task::Task;
use crate::model::MemberId;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OverloadedMember {
    pub member_id: MemberId,
    pub capacity: u32,
    pub current_tasks: u32,
    pub excess_tasks: u32,
    /// In-scope tasks currently assigned to this member, snapshot order.
    pub tasks: Vec<Task>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AvailableMember {
    pub member_id: MemberId,
    pub capacity: u32,
    pub current_tasks: u32,
    pub free_capacity: u32,
    /// Index in the snapshot member list; seeds the allocator's tie-break.
    pub position: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Classification {
    pub overloaded: Vec<OverloadedMember>,
    pub available: Vec<AvailableMember>,
}

impl Classification {
    pub fn needs_rebalancing(&self) -> bool {
        !self.overloaded.is_empty()
    }
}

/// Partitions snapshot members into overloaded and available sets.
pub fn classify(snapshot: &WorkloadSnapshot) -> Classification {
    let mut classification = Classification::default();

    for (position, member) in snapshot.members.iter().enumerate() {
        if member.current_tasks > member.capacity {
            let tasks = snapshot
                .tasks
                .iter()
                .filter(|task| task.assignee_id == Some(member.member_id))
                .cloned()
                .collect();
            classification.overloaded.push(OverloadedMember {
                member_id: member.member_id,
                capacity: member.capacity,
                current_tasks: member.current_tasks,
                excess_tasks: member.current_tasks - member.capacity,
                tasks,
            });
        } else if member.current_tasks < member.capacity && member.is_active {
            classification.available.push(AvailableMember {
                member_id: member.member_id,
                capacity: member.capacity,
                current_tasks: member.current_tasks,
                free_capacity: member.capacity - member.current_tasks,
                position,
            });
        }
    }

    // `sort_by` is stable, so equal free capacity keeps snapshot order.
    classification
        .available
        .sort_by(|a, b| b.free_capacity.cmp(&a.free_capacity));
    classification
}

#[cfg(test)]
mod tests {
    use super::classify;
    use crate::model::task::{Task, TaskPriority};
    use crate::rebalance::snapshot::{MemberLoad, WorkloadSnapshot};
    use uuid::Uuid;

    fn member(capacity: u32, current_tasks: u32) -> MemberLoad {
        MemberLoad {
            member_id: Uuid::new_v4(),
            capacity,
            current_tasks,
            is_active: true,
        }
    }

    #[test]
    fn members_at_capacity_are_neither_overloaded_nor_available() {
        let snapshot = WorkloadSnapshot {
            project_id: Uuid::new_v4(),
            members: vec![member(2, 2), member(0, 0)],
            tasks: Vec::new(),
        };

        let classification = classify(&snapshot);
        assert!(classification.overloaded.is_empty());
        assert!(classification.available.is_empty());
        assert!(!classification.needs_rebalancing());
    }

    #[test]
    fn available_sorted_by_free_capacity_with_stable_ties() {
        let first = member(3, 1);
        let second = member(5, 1);
        let third = member(4, 2);
        let snapshot = WorkloadSnapshot {
            project_id: Uuid::new_v4(),
            members: vec![first, second, third],
            tasks: Vec::new(),
        };

        let order: Vec<_> = classify(&snapshot)
            .available
            .iter()
            .map(|available| (available.member_id, available.free_capacity))
            .collect();
        assert_eq!(
            order,
            vec![
                (second.member_id, 4),
                (first.member_id, 2),
                (third.member_id, 2)
            ]
        );
    }

    #[test]
    fn overloaded_member_carries_excess_and_only_own_scope_tasks() {
        let busy = member(1, 3);
        let idle = member(2, 0);
        let project_id = Uuid::new_v4();
        let own = Task::new(project_id, "own", TaskPriority::Low).assigned_to(busy.member_id);
        let other = Task::new(project_id, "other", TaskPriority::Low).assigned_to(idle.member_id);
        let snapshot = WorkloadSnapshot {
            project_id,
            members: vec![busy, idle],
            tasks: vec![own.clone(), other],
        };

        let classification = classify(&snapshot);
        assert_eq!(classification.overloaded.len(), 1);
        let overloaded = &classification.overloaded[0];
        assert_eq!(overloaded.excess_tasks, 2);
        assert_eq!(overloaded.tasks, vec![own]);
        assert_eq!(classification.available[0].member_id, idle.member_id);
    }

    #[test]
    fn inactive_members_are_never_available() {
        let mut inactive = member(5, 0);
        inactive.is_active = false;
        let snapshot = WorkloadSnapshot {
            project_id: Uuid::new_v4(),
            members: vec![inactive],
            tasks: Vec::new(),
        };

        assert!(classify(&snapshot).available.is_empty());
    }
}
