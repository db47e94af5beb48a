//! Greedy allocator.
//!
//! # Responsibility
//! - Hand each selected task to the available member with the most free
//!   capacity, one task at a time.
//!
//! # Invariants
//! - A member never receives more tasks than its free capacity.
//! - Ties on free capacity keep the current list order: members start in
//!   snapshot order, and a member that just received a task stays ahead of
//!   every other member left with the same free capacity.
//! - Once no member has free capacity, allocation stops for the whole pass.

use super::classify::{AvailableMember, OverloadedMember};
use super::select::select_for_migration;
use crate::model::workload::Reassignment;
use crate::model::{MemberId, ProjectId};
use std::cmp::Ordering;
use std::collections::BinaryHeap;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct PoolEntry {
    free_capacity: u32,
    /// Tie-break rank; lower goes first among equal free capacity.
    sequence: i64,
    member_id: MemberId,
}

impl PartialOrd for PoolEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for PoolEntry {
    // Max-heap: more free capacity wins, then the lower sequence.
    fn cmp(&self, other: &Self) -> Ordering {
        self.free_capacity
            .cmp(&other.free_capacity)
            .then_with(|| other.sequence.cmp(&self.sequence))
    }
}

/// Members with spare capacity, keyed by free capacity.
///
/// Behaves like a list kept sorted by free capacity with a stable re-sort
/// after every claim.
#[derive(Debug, Clone)]
pub struct AvailablePool {
    heap: BinaryHeap<PoolEntry>,
    /// Next front-of-ties sequence; always below every live entry.
    next_front: i64,
}

impl AvailablePool {
    pub fn new(available: &[AvailableMember]) -> Self {
        let heap = available
            .iter()
            .filter(|member| member.free_capacity > 0)
            .map(|member| PoolEntry {
                free_capacity: member.free_capacity,
                sequence: i64::try_from(member.position).unwrap_or(i64::MAX),
                member_id: member.member_id,
            })
            .collect();
        Self {
            heap,
            next_front: -1,
        }
    }

    pub fn is_exhausted(&self) -> bool {
        self.heap.is_empty()
    }

    /// Claims one slot from the member with the most free capacity.
    fn claim(&mut self) -> Option<MemberId> {
        let mut head = self.heap.pop()?;
        head.free_capacity -= 1;
        let member_id = head.member_id;
        if head.free_capacity > 0 {
            // A stable re-sort leaves the head in front of its new tie group.
            head.sequence = self.next_front;
            self.next_front -= 1;
            self.heap.push(head);
        }
        Some(member_id)
    }
}

/// Plans moves for every overloaded member, in classifier order.
pub fn allocate(
    project_id: ProjectId,
    overloaded: &[OverloadedMember],
    pool: &mut AvailablePool,
) -> Vec<Reassignment> {
    let mut moves = Vec::new();

    'members: for member in overloaded {
        for task in select_for_migration(member) {
            let Some(to_member_id) = pool.claim() else {
                break 'members;
            };
            moves.push(Reassignment {
                task_id: task.id,
                task_name: task.name.clone(),
                priority: task.priority,
                project_id,
                from_member_id: member.member_id,
                to_member_id,
            });
        }
    }

    moves
}

#[cfg(test)]
mod tests {
    use super::{allocate, AvailablePool};
    use crate::model::task::{Task, TaskPriority};
    use crate::rebalance::classify::{AvailableMember, OverloadedMember};
    use uuid::Uuid;

    fn available(position: usize, free_capacity: u32) -> AvailableMember {
        AvailableMember {
            member_id: Uuid::new_v4(),
            capacity: free_capacity,
            current_tasks: 0,
            free_capacity,
            position,
        }
    }

    fn overloaded(low_tasks: usize, excess_tasks: u32) -> OverloadedMember {
        let member_id = Uuid::new_v4();
        OverloadedMember {
            member_id,
            capacity: 0,
            current_tasks: excess_tasks,
            excess_tasks,
            tasks: (0..low_tasks)
                .map(|index| {
                    Task::new(Uuid::nil(), format!("task-{index}"), TaskPriority::Low)
                        .assigned_to(member_id)
                })
                .collect(),
        }
    }

    #[test]
    fn claimed_member_keeps_its_place_among_equal_free_capacity() {
        let a = available(0, 2);
        let b = available(1, 3);
        let mut pool = AvailablePool::new(&[b, a]);
        let source = overloaded(5, 5);

        let targets: Vec<_> = allocate(Uuid::nil(), &[source], &mut pool)
            .into_iter()
            .map(|change| change.to_member_id)
            .collect();

        // b drops to 2 and stays ahead of a; a then leads at 2/1 and 1/1.
        assert_eq!(
            targets,
            vec![
                b.member_id,
                b.member_id,
                a.member_id,
                a.member_id,
                b.member_id
            ]
        );
        assert!(pool.is_exhausted());
    }

    #[test]
    fn equal_free_capacity_starts_in_snapshot_order() {
        let first = available(0, 1);
        let second = available(1, 1);
        let mut pool = AvailablePool::new(&[first, second]);
        let source = overloaded(2, 2);

        let targets: Vec<_> = allocate(Uuid::nil(), &[source], &mut pool)
            .into_iter()
            .map(|change| change.to_member_id)
            .collect();
        assert_eq!(targets, vec![first.member_id, second.member_id]);
    }

    #[test]
    fn stops_everything_when_capacity_runs_out() {
        let only = available(0, 1);
        let mut pool = AvailablePool::new(&[only]);
        let first = overloaded(2, 2);
        let second = overloaded(2, 2);

        let moves = allocate(Uuid::nil(), &[first.clone(), second], &mut pool);
        assert_eq!(moves.len(), 1);
        assert_eq!(moves[0].from_member_id, first.member_id);
        assert_eq!(moves[0].to_member_id, only.member_id);
        assert!(pool.is_exhausted());
    }

    #[test]
    fn never_exceeds_free_capacity() {
        let a = available(0, 1);
        let b = available(1, 2);
        let mut pool = AvailablePool::new(&[b, a]);
        let source = overloaded(10, 10);

        let moves = allocate(Uuid::nil(), &[source], &mut pool);
        assert_eq!(moves.len(), 3);
        let to_a = moves.iter().filter(|m| m.to_member_id == a.member_id).count();
        let to_b = moves.iter().filter(|m| m.to_member_id == b.member_id).count();
        assert_eq!((to_a, to_b), (1, 2));
    }
}
