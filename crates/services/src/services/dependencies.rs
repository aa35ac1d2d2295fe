//! Bookkeeping rules for links between chores.

use std::collections::{HashMap, HashSet};

use db::models::task::{Task, TaskStatus};
use uuid::Uuid;

/// Whether adding `task_id → depends_on_id` to `edges` closes a cycle.
///
/// Edges point from a task to its prerequisite; the new link is a cycle when
/// `task_id` is already reachable from `depends_on_id`.
pub fn would_create_cycle(edges: &[(Uuid, Uuid)], task_id: Uuid, depends_on_id: Uuid) -> bool {
    if task_id == depends_on_id {
        return true;
    }

    let mut adjacency: HashMap<Uuid, Vec<Uuid>> = HashMap::new();
    for (from, to) in edges {
        adjacency.entry(*from).or_default().push(*to);
    }

    let mut stack = vec![depends_on_id];
    let mut seen = HashSet::new();
    while let Some(node) = stack.pop() {
        if node == task_id {
            return true;
        }
        if !seen.insert(node) {
            continue;
        }
        if let Some(next) = adjacency.get(&node) {
            stack.extend(next.iter().copied());
        }
    }
    false
}

/// A prerequisite is met once it is done, or, for a recurring chore, once it
/// has been completed at least once (recurring chores never stay done).
pub fn is_satisfied(prerequisite: &Task) -> bool {
    prerequisite.status == TaskStatus::Done
        || (prerequisite.is_recurring() && prerequisite.last_completed_at.is_some())
}

pub fn unsatisfied(prerequisites: &[Task]) -> Vec<&Task> {
    prerequisites.iter().filter(|t| !is_satisfied(t)).collect()
}
