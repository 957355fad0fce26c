// src/dag/graph.rs

use std::collections::{HashMap, HashSet};

use tracing::debug;

use crate::dag::registry::TaskRegistry;
use crate::dag::task_info::{AdmittedTask, Dispatch, TaskId};

/// A task held back until its dependencies finish.
struct BlockedTask {
    task: AdmittedTask,
    dispatch: Dispatch,
    /// Dependencies that have not reached a terminal state yet.
    unmet: HashSet<TaskId>,
}

/// Dependency graph over the tasks currently waiting on others.
///
/// Only gated tasks appear here. Edges are stored in both directions:
/// `blocked` maps a waiting task to the set it still waits on, `waiters`
/// maps a dependency to the tasks waiting on it.
#[derive(Default)]
pub(crate) struct DependencyGraph {
    blocked: HashMap<TaskId, BlockedTask>,
    waiters: HashMap<TaskId, Vec<TaskId>>,
}

impl DependencyGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Dependencies from `deps` that still have to be waited for, as of now.
    ///
    /// Repeated identities count once.
    pub fn unmet_dependencies(registry: &TaskRegistry, deps: &[TaskId]) -> HashSet<TaskId> {
        deps.iter()
            .copied()
            .filter(|dep| registry.is_unmet(*dep))
            .collect()
    }

    /// Park `task` until every identity in `unmet` has finished.
    pub fn block(&mut self, task: AdmittedTask, dispatch: Dispatch, unmet: HashSet<TaskId>) {
        debug_assert!(!unmet.is_empty(), "blocked task must have unmet dependencies");

        for dep in &unmet {
            self.waiters.entry(*dep).or_default().push(task.id);
        }

        debug!(
            task = %task.id,
            label = task.display_label(),
            waiting_on = unmet.len(),
            ?dispatch,
            "task blocked on dependencies"
        );

        self.blocked.insert(
            task.id,
            BlockedTask {
                task,
                dispatch,
                unmet,
            },
        );
    }

    /// Record that `finished` reached a terminal state and return every task
    /// that has no unmet dependency left.
    pub fn on_task_finished(&mut self, finished: TaskId) -> Vec<(AdmittedTask, Dispatch)> {
        let Some(waiting) = self.waiters.remove(&finished) else {
            return Vec::new();
        };

        let mut released = Vec::new();

        for id in waiting {
            let now_free = match self.blocked.get_mut(&id) {
                Some(entry) => {
                    entry.unmet.remove(&finished);
                    entry.unmet.is_empty()
                }
                None => false,
            };

            if now_free {
                if let Some(entry) = self.blocked.remove(&id) {
                    debug!(
                        task = %id,
                        label = entry.task.display_label(),
                        after = %finished,
                        "dependencies finished; releasing task"
                    );
                    released.push((entry.task, entry.dispatch));
                }
            }
        }

        released
    }

    /// Number of tasks still waiting on dependencies.
    pub fn blocked_len(&self) -> usize {
        self.blocked.len()
    }

    /// Any-order identities that blocked tasks wait on but that were never
    /// submitted.
    pub fn missing_dependencies(&self, registry: &TaskRegistry) -> Vec<TaskId> {
        let mut missing: Vec<TaskId> = self
            .waiters
            .keys()
            .copied()
            .filter(|dep| registry.lookup(*dep).is_none())
            .collect();
        missing.sort();
        missing
    }
}
