// src/dag/registry.rs

//! Identity-keyed bookkeeping of every task a pool has seen.

use std::collections::HashMap;

use tracing::debug;

use crate::dag::task_info::{TaskId, TaskState};

/// Snapshot of how many tasks a pool has seen and where they ended up.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PoolStats {
    /// Tasks submitted so far.
    pub submitted: usize,
    /// Tasks submitted but not yet completed or failed.
    pub outstanding: usize,
    pub completed: usize,
    pub failed: usize,
}

/// Task registry plus the outstanding-task counter.
///
/// Only the lifecycle state is kept per identity; task bodies live in the
/// ready queue or the dependency graph until they run, and are dropped after.
/// The registry is plain data: callers serialise access through the pool's
/// coordinating lock.
#[derive(Debug, Default)]
pub struct TaskRegistry {
    states: HashMap<TaskId, TaskState>,
    stats: PoolStats,
}

impl TaskRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a newly submitted task and count it as outstanding.
    ///
    /// # Panics
    ///
    /// If `id` was already registered with this pool. Identities are
    /// allocated uniquely, so this only happens when the same [`SyncPoint`]
    /// is added twice.
    ///
    /// [`SyncPoint`]: crate::dag::SyncPoint
    pub fn register(&mut self, id: TaskId, state: TaskState) {
        assert!(
            !self.states.contains_key(&id),
            "task {id:?} was submitted to this pool twice"
        );
        self.states.insert(id, state);
        self.stats.submitted += 1;
        self.stats.outstanding += 1;
        debug!(task = %id, ?state, outstanding = self.stats.outstanding, "registered task");
    }

    pub fn lookup(&self, id: TaskId) -> Option<TaskState> {
        self.states.get(&id).copied()
    }

    /// Move a registered, non-terminal task between `Pending`, `Ready` and
    /// `Running`.
    pub fn transition(&mut self, id: TaskId, state: TaskState) {
        debug_assert!(!state.is_terminal(), "use TaskRegistry::finish for terminal states");
        if let Some(current) = self.states.get_mut(&id) {
            *current = state;
        }
    }

    /// Mark a task terminal and take it off the outstanding count.
    pub fn finish(&mut self, id: TaskId, succeeded: bool) {
        let terminal = if succeeded {
            TaskState::Completed
        } else {
            TaskState::Failed
        };

        match self.states.insert(id, terminal) {
            Some(previous) if !previous.is_terminal() => {
                self.stats.outstanding -= 1;
                if succeeded {
                    self.stats.completed += 1;
                } else {
                    self.stats.failed += 1;
                }
            }
            previous => {
                debug_assert!(false, "task {id:?} finished from state {previous:?}");
            }
        }
    }

    /// Whether a dependency on `id` still has to be waited for.
    ///
    /// Unknown regular identities count as finished: the caller is assumed to
    /// have submitted the dependency earlier and it has already been dropped,
    /// or it is a stand-in for work that is done. Unknown any-order
    /// identities have simply not been submitted yet.
    pub fn is_unmet(&self, id: TaskId) -> bool {
        match self.lookup(id) {
            Some(state) => !state.is_terminal(),
            None => id.is_any_order(),
        }
    }

    pub fn outstanding(&self) -> usize {
        self.stats.outstanding
    }

    pub fn stats(&self) -> PoolStats {
        self.stats
    }
}
