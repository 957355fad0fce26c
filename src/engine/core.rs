// src/engine/core.rs

//! Coordinating state of a pool.
//!
//! [`CoreState`] bundles everything the threads of a pool run need to agree
//! on: the task registry (with the outstanding counter), the dependency
//! graph, the ready queue, the error slot and the run phase. It is guarded by
//! a single mutex in [`crate::engine::pool`]; nothing in here spawns threads
//! or blocks. The threaded shell (`engine::pool`, `exec::*`) takes the lock,
//! calls one of these methods and acts on the result.

use std::collections::{HashSet, VecDeque};
use std::thread::JoinHandle;

use tracing::{debug, warn};

use crate::dag::task_info::AdmittedTask;
use crate::dag::{DependencyGraph, Dispatch, PoolStats, Task, TaskId, TaskRegistry, TaskState};

/// Lifecycle of a pool instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PoolPhase {
    /// Created; tasks may be submitted, no threads exist yet.
    Idle,
    /// `execute` is in progress.
    Running,
    /// `execute` returned `Ok(())`.
    Succeeded,
    /// `execute` returned an error.
    Failed,
}

/// Where a submitted task ended up.
pub(crate) enum Admission {
    /// Pushed onto the ready queue; a worker should be woken.
    Queued,
    /// Waiting on dependencies.
    Blocked,
    /// Off-pool and ready, but `execute` has not started yet.
    Held,
    /// Off-pool and ready; the caller must spawn its thread.
    SpawnOffPool(AdmittedTask),
}

pub(crate) struct CoreState {
    pub phase: PoolPhase,
    pub thread_count: usize,
    pub thread_name_prefix: String,
    registry: TaskRegistry,
    graph: DependencyGraph,
    ready: VecDeque<AdmittedTask>,
    held_off_pool: Vec<AdmittedTask>,
    /// Tasks handed to a worker or an off-pool thread and not yet finished.
    in_flight: usize,
    /// First task error; later ones are logged and dropped.
    error: Option<anyhow::Error>,
    /// Set once `execute` is done waiting; idle workers exit.
    pub shutdown: bool,
    pub off_pool_threads: Vec<JoinHandle<()>>,
}

impl CoreState {
    pub fn new(thread_count: usize, thread_name_prefix: String) -> Self {
        Self {
            phase: PoolPhase::Idle,
            thread_count,
            thread_name_prefix,
            registry: TaskRegistry::new(),
            graph: DependencyGraph::new(),
            ready: VecDeque::new(),
            held_off_pool: Vec::new(),
            in_flight: 0,
            error: None,
            shutdown: false,
            off_pool_threads: Vec::new(),
        }
    }

    /// Register `task` and place it according to its dependencies.
    ///
    /// Unmet dependencies are computed at this instant: anything already
    /// finished, or never submitted (unless any-order), does not count.
    pub fn admit(&mut self, task: Task, deps: &[TaskId], dispatch: Dispatch) -> Admission {
        let unmet = DependencyGraph::unmet_dependencies(&self.registry, deps);
        let (id, label, work) = task.into_parts();
        let task = AdmittedTask { id, label, work };

        if unmet.is_empty() {
            self.registry.register(id, TaskState::Ready);
            self.place_ready(task, dispatch)
        } else {
            self.registry.register(id, TaskState::Pending);
            self.graph.block(task, dispatch, unmet);
            Admission::Blocked
        }
    }

    /// Put a task whose dependencies are all finished onto its lane.
    pub fn place_ready(&mut self, task: AdmittedTask, dispatch: Dispatch) -> Admission {
        self.registry.transition(task.id, TaskState::Ready);

        match dispatch {
            Dispatch::OnPool => {
                debug!(task = %task.id, label = task.display_label(), "task ready");
                self.ready.push_back(task);
                Admission::Queued
            }
            Dispatch::OffPool if self.phase == PoolPhase::Idle => {
                debug!(
                    task = %task.id,
                    label = task.display_label(),
                    "off-pool task ready; holding until execute starts"
                );
                self.held_off_pool.push(task);
                Admission::Held
            }
            Dispatch::OffPool => Admission::SpawnOffPool(task),
        }
    }

    /// Pop the next on-pool task and mark it running.
    pub fn take_ready(&mut self) -> Option<AdmittedTask> {
        let task = self.ready.pop_front()?;
        self.mark_running(task.id);
        Some(task)
    }

    /// Mark a task as handed to a thread.
    pub fn mark_running(&mut self, id: TaskId) {
        self.registry.transition(id, TaskState::Running);
        self.in_flight += 1;
    }

    /// Off-pool tasks that became ready before `execute` started.
    pub fn take_held(&mut self) -> Vec<AdmittedTask> {
        std::mem::take(&mut self.held_off_pool)
    }

    /// Finish bookkeeping for a task that was running: record its outcome,
    /// take it off the outstanding count and return the tasks it released.
    pub fn finish_task(
        &mut self,
        id: TaskId,
        outcome: anyhow::Result<()>,
    ) -> Vec<(AdmittedTask, Dispatch)> {
        self.in_flight -= 1;

        let succeeded = match outcome {
            Ok(()) => true,
            Err(err) => {
                self.record_error(id, err);
                false
            }
        };

        self.registry.finish(id, succeeded);
        self.graph.on_task_finished(id)
    }

    fn record_error(&mut self, id: TaskId, err: anyhow::Error) {
        if self.error.is_none() {
            warn!(task = %id, error = %err, "task failed; execute will return this error");
            self.error = Some(err);
        } else {
            warn!(task = %id, error = %err, "task failed after an earlier failure; error discarded");
        }
    }

    pub fn take_error(&mut self) -> Option<anyhow::Error> {
        self.error.take()
    }

    /// No task is outstanding.
    pub fn is_settled(&self) -> bool {
        self.registry.outstanding() == 0
    }

    /// Tasks are outstanding but every one of them is blocked, and nothing is
    /// queued, held or running that could release them. Only the submission
    /// of a missing any-order dependency could change that.
    pub fn is_stalled(&self) -> bool {
        let outstanding = self.registry.outstanding();
        outstanding > 0
            && outstanding == self.graph.blocked_len()
            && self.in_flight == 0
            && self.ready.is_empty()
            && self.held_off_pool.is_empty()
    }

    /// Drop every task that can no longer run, returning how many there were.
    ///
    /// Task bodies often capture a clone of their pool; dropping them here
    /// releases those references once `execute` is done.
    pub fn discard_unrun(&mut self) -> usize {
        let missing: HashSet<TaskId> = self
            .graph
            .missing_dependencies(&self.registry)
            .into_iter()
            .collect();
        if !missing.is_empty() {
            warn!(?missing, "tasks depend on any-order identities that were never submitted");
        }

        let count = self.graph.blocked_len() + self.ready.len() + self.held_off_pool.len();
        self.graph = DependencyGraph::new();
        self.ready.clear();
        self.held_off_pool.clear();
        count
    }

    pub fn state_of(&self, id: TaskId) -> Option<TaskState> {
        self.registry.lookup(id)
    }

    pub fn stats(&self) -> PoolStats {
        self.registry.stats()
    }
}
