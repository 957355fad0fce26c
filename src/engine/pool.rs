// src/engine/pool.rs

//! The public thread pool handle.

use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Instant;

use parking_lot::{Condvar, Mutex};
use tracing::{debug, error, info, warn};

use crate::dag::task_info::AdmittedTask;
use crate::dag::{Dispatch, PoolStats, SyncPoint, Task, TaskId, TaskState};
use crate::engine::core::{Admission, CoreState, PoolPhase};
use crate::errors::DagpoolError;
use crate::exec::{off_pool, worker};

/// Worker thread name prefix used unless [`ThreadPool::set_thread_name_prefix`]
/// is called.
pub const DEFAULT_THREAD_NAME_PREFIX: &str = "ThreadPool";

pub(crate) struct Shared {
    pub state: Mutex<CoreState>,
    /// Signalled when a task lands on the ready queue, or on shutdown.
    pub work_available: Condvar,
    /// Signalled when the outstanding count drops to zero, or the pool stalls.
    pub settled: Condvar,
}

/// Runs tasks on a fixed number of worker threads, honouring dependencies
/// between them.
///
/// ```no_run
/// use dagpool::ThreadPool;
///
/// let pool = ThreadPool::new();
/// pool.set_thread_count(4);
///
/// let fetch = pool.add_task(|| Ok(()));
/// pool.add_task_with_dependencies(&[fetch], || Ok(()));
///
/// // Start the workers, run everything (including any tasks the tasks
/// // themselves submit) and return the first error, if any.
/// pool.execute()?;
/// # Ok::<(), anyhow::Error>(())
/// ```
///
/// `ThreadPool` is a handle: clones share the same pool, so a task can
/// capture a clone and submit follow-up work while `execute` is running.
/// `execute` keeps waiting until that work has finished too.
///
/// A task that returns an error (or panics) is marked failed, does not stop
/// any other task, and still releases its dependents. `execute` returns the
/// first such error once every task has finished. The error is the task's
/// own `anyhow::Error`, so it can be downcast to the type the task produced.
///
/// A dependency that the pool has never seen counts as already finished.
/// That keeps stand-ins for finished work cheap, but it also means a mistyped
/// dependency is silently ignored. Use a [`SyncPoint`] (or
/// [`Task::any_order`]) for a dependency that is submitted after its
/// dependents.
///
/// No threads are created until `execute` is called, and `execute` joins
/// every thread it created before returning. A pool runs once; build a new
/// one for the next batch of work. Submitting a task once `execute` has
/// returned panics.
#[derive(Clone)]
pub struct ThreadPool {
    shared: Arc<Shared>,
}

impl ThreadPool {
    pub fn new() -> Self {
        let thread_count = std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(1);

        Self {
            shared: Arc::new(Shared {
                state: Mutex::new(CoreState::new(
                    thread_count,
                    DEFAULT_THREAD_NAME_PREFIX.to_string(),
                )),
                work_available: Condvar::new(),
                settled: Condvar::new(),
            }),
        }
    }

    /// Set the number of worker threads.
    ///
    /// # Panics
    ///
    /// If `count` is zero, or if `execute` has already been called.
    pub fn set_thread_count(&self, count: usize) {
        assert!(count >= 1, "thread count must be at least 1");
        let mut state = self.shared.state.lock();
        assert!(
            state.phase == PoolPhase::Idle,
            "thread count cannot be changed once execute has been called"
        );
        state.thread_count = count;
    }

    pub fn thread_count(&self) -> usize {
        self.shared.state.lock().thread_count
    }

    /// Prefix for worker thread names (`{prefix}-thread{n}`), for debuggers
    /// and log output.
    pub fn set_thread_name_prefix(&self, prefix: impl Into<String>) {
        self.shared.state.lock().thread_name_prefix = prefix.into();
    }

    /// Submit a task with no dependencies.
    pub fn add_task(&self, task: impl Into<Task>) -> TaskId {
        self.submit(task.into(), &[], Dispatch::OnPool)
    }

    /// Submit several independent tasks.
    pub fn add_tasks<I>(&self, tasks: I) -> Vec<TaskId>
    where
        I: IntoIterator,
        I::Item: Into<Task>,
    {
        tasks
            .into_iter()
            .map(|task| self.add_task(task))
            .collect()
    }

    /// Submit a task that runs on a thread of its own instead of a worker.
    ///
    /// Meant for work that mostly waits (an HTTP request, a subprocess) and
    /// should not tie up a worker. The task can still be depended upon, and
    /// can still depend on others.
    pub fn add_task_off_pool(&self, task: impl Into<Task>) -> TaskId {
        self.submit(task.into(), &[], Dispatch::OffPool)
    }

    pub fn add_tasks_off_pool<I>(&self, tasks: I) -> Vec<TaskId>
    where
        I: IntoIterator,
        I::Item: Into<Task>,
    {
        tasks
            .into_iter()
            .map(|task| self.add_task_off_pool(task))
            .collect()
    }

    /// Submit a task that starts only after every task in `dependencies`
    /// has finished, successfully or not.
    ///
    /// Dependencies that are already finished, or that were never submitted
    /// to this pool, are treated as satisfied (any-order identities
    /// excepted).
    pub fn add_task_with_dependencies(&self, dependencies: &[TaskId], task: impl Into<Task>) -> TaskId {
        self.submit(task.into(), dependencies, Dispatch::OnPool)
    }

    /// Submit several tasks sharing the same dependencies.
    pub fn add_tasks_with_dependencies<I>(&self, dependencies: &[TaskId], tasks: I) -> Vec<TaskId>
    where
        I: IntoIterator,
        I::Item: Into<Task>,
    {
        tasks
            .into_iter()
            .map(|task| self.add_task_with_dependencies(dependencies, task))
            .collect()
    }

    pub fn add_task_with_dependencies_off_pool(
        &self,
        dependencies: &[TaskId],
        task: impl Into<Task>,
    ) -> TaskId {
        self.submit(task.into(), dependencies, Dispatch::OffPool)
    }

    pub fn add_tasks_with_dependencies_off_pool<I>(
        &self,
        dependencies: &[TaskId],
        tasks: I,
    ) -> Vec<TaskId>
    where
        I: IntoIterator,
        I::Item: Into<Task>,
    {
        tasks
            .into_iter()
            .map(|task| self.add_task_with_dependencies_off_pool(dependencies, task))
            .collect()
    }

    /// Submit the no-op task behind `point`, releasing whatever waits on it
    /// once it has run.
    ///
    /// # Panics
    ///
    /// If the same sync point is added to this pool twice.
    pub fn add_sync_point(&self, point: &SyncPoint) -> TaskId {
        self.add_task(point.into_task())
    }

    /// Start the workers, wait until every task has finished and return the
    /// first task error, if any.
    ///
    /// Tasks submitted by running tasks are waited for as well.
    ///
    /// Work blocked on a sync point (or other any-order task) is only waited
    /// for while something else is queued, held or running. Once the pool has
    /// nothing left to do but blocked tasks, it stops waiting. Add such a
    /// sync point before calling `execute`, or from a task of this pool, not
    /// from an unrelated thread while the pool sits idle.
    ///
    /// # Errors
    ///
    /// - the first error returned by a task, unchanged; a panic is reported
    ///   as [`DagpoolError::TaskPanicked`];
    /// - [`DagpoolError::UnresolvedDependencies`] if tasks are left waiting
    ///   on a sync point (or other any-order task) that was never submitted;
    /// - [`DagpoolError::IoError`] if a worker thread could not be spawned.
    ///
    /// # Panics
    ///
    /// If `execute` has already been called on this pool.
    pub fn execute(&self) -> anyhow::Result<()> {
        let started = Instant::now();

        let (thread_count, prefix) = {
            let mut state = self.shared.state.lock();
            match state.phase {
                PoolPhase::Idle => {}
                PoolPhase::Running => panic!("execute is already running on this pool"),
                PoolPhase::Succeeded | PoolPhase::Failed => {
                    panic!("execute was already called on this pool; use a new ThreadPool per run")
                }
            }
            state.phase = PoolPhase::Running;
            (state.thread_count, state.thread_name_prefix.clone())
        };

        info!(
            thread_count,
            prefix = %prefix,
            submitted = self.stats().submitted,
            "thread pool starting"
        );

        let workers = match worker::spawn_workers(self, thread_count, &prefix) {
            Ok(handles) => handles,
            Err((handles, err)) => {
                error!(error = %err, "failed to spawn worker thread; shutting down");
                let off_pool = self.shut_down();
                join_all(handles, off_pool);
                let mut state = self.shared.state.lock();
                state.discard_unrun();
                state.phase = PoolPhase::Failed;
                return Err(DagpoolError::IoError(err).into());
            }
        };

        let stalled = {
            let mut state = self.shared.state.lock();
            let held = state.take_held();
            if !held.is_empty() {
                debug!(count = held.len(), "dispatching off-pool tasks held before execute");
            }
            self.dispatch_released(
                &mut state,
                held.into_iter().map(|task| (task, Dispatch::OffPool)).collect(),
            );

            while !state.is_settled() && !state.is_stalled() {
                self.shared.settled.wait(&mut state);
            }
            !state.is_settled()
        };

        let off_pool = self.shut_down();
        join_all(workers, off_pool);

        let mut state = self.shared.state.lock();
        let mut outcome = state.take_error();
        if stalled {
            let unrun = state.discard_unrun();
            warn!(unrun, "tasks were left waiting on dependencies that were never submitted");
            if outcome.is_none() {
                outcome = Some(DagpoolError::UnresolvedDependencies(unrun).into());
            }
        }
        state.phase = if outcome.is_some() {
            PoolPhase::Failed
        } else {
            PoolPhase::Succeeded
        };

        let stats = state.stats();
        info!(
            elapsed_ms = started.elapsed().as_millis() as u64,
            completed = stats.completed,
            failed = stats.failed,
            "thread pool finished"
        );

        match outcome {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    pub fn phase(&self) -> PoolPhase {
        self.shared.state.lock().phase
    }

    /// Lifecycle state of a task, or `None` if it was never submitted here.
    pub fn state_of(&self, id: TaskId) -> Option<TaskState> {
        self.shared.state.lock().state_of(id)
    }

    pub fn stats(&self) -> PoolStats {
        self.shared.state.lock().stats()
    }

    pub(crate) fn shared(&self) -> &Shared {
        &self.shared
    }

    fn submit(&self, task: Task, dependencies: &[TaskId], dispatch: Dispatch) -> TaskId {
        let id = task.id();
        let mut state = self.shared.state.lock();
        assert!(
            !state.shutdown && matches!(state.phase, PoolPhase::Idle | PoolPhase::Running),
            "cannot submit tasks after execute has returned; use a new ThreadPool per run"
        );

        match state.admit(task, dependencies, dispatch) {
            Admission::Queued => {
                self.shared.work_available.notify_one();
            }
            Admission::SpawnOffPool(task) => {
                self.dispatch_released(&mut state, vec![(task, Dispatch::OffPool)]);
            }
            Admission::Blocked | Admission::Held => {}
        }

        id
    }

    /// Finish bookkeeping for a task that ran on a worker or off-pool thread.
    pub(crate) fn complete(&self, id: TaskId, outcome: anyhow::Result<()>) {
        let mut state = self.shared.state.lock();
        let released = state.finish_task(id, outcome);
        self.dispatch_released(&mut state, released);
    }

    /// Hand released tasks to their lanes. Must be called with the lock held.
    ///
    /// An off-pool task whose thread cannot be spawned fails on the spot,
    /// which may release further tasks in turn.
    fn dispatch_released(
        &self,
        state: &mut CoreState,
        released: Vec<(AdmittedTask, Dispatch)>,
    ) {
        let mut pending = released;

        while let Some((task, dispatch)) = pending.pop() {
            match state.place_ready(task, dispatch) {
                Admission::Queued => {
                    self.shared.work_available.notify_one();
                }
                Admission::SpawnOffPool(task) => {
                    if let Err((id, err)) = off_pool::spawn(self, state, task) {
                        pending.extend(state.finish_task(id, Err(err)));
                    }
                }
                Admission::Blocked | Admission::Held => {}
            }
        }

        if state.is_settled() || state.is_stalled() {
            self.shared.settled.notify_all();
        }
    }

    /// Tell idle workers to exit and collect the off-pool threads to join.
    fn shut_down(&self) -> Vec<JoinHandle<()>> {
        let mut state = self.shared.state.lock();
        state.shutdown = true;
        self.shared.work_available.notify_all();
        std::mem::take(&mut state.off_pool_threads)
    }
}

impl Default for ThreadPool {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for ThreadPool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.shared.state.lock();
        f.debug_struct("ThreadPool")
            .field("phase", &state.phase)
            .field("thread_count", &state.thread_count)
            .field("stats", &state.stats())
            .finish()
    }
}

fn join_all(workers: Vec<JoinHandle<()>>, off_pool: Vec<JoinHandle<()>>) {
    for handle in workers.into_iter().chain(off_pool) {
        let name = handle.thread().name().map(str::to_string);
        if handle.join().is_err() {
            error!(thread = ?name, "pool thread panicked outside of a task");
        }
    }
}
