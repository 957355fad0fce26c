// src/dag/task_info.rs

//! Task identities, task bodies and lifecycle state.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

/// Boxed task body.
pub type Work = Box<dyn FnOnce() -> anyhow::Result<()> + Send + 'static>;

static NEXT_TASK_ID: AtomicU64 = AtomicU64::new(1);

/// Identity of a unit of work.
///
/// Identities are allocated from a process-wide counter, so two tasks never
/// share one even across pools. Equality is identity equality: two tasks
/// doing the same thing still have different ids.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TaskId {
    raw: u64,
    any_order: bool,
}

impl TaskId {
    fn allocate(any_order: bool) -> Self {
        Self {
            raw: NEXT_TASK_ID.fetch_add(1, Ordering::Relaxed),
            any_order,
        }
    }

    /// Numeric value of the identity, for logging.
    pub fn as_u64(self) -> u64 {
        self.raw
    }

    /// Whether this identity may be depended upon before it is submitted.
    ///
    /// A regular identity that is unknown to the pool counts as already
    /// finished. An any-order identity that is unknown counts as not yet
    /// finished and holds its dependents back until it runs.
    pub fn is_any_order(self) -> bool {
        self.any_order
    }
}

impl fmt::Debug for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.any_order {
            write!(f, "TaskId({}, any-order)", self.raw)
        } else {
            write!(f, "TaskId({})", self.raw)
        }
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.raw)
    }
}

/// A unit of work: an identity plus a zero-argument body.
///
/// Any `FnOnce() -> anyhow::Result<()> + Send + 'static` converts into a
/// `Task`, so most callers pass closures straight to the pool. Build a `Task`
/// explicitly when its [`id`](Task::id) is needed before submission, e.g. to
/// hand it to a dependent that is created first.
pub struct Task {
    id: TaskId,
    label: Option<String>,
    work: Work,
}

impl Task {
    pub fn new<F>(work: F) -> Self
    where
        F: FnOnce() -> anyhow::Result<()> + Send + 'static,
    {
        Self {
            id: TaskId::allocate(false),
            label: None,
            work: Box::new(work),
        }
    }

    /// A task that may be listed as a dependency before it is submitted.
    pub fn any_order<F>(work: F) -> Self
    where
        F: FnOnce() -> anyhow::Result<()> + Send + 'static,
    {
        Self {
            id: TaskId::allocate(true),
            label: None,
            work: Box::new(work),
        }
    }

    /// Attach a human-readable label, shown in log output.
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    pub fn id(&self) -> TaskId {
        self.id
    }

    pub(crate) fn into_parts(self) -> (TaskId, Option<String>, Work) {
        (self.id, self.label, self.work)
    }
}

impl fmt::Debug for Task {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Task")
            .field("id", &self.id)
            .field("label", &self.label)
            .finish_non_exhaustive()
    }
}

impl<F> From<F> for Task
where
    F: FnOnce() -> anyhow::Result<()> + Send + 'static,
{
    fn from(work: F) -> Self {
        Task::new(work)
    }
}

/// A no-op task that other tasks can wait on, and that may be submitted
/// before or after the tasks depending on it.
///
/// Typical use: a task declares `add_task_with_dependencies(&[sp.id()], ...)`
/// up front, and whichever piece of work finishes the prerequisite later
/// calls [`ThreadPool::add_sync_point`](crate::ThreadPool::add_sync_point).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SyncPoint {
    id: TaskId,
}

impl SyncPoint {
    pub fn new() -> Self {
        Self {
            id: TaskId::allocate(true),
        }
    }

    pub fn id(&self) -> TaskId {
        self.id
    }

    pub(crate) fn into_task(self) -> Task {
        Task {
            id: self.id,
            label: Some(format!("sync-point {}", self.id)),
            work: Box::new(|| Ok(())),
        }
    }
}

impl Default for SyncPoint {
    fn default() -> Self {
        Self::new()
    }
}

/// Lifecycle state of a submitted task.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskState {
    /// Waiting for at least one dependency to finish.
    Pending,
    /// Dependencies satisfied; waiting for a worker (or, off-pool, for
    /// `execute` to start).
    Ready,
    /// Currently executing.
    Running,
    /// Body returned `Ok(())`.
    Completed,
    /// Body returned an error or panicked.
    Failed,
}

impl TaskState {
    /// Completed or failed. Dependents only care that a task finished, not
    /// how.
    pub fn is_terminal(self) -> bool {
        matches!(self, TaskState::Completed | TaskState::Failed)
    }
}

/// Which lane a ready task is dispatched on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dispatch {
    OnPool,
    OffPool,
}

/// A submitted task body together with its identity.
pub(crate) struct AdmittedTask {
    pub id: TaskId,
    pub label: Option<String>,
    pub work: Work,
}

impl AdmittedTask {
    pub fn display_label(&self) -> &str {
        self.label.as_deref().unwrap_or("")
    }
}
