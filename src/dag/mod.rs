// src/dag/mod.rs

//! Task identities and dependency bookkeeping.
//!
//! - [`task_info`] defines tasks, their identities, sync points and lifecycle
//!   states.
//! - [`registry`] tracks the state of every task a pool has seen, plus the
//!   outstanding-task counter.
//! - [`graph`] holds tasks that wait on other tasks and decides when they
//!   are released.
//!
//! Everything here is plain single-threaded data; the pool wraps it in one
//! lock (see [`crate::engine::core`]).

pub mod graph;
pub mod registry;
pub mod task_info;

pub(crate) use graph::DependencyGraph;
pub use registry::{PoolStats, TaskRegistry};
pub use task_info::{Dispatch, SyncPoint, Task, TaskId, TaskState, Work};
