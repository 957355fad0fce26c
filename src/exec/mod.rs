// src/exec/mod.rs

//! Execution lanes.
//!
//! - [`task_runner`] runs one task body, turning panics into task failures.
//! - [`worker`] is the on-pool lane: a fixed set of threads pulling from the
//!   ready queue.
//! - [`off_pool`] is the off-pool lane: one dedicated thread per task.
//! - [`command`] builds shell-command tasks for the job runner.

pub mod command;
pub(crate) mod off_pool;
pub(crate) mod task_runner;
pub(crate) mod worker;

pub use command::{job_task, run_job, shell_command};
