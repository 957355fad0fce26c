// src/exec/task_runner.rs

//! Runs a single task body.

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};

use tracing::debug;

use crate::dag::TaskId;
use crate::dag::task_info::AdmittedTask;
use crate::errors::DagpoolError;

/// Run a task body to completion and return its identity and outcome.
///
/// A panic in the body is caught here and turned into
/// [`DagpoolError::TaskPanicked`], so it fails the task like any returned
/// error instead of taking the worker thread down with it.
pub(crate) fn run_task(task: AdmittedTask) -> (TaskId, anyhow::Result<()>) {
    let AdmittedTask { id, label, work } = task;
    let label = label.unwrap_or_default();

    debug!(task = %id, label = %label, "starting task");

    let outcome = match panic::catch_unwind(AssertUnwindSafe(work)) {
        Ok(result) => result,
        Err(payload) => Err(DagpoolError::TaskPanicked(panic_message(payload.as_ref())).into()),
    };

    match &outcome {
        Ok(()) => debug!(task = %id, label = %label, "task completed"),
        Err(err) => debug!(task = %id, label = %label, error = %err, "task failed"),
    }

    (id, outcome)
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    }
}
