// src/exec/off_pool.rs

//! The off-pool lane: one dedicated thread per task, outside the worker
//! budget.

use std::thread;

use tracing::debug;

use crate::dag::TaskId;
use crate::dag::task_info::AdmittedTask;
use crate::engine::ThreadPool;
use crate::engine::core::CoreState;
use crate::exec::task_runner::run_task;

/// Spawn a thread that runs `task` and then does the usual finish
/// bookkeeping. Must be called with the pool lock held; the join handle is
/// stored in `state` for `execute` to join.
///
/// If the OS refuses to create the thread, the task is left marked as
/// running and its identity is returned with the error, so the caller can
/// fail it.
pub(crate) fn spawn(
    pool: &ThreadPool,
    state: &mut CoreState,
    task: AdmittedTask,
) -> Result<(), (TaskId, anyhow::Error)> {
    let id = task.id;
    let name = format!("{}-offpool-{}", state.thread_name_prefix, id.as_u64());
    state.mark_running(id);

    debug!(task = %id, label = task.display_label(), thread = %name, "spawning off-pool thread");

    let thread_pool = pool.clone();
    let spawned = thread::Builder::new().name(name).spawn(move || {
        let (id, outcome) = run_task(task);
        thread_pool.complete(id, outcome);
    });

    match spawned {
        Ok(handle) => {
            state.off_pool_threads.push(handle);
            Ok(())
        }
        Err(err) => Err((
            id,
            anyhow::Error::new(err).context(format!("spawning off-pool thread for task {id}")),
        )),
    }
}
