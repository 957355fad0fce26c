// src/exec/worker.rs

//! The on-pool lane: a fixed set of worker threads sharing the ready queue.

use std::io;
use std::thread::{self, JoinHandle};

use tracing::{debug, trace};

use crate::engine::ThreadPool;
use crate::exec::task_runner::run_task;

/// Spawn `count` workers named `{prefix}-thread{i}`.
///
/// On failure, returns the workers that did start together with the error so
/// the caller can shut them down.
pub(crate) fn spawn_workers(
    pool: &ThreadPool,
    count: usize,
    prefix: &str,
) -> Result<Vec<JoinHandle<()>>, (Vec<JoinHandle<()>>, io::Error)> {
    let mut handles = Vec::with_capacity(count);

    for i in 0..count {
        let worker_pool = pool.clone();
        let spawned = thread::Builder::new()
            .name(format!("{prefix}-thread{i}"))
            .spawn(move || worker_loop(worker_pool));

        match spawned {
            Ok(handle) => handles.push(handle),
            Err(err) => return Err((handles, err)),
        }
    }

    Ok(handles)
}

/// Take ready tasks until the pool shuts down.
///
/// Blocks only while the ready queue is empty. A failing task does not stop
/// the worker; its error is recorded by the pool and the loop moves on.
fn worker_loop(pool: ThreadPool) {
    let shared = pool.shared();
    debug!("worker started");

    loop {
        let task = {
            let mut state = shared.state.lock();
            loop {
                if let Some(task) = state.take_ready() {
                    break task;
                }
                if state.shutdown {
                    debug!("worker exiting");
                    return;
                }
                trace!("worker idle; waiting for work");
                shared.work_available.wait(&mut state);
            }
        };

        let (id, outcome) = run_task(task);
        pool.complete(id, outcome);
    }
}
