// tests/job_runner.rs

#![cfg(unix)]

use std::fs;
use std::sync::Arc;
use std::thread;

use parking_lot::Mutex;

use dagpool::errors::DagpoolError;
use dagpool::{submit_jobs, TaskState, ThreadPool};

mod common;
use crate::common::builders::{JobConfigBuilder, JobsFileBuilder};
use crate::common::{init_tracing, with_timeout};

#[test]
fn jobs_run_in_dependency_order_in_the_working_directory() {
    init_tracing();
    let dir = tempfile::tempdir().unwrap();
    let workdir = dir.path().to_path_buf();

    let cfg = JobsFileBuilder::new()
        .with_threads(2)
        .with_job("first", JobConfigBuilder::new("sleep 0.1; echo first >> log.txt").build())
        .with_job(
            "second",
            JobConfigBuilder::new("echo second >> log.txt")
                .after("first")
                .off_pool()
                .build(),
        )
        .with_job(
            "third",
            JobConfigBuilder::new("echo third >> log.txt").after("second").build(),
        )
        .build();

    let (result, states) = with_timeout({
        let workdir = workdir.clone();
        move || {
            let pool = ThreadPool::new();
            cfg.pool().apply(&pool);
            let ids = submit_jobs(&pool, &cfg, Some(workdir.as_path()));
            let result = pool.execute();
            let states: Vec<_> = ids.values().map(|id| pool.state_of(*id)).collect();
            (result, states)
        }
    });

    result.expect("all jobs succeed");
    assert!(states.iter().all(|s| *s == Some(TaskState::Completed)));
    let log = fs::read_to_string(workdir.join("log.txt")).unwrap();
    assert_eq!(log, "first\nsecond\nthird\n");
}

#[test]
fn failing_job_reports_its_exit_code_and_dependents_still_run() {
    init_tracing();
    let dir = tempfile::tempdir().unwrap();
    let workdir = dir.path().to_path_buf();

    let cfg = JobsFileBuilder::new()
        .with_job("broken", JobConfigBuilder::new("exit 3").build())
        .with_job(
            "cleanup",
            JobConfigBuilder::new("touch cleaned").after("broken").build(),
        )
        .build();

    let result = with_timeout({
        let workdir = workdir.clone();
        move || {
            let pool = ThreadPool::new();
            submit_jobs(&pool, &cfg, Some(workdir.as_path()));
            pool.execute()
        }
    });

    let err = result.expect_err("broken job fails the run");
    match err.downcast_ref::<DagpoolError>() {
        Some(DagpoolError::CommandFailed { job, code }) => {
            assert_eq!(job, "broken");
            assert_eq!(*code, Some(3));
        }
        other => panic!("Expected CommandFailed, got: {:?}", other),
    }
    assert!(workdir.join("cleaned").exists());
}

#[test]
fn pool_section_sets_thread_count_and_names() {
    let cfg = JobsFileBuilder::new()
        .with_threads(3)
        .with_thread_name_prefix("jobs")
        .with_job("only", JobConfigBuilder::new("true").build())
        .build();

    let pool = ThreadPool::new();
    cfg.pool().apply(&pool);
    assert_eq!(pool.thread_count(), 3);

    let names = with_timeout(move || {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let record = Arc::clone(&seen);
        pool.add_task(move || {
            record.lock().push(thread::current().name().map(str::to_string));
            Ok(())
        });
        pool.execute().map(|()| seen.lock().clone())
    })
    .expect("recording task succeeds");

    let name = names.into_iter().flatten().next().unwrap_or_default();
    assert!(name.starts_with("jobs-thread"), "worker named {name:?}");
}
