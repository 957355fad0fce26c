// src/lib.rs

//! A dependency-aware, bounded thread pool.
//!
//! [`ThreadPool`] runs tasks on a fixed number of worker threads. Tasks may
//! depend on other tasks, may run "off pool" on a thread of their own, and
//! may submit more tasks while the pool is running. [`ThreadPool::execute`]
//! blocks until all of that work has finished and returns the first task
//! error.
//!
//! The crate also ships the `dagpool` binary, which runs a TOML file of shell
//! jobs through the pool; [`run`] is its entry point.

pub mod cli;
pub mod config;
pub mod dag;
pub mod engine;
pub mod errors;
pub mod exec;
pub mod logging;
pub mod types;

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use anyhow::Result;
use tracing::{debug, info};

pub use crate::dag::{PoolStats, SyncPoint, Task, TaskId, TaskState};
pub use crate::engine::{PoolPhase, ThreadPool};
pub use crate::errors::DagpoolError;

use crate::cli::CliArgs;
use crate::config::loader::{default_config_path, load_and_validate};
use crate::config::{JobName, JobsFile};
use crate::exec::job_task;
use crate::types::Lane;

/// High-level entry point used by `main.rs`.
///
/// This wires together:
/// - job file loading and validation
/// - pool configuration (`[pool]`, overridden by `--threads`)
/// - job submission in dependency order
/// - execution
pub fn run(args: CliArgs) -> Result<()> {
    let config_path = args.config.clone().unwrap_or_else(default_config_path);
    let cfg = load_and_validate(&config_path)?;

    if args.dry_run {
        print_dry_run(&cfg);
        return Ok(());
    }

    let pool = ThreadPool::new();
    cfg.pool().apply(&pool);
    if let Some(threads) = args.threads {
        pool.set_thread_count(threads as usize);
    }

    let workdir = config_root_dir(&config_path);
    let ids = submit_jobs(&pool, &cfg, Some(&workdir));
    info!(jobs = ids.len(), threads = pool.thread_count(), "submitted jobs");

    pool.execute()
}

/// Submit every job in `cfg` to `pool`, in dependency order, and return the
/// task identity assigned to each job.
///
/// Dependencies are always submitted before their dependents, so every
/// `after` entry refers to a task the pool already knows about.
pub fn submit_jobs(
    pool: &ThreadPool,
    cfg: &JobsFile,
    workdir: Option<&Path>,
) -> BTreeMap<JobName, TaskId> {
    let mut ids: BTreeMap<JobName, TaskId> = BTreeMap::new();

    for name in cfg.topological_order() {
        let Some(job) = cfg.job(name) else {
            continue;
        };

        let deps: Vec<TaskId> = job
            .after
            .iter()
            .filter_map(|dep| ids.get(dep).copied())
            .collect();

        let task = job_task(name.clone(), job.cmd.clone(), workdir);
        let id = match job.lane {
            Lane::Pool => pool.add_task_with_dependencies(&deps, task),
            Lane::OffPool => pool.add_task_with_dependencies_off_pool(&deps, task),
        };

        debug!(job = %name, task = %id, lane = ?job.lane, after = ?job.after, "submitted job");
        ids.insert(name.clone(), id);
    }

    ids
}

/// Directory jobs run in.
///
/// - If the config path has a non-empty parent (e.g. "jobs/Dagpool.toml"),
///   we use that directory.
/// - If it's just a bare filename like "Dagpool.toml" (parent = ""),
///   we fall back to the current working directory "."
fn config_root_dir(config_path: &Path) -> PathBuf {
    match config_path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
    }
}

/// Simple dry-run output: print pool settings and jobs in the order they
/// would be submitted.
fn print_dry_run(cfg: &JobsFile) {
    println!("dagpool dry-run");
    match cfg.pool().threads {
        Some(threads) => println!("  pool.threads = {threads}"),
        None => println!("  pool.threads = (available parallelism)"),
    }
    if let Some(ref prefix) = cfg.pool().thread_name_prefix {
        println!("  pool.thread_name_prefix = {prefix}");
    }
    println!();

    println!("jobs ({}):", cfg.jobs().len());
    for name in cfg.topological_order() {
        let Some(job) = cfg.job(name) else {
            continue;
        };
        println!("  - {name}");
        println!("      cmd: {}", job.cmd);
        if !job.after.is_empty() {
            println!("      after: {:?}", job.after);
        }
        if job.lane == Lane::OffPool {
            println!("      lane: off_pool");
        }
    }

    debug!("dry-run complete (no execution)");
}
