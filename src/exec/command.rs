// src/exec/command.rs

//! Shell-command job bodies for the job runner.

use std::path::Path;
use std::process::{Command, Stdio};

use anyhow::{Context, Result};
use tracing::{info, warn};

use crate::config::JobName;
use crate::dag::Task;
use crate::errors::DagpoolError;

/// Build a shell command appropriate for the platform.
pub fn shell_command(cmd: &str) -> Command {
    if cfg!(windows) {
        let mut c = Command::new("cmd");
        c.arg("/C").arg(cmd);
        c
    } else {
        let mut c = Command::new("sh");
        c.arg("-c").arg(cmd);
        c
    }
}

/// Wrap a job's command line in a [`Task`] labelled with the job name.
///
/// `workdir` is the directory the command runs in; `None` keeps the current
/// directory.
pub fn job_task(job: JobName, cmd: String, workdir: Option<&Path>) -> Task {
    let workdir = workdir.map(Path::to_path_buf);
    let label = job.clone();
    Task::new(move || run_job(&job, &cmd, workdir.as_deref())).with_label(label)
}

/// Run one job's command to completion.
///
/// Output is captured and re-emitted line by line through `tracing` (stdout at
/// `info`, stderr at `warn`), tagged with the job name. A non-zero exit is
/// reported as [`DagpoolError::CommandFailed`].
pub fn run_job(job: &JobName, cmd: &str, workdir: Option<&Path>) -> Result<()> {
    info!(job = %job, cmd = %cmd, "starting job");

    let mut command = shell_command(cmd);
    command.stdin(Stdio::null());
    if let Some(dir) = workdir {
        command.current_dir(dir);
    }

    let output = command
        .output()
        .with_context(|| format!("spawning process for job '{job}'"))?;

    for line in String::from_utf8_lossy(&output.stdout).lines() {
        info!(job = %job, "{line}");
    }
    for line in String::from_utf8_lossy(&output.stderr).lines() {
        warn!(job = %job, "{line}");
    }

    if output.status.success() {
        info!(job = %job, "job finished");
        Ok(())
    } else {
        Err(DagpoolError::CommandFailed {
            job: job.clone(),
            code: output.status.code(),
        }
        .into())
    }
}
