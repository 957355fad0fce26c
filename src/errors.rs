// src/errors.rs

//! Crate-wide error aliases and helpers.
//!
//! Task bodies return `anyhow::Result<()>` and the pool hands that same
//! `anyhow::Error` back from [`ThreadPool::execute`](crate::ThreadPool::execute),
//! so callers can `downcast_ref` to their own error types. The variants below
//! cover the failures the crate itself produces.

use thiserror::Error;

use crate::config::JobName;

#[derive(Error, Debug)]
pub enum DagpoolError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Cycle detected in job graph: {0}")]
    DagCycle(String),

    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error("task panicked: {0}")]
    TaskPanicked(String),

    #[error("job '{job}' failed with exit code {code:?}")]
    CommandFailed { job: JobName, code: Option<i32> },

    #[error("{0} task(s) still waiting on dependencies that were never submitted")]
    UnresolvedDependencies(usize),
}

pub type Result<T> = std::result::Result<T, DagpoolError>;
