// src/config/validate.rs

use petgraph::algo::toposort;
use petgraph::graphmap::DiGraphMap;

use crate::config::model::{JobName, JobsFile, RawJobsFile};
use crate::errors::{DagpoolError, Result};

impl TryFrom<RawJobsFile> for JobsFile {
    type Error = DagpoolError;

    fn try_from(raw: RawJobsFile) -> std::result::Result<Self, Self::Error> {
        let order = validate_jobs(&raw)?;
        Ok(JobsFile::new_unchecked(raw.pool, raw.job, order))
    }
}

/// Validate a raw job file, returning its jobs in dependency order.
pub fn validate_jobs(cfg: &RawJobsFile) -> Result<Vec<JobName>> {
    ensure_has_jobs(cfg)?;
    validate_pool_section(cfg)?;
    validate_job_dependencies(cfg)?;
    dependency_order(cfg)
}

fn ensure_has_jobs(cfg: &RawJobsFile) -> Result<()> {
    if cfg.job.is_empty() {
        return Err(DagpoolError::ConfigError(
            "job file must contain at least one [job.<name>] section".to_string(),
        ));
    }
    Ok(())
}

fn validate_pool_section(cfg: &RawJobsFile) -> Result<()> {
    if cfg.pool.threads == Some(0) {
        return Err(DagpoolError::ConfigError(
            "[pool].threads must be >= 1 (got 0)".to_string(),
        ));
    }

    if let Some(ref prefix) = cfg.pool.thread_name_prefix {
        if prefix.trim().is_empty() {
            return Err(DagpoolError::ConfigError(
                "[pool].thread_name_prefix must not be empty".to_string(),
            ));
        }
    }

    Ok(())
}

fn validate_job_dependencies(cfg: &RawJobsFile) -> Result<()> {
    for (name, job) in cfg.job.iter() {
        if job.cmd.trim().is_empty() {
            return Err(DagpoolError::ConfigError(format!(
                "job '{}' has an empty `cmd`",
                name
            )));
        }
        for dep in job.after.iter() {
            if dep == name {
                return Err(DagpoolError::ConfigError(format!(
                    "job '{}' cannot depend on itself in `after`",
                    name
                )));
            }
            // The pool itself treats unknown dependencies as satisfied, so a
            // typo here would silently drop an ordering constraint.
            if !cfg.job.contains_key(dep) {
                return Err(DagpoolError::ConfigError(format!(
                    "job '{}' has unknown dependency '{}' in `after`",
                    name, dep
                )));
            }
        }
    }
    Ok(())
}

fn dependency_order(cfg: &RawJobsFile) -> Result<Vec<JobName>> {
    // Edge direction: dep -> job.
    //
    //   [job.B]
    //   after = ["A"]
    //
    // adds edge A -> B.
    let mut graph: DiGraphMap<&str, ()> = DiGraphMap::new();

    for name in cfg.job.keys() {
        graph.add_node(name.as_str());
    }

    for (name, job) in cfg.job.iter() {
        for dep in job.after.iter() {
            graph.add_edge(dep.as_str(), name.as_str(), ());
        }
    }

    match toposort(&graph, None) {
        Ok(order) => Ok(order.into_iter().map(str::to_string).collect()),
        Err(cycle) => Err(DagpoolError::DagCycle(format!(
            "cycle detected in job graph involving job '{}'",
            cycle.node_id()
        ))),
    }
}
