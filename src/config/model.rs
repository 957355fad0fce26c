// src/config/model.rs

use std::collections::BTreeMap;

use serde::Deserialize;

use crate::engine::ThreadPool;
use crate::types::Lane;

/// Canonical job name type used throughout the job runner.
pub type JobName = String;

/// Job file as read from TOML, before validation.
///
/// ```toml
/// [pool]
/// threads = 4
/// thread_name_prefix = "import"
///
/// [job.fetch]
/// cmd = "curl -sSfO https://example.com/data.csv"
/// lane = "off_pool"
///
/// [job.import]
/// cmd = "./import data.csv"
/// after = ["fetch"]
/// ```
///
/// All sections are optional at this stage; validation requires at least one
/// job.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct RawJobsFile {
    /// Pool settings from `[pool]`.
    #[serde(default)]
    pub pool: PoolSection,

    /// All jobs from `[job.<name>]`, keyed by job name.
    #[serde(default)]
    pub job: BTreeMap<JobName, JobConfig>,
}

/// Validated job file.
///
/// Construct with `JobsFile::try_from(raw)` (or
/// [`load_and_validate`](crate::config::load_and_validate)); every `after`
/// entry is known and the job graph is acyclic.
#[derive(Debug, Clone)]
pub struct JobsFile {
    pool: PoolSection,
    job: BTreeMap<JobName, JobConfig>,
    /// Job names ordered so every job comes after its dependencies.
    order: Vec<JobName>,
}

impl JobsFile {
    pub(crate) fn new_unchecked(
        pool: PoolSection,
        job: BTreeMap<JobName, JobConfig>,
        order: Vec<JobName>,
    ) -> Self {
        Self { pool, job, order }
    }

    pub fn pool(&self) -> &PoolSection {
        &self.pool
    }

    pub fn jobs(&self) -> &BTreeMap<JobName, JobConfig> {
        &self.job
    }

    pub fn job(&self, name: &str) -> Option<&JobConfig> {
        self.job.get(name)
    }

    /// Job names in dependency order.
    pub fn topological_order(&self) -> &[JobName] {
        &self.order
    }
}

/// `[pool]` section.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct PoolSection {
    /// Number of worker threads; defaults to the available parallelism.
    #[serde(default)]
    pub threads: Option<usize>,

    /// Prefix for worker thread names.
    #[serde(default)]
    pub thread_name_prefix: Option<String>,
}

impl PoolSection {
    /// Configure `pool` from this section. Unset fields keep the pool's
    /// defaults.
    pub fn apply(&self, pool: &ThreadPool) {
        if let Some(threads) = self.threads {
            pool.set_thread_count(threads);
        }
        if let Some(ref prefix) = self.thread_name_prefix {
            pool.set_thread_name_prefix(prefix.clone());
        }
    }
}

/// `[job.<name>]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct JobConfig {
    /// Shell command to run.
    pub cmd: String,

    /// Jobs that must finish (successfully or not) before this one starts.
    #[serde(default)]
    pub after: Vec<JobName>,

    /// `"pool"` (default) or `"off_pool"`.
    #[serde(default)]
    pub lane: Lane,
}
