#![allow(dead_code)]

use std::collections::BTreeMap;

use dagpool::config::{JobConfig, JobsFile, PoolSection, RawJobsFile};
use dagpool::types::Lane;

/// Builder for `JobsFile` to simplify test setup.
pub struct JobsFileBuilder {
    raw: RawJobsFile,
}

impl JobsFileBuilder {
    pub fn new() -> Self {
        Self {
            raw: RawJobsFile {
                pool: PoolSection::default(),
                job: BTreeMap::new(),
            },
        }
    }

    pub fn with_job(mut self, name: &str, job: JobConfig) -> Self {
        self.raw.job.insert(name.to_string(), job);
        self
    }

    pub fn with_threads(mut self, threads: usize) -> Self {
        self.raw.pool.threads = Some(threads);
        self
    }

    pub fn with_thread_name_prefix(mut self, prefix: &str) -> Self {
        self.raw.pool.thread_name_prefix = Some(prefix.to_string());
        self
    }

    /// The unvalidated file, for tests that exercise validation itself.
    pub fn build_raw(self) -> RawJobsFile {
        self.raw
    }

    pub fn build(self) -> JobsFile {
        JobsFile::try_from(self.raw).expect("Failed to build valid job file from builder")
    }
}

impl Default for JobsFileBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Builder for `JobConfig`.
pub struct JobConfigBuilder {
    job: JobConfig,
}

impl JobConfigBuilder {
    pub fn new(cmd: &str) -> Self {
        Self {
            job: JobConfig {
                cmd: cmd.to_string(),
                after: vec![],
                lane: Lane::Pool,
            },
        }
    }

    pub fn after(mut self, dep: &str) -> Self {
        self.job.after.push(dep.to_string());
        self
    }

    pub fn off_pool(mut self) -> Self {
        self.job.lane = Lane::OffPool;
        self
    }

    pub fn build(self) -> JobConfig {
        self.job
    }
}
