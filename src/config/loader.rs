// src/config/loader.rs

use std::fs;
use std::path::{Path, PathBuf};

use crate::config::model::{JobsFile, RawJobsFile};
use crate::errors::Result;

/// Load a job file from a given path and return the raw `RawJobsFile`.
///
/// This only performs TOML deserialization; it does **not** perform semantic
/// validation (unknown dependencies, cycles). Use [`load_and_validate`] for
/// that.
pub fn load_from_path(path: impl AsRef<Path>) -> Result<RawJobsFile> {
    let path = path.as_ref();
    let contents = fs::read_to_string(path)?;
    parse_str(&contents)
}

/// Parse job file contents without validating them.
pub fn parse_str(contents: &str) -> Result<RawJobsFile> {
    let jobs: RawJobsFile = toml::from_str(contents)?;
    Ok(jobs)
}

/// Load a job file from path and validate it.
///
/// - Reads TOML.
/// - Applies defaults (handled by `serde` + `Default` impls).
/// - Checks for:
///   - an empty job list,
///   - `[pool]` sanity,
///   - unknown or self-referencing `after` entries,
///   - cycles.
pub fn load_and_validate(path: impl AsRef<Path>) -> Result<JobsFile> {
    let raw = load_from_path(&path)?;
    JobsFile::try_from(raw)
}

/// Default job file path: `Dagpool.toml` in the current working directory.
pub fn default_config_path() -> PathBuf {
    PathBuf::from("Dagpool.toml")
}
