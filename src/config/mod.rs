// src/config/mod.rs

//! Job file loading and validation for the `dagpool` runner.
//!
//! Responsibilities:
//! - Define the TOML-backed data model (`model.rs`).
//! - Load a job file from disk (`loader.rs`).
//! - Validate it and compute a dependency order (`validate.rs`).

pub mod loader;
pub mod model;
pub mod validate;

pub use loader::{default_config_path, load_and_validate, load_from_path, parse_str};
pub use model::{JobConfig, JobName, JobsFile, PoolSection, RawJobsFile};
pub use validate::validate_jobs;
