// tests/job_file.rs

use std::io::Write;
use tempfile::NamedTempFile;
use dagpool::config::{load_and_validate, parse_str, validate_jobs};
use dagpool::errors::DagpoolError;
use dagpool::types::Lane;

mod common;
use crate::common::builders::{JobConfigBuilder, JobsFileBuilder};

fn job_file(contents: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    write!(file, "{contents}").unwrap();
    file
}

#[test]
fn test_valid_file_is_ordered_by_dependencies() {
    let file = job_file(
        r#"
[pool]
threads = 3
thread_name_prefix = "build"

[job.test]
cmd = "echo test"
after = ["compile"]

[job.compile]
cmd = "echo compile"
after = ["fetch"]

[job.fetch]
cmd = "echo fetch"
lane = "off_pool"
"#,
    );

    let cfg = load_and_validate(file.path()).expect("valid job file");

    assert_eq!(cfg.pool().threads, Some(3));
    assert_eq!(cfg.pool().thread_name_prefix.as_deref(), Some("build"));
    assert_eq!(cfg.topological_order(), ["fetch", "compile", "test"]);
    assert_eq!(cfg.job("fetch").map(|j| j.lane), Some(Lane::OffPool));
    assert_eq!(cfg.job("compile").map(|j| j.lane), Some(Lane::Pool));
}

#[test]
fn test_dag_cycle_returns_structured_error() {
    let file = job_file(
        r#"
[job.A]
cmd = "echo A"
after = ["B"]

[job.B]
cmd = "echo B"
after = ["A"]
"#,
    );

    match load_and_validate(file.path()) {
        Err(DagpoolError::DagCycle(msg)) => {
            assert!(msg.contains("cycle detected"));
            assert!(msg.contains("A") || msg.contains("B"));
        }
        Err(e) => panic!("Expected DagCycle error, got: {:?}", e),
        Ok(_) => panic!("Expected error, got Ok"),
    }
}

#[test]
fn test_unknown_dependency_returns_config_error() {
    let file = job_file(
        r#"
[job.A]
cmd = "echo A"
after = ["NonExistent"]
"#,
    );

    match load_and_validate(file.path()) {
        Err(DagpoolError::ConfigError(msg)) => {
            assert!(msg.contains("unknown dependency"));
            assert!(msg.contains("NonExistent"));
        }
        Err(e) => panic!("Expected ConfigError, got: {:?}", e),
        Ok(_) => panic!("Expected error, got Ok"),
    }
}

#[test]
fn test_self_dependency_returns_config_error() {
    let raw = JobsFileBuilder::new()
        .with_job("A", JobConfigBuilder::new("echo A").after("A").build())
        .build_raw();

    match validate_jobs(&raw) {
        Err(DagpoolError::ConfigError(msg)) => assert!(msg.contains("cannot depend on itself")),
        other => panic!("Expected ConfigError, got: {:?}", other),
    }
}

#[test]
fn test_zero_threads_returns_config_error() {
    let raw = JobsFileBuilder::new()
        .with_threads(0)
        .with_job("A", JobConfigBuilder::new("echo A").build())
        .build_raw();

    match validate_jobs(&raw) {
        Err(DagpoolError::ConfigError(msg)) => assert!(msg.contains("threads must be >= 1")),
        other => panic!("Expected ConfigError, got: {:?}", other),
    }
}

#[test]
fn test_empty_file_returns_config_error() {
    let raw = parse_str("").expect("empty TOML parses");

    match validate_jobs(&raw) {
        Err(DagpoolError::ConfigError(msg)) => assert!(msg.contains("at least one")),
        other => panic!("Expected ConfigError, got: {:?}", other),
    }
}

#[test]
fn test_unknown_lane_is_a_toml_error() {
    let result = parse_str(
        r#"
[job.A]
cmd = "echo A"
lane = "sideways"
"#,
    );

    assert!(matches!(result, Err(DagpoolError::TomlError(_))), "got {:?}", result);
}

#[test]
fn test_missing_file_is_an_io_error() {
    let dir = tempfile::tempdir().unwrap();
    let result = load_and_validate(dir.path().join("missing.toml"));

    assert!(matches!(result, Err(DagpoolError::IoError(_))), "got {:?}", result);
}
