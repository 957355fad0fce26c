use serde::Deserialize;

/// Which lane a job from the job file is dispatched on.
///
/// - `Pool`: run on one of the fixed worker threads (default).
/// - `OffPool`: run on a dedicated thread of its own, outside the worker
///   budget. Meant for jobs that mostly wait (network, subprocess I/O) and
///   would otherwise hold a worker hostage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Lane {
    Pool,
    OffPool,
}

impl Default for Lane {
    fn default() -> Self {
        Lane::Pool
    }
}
