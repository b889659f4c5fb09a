//! Upload worker configuration.

use serde::{Deserialize, Serialize};

/// Upload worker configuration.
///
/// The worker is a single sequential consumption loop; scaling out means
/// running more worker processes, not raising in-process concurrency.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkerConfig {
    /// Whether the worker is enabled.
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Interval in seconds between queue polls when the queue is empty.
    #[serde(default = "default_poll_interval")]
    pub poll_interval_seconds: u64,
    /// Optional explicit worker identifier. Defaults to a generated one.
    #[serde(default)]
    pub worker_id: Option<String>,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            enabled: default_true(),
            poll_interval_seconds: default_poll_interval(),
            worker_id: None,
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_poll_interval() -> u64 {
    5
}
