//! Durable queue configuration.

use serde::{Deserialize, Serialize};

/// Durable upload queue configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueueConfig {
    /// Name of the upload queue.
    #[serde(default = "default_queue_name")]
    pub name: String,
    /// Seconds a claimed message may stay unacknowledged before it is
    /// considered abandoned and returned to the queue.
    #[serde(default = "default_visibility_timeout")]
    pub visibility_timeout_seconds: u64,
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            name: default_queue_name(),
            visibility_timeout_seconds: default_visibility_timeout(),
        }
    }
}

fn default_queue_name() -> String {
    "zenodo_upload".to_string()
}

fn default_visibility_timeout() -> u64 {
    600
}
