//! Worker-side task queue over the durable queue repository.

use std::sync::Arc;

use chrono::{Duration, Utc};
use serde::{Deserialize, Serialize};
use tracing;
use uuid::Uuid;

use zenbridge_core::config::QueueConfig;
use zenbridge_core::result::AppResult;
use zenbridge_database::repositories::queue::QueueRepository;
use zenbridge_entity::queue::{MessageState, QueuedMessage};

/// Task queue bound to one named queue and one worker identity.
#[derive(Debug, Clone)]
pub struct TaskQueue {
    /// Queue repository for database persistence.
    repo: Arc<QueueRepository>,
    /// Name of the consumed queue.
    queue: String,
    /// Worker identifier recorded on claimed messages.
    worker_id: String,
    /// How long a delivery may stay unacknowledged before it is
    /// considered abandoned.
    visibility_timeout: Duration,
}

impl TaskQueue {
    /// Create a new task queue.
    pub fn new(repo: Arc<QueueRepository>, config: &QueueConfig, worker_id: String) -> Self {
        Self {
            repo,
            queue: config.name.clone(),
            worker_id,
            visibility_timeout: Duration::seconds(config.visibility_timeout_seconds as i64),
        }
    }

    /// The worker identifier this queue claims messages under.
    pub fn worker_id(&self) -> &str {
        &self.worker_id
    }

    /// Claim the next message, if any.
    pub async fn claim(&self) -> AppResult<Option<QueuedMessage>> {
        let message = self.repo.claim_next(&self.queue, &self.worker_id).await?;

        if let Some(message) = &message {
            if message.is_redelivery() {
                tracing::warn!(
                    message_id = %message.id,
                    attempts = message.attempts,
                    "Claimed a redelivered message"
                );
            } else {
                tracing::debug!(message_id = %message.id, "Claimed message");
            }
        }

        Ok(message)
    }

    /// Acknowledge a processed message, removing it from the queue.
    pub async fn ack(&self, message_id: Uuid) -> AppResult<()> {
        self.repo.ack(message_id).await?;
        tracing::debug!(message_id = %message_id, "Message acknowledged");
        Ok(())
    }

    /// Release messages whose worker disconnected before acknowledging.
    ///
    /// Called on worker startup so that deliveries abandoned by a crashed
    /// worker become claimable again.
    pub async fn recover_stale(&self) -> AppResult<u64> {
        let released = self
            .repo
            .release_stale(&self.queue, Utc::now() - self.visibility_timeout)
            .await?;

        if released > 0 {
            tracing::warn!(released, "Released stale deliveries back to the queue");
        }
        Ok(released)
    }

    /// Get queue statistics.
    pub async fn stats(&self) -> AppResult<QueueStats> {
        let pending = self
            .repo
            .count_by_state(&self.queue, MessageState::Pending)
            .await?;
        let in_flight = self
            .repo
            .count_by_state(&self.queue, MessageState::Delivered)
            .await?;

        Ok(QueueStats {
            pending,
            in_flight,
            worker_id: self.worker_id.clone(),
        })
    }
}

/// Queue statistics.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueueStats {
    /// Number of pending messages.
    pub pending: i64,
    /// Number of delivered, unacknowledged messages.
    pub in_flight: i64,
    /// Current worker identifier.
    pub worker_id: String,
}

/// Generate a worker identifier for this process.
pub fn default_worker_id() -> String {
    format!("worker-{}", &Uuid::new_v4().to_string()[..8])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_worker_id_is_unique_and_prefixed() {
        let a = default_worker_id();
        let b = default_worker_id();
        assert!(a.starts_with("worker-"));
        assert_ne!(a, b);
    }
}
