//! Durable queue repository implementation.
//!
//! The queue is a PostgreSQL table: publish inserts a row, a claim flips
//! the oldest `pending` row to `delivered` under `FOR UPDATE SKIP LOCKED`,
//! and an acknowledgment deletes the row. Rows survive process restarts,
//! and `delivered` rows whose worker died are released back to `pending`,
//! which yields at-least-once delivery.

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use zenbridge_core::error::{AppError, ErrorKind};
use zenbridge_core::result::AppResult;
use zenbridge_entity::queue::{MessageState, QueuedMessage};

/// Repository for the durable message queue.
#[derive(Debug, Clone)]
pub struct QueueRepository {
    pool: PgPool,
}

impl QueueRepository {
    /// Create a new queue repository.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Publish a message to the named queue.
    pub async fn publish(
        &self,
        queue: &str,
        payload: &serde_json::Value,
    ) -> AppResult<QueuedMessage> {
        sqlx::query_as::<_, QueuedMessage>(
            "INSERT INTO zenodo_queue_messages (queue, payload) VALUES ($1, $2) RETURNING *",
        )
        .bind(queue)
        .bind(payload)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Queue, "Failed to publish message", e))
    }

    /// Claim the oldest pending message from a queue (FIFO publish order).
    ///
    /// `SKIP LOCKED` guarantees two workers can never claim the same row;
    /// claiming one message at a time is the prefetch-1 discipline that
    /// bounds in-flight work per worker.
    pub async fn claim_next(
        &self,
        queue: &str,
        worker_id: &str,
    ) -> AppResult<Option<QueuedMessage>> {
        sqlx::query_as::<_, QueuedMessage>(
            "UPDATE zenodo_queue_messages SET state = 'delivered', worker_id = $2, \
             delivered_at = NOW(), attempts = attempts + 1 \
             WHERE id = ( \
                SELECT id FROM zenodo_queue_messages \
                WHERE queue = $1 AND state = 'pending' \
                ORDER BY published_at ASC \
                FOR UPDATE SKIP LOCKED \
                LIMIT 1 \
             ) RETURNING *",
        )
        .bind(queue)
        .bind(worker_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Queue, "Failed to claim message", e))
    }

    /// Acknowledge a message, removing it from the queue.
    ///
    /// Idempotent: acknowledging a message that is already gone is a no-op.
    pub async fn ack(&self, id: Uuid) -> AppResult<()> {
        sqlx::query("DELETE FROM zenodo_queue_messages WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                AppError::with_source(ErrorKind::Queue, "Failed to acknowledge message", e)
            })?;
        Ok(())
    }

    /// Release delivered-but-unacknowledged messages older than the given
    /// time back to `pending`.
    ///
    /// This is the redelivery path: a worker that disconnected before
    /// acknowledging leaves its message in `delivered`, and the next worker
    /// start (or a periodic sweep) returns it to the queue.
    pub async fn release_stale(
        &self,
        queue: &str,
        delivered_before: DateTime<Utc>,
    ) -> AppResult<u64> {
        let result = sqlx::query(
            "UPDATE zenodo_queue_messages SET state = 'pending', worker_id = NULL, \
             delivered_at = NULL \
             WHERE queue = $1 AND state = 'delivered' AND delivered_at < $2",
        )
        .bind(queue)
        .bind(delivered_before)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Queue, "Failed to release stale messages", e)
        })?;
        Ok(result.rows_affected())
    }

    /// Count messages in a queue by state.
    pub async fn count_by_state(&self, queue: &str, state: MessageState) -> AppResult<i64> {
        sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM zenodo_queue_messages WHERE queue = $1 AND state = $2",
        )
        .bind(queue)
        .bind(state)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Queue, "Failed to count messages", e))
    }
}
