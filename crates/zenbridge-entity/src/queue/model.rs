//! Queued message entity model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Delivery state of a queued message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "message_state", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum MessageState {
    /// Published and waiting to be claimed by a worker.
    Pending,
    /// Claimed by a worker, not yet acknowledged. Acknowledged messages
    /// are deleted, so this state only ever holds in-flight work.
    Delivered,
}

impl MessageState {
    /// Return the state as a lowercase string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Delivered => "delivered",
        }
    }
}

/// A durable queue row holding one published message until a worker
/// acknowledges it.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct QueuedMessage {
    /// Unique message identifier.
    pub id: Uuid,
    /// Name of the queue the message belongs to.
    pub queue: String,
    /// The serialized task payload.
    pub payload: serde_json::Value,
    /// Current delivery state.
    pub state: MessageState,
    /// Number of deliveries so far (1 on first claim).
    pub attempts: i32,
    /// Identifier of the worker holding the message, if delivered.
    pub worker_id: Option<String>,
    /// When the message was published.
    pub published_at: DateTime<Utc>,
    /// When the message was last delivered to a worker.
    pub delivered_at: Option<DateTime<Utc>>,
}

impl QueuedMessage {
    /// Whether the message has been delivered more than once.
    pub fn is_redelivery(&self) -> bool {
        self.attempts > 1
    }
}
