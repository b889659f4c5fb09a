//! Worker runner — the consumption loop that claims and processes queued
//! messages one at a time.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::watch;
use tokio::time;
use tracing;

use zenbridge_core::config::WorkerConfig;
use zenbridge_core::result::AppResult;
use zenbridge_entity::queue::QueuedMessage;

use crate::queue::TaskQueue;

/// Trait for message handler implementations.
///
/// `handle` returning `Ok` means the message was processed (whether or not
/// the upload itself succeeded) and must be acknowledged. An `Err` means
/// processing could not record an outcome; the message is left delivered
/// and will be redelivered after the visibility timeout.
#[async_trait]
pub trait TaskHandler: Send + Sync + std::fmt::Debug {
    /// Process one claimed message.
    async fn handle(&self, message: &QueuedMessage) -> AppResult<()>;
}

/// Single-threaded consumption loop bound to one task queue.
///
/// One message is claimed, processed fully (including the blocking file
/// transfer), and acknowledged before the next claim; there is no
/// in-process concurrency. Scaling out means running more worker
/// processes against the same queue.
#[derive(Debug)]
pub struct WorkerRunner {
    /// Task queue to consume from.
    queue: Arc<TaskQueue>,
    /// Handler for claimed messages.
    handler: Arc<dyn TaskHandler>,
    /// Worker configuration.
    config: WorkerConfig,
}

impl WorkerRunner {
    /// Create a new worker runner.
    pub fn new(queue: Arc<TaskQueue>, handler: Arc<dyn TaskHandler>, config: WorkerConfig) -> Self {
        Self {
            queue,
            handler,
            config,
        }
    }

    /// Start the consumption loop; runs until the cancel signal is
    /// received. The in-flight message, if any, is finished before the
    /// loop exits.
    pub async fn run(&self, mut cancel: watch::Receiver<bool>) {
        tracing::info!(
            worker_id = %self.queue.worker_id(),
            poll_interval = self.config.poll_interval_seconds,
            "Worker started"
        );

        match self.queue.recover_stale().await {
            Ok(_) => {}
            Err(e) => tracing::error!(error = %e, "Failed to recover stale deliveries"),
        }

        match self.queue.stats().await {
            Ok(stats) => tracing::info!(
                pending = stats.pending,
                in_flight = stats.in_flight,
                "Queue state at startup"
            ),
            Err(e) => tracing::warn!(error = %e, "Failed to read queue stats"),
        }

        let poll_interval = Duration::from_secs(self.config.poll_interval_seconds);

        loop {
            if *cancel.borrow() {
                break;
            }

            match self.claim_and_process().await {
                // A message was processed; immediately look for the next.
                Ok(true) => continue,
                Ok(false) => {
                    // Idle poll: reclaim deliveries abandoned past the
                    // visibility timeout before going back to sleep.
                    if let Err(e) = self.queue.recover_stale().await {
                        tracing::error!(error = %e, "Failed to recover stale deliveries");
                    }
                }
                Err(e) => {
                    tracing::error!(error = %e, "Queue claim failed");
                }
            }

            tokio::select! {
                _ = cancel.changed() => {
                    if *cancel.borrow() {
                        break;
                    }
                }
                _ = time::sleep(poll_interval) => {}
            }
        }

        tracing::info!(worker_id = %self.queue.worker_id(), "Worker shut down");
    }

    /// Claim one message and process it fully. Returns whether a message
    /// was available.
    async fn claim_and_process(&self) -> AppResult<bool> {
        let Some(message) = self.queue.claim().await? else {
            return Ok(false);
        };

        tracing::info!(
            message_id = %message.id,
            attempts = message.attempts,
            "Processing message"
        );

        match self.handler.handle(&message).await {
            Ok(()) => {
                if let Err(e) = self.queue.ack(message.id).await {
                    tracing::error!(
                        message_id = %message.id,
                        error = %e,
                        "Failed to acknowledge processed message"
                    );
                }
            }
            Err(e) => {
                // No outcome was recorded; leave the message delivered so
                // the visibility timeout returns it to the queue.
                tracing::error!(
                    message_id = %message.id,
                    error = %e,
                    "Message processing failed before an outcome could be recorded"
                );
            }
        }

        Ok(true)
    }
}
