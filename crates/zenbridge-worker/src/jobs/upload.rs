//! Upload job handler — executes the upload protocol for one claimed
//! message and records the outcome on the transfer record.

use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use tracing;

use zenbridge_core::result::AppResult;
use zenbridge_database::repositories::transfer::TransferRepository;
use zenbridge_entity::queue::QueuedMessage;
use zenbridge_entity::transfer::{Transfer, TransferStatus, UploadTask};
use zenbridge_zenodo::ZenodoClient;

use crate::runner::TaskHandler;

/// Store operations the upload handler needs, decoupled from the
/// concrete repository.
#[async_trait]
pub trait TransferStore: Send + Sync + std::fmt::Debug {
    /// Load a transfer record by ID.
    async fn find(&self, id: i64) -> AppResult<Option<Transfer>>;

    /// Set the status and response text of a transfer record.
    async fn set_status(
        &self,
        id: i64,
        status: TransferStatus,
        response: Option<&str>,
    ) -> AppResult<()>;
}

#[async_trait]
impl TransferStore for TransferRepository {
    async fn find(&self, id: i64) -> AppResult<Option<Transfer>> {
        self.find_by_id(id).await
    }

    async fn set_status(
        &self,
        id: i64,
        status: TransferStatus,
        response: Option<&str>,
    ) -> AppResult<()> {
        self.update_status(id, status, response).await
    }
}

/// Remote operations the upload handler needs.
#[async_trait]
pub trait DepositClient: Send + Sync + std::fmt::Debug {
    /// Resolve the upload bucket URL for a deposition.
    async fn fetch_bucket_url(&self, token: &str, deposition_id: i64) -> AppResult<String>;

    /// Stream a local file to the bucket and return the raw response body.
    async fn upload(
        &self,
        token: &str,
        bucket_url: &str,
        filename: &str,
        source_path: &Path,
    ) -> AppResult<String>;
}

#[async_trait]
impl DepositClient for ZenodoClient {
    async fn fetch_bucket_url(&self, token: &str, deposition_id: i64) -> AppResult<String> {
        let deposition = self.get_deposition(token, deposition_id).await?;
        deposition
            .bucket_url()
            .map(str::to_string)
            .ok_or_else(|| {
                zenbridge_core::AppError::remote_service(format!(
                    "Deposition {deposition_id} has no bucket link"
                ))
            })
    }

    async fn upload(
        &self,
        token: &str,
        bucket_url: &str,
        filename: &str,
        source_path: &Path,
    ) -> AppResult<String> {
        self.upload_file(token, bucket_url, filename, source_path)
            .await
    }
}

/// Handles upload task messages.
///
/// Every claimed message drives its transfer record to a terminal status:
/// `completed` when the remote service accepted the file, `failed` on any
/// error. A failed upload is still a processed message: it is
/// acknowledged and never retried automatically.
#[derive(Debug)]
pub struct UploadJobHandler {
    /// Transfer record store.
    store: Arc<dyn TransferStore>,
    /// Remote deposit client.
    client: Arc<dyn DepositClient>,
}

impl UploadJobHandler {
    /// Create a new upload job handler.
    pub fn new(store: Arc<dyn TransferStore>, client: Arc<dyn DepositClient>) -> Self {
        Self { store, client }
    }

    /// Fetch the bucket URL and stream the file to it.
    async fn execute_upload(&self, task: &UploadTask) -> AppResult<String> {
        let bucket_url = self
            .client
            .fetch_bucket_url(&task.zenodo_token, task.deposition_id)
            .await?;

        self.client
            .upload(
                &task.zenodo_token,
                &bucket_url,
                &task.filename,
                Path::new(&task.file_path),
            )
            .await
    }
}

#[async_trait]
impl TaskHandler for UploadJobHandler {
    async fn handle(&self, message: &QueuedMessage) -> AppResult<()> {
        let task: UploadTask = match serde_json::from_value(message.payload.clone()) {
            Ok(task) => task,
            Err(e) => {
                // A payload that cannot be decoded can never succeed;
                // acknowledge it instead of looping forever.
                tracing::error!(
                    message_id = %message.id,
                    error = %e,
                    "Discarding undecodable task payload"
                );
                return Ok(());
            }
        };

        let transfer = match self.store.find(task.transfer_id).await? {
            Some(transfer) => transfer,
            None => {
                tracing::error!(
                    transfer_id = task.transfer_id,
                    "Task references a missing transfer record; discarding"
                );
                return Ok(());
            }
        };

        // Delivery is at-least-once: a redelivered message may find its
        // record already finished. Re-running the upload would duplicate
        // remote content, so log the anomaly and acknowledge.
        if transfer.status.is_terminal() {
            tracing::warn!(
                transfer_id = transfer.id,
                status = %transfer.status,
                "Transfer already in a terminal status; skipping re-upload"
            );
            return Ok(());
        }

        if transfer.status == TransferStatus::InProgress {
            tracing::warn!(
                transfer_id = transfer.id,
                "Transfer already in progress from an interrupted delivery; re-running"
            );
        }

        self.store
            .set_status(task.transfer_id, TransferStatus::InProgress, None)
            .await?;

        match self.execute_upload(&task).await {
            Ok(response) => {
                self.store
                    .set_status(task.transfer_id, TransferStatus::Completed, Some(&response))
                    .await?;
                tracing::info!(
                    transfer_id = task.transfer_id,
                    username = %task.username,
                    filename = %task.filename,
                    deposition_id = task.deposition_id,
                    "File uploaded to Zenodo"
                );
            }
            Err(e) => {
                let error_text = e.to_string();
                self.store
                    .set_status(
                        task.transfer_id,
                        TransferStatus::Failed,
                        Some(&error_text),
                    )
                    .await?;
                tracing::error!(
                    transfer_id = task.transfer_id,
                    username = %task.username,
                    error = %error_text,
                    "Upload failed"
                );
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::collections::HashMap;
    use std::sync::Mutex;

    use chrono::Utc;
    use uuid::Uuid;

    use zenbridge_core::error::{AppError, ErrorKind};

    /// In-memory transfer store recording every status update.
    #[derive(Debug, Default)]
    struct MockStore {
        records: Mutex<HashMap<i64, Transfer>>,
        updates: Mutex<Vec<(i64, TransferStatus, Option<String>)>>,
        fail_updates: bool,
    }

    impl MockStore {
        fn with_record(transfer: Transfer) -> Self {
            let store = Self::default();
            store
                .records
                .lock()
                .unwrap()
                .insert(transfer.id, transfer);
            store
        }

        fn updates(&self) -> Vec<(i64, TransferStatus, Option<String>)> {
            self.updates.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl TransferStore for MockStore {
        async fn find(&self, id: i64) -> AppResult<Option<Transfer>> {
            Ok(self.records.lock().unwrap().get(&id).cloned())
        }

        async fn set_status(
            &self,
            id: i64,
            status: TransferStatus,
            response: Option<&str>,
        ) -> AppResult<()> {
            if self.fail_updates {
                return Err(AppError::database("store unreachable"));
            }
            self.updates
                .lock()
                .unwrap()
                .push((id, status, response.map(str::to_string)));
            if let Some(record) = self.records.lock().unwrap().get_mut(&id) {
                record.status = status;
                record.zenodo_response = response.map(str::to_string);
            }
            Ok(())
        }
    }

    /// Deposit client stub with scripted outcomes and an upload counter.
    #[derive(Debug)]
    struct MockClient {
        bucket_result: Result<String, ErrorKind>,
        upload_result: Result<String, String>,
        upload_calls: Mutex<u32>,
    }

    impl MockClient {
        fn succeeding() -> Self {
            Self {
                bucket_result: Ok("https://remote/bucket/X".into()),
                upload_result: Ok(r#"{"ok":true}"#.into()),
                upload_calls: Mutex::new(0),
            }
        }

        fn upload_calls(&self) -> u32 {
            *self.upload_calls.lock().unwrap()
        }
    }

    #[async_trait]
    impl DepositClient for MockClient {
        async fn fetch_bucket_url(&self, _token: &str, id: i64) -> AppResult<String> {
            match &self.bucket_result {
                Ok(url) => Ok(url.clone()),
                Err(kind) => Err(AppError::new(
                    *kind,
                    format!("metadata fetch failed for deposition {id}"),
                )),
            }
        }

        async fn upload(
            &self,
            _token: &str,
            _bucket_url: &str,
            _filename: &str,
            _source_path: &Path,
        ) -> AppResult<String> {
            *self.upload_calls.lock().unwrap() += 1;
            match &self.upload_result {
                Ok(body) => Ok(body.clone()),
                Err(text) => Err(AppError::remote_service(text.clone())),
            }
        }
    }

    fn pending_transfer(id: i64) -> Transfer {
        Transfer {
            id,
            username: "alice".into(),
            file_path: "/data/res/abc".into(),
            filename: "abc.csv".into(),
            deposition_id: 42,
            deposition_name: "My dataset".into(),
            status: TransferStatus::Pending,
            zenodo_response: None,
            created_at: Utc::now(),
        }
    }

    fn message_for(transfer: &Transfer) -> QueuedMessage {
        let task = UploadTask {
            username: transfer.username.clone(),
            file_path: transfer.file_path.clone(),
            filename: transfer.filename.clone(),
            zenodo_token: "tok".into(),
            deposition_id: transfer.deposition_id,
            deposition_name: transfer.deposition_name.clone(),
            transfer_id: transfer.id,
        };
        QueuedMessage {
            id: Uuid::new_v4(),
            queue: "zenodo_upload".into(),
            payload: serde_json::to_value(&task).unwrap(),
            state: zenbridge_entity::queue::MessageState::Delivered,
            attempts: 1,
            worker_id: Some("worker-test".into()),
            published_at: Utc::now(),
            delivered_at: Some(Utc::now()),
        }
    }

    #[tokio::test]
    async fn test_successful_upload_completes_record() {
        let transfer = pending_transfer(7);
        let message = message_for(&transfer);
        let store = Arc::new(MockStore::with_record(transfer));
        let client = Arc::new(MockClient::succeeding());
        let handler = UploadJobHandler::new(store.clone(), client.clone());

        handler.handle(&message).await.unwrap();

        let updates = store.updates();
        assert_eq!(updates.len(), 2);
        assert_eq!(updates[0], (7, TransferStatus::InProgress, None));
        assert_eq!(
            updates[1],
            (7, TransferStatus::Completed, Some(r#"{"ok":true}"#.into()))
        );
        assert_eq!(client.upload_calls(), 1);
    }

    #[tokio::test]
    async fn test_remote_failure_marks_record_failed_but_succeeds() {
        let transfer = pending_transfer(8);
        let message = message_for(&transfer);
        let store = Arc::new(MockStore::with_record(transfer));
        let client = Arc::new(MockClient {
            upload_result: Err("HTTP 500 Internal Server Error".into()),
            ..MockClient::succeeding()
        });
        let handler = UploadJobHandler::new(store.clone(), client);

        // Ok means the message is acknowledged even though the upload failed.
        handler.handle(&message).await.unwrap();

        let updates = store.updates();
        assert_eq!(updates[1].1, TransferStatus::Failed);
        assert!(updates[1].2.as_deref().unwrap().contains("HTTP 500"));
    }

    #[tokio::test]
    async fn test_metadata_fetch_failure_marks_record_failed() {
        let transfer = pending_transfer(9);
        let message = message_for(&transfer);
        let store = Arc::new(MockStore::with_record(transfer));
        let client = Arc::new(MockClient {
            bucket_result: Err(ErrorKind::RemoteService),
            ..MockClient::succeeding()
        });
        let handler = UploadJobHandler::new(store.clone(), client.clone());

        handler.handle(&message).await.unwrap();

        let updates = store.updates();
        assert_eq!(updates[1].1, TransferStatus::Failed);
        assert!(updates[1].2.as_deref().unwrap().contains("metadata fetch"));
        assert_eq!(client.upload_calls(), 0);
    }

    #[tokio::test]
    async fn test_terminal_record_is_not_reuploaded() {
        let mut transfer = pending_transfer(10);
        transfer.status = TransferStatus::Completed;
        transfer.zenodo_response = Some(r#"{"ok":true}"#.into());
        let message = message_for(&transfer);
        let store = Arc::new(MockStore::with_record(transfer));
        let client = Arc::new(MockClient::succeeding());
        let handler = UploadJobHandler::new(store.clone(), client.clone());

        handler.handle(&message).await.unwrap();

        assert!(store.updates().is_empty());
        assert_eq!(client.upload_calls(), 0);
    }

    #[tokio::test]
    async fn test_in_progress_record_is_rerun() {
        let mut transfer = pending_transfer(11);
        transfer.status = TransferStatus::InProgress;
        let message = message_for(&transfer);
        let store = Arc::new(MockStore::with_record(transfer));
        let client = Arc::new(MockClient::succeeding());
        let handler = UploadJobHandler::new(store.clone(), client.clone());

        handler.handle(&message).await.unwrap();

        assert_eq!(client.upload_calls(), 1);
        let updates = store.updates();
        assert_eq!(updates.last().unwrap().1, TransferStatus::Completed);
    }

    #[tokio::test]
    async fn test_undecodable_payload_is_discarded() {
        let store = Arc::new(MockStore::default());
        let client = Arc::new(MockClient::succeeding());
        let handler = UploadJobHandler::new(store.clone(), client.clone());

        let message = QueuedMessage {
            id: Uuid::new_v4(),
            queue: "zenodo_upload".into(),
            payload: serde_json::json!({"not": "a task"}),
            state: zenbridge_entity::queue::MessageState::Delivered,
            attempts: 1,
            worker_id: None,
            published_at: Utc::now(),
            delivered_at: None,
        };

        handler.handle(&message).await.unwrap();
        assert!(store.updates().is_empty());
        assert_eq!(client.upload_calls(), 0);
    }

    #[tokio::test]
    async fn test_missing_record_is_discarded() {
        let transfer = pending_transfer(12);
        let message = message_for(&transfer);
        // Store without the record.
        let store = Arc::new(MockStore::default());
        let client = Arc::new(MockClient::succeeding());
        let handler = UploadJobHandler::new(store.clone(), client.clone());

        handler.handle(&message).await.unwrap();
        assert_eq!(client.upload_calls(), 0);
    }

    #[tokio::test]
    async fn test_store_failure_propagates_for_redelivery() {
        let transfer = pending_transfer(13);
        let message = message_for(&transfer);
        let store = Arc::new(MockStore {
            fail_updates: true,
            ..MockStore::default()
        });
        store
            .records
            .lock()
            .unwrap()
            .insert(13, pending_transfer(13));
        let client = Arc::new(MockClient::succeeding());
        let handler = UploadJobHandler::new(store, client);

        // No outcome could be recorded, so the error must surface and the
        // message must not be acknowledged.
        let err = handler.handle(&message).await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::Database);
    }
}
