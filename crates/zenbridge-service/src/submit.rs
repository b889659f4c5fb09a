//! Job submission service — creates transfer records and publishes upload
//! tasks to the durable queue.

use std::sync::Arc;

use tracing::{info, warn};

use zenbridge_core::config::QueueConfig;
use zenbridge_core::error::AppError;
use zenbridge_core::result::AppResult;
use zenbridge_database::repositories::queue::QueueRepository;
use zenbridge_database::repositories::transfer::TransferRepository;
use zenbridge_entity::transfer::{CreateTransfer, UploadTask};
use zenbridge_zenodo::models::{Creator, NewDepositionMetadata};
use zenbridge_zenodo::ZenodoClient;

/// Request to submit a file transfer to an existing deposition.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct SubmitRequest {
    /// Username of the submitting user.
    pub username: String,
    /// Path of the source file on the local filesystem.
    pub source_path: String,
    /// Name the file receives in the target deposition.
    pub filename: String,
    /// Zenodo access token of the submitting user.
    pub zenodo_token: String,
    /// Target deposition identifier.
    pub deposition_id: i64,
}

/// Request to create a new deposition and submit a file transfer into it.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct CreateDepositionRequest {
    /// Username of the submitting user.
    pub username: String,
    /// Path of the source file on the local filesystem.
    pub source_path: String,
    /// Name the file receives in the new deposition.
    pub filename: String,
    /// Zenodo access token of the submitting user.
    pub zenodo_token: String,
    /// Title of the new deposition.
    pub deposition_name: String,
    /// Description of the new deposition.
    pub deposition_description: String,
    /// Creator name recorded on the deposition, `"Family, Given"`.
    pub creator_name: String,
    /// Creator affiliation recorded on the deposition.
    pub creator_affiliation: String,
}

/// Accepts transfer requests, creates the pending record, and publishes the
/// upload task.
#[derive(Clone)]
pub struct SubmitService {
    /// Transfer record repository.
    transfer_repo: Arc<TransferRepository>,
    /// Durable queue repository.
    queue_repo: Arc<QueueRepository>,
    /// Zenodo API client.
    zenodo: Arc<ZenodoClient>,
    /// Queue configuration.
    queue_config: QueueConfig,
}

impl std::fmt::Debug for SubmitService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SubmitService").finish()
    }
}

impl SubmitService {
    /// Creates a new submit service.
    pub fn new(
        transfer_repo: Arc<TransferRepository>,
        queue_repo: Arc<QueueRepository>,
        zenodo: Arc<ZenodoClient>,
        queue_config: QueueConfig,
    ) -> Self {
        Self {
            transfer_repo,
            queue_repo,
            zenodo,
            queue_config,
        }
    }

    /// Submit a file transfer to an existing deposition.
    ///
    /// Verifies the source file, resolves the deposition title, inserts the
    /// `pending` transfer record, and publishes the upload task. Returns
    /// the new transfer identifier.
    pub async fn submit(&self, req: SubmitRequest) -> AppResult<i64> {
        let deposition = self
            .zenodo
            .get_deposition(&req.zenodo_token, req.deposition_id)
            .await?;
        let deposition_name = deposition
            .title()
            .ok_or_else(|| {
                AppError::remote_service(format!(
                    "Deposition {} has no title",
                    req.deposition_id
                ))
            })?
            .to_string();

        self.submit_to_deposition(req, deposition_name).await
    }

    /// Create a new restricted-access dataset deposition, then submit a
    /// file transfer into it.
    pub async fn create_deposition_and_submit(
        &self,
        req: CreateDepositionRequest,
    ) -> AppResult<i64> {
        let metadata = NewDepositionMetadata::restricted_dataset(
            req.deposition_name.clone(),
            req.deposition_description.clone(),
            vec![Creator {
                name: req.creator_name.clone(),
                affiliation: req.creator_affiliation.clone(),
            }],
        );

        let deposition = self
            .zenodo
            .create_deposition(&req.zenodo_token, metadata)
            .await?;

        self.submit_to_deposition(
            SubmitRequest {
                username: req.username,
                source_path: req.source_path,
                filename: req.filename,
                zenodo_token: req.zenodo_token,
                deposition_id: deposition.id,
            },
            req.deposition_name,
        )
        .await
    }

    /// Shared submit path once the deposition id and title are known.
    ///
    /// The record insert happens before the publish; if the publish fails
    /// the record stays `pending` with no message, which the stale-pending
    /// operator query surfaces.
    async fn submit_to_deposition(
        &self,
        req: SubmitRequest,
        deposition_name: String,
    ) -> AppResult<i64> {
        ensure_source_exists(&req.source_path).await?;

        let transfer = self
            .transfer_repo
            .create(&CreateTransfer {
                username: req.username.clone(),
                file_path: req.source_path.clone(),
                filename: req.filename.clone(),
                deposition_id: req.deposition_id,
                deposition_name: deposition_name.clone(),
            })
            .await?;

        let task = UploadTask {
            username: req.username,
            file_path: req.source_path,
            filename: req.filename,
            zenodo_token: req.zenodo_token,
            deposition_id: req.deposition_id,
            deposition_name,
            transfer_id: transfer.id,
        };

        let payload = serde_json::to_value(&task)?;
        if let Err(e) = self
            .queue_repo
            .publish(&self.queue_config.name, &payload)
            .await
        {
            warn!(
                transfer_id = transfer.id,
                error = %e,
                "Transfer record created but task publish failed; record stays pending"
            );
            return Err(e);
        }

        info!(
            transfer_id = transfer.id,
            username = %task.username,
            filename = %task.filename,
            deposition_id = task.deposition_id,
            "Upload task queued"
        );
        Ok(transfer.id)
    }
}

/// Fail fast with `SourceNotFound` when the source file is missing.
///
/// Checked before the record insert so that a bad submission leaves no
/// partial state behind.
async fn ensure_source_exists(path: &str) -> AppResult<()> {
    match tokio::fs::metadata(path).await {
        Ok(meta) if meta.is_file() => Ok(()),
        Ok(_) => Err(AppError::source_not_found(format!(
            "Source path {path} is not a regular file"
        ))),
        Err(_) => Err(AppError::source_not_found(format!(
            "Source file {path} does not exist"
        ))),
    }
}
