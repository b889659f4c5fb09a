//! Transfer record repository implementation.

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use zenbridge_core::error::{AppError, ErrorKind};
use zenbridge_core::result::AppResult;
use zenbridge_entity::transfer::{CreateTransfer, Transfer, TransferStatus};

/// Repository for transfer records, the durable source of truth for each
/// job's lifecycle.
#[derive(Debug, Clone)]
pub struct TransferRepository {
    pool: PgPool,
}

impl TransferRepository {
    /// Create a new transfer repository.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Insert a new transfer record in `pending` status and return it with
    /// its store-assigned identifier.
    pub async fn create(&self, data: &CreateTransfer) -> AppResult<Transfer> {
        sqlx::query_as::<_, Transfer>(
            "INSERT INTO zenodo_transfers \
             (username, file_path, filename, deposition_id, deposition_name, status) \
             VALUES ($1, $2, $3, $4, $5, 'pending') RETURNING *",
        )
        .bind(&data.username)
        .bind(&data.file_path)
        .bind(&data.filename)
        .bind(data.deposition_id)
        .bind(&data.deposition_name)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to create transfer", e))
    }

    /// Find a transfer record by ID.
    pub async fn find_by_id(&self, id: i64) -> AppResult<Option<Transfer>> {
        sqlx::query_as::<_, Transfer>("SELECT * FROM zenodo_transfers WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to find transfer", e))
    }

    /// Update the status and response text of a transfer record.
    ///
    /// Atomic with respect to the single row; the caller is responsible for
    /// only moving the status forward.
    pub async fn update_status(
        &self,
        id: i64,
        status: TransferStatus,
        response: Option<&str>,
    ) -> AppResult<()> {
        sqlx::query(
            "UPDATE zenodo_transfers SET status = $2, zenodo_response = $3 WHERE id = $1",
        )
        .bind(id)
        .bind(status)
        .bind(response)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to update transfer status", e)
        })?;
        Ok(())
    }

    /// List all transfer records for a user, newest first.
    pub async fn list_by_user(&self, username: &str) -> AppResult<Vec<Transfer>> {
        sqlx::query_as::<_, Transfer>(
            "SELECT * FROM zenodo_transfers WHERE username = $1 \
             ORDER BY created_at DESC, id DESC",
        )
        .bind(username)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to list transfers", e))
    }

    /// Find records stuck in `pending` since before the given time.
    ///
    /// A record stays `pending` forever when its message was never
    /// published (queue failure after creation); this query makes such
    /// orphans visible to operators.
    pub async fn find_stale_pending(
        &self,
        older_than: DateTime<Utc>,
    ) -> AppResult<Vec<Transfer>> {
        sqlx::query_as::<_, Transfer>(
            "SELECT * FROM zenodo_transfers WHERE status = 'pending' AND created_at < $1 \
             ORDER BY created_at ASC",
        )
        .bind(older_than)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to query stale transfers", e)
        })
    }
}
