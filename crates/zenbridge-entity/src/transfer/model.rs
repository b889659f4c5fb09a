//! Transfer record entity model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use super::status::TransferStatus;

/// A persisted transfer record tracking one file's journey from local
/// storage to the Zenodo archival service.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Transfer {
    /// Unique identifier, assigned by the store on creation.
    pub id: i64,
    /// Username of the submitting user.
    pub username: String,
    /// Path of the source file on the local filesystem.
    pub file_path: String,
    /// Name the file receives in the target deposition.
    pub filename: String,
    /// Target Zenodo deposition identifier.
    pub deposition_id: i64,
    /// Title of the target deposition at submission time.
    pub deposition_name: String,
    /// Current lifecycle status.
    pub status: TransferStatus,
    /// Raw Zenodo response on success, or the error text on failure.
    /// Empty only while the record is `pending`.
    pub zenodo_response: Option<String>,
    /// When the record was created.
    pub created_at: DateTime<Utc>,
}

/// Data required to create a new transfer record.
///
/// The store assigns the identifier and sets the initial `pending` status.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateTransfer {
    /// Username of the submitting user.
    pub username: String,
    /// Path of the source file on the local filesystem.
    pub file_path: String,
    /// Name the file receives in the target deposition.
    pub filename: String,
    /// Target Zenodo deposition identifier.
    pub deposition_id: i64,
    /// Title of the target deposition.
    pub deposition_name: String,
}
