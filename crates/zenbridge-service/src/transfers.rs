//! Transfer query service — read-only views over the record store.

use std::sync::Arc;

use chrono::{Duration, Utc};

use zenbridge_core::result::AppResult;
use zenbridge_database::repositories::transfer::TransferRepository;
use zenbridge_entity::transfer::Transfer;

/// Read-only queries over transfer records for the front-end collaborator
/// and for operators.
#[derive(Clone)]
pub struct TransferQueryService {
    /// Transfer record repository.
    transfer_repo: Arc<TransferRepository>,
}

impl std::fmt::Debug for TransferQueryService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TransferQueryService").finish()
    }
}

impl TransferQueryService {
    /// Creates a new transfer query service.
    pub fn new(transfer_repo: Arc<TransferRepository>) -> Self {
        Self { transfer_repo }
    }

    /// List a user's transfers, newest first.
    ///
    /// A snapshot query with no side effects; the front end polls it to
    /// display transfer progress.
    pub async fn list_by_user(&self, username: &str) -> AppResult<Vec<Transfer>> {
        self.transfer_repo.list_by_user(username).await
    }

    /// List records that have sat in `pending` longer than `max_age`.
    ///
    /// A non-empty result usually means a task publish failed after record
    /// creation and the record was orphaned.
    pub async fn stale_pending(&self, max_age: Duration) -> AppResult<Vec<Transfer>> {
        self.transfer_repo
            .find_stale_pending(Utc::now() - max_age)
            .await
    }
}
