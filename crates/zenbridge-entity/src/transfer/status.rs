//! Transfer status enumeration.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Status of a transfer record.
///
/// Transitions only move forward: `pending → in_progress → {completed,
/// failed}`. A record never re-enters `pending`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "transfer_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum TransferStatus {
    /// Created by the submitter, waiting for the worker.
    Pending,
    /// Picked up by the worker; the upload is running.
    InProgress,
    /// The remote service accepted the upload.
    Completed,
    /// The upload failed; the error text is stored on the record.
    Failed,
}

impl TransferStatus {
    /// Check if the status is terminal (no further worker action occurs).
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }

    /// Check whether a transition to `next` is allowed.
    pub fn can_transition_to(&self, next: TransferStatus) -> bool {
        matches!(
            (self, next),
            (Self::Pending, Self::InProgress)
                | (Self::InProgress, Self::Completed)
                | (Self::InProgress, Self::Failed)
        )
    }

    /// Return the status as a lowercase string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::InProgress => "in_progress",
            Self::Completed => "completed",
            Self::Failed => "failed",
        }
    }
}

impl fmt::Display for TransferStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_forward_transitions_allowed() {
        assert!(TransferStatus::Pending.can_transition_to(TransferStatus::InProgress));
        assert!(TransferStatus::InProgress.can_transition_to(TransferStatus::Completed));
        assert!(TransferStatus::InProgress.can_transition_to(TransferStatus::Failed));
    }

    #[test]
    fn test_no_backward_or_skipping_transitions() {
        assert!(!TransferStatus::Pending.can_transition_to(TransferStatus::Completed));
        assert!(!TransferStatus::InProgress.can_transition_to(TransferStatus::Pending));
        assert!(!TransferStatus::Completed.can_transition_to(TransferStatus::Pending));
        assert!(!TransferStatus::Completed.can_transition_to(TransferStatus::InProgress));
        assert!(!TransferStatus::Failed.can_transition_to(TransferStatus::InProgress));
    }

    #[test]
    fn test_terminal_states() {
        assert!(!TransferStatus::Pending.is_terminal());
        assert!(!TransferStatus::InProgress.is_terminal());
        assert!(TransferStatus::Completed.is_terminal());
        assert!(TransferStatus::Failed.is_terminal());
    }

    #[test]
    fn test_as_str_uses_snake_case() {
        assert_eq!(TransferStatus::InProgress.as_str(), "in_progress");
    }
}
