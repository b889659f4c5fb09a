//! Upload task wire payload.

use serde::{Deserialize, Serialize};

/// The durable, queued unit of work describing one pending transfer.
///
/// The payload carries everything the worker needs so that it never has to
/// consult any system other than the record store and Zenodo itself. It is
/// immutable once published.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadTask {
    /// Username of the submitting user.
    pub username: String,
    /// Path of the source file on the local filesystem.
    pub file_path: String,
    /// Name the file receives in the target deposition.
    pub filename: String,
    /// Zenodo access token used for the upload.
    pub zenodo_token: String,
    /// Target Zenodo deposition identifier.
    pub deposition_id: i64,
    /// Title of the target deposition.
    pub deposition_name: String,
    /// Identifier of the associated transfer record.
    pub transfer_id: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_payload_field_names_are_stable() {
        // The JSON field names are the wire contract between submitter and
        // worker; renaming a struct field must not change them silently.
        let task = UploadTask {
            username: "alice".into(),
            file_path: "/data/res/abc".into(),
            filename: "abc.csv".into(),
            zenodo_token: "tok".into(),
            deposition_id: 42,
            deposition_name: "My dataset".into(),
            transfer_id: 7,
        };

        let value = serde_json::to_value(&task).unwrap();
        for key in [
            "username",
            "file_path",
            "filename",
            "zenodo_token",
            "deposition_id",
            "deposition_name",
            "transfer_id",
        ] {
            assert!(value.get(key).is_some(), "missing wire field `{key}`");
        }
    }

    #[test]
    fn test_payload_round_trip() {
        let task = UploadTask {
            username: "bob".into(),
            file_path: "/data/res/def".into(),
            filename: "def.bin".into(),
            zenodo_token: "secret".into(),
            deposition_id: 9,
            deposition_name: "Other dataset".into(),
            transfer_id: 11,
        };

        let value = serde_json::to_value(&task).unwrap();
        let decoded: UploadTask = serde_json::from_value(value).unwrap();
        assert_eq!(decoded, task);
    }
}
