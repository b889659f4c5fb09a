//! Zenodo API request and response types.

use serde::{Deserialize, Serialize};

/// A Zenodo deposition as returned by the API.
///
/// Only the fields the relay reads are modeled; the API returns many more.
#[derive(Debug, Clone, Deserialize)]
pub struct Deposition {
    /// Deposition identifier.
    pub id: i64,
    /// Deposition links, including the upload bucket URL.
    #[serde(default)]
    pub links: DepositionLinks,
    /// Deposition metadata.
    #[serde(default)]
    pub metadata: DepositionMetadata,
}

impl Deposition {
    /// The bucket URL files are uploaded to, if the API provided one.
    pub fn bucket_url(&self) -> Option<&str> {
        self.links.bucket.as_deref()
    }

    /// The deposition title, if set.
    pub fn title(&self) -> Option<&str> {
        self.metadata.title.as_deref()
    }
}

/// Links block of a deposition.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DepositionLinks {
    /// Upload endpoint for the deposition's files.
    pub bucket: Option<String>,
}

/// Metadata block of a deposition response.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DepositionMetadata {
    /// Deposition title.
    pub title: Option<String>,
}

/// Metadata for creating a new deposition.
#[derive(Debug, Clone, Serialize)]
pub struct NewDepositionMetadata {
    /// Zenodo upload type, e.g. `"dataset"`.
    pub upload_type: String,
    /// Deposition title.
    pub title: String,
    /// Deposition description.
    pub description: String,
    /// Access right, e.g. `"restricted"`.
    pub access_right: String,
    /// Deposition creators.
    pub creators: Vec<Creator>,
}

impl NewDepositionMetadata {
    /// Metadata for a restricted-access dataset, the shape the relay
    /// creates depositions with.
    pub fn restricted_dataset(
        title: impl Into<String>,
        description: impl Into<String>,
        creators: Vec<Creator>,
    ) -> Self {
        Self {
            upload_type: "dataset".to_string(),
            title: title.into(),
            description: description.into(),
            access_right: "restricted".to_string(),
            creators,
        }
    }
}

/// A deposition creator.
#[derive(Debug, Clone, Serialize)]
pub struct Creator {
    /// Creator name, `"Family, Given"`.
    pub name: String,
    /// Creator affiliation.
    pub affiliation: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deposition_deserializes_bucket_and_title() {
        let body = serde_json::json!({
            "id": 1234,
            "links": { "bucket": "https://zenodo.org/api/files/abc-def" },
            "metadata": { "title": "Survey results 2024" },
            "state": "unsubmitted"
        });

        let deposition: Deposition = serde_json::from_value(body).unwrap();
        assert_eq!(deposition.id, 1234);
        assert_eq!(
            deposition.bucket_url(),
            Some("https://zenodo.org/api/files/abc-def")
        );
        assert_eq!(deposition.title(), Some("Survey results 2024"));
    }

    #[test]
    fn test_deposition_tolerates_missing_links() {
        let body = serde_json::json!({ "id": 5 });
        let deposition: Deposition = serde_json::from_value(body).unwrap();
        assert!(deposition.bucket_url().is_none());
        assert!(deposition.title().is_none());
    }

    #[test]
    fn test_restricted_dataset_metadata_shape() {
        let metadata = NewDepositionMetadata::restricted_dataset(
            "My dataset",
            "Uploaded by the relay",
            vec![Creator {
                name: "Doe, Jane".into(),
                affiliation: "MyAffiliation".into(),
            }],
        );

        let value = serde_json::to_value(&metadata).unwrap();
        assert_eq!(value["upload_type"], "dataset");
        assert_eq!(value["access_right"], "restricted");
        assert_eq!(value["creators"][0]["name"], "Doe, Jane");
    }
}
