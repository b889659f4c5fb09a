//! Zenodo deposition API client.

use std::path::Path;
use std::time::Duration;

use reqwest::{Body, Client, Response, StatusCode};
use tokio_util::io::ReaderStream;
use tracing::{debug, info};

use zenbridge_core::config::ZenodoConfig;
use zenbridge_core::error::{AppError, ErrorKind};
use zenbridge_core::result::AppResult;

use crate::models::{Deposition, NewDepositionMetadata};

/// Client for the Zenodo deposition REST API.
///
/// Two underlying HTTP clients are kept: a short-timeout one for metadata
/// requests and a long-timeout one for whole-file uploads.
#[derive(Debug, Clone)]
pub struct ZenodoClient {
    client: Client,
    upload_client: Client,
    api_url: String,
}

impl ZenodoClient {
    /// Create a new Zenodo client from configuration.
    pub fn new(config: &ZenodoConfig) -> AppResult<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_seconds))
            .build()
            .map_err(|e| {
                AppError::with_source(
                    ErrorKind::RemoteService,
                    format!("Failed to build HTTP client: {e}"),
                    e,
                )
            })?;

        let upload_client = Client::builder()
            .timeout(Duration::from_secs(config.upload_timeout_seconds))
            .build()
            .map_err(|e| {
                AppError::with_source(
                    ErrorKind::RemoteService,
                    format!("Failed to build upload HTTP client: {e}"),
                    e,
                )
            })?;

        Ok(Self {
            client,
            upload_client,
            api_url: config.api_url.trim_end_matches('/').to_string(),
        })
    }

    /// Fetch a deposition by ID, including its title and bucket URL.
    pub async fn get_deposition(&self, token: &str, deposition_id: i64) -> AppResult<Deposition> {
        let url = format!("{}/{}", self.api_url, deposition_id);
        debug!(deposition_id, "Fetching Zenodo deposition");

        let response = self
            .client
            .get(&url)
            .query(&[("access_token", token)])
            .send()
            .await
            .map_err(request_error)?;

        let response = check_success(response, "fetch deposition").await?;
        response.json::<Deposition>().await.map_err(|e| {
            AppError::with_source(
                ErrorKind::RemoteService,
                format!("Invalid deposition response: {e}"),
                e,
            )
        })
    }

    /// List all depositions visible to the given token.
    pub async fn list_depositions(&self, token: &str) -> AppResult<Vec<Deposition>> {
        let response = self
            .client
            .get(&self.api_url)
            .query(&[("access_token", token)])
            .send()
            .await
            .map_err(request_error)?;

        let response = check_success(response, "list depositions").await?;
        response.json::<Vec<Deposition>>().await.map_err(|e| {
            AppError::with_source(
                ErrorKind::RemoteService,
                format!("Invalid depositions response: {e}"),
                e,
            )
        })
    }

    /// Create a new deposition with the given metadata.
    ///
    /// Zenodo answers deposition creation with HTTP 201; anything else is
    /// treated as a failure.
    pub async fn create_deposition(
        &self,
        token: &str,
        metadata: NewDepositionMetadata,
    ) -> AppResult<Deposition> {
        let response = self
            .client
            .post(&self.api_url)
            .query(&[("access_token", token)])
            .json(&serde_json::json!({ "metadata": metadata }))
            .send()
            .await
            .map_err(request_error)?;

        let status = response.status();
        if status != StatusCode::CREATED {
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::new(
                ErrorKind::RemoteService,
                format!("Deposition creation failed with status {status}: {body}"),
            ));
        }

        let deposition = response.json::<Deposition>().await.map_err(|e| {
            AppError::with_source(
                ErrorKind::RemoteService,
                format!("Invalid deposition response: {e}"),
                e,
            )
        })?;

        info!(
            deposition_id = deposition.id,
            "Created new Zenodo deposition"
        );
        Ok(deposition)
    }

    /// Stream a local file to a deposition bucket.
    ///
    /// Returns the raw response body, which the worker stores on the
    /// transfer record as the audit trail.
    pub async fn upload_file(
        &self,
        token: &str,
        bucket_url: &str,
        filename: &str,
        source_path: &Path,
    ) -> AppResult<String> {
        let file = tokio::fs::File::open(source_path).await.map_err(|e| {
            AppError::with_source(
                ErrorKind::Io,
                format!("Failed to open source file {}: {e}", source_path.display()),
                e,
            )
        })?;

        let url = upload_url(bucket_url, filename);
        debug!(url = %url, "Uploading file to Zenodo bucket");

        let response = self
            .upload_client
            .put(&url)
            .query(&[("access_token", token)])
            .body(Body::wrap_stream(ReaderStream::new(file)))
            .send()
            .await
            .map_err(request_error)?;

        let response = check_success(response, "upload file").await?;
        response.text().await.map_err(|e| {
            AppError::with_source(
                ErrorKind::RemoteService,
                format!("Failed to read upload response: {e}"),
                e,
            )
        })
    }
}

/// Build the PUT target for a bucket upload.
fn upload_url(bucket_url: &str, filename: &str) -> String {
    format!("{}/{}", bucket_url.trim_end_matches('/'), filename)
}

/// Map a transport-level reqwest error into the remote-service kind.
fn request_error(err: reqwest::Error) -> AppError {
    AppError::with_source(
        ErrorKind::RemoteService,
        format!("Zenodo request failed: {err}"),
        err,
    )
}

/// Return the response if it has a success status, otherwise surface the
/// status and body text as a remote-service error.
async fn check_success(response: Response, operation: &str) -> AppResult<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    Err(AppError::new(
        ErrorKind::RemoteService,
        format!("Zenodo {operation} failed with status {status}: {body}"),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_upload_url_joins_bucket_and_filename() {
        assert_eq!(
            upload_url("https://zenodo.org/api/files/abc", "data.csv"),
            "https://zenodo.org/api/files/abc/data.csv"
        );
    }

    #[test]
    fn test_upload_url_handles_trailing_slash() {
        assert_eq!(
            upload_url("https://zenodo.org/api/files/abc/", "data.csv"),
            "https://zenodo.org/api/files/abc/data.csv"
        );
    }

    #[test]
    fn test_client_strips_trailing_slash_from_api_url() {
        let config = ZenodoConfig {
            api_url: "https://zenodo.org/api/deposit/depositions/".into(),
            ..ZenodoConfig::default()
        };
        let client = ZenodoClient::new(&config).unwrap();
        assert_eq!(client.api_url, "https://zenodo.org/api/deposit/depositions");
    }
}
