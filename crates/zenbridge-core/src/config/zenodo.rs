//! Zenodo API configuration.

use serde::{Deserialize, Serialize};

/// Zenodo deposition API configuration.
///
/// The base design has no built-in timeout around remote calls; the
/// timeouts here bound worst-case blocking at the HTTP-client level.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ZenodoConfig {
    /// Base URL of the deposition API.
    #[serde(default = "default_api_url")]
    pub api_url: String,
    /// Timeout in seconds for metadata requests.
    #[serde(default = "default_request_timeout")]
    pub request_timeout_seconds: u64,
    /// Timeout in seconds for file uploads. Uploads stream whole files,
    /// so this is much larger than the metadata timeout.
    #[serde(default = "default_upload_timeout")]
    pub upload_timeout_seconds: u64,
}

impl Default for ZenodoConfig {
    fn default() -> Self {
        Self {
            api_url: default_api_url(),
            request_timeout_seconds: default_request_timeout(),
            upload_timeout_seconds: default_upload_timeout(),
        }
    }
}

fn default_api_url() -> String {
    "https://zenodo.org/api/deposit/depositions".to_string()
}

fn default_request_timeout() -> u64 {
    30
}

fn default_upload_timeout() -> u64 {
    3600
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ZenodoConfig::default();
        assert_eq!(config.api_url, "https://zenodo.org/api/deposit/depositions");
        assert_eq!(config.request_timeout_seconds, 30);
        assert_eq!(config.upload_timeout_seconds, 3600);
    }
}
