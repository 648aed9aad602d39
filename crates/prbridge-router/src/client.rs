use prbridge_types::ServerPayload;
use tracing::{debug, error};

use crate::error::RouterError;

pub const DEFAULT_SERVER_URL: &str = "http://localhost:5050";

/// HTTP client for the local automation server.
///
/// No timeout is configured: a hung server stalls that one request, and
/// every request is independent of the others.
#[derive(Debug, Clone)]
pub struct AutomationClient {
    http: reqwest::Client,
    base_url: String,
}

impl AutomationClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.into(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn endpoint_url(&self, path: &str) -> String {
        format!("{}{}", self.base_url.trim_end_matches('/'), path)
    }

    /// Posts `payload` to its endpoint. Any 2xx is success.
    pub async fn deliver(&self, payload: &ServerPayload) -> Result<(), RouterError> {
        let url = self.endpoint_url(payload.endpoint());
        debug!(url = %url, file_path = payload.file_path(), "posting to automation server");

        let response = self
            .http
            .post(&url)
            .json(payload)
            .send()
            .await
            .map_err(|e| {
                error!(url = %url, error = %e, "automation server unreachable");
                RouterError::Unreachable(e.to_string())
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            error!(url = %url, status = status.as_u16(), body = %body, "automation server rejected request");
            return Err(RouterError::ServerStatus {
                status: status.as_u16(),
                reason: status.canonical_reason().unwrap_or("").to_string(),
            });
        }
        Ok(())
    }
}

impl Default for AutomationClient {
    fn default() -> Self {
        Self::new(DEFAULT_SERVER_URL)
    }
}
