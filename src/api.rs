use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use thiserror::Error;
use tracing::debug;

use crate::config::Config;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("request to {url} failed: {source}")]
    Network {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("{url} returned status {status}")]
    Status { url: String, status: StatusCode },
    #[error("failed to decode response from {url}: {source}")]
    Decode {
        url: String,
        #[source]
        source: reqwest::Error,
    },
}

/// Bearer-authenticated client for the Threads Graph API.
///
/// Holds the base URL and token read once from [`Config`]; all requests are
/// GETs with parameters passed in the query string. No retries: a failure
/// propagates immediately to the caller.
#[derive(Debug, Clone)]
pub struct ApiClient {
    client: Client,
    base_url: String,
    token: String,
}

impl ApiClient {
    /// Create a client from the given configuration.
    ///
    /// # Panics
    ///
    /// Panics if the TLS backend cannot be initialized.
    #[must_use]
    pub fn new(config: &Config) -> Self {
        let client = Client::builder()
            .timeout(config.http_timeout)
            .build()
            .expect("Failed to build HTTP client");

        Self {
            client,
            base_url: config.api_base.trim_end_matches('/').to_string(),
            token: config.access_token.clone(),
        }
    }

    /// Issue a GET against the API and decode the JSON response body.
    ///
    /// # Errors
    ///
    /// Returns an error if the connection fails, the remote answers with a
    /// non-success status, or the body is not valid JSON for `T`.
    pub async fn get<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<T, ApiError> {
        let url = format!("{}{path}", self.base_url);
        debug!(url = %url, "Requesting Threads API");

        let response = self
            .client
            .get(&url)
            .bearer_auth(&self.token)
            .query(query)
            .send()
            .await
            .map_err(|e| ApiError::Network {
                url: url.clone(),
                source: e,
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(ApiError::Status { url, status });
        }

        response
            .json::<T>()
            .await
            .map_err(|e| ApiError::Decode { url, source: e })
    }
}
