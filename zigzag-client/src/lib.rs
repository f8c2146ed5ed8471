//! ZigZag qTest Client
//!
//! A thin, type-safe HTTP facade over the qTest Manager v3 API.
//!
//! The upload queue talks to the remote service only through the [`QTestApi`]
//! trait, which [`QTestClient`] implements over `reqwest`. Tests substitute
//! their own implementation.
//!
//! # Example
//!
//! ```no_run
//! use zigzag_client::{QTestApi, QTestClient};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let client = QTestClient::new("https://example.qtestnet.com", "secret-token");
//!
//!     let modules = client.list_modules(12345).await?;
//!     println!("Project has {} top-level module(s)", modules.len());
//!     Ok(())
//! }
//! ```

mod api;
pub mod error;
mod links;
mod modules;
mod runs;

pub use api::QTestApi;
pub use error::{ClientError, Result};

use reqwest::{Client, Method, RequestBuilder};
use serde::de::DeserializeOwned;

/// HTTP client for the qTest API
///
/// Every request carries the bearer token. Endpoints are grouped by concern:
/// - Modules (list the tree, create a module)
/// - Test runs and results
/// - Requirement and external links
#[derive(Debug, Clone)]
pub struct QTestClient {
    /// Base URL of the qTest instance (e.g., "https://example.qtestnet.com")
    base_url: String,
    /// API token sent as `Authorization: Bearer <token>`
    token: String,
    /// HTTP client instance
    client: Client,
}

impl QTestClient {
    /// Create a new qTest client
    ///
    /// # Arguments
    /// * `base_url` - The base URL of the qTest instance
    /// * `token` - API token
    ///
    /// # Example
    /// ```
    /// use zigzag_client::QTestClient;
    ///
    /// let client = QTestClient::new("https://example.qtestnet.com", "token");
    /// ```
    pub fn new(base_url: impl Into<String>, token: impl Into<String>) -> Self {
        Self::with_client(base_url, token, Client::new())
    }

    /// Create a new qTest client with a custom HTTP client
    ///
    /// This allows you to configure timeouts, proxies, TLS settings, etc.
    ///
    /// # Example
    /// ```
    /// use zigzag_client::QTestClient;
    /// use reqwest::Client;
    /// use std::time::Duration;
    ///
    /// let http_client = Client::builder()
    ///     .timeout(Duration::from_secs(30))
    ///     .build()
    ///     .unwrap();
    ///
    /// let client = QTestClient::with_client("https://example.qtestnet.com", "token", http_client);
    /// ```
    pub fn with_client(
        base_url: impl Into<String>,
        token: impl Into<String>,
        client: Client,
    ) -> Self {
        let base_url = base_url.into();
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            token: token.into(),
            client,
        }
    }

    /// Get the base URL of the qTest instance
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// URL of a project-scoped endpoint
    fn project_url(&self, project_id: u64, path: &str) -> String {
        format!(
            "{}/api/v3/projects/{}/{}",
            self.base_url,
            project_id,
            path.trim_start_matches('/')
        )
    }

    /// Start an authenticated request
    fn request(&self, method: Method, url: &str) -> RequestBuilder {
        self.client.request(method, url).bearer_auth(&self.token)
    }

    // =============================================================================
    // Response Handlers
    // =============================================================================

    /// Handle an API response and deserialize JSON
    ///
    /// This method checks the status code and returns an appropriate error if
    /// the request failed, or deserializes the response body if successful.
    async fn handle_response<T: DeserializeOwned>(&self, response: reqwest::Response) -> Result<T> {
        let status = response.status();

        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(ClientError::api_error(status.as_u16(), error_text));
        }

        response
            .json()
            .await
            .map_err(|e| ClientError::ParseError(format!("Failed to parse JSON response: {}", e)))
    }

    /// Handle an API response whose body is not needed
    ///
    /// This method checks the status code and returns an error if the request failed.
    async fn handle_empty_response(&self, response: reqwest::Response) -> Result<()> {
        let status = response.status();

        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(ClientError::api_error(status.as_u16(), error_text));
        }

        Ok(())
    }
}
