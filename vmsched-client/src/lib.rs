//! vmsched HTTP Client
//!
//! A type-safe HTTP client for the ComputeSchedule resource provider, which
//! starts, deallocates and hibernates batches of virtual machines.
//!
//! The client only speaks the wire protocol. Acquiring credentials is left to
//! the caller, who hands over an already obtained bearer token.
//!
//! # Example
//!
//! ```no_run
//! use vmsched_client::ScheduleClient;
//! use vmsched_core::domain::operation::OperationKind;
//! use vmsched_core::domain::request::RetryPolicy;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let client = ScheduleClient::new("https://management.azure.com", "my-subscription")
//!         .with_token("token");
//!
//!     let results = client
//!         .execute(
//!             "eastasia",
//!             OperationKind::Start,
//!             vec!["/subscriptions/.../virtualMachines/vm-1".to_string()],
//!             RetryPolicy::default(),
//!         )
//!         .await?;
//!
//!     println!("Submitted {} resource(s)", results.len());
//!     Ok(())
//! }
//! ```

pub mod error;
mod operations;
mod status;

// Re-export commonly used types
pub use error::{ClientError, Result};

use reqwest::Client;
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::debug;

/// Default ARM endpoint
pub const DEFAULT_BASE_URL: &str = "https://management.azure.com";

/// API version the request bodies are shaped for
pub const API_VERSION: &str = "2024-10-01";

/// Largest batch the remote system accepts in one request
pub const MAX_RESOURCES_PER_BATCH: usize = 100;

/// HTTP client for the ComputeSchedule API
///
/// Methods are organized into two groups:
/// - Batch operations (execute and submit for start, deallocate, hibernate)
/// - Operation tracking (status, error history, cancellation)
#[derive(Debug, Clone)]
pub struct ScheduleClient {
    /// Base URL of the management endpoint
    base_url: String,
    /// Subscription that owns the target resources
    subscription_id: String,
    /// Bearer token attached to every request, if any
    token: Option<String>,
    /// HTTP client instance
    client: Client,
}

impl ScheduleClient {
    /// Create a new client
    ///
    /// # Arguments
    /// * `base_url` - The management endpoint (e.g., "https://management.azure.com")
    /// * `subscription_id` - Subscription that owns the target resources
    ///
    /// # Example
    /// ```
    /// use vmsched_client::ScheduleClient;
    ///
    /// let client = ScheduleClient::new("https://management.azure.com", "sub");
    /// ```
    pub fn new(base_url: impl Into<String>, subscription_id: impl Into<String>) -> Self {
        Self::with_client(base_url, subscription_id, Client::new())
    }

    /// Create a new client with a custom HTTP client
    ///
    /// This allows you to configure timeouts, proxies, TLS settings, etc.
    pub fn with_client(
        base_url: impl Into<String>,
        subscription_id: impl Into<String>,
        client: Client,
    ) -> Self {
        let base_url = base_url.into();
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            subscription_id: subscription_id.into(),
            token: None,
            client,
        }
    }

    /// Attach a bearer token to every request
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    /// Get the base URL
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Get the subscription id
    pub fn subscription_id(&self) -> &str {
        &self.subscription_id
    }

    /// Build the URL of an action endpoint in a location
    pub fn action_url(&self, location: &str, action: &str) -> String {
        format!(
            "{}/subscriptions/{}/providers/Microsoft.ComputeSchedule/locations/{}/{}?api-version={}",
            self.base_url, self.subscription_id, location, action, API_VERSION
        )
    }

    // =============================================================================
    // Request Helpers
    // =============================================================================

    /// POST a JSON body to an action endpoint and decode the JSON reply
    async fn post_action<B, T>(&self, location: &str, action: &str, body: &B) -> Result<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let url = self.action_url(location, action);
        debug!("POST {}", url);

        let mut request = self.client.post(&url).json(body);
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }
        let response = request.send().await?;

        self.handle_response(response).await
    }

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
}

/// Fresh correlation id for a request
pub fn new_correlation_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_creation() {
        let client = ScheduleClient::new("https://management.azure.com", "sub");
        assert_eq!(client.base_url(), "https://management.azure.com");
        assert_eq!(client.subscription_id(), "sub");
    }

    #[test]
    fn test_client_trims_trailing_slash() {
        let client = ScheduleClient::new("https://management.azure.com/", "sub");
        assert_eq!(client.base_url(), "https://management.azure.com");
    }

    #[test]
    fn test_client_with_custom_client() {
        let http_client = Client::new();
        let client = ScheduleClient::with_client("http://localhost:8080", "sub", http_client);
        assert_eq!(client.base_url(), "http://localhost:8080");
    }

    #[test]
    fn test_action_url() {
        let client = ScheduleClient::new("https://management.azure.com", "sub-1");
        assert_eq!(
            client.action_url("eastasia", "virtualMachinesGetOperationStatus"),
            "https://management.azure.com/subscriptions/sub-1/providers/Microsoft.ComputeSchedule/locations/eastasia/virtualMachinesGetOperationStatus?api-version=2024-10-01"
        );
    }

    #[test]
    fn test_correlation_ids_are_unique() {
        assert_ne!(new_correlation_id(), new_correlation_id());
    }
}
