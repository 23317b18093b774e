//! Configuration module
//!
//! Connection settings shared by every command.

use vmsched_client::ScheduleClient;

/// CLI configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Management endpoint
    pub base_url: String,
    /// Subscription that owns the target resources
    pub subscription_id: String,
    /// Location of the target resources
    pub location: String,
    /// Bearer token obtained by the caller
    pub token: Option<String>,
    /// Print raw JSON instead of formatted output
    pub json: bool,
}

impl Config {
    /// Builds an API client for these settings
    pub fn client(&self) -> ScheduleClient {
        let client = ScheduleClient::new(&self.base_url, &self.subscription_id);
        match &self.token {
            Some(token) => client.with_token(token),
            None => client,
        }
    }
}
