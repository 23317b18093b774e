//! Error types for the tracker

use thiserror::Error;
use vmsched_client::ClientError;

/// Failures that end a polling session or prevent one from starting
///
/// Errors reported on individual operations are not represented here; they
/// travel on the operation handles and never stop the loop.
#[derive(Debug, Error)]
pub enum TrackerError {
    /// The status query call itself failed
    #[error("status query failed: {0}")]
    StatusQuery(#[from] ClientError),

    /// Tracker configuration is unusable
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}
