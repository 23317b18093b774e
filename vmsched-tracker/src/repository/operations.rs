//! Operations repository
//!
//! Status and error-history lookups for submitted operations, scoped to a
//! single location.

use async_trait::async_trait;
use std::sync::Arc;
use vmsched_client::{Result, ScheduleClient};
use vmsched_core::domain::operation::OperationHandle;
use vmsched_core::dto::operation::OperationErrorsResult;

/// Repository trait for operation status lookups
#[async_trait]
pub trait StatusQuery: Send + Sync {
    /// Fetches the current state of each requested operation
    ///
    /// Implementations must return a handle for every requested id.
    ///
    /// # Arguments
    /// * `operation_ids` - Operations to look up
    /// * `correlation_id` - Correlation id for this request
    async fn query_status(
        &self,
        operation_ids: &[String],
        correlation_id: &str,
    ) -> Result<Vec<OperationHandle>>;
}

/// Repository trait for operation error history
#[async_trait]
pub trait ErrorQuery: Send + Sync {
    /// Fetches every error recorded over the lifetime of each operation
    async fn query_errors(&self, operation_ids: &[String]) -> Result<Vec<OperationErrorsResult>>;
}

/// HTTP implementation of the operation repositories
#[derive(Debug, Clone)]
pub struct HttpOperationRepository {
    client: Arc<ScheduleClient>,
    location: String,
}

impl HttpOperationRepository {
    /// Creates a new HTTP operation repository
    ///
    /// # Arguments
    /// * `client` - Scheduler API client
    /// * `location` - Location the operations were submitted in
    pub fn new(client: Arc<ScheduleClient>, location: impl Into<String>) -> Self {
        Self {
            client,
            location: location.into(),
        }
    }
}

#[async_trait]
impl StatusQuery for HttpOperationRepository {
    async fn query_status(
        &self,
        operation_ids: &[String],
        correlation_id: &str,
    ) -> Result<Vec<OperationHandle>> {
        self.client
            .get_operation_status(&self.location, operation_ids, correlation_id)
            .await
    }
}

#[async_trait]
impl ErrorQuery for HttpOperationRepository {
    async fn query_errors(&self, operation_ids: &[String]) -> Result<Vec<OperationErrorsResult>> {
        self.client
            .get_operation_errors(&self.location, operation_ids)
            .await
    }
}
