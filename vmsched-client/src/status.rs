//! Operation tracking endpoints

use tracing::warn;
use vmsched_core::domain::operation::OperationHandle;
use vmsched_core::dto::operation::{
    OperationErrorsResponse, OperationErrorsResult, OperationIdsRequest, OperationListResponse,
    ResourceOperation,
};

use crate::ScheduleClient;
use crate::error::{ClientError, Result};

impl ScheduleClient {
    /// Get the current state of a set of operations
    ///
    /// # Arguments
    /// * `location` - Region the operations were submitted in
    /// * `operation_ids` - Operations to look up
    /// * `correlation_id` - Correlation id for this request
    ///
    /// # Returns
    /// A handle for every entry that names an operation. Entries carrying
    /// only a resource-level error are logged and skipped.
    pub async fn get_operation_status(
        &self,
        location: &str,
        operation_ids: &[String],
        correlation_id: &str,
    ) -> Result<Vec<OperationHandle>> {
        validate_operation_ids(operation_ids)?;

        let request = OperationIdsRequest {
            operation_ids: operation_ids.to_vec(),
            correlationid: Some(correlation_id.to_string()),
        };
        let response: OperationListResponse = self
            .post_action(location, "virtualMachinesGetOperationStatus", &request)
            .await?;

        Ok(into_handles(response))
    }

    /// Cancel scheduled operations that have not started executing
    ///
    /// # Returns
    /// The post-cancellation state of each operation
    pub async fn cancel_operations(
        &self,
        location: &str,
        operation_ids: &[String],
        correlation_id: &str,
    ) -> Result<Vec<OperationHandle>> {
        validate_operation_ids(operation_ids)?;

        let request = OperationIdsRequest {
            operation_ids: operation_ids.to_vec(),
            correlationid: Some(correlation_id.to_string()),
        };
        let response: OperationListResponse = self
            .post_action(location, "virtualMachinesCancelOperations", &request)
            .await?;

        Ok(into_handles(response))
    }

    /// Get the error history of a set of operations
    ///
    /// Not needed to detect completion; useful after the fact to see why an
    /// operation failed or was retried.
    pub async fn get_operation_errors(
        &self,
        location: &str,
        operation_ids: &[String],
    ) -> Result<Vec<OperationErrorsResult>> {
        validate_operation_ids(operation_ids)?;

        let request = OperationIdsRequest {
            operation_ids: operation_ids.to_vec(),
            correlationid: None,
        };
        let response: OperationErrorsResponse = self
            .post_action(location, "virtualMachinesGetOperationErrors", &request)
            .await?;

        Ok(response.results)
    }
}

fn into_handles(response: OperationListResponse) -> Vec<OperationHandle> {
    response
        .results
        .into_iter()
        .filter_map(|entry| {
            if entry.operation.is_none() {
                warn!(
                    "Resource {} reported {} without an operation",
                    entry.resource_id.as_deref().unwrap_or("<unknown>"),
                    entry.error_code.as_deref().unwrap_or("no error code")
                );
            }
            ResourceOperation::into_handle(entry)
        })
        .collect()
}

fn validate_operation_ids(operation_ids: &[String]) -> Result<()> {
    if operation_ids.is_empty() {
        return Err(ClientError::InvalidRequest(
            "operation id list cannot be empty".to_string(),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use vmsched_core::domain::operation::OperationState;

    #[test]
    fn test_into_handles_skips_resource_level_errors() {
        let response: OperationListResponse = serde_json::from_str(
            r#"{
                "results": [
                    { "resourceId": "vm-1", "errorCode": "InternalError" },
                    { "operation": { "operationId": "op-2", "resourceId": "vm-2", "state": "Executing" } }
                ]
            }"#,
        )
        .unwrap();

        let handles = into_handles(response);
        assert_eq!(handles.len(), 1);
        assert_eq!(handles[0].operation_id, "op-2");
        assert_eq!(handles[0].state, OperationState::Running);
    }

    #[test]
    fn test_empty_operation_ids_rejected() {
        assert!(validate_operation_ids(&[]).is_err());
        assert!(validate_operation_ids(&["op-1".to_string()]).is_ok());
    }
}
