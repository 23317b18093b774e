//! Operation DTOs for the remote scheduler API

use serde::{Deserialize, Serialize};

use crate::domain::operation::{OperationError, OperationHandle};
use crate::domain::request::{RetryPolicy, Schedule};
use crate::domain::submission::{Rejection, SubmissionResult};

/// Error code used when the remote system rejects a resource without saying why
pub const UNKNOWN_ERROR_CODE: &str = "Unknown";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecutionParameters {
    pub retry_policy: RetryPolicy,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Resources {
    pub ids: Vec<String>,
}

/// Body of an execute-type request (runs immediately)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecuteRequest {
    pub execution_parameters: ExecutionParameters,
    pub resources: Resources,
    pub correlationid: String,
}

impl ExecuteRequest {
    pub fn new(resource_ids: Vec<String>, retry_policy: RetryPolicy, correlation_id: String) -> Self {
        Self {
            execution_parameters: ExecutionParameters { retry_policy },
            resources: Resources { ids: resource_ids },
            correlationid: correlation_id,
        }
    }
}

/// Body of a submit-type request (runs at a scheduled time)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitRequest {
    pub schedule: Schedule,
    pub execution_parameters: ExecutionParameters,
    pub resources: Resources,
    pub correlationid: String,
}

impl SubmitRequest {
    pub fn new(
        schedule: Schedule,
        resource_ids: Vec<String>,
        retry_policy: RetryPolicy,
        correlation_id: String,
    ) -> Self {
        Self {
            schedule,
            execution_parameters: ExecutionParameters { retry_policy },
            resources: Resources { ids: resource_ids },
            correlationid: correlation_id,
        }
    }
}

/// Body shared by the status, cancel and error-history requests
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OperationIdsRequest {
    pub operation_ids: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub correlationid: Option<String>,
}

/// Per-resource entry in every operation response
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceOperation {
    #[serde(default)]
    pub resource_id: Option<String>,
    #[serde(default)]
    pub error_code: Option<String>,
    #[serde(default)]
    pub error_details: Option<String>,
    #[serde(default)]
    pub operation: Option<OperationHandle>,
}

impl ResourceOperation {
    fn resource_error(&self) -> Option<OperationError> {
        self.error_code
            .as_ref()
            .map(|code| OperationError::new(code.clone(), self.error_details.clone()))
    }

    /// Classifies a submission entry
    ///
    /// An entry without an operation id is a rejection: the remote system
    /// never created an operation for that resource.
    pub fn into_submission_result(self) -> SubmissionResult {
        let error = self.resource_error();
        match self.operation {
            Some(mut handle) if !handle.operation_id.is_empty() => {
                if handle.error.is_none() {
                    handle.error = error;
                }
                SubmissionResult::Accepted(handle)
            }
            operation => {
                let operation_error = operation.as_ref().and_then(|op| op.error.clone());
                let resource_id = self
                    .resource_id
                    .or_else(|| operation.map(|op| op.resource_id))
                    .unwrap_or_default();
                let error = error
                    .or(operation_error)
                    .unwrap_or_else(|| OperationError::new(UNKNOWN_ERROR_CODE, None));
                SubmissionResult::Rejected(Rejection { resource_id, error })
            }
        }
    }

    /// Extracts the operation from a status entry
    ///
    /// Returns `None` for entries that only carry a resource-level error.
    /// A resource-level error on an entry that does have an operation is
    /// attached to the handle when the handle carries none of its own.
    pub fn into_handle(self) -> Option<OperationHandle> {
        let error = self.resource_error();
        let mut handle = self.operation.filter(|op| !op.operation_id.is_empty())?;
        if handle.error.is_none() {
            handle.error = error;
        }
        Some(handle)
    }
}

/// Response to an execute-type or submit-type request
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchOperationResponse {
    #[serde(default)]
    pub description: Option<String>,
    #[serde(rename = "type", default)]
    pub kind: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub results: Vec<ResourceOperation>,
}

/// Response to a status or cancel request
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OperationListResponse {
    #[serde(default)]
    pub results: Vec<ResourceOperation>,
}

/// One entry of an operation's error history
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OperationErrorDetails {
    pub error_code: String,
    #[serde(default)]
    pub error_details: Option<String>,
    #[serde(default, alias = "timeStamp")]
    pub timestamp: Option<chrono::DateTime<chrono::Utc>>,
}

/// Error history of a single operation
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OperationErrorsResult {
    #[serde(default)]
    pub operation_id: Option<String>,
    #[serde(default)]
    pub creation_time: Option<chrono::DateTime<chrono::Utc>>,
    #[serde(default)]
    pub activation_time: Option<chrono::DateTime<chrono::Utc>>,
    #[serde(default)]
    pub completed_at: Option<chrono::DateTime<chrono::Utc>>,
    #[serde(default)]
    pub operation_errors: Vec<OperationErrorDetails>,
    #[serde(default)]
    pub request_error_code: Option<String>,
    #[serde(default)]
    pub request_error_details: Option<String>,
}

/// Response to an error-history request
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OperationErrorsResponse {
    #[serde(default)]
    pub results: Vec<OperationErrorsResult>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::operation::OperationState;

    const SUBMISSION: &str = r#"{
        "description": "Execute start request",
        "type": "VirtualMachines",
        "location": "eastasia",
        "results": [
            {
                "resourceId": "vm-600",
                "operation": {
                    "operationId": "op-600",
                    "resourceId": "vm-600",
                    "opType": "Start",
                    "state": "PendingScheduling"
                }
            },
            {
                "resourceId": "vm-611",
                "errorCode": "ResourceNotFound",
                "errorDetails": "vm-611 does not exist"
            },
            {
                "resourceId": "vm-612",
                "operation": {
                    "operationId": "op-612",
                    "resourceId": "vm-612",
                    "state": "Blocked"
                }
            }
        ]
    }"#;

    #[test]
    fn test_submission_entries_classify() {
        let response: BatchOperationResponse = serde_json::from_str(SUBMISSION).unwrap();
        let results: Vec<SubmissionResult> = response
            .results
            .into_iter()
            .map(ResourceOperation::into_submission_result)
            .collect();

        match &results[0] {
            SubmissionResult::Accepted(handle) => {
                assert_eq!(handle.operation_id, "op-600");
                assert_eq!(handle.state, OperationState::Pending);
            }
            other => panic!("expected accepted, got {:?}", other),
        }

        match &results[1] {
            SubmissionResult::Rejected(rejection) => {
                assert_eq!(rejection.resource_id, "vm-611");
                assert_eq!(rejection.error.code, "ResourceNotFound");
            }
            other => panic!("expected rejection, got {:?}", other),
        }

        assert_eq!(results[2].operation_id(), Some("op-612"));
    }

    #[test]
    fn test_empty_operation_id_is_rejection() {
        let entry = ResourceOperation {
            resource_id: None,
            error_code: None,
            error_details: None,
            operation: Some(OperationHandle::new("", "vm-1", OperationState::Pending)),
        };

        match entry.into_submission_result() {
            SubmissionResult::Rejected(rejection) => {
                assert_eq!(rejection.resource_id, "vm-1");
                assert_eq!(rejection.error.code, UNKNOWN_ERROR_CODE);
            }
            other => panic!("expected rejection, got {:?}", other),
        }
    }

    #[test]
    fn test_status_entry_without_operation_has_no_handle() {
        let entry = ResourceOperation {
            resource_id: Some("vm-1".to_string()),
            error_code: Some("InternalError".to_string()),
            ..Default::default()
        };
        assert!(entry.into_handle().is_none());
    }

    #[test]
    fn test_status_entry_keeps_terminal_state_and_error() {
        let entry = ResourceOperation {
            resource_id: Some("vm-1".to_string()),
            error_code: Some("RetryExhausted".to_string()),
            error_details: None,
            operation: Some(OperationHandle::new("op-1", "vm-1", OperationState::Succeeded)),
        };

        let handle = entry.into_handle().unwrap();
        assert_eq!(handle.state, OperationState::Succeeded);
        assert_eq!(handle.error.unwrap().code, "RetryExhausted");
    }

    #[test]
    fn test_execute_request_wire_names() {
        let request = ExecuteRequest::new(
            vec!["vm-1".to_string()],
            RetryPolicy::default(),
            "corr".to_string(),
        );
        let json = serde_json::to_value(&request).unwrap();

        assert_eq!(json["resources"]["ids"][0], "vm-1");
        assert_eq!(json["executionParameters"]["retryPolicy"]["retryCount"], 3);
        assert_eq!(
            json["executionParameters"]["retryPolicy"]["retryWindowInMinutes"],
            60
        );
        assert_eq!(json["correlationid"], "corr");
    }

    #[test]
    fn test_errors_response_decodes() {
        let response: OperationErrorsResponse = serde_json::from_str(
            r#"{
                "results": [{
                    "operationId": "op-1",
                    "creationTime": "2024-11-01T10:00:00Z",
                    "operationErrors": [
                        { "errorCode": "AllocationFailed", "errorDetails": "no capacity", "timeStamp": "2024-11-01T10:01:00Z" }
                    ]
                }]
            }"#,
        )
        .unwrap();

        let result = &response.results[0];
        assert_eq!(result.operation_id.as_deref(), Some("op-1"));
        assert_eq!(result.operation_errors.len(), 1);
        assert!(result.operation_errors[0].timestamp.is_some());
    }
}
