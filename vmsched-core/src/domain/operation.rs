//! Operation domain types

use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

/// Batch action performed on each target resource
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OperationKind {
    Start,
    Deallocate,
    Hibernate,
}

impl OperationKind {
    /// Suffix used by the remote API when naming the action endpoint
    pub fn as_str(&self) -> &'static str {
        match self {
            OperationKind::Start => "Start",
            OperationKind::Deallocate => "Deallocate",
            OperationKind::Hibernate => "Hibernate",
        }
    }

    fn from_remote(name: &str) -> Option<Self> {
        match name {
            "Start" => Some(OperationKind::Start),
            "Deallocate" => Some(OperationKind::Deallocate),
            "Hibernate" => Some(OperationKind::Hibernate),
            _ => None,
        }
    }
}

/// `opType` is informational; names outside the known set decode to `None`
fn lenient_kind<'de, D>(deserializer: D) -> Result<Option<OperationKind>, D::Error>
where
    D: Deserializer<'de>,
{
    let name = Option::<String>::deserialize(deserializer)?;
    Ok(name.as_deref().and_then(OperationKind::from_remote))
}

impl fmt::Display for OperationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Operation lifecycle state
///
/// The remote service reports a finer-grained set of states; the ones that
/// mean "not started yet" collapse into `Pending` and `Executing` becomes
/// `Running`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum OperationState {
    #[default]
    #[serde(
        alias = "Unknown",
        alias = "PendingScheduling",
        alias = "Scheduled",
        alias = "PendingExecution"
    )]
    Pending,
    #[serde(alias = "Executing")]
    Running,
    Blocked,
    Succeeded,
    Failed,
    Cancelled,
}

impl OperationState {
    /// Returns true once the operation can no longer change
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            OperationState::Succeeded | OperationState::Failed | OperationState::Cancelled
        )
    }
}

impl fmt::Display for OperationState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

/// Error reported by the remote system for a resource or an operation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OperationError {
    #[serde(rename = "errorCode")]
    pub code: String,
    #[serde(rename = "errorDetails", default)]
    pub details: Option<String>,
}

impl OperationError {
    pub fn new(code: impl Into<String>, details: Option<String>) -> Self {
        Self {
            code: code.into(),
            details,
        }
    }
}

impl fmt::Display for OperationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.details {
            Some(details) => write!(f, "{}: {}", self.code, details),
            None => f.write_str(&self.code),
        }
    }
}

/// One unit of remote work, acting on a single resource
///
/// The operation id is assigned by the remote system when the batch is
/// submitted and never moves to a different resource afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OperationHandle {
    pub operation_id: String,
    pub resource_id: String,
    #[serde(default)]
    pub state: OperationState,
    #[serde(rename = "resourceOperationError", default)]
    pub error: Option<OperationError>,
    #[serde(rename = "opType", default, deserialize_with = "lenient_kind")]
    pub kind: Option<OperationKind>,
    #[serde(default)]
    pub deadline: Option<chrono::DateTime<chrono::Utc>>,
    #[serde(default)]
    pub timezone: Option<String>,
}

impl OperationHandle {
    pub fn new(
        operation_id: impl Into<String>,
        resource_id: impl Into<String>,
        state: OperationState,
    ) -> Self {
        Self {
            operation_id: operation_id.into(),
            resource_id: resource_id.into(),
            state,
            error: None,
            kind: None,
            deadline: None,
            timezone: None,
        }
    }

    pub fn with_error(mut self, error: OperationError) -> Self {
        self.error = Some(error);
        self
    }

    pub fn is_terminal(&self) -> bool {
        self.state.is_terminal()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_terminal_states() {
        assert!(OperationState::Succeeded.is_terminal());
        assert!(OperationState::Failed.is_terminal());
        assert!(OperationState::Cancelled.is_terminal());
    }

    #[test]
    fn test_non_terminal_states() {
        assert!(!OperationState::Pending.is_terminal());
        assert!(!OperationState::Running.is_terminal());
        assert!(!OperationState::Blocked.is_terminal());
    }

    #[test]
    fn test_remote_state_names_collapse() {
        let states: Vec<OperationState> = serde_json::from_str(
            r#"["Unknown", "PendingScheduling", "Scheduled", "PendingExecution", "Executing", "Blocked"]"#,
        )
        .unwrap();

        assert_eq!(
            states,
            vec![
                OperationState::Pending,
                OperationState::Pending,
                OperationState::Pending,
                OperationState::Pending,
                OperationState::Running,
                OperationState::Blocked,
            ]
        );
    }

    #[test]
    fn test_handle_decodes_remote_shape() {
        let handle: OperationHandle = serde_json::from_str(
            r#"{
                "operationId": "op-1",
                "resourceId": "/subscriptions/s/resourceGroups/rg/providers/Microsoft.Compute/virtualMachines/vm-1",
                "opType": "Start",
                "subscriptionId": "s",
                "state": "Failed",
                "resourceOperationError": {
                    "errorCode": "OperationFailed",
                    "errorDetails": "allocation failure"
                }
            }"#,
        )
        .unwrap();

        assert_eq!(handle.operation_id, "op-1");
        assert_eq!(handle.state, OperationState::Failed);
        assert_eq!(handle.kind, Some(OperationKind::Start));
        assert_eq!(
            handle.error.as_ref().map(|e| e.to_string()),
            Some("OperationFailed: allocation failure".to_string())
        );
    }

    #[test]
    fn test_unrecognized_op_type_does_not_fail_decode() {
        let handle: OperationHandle = serde_json::from_str(
            r#"{"operationId":"op-1","resourceId":"vm-1","opType":"Unknown","state":"Succeeded"}"#,
        )
        .unwrap();

        assert_eq!(handle.kind, None);
        assert_eq!(handle.state, OperationState::Succeeded);

        let handle: OperationHandle =
            serde_json::from_str(r#"{"operationId":"op-2","resourceId":"vm-2","opType":null}"#)
                .unwrap();
        assert_eq!(handle.kind, None);
        assert_eq!(handle.state, OperationState::Pending);
    }
}
