//! Submission result types

use serde::{Deserialize, Serialize};

use crate::domain::operation::{OperationError, OperationHandle};

/// A resource the remote system refused to create an operation for
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Rejection {
    pub resource_id: String,
    pub error: OperationError,
}

/// Outcome of a batch submission for one requested resource
///
/// Exactly one of these exists per requested resource. Results come back
/// in no guaranteed order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum SubmissionResult {
    /// No operation was created; nothing to poll
    Rejected(Rejection),
    /// An operation exists, normally in `Pending` or `Blocked`
    Accepted(OperationHandle),
}

impl SubmissionResult {
    pub fn resource_id(&self) -> &str {
        match self {
            SubmissionResult::Rejected(rejection) => &rejection.resource_id,
            SubmissionResult::Accepted(handle) => &handle.resource_id,
        }
    }

    pub fn operation_id(&self) -> Option<&str> {
        match self {
            SubmissionResult::Rejected(_) => None,
            SubmissionResult::Accepted(handle) => Some(&handle.operation_id),
        }
    }
}
