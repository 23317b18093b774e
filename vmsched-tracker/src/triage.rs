//! Submission triage
//!
//! Splits the per-resource results of a batch submission into the three
//! groups the tracker cares about:
//! - rejected: no operation was created, nothing will ever complete
//! - blocked: an operation exists but the remote system cannot progress it
//! - pollable: operation ids to hand to the polling session

use std::collections::BTreeSet;
use tracing::{info, warn};
use vmsched_core::domain::operation::{OperationHandle, OperationState};
use vmsched_core::domain::submission::{Rejection, SubmissionResult};

/// Partitioned view of a batch submission
#[derive(Debug, Clone, Default)]
pub struct Triage {
    /// Number of results the submission returned (one per requested resource)
    pub requested: usize,
    /// Resources the remote system refused outright
    pub rejected: Vec<Rejection>,
    /// Operations reported as blocked at submission time
    pub blocked: Vec<OperationHandle>,
    /// Operation ids eligible for polling
    pub pollable: BTreeSet<String>,
}

impl Triage {
    /// True when there is nothing to poll and the batch needs no session
    pub fn is_fully_resolved(&self) -> bool {
        self.pollable.is_empty()
    }
}

/// Classifies a batch submission response
pub fn triage(results: Vec<SubmissionResult>) -> Triage {
    let mut triage = Triage {
        requested: results.len(),
        ..Default::default()
    };

    for result in results {
        match result {
            SubmissionResult::Rejected(rejection) => {
                warn!(
                    "Resource {} rejected: {}",
                    rejection.resource_id, rejection.error
                );
                triage.rejected.push(rejection);
            }
            SubmissionResult::Accepted(handle) if handle.state == OperationState::Blocked => {
                warn!(
                    "Operation {} for {} is blocked{}",
                    handle.operation_id,
                    handle.resource_id,
                    handle
                        .error
                        .as_ref()
                        .map(|e| format!(": {}", e))
                        .unwrap_or_default()
                );
                triage.blocked.push(handle);
            }
            SubmissionResult::Accepted(handle) => {
                triage.pollable.insert(handle.operation_id);
            }
        }
    }

    info!(
        "Triaged {} result(s): {} rejected, {} blocked, {} pollable",
        triage.requested,
        triage.rejected.len(),
        triage.blocked.len(),
        triage.pollable.len()
    );

    triage
}

#[cfg(test)]
mod tests {
    use super::*;
    use vmsched_core::domain::operation::OperationError;

    fn accepted(op: &str, resource: &str, state: OperationState) -> SubmissionResult {
        SubmissionResult::Accepted(OperationHandle::new(op, resource, state))
    }

    fn rejected(resource: &str) -> SubmissionResult {
        SubmissionResult::Rejected(Rejection {
            resource_id: resource.to_string(),
            error: OperationError::new("ResourceNotFound", None),
        })
    }

    #[test]
    fn test_partitions_are_disjoint_and_complete() {
        let results = vec![
            accepted("op-1", "vm-1", OperationState::Pending),
            rejected("vm-2"),
            accepted("op-3", "vm-3", OperationState::Blocked),
            accepted("op-4", "vm-4", OperationState::Pending),
        ];

        let triage = triage(results);

        assert_eq!(triage.requested, 4);
        assert_eq!(
            triage.rejected.len() + triage.blocked.len() + triage.pollable.len(),
            triage.requested
        );
        assert_eq!(triage.rejected[0].resource_id, "vm-2");
        assert_eq!(triage.blocked[0].operation_id, "op-3");
        assert!(!triage.pollable.contains("op-3"));
        assert_eq!(
            triage.pollable.iter().cloned().collect::<Vec<_>>(),
            vec!["op-1".to_string(), "op-4".to_string()]
        );
    }

    #[test]
    fn test_empty_submission_is_resolved() {
        let triage = triage(Vec::new());
        assert_eq!(triage.requested, 0);
        assert!(triage.pollable.is_empty());
        assert!(triage.is_fully_resolved());
    }

    #[test]
    fn test_all_rejected_is_resolved() {
        let triage = triage(vec![rejected("vm-1"), rejected("vm-2")]);
        assert_eq!(triage.rejected.len(), 2);
        assert!(triage.is_fully_resolved());
    }

    #[test]
    fn test_duplicate_operation_ids_collapse() {
        let triage = triage(vec![
            accepted("op-1", "vm-1", OperationState::Pending),
            accepted("op-1", "vm-1", OperationState::Pending),
        ]);
        assert_eq!(triage.pollable.len(), 1);
    }
}
