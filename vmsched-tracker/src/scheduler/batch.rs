//! Batch tracking
//!
//! Glue between a submission response and a polling session.

use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::info;
use vmsched_core::domain::submission::SubmissionResult;

use crate::config::TrackerConfig;
use crate::error::TrackerError;
use crate::repository::StatusQuery;
use crate::scheduler::session::{PollingSession, SessionReport};
use crate::triage::{Triage, triage};

/// Everything known about a batch once tracking stops
#[derive(Debug)]
pub struct BatchReport {
    pub triage: Triage,
    /// `None` when nothing was pollable and no session ran
    pub session: Option<SessionReport>,
}

impl BatchReport {
    /// True when no tracked operation is left pending
    pub fn is_resolved(&self) -> bool {
        self.session
            .as_ref()
            .is_none_or(|session| session.outcome.is_converged())
    }
}

/// Triages a submission response and polls the pollable part to completion
///
/// # Arguments
/// * `results` - Per-resource results of the submission
/// * `query` - Status lookup for the submission's location
/// * `config` - Session timing
/// * `cancel` - Stops the session early when cancelled
pub async fn track_batch(
    results: Vec<SubmissionResult>,
    query: Arc<dyn StatusQuery>,
    config: &TrackerConfig,
    cancel: CancellationToken,
) -> Result<BatchReport, TrackerError> {
    config.validate()?;

    let triage = triage(results);

    let session = match PollingSession::from_config(query, triage.pollable.clone(), config, cancel)
    {
        Some(session) => Some(session.run().await),
        None => {
            info!("Nothing to poll, batch fully resolved at submission");
            None
        }
    };

    Ok(BatchReport { triage, session })
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use vmsched_core::domain::operation::{OperationError, OperationHandle, OperationState};
    use vmsched_core::domain::submission::Rejection;

    /// Reports every requested operation as succeeded
    #[derive(Default)]
    struct SucceedingQuery {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl StatusQuery for SucceedingQuery {
        async fn query_status(
            &self,
            operation_ids: &[String],
            _correlation_id: &str,
        ) -> vmsched_client::Result<Vec<OperationHandle>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(operation_ids
                .iter()
                .map(|id| OperationHandle::new(id.clone(), "vm-q", OperationState::Succeeded))
                .collect())
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_rejected_resource_never_enters_registry() {
        let results = vec![
            SubmissionResult::Rejected(Rejection {
                resource_id: "vm-r".to_string(),
                error: OperationError::new("ResourceNotFound", None),
            }),
            SubmissionResult::Accepted(OperationHandle::new(
                "op-q",
                "vm-q",
                OperationState::Pending,
            )),
        ];
        let query = Arc::new(SucceedingQuery::default());

        let report = track_batch(
            results,
            query.clone(),
            &TrackerConfig::default(),
            CancellationToken::new(),
        )
        .await
        .unwrap();

        assert!(report.is_resolved());
        assert_eq!(report.triage.rejected.len(), 1);

        let session = report.session.unwrap();
        assert_eq!(session.registry.len(), 1);
        assert!(session.registry.contains("op-q"));
        assert!(session.registry.iter().all(|h| h.resource_id != "vm-r"));
        assert_eq!(query.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_empty_submission_starts_no_session() {
        let query = Arc::new(SucceedingQuery::default());

        let report = track_batch(
            Vec::new(),
            query.clone(),
            &TrackerConfig::default(),
            CancellationToken::new(),
        )
        .await
        .unwrap();

        assert!(report.session.is_none());
        assert!(report.is_resolved());
        assert_eq!(query.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_invalid_config_is_rejected() {
        let mut config = TrackerConfig::default();
        config.timeout = std::time::Duration::ZERO;

        let result = track_batch(
            Vec::new(),
            Arc::new(SucceedingQuery::default()),
            &config,
            CancellationToken::new(),
        )
        .await;

        assert!(matches!(result, Err(TrackerError::InvalidConfig(_))));
    }
}
