//! Batch operation endpoints

use tracing::{debug, info};
use vmsched_core::domain::operation::OperationKind;
use vmsched_core::domain::request::{RetryPolicy, Schedule};
use vmsched_core::domain::submission::SubmissionResult;
use vmsched_core::dto::operation::{
    BatchOperationResponse, ExecuteRequest, ResourceOperation, SubmitRequest,
};

use crate::error::{ClientError, Result};
use crate::{MAX_RESOURCES_PER_BATCH, ScheduleClient, new_correlation_id};

impl ScheduleClient {
    // =============================================================================
    // Execute (immediate)
    // =============================================================================

    /// Run a batch operation immediately
    ///
    /// # Arguments
    /// * `location` - Region of the target virtual machines
    /// * `kind` - Start, deallocate or hibernate
    /// * `resource_ids` - Target virtual machine resource ids
    /// * `retry_policy` - How the remote system retries failed operations
    ///
    /// # Returns
    /// One submission result per requested resource, in no particular order
    pub async fn execute(
        &self,
        location: &str,
        kind: OperationKind,
        resource_ids: Vec<String>,
        retry_policy: RetryPolicy,
    ) -> Result<Vec<SubmissionResult>> {
        validate_resources(&resource_ids)?;

        let request = ExecuteRequest::new(resource_ids, retry_policy, new_correlation_id());
        info!(
            "Executing {} on {} resource(s) (correlation {})",
            kind,
            request.resources.ids.len(),
            request.correlationid
        );

        let action = format!("virtualMachinesExecute{}", kind.as_str());
        let response: BatchOperationResponse = self.post_action(location, &action, &request).await?;

        Ok(into_submission_results(response))
    }

    // =============================================================================
    // Submit (scheduled)
    // =============================================================================

    /// Schedule a batch operation for a later time
    ///
    /// # Arguments
    /// * `location` - Region of the target virtual machines
    /// * `kind` - Start, deallocate or hibernate
    /// * `schedule` - When the batch should run
    /// * `resource_ids` - Target virtual machine resource ids
    /// * `retry_policy` - How the remote system retries failed operations
    pub async fn submit(
        &self,
        location: &str,
        kind: OperationKind,
        schedule: Schedule,
        resource_ids: Vec<String>,
        retry_policy: RetryPolicy,
    ) -> Result<Vec<SubmissionResult>> {
        validate_resources(&resource_ids)?;

        let request =
            SubmitRequest::new(schedule, resource_ids, retry_policy, new_correlation_id());
        info!(
            "Submitting {} on {} resource(s) for {} (correlation {})",
            kind,
            request.resources.ids.len(),
            request.schedule.deadline,
            request.correlationid
        );

        let action = format!("virtualMachinesSubmit{}", kind.as_str());
        let response: BatchOperationResponse = self.post_action(location, &action, &request).await?;

        Ok(into_submission_results(response))
    }
}

fn into_submission_results(response: BatchOperationResponse) -> Vec<SubmissionResult> {
    debug!(
        "Batch response: {} result(s), description {:?}",
        response.results.len(),
        response.description
    );
    response
        .results
        .into_iter()
        .map(ResourceOperation::into_submission_result)
        .collect()
}

/// Rejects batches the remote system would refuse anyway
pub(crate) fn validate_resources(resource_ids: &[String]) -> Result<()> {
    if resource_ids.is_empty() {
        return Err(ClientError::InvalidRequest(
            "resource list cannot be empty".to_string(),
        ));
    }

    if resource_ids.len() > MAX_RESOURCES_PER_BATCH {
        return Err(ClientError::InvalidRequest(format!(
            "at most {} resources per batch, got {}",
            MAX_RESOURCES_PER_BATCH,
            resource_ids.len()
        )));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_batch_rejected() {
        assert!(matches!(
            validate_resources(&[]),
            Err(ClientError::InvalidRequest(_))
        ));
    }

    #[test]
    fn test_oversized_batch_rejected() {
        let ids: Vec<String> = (0..=MAX_RESOURCES_PER_BATCH)
            .map(|i| format!("vm-{}", i))
            .collect();
        assert!(validate_resources(&ids).is_err());
        assert!(validate_resources(&ids[..MAX_RESOURCES_PER_BATCH]).is_ok());
    }

    #[tokio::test]
    async fn test_execute_validates_before_sending() {
        // Unroutable base URL: reaching the network would surface RequestFailed
        let client = ScheduleClient::new("http://127.0.0.1:1", "sub");
        let result = client
            .execute("eastasia", OperationKind::Start, Vec::new(), RetryPolicy::default())
            .await;
        assert!(matches!(result, Err(ClientError::InvalidRequest(_))));
    }
}
