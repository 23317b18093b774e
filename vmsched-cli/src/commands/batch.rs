//! Batch command handlers
//!
//! Execute and submit a batch operation, then optionally track it.

use anyhow::{Context, Result};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use vmsched_client::ScheduleClient;
use vmsched_core::domain::operation::OperationKind;
use vmsched_core::domain::request::{DeadlineType, RetryPolicy, Schedule};
use vmsched_core::domain::submission::SubmissionResult;
use vmsched_tracker::{HttpOperationRepository, SessionOutcome, track_batch};

use super::TrackArgs;
use crate::config::Config;
use crate::output;

/// Run a batch operation immediately
pub async fn execute(
    config: &Config,
    kind: OperationKind,
    resources: Vec<String>,
    retry: RetryPolicy,
    track: Option<TrackArgs>,
    cancel: CancellationToken,
) -> Result<()> {
    let client = Arc::new(config.client());

    let results = client
        .execute(&config.location, kind, resources, retry)
        .await
        .with_context(|| format!("Failed to execute {} batch", kind))?;

    report_results(config, client, kind, results, track, cancel).await
}

/// Schedule a batch operation for a later time
pub async fn submit(
    config: &Config,
    kind: OperationKind,
    schedule: Schedule,
    resources: Vec<String>,
    retry: RetryPolicy,
    track: Option<TrackArgs>,
    cancel: CancellationToken,
) -> Result<()> {
    let client = Arc::new(config.client());

    let results = client
        .submit(&config.location, kind, schedule, resources, retry)
        .await
        .with_context(|| format!("Failed to submit {} batch", kind))?;

    report_results(config, client, kind, results, track, cancel).await
}

/// Parse the schedule of a submit-type request
pub fn parse_schedule(
    deadline: &str,
    timezone: String,
    deadline_type: DeadlineType,
) -> Result<Schedule> {
    let deadline = chrono::DateTime::parse_from_rfc3339(deadline)
        .with_context(|| format!("Invalid deadline '{}', expected RFC 3339", deadline))?
        .with_timezone(&chrono::Utc);

    Ok(Schedule {
        deadline,
        time_zone: timezone,
        deadline_type,
    })
}

/// Prints the submission, then tracks it when asked to
///
/// In JSON mode a tracked batch prints a single document once tracking stops.
async fn report_results(
    config: &Config,
    client: Arc<ScheduleClient>,
    kind: OperationKind,
    results: Vec<SubmissionResult>,
    track: Option<TrackArgs>,
    cancel: CancellationToken,
) -> Result<()> {
    let Some(args) = track else {
        if config.json {
            output::print_json(&results);
        } else {
            output::print_submission(kind, &results);
        }
        return Ok(());
    };

    if !config.json {
        output::print_submission(kind, &results);
    }

    let tracker_config = args.tracker_config()?;
    let repository = Arc::new(HttpOperationRepository::new(client, &config.location));

    let report = track_batch(results, repository.clone(), &tracker_config, cancel).await?;

    let errors = match (&report.session, args.show_errors) {
        (Some(session), true) => {
            super::operation::unsuccessful_errors(repository.as_ref(), session).await
        }
        _ => Vec::new(),
    };

    if config.json {
        output::print_json(&output::TrackingView::batch(&report, &errors));
    } else {
        output::print_batch_report(&report);
        if !errors.is_empty() {
            output::print_error_history(&errors);
        }
    }

    if let Some(SessionOutcome::Failed(e)) = report.session.map(|session| session.outcome) {
        return Err(e).context("Tracking stopped");
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_parse_schedule() {
        let schedule =
            parse_schedule("2024-11-01T10:00:00+02:00", "UTC".to_string(), DeadlineType::CompleteBy)
                .unwrap();
        assert_eq!(
            schedule.deadline,
            chrono::Utc.with_ymd_and_hms(2024, 11, 1, 8, 0, 0).unwrap()
        );
        assert_eq!(schedule.deadline_type, DeadlineType::CompleteBy);
    }

    #[test]
    fn test_parse_schedule_rejects_garbage() {
        assert!(parse_schedule("tomorrow", "UTC".to_string(), DeadlineType::InitiateAt).is_err());
    }
}
