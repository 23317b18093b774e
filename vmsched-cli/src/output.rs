//! Console output
//!
//! Human-readable rendering of submissions, operation states and tracking
//! reports.

use colored::*;
use serde::Serialize;
use std::collections::BTreeSet;
use vmsched_core::domain::operation::{OperationHandle, OperationKind, OperationState};
use vmsched_core::domain::submission::{Rejection, SubmissionResult};
use vmsched_core::dto::operation::OperationErrorsResult;
use vmsched_tracker::{BatchReport, SessionOutcome, SessionReport, Triage};

/// JSON document printed by tracking commands in `--json` mode
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackingView<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    submission: Option<TriageView<'a>>,
    session: Option<SessionView<'a>>,
    #[serde(skip_serializing_if = "<[_]>::is_empty")]
    errors: &'a [OperationErrorsResult],
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct TriageView<'a> {
    requested: usize,
    rejected: &'a [Rejection],
    blocked: &'a [OperationHandle],
    pollable: &'a BTreeSet<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SessionView<'a> {
    outcome: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
    total: usize,
    queries: usize,
    elapsed_secs: f64,
    completed: Vec<&'a OperationHandle>,
    remaining: &'a BTreeSet<String>,
}

impl<'a> TrackingView<'a> {
    pub fn batch(report: &'a BatchReport, errors: &'a [OperationErrorsResult]) -> Self {
        Self {
            submission: Some(TriageView::new(&report.triage)),
            session: report.session.as_ref().map(SessionView::new),
            errors,
        }
    }

    pub fn session(report: Option<&'a SessionReport>, errors: &'a [OperationErrorsResult]) -> Self {
        Self {
            submission: None,
            session: report.map(SessionView::new),
            errors,
        }
    }
}

impl<'a> TriageView<'a> {
    fn new(triage: &'a Triage) -> Self {
        Self {
            requested: triage.requested,
            rejected: &triage.rejected,
            blocked: &triage.blocked,
            pollable: &triage.pollable,
        }
    }
}

impl<'a> SessionView<'a> {
    fn new(report: &'a SessionReport) -> Self {
        let mut completed: Vec<&OperationHandle> = report.registry.iter().collect();
        completed.sort_by(|a, b| a.operation_id.cmp(&b.operation_id));

        Self {
            outcome: report.outcome.label(),
            error: match &report.outcome {
                SessionOutcome::Failed(e) => Some(e.to_string()),
                _ => None,
            },
            total: report.total,
            queries: report.queries(),
            elapsed_secs: report.elapsed.as_secs_f64(),
            completed,
            remaining: &report.remaining,
        }
    }
}

/// Print any serializable value as pretty JSON
pub fn print_json<T: Serialize + ?Sized>(value: &T) {
    match serde_json::to_string_pretty(value) {
        Ok(json) => println!("{}", json),
        Err(e) => eprintln!("{} {}", "Failed to encode JSON:".red(), e),
    }
}

/// Print the per-resource result of a submission
pub fn print_submission(kind: OperationKind, results: &[SubmissionResult]) {
    println!(
        "{}",
        format!("{} requested for {} resource(s):", kind, results.len()).bold()
    );

    for result in results {
        match result {
            SubmissionResult::Accepted(handle) => {
                println!("  {} {}", "▸".cyan(), handle.resource_id.dimmed());
                println!("    Operation: {}", handle.operation_id.cyan());
                println!("    State:     {}", colorize_state(&handle.state));
            }
            SubmissionResult::Rejected(rejection) => {
                println!("  {} {}", "✗".red(), rejection.resource_id.dimmed());
                println!("    Rejected:  {}", rejection.error.to_string().red());
            }
        }
    }
    println!();
}

/// Print a list of operation handles
pub fn print_handles(handles: &[OperationHandle]) {
    if handles.is_empty() {
        println!("{}", "No operations found.".yellow());
        return;
    }

    for handle in handles {
        print_handle(handle);
    }
}

fn print_handle(handle: &OperationHandle) {
    println!("  {} Operation {}", "▸".cyan(), handle.operation_id.dimmed());
    println!("    Resource: {}", handle.resource_id.dimmed());
    println!("    State:    {}", colorize_state(&handle.state));
    if let Some(deadline) = handle.deadline {
        println!("    Deadline: {}", deadline.format("%Y-%m-%d %H:%M:%S"));
    }
    if let Some(error) = &handle.error {
        println!("    Error:    {}", error.to_string().red());
    }
}

/// Print triage and tracking results for a batch
pub fn print_batch_report(report: &BatchReport) {
    let triage = &report.triage;

    println!("{}", "Submission:".bold());
    println!("  Requested: {}", triage.requested);
    println!("  Pollable:  {}", triage.pollable.len().to_string().cyan());
    if !triage.blocked.is_empty() {
        println!("  Blocked:   {}", triage.blocked.len().to_string().yellow());
        for handle in &triage.blocked {
            println!("    {} {}", "•".yellow(), handle.operation_id);
        }
    }
    if !triage.rejected.is_empty() {
        println!("  Rejected:  {}", triage.rejected.len().to_string().red());
    }
    println!();

    match &report.session {
        Some(session) => print_session_report(session),
        None => println!("{}", "Nothing to track.".yellow()),
    }
}

/// Print the outcome of a polling session
pub fn print_session_report(report: &SessionReport) {
    println!(
        "{} {} after {} quer(ies) in {}s",
        "Tracking".bold(),
        colorize_outcome(&report.outcome),
        report.queries(),
        report.elapsed.as_secs()
    );
    println!(
        "  Completed: {}/{}",
        report.registry.len(),
        report.total
    );
    println!(
        "  Succeeded: {}",
        report
            .registry
            .count_in(OperationState::Succeeded)
            .to_string()
            .green()
    );
    println!(
        "  Failed:    {}",
        report
            .registry
            .count_in(OperationState::Failed)
            .to_string()
            .red()
    );
    println!(
        "  Cancelled: {}",
        report
            .registry
            .count_in(OperationState::Cancelled)
            .to_string()
            .dimmed()
    );

    if let SessionOutcome::Failed(e) = &report.outcome {
        println!("  Error:     {}", e.to_string().red());
    }

    let mut completed: Vec<&OperationHandle> = report.registry.iter().collect();
    completed.sort_by(|a, b| a.operation_id.cmp(&b.operation_id));
    if !completed.is_empty() {
        println!();
        for handle in completed {
            print_handle(handle);
        }
    }

    if !report.remaining.is_empty() {
        println!();
        println!("{}", "Still pending:".bold());
        for operation_id in &report.remaining {
            println!("  {} {}", "•".yellow(), operation_id);
        }
    }
}

/// Print the error history of operations
pub fn print_error_history(results: &[OperationErrorsResult]) {
    if results.is_empty() {
        println!("{}", "No errors recorded.".green());
        return;
    }

    for result in results {
        println!(
            "{} {}",
            "Errors for".bold(),
            result.operation_id.as_deref().unwrap_or("<unknown>").cyan()
        );

        if let Some(code) = &result.request_error_code {
            println!(
                "  Request: {} {}",
                code.red(),
                result.request_error_details.as_deref().unwrap_or("")
            );
        }

        if result.operation_errors.is_empty() {
            println!("  {}", "none".dimmed());
        }

        for error in &result.operation_errors {
            let timestamp = error
                .timestamp
                .map(|t| t.format("%H:%M:%S").to_string())
                .unwrap_or_else(|| "--:--:--".to_string());
            println!(
                "  {} {} {}",
                timestamp.dimmed(),
                error.error_code.red(),
                error.error_details.as_deref().unwrap_or("")
            );
        }
    }
}

fn colorize_state(state: &OperationState) -> ColoredString {
    let state_str = state.to_string();
    match state {
        OperationState::Pending => state_str.yellow(),
        OperationState::Running => state_str.cyan(),
        OperationState::Blocked => state_str.magenta(),
        OperationState::Succeeded => state_str.green(),
        OperationState::Failed => state_str.red(),
        OperationState::Cancelled => state_str.dimmed(),
    }
}

fn colorize_outcome(outcome: &SessionOutcome) -> ColoredString {
    match outcome {
        SessionOutcome::Converged => outcome.label().green(),
        SessionOutcome::TimedOut => outcome.label().yellow(),
        SessionOutcome::Cancelled => outcome.label().dimmed(),
        SessionOutcome::Failed(_) => outcome.label().red(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use vmsched_tracker::{CompletionRegistry, triage};

    #[test]
    fn test_tracked_batch_is_one_json_document() {
        let results = vec![
            SubmissionResult::Accepted(OperationHandle::new("op-1", "vm-1", OperationState::Pending)),
            SubmissionResult::Accepted(OperationHandle::new("op-2", "vm-2", OperationState::Pending)),
        ];

        let mut registry = CompletionRegistry::new();
        registry.try_add(OperationHandle::new("op-1", "vm-1", OperationState::Succeeded));

        let report = BatchReport {
            triage: triage(results),
            session: Some(SessionReport {
                outcome: SessionOutcome::TimedOut,
                total: 2,
                registry,
                remaining: ["op-2".to_string()].into_iter().collect(),
                cycles: Vec::new(),
                elapsed: Duration::from_secs(120),
            }),
        };

        let json = serde_json::to_value(TrackingView::batch(&report, &[])).unwrap();

        assert_eq!(json["submission"]["requested"], 2);
        assert_eq!(json["submission"]["pollable"], serde_json::json!(["op-1", "op-2"]));
        assert_eq!(json["session"]["outcome"], "timed out");
        assert_eq!(json["session"]["completed"][0]["operationId"], "op-1");
        assert_eq!(json["session"]["remaining"], serde_json::json!(["op-2"]));
        assert!(json.get("errors").is_none());
        assert!(json["session"].get("error").is_none());
    }

    #[test]
    fn test_resumed_session_without_work_has_null_session() {
        let json = serde_json::to_value(TrackingView::session(None, &[])).unwrap();

        assert!(json.get("submission").is_none());
        assert!(json["session"].is_null());
    }
}
