//! Operation command handlers
//!
//! One-shot status, error-history and cancel calls, plus resumed tracking
//! of operations submitted earlier.

use anyhow::{Context, Result};
use colored::*;
use std::collections::BTreeSet;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::warn;
use vmsched_client::new_correlation_id;
use vmsched_core::domain::operation::OperationState;
use vmsched_core::dto::operation::OperationErrorsResult;
use vmsched_tracker::{
    ErrorQuery, HttpOperationRepository, PollingSession, SessionOutcome, SessionReport,
};

use super::TrackArgs;
use crate::config::Config;
use crate::output;

/// Show the current state of operations
pub async fn status(config: &Config, operation_ids: &[String]) -> Result<()> {
    let client = config.client();
    let handles = client
        .get_operation_status(&config.location, operation_ids, &new_correlation_id())
        .await
        .context("Failed to get operation status")?;

    if config.json {
        output::print_json(&handles);
    } else {
        output::print_handles(&handles);
    }
    Ok(())
}

/// Show the error history of operations
pub async fn errors(config: &Config, operation_ids: &[String]) -> Result<()> {
    let client = config.client();
    let results = client
        .get_operation_errors(&config.location, operation_ids)
        .await
        .context("Failed to get operation errors")?;

    if config.json {
        output::print_json(&results);
    } else {
        output::print_error_history(&results);
    }
    Ok(())
}

/// Cancel scheduled operations
pub async fn cancel(config: &Config, operation_ids: &[String]) -> Result<()> {
    let client = config.client();
    let handles = client
        .cancel_operations(&config.location, operation_ids, &new_correlation_id())
        .await
        .context("Failed to cancel operations")?;

    if config.json {
        output::print_json(&handles);
        return Ok(());
    }

    println!(
        "{}",
        format!("Cancellation requested for {} operation(s):", handles.len()).bold()
    );
    output::print_handles(&handles);
    Ok(())
}

/// Resume tracking operations submitted earlier
pub async fn track(
    config: &Config,
    operation_ids: Vec<String>,
    args: &TrackArgs,
    cancel: CancellationToken,
) -> Result<()> {
    let tracker_config = args.tracker_config()?;
    let repository = Arc::new(HttpOperationRepository::new(
        Arc::new(config.client()),
        &config.location,
    ));

    let pollable: BTreeSet<String> = operation_ids.into_iter().collect();
    let Some(session) =
        PollingSession::from_config(repository.clone(), pollable, &tracker_config, cancel)
    else {
        if config.json {
            output::print_json(&output::TrackingView::session(None, &[]));
        } else {
            println!("{}", "Nothing to track.".yellow());
        }
        return Ok(());
    };

    let report = session.run().await;

    let errors = if args.show_errors {
        unsuccessful_errors(repository.as_ref(), &report).await
    } else {
        Vec::new()
    };

    if config.json {
        output::print_json(&output::TrackingView::session(Some(&report), &errors));
    } else {
        output::print_session_report(&report);
        if !errors.is_empty() {
            output::print_error_history(&errors);
        }
    }

    if let SessionOutcome::Failed(e) = report.outcome {
        return Err(e).context("Tracking stopped");
    }

    Ok(())
}

/// Error history of every completed operation that did not succeed
///
/// Best effort: a failed lookup is logged and yields no entries.
pub async fn unsuccessful_errors(
    query: &dyn ErrorQuery,
    report: &SessionReport,
) -> Vec<OperationErrorsResult> {
    let unsuccessful: Vec<String> = report
        .registry
        .iter()
        .filter(|h| h.state != OperationState::Succeeded)
        .map(|h| h.operation_id.clone())
        .collect();

    if unsuccessful.is_empty() {
        return Vec::new();
    }

    match query.query_errors(&unsuccessful).await {
        Ok(results) => results,
        Err(e) => {
            warn!("Failed to fetch error history: {}", e);
            Vec::new()
        }
    }
}
