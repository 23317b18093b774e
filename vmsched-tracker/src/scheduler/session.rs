//! Polling session
//!
//! Drives repeated status queries for one batch until every tracked
//! operation is terminal, the session deadline passes, or the caller
//! cancels. One session is a single sequential loop: one status query per
//! cycle covering every operation still pending, then one wait.

use std::collections::{BTreeSet, HashSet};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::{self, Instant};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use vmsched_client::new_correlation_id;
use vmsched_core::domain::operation::{OperationHandle, OperationState};

use crate::cadence::CadencePolicy;
use crate::config::TrackerConfig;
use crate::error::TrackerError;
use crate::registry::CompletionRegistry;
use crate::repository::StatusQuery;

/// Upper bound used when `start + timeout` does not fit in an `Instant`
const FAR_FUTURE: Duration = Duration::from_secs(86400 * 365 * 30);

/// How a polling session ended
#[derive(Debug)]
pub enum SessionOutcome {
    /// Every tracked operation reached a terminal state
    Converged,
    /// The deadline passed with operations still pending
    TimedOut,
    /// The caller cancelled the session
    Cancelled,
    /// The status query call itself failed
    Failed(TrackerError),
}

impl SessionOutcome {
    pub fn is_converged(&self) -> bool {
        matches!(self, SessionOutcome::Converged)
    }

    pub fn label(&self) -> &'static str {
        match self {
            SessionOutcome::Converged => "converged",
            SessionOutcome::TimedOut => "timed out",
            SessionOutcome::Cancelled => "cancelled",
            SessionOutcome::Failed(_) => "failed",
        }
    }
}

/// What one poll cycle observed
#[derive(Debug, Clone)]
pub struct CycleSummary {
    /// Zero-based cycle number
    pub cycle: u32,
    /// Number of operation ids queried
    pub queried: usize,
    /// Operations that became terminal in this cycle
    pub completed: Vec<OperationHandle>,
    /// Operations reported as blocked
    pub blocked: Vec<String>,
    /// Non-terminal operations that carried an error
    pub diagnostics: Vec<OperationHandle>,
    /// Queried ids the status response did not mention
    pub missing: Vec<String>,
    /// Operations still pending after this cycle
    pub remaining: usize,
}

/// Final state of a polling session
///
/// The registry holds every completion observed, whatever the outcome.
#[derive(Debug)]
pub struct SessionReport {
    pub outcome: SessionOutcome,
    /// Number of operations the session was created with
    pub total: usize,
    pub registry: CompletionRegistry,
    /// Operations that were still pending when the session ended
    pub remaining: BTreeSet<String>,
    pub cycles: Vec<CycleSummary>,
    pub elapsed: Duration,
}

impl SessionReport {
    /// Number of status queries that returned
    pub fn queries(&self) -> usize {
        self.cycles.len()
    }

    /// Pending operation count after each cycle
    pub fn remaining_history(&self) -> Vec<usize> {
        self.cycles.iter().map(|c| c.remaining).collect()
    }
}

/// Tracks one batch of operations to completion
pub struct PollingSession {
    query: Arc<dyn StatusQuery>,
    cadence: CadencePolicy,
    timeout: Duration,
    cancel: CancellationToken,
    total: usize,
    pollable: BTreeSet<String>,
    registry: CompletionRegistry,
    cycles: Vec<CycleSummary>,
}

impl PollingSession {
    /// Creates a session for the given operation ids
    ///
    /// Returns `None` when there is nothing to poll.
    pub fn new(
        query: Arc<dyn StatusQuery>,
        pollable: BTreeSet<String>,
        cadence: CadencePolicy,
        timeout: Duration,
        cancel: CancellationToken,
    ) -> Option<Self> {
        if pollable.is_empty() {
            return None;
        }

        Some(Self {
            query,
            cadence,
            timeout,
            cancel,
            total: pollable.len(),
            pollable,
            registry: CompletionRegistry::new(),
            cycles: Vec::new(),
        })
    }

    /// Creates a session using the timing from a tracker configuration
    pub fn from_config(
        query: Arc<dyn StatusQuery>,
        pollable: BTreeSet<String>,
        config: &TrackerConfig,
        cancel: CancellationToken,
    ) -> Option<Self> {
        Self::new(query, pollable, config.cadence(), config.timeout, cancel)
    }

    /// Runs the session to completion
    ///
    /// The deadline is fixed here, once, and covers the initial wait.
    pub async fn run(mut self) -> SessionReport {
        let started = Instant::now();
        let deadline = started
            .checked_add(self.timeout)
            .unwrap_or_else(|| started + FAR_FUTURE);

        info!(
            "Tracking {} operation(s) (initial wait {:?}, timeout {:?})",
            self.total, self.cadence.initial_wait, self.timeout
        );

        let outcome = self.poll_until_done(deadline).await;

        match &outcome {
            SessionOutcome::Converged => info!(
                "All {} operation(s) completed after {} quer(ies)",
                self.total,
                self.cycles.len()
            ),
            SessionOutcome::TimedOut | SessionOutcome::Cancelled => warn!(
                "Session {} with {}/{} operation(s) completed, {} still pending",
                outcome.label(),
                self.registry.len(),
                self.total,
                self.pollable.len()
            ),
            SessionOutcome::Failed(e) => warn!(
                "Session failed with {}/{} operation(s) completed: {}",
                self.registry.len(),
                self.total,
                e
            ),
        }

        SessionReport {
            outcome,
            total: self.total,
            registry: self.registry,
            remaining: self.pollable,
            cycles: self.cycles,
            elapsed: started.elapsed(),
        }
    }

    async fn poll_until_done(&mut self, deadline: Instant) -> SessionOutcome {
        if let Some(stop) = self.wait(self.cadence.initial_wait, deadline).await {
            return stop;
        }

        let mut cycle: u32 = 0;

        loop {
            if self.cancel.is_cancelled() {
                return SessionOutcome::Cancelled;
            }

            if Instant::now() >= deadline {
                return SessionOutcome::TimedOut;
            }

            let operation_ids: Vec<String> = self.pollable.iter().cloned().collect();
            let correlation_id = new_correlation_id();
            debug!(
                "Cycle {}: querying {} operation(s) (correlation {})",
                cycle + 1,
                operation_ids.len(),
                correlation_id
            );

            // Cancellation lets the query finish; only the deadline cuts it short
            let query = self.query.query_status(&operation_ids, &correlation_id);
            let handles = match time::timeout_at(deadline, query).await {
                Ok(Ok(handles)) => handles,
                Ok(Err(e)) => return SessionOutcome::Failed(e.into()),
                Err(_) => {
                    warn!("Status query still outstanding at the deadline");
                    return SessionOutcome::TimedOut;
                }
            };

            let summary = self.apply(cycle, &operation_ids, handles);
            report_cycle(&summary);
            self.cycles.push(summary);

            if self.registry.len() == self.total {
                return SessionOutcome::Converged;
            }

            if let Some(stop) = self.wait(self.cadence.delay_for(cycle), deadline).await {
                return stop;
            }

            cycle = cycle.saturating_add(1);
        }
    }

    /// Sleeps for `delay` unless cancelled or the deadline comes first
    async fn wait(&self, delay: Duration, deadline: Instant) -> Option<SessionOutcome> {
        let wake = Instant::now()
            .checked_add(delay)
            .map_or(deadline, |wake| wake.min(deadline));

        tokio::select! {
            biased;

            _ = self.cancel.cancelled() => Some(SessionOutcome::Cancelled),
            _ = time::sleep_until(wake) => (wake >= deadline).then_some(SessionOutcome::TimedOut),
        }
    }

    /// Folds one status response into the registry and the pollable set
    fn apply(
        &mut self,
        cycle: u32,
        queried: &[String],
        handles: Vec<OperationHandle>,
    ) -> CycleSummary {
        let mut seen = HashSet::with_capacity(handles.len());
        let mut completed = Vec::new();
        let mut blocked = Vec::new();
        let mut diagnostics = Vec::new();

        for handle in handles {
            if !self.pollable.contains(&handle.operation_id) {
                warn!(
                    "Ignoring status for untracked operation {}",
                    handle.operation_id
                );
                continue;
            }
            seen.insert(handle.operation_id.clone());

            if handle.is_terminal() {
                if self.registry.try_add(handle.clone()) {
                    completed.push(handle);
                }
            } else {
                if handle.state == OperationState::Blocked {
                    blocked.push(handle.operation_id.clone());
                }
                if handle.error.is_some() {
                    diagnostics.push(handle);
                }
            }
        }

        let missing: Vec<String> = queried
            .iter()
            .filter(|id| !seen.contains(id.as_str()))
            .cloned()
            .collect();

        self.pollable = self.registry.exclude_completed(&self.pollable);

        CycleSummary {
            cycle,
            queried: queried.len(),
            completed,
            blocked,
            diagnostics,
            missing,
            remaining: self.pollable.len(),
        }
    }
}

fn report_cycle(summary: &CycleSummary) {
    for handle in &summary.completed {
        match &handle.error {
            Some(error) => info!(
                "Operation {} completed with state {} ({})",
                handle.operation_id, handle.state, error
            ),
            None => info!(
                "Operation {} completed with state {}",
                handle.operation_id, handle.state
            ),
        }
    }

    for operation_id in &summary.blocked {
        warn!("Operation {} is blocked", operation_id);
    }

    for handle in &summary.diagnostics {
        if let Some(error) = &handle.error {
            warn!(
                "Operation {} is {} with error {}",
                handle.operation_id, handle.state, error
            );
        }
    }

    if !summary.missing.is_empty() {
        warn!(
            "Status response omitted {} operation(s): {}",
            summary.missing.len(),
            summary.missing.join(", ")
        );
    }

    info!(
        "Cycle {}: {} queried, {} completed, {} pending",
        summary.cycle + 1,
        summary.queried,
        summary.completed.len(),
        summary.remaining
    );
}
