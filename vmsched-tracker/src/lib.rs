//! vmsched Tracker
//!
//! Tracks a submitted batch of virtual machine operations to completion.
//!
//! Architecture:
//! - Triage: split a submission response into rejected, blocked and pollable
//! - Registry: append-only record of operations that reached a terminal state
//! - Cadence: initial wait and fixed or exponential interval between queries
//! - Repositories: status and error-history lookups behind traits
//! - Scheduler: the polling session and batch-level glue
//!
//! A session ends converged, timed out, cancelled, or failed; only a failure
//! of the status query call itself counts as failed. Every outcome carries
//! the completions observed so far.

pub mod cadence;
pub mod config;
pub mod error;
pub mod registry;
pub mod repository;
pub mod scheduler;
pub mod triage;

pub use cadence::{CadencePolicy, Interval};
pub use config::{BackoffKind, TrackerConfig};
pub use error::TrackerError;
pub use registry::CompletionRegistry;
pub use repository::{ErrorQuery, HttpOperationRepository, StatusQuery};
pub use scheduler::{
    BatchReport, CycleSummary, PollingSession, SessionOutcome, SessionReport, track_batch,
};
pub use triage::{Triage, triage};
