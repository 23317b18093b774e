//! Scheduler layer for the tracker
//!
//! This layer drives a submitted batch to completion: triage of the
//! submission response, then a polling session over the operations that
//! can still make progress.

pub mod batch;
pub mod session;

pub use batch::{BatchReport, track_batch};
pub use session::{CycleSummary, PollingSession, SessionOutcome, SessionReport};
