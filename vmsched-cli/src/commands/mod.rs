//! Commands module
//!
//! Defines all CLI commands and their handlers.

mod batch;
mod operation;

use anyhow::Result;
use clap::{Args, Subcommand, ValueEnum};
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use vmsched_core::domain::operation::OperationKind;
use vmsched_core::domain::request::{DeadlineType, RetryPolicy};
use vmsched_tracker::{BackoffKind, TrackerConfig};

use crate::config::Config;

/// Batch action
#[derive(ValueEnum, Clone, Copy, Debug)]
pub enum KindArg {
    Start,
    Deallocate,
    Hibernate,
}

impl From<KindArg> for OperationKind {
    fn from(kind: KindArg) -> Self {
        match kind {
            KindArg::Start => OperationKind::Start,
            KindArg::Deallocate => OperationKind::Deallocate,
            KindArg::Hibernate => OperationKind::Hibernate,
        }
    }
}

/// Meaning of a scheduled deadline
#[derive(ValueEnum, Clone, Copy, Debug)]
pub enum DeadlineTypeArg {
    InitiateAt,
    CompleteBy,
}

impl From<DeadlineTypeArg> for DeadlineType {
    fn from(kind: DeadlineTypeArg) -> Self {
        match kind {
            DeadlineTypeArg::InitiateAt => DeadlineType::InitiateAt,
            DeadlineTypeArg::CompleteBy => DeadlineType::CompleteBy,
        }
    }
}

/// Retry policy handed to the remote system
#[derive(Args, Debug, Clone)]
pub struct RetryArgs {
    /// Number of times the remote system retries a failed operation
    #[arg(long, default_value_t = 3)]
    retry_count: u32,

    /// Window, in minutes, in which those retries may happen
    #[arg(long, default_value_t = 60)]
    retry_window: u32,
}

impl From<RetryArgs> for RetryPolicy {
    fn from(args: RetryArgs) -> Self {
        RetryPolicy {
            retry_count: args.retry_count,
            retry_window_in_minutes: args.retry_window,
        }
    }
}

/// Polling overrides; unset values come from the environment or defaults
#[derive(Args, Debug, Clone)]
pub struct TrackArgs {
    /// Give up tracking after this many seconds
    #[arg(long)]
    timeout_secs: Option<u64>,

    /// Wait before the first status query, in seconds
    #[arg(long)]
    initial_wait_secs: Option<u64>,

    /// Wait between status queries, in seconds
    #[arg(long)]
    poll_interval_secs: Option<u64>,

    /// Grow the wait between status queries exponentially
    #[arg(long)]
    exponential: bool,

    /// Fetch the error history of operations that did not succeed
    #[arg(long)]
    show_errors: bool,
}

impl TrackArgs {
    /// Tracker configuration with these overrides applied
    pub fn tracker_config(&self) -> Result<TrackerConfig> {
        let mut config = TrackerConfig::from_env()?;

        if let Some(secs) = self.timeout_secs {
            config.timeout = Duration::from_secs(secs);
        }
        if let Some(secs) = self.initial_wait_secs {
            config.initial_wait = Duration::from_secs(secs);
        }
        if let Some(secs) = self.poll_interval_secs {
            config.poll_interval = Duration::from_secs(secs);
        }
        if self.exponential {
            config.backoff = BackoffKind::Exponential;
        }

        config.validate()?;
        Ok(config)
    }
}

/// Top-level CLI commands
#[derive(Subcommand)]
pub enum Commands {
    /// Run a batch operation now and track it to completion
    Execute {
        #[arg(value_enum)]
        kind: KindArg,

        /// Virtual machine resource ids
        #[arg(required = true)]
        resources: Vec<String>,

        #[command(flatten)]
        retry: RetryArgs,

        /// Print the submission result without tracking it
        #[arg(long)]
        no_track: bool,

        #[command(flatten)]
        track: TrackArgs,
    },
    /// Schedule a batch operation for a later time
    Submit {
        #[arg(value_enum)]
        kind: KindArg,

        /// Virtual machine resource ids
        #[arg(required = true)]
        resources: Vec<String>,

        /// When to run, as an RFC 3339 timestamp
        #[arg(long)]
        deadline: String,

        /// Time zone the schedule is expressed in
        #[arg(long, default_value = "UTC")]
        timezone: String,

        #[arg(long, value_enum, default_value = "initiate-at")]
        deadline_type: DeadlineTypeArg,

        #[command(flatten)]
        retry: RetryArgs,

        /// Track the scheduled operations after submitting
        #[arg(long)]
        track: bool,

        #[command(flatten)]
        track_args: TrackArgs,
    },
    /// Show the current state of operations
    Status {
        #[arg(required = true)]
        operation_ids: Vec<String>,
    },
    /// Show the error history of operations
    Errors {
        #[arg(required = true)]
        operation_ids: Vec<String>,
    },
    /// Cancel scheduled operations that have not started
    Cancel {
        #[arg(required = true)]
        operation_ids: Vec<String>,
    },
    /// Resume tracking previously submitted operations
    Track {
        #[arg(required = true)]
        operation_ids: Vec<String>,

        #[command(flatten)]
        track: TrackArgs,
    },
}

/// Handle a CLI command
///
/// Routes the command to the appropriate handler module.
///
/// # Arguments
/// * `command` - The command to execute
/// * `config` - The CLI configuration
/// * `cancel` - Cancelled on Ctrl-C; stops tracking early
pub async fn handle_command(
    command: Commands,
    config: &Config,
    cancel: CancellationToken,
) -> Result<()> {
    match command {
        Commands::Execute {
            kind,
            resources,
            retry,
            no_track,
            track,
        } => {
            let track = (!no_track).then_some(track);
            batch::execute(config, kind.into(), resources, retry.into(), track, cancel).await
        }
        Commands::Submit {
            kind,
            resources,
            deadline,
            timezone,
            deadline_type,
            retry,
            track,
            track_args,
        } => {
            let schedule = batch::parse_schedule(&deadline, timezone, deadline_type.into())?;
            let track = track.then_some(track_args);
            batch::submit(
                config,
                kind.into(),
                schedule,
                resources,
                retry.into(),
                track,
                cancel,
            )
            .await
        }
        Commands::Status { operation_ids } => operation::status(config, &operation_ids).await,
        Commands::Errors { operation_ids } => operation::errors(config, &operation_ids).await,
        Commands::Cancel { operation_ids } => operation::cancel(config, &operation_ids).await,
        Commands::Track {
            operation_ids,
            track,
        } => operation::track(config, operation_ids, &track, cancel).await,
    }
}
