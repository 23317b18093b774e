//! vmsched CLI
//!
//! Command-line interface for submitting batch virtual machine operations
//! and tracking them to completion.

mod commands;
mod config;
mod output;

use anyhow::Result;
use clap::Parser;
use commands::{Commands, handle_command};
use config::Config;
use tokio_util::sync::CancellationToken;
use tracing::warn;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use vmsched_client::DEFAULT_BASE_URL;

#[derive(Parser)]
#[command(name = "vmsched")]
#[command(about = "Batch virtual machine operations with completion tracking", long_about = None)]
struct Cli {
    /// Management endpoint
    #[arg(long, env = "VMSCHED_BASE_URL", default_value = DEFAULT_BASE_URL)]
    base_url: String,

    /// Subscription that owns the target resources
    #[arg(long, env = "VMSCHED_SUBSCRIPTION_ID")]
    subscription: String,

    /// Location of the target resources (e.g. eastasia)
    #[arg(long, env = "VMSCHED_LOCATION")]
    location: String,

    /// Bearer token for the management endpoint
    #[arg(long, env = "VMSCHED_ACCESS_TOKEN", hide_env_values = true)]
    token: Option<String>,

    /// Print raw JSON instead of formatted output
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "vmsched=info,vmsched_client=info,vmsched_tracker=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    let config = Config {
        base_url: cli.base_url,
        subscription_id: cli.subscription,
        location: cli.location,
        token: cli.token,
        json: cli.json,
    };

    let cancel = CancellationToken::new();
    let ctrl_c = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupted, stopping after the current status query");
            ctrl_c.cancel();
        }
    });

    handle_command(cli.command, &config, cancel).await
}
