mod scheduler;

use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};
use std::time::Duration;
use tokio::signal;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use backend::config::AppConfig;
use backend::state::AppState;

use crate::scheduler::RenewalScheduler;

#[derive(Parser)]
#[command(name = "watch-renewal")]
#[command(about = "Keeps the calendar and mailbox push subscriptions alive")]
struct Cli {
    /// Hours between renewals in `run` mode.
    ///
    /// Subscriptions expire after seven days, so this must stay below 168.
    #[arg(
        long,
        default_value_t = 144,
        env = "WATCH_RENEWAL_INTERVAL_HOURS",
        value_parser = clap::value_parser!(u64).range(1..168)
    )]
    interval_hours: u64,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Renew on a fixed interval until interrupted (default)
    Run,
    /// Renew once and exit
    Once {
        #[arg(value_enum, default_value_t = Target::All)]
        target: Target,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Target {
    Calendar,
    Gmail,
    All,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "watch_renewal=debug,backend=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();

    // Load configuration
    dotenv::dotenv().ok();
    let config = AppConfig::from_env()?;
    let state = AppState::from_config(config).await?;

    let interval = Duration::from_secs(cli.interval_hours * 3600);
    let scheduler = RenewalScheduler::new(state, interval);

    match cli.command.unwrap_or(Command::Run) {
        Command::Once { target } => scheduler.run_once(target).await,
        Command::Run => {
            let scheduler_handle = tokio::spawn(async move {
                if let Err(e) = scheduler.run().await {
                    tracing::error!("Scheduler error: {:?}", e);
                }
            });

            // Wait for shutdown signal
            tracing::info!("Watch renewal running. Press Ctrl+C to stop.");
            signal::ctrl_c().await?;
            tracing::info!("Shutdown signal received, stopping...");

            scheduler_handle.abort();
            tracing::info!("Watch renewal stopped");
            Ok(())
        }
    }
}
