//! CLI shell: argument parsing, logging setup, cancellation wiring.

use std::sync::Arc;

use clap::{Parser, Subcommand};
use tokio_util::sync::CancellationToken;
use tracing::error;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use cfnvisor::{exit, CloudFormationClient, Config, DriftCoordinator, TailSupervisor};

#[derive(Parser)]
#[command(name = "cfnvisor")]
#[command(about = "Follow CloudFormation stack events and detect drift", version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Follow the events of a stack and its nested stacks until the
    /// running operation finishes
    Tail {
        /// Stack name or ARN
        stack: String,
    },
    /// Detect drift of one or more stacks and wait for the results
    Drift {
        /// Stack names or ARNs
        stacks: Vec<String>,

        /// Detect drift of all active stacks (positional names are ignored)
        #[arg(short, long)]
        all: bool,

        /// Include nested stacks recursively
        #[arg(short, long)]
        recursive: bool,
    },
}

#[tokio::main]
async fn main() {
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    let cancel = CancellationToken::new();
    {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                cancel.cancel();
            }
        });
    }

    let client = Arc::new(CloudFormationClient::from_env().await);
    let cfg = Config::default();

    match cli.command {
        Commands::Tail { stack } => {
            let supervisor = TailSupervisor::new(client, cfg);
            let mut events = supervisor.start(stack, cancel);
            while let Some(event) = events.recv().await {
                println!("{}", cfnvisor::format_event(&event));
            }
        }
        Commands::Drift {
            stacks,
            all,
            recursive,
        } => {
            let coordinator = DriftCoordinator::new(client, cfg);
            let result = if all {
                coordinator.run_all(&cancel).await
            } else {
                coordinator.run(&stacks, recursive, &cancel).await
            };
            if let Err(e) = result {
                if !e.is_cancelled() {
                    error!(error = %e, "drift detection failed");
                    exit::raise(1);
                }
            }
        }
    }

    std::process::exit(exit::status());
}
