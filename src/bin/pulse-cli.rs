use anyhow::Result;
use clap::{Parser, Subcommand};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

use pulse::client::{fetch_all_counts, track_visit, DashboardView, HttpTransport, ReadinessPoller};
use pulse::config::ClientConfig;
use pulse::models::Month;
use pulse::process::ProcessId;

#[derive(Parser)]
#[command(name = "pulse-cli")]
#[command(about = "Spawn analytics processes and view their visit counts", long_about = None)]
struct Cli {
    /// Node URL (overrides PULSE_NODE_URL)
    #[arg(long, global = true)]
    node: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Spawn an analytics process and wait for it to become ready
    Spawn {
        /// Human-readable process label (overrides PROCESS_LABEL)
        #[arg(long)]
        label: Option<String>,
    },
    /// Report a visit to a page
    Visit {
        /// Process ID
        #[arg(long)]
        pid: String,
        /// Page path, e.g. /pricing
        #[arg(long)]
        page: String,
        /// Month name; defaults to the current month
        #[arg(long)]
        month: Option<Month>,
    },
    /// Fetch and display aggregate visit counts
    Dashboard {
        /// Process ID
        #[arg(long)]
        pid: String,
    },
    /// List processes known to the node
    Processes,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .init();

    let cli = Cli::parse();
    let mut config = ClientConfig::from_env()?;
    if let Some(node) = cli.node {
        config.node_url = node;
    }

    let transport = Arc::new(HttpTransport::new(
        &config.node_url,
        Some(config.client_id.clone()),
    ));

    match cli.command {
        Commands::Spawn { label } => {
            let label = label.unwrap_or_else(|| config.process_label.clone());
            let mut poller = ReadinessPoller::from_config(transport.clone(), &config);
            let outcome = poller.spawn_and_initialize(&label).await?;

            if outcome.is_ready() {
                println!("✓ Process ready after {} attempt(s)", outcome.attempts());
            } else {
                println!(
                    "⚠ Process did not confirm readiness after {} attempts; it may still come up",
                    outcome.attempts()
                );
            }
            println!("Your Process ID: {}", outcome.process_id);
            println!();
            println!("Report visits with:");
            println!(
                "  pulse-cli visit --pid {} --page /",
                outcome.process_id
            );
            println!("View analytics with:");
            println!("  pulse-cli dashboard --pid {}", outcome.process_id);
        }
        Commands::Visit { pid, page, month } => {
            let month = month.unwrap_or_else(Month::current);
            let ack = track_visit(transport.as_ref(), &ProcessId::from(pid), month, &page).await?;
            println!("✓ {}", ack);
        }
        Commands::Dashboard { pid } => {
            let counts = fetch_all_counts(transport.as_ref(), &ProcessId::from(pid)).await;
            print!("{}", DashboardView::new(counts.as_ref()));
        }
        Commands::Processes => {
            let processes = transport.processes().await?;
            if processes.is_empty() {
                println!("No processes found.");
            } else {
                println!("{:<45} {:<20} {:<15} {}", "Process ID", "Label", "Owner", "Spawned");
                println!("{}", "-".repeat(100));
                for process in processes {
                    println!(
                        "{:<45} {:<20} {:<15} {}",
                        process.id,
                        process.label,
                        process.owner.as_deref().unwrap_or("N/A"),
                        process.spawned_at.to_rfc3339()
                    );
                }
            }
        }
    }

    Ok(())
}
