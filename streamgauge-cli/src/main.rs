//! Streamgauge CLI - Command-line interface
//!
//! Runs named network scenarios through the QoE simulation and renders
//! their reports.

mod commands;

use clap::Parser;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "streamgauge")]
#[command(about = "A live-stream QoE simulator")]
struct Cli {
    #[command(subcommand)]
    command: commands::Commands,
}

fn main() -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let cli = Cli::parse();
    commands::handle_command(cli.command)
}
