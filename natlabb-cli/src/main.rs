//! ## natlabb-cli
//! **Operational frontend for the emulation-job layer**
//!
//! Runs a topology through the full job path (broker, router, workers,
//! result channel) in a single process, validates topology documents, and
//! fuzzes the retry policy.

use clap::Parser;
use natlabb_telemetry::logging::EventLogger;
use natlabb_telemetry::metrics::MetricsRecorder;

mod commands;

use commands::{Cli, Commands};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    EventLogger::init();
    let metrics = MetricsRecorder::new();
    let cli = Cli::parse();

    match cli.command {
        Commands::Emulate(args) => commands::run_emulate(args, metrics).await,
        Commands::Validate(args) => commands::run_validate(args).await,
        Commands::Fuzz(args) => commands::run_fuzz(args, metrics).await,
    }
}
