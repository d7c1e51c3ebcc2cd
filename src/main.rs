//! Kolosal Robust - Main Entry Point
//!
//! Robustness certification and fairness sensitivity search from the command line.

use clap::Parser;
use kolosal_robust::cli::{cmd_certify, cmd_patterns, cmd_sweep, Cli, Commands};

fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "kolosal_robust=info".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Certify { data, uncertainty, num } => {
            cmd_certify(&data, &uncertainty, num, cli.json)?;
        }
        Commands::Patterns { data, metric, threshold, parallel, decision_threshold, top } => {
            cmd_patterns(&data, metric, threshold, parallel, decision_threshold, top, cli.json)?;
        }
        Commands::Sweep { data, uncertainty, nums } => {
            cmd_sweep(&data, &uncertainty, &nums, cli.json)?;
        }
    }

    Ok(())
}
