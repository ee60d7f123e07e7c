mod cli;
mod clipboard;
mod source;
mod tui;
mod workflow;

use anyhow::{Context, Result};
use clap::Parser;
use std::fs::File;
use std::sync::Mutex;
use tracing_subscriber::EnvFilter;

fn init_logging(cli_args: &cli::Cli) -> Result<()> {
    let filter = match cli_args.verbose {
        0 => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("sharepick=info")),
        1 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    };

    if let Some(path) = &cli_args.log_file {
        let file = File::create(path)
            .with_context(|| format!("failed to create log file {}", path.display()))?;
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(Mutex::new(file))
            .with_ansi(false)
            .init();
    } else if cli_args.headless {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .init();
    }
    // The TUI owns the terminal, so without a log file nothing is logged.
    Ok(())
}

fn main() -> Result<()> {
    // Handle daemon mode first. This should stay in main.rs as it's an early exit.
    if clipboard::check_and_run_daemon_if_requested()? {
        return Ok(());
    }

    let cli_args = cli::Cli::parse();
    init_logging(&cli_args)?;

    workflow::run_sharepick(cli_args)
}
