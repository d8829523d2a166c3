mod cli;
mod commands;
mod config;
mod model;
mod scheduler;
mod timer;
mod ui;

use anyhow::{Context, Result};
use clap::Parser;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

fn main() -> Result<()> {
    let args = cli::Cli::parse();
    let command = args.command.unwrap_or(cli::Command::Tui);
    // The TUI owns stdout, so it logs to a file instead of stderr.
    let _guard = init_tracing(matches!(command, cli::Command::Tui))?;
    match command {
        cli::Command::Init => commands::init(),
        cli::Command::Config => commands::show_config(args.config),
        cli::Command::Countdown {
            text,
            duration,
            unit,
        } => commands::countdown(args.config, text, duration, unit),
        cli::Command::Tui => commands::tui(args.config),
    }
}

fn init_tracing(to_file: bool) -> Result<Option<WorkerGuard>> {
    let default_level = if to_file { "focus=info" } else { "focus=warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    if !to_file {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .with_target(true)
            .init();
        return Ok(None);
    }

    let dir = config::log_dir()?;
    std::fs::create_dir_all(&dir).with_context(|| format!("creating log directory {:?}", dir))?;
    let appender = tracing_appender::rolling::never(&dir, "focus.log");
    let (writer, guard) = tracing_appender::non_blocking(appender);
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(writer)
        .with_ansi(false)
        .with_target(true)
        .init();
    Ok(Some(guard))
}
