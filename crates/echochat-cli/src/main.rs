mod cli;
mod commands;
mod completions;
mod config;
mod error;
mod output;

use anyhow::Result;
use clap::Parser;
use cli::{Cli, Commands};
use config::{CliConfig, Settings};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    if let Err(err) = run(cli).await {
        error::handle_error(err);
    }
}

async fn run(cli: Cli) -> Result<()> {
    if let Some(Commands::Completions { shell }) = cli.command {
        completions::generate_completions(shell);
        return Ok(());
    }

    // Log to a file so streamed output on stdout stays clean
    let _guard = init_logging(cli.verbose);

    let config = CliConfig::load();
    let settings = Settings::resolve(&cli, &config);
    tracing::debug!(server_url = %settings.server_url, "Resolved client settings");

    match cli.command {
        Some(Commands::Send(args)) => commands::send::run(&settings, args, cli.format).await,
        Some(Commands::Chat) | None => commands::chat::run(&settings, cli.format).await,
        Some(Commands::Completions { .. }) => Ok(()),
    }
}

fn init_logging(verbose: bool) -> Option<WorkerGuard> {
    let log_dir = dirs::data_dir()?.join("echochat").join("logs");
    std::fs::create_dir_all(&log_dir).ok()?;

    let file_appender = RollingFileAppender::builder()
        .rotation(Rotation::DAILY)
        .filename_prefix("echochat")
        .filename_suffix("log")
        .build(log_dir)
        .ok()?;
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    let default_level = if verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_writer(non_blocking)
        .with_env_filter(filter)
        .with_ansi(false)
        .with_target(false)
        .with_level(true)
        .init();

    Some(guard)
}
