// ABOUTME: Entry point for the taskroll CLI application.
// ABOUTME: Parses arguments, sets up logging, and maps failures to exit codes.

mod cli;
mod commands;

use clap::Parser;
use cli::{Cli, Commands};
use std::env;
use std::process::ExitCode;
use taskroll::config::Config;
use taskroll::error::{Error, Result};
use taskroll::output::{Output, OutputMode};

/// Exit code telling the caller to try the same command again later.
const EXIT_RETRYABLE: u8 = 75;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let config = match env::current_dir()
        .map_err(Error::from)
        .and_then(|cwd| Config::discover(&cwd))
    {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {e}");
            return ExitCode::FAILURE;
        }
    };
    taskroll::logging::init(cli.verbose, config.log_level.as_deref());

    match run(cli, config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            if !matches!(e, Error::ReleaseFailed { .. }) {
                eprintln!("Error: {e}");
            }
            if e.is_retryable() {
                ExitCode::from(EXIT_RETRYABLE)
            } else {
                ExitCode::FAILURE
            }
        }
    }
}

async fn run(cli: Cli, config: Config) -> Result<()> {
    let ctx = commands::Context::new(config, cli.platform);
    match cli.command {
        Commands::Init { input } => commands::init(&ctx, &input),
        Commands::Deploy { input } => commands::deploy_service(&ctx, &input).await,
        Commands::Task { input } => commands::deploy_task(&ctx, &input).await,
        Commands::Validate { input } => commands::validate(&ctx, &input).await,
        Commands::Run { input, quiet, json } => {
            let mode = if json {
                OutputMode::Json
            } else if quiet {
                OutputMode::Quiet
            } else {
                OutputMode::Normal
            };
            commands::run(&ctx, &input, Output::new(mode)).await
        }
    }
}
