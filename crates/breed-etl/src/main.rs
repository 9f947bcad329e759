//! Breed ETL - Main entry point

use breed_common::logging::{init_logging, LogConfig, LogLevel};
use breed_etl::config::{load_dotenv, DatabaseConfig, FetchConfig, PipelineConfig};
use breed_etl::{commands, Cli, Commands};
use clap::Parser;
use std::process::ExitCode;
use tracing::error;

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    // .env must be loaded before clap reads env-backed flags
    load_dotenv();
    let cli = Cli::parse();

    let log_level = if cli.verbose {
        LogLevel::Debug
    } else {
        LogLevel::Info
    };

    let log_config = LogConfig::builder()
        .level(log_level)
        .log_file_prefix("breed-etl")
        .build();

    // Merge with environment variables (they take precedence)
    let log_config = log_config.clone().merge_env().unwrap_or(log_config);

    let _guard = match init_logging(&log_config) {
        Ok(guard) => guard,
        Err(e) => {
            eprintln!("Error: failed to initialize logging: {:#}", e);
            return ExitCode::FAILURE;
        },
    };

    // Return instead of exiting so `_guard` drops and flushes the log file.
    match execute_command(&cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = %e, "Command failed");
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        },
    }
}

async fn execute_command(cli: &Cli) -> anyhow::Result<()> {
    let lookup = cli.lookup();

    match cli.subcommand() {
        Commands::Run => {
            let config = PipelineConfig::from_lookup(&lookup)?;
            commands::run::run(config).await
        },
        Commands::InitSchema => {
            let config = DatabaseConfig::from_lookup(&lookup)?;
            commands::init_schema::run(config).await
        },
        Commands::Preview { limit } => {
            let config = FetchConfig::from_lookup(&lookup)?;
            commands::preview::run(config, limit).await
        },
        Commands::Status { days, recent } => {
            let config = DatabaseConfig::from_lookup(&lookup)?;
            commands::status::run(config, days, recent).await
        },
    }
}
