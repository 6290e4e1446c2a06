//! EduAI CLI entry point.

use anyhow::Result;
use clap::Parser;
use eduai::cli::{commands, Cli, Commands};
use eduai::config::Settings;
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Load configuration
    let config_path = cli.config.as_ref().map(|p| Settings::expand_path(p));
    let settings = Settings::load_from(config_path.as_ref())?;

    // Initialize logging
    tracing_subscriber::registry()
        .with(EnvFilter::new(std::env::var("RUST_LOG").unwrap_or_else(|_| {
            format!("eduai={}", log_level(cli.verbose, &settings.general.log_level))
        })))
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();

    std::fs::create_dir_all(settings.data_dir())?;

    // Execute command
    match cli.command {
        Commands::Fetch { output, cutoff } => {
            commands::run_fetch(output, cutoff, settings).await?;
        }

        Commands::Serve { host, port } => {
            commands::run_serve(host, port, settings).await?;
        }

        Commands::Ask { question, sources } => {
            commands::run_ask(&question, sources, settings).await?;
        }

        Commands::Search { query, limit } => {
            commands::run_search(&query, limit, settings).await?;
        }

        Commands::Summary => {
            commands::run_summary(&settings)?;
        }

        Commands::Doctor => {
            let path: PathBuf = config_path.unwrap_or_else(Settings::default_config_path);
            commands::run_doctor(&settings, &path)?;
        }

        Commands::Config { action } => {
            commands::run_config(&action, config_path, settings)?;
        }
    }

    Ok(())
}

/// `-v` flags win over the configured level.
fn log_level(verbose: u8, configured: &str) -> &str {
    match verbose {
        0 => configured,
        1 => "info",
        2 => "debug",
        _ => "trace",
    }
}
