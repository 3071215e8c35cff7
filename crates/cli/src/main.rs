use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use spirit_engine::{EngineConfig, LogFormat};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

mod commands;
mod run;

use commands::Cli;

#[tokio::main]
async fn main() -> Result<ExitCode> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let config = EngineConfig::from_env().context("Invalid configuration")?;
    init_tracing(config.log_format);

    let pool = spirit_db::create_pool(&config.database_url, config.max_connections)
        .await
        .context("Failed to connect to database")?;
    tracing::debug!(max_connections = config.max_connections, "Database connection pool created");

    spirit_db::health_check(&pool)
        .await
        .context("Database health check failed")?;

    run::run(cli.command, pool, &config).await
}

/// Logs go to stderr so stdout carries only command output.
fn init_tracing(format: LogFormat) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "spirit_cli=info,spirit_engine=debug,spirit_db=info".into());
    let registry = tracing_subscriber::registry().with(filter);

    match format {
        LogFormat::Text => registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init(),
        LogFormat::Json => registry
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .init(),
    }
}
