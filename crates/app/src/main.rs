use std::process::ExitCode;

use clap::Parser;
use migration::{Migrator, MigratorTrait};
use tracing_subscriber::EnvFilter;

use crate::{cli::Cli, error::Result, settings::Settings};

mod cli;
mod commands;
mod error;
mod settings;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let settings = match Settings::new(cli.config.as_deref()) {
        Ok(settings) => settings,
        Err(err) => {
            eprintln!("failed to load settings: {err}");
            return ExitCode::FAILURE;
        }
    };

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(settings.log_filter()));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    match execute(&settings, cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            tracing::error!("command failed: {err}");
            eprintln!("error: {}", err.user_message());
            ExitCode::FAILURE
        }
    }
}

async fn execute(settings: &Settings, cli: Cli) -> Result<()> {
    let db = parse_database(&settings.database).await?;
    let engine = engine::Engine::builder().database(db).build().await?;

    let output = commands::run(&engine, &cli.owner, cli.command).await?;
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

async fn parse_database(config: &settings::Database) -> Result<sea_orm::DatabaseConnection> {
    tracing::debug!(?config, "connecting to database");
    let database = sea_orm::Database::connect(config.url()).await?;
    Migrator::up(&database, None).await?;
    Ok(database)
}
