//! draftsafe CLI - operator tooling for draft backups and saves
//!
//! Inspects the local backup store, runs the recovery check a client performs
//! on load, and drives one scheduler-backed save against a document API.

mod cli;
mod commands;
mod config;
mod error;


use clap::{CommandFactory, Parser};

use crate::cli::{Cli, Commands};
use crate::commands::backup::run_backup;
use crate::commands::config::run_config;
use crate::commands::recover::run_recover;
use crate::commands::save::run_save;
use crate::config::{resolve_settings, CliConfig};
use crate::error::CliError;

#[tokio::main]
async fn main() {
    if let Err(error) = run().await {
        eprintln!("Error: {error}");
        std::process::exit(1);
    }
}

async fn run() -> Result<(), CliError> {
    dotenvy::dotenv().ok();
    init_tracing();

    let cli = Cli::parse();
    let config_path = cli.config.clone().or_else(config::default_config_path);
    let file_config = match &config_path {
        Some(path) => CliConfig::load_from_path(path)?,
        None => CliConfig::default(),
    };
    let settings = resolve_settings(file_config, cli.db_path, |key| std::env::var(key).ok())?;

    match cli.command {
        Some(Commands::Backup { command }) => run_backup(command, &settings.db_path)?,
        Some(Commands::Recover {
            id,
            remote_updated_at,
            json,
            discard,
        }) => run_recover(&id, remote_updated_at, json, discard, &settings)?,
        Some(Commands::Save {
            id,
            version_token,
            file,
        }) => run_save(&id, version_token, file.as_deref(), &settings).await?,
        Some(Commands::Config { command }) => {
            run_config(command, config_path.as_deref(), &settings)?;
        }
        None => {
            Cli::command().print_help()?;
            println!();
        }
    }

    Ok(())
}

fn init_tracing() {
    let mut filter = tracing_subscriber::EnvFilter::from_default_env();
    if let Ok(directive) = "draftsafe=info".parse() {
        filter = filter.add_directive(directive);
    }

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
