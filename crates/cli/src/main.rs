//! Headless driver for the loadout engine: load the catalog and store,
//! apply one command, save.

mod commands;

use std::{
    fs::{self, OpenOptions},
    sync::Mutex,
};

use anyhow::{Context, Result};
use clap::Parser;
use loadout_core::{
    config::{self, AppConfig},
    CatalogLoader, StoreManager,
};
use tracing::{debug, info};
use tracing_subscriber::{prelude::*, EnvFilter};

use crate::commands::{execute, Cli};

fn main() -> Result<()> {
    init_logging()?;

    let cli = Cli::parse();

    config::ensure_default_config()?;
    let config = AppConfig::load()?;
    let data_dir = cli.data.unwrap_or_else(|| config.data_dir.clone());
    let store_dir = cli.store.unwrap_or_else(|| config.store_dir.clone());

    let catalog = CatalogLoader::new(data_dir).load()?;
    let store = StoreManager::new(store_dir);
    let mut roster = store.load_or_default(config.default_settings())?;
    roster.refresh(&catalog);

    let command = cli.command;
    let pilot_id = cli
        .pilot
        .unwrap_or_else(|| roster.current_pilot_id().to_string());
    debug!(?command, pilot = %pilot_id, "applying command");

    let mutates = command.mutates();
    let output = execute(&mut roster, &catalog, &pilot_id, command)?;
    if mutates {
        store.save(&roster)?;
    }
    if !output.is_empty() {
        println!("{output}");
    }
    info!("done");
    Ok(())
}

fn init_logging() -> Result<()> {
    let log_dir = std::env::current_dir()?.join("logs");
    fs::create_dir_all(&log_dir)
        .with_context(|| format!("failed to create {}", log_dir.display()))?;
    let log_path = log_dir.join("loadout.log");
    let log_file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_path)
        .with_context(|| format!("failed to open {}", log_path.display()))?;

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    let stderr_layer = tracing_subscriber::fmt::layer()
        .with_target(false)
        .compact()
        .with_writer(std::io::stderr);

    let file_layer = tracing_subscriber::fmt::layer()
        .with_target(true)
        .with_ansi(false)
        .compact()
        .with_writer(Mutex::new(log_file));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(stderr_layer)
        .with(file_layer)
        .init();

    Ok(())
}
