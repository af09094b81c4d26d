mod console;

use std::{
    fs::{self, OpenOptions},
    sync::Arc,
};

use anyhow::Result;
use plantbot_core::{
    config::{self, AppConfig},
    Registry, Router, SnapshotStore, TickScheduler,
};
use tracing::{error, info};
use tracing_subscriber::{prelude::*, EnvFilter};

use crate::console::{ConsoleDirectory, ConsoleFrontend};

#[tokio::main]
async fn main() -> Result<()> {
    init_logging()?;

    let config_path = config::ensure_default_config()?;
    let config = AppConfig::load_from(&config_path)?;
    info!(
        "loaded {} (data in {}, tick every {}s)",
        config_path.display(),
        config.data_dir.display(),
        config.tick_interval_secs
    );

    let registry = Arc::new(Registry::new(SnapshotStore::new(&config.data_dir)));
    let scheduler = Arc::new(TickScheduler::new(config.tick_interval()));
    let router = Router::new(registry, Arc::clone(&scheduler));

    for &community in &config.communities {
        match router.open(community) {
            Ok(_) => info!("community {community} ready"),
            Err(err) => error!("community {community} unavailable: {err:#}"),
        }
    }

    let frontend = ConsoleFrontend::new(&router, config.command_prefix.clone());
    let directory = ConsoleDirectory::default();
    let result = frontend.run(&directory).await;

    scheduler.shutdown();
    result
}

fn init_logging() -> Result<()> {
    let log_dir = std::env::current_dir()?.join("logs");
    fs::create_dir_all(&log_dir)?;
    let log_path = log_dir.join("plantbot.log");

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    // Replies go to stdout, so console logging goes to stderr.
    let console_layer = tracing_subscriber::fmt::layer()
        .with_target(false)
        .compact()
        .with_writer(std::io::stderr);

    let file_layer = tracing_subscriber::fmt::layer()
        .with_target(true)
        .compact()
        .with_ansi(false)
        .with_writer(move || {
            OpenOptions::new()
                .create(true)
                .append(true)
                .open(&log_path)
                .expect("failed to open log file")
        });

    tracing_subscriber::registry()
        .with(env_filter)
        .with(console_layer)
        .with(file_layer)
        .init();

    Ok(())
}
