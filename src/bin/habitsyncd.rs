use std::path::PathBuf;

use anyhow::Result;
use log::info;

use habitsync::{SyncEngine, SyncPaths};

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Info)
        .init();

    let base = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(default_base_dir);
    let paths = SyncPaths::from_base(&base).with_env_overrides();

    info!("habitsyncd starting; data dir {}", base.display());
    let engine = SyncEngine::start(paths).await?;

    tokio::signal::ctrl_c().await?;
    info!("habitsyncd shutting down");
    engine.shutdown().await;

    Ok(())
}

fn default_base_dir() -> PathBuf {
    match std::env::var_os("HOME") {
        Some(home) => PathBuf::from(home).join(".habitsync"),
        None => PathBuf::from(".habitsync"),
    }
}
