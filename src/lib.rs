pub mod cli;
pub mod core;
pub mod fakegecko;
pub mod providers;
pub mod server;
pub mod store;

use crate::core::config::AppConfig;
use crate::providers::coingecko::{self, CoinGeckoClient};
use crate::store::MemoryCryptoRepo;
use anyhow::{Context, Result};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

pub enum AppCommand {
    Serve { port: Option<u16> },
    FakeGecko { addr: SocketAddr, list_path: PathBuf },
}

pub async fn run_command(command: AppCommand, config_path: Option<&str>) -> Result<()> {
    match command {
        AppCommand::Serve { port } => {
            let config = load_config(config_path, port)?;
            run_server(config).await
        }
        AppCommand::FakeGecko { addr, list_path } => {
            let fake = fakegecko::FakeGecko::load(&list_path)?;
            fakegecko::serve(addr, fake).await
        }
    }
}

/// Loads the config file and layers the environment and `--port` on top.
pub fn load_config(config_path: Option<&str>, port: Option<u16>) -> Result<AppConfig> {
    let mut config = match config_path {
        Some(path) => AppConfig::load_from_path(path)?,
        None => AppConfig::load()?,
    };
    config.apply_env()?;
    if let Some(port) = port {
        config.server.port = port;
    }
    debug!("Loaded config: {config:#?}");
    Ok(config)
}

async fn run_server(config: AppConfig) -> Result<()> {
    info!("Crypto server starting...");

    let provider = &config.providers.coingecko;
    let base_url = coingecko::resolve_base_url(provider.base_url.as_deref()).await;
    let client = CoinGeckoClient::connect(&base_url, Duration::from_secs(provider.timeout_secs))
        .await
        .context("coingecko client initialization failed")?;

    let repo = Arc::new(MemoryCryptoRepo::new(Arc::new(client)));

    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port)
        .parse()
        .with_context(|| {
            format!(
                "Invalid listen address: {}:{}",
                config.server.host, config.server.port
            )
        })?;
    server::serve(addr, repo).await
}
