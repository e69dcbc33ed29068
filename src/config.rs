use alloy::primitives::I256;
use dotenvy::dotenv;
use eyre::{eyre, Result};
use std::env;
use tracing::info;

use crate::networks::{find_network, Network};

#[derive(Debug, Clone)]
pub struct Config {
    pub network: Network,
    pub buffer_time_seconds: u64, // network default unless overridden
    pub minimum_balance_wei: I256,
    pub port: u16,
}

pub fn load() -> Result<Config> {
    dotenv().ok(); // .env is optional
    load_from(|key| env::var(key).ok())
}

/// Build the config from any variable source; every set variable must parse.
pub fn load_from(var: impl Fn(&str) -> Option<String>) -> Result<Config> {
    // Network by slug or chain id (default: Polygon)
    let network_key = var("NETWORK").unwrap_or_else(|| "polygon-mainnet".to_string());
    let network = *find_network(&network_key)?;

    // Buffer time override, mostly for local forks
    let buffer_time_seconds = match var("BUFFER_TIME_SECONDS") {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|e| eyre!("BUFFER_TIME_SECONDS={:?}: {}", raw, e))?,
        None => network.buffer_time_seconds,
    };

    // Balance under which an account counts as critical (default: 0)
    let minimum_balance_wei = match var("MINIMUM_BALANCE_WEI") {
        Some(raw) => I256::from_dec_str(raw.trim())
            .map_err(|e| eyre!("MINIMUM_BALANCE_WEI={:?}: {}", raw, e))?,
        None => I256::ZERO,
    };

    // API port (default: 8080)
    let port = match var("PORT") {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|e| eyre!("PORT={:?}: {}", raw, e))?,
        None => 8080,
    };

    let cfg = Config {
        network,
        buffer_time_seconds,
        minimum_balance_wei,
        port,
    };

    info!("Loaded config: {:?}", cfg);

    Ok(cfg)
}

impl Config {
    /// Config for a known network with its default buffer; used by tests and
    /// embedders that skip the environment.
    pub fn for_network(network: Network) -> Self {
        Self {
            buffer_time_seconds: network.buffer_time_seconds,
            network,
            minimum_balance_wei: I256::ZERO,
            port: 8080,
        }
    }
}
