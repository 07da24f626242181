use std::path::Path;

use anyhow::Context;
use ethers::types::Address;
use serde::{Deserialize, Serialize};

use crate::scanner::payload::PayloadKind;

pub const DEFAULT_POLL_INTERVAL_SECONDS: u64 = 60;

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct ScannerSettings {
    pub swapper_engine: Address,
    pub dao_collateral: Address,
    pub rwa_token: Address,
    pub max_range: Option<u64>,
    pub max_requests: Option<u32>,
    pub payload: PayloadKind,
}

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct Config {
    pub rpc_endpoint: String,
    pub db_connection_string: String,
    pub dev_mode: bool,
    pub poll_interval_seconds: Option<u64>,
    pub scanner: ScannerSettings,
}

pub fn get_config(alt_path: Option<String>) -> anyhow::Result<Config> {
    let default_path = confy::get_configuration_file_path("", "swapper-engine-watcher")
        .context("could not get default config path for platform")?
        .to_string_lossy()
        .to_string();
    let raw_path = alt_path.unwrap_or(default_path);
    let path = Path::new(raw_path.as_str())
        .canonicalize()
        .context(format!("could not canonicalize config path {raw_path}"))?
        .to_string_lossy()
        .to_string();

    tracing::info!("using path {} to read config", path);
    confy::load_path::<Config>(path).context("could not read config")
}
