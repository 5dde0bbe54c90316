use config::{Config as ConfigLoader, Environment, File};
use serde::Deserialize;
use std::env;
use std::path::{Path, PathBuf};

use super::error::Error;
use common::numeric_kernel::DEFAULT_PROFIT_TOLERANCE;

#[derive(Debug, Deserialize, Clone)]
pub struct ExecutorConfig {
    pub buffer_size: usize,
}

#[derive(Debug, Deserialize, Clone)]
pub struct SearcherConfig {
    pub interval_seconds: u64,
    pub source_asset: String,
    #[serde(default = "default_tolerance")]
    pub tolerance: f64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ProducerConfig {
    pub snapshot_interval_ms: u64,
}

/// Starting price of one asset, expressed in the simulator's quote asset.
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct AssetPrice {
    pub symbol: String,
    pub price: f64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct SimulatorConfig {
    pub quote_asset: String,
    pub assets: Vec<AssetPrice>,
    pub interval_ms: u64,
    pub spread_bps: f64,
    pub volatility_bps: f64,
    /// Fixed RNG seed for reproducible runs; seeded from the OS when absent.
    #[serde(default)]
    pub seed: Option<u64>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub executor: ExecutorConfig,
    pub searcher: SearcherConfig,
    pub producer: ProducerConfig,
    pub simulator: SimulatorConfig,
}

fn default_tolerance() -> f64 {
    DEFAULT_PROFIT_TOLERANCE
}

impl Config {
    /// Rejects values the pipeline cannot run with.
    pub fn validate(&self) -> Result<(), Error> {
        let invalid = |reason: &str| Err(Error::ConfigLoadError(reason.to_string()));

        if self.executor.buffer_size == 0 {
            return invalid("executor.buffer_size must be greater than zero");
        }
        if self.searcher.interval_seconds == 0 {
            return invalid("searcher.interval_seconds must be greater than zero");
        }
        if self.searcher.source_asset.is_empty() {
            return invalid("searcher.source_asset must not be empty");
        }
        if !(self.searcher.tolerance.is_finite() && self.searcher.tolerance >= 0.0) {
            return invalid("searcher.tolerance must be a finite, non-negative number");
        }
        if self.simulator.interval_ms == 0 {
            return invalid("simulator.interval_ms must be greater than zero");
        }
        if self.simulator.assets.is_empty() {
            return invalid("simulator.assets must list at least one asset");
        }
        if !(self.simulator.spread_bps >= 0.0 && self.simulator.volatility_bps >= 0.0) {
            return invalid("simulator.spread_bps and simulator.volatility_bps must be non-negative");
        }

        Ok(())
    }
}

/// Default location of the configuration file, relative to the workspace root.
pub fn default_config_path() -> Result<PathBuf, Error> {
    let base_path = env::current_dir().map_err(|e| {
        Error::ConfigLoadError(format!("Failed to determine current directory: {}", e))
    })?;

    Ok(base_path
        .join("crates")
        .join("executor")
        .join("Config.toml"))
}

/// Loads configuration from a file and environment variables.
///
/// Environment variables use the `EXECUTOR_` prefix and `__` between nesting levels, e.g.
/// `EXECUTOR_SEARCHER__SOURCE_ASSET=ETH`.
pub fn load_config(path: Option<&Path>) -> Result<Config, Error> {
    let config_file_path = match path {
        Some(path) => path.to_path_buf(),
        None => default_config_path()?,
    };

    if !config_file_path.exists() {
        return Err(Error::ConfigLoadError(format!(
            "Configuration file not found at calculated path: {}",
            config_file_path.display()
        )));
    }

    let s = ConfigLoader::builder()
        .add_source(File::from(config_file_path.as_path()).required(true))
        .add_source(
            Environment::with_prefix("EXECUTOR")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        )
        .build()
        .map_err(|e| Error::ConfigLoadError(e.to_string()))?;

    let app_config: Config = s
        .try_deserialize()
        .map_err(|e| Error::ConfigLoadError(format!("Failed to deserialize config: {}", e)))?;

    app_config.validate()?;

    Ok(app_config)
}
