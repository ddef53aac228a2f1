use config::{Config, ConfigError, File};
use rust_decimal::prelude::FromPrimitive;
use rust_decimal::Decimal;
use serde::Deserialize;
use std::collections::HashMap;
use std::env;

use crate::chains::ChainId;
use crate::swap_executor::{DEFAULT_DEADLINE_MINUTES, DEFAULT_SLIPPAGE_PCT};

const RPC_URL_ENV_PREFIX: &str = "SDK_RPC_URL_";

#[derive(Debug, Deserialize, Clone, Default)]
pub struct Rpc {
    /// JSON-RPC endpoint per chain id, e.g. `3888 = "https://rpc.kalychain.io/rpc"`.
    #[serde(default)]
    pub endpoints: HashMap<String, String>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct SwapDefaults {
    #[serde(default = "default_slippage_pct")]
    pub slippage_pct: f64,
    #[serde(default = "default_deadline_minutes")]
    pub deadline_minutes: u64,
}

fn default_slippage_pct() -> f64 {
    0.5
}
fn default_deadline_minutes() -> u64 {
    DEFAULT_DEADLINE_MINUTES
}

impl Default for SwapDefaults {
    fn default() -> Self {
        Self {
            slippage_pct: default_slippage_pct(),
            deadline_minutes: default_deadline_minutes(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct LogSettings {
    #[serde(default = "default_log_level")]
    pub level: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LogSettings {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct Settings {
    #[serde(default)]
    pub rpc: Rpc,
    #[serde(default)]
    pub swap: SwapDefaults,
    #[serde(default)]
    pub log: LogSettings,
}

impl Settings {
    /// Loads `Config.toml` from the working directory when present, then
    /// applies `SDK_*` environment overrides.
    pub fn new() -> Result<Self, ConfigError> {
        Self::load(File::with_name("Config.toml").required(false))
    }

    pub fn from_file(path: &str) -> Result<Self, ConfigError> {
        Self::load(File::with_name(path))
    }

    fn load(source: File<config::FileSourceFile, config::FileFormat>) -> Result<Self, ConfigError> {
        let s = Config::builder().add_source(source).build()?;
        let mut settings: Self = s.try_deserialize()?;
        settings.apply_overrides(env::vars());
        Ok(settings)
    }

    /// Environment overrides:
    /// `SDK_RPC_URL_<CHAIN_ID>`, `SDK_SWAP_SLIPPAGE_PCT`, `SDK_SWAP_DEADLINE_MINUTES`.
    pub fn apply_overrides<I>(&mut self, vars: I)
    where
        I: IntoIterator<Item = (String, String)>,
    {
        for (key, value) in vars {
            let value = value.trim();
            if value.is_empty() {
                continue;
            }
            if let Some(chain) = key.strip_prefix(RPC_URL_ENV_PREFIX) {
                match chain.parse::<ChainId>() {
                    Ok(chain_id) => {
                        self.rpc.endpoints.insert(chain_id.to_string(), value.to_string());
                    }
                    Err(_) => log::warn!("Ignoring {}: not a chain id", key),
                }
                continue;
            }
            match key.as_str() {
                "SDK_SWAP_SLIPPAGE_PCT" => match value.parse() {
                    Ok(pct) => self.swap.slippage_pct = pct,
                    Err(e) => log::warn!("Failed to parse SDK_SWAP_SLIPPAGE_PCT: {}", e),
                },
                "SDK_SWAP_DEADLINE_MINUTES" => match value.parse() {
                    Ok(minutes) => self.swap.deadline_minutes = minutes,
                    Err(e) => log::warn!("Failed to parse SDK_SWAP_DEADLINE_MINUTES: {}", e),
                },
                _ => {}
            }
        }
    }

    pub fn rpc_url(&self, chain_id: ChainId) -> Option<&str> {
        self.rpc.endpoints.get(&chain_id.to_string()).map(String::as_str)
    }

    /// Configured endpoints keyed by chain id. Keys that are not numeric are
    /// skipped.
    pub fn endpoints(&self) -> Vec<(ChainId, &str)> {
        let mut endpoints: Vec<_> = self
            .rpc
            .endpoints
            .iter()
            .filter_map(|(chain, url)| Some((chain.parse().ok()?, url.as_str())))
            .collect();
        endpoints.sort_by_key(|(chain, _)| *chain);
        endpoints
    }

    pub fn default_slippage(&self) -> Decimal {
        Decimal::from_f64(self.swap.slippage_pct)
            .map(|d| d.round_dp(4))
            .unwrap_or(DEFAULT_SLIPPAGE_PCT)
    }
}
