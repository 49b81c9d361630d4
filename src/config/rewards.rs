//! Reward catalog seeds and redemption settings loaded from config.toml
//!
//! The `[[rewards]]` entries seed a new user's catalog. The optional
//! `[redemption]` table bounds how long the workflow waits on the token and
//! attestation gateways, and `[valuation]` sets the display rate of points in USD.

use crate::errors::{Error, Result};
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

const DEFAULT_MINT_TIMEOUT_SECS: u64 = 120;
const DEFAULT_ATTESTATION_TIMEOUT_SECS: u64 = 30;
const DEFAULT_USD_PER_POINT: f64 = 0.01;

/// Configuration structure representing the entire config.toml file
#[derive(Debug, Deserialize)]
pub struct Config {
    /// Catalog entries seeded for each new user
    #[serde(default)]
    pub rewards: Vec<RewardConfig>,
    /// Gateway timeouts for the redemption workflow
    #[serde(default)]
    pub redemption: RedemptionConfig,
    /// Display rate used to show balances in USD
    #[serde(default)]
    pub valuation: ValuationConfig,
}

/// Configuration for a single catalog entry
#[derive(Debug, Deserialize, Clone)]
pub struct RewardConfig {
    /// Name of the reward
    pub name: String,
    /// Cost in points
    pub cost: i64,
    /// Optional longer description
    #[serde(default)]
    pub description: Option<String>,
    /// Where and how the reward is collected
    pub collection_info: String,
}

/// Timeouts applied to the external calls of a redemption
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
pub struct RedemptionConfig {
    /// Seconds to wait for a mint to confirm
    #[serde(default = "default_mint_timeout_secs")]
    pub mint_timeout_secs: u64,
    /// Seconds to wait for an attestation to be recorded
    #[serde(default = "default_attestation_timeout_secs")]
    pub attestation_timeout_secs: u64,
}

const fn default_mint_timeout_secs() -> u64 {
    DEFAULT_MINT_TIMEOUT_SECS
}

const fn default_attestation_timeout_secs() -> u64 {
    DEFAULT_ATTESTATION_TIMEOUT_SECS
}

impl Default for RedemptionConfig {
    fn default() -> Self {
        Self {
            mint_timeout_secs: DEFAULT_MINT_TIMEOUT_SECS,
            attestation_timeout_secs: DEFAULT_ATTESTATION_TIMEOUT_SECS,
        }
    }
}

impl RedemptionConfig {
    /// How long to wait for the token gateway
    #[must_use]
    pub const fn mint_timeout(&self) -> Duration {
        Duration::from_secs(self.mint_timeout_secs)
    }

    /// How long to wait for the attestation gateway
    #[must_use]
    pub const fn attestation_timeout(&self) -> Duration {
        Duration::from_secs(self.attestation_timeout_secs)
    }
}

/// Fixed conversion rate from points (and reward tokens) to USD
#[derive(Debug, Deserialize, Clone, Copy, PartialEq)]
pub struct ValuationConfig {
    /// USD value of a single point
    #[serde(default = "default_usd_per_point")]
    pub usd_per_point: f64,
}

const fn default_usd_per_point() -> f64 {
    DEFAULT_USD_PER_POINT
}

impl Default for ValuationConfig {
    fn default() -> Self {
        Self {
            usd_per_point: DEFAULT_USD_PER_POINT,
        }
    }
}

impl ValuationConfig {
    /// Formats `points` as a USD amount with two decimals
    #[must_use]
    pub fn to_usd(&self, points: f64) -> String {
        format!("{:.2}", points * self.usd_per_point)
    }
}

/// Loads reward configuration from a TOML file
///
/// # Errors
/// Returns an error if:
/// - The file cannot be read
/// - The TOML syntax is invalid
/// - A reward has a negative cost
/// - The USD rate is negative or not a finite number
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<Config> {
    let contents = std::fs::read_to_string(path.as_ref()).map_err(|e| Error::Config {
        message: format!("Failed to read config file: {e}"),
    })?;

    parse_config(&contents)
}

/// Loads reward configuration from `REWARDS_CONFIG`, or ./config.toml when unset
pub fn load_default_config() -> Result<Config> {
    let path = std::env::var("REWARDS_CONFIG").unwrap_or_else(|_| "config.toml".to_string());
    tracing::debug!("Loading reward configuration from {}", path);
    load_config(path)
}

fn parse_config(contents: &str) -> Result<Config> {
    let config: Config = toml::from_str(contents).map_err(|e| Error::Config {
        message: format!("Failed to parse config.toml: {e}"),
    })?;

    if let Some(bad) = config.rewards.iter().find(|r| r.cost < 0) {
        return Err(Error::Config {
            message: format!("Reward '{}' has a negative cost", bad.name),
        });
    }

    let rate = config.valuation.usd_per_point;
    if !rate.is_finite() || rate < 0.0 {
        return Err(Error::Config {
            message: format!("Invalid usd_per_point: {rate}"),
        });
    }

    Ok(config)
}
