//! Client configuration loaded from TOML and overridden from environment.
//!
//! Resolution order (highest first): CLI flags (applied by the binary),
//! environment variables, TOML file, built-in defaults.
//!
//! ## Environment Variables
//!
//! - `CRYPTODEVS_RPC_URL`
//! - `CRYPTODEVS_CHAIN_ID`
//! - `CRYPTODEVS_DAO_ADDRESS`
//! - `CRYPTODEVS_NFT_ADDRESS`
//! - `CRYPTODEVS_CONFIRMATION_TIMEOUT_SECS` (`0` = wait indefinitely)
//! - `CRYPTODEVS_POLL_INTERVAL_MS`
//! - `CRYPTODEVS_HTTP_TIMEOUT_SECS`

use std::fs;
use std::path::Path;
use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;

use alloy_primitives::Address;

/// Default node endpoint.
pub const DEFAULT_RPC_URL: &str = "http://127.0.0.1:8545";

/// Rinkeby.
pub const DEFAULT_CHAIN_ID: u64 = 4;

/// Upper bound on a single confirmation wait.
pub const DEFAULT_CONFIRMATION_TIMEOUT_SECS: u64 = 600;

/// Receipt polling cadence.
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 2_000;

/// Per-request HTTP timeout.
pub const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 30;

pub const ENV_RPC_URL: &str = "CRYPTODEVS_RPC_URL";
pub const ENV_CHAIN_ID: &str = "CRYPTODEVS_CHAIN_ID";
pub const ENV_DAO_ADDRESS: &str = "CRYPTODEVS_DAO_ADDRESS";
pub const ENV_NFT_ADDRESS: &str = "CRYPTODEVS_NFT_ADDRESS";
pub const ENV_CONFIRMATION_TIMEOUT_SECS: &str = "CRYPTODEVS_CONFIRMATION_TIMEOUT_SECS";
pub const ENV_POLL_INTERVAL_MS: &str = "CRYPTODEVS_POLL_INTERVAL_MS";
pub const ENV_HTTP_TIMEOUT_SECS: &str = "CRYPTODEVS_HTTP_TIMEOUT_SECS";

// ════════════════════════════════════════════════════════════════════════════════
// ERROR
// ════════════════════════════════════════════════════════════════════════════════

/// Configuration loading or validation failure.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid value for {key}: '{value}'")]
    InvalidValue { key: String, value: String },

    #[error("invalid configuration: {0}")]
    Invalid(String),
}

// ════════════════════════════════════════════════════════════════════════════════
// CONFIG
// ════════════════════════════════════════════════════════════════════════════════

/// Connection and contract settings for the DAO client.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ClientConfig {
    /// Node JSON-RPC endpoint (the wallet-mediated provider).
    pub rpc_url: String,
    /// Required network identity.
    pub chain_id: u64,
    /// Governance contract; its ether balance is the treasury.
    pub dao_address: Address,
    /// Membership NFT contract.
    pub nft_address: Address,
    /// Confirmation wait bound in seconds. `0` disables the bound.
    pub confirmation_timeout_secs: u64,
    /// Receipt polling interval in milliseconds.
    pub poll_interval_ms: u64,
    /// Per-request HTTP timeout in seconds.
    pub http_timeout_secs: u64,
}

impl Default for ClientConfig {
    fn default() -> Self {
        ClientConfig {
            rpc_url: DEFAULT_RPC_URL.to_string(),
            chain_id: DEFAULT_CHAIN_ID,
            dao_address: Address::ZERO,
            nft_address: Address::ZERO,
            confirmation_timeout_secs: DEFAULT_CONFIRMATION_TIMEOUT_SECS,
            poll_interval_ms: DEFAULT_POLL_INTERVAL_MS,
            http_timeout_secs: DEFAULT_HTTP_TIMEOUT_SECS,
        }
    }
}

impl ClientConfig {
    /// Applies overrides from the process environment.
    pub fn apply_env(&mut self) -> Result<(), ConfigError> {
        self.apply_overrides(|key| std::env::var(key).ok())
    }

    /// Applies overrides from an arbitrary key lookup. Empty values are
    /// ignored.
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(v) = get(ENV_RPC_URL) {
            self.rpc_url = v.trim().to_string();
        }
        if let Some(v) = get(ENV_CHAIN_ID) {
            self.chain_id = parse_u64(ENV_CHAIN_ID, &v)?;
        }
        if let Some(v) = get(ENV_DAO_ADDRESS) {
            self.dao_address = parse_address(ENV_DAO_ADDRESS, &v)?;
        }
        if let Some(v) = get(ENV_NFT_ADDRESS) {
            self.nft_address = parse_address(ENV_NFT_ADDRESS, &v)?;
        }
        if let Some(v) = get(ENV_CONFIRMATION_TIMEOUT_SECS) {
            self.confirmation_timeout_secs = parse_u64(ENV_CONFIRMATION_TIMEOUT_SECS, &v)?;
        }
        if let Some(v) = get(ENV_POLL_INTERVAL_MS) {
            self.poll_interval_ms = parse_u64(ENV_POLL_INTERVAL_MS, &v)?;
        }
        if let Some(v) = get(ENV_HTTP_TIMEOUT_SECS) {
            self.http_timeout_secs = parse_u64(ENV_HTTP_TIMEOUT_SECS, &v)?;
        }
        Ok(())
    }

    /// Rejects settings the client cannot run with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.rpc_url.trim().is_empty() {
            return Err(ConfigError::Invalid("rpc_url is empty".to_string()));
        }
        if self.dao_address.is_zero() {
            return Err(ConfigError::Invalid(format!(
                "dao_address is not set (use {} or the config file)",
                ENV_DAO_ADDRESS
            )));
        }
        if self.nft_address.is_zero() {
            return Err(ConfigError::Invalid(format!(
                "nft_address is not set (use {} or the config file)",
                ENV_NFT_ADDRESS
            )));
        }
        if self.poll_interval_ms == 0 {
            return Err(ConfigError::Invalid("poll_interval_ms must be > 0".to_string()));
        }
        if self.http_timeout_secs == 0 {
            return Err(ConfigError::Invalid("http_timeout_secs must be > 0".to_string()));
        }
        Ok(())
    }

    /// Confirmation bound, `None` when disabled.
    pub fn confirmation_timeout(&self) -> Option<Duration> {
        match self.confirmation_timeout_secs {
            0 => None,
            secs => Some(Duration::from_secs(secs)),
        }
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn http_timeout(&self) -> Duration {
        Duration::from_secs(self.http_timeout_secs)
    }
}

fn parse_u64(key: &str, value: &str) -> Result<u64, ConfigError> {
    value.trim().parse().map_err(|_| ConfigError::InvalidValue {
        key: key.to_string(),
        value: value.to_string(),
    })
}

fn parse_address(key: &str, value: &str) -> Result<Address, ConfigError> {
    value.parse().map_err(|_| ConfigError::InvalidValue {
        key: key.to_string(),
        value: value.to_string(),
    })
}

/// Load config from a TOML file path. Missing keys take defaults.
pub fn load_from_file(path: impl AsRef<Path>) -> Result<ClientConfig, ConfigError> {
    let s = fs::read_to_string(path.as_ref())?;
    let cfg: ClientConfig = toml::from_str(&s)?;
    Ok(cfg)
}
