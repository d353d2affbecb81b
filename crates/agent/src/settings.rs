//! # Client Settings Resolution
//!
//! Resolution order, highest priority first:
//! 1. `--rpc-url <url>` argument
//! 2. `CRYPTODEVS_*` environment variables
//! 3. `--config <path>` TOML file
//! 4. Built-in defaults
//!
//! The merged result is validated before any gateway is built.

use std::path::Path;

use anyhow::{Context, Result};

use cryptodevs_common::config::load_from_file;
use cryptodevs_common::ClientConfig;

/// Resolves settings from the process environment.
pub fn resolve_config(config_path: Option<&Path>, rpc_url_arg: Option<&str>) -> Result<ClientConfig> {
    resolve_config_with(config_path, rpc_url_arg, |key| std::env::var(key).ok())
}

/// Resolves settings from an explicit environment lookup.
pub fn resolve_config_with<F>(
    config_path: Option<&Path>,
    rpc_url_arg: Option<&str>,
    env: F,
) -> Result<ClientConfig>
where
    F: Fn(&str) -> Option<String>,
{
    let mut cfg = match config_path {
        Some(path) => load_from_file(path)
            .with_context(|| format!("loading config from '{}'", path.display()))?,
        None => ClientConfig::default(),
    };

    cfg.apply_overrides(env)?;

    if let Some(url) = rpc_url_arg.map(str::trim).filter(|u| !u.is_empty()) {
        cfg.rpc_url = url.to_string();
    }

    cfg.validate()?;
    Ok(cfg)
}
