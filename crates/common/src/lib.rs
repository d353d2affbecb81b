//! # CryptoDevs Common Crate
//!
//! Shared building blocks for the CryptoDevs DAO client.
//!
//! ## Modules
//! - `proposal`: `Proposal`, `VoteChoice`, per-proposal `ProposalPhase`
//! - `units`: wei → ether display formatting
//! - `abi`: `sol!` interfaces of the DAO/NFT contracts and call data builders
//! - `config`: TOML + environment configuration
//!
//! ## Usage
//! ```rust,ignore
//! let mut cfg = cryptodevs_common::config::load_from_file("cryptodevs.toml")?;
//! cfg.apply_env()?;
//! cfg.validate()?;
//! ```

pub mod abi;
pub mod config;
pub mod proposal;
pub mod units;

pub use config::{ClientConfig, ConfigError};
pub use proposal::{Proposal, ProposalPhase, VoteChoice};
pub use units::format_ether;

pub use alloy_primitives::{Address, B256, U256};

/// Transaction hash.
pub type TxHash = B256;
