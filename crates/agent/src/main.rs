//! # CryptoDevs DAO Agent CLI
//!
//! Command-line client for the CryptoDevs DAO: inspect the treasury and
//! proposals, create proposals, vote and execute.
//!
//! ## Commands
//!
//! - `status`: caller NFT balance, treasury (ETH) and proposal count
//!   - `--json`: Output as JSON
//! - `proposals`: every proposal with its phase and offered action
//!   - `--json`: Output as JSON
//! - `create --token-id <N>`: propose purchasing a Fake NFT token
//! - `vote --id <N> --choice <yay|nay>`: vote on an open proposal
//! - `execute --id <N>`: execute a proposal past its deadline
//!
//! ## Global Options
//!
//! - `--config <path>`: TOML config file
//! - `--rpc-url <url>`: JSON-RPC endpoint (overrides env and config)
//!
//! ## Environment Variables
//!
//! - `CRYPTODEVS_RPC_URL`: JSON-RPC endpoint (default: http://127.0.0.1:8545)
//! - `CRYPTODEVS_CHAIN_ID`: required chain id (default: 4)
//! - `CRYPTODEVS_DAO_ADDRESS`, `CRYPTODEVS_NFT_ADDRESS`: contract addresses
//! - `CRYPTODEVS_CONFIRMATION_TIMEOUT_SECS`: confirmation bound, 0 disables (default: 600)
//! - `CRYPTODEVS_POLL_INTERVAL_MS`: receipt polling interval (default: 2000)
//! - `CRYPTODEVS_HTTP_TIMEOUT_SECS`: per-request timeout (default: 30)
//! - `RUST_LOG`: log filter (default: info)

mod cmd_dao;
mod render;
mod settings;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;

use cryptodevs_client::{JsonRpcGateway, ProposalSynchronizer};
use cryptodevs_common::{VoteChoice, U256};

#[derive(Parser)]
#[command(version, about = "CryptoDevs DAO Agent CLI")]
struct Cli {
    /// TOML config file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// JSON-RPC endpoint URL (overrides CRYPTODEVS_RPC_URL and config)
    #[arg(long, global = true)]
    rpc_url: Option<String>,

    #[command(subcommand)]
    cmd: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show NFT balance, treasury balance and proposal count
    Status {
        /// Output in JSON format
        #[arg(long)]
        json: bool,
    },

    /// List all proposals
    Proposals {
        /// Output in JSON format
        #[arg(long)]
        json: bool,
    },

    /// Create a proposal to purchase a Fake NFT token
    Create {
        /// Fake NFT token id to purchase (decimal, up to uint256)
        #[arg(long, value_parser = parse_token_id)]
        token_id: U256,
    },

    /// Vote on a proposal
    Vote {
        /// Proposal id
        #[arg(long)]
        id: u64,
        /// yay or nay
        #[arg(long, value_parser = parse_choice)]
        choice: VoteChoice,
    },

    /// Execute a proposal whose deadline has passed
    Execute {
        /// Proposal id
        #[arg(long)]
        id: u64,
    },
}

/// Parse and validate vote choice.
fn parse_choice(s: &str) -> Result<VoteChoice, String> {
    s.parse::<VoteChoice>()
        .map_err(|_| format!("invalid choice '{}': must be 'yay' or 'nay'", s))
}

/// Parse a decimal uint256 token id.
fn parse_token_id(s: &str) -> Result<U256, String> {
    U256::from_str_radix(s, 10).map_err(|e| format!("invalid token id '{}': {}", s, e))
}

fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging();

    let cfg = settings::resolve_config(cli.config.as_deref(), cli.rpc_url.as_deref())?;
    info!(rpc_url = %cfg.rpc_url, chain_id = cfg.chain_id, "using endpoint");

    let gateway = Arc::new(JsonRpcGateway::new(&cfg)?);
    let sync = ProposalSynchronizer::from_config(gateway, &cfg);

    match cli.cmd {
        Commands::Status { json } => cmd_dao::handle_status(&sync, json).await?,
        Commands::Proposals { json } => cmd_dao::handle_proposals(&sync, json).await?,
        Commands::Create { token_id } => cmd_dao::handle_create(&sync, token_id).await?,
        Commands::Vote { id, choice } => cmd_dao::handle_vote(&sync, id, choice).await?,
        Commands::Execute { id } => cmd_dao::handle_execute(&sync, id).await?,
    }

    Ok(())
}
