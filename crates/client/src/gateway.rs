//! # Chain Gateway: Wallet-Mediated RPC Boundary
//!
//! [`ChainGateway`] is the async trait the synchronizer talks to. It hides
//! whether calls go to a real node over JSON-RPC
//! ([`crate::json_rpc::JsonRpcGateway`]) or to an in-memory DAO
//! ([`crate::mock_gateway::MockChainGateway`]).
//!
//! ```text
//! ProposalSynchronizer
//!      │
//!      ├─ reads:   chain_id, treasury_balance, proposal_count,
//!      │           proposal(id), nft_balance_of(owner)
//!      ├─ wallet:  connect_wallet, signer
//!      └─ writes:  submit_create_proposal, submit_vote, submit_execute,
//!                  wait_for_receipt
//!      │
//!      ▼
//! dyn ChainGateway
//! ```
//!
//! ## Contract
//!
//! - Implementations MUST NOT retry internally.
//! - Implementations MUST NOT check the chain id on their own; the
//!   synchronizer does that before every operation.
//! - A contract revert MUST surface as [`GatewayError::Reverted`] carrying
//!   the decoded reason where one is available.
//! - `wait_for_receipt` MAY wait indefinitely; bounding it is the
//!   caller's job.

use async_trait::async_trait;
use thiserror::Error;

use cryptodevs_common::{Address, Proposal, TxHash, VoteChoice, U256};

// ════════════════════════════════════════════════════════════════════════════════
// ERROR
// ════════════════════════════════════════════════════════════════════════════════

/// Failure reported by a gateway implementation.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum GatewayError {
    /// No wallet / no unlocked account is available.
    #[error("wallet unavailable: {0}")]
    WalletUnavailable(String),

    /// The wallet holder declined the request.
    #[error("request rejected by wallet holder")]
    UserRejected,

    /// The contract rejected the call.
    #[error("execution reverted: {reason}")]
    Reverted {
        /// Revert reason string, or a generic description.
        reason: String,
    },

    /// Node returned a JSON-RPC error that is not a revert.
    #[error("rpc error {code}: {message}")]
    Rpc {
        /// JSON-RPC error code.
        code: i64,
        /// JSON-RPC error message.
        message: String,
    },

    /// Transport-level failure.
    #[error("network error: {0}")]
    Network(String),

    /// Response could not be parsed.
    #[error("malformed response: {0}")]
    Malformed(String),
}

// ════════════════════════════════════════════════════════════════════════════════
// RECEIPT
// ════════════════════════════════════════════════════════════════════════════════

/// Mined transaction receipt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TxReceipt {
    /// Hash returned at submission.
    pub tx_hash: TxHash,
    /// Block that included the transaction.
    pub block_number: u64,
    /// `false` when the transaction was mined but reverted.
    pub success: bool,
}

// ════════════════════════════════════════════════════════════════════════════════
// TRAIT
// ════════════════════════════════════════════════════════════════════════════════

/// Async boundary to the chain node, mediated by the wallet.
///
/// The trait is object-safe and requires `Send + Sync` for use behind
/// `Arc<dyn ChainGateway>` across tasks.
#[async_trait]
pub trait ChainGateway: Send + Sync {
    /// Asks the wallet for account access and returns the selected account.
    async fn connect_wallet(&self) -> Result<Address, GatewayError>;

    /// Network identity of the connected node.
    async fn chain_id(&self) -> Result<u64, GatewayError>;

    /// Re-obtains the signing account. Called before every write.
    async fn signer(&self) -> Result<Address, GatewayError>;

    /// Native balance held by the DAO contract, in wei.
    async fn treasury_balance(&self) -> Result<U256, GatewayError>;

    /// `numProposals()`.
    async fn proposal_count(&self) -> Result<u64, GatewayError>;

    /// `proposals(id)`.
    async fn proposal(&self, id: u64) -> Result<Proposal, GatewayError>;

    /// Membership NFT `balanceOf(owner)`.
    async fn nft_balance_of(&self, owner: Address) -> Result<U256, GatewayError>;

    /// Submits `createProposal(nftTokenId)` from `from`.
    async fn submit_create_proposal(
        &self,
        from: Address,
        nft_token_id: U256,
    ) -> Result<TxHash, GatewayError>;

    /// Submits `voteOnProposal(id, choice)` from `from`.
    async fn submit_vote(
        &self,
        from: Address,
        proposal_id: u64,
        choice: VoteChoice,
    ) -> Result<TxHash, GatewayError>;

    /// Submits `executeProposal(id)` from `from`.
    async fn submit_execute(&self, from: Address, proposal_id: u64) -> Result<TxHash, GatewayError>;

    /// Suspends until the transaction is mined.
    async fn wait_for_receipt(&self, tx_hash: TxHash) -> Result<TxReceipt, GatewayError>;
}
