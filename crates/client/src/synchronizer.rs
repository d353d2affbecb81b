//! # Proposal Lifecycle Synchronizer
//!
//! Keeps an in-memory mirror of DAO contract state consistent with the
//! chain across asynchronous transaction confirmation.
//!
//! ## Operation Flow
//!
//! ```text
//! connect()
//!   ├─ wallet handshake
//!   ├─ chain id check ──✗──▶ WrongNetwork (connected = false, no reads)
//!   └─ initial refresh: treasury ┐
//!                       nft bal. ├─ independent, each error isolated
//!                       count    ┘
//!
//! create / vote / execute
//!   ├─ claim busy gate ──✗──▶ Busy (nothing submitted)
//!   ├─ chain id check
//!   ├─ signer
//!   ├─ submit
//!   ├─ wait for receipt (bounded)
//!   ├─ release busy gate
//!   └─ refresh: create → count, vote/execute → full proposal set
//! ```
//!
//! ## Invariants
//!
//! - Every operation checks the chain id before any other gateway call.
//! - At most one write is in flight; a second is refused before any
//!   gateway call.
//! - A failed write leaves every snapshot entry unchanged.
//! - `fetch_all_proposals` replaces the proposal set atomically or not at
//!   all.
//! - The proposal count never decreases and executed proposals never
//!   revert.
//! - No retry anywhere.

use std::sync::Arc;
use std::time::Duration;

use futures::future::try_join_all;
use parking_lot::RwLock;
use tracing::{error, info, warn};

use cryptodevs_common::{ClientConfig, Proposal, TxHash, VoteChoice, U256};

use crate::error::{classify, OpKind, SyncError};
use crate::gateway::{ChainGateway, TxReceipt};
use crate::session::SessionState;
use crate::snapshot::{merge_proposals, DaoSnapshot};

// ════════════════════════════════════════════════════════════════════════════════
// WRITE CALLS
// ════════════════════════════════════════════════════════════════════════════════

/// A state-changing contract call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteCall {
    CreateProposal { nft_token_id: U256 },
    Vote { proposal_id: u64, choice: VoteChoice },
    Execute { proposal_id: u64 },
}

impl WriteCall {
    fn label(&self) -> &'static str {
        match self {
            WriteCall::CreateProposal { .. } => "createProposal",
            WriteCall::Vote { .. } => "voteOnProposal",
            WriteCall::Execute { .. } => "executeProposal",
        }
    }
}

/// Result of a confirmed write.
///
/// The write itself succeeded. `refresh_error` is set when the follow-up
/// read failed; the affected snapshot entry is then stale.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TxOutcome {
    pub receipt: TxReceipt,
    pub refresh_error: Option<SyncError>,
}

/// Per-read outcome of the connect-time refresh.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RefreshReport {
    pub treasury: Option<SyncError>,
    pub nft_balance: Option<SyncError>,
    pub proposal_count: Option<SyncError>,
}

impl RefreshReport {
    /// True when all three reads succeeded.
    pub fn is_complete(&self) -> bool {
        self.failures().is_empty()
    }

    pub fn failures(&self) -> Vec<&SyncError> {
        [&self.treasury, &self.nft_balance, &self.proposal_count]
            .into_iter()
            .flatten()
            .collect()
    }
}

// ════════════════════════════════════════════════════════════════════════════════
// SYNCHRONIZER
// ════════════════════════════════════════════════════════════════════════════════

/// Owner of the DAO state mirror and the write gate.
pub struct ProposalSynchronizer {
    gateway: Arc<dyn ChainGateway>,
    required_chain_id: u64,
    confirmation_timeout: Option<Duration>,
    snapshot: Arc<RwLock<DaoSnapshot>>,
    session: SessionState,
}

impl ProposalSynchronizer {
    /// Creates a synchronizer bound to `required_chain_id`.
    ///
    /// `confirmation_timeout = None` waits for receipts indefinitely.
    pub fn new(
        gateway: Arc<dyn ChainGateway>,
        required_chain_id: u64,
        confirmation_timeout: Option<Duration>,
    ) -> Self {
        Self {
            gateway,
            required_chain_id,
            confirmation_timeout,
            snapshot: Arc::new(RwLock::new(DaoSnapshot::default())),
            session: SessionState::new(),
        }
    }

    /// Creates a synchronizer from client configuration.
    pub fn from_config(gateway: Arc<dyn ChainGateway>, config: &ClientConfig) -> Self {
        Self::new(gateway, config.chain_id, config.confirmation_timeout())
    }

    // ── Presentation accessors ──────────────────────────────────────────

    /// Copy of the current state for rendering.
    pub fn snapshot(&self) -> DaoSnapshot {
        let mut snap = self.snapshot.read().clone();
        snap.caller.connected = self.session.is_connected();
        snap.busy = self.session.is_busy();
        snap
    }

    pub fn is_connected(&self) -> bool {
        self.session.is_connected()
    }

    pub fn is_busy(&self) -> bool {
        self.session.is_busy()
    }

    pub fn required_chain_id(&self) -> u64 {
        self.required_chain_id
    }

    // ── Connection ──────────────────────────────────────────────────────

    /// Connects the wallet, verifies the network and runs the initial
    /// refresh.
    ///
    /// On `WrongNetwork` or `Connection` the session is left disconnected
    /// and no reads are attempted. No retry.
    pub async fn connect(&self) -> Result<RefreshReport, SyncError> {
        let address = match self.gateway.connect_wallet().await {
            Ok(a) => a,
            Err(e) => {
                self.session.set_connected(false);
                return Err(classify(OpKind::Connect, e));
            }
        };

        if let Err(e) = self.ensure_network(OpKind::Connect).await {
            self.session.set_connected(false);
            return Err(e);
        }

        self.snapshot.write().caller.address = Some(address);
        self.session.set_connected(true);
        info!(%address, chain_id = self.required_chain_id, "wallet connected");

        Ok(self.refresh_overview().await)
    }

    /// Treasury, caller NFT balance and proposal count, each isolated.
    pub async fn refresh_overview(&self) -> RefreshReport {
        let (treasury, nft_balance, proposal_count) = tokio::join!(
            self.get_treasury_balance(),
            self.get_caller_nft_balance(),
            self.get_proposal_count(),
        );
        RefreshReport {
            treasury: treasury.err(),
            nft_balance: nft_balance.err(),
            proposal_count: proposal_count.err(),
        }
    }

    // ── Reads ───────────────────────────────────────────────────────────

    /// Reads the DAO's native balance (wei) into the snapshot.
    pub async fn get_treasury_balance(&self) -> Result<U256, SyncError> {
        let op = OpKind::Read("treasury balance");
        self.ensure_network(op).await?;
        let balance = self
            .gateway
            .treasury_balance()
            .await
            .map_err(|e| log_read_failure(classify(op, e)))?;
        self.snapshot.write().treasury_balance = balance;
        Ok(balance)
    }

    /// Reads `numProposals()` into the snapshot. A value lower than the
    /// one already held is ignored.
    pub async fn get_proposal_count(&self) -> Result<u64, SyncError> {
        let op = OpKind::Read("proposal count");
        self.ensure_network(op).await?;
        let count = self
            .gateway
            .proposal_count()
            .await
            .map_err(|e| log_read_failure(classify(op, e)))?;

        let mut snap = self.snapshot.write();
        if count < snap.proposal_count {
            warn!(
                reported = count,
                held = snap.proposal_count,
                "node reported fewer proposals than already seen; keeping held count"
            );
        } else {
            snap.proposal_count = count;
        }
        Ok(snap.proposal_count)
    }

    /// Re-obtains the signer and reads its membership NFT balance.
    pub async fn get_caller_nft_balance(&self) -> Result<U256, SyncError> {
        let op = OpKind::Read("nft balance");
        self.ensure_network(op).await?;
        let owner = self
            .gateway
            .signer()
            .await
            .map_err(|e| log_read_failure(classify(op, e)))?;
        let balance = self
            .gateway
            .nft_balance_of(owner)
            .await
            .map_err(|e| log_read_failure(classify(op, e)))?;

        let mut snap = self.snapshot.write();
        snap.caller.address = Some(owner);
        snap.caller.nft_balance = balance;
        Ok(balance)
    }

    /// Reads one proposal. Does not touch the snapshot.
    ///
    /// An error means "unavailable this refresh", not "does not exist".
    pub async fn get_proposal_by_id(&self, id: u64) -> Result<Proposal, SyncError> {
        self.ensure_network(OpKind::Read("proposal")).await?;
        self.read_proposal(id).await
    }

    /// Reads proposals `0..count` and replaces the proposal set.
    ///
    /// Reads run concurrently; the result is in ascending id order. If any
    /// read fails the previous set is kept and the error returned.
    pub async fn fetch_all_proposals(&self) -> Result<Vec<Proposal>, SyncError> {
        self.ensure_network(OpKind::Read("proposals")).await?;
        let count = self.snapshot.read().proposal_count;

        let fresh = try_join_all((0..count).map(|id| self.read_proposal(id))).await?;

        let mut snap = self.snapshot.write();
        let merged = merge_proposals(&snap.proposals, fresh);
        snap.proposals = merged.clone();
        Ok(merged)
    }

    async fn read_proposal(&self, id: u64) -> Result<Proposal, SyncError> {
        self.gateway.proposal(id).await.map_err(|e| {
            let err = classify(OpKind::Read("proposal"), e);
            error!(proposal_id = id, error = %err, "proposal unavailable");
            err
        })
    }

    // ── Writes ──────────────────────────────────────────────────────────

    /// `createProposal(nftTokenId)`; refreshes the proposal count.
    pub async fn create_proposal(&self, nft_token_id: U256) -> Result<TxOutcome, SyncError> {
        self.run_write(WriteCall::CreateProposal { nft_token_id }).await
    }

    /// `voteOnProposal(id, choice)`; refreshes the proposal set.
    pub async fn vote_on_proposal(
        &self,
        proposal_id: u64,
        choice: VoteChoice,
    ) -> Result<TxOutcome, SyncError> {
        self.run_write(WriteCall::Vote { proposal_id, choice }).await
    }

    /// `executeProposal(id)`; refreshes the proposal set.
    pub async fn execute_proposal(&self, proposal_id: u64) -> Result<TxOutcome, SyncError> {
        self.run_write(WriteCall::Execute { proposal_id }).await
    }

    async fn run_write(&self, call: WriteCall) -> Result<TxOutcome, SyncError> {
        let guard = self.session.try_begin_write().ok_or_else(|| {
            warn!(call = call.label(), "write refused: another transaction is pending");
            SyncError::Busy
        })?;

        self.ensure_network(OpKind::Write).await?;

        let from = self
            .gateway
            .signer()
            .await
            .map_err(|e| classify(OpKind::Write, e))?;

        let submitted = match call {
            WriteCall::CreateProposal { nft_token_id } => {
                self.gateway.submit_create_proposal(from, nft_token_id).await
            }
            WriteCall::Vote { proposal_id, choice } => {
                self.gateway.submit_vote(from, proposal_id, choice).await
            }
            WriteCall::Execute { proposal_id } => {
                self.gateway.submit_execute(from, proposal_id).await
            }
        };
        let tx_hash = submitted.map_err(|e| {
            let err = classify(OpKind::Write, e);
            warn!(call = call.label(), error = %err, "submission failed");
            err
        })?;

        info!(call = call.label(), %tx_hash, "transaction submitted, waiting for confirmation");
        let receipt = self.await_confirmation(tx_hash).await?;
        if !receipt.success {
            warn!(call = call.label(), %tx_hash, "transaction reverted on chain");
            return Err(SyncError::TransactionRejected {
                reason: "transaction reverted".to_string(),
            });
        }

        drop(guard);
        info!(
            call = call.label(),
            %tx_hash,
            block = receipt.block_number,
            "transaction confirmed"
        );

        let refresh_error = match call {
            WriteCall::CreateProposal { .. } => self.get_proposal_count().await.err(),
            WriteCall::Vote { .. } | WriteCall::Execute { .. } => {
                self.fetch_all_proposals().await.err()
            }
        };

        Ok(TxOutcome { receipt, refresh_error })
    }

    async fn await_confirmation(&self, tx_hash: TxHash) -> Result<TxReceipt, SyncError> {
        let wait = self.gateway.wait_for_receipt(tx_hash);
        let result = match self.confirmation_timeout {
            Some(limit) => tokio::time::timeout(limit, wait).await.map_err(|_| {
                warn!(%tx_hash, waited_secs = limit.as_secs(), "confirmation wait timed out");
                SyncError::ConfirmationTimeout {
                    tx_hash,
                    waited_secs: limit.as_secs(),
                }
            })?,
            None => wait.await,
        };
        result.map_err(|e| classify(OpKind::Write, e))
    }

    // ── Network identity ────────────────────────────────────────────────

    async fn ensure_network(&self, op: OpKind) -> Result<(), SyncError> {
        let actual = self.gateway.chain_id().await.map_err(|e| classify(op, e))?;
        if actual != self.required_chain_id {
            warn!(
                expected = self.required_chain_id,
                actual,
                "connected to the wrong network"
            );
            return Err(SyncError::WrongNetwork {
                expected: self.required_chain_id,
                actual,
            });
        }
        Ok(())
    }
}

fn log_read_failure(err: SyncError) -> SyncError {
    error!(error = %err, "read failed, keeping previous value");
    err
}
