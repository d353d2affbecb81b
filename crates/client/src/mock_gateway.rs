//! # Mock Chain Gateway
//!
//! Fully in-memory [`ChainGateway`] that simulates the DAO and NFT
//! contracts. No network calls.
//!
//! # Features
//!
//! - Contract rules of the DAO (membership, deadlines, double votes,
//!   execution funding) with the same revert reasons
//! - Deterministic clock advanced by the test
//! - Failure injection per read method and per proposal id
//! - Confirmation hold, to keep a write in flight
//! - Per-method call counters
//!
//! Submissions are validated immediately (like gas estimation) and applied
//! when the receipt is requested (like mining). A submission whose effect
//! is no longer valid at that point yields a failed receipt.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use parking_lot::{Mutex, MutexGuard};
use tokio::sync::Notify;

use cryptodevs_common::{Address, Proposal, TxHash, VoteChoice, U256};

use crate::gateway::{ChainGateway, GatewayError, TxReceipt};

/// Voting window given to new proposals.
pub const MOCK_VOTING_PERIOD_SECS: u64 = 300;

/// Price the DAO pays when a proposal passes (0.1 ether).
pub const MOCK_NFT_PRICE_WEI: U256 = U256::from_limbs([100_000_000_000_000_000, 0, 0, 0]);

/// Clock value a fresh mock starts at.
pub const MOCK_GENESIS_TIME: u64 = 1_700_000_000;

#[derive(Debug, Clone, Copy)]
enum Effect {
    Create { nft_token_id: U256 },
    Vote { from: Address, proposal_id: u64, choice: VoteChoice },
    Execute { proposal_id: u64 },
}

#[derive(Debug)]
struct MockState {
    chain_id: u64,
    account: Address,
    wallet_available: bool,
    wallet_declines: bool,
    treasury: U256,
    proposals: Vec<Proposal>,
    nft_balances: HashMap<Address, U256>,
    voted: HashSet<(u64, Address)>,
    now: u64,
    next_tx: u64,
    block: u64,
    pending: HashMap<TxHash, (Address, Effect)>,
    failing_reads: HashSet<&'static str>,
    failing_proposals: HashSet<u64>,
    next_submit_error: Option<GatewayError>,
    revert_next_receipt: bool,
    calls: HashMap<&'static str, usize>,
}

/// In-memory DAO behind the [`ChainGateway`] trait.
pub struct MockChainGateway {
    state: Mutex<MockState>,
    hold: AtomicBool,
    release: Notify,
}

impl MockChainGateway {
    /// New mock on `chain_id` with one wallet account.
    pub fn new(chain_id: u64, account: Address) -> Self {
        Self {
            state: Mutex::new(MockState {
                chain_id,
                account,
                wallet_available: true,
                wallet_declines: false,
                treasury: U256::ZERO,
                proposals: Vec::new(),
                nft_balances: HashMap::new(),
                voted: HashSet::new(),
                now: MOCK_GENESIS_TIME,
                next_tx: 1,
                block: 1,
                pending: HashMap::new(),
                failing_reads: HashSet::new(),
                failing_proposals: HashSet::new(),
                next_submit_error: None,
                revert_next_receipt: false,
                calls: HashMap::new(),
            }),
            hold: AtomicBool::new(false),
            release: Notify::new(),
        }
    }

    fn enter(&self, method: &'static str) -> MutexGuard<'_, MockState> {
        let mut state = self.state.lock();
        *state.calls.entry(method).or_insert(0) += 1;
        state
    }

    // ── Test helpers ────────────────────────────────────────────────────

    pub fn set_chain_id(&self, chain_id: u64) {
        self.state.lock().chain_id = chain_id;
    }

    pub fn set_wallet_available(&self, available: bool) {
        self.state.lock().wallet_available = available;
    }

    pub fn set_wallet_declines(&self, declines: bool) {
        self.state.lock().wallet_declines = declines;
    }

    pub fn set_treasury(&self, wei: U256) {
        self.state.lock().treasury = wei;
    }

    pub fn treasury(&self) -> U256 {
        self.state.lock().treasury
    }

    pub fn set_nft_balance(&self, owner: Address, balance: u64) {
        self.state
            .lock()
            .nft_balances
            .insert(owner, U256::from(balance));
    }

    /// Current mock time (unix seconds).
    pub fn now(&self) -> u64 {
        self.state.lock().now
    }

    pub fn advance_time(&self, secs: u64) {
        let mut state = self.state.lock();
        state.now = state.now.saturating_add(secs);
    }

    /// Appends a proposal with the next id. Returns the id.
    ///
    /// Use [`MockChainGateway::seed_raw_proposal`] for values beyond `u64`.
    pub fn seed_proposal(
        &self,
        nft_token_id: u64,
        deadline: u64,
        yay_votes: u64,
        nay_votes: u64,
        executed: bool,
    ) -> u64 {
        self.seed_raw_proposal(Proposal {
            id: 0,
            nft_token_id: U256::from(nft_token_id),
            deadline: U256::from(deadline),
            yay_votes: U256::from(yay_votes),
            nay_votes: U256::from(nay_votes),
            executed,
        })
    }

    /// Appends `proposal` under the next id, ignoring its `id` field.
    pub fn seed_raw_proposal(&self, mut proposal: Proposal) -> u64 {
        let mut state = self.state.lock();
        let id = state.proposals.len() as u64;
        proposal.id = id;
        state.proposals.push(proposal);
        id
    }

    /// Overwrites the executed flag, simulating an inconsistent node.
    pub fn set_executed(&self, proposal_id: u64, executed: bool) {
        let mut state = self.state.lock();
        if let Some(p) = state.proposals.iter_mut().find(|p| p.id == proposal_id) {
            p.executed = executed;
        }
    }

    /// Drops proposals beyond `len`, simulating a lagging node.
    pub fn truncate_proposals(&self, len: usize) {
        self.state.lock().proposals.truncate(len);
    }

    pub fn proposals(&self) -> Vec<Proposal> {
        self.state.lock().proposals.clone()
    }

    /// Makes every call to the named read method fail.
    pub fn fail_reads(&self, method: &'static str, fail: bool) {
        let mut state = self.state.lock();
        if fail {
            state.failing_reads.insert(method);
        } else {
            state.failing_reads.remove(method);
        }
    }

    /// Makes reads of one proposal id fail.
    pub fn fail_proposal(&self, proposal_id: u64, fail: bool) {
        let mut state = self.state.lock();
        if fail {
            state.failing_proposals.insert(proposal_id);
        } else {
            state.failing_proposals.remove(&proposal_id);
        }
    }

    /// The next submission returns `err` instead of a hash.
    pub fn fail_next_submission(&self, err: GatewayError) {
        self.state.lock().next_submit_error = Some(err);
    }

    /// The next receipt reports a reverted transaction.
    pub fn revert_next_receipt(&self) {
        self.state.lock().revert_next_receipt = true;
    }

    /// While held, `wait_for_receipt` suspends until
    /// [`MockChainGateway::release_confirmation`].
    pub fn hold_confirmations(&self, hold: bool) {
        self.hold.store(hold, Ordering::SeqCst);
    }

    /// Lets one held confirmation proceed.
    pub fn release_confirmation(&self) {
        self.release.notify_one();
    }

    /// Number of calls made to a trait method.
    pub fn call_count(&self, method: &str) -> usize {
        self.state.lock().calls.get(method).copied().unwrap_or(0)
    }

    /// Number of submissions made, across the three write methods.
    pub fn submission_count(&self) -> usize {
        ["submit_create_proposal", "submit_vote", "submit_execute"]
            .iter()
            .map(|m| self.call_count(m))
            .sum()
    }

    // ── Contract rules ──────────────────────────────────────────────────

    fn check(state: &MockState, from: Address, effect: &Effect) -> Result<(), String> {
        if state.nft_balances.get(&from).map_or(true, |b| b.is_zero()) {
            return Err("NOT_A_DAO_MEMBER".to_string());
        }
        match *effect {
            Effect::Create { .. } => Ok(()),
            Effect::Vote { from, proposal_id, .. } => {
                let p = state
                    .proposals
                    .get(proposal_id as usize)
                    .ok_or_else(|| "DEADLINE_EXCEEDED".to_string())?;
                if p.deadline <= U256::from(state.now) {
                    return Err("DEADLINE_EXCEEDED".to_string());
                }
                if state.voted.contains(&(proposal_id, from)) {
                    return Err("ALREADY_VOTED".to_string());
                }
                Ok(())
            }
            Effect::Execute { proposal_id } => {
                let p = state
                    .proposals
                    .get(proposal_id as usize)
                    .ok_or_else(|| "PROPOSAL_NOT_FOUND".to_string())?;
                if p.deadline > U256::from(state.now) {
                    return Err("DEADLINE_NOT_EXCEEDED".to_string());
                }
                if p.executed {
                    return Err("PROPOSAL_ALREADY_EXECUTED".to_string());
                }
                if p.yay_votes > p.nay_votes && state.treasury < MOCK_NFT_PRICE_WEI {
                    return Err("NOT_ENOUGH_FUNDS".to_string());
                }
                Ok(())
            }
        }
    }

    fn apply(state: &mut MockState, effect: Effect) {
        match effect {
            Effect::Create { nft_token_id } => {
                let id = state.proposals.len() as u64;
                let deadline = U256::from(state.now + MOCK_VOTING_PERIOD_SECS);
                state.proposals.push(Proposal {
                    id,
                    nft_token_id,
                    deadline,
                    yay_votes: U256::ZERO,
                    nay_votes: U256::ZERO,
                    executed: false,
                });
            }
            Effect::Vote { from, proposal_id, choice } => {
                let weight = state.nft_balances.get(&from).copied().unwrap_or_default();
                state.voted.insert((proposal_id, from));
                if let Some(p) = state.proposals.get_mut(proposal_id as usize) {
                    match choice {
                        VoteChoice::Yay => p.yay_votes += weight,
                        VoteChoice::Nay => p.nay_votes += weight,
                    }
                }
            }
            Effect::Execute { proposal_id } => {
                let mut pay = false;
                if let Some(p) = state.proposals.get_mut(proposal_id as usize) {
                    pay = p.yay_votes > p.nay_votes;
                    p.executed = true;
                }
                if pay {
                    state.treasury -= MOCK_NFT_PRICE_WEI;
                }
            }
        }
    }

    fn submit(
        &self,
        method: &'static str,
        from: Address,
        effect: Effect,
    ) -> Result<TxHash, GatewayError> {
        let mut state = self.enter(method);
        if let Some(err) = state.next_submit_error.take() {
            return Err(err);
        }
        Self::check(&state, from, &effect).map_err(|reason| GatewayError::Reverted { reason })?;

        let mut hash = [0u8; 32];
        hash[24..].copy_from_slice(&state.next_tx.to_be_bytes());
        state.next_tx += 1;
        let tx_hash = TxHash::from(hash);
        state.pending.insert(tx_hash, (from, effect));
        Ok(tx_hash)
    }

    fn read_guard(&self, method: &'static str) -> Result<MutexGuard<'_, MockState>, GatewayError> {
        let state = self.enter(method);
        if state.failing_reads.contains(method) {
            return Err(GatewayError::Network(format!("mock {} failure", method)));
        }
        Ok(state)
    }
}

#[async_trait]
impl ChainGateway for MockChainGateway {
    async fn connect_wallet(&self) -> Result<Address, GatewayError> {
        let state = self.enter("connect_wallet");
        if !state.wallet_available {
            return Err(GatewayError::WalletUnavailable("no wallet injected".to_string()));
        }
        if state.wallet_declines {
            return Err(GatewayError::UserRejected);
        }
        Ok(state.account)
    }

    async fn chain_id(&self) -> Result<u64, GatewayError> {
        let state = self.read_guard("chain_id")?;
        Ok(state.chain_id)
    }

    async fn signer(&self) -> Result<Address, GatewayError> {
        let state = self.enter("signer");
        if !state.wallet_available {
            return Err(GatewayError::WalletUnavailable("no wallet injected".to_string()));
        }
        Ok(state.account)
    }

    async fn treasury_balance(&self) -> Result<U256, GatewayError> {
        let state = self.read_guard("treasury_balance")?;
        Ok(state.treasury)
    }

    async fn proposal_count(&self) -> Result<u64, GatewayError> {
        let state = self.read_guard("proposal_count")?;
        Ok(state.proposals.len() as u64)
    }

    async fn proposal(&self, id: u64) -> Result<Proposal, GatewayError> {
        let state = self.read_guard("proposal")?;
        if state.failing_proposals.contains(&id) {
            return Err(GatewayError::Network(format!("mock failure reading proposal {}", id)));
        }
        // The contract getter returns a zeroed struct for unknown ids.
        Ok(state.proposals.get(id as usize).cloned().unwrap_or(Proposal {
            id,
            nft_token_id: U256::ZERO,
            deadline: U256::ZERO,
            yay_votes: U256::ZERO,
            nay_votes: U256::ZERO,
            executed: false,
        }))
    }

    async fn nft_balance_of(&self, owner: Address) -> Result<U256, GatewayError> {
        let state = self.read_guard("nft_balance_of")?;
        Ok(state.nft_balances.get(&owner).copied().unwrap_or_default())
    }

    async fn submit_create_proposal(
        &self,
        from: Address,
        nft_token_id: U256,
    ) -> Result<TxHash, GatewayError> {
        self.submit("submit_create_proposal", from, Effect::Create { nft_token_id })
    }

    async fn submit_vote(
        &self,
        from: Address,
        proposal_id: u64,
        choice: VoteChoice,
    ) -> Result<TxHash, GatewayError> {
        self.submit(
            "submit_vote",
            from,
            Effect::Vote { from, proposal_id, choice },
        )
    }

    async fn submit_execute(&self, from: Address, proposal_id: u64) -> Result<TxHash, GatewayError> {
        self.submit("submit_execute", from, Effect::Execute { proposal_id })
    }

    async fn wait_for_receipt(&self, tx_hash: TxHash) -> Result<TxReceipt, GatewayError> {
        drop(self.enter("wait_for_receipt"));

        if self.hold.load(Ordering::SeqCst) {
            self.release.notified().await;
        }

        let mut state = self.state.lock();
        let (from, effect) = state
            .pending
            .remove(&tx_hash)
            .ok_or_else(|| GatewayError::Malformed(format!("unknown transaction {}", tx_hash)))?;

        state.block += 1;
        let block_number = state.block;

        let reverted = std::mem::take(&mut state.revert_next_receipt);
        let success = !reverted && Self::check(&state, from, &effect).is_ok();
        if success {
            Self::apply(&mut state, effect);
        }

        Ok(TxReceipt {
            tx_hash,
            block_number,
            success,
        })
    }
}
