//! Proposal lifecycle integration tests against the in-memory DAO.
//!
//! Each test drives a `ProposalSynchronizer` through connect, reads and
//! writes and checks the snapshot the renderer would see.

use std::sync::Arc;
use std::time::Duration;

use cryptodevs_client::mock_gateway::{MOCK_GENESIS_TIME, MOCK_NFT_PRICE_WEI, MOCK_VOTING_PERIOD_SECS};
use cryptodevs_client::{GatewayError, MockChainGateway, ProposalSynchronizer, SyncError};
use cryptodevs_common::{format_ether, Address, ProposalPhase, VoteChoice, U256};

const CHAIN: u64 = 4;

// ── Test helpers ────────────────────────────────────────────────────────

fn member() -> Address {
    Address::repeat_byte(0xaa)
}

async fn connected() -> (Arc<MockChainGateway>, Arc<ProposalSynchronizer>) {
    let mock = Arc::new(MockChainGateway::new(CHAIN, member()));
    mock.set_nft_balance(member(), 1);
    let sync = Arc::new(ProposalSynchronizer::new(
        mock.clone(),
        CHAIN,
        Some(Duration::from_secs(5)),
    ));
    sync.connect()
        .await
        .unwrap_or_else(|e| panic!("connect failed: {}", e));
    (mock, sync)
}

/// Waits until a write is parked on its confirmation.
async fn wait_until_pending(mock: &MockChainGateway) {
    for _ in 0..200 {
        if mock.call_count("wait_for_receipt") > 0 {
            return;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    panic!("write never reached confirmation");
}

// ════════════════════════════════════════════════════════════════════════════════
// OVERVIEW
// ════════════════════════════════════════════════════════════════════════════════

#[tokio::test]
async fn treasury_is_rendered_in_ether() {
    let (mock, sync) = connected().await;
    mock.set_treasury(U256::from(2_500_000_000_000_000_000u128));

    let wei = sync
        .get_treasury_balance()
        .await
        .unwrap_or_else(|e| panic!("treasury: {}", e));
    assert_eq!(format_ether(wei), "2.5");
    assert_eq!(format_ether(sync.snapshot().treasury_balance), "2.5");
}

#[tokio::test]
async fn non_member_is_visible_in_snapshot() {
    let mock = Arc::new(MockChainGateway::new(CHAIN, member()));
    let sync = ProposalSynchronizer::new(mock.clone(), CHAIN, None);
    let report = sync
        .connect()
        .await
        .unwrap_or_else(|e| panic!("connect failed: {}", e));
    assert!(report.is_complete());
    let snap = sync.snapshot();
    assert!(snap.caller.nft_balance.is_zero());
    assert!(!snap.caller.can_participate());
}

#[tokio::test]
async fn wrong_network_blocks_every_operation() {
    let (mock, sync) = connected().await;
    mock.set_chain_id(1);

    let expected = SyncError::WrongNetwork { expected: CHAIN, actual: 1 };
    assert_eq!(sync.get_treasury_balance().await, Err(expected.clone()));
    assert_eq!(sync.fetch_all_proposals().await, Err(expected.clone()));
    assert_eq!(sync.create_proposal(U256::from(7u8)).await, Err(expected.clone()));
    assert_eq!(mock.submission_count(), 0);
    assert!(!sync.is_busy());
}

// ════════════════════════════════════════════════════════════════════════════════
// PROPOSAL SET
// ════════════════════════════════════════════════════════════════════════════════

#[tokio::test]
async fn failed_proposal_read_keeps_previous_set() {
    let (mock, sync) = connected().await;
    let deadline = MOCK_GENESIS_TIME + 100;
    for token in 0..3 {
        mock.seed_proposal(token, deadline, 0, 0, false);
    }
    assert_eq!(sync.get_proposal_count().await, Ok(3));
    let first = sync
        .fetch_all_proposals()
        .await
        .unwrap_or_else(|e| panic!("fetch: {}", e));
    assert_eq!(first.iter().map(|p| p.id).collect::<Vec<_>>(), vec![0, 1, 2]);

    mock.set_executed(2, true);
    mock.fail_proposal(1, true);
    let err = sync.fetch_all_proposals().await;
    assert!(matches!(err, Err(SyncError::ReadFailure { .. })));

    let snap = sync.snapshot();
    assert_eq!(snap.proposals, first);
    assert!(!snap.proposals[2].executed);
}

#[tokio::test]
async fn count_and_executed_flag_never_go_backwards() {
    let (mock, sync) = connected().await;
    mock.seed_proposal(1, MOCK_GENESIS_TIME, 0, 0, true);
    mock.seed_proposal(2, MOCK_GENESIS_TIME + 50, 0, 0, false);
    assert_eq!(sync.get_proposal_count().await, Ok(2));
    sync.fetch_all_proposals()
        .await
        .unwrap_or_else(|e| panic!("fetch: {}", e));

    mock.truncate_proposals(1);
    mock.set_executed(0, false);
    assert_eq!(sync.get_proposal_count().await, Ok(2));

    // Index 1 now reads as a zeroed struct; index 0 reports not executed.
    sync.fetch_all_proposals()
        .await
        .unwrap_or_else(|e| panic!("fetch: {}", e));
    let snap = sync.snapshot();
    assert_eq!(snap.proposal_count, 2);
    assert!(snap.proposals[0].executed);
    assert_eq!(snap.proposals[0].phase(mock.now()), ProposalPhase::Executed);
}

// ════════════════════════════════════════════════════════════════════════════════
// WRITES
// ════════════════════════════════════════════════════════════════════════════════

#[tokio::test]
async fn create_vote_execute_end_to_end() {
    let (mock, sync) = connected().await;
    mock.set_treasury(MOCK_NFT_PRICE_WEI * U256::from(3u8));

    let created = sync
        .create_proposal(U256::from(42u8))
        .await
        .unwrap_or_else(|e| panic!("create: {}", e));
    assert!(created.receipt.success);
    assert!(created.refresh_error.is_none());
    assert_eq!(sync.snapshot().proposal_count, 1);

    sync.fetch_all_proposals()
        .await
        .unwrap_or_else(|e| panic!("fetch: {}", e));
    let p = sync
        .snapshot()
        .proposal(0)
        .cloned()
        .unwrap_or_else(|| panic!("proposal 0 missing"));
    assert_eq!(p.nft_token_id, U256::from(42u8));
    assert_eq!(p.phase(mock.now()), ProposalPhase::Voting);

    let voted = sync
        .vote_on_proposal(0, VoteChoice::Yay)
        .await
        .unwrap_or_else(|e| panic!("vote: {}", e));
    assert!(voted.refresh_error.is_none());
    assert_eq!(sync.snapshot().proposals[0].yay_votes, U256::from(1u8));

    mock.advance_time(MOCK_VOTING_PERIOD_SECS + 1);
    let p = sync.snapshot().proposals[0].clone();
    assert_eq!(p.phase(mock.now()), ProposalPhase::ReadyToExecute);
    assert_eq!(p.recommended_outcome(), VoteChoice::Yay);

    sync.execute_proposal(0)
        .await
        .unwrap_or_else(|e| panic!("execute: {}", e));
    let snap = sync.snapshot();
    assert!(snap.proposals[0].executed);
    assert!(!snap.busy);
    assert_eq!(mock.treasury(), MOCK_NFT_PRICE_WEI * U256::from(2u8));
}

#[tokio::test]
async fn rejected_writes_leave_snapshot_unchanged() {
    let (mock, sync) = connected().await;
    mock.seed_proposal(5, MOCK_GENESIS_TIME + 100, 0, 0, false);
    sync.get_proposal_count()
        .await
        .unwrap_or_else(|e| panic!("count: {}", e));
    sync.vote_on_proposal(0, VoteChoice::Nay)
        .await
        .unwrap_or_else(|e| panic!("vote: {}", e));
    let before = sync.snapshot();

    let err = sync.vote_on_proposal(0, VoteChoice::Yay).await;
    assert_eq!(
        err,
        Err(SyncError::TransactionRejected { reason: "ALREADY_VOTED".into() })
    );

    let err = sync.execute_proposal(0).await;
    assert_eq!(
        err,
        Err(SyncError::TransactionRejected { reason: "DEADLINE_NOT_EXCEEDED".into() })
    );

    mock.advance_time(200);
    let err = sync.vote_on_proposal(0, VoteChoice::Yay).await;
    assert_eq!(
        err,
        Err(SyncError::TransactionRejected { reason: "DEADLINE_EXCEEDED".into() })
    );

    assert_eq!(sync.snapshot(), before);
    assert!(!sync.is_busy());
}

#[tokio::test]
async fn non_member_create_is_rejected() {
    let (mock, sync) = connected().await;
    mock.set_nft_balance(member(), 0);
    let err = sync.create_proposal(U256::from(1u8)).await;
    assert_eq!(
        err,
        Err(SyncError::TransactionRejected { reason: "NOT_A_DAO_MEMBER".into() })
    );
    assert_eq!(sync.snapshot().proposal_count, 0);
}

#[tokio::test]
async fn reverted_receipt_is_a_rejection() {
    let (mock, sync) = connected().await;
    mock.revert_next_receipt();
    let err = sync.create_proposal(U256::from(9u8)).await;
    assert!(matches!(err, Err(SyncError::TransactionRejected { .. })));
    assert_eq!(sync.snapshot().proposal_count, 0);
    assert!(!sync.is_busy());
}

#[tokio::test]
async fn user_declining_signature_is_a_connection_error() {
    let (mock, sync) = connected().await;
    mock.fail_next_submission(GatewayError::UserRejected);
    let err = sync.create_proposal(U256::from(9u8)).await;
    assert!(matches!(err, Err(SyncError::Connection(_))));
    assert!(!sync.is_busy());
}

#[tokio::test]
async fn second_write_is_refused_while_first_is_pending() {
    let (mock, sync) = connected().await;
    mock.seed_proposal(3, MOCK_GENESIS_TIME + 100, 0, 0, false);
    mock.hold_confirmations(true);

    let first = {
        let sync = sync.clone();
        tokio::spawn(async move { sync.create_proposal(U256::from(11u8)).await })
    };
    wait_until_pending(&mock).await;
    assert!(sync.is_busy());
    assert!(sync.snapshot().busy);

    let second = sync.vote_on_proposal(0, VoteChoice::Yay).await;
    assert_eq!(second, Err(SyncError::Busy));
    assert_eq!(mock.submission_count(), 1);
    assert_eq!(mock.call_count("submit_vote"), 0);

    mock.hold_confirmations(false);
    mock.release_confirmation();
    let outcome = first
        .await
        .unwrap_or_else(|e| panic!("join: {}", e))
        .unwrap_or_else(|e| panic!("create: {}", e));
    assert!(outcome.receipt.success);
    assert!(!sync.is_busy());
    assert_eq!(sync.snapshot().proposal_count, 2);
}

#[tokio::test]
async fn confirmation_timeout_releases_the_gate() {
    let mock = Arc::new(MockChainGateway::new(CHAIN, member()));
    mock.set_nft_balance(member(), 1);
    let sync = ProposalSynchronizer::new(mock.clone(), CHAIN, Some(Duration::from_millis(50)));
    sync.connect()
        .await
        .unwrap_or_else(|e| panic!("connect failed: {}", e));
    mock.hold_confirmations(true);

    let err = sync.create_proposal(U256::from(1u8)).await;
    assert!(matches!(err, Err(SyncError::ConfirmationTimeout { .. })));
    assert!(!sync.is_busy());
    assert_eq!(sync.snapshot().proposal_count, 0);
}

#[tokio::test]
async fn single_proposal_read_leaves_snapshot_alone() {
    let (mock, sync) = connected().await;
    mock.seed_proposal(8, MOCK_GENESIS_TIME + 100, 1, 0, false);

    let p = sync
        .get_proposal_by_id(0)
        .await
        .unwrap_or_else(|e| panic!("read: {}", e));
    assert_eq!(p.nft_token_id, U256::from(8u8));
    assert!(sync.snapshot().proposals.is_empty());

    mock.fail_proposal(0, true);
    assert!(matches!(
        sync.get_proposal_by_id(0).await,
        Err(SyncError::ReadFailure { .. })
    ));
}
