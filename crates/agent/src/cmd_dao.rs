//! # DAO Commands
//!
//! Handlers for the agent subcommands. Every handler connects first, so
//! the network check and the initial refresh always run.
//!
//! ## Commands
//!
//! - `status [--json]`
//! - `proposals [--json]`
//! - `create --token-id <N>`
//! - `vote --id <N> --choice <yay|nay>`
//! - `execute --id <N>`
//!
//! `create` and `vote` are refused locally when the caller holds no
//! membership NFT. `execute` is open to anyone. A connect-time read that a
//! command depends on is reported as an error, never as a zero value.

use anyhow::{anyhow, Context, Result};
use tracing::warn;

use cryptodevs_client::{ProposalSynchronizer, RefreshReport, SyncError, TxOutcome};
use cryptodevs_common::{VoteChoice, U256};

use crate::render;

// ════════════════════════════════════════════════════════════════════════════════
// PUBLIC API
// ════════════════════════════════════════════════════════════════════════════════

/// Handles `status [--json]`.
pub async fn handle_status(sync: &ProposalSynchronizer, json: bool) -> Result<()> {
    let report = connect(sync).await?;
    let snap = sync.snapshot();
    if json {
        render::print_json(&render::status_json(&snap, &report))
    } else {
        render::print_status_table(&snap, &report);
        Ok(())
    }
}

/// Handles `proposals [--json]`.
pub async fn handle_proposals(sync: &ProposalSynchronizer, json: bool) -> Result<()> {
    let report = connect(sync).await?;
    if let Some(err) = report.proposal_count {
        return Err(anyhow!(err).context("fetching proposals"));
    }
    let proposals = sync
        .fetch_all_proposals()
        .await
        .context("fetching proposals")?;
    let now = render::unix_now();
    if json {
        render::print_json(&render::proposals_json(&proposals, now))
    } else {
        render::print_proposals_table(&proposals, now);
        Ok(())
    }
}

/// Handles `create --token-id <N>`.
pub async fn handle_create(sync: &ProposalSynchronizer, nft_token_id: U256) -> Result<()> {
    let report = connect(sync).await?;
    require_membership(sync, &report)?;
    eprintln!("{}", render::WAITING_MESSAGE);
    let outcome = sync
        .create_proposal(nft_token_id)
        .await
        .map_err(|e| write_error("create proposal", e))?;
    report_outcome(&outcome);
    println!("Total Number of Proposals: {}", sync.snapshot().proposal_count);
    Ok(())
}

/// Handles `vote --id <N> --choice <yay|nay>`.
pub async fn handle_vote(
    sync: &ProposalSynchronizer,
    proposal_id: u64,
    choice: VoteChoice,
) -> Result<()> {
    let report = connect(sync).await?;
    require_membership(sync, &report)?;
    eprintln!("{}", render::WAITING_MESSAGE);
    let outcome = sync
        .vote_on_proposal(proposal_id, choice)
        .await
        .map_err(|e| write_error("vote", e))?;
    report_outcome(&outcome);
    println!("Voted {} on proposal {}", choice, proposal_id);
    Ok(())
}

/// Handles `execute --id <N>`.
pub async fn handle_execute(sync: &ProposalSynchronizer, proposal_id: u64) -> Result<()> {
    connect(sync).await?;
    eprintln!("{}", render::WAITING_MESSAGE);
    let outcome = sync
        .execute_proposal(proposal_id)
        .await
        .map_err(|e| write_error("execute proposal", e))?;
    report_outcome(&outcome);
    println!("Proposal {} executed", proposal_id);
    Ok(())
}

// ════════════════════════════════════════════════════════════════════════════════
// INTERNAL
// ════════════════════════════════════════════════════════════════════════════════

async fn connect(sync: &ProposalSynchronizer) -> Result<RefreshReport> {
    let report = sync.connect().await.map_err(|e| match e {
        SyncError::WrongNetwork { expected, .. } => {
            anyhow!("{}; change the network to chain id {}", e, expected)
        }
        other => anyhow!(other),
    })?;
    for failure in report.failures() {
        warn!(error = %failure, "initial refresh incomplete");
    }
    Ok(report)
}

fn require_membership(sync: &ProposalSynchronizer, report: &RefreshReport) -> Result<()> {
    if let Some(err) = &report.nft_balance {
        return Err(anyhow!(err.clone()).context("checking DAO membership"));
    }
    if sync.snapshot().caller.nft_balance.is_zero() {
        return Err(anyhow!(render::NO_NFTS_MESSAGE));
    }
    Ok(())
}

fn write_error(action: &str, err: SyncError) -> anyhow::Error {
    anyhow!(err).context(format!("{} failed", action))
}

fn report_outcome(outcome: &TxOutcome) {
    println!(
        "Transaction {} confirmed in block {}",
        outcome.receipt.tx_hash, outcome.receipt.block_number
    );
    if let Some(err) = &outcome.refresh_error {
        eprintln!("warning: refresh after confirmation failed: {}", err);
    }
}
