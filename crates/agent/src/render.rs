//! Text and JSON rendering of DAO snapshots.

use std::time::{SystemTime, UNIX_EPOCH};

use anyhow::Result;
use serde_json::{json, Value};

use cryptodevs_client::{DaoSnapshot, RefreshReport};
use cryptodevs_common::{format_ether, Proposal, ProposalPhase, U256};

pub const NO_NFTS_MESSAGE: &str = "You do not own any CryptoDevs NFTs";
pub const NO_PROPOSALS_MESSAGE: &str = "No proposals have been created";
pub const WAITING_MESSAGE: &str = "Loading... Waiting for transaction...";
pub const UNAVAILABLE: &str = "unavailable";

/// Current unix time in seconds.
pub fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

/// Action offered for a proposal at `now`.
pub fn action_label(p: &Proposal, now: u64) -> String {
    match p.phase(now) {
        ProposalPhase::Voting => "Vote YAY / Vote NAY".to_string(),
        ProposalPhase::ReadyToExecute => {
            format!("Execute Proposal ({})", p.recommended_outcome())
        }
        ProposalPhase::Executed => "Proposal Executed".to_string(),
    }
}

/// Deadline relative to `now`, e.g. `1700000300 (in 5m 0s)`.
pub fn deadline_label(deadline: U256, now: u64) -> String {
    let now = U256::from(now);
    if deadline > now {
        let left = u64::try_from(deadline - now).unwrap_or(u64::MAX);
        format!("{} (in {})", deadline, human_duration(left))
    } else {
        let ago = u64::try_from(now - deadline).unwrap_or(u64::MAX);
        format!("{} ({} ago)", deadline, human_duration(ago))
    }
}

fn human_duration(secs: u64) -> String {
    let (h, m, s) = (secs / 3600, (secs % 3600) / 60, secs % 60);
    if h > 0 {
        format!("{}h {}m", h, m)
    } else if m > 0 {
        format!("{}m {}s", m, s)
    } else {
        format!("{}s", s)
    }
}

// ════════════════════════════════════════════════════════════════════════════════
// STATUS
// ════════════════════════════════════════════════════════════════════════════════

/// Values whose connect-time read failed are shown as unavailable.
pub fn print_status_table(snap: &DaoSnapshot, report: &RefreshReport) {
    let account = snap
        .caller
        .address
        .map(|a| a.to_string())
        .unwrap_or_else(|| "-".to_string());
    let nft_balance = match report.nft_balance {
        Some(_) => UNAVAILABLE.to_string(),
        None => snap.caller.nft_balance.to_string(),
    };
    let treasury = match report.treasury {
        Some(_) => UNAVAILABLE.to_string(),
        None => format!("{} ETH", format_ether(snap.treasury_balance)),
    };
    let count = match report.proposal_count {
        Some(_) => UNAVAILABLE.to_string(),
        None => snap.proposal_count.to_string(),
    };
    println!("Account:                     {}", account);
    println!("Your CryptoDevs NFT Balance: {}", nft_balance);
    println!("Treasury Balance:            {}", treasury);
    println!("Total Number of Proposals:   {}", count);
    if report.nft_balance.is_none() && snap.caller.nft_balance.is_zero() {
        println!("{}", NO_NFTS_MESSAGE);
    }
}

/// Fields whose connect-time read failed are `null`.
pub fn status_json(snap: &DaoSnapshot, report: &RefreshReport) -> Value {
    let known = |failed: &Option<_>, v: Value| if failed.is_some() { Value::Null } else { v };
    json!({
        "account": snap.caller.address,
        "nft_balance": known(&report.nft_balance, json!(snap.caller.nft_balance.to_string())),
        "treasury_wei": known(&report.treasury, json!(snap.treasury_balance.to_string())),
        "treasury_eth": known(&report.treasury, json!(format_ether(snap.treasury_balance))),
        "proposal_count": known(&report.proposal_count, json!(snap.proposal_count)),
        "can_participate": report.nft_balance.is_none() && snap.caller.can_participate(),
        "errors": report.failures().iter().map(|e| e.to_string()).collect::<Vec<_>>(),
    })
}

// ════════════════════════════════════════════════════════════════════════════════
// PROPOSALS
// ════════════════════════════════════════════════════════════════════════════════

pub fn print_proposals_table(proposals: &[Proposal], now: u64) {
    if proposals.is_empty() {
        println!("{}", NO_PROPOSALS_MESSAGE);
        return;
    }
    for (i, p) in proposals.iter().enumerate() {
        if i > 0 {
            println!();
        }
        println!("Proposal ID:          {}", p.id);
        println!("Fake NFT to Purchase: {}", p.nft_token_id);
        println!("Deadline:             {}", deadline_label(p.deadline, now));
        println!("Yay Votes:            {}", p.yay_votes);
        println!("Nay Votes:            {}", p.nay_votes);
        println!("Executed?:            {}", p.executed);
        println!("Action:               {}", action_label(p, now));
    }
}

pub fn proposals_json(proposals: &[Proposal], now: u64) -> Value {
    Value::Array(
        proposals
            .iter()
            .map(|p| {
                json!({
                    "id": p.id,
                    "nft_token_id": p.nft_token_id.to_string(),
                    "deadline": p.deadline.to_string(),
                    "yay_votes": p.yay_votes.to_string(),
                    "nay_votes": p.nay_votes.to_string(),
                    "executed": p.executed,
                    "phase": p.phase(now),
                    "action": action_label(p, now),
                })
            })
            .collect(),
    )
}

pub fn print_json(value: &Value) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
