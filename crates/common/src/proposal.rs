//! # Proposal Model
//!
//! Client-side mirror of a DAO proposal record and the per-proposal view
//! state machine derived from it.
//!
//! ## State Machine
//!
//! ```text
//! ┌────────┐  deadline passes   ┌────────────────┐  executeProposal   ┌──────────┐
//! │ Voting │───────────────────▶│ ReadyToExecute │───────────────────▶│ Executed │
//! └────────┘  (wall clock only) └────────────────┘  (confirmed write) └──────────┘
//! ```
//!
//! `Executed` wins regardless of deadline. The `Voting → ReadyToExecute`
//! edge has no event; it is observed on the next render.
//!
//! ## Tie-break
//!
//! The recommended execution outcome is `Yay` only when
//! `yay_votes > nay_votes`. Equal tallies resolve to `Nay`. This matches
//! the contract's own strict comparison when executing.

use std::fmt;
use std::str::FromStr;

use alloy_primitives::U256;
use serde::{Deserialize, Serialize};

// ════════════════════════════════════════════════════════════════════════════════
// VOTE CHOICE
// ════════════════════════════════════════════════════════════════════════════════

/// A holder's vote on a proposal.
///
/// The numeric code is part of the contract ABI (`enum Vote { YAY, NAY }`)
/// and must not change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum VoteChoice {
    /// In favour. Wire code `0`.
    Yay,
    /// Against. Wire code `1`.
    Nay,
}

impl VoteChoice {
    /// Contract-level numeric code.
    pub const fn wire_code(self) -> u8 {
        match self {
            VoteChoice::Yay => 0,
            VoteChoice::Nay => 1,
        }
    }

    /// Inverse of [`VoteChoice::wire_code`]. Unknown codes return `None`.
    pub const fn from_wire_code(code: u8) -> Option<Self> {
        match code {
            0 => Some(VoteChoice::Yay),
            1 => Some(VoteChoice::Nay),
            _ => None,
        }
    }
}

impl fmt::Display for VoteChoice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VoteChoice::Yay => write!(f, "YAY"),
            VoteChoice::Nay => write!(f, "NAY"),
        }
    }
}

impl FromStr for VoteChoice {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "YAY" => Ok(VoteChoice::Yay),
            "NAY" => Ok(VoteChoice::Nay),
            other => Err(format!("invalid vote '{}': must be 'yay' or 'nay'", other)),
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════════
// PROPOSAL PHASE
// ════════════════════════════════════════════════════════════════════════════════

/// View state of a single proposal at a given instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ProposalPhase {
    /// Before the deadline, not executed. Voting allowed.
    Voting,
    /// Deadline reached, not executed. Execution offered.
    ReadyToExecute,
    /// Terminal.
    Executed,
}

impl fmt::Display for ProposalPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProposalPhase::Voting => write!(f, "Voting"),
            ProposalPhase::ReadyToExecute => write!(f, "ReadyToExecute"),
            ProposalPhase::Executed => write!(f, "Executed"),
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════════
// PROPOSAL
// ════════════════════════════════════════════════════════════════════════════════

/// On-chain governance record as returned by `proposals(uint256)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Proposal {
    /// 0-based dense index assigned by the contract at creation.
    pub id: u64,
    /// Token the DAO would purchase if the proposal passes.
    pub nft_token_id: U256,
    /// Voting deadline, unix seconds.
    pub deadline: U256,
    /// Votes in favour.
    pub yay_votes: U256,
    /// Votes against.
    pub nay_votes: U256,
    /// One-way `false → true`.
    pub executed: bool,
}

impl Proposal {
    /// Resolves the view state at `now` (unix seconds).
    pub fn phase(&self, now: u64) -> ProposalPhase {
        if self.executed {
            ProposalPhase::Executed
        } else if self.deadline > U256::from(now) {
            ProposalPhase::Voting
        } else {
            ProposalPhase::ReadyToExecute
        }
    }

    /// Outcome label shown on the execute action. Ties resolve to `Nay`.
    pub fn recommended_outcome(&self) -> VoteChoice {
        if self.yay_votes > self.nay_votes {
            VoteChoice::Yay
        } else {
            VoteChoice::Nay
        }
    }

    /// True when voting is currently allowed.
    pub fn accepts_votes(&self, now: u64) -> bool {
        self.phase(now) == ProposalPhase::Voting
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn proposal(deadline: u64, yay: u64, nay: u64, executed: bool) -> Proposal {
        Proposal {
            id: 0,
            nft_token_id: U256::from(7u8),
            deadline: U256::from(deadline),
            yay_votes: U256::from(yay),
            nay_votes: U256::from(nay),
            executed,
        }
    }

    #[test]
    fn vote_codes_are_fixed() {
        assert_eq!(VoteChoice::Yay.wire_code(), 0);
        assert_eq!(VoteChoice::Nay.wire_code(), 1);
    }

    #[test]
    fn vote_codes_round_trip_through_display() {
        for choice in [VoteChoice::Yay, VoteChoice::Nay] {
            assert_eq!(VoteChoice::from_wire_code(choice.wire_code()), Some(choice));
            let parsed: VoteChoice = choice
                .to_string()
                .parse()
                .unwrap_or_else(|e| panic!("{}", e));
            assert_eq!(parsed, choice);
        }
        assert_eq!(VoteChoice::from_wire_code(2), None);
    }

    #[test]
    fn vote_parse_is_case_insensitive() {
        assert_eq!("yay".parse::<VoteChoice>().ok(), Some(VoteChoice::Yay));
        assert_eq!(" Nay ".parse::<VoteChoice>().ok(), Some(VoteChoice::Nay));
        assert!("abstain".parse::<VoteChoice>().is_err());
    }

    #[test]
    fn future_deadline_is_voting() {
        assert_eq!(proposal(1_000, 0, 0, false).phase(999), ProposalPhase::Voting);
    }

    #[test]
    fn past_deadline_is_ready_to_execute() {
        assert_eq!(
            proposal(1_000, 0, 0, false).phase(1_001),
            ProposalPhase::ReadyToExecute
        );
    }

    #[test]
    fn deadline_equal_to_now_is_ready_to_execute() {
        assert_eq!(
            proposal(1_000, 0, 0, false).phase(1_000),
            ProposalPhase::ReadyToExecute
        );
    }

    #[test]
    fn executed_wins_regardless_of_deadline() {
        assert_eq!(proposal(1_000, 0, 0, true).phase(10), ProposalPhase::Executed);
        assert_eq!(proposal(1_000, 0, 0, true).phase(5_000), ProposalPhase::Executed);
    }

    #[test]
    fn tie_recommends_nay() {
        assert_eq!(proposal(0, 3, 3, false).recommended_outcome(), VoteChoice::Nay);
        assert_eq!(proposal(0, 0, 0, false).recommended_outcome(), VoteChoice::Nay);
    }

    #[test]
    fn majority_recommends_its_side() {
        assert_eq!(proposal(0, 4, 3, false).recommended_outcome(), VoteChoice::Yay);
        assert_eq!(proposal(0, 1, 2, false).recommended_outcome(), VoteChoice::Nay);
    }

    #[test]
    fn deadline_beyond_u64_stays_voting() {
        let mut p = proposal(0, 0, 0, false);
        p.deadline = U256::MAX;
        assert_eq!(p.phase(u64::MAX), ProposalPhase::Voting);
    }

    #[test]
    fn accepts_votes_only_while_voting() {
        let p = proposal(100, 0, 0, false);
        assert!(p.accepts_votes(50));
        assert!(!p.accepts_votes(100));
    }
}
