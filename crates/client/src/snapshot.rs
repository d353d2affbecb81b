//! Snapshot of mirrored contract state handed to the renderer.

use serde::Serialize;

use cryptodevs_common::{Address, Proposal, U256};

/// The caller's standing in the DAO.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CallerProfile {
    /// Signing account, once the wallet has been connected.
    pub address: Option<Address>,
    /// Membership NFTs held.
    pub nft_balance: U256,
    /// Wallet connection status.
    pub connected: bool,
}

impl CallerProfile {
    /// Whether creation and voting should be offered.
    pub fn can_participate(&self) -> bool {
        self.connected && !self.nft_balance.is_zero()
    }
}

/// Immutable copy of the synchronizer's state at one instant.
///
/// `treasury_balance` is raw wei; scaling is the renderer's job.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DaoSnapshot {
    pub treasury_balance: U256,
    pub proposal_count: u64,
    /// Ordered by ascending id.
    pub proposals: Vec<Proposal>,
    pub caller: CallerProfile,
    /// A write is waiting for confirmation.
    pub busy: bool,
}

impl DaoSnapshot {
    /// Looks a proposal up by id.
    pub fn proposal(&self, id: u64) -> Option<&Proposal> {
        usize::try_from(id)
            .ok()
            .and_then(|idx| self.proposals.get(idx))
            .filter(|p| p.id == id)
    }
}

/// Applies a freshly fetched proposal list on top of the previous one.
///
/// A proposal that was already executed keeps its previous record: the
/// executed flag never reverts and executed proposals are immutable.
pub(crate) fn merge_proposals(previous: &[Proposal], fresh: Vec<Proposal>) -> Vec<Proposal> {
    fresh
        .into_iter()
        .map(|p| match previous.iter().find(|old| old.id == p.id) {
            Some(old) if old.executed => {
                if old != &p {
                    tracing::warn!(
                        proposal_id = p.id,
                        "ignoring change to executed proposal reported by node"
                    );
                }
                old.clone()
            }
            _ => p,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn p(id: u64, yay: u64, executed: bool) -> Proposal {
        Proposal {
            id,
            nft_token_id: U256::from(id + 10),
            deadline: U256::from(1_000u64),
            yay_votes: U256::from(yay),
            nay_votes: U256::ZERO,
            executed,
        }
    }

    #[test]
    fn participation_requires_connection_and_nft() {
        let mut c = CallerProfile::default();
        assert!(!c.can_participate());
        c.nft_balance = U256::from(2u8);
        assert!(!c.can_participate());
        c.connected = true;
        assert!(c.can_participate());
        c.nft_balance = U256::ZERO;
        assert!(!c.can_participate());
    }

    #[test]
    fn executed_proposals_never_revert() {
        let previous = vec![p(0, 3, true), p(1, 1, false)];
        let fresh = vec![p(0, 0, false), p(1, 2, false), p(2, 0, false)];
        let merged = merge_proposals(&previous, fresh);
        assert_eq!(merged.len(), 3);
        assert!(merged[0].executed);
        assert_eq!(merged[0].yay_votes, U256::from(3u8));
        assert_eq!(merged[1].yay_votes, U256::from(2u8));
        assert_eq!(merged[2].id, 2);
    }

    #[test]
    fn fresh_execution_is_taken() {
        let merged = merge_proposals(&[p(0, 1, false)], vec![p(0, 1, true)]);
        assert!(merged[0].executed);
    }

    #[test]
    fn lookup_by_id() {
        let snap = DaoSnapshot {
            proposals: vec![p(0, 0, false), p(1, 0, false)],
            ..DaoSnapshot::default()
        };
        assert_eq!(snap.proposal(1).map(|x| x.id), Some(1));
        assert!(snap.proposal(5).is_none());
    }
}
