//! # Contract Interfaces
//!
//! `sol!` declarations of the DAO and membership NFT functions this client
//! calls, plus conversions between their return tuples and [`Proposal`].
//!
//! | Contract | Function | Returns |
//! |----------|----------|---------|
//! | DAO | `numProposals()` | `uint256` |
//! | DAO | `proposals(uint256)` | `(uint256,uint256,uint256,uint256,bool)` |
//! | DAO | `createProposal(uint256)` | `uint256` |
//! | DAO | `voteOnProposal(uint256,uint8)` | - |
//! | DAO | `executeProposal(uint256)` | - |
//! | NFT | `balanceOf(address)` | `uint256` |

use alloy_primitives::{Address, U256};
use alloy_sol_types::{sol, SolCall, SolValue};

use crate::proposal::{Proposal, VoteChoice};

sol! {
    interface ICryptoDevsDAO {
        function numProposals() external view returns (uint256);
        function proposals(uint256 proposalIndex) external view returns (
            uint256 nftTokenId,
            uint256 deadline,
            uint256 yayVotes,
            uint256 nayVotes,
            bool executed
        );
        function createProposal(uint256 nftTokenId) external returns (uint256);
        function voteOnProposal(uint256 proposalIndex, uint8 vote) external;
        function executeProposal(uint256 proposalIndex) external;
    }

    interface ICryptoDevsNFT {
        function balanceOf(address owner) external view returns (uint256);
    }
}

// ════════════════════════════════════════════════════════════════════════════════
// CALL DATA
// ════════════════════════════════════════════════════════════════════════════════

pub fn num_proposals_call() -> Vec<u8> {
    ICryptoDevsDAO::numProposalsCall {}.abi_encode()
}

pub fn proposal_call(id: u64) -> Vec<u8> {
    ICryptoDevsDAO::proposalsCall { proposalIndex: U256::from(id) }.abi_encode()
}

pub fn create_proposal_call(nft_token_id: U256) -> Vec<u8> {
    ICryptoDevsDAO::createProposalCall { nftTokenId: nft_token_id }.abi_encode()
}

pub fn vote_on_proposal_call(id: u64, choice: VoteChoice) -> Vec<u8> {
    ICryptoDevsDAO::voteOnProposalCall {
        proposalIndex: U256::from(id),
        vote: choice.wire_code(),
    }
    .abi_encode()
}

pub fn execute_proposal_call(id: u64) -> Vec<u8> {
    ICryptoDevsDAO::executeProposalCall { proposalIndex: U256::from(id) }.abi_encode()
}

pub fn balance_of_call(owner: Address) -> Vec<u8> {
    ICryptoDevsNFT::balanceOfCall { owner }.abi_encode()
}

// ════════════════════════════════════════════════════════════════════════════════
// RETURN DATA
// ════════════════════════════════════════════════════════════════════════════════

/// Decodes the `numProposals()` return.
pub fn decode_num_proposals(data: &[u8]) -> Result<U256, alloy_sol_types::Error> {
    ICryptoDevsDAO::numProposalsCall::abi_decode_returns(data)
}

/// Decodes the `proposals(uint256)` getter return for proposal `id`.
pub fn decode_proposal(id: u64, data: &[u8]) -> Result<Proposal, alloy_sol_types::Error> {
    ICryptoDevsDAO::proposalsCall::abi_decode_returns(data).map(|ret| proposal_from_return(id, ret))
}

/// Decodes the NFT `balanceOf(address)` return.
pub fn decode_balance_of(data: &[u8]) -> Result<U256, alloy_sol_types::Error> {
    ICryptoDevsNFT::balanceOfCall::abi_decode_returns(data)
}

/// Builds a [`Proposal`] from the `proposals(uint256)` getter return.
pub fn proposal_from_return(id: u64, ret: ICryptoDevsDAO::proposalsReturn) -> Proposal {
    Proposal {
        id,
        nft_token_id: ret.nftTokenId,
        deadline: ret.deadline,
        yay_votes: ret.yayVotes,
        nay_votes: ret.nayVotes,
        executed: ret.executed,
    }
}

/// Encodes a proposal the way the getter returns it. Used by fake nodes.
pub fn encode_proposal(p: &Proposal) -> Vec<u8> {
    (p.nft_token_id, p.deadline, p.yay_votes, p.nay_votes, p.executed).abi_encode_params()
}
