//! Synchronizer error taxonomy.
//!
//! Every synchronizer operation returns one of these; none of them tears
//! down the session. Gateway failures are classified by the kind of
//! operation that observed them (see [`OpKind`]).

use thiserror::Error;

use cryptodevs_common::TxHash;

use crate::gateway::GatewayError;

/// Errors surfaced to the presentation layer.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SyncError {
    /// Connected node is on a different chain. User must switch network.
    #[error("wrong network: expected chain id {expected}, connected to {actual}")]
    WrongNetwork {
        /// Required chain id.
        expected: u64,
        /// Chain id reported by the node.
        actual: u64,
    },

    /// The contract or node refused the transaction.
    #[error("transaction rejected: {reason}")]
    TransactionRejected {
        /// Revert reason as reported by the contract.
        reason: String,
    },

    /// A read failed; the affected snapshot entry is left stale.
    #[error("failed to read {what}: {reason}")]
    ReadFailure {
        /// Which value was being read.
        what: String,
        /// Underlying cause.
        reason: String,
    },

    /// Wallet not available or the holder declined.
    #[error("wallet connection failed: {0}")]
    Connection(String),

    /// Another write is already waiting for confirmation.
    #[error("another transaction is pending confirmation")]
    Busy,

    /// Transport failure while submitting or confirming a write.
    #[error("network error during transaction: {0}")]
    Network(String),

    /// Confirmation was not observed within the configured bound. The
    /// transaction may still be mined later.
    #[error("transaction {tx_hash} not confirmed after {waited_secs}s")]
    ConfirmationTimeout {
        /// Submitted transaction.
        tx_hash: TxHash,
        /// Bound that elapsed.
        waited_secs: u64,
    },
}

impl SyncError {
    /// True for errors the user can fix by switching network.
    pub fn is_wrong_network(&self) -> bool {
        matches!(self, SyncError::WrongNetwork { .. })
    }
}

/// Kind of operation that observed a gateway failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum OpKind {
    Connect,
    Read(&'static str),
    Write,
}

/// Maps a gateway failure onto the synchronizer taxonomy.
pub(crate) fn classify(op: OpKind, err: GatewayError) -> SyncError {
    match (op, err) {
        (_, GatewayError::WalletUnavailable(msg)) => SyncError::Connection(msg),
        (_, GatewayError::UserRejected) => {
            SyncError::Connection("request rejected by wallet holder".to_string())
        }
        (OpKind::Connect, other) => SyncError::Connection(other.to_string()),
        (OpKind::Read(what), other) => SyncError::ReadFailure {
            what: what.to_string(),
            reason: other.to_string(),
        },
        (OpKind::Write, GatewayError::Reverted { reason }) => {
            SyncError::TransactionRejected { reason }
        }
        (OpKind::Write, GatewayError::Rpc { message, .. }) => {
            SyncError::TransactionRejected { reason: message }
        }
        (OpKind::Write, GatewayError::Network(msg)) => SyncError::Network(msg),
        (OpKind::Write, GatewayError::Malformed(msg)) => {
            SyncError::Network(format!("malformed response: {}", msg))
        }
    }
}
