//! # CryptoDevs DAO Client
//!
//! Proposal lifecycle synchronizer for the CryptoDevs DAO: mirrors the
//! treasury, the proposal set and the caller's membership, and drives
//! create / vote / execute transactions through a [`ChainGateway`].
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | `gateway` | `ChainGateway` trait and gateway errors |
//! | `json_rpc` | Gateway over an Ethereum JSON-RPC endpoint |
//! | `mock_gateway` | In-memory DAO for tests and demos |
//! | `session` | Connected flag and single-write busy gate |
//! | `snapshot` | Immutable state copy for rendering |
//! | `synchronizer` | `ProposalSynchronizer` |
//! | `error` | `SyncError` taxonomy |

pub mod error;
pub mod gateway;
pub mod json_rpc;
pub mod mock_gateway;
pub mod session;
pub mod snapshot;
pub mod synchronizer;

pub use error::SyncError;
pub use gateway::{ChainGateway, GatewayError, TxReceipt};
pub use json_rpc::JsonRpcGateway;
pub use mock_gateway::MockChainGateway;
pub use session::{BusyGuard, SessionState};
pub use snapshot::{CallerProfile, DaoSnapshot};
pub use synchronizer::{ProposalSynchronizer, RefreshReport, TxOutcome, WriteCall};
