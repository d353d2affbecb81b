//! # JSON-RPC Chain Gateway
//!
//! [`ChainGateway`] over an Ethereum-style JSON-RPC endpoint, the node or
//! wallet provider that holds the user's account. Transport, envelope and
//! quantity encoding are handled by an `alloy` provider; this module maps
//! gateway calls onto it and classifies its errors.
//!
//! ## Method Mapping
//!
//! | Gateway call | JSON-RPC |
//! |--------------|----------|
//! | `connect_wallet` | `eth_requestAccounts` (falls back to `eth_accounts`) |
//! | `signer` | `eth_accounts` |
//! | `chain_id` | `eth_chainId` |
//! | `treasury_balance` | `eth_getBalance(dao, "latest")` |
//! | reads | `eth_call` with ABI call data |
//! | writes | `eth_sendTransaction` (the node signs) |
//! | `wait_for_receipt` | `eth_getTransactionReceipt`, polled |
//!
//! ## Error Mapping
//!
//! | JSON-RPC error | Gateway error |
//! |----------------|---------------|
//! | code 4001 | `UserRejected` |
//! | code 4100 / 4900 | `WalletUnavailable` |
//! | `Error(string)` revert data, or "execution reverted" message | `Reverted` |
//! | any other error response | `Rpc` |
//! | undecodable response | `Malformed` |
//! | transport failure | `Network` |
//!
//! No retry. Receipt polling runs until the receipt appears; the
//! synchronizer bounds it.

use std::time::Duration;

use alloy::network::ReceiptResponse;
use alloy::primitives::Bytes;
use alloy::providers::{DynProvider, Provider, ProviderBuilder};
use alloy::rpc::client::RpcClient;
use alloy::rpc::json_rpc::ErrorPayload;
use alloy::rpc::types::TransactionRequest;
use alloy::sol_types::{Revert, SolError};
use alloy::transports::http::Http;
use alloy::transports::{RpcError, TransportError};
use async_trait::async_trait;
use serde_json::Value;
use tracing::debug;

use cryptodevs_common::abi;
use cryptodevs_common::{Address, ClientConfig, Proposal, TxHash, VoteChoice, U256};

use crate::gateway::{ChainGateway, GatewayError, TxReceipt};

/// EIP-1193 "user rejected request".
const CODE_USER_REJECTED: i64 = 4001;
/// EIP-1193 "unauthorized".
const CODE_UNAUTHORIZED: i64 = 4100;
/// EIP-1193 "disconnected".
const CODE_DISCONNECTED: i64 = 4900;
/// JSON-RPC "method not found".
const CODE_METHOD_NOT_FOUND: i64 = -32601;

const REVERT_MESSAGE_PREFIX: &str = "execution reverted";

// ════════════════════════════════════════════════════════════════════════════════
// GATEWAY
// ════════════════════════════════════════════════════════════════════════════════

/// HTTP JSON-RPC gateway bound to the DAO and NFT contract addresses.
pub struct JsonRpcGateway {
    provider: DynProvider,
    url: String,
    dao_address: Address,
    nft_address: Address,
    poll_interval: Duration,
}

impl JsonRpcGateway {
    /// Builds a gateway from configuration.
    ///
    /// The provider carries no fillers: gas, nonce and signing are left to
    /// the wallet node behind `eth_sendTransaction`.
    pub fn new(config: &ClientConfig) -> Result<Self, GatewayError> {
        let url = reqwest::Url::parse(&config.rpc_url)
            .map_err(|e| GatewayError::Network(format!("invalid rpc url '{}': {}", config.rpc_url, e)))?;
        let http = reqwest::Client::builder()
            .timeout(config.http_timeout())
            .build()
            .map_err(|e| GatewayError::Network(format!("failed to build HTTP client: {}", e)))?;

        let client = RpcClient::new(Http::with_client(http, url), false);
        let provider = ProviderBuilder::new()
            .disable_recommended_fillers()
            .connect_client(client)
            .erased();

        Ok(Self {
            provider,
            url: config.rpc_url.clone(),
            dao_address: config.dao_address,
            nft_address: config.nft_address,
            poll_interval: config.poll_interval(),
        })
    }

    /// Endpoint this gateway talks to.
    pub fn url(&self) -> &str {
        &self.url
    }

    async fn eth_call(&self, to: Address, data: Vec<u8>) -> Result<Bytes, GatewayError> {
        debug!(%to, "eth_call");
        let tx = TransactionRequest::default()
            .to(to)
            .input(Bytes::from(data).into());
        self.provider
            .call(tx)
            .await
            .map_err(|e| map_transport_error("eth_call", e))
    }

    async fn send_transaction(
        &self,
        from: Address,
        to: Address,
        data: Vec<u8>,
    ) -> Result<TxHash, GatewayError> {
        debug!(%from, %to, "eth_sendTransaction");
        let tx = TransactionRequest::default()
            .from(from)
            .to(to)
            .input(Bytes::from(data).into());
        let pending = self
            .provider
            .send_transaction(tx)
            .await
            .map_err(|e| map_transport_error("eth_sendTransaction", e))?;
        Ok(*pending.tx_hash())
    }

    async fn request_accounts(&self) -> Result<Vec<Address>, GatewayError> {
        self.provider
            .raw_request::<_, Vec<Address>>("eth_requestAccounts".into(), [(); 0])
            .await
            .map_err(|e| map_transport_error("eth_requestAccounts", e))
    }

    async fn accounts(&self) -> Result<Vec<Address>, GatewayError> {
        self.provider
            .get_accounts()
            .await
            .map_err(|e| map_transport_error("eth_accounts", e))
    }
}

fn first_account(accounts: Vec<Address>) -> Result<Address, GatewayError> {
    accounts
        .into_iter()
        .next()
        .ok_or_else(|| GatewayError::WalletUnavailable("no accounts exposed".to_string()))
}

fn to_u64(value: U256, what: &str) -> Result<u64, GatewayError> {
    u64::try_from(value).map_err(|_| GatewayError::Malformed(format!("{} exceeds u64", what)))
}

fn malformed(what: &str, err: alloy::sol_types::Error) -> GatewayError {
    GatewayError::Malformed(format!("{}: {}", what, err))
}

#[async_trait]
impl ChainGateway for JsonRpcGateway {
    async fn connect_wallet(&self) -> Result<Address, GatewayError> {
        let accounts = match self.request_accounts().await {
            Err(GatewayError::Rpc { code: CODE_METHOD_NOT_FOUND, .. }) => self.accounts().await?,
            other => other?,
        };
        first_account(accounts)
    }

    async fn chain_id(&self) -> Result<u64, GatewayError> {
        self.provider
            .get_chain_id()
            .await
            .map_err(|e| map_transport_error("eth_chainId", e))
    }

    async fn signer(&self) -> Result<Address, GatewayError> {
        first_account(self.accounts().await?)
    }

    async fn treasury_balance(&self) -> Result<U256, GatewayError> {
        self.provider
            .get_balance(self.dao_address)
            .await
            .map_err(|e| map_transport_error("eth_getBalance", e))
    }

    async fn proposal_count(&self) -> Result<u64, GatewayError> {
        let data = self.eth_call(self.dao_address, abi::num_proposals_call()).await?;
        let count = abi::decode_num_proposals(&data).map_err(|e| malformed("numProposals", e))?;
        to_u64(count, "proposal count")
    }

    async fn proposal(&self, id: u64) -> Result<Proposal, GatewayError> {
        let data = self.eth_call(self.dao_address, abi::proposal_call(id)).await?;
        abi::decode_proposal(id, &data).map_err(|e| malformed("proposals", e))
    }

    async fn nft_balance_of(&self, owner: Address) -> Result<U256, GatewayError> {
        let data = self.eth_call(self.nft_address, abi::balance_of_call(owner)).await?;
        abi::decode_balance_of(&data).map_err(|e| malformed("balanceOf", e))
    }

    async fn submit_create_proposal(
        &self,
        from: Address,
        nft_token_id: U256,
    ) -> Result<TxHash, GatewayError> {
        self.send_transaction(from, self.dao_address, abi::create_proposal_call(nft_token_id))
            .await
    }

    async fn submit_vote(
        &self,
        from: Address,
        proposal_id: u64,
        choice: VoteChoice,
    ) -> Result<TxHash, GatewayError> {
        self.send_transaction(
            from,
            self.dao_address,
            abi::vote_on_proposal_call(proposal_id, choice),
        )
        .await
    }

    async fn submit_execute(&self, from: Address, proposal_id: u64) -> Result<TxHash, GatewayError> {
        self.send_transaction(from, self.dao_address, abi::execute_proposal_call(proposal_id))
            .await
    }

    async fn wait_for_receipt(&self, tx_hash: TxHash) -> Result<TxReceipt, GatewayError> {
        loop {
            let receipt = self
                .provider
                .get_transaction_receipt(tx_hash)
                .await
                .map_err(|e| map_transport_error("eth_getTransactionReceipt", e))?;
            match receipt {
                Some(r) => {
                    return Ok(TxReceipt {
                        tx_hash,
                        block_number: r.block_number().unwrap_or(0),
                        success: r.status(),
                    });
                }
                None => {
                    debug!(%tx_hash, "receipt not available yet");
                    tokio::time::sleep(self.poll_interval).await;
                }
            }
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════════
// INTERNAL: ERROR CLASSIFICATION
// ════════════════════════════════════════════════════════════════════════════════

fn map_transport_error(method: &str, err: TransportError) -> GatewayError {
    match err {
        RpcError::ErrorResp(payload) => map_error_payload(&payload),
        RpcError::DeserError { err, .. } => GatewayError::Malformed(format!("{}: {}", method, err)),
        RpcError::NullResp => GatewayError::Malformed(format!("{}: null response", method)),
        other => GatewayError::Network(format!("{} failed: {}", method, other)),
    }
}

/// Revert payload may sit in `data` directly or in `data.data`.
fn revert_data(payload: &ErrorPayload) -> Option<Bytes> {
    let raw = payload.data.as_ref()?;
    let value: Value = serde_json::from_str(raw.get()).ok()?;
    let s = value
        .as_str()
        .or_else(|| value.get("data").and_then(Value::as_str))?;
    s.parse().ok()
}

fn map_error_payload(payload: &ErrorPayload) -> GatewayError {
    match payload.code {
        CODE_USER_REJECTED => return GatewayError::UserRejected,
        CODE_UNAUTHORIZED | CODE_DISCONNECTED => {
            return GatewayError::WalletUnavailable(payload.message.to_string());
        }
        _ => {}
    }

    if let Some(revert) = revert_data(payload).and_then(|d| Revert::abi_decode(&d).ok()) {
        return GatewayError::Reverted { reason: revert.reason };
    }

    if let Some(rest) = payload.message.strip_prefix(REVERT_MESSAGE_PREFIX) {
        let reason = rest.trim_start_matches(':').trim();
        let reason = if reason.is_empty() { REVERT_MESSAGE_PREFIX } else { reason };
        return GatewayError::Reverted {
            reason: reason.to_string(),
        };
    }

    GatewayError::Rpc {
        code: payload.code,
        message: payload.message.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy::primitives::hex;
    use serde_json::json;

    fn payload(body: Value) -> ErrorPayload {
        serde_json::from_str(&body.to_string()).unwrap_or_else(|e| panic!("payload: {}", e))
    }

    fn revert_hex(reason: &str) -> String {
        hex::encode_prefixed(Revert { reason: reason.to_string() }.abi_encode())
    }

    #[test]
    fn user_rejection_and_disconnect() {
        let err = map_error_payload(&payload(json!({ "code": 4001, "message": "User denied" })));
        assert_eq!(err, GatewayError::UserRejected);
        assert!(matches!(
            map_error_payload(&payload(json!({ "code": 4900, "message": "disconnected" }))),
            GatewayError::WalletUnavailable(_)
        ));
    }

    #[test]
    fn revert_from_data_payload() {
        let err = map_error_payload(&payload(json!({
            "code": 3,
            "message": "execution reverted: ALREADY_VOTED",
            "data": revert_hex("ALREADY_VOTED"),
        })));
        assert_eq!(err, GatewayError::Reverted { reason: "ALREADY_VOTED".into() });

        let err = map_error_payload(&payload(json!({
            "code": -32603,
            "message": "Internal error",
            "data": { "data": revert_hex("DEADLINE_EXCEEDED") },
        })));
        assert_eq!(err, GatewayError::Reverted { reason: "DEADLINE_EXCEEDED".into() });
    }

    #[test]
    fn revert_from_message_only() {
        let err = map_error_payload(&payload(json!({
            "code": -32000,
            "message": "execution reverted: NOT_A_DAO_MEMBER",
        })));
        assert_eq!(err, GatewayError::Reverted { reason: "NOT_A_DAO_MEMBER".into() });

        let bare = map_error_payload(&payload(json!({ "code": -32000, "message": "execution reverted" })));
        assert_eq!(bare, GatewayError::Reverted { reason: "execution reverted".into() });
    }

    #[test]
    fn other_errors_stay_rpc() {
        let err = map_error_payload(&payload(json!({ "code": -32000, "message": "nonce too low" })));
        assert_eq!(
            err,
            GatewayError::Rpc { code: -32000, message: "nonce too low".into() }
        );
    }

    #[test]
    fn null_response_is_malformed() {
        let err = map_transport_error("eth_call", RpcError::NullResp);
        assert!(matches!(err, GatewayError::Malformed(_)));
    }

    #[test]
    fn wide_values_do_not_fit_u64() {
        assert_eq!(to_u64(U256::from(5u8), "count"), Ok(5));
        let wide = U256::from(u64::MAX) + U256::from(1u8);
        assert!(matches!(to_u64(wide, "count"), Err(GatewayError::Malformed(_))));
    }

    #[test]
    fn empty_account_list_is_wallet_unavailable() {
        assert!(matches!(first_account(vec![]), Err(GatewayError::WalletUnavailable(_))));
        let a = Address::repeat_byte(7);
        assert_eq!(first_account(vec![a]), Ok(a));
    }
}
