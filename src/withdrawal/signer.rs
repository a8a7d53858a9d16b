//! Wallet signature and signer-service exchange.

use alloy::primitives::{hex, Address, U256};
use alloy::signers::Signature;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::blockchain::Wallet;
use crate::config::WithdrawalConfig;
use crate::withdrawal::types::{
    de_u256_list, ConfirmationSig, WithdrawalConfirmation, WithdrawalError, WithdrawalResult,
};

/// Why a wallet did not produce a signature.
#[derive(Debug, Error)]
pub enum SignError {
    /// The user declined the request.
    #[error("signature request rejected")]
    Rejected,

    #[error("{0}")]
    Failed(String),
}

/// A wallet able to personal-sign a message.
#[async_trait]
pub trait MessageSigner: Send + Sync {
    fn address(&self) -> Address;

    /// Sign `message`. May wait on user interaction.
    async fn sign_message(&self, message: &str) -> Result<Signature, SignError>;
}

#[async_trait]
impl MessageSigner for Wallet {
    fn address(&self) -> Address {
        Wallet::address(self)
    }

    async fn sign_message(&self, message: &str) -> Result<Signature, SignError> {
        Wallet::sign_message(self, message.as_bytes())
            .await
            .map_err(|e| SignError::Failed(e.to_string()))
    }
}

/// Trades a user signature for a co-signed withdrawal confirmation.
#[async_trait]
pub trait ConfirmationExchange: Send + Sync {
    async fn exchange(
        &self,
        client: Address,
        item_ids: &[String],
        client_signature: &Signature,
    ) -> WithdrawalResult<WithdrawalConfirmation>;
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ExchangeRequest<'a> {
    client: Address,
    item_ids: &'a [String],
    client_signature: String,
}

#[derive(Debug, Deserialize)]
struct ExchangeResponse {
    confirmation: WireConfirmation,
    sig: ConfirmationSig,
}

#[derive(Debug, Deserialize)]
struct WireConfirmation {
    from: Address,
    to: Address,
    #[serde(deserialize_with = "de_u256_list")]
    ids: Vec<U256>,
}

impl From<ExchangeResponse> for WithdrawalConfirmation {
    fn from(response: ExchangeResponse) -> Self {
        WithdrawalConfirmation {
            from: response.confirmation.from,
            to: response.confirmation.to,
            ids: response.confirmation.ids,
            signature: response.sig,
        }
    }
}

/// HTTP client for the market's signer service.
#[derive(Debug, Clone)]
pub struct HttpSignerService {
    http: reqwest::Client,
    url: String,
}

impl HttpSignerService {
    pub fn new(http: reqwest::Client, config: &WithdrawalConfig) -> Self {
        Self {
            http,
            url: config.signer_url.clone(),
        }
    }
}

#[async_trait]
impl ConfirmationExchange for HttpSignerService {
    async fn exchange(
        &self,
        client: Address,
        item_ids: &[String],
        client_signature: &Signature,
    ) -> WithdrawalResult<WithdrawalConfirmation> {
        let body = ExchangeRequest {
            client,
            item_ids,
            client_signature: hex::encode_prefixed(client_signature.as_bytes()),
        };

        let response = self
            .http
            .post(&self.url)
            .json(&body)
            .send()
            .await
            .map_err(|e| WithdrawalError::SignatureExchange(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            return Err(WithdrawalError::SignatureExchange(format!(
                "signer returned {}: {}",
                status, detail
            )));
        }

        let parsed: ExchangeResponse = response
            .json()
            .await
            .map_err(|e| WithdrawalError::SignatureExchange(format!("malformed response: {}", e)))?;

        let confirmation = WithdrawalConfirmation::from(parsed);
        tracing::info!(
            from = %confirmation.from,
            to = %confirmation.to,
            items = confirmation.ids.len(),
            expiry = %confirmation.signature.expiry_timestamp,
            "Received withdrawal confirmation"
        );
        Ok(confirmation)
    }
}
