//! Contract call submission and confirmation monitoring.
//!
//! # Responsibilities
//! - Send signed contract calls through a wallet-enabled provider
//! - Poll receipts until the required confirmation depth
//! - Stop polling (never the transaction) when the caller cancels

use alloy::network::TransactionBuilder;
use alloy::primitives::{Address, Bytes, TxHash};
use alloy::providers::{Provider, ProviderBuilder};
use alloy::rpc::types::TransactionRequest;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::{interval, timeout};
use tokio_util::sync::CancellationToken;

use crate::blockchain::client::BlockchainClient;
use crate::blockchain::types::{BlockchainError, BlockchainResult, ConfirmationStatus};
use crate::blockchain::wallet::Wallet;

/// Sends contract calls signed by a local wallet and tracks their confirmation.
#[derive(Clone)]
pub struct TxSender {
    client: BlockchainClient,
    /// Provider with nonce, gas, chain-id and wallet fillers.
    sending_provider: Arc<dyn Provider + Send + Sync>,
    from: Address,
}

impl TxSender {
    /// Create a sender for `wallet` using the client's primary RPC endpoint.
    pub fn new(client: BlockchainClient, wallet: &Wallet) -> BlockchainResult<Self> {
        let rpc_url: url::Url = client.config().rpc_url.parse().map_err(|e| {
            BlockchainError::Rpc(format!("Invalid RPC URL '{}': {}", client.config().rpc_url, e))
        })?;

        let provider = ProviderBuilder::new()
            .wallet(wallet.network_wallet())
            .connect_http(rpc_url);

        Ok(Self {
            client,
            sending_provider: Arc::new(provider),
            from: wallet.address(),
        })
    }

    /// Broadcast a call to `to` carrying `data`. Returns once the node accepts it.
    pub async fn send_call(&self, to: Address, data: Bytes) -> BlockchainResult<TxHash> {
        let tx = TransactionRequest::default()
            .with_from(self.from)
            .with_to(to)
            .with_input(data);

        let pending = self
            .sending_provider
            .send_transaction(tx)
            .await
            .map_err(|e| BlockchainError::Submission(e.to_string()))?;

        let tx_hash = *pending.tx_hash();
        tracing::info!(tx_hash = %tx_hash, to = %to, "Transaction broadcast");
        Ok(tx_hash)
    }

    /// Wait for a transaction to reach the configured confirmation depth.
    ///
    /// Read failures while polling are logged and retried on the next tick.
    /// Cancelling `cancel`, or reaching `confirmation_timeout_secs`, abandons
    /// polling and yields [`ConfirmationStatus::Abandoned`]; the transaction
    /// itself is unaffected. Only a reverted receipt yields
    /// [`ConfirmationStatus::Failed`].
    pub async fn wait_for_confirmation(
        &self,
        tx_hash: TxHash,
        cancel: &CancellationToken,
    ) -> BlockchainResult<ConfirmationStatus> {
        let config = self.client.config();
        let required_confirmations = self.client.confirmation_blocks();
        let deadline = Duration::from_secs(config.confirmation_timeout_secs);
        let poll_interval = Duration::from_millis(config.poll_interval_ms);

        let poll = async {
            let mut ticker = interval(poll_interval);

            loop {
                ticker.tick().await;

                let receipt = match self.client.get_transaction_receipt(tx_hash).await {
                    Ok(Some(r)) => r,
                    Ok(None) => {
                        tracing::debug!(tx_hash = %tx_hash, "Transaction pending");
                        continue;
                    }
                    Err(e) => {
                        tracing::warn!(tx_hash = %tx_hash, error = %e, "Receipt read failed, retrying");
                        continue;
                    }
                };

                if !receipt.status() {
                    return ConfirmationStatus::Failed("Transaction reverted".to_string());
                }

                let current_block = match self.client.get_block_number().await {
                    Ok(n) => n,
                    Err(e) => {
                        tracing::warn!(tx_hash = %tx_hash, error = %e, "Block number read failed, retrying");
                        continue;
                    }
                };
                let tx_block = receipt.block_number.unwrap_or(current_block);
                // The inclusion block counts as the first confirmation.
                let confirmations = current_block.saturating_sub(tx_block) as u32 + 1;

                if confirmations >= required_confirmations {
                    return ConfirmationStatus::Confirmed {
                        block_number: tx_block,
                    };
                }

                tracing::debug!(
                    tx_hash = %tx_hash,
                    confirmations = confirmations,
                    required = required_confirmations,
                    "Waiting for confirmations"
                );
            }
        };

        tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                tracing::info!(tx_hash = %tx_hash, "Confirmation polling abandoned");
                Ok(ConfirmationStatus::Abandoned)
            }
            result = timeout(deadline, poll) => match result {
                Ok(status) => Ok(status),
                Err(_) => {
                    tracing::warn!(
                        tx_hash = %tx_hash,
                        after_secs = deadline.as_secs(),
                        "Stopped polling for confirmation; transaction may still confirm"
                    );
                    Ok(ConfirmationStatus::Abandoned)
                }
            },
        }
    }

    /// Get the sending address.
    pub fn address(&self) -> Address {
        self.from
    }
}

impl std::fmt::Debug for TxSender {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TxSender")
            .field("client", &self.client)
            .field("from", &self.from)
            .finish()
    }
}
