//! Escrow contract submission.

use alloy::primitives::{Address, TxHash};
use alloy::sol_types::SolCall;
use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::blockchain::contract::bulkWithdrawItemsCall;
use crate::blockchain::{BlockchainError, ConfirmationStatus, TxSender};

/// Sends a `bulkWithdrawItems` call and follows it to confirmation.
#[async_trait]
pub trait WithdrawalSubmitter: Send + Sync {
    async fn submit(&self, call: &bulkWithdrawItemsCall) -> Result<TxHash, BlockchainError>;

    async fn await_confirmation(
        &self,
        tx_hash: TxHash,
        cancel: &CancellationToken,
    ) -> Result<ConfirmationStatus, BlockchainError>;
}

/// Submits to the escrow contract through a wallet-backed sender.
#[derive(Debug, Clone)]
pub struct ContractSubmitter {
    sender: TxSender,
    contract: Address,
}

impl ContractSubmitter {
    pub fn new(sender: TxSender, contract: Address) -> Self {
        Self { sender, contract }
    }

    pub fn contract(&self) -> Address {
        self.contract
    }
}

#[async_trait]
impl WithdrawalSubmitter for ContractSubmitter {
    async fn submit(&self, call: &bulkWithdrawItemsCall) -> Result<TxHash, BlockchainError> {
        tracing::info!(
            contract = %self.contract,
            from = %self.sender.address(),
            items = call.confirmation.ids.len(),
            "Submitting bulkWithdrawItems"
        );
        self.sender
            .send_call(self.contract, call.abi_encode().into())
            .await
    }

    async fn await_confirmation(
        &self,
        tx_hash: TxHash,
        cancel: &CancellationToken,
    ) -> Result<ConfirmationStatus, BlockchainError> {
        self.sender.wait_for_confirmation(tx_hash, cancel).await
    }
}
