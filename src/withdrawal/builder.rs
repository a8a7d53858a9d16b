//! Batch withdrawal attempt: sign, exchange, validate, submit, confirm.

use std::sync::Arc;

use alloy::primitives::TxHash;
use chrono::{DateTime, Utc};
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tracing::Instrument;
use uuid::Uuid;

use crate::blockchain::ConfirmationStatus;
use crate::observability::metrics;
use crate::withdrawal::message::{normalize_item_ids, WithdrawalMessage};
use crate::withdrawal::signer::{ConfirmationExchange, MessageSigner, SignError};
use crate::withdrawal::submit::WithdrawalSubmitter;
use crate::withdrawal::types::{WithdrawalError, WithdrawalResult, WithdrawalState};

/// Source of the current time.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Drives one withdrawal attempt at a time and publishes its state.
pub struct WithdrawalRequestBuilder<S, X, T> {
    signer: S,
    exchange: X,
    submitter: T,
    clock: Arc<dyn Clock>,
    state: watch::Sender<WithdrawalState>,
}

impl<S, X, T> WithdrawalRequestBuilder<S, X, T>
where
    S: MessageSigner,
    X: ConfirmationExchange,
    T: WithdrawalSubmitter,
{
    pub fn new(signer: S, exchange: X, submitter: T) -> Self {
        let (state, _) = watch::channel(WithdrawalState::Idle);
        Self {
            signer,
            exchange,
            submitter,
            clock: Arc::new(SystemClock),
            state,
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Follow state transitions of current and future attempts.
    pub fn subscribe(&self) -> watch::Receiver<WithdrawalState> {
        self.state.subscribe()
    }

    pub fn state(&self) -> WithdrawalState {
        self.state.borrow().clone()
    }

    /// Withdraw `item_ids` in the given order and return the transaction hash.
    ///
    /// `cancel` aborts the attempt with [`WithdrawalError::UserCancelled`] at
    /// any point before submission. Once submitted, the attempt fails only if
    /// the transaction reverts. Cancelling, or losing track of the transaction
    /// while polling, returns the hash with the state left at
    /// [`WithdrawalState::Submitted`].
    pub async fn build_and_submit(
        &self,
        item_ids: &[String],
        cancel: &CancellationToken,
    ) -> WithdrawalResult<TxHash> {
        let span = tracing::info_span!(
            "withdrawal",
            attempt_id = %Uuid::new_v4(),
            client = %self.signer.address(),
            items = item_ids.len()
        );

        async move {
            match self.attempt(item_ids, cancel).await {
                Ok(tx_hash) => Ok(tx_hash),
                Err(e) => {
                    if e.is_user_cancellation() {
                        tracing::info!("Withdrawal cancelled");
                    } else {
                        tracing::error!(error = %e, "Withdrawal failed");
                    }
                    self.transition(WithdrawalState::Failed {
                        reason: e.to_string(),
                    });
                    Err(e)
                }
            }
        }
        .instrument(span)
        .await
    }

    async fn attempt(
        &self,
        item_ids: &[String],
        cancel: &CancellationToken,
    ) -> WithdrawalResult<TxHash> {
        let ids = normalize_item_ids(item_ids)?;
        let canonical: Vec<String> = ids.iter().map(|id| id.to_string()).collect();
        let message = WithdrawalMessage::new(&canonical, self.clock.now());

        self.transition(WithdrawalState::PendingSignature);
        let signature = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(WithdrawalError::UserCancelled),
            result = self.signer.sign_message(message.text()) => result.map_err(|e| match e {
                SignError::Rejected => WithdrawalError::UserCancelled,
                SignError::Failed(reason) => WithdrawalError::Signing(reason),
            })?,
        };

        self.transition(WithdrawalState::PendingConfirmationExchange);
        let confirmation = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(WithdrawalError::UserCancelled),
            result = self.exchange.exchange(self.signer.address(), &canonical, &signature) => result?,
        };

        let now_secs = self.clock.now().timestamp().max(0) as u64;
        confirmation.validate(&ids, message.expiry_secs(), now_secs)?;

        if cancel.is_cancelled() {
            return Err(WithdrawalError::UserCancelled);
        }

        self.transition(WithdrawalState::PendingChainSubmission);
        let tx_hash = self
            .submitter
            .submit(&confirmation.to_call())
            .await
            .map_err(|e| WithdrawalError::ChainSubmission(e.to_string()))?;
        self.transition(WithdrawalState::Submitted { tx_hash });

        match self.submitter.await_confirmation(tx_hash, cancel).await {
            Ok(ConfirmationStatus::Confirmed { block_number }) => {
                tracing::info!(tx_hash = %tx_hash, block_number, "Withdrawal confirmed");
                self.transition(WithdrawalState::Confirmed {
                    tx_hash,
                    block_number,
                });
                Ok(tx_hash)
            }
            Ok(ConfirmationStatus::Abandoned) => {
                tracing::info!(tx_hash = %tx_hash, "Stopped following submitted withdrawal");
                Ok(tx_hash)
            }
            Ok(ConfirmationStatus::Failed(reason)) => Err(WithdrawalError::ChainSubmission(
                format!("transaction {} failed: {}", tx_hash, reason),
            )),
            Err(e) => {
                tracing::warn!(tx_hash = %tx_hash, error = %e, "Lost track of submitted withdrawal");
                Ok(tx_hash)
            }
        }
    }

    fn transition(&self, next: WithdrawalState) {
        tracing::debug!(state = next.as_str(), "Withdrawal state");
        metrics::record_withdrawal_transition(next.as_str());
        self.state.send_replace(next);
    }
}

impl<S, X, T> std::fmt::Debug for WithdrawalRequestBuilder<S, X, T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WithdrawalRequestBuilder")
            .field("state", &*self.state.borrow())
            .finish_non_exhaustive()
    }
}
