//! A single reconciliation run: owner index listing, then verification.

use alloy::primitives::Address;
use tracing::Instrument;
use uuid::Uuid;

use crate::escrow::owner_index::OwnerIndexClient;
use crate::escrow::preferences::ReconcilePreferences;
use crate::escrow::types::VerifiedEscrowSet;
use crate::escrow::verifier::EscrowVerifier;

/// Finds the items still escrowed for an owner.
#[derive(Debug, Clone)]
pub struct Reconciler {
    index: OwnerIndexClient,
    verifier: EscrowVerifier,
    preferences: ReconcilePreferences,
}

impl Reconciler {
    pub fn new(
        index: OwnerIndexClient,
        verifier: EscrowVerifier,
        preferences: ReconcilePreferences,
    ) -> Self {
        Self {
            index,
            verifier,
            preferences,
        }
    }

    /// Run reconciliation for `owner`.
    ///
    /// `None` when there is no owner, the notice was dismissed, or either
    /// index could not produce a trustworthy answer.
    pub async fn run(&self, owner: Option<Address>) -> Option<VerifiedEscrowSet> {
        let owner = owner?;
        if self.preferences.withdrawal_notice_dismissed {
            tracing::debug!(owner = %owner, "Withdrawal notice dismissed, skipping reconciliation");
            return None;
        }

        let span = tracing::info_span!("reconcile", run_id = %Uuid::new_v4(), owner = %owner);
        async move {
            let candidates = self.index.list_escrowed(owner).await?;
            let ids: Vec<String> = candidates.into_iter().map(|c| c.item_id).collect();
            if ids.is_empty() {
                return Some(VerifiedEscrowSet::new());
            }
            self.verifier.verify(&ids).await
        }
        .instrument(span)
        .await
    }
}
