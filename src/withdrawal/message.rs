//! Deterministic withdrawal message construction.
//!
//! The signer service rebuilds this exact text to verify the user's
//! signature, so wording, spacing and the expiry format are fixed.

use alloy::primitives::U256;
use chrono::{DateTime, SecondsFormat, TimeDelta, Utc};

use crate::withdrawal::types::{WithdrawalError, WithdrawalResult};

/// Expiry granularity: ten minutes.
pub const EXPIRY_STEP_MS: i64 = 10 * 60 * 1000;

/// Parse item ids (decimal or 0x-hex, any case) into integers, preserving order.
pub fn normalize_item_ids(item_ids: &[String]) -> WithdrawalResult<Vec<U256>> {
    if item_ids.is_empty() {
        return Err(WithdrawalError::EmptyBatch);
    }
    item_ids
        .iter()
        .map(|id| {
            id.trim()
                .to_ascii_lowercase()
                .parse::<U256>()
                .map_err(|_| WithdrawalError::InvalidItemId(id.clone()))
        })
        .collect()
}

/// Expiry for a message signed at `now`: the ten-minute boundary after the
/// next one, i.e. between 10 and 20 minutes ahead.
pub fn expiry_for(now: DateTime<Utc>) -> DateTime<Utc> {
    let now_ms = now.timestamp_millis();
    let expiry_ms = (now_ms.div_euclid(EXPIRY_STEP_MS) + 2) * EXPIRY_STEP_MS;
    now + TimeDelta::milliseconds(expiry_ms - now_ms)
}

/// The message a user signs to authorize a batch withdrawal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WithdrawalMessage {
    text: String,
    expiry: DateTime<Utc>,
}

impl WithdrawalMessage {
    /// Build the message for `item_ids` (canonical decimal strings) in the given order.
    pub fn new(item_ids: &[String], now: DateTime<Utc>) -> Self {
        let expiry = expiry_for(now);
        let plural = if item_ids.len() > 1 { "s" } else { "" };
        let text = format!(
            "I would like to withdraw the following item{}: {} \n\nSigning this message does not cost gas. \n\nThis signature expires at: {}",
            plural,
            item_ids.join(", "),
            expiry.to_rfc3339_opts(SecondsFormat::Millis, true)
        );
        Self { text, expiry }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn expiry(&self) -> DateTime<Utc> {
        self.expiry
    }

    /// Expiry as Unix seconds, the unit the contract checks.
    pub fn expiry_secs(&self) -> u64 {
        self.expiry.timestamp().max(0) as u64
    }
}
