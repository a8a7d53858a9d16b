//! Escrow reconciliation types.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Escrow state as reported by the owner index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EscrowState {
    Escrowed,
    Empty,
}

impl EscrowState {
    /// Sentinel the owner index uses for "not escrowed".
    pub const EMPTY_SENTINEL: &'static str = "EMPTY";

    /// Interpret the index's `escrowState`. Anything but the sentinel,
    /// including a missing value, counts as escrowed; the verification
    /// index has the final say.
    pub fn from_index(value: Option<&str>) -> Self {
        match value {
            Some(Self::EMPTY_SENTINEL) => EscrowState::Empty,
            _ => EscrowState::Escrowed,
        }
    }
}

/// An item the owner index believes is escrowed for the owner.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EscrowCandidate {
    /// Inscription transaction hash, lowercase `0x` hex.
    pub item_id: String,
    pub owner_index_state: EscrowState,
    /// Raw content as cached by the owner index, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub raw_content: Option<String>,
}

/// Item ids confirmed as escrowed by the verification index.
///
/// Built fresh per reconciliation run and never persisted. Iteration order
/// is sorted, so a batch built from it is reproducible.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VerifiedEscrowSet {
    item_ids: BTreeSet<String>,
}

impl VerifiedEscrowSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, item_id: String) -> bool {
        self.item_ids.insert(item_id)
    }

    pub fn contains(&self, item_id: &str) -> bool {
        self.item_ids.contains(item_id)
    }

    pub fn len(&self) -> usize {
        self.item_ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.item_ids.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &String> {
        self.item_ids.iter()
    }

    /// Consume the set into an ordered id list suitable for a withdrawal batch.
    pub fn into_ids(self) -> Vec<String> {
        self.item_ids.into_iter().collect()
    }
}

impl Extend<String> for VerifiedEscrowSet {
    fn extend<I: IntoIterator<Item = String>>(&mut self, iter: I) {
        self.item_ids.extend(iter);
    }
}

impl FromIterator<String> for VerifiedEscrowSet {
    fn from_iter<I: IntoIterator<Item = String>>(iter: I) -> Self {
        Self {
            item_ids: iter.into_iter().collect(),
        }
    }
}

/// Errors talking to either index. Never leaves the escrow subsystem:
/// callers see empty or `None` results instead.
#[derive(Debug, Error)]
pub enum IndexError {
    #[error("index request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("malformed index data: {0}")]
    Malformed(String),
}

/// Normalize an inscription transaction hash to lowercase `0x` hex.
pub fn normalize_item_id(raw: &str) -> Result<String, IndexError> {
    let lower = raw.trim().to_ascii_lowercase();
    let hex = lower.strip_prefix("0x").unwrap_or(&lower);
    if hex.len() != 64 || !hex.bytes().all(|b| b.is_ascii_hexdigit()) {
        return Err(IndexError::Malformed(format!("'{}' is not a transaction hash", raw)));
    }
    Ok(format!("0x{}", hex))
}
