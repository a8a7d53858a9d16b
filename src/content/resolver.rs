//! Content resolution for inscribed items.
//!
//! # Responsibilities
//! - Prefer the hosted rendition when an item is flagged as supported
//! - Otherwise read the inscription payload from chain and decode it
//! - Surface read failures to the caller without retrying

use alloy::primitives::{Bytes, TxHash};
use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::blockchain::BlockchainError;
use crate::content::decoder::decode;
use crate::content::types::{ContentKind, DecodedContent};

/// Errors surfaced while fetching content to resolve.
#[derive(Debug, Error)]
pub enum ResolveError {
    /// Reading the inscription transaction failed.
    #[error("chain read failed: {0}")]
    Chain(#[from] BlockchainError),

    /// Fetching the hosted rendition failed.
    #[error("static store read failed: {0}")]
    StaticStore(String),
}

/// Result type for content resolution.
pub type ResolveResult<T> = Result<T, ResolveError>;

/// Read side of the chain and the rendition store.
#[async_trait]
pub trait ChainReader: Send + Sync {
    /// Raw input bytes of the inscribing transaction.
    async fn transaction_payload(&self, tx_hash: TxHash) -> ResolveResult<Bytes>;

    /// Hosted raster rendition, addressed by content SHA.
    async fn hosted_rendition(&self, sha: &str) -> ResolveResult<Vec<u8>>;
}

/// An inscribed item as known to the presentation layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InscribedItem {
    /// Hash of the inscribing transaction.
    pub hash_id: TxHash,
    /// SHA of the inscribed content.
    pub sha: String,
    /// A hosted rendition exists for this item.
    #[serde(default)]
    pub is_supported: bool,
}

/// Turns inscribed items into decoded content.
#[derive(Debug, Clone)]
pub struct ContentResolver<R> {
    reader: R,
}

impl<R: ChainReader> ContentResolver<R> {
    pub fn new(reader: R) -> Self {
        Self { reader }
    }

    /// Resolve `item` to content. `Ok(None)` means the inscription carried no data.
    ///
    /// Idempotent and safe to retry; it performs reads only.
    pub async fn resolve(&self, item: &InscribedItem) -> ResolveResult<Option<DecodedContent>> {
        if item.is_supported {
            let image = self.reader.hosted_rendition(&item.sha).await?;
            tracing::debug!(sha = %item.sha, bytes = image.len(), "Using hosted rendition");
            return Ok(Some(DecodedContent::new(
                ContentKind::Image,
                "image/png",
                format!("data:image/png;base64,{}", STANDARD.encode(image)),
            )));
        }

        let input = self.reader.transaction_payload(item.hash_id).await?;
        let raw = inscription_text(&input);
        if raw.is_empty() {
            tracing::debug!(hash_id = %item.hash_id, "Inscription has no payload");
            return Ok(None);
        }

        Ok(Some(decode(&raw)))
    }
}

/// Calldata as text with NUL padding and one redundant leading `0x` removed.
pub fn inscription_text(input: &[u8]) -> String {
    let text = String::from_utf8_lossy(input).replace('\0', "");
    match text.strip_prefix("0x") {
        Some(rest) => rest.to_string(),
        None => text,
    }
}
