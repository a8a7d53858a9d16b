//! Cross-checks candidates against the verification index.
//!
//! # Responsibilities
//! - Split candidates into chunks the index accepts (at most 100 hashes)
//! - Page through each chunk's filtered query (hash set + custodial owner)
//! - Keep only hashes the index confirms, ignoring anything it returns
//!   outside the queried chunk
//!
//! # Design Decisions
//! - Chunks run sequentially in input order
//! - A failed chunk contributes nothing; the remaining chunks still run
//! - Malformed input yields `None` rather than an error

use std::collections::HashSet;

use alloy::primitives::Address;
use serde::Deserialize;
use thiserror::Error;

use crate::config::VerificationIndexConfig;
use crate::escrow::types::{normalize_item_id, IndexError, VerifiedEscrowSet};
use crate::observability::metrics;

#[derive(Debug, Clone, Deserialize)]
struct VerificationPage {
    #[serde(default)]
    ethscriptions: Vec<VerifiedEthscription>,
}

#[derive(Debug, Clone, Deserialize)]
struct VerifiedEthscription {
    transaction_hash: String,
}

/// Hashes confirmed for one chunk.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChunkOutcome {
    pub matched: Vec<String>,
    pub pages: usize,
}

/// A chunk whose query failed.
#[derive(Debug, Error)]
#[error("chunk {index} failed: {source}")]
pub struct ChunkError {
    pub index: usize,
    #[source]
    pub source: IndexError,
}

/// Summary of a verification pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VerificationReport {
    pub verified: VerifiedEscrowSet,
    pub chunks: usize,
    /// Indexes of chunks that contributed nothing because their query failed.
    pub failed_chunks: Vec<usize>,
}

impl VerificationReport {
    /// Fold one chunk's result into the report.
    fn absorb(mut self, outcome: Result<ChunkOutcome, ChunkError>) -> Self {
        self.chunks += 1;
        match outcome {
            Ok(chunk) => {
                metrics::record_verify_chunk("ok");
                self.verified.extend(chunk.matched);
            }
            Err(e) => {
                metrics::record_verify_chunk("failed");
                tracing::warn!(chunk = e.index, error = %e.source, "Verification chunk failed, skipping");
                self.failed_chunks.push(e.index);
            }
        }
        self
    }
}

/// Verification-index client.
#[derive(Debug, Clone)]
pub struct EscrowVerifier {
    http: reqwest::Client,
    config: VerificationIndexConfig,
    custodial_owner: String,
}

impl EscrowVerifier {
    /// Create a verifier. Fails if the configured custodial owner is not an address.
    pub fn new(http: reqwest::Client, config: VerificationIndexConfig) -> Result<Self, IndexError> {
        let custodial_owner: Address = config.custodial_owner.parse().map_err(|_| {
            IndexError::Malformed(format!("invalid custodial owner '{}'", config.custodial_owner))
        })?;

        Ok(Self {
            http,
            custodial_owner: custodial_owner.to_string().to_ascii_lowercase(),
            config,
        })
    }

    /// Return the subset of `candidate_ids` the verification index confirms
    /// as held by the custodial owner. `None` if the input is malformed.
    pub async fn verify(&self, candidate_ids: &[String]) -> Option<VerifiedEscrowSet> {
        self.verify_with_report(candidate_ids).await.map(|report| report.verified)
    }

    /// Like [`verify`](Self::verify) but keeps per-chunk bookkeeping.
    pub async fn verify_with_report(&self, candidate_ids: &[String]) -> Option<VerificationReport> {
        let hashes = match candidate_ids
            .iter()
            .map(|id| normalize_item_id(id))
            .collect::<Result<Vec<_>, _>>()
        {
            Ok(hashes) => hashes,
            Err(e) => {
                tracing::warn!(error = %e, "Rejecting verification input");
                return None;
            }
        };

        let mut outcomes = Vec::new();
        for (index, chunk) in hashes.chunks(self.config.chunk_size.max(1)).enumerate() {
            outcomes.push(self.verify_chunk(index, chunk).await);
        }

        let report = outcomes
            .into_iter()
            .fold(VerificationReport::default(), VerificationReport::absorb);

        tracing::info!(
            candidates = hashes.len(),
            verified = report.verified.len(),
            chunks = report.chunks,
            failed_chunks = report.failed_chunks.len(),
            "Escrow verification complete"
        );
        Some(report)
    }

    async fn verify_chunk(&self, index: usize, chunk: &[String]) -> Result<ChunkOutcome, ChunkError> {
        self.query_chunk(chunk)
            .await
            .map_err(|source| ChunkError { index, source })
    }

    async fn query_chunk(&self, chunk: &[String]) -> Result<ChunkOutcome, IndexError> {
        let wanted: HashSet<&str> = chunk.iter().map(String::as_str).collect();
        let hash_param = serde_json::to_string(chunk)
            .map_err(|e| IndexError::Malformed(e.to_string()))?;
        let per_page = self.config.page_size.to_string();

        let mut outcome = ChunkOutcome::default();
        let mut seen: HashSet<String> = HashSet::new();
        let mut page = 1usize;

        loop {
            let page_param = page.to_string();
            let response = self
                .http
                .get(&self.config.url)
                .query(&[
                    ("transaction_hash", hash_param.as_str()),
                    ("current_owner", self.custodial_owner.as_str()),
                    ("page", page_param.as_str()),
                    ("per_page", per_page.as_str()),
                ])
                .send()
                .await?
                .error_for_status()?
                .json::<VerificationPage>()
                .await?;
            outcome.pages += 1;

            let returned = response.ethscriptions.len();
            let mut new_matches = 0usize;
            for entry in response.ethscriptions {
                let hash = entry.transaction_hash.to_ascii_lowercase();
                if wanted.contains(hash.as_str()) && seen.insert(hash.clone()) {
                    outcome.matched.push(hash);
                    new_matches += 1;
                }
            }

            // A short page ends the chunk. So does a page with nothing new,
            // which also guards against an index that ignores `page`.
            if returned < self.config.page_size || new_matches == 0 || seen.len() >= chunk.len() {
                break;
            }
            page += 1;
        }

        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::{Matcher, Server};
    use serde_json::json;

    fn hash(n: usize) -> String {
        format!("0x{:064x}", n)
    }

    fn verifier(url: String, page_size: usize) -> EscrowVerifier {
        EscrowVerifier::new(
            reqwest::Client::new(),
            VerificationIndexConfig {
                url,
                page_size,
                ..VerificationIndexConfig::default()
            },
        )
        .unwrap()
    }

    #[tokio::test]
    async fn test_empty_input_issues_no_requests() {
        let verifier = verifier("http://127.0.0.1:1/filtered".to_string(), 100);
        let report = verifier.verify_with_report(&[]).await.unwrap();
        assert!(report.verified.is_empty());
        assert_eq!(report.chunks, 0);
    }

    #[tokio::test]
    async fn test_malformed_input_yields_none() {
        let verifier = verifier("http://127.0.0.1:1/filtered".to_string(), 100);
        assert!(verifier.verify(&["not-a-hash".to_string()]).await.is_none());
    }

    #[tokio::test]
    async fn test_results_outside_chunk_are_ignored() {
        let mut server = Server::new_async().await;
        let ids = vec![hash(1), hash(0xabc)];
        let _mock = server
            .mock("GET", "/filtered")
            .match_query(Matcher::AllOf(vec![
                Matcher::UrlEncoded("transaction_hash".into(), serde_json::to_string(&ids).unwrap()),
                Matcher::UrlEncoded(
                    "current_owner".into(),
                    "0xc33f8610941be56fb0d84e25894c0d928cc97dde".into(),
                ),
                Matcher::UrlEncoded("page".into(), "1".into()),
            ]))
            .with_body(
                json!({"ethscriptions": [
                    {"transaction_hash": hash(0xabc).to_uppercase().replace("0X", "0x")},
                    {"transaction_hash": hash(99)}
                ]})
                .to_string(),
            )
            .expect(1)
            .create_async()
            .await;

        let verified = verifier(format!("{}/filtered", server.url()), 100)
            .verify(&ids)
            .await
            .unwrap();
        assert_eq!(verified.into_ids(), vec![hash(0xabc)]);
    }

    #[tokio::test]
    async fn test_full_pages_continue_within_chunk() {
        let mut server = Server::new_async().await;
        let ids: Vec<String> = (1..=5).map(hash).collect();
        let page = |n: &str| {
            Matcher::AllOf(vec![
                Matcher::UrlEncoded("transaction_hash".into(), serde_json::to_string(&ids).unwrap()),
                Matcher::UrlEncoded("page".into(), n.into()),
            ])
        };

        let first = server
            .mock("GET", "/filtered")
            .match_query(page("1"))
            .with_body(json!({"ethscriptions": [{"transaction_hash": hash(1)}, {"transaction_hash": hash(2)}]}).to_string())
            .expect(1)
            .create_async()
            .await;
        let second = server
            .mock("GET", "/filtered")
            .match_query(page("2"))
            .with_body(json!({"ethscriptions": [{"transaction_hash": hash(4)}]}).to_string())
            .expect(1)
            .create_async()
            .await;

        let report = verifier(format!("{}/filtered", server.url()), 2)
            .verify_with_report(&ids)
            .await
            .unwrap();

        assert_eq!(report.verified.into_ids(), vec![hash(1), hash(2), hash(4)]);
        first.assert_async().await;
        second.assert_async().await;
    }

    #[tokio::test]
    async fn test_index_ignoring_page_stops_after_repeat() {
        let mut server = Server::new_async().await;
        let ids: Vec<String> = (1..=5).map(hash).collect();

        // Every page request gets the same full first page back.
        let mock = server
            .mock("GET", "/filtered")
            .match_query(Matcher::UrlEncoded(
                "transaction_hash".into(),
                serde_json::to_string(&ids).unwrap(),
            ))
            .with_body(json!({"ethscriptions": [{"transaction_hash": hash(1)}, {"transaction_hash": hash(2)}]}).to_string())
            .expect(2)
            .create_async()
            .await;

        let report = verifier(format!("{}/filtered", server.url()), 2)
            .verify_with_report(&ids)
            .await
            .unwrap();

        assert_eq!(report.verified.into_ids(), vec![hash(1), hash(2)]);
        assert!(report.failed_chunks.is_empty());
        mock.assert_async().await;
    }
}
