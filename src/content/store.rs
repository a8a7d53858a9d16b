//! Network-backed [`ChainReader`]: chain node plus hosted rendition store.

use alloy::primitives::{Bytes, TxHash};
use async_trait::async_trait;

use crate::blockchain::BlockchainClient;
use crate::config::StaticStoreConfig;
use crate::content::resolver::{ChainReader, ResolveError, ResolveResult};

/// HTTP client for hosted renditions.
#[derive(Debug, Clone)]
pub struct StaticStore {
    http: reqwest::Client,
    base_url: String,
}

impl StaticStore {
    pub fn new(http: reqwest::Client, config: &StaticStoreConfig) -> Self {
        Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        }
    }

    /// URL of the rendition for content `sha`.
    pub fn rendition_url(&self, sha: &str) -> String {
        format!("{}/static/images/{}", self.base_url, sha)
    }

    /// Fetch rendition bytes.
    pub async fn fetch(&self, sha: &str) -> Result<Vec<u8>, reqwest::Error> {
        let response = self
            .http
            .get(self.rendition_url(sha))
            .send()
            .await?
            .error_for_status()?;
        Ok(response.bytes().await?.to_vec())
    }
}

/// Reads payloads from the chain node and renditions from the static store.
#[derive(Debug, Clone)]
pub struct NodeChainReader {
    client: BlockchainClient,
    store: StaticStore,
}

impl NodeChainReader {
    pub fn new(client: BlockchainClient, store: StaticStore) -> Self {
        Self { client, store }
    }
}

#[async_trait]
impl ChainReader for NodeChainReader {
    async fn transaction_payload(&self, tx_hash: TxHash) -> ResolveResult<Bytes> {
        Ok(self.client.get_transaction_input(tx_hash).await?)
    }

    async fn hosted_rendition(&self, sha: &str) -> ResolveResult<Vec<u8>> {
        self.store.fetch(sha).await.map_err(|e| {
            tracing::warn!(sha = %sha, error = %e, "Hosted rendition fetch failed");
            ResolveError::StaticStore(e.to_string())
        })
    }
}
