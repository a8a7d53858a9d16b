//! Client for the "items by owner" index.
//!
//! # Responsibilities
//! - Page through an owner's items with continuation tokens
//! - Keep only items the index reports as escrowed
//!
//! # Design Decisions
//! - Pages are fetched sequentially; a page is requested only after the
//!   previous one resolved, so tokens are always used in order
//! - All-or-nothing: any page failure discards the whole listing, so a
//!   withdrawal is never proposed for a silently truncated subset

use alloy::primitives::Address;
use serde::Deserialize;

use crate::config::OwnerIndexConfig;
use crate::escrow::types::{normalize_item_id, EscrowCandidate, EscrowState, IndexError};
use crate::observability::metrics;

/// One page of the owner index.
#[derive(Debug, Clone, Deserialize)]
pub struct OwnerIndexPage {
    #[serde(default)]
    pub continuation: Option<String>,
    /// Number of items on this page.
    #[serde(default)]
    pub total: usize,
    #[serde(default)]
    pub items: Option<Vec<OwnerIndexItem>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct OwnerIndexItem {
    /// `CHAIN:hash`
    pub id: String,
    #[serde(default)]
    pub extension: Option<ItemExtension>,
    #[serde(default)]
    pub meta: Option<ItemMeta>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ItemExtension {
    #[serde(rename = "escrowState", default)]
    pub escrow_state: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ItemMeta {
    #[serde(rename = "rawContent", default)]
    pub raw_content: Option<String>,
}

/// Paginated owner-index client.
#[derive(Debug, Clone)]
pub struct OwnerIndexClient {
    http: reqwest::Client,
    config: OwnerIndexConfig,
}

impl OwnerIndexClient {
    pub fn new(http: reqwest::Client, config: OwnerIndexConfig) -> Self {
        Self { http, config }
    }

    /// List the owner's escrowed items.
    ///
    /// Returns `None` when any page fails; never a partial listing.
    pub async fn list_escrowed(&self, owner: Address) -> Option<Vec<EscrowCandidate>> {
        match self.fetch_all(owner).await {
            Ok(items) => {
                let candidates = filter_escrowed(items);
                tracing::info!(owner = %owner, candidates = candidates.len(), "Owner index listing complete");
                Some(candidates)
            }
            Err(e) => {
                tracing::warn!(owner = %owner, error = %e, "Owner index listing failed, proposing nothing");
                None
            }
        }
    }

    /// Fetch every page for `owner`.
    pub async fn fetch_all(&self, owner: Address) -> Result<Vec<OwnerIndexItem>, IndexError> {
        let owner_param = format!(
            "{}:{}",
            self.config.owner_prefix,
            owner.to_string().to_ascii_lowercase()
        );

        let mut items = Vec::new();
        let mut page = self.fetch_page(&owner_param, None).await?;
        let mut pages = 1usize;
        let mut followed: Option<String> = None;

        loop {
            items.extend(page.items.take().unwrap_or_default());

            let token = match page.continuation.take() {
                Some(token) if page.total == self.config.page_size => token,
                _ => break,
            };

            // Only a token that would actually be followed can loop.
            if followed.as_deref() == Some(token.as_str()) {
                return Err(IndexError::Malformed(format!(
                    "continuation token '{}' repeated",
                    token
                )));
            }

            page = self.fetch_page(&owner_param, Some(&token)).await?;
            pages += 1;
            followed = Some(token);
        }

        tracing::debug!(pages, items = items.len(), "Owner index pages fetched");
        Ok(items)
    }

    async fn fetch_page(
        &self,
        owner_param: &str,
        continuation: Option<&str>,
    ) -> Result<OwnerIndexPage, IndexError> {
        let mut request = self.http.get(&self.config.url).query(&[("owner", owner_param)]);
        if let Some(token) = continuation {
            request = request.query(&[("continuation", token)]);
        }

        let page = request
            .send()
            .await?
            .error_for_status()?
            .json::<OwnerIndexPage>()
            .await?;

        metrics::record_owner_index_page();
        tracing::debug!(
            total = page.total,
            has_continuation = page.continuation.is_some(),
            "Owner index page received"
        );
        Ok(page)
    }
}

/// Keep escrowed items, turning `CHAIN:hash` ids into normalized hashes.
pub fn filter_escrowed(items: Vec<OwnerIndexItem>) -> Vec<EscrowCandidate> {
    items
        .into_iter()
        .filter_map(|item| {
            let state = EscrowState::from_index(
                item.extension.as_ref().and_then(|e| e.escrow_state.as_deref()),
            );
            if state == EscrowState::Empty {
                return None;
            }

            let hash = item.id.split(':').nth(1)?;
            match normalize_item_id(hash) {
                Ok(item_id) => Some(EscrowCandidate {
                    item_id,
                    owner_index_state: state,
                    raw_content: item.meta.and_then(|m| m.raw_content),
                }),
                Err(e) => {
                    tracing::warn!(id = %item.id, error = %e, "Skipping owner index item");
                    None
                }
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::{Matcher, Server};
    use serde_json::json;

    fn hash(n: usize) -> String {
        format!("0x{:064x}", n)
    }

    fn item(n: usize, state: &str) -> serde_json::Value {
        json!({
            "id": format!("ETHEREUM:{}", hash(n)),
            "extension": {"escrowState": state},
            "meta": {"rawContent": format!("data:,{}", n)}
        })
    }

    #[test]
    fn test_filter_escrowed_drops_empty_and_malformed() {
        let items: Vec<OwnerIndexItem> = serde_json::from_value(json!([
            item(1, "ESCROWED"),
            item(2, "EMPTY"),
            {"id": format!("ETHEREUM:{}", hash(3))},
            {"id": "no-colon"},
            {"id": "ETHEREUM:0x1234", "extension": {"escrowState": "ESCROWED"}}
        ]))
        .unwrap();

        let candidates = filter_escrowed(items);
        let ids: Vec<_> = candidates.iter().map(|c| c.item_id.clone()).collect();
        assert_eq!(ids, vec![hash(1), hash(3)]);
        assert_eq!(candidates[0].raw_content.as_deref(), Some("data:,1"));
        assert_eq!(candidates[1].raw_content, None);
    }

    #[tokio::test]
    async fn test_single_short_page() {
        let mut server = Server::new_async().await;
        let owner = Address::repeat_byte(0xab);
        let mock = server
            .mock("GET", "/items/byOwner")
            .match_query(Matcher::UrlEncoded(
                "owner".into(),
                format!("ETHEREUM:{}", owner.to_string().to_ascii_lowercase()),
            ))
            .with_body(json!({"continuation": "next", "total": 2, "items": [item(1, "ESCROWED"), item(2, "EMPTY")]}).to_string())
            .expect(1)
            .create_async()
            .await;

        let client = OwnerIndexClient::new(
            reqwest::Client::new(),
            OwnerIndexConfig {
                url: format!("{}/items/byOwner", server.url()),
                ..OwnerIndexConfig::default()
            },
        );

        let candidates = client.list_escrowed(owner).await.unwrap();
        assert_eq!(candidates.len(), 1);
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_server_error_yields_none() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("GET", "/items/byOwner")
            .match_query(Matcher::Any)
            .with_status(500)
            .create_async()
            .await;

        let client = OwnerIndexClient::new(
            reqwest::Client::new(),
            OwnerIndexConfig {
                url: format!("{}/items/byOwner", server.url()),
                ..OwnerIndexConfig::default()
            },
        );

        assert!(client.list_escrowed(Address::ZERO).await.is_none());
    }
}
