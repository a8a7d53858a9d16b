//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the resolver
//! and the escrow reconciliation pipeline. All types derive Serde traits for
//! deserialization from config files.

use serde::{Deserialize, Serialize};

/// Root configuration.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct AppConfig {
    /// Chain node connection settings.
    pub chain: ChainConfig,

    /// Hosted rendition store.
    pub static_store: StaticStoreConfig,

    /// "Items by owner" index (first, non-authoritative index).
    pub owner_index: OwnerIndexConfig,

    /// Verification index (second, authoritative index).
    pub verification_index: VerificationIndexConfig,

    /// Withdrawal signer service and escrow contract.
    pub withdrawal: WithdrawalConfig,

    /// Persisted user preferences.
    pub preferences: PreferencesConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Chain node configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ChainConfig {
    /// JSON-RPC endpoint URL.
    pub rpc_url: String,

    /// Failover JSON-RPC endpoint URLs.
    pub failover_urls: Vec<String>,

    /// Chain ID (e.g., 1 for Ethereum mainnet, 31337 for local Anvil).
    pub chain_id: u64,

    /// RPC request timeout in seconds.
    pub rpc_timeout_secs: u64,

    /// Number of block confirmations required before a withdrawal counts as confirmed.
    pub confirmation_blocks: u32,

    /// How long to follow a submitted transaction before abandoning polling, in seconds.
    pub confirmation_timeout_secs: u64,

    /// Receipt polling interval in milliseconds.
    pub poll_interval_ms: u64,
}

impl Default for ChainConfig {
    fn default() -> Self {
        Self {
            rpc_url: "http://localhost:8545".to_string(),
            failover_urls: Vec::new(),
            chain_id: 1,
            rpc_timeout_secs: 10,
            confirmation_blocks: 1,
            confirmation_timeout_secs: 600,
            poll_interval_ms: 2000,
        }
    }
}

/// Static store holding hosted renditions.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct StaticStoreConfig {
    /// Base URL; renditions live under `{base_url}/static/images/{sha}`.
    pub base_url: String,
}

impl Default for StaticStoreConfig {
    fn default() -> Self {
        Self {
            base_url: "https://wmaqzjpcegjhuwqctnht.supabase.co/storage/v1/object/public"
                .to_string(),
        }
    }
}

/// Owner index configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct OwnerIndexConfig {
    /// Items-by-owner endpoint.
    pub url: String,

    /// Chain prefix prepended to the owner address (`ETHEREUM:0x...`).
    pub owner_prefix: String,

    /// Page size the index uses; a page of exactly this size may have a successor.
    pub page_size: usize,
}

impl Default for OwnerIndexConfig {
    fn default() -> Self {
        Self {
            url: "https://api.ordex.io/v0.1/items/byOwner".to_string(),
            owner_prefix: "ETHEREUM".to_string(),
            page_size: 50,
        }
    }
}

/// Verification index configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct VerificationIndexConfig {
    /// Filtered ethscriptions endpoint.
    pub url: String,

    /// Custodial owner the escrowed items must currently belong to.
    pub custodial_owner: String,

    /// Maximum transaction hashes per query (external limit: 100).
    pub chunk_size: usize,

    /// Results requested per page.
    pub page_size: usize,
}

impl Default for VerificationIndexConfig {
    fn default() -> Self {
        Self {
            url: "https://api.ethscriptions.com/api/ethscriptions/filtered".to_string(),
            custodial_owner: "0xc33f8610941be56fb0d84e25894c0d928cc97dde".to_string(),
            chunk_size: 100,
            page_size: 100,
        }
    }
}

/// Withdrawal configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct WithdrawalConfig {
    /// Signer service that co-signs withdrawal confirmations.
    pub signer_url: String,

    /// Escrow contract exposing `bulkWithdrawItems`.
    pub escrow_contract: String,
}

impl Default for WithdrawalConfig {
    fn default() -> Self {
        Self {
            signer_url: "https://api-next.ordex.io/signer/s/wc".to_string(),
            escrow_contract: "0xC33F8610941bE56fB0d84E25894C0d928CC97ddE".to_string(),
        }
    }
}

/// Persisted preference location.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct PreferencesConfig {
    /// JSON file holding the dismissal flag. `None` keeps preferences in memory only.
    pub path: Option<String>,
}

impl Default for PreferencesConfig {
    fn default() -> Self {
        Self {
            path: Some("ethscribe-preferences.json".to_string()),
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Log output format.
    pub log_format: LogFormat,

    /// Enable the Prometheus metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: LogFormat::Pretty,
            metrics_enabled: false,
            metrics_address: "127.0.0.1:9090".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_index_limits() {
        let config = AppConfig::default();
        assert_eq!(config.owner_index.page_size, 50);
        assert_eq!(config.verification_index.chunk_size, 100);
        assert_eq!(config.owner_index.owner_prefix, "ETHEREUM");
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let config: AppConfig = toml::from_str(
            r#"
            [chain]
            rpc_url = "http://127.0.0.1:8545"
            chain_id = 31337

            [observability]
            log_format = "json"
            "#,
        )
        .unwrap();

        assert_eq!(config.chain.chain_id, 31337);
        assert_eq!(config.chain.rpc_timeout_secs, 10);
        assert_eq!(config.observability.log_format, LogFormat::Json);
        assert_eq!(config.verification_index.page_size, 100);
    }
}
