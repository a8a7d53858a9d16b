//! Shared fixtures for integration tests.
#![allow(dead_code)]

use ethscribe::config::{OwnerIndexConfig, VerificationIndexConfig};
use serde_json::{json, Value};

/// Deterministic, distinct transaction hash for `n`.
pub fn hash(n: u64) -> String {
    format!("0x{:064x}", n)
}

pub fn hashes(range: std::ops::Range<u64>) -> Vec<String> {
    range.map(hash).collect()
}

/// One owner-index page. `escrowed` items carry no `escrowState`,
/// `empty` items carry the `EMPTY` sentinel.
pub fn owner_page(escrowed: &[String], empty: &[String], continuation: Option<&str>) -> String {
    let mut items: Vec<Value> = escrowed
        .iter()
        .map(|h| json!({ "id": format!("ETHEREUM:{}", h), "meta": { "rawContent": "data:,hi" } }))
        .collect();
    items.extend(empty.iter().map(|h| {
        json!({ "id": format!("ETHEREUM:{}", h), "extension": { "escrowState": "EMPTY" } })
    }));

    json!({
        "continuation": continuation,
        "total": items.len(),
        "items": items,
    })
    .to_string()
}

/// One verification-index page listing `hashes` (upper-cased, as the index may).
pub fn verification_page(hashes: &[String]) -> String {
    let entries: Vec<Value> = hashes
        .iter()
        .map(|h| json!({ "transaction_hash": format!("0x{}", h[2..].to_ascii_uppercase()) }))
        .collect();
    json!({ "ethscriptions": entries }).to_string()
}

pub fn owner_index_config(base_url: &str) -> OwnerIndexConfig {
    OwnerIndexConfig {
        url: format!("{}/v0.1/items/byOwner", base_url),
        ..OwnerIndexConfig::default()
    }
}

pub fn verification_config(base_url: &str) -> VerificationIndexConfig {
    VerificationIndexConfig {
        url: format!("{}/api/ethscriptions/filtered", base_url),
        ..VerificationIndexConfig::default()
    }
}
