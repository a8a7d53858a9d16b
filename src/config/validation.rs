//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate endpoint URLs and contract/owner addresses
//! - Validate value ranges (page sizes > 0, chunk size within the index limit)
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: AppConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::fmt;

use alloy::primitives::Address;

use crate::config::schema::AppConfig;

/// Largest number of transaction hashes the verification index accepts per query.
pub const MAX_VERIFICATION_CHUNK: usize = 100;

/// A single semantic problem with the configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    /// Dotted path of the offending field.
    pub field: String,
    /// What is wrong with it.
    pub message: String,
}

impl ValidationError {
    fn new(field: &str, message: impl Into<String>) -> Self {
        Self {
            field: field.to_string(),
            message: message.into(),
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Validate a parsed configuration.
pub fn validate_config(config: &AppConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    check_url(&mut errors, "chain.rpc_url", &config.chain.rpc_url);
    for url in &config.chain.failover_urls {
        check_url(&mut errors, "chain.failover_urls", url);
    }
    if config.chain.chain_id == 0 {
        errors.push(ValidationError::new("chain.chain_id", "must be greater than 0"));
    }
    if config.chain.poll_interval_ms == 0 {
        errors.push(ValidationError::new("chain.poll_interval_ms", "must be greater than 0"));
    }

    check_url(&mut errors, "static_store.base_url", &config.static_store.base_url);

    check_url(&mut errors, "owner_index.url", &config.owner_index.url);
    if config.owner_index.page_size == 0 {
        errors.push(ValidationError::new("owner_index.page_size", "must be greater than 0"));
    }
    if config.owner_index.owner_prefix.is_empty() {
        errors.push(ValidationError::new("owner_index.owner_prefix", "must not be empty"));
    }

    let verification = &config.verification_index;
    check_url(&mut errors, "verification_index.url", &verification.url);
    check_address(&mut errors, "verification_index.custodial_owner", &verification.custodial_owner);
    if verification.chunk_size == 0 || verification.chunk_size > MAX_VERIFICATION_CHUNK {
        errors.push(ValidationError::new(
            "verification_index.chunk_size",
            format!("must be between 1 and {}", MAX_VERIFICATION_CHUNK),
        ));
    }
    if verification.page_size == 0 {
        errors.push(ValidationError::new("verification_index.page_size", "must be greater than 0"));
    }

    check_url(&mut errors, "withdrawal.signer_url", &config.withdrawal.signer_url);
    check_address(&mut errors, "withdrawal.escrow_contract", &config.withdrawal.escrow_contract);

    if config.observability.metrics_enabled
        && config.observability.metrics_address.parse::<std::net::SocketAddr>().is_err()
    {
        errors.push(ValidationError::new(
            "observability.metrics_address",
            "must be a socket address",
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn check_url(errors: &mut Vec<ValidationError>, field: &str, value: &str) {
    if let Err(e) = value.parse::<url::Url>() {
        errors.push(ValidationError::new(field, format!("invalid URL '{}': {}", value, e)));
    }
}

fn check_address(errors: &mut Vec<ValidationError>, field: &str, value: &str) {
    if value.parse::<Address>().is_err() {
        errors.push(ValidationError::new(field, format!("invalid address '{}'", value)));
    }
}
