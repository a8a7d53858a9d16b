//! Blockchain integration subsystem.
//!
//! # Data Flow
//! ```text
//! Environment Variables (private key) + ChainConfig
//!     → client.rs (RPC reads with timeouts and failover)
//!     → wallet.rs (key loading, message signing)
//!     → contract.rs (escrow market ABI)
//!     → transaction.rs (broadcast, confirm)
//! ```
//!
//! # Security Constraints
//! - Private keys ONLY from environment variables
//! - Never log private keys or sensitive data
//! - All RPC reads have configurable timeouts

pub mod client;
pub mod contract;
pub mod transaction;
pub mod types;
pub mod wallet;

pub use client::BlockchainClient;
pub use transaction::TxSender;
pub use types::{BlockchainError, BlockchainResult, ChainConfig, ChainId, ConfirmationStatus};
pub use wallet::Wallet;
