//! Ethscription content resolution and escrow withdrawal.
//!
//! # Architecture Overview
//!
//! ```text
//!   tx hash / item ──▶ content::resolver ──▶ content::decoder ──▶ DecodedContent
//!                          │
//!                          ├── blockchain::client (transaction input)
//!                          └── content::store (hosted renditions)
//!
//!   owner address ──▶ escrow::owner_index ──▶ escrow::verifier ──▶ VerifiedEscrowSet
//!                                                                     │
//!                                                                     ▼
//!   wallet ◀── withdrawal::builder ──▶ signer service ──▶ escrow contract (tx hash)
//! ```
//!
//! `config` and `observability` are shared by every subsystem.

// Core subsystems
pub mod content;
pub mod escrow;
pub mod withdrawal;

// Chain access
pub mod blockchain;

// Cross-cutting concerns
pub mod config;
pub mod observability;

pub use config::AppConfig;
pub use content::{decode, ContentKind, ContentResolver, DecodedContent};
pub use escrow::{Reconciler, VerifiedEscrowSet};
pub use withdrawal::{WithdrawalRequestBuilder, WithdrawalState};
