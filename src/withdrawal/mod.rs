//! Batch withdrawal of escrowed items.
//!
//! # Data Flow
//! ```text
//! verified item ids
//!     → message.rs (canonical ids, deterministic text, expiry)
//!     → signer.rs (wallet signature, signer-service exchange)
//!     → types.rs (confirmation validation, contract call)
//!     → submit.rs (escrow contract submission, confirmation)
//!     → builder.rs (state machine, cancellation, watch channel)
//! ```
//!
//! # Design Decisions
//! - No automatic retry: a failed attempt restarts from a fresh verification
//! - The confirmation's ids are passed to the contract in the order signed

pub mod builder;
pub mod message;
pub mod signer;
pub mod submit;
pub mod types;

pub use builder::{Clock, SystemClock, WithdrawalRequestBuilder};
pub use message::{normalize_item_ids, WithdrawalMessage};
pub use signer::{ConfirmationExchange, HttpSignerService, MessageSigner, SignError};
pub use submit::{ContractSubmitter, WithdrawalSubmitter};
pub use types::{
    ConfirmationSig, WithdrawalConfirmation, WithdrawalError, WithdrawalResult, WithdrawalState,
};
