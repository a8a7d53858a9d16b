//! Escrow reconciliation subsystem.
//!
//! # Data Flow
//! ```text
//! owner address + ReconcilePreferences
//!     → owner_index.rs (paginated listing, escrowed-state filter)
//!     → verifier.rs (chunked cross-check against the custodial owner)
//!     → VerifiedEscrowSet
//!     → withdrawal pipeline
//! ```
//!
//! # Design Decisions
//! - The owner index's escrow flag is a hint; only ids the verification
//!   index confirms leave this module
//! - Index failures narrow results (empty / `None`) instead of erroring
//! - Every run owns its data; nothing is cached between runs

pub mod owner_index;
pub mod preferences;
pub mod reconcile;
pub mod types;
pub mod verifier;

pub use owner_index::OwnerIndexClient;
pub use preferences::{PreferenceStore, ReconcilePreferences};
pub use reconcile::Reconciler;
pub use types::{EscrowCandidate, EscrowState, IndexError, VerifiedEscrowSet};
pub use verifier::{EscrowVerifier, VerificationReport};
