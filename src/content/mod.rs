//! Content resolution subsystem.
//!
//! # Data Flow
//! ```text
//! InscribedItem
//!     → resolver.rs (hosted rendition? else chain payload)
//!         → store.rs (static store / chain node reads)
//!     → decoder.rs (data URI → DecodedContent)
//!     → external renderer
//! ```
//!
//! # Design Decisions
//! - Decoding is pure and infallible; failures become unsupported descriptors
//! - Content kind comes from the MIME type only, never from sniffing the body
//! - Network failures are the only errors surfaced by resolution

pub mod decoder;
pub mod resolver;
pub mod store;
pub mod types;

pub use decoder::decode;
pub use resolver::{ChainReader, ContentResolver, InscribedItem, ResolveError};
pub use store::{NodeChainReader, StaticStore};
pub use types::{ContentKind, DecodedContent};
