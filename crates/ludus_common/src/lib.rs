//! Ludus Common - Shared types and contracts for the Ludus rewards platform.
//!
//! Domain types (catalog, learner, progress, wallet, profile), the wire
//! contracts the daemon serves, and the notification payloads it emits.

pub mod catalog;
pub mod error;
pub mod events;
pub mod learner;
pub mod profile;
pub mod progress;
pub mod rpc;
pub mod wallet;

pub use catalog::{AgeBand, BadgeMeta, GameCatalog, GameDefinition};
pub use error::{DenialReason, LudusError};
pub use events::EventNotifier;
pub use learner::{AgeTier, Learner, SubscriptionPlan};
pub use profile::AggregateProfile;
pub use progress::{CoinGrant, GameProgress, PlayState};
pub use wallet::{Direction, Transaction, Wallet};

/// Crate version, embedded at build time.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
