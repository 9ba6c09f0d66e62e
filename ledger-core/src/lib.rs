//! XRPL Ledger Core
//!
//! Ledger primitives for the payment flow engine.
//!
//! # Architecture
//!
//! - **Exact amounts**: drops as `i64`, issued currency as `Decimal`
//! - **Keyed entries**: account roots, trust lines, offers and book
//!   directories under SHA-256 keys
//! - **Views**: four operations (read, insert, update, erase) behind a trait
//! - **Sandboxes**: copy-on-write views that merge into their parent by
//!   replaying an ordered write log
//!
//! # Invariants
//!
//! - Value conservation: every credit has a matching debit
//! - Deterministic replay: same writes in the same order give the same state
//! - Isolation: nothing reaches a parent view until a sandbox is applied

#![forbid(unsafe_code)]
#![warn(
    missing_docs,
    rust_2018_idioms,
    missing_debug_implementations,
    clippy::all
)]

pub mod amount;
pub mod config;
pub mod entries;
pub mod error;
pub mod keylet;
pub mod ops;
pub mod sandbox;
pub mod types;
pub mod view;

// Re-exports
pub use amount::{Amount, IouAmount, Rounding, XrpAmount, IOU_SCALE};
pub use config::{Config, Fees};
pub use entries::{AccountRoot, BookDirectory, BookOffer, LedgerEntry, Offer, TrustLine};
pub use error::{Error, Result};
pub use keylet::LedgerKey;
pub use sandbox::{Sandbox, WriteSet};
pub use types::{AccountId, Book, Currency, Issue, TxContext};
pub use view::{ApplyView, ApplyViewExt, MemoryLedger, ReadView, ReadViewExt};
