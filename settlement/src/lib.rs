//! Settlement Engine
//!
//! Routes cross-currency payments and offer crossings through trust lines
//! and order books.
//!
//! # Architecture
//!
//! A payment is compiled into *strands*, chains of steps that each move or
//! convert value between two issues. The flow loop executes every strand
//! against a scratch sandbox each round, keeps only the one with the best
//! realized rate and repeats until the payment is delivered or liquidity
//! runs out.
//!
//! 1. **Paths**: [`paths::PathCompiler`] turns requested paths into strands
//! 2. **Strands**: [`strand::Strand`] runs its steps in reverse, then
//!    forward from the limiting step
//! 3. **Flow**: [`flow::flow`] picks the best strand per round
//! 4. **Entry points**: [`ripple_calc::ripple_calculate`] for payments,
//!    [`flow_cross::flow_cross`] for offer crossing
//!
//! # Example
//!
//! ```no_run
//! use ledger_core::{ops, AccountId, Amount, Currency, Issue, MemoryLedger, TxContext};
//! use rust_decimal::Decimal;
//! use settlement::{Config, PaymentRequest, SettlementEngine};
//!
//! fn main() -> settlement::Result<()> {
//!     let mut ledger = MemoryLedger::default();
//!     let gateway = AccountId::from_seed("gateway");
//!     let bob = AccountId::from_seed("bob");
//!     let usd = Issue::new(Currency::from_code("USD").ok_or("bad code")?, gateway);
//!     ops::create_account(&mut ledger, gateway, 100_000_000)?;
//!     ops::create_account(&mut ledger, bob, 100_000_000)?;
//!     ops::set_trust_line(&mut ledger, bob, gateway, usd.currency, Decimal::from(1000))?;
//!
//!     let engine = SettlementEngine::new(Config::default())?;
//!     let request = PaymentRequest::new(gateway, bob, Amount::iou(Decimal::from(100), usd));
//!     let outcome = engine.apply_payment(&mut ledger, &request, &TxContext::default())?;
//!     println!("{} delivered {}", outcome.ter, outcome.actual_out);
//!
//!     Ok(())
//! }
//! ```

#![forbid(unsafe_code)]
#![warn(
    missing_docs,
    rust_2018_idioms,
    missing_debug_implementations,
    clippy::all
)]

pub mod config;
pub mod engine;
pub mod error;
pub mod flow;
pub mod flow_cross;
pub mod metrics;
pub mod paths;
pub mod quality;
pub mod ripple_calc;
pub mod step;
pub mod strand;
pub mod types;

// Re-exports
pub use config::{Config, FlowConfig, MetricsConfig};
pub use engine::{OfferOutcome, PaymentOutcome, SettlementEngine};
pub use error::{Error, Result};
pub use flow::{flow, FlowResult, RoundOutcome};
pub use flow_cross::{flow_cross, FlowCrossOutput};
pub use metrics::Metrics;
pub use paths::{Path, PathCompiler, PathElement, StrandBuilder};
pub use quality::Quality;
pub use ripple_calc::{ripple_calculate, PaymentRequest, RippleCalcOutput};
pub use step::{BookStep, DirectStep, EndpointSide, Step, XrpEndpointStep};
pub use strand::{Strand, StrandLimits, StrandResult};
pub use types::Ter;
