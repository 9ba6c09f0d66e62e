//! Offer crossing
//!
//! A new offer first crosses the opposite side of the market. The taker
//! pays `taker_gets` into the `gets -> pays` book and wants `taker_pays`
//! back, never at a worse rate than its own offer. Whatever is left is
//! for the caller to place on the books.

use crate::{
    config::FlowConfig, flow::flow, paths::PathCompiler, quality::Quality, types::Ter, Result,
};
use ledger_core::{AccountId, Amount, LedgerKey, ReadView, Sandbox, TxContext};
use std::collections::BTreeSet;

/// Result of [`flow_cross`]
#[derive(Debug)]
pub struct FlowCrossOutput<'a> {
    /// Received by the taker, in the `taker_pays` issue
    pub amount_received: Amount,
    /// Paid by the taker, in the `taker_gets` issue
    pub amount_paid: Amount,
    /// Offers to delete once the crossing is applied
    pub offers_to_remove: BTreeSet<LedgerKey>,
    /// Root sandbox holding every change
    pub sandbox: Sandbox<'a>,
    /// Result code
    pub ter: Ter,
    /// Rounds the flow loop ran
    pub rounds: usize,
}

impl FlowCrossOutput<'_> {
    /// Did any crossing happen
    pub fn crossed(&self) -> bool {
        self.amount_received.signum() > 0
    }
}

/// Cross `taker`'s offer to give `taker_gets` for `taker_pays` against the
/// books in `view`
pub fn flow_cross<'a>(
    view: &'a dyn ReadView,
    taker: AccountId,
    taker_gets: &Amount,
    taker_pays: &Amount,
    config: &FlowConfig,
    tx: &TxContext,
) -> Result<FlowCrossOutput<'a>> {
    let mut sandbox = Sandbox::new(view);
    let (gets, pays) = (taker_gets.issue(), taker_pays.issue());
    let strand = match PathCompiler.crossing_strand(taker, gets, pays) {
        Ok(strand) => strand,
        Err(e) => {
            tracing::debug!(taker = %taker, error = %e, "No crossing strand");
            return Ok(FlowCrossOutput {
                amount_received: Amount::zero(pays),
                amount_paid: Amount::zero(gets),
                offers_to_remove: BTreeSet::new(),
                sandbox,
                ter: Ter::PathDry,
                rounds: 0,
            });
        }
    };

    let floor = Quality::from_amounts(taker_gets, taker_pays);
    let result = flow(
        view,
        std::slice::from_ref(&strand),
        taker_pays,
        true,
        floor,
        Some(taker_gets),
        config,
    )?;

    if matches!(result.ter, Ter::Success | Ter::PathPartial) {
        sandbox.apply(result.writes)?;
    }

    tracing::info!(
        ledger_seq = tx.ledger_seq,
        taker = %taker,
        paid = %result.actual_in,
        received = %result.actual_out,
        rounds = result.rounds,
        ter = %result.ter,
        "Offer crossed"
    );

    Ok(FlowCrossOutput {
        amount_received: result.actual_out,
        amount_paid: result.actual_in,
        offers_to_remove: result.offers_to_remove,
        sandbox,
        ter: result.ter,
        rounds: result.rounds,
    })
}
