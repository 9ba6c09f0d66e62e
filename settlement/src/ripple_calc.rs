//! Payment calculation
//!
//! Wraps the caller's view in a root sandbox, compiles the payment's paths
//! into strands and runs the flow loop over them. Nothing reaches the
//! caller's view; the root sandbox comes back for the caller to apply.

use crate::{
    config::FlowConfig,
    flow::flow,
    paths::{Path, StrandBuilder},
    quality::Quality,
    types::Ter,
    Result,
};
use ledger_core::{AccountId, Amount, LedgerKey, ReadView, Sandbox, TxContext};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// A cross-currency payment
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentRequest {
    /// Paying account
    pub src: AccountId,
    /// Paid account
    pub dst: AccountId,
    /// Amount to deliver
    pub dst_amount: Amount,
    /// Most the source will spend, in the issue it pays with
    pub src_amount_max: Option<Amount>,
    /// Explicit paths, in preference order
    pub paths: Vec<Path>,
    /// Also try the direct route between the two issues
    pub add_default_path: bool,
    /// Accept delivering less than `dst_amount`
    pub partial_payment: bool,
    /// Refuse any exchange worse than `src_amount_max / dst_amount`
    pub limit_quality: bool,
}

impl PaymentRequest {
    /// Deliver `dst_amount` from `src` to `dst` over the default path
    pub fn new(src: AccountId, dst: AccountId, dst_amount: Amount) -> Self {
        Self {
            src,
            dst,
            dst_amount,
            src_amount_max: None,
            paths: Vec::new(),
            add_default_path: true,
            partial_payment: false,
            limit_quality: false,
        }
    }

    /// Worst acceptable rate, when requested and computable
    pub fn quality_floor(&self) -> Option<Quality> {
        if !self.limit_quality {
            return None;
        }
        self.src_amount_max
            .as_ref()
            .and_then(|max| Quality::from_amounts(max, &self.dst_amount))
    }
}

/// Result of [`ripple_calculate`]
#[derive(Debug)]
pub struct RippleCalcOutput<'a> {
    /// Spent by the source
    pub actual_in: Amount,
    /// Delivered to the destination
    pub actual_out: Amount,
    /// Offers to delete once the payment is applied
    pub offers_to_remove: BTreeSet<LedgerKey>,
    /// Root sandbox holding every change
    pub sandbox: Sandbox<'a>,
    /// Result code
    pub ter: Ter,
    /// Rounds the flow loop ran
    pub rounds: usize,
}

/// Calculate `request` against `view`
pub fn ripple_calculate<'a>(
    view: &'a dyn ReadView,
    request: &PaymentRequest,
    builder: &dyn StrandBuilder,
    config: &FlowConfig,
    tx: &TxContext,
) -> Result<RippleCalcOutput<'a>> {
    let mut sandbox = Sandbox::new(view);
    let (strands, built) = builder.to_strands(view, request);

    if strands.is_empty() {
        let ter = if built.is_success() { Ter::PathDry } else { built };
        tracing::info!(
            ledger_seq = tx.ledger_seq,
            src = %request.src,
            dst = %request.dst,
            %ter,
            "Payment has no usable strand"
        );
        let in_issue = request
            .src_amount_max
            .map_or_else(|| request.dst_amount.issue(), |max| max.issue());
        return Ok(RippleCalcOutput {
            actual_in: Amount::zero(in_issue),
            actual_out: Amount::zero(request.dst_amount.issue()),
            offers_to_remove: BTreeSet::new(),
            sandbox,
            ter,
            rounds: 0,
        });
    }

    let result = flow(
        view,
        &strands,
        &request.dst_amount,
        request.partial_payment,
        request.quality_floor(),
        request.src_amount_max.as_ref(),
        config,
    )?;

    if matches!(result.ter, Ter::Success | Ter::PathPartial) {
        sandbox.apply(result.writes)?;
    }

    tracing::info!(
        ledger_seq = tx.ledger_seq,
        src = %request.src,
        dst = %request.dst,
        strands = strands.len(),
        rounds = result.rounds,
        actual_in = %result.actual_in,
        actual_out = %result.actual_out,
        ter = %result.ter,
        "Payment calculated"
    );

    Ok(RippleCalcOutput {
        actual_in: result.actual_in,
        actual_out: result.actual_out,
        offers_to_remove: result.offers_to_remove,
        sandbox,
        ter: result.ter,
        rounds: result.rounds,
    })
}
