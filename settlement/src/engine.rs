//! Settlement engine
//!
//! Ties the calculations to a caller's ledger: payments and offer crossings
//! are calculated against a read-only view, then applied in one step when
//! they succeed. Flagged offers are removed after the changes land.

use crate::{
    config::Config,
    flow_cross::{flow_cross, FlowCrossOutput},
    metrics::Metrics,
    paths::PathCompiler,
    ripple_calc::{ripple_calculate, PaymentRequest, RippleCalcOutput},
    types::Ter,
    Result,
};
use ledger_core::{
    ops, AccountId, Amount, ApplyView, LedgerKey, ReadView, Rounding, TxContext,
};

/// Applied payment
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaymentOutcome {
    /// Result code
    pub ter: Ter,
    /// Spent by the source
    pub actual_in: Amount,
    /// Delivered to the destination
    pub actual_out: Amount,
    /// Offers deleted after the payment
    pub offers_removed: usize,
    /// Rounds the flow loop ran
    pub rounds: usize,
}

/// Applied offer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OfferOutcome {
    /// Result code of the crossing
    pub ter: Ter,
    /// Paid by the taker while crossing
    pub amount_paid: Amount,
    /// Received by the taker while crossing
    pub amount_received: Amount,
    /// Offers deleted after the crossing
    pub offers_removed: usize,
    /// Remainder placed on the books, if any
    pub placed: Option<LedgerKey>,
}

/// Settlement engine
#[derive(Debug)]
pub struct SettlementEngine {
    /// Configuration
    config: Config,

    /// Metrics, when enabled
    metrics: Option<Metrics>,

    /// Path compiler
    compiler: PathCompiler,
}

impl SettlementEngine {
    /// Create new settlement engine
    pub fn new(config: Config) -> Result<Self> {
        config.flow.validate()?;
        let metrics = if config.metrics.enabled {
            Some(Metrics::new()?)
        } else {
            None
        };

        tracing::info!(
            service = %config.service_name,
            version = %config.service_version,
            max_rounds = config.flow.max_rounds,
            max_offers_per_step = config.flow.max_offers_per_step,
            "Settlement engine ready"
        );

        Ok(Self {
            config,
            metrics,
            compiler: PathCompiler,
        })
    }

    /// Configuration
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Metrics, when enabled
    pub fn metrics(&self) -> Option<&Metrics> {
        self.metrics.as_ref()
    }

    /// Calculate a payment without touching `view`
    pub fn ripple_calculate<'a>(
        &self,
        view: &'a dyn ReadView,
        request: &PaymentRequest,
        tx: &TxContext,
    ) -> Result<RippleCalcOutput<'a>> {
        let output = ripple_calculate(view, request, &self.compiler, &self.config.flow, tx)?;
        if let Some(metrics) = &self.metrics {
            metrics.record_payment(output.ter, output.rounds, output.offers_to_remove.len());
        }
        Ok(output)
    }

    /// Calculate an offer crossing without touching `view`
    pub fn flow_cross<'a>(
        &self,
        view: &'a dyn ReadView,
        taker: AccountId,
        taker_gets: &Amount,
        taker_pays: &Amount,
        tx: &TxContext,
    ) -> Result<FlowCrossOutput<'a>> {
        let output = flow_cross(view, taker, taker_gets, taker_pays, &self.config.flow, tx)?;
        if let Some(metrics) = &self.metrics {
            metrics.record_crossing(output.ter, output.rounds, output.offers_to_remove.len());
        }
        Ok(output)
    }

    /// Calculate `request` and, if it succeeds, apply it to `ledger`
    pub fn apply_payment<L: ApplyView>(
        &self,
        ledger: &mut L,
        request: &PaymentRequest,
        tx: &TxContext,
    ) -> Result<PaymentOutcome> {
        let output = self.ripple_calculate(&*ledger, request, tx)?;
        let RippleCalcOutput {
            actual_in,
            actual_out,
            offers_to_remove,
            sandbox,
            ter,
            rounds,
        } = output;
        let writes = sandbox.into_writes();

        let mut offers_removed = 0;
        if ter.is_success() {
            writes.apply_to(ledger)?;
            offers_removed = ops::remove_offers(ledger, &offers_to_remove)?;
        }

        tracing::info!(
            src = %request.src,
            dst = %request.dst,
            %ter,
            offers_removed,
            "Payment applied"
        );

        Ok(PaymentOutcome {
            ter,
            actual_in,
            actual_out,
            offers_removed,
            rounds,
        })
    }

    /// Cross `taker`'s offer against the books and place whatever is left
    /// at the offer's original rate
    pub fn apply_offer_crossing<L: ApplyView>(
        &self,
        ledger: &mut L,
        taker: AccountId,
        taker_gets: &Amount,
        taker_pays: &Amount,
        tx: &TxContext,
    ) -> Result<OfferOutcome> {
        let output = self.flow_cross(&*ledger, taker, taker_gets, taker_pays, tx)?;
        let FlowCrossOutput {
            amount_received,
            amount_paid,
            offers_to_remove,
            sandbox,
            ter,
            ..
        } = output;
        let writes = sandbox.into_writes();

        let mut offers_removed = 0;
        if ter.is_success() {
            writes.apply_to(ledger)?;
            offers_removed = ops::remove_offers(ledger, &offers_to_remove)?;
        }

        let mut placed = None;
        if matches!(ter, Ter::Success | Ter::PathDry) {
            let gets_left = taker_gets.checked_sub(&amount_paid)?;
            if gets_left.signum() > 0 && amount_received < *taker_pays {
                let pays_left =
                    gets_left.mul_ratio(taker_pays, taker_gets, taker_pays.issue(), Rounding::Up)?;
                if pays_left.signum() > 0 {
                    placed = Some(ops::create_offer(ledger, taker, pays_left, gets_left)?);
                }
            }
        }

        tracing::info!(
            taker = %taker,
            %ter,
            paid = %amount_paid,
            received = %amount_received,
            offers_removed,
            placed = placed.is_some(),
            "Offer applied"
        );

        Ok(OfferOutcome {
            ter,
            amount_paid,
            amount_received,
            offers_removed,
            placed,
        })
    }
}
