//! Strands and strand execution
//!
//! # Algorithm
//!
//! 1. Reverse pass from the last step, asking each step for what the step
//!    after it needs
//! 2. A step that delivers less than asked is the *limiting step*: the
//!    sandbox is discarded and the step re-run for what it can deliver,
//!    then the reverse pass continues
//! 3. If the first step needs more than `max_in`, the sandbox is discarded
//!    and the first step runs forward with `max_in` instead
//! 4. Steps after the last limiting step run forward from its output and
//!    must consume exactly what they are handed

use crate::{
    quality::Quality,
    step::{Exchange, OffersToRemove, Step, StepContext},
    types::Ter,
    Error, Result,
};
use ledger_core::{Amount, Issue, LedgerKey, ReadView, Sandbox, WriteSet};
use std::collections::BTreeSet;

/// Chain of steps converting the source issue into the delivered issue
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Strand {
    steps: Vec<Step>,
}

/// Limits applied to one strand execution
#[derive(Debug, Clone, Copy, Default)]
pub struct StrandLimits {
    /// Offers a book step may cross per execution
    pub max_offers: usize,
    /// Per-offer quality limit for book steps
    pub quality_limit: Option<Quality>,
}

/// Outcome of one strand execution
#[derive(Debug)]
pub struct StrandResult {
    /// `Success`, or why the strand could not run
    pub ter: Ter,
    /// Consumed from the source
    pub input: Amount,
    /// Delivered to the destination
    pub output: Amount,
    /// Ledger changes, empty on failure
    pub writes: WriteSet,
    /// Offers found unfunded, kept whether or not the strand is merged
    pub unfunded_offers: BTreeSet<LedgerKey>,
    /// Offers fully consumed by `writes`; only meaningful if they are merged
    pub consumed_offers: BTreeSet<LedgerKey>,
    /// Some step ran out of liquidity
    pub exhausted: bool,
}

impl StrandResult {
    /// Did the strand run
    pub fn is_success(&self) -> bool {
        self.ter.is_success()
    }
}

struct Run {
    input: Amount,
    output: Amount,
    writes: WriteSet,
    exhausted: bool,
}

impl Strand {
    /// Build a strand; adjacent steps must agree on their issues
    pub fn new(steps: Vec<Step>) -> Result<Self> {
        if steps.is_empty() {
            return Err(Error::Strand("empty strand".to_string()));
        }
        for pair in steps.windows(2) {
            if pair[0].output_issue() != pair[1].input_issue() {
                return Err(Error::Strand(format!(
                    "{} step feeds a {} step",
                    pair[0].output_issue(),
                    pair[1].input_issue()
                )));
            }
        }
        Ok(Self { steps })
    }

    /// Steps in execution order
    pub fn steps(&self) -> &[Step] {
        &self.steps
    }

    /// Number of steps
    pub fn len(&self) -> usize {
        self.steps.len()
    }

    /// Always false; strands are never empty
    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Issue taken from the source
    pub fn input_issue(&self) -> Issue {
        self.steps[0].input_issue()
    }

    /// Issue delivered to the destination
    pub fn output_issue(&self) -> Issue {
        self.steps[self.steps.len() - 1].output_issue()
    }

    /// Number of order book steps
    pub fn book_steps(&self) -> usize {
        self.steps.iter().filter(|step| step.is_book()).count()
    }

    /// Best rate the strand could achieve right now. `None` when any step
    /// has nothing to price.
    pub fn quality_upper_bound(&self, view: &dyn ReadView) -> Result<Option<Quality>> {
        let mut composed = Quality::ONE;
        for step in &self.steps {
            match step.quality_upper_bound(view)? {
                Some(quality) => match composed.compose(&quality) {
                    Some(next) => composed = next,
                    None => return Ok(None),
                },
                None => return Ok(None),
            }
        }
        Ok(Some(composed))
    }

    /// Execute against a fresh sandbox over `view`, delivering at most
    /// `out_req` and spending at most `max_in`.
    ///
    /// Step failures are reported through [`StrandResult::ter`]; only
    /// broken ledger invariants come back as `Err`.
    pub fn execute(
        &self,
        view: &dyn ReadView,
        out_req: &Amount,
        max_in: Option<&Amount>,
        limits: StrandLimits,
    ) -> Result<StrandResult> {
        let mut offers = OffersToRemove::default();
        match self.run(view, out_req, max_in, limits, &mut offers) {
            Ok(run) => {
                let (unfunded_offers, consumed_offers) = offers.into_parts();
                Ok(StrandResult {
                    ter: Ter::Success,
                    input: run.input,
                    output: run.output,
                    writes: run.writes,
                    unfunded_offers,
                    consumed_offers,
                    exhausted: run.exhausted,
                })
            }
            Err(e) if e.is_fatal() => Err(e),
            Err(e) => {
                tracing::debug!(error = %e, "Strand failed");
                Ok(StrandResult {
                    ter: e.ter(),
                    input: Amount::zero(self.input_issue()),
                    output: Amount::zero(self.output_issue()),
                    writes: WriteSet::default(),
                    unfunded_offers: offers.into_parts().0,
                    consumed_offers: BTreeSet::new(),
                    exhausted: true,
                })
            }
        }
    }

    fn run(
        &self,
        view: &dyn ReadView,
        out_req: &Amount,
        max_in: Option<&Amount>,
        limits: StrandLimits,
        offers: &mut OffersToRemove,
    ) -> Result<Run> {
        let last = self.steps.len() - 1;
        let mut ctx = StepContext {
            max_offers: limits.max_offers,
            quality_limit: limits.quality_limit,
            offers,
        };
        let mut sandbox = Sandbox::new(view);
        let mut results: Vec<Option<Exchange>> = vec![None; self.steps.len()];
        let mut limiting = None;
        let mut exhausted = false;
        let mut requested = *out_req;

        for (i, step) in self.steps.iter().enumerate().rev() {
            let mut r = step.rev(&mut sandbox, &requested, &mut ctx)?;
            exhausted |= r.exhausted;
            if r.output.is_zero() {
                return Err(Error::Step(Ter::PathDry));
            }

            if r.output < requested {
                sandbox = Sandbox::new(view);
                ctx.offers.reset_consumed();
                let deliverable = r.output;
                r = step.rev(&mut sandbox, &deliverable, &mut ctx)?;
                exhausted |= r.exhausted;
                if r.output != deliverable {
                    tracing::warn!(step = i, "Limiting step did not reproduce its output");
                    return Err(Error::Step(Ter::Internal));
                }
                limiting = Some(i);
            }

            if let Some(max_in) = max_in.filter(|max_in| i == 0 && r.input > **max_in) {
                sandbox = Sandbox::new(view);
                ctx.offers.reset_consumed();
                r = step.fwd(&mut sandbox, max_in, &mut ctx)?;
                exhausted |= r.exhausted;
                if r.output.is_zero() {
                    return Err(Error::Step(Ter::PathDry));
                }
                if r.input != *max_in {
                    tracing::warn!("First step did not consume the input budget");
                    return Err(Error::Step(Ter::Internal));
                }
                limiting = Some(0);
            }

            requested = r.input;
            results[i] = Some(r);
        }

        if let Some(limit) = limiting {
            let mut handed = results[limit]
                .map(|r| r.output)
                .ok_or_else(|| Error::Strand("limiting step has no result".to_string()))?;
            for (j, step) in self.steps.iter().enumerate().skip(limit + 1) {
                let r = step.fwd(&mut sandbox, &handed, &mut ctx)?;
                exhausted |= r.exhausted;
                if r.input != handed {
                    tracing::warn!(step = j, "Forward step did not consume its input");
                    return Err(Error::Step(Ter::Internal));
                }
                if r.output.is_zero() {
                    return Err(Error::Step(Ter::PathDry));
                }
                handed = r.output;
                results[j] = Some(r);
            }
        }

        let (first, final_step) = match (results[0], results[last]) {
            (Some(first), Some(final_step)) => (first, final_step),
            _ => return Err(Error::Strand("strand did not run every step".to_string())),
        };

        if final_step.output > *out_req {
            tracing::warn!(
                output = %final_step.output,
                requested = %out_req,
                "Strand over-delivered"
            );
            return Err(Error::Step(Ter::Internal));
        }
        if let Some(max_in) = max_in {
            if first.input > *max_in {
                tracing::warn!(input = %first.input, max_in = %max_in, "Strand overspent");
                return Err(Error::Step(Ter::Internal));
            }
        }

        Ok(Run {
            input: first.input,
            output: final_step.output,
            writes: sandbox.into_writes(),
            exhausted,
        })
    }
}
