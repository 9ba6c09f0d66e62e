//! Strand steps
//!
//! A step converts or moves value between two fixed issues. The set of
//! steps is fixed by the protocol, so they form a closed enum dispatched by
//! `match`:
//!
//! - [`DirectStep`]: issued currency across one trust line
//! - [`BookStep`]: crossing offers in one order book
//! - [`XrpEndpointStep`]: native balance at either end of a strand
//!
//! Every step runs in two directions. `rev` is asked for an output and
//! reports the input it needs; `fwd` is handed an input and reports the
//! output it produced. Both mutate only the view they are given.

mod book;
mod direct;
mod xrp_endpoint;

pub use book::BookStep;
pub use direct::DirectStep;
pub use xrp_endpoint::{EndpointSide, XrpEndpointStep};

use crate::{quality::Quality, Error, Result};
use ledger_core::{Amount, ApplyView, Issue, LedgerKey, ReadView};
use std::collections::BTreeSet;

/// What one step execution consumed and produced
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Exchange {
    /// Consumed, in the step's input issue
    pub input: Amount,
    /// Produced, in the step's output issue
    pub output: Amount,
    /// The step has no liquidity left after this execution
    pub exhausted: bool,
}

/// Offers to delete once the payment settles
///
/// Unfunded offers stay flagged for the whole strand execution; consumed
/// offers are only valid for the sandbox that consumed them.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OffersToRemove {
    unfunded: BTreeSet<LedgerKey>,
    consumed: BTreeSet<LedgerKey>,
}

impl OffersToRemove {
    /// Flag an offer whose owner cannot fund it
    pub fn flag_unfunded(&mut self, key: LedgerKey) {
        self.unfunded.insert(key);
    }

    /// Flag an offer that was fully consumed
    pub fn flag_consumed(&mut self, key: LedgerKey) {
        self.consumed.insert(key);
    }

    /// Forget consumed offers after their sandbox was discarded
    pub fn reset_consumed(&mut self) {
        self.consumed.clear();
    }

    /// Every flagged key
    pub fn into_keys(self) -> BTreeSet<LedgerKey> {
        let mut keys = self.unfunded;
        keys.extend(self.consumed);
        keys
    }

    /// Unfunded and consumed keys, in that order
    pub fn into_parts(self) -> (BTreeSet<LedgerKey>, BTreeSet<LedgerKey>) {
        (self.unfunded, self.consumed)
    }

    /// Unfunded keys only
    pub fn unfunded(&self) -> &BTreeSet<LedgerKey> {
        &self.unfunded
    }
}

/// Per-execution limits and bookkeeping handed to every step
#[derive(Debug)]
pub struct StepContext<'s> {
    /// Offers a book step may cross in one execution
    pub max_offers: usize,
    /// Offers worse than this are not crossed
    pub quality_limit: Option<Quality>,
    /// Offers flagged so far
    pub offers: &'s mut OffersToRemove,
}

/// One step of a strand
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Step {
    /// Trust line transfer
    Direct(DirectStep),
    /// Order book crossing
    Book(BookStep),
    /// Native balance endpoint
    XrpEndpoint(XrpEndpointStep),
}

impl Step {
    /// Issue consumed
    pub fn input_issue(&self) -> Issue {
        match self {
            Step::Direct(step) => step.issue,
            Step::Book(step) => step.book.input,
            Step::XrpEndpoint(_) => Issue::xrp(),
        }
    }

    /// Issue produced
    pub fn output_issue(&self) -> Issue {
        match self {
            Step::Direct(step) => step.issue,
            Step::Book(step) => step.book.output,
            Step::XrpEndpoint(_) => Issue::xrp(),
        }
    }

    /// Is this an order book step
    pub fn is_book(&self) -> bool {
        matches!(self, Step::Book(_))
    }

    /// Best rate this step could achieve right now, without consuming
    /// anything. `None` when the step has no liquidity to price.
    pub fn quality_upper_bound(&self, view: &dyn ReadView) -> Result<Option<Quality>> {
        match self {
            Step::Direct(_) | Step::XrpEndpoint(_) => Ok(Some(Quality::ONE)),
            Step::Book(step) => step.quality_upper_bound(view),
        }
    }

    /// Produce up to `output`, reporting the input needed
    pub fn rev(
        &self,
        view: &mut dyn ApplyView,
        output: &Amount,
        ctx: &mut StepContext<'_>,
    ) -> Result<Exchange> {
        ensure_issue(output, self.output_issue())?;
        match self {
            Step::Direct(step) => step.execute(view, output),
            Step::Book(step) => step.rev(view, output, ctx),
            Step::XrpEndpoint(step) => step.execute(view, output),
        }
    }

    /// Consume up to `input`, reporting the output produced
    pub fn fwd(
        &self,
        view: &mut dyn ApplyView,
        input: &Amount,
        ctx: &mut StepContext<'_>,
    ) -> Result<Exchange> {
        ensure_issue(input, self.input_issue())?;
        match self {
            Step::Direct(step) => step.execute(view, input),
            Step::Book(step) => step.fwd(view, input, ctx),
            Step::XrpEndpoint(step) => step.execute(view, input),
        }
    }
}

fn ensure_issue(amount: &Amount, issue: Issue) -> Result<()> {
    if amount.issue() != issue {
        return Err(Error::Strand(format!("{} handed to a {} step", amount, issue)));
    }
    Ok(())
}

impl From<DirectStep> for Step {
    fn from(step: DirectStep) -> Self {
        Step::Direct(step)
    }
}

impl From<BookStep> for Step {
    fn from(step: BookStep) -> Self {
        Step::Book(step)
    }
}

impl From<XrpEndpointStep> for Step {
    fn from(step: XrpEndpointStep) -> Self {
        Step::XrpEndpoint(step)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_offers_to_remove_reset_keeps_unfunded() {
        let mut offers = OffersToRemove::default();
        offers.flag_unfunded(LedgerKey::from_bytes([1; 32]));
        offers.flag_consumed(LedgerKey::from_bytes([2; 32]));
        offers.reset_consumed();
        offers.flag_consumed(LedgerKey::from_bytes([3; 32]));

        let keys: Vec<_> = offers.into_keys().into_iter().collect();
        assert_eq!(
            keys,
            vec![LedgerKey::from_bytes([1; 32]), LedgerKey::from_bytes([3; 32])]
        );
    }

    #[test]
    fn test_step_issues() {
        let step: Step = XrpEndpointStep::new(
            ledger_core::AccountId::from_seed("alice"),
            EndpointSide::Source,
        )
        .into();
        assert_eq!(step.input_issue(), Issue::xrp());
        assert_eq!(step.output_issue(), Issue::xrp());
        assert!(!step.is_book());
    }
}
