//! Strand execution rounds
//!
//! Every round executes each active strand against a fresh child of the
//! flow sandbox, keeps the one with the best realized quality and merges
//! only that one. Rounds repeat until the requested output is delivered,
//! the input budget is spent, no strand is left or the round cap is hit.

use crate::{
    config::FlowConfig,
    quality::Quality,
    strand::{Strand, StrandLimits, StrandResult},
    types::Ter,
    Result,
};
use ledger_core::{Amount, LedgerKey, ReadView, Sandbox, WriteSet};
use std::collections::BTreeSet;
use tracing::{debug, warn};

/// Winner of one round
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoundOutcome {
    /// Index of the winning strand, in declaration order
    pub strand: usize,
    /// Consumed by the winner
    pub input: Amount,
    /// Delivered by the winner
    pub output: Amount,
    /// Output still owed before this round
    pub remaining_out: Amount,
}

/// Outcome of a flow
#[derive(Debug)]
pub struct FlowResult {
    /// Result code
    pub ter: Ter,
    /// Total consumed from the source
    pub actual_in: Amount,
    /// Total delivered
    pub actual_out: Amount,
    /// Offers fully consumed or found unfunded
    pub offers_to_remove: BTreeSet<LedgerKey>,
    /// Everything the winning strands wrote, in order
    pub writes: WriteSet,
    /// Rounds run
    pub rounds: usize,
    /// One entry per round that merged a strand
    pub trail: Vec<RoundOutcome>,
}

impl FlowResult {
    fn dry(in_zero: Amount, out_zero: Amount) -> Self {
        Self {
            ter: Ter::PathDry,
            actual_in: in_zero,
            actual_out: out_zero,
            offers_to_remove: BTreeSet::new(),
            writes: WriteSet::default(),
            rounds: 0,
            trail: Vec::new(),
        }
    }
}

struct Candidate {
    strand: usize,
    quality: Quality,
    result: StrandResult,
}

/// Deliver up to `out_req` over `strands`.
///
/// `limit_quality` is the worst rate the payer accepts; `send_max` caps the
/// total input. With `partial_payment` unset, delivering less than
/// `out_req` reports [`Ter::PathPartial`] while still returning what was
/// achieved.
pub fn flow(
    view: &dyn ReadView,
    strands: &[Strand],
    out_req: &Amount,
    partial_payment: bool,
    limit_quality: Option<Quality>,
    send_max: Option<&Amount>,
    config: &FlowConfig,
) -> Result<FlowResult> {
    let in_issue = match (send_max, strands.first()) {
        (Some(send_max), _) => send_max.issue(),
        (None, Some(strand)) => strand.input_issue(),
        (None, None) => out_req.issue(),
    };
    let mut actual_in = Amount::zero(in_issue);
    let mut actual_out = Amount::zero(out_req.issue());

    if strands.is_empty() {
        debug!("No strands to execute");
        return Ok(FlowResult::dry(actual_in, actual_out));
    }

    let mut ranked = Vec::with_capacity(strands.len());
    for (index, strand) in strands.iter().enumerate() {
        match strand.quality_upper_bound(view)? {
            Some(quality) => ranked.push((index, quality)),
            None => debug!(strand = index, "Strand has no liquidity"),
        }
    }
    ranked.sort_by(|a, b| a.1.cmp(&b.1));
    let mut active: Vec<usize> = ranked.into_iter().map(|(index, _)| index).collect();

    let mut sb = Sandbox::new(view);
    let mut remaining_out = *out_req;
    let mut remaining_in = send_max.copied();
    let mut offers_to_remove = BTreeSet::new();
    let mut trail = Vec::new();
    let mut rounds = 0;

    while rounds < config.max_rounds && remaining_out.signum() > 0 && !active.is_empty() {
        rounds += 1;
        let mut best: Option<Candidate> = None;
        let mut still_active = Vec::with_capacity(active.len());

        for &index in &active {
            let strand = &strands[index];
            let bound = match strand.quality_upper_bound(&sb)? {
                Some(bound) => bound,
                None => {
                    debug!(round = rounds, strand = index, "Strand dried up");
                    continue;
                }
            };
            if limit_quality.map_or(false, |floor| bound.worse_than(&floor)) {
                debug!(round = rounds, strand = index, %bound, "Strand below quality floor");
                continue;
            }

            let limits = StrandLimits {
                max_offers: config.max_offers_per_step,
                quality_limit: limit_quality.filter(|_| strand.book_steps() == 1),
            };
            let mut result = strand.execute(&sb, &remaining_out, remaining_in.as_ref(), limits)?;
            // unfunded offers stay flagged whether or not this attempt is merged
            offers_to_remove.append(&mut result.unfunded_offers);

            if !result.is_success() || result.output.signum() <= 0 {
                debug!(round = rounds, strand = index, ter = %result.ter, "Strand deactivated");
                continue;
            }
            let quality = match Quality::from_amounts(&result.input, &result.output) {
                Some(quality) => quality,
                None => continue,
            };
            if limit_quality.map_or(false, |floor| quality.worse_than(&floor)) {
                debug!(round = rounds, strand = index, %quality, "Realized quality below floor");
                continue;
            }
            if !result.exhausted {
                still_active.push(index);
            }

            let better = match &best {
                None => true,
                Some(current) => {
                    quality.better_than(&current.quality)
                        || (quality == current.quality && index < current.strand)
                }
            };
            if better {
                best = Some(Candidate {
                    strand: index,
                    quality,
                    result,
                });
            }
        }
        active = still_active;

        let winner = match best {
            Some(winner) => winner,
            None => {
                debug!(round = rounds, "No strand delivered");
                break;
            }
        };

        debug!(
            round = rounds,
            strand = winner.strand,
            quality = %winner.quality,
            input = %winner.result.input,
            output = %winner.result.output,
            "Round merged"
        );
        trail.push(RoundOutcome {
            strand: winner.strand,
            input: winner.result.input,
            output: winner.result.output,
            remaining_out,
        });

        let result = winner.result;
        sb.apply(result.writes)?;
        actual_in = actual_in.checked_add(&result.input)?;
        actual_out = actual_out.checked_add(&result.output)?;
        offers_to_remove.extend(result.consumed_offers);
        remaining_out = reduce_remaining(&remaining_out, &result.output)?;

        if let Some(budget) = remaining_in.as_mut() {
            *budget = budget.checked_sub(&result.input)?;
            if budget.signum() <= 0 {
                debug!(round = rounds, "Input budget spent");
                break;
            }
        }
    }

    let ter = if actual_out.signum() <= 0 {
        Ter::PathDry
    } else if remaining_out.signum() > 0 && !partial_payment {
        Ter::PathPartial
    } else {
        Ter::Success
    };

    Ok(FlowResult {
        ter,
        actual_in,
        actual_out,
        offers_to_remove,
        writes: sb.into_writes(),
        rounds,
        trail,
    })
}

/// Output still owed after `delivered`. Over-delivery never reaches here
/// from a well-formed strand; if it does, the remainder is clamped to zero.
fn reduce_remaining(remaining: &Amount, delivered: &Amount) -> Result<Amount> {
    let next = remaining.checked_sub(delivered)?;
    if next.is_negative() {
        warn!(%remaining, %delivered, "Delivered more than requested; clamping");
        return Ok(Amount::zero(next.issue()));
    }
    Ok(next)
}
