//! Exchange quality
//!
//! A [`Quality`] is the rate a payer gets: **input per unit of output**.
//! A lower rate is better for the payer. The same polarity is used for
//! best-case estimates, realized rates and quality floors, and `Ord` sorts
//! better qualities first.

use crate::{Error, Result};
use ledger_core::{Amount, Issue, Rounding};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;

/// Input per unit of output
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Quality {
    rate: Decimal,
}

impl Quality {
    /// One unit in per unit out
    pub const ONE: Quality = Quality { rate: Decimal::ONE };

    /// Rate of exchanging `input` for `output`.
    ///
    /// `None` when `output` is not positive or `input` is negative; callers
    /// treat that as the worst possible quality.
    pub fn from_amounts(input: &Amount, output: &Amount) -> Option<Quality> {
        if output.signum() <= 0 || input.is_negative() {
            return None;
        }
        input
            .value()
            .checked_div(output.value())
            .map(|rate| Quality { rate })
    }

    /// Quality from a raw rate; `None` for negative rates
    pub fn from_rate(rate: Decimal) -> Option<Quality> {
        if rate.is_sign_negative() && !rate.is_zero() {
            return None;
        }
        Some(Quality { rate })
    }

    /// Input per unit of output
    pub fn rate(&self) -> Decimal {
        self.rate
    }

    /// Strictly better for the payer
    pub fn better_than(&self, other: &Quality) -> bool {
        self.rate < other.rate
    }

    /// Strictly worse for the payer
    pub fn worse_than(&self, other: &Quality) -> bool {
        self.rate > other.rate
    }

    /// Quality of doing `self` then `next`
    pub fn compose(&self, next: &Quality) -> Option<Quality> {
        self.rate
            .checked_mul(next.rate)
            .map(|rate| Quality { rate })
    }

    /// Input needed for `output`, rounded up
    pub fn ceil_in(&self, output: &Amount, in_issue: Issue) -> Result<Amount> {
        let value = output
            .value()
            .checked_mul(self.rate)
            .ok_or_else(|| Error::Other(format!("{} at {} overflows", output, self)))?;
        Ok(Amount::from_value(in_issue, value, Rounding::Up)?)
    }

    /// Output bought by `input`, rounded down
    pub fn floor_out(&self, input: &Amount, out_issue: Issue) -> Result<Amount> {
        let value = input
            .value()
            .checked_div(self.rate)
            .ok_or_else(|| Error::Other(format!("{} at {} overflows", input, self)))?;
        Ok(Amount::from_value(out_issue, value, Rounding::Down)?)
    }
}

impl Ord for Quality {
    /// Better (lower rate) first
    fn cmp(&self, other: &Self) -> Ordering {
        self.rate.cmp(&other.rate)
    }
}

impl PartialOrd for Quality {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for Quality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.rate.normalize())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ledger_core::{AccountId, Currency};

    fn usd() -> Issue {
        Issue::new(Currency::from_code("USD").unwrap(), AccountId::from_seed("gw"))
    }

    #[test]
    fn test_polarity() {
        // 1 in for 2 out beats 1 in for 1 out
        let cheap = Quality::from_amounts(&Amount::xrp(1), &Amount::xrp(2)).unwrap();
        let par = Quality::from_amounts(&Amount::xrp(5), &Amount::xrp(5)).unwrap();
        assert!(cheap.better_than(&par));
        assert!(par.worse_than(&cheap));
        assert_eq!(par, Quality::ONE);

        let mut sorted = vec![par, cheap];
        sorted.sort();
        assert_eq!(sorted, vec![cheap, par]);
    }

    #[test]
    fn test_equal_rates_are_neither_better_nor_worse() {
        let a = Quality::from_amounts(&Amount::xrp(2), &Amount::xrp(4)).unwrap();
        let b = Quality::from_amounts(&Amount::xrp(3), &Amount::xrp(6)).unwrap();
        assert!(!a.better_than(&b));
        assert!(!a.worse_than(&b));
    }

    #[test]
    fn test_undefined_quality() {
        assert!(Quality::from_amounts(&Amount::xrp(1), &Amount::xrp(0)).is_none());
        assert!(Quality::from_amounts(&Amount::xrp(1), &Amount::xrp(-1)).is_none());
        assert!(Quality::from_amounts(&Amount::xrp(-1), &Amount::xrp(1)).is_none());
        assert!(Quality::from_rate(Decimal::NEGATIVE_ONE).is_none());
    }

    #[test]
    fn test_compose() {
        let half = Quality::from_rate(Decimal::new(5, 1)).unwrap();
        let triple = Quality::from_rate(Decimal::from(3)).unwrap();
        assert_eq!(half.compose(&triple).unwrap().rate(), Decimal::new(15, 1));
        assert_eq!(Quality::ONE.compose(&half).unwrap(), half);
    }

    #[test]
    fn test_conversions_round_conservatively() {
        // 3 drops per USD
        let q = Quality::from_rate(Decimal::from(3)).unwrap();
        let out = Amount::iou(Decimal::new(5, 1), usd()); // 0.5
        assert_eq!(q.ceil_in(&out, Issue::xrp()).unwrap(), Amount::xrp(2)); // 1.5 -> 2

        let input = Amount::xrp(10);
        let bought = q.floor_out(&input, usd()).unwrap();
        assert!(Decimal::from(3) * bought.value() <= Decimal::from(10));

        let zero = Quality::from_rate(Decimal::ZERO).unwrap();
        assert!(zero.floor_out(&input, usd()).is_err());
    }
}
