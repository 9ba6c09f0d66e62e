//! Exact amounts of native and issued currency
//!
//! Native amounts are whole drops held in an `i64`; issued amounts are
//! `rust_decimal::Decimal` values tagged with their [`Issue`]. There is no
//! floating point anywhere: every conversion names its rounding direction.

use crate::{
    error::{Error, Result},
    types::Issue,
};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;

/// Fractional digits kept for issued-currency amounts
pub const IOU_SCALE: u32 = 15;

/// Drops in one XRP
pub const DROPS_PER_XRP: i64 = 1_000_000;

/// Rounding direction for conversions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rounding {
    /// Towards positive infinity
    Up,
    /// Towards negative infinity
    Down,
}

impl Rounding {
    fn strategy(self) -> RoundingStrategy {
        match self {
            Rounding::Up => RoundingStrategy::ToPositiveInfinity,
            Rounding::Down => RoundingStrategy::ToNegativeInfinity,
        }
    }
}

/// Native amount in drops
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize,
)]
pub struct XrpAmount(i64);

impl XrpAmount {
    /// Zero drops
    pub const ZERO: XrpAmount = XrpAmount(0);

    /// Create from drops
    pub fn from_drops(drops: i64) -> Self {
        Self(drops)
    }

    /// Get drops
    pub fn drops(&self) -> i64 {
        self.0
    }
}

/// Issued-currency amount
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct IouAmount {
    /// Exact value
    pub value: Decimal,
    /// Currency and issuer
    pub issue: Issue,
}

/// Native or issued amount
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Amount {
    /// Drops of the native asset
    Xrp(XrpAmount),
    /// Issued currency
    Iou(IouAmount),
}

impl Amount {
    /// Native amount in drops
    pub fn xrp(drops: i64) -> Self {
        Amount::Xrp(XrpAmount::from_drops(drops))
    }

    /// Issued amount
    pub fn iou(value: Decimal, issue: Issue) -> Self {
        debug_assert!(!issue.is_xrp(), "issued amount with native issue");
        Amount::Iou(IouAmount { value, issue })
    }

    /// Zero of the given issue
    pub fn zero(issue: Issue) -> Self {
        if issue.is_xrp() {
            Amount::Xrp(XrpAmount::ZERO)
        } else {
            Amount::Iou(IouAmount {
                value: Decimal::ZERO,
                issue,
            })
        }
    }

    /// Build an amount of `issue` from a decimal, rounding to the issue's
    /// precision (whole drops or [`IOU_SCALE`] digits).
    pub fn from_value(issue: Issue, value: Decimal, rounding: Rounding) -> Result<Self> {
        if issue.is_xrp() {
            let drops = value
                .round_dp_with_strategy(0, rounding.strategy())
                .to_i64()
                .ok_or_else(|| Error::Overflow(format!("{} drops out of range", value)))?;
            Ok(Amount::xrp(drops))
        } else {
            Ok(Amount::iou(
                value.round_dp_with_strategy(IOU_SCALE, rounding.strategy()),
                issue,
            ))
        }
    }

    /// Currency and issuer
    pub fn issue(&self) -> Issue {
        match self {
            Amount::Xrp(_) => Issue::xrp(),
            Amount::Iou(iou) => iou.issue,
        }
    }

    /// Is this a native amount
    pub fn is_xrp(&self) -> bool {
        matches!(self, Amount::Xrp(_))
    }

    /// Numeric value (drops for native amounts)
    pub fn value(&self) -> Decimal {
        match self {
            Amount::Xrp(xrp) => Decimal::from(xrp.drops()),
            Amount::Iou(iou) => iou.value,
        }
    }

    /// Is this zero
    pub fn is_zero(&self) -> bool {
        match self {
            Amount::Xrp(xrp) => xrp.drops() == 0,
            Amount::Iou(iou) => iou.value.is_zero(),
        }
    }

    /// Is this strictly negative
    pub fn is_negative(&self) -> bool {
        self.signum() < 0
    }

    /// -1, 0 or 1
    pub fn signum(&self) -> i32 {
        match self {
            Amount::Xrp(xrp) => xrp.drops().signum() as i32,
            Amount::Iou(iou) => {
                if iou.value.is_zero() {
                    0
                } else if iou.value.is_sign_negative() {
                    -1
                } else {
                    1
                }
            }
        }
    }

    /// Exact sum of two amounts of the same issue
    pub fn checked_add(&self, other: &Amount) -> Result<Amount> {
        ensure_same_issue(self, other)?;
        match (self, other) {
            (Amount::Xrp(a), Amount::Xrp(b)) => a
                .drops()
                .checked_add(b.drops())
                .map(Amount::xrp)
                .ok_or_else(|| Error::Overflow(format!("{} + {}", self, other))),
            _ => self
                .value()
                .checked_add(other.value())
                .map(|value| Amount::iou(value, self.issue()))
                .ok_or_else(|| Error::Overflow(format!("{} + {}", self, other))),
        }
    }

    /// Exact difference of two amounts of the same issue
    pub fn checked_sub(&self, other: &Amount) -> Result<Amount> {
        ensure_same_issue(self, other)?;
        match (self, other) {
            (Amount::Xrp(a), Amount::Xrp(b)) => a
                .drops()
                .checked_sub(b.drops())
                .map(Amount::xrp)
                .ok_or_else(|| Error::Overflow(format!("{} - {}", self, other))),
            _ => self
                .value()
                .checked_sub(other.value())
                .map(|value| Amount::iou(value, self.issue()))
                .ok_or_else(|| Error::Overflow(format!("{} - {}", self, other))),
        }
    }

    /// Smaller of two amounts of the same issue
    pub fn min_of(&self, other: &Amount) -> Result<Amount> {
        ensure_same_issue(self, other)?;
        Ok(if other.value() < self.value() {
            *other
        } else {
            *self
        })
    }

    /// Zero when negative, unchanged otherwise
    pub fn clamp_non_negative(&self) -> Amount {
        if self.is_negative() {
            Amount::zero(self.issue())
        } else {
            *self
        }
    }

    /// `self * num / den` expressed in `issue`, rounded in `rounding`
    /// direction.
    ///
    /// Multiplies first when the product fits, so that proportional
    /// consumption of an offer stays exact; otherwise divides first.
    pub fn mul_ratio(
        &self,
        num: &Amount,
        den: &Amount,
        issue: Issue,
        rounding: Rounding,
    ) -> Result<Amount> {
        if den.is_zero() {
            return Err(Error::Overflow(format!("{} / 0", num)));
        }
        let value = match self
            .value()
            .checked_mul(num.value())
            .and_then(|product| product.checked_div(den.value()))
        {
            Some(value) => value,
            None => num
                .value()
                .checked_div(den.value())
                .and_then(|ratio| self.value().checked_mul(ratio))
                .ok_or_else(|| {
                    Error::Overflow(format!("{} * {} / {}", self, num, den))
                })?,
        };
        Amount::from_value(issue, value, rounding)
    }
}

fn ensure_same_issue(a: &Amount, b: &Amount) -> Result<()> {
    if a.issue() != b.issue() {
        return Err(Error::IssueMismatch(format!(
            "{} vs {}",
            a.issue(),
            b.issue()
        )));
    }
    Ok(())
}

impl PartialOrd for Amount {
    /// Amounts of different issues are unordered.
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        if self.issue() != other.issue() {
            return None;
        }
        match (self, other) {
            (Amount::Xrp(a), Amount::Xrp(b)) => Some(a.cmp(b)),
            _ => self.value().partial_cmp(&other.value()),
        }
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Amount::Xrp(xrp) => write!(f, "{} drops", xrp.drops()),
            Amount::Iou(iou) => write!(f, "{}/{}", iou.value.normalize(), iou.issue),
        }
    }
}
