//! Shared numeric helpers and the rounding policy.
//!
//! RULE: Rounding happens in exactly two places.
//!   - Row level: every per-area row is rounded with `round_row`
//!     BEFORE it is summed into a subtotal (sum-of-rounded).
//!   - Final amounts: totals, payouts and prorated charges use `round2`.
//! Changing either order changes quoted prices by cents.

use crate::types::Money;
use serde::{Deserialize, Serialize};
use std::ops::{Add, Sub};

/// Round to cents, half away from zero.
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// The row-level rounding policy. Applied to each area row before
/// aggregation; the aggregate is the sum of rounded rows.
pub fn round_row(value: Money) -> Money {
    round2(value)
}

/// Sum already-rounded rows, then re-round to cancel float noise
/// from the addition itself.
pub fn sum_rounded_rows<I: IntoIterator<Item = Money>>(rows: I) -> Money {
    round2(rows.into_iter().map(round_row).sum())
}

/// Clamp a fraction into [0, 1].
pub fn clamp_fraction(value: f64) -> f64 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, 1.0)
    }
}

/// Whole cents. Used where an identity between amounts must hold
/// exactly (payout + company revenue == total).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Cents(pub i64);

impl Cents {
    pub const ZERO: Cents = Cents(0);

    pub fn from_dollars(amount: Money) -> Self {
        Cents((amount * 100.0).round() as i64)
    }

    pub fn dollars(self) -> Money {
        self.0 as f64 / 100.0
    }

    /// `self × fraction`, rounded to the nearest cent.
    pub fn scale(self, fraction: f64) -> Self {
        Cents((self.0 as f64 * fraction).round() as i64)
    }
}

impl Add for Cents {
    type Output = Cents;
    fn add(self, rhs: Cents) -> Cents {
        Cents(self.0 + rhs.0)
    }
}

impl Sub for Cents {
    type Output = Cents;
    fn sub(self, rhs: Cents) -> Cents {
        Cents(self.0 - rhs.0)
    }
}
