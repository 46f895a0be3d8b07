//! Day-weighted proration of a flat monthly value.
//!
//! The window is inclusive on both ends and already normalised to
//! calendar days in the billing timezone. Each calendar month the
//! window touches contributes
//!     (monthly_value / days_in_that_month) × overlap_days
//! and the sum is rounded once, at the end.

use crate::{
    error::{PricingError, PricingResult},
    numeric::round2,
    types::Money,
};
use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProrationSegment {
    pub year: i32,
    pub month: u32,
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub days_in_month: u32,
    pub overlap_days: u32,
    /// Unrounded.
    pub amount: Money,
}

fn first_of_month(date: NaiveDate) -> Option<NaiveDate> {
    NaiveDate::from_ymd_opt(date.year(), date.month(), 1)
}

fn first_of_next_month(date: NaiveDate) -> Option<NaiveDate> {
    if date.month() == 12 {
        NaiveDate::from_ymd_opt(date.year() + 1, 1, 1)
    } else {
        NaiveDate::from_ymd_opt(date.year(), date.month() + 1, 1)
    }
}

pub fn last_of_month(date: NaiveDate) -> Option<NaiveDate> {
    first_of_next_month(date).and_then(|d| d.pred_opt())
}

pub fn days_in_month(year: i32, month: u32) -> Option<u32> {
    let first = NaiveDate::from_ymd_opt(year, month, 1)?;
    let next = first_of_next_month(first)?;
    u32::try_from((next - first).num_days()).ok()
}

/// Inclusive day count of `[start, end]`.
pub fn window_days(start: NaiveDate, end: NaiveDate) -> i64 {
    (end - start).num_days() + 1
}

/// Caller-side cap on window length.
pub fn check_window_cap(start: NaiveDate, end: NaiveDate, max_days: i64) -> PricingResult<()> {
    if end < start || window_days(start, end) > max_days {
        return Err(PricingError::InvalidWindow { start, end });
    }
    Ok(())
}

/// Per-month breakdown of `[start, end]`.
pub fn segments(monthly_value: Money, start: NaiveDate, end: NaiveDate) -> PricingResult<Vec<ProrationSegment>> {
    if end < start {
        return Err(PricingError::InvalidWindow { start, end });
    }
    let calendar_error = || PricingError::InvalidWindow { start, end };

    let mut out = Vec::new();
    let mut cursor = start;
    loop {
        let month_end = last_of_month(cursor).ok_or_else(calendar_error)?;
        let segment_end = month_end.min(end);
        let days = days_in_month(cursor.year(), cursor.month()).ok_or_else(calendar_error)?;
        let overlap = u32::try_from(window_days(cursor, segment_end)).map_err(|_| calendar_error())?;

        out.push(ProrationSegment {
            year: cursor.year(),
            month: cursor.month(),
            start: cursor,
            end: segment_end,
            days_in_month: days,
            overlap_days: overlap,
            amount: monthly_value / f64::from(days) * f64::from(overlap),
        });

        if segment_end >= end {
            break;
        }
        cursor = segment_end.succ_opt().ok_or_else(calendar_error)?;
    }
    Ok(out)
}

/// The amount owed for `[start, end]`, rounded to cents.
pub fn prorate(monthly_value: Money, start: NaiveDate, end: NaiveDate) -> PricingResult<Money> {
    let total: Money = segments(monthly_value, start, end)?.iter().map(|s| s.amount).sum();
    Ok(round2(total))
}

/// True when `[start, end]` is exactly one whole calendar month.
pub fn is_full_month(start: NaiveDate, end: NaiveDate) -> bool {
    first_of_month(start) == Some(start) && last_of_month(start) == Some(end)
}
