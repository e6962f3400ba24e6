//! Point-in-time vesting arithmetic.
//!
//! Counting convention: a window owns `total_units` whole periods and a
//! holder has earned `elapsed_units` of them, both counted the same way
//! (completed periods, no off-by-one). Elapsed periods start at the
//! cliff-adjusted date; total periods always span the full window, so the
//! cliff defers vesting without changing the per-period rate. Reaching
//! `vesting_end` always vests every share regardless of cliff or rounding.

use chrono::NaiveDate;

use crate::calendar::{add_months, months_between, whole_months, whole_years};
use crate::model::{EquityGrant, VestingFrequency};
use crate::types::ShareCount;

/// Windows shorter than this many days vest daily whatever the configured
/// frequency says.
pub const DAILY_FALLBACK_WINDOW_DAYS: i64 = 31;

/// Total vesting units across a window, floored at 1.
pub fn total_units(start: NaiveDate, end: NaiveDate, frequency: VestingFrequency) -> u32 {
    let days = (end - start).num_days();
    if days < DAILY_FALLBACK_WINDOW_DAYS {
        return days.max(1) as u32;
    }
    match frequency {
        VestingFrequency::Daily => days.max(1) as u32,
        VestingFrequency::Weekly => (days / 7).max(1) as u32,
        VestingFrequency::Biweekly => (days / 14).max(1) as u32,
        VestingFrequency::Yearly => whole_years(start, end).max(1),
        VestingFrequency::Monthly => months_between(start, end).max(1),
    }
}

/// Units completed between the cliff-adjusted start and `min(as_of, end)`.
///
/// Zero before the cliff date. The daily fallback keys off the *full*
/// window length so total and elapsed units stay commensurable.
pub fn elapsed_units(
    start: NaiveDate,
    end: Option<NaiveDate>,
    frequency: VestingFrequency,
    cliff_months: u32,
    as_of: NaiveDate,
) -> u32 {
    let adjusted_start = add_months(start, cliff_months as i32);
    if as_of < adjusted_start {
        return 0;
    }
    let stop = match end {
        Some(end) => as_of.min(end),
        None => as_of,
    };
    let days_elapsed = (stop - adjusted_start).num_days().max(0);

    let short_window = end.is_some_and(|end| (end - start).num_days() < DAILY_FALLBACK_WINDOW_DAYS);
    if short_window || frequency == VestingFrequency::Daily {
        return days_elapsed as u32;
    }
    match frequency {
        VestingFrequency::Weekly => (days_elapsed / 7) as u32,
        VestingFrequency::Biweekly => (days_elapsed / 14) as u32,
        VestingFrequency::Yearly => whole_years(adjusted_start, stop),
        _ => whole_months(adjusted_start, stop).max(0) as u32,
    }
}

/// Shares vested as of a date.
///
/// Preferred stock vests in full immediately. Grants without a window (or
/// without shares) never vest. Within the window the vested count is
/// `floor(num_shares * elapsed / total)`, clamped to `num_shares`; at or
/// after `vesting_end` the full count vests unconditionally.
pub fn vested_shares(grant: &EquityGrant, as_of: NaiveDate) -> ShareCount {
    let counts = grant.bucket_counts();
    if counts.preferred > 0 {
        return counts.preferred;
    }

    let num_shares = grant.num_shares();
    let Some((start, end)) = grant.vesting_window() else {
        return 0;
    };
    if num_shares == 0 {
        return 0;
    }
    if as_of < start {
        return 0;
    }
    if as_of >= end {
        return num_shares;
    }

    let total = total_units(start, end, grant.vesting_frequency);
    let elapsed = elapsed_units(
        start,
        Some(end),
        grant.vesting_frequency,
        grant.cliff_months,
        as_of,
    );
    let vested = (num_shares as u128 * elapsed as u128 / total as u128) as ShareCount;
    vested.min(num_shares)
}

/// `num_shares - vested`, floored at zero.
pub fn unvested_shares(grant: &EquityGrant, as_of: NaiveDate) -> ShareCount {
    grant.num_shares().saturating_sub(vested_shares(grant, as_of))
}

// ---------------------------------------------------------------------------
// Status
// ---------------------------------------------------------------------------

/// Canonical vesting state of a grant at a point in time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VestingStatus {
    PreferredImmediate,
    NotVested,
    FullyVested,
    PartiallyVested,
}

impl std::fmt::Display for VestingStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            VestingStatus::PreferredImmediate => write!(f, "Preferred Shares (Immediate Vest)"),
            VestingStatus::NotVested => write!(f, "Not Vested"),
            VestingStatus::FullyVested => write!(f, "Fully Vested"),
            VestingStatus::PartiallyVested => write!(f, "Partially Vested"),
        }
    }
}

pub fn vesting_status(grant: &EquityGrant, as_of: NaiveDate) -> VestingStatus {
    if grant.bucket_counts().preferred > 0 {
        return VestingStatus::PreferredImmediate;
    }
    let vested = vested_shares(grant, as_of);
    let total = grant.num_shares();
    if vested == 0 {
        VestingStatus::NotVested
    } else if vested >= total && total > 0 {
        VestingStatus::FullyVested
    } else {
        VestingStatus::PartiallyVested
    }
}

// ---------------------------------------------------------------------------
// Month measures
// ---------------------------------------------------------------------------

/// Whole months spanned by the vesting window (0 for preferred or no window).
pub fn total_vesting_months(grant: &EquityGrant) -> u32 {
    if grant.bucket_counts().preferred > 0 {
        return 0;
    }
    match grant.vesting_window() {
        Some((start, end)) => months_between(start, end),
        None => 0,
    }
}

/// Whole months left until `vesting_end`, floored at zero.
pub fn remaining_vesting_months(grant: &EquityGrant, as_of: NaiveDate) -> u32 {
    if grant.bucket_counts().preferred > 0 {
        return 0;
    }
    match grant.vesting_end {
        Some(end) => whole_months(as_of, end).max(0) as u32,
        None => 0,
    }
}

/// Live distance between today and `vesting_start` in whole months,
/// order-agnostic. Reported alongside the fixed `cliff_months` parameter.
pub fn months_since_vesting_start(grant: &EquityGrant, as_of: NaiveDate) -> u32 {
    match grant.vesting_start {
        Some(start) => months_between(start, as_of),
        None => 0,
    }
}
