//! Tranche-by-tranche vesting schedules.
//!
//! Per-period share counts use cumulative-difference allocation:
//! `alloc(total, i, n) = floor(total * i / n) - floor(total * (i - 1) / n)`.
//! The first `n - 1` differences absorb the floor drift, so the events of a
//! schedule always sum exactly to the bucket totals.

use chrono::{Days, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::calendar::{add_months, months_between, whole_years};
use crate::model::{EquityGrant, VestingFrequency};
use crate::types::ShareCount;
use crate::vesting::calculator::DAILY_FALLBACK_WINDOW_DAYS;

/// One vesting tranche: incremental shares per bucket on a date.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VestingEvent {
    pub date: NaiveDate,
    pub iso: ShareCount,
    pub nqo: ShareCount,
    pub rsu: ShareCount,
    pub common: ShareCount,
    pub preferred: ShareCount,
    pub total_vested: ShareCount,
}

/// Shares released in period `i` (1-based) of `n` under cumulative-difference
/// allocation.
pub fn period_allocation(total: ShareCount, period: u32, periods: u32) -> ShareCount {
    if periods == 0 {
        return 0;
    }
    let upto = |p: u32| (total as u128 * p as u128 / periods as u128) as ShareCount;
    upto(period) - upto(period - 1)
}

/// Full vesting schedule for a grant.
///
/// Preferred grants produce a single event dated `grant_date`. Grants
/// without a window produce nothing. A cliff that consumes the whole window
/// collapses to a single terminal event at `vesting_end`. Otherwise one
/// event per unit, dated by stepping from the cliff-adjusted start and
/// clamped to `vesting_end`.
pub fn vesting_schedule(grant: &EquityGrant) -> Vec<VestingEvent> {
    let counts = grant.bucket_counts();

    if counts.preferred > 0 {
        return vec![VestingEvent {
            date: grant.grant_date,
            iso: 0,
            nqo: 0,
            rsu: 0,
            common: 0,
            preferred: counts.preferred,
            total_vested: counts.preferred,
        }];
    }

    let Some((start, end)) = grant.vesting_window() else {
        return Vec::new();
    };

    let adjusted_start = add_months(start, grant.cliff_months as i32);
    if adjusted_start >= end {
        // cliff reaches or passes the end: everything vests at once
        let total = counts.iso + counts.nqo + counts.rsu + counts.common;
        return vec![VestingEvent {
            date: end,
            iso: counts.iso,
            nqo: counts.nqo,
            rsu: counts.rsu,
            common: counts.common,
            preferred: 0,
            total_vested: total,
        }];
    }

    let days = (end - adjusted_start).num_days();
    let frequency = if days < DAILY_FALLBACK_WINDOW_DAYS {
        VestingFrequency::Daily
    } else {
        grant.vesting_frequency
    };
    let units = match frequency {
        VestingFrequency::Daily => days.max(1) as u32,
        VestingFrequency::Weekly => (days / 7).max(1) as u32,
        VestingFrequency::Biweekly => (days / 14).max(1) as u32,
        VestingFrequency::Yearly => whole_years(adjusted_start, end).max(1),
        VestingFrequency::Monthly => months_between(adjusted_start, end).max(1),
    };

    let mut schedule = Vec::with_capacity(units as usize);
    for i in 1..=units {
        let date = step_date(adjusted_start, frequency, i).min(end);
        let iso = period_allocation(counts.iso, i, units);
        let nqo = period_allocation(counts.nqo, i, units);
        let rsu = period_allocation(counts.rsu, i, units);
        let common = period_allocation(counts.common, i, units);
        schedule.push(VestingEvent {
            date,
            iso,
            nqo,
            rsu,
            common,
            preferred: 0,
            total_vested: iso + nqo + rsu + common,
        });
    }
    schedule
}

/// Date of the i-th tranche counting from the adjusted start. Month and year
/// steps are anchored on the start date (day-clamped per step), not chained.
fn step_date(start: NaiveDate, frequency: VestingFrequency, i: u32) -> NaiveDate {
    match frequency {
        VestingFrequency::Daily => start
            .checked_add_days(Days::new(i as u64))
            .unwrap_or(start),
        VestingFrequency::Weekly => start
            .checked_add_days(Days::new(7 * i as u64))
            .unwrap_or(start),
        VestingFrequency::Biweekly => start
            .checked_add_days(Days::new(14 * i as u64))
            .unwrap_or(start),
        VestingFrequency::Monthly => add_months(start, i as i32),
        VestingFrequency::Yearly => add_months(start, 12 * i as i32),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::GrantKind;
    use rust_decimal_macros::dec;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn rsu_grant(shares: ShareCount, cliff_months: u32) -> EquityGrant {
        EquityGrant {
            id: 7,
            employee_id: "EMP-2".into(),
            stock_class_id: 1,
            kind: GrantKind::Rsu { shares },
            grant_date: d(2024, 1, 1),
            vesting_start: Some(d(2024, 1, 1)),
            vesting_end: Some(d(2027, 1, 1)),
            vesting_frequency: VestingFrequency::Monthly,
            cliff_months,
        }
    }

    #[test]
    fn test_allocation_absorbs_floor_drift() {
        // 100 over 3: floor(33.3)=33, floor(66.6)-33=33, 100-66=34
        assert_eq!(period_allocation(100, 1, 3), 33);
        assert_eq!(period_allocation(100, 2, 3), 33);
        assert_eq!(period_allocation(100, 3, 3), 34);
    }

    #[test]
    fn test_schedule_sums_exactly_to_total() {
        let grant = rsu_grant(1000, 0); // 36 months, 1000 not divisible by 36
        let schedule = vesting_schedule(&grant);
        assert_eq!(schedule.len(), 36);
        let total: ShareCount = schedule.iter().map(|e| e.total_vested).sum();
        assert_eq!(total, 1000);
        let rsu_total: ShareCount = schedule.iter().map(|e| e.rsu).sum();
        assert_eq!(rsu_total, 1000);
    }

    #[test]
    fn test_monthly_event_dates_are_anchored() {
        let grant = EquityGrant {
            vesting_start: Some(d(2024, 1, 31)),
            vesting_end: Some(d(2024, 7, 31)),
            ..rsu_grant(600, 0)
        };
        let schedule = vesting_schedule(&grant);
        assert_eq!(schedule.len(), 6);
        // Feb clamps to the 29th (leap), later months return to the 31st/30th
        assert_eq!(schedule[0].date, d(2024, 2, 29));
        assert_eq!(schedule[1].date, d(2024, 3, 31));
        assert_eq!(schedule[2].date, d(2024, 4, 30));
        assert_eq!(schedule[5].date, d(2024, 7, 31));
    }

    #[test]
    fn test_preferred_is_single_event_at_grant_date() {
        let grant = EquityGrant {
            kind: GrantKind::Preferred { shares: 500, purchase_price: dec!(3.00) },
            vesting_start: None,
            vesting_end: None,
            ..rsu_grant(500, 0)
        };
        let schedule = vesting_schedule(&grant);
        assert_eq!(schedule.len(), 1);
        assert_eq!(schedule[0].date, d(2024, 1, 1));
        assert_eq!(schedule[0].preferred, 500);
        assert_eq!(schedule[0].total_vested, 500);
    }

    #[test]
    fn test_no_window_no_schedule() {
        let grant = EquityGrant {
            vesting_start: None,
            vesting_end: None,
            ..rsu_grant(500, 0)
        };
        assert!(vesting_schedule(&grant).is_empty());
    }

    #[test]
    fn test_cliff_consuming_window_collapses_to_terminal_event() {
        let grant = EquityGrant {
            vesting_start: Some(d(2024, 1, 1)),
            vesting_end: Some(d(2025, 1, 1)),
            ..rsu_grant(900, 12)
        };
        let schedule = vesting_schedule(&grant);
        assert_eq!(schedule.len(), 1);
        assert_eq!(schedule[0].date, d(2025, 1, 1));
        assert_eq!(schedule[0].rsu, 900);
        assert_eq!(schedule[0].total_vested, 900);
    }

    #[test]
    fn test_cliff_shrinks_the_scheduled_window() {
        // 12-month cliff on a 36-month window leaves 24 tranches
        let grant = rsu_grant(2400, 12);
        let schedule = vesting_schedule(&grant);
        assert_eq!(schedule.len(), 24);
        assert_eq!(schedule[0].date, d(2025, 2, 1));
        assert_eq!(schedule[23].date, d(2027, 1, 1));
        let total: ShareCount = schedule.iter().map(|e| e.total_vested).sum();
        assert_eq!(total, 2400);
    }

    #[test]
    fn test_short_window_vests_daily() {
        let grant = EquityGrant {
            vesting_start: Some(d(2024, 1, 1)),
            vesting_end: Some(d(2024, 1, 11)),
            ..rsu_grant(100, 0)
        };
        let schedule = vesting_schedule(&grant);
        assert_eq!(schedule.len(), 10);
        assert_eq!(schedule[0].date, d(2024, 1, 2));
        assert_eq!(schedule[9].date, d(2024, 1, 11));
        assert_eq!(schedule.iter().map(|e| e.rsu).sum::<ShareCount>(), 100);
    }

    #[test]
    fn test_biweekly_steps_every_fourteen_days() {
        // 100-day window: floor(100 / 14) = 7 units
        let grant = EquityGrant {
            vesting_start: Some(d(2024, 1, 1)),
            vesting_end: Some(d(2024, 4, 10)),
            vesting_frequency: VestingFrequency::Biweekly,
            ..rsu_grant(700, 0)
        };
        let schedule = vesting_schedule(&grant);
        assert_eq!(schedule.len(), 7);
        assert_eq!(schedule[0].date, d(2024, 1, 15));
        assert_eq!(schedule[6].date, d(2024, 4, 8));
        assert_eq!(schedule.iter().map(|e| e.rsu).sum::<ShareCount>(), 700);
    }

    #[test]
    fn test_dates_never_pass_vesting_end() {
        // yearly frequency over a six-month window: a single unit whose step
        // lands past the end and clamps to it
        let grant = EquityGrant {
            vesting_start: Some(d(2024, 1, 1)),
            vesting_end: Some(d(2024, 7, 1)),
            vesting_frequency: VestingFrequency::Yearly,
            ..rsu_grant(700, 0)
        };
        let schedule = vesting_schedule(&grant);
        assert_eq!(schedule.len(), 1);
        assert_eq!(schedule[0].date, d(2024, 7, 1));
        assert_eq!(schedule[0].rsu, 700);
        assert_eq!(schedule[0].total_vested, 700);
    }
}
