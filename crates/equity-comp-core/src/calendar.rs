//! Day-clamped calendar arithmetic shared by the vesting and expense engines.
//!
//! Month addition clamps the day-of-month to the target month's length
//! (Jan 31 + 1 month = Feb 28/29), and whole-month counting is defined by
//! probing with that same addition, so a schedule anchored on the 31st
//! still completes a "month" on the last day of February.

use chrono::{Datelike, NaiveDate};

/// Add a number of months to a date, clamping the day to the month's max.
pub fn add_months(date: NaiveDate, months: i32) -> NaiveDate {
    let total_months = date.year() * 12 + date.month() as i32 - 1 + months;
    let new_year = total_months.div_euclid(12);
    let new_month = (total_months.rem_euclid(12) + 1) as u32;
    let max_day = days_in_month(new_year, new_month);
    let day = date.day().min(max_day);
    NaiveDate::from_ymd_opt(new_year, new_month, day).unwrap_or(date)
}

/// Signed count of whole calendar months from `from` to `to`.
///
/// Defined by the probe `add_months(from, m) <= to < add_months(from, m + 1)`,
/// so clamped month-ends count as complete months (Jan 31 -> Feb 28 = 1).
pub fn whole_months(from: NaiveDate, to: NaiveDate) -> i32 {
    if to < from {
        return -whole_months(to, from);
    }
    let mut months =
        (to.year() - from.year()) * 12 + to.month() as i32 - from.month() as i32;
    if add_months(from, months) > to {
        months -= 1;
    }
    months.max(0)
}

/// Whole calendar months between two dates, order-agnostic.
pub fn months_between(a: NaiveDate, b: NaiveDate) -> u32 {
    whole_months(a, b).unsigned_abs()
}

/// Whole years from `from` to `to` (12-month probes), never negative.
pub fn whole_years(from: NaiveDate, to: NaiveDate) -> u32 {
    if to <= from {
        return 0;
    }
    (whole_months(from, to) / 12).unsigned_abs()
}

/// Raw calendar-month difference, ignoring days entirely.
///
/// Jan 31 -> Feb 1 is 1 here but 0 for [`whole_months`]. Only the
/// annualized-expense figure uses this measure.
pub fn month_span(a: NaiveDate, b: NaiveDate) -> i32 {
    (b.year() - a.year()) * 12 + b.month() as i32 - a.month() as i32
}

/// First day of the date's month.
pub fn first_of_month(date: NaiveDate) -> NaiveDate {
    NaiveDate::from_ymd_opt(date.year(), date.month(), 1).unwrap_or(date)
}

/// Every first-of-month from `start`'s month through `end`'s month, inclusive.
pub fn months_in_window(start: NaiveDate, end: NaiveDate) -> Vec<NaiveDate> {
    let last = first_of_month(end);
    let mut months = Vec::new();
    let mut current = first_of_month(start);
    while current <= last {
        months.push(current);
        current = add_months(current, 1);
    }
    months
}

/// Number of days in a given month/year.
pub fn days_in_month(year: i32, month: u32) -> u32 {
    match month {
        1 | 3 | 5 | 7 | 8 | 10 | 12 => 31,
        4 | 6 | 9 | 11 => 30,
        2 => {
            if is_leap_year(year) {
                29
            } else {
                28
            }
        }
        _ => 30,
    }
}

fn is_leap_year(year: i32) -> bool {
    (year % 4 == 0 && year % 100 != 0) || year % 400 == 0
}
