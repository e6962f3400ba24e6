//! Straight-line expense recognition.
//!
//! A grant's total fair value (option component priced by Black-Scholes,
//! stock component at FMV) is spread across the whole months of its vesting
//! window by cumulative-difference allocation in cents, so the emitted
//! months always reconstruct the rounded total exactly. Grants without a
//! usable window recognize everything in one month. The reporting window
//! opens at the current month; months already past are not re-spread.

use std::collections::BTreeMap;
use std::time::Instant;

use chrono::NaiveDate;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::calendar::{add_months, first_of_month, months_between, months_in_window};
use crate::model::{Company, EquityGrant};
use crate::pricing::black_scholes::{bso_value_per_option, money_from_f64};
use crate::types::{with_metadata, ComputationOutput, GrantId, Money};
use crate::EquityResult;

// ---------------------------------------------------------------------------
// Fair value
// ---------------------------------------------------------------------------

/// Total compensation expense of a grant, split by component.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FairValue {
    /// Black-Scholes value of the option shares. Zero unless the grant has
    /// options and FMV, strike, and volatility are all positive.
    pub option_component: Money,
    /// FMV times the non-option shares.
    pub stock_component: Money,
    pub total: Money,
}

/// Fair value of a grant at `as_of` (the Black-Scholes horizon runs from
/// `as_of` to `vesting_end`).
pub fn total_fair_value(company: &Company, grant: &EquityGrant, as_of: NaiveDate) -> FairValue {
    let counts = grant.bucket_counts();
    let fmv = company.current_share_price;

    let priceable = counts.options() > 0
        && fmv > Money::ZERO
        && grant.kind.strike_price().is_some_and(|k| k > Money::ZERO)
        && company.volatility > Money::ZERO;
    let option_component = if priceable {
        let per_option = bso_value_per_option(
            company,
            grant.kind.strike_price(),
            grant.vesting_end,
            as_of,
        );
        (Decimal::from(counts.options()) * money_from_f64(per_option)).round_dp(2)
    } else {
        Money::ZERO
    };

    let stock_component = (fmv * Decimal::from(counts.stock_units())).round_dp(2);
    FairValue {
        option_component,
        stock_component,
        total: (option_component + stock_component).round_dp(2),
    }
}

// ---------------------------------------------------------------------------
// Monthly allocation
// ---------------------------------------------------------------------------

/// One reporting month.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonthlyExpense {
    /// First day of the month.
    pub month: NaiveDate,
    pub expense: Money,
}

/// Spread a 2-dp total across `periods` months; period `i` receives the
/// cumulative-difference slice in cents, so all periods sum to the total.
fn month_allocation(total: Money, period: u32, periods: u32) -> Money {
    if periods == 0 {
        return Money::ZERO;
    }
    let cents = (total * Decimal::from(100)).trunc().to_u128().unwrap_or(0);
    let upto = |p: u32| cents * p as u128 / periods as u128;
    let slice = upto(period) - upto(period - 1);
    Decimal::from_i128_with_scale(slice as i128, 2)
}

/// Expense posted per month for one grant, already filtered to months at or
/// after `start_month`. Immediate-vest cases post a single month.
fn allocate_grant(
    company: &Company,
    grant: &EquityGrant,
    start_month: NaiveDate,
    as_of: NaiveDate,
) -> Vec<(NaiveDate, Money)> {
    let counts = grant.bucket_counts();
    let fair = total_fair_value(company, grant, as_of);
    let window = grant
        .vesting_window()
        .filter(|(start, end)| end > start);

    let immediate_vest = (counts.preferred > 0 && grant.vesting_window().is_none())
        || (counts.stock_units() > 0 && grant.vesting_window().is_none() && counts.options() == 0);
    if immediate_vest {
        let month = first_of_month(grant.grant_date);
        if month >= start_month {
            return vec![(month, fair.total)];
        }
        // already expensed historically
        return Vec::new();
    }

    match window {
        Some((start, end)) => {
            if months_between(start, end) == 0 {
                // window shorter than a whole month: recognize up front
                let month = first_of_month(start);
                if month >= start_month {
                    return vec![(month, fair.total)];
                }
                return Vec::new();
            }
            let months = months_in_window(start, end);
            let periods = months.len() as u32;
            months
                .into_iter()
                .enumerate()
                .filter(|(_, month)| *month >= start_month)
                .map(|(idx, month)| (month, month_allocation(fair.total, idx as u32 + 1, periods)))
                .collect()
        }
        None => {
            // no usable schedule: treat as immediate in the grant month
            let month = first_of_month(grant.grant_date);
            if month >= start_month {
                return vec![(month, fair.total)];
            }
            Vec::new()
        }
    }
}

/// Last month a grant recognizes expense in.
fn terminal_month(grant: &EquityGrant) -> NaiveDate {
    let counts = grant.bucket_counts();
    if counts.preferred > 0 && grant.vesting_window().is_none() {
        return first_of_month(grant.grant_date);
    }
    match grant.vesting_end {
        Some(end) => first_of_month(end),
        None => first_of_month(grant.grant_date),
    }
}

fn option_warnings(company: &Company, grant: &EquityGrant, warnings: &mut Vec<String>) {
    let counts = grant.bucket_counts();
    if counts.options() == 0 {
        return;
    }
    if company.current_share_price <= Money::ZERO {
        warnings.push(format!(
            "grant {}: option expense suppressed (share price is zero)",
            grant.id
        ));
    } else if company.volatility <= Money::ZERO {
        warnings.push(format!(
            "grant {}: option expense suppressed (volatility is zero)",
            grant.id
        ));
    }
}

// ---------------------------------------------------------------------------
// Reports
// ---------------------------------------------------------------------------

/// Per-grant monthly expense schedule.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GrantExpenseOutput {
    pub employee_unique_id: String,
    pub grant_id: GrantId,
    pub stock_class: String,
    pub start_month: NaiveDate,
    pub end_month: NaiveDate,
    pub total_fair_value: Money,
    pub option_component: Money,
    pub stock_component: Money,
    pub months: Vec<MonthlyExpense>,
    pub grand_total: Money,
}

/// Straight-line schedule for one grant from the current month through its
/// terminal month. Months before the current month are omitted from the
/// spread, not shifted forward.
pub fn grant_monthly_expense(
    company: &Company,
    grant: &EquityGrant,
    stock_class_name: &str,
    as_of: NaiveDate,
) -> EquityResult<ComputationOutput<GrantExpenseOutput>> {
    let start = Instant::now();
    let mut warnings = Vec::new();
    option_warnings(company, grant, &mut warnings);

    let start_month = first_of_month(as_of);
    let end_month = terminal_month(grant);
    let fair = total_fair_value(company, grant, as_of);

    let allocated: BTreeMap<NaiveDate, Money> =
        allocate_grant(company, grant, start_month, as_of)
            .into_iter()
            .collect();

    if grant
        .vesting_start
        .map(first_of_month)
        .is_some_and(|m| m < start_month)
    {
        warnings.push(
            "vesting began before the reporting window; earlier months are already expensed"
                .to_string(),
        );
    }

    let mut months = Vec::new();
    let mut grand_total = Money::ZERO;
    let mut month = start_month;
    while month <= end_month {
        let expense = allocated.get(&month).copied().unwrap_or(Money::ZERO);
        grand_total += expense;
        months.push(MonthlyExpense { month, expense });
        month = add_months(month, 1);
    }

    let result = GrantExpenseOutput {
        employee_unique_id: grant.employee_id.clone(),
        grant_id: grant.id,
        stock_class: stock_class_name.to_string(),
        start_month,
        end_month,
        total_fair_value: fair.total,
        option_component: fair.option_component,
        stock_component: fair.stock_component,
        months,
        grand_total: grand_total.round_dp(2),
    };

    Ok(with_metadata(
        "Straight-Line Expense Amortization (Single Grant)",
        &serde_json::json!({
            "as_of": as_of,
            "fmv": company.current_share_price,
            "risk_free_rate": company.risk_free_rate,
            "volatility": company.volatility,
        }),
        warnings,
        start.elapsed().as_micros() as u64,
        result,
    ))
}

/// Company-wide monthly roll-up.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompanyExpenseOutput {
    pub company: String,
    pub start_month: NaiveDate,
    pub end_month: NaiveDate,
    pub months: Vec<MonthlyExpense>,
    pub grand_total: Money,
}

/// Fold every grant's allocation into one month-keyed series, from the
/// current month through the latest terminal month across grants. Months
/// with no recognition appear as explicit zero rows.
pub fn company_monthly_expense(
    company: &Company,
    grants: &[EquityGrant],
    as_of: NaiveDate,
) -> EquityResult<ComputationOutput<CompanyExpenseOutput>> {
    let start = Instant::now();
    let mut warnings = Vec::new();

    let start_month = first_of_month(as_of);
    let end_month = grants
        .iter()
        .map(terminal_month)
        .fold(start_month, NaiveDate::max);

    let mut totals: BTreeMap<NaiveDate, Money> = BTreeMap::new();
    for grant in grants {
        option_warnings(company, grant, &mut warnings);
        for (month, expense) in allocate_grant(company, grant, start_month, as_of) {
            *totals.entry(month).or_insert(Money::ZERO) += expense;
        }
    }

    let mut months = Vec::new();
    let mut grand_total = Money::ZERO;
    let mut month = start_month;
    while month <= end_month {
        let expense = totals
            .get(&month)
            .copied()
            .unwrap_or(Money::ZERO)
            .round_dp(2);
        grand_total += expense;
        months.push(MonthlyExpense { month, expense });
        month = add_months(month, 1);
    }

    let result = CompanyExpenseOutput {
        company: company.name.clone(),
        start_month,
        end_month,
        months,
        grand_total: grand_total.round_dp(2),
    };

    Ok(with_metadata(
        "Straight-Line Expense Amortization (Company Roll-Up)",
        &serde_json::json!({
            "as_of": as_of,
            "grants": grants.len(),
            "fmv": company.current_share_price,
            "risk_free_rate": company.risk_free_rate,
            "volatility": company.volatility,
        }),
        warnings,
        start.elapsed().as_micros() as u64,
        result,
    ))
}
