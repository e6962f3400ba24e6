//! Cap table with Black-Scholes option-expense columns.
//!
//! Column math mirrors the expense engine but is deliberately its own
//! path: the per-option value is rounded to 6 dp before multiplying, and
//! the option column is not suppressed for zero volatility (the pricing
//! guards already degrade it to discounted intrinsic value).

use std::time::Instant;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::calendar::month_span;
use crate::captable::join_grant;
use crate::model::company::ownership_pct;
use crate::model::{Company, Employee, EquityGrant, Series, StockClass};
use crate::pricing::black_scholes::{bso_value_per_option, money_from_f64};
use crate::types::{with_metadata_f64, ComputationOutput, Money, Rate, ShareCount};
use crate::vesting::{remaining_vesting_months, total_vesting_months, vesting_status};
use crate::EquityResult;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OptionsCapTableRow {
    pub unique_id: String,
    pub name: String,
    pub stock_class: String,
    pub isos: ShareCount,
    pub nqos: ShareCount,
    pub rsus: ShareCount,
    pub common_shares: ShareCount,
    pub preferred_shares: ShareCount,
    pub total_shares: ShareCount,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub strike_price: Option<Money>,
    pub ownership_pct: Decimal,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vesting_start: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vesting_end: Option<NaiveDate>,
    pub cliff_months: u32,
    pub total_vesting_months: u32,
    pub remaining_vesting_months: u32,
    pub vesting_status: String,
    pub current_share_price: Money,
    pub risk_free_rate: Rate,
    pub volatility: Rate,
    /// Black-Scholes value of one option, 6 dp. Strike-less rows price at
    /// FMV via the zero-strike guard.
    pub bso_value_per_option: Money,
    pub black_scholes_iso_expense: Money,
    pub total_expense: Money,
    pub annual_expense: Money,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OptionsCapTableOutput {
    pub market_cap: ShareCount,
    pub rows: Vec<OptionsCapTableRow>,
}

/// Build the option-expense cap table over every grant of the company.
pub fn build_options_cap_table(
    company: &Company,
    series: &[Series],
    classes: &[StockClass],
    employees: &[Employee],
    grants: &[EquityGrant],
    as_of: NaiveDate,
) -> EquityResult<ComputationOutput<OptionsCapTableOutput>> {
    let start = Instant::now();
    let mut warnings = Vec::new();

    let cap = company.total_authorized_shares;
    if cap == 0 {
        warnings.push("company has no authorized shares; ownership percentages are zero".into());
    }
    if company.volatility <= Money::ZERO {
        warnings.push(
            "volatility is zero; option values fall back to discounted intrinsic value".into(),
        );
    }

    let fmv = company.current_share_price;
    let mut rows = Vec::with_capacity(grants.len());
    for grant in grants {
        let join = join_grant(grant, series, classes, employees)?;
        let counts = grant.bucket_counts();

        let bso = money_from_f64(bso_value_per_option(
            company,
            grant.kind.strike_price(),
            grant.vesting_end,
            as_of,
        ))
        .round_dp(6);
        let iso_expense = (Decimal::from(counts.options()) * bso).round_dp(2);
        let total_expense =
            (iso_expense + fmv * Decimal::from(counts.stock_units())).round_dp(2);

        let windowed = counts.preferred == 0 && grant.vesting_window().is_some();
        let (total_months, remaining_months, cliff) = if windowed {
            (
                total_vesting_months(grant),
                remaining_vesting_months(grant, as_of),
                grant.cliff_months,
            )
        } else {
            (0, 0, 0)
        };

        rows.push(OptionsCapTableRow {
            unique_id: join.employee.unique_id.clone(),
            name: join.employee.name.clone(),
            stock_class: join.stock_class.name.clone(),
            isos: counts.iso,
            nqos: counts.nqo,
            rsus: counts.rsu,
            common_shares: counts.common,
            preferred_shares: counts.preferred,
            total_shares: grant.num_shares(),
            strike_price: grant.kind.strike_price(),
            ownership_pct: ownership_pct(grant.num_shares(), cap),
            vesting_start: grant.vesting_start,
            vesting_end: grant.vesting_end,
            cliff_months: cliff,
            total_vesting_months: total_months,
            remaining_vesting_months: remaining_months,
            vesting_status: vesting_status(grant, as_of).to_string(),
            current_share_price: fmv,
            risk_free_rate: company.risk_free_rate,
            volatility: company.volatility,
            bso_value_per_option: bso,
            black_scholes_iso_expense: iso_expense,
            total_expense,
            annual_expense: annual_expense(grant, total_expense),
        });
    }

    Ok(with_metadata_f64(
        "Black-Scholes Cap Table",
        &serde_json::json!({
            "as_of": as_of,
            "company": company.name,
            "grants": grants.len(),
            "fmv": fmv,
            "risk_free_rate": company.risk_free_rate,
            "volatility": company.volatility,
        }),
        warnings,
        start.elapsed().as_micros() as u64,
        OptionsCapTableOutput { market_cap: cap, rows },
    ))
}

/// Annualized expense: total over the window length in years. The window
/// length here is the raw calendar-month span (days ignored); spans under a
/// year annualize upward.
fn annual_expense(grant: &EquityGrant, total: Money) -> Money {
    let window = grant.vesting_window().filter(|(start, end)| end > start);
    let preferred = grant.bucket_counts().preferred > 0;
    let Some((start, end)) = window else {
        return total;
    };
    if preferred {
        return total;
    }
    let months = month_span(start, end);
    let years = if months > 0 {
        Decimal::from(months) / dec!(12)
    } else {
        Decimal::ONE
    };
    (total / years).round_dp(2)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{GrantKind, ShareType, VestingFrequency};

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn fixture() -> (Company, Vec<Series>, Vec<StockClass>, Vec<Employee>) {
        let company = Company {
            id: 1,
            name: "Acme".into(),
            total_authorized_shares: 1_000_000,
            current_share_price: dec!(10.00),
            risk_free_rate: dec!(0.05),
            volatility: dec!(0.40),
        };
        let series = vec![Series {
            id: 1,
            company_id: 1,
            name: "Common".into(),
            share_type: ShareType::Common,
        }];
        let classes = vec![StockClass {
            id: 1,
            company_id: 1,
            series_id: 1,
            name: "Class A Common".into(),
            share_type: ShareType::Common,
            total_class_shares: 600_000,
        }];
        let employees = vec![Employee {
            unique_id: "EMP-1".into(),
            name: "Dana".into(),
            company_id: 1,
        }];
        (company, series, classes, employees)
    }

    fn iso_grant(shares: ShareCount) -> EquityGrant {
        EquityGrant {
            id: 1,
            employee_id: "EMP-1".into(),
            stock_class_id: 1,
            kind: GrantKind::Iso { shares, strike_price: dec!(2.50) },
            grant_date: d(2024, 1, 1),
            vesting_start: Some(d(2024, 1, 1)),
            vesting_end: Some(d(2025, 1, 1)),
            vesting_frequency: VestingFrequency::Monthly,
            cliff_months: 0,
        }
    }

    #[test]
    fn test_expired_horizon_prices_at_intrinsic() {
        let (company, series, classes, employees) = fixture();
        // as_of past vesting_end: T = 0, bso = max(10 - 2.50, 0)
        let output = build_options_cap_table(
            &company, &series, &classes, &employees, &[iso_grant(1000)], d(2025, 6, 1),
        )
        .unwrap();
        let row = &output.result.rows[0];
        assert_eq!(row.bso_value_per_option, dec!(7.500000));
        assert_eq!(row.black_scholes_iso_expense, dec!(7500.00));
        assert_eq!(row.total_expense, dec!(7500.00));
        // 12-month window -> one year -> annual equals total
        assert_eq!(row.annual_expense, dec!(7500.00));
        assert_eq!(row.vesting_status, "Fully Vested");
    }

    #[test]
    fn test_live_option_value_stays_within_bounds() {
        let (company, series, classes, employees) = fixture();
        let output = build_options_cap_table(
            &company, &series, &classes, &employees, &[iso_grant(1000)], d(2024, 7, 1),
        )
        .unwrap();
        let row = &output.result.rows[0];
        // above intrinsic, below spot
        assert!(row.bso_value_per_option > dec!(7.50));
        assert!(row.bso_value_per_option < dec!(10.00));
        assert_eq!(row.total_vesting_months, 12);
        assert_eq!(row.remaining_vesting_months, 6);
    }

    #[test]
    fn test_strike_less_rows_price_at_fmv() {
        let (company, series, classes, employees) = fixture();
        let grant = EquityGrant {
            kind: GrantKind::Rsu { shares: 300 },
            vesting_start: Some(d(2026, 1, 15)),
            vesting_end: Some(d(2027, 7, 20)),
            ..iso_grant(300)
        };
        let output = build_options_cap_table(
            &company, &series, &classes, &employees, &[grant], d(2025, 6, 1),
        )
        .unwrap();
        let row = &output.result.rows[0];
        // zero-strike guard: the "option" value is just the share price
        assert_eq!(row.bso_value_per_option, dec!(10.000000));
        // but no option shares, so the expense is all stock
        assert_eq!(row.black_scholes_iso_expense, dec!(0.00));
        assert_eq!(row.total_expense, dec!(3000.00));
        // 18-month raw span -> 1.5 years -> 3000 / 1.5
        assert_eq!(row.annual_expense, dec!(2000.00));
    }

    #[test]
    fn test_preferred_annualizes_to_full_total() {
        let (company, series, classes, employees) = fixture();
        let mut series = series;
        let mut classes = classes;
        series.push(Series {
            id: 2,
            company_id: 1,
            name: "Series A".into(),
            share_type: ShareType::Preferred,
        });
        classes.push(StockClass {
            id: 2,
            company_id: 1,
            series_id: 2,
            name: "Series A Preferred".into(),
            share_type: ShareType::Preferred,
            total_class_shares: 100_000,
        });
        let grant = EquityGrant {
            stock_class_id: 2,
            kind: GrantKind::Preferred { shares: 500, purchase_price: dec!(4.00) },
            vesting_start: None,
            vesting_end: None,
            ..iso_grant(500)
        };
        let output = build_options_cap_table(
            &company, &series, &classes, &employees, &[grant], d(2025, 6, 1),
        )
        .unwrap();
        let row = &output.result.rows[0];
        assert_eq!(row.total_expense, dec!(5000.00));
        assert_eq!(row.annual_expense, dec!(5000.00));
        assert_eq!(row.cliff_months, 0);
        assert_eq!(row.vesting_status, "Preferred Shares (Immediate Vest)");
    }
}
