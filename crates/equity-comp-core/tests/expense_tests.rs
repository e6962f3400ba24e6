use chrono::NaiveDate;
use equity_comp_core::expense::{company_monthly_expense, grant_monthly_expense, total_fair_value};
use equity_comp_core::model::{Company, EquityGrant, GrantKind, VestingFrequency};
use equity_comp_core::types::Money;
use rust_decimal_macros::dec;

fn d(y: i32, m: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, day).unwrap()
}

fn company() -> Company {
    Company {
        id: 1,
        name: "Acme".into(),
        total_authorized_shares: 10_000_000,
        current_share_price: dec!(10.00),
        risk_free_rate: dec!(0.05),
        volatility: dec!(0.40),
    }
}

fn rsu_grant(id: u64, shares: u64, start: NaiveDate, end: NaiveDate) -> EquityGrant {
    EquityGrant {
        id,
        employee_id: "EMP-1".into(),
        stock_class_id: 1,
        kind: GrantKind::Rsu { shares },
        grant_date: start,
        vesting_start: Some(start),
        vesting_end: Some(end),
        vesting_frequency: VestingFrequency::Monthly,
        cliff_months: 0,
    }
}

// ===========================================================================
// Reconciliation
// ===========================================================================

#[test]
fn test_company_total_reconciles_with_per_grant_totals() {
    // two overlapping windows, both entirely in the future
    let company = company();
    let as_of = d(2025, 12, 1);
    let a = rsu_grant(1, 333, d(2026, 1, 1), d(2027, 7, 1));
    let b = rsu_grant(2, 1007, d(2026, 9, 1), d(2028, 3, 1));

    let fair_a = total_fair_value(&company, &a, as_of);
    let fair_b = total_fair_value(&company, &b, as_of);
    let rollup = company_monthly_expense(&company, &[a, b], as_of).unwrap();

    // 333 * 10.00 + 1007 * 10.00
    assert_eq!(fair_a.total, dec!(3330.00));
    assert_eq!(fair_b.total, dec!(10070.00));
    assert_eq!(rollup.result.grand_total, fair_a.total + fair_b.total);
}

#[test]
fn test_monthly_rows_add_per_grant_contributions() {
    let company = company();
    let as_of = d(2025, 12, 1);
    let a = rsu_grant(1, 120, d(2026, 1, 1), d(2026, 7, 1));
    let b = rsu_grant(2, 240, d(2026, 3, 1), d(2026, 10, 1));

    let only_a = grant_monthly_expense(&company, &a, "Class A", as_of).unwrap();
    let only_b = grant_monthly_expense(&company, &b, "Class A", as_of).unwrap();
    let rollup = company_monthly_expense(&company, &[a, b], as_of).unwrap();

    for row in &rollup.result.months {
        let from_a = only_a
            .result
            .months
            .iter()
            .find(|m| m.month == row.month)
            .map(|m| m.expense)
            .unwrap_or(Money::ZERO);
        let from_b = only_b
            .result
            .months
            .iter()
            .find(|m| m.month == row.month)
            .map(|m| m.expense)
            .unwrap_or(Money::ZERO);
        assert_eq!(row.expense, from_a + from_b, "month {}", row.month);
    }
}

#[test]
fn test_emitted_cents_reconstruct_the_total_exactly() {
    // 9970.00 over a 23-month window (24 labels) does not divide evenly
    let company = company();
    let grant = rsu_grant(1, 997, d(2026, 1, 15), d(2027, 12, 15));
    let output = grant_monthly_expense(&company, &grant, "Class A", d(2025, 12, 1)).unwrap();
    let emitted: Money = output.result.months.iter().map(|m| m.expense).sum();
    assert_eq!(emitted, dec!(9970.00));
    assert_eq!(output.result.grand_total, dec!(9970.00));
}

// ===========================================================================
// Recognition windows
// ===========================================================================

#[test]
fn test_historical_months_stay_expensed() {
    // 24-month window, 25 labels, 2400.00 total -> 96.00 per label exactly
    let company = company();
    let grant = rsu_grant(1, 240, d(2024, 1, 1), d(2026, 1, 1));
    let output = grant_monthly_expense(&company, &grant, "Class A", d(2025, 2, 1)).unwrap();
    // labels Feb 2025 .. Jan 2026 remain: 12 of 25
    assert_eq!(output.result.months.len(), 12);
    assert!(output.result.months.iter().all(|m| m.expense == dec!(96.00)));
    assert_eq!(output.result.grand_total, dec!(1152.00));
    assert!(output.warnings.iter().any(|w| w.contains("already expensed")));
}

#[test]
fn test_stock_without_window_posts_in_grant_month() {
    let company = company();
    let grant = EquityGrant {
        kind: GrantKind::Common { shares: 100, purchase_price: dec!(1.00) },
        grant_date: d(2026, 4, 20),
        vesting_start: None,
        vesting_end: None,
        ..rsu_grant(1, 100, d(2026, 4, 20), d(2026, 4, 20))
    };
    let output = grant_monthly_expense(&company, &grant, "Class A", d(2026, 1, 1)).unwrap();
    // expense books at FMV, not the purchase price
    let april = output
        .result
        .months
        .iter()
        .find(|m| m.month == d(2026, 4, 1))
        .unwrap();
    assert_eq!(april.expense, dec!(1000.00));
    assert_eq!(output.result.grand_total, dec!(1000.00));
}

#[test]
fn test_company_window_runs_to_latest_terminal_month() {
    let company = company();
    let short = rsu_grant(1, 120, d(2026, 1, 1), d(2026, 7, 1));
    let long = rsu_grant(2, 240, d(2026, 1, 1), d(2027, 7, 1));
    let output = company_monthly_expense(&company, &[short, long], d(2025, 12, 1)).unwrap();
    assert_eq!(output.result.start_month, d(2025, 12, 1));
    assert_eq!(output.result.end_month, d(2027, 7, 1));
    // Dec 2025 precedes both windows and shows as an explicit zero
    assert_eq!(output.result.months[0].expense, Money::ZERO);
}

#[test]
fn test_option_grant_expense_suppressed_when_unpriceable() {
    let mut company = company();
    company.volatility = Money::ZERO;
    let grant = EquityGrant {
        kind: GrantKind::Iso { shares: 1000, strike_price: dec!(2.50) },
        ..rsu_grant(1, 1000, d(2026, 1, 1), d(2028, 1, 1))
    };
    let output = grant_monthly_expense(&company, &grant, "Class A", d(2025, 12, 1)).unwrap();
    assert_eq!(output.result.total_fair_value, Money::ZERO);
    assert_eq!(output.result.grand_total, Money::ZERO);
    assert!(output.warnings.iter().any(|w| w.contains("volatility")));
}
