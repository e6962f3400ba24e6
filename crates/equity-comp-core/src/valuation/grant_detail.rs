//! The full per-grant record shown to a holder: identity, position,
//! vesting progress, and dollar values in one flat struct.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::model::{Company, Employee, EquityGrant, Series, StockClass, VestingFrequency};
use crate::types::{GrantId, Money, ShareCount};
use crate::valuation::grant_value::{per_period_value, shares_per_period, vested_value, BucketPrices};
use crate::vesting::{
    months_since_vesting_start, remaining_vesting_months, total_vesting_months, unvested_shares,
    vested_shares, vesting_status,
};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GrantDetail {
    pub id: GrantId,
    pub unique_id: String,
    pub name: String,
    pub stock_class_name: String,
    pub series_name: String,

    pub num_shares: ShareCount,
    pub iso_shares: ShareCount,
    pub nqo_shares: ShareCount,
    pub rsu_shares: ShareCount,
    pub common_shares: ShareCount,
    pub preferred_shares: ShareCount,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub strike_price: Option<Money>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub purchase_price: Option<Money>,

    pub grant_date: NaiveDate,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vesting_start: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vesting_end: Option<NaiveDate>,
    pub vesting_frequency: VestingFrequency,
    /// The cliff parameter the grant was created with.
    pub cliff_months: u32,
    /// Whole months between today and `vesting_start`, order-agnostic.
    pub months_since_vesting_start: u32,

    pub shares_per_period: ShareCount,
    pub vested_shares: ShareCount,
    pub unvested_shares: ShareCount,
    pub vesting_period_months: u32,
    pub remaining_vesting_months: u32,
    pub vesting_status: String,

    /// Company FMV per share.
    pub fmv: Money,
    pub vested_value: Money,
    pub per_period_shares: ShareCount,
    pub per_period_value: Money,
}

/// Assemble the detail record for one grant. The caller resolves the joins
/// (employee, class, series); this stays a pure function of its inputs.
pub fn grant_detail(
    company: &Company,
    employee: &Employee,
    series: &Series,
    stock_class: &StockClass,
    grant: &EquityGrant,
    as_of: NaiveDate,
) -> GrantDetail {
    let counts = grant.bucket_counts();
    let prices = BucketPrices::for_grant(grant, company);
    let vested = vested_shares(grant, as_of);
    let per_period = shares_per_period(grant);

    GrantDetail {
        id: grant.id,
        unique_id: employee.unique_id.clone(),
        name: employee.name.clone(),
        stock_class_name: stock_class.name.clone(),
        series_name: series.name.clone(),
        num_shares: grant.num_shares(),
        iso_shares: counts.iso,
        nqo_shares: counts.nqo,
        rsu_shares: counts.rsu,
        common_shares: counts.common,
        preferred_shares: counts.preferred,
        strike_price: grant.kind.strike_price(),
        purchase_price: grant.kind.purchase_price(),
        grant_date: grant.grant_date,
        vesting_start: grant.vesting_start,
        vesting_end: grant.vesting_end,
        vesting_frequency: grant.vesting_frequency,
        cliff_months: grant.cliff_months,
        months_since_vesting_start: months_since_vesting_start(grant, as_of),
        shares_per_period: per_period,
        vested_shares: vested,
        unvested_shares: unvested_shares(grant, as_of),
        vesting_period_months: total_vesting_months(grant),
        remaining_vesting_months: remaining_vesting_months(grant, as_of),
        vesting_status: vesting_status(grant, as_of).to_string(),
        fmv: company.current_share_price,
        vested_value: vested_value(&counts, grant.num_shares(), vested, &prices),
        per_period_shares: per_period,
        per_period_value: per_period_value(grant, company),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{GrantKind, ShareType};
    use rust_decimal_macros::dec;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn fixture() -> (Company, Employee, Series, StockClass, EquityGrant) {
        let company = Company {
            id: 1,
            name: "Acme".into(),
            total_authorized_shares: 1_000_000,
            current_share_price: dec!(10.00),
            risk_free_rate: dec!(0.05),
            volatility: dec!(0.40),
        };
        let employee = Employee {
            unique_id: "EMP-1".into(),
            name: "Dana".into(),
            company_id: 1,
        };
        let series = Series {
            id: 1,
            company_id: 1,
            name: "Common".into(),
            share_type: ShareType::Common,
        };
        let stock_class = StockClass {
            id: 1,
            company_id: 1,
            series_id: 1,
            name: "Class A Common".into(),
            share_type: ShareType::Common,
            total_class_shares: 500_000,
        };
        let grant = EquityGrant {
            id: 9,
            employee_id: "EMP-1".into(),
            stock_class_id: 1,
            kind: GrantKind::Iso { shares: 1200, strike_price: dec!(2.50) },
            grant_date: d(2024, 1, 1),
            vesting_start: Some(d(2024, 1, 1)),
            vesting_end: Some(d(2026, 1, 1)),
            vesting_frequency: VestingFrequency::Monthly,
            cliff_months: 0,
        };
        (company, employee, series, stock_class, grant)
    }

    #[test]
    fn test_detail_at_halfway_point() {
        let (company, employee, series, stock_class, grant) = fixture();
        let detail = grant_detail(&company, &employee, &series, &stock_class, &grant, d(2025, 1, 1));

        assert_eq!(detail.unique_id, "EMP-1");
        assert_eq!(detail.series_name, "Common");
        assert_eq!(detail.iso_shares, 1200);
        assert_eq!(detail.vested_shares, 600);
        assert_eq!(detail.unvested_shares, 600);
        assert_eq!(detail.vesting_period_months, 24);
        assert_eq!(detail.remaining_vesting_months, 12);
        assert_eq!(detail.months_since_vesting_start, 12);
        assert_eq!(detail.vesting_status, "Partially Vested");
        // 600 vested ISOs at 2.50
        assert_eq!(detail.vested_value, dec!(1500.00));
        // 50 shares per month at 2.50
        assert_eq!(detail.shares_per_period, 50);
        assert_eq!(detail.per_period_value, dec!(125.00));
        assert_eq!(detail.fmv, dec!(10.00));
    }

    #[test]
    fn test_detail_keeps_cliff_parameter_and_live_months_apart() {
        let (company, employee, series, stock_class, mut grant) = fixture();
        grant.cliff_months = 6;
        let detail = grant_detail(&company, &employee, &series, &stock_class, &grant, d(2025, 7, 1));
        // the parameter does not drift with today
        assert_eq!(detail.cliff_months, 6);
        // the live measure does
        assert_eq!(detail.months_since_vesting_start, 18);
    }
}
