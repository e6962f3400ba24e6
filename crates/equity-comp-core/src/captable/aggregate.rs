//! Company-wide ownership cap table.

use std::time::Instant;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::captable::join_grant;
use crate::model::company::ownership_pct;
use crate::model::{Company, Employee, EquityGrant, Series, StockClass};
use crate::types::{with_metadata, ComputationOutput, Money, Rate, ShareCount};
use crate::vesting::{remaining_vesting_months, total_vesting_months, vesting_status};
use crate::EquityResult;

/// Per-class allocation summary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassAllocation {
    pub stock_class: String,
    pub allocated: ShareCount,
    pub remaining: ShareCount,
}

/// One grant in the cap table, joined with holder and class context.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CapTableRow {
    pub unique_id: String,
    pub name: String,
    pub stock_class: String,
    pub series_name: String,
    pub isos: ShareCount,
    pub nqos: ShareCount,
    pub rsus: ShareCount,
    pub common_shares: ShareCount,
    pub preferred_shares: ShareCount,
    pub total_shares: ShareCount,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub strike_price: Option<Money>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub purchase_price: Option<Money>,
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
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CapTableOutput {
    pub market_cap: ShareCount,
    pub allocated_market_cap: ShareCount,
    pub unallocated_market_cap: ShareCount,
    pub class_allocations: Vec<ClassAllocation>,
    pub rows: Vec<CapTableRow>,
}

/// Build the ownership cap table: authorized/allocated totals, per-class
/// headroom, and one row per grant.
pub fn build_cap_table(
    company: &Company,
    series: &[Series],
    classes: &[StockClass],
    employees: &[Employee],
    grants: &[EquityGrant],
    as_of: NaiveDate,
) -> EquityResult<ComputationOutput<CapTableOutput>> {
    let start = Instant::now();
    let mut warnings = Vec::new();

    let cap = company.total_authorized_shares;
    let allocated: ShareCount = grants.iter().map(|g| g.num_shares()).sum();
    if cap == 0 {
        warnings.push("company has no authorized shares; ownership percentages are zero".into());
    } else if allocated > cap {
        warnings.push(format!(
            "granted shares ({allocated}) exceed authorized total ({cap})"
        ));
    }

    let class_allocations = classes
        .iter()
        .map(|class| ClassAllocation {
            stock_class: class.name.clone(),
            allocated: class.shares_allocated(grants),
            remaining: class.shares_remaining(grants),
        })
        .collect();

    let mut rows = Vec::with_capacity(grants.len());
    for grant in grants {
        let join = join_grant(grant, series, classes, employees)?;
        let counts = grant.bucket_counts();

        // months and cliff report zero outside a live vesting window
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

        rows.push(CapTableRow {
            unique_id: join.employee.unique_id.clone(),
            name: join.employee.name.clone(),
            stock_class: join.stock_class.name.clone(),
            series_name: join.series.name.clone(),
            isos: counts.iso,
            nqos: counts.nqo,
            rsus: counts.rsu,
            common_shares: counts.common,
            preferred_shares: counts.preferred,
            total_shares: grant.num_shares(),
            strike_price: grant.kind.strike_price(),
            purchase_price: grant.kind.purchase_price(),
            ownership_pct: ownership_pct(grant.num_shares(), cap),
            vesting_start: grant.vesting_start,
            vesting_end: grant.vesting_end,
            cliff_months: cliff,
            total_vesting_months: total_months,
            remaining_vesting_months: remaining_months,
            vesting_status: vesting_status(grant, as_of).to_string(),
            current_share_price: company.current_share_price,
            risk_free_rate: company.risk_free_rate,
            volatility: company.volatility,
        });
    }

    let result = CapTableOutput {
        market_cap: cap,
        allocated_market_cap: allocated,
        unallocated_market_cap: cap.saturating_sub(allocated),
        class_allocations,
        rows,
    };

    Ok(with_metadata(
        "Cap Table Aggregation",
        &serde_json::json!({
            "as_of": as_of,
            "company": company.name,
            "grants": grants.len(),
            "stock_classes": classes.len(),
        }),
        warnings,
        start.elapsed().as_micros() as u64,
        result,
    ))
}
