use chrono::{NaiveDate, Utc};
use clap::Args;
use serde_json::Value;

use equity_comp_core::types::GrantId;
use equity_comp_core::valuation::grant_detail;
use equity_comp_core::vesting::vesting_schedule;

use crate::input::fixture;

/// Arguments for the vesting schedule of one grant
#[derive(Args)]
pub struct VestingScheduleArgs {
    /// Path to a company snapshot file (JSON or YAML)
    #[arg(long)]
    pub input: Option<String>,

    /// Grant id (grants are numbered 1.. in file order)
    #[arg(long)]
    pub grant: GrantId,
}

/// Arguments for the grant detail record
#[derive(Args)]
pub struct GrantDetailArgs {
    /// Path to a company snapshot file (JSON or YAML)
    #[arg(long)]
    pub input: Option<String>,

    /// Grant id (grants are numbered 1.. in file order)
    #[arg(long)]
    pub grant: GrantId,

    /// Report date (YYYY-MM-DD); defaults to today
    #[arg(long)]
    pub as_of: Option<NaiveDate>,
}

pub fn run_vesting_schedule(
    args: VestingScheduleArgs,
) -> Result<Value, Box<dyn std::error::Error>> {
    let loaded = fixture::load(args.input.as_deref(), None)?;
    let grant = loaded.grant(args.grant)?;
    let schedule = vesting_schedule(grant);
    Ok(serde_json::json!({
        "grant_id": grant.id,
        "employee_unique_id": grant.employee_id,
        "vesting_frequency": grant.vesting_frequency.to_string(),
        "events": schedule.len(),
        "schedule": schedule,
    }))
}

pub fn run_grant_detail(args: GrantDetailArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let loaded = fixture::load(args.input.as_deref(), None)?;
    let as_of = args.as_of.unwrap_or_else(|| Utc::now().date_naive());
    let grant = loaded.grant(args.grant)?;
    let (employee, stock_class, series) = loaded.join(grant)?;
    let detail = grant_detail(&loaded.company, employee, series, stock_class, grant, as_of);
    Ok(serde_json::to_value(detail)?)
}
