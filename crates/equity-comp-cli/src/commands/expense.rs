use chrono::{NaiveDate, Utc};
use clap::Args;
use rust_decimal::Decimal;
use serde_json::Value;

use equity_comp_core::expense::{company_monthly_expense, grant_monthly_expense};
use equity_comp_core::types::GrantId;

use crate::input::fixture;

/// Arguments for the company expense roll-up
#[derive(Args)]
pub struct CompanyExpenseArgs {
    /// Path to a company snapshot file (JSON or YAML)
    #[arg(long)]
    pub input: Option<String>,

    /// Report date (YYYY-MM-DD); defaults to today
    #[arg(long)]
    pub as_of: Option<NaiveDate>,

    /// Override the company share price for this run
    #[arg(long)]
    pub share_price: Option<Decimal>,
}

/// Arguments for one grant's expense schedule
#[derive(Args)]
pub struct GrantExpenseArgs {
    /// Path to a company snapshot file (JSON or YAML)
    #[arg(long)]
    pub input: Option<String>,

    /// Grant id (grants are numbered 1.. in file order)
    #[arg(long)]
    pub grant: GrantId,

    /// Report date (YYYY-MM-DD); defaults to today
    #[arg(long)]
    pub as_of: Option<NaiveDate>,

    /// Override the company share price for this run
    #[arg(long)]
    pub share_price: Option<Decimal>,
}

pub fn run_company_expense(args: CompanyExpenseArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let loaded = fixture::load(args.input.as_deref(), args.share_price)?;
    let as_of = args.as_of.unwrap_or_else(|| Utc::now().date_naive());
    let output = company_monthly_expense(&loaded.company, &loaded.grants, as_of)?;
    Ok(serde_json::to_value(output)?)
}

pub fn run_grant_expense(args: GrantExpenseArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let loaded = fixture::load(args.input.as_deref(), args.share_price)?;
    let as_of = args.as_of.unwrap_or_else(|| Utc::now().date_naive());
    let grant = loaded.grant(args.grant)?;
    let class_name = loaded.stock_class_name(grant.stock_class_id)?;
    let output = grant_monthly_expense(&loaded.company, grant, class_name, as_of)?;
    Ok(serde_json::to_value(output)?)
}
