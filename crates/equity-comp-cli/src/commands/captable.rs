use chrono::{NaiveDate, Utc};
use clap::Args;
use rust_decimal::Decimal;
use serde_json::Value;

use equity_comp_core::captable::{build_cap_table, build_options_cap_table};

use crate::input::fixture;

/// Arguments for the ownership cap table
#[derive(Args)]
pub struct CaptableArgs {
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

/// Arguments for the Black-Scholes cap table
#[derive(Args)]
pub struct OptionsCaptableArgs {
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

pub fn run_captable(args: CaptableArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let loaded = fixture::load(args.input.as_deref(), args.share_price)?;
    let as_of = args.as_of.unwrap_or_else(|| Utc::now().date_naive());
    let output = build_cap_table(
        &loaded.company,
        &loaded.series,
        &loaded.stock_classes,
        &loaded.employees,
        &loaded.grants,
        as_of,
    )?;
    Ok(serde_json::to_value(output)?)
}

pub fn run_options_captable(
    args: OptionsCaptableArgs,
) -> Result<Value, Box<dyn std::error::Error>> {
    let loaded = fixture::load(args.input.as_deref(), args.share_price)?;
    let as_of = args.as_of.unwrap_or_else(|| Utc::now().date_naive());
    let output = build_options_cap_table(
        &loaded.company,
        &loaded.series,
        &loaded.stock_classes,
        &loaded.employees,
        &loaded.grants,
        as_of,
    )?;
    Ok(serde_json::to_value(output)?)
}
