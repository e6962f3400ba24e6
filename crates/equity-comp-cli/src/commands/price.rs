use clap::Args;
use serde_json::Value;

use equity_comp_core::pricing::{price_call, BsPriceInput};

use crate::input;

/// Arguments for the standalone call pricer
#[derive(Args)]
#[command(allow_hyphen_values = true)]
pub struct BsPriceArgs {
    /// Current share price (spot)
    #[arg(long)]
    pub spot: Option<f64>,

    /// Exercise price
    #[arg(long)]
    pub strike: Option<f64>,

    /// Time to expiry in years
    #[arg(long, alias = "years")]
    pub time_to_expiry: Option<f64>,

    /// Annualized risk-free rate (e.g. 0.05 for 5%)
    #[arg(long, alias = "rate")]
    pub risk_free_rate: Option<f64>,

    /// Annualized volatility (e.g. 0.40 for 40%)
    #[arg(long, alias = "vol")]
    pub volatility: Option<f64>,

    /// Path to a JSON/YAML input file (overrides individual flags)
    #[arg(long)]
    pub input: Option<String>,
}

pub fn run_bs_price(args: BsPriceArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let price_input: BsPriceInput = if let Some(ref path) = args.input {
        input::file::read_typed(path)?
    } else if let Some(data) = input::stdin::read_stdin()? {
        serde_json::from_value(data)?
    } else {
        BsPriceInput {
            spot: args.spot.ok_or("--spot is required (or provide --input)")?,
            strike: args.strike.ok_or("--strike is required (or provide --input)")?,
            time_to_expiry: args
                .time_to_expiry
                .ok_or("--time-to-expiry is required (or provide --input)")?,
            risk_free_rate: args
                .risk_free_rate
                .ok_or("--risk-free-rate is required (or provide --input)")?,
            volatility: args
                .volatility
                .ok_or("--volatility is required (or provide --input)")?,
        }
    };

    let output = price_call(&price_input)?;
    Ok(serde_json::to_value(output)?)
}
