//! Closed-form European call pricing.
//!
//! Runs in f64 (precision tag `ieee754_f64`), unlike the Decimal money
//! math elsewhere: the erf/ln/exp chain has no exact decimal form and
//! sub-cent noise is irrelevant at option-expense scale.

use std::time::Instant;

use chrono::NaiveDate;
use rust_decimal::prelude::{FromPrimitive, ToPrimitive};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use statrs::function::erf::erf;

use crate::model::Company;
use crate::types::{with_metadata_f64, ComputationOutput};
use crate::{EquityError, EquityResult};

/// Standard normal CDF via the error function.
pub fn normal_cdf(x: f64) -> f64 {
    0.5 * (1.0 + erf(x / std::f64::consts::SQRT_2))
}

/// Black-Scholes price of a European call.
///
/// The degenerate guards run in this order; each earlier condition
/// subsumes domain errors in the later math (ln of non-positive spot/strike,
/// division by zero time or volatility):
/// 1. `spot <= 0` -> worthless
/// 2. `strike <= 0` -> exercise is free, the call is the stock
/// 3. `t <= 0` -> intrinsic value
/// 4. `sigma <= 0` -> discounted intrinsic value
pub fn bs_call_price(spot: f64, strike: f64, t: f64, rate: f64, sigma: f64) -> f64 {
    if spot <= 0.0 {
        return 0.0;
    }
    if strike <= 0.0 {
        return spot;
    }
    if t <= 0.0 {
        return (spot - strike).max(0.0);
    }
    if sigma <= 0.0 {
        return (spot - strike * (-rate * t).exp()).max(0.0);
    }
    let sqrt_t = t.sqrt();
    let d1 = ((spot / strike).ln() + (rate + 0.5 * sigma * sigma) * t) / (sigma * sqrt_t);
    let d2 = d1 - sigma * sqrt_t;
    spot * normal_cdf(d1) - strike * (-rate * t).exp() * normal_cdf(d2)
}

/// Years from `as_of` to a vesting horizon on an Act/365 count, floored at
/// zero. No horizon means the option is priced at intrinsic value.
pub fn years_to_horizon(as_of: NaiveDate, horizon: Option<NaiveDate>) -> f64 {
    match horizon {
        Some(h) => (h - as_of).num_days().max(0) as f64 / 365.0,
        None => 0.0,
    }
}

/// Per-option Black-Scholes value for a grant against its company's pricing
/// context. Strike-less grants hit the `strike <= 0` guard and price at FMV.
pub fn bso_value_per_option(
    company: &Company,
    strike_price: Option<Decimal>,
    vesting_end: Option<NaiveDate>,
    as_of: NaiveDate,
) -> f64 {
    let spot = dec_to_f64(company.current_share_price);
    let strike = dec_to_f64(strike_price.unwrap_or(Decimal::ZERO));
    let t = years_to_horizon(as_of, vesting_end);
    let rate = dec_to_f64(company.risk_free_rate);
    let sigma = dec_to_f64(company.volatility);
    bs_call_price(spot, strike, t, rate, sigma)
}

pub(crate) fn dec_to_f64(value: Decimal) -> f64 {
    value.to_f64().unwrap_or(0.0)
}

pub(crate) fn money_from_f64(value: f64) -> Decimal {
    Decimal::from_f64(value).unwrap_or(Decimal::ZERO)
}

// ---------------------------------------------------------------------------
// Standalone pricer
// ---------------------------------------------------------------------------

/// Input for the standalone call pricer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BsPriceInput {
    /// Current share price (spot).
    pub spot: f64,
    /// Exercise price.
    pub strike: f64,
    /// Time to expiry in years.
    pub time_to_expiry: f64,
    /// Annualized risk-free rate as a decimal.
    pub risk_free_rate: f64,
    /// Annualized volatility as a decimal.
    pub volatility: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BsPriceOutput {
    pub call_price: f64,
    pub intrinsic_value: f64,
    pub time_value: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub d1: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub d2: Option<f64>,
}

/// Price a European call with the full output envelope.
pub fn price_call(input: &BsPriceInput) -> EquityResult<ComputationOutput<BsPriceOutput>> {
    let start = Instant::now();

    for (field, value) in [
        ("spot", input.spot),
        ("strike", input.strike),
        ("time_to_expiry", input.time_to_expiry),
        ("risk_free_rate", input.risk_free_rate),
        ("volatility", input.volatility),
    ] {
        if !value.is_finite() {
            return Err(EquityError::InvalidInput {
                field: field.into(),
                reason: "must be a finite number".into(),
            });
        }
    }

    let mut warnings = Vec::new();
    if input.spot <= 0.0 {
        warnings.push("spot <= 0; the call is worthless".to_string());
    } else if input.strike <= 0.0 {
        warnings.push("strike <= 0; the call prices at spot".to_string());
    } else if input.time_to_expiry <= 0.0 {
        warnings.push("time_to_expiry <= 0; priced at intrinsic value".to_string());
    } else if input.volatility <= 0.0 {
        warnings.push("volatility <= 0; priced at discounted intrinsic value".to_string());
    }

    let call_price = bs_call_price(
        input.spot,
        input.strike,
        input.time_to_expiry,
        input.risk_free_rate,
        input.volatility,
    );
    let intrinsic_value = (input.spot - input.strike).max(0.0);

    let formula_path = input.spot > 0.0
        && input.strike > 0.0
        && input.time_to_expiry > 0.0
        && input.volatility > 0.0;
    let (d1, d2) = if formula_path {
        let sqrt_t = input.time_to_expiry.sqrt();
        let d1 = ((input.spot / input.strike).ln()
            + (input.risk_free_rate + 0.5 * input.volatility * input.volatility)
                * input.time_to_expiry)
            / (input.volatility * sqrt_t);
        (Some(d1), Some(d1 - input.volatility * sqrt_t))
    } else {
        (None, None)
    };

    Ok(with_metadata_f64(
        "Black-Scholes Closed Form (European Call)",
        &input,
        warnings,
        start.elapsed().as_micros() as u64,
        BsPriceOutput {
            call_price,
            intrinsic_value,
            time_value: (call_price - intrinsic_value).max(0.0),
            d1,
            d2,
        },
    ))
}
