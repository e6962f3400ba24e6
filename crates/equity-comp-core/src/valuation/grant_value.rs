//! Dollar values of vested and per-period share positions.

use rust_decimal::{Decimal, RoundingStrategy};

use crate::model::{BucketCounts, Company, EquityGrant};
use crate::types::{Money, ShareCount};
use crate::vesting::total_units;

/// Per-bucket unit prices for one grant; zero where the grant carries no
/// such price. RSUs are valued at the company FMV.
#[derive(Debug, Clone, Copy)]
pub struct BucketPrices {
    pub strike: Money,
    pub purchase: Money,
    pub fmv: Money,
}

impl BucketPrices {
    pub fn for_grant(grant: &EquityGrant, company: &Company) -> Self {
        BucketPrices {
            strike: grant.kind.strike_price().unwrap_or(Money::ZERO),
            purchase: grant.kind.purchase_price().unwrap_or(Money::ZERO),
            fmv: company.current_share_price,
        }
    }
}

/// Dollar value of the vested portion of a position.
///
/// The vested fraction is applied to each bucket and rounded half-up to
/// whole shares before pricing, so mixed legacy rows value every bucket at
/// its own price. Result rounded to cents (banker's).
pub fn vested_value(
    counts: &BucketCounts,
    num_shares: ShareCount,
    vested_total: ShareCount,
    prices: &BucketPrices,
) -> Money {
    if num_shares == 0 || vested_total == 0 {
        return Money::ZERO;
    }
    let frac = Decimal::from(vested_total) / Decimal::from(num_shares);
    let vested = |bucket: ShareCount| {
        (Decimal::from(bucket) * frac)
            .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
    };

    let options = vested(counts.iso) + vested(counts.nqo);
    let rsu = vested(counts.rsu);
    let stock = vested(counts.common) + vested(counts.preferred);

    (options * prices.strike + rsu * prices.fmv + stock * prices.purchase).round_dp(2)
}

/// Shares released per vesting unit: the full count for preferred,
/// `num_shares / total_units` (integer division) inside a window, else 0.
pub fn shares_per_period(grant: &EquityGrant) -> ShareCount {
    if grant.bucket_counts().preferred > 0 {
        return grant.num_shares();
    }
    match grant.vesting_window() {
        Some((start, end)) => {
            let units = total_units(start, end, grant.vesting_frequency);
            grant.num_shares() / units as ShareCount
        }
        None => 0,
    }
}

/// Dollar value of `shares` released in one period.
///
/// Single-bucket positions price at that bucket's price; mixed legacy rows
/// use the count-weighted average across the option/RSU/stock groups.
pub fn period_value(counts: &BucketCounts, shares: ShareCount, prices: &BucketPrices) -> Money {
    if shares == 0 {
        return Money::ZERO;
    }

    let options = Decimal::from(counts.options());
    let rsu = Decimal::from(counts.rsu);
    let stock = Decimal::from(counts.common + counts.preferred);

    let groups = [options, rsu, stock].iter().filter(|g| !g.is_zero()).count();
    let price = if groups <= 1 {
        if !options.is_zero() {
            prices.strike
        } else if !rsu.is_zero() {
            prices.fmv
        } else {
            prices.purchase
        }
    } else {
        let total = {
            let sum = options + rsu + stock;
            if sum.is_zero() { Decimal::ONE } else { sum }
        };
        (options * prices.strike + rsu * prices.fmv + stock * prices.purchase) / total
    };

    (Decimal::from(shares) * price).round_dp(2)
}

/// [`period_value`] for a grant against its company pricing context.
pub fn per_period_value(grant: &EquityGrant, company: &Company) -> Money {
    period_value(
        &grant.bucket_counts(),
        shares_per_period(grant),
        &BucketPrices::for_grant(grant, company),
    )
}
