use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::types::{CompanyId, Money, Rate, SeriesId, ShareCount, StockClassId};

/// Share classification carried by both a series and its stock classes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ShareType {
    Common,
    Preferred,
}

impl std::fmt::Display for ShareType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ShareType::Common => write!(f, "COMMON"),
            ShareType::Preferred => write!(f, "PREFERRED"),
        }
    }
}

/// Issuer-level pricing and capacity context.
///
/// `current_share_price` is the fair market value used for RSU valuation and
/// as the Black-Scholes spot; `total_authorized_shares` caps the sum of all
/// stock-class sizes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Company {
    pub id: CompanyId,
    pub name: String,
    pub total_authorized_shares: ShareCount,
    pub current_share_price: Money,
    /// Annualized risk-free rate as a decimal (0.05 = 5%).
    pub risk_free_rate: Rate,
    /// Annualized volatility as a decimal (0.40 = 40%).
    pub volatility: Rate,
}

/// Company parameters as submitted (fixture files, provisioning calls).
/// The store assigns the id.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompanyDraft {
    pub name: String,
    pub total_authorized_shares: ShareCount,
    pub current_share_price: Money,
    #[serde(default)]
    pub risk_free_rate: Rate,
    #[serde(default)]
    pub volatility: Rate,
}

/// A grant holder. Identity only; authn/roles live outside this engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Employee {
    /// External key used on grants and reports.
    pub unique_id: String,
    pub name: String,
    pub company_id: CompanyId,
}

/// A named series (e.g. "Series A"), the umbrella above stock classes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Series {
    pub id: SeriesId,
    pub company_id: CompanyId,
    pub name: String,
    pub share_type: ShareType,
}

/// A pool of same-type shares within a series, sized by `total_class_shares`.
///
/// `share_type` always mirrors the owning series; the store enforces the
/// mirror on create and update.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StockClass {
    pub id: StockClassId,
    pub company_id: CompanyId,
    pub series_id: SeriesId,
    pub name: String,
    pub share_type: ShareType,
    pub total_class_shares: ShareCount,
}

impl StockClass {
    /// Shares already granted out of this class.
    pub fn shares_allocated(&self, grants: &[crate::model::EquityGrant]) -> ShareCount {
        grants
            .iter()
            .filter(|g| g.stock_class_id == self.id)
            .map(|g| g.num_shares())
            .sum()
    }

    /// Headroom left in this class, floored at zero.
    pub fn shares_remaining(&self, grants: &[crate::model::EquityGrant]) -> ShareCount {
        self.total_class_shares
            .saturating_sub(self.shares_allocated(grants))
    }
}

/// Ownership share of the authorized pool, as a percentage rounded to 2 dp.
/// Zero when the company has no authorized shares.
pub fn ownership_pct(shares: ShareCount, total_authorized: ShareCount) -> Decimal {
    if total_authorized == 0 {
        return Decimal::ZERO;
    }
    (Decimal::from(shares) / Decimal::from(total_authorized) * Decimal::from(100)).round_dp(2)
}
