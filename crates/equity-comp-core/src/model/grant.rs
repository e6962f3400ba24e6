use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::EquityError;
use crate::model::company::ShareType;
use crate::types::{GrantId, Money, ShareCount, StockClassId};
use crate::EquityResult;

// ---------------------------------------------------------------------------
// Vesting frequency
// ---------------------------------------------------------------------------

/// How often tranches vest across the vesting window.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum VestingFrequency {
    Daily,
    Weekly,
    Biweekly,
    #[default]
    Monthly,
    Yearly,
}

impl std::fmt::Display for VestingFrequency {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            VestingFrequency::Daily => write!(f, "DAILY"),
            VestingFrequency::Weekly => write!(f, "WEEKLY"),
            VestingFrequency::Biweekly => write!(f, "BIWEEKLY"),
            VestingFrequency::Monthly => write!(f, "MONTHLY"),
            VestingFrequency::Yearly => write!(f, "YEARLY"),
        }
    }
}

// ---------------------------------------------------------------------------
// Grant kind
// ---------------------------------------------------------------------------

/// The share-type bucket a grant belongs to, carrying the one price field
/// that bucket legally has. A grant is exactly one of these; mixed rows
/// cannot be constructed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum GrantKind {
    /// Incentive stock options.
    Iso { shares: ShareCount, strike_price: Money },
    /// Non-qualified stock options.
    Nqo { shares: ShareCount, strike_price: Money },
    /// Restricted stock units. No price; valued at company FMV.
    Rsu { shares: ShareCount },
    /// Purchased common stock.
    Common { shares: ShareCount, purchase_price: Money },
    /// Purchased preferred stock. Vests immediately.
    Preferred { shares: ShareCount, purchase_price: Money },
}

impl GrantKind {
    pub fn shares(&self) -> ShareCount {
        match *self {
            GrantKind::Iso { shares, .. }
            | GrantKind::Nqo { shares, .. }
            | GrantKind::Rsu { shares }
            | GrantKind::Common { shares, .. }
            | GrantKind::Preferred { shares, .. } => shares,
        }
    }

    pub fn strike_price(&self) -> Option<Money> {
        match *self {
            GrantKind::Iso { strike_price, .. } | GrantKind::Nqo { strike_price, .. } => {
                Some(strike_price)
            }
            _ => None,
        }
    }

    pub fn purchase_price(&self) -> Option<Money> {
        match *self {
            GrantKind::Common { purchase_price, .. }
            | GrantKind::Preferred { purchase_price, .. } => Some(purchase_price),
            _ => None,
        }
    }

    /// ISOs and NQOs are options; everything else is stock.
    pub fn is_option(&self) -> bool {
        matches!(self, GrantKind::Iso { .. } | GrantKind::Nqo { .. })
    }

    pub fn is_preferred(&self) -> bool {
        matches!(self, GrantKind::Preferred { .. })
    }

    /// The stock-class share type this kind may be granted from.
    pub fn required_share_type(&self) -> ShareType {
        if self.is_preferred() {
            ShareType::Preferred
        } else {
            ShareType::Common
        }
    }

    /// Expand into per-bucket counts (one bucket non-zero by construction).
    pub fn bucket_counts(&self) -> BucketCounts {
        let mut counts = BucketCounts::default();
        match *self {
            GrantKind::Iso { shares, .. } => counts.iso = shares,
            GrantKind::Nqo { shares, .. } => counts.nqo = shares,
            GrantKind::Rsu { shares } => counts.rsu = shares,
            GrantKind::Common { shares, .. } => counts.common = shares,
            GrantKind::Preferred { shares, .. } => counts.preferred = shares,
        }
        counts
    }
}

/// Per-bucket share counts. Valuation and scheduling run over this view so
/// they stay correct even for hypothetical mixed rows from legacy data.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BucketCounts {
    pub iso: ShareCount,
    pub nqo: ShareCount,
    pub rsu: ShareCount,
    pub common: ShareCount,
    pub preferred: ShareCount,
}

impl BucketCounts {
    pub fn total(&self) -> ShareCount {
        self.iso + self.nqo + self.rsu + self.common + self.preferred
    }

    /// Option shares (ISO + NQO).
    pub fn options(&self) -> ShareCount {
        self.iso + self.nqo
    }

    /// Non-option shares (RSU + common + preferred).
    pub fn stock_units(&self) -> ShareCount {
        self.rsu + self.common + self.preferred
    }
}

// ---------------------------------------------------------------------------
// Grant
// ---------------------------------------------------------------------------

/// A validated equity grant as held by the store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EquityGrant {
    pub id: GrantId,
    /// Holder's external key ([`crate::model::Employee::unique_id`]).
    pub employee_id: String,
    pub stock_class_id: StockClassId,
    pub kind: GrantKind,
    pub grant_date: NaiveDate,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vesting_start: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vesting_end: Option<NaiveDate>,
    pub vesting_frequency: VestingFrequency,
    /// Cliff length in whole months from `vesting_start`. Fixed at creation;
    /// no shares vest before `vesting_start + cliff_months`.
    pub cliff_months: u32,
}

impl EquityGrant {
    pub fn num_shares(&self) -> ShareCount {
        self.kind.shares()
    }

    pub fn bucket_counts(&self) -> BucketCounts {
        self.kind.bucket_counts()
    }

    /// Both window bounds, when the grant vests over time at all.
    pub fn vesting_window(&self) -> Option<(NaiveDate, NaiveDate)> {
        match (self.vesting_start, self.vesting_end) {
            (Some(start), Some(end)) => Some((start, end)),
            _ => None,
        }
    }
}

// ---------------------------------------------------------------------------
// Draft + validation
// ---------------------------------------------------------------------------

/// Untrusted grant parameters as submitted. The five parallel counts mirror
/// the wire format; [`GrantDraft::validate`] collapses them into a
/// [`GrantKind`] or rejects the draft.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GrantDraft {
    /// Holder's external key.
    pub employee_id: String,
    /// Stock class name, resolved within the company at creation.
    pub stock_class: String,
    pub num_shares: ShareCount,
    #[serde(default)]
    pub iso_shares: ShareCount,
    #[serde(default)]
    pub nqo_shares: ShareCount,
    #[serde(default)]
    pub rsu_shares: ShareCount,
    #[serde(default)]
    pub common_shares: ShareCount,
    #[serde(default)]
    pub preferred_shares: ShareCount,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub strike_price: Option<Money>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub purchase_price: Option<Money>,
    pub grant_date: NaiveDate,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vesting_start: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vesting_end: Option<NaiveDate>,
    #[serde(default)]
    pub vesting_frequency: VestingFrequency,
    #[serde(default)]
    pub cliff_months: u32,
}

impl GrantDraft {
    /// Full draft validation. Order matters for error reporting: exclusivity,
    /// bucket arithmetic, pricing rules, then date order. Class-level checks
    /// (share-type compatibility, allocation headroom) need store context and
    /// run at create/update time.
    pub fn validate(&self) -> EquityResult<GrantKind> {
        let (iso, nqo, rsu, common, pref) = (
            self.iso_shares,
            self.nqo_shares,
            self.rsu_shares,
            self.common_shares,
            self.preferred_shares,
        );

        if iso > 0 && nqo > 0 {
            return Err(EquityError::InvalidInput {
                field: "nqo_shares".into(),
                reason: "ISO and NQO cannot exist in the same grant.".into(),
            });
        }

        let buckets = [iso, nqo, rsu, common, pref];
        let positive = buckets.iter().filter(|&&b| b > 0).count();
        let sum: ShareCount = buckets.iter().sum();
        if positive != 1 || sum != self.num_shares {
            return Err(EquityError::InvalidInput {
                field: "num_shares".into(),
                reason: "Grant must represent one exclusive share type and total must equal num_shares."
                    .into(),
            });
        }

        let strike = self.strike_price.filter(|p| *p > Money::ZERO);
        let purchase = self.purchase_price.filter(|p| *p > Money::ZERO);

        let kind = if iso > 0 || nqo > 0 {
            let strike_price = strike.ok_or_else(|| EquityError::InvalidInput {
                field: "strike_price".into(),
                reason: "ISO/NQO require positive strike_price.".into(),
            })?;
            if purchase.is_some() {
                return Err(EquityError::InvalidInput {
                    field: "purchase_price".into(),
                    reason: "ISO/NQO cannot have purchase_price.".into(),
                });
            }
            if iso > 0 {
                GrantKind::Iso { shares: iso, strike_price }
            } else {
                GrantKind::Nqo { shares: nqo, strike_price }
            }
        } else if rsu > 0 {
            if strike.is_some() {
                return Err(EquityError::InvalidInput {
                    field: "strike_price".into(),
                    reason: "RSUs cannot have strike_price.".into(),
                });
            }
            if purchase.is_some() {
                return Err(EquityError::InvalidInput {
                    field: "purchase_price".into(),
                    reason: "RSUs cannot have purchase_price.".into(),
                });
            }
            GrantKind::Rsu { shares: rsu }
        } else if common > 0 {
            let purchase_price = purchase.ok_or_else(|| EquityError::InvalidInput {
                field: "purchase_price".into(),
                reason: "Common shares require purchase_price.".into(),
            })?;
            if strike.is_some() {
                return Err(EquityError::InvalidInput {
                    field: "strike_price".into(),
                    reason: "Common shares cannot have strike_price.".into(),
                });
            }
            GrantKind::Common { shares: common, purchase_price }
        } else {
            // Only the preferred bucket can be left.
            let purchase_price = purchase.ok_or_else(|| EquityError::InvalidInput {
                field: "purchase_price".into(),
                reason: "Preferred shares require purchase_price.".into(),
            })?;
            if strike.is_some() {
                return Err(EquityError::InvalidInput {
                    field: "strike_price".into(),
                    reason: "Preferred shares cannot have strike_price.".into(),
                });
            }
            GrantKind::Preferred { shares: pref, purchase_price }
        };

        self.validate_dates()?;
        Ok(kind)
    }

    fn validate_dates(&self) -> EquityResult<()> {
        if let (Some(start), Some(end)) = (self.vesting_start, self.vesting_end) {
            if end < start {
                return Err(EquityError::InvalidInput {
                    field: "vesting_end".into(),
                    reason: "vesting_end must be after vesting_start.".into(),
                });
            }
        }
        Ok(())
    }
}
