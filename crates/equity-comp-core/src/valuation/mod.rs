pub mod grant_detail;
pub mod grant_value;

pub use grant_detail::{grant_detail, GrantDetail};
pub use grant_value::{
    per_period_value, period_value, shares_per_period, vested_value, BucketPrices,
};
