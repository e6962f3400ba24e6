pub mod company;
pub mod grant;

pub use company::{Company, CompanyDraft, Employee, Series, ShareType, StockClass};
pub use grant::{BucketCounts, EquityGrant, GrantDraft, GrantKind, VestingFrequency};
