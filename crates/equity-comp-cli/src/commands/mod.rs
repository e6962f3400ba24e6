pub mod captable;
pub mod expense;
pub mod price;
pub mod vesting;
