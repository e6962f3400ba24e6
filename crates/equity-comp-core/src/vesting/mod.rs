pub mod calculator;
pub mod schedule;

pub use calculator::{
    elapsed_units, months_since_vesting_start, remaining_vesting_months, total_units,
    total_vesting_months, unvested_shares, vested_shares, vesting_status, VestingStatus,
};
pub use schedule::{period_allocation, vesting_schedule, VestingEvent};
