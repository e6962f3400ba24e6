pub mod black_scholes;

pub use black_scholes::{
    bs_call_price, bso_value_per_option, normal_cdf, price_call, years_to_horizon, BsPriceInput,
    BsPriceOutput,
};
