//! Numeric helpers shared by the stop-loss crates. Amounts and prices are
//! integers in the base units of their token, so everything here works on
//! [`alloy::primitives::U256`].

pub mod conversions;
pub mod serialization;
pub mod units;
