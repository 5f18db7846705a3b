//! Test cases.

pub mod api;
pub mod cancel;
pub mod execute;
pub mod persistence;
pub mod price;
