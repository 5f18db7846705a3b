pub mod eth;
pub mod execution;
pub mod lifecycle;
pub mod order;
pub mod price;
pub mod venue;

pub use {
    execution::{Engine, Execution},
    lifecycle::Lifecycle,
    order::Authorizer,
    price::{PriceQuote, Resolver},
};

/// How a keeper should react to an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Class {
    /// Caller input is wrong.
    Authorization,
    /// The order can never be executed again.
    Lifecycle,
    /// A price source is unusable right now.
    Price,
    /// The price did not fall far enough yet.
    Trigger,
    /// The swap could not be carried out.
    Execution,
    /// Funds could not be delivered after the swap.
    Settlement,
}

impl Class {
    pub fn is_retryable(self) -> bool {
        matches!(
            self,
            Class::Price | Class::Trigger | Class::Execution
        )
    }
}
