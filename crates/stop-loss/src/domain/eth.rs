pub use alloy::primitives::{Address, I256, U256};
use {
    derive_more::{Display, From, Into},
    serde::{Deserialize, Serialize},
};

/// An ERC20 token address.
#[derive(
    Debug,
    Display,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    From,
    Into,
    Serialize,
    Deserialize,
)]
pub struct TokenAddress(pub Address);

/// The address of a liquidity pool.
#[derive(Debug, Display, Clone, Copy, PartialEq, Eq, Hash, From, Into)]
pub struct PoolAddress(pub Address);

/// A pool fee tier in hundredths of a basis point, the way Uniswap V3 keys
/// its pools. 3000 is the 0.3% tier.
#[derive(Debug, Display, Clone, Copy, PartialEq, Eq, Hash, From, Into, Serialize, Deserialize)]
pub struct FeeTier(pub u32);

impl FeeTier {
    /// Fee tiers are fractions of this denominator.
    pub const DENOMINATOR: u32 = 1_000_000;
}

impl Default for FeeTier {
    fn default() -> Self {
        Self(3000)
    }
}

/// An amount of some token, in the token's base units.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Asset {
    pub token: TokenAddress,
    pub amount: U256,
}

/// Unix timestamp in seconds.
pub type Timestamp = u64;
