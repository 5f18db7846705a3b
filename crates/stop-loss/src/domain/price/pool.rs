//! Spot prices read from Uniswap V3 style pools.

use {
    super::Error,
    crate::domain::eth::{FeeTier, PoolAddress, TokenAddress, U256},
    num::{BigRational, One, bigint::BigInt},
    number::conversions::{big_rational_to_u256, u256_to_big_int},
    std::sync::Arc,
};

#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait PoolRegistry: Send + Sync {
    /// The pool of the pair at the fee tier, in either token order.
    async fn pool_for(
        &self,
        token_a: TokenAddress,
        token_b: TokenAddress,
        fee: FeeTier,
    ) -> anyhow::Result<Option<PoolAddress>>;
}

/// The current state of a pool as reported by its `slot0()`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Slot0 {
    /// `sqrt(token1 / token0)` as a Q64.96 fixed point number.
    pub sqrt_price_x96: U256,
}

#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait Pools: Send + Sync {
    async fn slot0(&self, pool: PoolAddress) -> anyhow::Result<Slot0>;

    async fn token0(&self, pool: PoolAddress) -> anyhow::Result<TokenAddress>;
}

#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait Tokens: Send + Sync {
    async fn decimals(&self, token: TokenAddress) -> anyhow::Result<u8>;
}

#[derive(Clone)]
pub struct PoolResolver {
    registry: Arc<dyn PoolRegistry>,
    pools: Arc<dyn Pools>,
    tokens: Arc<dyn Tokens>,
    fee: FeeTier,
}

impl PoolResolver {
    pub fn new(
        registry: Arc<dyn PoolRegistry>,
        pools: Arc<dyn Pools>,
        tokens: Arc<dyn Tokens>,
        fee: FeeTier,
    ) -> Self {
        Self {
            registry,
            pools,
            tokens,
            fee,
        }
    }

    /// The amount of `stable` base units paid for one whole `token` at the
    /// pool's current spot price, truncated. Always reads the live pool state.
    pub async fn price_of(&self, token: TokenAddress, stable: TokenAddress) -> Result<U256, Error> {
        let pool = self
            .registry
            .pool_for(token, stable, self.fee)
            .await
            .map_err(Error::Pool)?
            .ok_or(Error::PoolNotFound {
                token,
                fee: self.fee,
            })?;
        let slot0 = self.pools.slot0(pool).await.map_err(Error::Pool)?;
        if slot0.sqrt_price_x96 == U256::ZERO {
            tracing::debug!(%pool, "pool is not initialized");
            return Err(Error::PoolNotFound {
                token,
                fee: self.fee,
            });
        }
        let token_is_token0 = self.pools.token0(pool).await.map_err(Error::Pool)? == token;
        let decimals = self.tokens.decimals(token).await.map_err(Error::Pool)?;
        spot_price(slot0.sqrt_price_x96, token_is_token0, decimals)
            .ok_or_else(|| Error::Pool(anyhow::anyhow!("price of {token} overflows")))
    }
}

/// Converts `sqrtPriceX96` into the price of one whole token.
///
/// `sqrtPriceX96² / 2¹⁹²` is the amount of token1 base units per token0 base
/// unit. If the priced token is token1 the ratio gets inverted.
pub fn spot_price(sqrt_price_x96: U256, token_is_token0: bool, decimals: u8) -> Option<U256> {
    if sqrt_price_x96 == U256::ZERO {
        return None;
    }
    let sqrt_price = u256_to_big_int(&sqrt_price_x96);
    let ratio = BigRational::new(&sqrt_price * &sqrt_price, BigInt::one() << 192);
    let ratio = if token_is_token0 {
        ratio
    } else {
        ratio.recip()
    };
    let one_token = BigRational::from_integer(u256_to_big_int(&number::units::pow10(decimals)?));
    big_rational_to_u256(&(ratio * one_token)).ok()
}
