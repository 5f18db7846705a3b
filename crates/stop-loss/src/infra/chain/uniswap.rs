//! Concentrated liquidity pools in the style of Uniswap V3, reduced to what
//! pricing and exact input swaps need. Swaps execute at the spot price net of
//! the pool fee and do not move the price.

use {
    super::ledger::{Ledger, Move},
    crate::domain::{
        eth::{Address, FeeTier, PoolAddress, TokenAddress, U256},
        price::{PoolRegistry, Pools, Slot0},
        venue::{Swap, SwapError, Swapper},
    },
    alloy::primitives::keccak256,
    anyhow::{Context, anyhow, ensure},
    num::{BigUint, One},
    number::conversions::{big_uint_to_u256, u256_to_big_uint},
    std::{
        collections::HashMap,
        sync::{Arc, PoisonError, RwLock},
    },
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pool {
    pub token0: TokenAddress,
    pub token1: TokenAddress,
    pub fee: FeeTier,
    pub sqrt_price_x96: U256,
}

/// Creates pools and keeps their state.
#[derive(Debug, Default)]
pub struct Factory {
    pools: RwLock<HashMap<PoolAddress, Pool>>,
}

impl Factory {
    /// Deploys the pool of the pair at the fee tier.
    pub fn create_pool(
        &self,
        token_a: TokenAddress,
        token_b: TokenAddress,
        fee: FeeTier,
        sqrt_price_x96: U256,
    ) -> anyhow::Result<PoolAddress> {
        ensure!(token_a != token_b, "pool tokens must differ");
        let (token0, token1) = sorted(token_a, token_b);
        let address = pool_address(token0, token1, fee);
        let mut pools = self.pools.write().unwrap_or_else(PoisonError::into_inner);
        ensure!(!pools.contains_key(&address), "pool {address} already exists");
        pools.insert(
            address,
            Pool {
                token0,
                token1,
                fee,
                sqrt_price_x96,
            },
        );
        Ok(address)
    }

    pub fn set_sqrt_price(&self, pool: PoolAddress, sqrt_price_x96: U256) -> anyhow::Result<()> {
        let mut pools = self.pools.write().unwrap_or_else(PoisonError::into_inner);
        pools
            .get_mut(&pool)
            .with_context(|| format!("unknown pool {pool}"))?
            .sqrt_price_x96 = sqrt_price_x96;
        Ok(())
    }

    /// The pool of the pair at the fee tier, in either token order.
    pub fn find(
        &self,
        token_a: TokenAddress,
        token_b: TokenAddress,
        fee: FeeTier,
    ) -> Option<PoolAddress> {
        let (token0, token1) = sorted(token_a, token_b);
        let address = pool_address(token0, token1, fee);
        self.pool(address).map(|_| address)
    }

    pub fn pool(&self, address: PoolAddress) -> Option<Pool> {
        self.pools
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&address)
            .copied()
    }

    fn existing(&self, address: PoolAddress) -> anyhow::Result<Pool> {
        self.pool(address)
            .with_context(|| format!("unknown pool {address}"))
    }
}

#[async_trait::async_trait]
impl PoolRegistry for Factory {
    async fn pool_for(
        &self,
        token_a: TokenAddress,
        token_b: TokenAddress,
        fee: FeeTier,
    ) -> anyhow::Result<Option<PoolAddress>> {
        Ok(self.find(token_a, token_b, fee))
    }
}

#[async_trait::async_trait]
impl Pools for Factory {
    async fn slot0(&self, pool: PoolAddress) -> anyhow::Result<Slot0> {
        Ok(Slot0 {
            sqrt_price_x96: self.existing(pool)?.sqrt_price_x96,
        })
    }

    async fn token0(&self, pool: PoolAddress) -> anyhow::Result<TokenAddress> {
        Ok(self.existing(pool)?.token0)
    }
}

/// Swaps against the factory's pools, holding reserves on the ledger under
/// the pool's address.
#[derive(Debug)]
pub struct Router {
    address: Address,
    factory: Arc<Factory>,
    ledger: Arc<Ledger>,
}

impl Router {
    pub fn new(address: Address, factory: Arc<Factory>, ledger: Arc<Ledger>) -> Self {
        Self {
            address,
            factory,
            ledger,
        }
    }

    /// The account payers approve to pull swap inputs.
    pub fn address(&self) -> Address {
        self.address
    }

    /// The pool and the output amount `swap` would receive right now.
    pub fn quote(&self, swap: &Swap) -> anyhow::Result<(PoolAddress, U256)> {
        let (token0, token1) = sorted(swap.token_in, swap.token_out);
        let address = pool_address(token0, token1, swap.fee);
        let pool = self.factory.existing(address)?;
        ensure!(pool.sqrt_price_x96 != U256::ZERO, "pool {address} is not initialized");
        ensure!(swap.fee.0 < FeeTier::DENOMINATOR, "invalid fee tier {}", swap.fee);

        let amount_in = u256_to_big_uint(&swap.amount_in)
            * BigUint::from(FeeTier::DENOMINATOR - swap.fee.0)
            / BigUint::from(FeeTier::DENOMINATOR);
        let sqrt_price = u256_to_big_uint(&pool.sqrt_price_x96);
        let price = &sqrt_price * &sqrt_price;
        let q192 = BigUint::one() << 192;
        let amount_out = if swap.token_in == pool.token0 {
            amount_in * price / q192
        } else {
            amount_in * q192 / price
        };
        Ok((address, big_uint_to_u256(&amount_out)?))
    }
}

#[async_trait::async_trait]
impl Swapper for Router {
    async fn swap(&self, swap: Swap) -> Result<U256, SwapError> {
        let (pool, amount_out) = self.quote(&swap)?;
        if amount_out < swap.min_amount_out {
            return Err(SwapError::SlippageExceeded {
                amount_out,
                min_amount_out: swap.min_amount_out,
            });
        }
        self.ledger
            .apply(&[
                Move {
                    token: swap.token_in,
                    spender: Some(self.address),
                    from: swap.payer,
                    to: pool.0,
                    amount: swap.amount_in,
                },
                Move {
                    token: swap.token_out,
                    spender: None,
                    from: pool.0,
                    to: swap.recipient,
                    amount: amount_out,
                },
            ])
            .map_err(|err| anyhow!("swap through {pool} failed: {err:#}"))?;
        Ok(amount_out)
    }
}

/// Orders a pair the way pools do, by address.
pub fn sorted(token_a: TokenAddress, token_b: TokenAddress) -> (TokenAddress, TokenAddress) {
    if token_a < token_b {
        (token_a, token_b)
    } else {
        (token_b, token_a)
    }
}

/// Deterministic address of the pool of a sorted pair at a fee tier.
fn pool_address(token0: TokenAddress, token1: TokenAddress, fee: FeeTier) -> PoolAddress {
    let mut key = Vec::with_capacity(44);
    key.extend_from_slice(token0.0.as_slice());
    key.extend_from_slice(token1.0.as_slice());
    key.extend_from_slice(&fee.0.to_be_bytes());
    PoolAddress(Address::from_slice(&keccak256(key)[12..]))
}

/// The `sqrtPriceX96` at which one whole token is worth `price` stable base
/// units. The root is rounded such that reading the spot price back with
/// truncation yields exactly `price`.
pub fn sqrt_price_x96(price: U256, token_is_token0: bool, decimals: u8) -> Option<U256> {
    if price == U256::ZERO {
        return None;
    }
    let price = u256_to_big_uint(&price);
    let one_token = u256_to_big_uint(&number::units::pow10(decimals)?);
    let q192 = BigUint::one() << 192;
    let root = if token_is_token0 {
        // Stable base units per token base unit, rounded up.
        let numerator = price * q192;
        let ratio: BigUint = (&numerator + &one_token - BigUint::one()) / &one_token;
        let root = BigUint::sqrt(&ratio);
        if &root * &root < ratio { root + BigUint::one() } else { root }
    } else {
        let ratio: BigUint = q192 * one_token / price;
        BigUint::sqrt(&ratio)
    };
    big_uint_to_u256(&root).ok()
}
