//! An in-process chain with the contracts the engine talks to: ERC20 tokens,
//! a pushed price feed and a pool factory with its swap router.

use {
    crate::domain::eth::{Address, Asset, FeeTier, I256, PoolAddress, Timestamp, TokenAddress, U256},
    anyhow::Context,
    std::sync::Arc,
};

pub mod aggregator;
pub mod ledger;
pub mod uniswap;

pub use {
    aggregator::Aggregator,
    ledger::{Ledger, TokenInfo},
    uniswap::{Factory, Router},
};

#[derive(Debug, Clone)]
pub struct Token {
    pub address: TokenAddress,
    pub info: TokenInfo,
}

#[derive(Debug, Clone, Copy)]
pub struct Feed {
    pub decimals: u8,
    /// The first answer, if the feed was ever updated.
    pub answer: Option<(I256, Timestamp)>,
}

#[derive(Debug, Clone)]
pub struct Pool {
    pub token: TokenAddress,
    pub quote: TokenAddress,
    pub fee: FeeTier,
    /// `quote` base units paid for one whole `token`.
    pub price: U256,
    /// Minted to the pool.
    pub reserves: Vec<Asset>,
}

#[derive(Debug, Clone, Copy)]
pub struct Allowance {
    pub owner: Address,
    pub spender: Address,
    pub asset: Asset,
}

/// Initial state of the chain.
#[derive(Debug, Clone)]
pub struct Seed {
    pub router: Address,
    pub tokens: Vec<Token>,
    pub feed: Feed,
    pub pools: Vec<Pool>,
    pub balances: Vec<(Address, Asset)>,
    pub allowances: Vec<Allowance>,
}

#[derive(Debug, Clone)]
pub struct Chain {
    pub ledger: Arc<Ledger>,
    pub aggregator: Arc<Aggregator>,
    pub factory: Arc<Factory>,
    pub router: Arc<Router>,
}

impl Chain {
    /// An empty chain.
    pub fn new(router: Address, feed_decimals: u8) -> Self {
        let ledger = Arc::new(Ledger::default());
        let factory = Arc::new(Factory::default());
        Self {
            router: Arc::new(Router::new(router, factory.clone(), ledger.clone())),
            aggregator: Arc::new(Aggregator::new(feed_decimals)),
            ledger,
            factory,
        }
    }

    pub fn seed(seed: &Seed) -> anyhow::Result<Self> {
        let chain = Self::new(seed.router, seed.feed.decimals);
        for token in &seed.tokens {
            chain.ledger.register(token.address, token.info.clone());
        }
        if let Some((answer, updated_at)) = seed.feed.answer {
            chain.aggregator.update_answer(answer, updated_at);
        }
        for pool in &seed.pools {
            let address = chain.create_pool(pool.token, pool.quote, pool.fee, pool.price)?;
            for reserve in &pool.reserves {
                chain.ledger.mint(reserve.token, address.0, reserve.amount)?;
            }
        }
        for (owner, asset) in &seed.balances {
            chain.ledger.mint(asset.token, *owner, asset.amount)?;
        }
        for allowance in &seed.allowances {
            chain.ledger.approve(
                allowance.asset.token,
                allowance.owner,
                allowance.spender,
                allowance.asset.amount,
            );
        }
        Ok(chain)
    }

    /// Creates the pool of `token` and `quote` at the given price.
    pub fn create_pool(
        &self,
        token: TokenAddress,
        quote: TokenAddress,
        fee: FeeTier,
        price: U256,
    ) -> anyhow::Result<PoolAddress> {
        let sqrt_price_x96 = self.sqrt_price_x96(token, quote, price)?;
        self.factory.create_pool(token, quote, fee, sqrt_price_x96)
    }

    /// Moves the price of an existing pool.
    pub fn set_pool_price(
        &self,
        token: TokenAddress,
        quote: TokenAddress,
        fee: FeeTier,
        price: U256,
    ) -> anyhow::Result<()> {
        let sqrt_price_x96 = self.sqrt_price_x96(token, quote, price)?;
        let address = self
            .factory
            .find(token, quote, fee)
            .with_context(|| format!("no pool for {token} and {quote}"))?;
        self.factory.set_sqrt_price(address, sqrt_price_x96)
    }

    /// Lets `spender` move any amount of every token of `owner`.
    pub fn approve_all(&self, owner: Address, spender: Address) {
        for token in self.ledger.tokens() {
            self.ledger.approve(token, owner, spender, U256::MAX);
        }
    }

    fn sqrt_price_x96(
        &self,
        token: TokenAddress,
        quote: TokenAddress,
        price: U256,
    ) -> anyhow::Result<U256> {
        let decimals = self
            .ledger
            .token(token)
            .with_context(|| format!("unknown token {token}"))?
            .decimals;
        uniswap::sqrt_price_x96(price, uniswap::sorted(token, quote).0 == token, decimals)
            .with_context(|| format!("invalid price {price} for {token}"))
    }
}
