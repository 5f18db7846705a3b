//! Resolution of the current price of a token in stable asset terms.
//!
//! There are exactly two sources. The reference asset is priced by the
//! primary feed, which may lag behind and is therefore subject to a maximum
//! age. Every other token is priced from its pool against the stable asset,
//! which always reflects the current state. The sources are never blended.

use {
    crate::{
        domain::eth::{TokenAddress, Timestamp, U256},
        infra::{observe, time},
    },
    std::time::Duration,
};

pub mod oracle;
pub mod pool;

pub use {
    oracle::{Observation, Oracle, PriceFeed, RoundData},
    pool::{PoolRegistry, PoolResolver, Pools, Slot0, Tokens},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Source {
    Primary,
    Pool,
}

impl Source {
    pub fn as_str(&self) -> &'static str {
        match self {
            Source::Primary => "primary",
            Source::Pool => "pool",
        }
    }
}

/// When the price was observed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ObservedAt {
    /// The feed round the price was taken from.
    Round { id: u128, updated_at: Timestamp },
    /// Pool prices are read live at this time.
    Spot(Timestamp),
}

impl ObservedAt {
    pub fn timestamp(&self) -> Timestamp {
        match self {
            ObservedAt::Round { updated_at, .. } => *updated_at,
            ObservedAt::Spot(at) => *at,
        }
    }

    /// A timestamp ahead of `now` counts as fresh.
    pub fn age(&self, now: Timestamp) -> Duration {
        Duration::from_secs(now.saturating_sub(self.timestamp()))
    }
}

/// The price of one whole `token` in stable asset base units. Computed fresh
/// for every execution attempt and never persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PriceQuote {
    pub token: TokenAddress,
    pub price: U256,
    pub source: Source,
    pub observed_at: ObservedAt,
    pub stale: bool,
}

#[derive(Debug, Clone)]
pub struct Config {
    /// The asset priced by the primary feed.
    pub reference: TokenAddress,
    /// The asset all prices are denominated in.
    pub stable: TokenAddress,
    /// Primary feed observations older than this are unusable.
    pub max_age: Duration,
}

#[derive(Clone)]
pub struct Resolver {
    config: Config,
    oracle: Oracle,
    pools: PoolResolver,
}

impl Resolver {
    pub fn new(config: Config, oracle: Oracle, pools: PoolResolver) -> Self {
        Self {
            config,
            oracle,
            pools,
        }
    }

    pub fn stable(&self) -> TokenAddress {
        self.config.stable
    }

    /// The current price of `token`. A stale primary observation is an error,
    /// so a returned quote is always usable.
    pub async fn resolve(&self, token: TokenAddress) -> Result<PriceQuote, Error> {
        let result = self.quote(token).await;
        match &result {
            Ok(quote) => observe::price_resolved(quote),
            Err(err) => observe::price_failed(token, err),
        }
        let quote = result?;
        if quote.stale {
            return Err(Error::StalePrice {
                age: quote.observed_at.age(time::now_unix()),
                max_age: self.config.max_age,
            });
        }
        Ok(quote)
    }

    async fn quote(&self, token: TokenAddress) -> Result<PriceQuote, Error> {
        let now = time::now_unix();
        if token == self.config.reference {
            let observation = self.oracle.latest().await?;
            let observed_at = ObservedAt::Round {
                id: observation.round_id,
                updated_at: observation.updated_at,
            };
            Ok(PriceQuote {
                token,
                price: observation.price,
                source: Source::Primary,
                observed_at,
                stale: observed_at.age(now) > self.config.max_age,
            })
        } else {
            let price = self.pools.price_of(token, self.config.stable).await?;
            Ok(PriceQuote {
                token,
                price,
                source: Source::Pool,
                observed_at: ObservedAt::Spot(now),
                stale: false,
            })
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("primary price feed unavailable: {0}")]
    OracleUnavailable(String),
    #[error("primary price is {age:?} old, the maximum age is {max_age:?}")]
    StalePrice { age: Duration, max_age: Duration },
    #[error("no pool for {token} at fee tier {fee}")]
    PoolNotFound {
        token: TokenAddress,
        fee: crate::domain::eth::FeeTier,
    },
    #[error("failed to read pool state: {0:#}")]
    Pool(anyhow::Error),
}
