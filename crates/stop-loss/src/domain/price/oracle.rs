//! Adapter for a push based primary price feed with the
//! `latestRoundData()` interface of Chainlink aggregators.

use {
    super::Error,
    crate::domain::eth::{I256, Timestamp, U256},
    std::sync::Arc,
};

/// One round reported by the feed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RoundData {
    pub round_id: u128,
    pub answer: I256,
    pub updated_at: Timestamp,
}

#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait PriceFeed: Send + Sync {
    async fn latest_round_data(&self) -> anyhow::Result<RoundData>;

    /// Number of decimals of the feed's answers.
    async fn decimals(&self) -> anyhow::Result<u8>;
}

/// The latest usable observation of the feed, scaled to the stable asset's
/// precision.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Observation {
    pub price: U256,
    pub updated_at: Timestamp,
    pub round_id: u128,
}

#[derive(Clone)]
pub struct Oracle {
    feed: Arc<dyn PriceFeed>,
    stable_decimals: u8,
}

impl Oracle {
    pub fn new(feed: Arc<dyn PriceFeed>, stable_decimals: u8) -> Self {
        Self {
            feed,
            stable_decimals,
        }
    }

    pub async fn latest(&self) -> Result<Observation, Error> {
        let round = self
            .feed
            .latest_round_data()
            .await
            .map_err(|err| Error::OracleUnavailable(format!("{err:#}")))?;
        if round.round_id == 0 || round.updated_at == 0 {
            return Err(Error::OracleUnavailable("feed was never updated".into()));
        }
        if round.answer <= I256::ZERO {
            return Err(Error::OracleUnavailable(format!(
                "non-positive answer {}",
                round.answer
            )));
        }
        let decimals = self
            .feed
            .decimals()
            .await
            .map_err(|err| Error::OracleUnavailable(format!("{err:#}")))?;
        let price = number::units::rescale(round.answer.into_raw(), decimals, self.stable_decimals)
            .ok_or_else(|| Error::OracleUnavailable("answer overflows".into()))?;
        Ok(Observation {
            price,
            updated_at: round.updated_at,
            round_id: round.round_id,
        })
    }
}
