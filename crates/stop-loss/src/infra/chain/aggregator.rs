//! A price feed whose answers are pushed by its owner, like a Chainlink
//! aggregator on a test network.

use {
    crate::domain::{
        eth::{I256, Timestamp},
        price::{PriceFeed, RoundData},
    },
    std::sync::{Mutex, PoisonError},
};

#[derive(Debug)]
pub struct Aggregator {
    decimals: u8,
    round: Mutex<RoundData>,
}

impl Aggregator {
    /// A feed that was never updated.
    pub fn new(decimals: u8) -> Self {
        Self {
            decimals,
            round: Mutex::new(RoundData::default()),
        }
    }

    /// Publishes a new answer in the next round.
    pub fn update_answer(&self, answer: I256, updated_at: Timestamp) {
        let mut round = self.round.lock().unwrap_or_else(PoisonError::into_inner);
        *round = RoundData {
            round_id: round.round_id + 1,
            answer,
            updated_at,
        };
    }

    /// Overwrites the latest round as is.
    pub fn update_round_data(&self, round: RoundData) {
        *self.round.lock().unwrap_or_else(PoisonError::into_inner) = round;
    }

    pub fn latest(&self) -> RoundData {
        *self.round.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[async_trait::async_trait]
impl PriceFeed for Aggregator {
    async fn latest_round_data(&self) -> anyhow::Result<RoundData> {
        Ok(self.latest())
    }

    async fn decimals(&self) -> anyhow::Result<u8> {
        Ok(self.decimals)
    }
}
