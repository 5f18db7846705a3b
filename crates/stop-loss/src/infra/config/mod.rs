use {
    crate::{
        domain::eth::{Address, FeeTier, TokenAddress},
        infra::chain,
    },
    model::SigningDomain,
    std::{path::PathBuf, time::Duration},
};

pub mod file;

/// Configuration of the stop-loss service.
#[derive(Debug, Clone)]
pub struct Config {
    pub domain: SigningDomain,
    /// The engine's custody account.
    pub engine: Address,
    pub stable: TokenAddress,
    pub stable_decimals: u8,
    pub reference: TokenAddress,
    pub max_age: Duration,
    pub pool_fee: FeeTier,
    pub persistence_path: Option<PathBuf>,
    pub chain: chain::Seed,
}
