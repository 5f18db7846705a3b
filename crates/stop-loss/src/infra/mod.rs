pub mod api;
pub mod chain;
pub mod cli;
pub mod config;
pub mod observe;
pub mod persistence;
pub mod time;

pub use {api::Api, chain::Chain, config::Config, persistence::Persistence};
