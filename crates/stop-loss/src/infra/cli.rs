use std::{net::SocketAddr, path::PathBuf};

#[derive(Debug, clap::Parser)]
pub struct Args {
    /// The address to bind the API to.
    #[clap(long, env, default_value = "0.0.0.0:11090")]
    pub addr: SocketAddr,

    /// The log filter.
    #[clap(long, env, default_value = "warn,stop_loss=debug,observe=info")]
    pub log: String,

    /// At which log level logs should be printed to stderr instead of stdout.
    #[clap(long, env)]
    pub stderr_threshold: Option<tracing::Level>,

    /// Whether to use JSON format for the logs.
    #[clap(long, env, default_value = "false")]
    pub use_json_logs: bool,

    /// Path to the configuration file. This file should be in TOML format.
    /// For an example see `crates/stop-loss/example.toml`.
    #[clap(long, env)]
    pub config: PathBuf,
}
