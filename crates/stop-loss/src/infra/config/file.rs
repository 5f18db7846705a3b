use {
    super::Config,
    crate::{
        domain::eth::{Address, Asset, FeeTier, I256, TokenAddress, U256},
        infra::{chain, time},
    },
    anyhow::{Context, ensure},
    model::{DEFAULT_DOMAIN_NAME, DEFAULT_DOMAIN_VERSION, SigningDomain},
    serde::Deserialize,
    std::{collections::HashMap, path::Path, time::Duration},
};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
struct File {
    /// The chain ID signatures are scoped to.
    chain_id: u64,

    /// The engine's address. It is the EIP-712 verifying contract and the
    /// custody account funds pass through during execution.
    engine: Address,

    #[serde(default = "default_domain_name")]
    domain_name: String,

    #[serde(default = "default_domain_version")]
    domain_version: String,

    /// The asset all prices are denominated in.
    stable_token: TokenAddress,

    /// The asset priced by the primary feed.
    reference_token: TokenAddress,

    /// Primary feed answers older than this are rejected.
    #[serde(with = "humantime_serde", default = "default_max_age")]
    max_age: Duration,

    /// The fee tier of the pools used for pricing and swaps.
    #[serde(default)]
    pool_fee: FeeTier,

    /// Where finalized order statuses are stored. Without it statuses only
    /// live in memory.
    persistence_path: Option<std::path::PathBuf>,

    /// The swap router's address.
    router: Address,

    #[serde(rename = "token")]
    tokens: Vec<Token>,

    feed: Feed,

    #[serde(default, rename = "pool")]
    pools: Vec<Pool>,

    #[serde(default, rename = "balance")]
    balances: Vec<Balance>,

    #[serde(default, rename = "allowance")]
    allowances: Vec<Allowance>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
struct Token {
    address: TokenAddress,
    symbol: String,
    decimals: u8,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
struct Feed {
    #[serde(default = "default_feed_decimals")]
    decimals: u8,
    /// The latest answer in human units, e.g. "1885.22". A feed without an
    /// answer was never updated.
    answer: Option<String>,
    /// How long ago the answer was published.
    #[serde(with = "humantime_serde", default)]
    age: Duration,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
struct Pool {
    /// The token priced by the pool. The pool pairs it with the stable token.
    token: TokenAddress,
    /// Defaults to the configured pool fee.
    fee: Option<FeeTier>,
    /// Price of one whole token in human stable units, e.g. "49.50".
    price: String,
    /// Initial reserves of the pool.
    #[serde(default, rename = "reserve")]
    reserves: Vec<Amount>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
struct Amount {
    token: TokenAddress,
    /// Human units, e.g. "1.5".
    amount: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
struct Balance {
    owner: Address,
    token: TokenAddress,
    amount: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
struct Allowance {
    owner: Address,
    spender: Address,
    token: TokenAddress,
    /// Human units, or "max" for an unlimited approval.
    amount: String,
}

fn default_domain_name() -> String {
    DEFAULT_DOMAIN_NAME.to_owned()
}

fn default_domain_version() -> String {
    DEFAULT_DOMAIN_VERSION.to_owned()
}

fn default_max_age() -> Duration {
    Duration::from_secs(3600)
}

fn default_feed_decimals() -> u8 {
    8
}

/// Load the configuration from a TOML file.
///
/// # Panics
///
/// This method panics if the config is invalid or on I/O errors.
pub async fn load(path: &Path) -> Config {
    let data = tokio::fs::read_to_string(path)
        .await
        .unwrap_or_else(|e| panic!("I/O error while reading {path:?}: {e:?}"));
    from_toml(&data).unwrap_or_else(|e| panic!("invalid configuration in {path:?}: {e:#}"))
}

/// Parses and resolves a TOML configuration. Human readable amounts are
/// converted into base units of their token.
pub fn from_toml(data: &str) -> anyhow::Result<Config> {
    let file: File = toml::de::from_str(data).context("TOML syntax error")?;

    let decimals = file
        .tokens
        .iter()
        .map(|token| (token.address, token.decimals))
        .collect::<HashMap<_, _>>();
    let amount = |token: TokenAddress, amount: &str| -> anyhow::Result<U256> {
        let decimals = decimals
            .get(&token)
            .with_context(|| format!("unknown token {token}"))?;
        number::units::parse_units(amount, *decimals)
            .with_context(|| format!("invalid amount {amount:?} of {token}"))
    };
    ensure!(
        decimals.contains_key(&file.stable_token),
        "stable token {} is not configured",
        file.stable_token
    );
    ensure!(
        file.stable_token != file.reference_token,
        "the reference token can't be the stable token"
    );

    let answer = file
        .feed
        .answer
        .as_deref()
        .map(|answer| -> anyhow::Result<_> {
            let answer = number::units::parse_units(answer, file.feed.decimals)
                .with_context(|| format!("invalid feed answer {answer:?}"))?;
            let answer = I256::try_from(answer).context("feed answer overflows")?;
            let updated_at = time::now_unix().saturating_sub(file.feed.age.as_secs());
            Ok((answer, updated_at))
        })
        .transpose()?;

    let pools = file
        .pools
        .iter()
        .map(|pool| -> anyhow::Result<_> {
            Ok(chain::Pool {
                token: pool.token,
                quote: file.stable_token,
                fee: pool.fee.unwrap_or(file.pool_fee),
                price: amount(file.stable_token, &pool.price)?,
                reserves: pool
                    .reserves
                    .iter()
                    .map(|reserve| -> anyhow::Result<_> {
                        Ok(Asset {
                            token: reserve.token,
                            amount: amount(reserve.token, &reserve.amount)?,
                        })
                    })
                    .collect::<anyhow::Result<_>>()?,
            })
        })
        .collect::<anyhow::Result<_>>()?;

    let balances = file
        .balances
        .iter()
        .map(|balance| -> anyhow::Result<_> {
            Ok((
                balance.owner,
                Asset {
                    token: balance.token,
                    amount: amount(balance.token, &balance.amount)?,
                },
            ))
        })
        .collect::<anyhow::Result<_>>()?;

    let allowances = file
        .allowances
        .iter()
        .map(|allowance| -> anyhow::Result<_> {
            let value = if allowance.amount.eq_ignore_ascii_case("max") {
                U256::MAX
            } else {
                amount(allowance.token, &allowance.amount)?
            };
            Ok(chain::Allowance {
                owner: allowance.owner,
                spender: allowance.spender,
                asset: Asset {
                    token: allowance.token,
                    amount: value,
                },
            })
        })
        .collect::<anyhow::Result<_>>()?;

    Ok(Config {
        domain: SigningDomain {
            name: file.domain_name,
            version: file.domain_version,
            chain_id: file.chain_id,
            verifying_contract: file.engine,
        },
        engine: file.engine,
        stable: file.stable_token,
        stable_decimals: decimals[&file.stable_token],
        reference: file.reference_token,
        max_age: file.max_age,
        pool_fee: file.pool_fee,
        persistence_path: file.persistence_path,
        chain: chain::Seed {
            router: file.router,
            tokens: file
                .tokens
                .into_iter()
                .map(|token| chain::Token {
                    address: token.address,
                    info: chain::TokenInfo {
                        symbol: token.symbol,
                        decimals: token.decimals,
                    },
                })
                .collect(),
            feed: chain::Feed {
                decimals: file.feed.decimals,
                answer,
            },
            pools,
            balances,
            allowances,
        },
    })
}
