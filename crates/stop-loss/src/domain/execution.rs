//! Execution of signed stop-loss orders on behalf of keepers.
//!
//! Funds move in stages through the engine's custody account:
//!
//! 1. reserve: the whole order amount is pulled from the holder
//! 2. swap: the amount net of the keeper fee is swapped into the stable asset
//! 3. settle: the fee goes to the keeper and the swap output to the holder
//!
//! A failed swap is compensated by refunding the reservation. The settle step
//! only moves funds custody already holds, in one batch. The order is marked
//! filled while still holding the order's lock, so no other attempt ever
//! observes the swap without the fill or the fill without the swap. If
//! funds can't leave custody again, after a failed refund or settle, the
//! order is filled anyway so it never reserves a second time.

use {
    crate::{
        domain::{
            Class,
            eth::{Address, Asset, FeeTier, Timestamp, TokenAddress, U256},
            lifecycle::Lifecycle,
            order::{self, Authorizer},
            price::{self, PriceQuote, Resolver},
            venue::{Ledger, Swap, SwapError, Swapper, Transfer},
        },
        infra::{observe, time},
    },
    model::order::{MAX_FEE_BPS, Order, OrderData, OrderHash, OrderStatus},
    std::sync::Arc,
};

/// The outcome of a successful execution.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Execution {
    pub order_hash: OrderHash,
    pub holder: Address,
    pub quote: PriceQuote,
    /// Paid to the keeper in the sold token.
    pub fee_amount: U256,
    pub swap_amount: U256,
    /// Stable asset credited to the holder.
    pub stable_out: U256,
}

pub struct Engine {
    authorizer: Arc<Authorizer>,
    lifecycle: Arc<Lifecycle>,
    resolver: Resolver,
    swapper: Arc<dyn Swapper>,
    ledger: Arc<dyn Ledger>,
    /// The engine's own ledger account. Holders approve it to pull the tokens
    /// they sell.
    custody: Address,
    fee: FeeTier,
}

impl Engine {
    pub fn new(
        authorizer: Arc<Authorizer>,
        lifecycle: Arc<Lifecycle>,
        resolver: Resolver,
        swapper: Arc<dyn Swapper>,
        ledger: Arc<dyn Ledger>,
        custody: Address,
        fee: FeeTier,
    ) -> Self {
        Self {
            authorizer,
            lifecycle,
            resolver,
            swapper,
            ledger,
            custody,
            fee,
        }
    }

    pub fn authorizer(&self) -> &Authorizer {
        &self.authorizer
    }

    pub fn lifecycle(&self) -> &Lifecycle {
        &self.lifecycle
    }

    /// Executes `order` if its trigger condition holds, selling the order
    /// amount net of the keeper fee for at least `min_stable_out`.
    ///
    /// Any error except [`Error::Settlement`] leaves the order's status and
    /// all balances unchanged. A settlement error leaves the order filled
    /// with its funds in custody.
    pub async fn execute(
        &self,
        order: &Order,
        min_stable_out: U256,
        fee_recipient: Address,
    ) -> Result<Execution, Error> {
        let hash = self.authorizer.hash(&order.data);
        observe::executing(hash, &order.data);
        let start = std::time::Instant::now();
        let result = self
            .try_execute(hash, order, min_stable_out, fee_recipient)
            .await;
        observe::execution_time(start.elapsed());
        match &result {
            Ok(execution) => observe::executed(execution),
            Err(err) => observe::execution_failed(hash, err),
        }
        result
    }

    async fn try_execute(
        &self,
        hash: OrderHash,
        order: &Order,
        min_stable_out: U256,
        fee_recipient: Address,
    ) -> Result<Execution, Error> {
        let holder = self.authorizer.verify(order)?;
        self.authorizer.validate(&order.data)?;
        if fee_recipient == Address::ZERO {
            return Err(order::Error::InvalidOrder("fee recipient is the zero address").into());
        }

        if time::now_unix() > order.data.expiry {
            return Err(Error::OrderExpired(order.data.expiry));
        }

        // Held until the order is filled or the attempt is abandoned.
        let mut lock = self.lifecycle.lock(hash).await;
        if lock.status() != OrderStatus::Open {
            return Err(Error::AlreadyFinalized(lock.status()));
        }

        let quote = self.resolver.resolve(TokenAddress(order.data.token)).await?;
        if quote.price > order.data.trigger_price {
            return Err(Error::TriggerNotMet {
                price: quote.price,
                trigger_price: order.data.trigger_price,
            });
        }

        let (fee_amount, swap_amount) = split_fee(order.data.amount, order.data.fee_bps);
        let result = self
            .swap_and_settle(
                holder,
                &order.data,
                fee_amount,
                swap_amount,
                min_stable_out,
                fee_recipient,
            )
            .await;
        if let Err(Error::Settlement(err)) = &result {
            // Custody holds the holder's funds or the swap output. The order
            // must never pull the order amount again.
            observe::stuck(hash, holder, err);
            lock.fill()
                .map_err(|err| Error::Settlement(anyhow::anyhow!(err)))?;
        }
        let stable_out = result?;
        lock.fill()
            .map_err(|err| Error::Settlement(anyhow::anyhow!(err)))?;

        Ok(Execution {
            order_hash: hash,
            holder,
            quote,
            fee_amount,
            swap_amount,
            stable_out,
        })
    }

    async fn swap_and_settle(
        &self,
        holder: Address,
        order: &OrderData,
        fee_amount: U256,
        swap_amount: U256,
        min_stable_out: U256,
        fee_recipient: Address,
    ) -> Result<U256, Error> {
        let token = TokenAddress(order.token);
        let stable = self.resolver.stable();

        self.ledger
            .transfer_from(token, self.custody, holder, self.custody, order.amount)
            .await
            .map_err(Error::Reserve)?;

        let swapped = self
            .swapper
            .swap(Swap {
                token_in: token,
                token_out: stable,
                fee: self.fee,
                amount_in: swap_amount,
                min_amount_out: min_stable_out,
                payer: self.custody,
                recipient: self.custody,
            })
            .await;
        let stable_out = match swapped {
            Ok(amount_out) => amount_out,
            Err(err) => {
                self.refund(token, holder, order.amount).await?;
                return Err(match err {
                    SwapError::SlippageExceeded {
                        amount_out,
                        min_amount_out,
                    } => Error::SlippageExceeded {
                        amount_out,
                        min_amount_out,
                    },
                    SwapError::Other(err) => Error::Swap(err),
                });
            }
        };

        self.ledger
            .transfer_batch(
                self.custody,
                vec![
                    Transfer {
                        asset: Asset {
                            token,
                            amount: fee_amount,
                        },
                        to: fee_recipient,
                    },
                    Transfer {
                        asset: Asset {
                            token: stable,
                            amount: stable_out,
                        },
                        to: holder,
                    },
                ],
            )
            .await
            .map_err(Error::Settlement)?;
        Ok(stable_out)
    }

    async fn refund(&self, token: TokenAddress, holder: Address, amount: U256) -> Result<(), Error> {
        self.ledger
            .transfer(token, self.custody, holder, amount)
            .await
            .map_err(|err| {
                observe::refund_failed(holder, token, amount, &err);
                Error::Settlement(err.context("refund after failed swap"))
            })
    }
}

/// Splits the order amount into the keeper fee and the amount to swap. The
/// fee truncates, so it never exceeds what the holder agreed to.
pub fn split_fee(amount: U256, fee_bps: u16) -> (U256, U256) {
    let fee_bps = U256::from(fee_bps.min(MAX_FEE_BPS));
    let denominator = U256::from(MAX_FEE_BPS);
    // Split as amount = q * denominator + r so that nothing overflows.
    let fee = amount / denominator * fee_bps + amount % denominator * fee_bps / denominator;
    (fee, amount - fee)
}

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    Order(#[from] order::Error),
    #[error("order expired at {0}")]
    OrderExpired(Timestamp),
    #[error("order is already {0}")]
    AlreadyFinalized(OrderStatus),
    #[error(transparent)]
    Price(#[from] price::Error),
    #[error("price {price} is above the trigger price {trigger_price}")]
    TriggerNotMet { price: U256, trigger_price: U256 },
    #[error("swap output {amount_out} is below the minimum {min_amount_out}")]
    SlippageExceeded {
        amount_out: U256,
        min_amount_out: U256,
    },
    #[error("failed to reserve the order amount: {0:#}")]
    Reserve(anyhow::Error),
    #[error("swap failed: {0:#}")]
    Swap(anyhow::Error),
    #[error("settlement failed: {0:#}")]
    Settlement(anyhow::Error),
}

impl Error {
    pub fn class(&self) -> Class {
        match self {
            Error::Order(_) => Class::Authorization,
            Error::OrderExpired(_) | Error::AlreadyFinalized(_) => Class::Lifecycle,
            Error::Price(_) => Class::Price,
            Error::TriggerNotMet { .. } => Class::Trigger,
            Error::SlippageExceeded { .. } | Error::Reserve(_) | Error::Swap(_) => {
                Class::Execution
            }
            Error::Settlement(_) => Class::Settlement,
        }
    }

    /// Stable identifier of the error, used for metrics and the API.
    pub fn kind(&self) -> &'static str {
        match self {
            Error::Order(order::Error::InvalidSignature) => "InvalidSignature",
            Error::Order(order::Error::InvalidOrder(_)) => "InvalidOrder",
            Error::OrderExpired(_) => "OrderExpired",
            Error::AlreadyFinalized(_) => "AlreadyFinalized",
            Error::Price(price::Error::OracleUnavailable(_)) => "OracleUnavailable",
            Error::Price(price::Error::StalePrice { .. }) => "StalePrice",
            Error::Price(price::Error::PoolNotFound { .. }) => "PoolNotFound",
            Error::Price(price::Error::Pool(_)) => "PoolUnavailable",
            Error::TriggerNotMet { .. } => "TriggerNotMet",
            Error::SlippageExceeded { .. } => "SlippageExceeded",
            Error::Reserve(_) => "Reserve",
            Error::Swap(_) => "Swap",
            Error::Settlement(_) => "Settlement",
        }
    }
}
