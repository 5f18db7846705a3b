//! Observability of the stop-loss engine. Every function represents an event
//! that is meaningful to the system: it logs the event and updates the
//! metrics if the event is worth measuring.

use {
    crate::domain::{
        eth::{Address, TokenAddress, U256},
        execution::{self, Execution},
        lifecycle,
        price::{self, PriceQuote},
    },
    model::order::{OrderData, OrderHash},
    std::{net::SocketAddr, path::Path},
};

mod metrics;

/// Setup the observability.
pub fn init(config: &observe::Config) {
    observe::tracing::initialize_reentrant(config);
    metrics::init();
}

/// The prometheus text exposition of all metrics.
pub fn encode_metrics() -> String {
    observe::metrics::encode(observe::metrics::get_registry())
}

/// Observe that the API started serving.
pub fn serving(addr: SocketAddr) {
    tracing::info!(%addr, "serving stop-loss API");
}

/// Observe that an execution attempt started.
pub fn executing(hash: OrderHash, order: &OrderData) {
    tracing::debug!(%hash, ?order, "executing order");
}

/// Observe a successful execution.
pub fn executed(execution: &Execution) {
    tracing::info!(
        hash = %execution.order_hash,
        holder = %execution.holder,
        price = %execution.quote.price,
        source = execution.quote.source.as_str(),
        fee = %execution.fee_amount,
        swapped = %execution.swap_amount,
        stable_out = %execution.stable_out,
        "order filled"
    );
    metrics::get()
        .executions
        .with_label_values(&["Success"])
        .inc();
}

/// Observe a failed execution attempt. Errors that cannot resolve themselves
/// are more interesting than an untriggered order.
pub fn execution_failed(hash: OrderHash, err: &execution::Error) {
    if err.class().is_retryable() {
        tracing::debug!(%hash, ?err, "order not executed");
    } else {
        tracing::warn!(%hash, ?err, "order execution failed");
    }
    metrics::get()
        .executions
        .with_label_values(&[err.kind()])
        .inc();
}

/// Measure how long the execution attempt took.
pub fn execution_time(elapsed: std::time::Duration) {
    metrics::get()
        .execution_time
        .observe(elapsed.as_secs_f64());
}

/// Observe a resolved price.
pub fn price_resolved(quote: &PriceQuote) {
    tracing::debug!(?quote, "resolved price");
    let result = if quote.stale { "Stale" } else { "Success" };
    metrics::get()
        .prices
        .with_label_values(&[quote.source.as_str(), result])
        .inc();
}

/// Observe that no price could be resolved.
pub fn price_failed(token: TokenAddress, err: &price::Error) {
    tracing::warn!(%token, ?err, "failed to resolve price");
    let (source, result) = match err {
        price::Error::OracleUnavailable(_) => ("primary", "OracleUnavailable"),
        price::Error::StalePrice { .. } => ("primary", "StalePrice"),
        price::Error::PoolNotFound { .. } => ("pool", "PoolNotFound"),
        price::Error::Pool(_) => ("pool", "PoolUnavailable"),
    };
    metrics::get()
        .prices
        .with_label_values(&[source, result])
        .inc();
}

/// Observe that the funds of a failed swap are stuck in custody.
pub fn refund_failed(holder: Address, token: TokenAddress, amount: U256, err: &anyhow::Error) {
    tracing::error!(%holder, %token, %amount, ?err, "failed to refund reserved funds");
    metrics::get().failed_refunds.inc();
}

/// Observe that an order was finalized without delivering its funds.
pub fn stuck(hash: OrderHash, holder: Address, err: &anyhow::Error) {
    tracing::error!(%hash, %holder, ?err, "order finalized with funds left in custody");
    metrics::get().stuck_orders.inc();
}

/// Observe a cancellation.
pub fn cancelled(hash: OrderHash, caller: Address) {
    tracing::info!(%hash, %caller, "order cancelled");
    metrics::get()
        .cancellations
        .with_label_values(&["Success"])
        .inc();
}

/// Observe a rejected cancellation.
pub fn cancel_failed(caller: Address, err: &lifecycle::Error) {
    tracing::debug!(%caller, ?err, "order not cancelled");
    metrics::get()
        .cancellations
        .with_label_values(&[err.kind()])
        .inc();
}

/// Observe that finalized orders were loaded from disk.
pub fn restored(path: &Path, orders: usize) {
    tracing::info!(?path, orders, "restored finalized orders");
}

/// Observe that finalized orders could not be written to disk.
pub fn persistence_failed(path: &Path, err: &anyhow::Error) {
    tracing::error!(?path, ?err, "failed to persist order statuses");
}

/// Observe a request body that could not be deserialized.
pub fn invalid_dto(endpoint: &str, err: &dyn std::error::Error) {
    tracing::debug!(endpoint, ?err, "invalid request body");
}
