/// Metrics for the stop-loss engine.
#[derive(Debug, Clone, prometheus_metric_storage::MetricStorage)]
pub struct Metrics {
    /// The results of execution attempts.
    #[metric(labels("result"))]
    pub executions: prometheus::IntCounterVec,
    /// The results of price resolutions per source.
    #[metric(labels("source", "result"))]
    pub prices: prometheus::IntCounterVec,
    /// The results of cancellation requests.
    #[metric(labels("result"))]
    pub cancellations: prometheus::IntCounterVec,
    /// Refunds that could not be carried out after a failed swap.
    pub failed_refunds: prometheus::IntCounter,
    /// Orders finalized with their funds left in custody.
    pub stuck_orders: prometheus::IntCounter,
    /// Time spent executing an order, including failed attempts.
    #[metric(buckets(0.001, 0.005, 0.01, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0))]
    pub execution_time: prometheus::Histogram,
}

/// Setup the metrics registry.
pub fn init() {
    observe::metrics::setup_registry_reentrant(Some("stop_loss".to_owned()), None);
}

/// Get the metrics instance.
pub fn get() -> &'static Metrics {
    Metrics::instance(observe::metrics::get_storage_registry())
        .expect("unexpected error getting metrics instance")
}
