mod cancel;
mod domain;
mod execute;
mod hash;
mod healthz;
mod metrics;
mod status;

pub(super) use {
    cancel::cancel,
    domain::domain,
    execute::execute,
    hash::hash,
    healthz::healthz,
    metrics::metrics,
    status::status,
};
