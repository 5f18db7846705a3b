use crate::infra::observe;

pub(in crate::infra::api) fn metrics(app: axum::Router) -> axum::Router {
    app.route("/metrics", axum::routing::get(route))
}

async fn route() -> String {
    observe::encode_metrics()
}
