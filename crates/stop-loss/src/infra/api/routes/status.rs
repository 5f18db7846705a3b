use {
    crate::infra::api::{State, error},
    model::order::{OrderHash, OrderStatus},
    serde::Serialize,
};

pub(in crate::infra::api) fn status(router: axum::Router<State>) -> axum::Router<State> {
    router.route("/orders/{hash}/status", axum::routing::get(route))
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct Status {
    order_hash: OrderHash,
    status: OrderStatus,
}

async fn route(
    state: axum::extract::State<State>,
    hash: axum::extract::Path<String>,
) -> Result<axum::Json<Status>, error::Response> {
    let order_hash = hash
        .parse::<OrderHash>()
        .map_err(|err| error::response(error::Kind::InvalidOrderHash, err))?;
    Ok(axum::Json(Status {
        order_hash,
        status: state.engine().lifecycle().status_of(&order_hash),
    }))
}
