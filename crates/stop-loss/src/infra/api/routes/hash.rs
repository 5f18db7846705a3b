use {
    crate::infra::api::{State, error},
    model::order::{OrderData, OrderHash},
    serde::Serialize,
};

pub(in crate::infra::api) fn hash(router: axum::Router<State>) -> axum::Router<State> {
    router.route("/orders/hash", axum::routing::get(route))
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct Hash {
    order_hash: OrderHash,
    /// The EIP-712 struct hash, without the domain.
    struct_hash: alloy::primitives::B256,
}

/// The canonical hash of the order given in the query string. Wallets sign
/// exactly this digest.
async fn route(
    state: axum::extract::State<State>,
    order: Result<axum::extract::Query<OrderData>, axum::extract::rejection::QueryRejection>,
) -> Result<axum::Json<Hash>, error::Response> {
    let order = order.map_err(|err| error::response(error::Kind::InvalidRequest, err.body_text()))?;
    Ok(axum::Json(Hash {
        order_hash: state.engine().authorizer().hash(&order),
        struct_hash: order.hash_struct().into(),
    }))
}
