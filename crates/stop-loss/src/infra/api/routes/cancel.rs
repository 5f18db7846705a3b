use {
    crate::infra::{
        api::{State, error},
        observe,
    },
    model::{
        order::{OrderCancellation, OrderData, OrderHash, OrderStatus},
        signature::Signature,
    },
    serde::{Deserialize, Serialize},
    tracing::Instrument,
};

pub(in crate::infra::api) fn cancel(router: axum::Router<State>) -> axum::Router<State> {
    router.route("/orders/cancel", axum::routing::post(route))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
struct CancelRequest {
    order: OrderData,
    signature: Signature,
    /// Signature of the holder over the [`OrderCancellation`] of the order.
    cancellation: Signature,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct Cancelled {
    order_hash: OrderHash,
    status: OrderStatus,
}

async fn route(
    state: axum::extract::State<State>,
    req: Result<axum::Json<CancelRequest>, axum::extract::rejection::JsonRejection>,
) -> Result<axum::Json<Cancelled>, error::Response> {
    let req = req
        .inspect_err(|err| observe::invalid_dto("/orders/cancel", err))
        .map_err(error::rejection)?;
    let order = model::order::Order {
        data: req.order,
        signature: req.signature,
    };
    let authorizer = state.engine().authorizer();
    let order_hash = authorizer.hash(&order.data);
    let handle_request = async {
        let caller = authorizer.cancellation_signer(
            &OrderCancellation { order_hash },
            &req.cancellation,
        )?;
        match state
            .engine()
            .lifecycle()
            .cancel(authorizer, &order, caller)
            .await
        {
            Ok(_) => observe::cancelled(order_hash, caller),
            Err(err) => {
                observe::cancel_failed(caller, &err);
                return Err(error::Response::from(err));
            }
        }
        state.persist().await;
        Ok(axum::Json(Cancelled {
            order_hash,
            status: OrderStatus::Cancelled,
        }))
    };

    handle_request
        .instrument(tracing::info_span!("/orders/cancel", hash = %order_hash))
        .await
}
