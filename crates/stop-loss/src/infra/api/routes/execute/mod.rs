use {
    crate::{
        domain::execution,
        infra::{
            api::{State, error},
            observe,
        },
    },
    tracing::Instrument,
};

mod dto;

pub(in crate::infra::api) fn execute(router: axum::Router<State>) -> axum::Router<State> {
    router.route("/orders/execute", axum::routing::post(route))
}

async fn route(
    state: axum::extract::State<State>,
    req: Result<axum::Json<dto::ExecuteRequest>, axum::extract::rejection::JsonRejection>,
) -> Result<axum::Json<dto::Executed>, error::Response> {
    let req = req
        .inspect_err(|err| observe::invalid_dto("/orders/execute", err))
        .map_err(error::rejection)?;
    let order = req.order();
    let hash = state.engine().authorizer().hash(&order.data);
    let handle_request = async {
        let result = state
            .engine()
            .execute(&order, req.min_stable_out(), req.fee_recipient())
            .await;
        // Failed settlements finalize the order as well.
        if matches!(result, Ok(_) | Err(execution::Error::Settlement(_))) {
            state.persist().await;
        }
        Ok(axum::Json(dto::Executed::new(&result?)))
    };

    handle_request
        .instrument(tracing::info_span!("/orders/execute", %hash))
        .await
}
