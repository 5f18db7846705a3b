use {
    crate::infra::api::State,
    alloy::primitives::B256,
    model::SigningDomain,
    serde::Serialize,
};

pub(in crate::infra::api) fn domain(router: axum::Router<State>) -> axum::Router<State> {
    router.route("/domain", axum::routing::get(route))
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct Domain {
    #[serde(flatten)]
    domain: SigningDomain,
    separator: B256,
}

async fn route(state: axum::extract::State<State>) -> axum::Json<Domain> {
    let authorizer = state.engine().authorizer();
    axum::Json(Domain {
        domain: authorizer.domain().clone(),
        separator: (*authorizer.separator()).into(),
    })
}
