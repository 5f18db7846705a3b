use {
    crate::domain::{execution, lifecycle, order, price},
    axum::http::StatusCode,
    serde::Serialize,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub enum Kind {
    InvalidRequest,
    InvalidSignature,
    InvalidOrder,
    InvalidOrderHash,
    NotHolder,
    AlreadyFinalized,
    OrderExpired,
    OracleUnavailable,
    StalePrice,
    PoolNotFound,
    PoolUnavailable,
    TriggerNotMet,
    SlippageExceeded,
    ExecutionFailed,
    SettlementFailed,
}

impl Kind {
    fn status(self) -> StatusCode {
        match self {
            Kind::InvalidRequest
            | Kind::InvalidSignature
            | Kind::InvalidOrder
            | Kind::InvalidOrderHash
            | Kind::OrderExpired
            | Kind::TriggerNotMet
            | Kind::SlippageExceeded => StatusCode::BAD_REQUEST,
            Kind::NotHolder => StatusCode::UNAUTHORIZED,
            Kind::AlreadyFinalized => StatusCode::CONFLICT,
            Kind::OracleUnavailable | Kind::StalePrice => StatusCode::SERVICE_UNAVAILABLE,
            Kind::PoolNotFound => StatusCode::NOT_FOUND,
            Kind::PoolUnavailable | Kind::ExecutionFailed | Kind::SettlementFailed => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Error {
    kind: Kind,
    description: String,
}

pub type Response = (StatusCode, axum::Json<Error>);

pub fn response(kind: Kind, description: impl ToString) -> Response {
    (
        kind.status(),
        axum::Json(Error {
            kind,
            description: description.to_string(),
        }),
    )
}

/// Neither side of the conversion is local, so rejections go through this
/// instead of `From`.
pub fn rejection(value: axum::extract::rejection::JsonRejection) -> Response {
    response(Kind::InvalidRequest, value.body_text())
}

fn order_kind(err: &order::Error) -> Kind {
    match err {
        order::Error::InvalidSignature => Kind::InvalidSignature,
        order::Error::InvalidOrder(_) => Kind::InvalidOrder,
    }
}

impl From<order::Error> for Response {
    fn from(value: order::Error) -> Self {
        response(order_kind(&value), value)
    }
}

impl From<lifecycle::Error> for Response {
    fn from(value: lifecycle::Error) -> Self {
        let kind = match &value {
            lifecycle::Error::Order(err) => order_kind(err),
            lifecycle::Error::NotHolder { .. } => Kind::NotHolder,
            lifecycle::Error::AlreadyFinalized(_) => Kind::AlreadyFinalized,
        };
        response(kind, value)
    }
}

impl From<execution::Error> for Response {
    fn from(value: execution::Error) -> Self {
        let kind = match &value {
            execution::Error::Order(err) => order_kind(err),
            execution::Error::OrderExpired(_) => Kind::OrderExpired,
            execution::Error::AlreadyFinalized(_) => Kind::AlreadyFinalized,
            execution::Error::Price(price::Error::OracleUnavailable(_)) => Kind::OracleUnavailable,
            execution::Error::Price(price::Error::StalePrice { .. }) => Kind::StalePrice,
            execution::Error::Price(price::Error::PoolNotFound { .. }) => Kind::PoolNotFound,
            execution::Error::Price(price::Error::Pool(_)) => Kind::PoolUnavailable,
            execution::Error::TriggerNotMet { .. } => Kind::TriggerNotMet,
            execution::Error::SlippageExceeded { .. } => Kind::SlippageExceeded,
            execution::Error::Reserve(_) | execution::Error::Swap(_) => Kind::ExecutionFailed,
            execution::Error::Settlement(_) => Kind::SettlementFailed,
        };
        response(kind, value)
    }
}
