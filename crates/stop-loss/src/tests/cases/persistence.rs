use {
    crate::{
        domain::{Lifecycle, lifecycle},
        infra::Persistence,
        tests::{
            self,
            setup::{KEEPER, Token},
        },
    },
    axum::http::StatusCode,
    model::order::OrderStatus,
    serde_json::json,
};

#[tokio::test]
async fn finalized_orders_survive_restarts() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("orders.json");
    let test = tests::setup().persistence(path.clone()).done().await;
    test.fund_holder(Token::Weth, "2");
    let filled = test.sign(test.order(Token::Weth, "1", "1900"));
    let open = test.sign(test.order(Token::Weth, "1", "1000"));

    let (status, body) = test
        .request(
            "POST",
            "/api/v1/orders/execute",
            Some(json!({
                "order": filled.data,
                "signature": filled.signature,
                "minStableOut": "0",
                "feeRecipient": KEEPER,
            })),
        )
        .await;
    assert_eq!(status, StatusCode::OK, "{body}");

    let stored = Persistence::new(path).load().await.unwrap();
    assert_eq!(stored.len(), 1);
    assert_eq!(stored[&test.hash(&filled)], OrderStatus::Filled);

    // A fresh process picks up where the last one stopped.
    let restarted = Lifecycle::default();
    restarted.restore(stored);
    assert_eq!(
        restarted.status_of(&test.hash(&filled)),
        OrderStatus::Filled
    );
    assert_eq!(restarted.status_of(&test.hash(&open)), OrderStatus::Open);
    assert!(matches!(
        restarted.lock(test.hash(&filled)).await.ensure_open(),
        Err(lifecycle::Error::AlreadyFinalized(
            OrderStatus::Filled
        ))
    ));
}
