use {
    crate::tests::{
        self,
        setup::{KEEPER, Test, Token},
    },
    alloy::signers::local::PrivateKeySigner,
    axum::http::StatusCode,
    model::{
        order::{Order, OrderCancellation},
        signature::{Signature, SigningScheme},
    },
    serde_json::{Value, json},
    std::time::Duration,
};

fn execute_request(order: &Order) -> Value {
    json!({
        "order": order.data,
        "signature": order.signature,
        "minStableOut": "0",
        "feeRecipient": KEEPER,
    })
}

fn cancel_request(test: &Test, order: &Order, key: &PrivateKeySigner) -> Value {
    let cancellation: Signature = OrderCancellation {
        order_hash: test.hash(order),
    }
    .sign(
        SigningScheme::Eip712,
        test.engine.authorizer().separator(),
        key,
    )
    .unwrap();
    json!({
        "order": order.data,
        "signature": order.signature,
        "cancellation": cancellation,
    })
}

#[tokio::test]
async fn execute_then_conflict() {
    let test = tests::setup().done().await;
    test.fund_holder(Token::Weth, "1");
    let order = test.sign(test.order(Token::Weth, "1", "1900"));
    let hash = test.hash(&order).to_string();

    let (status, body) = test
        .request("POST", "/api/v1/orders/execute", Some(execute_request(&order)))
        .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(
        body,
        json!({
            "orderHash": hash,
            "holder": test.holder(),
            "price": "1885220000",
            "priceSource": "primary",
            "feeAmount": "5000000000000000",
            "swapAmount": "995000000000000000",
            "stableOut": "1870166518",
        })
    );

    let (status, body) = test
        .request("GET", &format!("/api/v1/orders/{hash}/status"), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "orderHash": hash, "status": "filled" }));

    let (status, body) = test
        .request("POST", "/api/v1/orders/execute", Some(execute_request(&order)))
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["kind"], "AlreadyFinalized");
}

#[tokio::test]
async fn trigger_not_met() {
    let test = tests::setup().done().await;
    test.fund_holder(Token::Weth, "1");
    let order = test.sign(test.order(Token::Weth, "1", "1800"));

    let (status, body) = test
        .request("POST", "/api/v1/orders/execute", Some(execute_request(&order)))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["kind"], "TriggerNotMet");
}

#[tokio::test]
async fn stale_price_is_unavailable() {
    let test = tests::setup()
        .feed_age(Duration::from_secs(7200))
        .done()
        .await;
    test.fund_holder(Token::Weth, "1");
    let order = test.sign(test.order(Token::Weth, "1", "1900"));

    let (status, body) = test
        .request("POST", "/api/v1/orders/execute", Some(execute_request(&order)))
        .await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["kind"], "StalePrice");
}

#[tokio::test]
async fn cancel_with_holder_signature() {
    let test = tests::setup().done().await;
    test.fund_holder(Token::Weth, "1");
    let order = test.sign(test.order(Token::Weth, "1", "1900"));
    let hash = test.hash(&order).to_string();

    let stranger = PrivateKeySigner::random();
    let (status, body) = test
        .request(
            "POST",
            "/api/v1/orders/cancel",
            Some(cancel_request(&test, &order, &stranger)),
        )
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["kind"], "NotHolder");

    let (status, body) = test
        .request(
            "POST",
            "/api/v1/orders/cancel",
            Some(cancel_request(&test, &order, &test.holder)),
        )
        .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body, json!({ "orderHash": hash, "status": "cancelled" }));

    let (status, body) = test
        .request("POST", "/api/v1/orders/execute", Some(execute_request(&order)))
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["kind"], "AlreadyFinalized");
    assert_eq!(test.balance(Token::Weth, test.holder()), Token::Weth.amount("1"));
}

#[tokio::test]
async fn tampered_order_is_rejected() {
    let test = tests::setup().done().await;
    let mut order = test.sign(test.order(Token::Weth, "1", "1900"));
    order.data.trigger_price = Token::Usdc.amount("100000");

    let (status, body) = test
        .request("POST", "/api/v1/orders/execute", Some(execute_request(&order)))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["kind"], "InvalidSignature");
}

#[tokio::test]
async fn invalid_request_body() {
    let test = tests::setup().done().await;

    let (status, body) = test
        .request(
            "POST",
            "/api/v1/orders/execute",
            Some(json!({ "order": "not an order" })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["kind"], "InvalidRequest");

    // No JSON content type at all.
    let (status, body) = test.request("POST", "/api/v1/orders/cancel", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["kind"], "InvalidRequest");
}

#[tokio::test]
async fn invalid_order_hash() {
    let test = tests::setup().done().await;

    let (status, body) = test
        .request("GET", "/api/v1/orders/0x1234/status", None)
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["kind"], "InvalidOrderHash");
}

#[tokio::test]
async fn unknown_orders_are_open() {
    let test = tests::setup().done().await;
    let hash = format!("0x{}", "ab".repeat(32));

    let (status, body) = test
        .request("GET", &format!("/api/v1/orders/{hash}/status"), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "open");
}

#[tokio::test]
async fn order_hash() {
    let test = tests::setup().done().await;
    let data = test.order(Token::Uni, "10", "50");
    let query = format!(
        "holder={}&token={}&amount={}&triggerPrice={}&expiry={}&nonce={}&feeBps={}",
        data.holder,
        data.token,
        data.amount,
        data.trigger_price,
        data.expiry,
        data.nonce,
        data.fee_bps,
    );

    let (status, body) = test
        .request("GET", &format!("/api/v1/orders/hash?{query}"), None)
        .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["orderHash"], json!(test.engine.authorizer().hash(&data)));
    assert_eq!(
        body["structHash"],
        json!(alloy::primitives::B256::from(data.hash_struct()))
    );

    let (status, body) = test
        .request("GET", "/api/v1/orders/hash?holder=0x01", None)
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["kind"], "InvalidRequest");
}

#[tokio::test]
async fn signing_domain() {
    let test = tests::setup().done().await;

    let (status, body) = test.request("GET", "/api/v1/domain", None).await;
    assert_eq!(status, StatusCode::OK);
    let authorizer = test.engine.authorizer();
    assert_eq!(body["chainId"], 31337);
    assert_eq!(body["verifyingContract"], json!(crate::tests::setup::ENGINE));
    assert_eq!(body["name"], json!(authorizer.domain().name));
    assert_eq!(
        body["separator"],
        json!(alloy::primitives::B256::from(*authorizer.separator()))
    );
}

#[tokio::test]
async fn health_and_metrics() {
    let test = tests::setup().done().await;
    test.fund_holder(Token::Uni, "10");
    let order = test.sign(test.order(Token::Uni, "10", "50"));
    test.execute(&order).await.unwrap();

    let (status, _) = test.request("GET", "/healthz", None).await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = test.request("GET", "/metrics", None).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.as_str().unwrap().contains("executions"));
}
