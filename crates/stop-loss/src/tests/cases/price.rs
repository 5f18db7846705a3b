use {
    crate::{
        domain::{
            eth::{Address, TokenAddress},
            execution::Error,
            price,
        },
        tests::{self, setup::Token},
    },
    model::order::{OrderData, OrderStatus},
    std::time::Duration,
};

const HOUR: Duration = Duration::from_secs(3600);

#[tokio::test]
async fn stale_primary_price_blocks_execution() {
    let test = tests::setup().feed_age(2 * HOUR).done().await;
    test.fund_holder(Token::Weth, "1");
    // Deep in the money, but the price can't be trusted.
    let order = test.sign(test.order(Token::Weth, "1", "5000"));

    assert!(matches!(
        test.execute(&order).await,
        Err(Error::Price(price::Error::StalePrice { age, max_age }))
            if age == 2 * HOUR && max_age == HOUR
    ));
    assert_eq!(test.status(&order), OrderStatus::Open);
    assert_eq!(test.balance(Token::Weth, test.holder()), Token::Weth.amount("1"));

    // A fresh round unblocks the same order.
    test.update_feed(188_522_000_000, Duration::ZERO);
    let execution = test.execute(&order).await.unwrap();
    assert_eq!(execution.quote.source, price::Source::Primary);
    assert_eq!(test.status(&order), OrderStatus::Filled);
}

#[tokio::test]
async fn max_age_is_inclusive() {
    let test = tests::setup().feed_age(HOUR).done().await;
    test.fund_holder(Token::Weth, "1");
    let order = test.sign(test.order(Token::Weth, "1", "1900"));

    test.execute(&order).await.unwrap();
}

#[tokio::test]
async fn stale_primary_price_does_not_fall_back_to_pool() {
    let test = tests::setup()
        .feed_age(2 * HOUR)
        .weth_pool_price("1000")
        .done()
        .await;
    test.fund_holder(Token::Weth, "1");
    let order = test.sign(test.order(Token::Weth, "1", "1500"));

    assert!(matches!(
        test.execute(&order).await,
        Err(Error::Price(price::Error::StalePrice { .. }))
    ));
}

#[tokio::test]
async fn never_updated_feed_is_unavailable() {
    let test = tests::setup().answer(None).done().await;
    test.fund_holder(Token::Weth, "1");
    test.fund_holder(Token::Uni, "10");

    let order = test.sign(test.order(Token::Weth, "1", "1900"));
    let err = test.execute(&order).await.unwrap_err();
    assert!(matches!(
        err,
        Error::Price(price::Error::OracleUnavailable(_))
    ));
    assert!(err.class().is_retryable());

    // Pool priced tokens don't depend on the feed.
    let order = test.sign(test.order(Token::Uni, "10", "50"));
    test.execute(&order).await.unwrap();
}

#[tokio::test]
async fn non_positive_answer_is_unavailable() {
    let test = tests::setup().done().await;
    test.fund_holder(Token::Weth, "1");
    test.update_feed(0, Duration::ZERO);
    let order = test.sign(test.order(Token::Weth, "1", "1900"));

    assert!(matches!(
        test.execute(&order).await,
        Err(Error::Price(price::Error::OracleUnavailable(_)))
    ));
}

#[tokio::test]
async fn reference_asset_ignores_pool_price() {
    // The pool disagrees wildly with the feed.
    let test = tests::setup().weth_pool_price("1000").done().await;
    test.fund_holder(Token::Weth, "1");

    let order = test.sign(test.order(Token::Weth, "1", "1500"));
    assert!(matches!(
        test.execute(&order).await,
        Err(Error::TriggerNotMet { price, .. }) if price == Token::Usdc.amount("1885.22")
    ));

    // The swap itself still goes through the pool.
    let order = test.sign(test.order(Token::Weth, "1", "1900"));
    let expected = test.swap_output(Token::Weth, Token::Weth.amount("0.995"));
    let execution = test.execute(&order).await.unwrap();
    assert_eq!(execution.quote.price, Token::Usdc.amount("1885.22"));
    assert_eq!(execution.stable_out, expected);
    assert!(expected < Token::Usdc.amount("1000"));
}

#[tokio::test]
async fn pool_price_moves_trigger_orders() {
    let test = tests::setup().done().await;
    test.fund_holder(Token::Uni, "10");
    let order = test.sign(test.order(Token::Uni, "10", "45"));

    assert!(matches!(
        test.execute(&order).await,
        Err(Error::TriggerNotMet { price, trigger_price })
            if price == Token::Usdc.amount("49.50") && trigger_price == Token::Usdc.amount("45")
    ));
    assert_eq!(test.status(&order), OrderStatus::Open);

    test.set_pool_price(Token::Uni, "44.99");
    let execution = test.execute(&order).await.unwrap();
    assert_eq!(execution.quote.price, Token::Usdc.amount("44.99"));
    assert_eq!(execution.quote.source, price::Source::Pool);
    assert_eq!(test.status(&order), OrderStatus::Filled);
}

#[tokio::test]
async fn token_without_pool() {
    let test = tests::setup().done().await;
    let token = Address::repeat_byte(0x77);
    let order = test.sign(OrderData {
        token,
        ..test.order(Token::Uni, "10", "50")
    });

    let err = test.execute(&order).await.unwrap_err();
    assert!(matches!(
        err,
        Error::Price(price::Error::PoolNotFound { token: missing, .. })
            if missing == TokenAddress(token)
    ));
    assert_eq!(err.class(), crate::domain::Class::Price);
}
