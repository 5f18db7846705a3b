use {
    crate::{
        domain::{
            eth::{Address, U256},
            execution::Error,
            order,
            price,
        },
        infra::time,
        tests::{
            self,
            setup::{ENGINE, KEEPER, Token},
        },
    },
    model::order::{OrderData, OrderStatus},
    std::sync::Arc,
};

#[tokio::test]
async fn reference_asset_fills_at_primary_price() {
    let test = tests::setup().done().await;
    test.fund_holder(Token::Weth, "1");
    let order = test.sign(test.order(Token::Weth, "1", "1900"));

    let execution = test.execute(&order).await.unwrap();

    assert_eq!(execution.quote.price, U256::from(1_885_220_000u64));
    assert_eq!(execution.quote.source, price::Source::Primary);
    assert_eq!(execution.holder, test.holder());
    assert_eq!(execution.fee_amount, Token::Weth.amount("0.005"));
    assert_eq!(execution.swap_amount, Token::Weth.amount("0.995"));
    // 0.995 WETH net of the 0.3% pool fee at 1885.22 USDC.
    assert_eq!(execution.stable_out, Token::Usdc.amount("1870.166518"));

    assert_eq!(test.status(&order), OrderStatus::Filled);
    assert_eq!(test.balance(Token::Weth, test.holder()), U256::ZERO);
    assert_eq!(test.balance(Token::Usdc, test.holder()), execution.stable_out);
    assert_eq!(test.balance(Token::Weth, KEEPER), Token::Weth.amount("0.005"));
    assert_eq!(test.balance(Token::Weth, ENGINE), U256::ZERO);
    assert_eq!(test.balance(Token::Usdc, ENGINE), U256::ZERO);
}

#[tokio::test]
async fn pool_priced_token_fills_exactly_once() {
    let test = tests::setup().done().await;
    test.fund_holder(Token::Uni, "20");
    let order = test.sign(test.order(Token::Uni, "10", "50"));

    let execution = test.execute(&order).await.unwrap();
    assert_eq!(execution.quote.price, Token::Usdc.amount("49.50"));
    assert_eq!(execution.quote.source, price::Source::Pool);
    assert_eq!(execution.stable_out, Token::Usdc.amount("491.047425"));
    assert_eq!(test.balance(Token::Uni, test.holder()), Token::Uni.amount("10"));

    assert!(matches!(
        test.execute(&order).await,
        Err(Error::AlreadyFinalized(OrderStatus::Filled))
    ));
    // Nothing moved on the second attempt.
    assert_eq!(test.balance(Token::Uni, test.holder()), Token::Uni.amount("10"));
    assert_eq!(test.balance(Token::Usdc, test.holder()), execution.stable_out);
}

#[tokio::test]
async fn trigger_is_inclusive() {
    let test = tests::setup().done().await;
    test.fund_holder(Token::Weth, "2");

    let just_above = test.sign(test.order(Token::Weth, "1", "1885.219999"));
    assert!(matches!(
        test.execute(&just_above).await,
        Err(Error::TriggerNotMet { price, trigger_price })
            if price == U256::from(1_885_220_000u64) && trigger_price == U256::from(1_885_219_999u64)
    ));
    assert_eq!(test.status(&just_above), OrderStatus::Open);
    assert_eq!(test.balance(Token::Weth, test.holder()), Token::Weth.amount("2"));

    let equal = test.sign(test.order(Token::Weth, "1", "1885.22"));
    test.execute(&equal).await.unwrap();
    assert_eq!(test.status(&equal), OrderStatus::Filled);
}

#[tokio::test]
async fn fee_truncates_in_favour_of_the_holder() {
    let test = tests::setup().done().await;
    test.fund_holder(Token::Uni, "1");
    let order = test.sign(OrderData {
        amount: U256::from(1_000_000),
        ..test.order(Token::Uni, "0", "50")
    });

    let execution = test.execute(&order).await.unwrap();
    assert_eq!(execution.fee_amount, U256::from(5000));
    assert_eq!(execution.swap_amount, U256::from(995_000));
    assert_eq!(test.balance(Token::Uni, KEEPER), U256::from(5000));
    assert_eq!(
        test.balance(Token::Uni, test.holder()),
        Token::Uni.amount("1") - U256::from(1_000_000)
    );
}

#[tokio::test]
async fn expired_orders_are_rejected() {
    let test = tests::setup().done().await;
    test.fund_holder(Token::Weth, "1");
    let expiry = time::now_unix() - 1;
    let order = test.sign(OrderData {
        expiry,
        ..test.order(Token::Weth, "1", "1900")
    });

    assert!(matches!(
        test.execute(&order).await,
        Err(Error::OrderExpired(at)) if at == expiry
    ));
    assert_eq!(test.status(&order), OrderStatus::Open);

    // Expiring right now is still fine.
    let order = test.sign(OrderData {
        expiry: time::now_unix(),
        ..test.order(Token::Weth, "1", "1900")
    });
    test.execute(&order).await.unwrap();
}

#[tokio::test]
async fn tampered_orders_are_rejected() {
    let test = tests::setup().done().await;
    test.fund_holder(Token::Weth, "10");
    let mut order = test.sign(test.order(Token::Weth, "1", "1900"));
    order.data.amount = Token::Weth.amount("10");

    assert!(matches!(
        test.execute(&order).await,
        Err(Error::Order(order::Error::InvalidSignature))
    ));
    assert_eq!(test.balance(Token::Weth, test.holder()), Token::Weth.amount("10"));
}

#[tokio::test]
async fn invalid_orders_are_rejected() {
    let test = tests::setup().done().await;
    test.fund_holder(Token::Weth, "1");
    let order = test.sign(OrderData {
        fee_bps: 10_001,
        ..test.order(Token::Weth, "1", "1900")
    });
    assert!(matches!(
        test.execute(&order).await,
        Err(Error::Order(order::Error::InvalidOrder(_)))
    ));

    let order = test.sign(test.order(Token::Weth, "1", "1900"));
    assert!(matches!(
        test.engine.execute(&order, U256::ZERO, Address::ZERO).await,
        Err(Error::Order(order::Error::InvalidOrder(_)))
    ));
}

#[tokio::test]
async fn concurrent_executions_fill_once() {
    let test = Arc::new(tests::setup().done().await);
    // Enough funds for several fills, so only the lifecycle stops them.
    test.fund_holder(Token::Uni, "100");
    let order = test.sign(test.order(Token::Uni, "10", "50"));

    let attempts = (0..8)
        .map(|_| {
            let test = test.clone();
            tokio::spawn(async move { test.execute(&order).await })
        })
        .collect::<Vec<_>>();
    let mut filled = 0;
    for attempt in attempts {
        match attempt.await.unwrap() {
            Ok(_) => filled += 1,
            Err(err) => assert!(
                matches!(err, Error::AlreadyFinalized(OrderStatus::Filled)),
                "{err}"
            ),
        }
    }

    assert_eq!(filled, 1);
    assert_eq!(test.status(&order), OrderStatus::Filled);
    assert_eq!(test.balance(Token::Uni, test.holder()), Token::Uni.amount("90"));
    assert_eq!(test.balance(Token::Uni, KEEPER), Token::Uni.amount("0.05"));
}

#[tokio::test]
async fn slippage_leaves_no_trace() {
    let test = tests::setup().done().await;
    test.fund_holder(Token::Uni, "10");
    let order = test.sign(test.order(Token::Uni, "10", "50"));
    let expected = test.swap_output(Token::Uni, Token::Uni.amount("9.95"));

    assert!(matches!(
        test.engine
            .execute(&order, expected + U256::from(1), KEEPER)
            .await,
        Err(Error::SlippageExceeded { amount_out, .. }) if amount_out == expected
    ));
    assert_eq!(test.status(&order), OrderStatus::Open);
    assert_eq!(test.balance(Token::Uni, test.holder()), Token::Uni.amount("10"));
    assert_eq!(test.balance(Token::Uni, KEEPER), U256::ZERO);
    assert_eq!(test.balance(Token::Uni, ENGINE), U256::ZERO);
    assert_eq!(test.balance(Token::Usdc, test.holder()), U256::ZERO);

    // Exactly the minimum is accepted.
    let execution = test.engine.execute(&order, expected, KEEPER).await.unwrap();
    assert_eq!(execution.stable_out, expected);
}

#[tokio::test]
async fn failed_swap_refunds_the_holder() {
    // The pool can't pay out 491 USDC.
    let test = tests::setup().pool_reserves("100").done().await;
    test.fund_holder(Token::Uni, "10");
    let order = test.sign(test.order(Token::Uni, "10", "50"));

    assert!(matches!(test.execute(&order).await, Err(Error::Swap(_))));
    assert_eq!(test.status(&order), OrderStatus::Open);
    assert_eq!(test.balance(Token::Uni, test.holder()), Token::Uni.amount("10"));
    assert_eq!(test.balance(Token::Uni, ENGINE), U256::ZERO);
    assert_eq!(test.balance(Token::Uni, KEEPER), U256::ZERO);
}

#[tokio::test]
async fn missing_allowance_moves_nothing() {
    let test = tests::setup().done().await;
    test.fund_holder(Token::Uni, "10");
    test.chain
        .ledger
        .approve(Token::Uni.address(), test.holder(), ENGINE, U256::ZERO);
    let order = test.sign(test.order(Token::Uni, "10", "50"));

    let err = test.execute(&order).await.unwrap_err();
    assert!(matches!(err, Error::Reserve(_)));
    assert!(err.class().is_retryable());
    assert_eq!(test.status(&order), OrderStatus::Open);
    assert_eq!(test.balance(Token::Uni, test.holder()), Token::Uni.amount("10"));
}
