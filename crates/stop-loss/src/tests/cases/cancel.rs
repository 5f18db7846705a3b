use {
    crate::{
        domain::{execution, lifecycle},
        tests::{self, setup::Token},
    },
    alloy::signers::local::PrivateKeySigner,
    model::order::OrderStatus,
};

#[tokio::test]
async fn cancelled_orders_never_execute() {
    let test = tests::setup().done().await;
    test.fund_holder(Token::Weth, "1");
    let order = test.sign(test.order(Token::Weth, "1", "1900"));

    let hash = test
        .engine
        .lifecycle()
        .cancel(test.engine.authorizer(), &order, test.holder())
        .await
        .unwrap();
    assert_eq!(hash, test.hash(&order));
    assert_eq!(test.status(&order), OrderStatus::Cancelled);

    assert!(matches!(
        test.execute(&order).await,
        Err(execution::Error::AlreadyFinalized(OrderStatus::Cancelled))
    ));
    assert_eq!(test.balance(Token::Weth, test.holder()), Token::Weth.amount("1"));

    // Cancelling twice is an error as well.
    assert_eq!(
        test.engine
            .lifecycle()
            .cancel(test.engine.authorizer(), &order, test.holder())
            .await,
        Err(lifecycle::Error::AlreadyFinalized(OrderStatus::Cancelled))
    );
}

#[tokio::test]
async fn only_the_holder_cancels() {
    let test = tests::setup().done().await;
    let order = test.sign(test.order(Token::Weth, "1", "1900"));
    let stranger = PrivateKeySigner::random().address();

    assert_eq!(
        test.engine
            .lifecycle()
            .cancel(test.engine.authorizer(), &order, stranger)
            .await,
        Err(lifecycle::Error::NotHolder {
            caller: stranger,
            holder: test.holder(),
        })
    );
    assert_eq!(test.status(&order), OrderStatus::Open);
}

#[tokio::test]
async fn filled_orders_stay_filled() {
    let test = tests::setup().done().await;
    test.fund_holder(Token::Uni, "10");
    let order = test.sign(test.order(Token::Uni, "10", "50"));
    test.execute(&order).await.unwrap();

    assert_eq!(
        test.engine
            .lifecycle()
            .cancel(test.engine.authorizer(), &order, test.holder())
            .await,
        Err(lifecycle::Error::AlreadyFinalized(OrderStatus::Filled))
    );
    assert_eq!(test.status(&order), OrderStatus::Filled);
}
