//! Order placement against a real SQLite file

mod common;

use canteen_server::db::repository::order as order_repo;
use canteen_server::orders::OrderError;
use common::*;
use shared::Money;
use shared::models::{CartLine, OrderStatus, TransactionType};

#[tokio::test]
async fn test_order_debits_wallet_and_snapshots_prices() {
    let ctx = setup().await;
    let state = &ctx.state;
    let student = funded_student(state, 500).await;
    let category = create_category(state).await;
    let item = create_item(state, &category, 100, true).await;

    let placed = state
        .coordinator
        .place_order(
            student.id,
            &[CartLine {
                item_id: item.id,
                quantity: 3,
            }],
        )
        .await
        .unwrap();

    assert_eq!(placed.order.order.total_amount, Money::from_major(300));
    assert_eq!(placed.order.order.status, OrderStatus::Pending);
    assert_eq!(placed.new_balance, Money::from_major(200));
    assert!(placed.order.order.order_number.starts_with("ORD"));
    assert!(placed.order.order.token_number.starts_with('T'));
    assert_eq!(placed.order.items.len(), 1);
    assert_eq!(placed.order.items[0].price, Money::from_major(100));
    assert_eq!(placed.order.items[0].item_name, item.name);

    assert_eq!(balance_of(state, student.id).await, Money::from_major(200));

    let ledger = state.ledger.transactions(student.id, 10).await.unwrap();
    let debit = ledger
        .iter()
        .find(|t| t.transaction_type == TransactionType::Debit)
        .unwrap();
    assert_eq!(debit.amount, Money::from_major(-300));
    assert_eq!(
        debit.reference.as_deref(),
        Some(placed.order.order.order_number.as_str())
    );

    let audit = state.ledger.reconcile(student.id).await.unwrap();
    assert!(audit.is_consistent());
}

#[tokio::test]
async fn test_price_change_does_not_touch_existing_orders() {
    let ctx = setup().await;
    let state = &ctx.state;
    let student = funded_student(state, 500).await;
    let category = create_category(state).await;
    let item = create_item(state, &category, 40, true).await;

    let placed = state
        .coordinator
        .place_order(student.id, &[CartLine { item_id: item.id, quantity: 2 }])
        .await
        .unwrap();

    canteen_server::db::repository::catalog::update_item(
        state.pool(),
        item.id,
        canteen_server::db::repository::catalog::ItemPatch {
            price: Some(Money::from_major(90)),
            ..Default::default()
        },
    )
    .await
    .unwrap();

    let lines = order_repo::find_items(state.pool(), placed.order.order.id)
        .await
        .unwrap();
    assert_eq!(lines[0].price, Money::from_major(40));
}

#[tokio::test]
async fn test_insufficient_funds_leaves_no_trace() {
    let ctx = setup().await;
    let state = &ctx.state;
    let student = funded_student(state, 50).await;
    let category = create_category(state).await;
    let item = create_item(state, &category, 120, true).await;

    let err = state
        .coordinator
        .place_order(student.id, &[CartLine { item_id: item.id, quantity: 1 }])
        .await
        .unwrap_err();

    match err {
        OrderError::InsufficientFunds {
            required,
            available,
        } => {
            assert_eq!(required, Money::from_major(120));
            assert_eq!(available, Money::from_major(50));
        }
        other => panic!("unexpected error: {other:?}"),
    }

    assert_eq!(balance_of(state, student.id).await, Money::from_major(50));
    assert_eq!(order_count(state, student.id).await, 0);
    assert_eq!(state.ledger.transactions(student.id, 10).await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_unavailable_item_rejects_whole_cart() {
    let ctx = setup().await;
    let state = &ctx.state;
    let student = funded_student(state, 500).await;
    let category = create_category(state).await;
    let good = create_item(state, &category, 30, true).await;
    let sold_out = create_item(state, &category, 30, false).await;

    let err = state
        .coordinator
        .place_order(
            student.id,
            &[
                CartLine { item_id: good.id, quantity: 1 },
                CartLine { item_id: sold_out.id, quantity: 1 },
            ],
        )
        .await
        .unwrap_err();

    assert!(matches!(err, OrderError::ItemUnavailable { item_id, .. } if item_id == sold_out.id));
    assert_eq!(balance_of(state, student.id).await, Money::from_major(500));
    assert_eq!(order_count(state, student.id).await, 0);
}

#[tokio::test]
async fn test_unknown_item_is_unavailable() {
    let ctx = setup().await;
    let state = &ctx.state;
    let student = funded_student(state, 100).await;

    let err = state
        .coordinator
        .place_order(student.id, &[CartLine { item_id: 424242, quantity: 1 }])
        .await
        .unwrap_err();

    assert!(matches!(err, OrderError::ItemUnavailable { name: None, .. }));
}

#[tokio::test]
async fn test_cart_validation() {
    let ctx = setup().await;
    let state = &ctx.state;
    let student = funded_student(state, 100).await;
    let category = create_category(state).await;
    let item = create_item(state, &category, 10, true).await;

    let err = state.coordinator.place_order(student.id, &[]).await.unwrap_err();
    assert!(matches!(err, OrderError::Empty));

    for quantity in [0, -1, 51] {
        let err = state
            .coordinator
            .place_order(student.id, &[CartLine { item_id: item.id, quantity }])
            .await
            .unwrap_err();
        assert!(matches!(err, OrderError::InvalidQuantity { .. }), "quantity {quantity}");
    }

    assert_eq!(balance_of(state, student.id).await, Money::from_major(100));
}

#[tokio::test]
async fn test_disabled_account_cannot_order() {
    let ctx = setup().await;
    let state = &ctx.state;
    let student = funded_student(state, 100).await;
    let category = create_category(state).await;
    let item = create_item(state, &category, 10, true).await;

    canteen_server::db::repository::user::update(
        state.pool(),
        student.id,
        canteen_server::db::repository::user::UserPatch {
            is_active: Some(false),
            ..Default::default()
        },
    )
    .await
    .unwrap();

    let err = state
        .coordinator
        .place_order(student.id, &[CartLine { item_id: item.id, quantity: 1 }])
        .await
        .unwrap_err();
    assert!(matches!(err, OrderError::AccountDisabled));
}

#[tokio::test]
async fn test_exact_balance_empties_wallet() {
    let ctx = setup().await;
    let state = &ctx.state;
    let student = funded_student(state, 120).await;
    let category = create_category(state).await;
    let item = create_item(state, &category, 40, true).await;

    let placed = state
        .coordinator
        .place_order(student.id, &[CartLine { item_id: item.id, quantity: 3 }])
        .await
        .unwrap();
    assert_eq!(placed.new_balance, Money::ZERO);
    assert!(state.ledger.reconcile(student.id).await.unwrap().is_consistent());
}
