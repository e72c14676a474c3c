//! Price and availability resolution against the catalog tables

mod common;

use canteen_server::catalog::{Resolution, resolve_items};
use canteen_server::db::repository::catalog::{self, ItemPatch};
use canteen_server::orders::query;
use common::*;
use shared::Money;
use shared::models::CartLine;

#[tokio::test]
async fn test_resolve_keeps_request_order_and_duplicates() {
    let ctx = setup().await;
    let state = &ctx.state;
    let category = create_category(state).await;
    let a = create_item(state, &category, 40, true).await;
    let b = create_item(state, &category, 25, false).await;
    let missing = a.id.max(b.id) + 1000;

    let resolved = state
        .resolver
        .resolve(&[a.id, missing, b.id, a.id])
        .await
        .unwrap();

    let expected_a = Resolution::Available {
        item_id: a.id,
        name: a.name.clone(),
        price: Money::from_major(40),
    };
    assert_eq!(
        resolved,
        vec![
            expected_a.clone(),
            Resolution::Missing { item_id: missing },
            Resolution::Unavailable {
                item_id: b.id,
                name: b.name.clone(),
            },
            expected_a,
        ]
    );
    let ids: Vec<i64> = resolved.iter().map(Resolution::item_id).collect();
    assert_eq!(ids, [a.id, missing, b.id, a.id]);
}

#[tokio::test]
async fn test_resolve_is_stable_without_writes() {
    let ctx = setup().await;
    let state = &ctx.state;
    let category = create_category(state).await;
    let a = create_item(state, &category, 40, true).await;
    let b = create_item(state, &category, 25, false).await;
    let ids = [b.id, a.id, 424242];

    let first = state.resolver.resolve(&ids).await.unwrap();
    let second = state.resolver.resolve(&ids).await.unwrap();
    assert_eq!(first, second);

    // same answer from inside a transaction
    let mut tx = state.pool().begin().await.unwrap();
    let in_tx = resolve_items(&mut *tx, &ids).await.unwrap();
    tx.rollback().await.unwrap();
    assert_eq!(first, in_tx);

    assert!(state.resolver.resolve(&[]).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_price_update_is_fresh_but_orders_keep_snapshot() {
    let ctx = setup().await;
    let state = &ctx.state;
    let student = funded_student(state, 500).await;
    let category = create_category(state).await;
    let item = create_item(state, &category, 40, true).await;

    let placed = state
        .coordinator
        .place_order(
            student.id,
            &[CartLine {
                item_id: item.id,
                quantity: 2,
            }],
        )
        .await
        .unwrap();

    catalog::update_item(
        state.pool(),
        item.id,
        ItemPatch {
            price: Some(Money::from_major(55)),
            ..Default::default()
        },
    )
    .await
    .unwrap();

    let resolved = state.resolver.resolve(&[item.id]).await.unwrap();
    assert!(matches!(
        resolved.as_slice(),
        [Resolution::Available { price, .. }] if *price == Money::from_major(55)
    ));

    let detail = query::load_detail(state.pool(), placed.order.order.id)
        .await
        .unwrap();
    assert_eq!(detail.items.len(), 1);
    assert_eq!(detail.items[0].price, Money::from_major(40));
    assert_eq!(detail.order.total_amount, Money::from_major(80));
}
