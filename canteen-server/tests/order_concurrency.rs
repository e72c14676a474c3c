//! Concurrent orders against one wallet

mod common;

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use canteen_server::db::repository::catalog::{self, ItemPatch};
use canteen_server::orders::{DefaultTicketGenerator, OrderCoordinator, OrderError, TicketGenerator};
use sqlx::SqlitePool;
use common::*;
use shared::Money;
use shared::models::CartLine;

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_two_orders_race_for_one_balance() {
    let ctx = setup().await;
    let state = &ctx.state;
    let student = funded_student(state, 100).await;
    let category = create_category(state).await;
    let item = create_item(state, &category, 80, true).await;

    let cart = [CartLine {
        item_id: item.id,
        quantity: 1,
    }];
    let first = state.coordinator.clone();
    let second = state.coordinator.clone();
    let (a, b) = tokio::join!(
        tokio::spawn(async move { first.place_order(student.id, &cart).await }),
        tokio::spawn(async move { second.place_order(student.id, &cart).await }),
    );
    let results = [a.unwrap(), b.unwrap()];

    let successes = results.iter().filter(|r| r.is_ok()).count();
    assert_eq!(successes, 1, "exactly one order may win: {results:?}");
    assert!(results.iter().any(|r| matches!(
        r,
        Err(OrderError::InsufficientFunds { available, .. }) if *available == Money::from_major(20)
    )));

    assert_eq!(balance_of(state, student.id).await, Money::from_major(20));
    assert_eq!(order_count(state, student.id).await, 1);
    assert!(state.ledger.reconcile(student.id).await.unwrap().is_consistent());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_many_small_orders_never_overdraw() {
    let ctx = setup().await;
    let state = &ctx.state;
    let student = funded_student(state, 100).await;
    let category = create_category(state).await;
    let item = create_item(state, &category, 30, true).await;

    let mut handles = Vec::new();
    for _ in 0..8 {
        let coordinator = state.coordinator.clone();
        let user_id = student.id;
        let item_id = item.id;
        handles.push(tokio::spawn(async move {
            coordinator
                .place_order(user_id, &[CartLine { item_id, quantity: 1 }])
                .await
        }));
    }

    let mut placed = 0;
    for handle in handles {
        if handle.await.unwrap().is_ok() {
            placed += 1;
        }
    }

    // 100 / 30 = 3 orders at most
    assert_eq!(placed, 3);
    assert_eq!(balance_of(state, student.id).await, Money::from_major(10));
    assert!(state.ledger.reconcile(student.id).await.unwrap().is_consistent());
}

/// Hands out scripted order numbers first, then falls back to real ones
struct ScriptedTickets {
    numbers: Mutex<VecDeque<String>>,
    fallback: DefaultTicketGenerator,
}

impl ScriptedTickets {
    fn new(numbers: &[&str]) -> Self {
        Self {
            numbers: Mutex::new(numbers.iter().map(|n| n.to_string()).collect()),
            fallback: DefaultTicketGenerator,
        }
    }
}

impl TicketGenerator for ScriptedTickets {
    fn order_number(&self) -> String {
        let scripted = self.numbers.lock().unwrap().pop_front();
        scripted.unwrap_or_else(|| self.fallback.order_number())
    }

    fn token_number(&self) -> String {
        self.fallback.token_number()
    }
}

#[tokio::test]
async fn test_order_number_collision_is_retried() {
    let ctx = setup().await;
    let state = &ctx.state;
    let student = funded_student(state, 100).await;
    let category = create_category(state).await;
    let item = create_item(state, &category, 10, true).await;

    // second order collides once with the first, then gets a fresh number
    let tickets = Arc::new(ScriptedTickets::new(&["ORD260101AAAAAA", "ORD260101AAAAAA"]));
    let coordinator = OrderCoordinator::new(state.pool().clone(), state.resolver.clone())
        .with_tickets(tickets);
    let cart = [CartLine {
        item_id: item.id,
        quantity: 1,
    }];

    let first = coordinator.place_order(student.id, &cart).await.unwrap();
    assert_eq!(first.order.order.order_number, "ORD260101AAAAAA");

    let second = coordinator.place_order(student.id, &cart).await.unwrap();
    assert_ne!(second.order.order.order_number, "ORD260101AAAAAA");

    // the rolled back attempt did not debit
    assert_eq!(balance_of(state, student.id).await, Money::from_major(80));
    assert!(state.ledger.reconcile(student.id).await.unwrap().is_consistent());
}

#[tokio::test]
async fn test_persistent_collision_gives_up_without_debit() {
    let ctx = setup().await;
    let state = &ctx.state;
    let student = funded_student(state, 100).await;
    let category = create_category(state).await;
    let item = create_item(state, &category, 10, true).await;

    let tickets = Arc::new(ScriptedTickets::new(&["ORD260101BBBBBB"; 4]));
    let coordinator = OrderCoordinator::new(state.pool().clone(), state.resolver.clone())
        .with_tickets(tickets);
    let cart = [CartLine {
        item_id: item.id,
        quantity: 1,
    }];

    coordinator.place_order(student.id, &cart).await.unwrap();
    let err = coordinator.place_order(student.id, &cart).await.unwrap_err();
    assert!(matches!(err, OrderError::NumberCollision));

    assert_eq!(balance_of(state, student.id).await, Money::from_major(90));
    assert_eq!(order_count(state, student.id).await, 1);
}

/// Applies one catalog edit when the first order number is drawn, i.e.
/// after the cart was priced and before the transaction starts
struct EditOnFirstTicket {
    pool: SqlitePool,
    item_id: i64,
    patch: ItemPatch,
    fired: AtomicBool,
    fallback: DefaultTicketGenerator,
}

impl EditOnFirstTicket {
    fn new(pool: &SqlitePool, item_id: i64, patch: ItemPatch) -> Self {
        Self {
            pool: pool.clone(),
            item_id,
            patch,
            fired: AtomicBool::new(false),
            fallback: DefaultTicketGenerator,
        }
    }
}

impl TicketGenerator for EditOnFirstTicket {
    fn order_number(&self) -> String {
        if !self.fired.swap(true, Ordering::SeqCst) {
            tokio::task::block_in_place(|| {
                tokio::runtime::Handle::current().block_on(catalog::update_item(
                    &self.pool,
                    self.item_id,
                    self.patch.clone(),
                ))
            })
            .unwrap();
        }
        self.fallback.order_number()
    }

    fn token_number(&self) -> String {
        self.fallback.token_number()
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_price_change_during_checkout_charges_current_price() {
    let ctx = setup().await;
    let state = &ctx.state;
    let student = funded_student(state, 100).await;
    let category = create_category(state).await;
    let item = create_item(state, &category, 10, true).await;

    let tickets = Arc::new(EditOnFirstTicket::new(
        state.pool(),
        item.id,
        ItemPatch {
            price: Some(Money::from_major(15)),
            ..Default::default()
        },
    ));
    let coordinator = OrderCoordinator::new(state.pool().clone(), state.resolver.clone())
        .with_tickets(tickets);

    let placed = coordinator
        .place_order(
            student.id,
            &[CartLine {
                item_id: item.id,
                quantity: 2,
            }],
        )
        .await
        .unwrap();

    assert_eq!(placed.order.items[0].price, Money::from_major(15));
    assert_eq!(placed.order.order.total_amount, Money::from_major(30));
    assert_eq!(placed.new_balance, Money::from_major(70));
    assert_eq!(balance_of(state, student.id).await, Money::from_major(70));
    assert_eq!(order_count(state, student.id).await, 1);
    assert!(state.ledger.reconcile(student.id).await.unwrap().is_consistent());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_item_disabled_during_checkout_rolls_back() {
    let ctx = setup().await;
    let state = &ctx.state;
    let student = funded_student(state, 100).await;
    let category = create_category(state).await;
    let item = create_item(state, &category, 10, true).await;

    let tickets = Arc::new(EditOnFirstTicket::new(
        state.pool(),
        item.id,
        ItemPatch {
            is_available: Some(false),
            ..Default::default()
        },
    ));
    let coordinator = OrderCoordinator::new(state.pool().clone(), state.resolver.clone())
        .with_tickets(tickets);

    let err = coordinator
        .place_order(
            student.id,
            &[CartLine {
                item_id: item.id,
                quantity: 1,
            }],
        )
        .await
        .unwrap_err();

    assert!(matches!(err, OrderError::ItemUnavailable { item_id, .. } if item_id == item.id));
    assert_eq!(balance_of(state, student.id).await, Money::from_major(100));
    assert_eq!(order_count(state, student.id).await, 0);
    assert!(state.ledger.reconcile(student.id).await.unwrap().is_consistent());
}
