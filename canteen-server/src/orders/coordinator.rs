//! Order Transaction Coordinator
//!
//! Turns a cart into a persisted order, its lines and the wallet debit in a
//! single SQLite transaction. The guarded balance decrement is the first
//! write so the transaction owns the write lock before anything else happens;
//! a concurrent order for the same wallet either waits on `busy_timeout` or
//! fails with a busy error that is retried.
//!
//! Prices are read once before the transaction and again on the transaction
//! right after the debit. A price that moved in between rolls the attempt
//! back and the retry prices the cart afresh; an item that became
//! unavailable fails the order.

use std::sync::Arc;

use shared::Money;
use shared::models::{CartLine, Order, OrderDetail, OrderItem, OrderStatus, PlacedOrder};
use shared::util::{now_millis, snowflake_id};
use sqlx::SqlitePool;

use super::OrderError;
use super::numbering::{DefaultTicketGenerator, TicketGenerator};
use crate::catalog::{PriceResolver, Resolution, resolve_items};
use crate::db::repository::{RepoError, order as order_repo, user as user_repo};
use crate::utils::{RetryPolicy, retry_transient};
use crate::wallet::ledger;

pub const DEFAULT_MAX_QUANTITY: i64 = 50;
pub const DEFAULT_MAX_LINES: usize = 50;

#[derive(Debug, Clone, Copy)]
pub struct OrderPolicy {
    pub max_quantity: i64,
    pub max_lines: usize,
    pub retry: RetryPolicy,
}

impl Default for OrderPolicy {
    fn default() -> Self {
        Self {
            max_quantity: DEFAULT_MAX_QUANTITY,
            max_lines: DEFAULT_MAX_LINES,
            retry: RetryPolicy::default(),
        }
    }
}

/// A cart line with its price snapshot
#[derive(Debug, Clone, PartialEq, Eq)]
struct PricedLine {
    item_id: i64,
    name: String,
    quantity: i64,
    price: Money,
}

#[derive(Debug, Clone)]
struct PricedCart {
    lines: Vec<PricedLine>,
    total: Money,
}

#[derive(Clone)]
pub struct OrderCoordinator {
    pool: SqlitePool,
    resolver: PriceResolver,
    tickets: Arc<dyn TicketGenerator>,
    policy: OrderPolicy,
}

impl OrderCoordinator {
    pub fn new(pool: SqlitePool, resolver: PriceResolver) -> Self {
        Self {
            pool,
            resolver,
            tickets: Arc::new(DefaultTicketGenerator),
            policy: OrderPolicy::default(),
        }
    }

    pub fn with_policy(mut self, policy: OrderPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn with_tickets(mut self, tickets: Arc<dyn TicketGenerator>) -> Self {
        self.tickets = tickets;
        self
    }

    pub fn policy(&self) -> &OrderPolicy {
        &self.policy
    }

    /// Place an order for `user_id`, debiting the wallet by the order total
    pub async fn place_order(
        &self,
        user_id: i64,
        lines: &[CartLine],
    ) -> Result<PlacedOrder, OrderError> {
        validate_cart(lines, &self.policy)?;

        let user = user_repo::find_by_id(&self.pool, user_id)
            .await?
            .ok_or(OrderError::UserNotFound(user_id))?;
        if !user.is_active {
            return Err(OrderError::AccountDisabled);
        }

        let ids: Vec<i64> = lines.iter().map(|l| l.item_id).collect();
        let ids = ids.as_slice();
        let placed = retry_transient(self.policy.retry, "order.place", move || async move {
            let cart = price_cart(lines, self.resolver.resolve(ids).await?)?;
            self.commit(user_id, lines, ids, &cart).await
        })
        .await?;

        tracing::info!(
            user_id,
            order_id = placed.order.order.id,
            order_number = %placed.order.order.order_number,
            total = %placed.order.order.total_amount,
            new_balance = %placed.new_balance,
            "Order placed"
        );
        Ok(placed)
    }

    async fn commit(
        &self,
        user_id: i64,
        lines: &[CartLine],
        ids: &[i64],
        cart: &PricedCart,
    ) -> Result<PlacedOrder, OrderError> {
        let order_number = self.tickets.order_number();
        let token_number = self.tickets.token_number();
        let description = format!("Order payment - {order_number}");

        let mut tx = self.pool.begin().await.map_err(RepoError::from)?;

        let debit =
            ledger::debit_on(&mut *tx, user_id, cart.total, &description, Some(&order_number))
                .await?;

        // The write lock is held from here on
        let current = price_cart(lines, resolve_items(&mut *tx, ids).await?)?;
        if let Some((stale, _)) = cart
            .lines
            .iter()
            .zip(&current.lines)
            .find(|(snapshot, fresh)| snapshot != fresh)
        {
            tracing::debug!(item_id = stale.item_id, "Item changed during checkout");
            return Err(OrderError::PriceChanged {
                item_id: stale.item_id,
            });
        }

        let now = now_millis();
        let order = Order {
            id: snowflake_id(),
            order_number,
            user_id,
            total_amount: cart.total,
            status: OrderStatus::Pending,
            token_number,
            created_at: now,
            updated_at: now,
        };
        order_repo::insert_order(&mut *tx, &order)
            .await
            .map_err(|e| match e {
                RepoError::Duplicate(_) => OrderError::NumberCollision,
                e => OrderError::Repo(e),
            })?;

        let mut items = Vec::with_capacity(cart.lines.len());
        for line in &cart.lines {
            let id = order_repo::insert_order_item(
                &mut *tx,
                order.id,
                line.item_id,
                &line.name,
                line.quantity,
                line.price,
            )
            .await?;
            items.push(OrderItem {
                id,
                order_id: order.id,
                item_id: line.item_id,
                item_name: line.name.clone(),
                quantity: line.quantity,
                price: line.price,
            });
        }

        tx.commit().await.map_err(RepoError::from)?;

        Ok(PlacedOrder {
            order: OrderDetail { order, items },
            new_balance: debit.balance,
        })
    }
}

fn validate_cart(lines: &[CartLine], policy: &OrderPolicy) -> Result<(), OrderError> {
    if lines.is_empty() {
        return Err(OrderError::Empty);
    }
    if lines.len() > policy.max_lines {
        return Err(OrderError::TooManyLines {
            lines: lines.len(),
            max: policy.max_lines,
        });
    }
    if let Some(line) = lines
        .iter()
        .find(|l| l.quantity < 1 || l.quantity > policy.max_quantity)
    {
        return Err(OrderError::InvalidQuantity {
            item_id: line.item_id,
            quantity: line.quantity,
            max: policy.max_quantity,
        });
    }
    Ok(())
}

/// Snapshot prices; the first missing or unavailable item fails the cart
fn price_cart(lines: &[CartLine], resolved: Vec<Resolution>) -> Result<PricedCart, OrderError> {
    let mut priced = Vec::with_capacity(lines.len());
    let mut total = Money::ZERO;

    for (line, resolution) in lines.iter().zip(resolved) {
        let (name, price) = match resolution {
            Resolution::Available { name, price, .. } => (name, price),
            Resolution::Unavailable { item_id, name } => {
                return Err(OrderError::ItemUnavailable {
                    item_id,
                    name: Some(name),
                });
            }
            Resolution::Missing { item_id } => {
                return Err(OrderError::ItemUnavailable {
                    item_id,
                    name: None,
                });
            }
        };

        let line_total = price
            .checked_mul(line.quantity)
            .ok_or(OrderError::TotalOverflow)?;
        total = total
            .checked_add(line_total)
            .ok_or(OrderError::TotalOverflow)?;

        priced.push(PricedLine {
            item_id: line.item_id,
            name,
            quantity: line.quantity,
            price,
        });
    }

    Ok(PricedCart {
        lines: priced,
        total,
    })
}
