//! Read side of orders: details with their lines

use std::collections::HashMap;

use shared::models::{Order, OrderDetail, OrderItem, OrderStatus, OrderWithUser};
use sqlx::SqlitePool;

use super::OrderError;
use crate::db::repository::{RepoResult, order as repo};

pub async fn load_detail(pool: &SqlitePool, order_id: i64) -> Result<OrderDetail, OrderError> {
    let order = repo::find_by_id(pool, order_id)
        .await?
        .ok_or(OrderError::NotFound(order_id))?;
    let items = repo::find_items(pool, order_id).await?;
    Ok(OrderDetail { order, items })
}

/// Attach lines to a batch of orders with one extra query
pub async fn with_items(pool: &SqlitePool, orders: Vec<Order>) -> RepoResult<Vec<OrderDetail>> {
    let ids: Vec<i64> = orders.iter().map(|o| o.id).collect();
    let mut grouped: HashMap<i64, Vec<OrderItem>> = HashMap::new();
    for item in repo::find_items_for_orders(pool, &ids).await? {
        grouped.entry(item.order_id).or_default().push(item);
    }

    Ok(orders
        .into_iter()
        .map(|order| OrderDetail {
            items: grouped.remove(&order.id).unwrap_or_default(),
            order,
        })
        .collect())
}

/// A user's own orders, newest first
pub async fn orders_for_user(pool: &SqlitePool, user_id: i64) -> RepoResult<Vec<OrderDetail>> {
    let orders = repo::find_by_user(pool, user_id).await?;
    with_items(pool, orders).await
}

/// Staff queue page plus the total row count
pub async fn order_queue(
    pool: &SqlitePool,
    status: Option<OrderStatus>,
    limit: i64,
    offset: i64,
) -> RepoResult<(Vec<OrderWithUser>, i64)> {
    let orders = repo::find_all(pool, status, limit, offset).await?;
    let total = repo::count_all(pool, status).await?;
    Ok((orders, total))
}
