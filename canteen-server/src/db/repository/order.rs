//! Order Repository
//!
//! Orders and their lines are inserted only inside the placement
//! transaction; afterwards the status column is the only thing written.

use super::RepoResult;
use shared::Money;
use shared::models::{Order, OrderItem, OrderStatus, OrderWithUser};
use sqlx::{Executor, QueryBuilder, Sqlite, SqliteConnection, SqlitePool};

const ORDER_COLUMNS: &str =
    "id, order_number, user_id, total_amount, status, token_number, created_at, updated_at";

pub async fn insert_order(conn: &mut SqliteConnection, order: &Order) -> RepoResult<()> {
    sqlx::query(
        "INSERT INTO orders (id, order_number, user_id, total_amount, status, token_number, created_at, updated_at) \
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
    )
    .bind(order.id)
    .bind(&order.order_number)
    .bind(order.user_id)
    .bind(order.total_amount)
    .bind(order.status)
    .bind(&order.token_number)
    .bind(order.created_at)
    .bind(order.updated_at)
    .execute(&mut *conn)
    .await?;
    Ok(())
}

/// Insert one order line and return its generated id
pub async fn insert_order_item(
    conn: &mut SqliteConnection,
    order_id: i64,
    item_id: i64,
    item_name: &str,
    quantity: i64,
    price: Money,
) -> RepoResult<i64> {
    let id = sqlx::query_scalar::<_, i64>(
        "INSERT INTO order_items (order_id, item_id, item_name, quantity, price) VALUES (?, ?, ?, ?, ?) RETURNING id",
    )
    .bind(order_id)
    .bind(item_id)
    .bind(item_name)
    .bind(quantity)
    .bind(price)
    .fetch_one(&mut *conn)
    .await?;
    Ok(id)
}

pub async fn find_by_id<'c, E>(executor: E, id: i64) -> RepoResult<Option<Order>>
where
    E: Executor<'c, Database = Sqlite>,
{
    let order = sqlx::query_as::<_, Order>(&format!("SELECT {ORDER_COLUMNS} FROM orders WHERE id = ?"))
        .bind(id)
        .fetch_optional(executor)
        .await?;
    Ok(order)
}

pub async fn find_items(pool: &SqlitePool, order_id: i64) -> RepoResult<Vec<OrderItem>> {
    let items = sqlx::query_as::<_, OrderItem>(
        "SELECT id, order_id, item_id, item_name, quantity, price FROM order_items WHERE order_id = ? ORDER BY id",
    )
    .bind(order_id)
    .fetch_all(pool)
    .await?;
    Ok(items)
}

/// Lines for several orders at once, in insertion order
pub async fn find_items_for_orders(
    pool: &SqlitePool,
    order_ids: &[i64],
) -> RepoResult<Vec<OrderItem>> {
    if order_ids.is_empty() {
        return Ok(Vec::new());
    }
    let mut qb: QueryBuilder<Sqlite> = QueryBuilder::new(
        "SELECT id, order_id, item_id, item_name, quantity, price FROM order_items WHERE order_id IN (",
    );
    let mut separated = qb.separated(", ");
    for id in order_ids {
        separated.push_bind(*id);
    }
    separated.push_unseparated(") ORDER BY id");

    let items = qb.build_query_as::<OrderItem>().fetch_all(pool).await?;
    Ok(items)
}

pub async fn find_by_user(pool: &SqlitePool, user_id: i64) -> RepoResult<Vec<Order>> {
    let orders = sqlx::query_as::<_, Order>(&format!(
        "SELECT {ORDER_COLUMNS} FROM orders WHERE user_id = ? ORDER BY created_at DESC, id DESC"
    ))
    .bind(user_id)
    .fetch_all(pool)
    .await?;
    Ok(orders)
}

/// Kitchen queue: every order with its owner, optionally filtered by status
pub async fn find_all(
    pool: &SqlitePool,
    status: Option<OrderStatus>,
    limit: i64,
    offset: i64,
) -> RepoResult<Vec<OrderWithUser>> {
    let orders = sqlx::query_as::<_, OrderWithUser>(
        "SELECT o.id, o.order_number, o.user_id, u.user_code, u.name AS user_name, o.total_amount, o.status, o.token_number, o.created_at, o.updated_at \
         FROM orders o JOIN users u ON u.id = o.user_id \
         WHERE (?1 IS NULL OR o.status = ?1) \
         ORDER BY o.created_at DESC, o.id DESC LIMIT ?2 OFFSET ?3",
    )
    .bind(status)
    .bind(limit)
    .bind(offset)
    .fetch_all(pool)
    .await?;
    Ok(orders)
}

pub async fn count_all(pool: &SqlitePool, status: Option<OrderStatus>) -> RepoResult<i64> {
    let total = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM orders WHERE (?1 IS NULL OR status = ?1)")
        .bind(status)
        .fetch_one(pool)
        .await?;
    Ok(total)
}

/// Compare-and-swap on the status column
///
/// Returns `false` when the order is no longer in `from`.
pub async fn update_status_if(
    pool: &SqlitePool,
    id: i64,
    from: OrderStatus,
    to: OrderStatus,
) -> RepoResult<bool> {
    let now = shared::util::now_millis();
    let rows = sqlx::query("UPDATE orders SET status = ?1, updated_at = ?2 WHERE id = ?3 AND status = ?4")
        .bind(to)
        .bind(now)
        .bind(id)
        .bind(from)
        .execute(pool)
        .await?;
    Ok(rows.rows_affected() == 1)
}
