//! Category & Item Repository

use super::{RepoError, RepoResult};
use shared::Money;
use shared::models::{Category, Item};
use sqlx::{Executor, QueryBuilder, Sqlite, SqlitePool};

const ITEM_COLUMNS: &str =
    "id, name, description, price, category_id, image, is_available, created_at, updated_at";

// ========== Categories ==========

pub async fn find_active_categories(pool: &SqlitePool) -> RepoResult<Vec<Category>> {
    let categories = sqlx::query_as::<_, Category>(
        "SELECT id, name, image, is_active, created_at FROM categories WHERE is_active = 1 ORDER BY name",
    )
    .fetch_all(pool)
    .await?;
    Ok(categories)
}

pub async fn find_category(pool: &SqlitePool, id: i64) -> RepoResult<Option<Category>> {
    let category = sqlx::query_as::<_, Category>(
        "SELECT id, name, image, is_active, created_at FROM categories WHERE id = ?",
    )
    .bind(id)
    .fetch_optional(pool)
    .await?;
    Ok(category)
}

pub async fn create_category(
    pool: &SqlitePool,
    name: &str,
    image: Option<&str>,
) -> RepoResult<Category> {
    let id = shared::util::snowflake_id();
    let now = shared::util::now_millis();
    sqlx::query("INSERT INTO categories (id, name, image, is_active, created_at) VALUES (?, ?, ?, 1, ?)")
        .bind(id)
        .bind(name)
        .bind(image)
        .bind(now)
        .execute(pool)
        .await?;

    find_category(pool, id)
        .await?
        .ok_or_else(|| RepoError::Database("Failed to create category".into()))
}

// ========== Items ==========

pub async fn find_item(pool: &SqlitePool, id: i64) -> RepoResult<Option<Item>> {
    let item = sqlx::query_as::<_, Item>(&format!("SELECT {ITEM_COLUMNS} FROM items WHERE id = ?"))
        .bind(id)
        .fetch_optional(pool)
        .await?;
    Ok(item)
}

/// Batch fetch; ids that do not exist are simply absent from the result
pub async fn find_items_by_ids<'c, E>(executor: E, ids: &[i64]) -> RepoResult<Vec<Item>>
where
    E: Executor<'c, Database = Sqlite>,
{
    if ids.is_empty() {
        return Ok(Vec::new());
    }
    let mut qb: QueryBuilder<Sqlite> =
        QueryBuilder::new(format!("SELECT {ITEM_COLUMNS} FROM items WHERE id IN ("));
    let mut separated = qb.separated(", ");
    for id in ids {
        separated.push_bind(*id);
    }
    separated.push_unseparated(")");

    let items = qb.build_query_as::<Item>().fetch_all(executor).await?;
    Ok(items)
}

/// Available items in active categories, optionally restricted to one category
pub async fn find_available_items(
    pool: &SqlitePool,
    category_id: Option<i64>,
) -> RepoResult<Vec<Item>> {
    let items = sqlx::query_as::<_, Item>(
        "SELECT i.id, i.name, i.description, i.price, i.category_id, i.image, i.is_available, i.created_at, i.updated_at \
         FROM items i JOIN categories c ON c.id = i.category_id \
         WHERE i.is_available = 1 AND c.is_active = 1 AND (?1 IS NULL OR i.category_id = ?1) \
         ORDER BY i.name",
    )
    .bind(category_id)
    .fetch_all(pool)
    .await?;
    Ok(items)
}

/// Row values for a new item
#[derive(Debug, Clone)]
pub struct NewItem {
    pub name: String,
    pub description: Option<String>,
    pub price: Money,
    pub category_id: i64,
    pub image: Option<String>,
    pub is_available: bool,
}

pub async fn create_item(pool: &SqlitePool, data: NewItem) -> RepoResult<Item> {
    let id = shared::util::snowflake_id();
    let now = shared::util::now_millis();
    sqlx::query(
        "INSERT INTO items (id, name, description, price, category_id, image, is_available, created_at, updated_at) \
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?8)",
    )
    .bind(id)
    .bind(&data.name)
    .bind(&data.description)
    .bind(data.price)
    .bind(data.category_id)
    .bind(&data.image)
    .bind(data.is_available)
    .bind(now)
    .execute(pool)
    .await?;

    find_item(pool, id)
        .await?
        .ok_or_else(|| RepoError::Database("Failed to create item".into()))
}

/// Column changes for an existing item; `None` keeps the stored value
#[derive(Debug, Clone, Default)]
pub struct ItemPatch {
    pub name: Option<String>,
    pub description: Option<String>,
    pub price: Option<Money>,
    pub category_id: Option<i64>,
    pub image: Option<String>,
    pub is_available: Option<bool>,
}

pub async fn update_item(pool: &SqlitePool, id: i64, patch: ItemPatch) -> RepoResult<Item> {
    let now = shared::util::now_millis();
    let rows = sqlx::query(
        "UPDATE items SET \
         name = COALESCE(?1, name), \
         description = COALESCE(?2, description), \
         price = COALESCE(?3, price), \
         category_id = COALESCE(?4, category_id), \
         image = COALESCE(?5, image), \
         is_available = COALESCE(?6, is_available), \
         updated_at = ?7 \
         WHERE id = ?8",
    )
    .bind(patch.name)
    .bind(patch.description)
    .bind(patch.price)
    .bind(patch.category_id)
    .bind(patch.image)
    .bind(patch.is_available)
    .bind(now)
    .bind(id)
    .execute(pool)
    .await?;

    if rows.rows_affected() == 0 {
        return Err(RepoError::NotFound(format!("Item {id}")));
    }
    find_item(pool, id)
        .await?
        .ok_or_else(|| RepoError::NotFound(format!("Item {id}")))
}

/// Number of order lines that reference the item
pub async fn count_item_orders(pool: &SqlitePool, item_id: i64) -> RepoResult<i64> {
    let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM order_items WHERE item_id = ?")
        .bind(item_id)
        .fetch_one(pool)
        .await?;
    Ok(count)
}

pub async fn delete_item(pool: &SqlitePool, id: i64) -> RepoResult<()> {
    let rows = sqlx::query("DELETE FROM items WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await?;
    if rows.rows_affected() == 0 {
        return Err(RepoError::NotFound(format!("Item {id}")));
    }
    Ok(())
}
