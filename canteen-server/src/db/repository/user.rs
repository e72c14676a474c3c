//! User Repository
//!
//! Wallet balances are never written here; see [`super::wallet`].

use super::{RepoError, RepoResult};
use shared::models::{Role, User};
use sqlx::{Executor, Sqlite, SqlitePool};

const USER_COLUMNS: &str = "id, user_code, name, email, phone, photo, role, wallet_balance, is_active, pin_hash, password_hash, qr_code, created_at, updated_at";

/// Row values for a new user; hashes are computed by the caller
#[derive(Debug, Clone)]
pub struct NewUser {
    pub user_code: String,
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub photo: Option<String>,
    pub role: Role,
    pub pin_hash: String,
    pub password_hash: Option<String>,
    pub qr_code: String,
}

/// Column changes for an existing user; `None` keeps the stored value
#[derive(Debug, Clone, Default)]
pub struct UserPatch {
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub photo: Option<String>,
    pub is_active: Option<bool>,
    pub pin_hash: Option<String>,
}

pub async fn find_by_id<'c, E>(executor: E, id: i64) -> RepoResult<Option<User>>
where
    E: Executor<'c, Database = Sqlite>,
{
    let user = sqlx::query_as::<_, User>(&format!("SELECT {USER_COLUMNS} FROM users WHERE id = ?"))
        .bind(id)
        .fetch_optional(executor)
        .await?;
    Ok(user)
}

pub async fn find_by_code(pool: &SqlitePool, user_code: &str) -> RepoResult<Option<User>> {
    let user = sqlx::query_as::<_, User>(&format!(
        "SELECT {USER_COLUMNS} FROM users WHERE user_code = ?"
    ))
    .bind(user_code)
    .fetch_optional(pool)
    .await?;
    Ok(user)
}

pub async fn find_by_qr(pool: &SqlitePool, qr_code: &str) -> RepoResult<Option<User>> {
    let user = sqlx::query_as::<_, User>(&format!(
        "SELECT {USER_COLUMNS} FROM users WHERE qr_code = ?"
    ))
    .bind(qr_code)
    .fetch_optional(pool)
    .await?;
    Ok(user)
}

fn search_pattern(search: Option<&str>) -> Option<String> {
    search
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| format!("%{s}%"))
}

/// Paginated listing with optional free-text search and role filter
pub async fn find_all(
    pool: &SqlitePool,
    search: Option<&str>,
    role: Option<Role>,
    limit: i64,
    offset: i64,
) -> RepoResult<Vec<User>> {
    let users = sqlx::query_as::<_, User>(&format!(
        "SELECT {USER_COLUMNS} FROM users \
         WHERE (?1 IS NULL OR name LIKE ?1 OR email LIKE ?1 OR user_code LIKE ?1) \
         AND (?2 IS NULL OR role = ?2) \
         ORDER BY created_at DESC LIMIT ?3 OFFSET ?4"
    ))
    .bind(search_pattern(search))
    .bind(role)
    .bind(limit)
    .bind(offset)
    .fetch_all(pool)
    .await?;
    Ok(users)
}

pub async fn count_all(
    pool: &SqlitePool,
    search: Option<&str>,
    role: Option<Role>,
) -> RepoResult<i64> {
    let total = sqlx::query_scalar::<_, i64>(
        "SELECT COUNT(*) FROM users \
         WHERE (?1 IS NULL OR name LIKE ?1 OR email LIKE ?1 OR user_code LIKE ?1) \
         AND (?2 IS NULL OR role = ?2)",
    )
    .bind(search_pattern(search))
    .bind(role)
    .fetch_one(pool)
    .await?;
    Ok(total)
}

/// Next free code for the role: prefix + 3-digit counter (`STU007`)
pub async fn next_user_code(pool: &SqlitePool, role: Role) -> RepoResult<String> {
    let prefix = role.code_prefix();
    let codes = sqlx::query_scalar::<_, String>("SELECT user_code FROM users WHERE user_code LIKE ?")
        .bind(format!("{prefix}%"))
        .fetch_all(pool)
        .await?;

    let highest = codes
        .iter()
        .filter_map(|c| c.strip_prefix(prefix))
        .filter_map(|n| n.parse::<u32>().ok())
        .max()
        .unwrap_or(0);
    Ok(format!("{prefix}{:03}", highest + 1))
}

pub async fn create(pool: &SqlitePool, data: NewUser) -> RepoResult<User> {
    let id = shared::util::snowflake_id();
    let now = shared::util::now_millis();

    sqlx::query(
        "INSERT INTO users (id, user_code, name, email, phone, photo, role, wallet_balance, is_active, pin_hash, password_hash, qr_code, created_at, updated_at) \
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, 0, 1, ?8, ?9, ?10, ?11, ?11)",
    )
    .bind(id)
    .bind(&data.user_code)
    .bind(&data.name)
    .bind(&data.email)
    .bind(&data.phone)
    .bind(&data.photo)
    .bind(data.role)
    .bind(&data.pin_hash)
    .bind(&data.password_hash)
    .bind(&data.qr_code)
    .bind(now)
    .execute(pool)
    .await?;

    find_by_id(pool, id)
        .await?
        .ok_or_else(|| RepoError::Database("Failed to create user".into()))
}

pub async fn update(pool: &SqlitePool, id: i64, patch: UserPatch) -> RepoResult<User> {
    let now = shared::util::now_millis();
    let rows = sqlx::query(
        "UPDATE users SET \
         name = COALESCE(?1, name), \
         email = COALESCE(?2, email), \
         phone = COALESCE(?3, phone), \
         photo = COALESCE(?4, photo), \
         is_active = COALESCE(?5, is_active), \
         pin_hash = COALESCE(?6, pin_hash), \
         updated_at = ?7 \
         WHERE id = ?8",
    )
    .bind(patch.name)
    .bind(patch.email)
    .bind(patch.phone)
    .bind(patch.photo)
    .bind(patch.is_active)
    .bind(patch.pin_hash)
    .bind(now)
    .bind(id)
    .execute(pool)
    .await?;

    if rows.rows_affected() == 0 {
        return Err(RepoError::NotFound(format!("User {id}")));
    }
    find_by_id(pool, id)
        .await?
        .ok_or_else(|| RepoError::NotFound(format!("User {id}")))
}

pub async fn count_orders(pool: &SqlitePool, user_id: i64) -> RepoResult<i64> {
    let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM orders WHERE user_id = ?")
        .bind(user_id)
        .fetch_one(pool)
        .await?;
    Ok(count)
}

pub async fn count_users(pool: &SqlitePool) -> RepoResult<i64> {
    let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM users")
        .fetch_one(pool)
        .await?;
    Ok(count)
}
