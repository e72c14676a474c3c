//! Wallet Repository
//!
//! Raw balance and ledger statements. Only `crate::wallet::ledger` calls the
//! mutating functions, always pairing a balance change with a ledger row on
//! the same connection.

use super::RepoResult;
use shared::Money;
use shared::models::{PaymentMethod, TransactionStatus, TransactionType, WalletTransaction};
use sqlx::{Executor, Sqlite, SqliteConnection};

const TX_COLUMNS: &str = "id, user_id, amount, transaction_type, description, status, payment_method, external_txn_id, reference, created_at";

/// Add to the balance only while the result stays within `ceiling`
///
/// `None` means the user is missing or the new balance would pass the
/// ceiling. Callers make sure `amount <= ceiling`.
pub async fn increment_balance_capped(
    conn: &mut SqliteConnection,
    user_id: i64,
    amount: Money,
    ceiling: Money,
) -> RepoResult<Option<Money>> {
    let headroom = ceiling.minor_units() - amount.minor_units();
    let balance = sqlx::query_scalar::<_, Money>(
        "UPDATE users SET wallet_balance = wallet_balance + ?1, updated_at = ?2 \
         WHERE id = ?3 AND wallet_balance <= ?4 RETURNING wallet_balance",
    )
    .bind(amount)
    .bind(shared::util::now_millis())
    .bind(user_id)
    .bind(headroom)
    .fetch_optional(&mut *conn)
    .await?;
    Ok(balance)
}

/// Subtract from the balance only if it covers `amount`
///
/// `None` means the guard failed: the user is missing or the balance is too
/// low. The check and the write are one statement, so concurrent debits
/// cannot both pass against the same balance.
pub async fn decrement_balance_guarded(
    conn: &mut SqliteConnection,
    user_id: i64,
    amount: Money,
) -> RepoResult<Option<Money>> {
    let balance = sqlx::query_scalar::<_, Money>(
        "UPDATE users SET wallet_balance = wallet_balance - ?1, updated_at = ?2 \
         WHERE id = ?3 AND wallet_balance >= ?1 RETURNING wallet_balance",
    )
    .bind(amount)
    .bind(shared::util::now_millis())
    .bind(user_id)
    .fetch_optional(&mut *conn)
    .await?;
    Ok(balance)
}

pub async fn current_balance<'c, E>(executor: E, user_id: i64) -> RepoResult<Option<Money>>
where
    E: Executor<'c, Database = Sqlite>,
{
    let balance = sqlx::query_scalar::<_, Money>("SELECT wallet_balance FROM users WHERE id = ?")
        .bind(user_id)
        .fetch_optional(executor)
        .await?;
    Ok(balance)
}

/// Row values for a ledger entry
#[derive(Debug, Clone)]
pub struct NewTransaction<'a> {
    pub user_id: i64,
    pub amount: Money,
    pub transaction_type: TransactionType,
    pub description: &'a str,
    pub status: TransactionStatus,
    pub payment_method: Option<PaymentMethod>,
    pub external_txn_id: Option<&'a str>,
    pub reference: Option<&'a str>,
}

pub async fn insert_transaction(
    conn: &mut SqliteConnection,
    tx: NewTransaction<'_>,
) -> RepoResult<WalletTransaction> {
    let row = sqlx::query_as::<_, WalletTransaction>(&format!(
        "INSERT INTO wallet_transactions (user_id, amount, transaction_type, description, status, payment_method, external_txn_id, reference, created_at) \
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9) RETURNING {TX_COLUMNS}"
    ))
    .bind(tx.user_id)
    .bind(tx.amount)
    .bind(tx.transaction_type)
    .bind(tx.description)
    .bind(tx.status)
    .bind(tx.payment_method)
    .bind(tx.external_txn_id)
    .bind(tx.reference)
    .bind(shared::util::now_millis())
    .fetch_one(&mut *conn)
    .await?;
    Ok(row)
}

/// Newest first
pub async fn find_by_user<'c, E>(
    executor: E,
    user_id: i64,
    limit: i64,
) -> RepoResult<Vec<WalletTransaction>>
where
    E: Executor<'c, Database = Sqlite>,
{
    let rows = sqlx::query_as::<_, WalletTransaction>(&format!(
        "SELECT {TX_COLUMNS} FROM wallet_transactions WHERE user_id = ? ORDER BY id DESC LIMIT ?"
    ))
    .bind(user_id)
    .bind(limit)
    .fetch_all(executor)
    .await?;
    Ok(rows)
}

/// Whether a SUCCESS row already carries this external payment id
pub async fn external_payment_exists<'c, E>(executor: E, external_txn_id: &str) -> RepoResult<bool>
where
    E: Executor<'c, Database = Sqlite>,
{
    let exists = sqlx::query_scalar::<_, i64>(
        "SELECT COUNT(*) FROM wallet_transactions WHERE external_txn_id = ? AND status = 'SUCCESS'",
    )
    .bind(external_txn_id)
    .fetch_one(executor)
    .await?;
    Ok(exists > 0)
}

/// Sum of SUCCESS amounts; equals the stored balance at rest
pub async fn success_total<'c, E>(executor: E, user_id: i64) -> RepoResult<Money>
where
    E: Executor<'c, Database = Sqlite>,
{
    let total = sqlx::query_scalar::<_, i64>(
        "SELECT COALESCE(SUM(amount), 0) FROM wallet_transactions WHERE user_id = ? AND status = 'SUCCESS'",
    )
    .bind(user_id)
    .fetch_one(executor)
    .await?;
    Ok(Money::from_minor(total))
}
