//! Wallet Ledger
//!
//! Every balance change is paired with a ledger row on the same connection
//! inside one transaction. The `*_on` functions run on a caller-owned
//! connection so order placement can fold the debit into its own
//! transaction; the [`WalletLedger`] methods open and commit their own.

use serde::Serialize;
use shared::Money;
use shared::models::{PaymentMethod, TransactionStatus, TransactionType, WalletTransaction};
use sqlx::{SqliteConnection, SqlitePool};

use super::WalletError;
use crate::db::repository::{RepoError, wallet as repo};
use crate::utils::{RetryPolicy, retry_transient};

/// Highest balance a wallet may hold (₹1,00,00,000)
pub const MAX_WALLET_BALANCE: Money = Money::from_major(10_000_000);

/// Where a credit came from
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaymentRef {
    pub method: PaymentMethod,
    pub external_txn_id: Option<String>,
}

impl PaymentRef {
    pub fn admin_recharge() -> Self {
        Self {
            method: PaymentMethod::AdminRecharge,
            external_txn_id: None,
        }
    }

    pub fn upi(transaction_id: impl Into<String>) -> Self {
        Self {
            method: PaymentMethod::Upi,
            external_txn_id: Some(transaction_id.into()),
        }
    }
}

/// A written ledger row and the balance right after it
#[derive(Debug, Clone, Serialize)]
pub struct LedgerEntry {
    pub transaction: WalletTransaction,
    pub balance: Money,
}

/// Stored balance next to the ledger sum, for audits
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Reconciliation {
    pub balance: Money,
    pub ledger_total: Money,
}

impl Reconciliation {
    pub fn is_consistent(&self) -> bool {
        self.balance == self.ledger_total
    }
}

/// Credit on an open connection: balance first, then the CREDIT/SUCCESS row
pub(crate) async fn credit_on(
    conn: &mut SqliteConnection,
    user_id: i64,
    amount: Money,
    description: &str,
    payment: Option<&PaymentRef>,
) -> Result<LedgerEntry, WalletError> {
    if !amount.is_positive() {
        return Err(WalletError::InvalidAmount);
    }
    let limit_exceeded = WalletError::BalanceLimitExceeded {
        limit: MAX_WALLET_BALANCE,
    };
    if amount > MAX_WALLET_BALANCE {
        return Err(limit_exceeded);
    }

    let Some(balance) =
        repo::increment_balance_capped(conn, user_id, amount, MAX_WALLET_BALANCE).await?
    else {
        return Err(match repo::current_balance(&mut *conn, user_id).await? {
            Some(_) => limit_exceeded,
            None => WalletError::UserNotFound(user_id),
        });
    };

    let external_txn_id = payment.and_then(|p| p.external_txn_id.as_deref());
    let transaction = repo::insert_transaction(
        conn,
        repo::NewTransaction {
            user_id,
            amount,
            transaction_type: TransactionType::Credit,
            description,
            status: TransactionStatus::Success,
            payment_method: payment.map(|p| p.method),
            external_txn_id,
            reference: None,
        },
    )
    .await
    .map_err(|e| match (e, external_txn_id) {
        (RepoError::Duplicate(_), Some(txn)) => WalletError::PaymentAlreadyProcessed(txn.to_string()),
        (e, _) => WalletError::Repo(e),
    })?;

    Ok(LedgerEntry {
        transaction,
        balance,
    })
}

/// Debit on an open connection: guarded decrement, then the DEBIT/SUCCESS row
///
/// The guarded decrement is the first write, so the caller's transaction
/// holds the write lock before anything else is checked.
pub(crate) async fn debit_on(
    conn: &mut SqliteConnection,
    user_id: i64,
    amount: Money,
    description: &str,
    reference: Option<&str>,
) -> Result<LedgerEntry, WalletError> {
    if !amount.is_positive() {
        return Err(WalletError::InvalidAmount);
    }

    let Some(balance) = repo::decrement_balance_guarded(conn, user_id, amount).await? else {
        return Err(match repo::current_balance(&mut *conn, user_id).await? {
            Some(available) => WalletError::InsufficientFunds {
                required: amount,
                available,
            },
            None => WalletError::UserNotFound(user_id),
        });
    };

    let transaction = repo::insert_transaction(
        conn,
        repo::NewTransaction {
            user_id,
            amount: -amount,
            transaction_type: TransactionType::Debit,
            description,
            status: TransactionStatus::Success,
            payment_method: Some(PaymentMethod::Wallet),
            external_txn_id: None,
            reference,
        },
    )
    .await?;

    Ok(LedgerEntry {
        transaction,
        balance,
    })
}

#[derive(Clone)]
pub struct WalletLedger {
    pool: SqlitePool,
    retry: RetryPolicy,
}

impl WalletLedger {
    pub fn new(pool: SqlitePool) -> Self {
        Self {
            pool,
            retry: RetryPolicy::default(),
        }
    }

    /// Increase the balance and append a CREDIT/SUCCESS row
    pub async fn credit(
        &self,
        user_id: i64,
        amount: Money,
        description: &str,
        payment: Option<PaymentRef>,
    ) -> Result<LedgerEntry, WalletError> {
        let payment = payment.as_ref();
        let entry = retry_transient(self.retry, "wallet.credit", move || async move {
            let mut tx = self.pool.begin().await.map_err(RepoError::from)?;
            let entry = credit_on(&mut *tx, user_id, amount, description, payment).await?;
            tx.commit().await.map_err(RepoError::from)?;
            Ok::<_, WalletError>(entry)
        })
        .await?;

        tracing::info!(
            user_id,
            amount = %amount,
            balance = %entry.balance,
            method = ?payment.map(|p| p.method),
            "Wallet credited"
        );
        Ok(entry)
    }

    /// Decrease the balance and append a DEBIT/SUCCESS row
    pub async fn debit(
        &self,
        user_id: i64,
        amount: Money,
        description: &str,
    ) -> Result<LedgerEntry, WalletError> {
        let entry = retry_transient(self.retry, "wallet.debit", move || async move {
            let mut tx = self.pool.begin().await.map_err(RepoError::from)?;
            let entry = debit_on(&mut *tx, user_id, amount, description, None).await?;
            tx.commit().await.map_err(RepoError::from)?;
            Ok::<_, WalletError>(entry)
        })
        .await?;

        tracing::info!(user_id, amount = %amount, balance = %entry.balance, "Wallet debited");
        Ok(entry)
    }

    /// Append a FAILED CREDIT row; the balance is not touched
    pub async fn record_failed_payment(
        &self,
        user_id: i64,
        amount: Money,
        description: &str,
        payment: PaymentRef,
    ) -> Result<WalletTransaction, WalletError> {
        if !amount.is_positive() {
            return Err(WalletError::InvalidAmount);
        }
        if repo::current_balance(&self.pool, user_id).await?.is_none() {
            return Err(WalletError::UserNotFound(user_id));
        }

        let mut conn = self.pool.acquire().await.map_err(RepoError::from)?;
        let transaction = repo::insert_transaction(
            &mut conn,
            repo::NewTransaction {
                user_id,
                amount,
                transaction_type: TransactionType::Credit,
                description,
                status: TransactionStatus::Failed,
                payment_method: Some(payment.method),
                external_txn_id: payment.external_txn_id.as_deref(),
                reference: None,
            },
        )
        .await?;

        tracing::warn!(
            user_id,
            amount = %amount,
            external_txn_id = ?payment.external_txn_id,
            "Failed payment recorded"
        );
        Ok(transaction)
    }

    pub async fn balance(&self, user_id: i64) -> Result<Money, WalletError> {
        repo::current_balance(&self.pool, user_id)
            .await?
            .ok_or(WalletError::UserNotFound(user_id))
    }

    /// Newest first
    pub async fn transactions(
        &self,
        user_id: i64,
        limit: i64,
    ) -> Result<Vec<WalletTransaction>, WalletError> {
        Ok(repo::find_by_user(&self.pool, user_id, limit).await?)
    }

    /// Whether a SUCCESS credit already exists for this external payment id
    pub async fn is_payment_processed(&self, external_txn_id: &str) -> Result<bool, WalletError> {
        Ok(repo::external_payment_exists(&self.pool, external_txn_id).await?)
    }

    /// Compare the stored balance with the sum of SUCCESS rows
    pub async fn reconcile(&self, user_id: i64) -> Result<Reconciliation, WalletError> {
        let mut tx = self.pool.begin().await.map_err(RepoError::from)?;
        let balance = repo::current_balance(&mut *tx, user_id)
            .await?
            .ok_or(WalletError::UserNotFound(user_id))?;
        let ledger_total = repo::success_total(&mut *tx, user_id).await?;
        tx.commit().await.map_err(RepoError::from)?;
        Ok(Reconciliation {
            balance,
            ledger_total,
        })
    }
}
