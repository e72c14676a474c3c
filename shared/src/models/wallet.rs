//! Wallet Transaction Models

use serde::{Deserialize, Serialize};

use crate::money::Money;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[cfg_attr(feature = "db", derive(sqlx::Type))]
#[cfg_attr(feature = "db", sqlx(rename_all = "SCREAMING_SNAKE_CASE"))]
pub enum TransactionType {
    Credit,
    Debit,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[cfg_attr(feature = "db", derive(sqlx::Type))]
#[cfg_attr(feature = "db", sqlx(rename_all = "SCREAMING_SNAKE_CASE"))]
pub enum TransactionStatus {
    Pending,
    Success,
    Failed,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[cfg_attr(feature = "db", derive(sqlx::Type))]
#[cfg_attr(feature = "db", sqlx(rename_all = "SCREAMING_SNAKE_CASE"))]
pub enum PaymentMethod {
    AdminRecharge,
    Upi,
    Wallet,
}

/// Ledger row
///
/// `amount` is signed: credits are positive, debits negative.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct WalletTransaction {
    pub id: i64,
    pub user_id: i64,
    pub amount: Money,
    pub transaction_type: TransactionType,
    pub description: String,
    pub status: TransactionStatus,
    pub payment_method: Option<PaymentMethod>,
    pub external_txn_id: Option<String>,
    pub reference: Option<String>,
    pub created_at: i64,
}

/// Balance response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WalletBalance {
    pub balance: Money,
}

/// Admin recharge payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RechargeRequest {
    pub user_code: String,
    pub amount: Money,
    pub description: Option<String>,
}

/// UPI payment intent request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpiRequestCreate {
    pub amount: Money,
}

/// UPI payment intent handed to the client
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpiPaymentIntent {
    pub upi_url: String,
    pub qr_code: String,
    pub transaction_id: String,
    pub amount: Money,
}

/// Outcome reported by the payment provider
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentOutcome {
    Success,
    Failed,
    Pending,
}

/// Payment provider callback payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentVerification {
    pub user_code: String,
    pub amount: Money,
    pub transaction_id: String,
    pub status: PaymentOutcome,
}
