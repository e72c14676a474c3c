use shared::{AppError, ErrorCode, Money};
use thiserror::Error;

use crate::db::repository::RepoError;
use crate::utils::Transient;

#[derive(Debug, Error)]
pub enum WalletError {
    #[error("Amount must be greater than zero")]
    InvalidAmount,

    #[error("Wallet balance may not exceed {limit}")]
    BalanceLimitExceeded { limit: Money },

    #[error("Insufficient balance: required {required}, available {available}")]
    InsufficientFunds { required: Money, available: Money },

    #[error("User {0} not found")]
    UserNotFound(i64),

    #[error("Payment {0} already processed")]
    PaymentAlreadyProcessed(String),

    #[error(transparent)]
    Repo(#[from] RepoError),
}

impl WalletError {
    /// How much is missing for an `InsufficientFunds` failure
    pub fn shortfall(&self) -> Option<Money> {
        match self {
            WalletError::InsufficientFunds {
                required,
                available,
            } => required.checked_sub(*available),
            _ => None,
        }
    }
}

impl Transient for WalletError {
    fn is_transient(&self) -> bool {
        matches!(self, WalletError::Repo(e) if e.is_transient())
    }
}

/// Shared by order placement so both paths report funds the same way
pub(crate) fn insufficient_funds(required: Money, available: Money) -> AppError {
    let shortfall = required.checked_sub(available).unwrap_or(required);
    AppError::with_message(
        ErrorCode::InsufficientFunds,
        format!("Insufficient wallet balance: need {shortfall} more"),
    )
    .with_detail("required", required.amount().to_string())
    .with_detail("available", available.amount().to_string())
    .with_detail("shortfall", shortfall.amount().to_string())
}

impl From<WalletError> for AppError {
    fn from(err: WalletError) -> Self {
        match err {
            WalletError::InvalidAmount => AppError::new(ErrorCode::InvalidAmount),
            WalletError::BalanceLimitExceeded { limit } => AppError::with_message(
                ErrorCode::InvalidAmount,
                format!("Wallet balance may not exceed {limit}"),
            )
            .with_detail("max_balance", limit.amount().to_string()),
            WalletError::InsufficientFunds {
                required,
                available,
            } => insufficient_funds(required, available),
            WalletError::UserNotFound(id) => {
                AppError::new(ErrorCode::UserNotFound).with_detail("user_id", id)
            }
            WalletError::PaymentAlreadyProcessed(txn) => {
                AppError::new(ErrorCode::PaymentAlreadyProcessed).with_detail("transaction_id", txn)
            }
            WalletError::Repo(e) => e.into(),
        }
    }
}
