use shared::models::OrderStatus;
use shared::{AppError, ErrorCode, Money};
use thiserror::Error;

use crate::db::repository::RepoError;
use crate::utils::Transient;
use crate::wallet::{WalletError, insufficient_funds};

#[derive(Debug, Error)]
pub enum OrderError {
    #[error("Order must contain at least one item")]
    Empty,

    #[error("Order has {lines} lines, at most {max} allowed")]
    TooManyLines { lines: usize, max: usize },

    #[error("Quantity {quantity} for item {item_id} is outside 1..={max}")]
    InvalidQuantity { item_id: i64, quantity: i64, max: i64 },

    #[error("Item {item_id} is not available")]
    ItemUnavailable { item_id: i64, name: Option<String> },

    #[error("Order total overflows")]
    TotalOverflow,

    #[error("Insufficient balance: required {required}, available {available}")]
    InsufficientFunds { required: Money, available: Money },

    #[error("User {0} not found")]
    UserNotFound(i64),

    #[error("User account is disabled")]
    AccountDisabled,

    #[error("Order {0} not found")]
    NotFound(i64),

    #[error("Cannot move order from {from} to {to}")]
    InvalidTransition { from: OrderStatus, to: OrderStatus },

    #[error("Role may not change order status")]
    Forbidden,

    /// Order number already taken; a fresh number is drawn on retry
    #[error("Order number collision")]
    NumberCollision,

    /// Item price or name changed after the cart was priced
    #[error("Item {item_id} changed while the order was placed")]
    PriceChanged { item_id: i64 },

    /// Status kept changing underneath the compare-and-swap
    #[error("Order {0} is being updated concurrently")]
    Contended(i64),

    #[error(transparent)]
    Wallet(WalletError),

    #[error(transparent)]
    Repo(#[from] RepoError),
}

impl Transient for OrderError {
    fn is_transient(&self) -> bool {
        match self {
            OrderError::NumberCollision | OrderError::PriceChanged { .. } => true,
            OrderError::Repo(e) => e.is_transient(),
            OrderError::Wallet(e) => e.is_transient(),
            _ => false,
        }
    }
}

impl From<WalletError> for OrderError {
    fn from(err: WalletError) -> Self {
        match err {
            WalletError::InsufficientFunds {
                required,
                available,
            } => OrderError::InsufficientFunds {
                required,
                available,
            },
            WalletError::UserNotFound(id) => OrderError::UserNotFound(id),
            WalletError::Repo(e) => OrderError::Repo(e),
            other => OrderError::Wallet(other),
        }
    }
}

impl From<OrderError> for AppError {
    fn from(err: OrderError) -> Self {
        match err {
            OrderError::Empty => AppError::new(ErrorCode::OrderEmpty),
            OrderError::TooManyLines { lines, max } => {
                AppError::with_message(ErrorCode::OrderTooLarge, format!("At most {max} lines per order"))
                    .with_detail("lines", lines)
                    .with_detail("max", max)
            }
            OrderError::InvalidQuantity {
                item_id,
                quantity,
                max,
            } => AppError::with_message(
                ErrorCode::OrderQuantityInvalid,
                format!("Quantity must be between 1 and {max}"),
            )
            .with_detail("item_id", item_id)
            .with_detail("quantity", quantity),
            OrderError::ItemUnavailable { item_id, name } => {
                let message = match &name {
                    Some(name) => format!("Item '{name}' is not available"),
                    None => format!("Item {item_id} does not exist"),
                };
                let err = AppError::with_message(ErrorCode::ItemUnavailable, message)
                    .with_detail("item_id", item_id);
                match name {
                    Some(name) => err.with_detail("item_name", name),
                    None => err,
                }
            }
            OrderError::TotalOverflow => {
                AppError::with_message(ErrorCode::OrderTooLarge, "Order total is too large")
            }
            OrderError::InsufficientFunds {
                required,
                available,
            } => insufficient_funds(required, available),
            OrderError::UserNotFound(id) => {
                AppError::new(ErrorCode::UserNotFound).with_detail("user_id", id)
            }
            OrderError::AccountDisabled => AppError::new(ErrorCode::AccountDisabled),
            OrderError::NotFound(id) => {
                AppError::new(ErrorCode::OrderNotFound).with_detail("order_id", id)
            }
            OrderError::InvalidTransition { from, to } => AppError::with_message(
                ErrorCode::InvalidTransition,
                format!("Cannot change order status from {from} to {to}"),
            )
            .with_detail("from", from.as_str())
            .with_detail("to", to.as_str()),
            OrderError::Forbidden => AppError::new(ErrorCode::PermissionDenied),
            OrderError::NumberCollision | OrderError::Contended(_) => AppError::system_busy(),
            OrderError::PriceChanged { item_id } => AppError::system_busy().with_detail("item_id", item_id),
            OrderError::Wallet(e) => e.into(),
            OrderError::Repo(e) => e.into(),
        }
    }
}
