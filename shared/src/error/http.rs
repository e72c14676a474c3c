//! HTTP status for each error code

use super::category::ErrorCategory;
use super::codes::ErrorCode;
use http::StatusCode;

impl ErrorCode {
    /// Category decides the status unless the code needs its own
    pub fn http_status(&self) -> StatusCode {
        match self {
            Self::RateLimited => StatusCode::TOO_MANY_REQUESTS,
            Self::InsufficientFunds => StatusCode::PAYMENT_REQUIRED,
            Self::SystemBusy => StatusCode::SERVICE_UNAVAILABLE,
            Self::PaymentSignatureInvalid => StatusCode::UNAUTHORIZED,
            Self::NotFound
            | Self::OrderNotFound
            | Self::ItemNotFound
            | Self::CategoryNotFound
            | Self::NotificationNotFound
            | Self::UserNotFound => StatusCode::NOT_FOUND,
            Self::AlreadyExists
            | Self::InvalidTransition
            | Self::PaymentAlreadyProcessed
            | Self::ItemHasOrders
            | Self::CategoryNameExists
            | Self::UserEmailExists => StatusCode::CONFLICT,
            _ => match self.category() {
                ErrorCategory::Auth => StatusCode::UNAUTHORIZED,
                ErrorCategory::Permission => StatusCode::FORBIDDEN,
                ErrorCategory::System => StatusCode::INTERNAL_SERVER_ERROR,
                _ => StatusCode::BAD_REQUEST,
            },
        }
    }
}
