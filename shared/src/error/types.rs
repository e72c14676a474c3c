//! AppError and its JSON body

use super::category::ErrorCategory;
use super::codes::ErrorCode;
use http::StatusCode;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

/// 业务错误
///
/// 每个 HTTP 处理函数的错误类型。`details` 携带结构化上下文，
/// 例如余额不足时的 `required` / `available` / `shortfall`，
/// 或非法状态流转时的 `from` / `to`。
#[derive(Debug, Clone, Error)]
#[error("{message}")]
pub struct AppError {
    pub code: ErrorCode,
    pub message: String,
    pub details: Option<Map<String, Value>>,
}

/// Error body sent to clients: `{"code": 4001, "message": "...", "details": {...}}`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ErrorBody {
    pub code: u16,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<Map<String, Value>>,
}

impl AppError {
    /// Error with the code's default message
    pub fn new(code: ErrorCode) -> Self {
        Self::with_message(code, code.message())
    }

    pub fn with_message(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            details: None,
        }
    }

    pub fn with_detail(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.details
            .get_or_insert_with(Map::new)
            .insert(key.into(), value.into());
        self
    }

    pub fn http_status(&self) -> StatusCode {
        self.code.http_status()
    }

    pub fn body(&self) -> ErrorBody {
        ErrorBody {
            code: self.code.code(),
            message: self.message.clone(),
            details: self.details.clone(),
        }
    }

    // ---- shorthands ----

    pub fn validation(msg: impl Into<String>) -> Self {
        Self::with_message(ErrorCode::ValidationFailed, msg)
    }

    pub fn not_found(resource: impl Into<String>) -> Self {
        let resource = resource.into();
        Self::with_message(ErrorCode::NotFound, format!("{resource} not found"))
            .with_detail("resource", resource)
    }

    pub fn unauthorized() -> Self {
        Self::new(ErrorCode::NotAuthenticated)
    }

    pub fn invalid_token(msg: impl Into<String>) -> Self {
        Self::with_message(ErrorCode::TokenInvalid, msg)
    }

    pub fn token_expired() -> Self {
        Self::new(ErrorCode::TokenExpired)
    }

    pub fn invalid_credentials() -> Self {
        Self::new(ErrorCode::InvalidCredentials)
    }

    pub fn conflict(msg: impl Into<String>) -> Self {
        Self::with_message(ErrorCode::AlreadyExists, msg)
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::with_message(ErrorCode::InternalError, msg)
    }

    pub fn database(msg: impl Into<String>) -> Self {
        Self::with_message(ErrorCode::DatabaseError, msg)
    }

    /// Transient contention; the client may retry
    pub fn system_busy() -> Self {
        Self::new(ErrorCode::SystemBusy)
    }

    pub fn rate_limited() -> Self {
        Self::new(ErrorCode::RateLimited)
    }
}

impl axum::response::IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        if self.code.category() == ErrorCategory::System {
            tracing::error!(code = %self.code, message = %self.message, "System error");
        }
        (self.http_status(), axum::Json(self.body())).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_message() {
        let err = AppError::new(ErrorCode::OrderNotFound);
        assert_eq!(err.message, "Order not found");
        assert!(err.details.is_none());
        assert_eq!(err.to_string(), "Order not found");
    }

    #[test]
    fn test_shortfall_details() {
        let err = AppError::new(ErrorCode::InsufficientFunds)
            .with_detail("required", "120.00")
            .with_detail("available", "50.00");

        assert_eq!(err.http_status(), StatusCode::PAYMENT_REQUIRED);
        let details = err.details.unwrap();
        assert_eq!(details["required"], "120.00");
        assert_eq!(details["available"], "50.00");
    }

    #[test]
    fn test_shorthand_statuses() {
        let err = AppError::not_found("Item 42");
        assert_eq!(err.message, "Item 42 not found");
        assert_eq!(err.http_status(), StatusCode::NOT_FOUND);

        assert_eq!(AppError::unauthorized().http_status(), StatusCode::UNAUTHORIZED);
        assert_eq!(AppError::system_busy().http_status(), StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(AppError::rate_limited().http_status(), StatusCode::TOO_MANY_REQUESTS);
    }

    #[test]
    fn test_body_json_shape() {
        let plain = serde_json::to_value(AppError::validation("bad quantity").body()).unwrap();
        assert_eq!(plain, serde_json::json!({"code": 2, "message": "bad quantity"}));

        let err = AppError::new(ErrorCode::InvalidTransition)
            .with_detail("from", "DELIVERED")
            .with_detail("to", "PENDING");
        let json = serde_json::to_value(err.body()).unwrap();
        assert_eq!(json["code"], 4004);
        assert_eq!(json["details"]["from"], "DELIVERED");
    }
}
