//! 统一错误体系
//!
//! - [`ErrorCode`]: numeric codes clients branch on
//! - [`ErrorCategory`]: grouping by code range
//! - [`AppError`]: code + message + optional details, rendered as [`ErrorBody`]
//!
//! ```
//! use shared::error::{AppError, ErrorCode};
//!
//! let err = AppError::new(ErrorCode::InsufficientFunds).with_detail("shortfall", "70.00");
//! let body = err.body();
//! assert_eq!(body.code, 5001);
//! assert_eq!(err.http_status(), http::StatusCode::PAYMENT_REQUIRED);
//! ```

mod category;
mod codes;
mod http;
mod types;

pub use category::ErrorCategory;
pub use codes::{ErrorCode, InvalidErrorCode};
pub use types::{AppError, ErrorBody};
