//! Shared types for the canteen service
//!
//! Error codes and the error body, money, and the data models used by
//! the server and its API clients.

pub mod error;
pub mod models;
pub mod money;
pub mod util;

// Re-exports
pub use error::{AppError, ErrorBody, ErrorCategory, ErrorCode};
pub use money::Money;
pub use serde::{Deserialize, Serialize};
