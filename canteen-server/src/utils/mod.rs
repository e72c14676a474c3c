//! Utility module: logging, validation, retry and shared request types

pub mod logger;
pub mod retry;
pub mod types;
pub mod validation;

pub use retry::{RetryPolicy, Transient, retry_transient};
pub use types::{Paginated, Pagination, PaginationParams};
