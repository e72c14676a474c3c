//! Data models
//!
//! Shared between the server and API clients.
//! DB row types use `#[cfg_attr(feature = "db", derive(sqlx::FromRow))]`.
//! All IDs are `i64` (SQLite INTEGER PRIMARY KEY).

pub mod catalog;
pub mod notification;
pub mod order;
pub mod user;
pub mod wallet;

// Re-exports
pub use catalog::*;
pub use notification::*;
pub use order::*;
pub use user::*;
pub use wallet::*;
