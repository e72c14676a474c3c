//! Repository Module
//!
//! Free async functions over `&SqlitePool` (or a connection borrowed from an
//! open transaction). Money columns are integer minor units.

pub mod catalog;
pub mod notification;
pub mod order;
pub mod user;
pub mod wallet;

use shared::{AppError, ErrorCode};
use thiserror::Error;

/// Repository error types
#[derive(Debug, Error)]
pub enum RepoError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Duplicate: {0}")]
    Duplicate(String),

    /// SQLITE_BUSY / SQLITE_LOCKED or pool exhaustion; safe to retry
    #[error("Database busy: {0}")]
    Busy(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Validation error: {0}")]
    Validation(String),
}

impl RepoError {
    pub fn is_transient(&self) -> bool {
        matches!(self, RepoError::Busy(_))
    }
}

/// Primary result codes of SQLite's extended codes
const SQLITE_BUSY: i32 = 5;
const SQLITE_LOCKED: i32 = 6;

impl From<sqlx::Error> for RepoError {
    fn from(err: sqlx::Error) -> Self {
        match &err {
            sqlx::Error::Database(db) => {
                if db.is_unique_violation() {
                    return RepoError::Duplicate(db.message().to_string());
                }
                let primary = db
                    .code()
                    .and_then(|c| c.parse::<i32>().ok())
                    .map(|c| c & 0xff);
                if matches!(primary, Some(SQLITE_BUSY) | Some(SQLITE_LOCKED))
                    || db.message().contains("database is locked")
                {
                    return RepoError::Busy(db.message().to_string());
                }
                if db.is_check_violation() || db.is_foreign_key_violation() {
                    return RepoError::Validation(db.message().to_string());
                }
                RepoError::Database(err.to_string())
            }
            sqlx::Error::PoolTimedOut => RepoError::Busy(err.to_string()),
            sqlx::Error::RowNotFound => RepoError::NotFound("row".into()),
            _ => RepoError::Database(err.to_string()),
        }
    }
}

impl From<RepoError> for AppError {
    fn from(err: RepoError) -> Self {
        match err {
            RepoError::NotFound(what) => AppError::not_found(what),
            RepoError::Duplicate(msg) => AppError::conflict(msg),
            RepoError::Busy(msg) => {
                tracing::warn!(error = %msg, "Database busy");
                AppError::system_busy()
            }
            RepoError::Database(msg) => AppError::database(msg),
            RepoError::Validation(msg) => AppError::with_message(ErrorCode::ValidationFailed, msg),
        }
    }
}

/// Result type for repository operations
pub type RepoResult<T> = Result<T, RepoError>;
