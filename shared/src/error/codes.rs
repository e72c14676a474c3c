//! Unified error codes for the canteen service
//!
//! Error codes are organized by category:
//! - 0xxx: General errors
//! - 1xxx: Authentication errors
//! - 2xxx: Permission errors
//! - 4xxx: Order errors
//! - 5xxx: Wallet and payment errors
//! - 6xxx: Catalog errors
//! - 7xxx: Notification errors
//! - 8xxx: User errors
//! - 9xxx: System errors

use serde::{Deserialize, Serialize};
use std::fmt;

/// Unified error code enum
///
/// All error codes are represented as u16 values so that API clients can
/// branch on them without parsing messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "u16", try_from = "u16")]
#[repr(u16)]
pub enum ErrorCode {
    // ==================== 0xxx: General ====================
    /// Validation failed
    ValidationFailed = 2,
    /// Resource not found
    NotFound = 3,
    /// Resource already exists
    AlreadyExists = 4,
    /// Too many requests from the same client
    RateLimited = 9,

    // ==================== 1xxx: Auth ====================
    /// User is not authenticated
    NotAuthenticated = 1001,
    /// Invalid credentials (user code/password)
    InvalidCredentials = 1002,
    /// Token has expired
    TokenExpired = 1003,
    /// Token is invalid
    TokenInvalid = 1004,
    /// Account is disabled
    AccountDisabled = 1005,
    /// PIN does not match
    InvalidPin = 1006,
    /// Scanned QR credential is unknown
    QrCodeInvalid = 1007,
    /// QR login ticket is missing, expired or malformed
    LoginTicketInvalid = 1008,

    // ==================== 2xxx: Permission ====================
    /// Permission denied
    PermissionDenied = 2001,
    /// Admin role required
    AdminRequired = 2003,

    // ==================== 4xxx: Order ====================
    /// Order not found
    OrderNotFound = 4001,
    /// Order has no lines
    OrderEmpty = 4002,
    /// Line quantity outside the allowed range
    OrderQuantityInvalid = 4003,
    /// Requested status is not a legal successor of the current status
    InvalidTransition = 4004,
    /// Too many lines in one order
    OrderTooLarge = 4005,

    // ==================== 5xxx: Wallet ====================
    /// Wallet balance is below the amount required
    InsufficientFunds = 5001,
    /// Amount is zero, negative or has too many decimals
    InvalidAmount = 5002,
    /// External payment was already credited
    PaymentAlreadyProcessed = 5004,
    /// Payment callback signature is missing or wrong
    PaymentSignatureInvalid = 5005,

    // ==================== 6xxx: Catalog ====================
    /// Item not found
    ItemNotFound = 6001,
    /// Item missing or not available for ordering
    ItemUnavailable = 6002,
    /// Item price is invalid
    ItemInvalidPrice = 6003,
    /// Item is referenced by orders and cannot be deleted
    ItemHasOrders = 6004,
    /// Category not found
    CategoryNotFound = 6101,
    /// Category name already exists
    CategoryNameExists = 6102,

    // ==================== 7xxx: Notification ====================
    /// Notification not found for this user
    NotificationNotFound = 7001,

    // ==================== 8xxx: User ====================
    /// User not found
    UserNotFound = 8001,
    /// Email already registered
    UserEmailExists = 8002,

    // ==================== 9xxx: System ====================
    /// Internal server error
    InternalError = 9001,
    /// Database error
    DatabaseError = 9002,
    /// Database stayed busy after retries, client may retry
    SystemBusy = 9004,
    /// Outgoing mail failed
    MailError = 9005,
    /// QR image could not be generated
    QrGenerationFailed = 9006,
}

impl ErrorCode {
    /// Get the numeric code value
    #[inline]
    pub const fn code(&self) -> u16 {
        *self as u16
    }

    /// Get the default message for this error code
    pub const fn message(&self) -> &'static str {
        match self {
            // General
            Self::ValidationFailed => "Validation failed",
            Self::NotFound => "Resource not found",
            Self::AlreadyExists => "Resource already exists",
            Self::RateLimited => "Too many requests, try again later",

            // Auth
            Self::NotAuthenticated => "Authentication required",
            Self::InvalidCredentials => "Invalid user code or password",
            Self::TokenExpired => "Token has expired",
            Self::TokenInvalid => "Invalid token",
            Self::AccountDisabled => "Account is disabled",
            Self::InvalidPin => "Invalid PIN",
            Self::QrCodeInvalid => "Invalid QR code",
            Self::LoginTicketInvalid => "Login ticket is invalid or expired, scan again",

            // Permission
            Self::PermissionDenied => "Permission denied",
            Self::AdminRequired => "Admin role required",

            // Order
            Self::OrderNotFound => "Order not found",
            Self::OrderEmpty => "Order must contain at least one item",
            Self::OrderQuantityInvalid => "Invalid item quantity",
            Self::InvalidTransition => "Invalid order status transition",
            Self::OrderTooLarge => "Order has too many lines",

            // Wallet
            Self::InsufficientFunds => "Insufficient wallet balance",
            Self::InvalidAmount => "Invalid amount",
            Self::PaymentAlreadyProcessed => "Payment already processed",
            Self::PaymentSignatureInvalid => "Invalid payment signature",

            // Catalog
            Self::ItemNotFound => "Item not found",
            Self::ItemUnavailable => "Item is not available",
            Self::ItemInvalidPrice => "Invalid item price",
            Self::ItemHasOrders => "Item has orders and cannot be deleted",
            Self::CategoryNotFound => "Category not found",
            Self::CategoryNameExists => "Category name already exists",

            // Notification
            Self::NotificationNotFound => "Notification not found",

            // User
            Self::UserNotFound => "User not found",
            Self::UserEmailExists => "Email already registered",

            // System
            Self::InternalError => "Internal server error",
            Self::DatabaseError => "Database error",
            Self::SystemBusy => "System busy, please retry",
            Self::MailError => "Failed to send email",
            Self::QrGenerationFailed => "Failed to generate QR code",
        }
    }
}

impl From<ErrorCode> for u16 {
    #[inline]
    fn from(code: ErrorCode) -> Self {
        code.code()
    }
}

/// Error returned when converting an unknown u16 into an [`ErrorCode`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InvalidErrorCode(pub u16);

impl fmt::Display for InvalidErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid error code: {}", self.0)
    }
}

impl std::error::Error for InvalidErrorCode {}

impl TryFrom<u16> for ErrorCode {
    type Error = InvalidErrorCode;

    fn try_from(value: u16) -> Result<Self, Self::Error> {
        match value {
            // General
            2 => Ok(Self::ValidationFailed),
            3 => Ok(Self::NotFound),
            4 => Ok(Self::AlreadyExists),
            9 => Ok(Self::RateLimited),

            // Auth
            1001 => Ok(Self::NotAuthenticated),
            1002 => Ok(Self::InvalidCredentials),
            1003 => Ok(Self::TokenExpired),
            1004 => Ok(Self::TokenInvalid),
            1005 => Ok(Self::AccountDisabled),
            1006 => Ok(Self::InvalidPin),
            1007 => Ok(Self::QrCodeInvalid),
            1008 => Ok(Self::LoginTicketInvalid),

            // Permission
            2001 => Ok(Self::PermissionDenied),
            2003 => Ok(Self::AdminRequired),

            // Order
            4001 => Ok(Self::OrderNotFound),
            4002 => Ok(Self::OrderEmpty),
            4003 => Ok(Self::OrderQuantityInvalid),
            4004 => Ok(Self::InvalidTransition),
            4005 => Ok(Self::OrderTooLarge),

            // Wallet
            5001 => Ok(Self::InsufficientFunds),
            5002 => Ok(Self::InvalidAmount),
            5004 => Ok(Self::PaymentAlreadyProcessed),
            5005 => Ok(Self::PaymentSignatureInvalid),

            // Catalog
            6001 => Ok(Self::ItemNotFound),
            6002 => Ok(Self::ItemUnavailable),
            6003 => Ok(Self::ItemInvalidPrice),
            6004 => Ok(Self::ItemHasOrders),
            6101 => Ok(Self::CategoryNotFound),
            6102 => Ok(Self::CategoryNameExists),

            // Notification
            7001 => Ok(Self::NotificationNotFound),

            // User
            8001 => Ok(Self::UserNotFound),
            8002 => Ok(Self::UserEmailExists),

            // System
            9001 => Ok(Self::InternalError),
            9002 => Ok(Self::DatabaseError),
            9004 => Ok(Self::SystemBusy),
            9005 => Ok(Self::MailError),
            9006 => Ok(Self::QrGenerationFailed),

            _ => Err(InvalidErrorCode(value)),
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "E{:04}", self.code())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL: &[ErrorCode] = &[
        ErrorCode::ValidationFailed,
        ErrorCode::NotFound,
        ErrorCode::AlreadyExists,
        ErrorCode::RateLimited,
        ErrorCode::NotAuthenticated,
        ErrorCode::InvalidCredentials,
        ErrorCode::TokenExpired,
        ErrorCode::TokenInvalid,
        ErrorCode::AccountDisabled,
        ErrorCode::InvalidPin,
        ErrorCode::QrCodeInvalid,
        ErrorCode::LoginTicketInvalid,
        ErrorCode::PermissionDenied,
        ErrorCode::AdminRequired,
        ErrorCode::OrderNotFound,
        ErrorCode::OrderEmpty,
        ErrorCode::OrderQuantityInvalid,
        ErrorCode::InvalidTransition,
        ErrorCode::OrderTooLarge,
        ErrorCode::InsufficientFunds,
        ErrorCode::InvalidAmount,
        ErrorCode::PaymentAlreadyProcessed,
        ErrorCode::PaymentSignatureInvalid,
        ErrorCode::ItemNotFound,
        ErrorCode::ItemUnavailable,
        ErrorCode::ItemInvalidPrice,
        ErrorCode::ItemHasOrders,
        ErrorCode::CategoryNotFound,
        ErrorCode::CategoryNameExists,
        ErrorCode::NotificationNotFound,
        ErrorCode::UserNotFound,
        ErrorCode::UserEmailExists,
        ErrorCode::InternalError,
        ErrorCode::DatabaseError,
        ErrorCode::SystemBusy,
        ErrorCode::MailError,
        ErrorCode::QrGenerationFailed,
    ];

    #[test]
    fn test_error_code_values() {
        assert_eq!(ErrorCode::RateLimited.code(), 9);
        assert_eq!(ErrorCode::NotAuthenticated.code(), 1001);
        assert_eq!(ErrorCode::InvalidTransition.code(), 4004);
        assert_eq!(ErrorCode::InsufficientFunds.code(), 5001);
        assert_eq!(ErrorCode::ItemUnavailable.code(), 6002);
        assert_eq!(ErrorCode::UserNotFound.code(), 8001);
        assert_eq!(ErrorCode::SystemBusy.code(), 9004);
    }

    #[test]
    fn test_every_code_roundtrips_through_u16() {
        for code in ALL {
            assert_eq!(ErrorCode::try_from(code.code()), Ok(*code));
        }
    }

    #[test]
    fn test_try_from_invalid() {
        assert_eq!(ErrorCode::try_from(3001), Err(InvalidErrorCode(3001)));
        assert_eq!(ErrorCode::try_from(65535), Err(InvalidErrorCode(65535)));
    }

    #[test]
    fn test_serialize_as_number() {
        let json = serde_json::to_string(&ErrorCode::InsufficientFunds).unwrap();
        assert_eq!(json, "5001");

        let code: ErrorCode = serde_json::from_str("4004").unwrap();
        assert_eq!(code, ErrorCode::InvalidTransition);

        assert!(serde_json::from_str::<ErrorCode>("4999").is_err());
    }

    #[test]
    fn test_display() {
        assert_eq!(ErrorCode::RateLimited.to_string(), "E0009");
        assert_eq!(ErrorCode::ItemUnavailable.to_string(), "E6002");
    }

    #[test]
    fn test_message() {
        assert_eq!(
            ErrorCode::InsufficientFunds.message(),
            "Insufficient wallet balance"
        );
        for code in ALL {
            assert!(!code.message().is_empty());
        }
    }
}
