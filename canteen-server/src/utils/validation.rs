//! Input validation helpers
//!
//! Centralized text length constants and validation functions.
//! SQLite TEXT has no built-in length enforcement, so handlers check here.

use shared::{AppError, ErrorCode, Money};

// ── Text length limits ──────────────────────────────────────────────

/// Person and item names
pub const MIN_NAME_LEN: usize = 2;
pub const MAX_NAME_LEN: usize = 100;

/// Category names
pub const MAX_CATEGORY_NAME_LEN: usize = 50;

/// Item descriptions, ledger descriptions
pub const MAX_NOTE_LEN: usize = 500;

/// Short identifiers: phone, user code
pub const MAX_SHORT_TEXT_LEN: usize = 100;

/// Email addresses (RFC 5321)
pub const MAX_EMAIL_LEN: usize = 254;

/// Passwords (before hashing)
pub const MAX_PASSWORD_LEN: usize = 128;

/// URLs / image paths / data URLs are not accepted here
pub const MAX_URL_LEN: usize = 2048;

/// PIN digits
pub const PIN_LEN: usize = 4;

// ── Validation helpers ──────────────────────────────────────────────

/// Validate that a required string is non-empty and within the length limit.
pub fn validate_required_text(value: &str, field: &str, max_len: usize) -> Result<(), AppError> {
    if value.trim().is_empty() {
        return Err(AppError::validation(format!("{field} must not be empty")));
    }
    if value.chars().count() > max_len {
        return Err(AppError::validation(format!(
            "{field} is too long ({} chars, max {max_len})",
            value.chars().count()
        )));
    }
    Ok(())
}

/// Validate that an optional string, if present, is within the length limit.
pub fn validate_optional_text(
    value: &Option<String>,
    field: &str,
    max_len: usize,
) -> Result<(), AppError> {
    if let Some(v) = value
        && v.chars().count() > max_len
    {
        return Err(AppError::validation(format!(
            "{field} is too long ({} chars, max {max_len})",
            v.chars().count()
        )));
    }
    Ok(())
}

/// Names must carry at least `MIN_NAME_LEN` visible characters
pub fn validate_name(value: &str, field: &str, max_len: usize) -> Result<(), AppError> {
    validate_required_text(value, field, max_len)?;
    if value.trim().chars().count() < MIN_NAME_LEN {
        return Err(AppError::validation(format!(
            "{field} must be at least {MIN_NAME_LEN} characters"
        )));
    }
    Ok(())
}

pub fn validate_email(value: &str) -> Result<(), AppError> {
    validate_required_text(value, "email", MAX_EMAIL_LEN)?;
    let valid = match value.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && !domain.contains('@')
                && domain.contains('.')
                && !domain.starts_with('.')
                && !domain.ends_with('.')
                && !value.contains(char::is_whitespace)
        }
        None => false,
    };
    if !valid {
        return Err(AppError::validation("Valid email is required").with_detail("field", "email"));
    }
    Ok(())
}

pub fn validate_pin(pin: &str) -> Result<(), AppError> {
    if pin.len() != PIN_LEN || !pin.bytes().all(|b| b.is_ascii_digit()) {
        return Err(AppError::validation(format!("PIN must be exactly {PIN_LEN} digits"))
            .with_detail("field", "pin"));
    }
    Ok(())
}

/// Amount must be positive and, when given, not above `max`
pub fn validate_amount(amount: Money, max: Option<Money>) -> Result<(), AppError> {
    if !amount.is_positive() {
        return Err(AppError::with_message(
            ErrorCode::InvalidAmount,
            "Amount must be greater than zero",
        ));
    }
    if let Some(max) = max
        && amount > max
    {
        return Err(AppError::with_message(
            ErrorCode::InvalidAmount,
            format!("Amount must not exceed {max}"),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_required_text() {
        assert!(validate_required_text("Tea", "name", 10).is_ok());
        assert!(validate_required_text("   ", "name", 10).is_err());
        assert!(validate_required_text("abcdefghijk", "name", 10).is_err());
    }

    #[test]
    fn test_name_minimum() {
        assert!(validate_name("Jo", "name", MAX_NAME_LEN).is_ok());
        assert!(validate_name("J", "name", MAX_NAME_LEN).is_err());
    }

    #[test]
    fn test_email() {
        assert!(validate_email("asha@college.edu").is_ok());
        assert!(validate_email("asha@college").is_err());
        assert!(validate_email("asha college@x.in").is_err());
        assert!(validate_email("@x.in").is_err());
    }

    #[test]
    fn test_pin() {
        assert!(validate_pin("0421").is_ok());
        assert!(validate_pin("421").is_err());
        assert!(validate_pin("04a1").is_err());
        assert!(validate_pin("٠١٢٣").is_err());
    }

    #[test]
    fn test_amount() {
        assert!(validate_amount(Money::from_major(10), None).is_ok());
        assert_eq!(
            validate_amount(Money::ZERO, None).unwrap_err().code,
            ErrorCode::InvalidAmount
        );
        assert!(validate_amount(Money::from_major(10_001), Some(Money::from_major(10_000))).is_err());
    }
}
