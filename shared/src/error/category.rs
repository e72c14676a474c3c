//! 错误分类：按错误码的千位划分

use super::codes::ErrorCode;
use serde::Serialize;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCategory {
    /// 0xxx, and the unassigned 3xxx range
    General,
    Auth,
    Permission,
    Order,
    Wallet,
    Catalog,
    Notification,
    User,
    System,
}

impl ErrorCategory {
    pub fn from_code(code: u16) -> Self {
        match code / 1000 {
            1 => Self::Auth,
            2 => Self::Permission,
            4 => Self::Order,
            5 => Self::Wallet,
            6 => Self::Catalog,
            7 => Self::Notification,
            8 => Self::User,
            9..=u16::MAX => Self::System,
            _ => Self::General,
        }
    }
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::General => "general",
            Self::Auth => "auth",
            Self::Permission => "permission",
            Self::Order => "order",
            Self::Wallet => "wallet",
            Self::Catalog => "catalog",
            Self::Notification => "notification",
            Self::User => "user",
            Self::System => "system",
        };
        f.write_str(name)
    }
}

impl ErrorCode {
    pub fn category(&self) -> ErrorCategory {
        ErrorCategory::from_code(self.code())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_category_by_thousands() {
        assert_eq!(ErrorCategory::from_code(9), ErrorCategory::General);
        assert_eq!(ErrorCategory::from_code(1008), ErrorCategory::Auth);
        assert_eq!(ErrorCategory::from_code(3500), ErrorCategory::General);
        assert_eq!(ErrorCategory::from_code(5005), ErrorCategory::Wallet);
        assert_eq!(ErrorCategory::from_code(6102), ErrorCategory::Catalog);
        assert_eq!(ErrorCategory::from_code(7001), ErrorCategory::Notification);
        assert_eq!(ErrorCategory::from_code(9004), ErrorCategory::System);
    }

    #[test]
    fn test_code_category_and_name() {
        assert_eq!(ErrorCode::InsufficientFunds.category(), ErrorCategory::Wallet);
        assert_eq!(ErrorCode::UserEmailExists.category().to_string(), "user");
        assert_eq!(serde_json::to_string(&ErrorCategory::Catalog).unwrap(), "\"catalog\"");
    }
}
