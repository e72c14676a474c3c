use std::path::PathBuf;

use rust_decimal::Decimal;
use shared::Money;
use thiserror::Error;

use crate::auth::JwtConfig;
use crate::auth::jwt::DEV_JWT_SECRET;
use crate::orders::coordinator::DEFAULT_MAX_QUANTITY;
use crate::wallet::UpiConfig;

/// 服务器配置
///
/// # 环境变量
///
/// | 环境变量 | 默认值 | 说明 |
/// |----------|--------|------|
/// | WORK_DIR | ./data | 工作目录 (database, logs) |
/// | DATABASE_FILE | canteen.db | SQLite file under WORK_DIR |
/// | HTTP_PORT | 5000 | HTTP 服务端口 |
/// | ENVIRONMENT | development | 运行环境 |
/// | JWT_SECRET | dev secret | required in production |
/// | JWT_EXPIRATION_MINUTES | 480 | access token lifetime |
/// | QR_TICKET_MINUTES | 5 | QR login ticket lifetime |
/// | REQUEST_TIMEOUT_MS | 30000 | 请求超时(毫秒) |
/// | MAX_ORDER_QUANTITY | 50 | per-line quantity bound |
/// | UPI_ID / UPI_NAME | canteen@paytm / Smart Canteen | UPI payee |
/// | MAX_UPI_RECHARGE | 10000 | largest UPI recharge (rupees) |
/// | PAYMENT_WEBHOOK_SECRET | unset | payment callback HMAC key |
/// | MAIL_WEBHOOK_URL / MAIL_FROM | unset / noreply@canteen.local | mail relay |
/// | SEED_DEMO_DATA | false | seed demo data into an empty database |
/// | LOG_LEVEL | info | default filter when RUST_LOG is unset |
/// | LOG_JSON | false | JSON log lines |
#[derive(Debug, Clone)]
pub struct Config {
    pub work_dir: String,
    pub database_file: String,
    pub http_port: u16,
    /// development | production
    pub environment: String,
    pub jwt: JwtConfig,
    pub request_timeout_ms: u64,
    pub max_order_quantity: i64,
    pub upi: UpiConfig,
    pub max_upi_recharge: Money,
    pub payment_webhook_secret: Option<String>,
    pub mail_webhook_url: Option<String>,
    pub mail_from: String,
    pub seed_demo_data: bool,
    pub log_level: String,
    pub log_json: bool,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("JWT_SECRET must be set in production")]
    MissingJwtSecret,

    #[error("JWT_SECRET must be at least 32 characters long")]
    WeakJwtSecret,
}

fn env_parse<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(default)
}

fn env_string(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.into())
}

fn env_optional(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

impl Config {
    /// 从环境变量加载配置
    pub fn from_env() -> Result<Self, ConfigError> {
        let environment = env_string("ENVIRONMENT", "development");
        let is_production = environment == "production";

        let secret = match env_optional("JWT_SECRET") {
            Some(secret) if secret.len() < 32 && is_production => {
                return Err(ConfigError::WeakJwtSecret);
            }
            Some(secret) => secret,
            None if is_production => return Err(ConfigError::MissingJwtSecret),
            None => {
                tracing::warn!("JWT_SECRET not set, using the development secret");
                DEV_JWT_SECRET.to_string()
            }
        };

        let defaults = JwtConfig::default();
        let jwt = JwtConfig {
            secret,
            expiration_minutes: env_parse("JWT_EXPIRATION_MINUTES", defaults.expiration_minutes),
            ticket_minutes: env_parse("QR_TICKET_MINUTES", defaults.ticket_minutes),
            ..defaults
        };

        let max_upi_recharge = Money::from_decimal(env_parse("MAX_UPI_RECHARGE", Decimal::from(10_000)))
            .unwrap_or(Money::from_major(10_000));

        Ok(Self {
            work_dir: env_string("WORK_DIR", "./data"),
            database_file: env_string("DATABASE_FILE", "canteen.db"),
            http_port: env_parse("HTTP_PORT", 5000),
            environment,
            jwt,
            request_timeout_ms: env_parse("REQUEST_TIMEOUT_MS", 30_000),
            max_order_quantity: env_parse("MAX_ORDER_QUANTITY", DEFAULT_MAX_QUANTITY).max(1),
            upi: UpiConfig {
                payee_id: env_string("UPI_ID", "canteen@paytm"),
                payee_name: env_string("UPI_NAME", "Smart Canteen"),
            },
            max_upi_recharge,
            payment_webhook_secret: env_optional("PAYMENT_WEBHOOK_SECRET"),
            mail_webhook_url: env_optional("MAIL_WEBHOOK_URL"),
            mail_from: env_string("MAIL_FROM", "noreply@canteen.local"),
            seed_demo_data: env_parse("SEED_DEMO_DATA", false),
            log_level: env_string("LOG_LEVEL", "info"),
            log_json: env_parse("LOG_JSON", false),
        })
    }

    /// Configuration rooted at `work_dir`, everything else at defaults
    ///
    /// 常用于测试场景
    pub fn for_work_dir(work_dir: impl Into<String>) -> Self {
        Self {
            work_dir: work_dir.into(),
            database_file: "canteen.db".into(),
            http_port: 0,
            environment: "development".into(),
            jwt: JwtConfig::default(),
            request_timeout_ms: 30_000,
            max_order_quantity: DEFAULT_MAX_QUANTITY,
            upi: UpiConfig {
                payee_id: "canteen@paytm".into(),
                payee_name: "Smart Canteen".into(),
            },
            max_upi_recharge: Money::from_major(10_000),
            payment_webhook_secret: None,
            mail_webhook_url: None,
            mail_from: "noreply@canteen.local".into(),
            seed_demo_data: false,
            log_level: "info".into(),
            log_json: false,
        }
    }

    pub fn database_path(&self) -> PathBuf {
        PathBuf::from(&self.work_dir).join(&self.database_file)
    }

    pub fn log_dir(&self) -> PathBuf {
        PathBuf::from(&self.work_dir).join("logs")
    }

    /// 确保工作目录结构存在
    pub fn ensure_work_dir_structure(&self) -> std::io::Result<()> {
        std::fs::create_dir_all(&self.work_dir)?;
        std::fs::create_dir_all(self.log_dir())
    }

    /// 是否生产环境
    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_paths() {
        let config = Config::for_work_dir("/tmp/canteen");
        assert_eq!(
            config.database_path(),
            PathBuf::from("/tmp/canteen/canteen.db")
        );
        assert_eq!(config.log_dir(), PathBuf::from("/tmp/canteen/logs"));
        assert!(!config.is_production());
    }

    #[test]
    fn test_env_parse_fallback() {
        assert_eq!(env_parse("CANTEEN_TEST_UNSET_VARIABLE", 42u16), 42);
    }
}
