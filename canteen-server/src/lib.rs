//! Canteen Server - 校园食堂点餐与钱包服务
//!
//! # 模块结构
//!
//! ```text
//! canteen-server/src/
//! ├── core/          # 配置、状态、服务器
//! ├── auth/          # JWT、QR 两步登录、权限、限流
//! ├── api/           # HTTP 路由和处理器
//! ├── catalog/       # 价格与可售状态
//! ├── orders/        # 下单、订单号、状态流转
//! ├── wallet/        # 钱包账本、UPI、支付回调签名
//! ├── notifications/ # 站内通知
//! ├── services/      # QR 渲染、邮件
//! ├── users.rs       # 账户创建与 QR 凭证
//! ├── db/            # SQLite 连接池、仓储、演示数据
//! └── utils/         # 日志、校验、重试
//! ```

pub mod api;
pub mod auth;
pub mod catalog;
pub mod core;
pub mod db;
pub mod notifications;
pub mod orders;
pub mod services;
pub mod users;
pub mod utils;
pub mod wallet;

// Re-export 公共类型
pub use auth::{CurrentUser, JwtService};
pub use self::core::{Config, Server, ServerState};
pub use orders::{OrderCoordinator, OrderWorkflow};
pub use wallet::WalletLedger;

pub use utils::logger::init_logger_with_file;

// Security logging macro - 支持 tracing 格式说明符
#[macro_export]
macro_rules! security_log {
    ($level:expr, $event:expr, $($key:ident = $value:expr),*) => {
        tracing::info!(
            target: "security",
            level = $level,
            event = $event,
            $($key = $value),*
        );
    };
}
