use std::sync::Arc;

use sqlx::SqlitePool;

use crate::auth::{JwtService, QrLoginService, RateLimiter};
use crate::catalog::PriceResolver;
use crate::core::Config;
use crate::db::DbService;
use crate::notifications::Notifier;
use crate::orders::{OrderCoordinator, OrderPolicy, OrderWorkflow};
use crate::services::{LogMailer, Mailer, PngQrEncoder, QrEncoder, WebhookMailer};
use crate::wallet::WalletLedger;

/// 服务器状态 - 持有所有服务的共享引用
///
/// Cloning is cheap: the pool and every service are reference counted.
///
/// | 字段 | 说明 |
/// |------|------|
/// | config | 配置项 (不可变) |
/// | db | SQLite connection pool |
/// | jwt_service | JWT 认证服务 |
/// | resolver | price and availability lookups |
/// | coordinator | order placement |
/// | workflow | order status transitions |
/// | ledger | wallet credits and debits |
/// | notifier | in-app notifications |
/// | qr_login | two-phase QR login |
/// | qr_encoder / mailer | pluggable collaborators |
/// | rate_limiter | per-IP limits on auth and ordering |
#[derive(Clone)]
pub struct ServerState {
    pub config: Config,
    pub db: DbService,
    pub jwt_service: Arc<JwtService>,
    pub resolver: PriceResolver,
    pub coordinator: OrderCoordinator,
    pub workflow: OrderWorkflow,
    pub ledger: WalletLedger,
    pub notifier: Notifier,
    pub qr_login: QrLoginService,
    pub qr_encoder: Arc<dyn QrEncoder>,
    pub mailer: Arc<dyn Mailer>,
    pub rate_limiter: RateLimiter,
}

impl ServerState {
    /// 初始化服务器状态
    ///
    /// 1. 工作目录结构
    /// 2. 数据库 (work_dir/canteen.db, migrations applied)
    /// 3. 各服务
    pub async fn initialize(config: &Config) -> anyhow::Result<Self> {
        config.ensure_work_dir_structure()?;

        let db = DbService::new(&config.database_path()).await?;
        let mailer: Arc<dyn Mailer> = match &config.mail_webhook_url {
            Some(url) => Arc::new(WebhookMailer::new(url.clone(), config.mail_from.clone())),
            None => Arc::new(LogMailer),
        };

        Ok(Self::from_parts(config.clone(), db, mailer))
    }

    /// Wire every service around an open database
    pub fn from_parts(config: Config, db: DbService, mailer: Arc<dyn Mailer>) -> Self {
        let pool = db.pool.clone();
        let jwt_service = Arc::new(JwtService::with_config(config.jwt.clone()));
        let resolver = PriceResolver::new(pool.clone());
        let notifier = Notifier::new(pool.clone());
        let coordinator =
            OrderCoordinator::new(pool.clone(), resolver.clone()).with_policy(OrderPolicy {
                max_quantity: config.max_order_quantity,
                ..OrderPolicy::default()
            });

        Self {
            workflow: OrderWorkflow::new(pool.clone(), notifier.clone()),
            ledger: WalletLedger::new(pool.clone()),
            qr_login: QrLoginService::new(pool, (*jwt_service).clone()),
            qr_encoder: Arc::new(PngQrEncoder),
            rate_limiter: RateLimiter::new(),
            config,
            db,
            jwt_service,
            resolver,
            coordinator,
            notifier,
            mailer,
        }
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.db.pool
    }

    /// 获取 JWT 服务
    pub fn get_jwt_service(&self) -> Arc<JwtService> {
        self.jwt_service.clone()
    }
}
