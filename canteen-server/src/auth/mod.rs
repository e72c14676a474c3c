//! 认证授权模块
//!
//! - [`JwtService`] - JWT 令牌服务
//! - [`CurrentUser`] - 当前用户上下文
//! - [`QrLoginService`] - two-phase QR + PIN login
//! - [`Capability`] - role based capabilities
//! - [`require_auth`] / [`require_capability`] - 中间件

pub mod capability;
pub mod extractor;
pub mod jwt;
pub mod middleware;
pub mod password;
pub mod qr_login;
pub mod rate_limit;

pub use capability::Capability;
pub use jwt::{Claims, CurrentUser, JwtConfig, JwtError, JwtService};
pub use middleware::{require_auth, require_capability};
pub use qr_login::{Authenticated, IdentityResolved, LoginError, QrLoginService};
pub use rate_limit::RateLimiter;
