//! QR Login
//!
//! Two explicit phases. `scan` resolves the QR credential to an active user
//! and hands back a short-lived ticket; `verify_pin` exchanges that ticket
//! plus the user's PIN for an access token. A ticket is never accepted as
//! an access token.

use serde::Serialize;
use shared::models::{User, UserInfo};
use shared::{AppError, ErrorCode};
use sqlx::SqlitePool;
use thiserror::Error;

use super::jwt::{JwtError, JwtService, TOKEN_TYPE_QR_TICKET};
use super::password::verify_secret_blocking;
use crate::db::repository::{RepoError, user as user_repo};

/// Phase 1 result
#[derive(Debug, Clone, Serialize)]
pub struct IdentityResolved {
    pub user_code: String,
    pub name: String,
    pub photo: Option<String>,
    pub ticket: String,
    /// Ticket lifetime in seconds
    pub expires_in: i64,
}

/// Phase 2 result (also returned by password login and refresh)
#[derive(Debug, Clone, Serialize)]
pub struct Authenticated {
    pub token: String,
    pub expires_in: i64,
    pub user: UserInfo,
    pub total_orders: i64,
}

#[derive(Debug, Error)]
pub enum LoginError {
    #[error("QR code not recognised")]
    QrInvalid,

    #[error("Login ticket invalid")]
    TicketInvalid,

    #[error("Login ticket expired")]
    TicketExpired,

    #[error("Account disabled")]
    AccountDisabled,

    #[error("Invalid PIN")]
    InvalidPin,

    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error(transparent)]
    Jwt(#[from] JwtError),

    #[error(transparent)]
    Repo(#[from] RepoError),
}

impl From<LoginError> for AppError {
    fn from(err: LoginError) -> Self {
        match err {
            LoginError::QrInvalid => AppError::new(ErrorCode::QrCodeInvalid),
            LoginError::TicketInvalid => AppError::new(ErrorCode::LoginTicketInvalid),
            LoginError::TicketExpired => AppError::with_message(
                ErrorCode::LoginTicketInvalid,
                "Login ticket expired, scan the QR code again",
            ),
            LoginError::AccountDisabled => AppError::new(ErrorCode::AccountDisabled),
            LoginError::InvalidPin => AppError::new(ErrorCode::InvalidPin),
            LoginError::InvalidCredentials => AppError::invalid_credentials(),
            LoginError::Jwt(e) => AppError::internal(e.to_string()),
            LoginError::Repo(e) => e.into(),
        }
    }
}

#[derive(Clone)]
pub struct QrLoginService {
    pool: SqlitePool,
    jwt: JwtService,
}

impl QrLoginService {
    pub fn new(pool: SqlitePool, jwt: JwtService) -> Self {
        Self { pool, jwt }
    }

    /// Phase 1: QR payload -> identity + ticket
    pub async fn scan(&self, qr_data: &str) -> Result<IdentityResolved, LoginError> {
        let qr_data = qr_data.trim();
        if qr_data.is_empty() {
            return Err(LoginError::QrInvalid);
        }

        let user = user_repo::find_by_qr(&self.pool, qr_data)
            .await?
            .ok_or(LoginError::QrInvalid)?;
        if !user.is_active {
            return Err(LoginError::AccountDisabled);
        }

        let ticket = self.jwt.generate_qr_ticket(&user)?;
        Ok(IdentityResolved {
            user_code: user.user_code,
            name: user.name,
            photo: user.photo,
            ticket,
            expires_in: self.jwt.ticket_lifetime_secs(),
        })
    }

    /// Phase 2: ticket + PIN -> access token
    pub async fn verify_pin(&self, ticket: &str, pin: &str) -> Result<Authenticated, LoginError> {
        let claims = self
            .jwt
            .validate_typed(ticket, TOKEN_TYPE_QR_TICKET)
            .map_err(|e| match e {
                JwtError::ExpiredToken => LoginError::TicketExpired,
                _ => LoginError::TicketInvalid,
            })?;
        let user_id: i64 = claims.sub.parse().map_err(|_| LoginError::TicketInvalid)?;

        let user = user_repo::find_by_id(&self.pool, user_id)
            .await?
            .ok_or(LoginError::TicketInvalid)?;
        if !user.is_active {
            return Err(LoginError::AccountDisabled);
        }
        if !verify_secret_blocking(pin.to_string(), user.pin_hash.clone()).await {
            return Err(LoginError::InvalidPin);
        }

        self.authenticated(user).await
    }

    /// Password login for accounts that have a password
    pub async fn password_login(
        &self,
        user_code: &str,
        password: &str,
    ) -> Result<Authenticated, LoginError> {
        let user = user_repo::find_by_code(&self.pool, user_code.trim())
            .await?
            .ok_or(LoginError::InvalidCredentials)?;
        let Some(hash) = user.password_hash.clone() else {
            return Err(LoginError::InvalidCredentials);
        };
        if !verify_secret_blocking(password.to_string(), hash).await {
            return Err(LoginError::InvalidCredentials);
        }
        if !user.is_active {
            return Err(LoginError::AccountDisabled);
        }

        self.authenticated(user).await
    }

    /// Fresh access token for a user that is still active
    pub async fn refresh(&self, user_id: i64) -> Result<Authenticated, LoginError> {
        let user = user_repo::find_by_id(&self.pool, user_id)
            .await?
            .ok_or(LoginError::InvalidCredentials)?;
        if !user.is_active {
            return Err(LoginError::AccountDisabled);
        }
        self.authenticated(user).await
    }

    async fn authenticated(&self, user: User) -> Result<Authenticated, LoginError> {
        let token = self.jwt.generate_access_token(&user)?;
        let total_orders = user_repo::count_orders(&self.pool, user.id).await?;
        tracing::info!(user_id = user.id, user_code = %user.user_code, "User authenticated");
        Ok(Authenticated {
            token,
            expires_in: self.jwt.access_lifetime_secs(),
            user: UserInfo::from(&user),
            total_orders,
        })
    }
}
