//! JWT 令牌服务
//!
//! HS256 tokens of two kinds: `access` for API calls and the short-lived
//! `qr_ticket` issued between the two QR login phases.

use chrono::{Duration, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use shared::models::{Role, User};
use thiserror::Error;

pub const TOKEN_TYPE_ACCESS: &str = "access";
pub const TOKEN_TYPE_QR_TICKET: &str = "qr_ticket";

/// Secret used when none is configured outside production
pub const DEV_JWT_SECRET: &str = "canteen-development-secret-change-me-in-production";

/// JWT 配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JwtConfig {
    pub secret: String,
    /// Access token lifetime (minutes)
    pub expiration_minutes: i64,
    /// QR login ticket lifetime (minutes)
    pub ticket_minutes: i64,
    pub issuer: String,
    pub audience: String,
}

impl Default for JwtConfig {
    fn default() -> Self {
        Self {
            secret: DEV_JWT_SECRET.to_string(),
            expiration_minutes: 480,
            ticket_minutes: 5,
            issuer: "canteen-server".to_string(),
            audience: "canteen-clients".to_string(),
        }
    }
}

/// 存储在令牌中的 JWT Claims
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// User id
    pub sub: String,
    pub user_code: String,
    pub name: String,
    pub role: Role,
    /// `access` or `qr_ticket`
    pub token_type: String,
    pub exp: i64,
    pub iat: i64,
    pub iss: String,
    pub aud: String,
}

/// JWT 错误
#[derive(Error, Debug)]
pub enum JwtError {
    #[error("Invalid token: {0}")]
    InvalidToken(String),

    #[error("Token expired")]
    ExpiredToken,

    #[error("Invalid signature")]
    InvalidSignature,

    #[error("Unexpected token type: {0}")]
    WrongTokenType(String),

    #[error("Token generation failed: {0}")]
    GenerationFailed(String),
}

/// JWT 令牌服务
#[derive(Clone)]
pub struct JwtService {
    pub config: JwtConfig,
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
}

impl std::fmt::Debug for JwtService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtService")
            .field("issuer", &self.config.issuer)
            .field("audience", &self.config.audience)
            .finish_non_exhaustive()
    }
}

impl JwtService {
    pub fn with_config(config: JwtConfig) -> Self {
        let encoding_key = EncodingKey::from_secret(config.secret.as_bytes());
        let decoding_key = DecodingKey::from_secret(config.secret.as_bytes());

        Self {
            config,
            encoding_key,
            decoding_key,
        }
    }

    fn issue(&self, user: &User, token_type: &str, lifetime: Duration) -> Result<String, JwtError> {
        let now = Utc::now();
        let claims = Claims {
            sub: user.id.to_string(),
            user_code: user.user_code.clone(),
            name: user.name.clone(),
            role: user.role,
            token_type: token_type.to_string(),
            exp: (now + lifetime).timestamp(),
            iat: now.timestamp(),
            iss: self.config.issuer.clone(),
            aud: self.config.audience.clone(),
        };

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| JwtError::GenerationFailed(e.to_string()))
    }

    /// Access token for API calls
    pub fn generate_access_token(&self, user: &User) -> Result<String, JwtError> {
        self.issue(
            user,
            TOKEN_TYPE_ACCESS,
            Duration::minutes(self.config.expiration_minutes),
        )
    }

    /// Ticket bridging QR scan and PIN verification
    pub fn generate_qr_ticket(&self, user: &User) -> Result<String, JwtError> {
        self.issue(
            user,
            TOKEN_TYPE_QR_TICKET,
            Duration::minutes(self.config.ticket_minutes),
        )
    }

    /// Verify signature, expiry, issuer and audience
    pub fn validate_token(&self, token: &str) -> Result<Claims, JwtError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_audience(&[&self.config.audience]);
        validation.set_issuer(&[&self.config.issuer]);
        validation.set_required_spec_claims(&["sub", "exp", "iat", "iss", "aud"]);
        validation.leeway = 0;

        let token_data = decode::<Claims>(token, &self.decoding_key, &validation).map_err(|e| {
            match e.kind() {
                ErrorKind::ExpiredSignature => JwtError::ExpiredToken,
                ErrorKind::InvalidSignature => JwtError::InvalidSignature,
                _ => JwtError::InvalidToken(e.to_string()),
            }
        })?;

        Ok(token_data.claims)
    }

    /// Validate and require a specific `token_type`
    pub fn validate_typed(&self, token: &str, token_type: &str) -> Result<Claims, JwtError> {
        let claims = self.validate_token(token)?;
        if claims.token_type != token_type {
            return Err(JwtError::WrongTokenType(claims.token_type));
        }
        Ok(claims)
    }

    pub fn validate_access_token(&self, token: &str) -> Result<Claims, JwtError> {
        self.validate_typed(token, TOKEN_TYPE_ACCESS)
    }

    /// 从 Authorization 头提取令牌
    pub fn extract_from_header(header: &str) -> Option<&str> {
        header.strip_prefix("Bearer ")
    }

    pub fn access_lifetime_secs(&self) -> i64 {
        self.config.expiration_minutes * 60
    }

    pub fn ticket_lifetime_secs(&self) -> i64 {
        self.config.ticket_minutes * 60
    }
}

/// 当前用户上下文 (从 JWT Claims 解析)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CurrentUser {
    pub id: i64,
    pub user_code: String,
    pub name: String,
    pub role: Role,
}

impl TryFrom<Claims> for CurrentUser {
    type Error = JwtError;

    fn try_from(claims: Claims) -> Result<Self, Self::Error> {
        let id = claims
            .sub
            .parse()
            .map_err(|_| JwtError::InvalidToken(format!("bad subject: {}", claims.sub)))?;
        Ok(Self {
            id,
            user_code: claims.user_code,
            name: claims.name,
            role: claims.role,
        })
    }
}

impl CurrentUser {
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }

    pub fn is_staff(&self) -> bool {
        matches!(self.role, Role::Staff | Role::Admin)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::Money;

    fn user(role: Role) -> User {
        User {
            id: 42,
            user_code: "STU042".into(),
            name: "Asha".into(),
            email: "asha@example.com".into(),
            phone: None,
            photo: None,
            role,
            qr_code: "qr-secret".into(),
            pin_hash: String::new(),
            password_hash: None,
            wallet_balance: Money::ZERO,
            is_active: true,
            created_at: 0,
            updated_at: 0,
        }
    }

    fn service() -> JwtService {
        JwtService::with_config(JwtConfig::default())
    }

    #[test]
    fn test_access_token_roundtrip() {
        let service = service();
        let token = service.generate_access_token(&user(Role::Staff)).unwrap();
        let claims = service.validate_access_token(&token).unwrap();
        assert_eq!(claims.sub, "42");
        assert_eq!(claims.user_code, "STU042");
        assert_eq!(claims.role, Role::Staff);
        assert_eq!(claims.token_type, TOKEN_TYPE_ACCESS);

        let current = CurrentUser::try_from(claims).unwrap();
        assert_eq!(current.id, 42);
        assert!(current.is_staff());
        assert!(!current.is_admin());
    }

    #[test]
    fn test_ticket_not_accepted_as_access() {
        let service = service();
        let ticket = service.generate_qr_ticket(&user(Role::User)).unwrap();
        assert!(matches!(
            service.validate_access_token(&ticket),
            Err(JwtError::WrongTokenType(t)) if t == TOKEN_TYPE_QR_TICKET
        ));
        assert!(service.validate_typed(&ticket, TOKEN_TYPE_QR_TICKET).is_ok());
    }

    #[test]
    fn test_wrong_secret_rejected() {
        let token = service().generate_access_token(&user(Role::User)).unwrap();
        let other = JwtService::with_config(JwtConfig {
            secret: "another-secret-of-reasonable-length-1234".into(),
            ..JwtConfig::default()
        });
        assert!(matches!(
            other.validate_token(&token),
            Err(JwtError::InvalidSignature)
        ));
    }

    #[test]
    fn test_expired_token() {
        let service = JwtService::with_config(JwtConfig {
            expiration_minutes: -5,
            ..JwtConfig::default()
        });
        let token = service.generate_access_token(&user(Role::User)).unwrap();
        assert!(matches!(
            service.validate_token(&token),
            Err(JwtError::ExpiredToken)
        ));
    }

    #[test]
    fn test_extract_from_header() {
        assert_eq!(JwtService::extract_from_header("Bearer abc"), Some("abc"));
        assert_eq!(JwtService::extract_from_header("Basic abc"), None);
    }
}
