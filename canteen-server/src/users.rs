//! Account provisioning and QR credentials

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use shared::models::{Role, User};
use shared::{AppError, ErrorCode};
use sqlx::SqlitePool;

use crate::auth::password::hash_secret_blocking;
use crate::db::repository::{RepoError, user as user_repo};
use crate::services::{MailMessage, Mailer, QrEncoder, qr::decode_data_url};

/// Attempts at claiming a fresh user code before giving up
const USER_CODE_ATTEMPTS: usize = 3;

#[derive(Debug, Clone)]
pub struct NewAccount {
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub photo: Option<String>,
    pub role: Role,
    pub pin: String,
    pub password: Option<String>,
}

/// Opaque QR login credential: `CANTEEN_{user_code}_{millis}`
pub fn qr_credential(user_code: &str, now_millis: i64) -> String {
    format!("CANTEEN_{user_code}_{now_millis}")
}

fn hash_error(e: argon2::password_hash::Error) -> AppError {
    AppError::internal(format!("Failed to hash secret: {e}"))
}

/// Create a user with a generated code and QR credential
///
/// Codes are `prefix + counter`; two concurrent creations for the same role
/// can race for a code, the loser retries with the next one.
pub async fn create_account(pool: &SqlitePool, account: NewAccount) -> Result<User, AppError> {
    let pin_hash = hash_secret_blocking(account.pin.clone())
        .await
        .map_err(hash_error)?;
    let password_hash = match &account.password {
        Some(password) => Some(
            hash_secret_blocking(password.clone())
                .await
                .map_err(hash_error)?,
        ),
        None => None,
    };

    for _ in 0..USER_CODE_ATTEMPTS {
        let user_code = user_repo::next_user_code(pool, account.role).await?;
        let new_user = user_repo::NewUser {
            qr_code: qr_credential(&user_code, shared::util::now_millis()),
            user_code,
            name: account.name.trim().to_string(),
            email: account.email.trim().to_lowercase(),
            phone: account.phone.clone(),
            photo: account.photo.clone(),
            role: account.role,
            pin_hash: pin_hash.clone(),
            password_hash: password_hash.clone(),
        };

        match user_repo::create(pool, new_user).await {
            Ok(user) => {
                tracing::info!(user_id = user.id, user_code = %user.user_code, role = %user.role, "User created");
                return Ok(user);
            }
            Err(RepoError::Duplicate(msg)) if msg.contains("users.email") => {
                return Err(AppError::new(ErrorCode::UserEmailExists));
            }
            Err(RepoError::Duplicate(msg)) => {
                tracing::debug!(error = %msg, "User code taken, retrying");
            }
            Err(e) => return Err(e.into()),
        }
    }

    Err(AppError::system_busy())
}

/// Render the user's QR credential as a PNG data URL
pub fn render_credential(encoder: &dyn QrEncoder, user: &User) -> Result<String, AppError> {
    Ok(encoder.encode_data_url(&user.qr_code)?)
}

/// Mail the rendered credential; delivery failures are logged and reported as `false`
pub async fn mail_credential(mailer: &dyn Mailer, user: &User, qr_data_url: &str) -> bool {
    let Some(png) = decode_data_url(qr_data_url) else {
        return false;
    };
    let message = MailMessage::qr_credential(
        &user.email,
        &user.name,
        STANDARD.encode(png),
    );
    match mailer.send(&message).await {
        Ok(()) => true,
        Err(e) => {
            tracing::warn!(user_id = user.id, error = %e, "Failed to mail QR credential");
            false
        }
    }
}
