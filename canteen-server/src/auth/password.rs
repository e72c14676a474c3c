//! Argon2 hashing for PINs and passwords

use argon2::password_hash::SaltString;
use argon2::password_hash::rand_core::OsRng;
use argon2::{Argon2, PasswordHash, PasswordHasher, PasswordVerifier};

pub fn hash_secret(secret: &str) -> Result<String, argon2::password_hash::Error> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default().hash_password(secret.as_bytes(), &salt)?;
    Ok(hash.to_string())
}

/// Constant-time verify; an unparsable hash never matches
pub fn verify_secret(secret: &str, hash: &str) -> bool {
    let Ok(parsed) = PasswordHash::new(hash) else {
        return false;
    };
    Argon2::default()
        .verify_password(secret.as_bytes(), &parsed)
        .is_ok()
}

/// [`verify_secret`] off the async runtime threads
pub async fn verify_secret_blocking(secret: String, hash: String) -> bool {
    tokio::task::spawn_blocking(move || verify_secret(&secret, &hash))
        .await
        .unwrap_or(false)
}

/// [`hash_secret`] off the async runtime threads
pub async fn hash_secret_blocking(secret: String) -> Result<String, argon2::password_hash::Error> {
    tokio::task::spawn_blocking(move || hash_secret(&secret))
        .await
        .unwrap_or(Err(argon2::password_hash::Error::Crypto))
}
