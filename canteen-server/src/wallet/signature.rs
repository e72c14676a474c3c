//! Payment callback signatures
//!
//! Header format: `t={unix_seconds},v1={hex(hmac_sha256(secret, "{t}.{body}"))}`

use hmac::{Hmac, Mac};
use sha2::Sha256;

pub const SIGNATURE_HEADER: &str = "x-payment-signature";

/// Callbacks older (or newer) than this are rejected
pub const REPLAY_WINDOW_SECS: i64 = 300;

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum SignatureError {
    #[error("Malformed signature header")]
    Malformed,
    #[error("Signature mismatch")]
    Mismatch,
    #[error("Signature timestamp outside the accepted window")]
    Expired,
}

pub fn verify_signature(
    payload: &[u8],
    header: &str,
    secret: &str,
    now: i64,
) -> Result<(), SignatureError> {
    let mut timestamp = "";
    let mut signature = "";
    for part in header.split(',') {
        let part = part.trim();
        if let Some(t) = part.strip_prefix("t=") {
            timestamp = t;
        } else if let Some(v) = part.strip_prefix("v1=") {
            signature = v;
        }
    }
    if timestamp.is_empty() || signature.is_empty() {
        return Err(SignatureError::Malformed);
    }

    let ts: i64 = timestamp.parse().map_err(|_| SignatureError::Malformed)?;
    let sig_bytes = hex::decode(signature).map_err(|_| SignatureError::Malformed)?;

    let mut mac = Hmac::<Sha256>::new_from_slice(secret.as_bytes())
        .map_err(|_| SignatureError::Malformed)?;
    mac.update(timestamp.as_bytes());
    mac.update(b".");
    mac.update(payload);
    mac.verify_slice(&sig_bytes)
        .map_err(|_| SignatureError::Mismatch)?;

    if (now - ts).abs() > REPLAY_WINDOW_SECS {
        return Err(SignatureError::Expired);
    }
    Ok(())
}

/// Produce a header value for `payload` (used by tests and local tooling)
pub fn sign(payload: &[u8], secret: &str, timestamp: i64) -> String {
    // HMAC accepts keys of any length
    let mut mac = match Hmac::<Sha256>::new_from_slice(secret.as_bytes()) {
        Ok(mac) => mac,
        Err(_) => return String::new(),
    };
    mac.update(timestamp.to_string().as_bytes());
    mac.update(b".");
    mac.update(payload);
    format!("t={timestamp},v1={}", hex::encode(mac.finalize().into_bytes()))
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "whsec_test";
    const BODY: &[u8] = br#"{"user_code":"STU001","amount":200.0}"#;

    #[test]
    fn test_valid_signature() {
        let header = sign(BODY, SECRET, 1_700_000_000);
        assert_eq!(verify_signature(BODY, &header, SECRET, 1_700_000_010), Ok(()));
    }

    #[test]
    fn test_tampered_body() {
        let header = sign(BODY, SECRET, 1_700_000_000);
        let tampered = br#"{"user_code":"STU001","amount":2000.0}"#;
        assert_eq!(
            verify_signature(tampered, &header, SECRET, 1_700_000_000),
            Err(SignatureError::Mismatch)
        );
    }

    #[test]
    fn test_wrong_secret() {
        let header = sign(BODY, "other", 1_700_000_000);
        assert_eq!(
            verify_signature(BODY, &header, SECRET, 1_700_000_000),
            Err(SignatureError::Mismatch)
        );
    }

    #[test]
    fn test_replay_window() {
        let header = sign(BODY, SECRET, 1_700_000_000);
        assert_eq!(
            verify_signature(BODY, &header, SECRET, 1_700_000_000 + REPLAY_WINDOW_SECS + 1),
            Err(SignatureError::Expired)
        );
    }

    #[test]
    fn test_malformed_headers() {
        for header in ["", "t=123", "v1=abcd", "t=abc,v1=00", "t=1,v1=zz"] {
            assert_eq!(
                verify_signature(BODY, header, SECRET, 1),
                Err(SignatureError::Malformed),
                "header {header:?}"
            );
        }
    }
}
