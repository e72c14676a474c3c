//! QR code rendering
//!
//! Credentials are rendered to a PNG and returned as a `data:` URL so the
//! frontend can show it directly and the mailer can attach it.

use std::io::Cursor;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use image::Luma;
use image::codecs::png::PngEncoder;
use qrcode::QrCode;
use shared::{AppError, ErrorCode};
use thiserror::Error;

const PNG_DATA_URL_PREFIX: &str = "data:image/png;base64,";

/// Side length of the rendered code in pixels
const QR_MIN_SIZE: u32 = 300;

#[derive(Debug, Error)]
pub enum QrError {
    #[error("QR encoding failed: {0}")]
    Encode(String),

    #[error("PNG encoding failed: {0}")]
    Png(String),
}

impl From<QrError> for AppError {
    fn from(err: QrError) -> Self {
        AppError::with_message(ErrorCode::QrGenerationFailed, err.to_string())
    }
}

/// Turns a string payload into a displayable image
pub trait QrEncoder: Send + Sync {
    fn encode_data_url(&self, payload: &str) -> Result<String, QrError>;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct PngQrEncoder;

impl PngQrEncoder {
    pub fn encode_png(&self, payload: &str) -> Result<Vec<u8>, QrError> {
        let code = QrCode::new(payload.as_bytes()).map_err(|e| QrError::Encode(e.to_string()))?;
        let img = code
            .render::<Luma<u8>>()
            .min_dimensions(QR_MIN_SIZE, QR_MIN_SIZE)
            .build();

        let mut buffer = Vec::new();
        {
            let mut cursor = Cursor::new(&mut buffer);
            img.write_with_encoder(PngEncoder::new(&mut cursor))
                .map_err(|e| QrError::Png(e.to_string()))?;
        }
        Ok(buffer)
    }
}

impl QrEncoder for PngQrEncoder {
    fn encode_data_url(&self, payload: &str) -> Result<String, QrError> {
        let png = self.encode_png(payload)?;
        Ok(format!("{PNG_DATA_URL_PREFIX}{}", STANDARD.encode(png)))
    }
}

/// Raw bytes of a PNG data URL produced by [`QrEncoder`]
pub fn decode_data_url(data_url: &str) -> Option<Vec<u8>> {
    let encoded = data_url.strip_prefix(PNG_DATA_URL_PREFIX)?;
    STANDARD.decode(encoded).ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_png_data_url() {
        let url = PngQrEncoder
            .encode_data_url("CANTEEN_STU001_1700000000000")
            .unwrap();
        assert!(url.starts_with(PNG_DATA_URL_PREFIX));

        let png = decode_data_url(&url).unwrap();
        assert_eq!(&png[..8], b"\x89PNG\r\n\x1a\n");

        let img = image::load_from_memory(&png).unwrap();
        assert!(img.width() >= QR_MIN_SIZE);
        assert_eq!(img.width(), img.height());
    }

    #[test]
    fn test_deterministic() {
        let a = PngQrEncoder.encode_png("upi://pay?pa=canteen@paytm").unwrap();
        let b = PngQrEncoder.encode_png("upi://pay?pa=canteen@paytm").unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_decode_rejects_other_urls() {
        assert!(decode_data_url("data:image/jpeg;base64,AAAA").is_none());
        assert!(decode_data_url("not a url").is_none());
    }
}
