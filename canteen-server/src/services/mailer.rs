//! Outgoing mail
//!
//! Delivery is best effort: callers report whether a message went out but
//! never fail the surrounding operation because of it.

use async_trait::async_trait;
use serde::Serialize;
use shared::{AppError, ErrorCode};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum MailError {
    #[error("Mail relay request failed: {0}")]
    Transport(String),

    #[error("Mail relay rejected message: HTTP {0}")]
    Rejected(u16),
}

impl From<MailError> for AppError {
    fn from(err: MailError) -> Self {
        AppError::with_message(ErrorCode::MailError, err.to_string())
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Attachment {
    pub filename: String,
    pub content_type: String,
    /// Base64 content
    pub content: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct MailMessage {
    pub to: String,
    pub subject: String,
    pub html: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub attachments: Vec<Attachment>,
}

impl MailMessage {
    /// Welcome mail carrying a user's QR credential
    pub fn qr_credential(to: &str, name: &str, qr_png_base64: String) -> Self {
        let html = format!(
            "<p>Dear {name},</p>\
             <p>Your Smart Canteen QR code is attached. To log in, show it to the \
             scanner on the login page and enter your 4-digit PIN.</p>\
             <p>Keep your QR code private.</p>\
             <p>Smart Canteen Team</p>"
        );
        Self {
            to: to.to_string(),
            subject: "Your Smart Canteen QR Code".to_string(),
            html,
            attachments: vec![Attachment {
                filename: "qr-code.png".to_string(),
                content_type: "image/png".to_string(),
                content: qr_png_base64,
            }],
        }
    }
}

#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, message: &MailMessage) -> Result<(), MailError>;
}

/// Writes messages to the log instead of sending them
#[derive(Debug, Default, Clone, Copy)]
pub struct LogMailer;

#[async_trait]
impl Mailer for LogMailer {
    async fn send(&self, message: &MailMessage) -> Result<(), MailError> {
        tracing::info!(
            to = %message.to,
            subject = %message.subject,
            attachments = message.attachments.len(),
            "Mail (log only)"
        );
        Ok(())
    }
}

#[derive(Serialize)]
struct RelayPayload<'a> {
    from: &'a str,
    #[serde(flatten)]
    message: &'a MailMessage,
}

/// Posts messages as JSON to an HTTP mail relay
#[derive(Debug, Clone)]
pub struct WebhookMailer {
    client: reqwest::Client,
    url: String,
    from: String,
}

impl WebhookMailer {
    pub fn new(url: impl Into<String>, from: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            url: url.into(),
            from: from.into(),
        }
    }
}

#[async_trait]
impl Mailer for WebhookMailer {
    async fn send(&self, message: &MailMessage) -> Result<(), MailError> {
        let response = self
            .client
            .post(&self.url)
            .json(&RelayPayload {
                from: &self.from,
                message,
            })
            .send()
            .await
            .map_err(|e| MailError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(MailError::Rejected(status.as_u16()));
        }
        tracing::info!(to = %message.to, subject = %message.subject, "Mail sent");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_qr_credential_message() {
        let msg = MailMessage::qr_credential("asha@example.com", "Asha", "iVBORw0KGgo=".into());
        assert_eq!(msg.to, "asha@example.com");
        assert!(msg.html.contains("Dear Asha"));
        assert_eq!(msg.attachments.len(), 1);
        assert_eq!(msg.attachments[0].content_type, "image/png");
    }

    #[test]
    fn test_relay_payload_shape() {
        let msg = MailMessage::qr_credential("a@b.c", "A", "AAAA".into());
        let json = serde_json::to_value(RelayPayload {
            from: "noreply@canteen.local",
            message: &msg,
        })
        .unwrap();
        assert_eq!(json["from"], "noreply@canteen.local");
        assert_eq!(json["to"], "a@b.c");
        assert_eq!(json["attachments"][0]["filename"], "qr-code.png");
    }

    #[tokio::test]
    async fn test_log_mailer_always_succeeds() {
        let msg = MailMessage::qr_credential("a@b.c", "A", String::new());
        assert!(LogMailer.send(&msg).await.is_ok());
    }

    #[tokio::test]
    async fn test_webhook_mailer_unreachable_relay() {
        let mailer = WebhookMailer::new("http://127.0.0.1:9/mail", "noreply@canteen.local");
        let msg = MailMessage::qr_credential("a@b.c", "A", String::new());
        assert!(matches!(
            mailer.send(&msg).await,
            Err(MailError::Transport(_))
        ));
    }
}
