//! Collaborators behind traits: QR rendering and mail delivery

pub mod mailer;
pub mod qr;

pub use mailer::{LogMailer, MailError, MailMessage, Mailer, WebhookMailer};
pub use qr::{PngQrEncoder, QrEncoder, QrError};
