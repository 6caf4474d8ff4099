//! Mailer that writes messages to the log instead of delivering them.

use async_trait::async_trait;

use crate::domain::ports::{Mailer, MailerError, OutgoingMail};

/// Log-only mailer used when no SMTP relay is configured.
///
/// Recipient and subject are logged at `info`. The body, which may carry a
/// reset token, is only emitted at `debug`.
#[derive(Debug, Default, Clone, Copy)]
pub struct LoggingMailer;

#[async_trait]
impl Mailer for LoggingMailer {
    async fn send(&self, mail: &OutgoingMail) -> Result<String, MailerError> {
        let id = super::message_id();
        tracing::info!(
            message_id = %id,
            to = %mail.to.as_str(),
            subject = %mail.subject,
            "mail relay not configured; message logged only"
        );
        tracing::debug!(message_id = %id, body = %mail.body, "logged mail body");
        Ok(id)
    }
}
