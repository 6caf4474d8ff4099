//! Port abstraction for outbound email.

use async_trait::async_trait;

use crate::domain::EmailAddress;

use super::define_port_error;

/// A plain-text message ready for delivery.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutgoingMail {
    pub to: EmailAddress,
    pub subject: String,
    pub body: String,
}

define_port_error! {
    /// Errors raised by mail adapters.
    pub enum MailerError {
        /// Recipient or sender address was rejected while building the message.
        InvalidAddress { message: String } => "invalid mail address: {message}",
        /// The relay refused or could not be reached.
        Delivery { message: String } => "mail delivery failed: {message}",
    }
}

/// Sends transactional mail such as password reset links.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Mailer: Send + Sync {
    /// Deliver `mail`, returning the message id assigned to it.
    async fn send(&self, mail: &OutgoingMail) -> Result<String, MailerError>;
}

impl From<MailerError> for crate::domain::Error {
    fn from(value: MailerError) -> Self {
        tracing::warn!(error = %value, "mail delivery failed");
        Self::dependency_failure("email could not be sent")
    }
}
