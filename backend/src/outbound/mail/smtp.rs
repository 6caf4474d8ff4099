//! SMTP relay mailer built on lettre's async transport.

use async_trait::async_trait;
use lettre::message::Mailbox;
use lettre::message::header::ContentType;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use zeroize::Zeroizing;

use crate::domain::ports::{Mailer, MailerError, OutgoingMail};

/// Connection details for the relay.
#[derive(Clone)]
pub struct SmtpSettings {
    pub host: String,
    pub username: Option<String>,
    pub password: Option<Zeroizing<String>>,
    /// Sender mailbox, e.g. `Registrar <no-reply@example.edu>`.
    pub from: String,
}

/// Delivers mail through an SMTP relay over TLS.
#[derive(Clone)]
pub struct SmtpMailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
}

impl SmtpMailer {
    /// Build the transport. No connection is made until the first send.
    pub fn new(settings: SmtpSettings) -> Result<Self, MailerError> {
        let from: Mailbox = settings
            .from
            .parse()
            .map_err(|err: lettre::address::AddressError| {
                MailerError::invalid_address(err.to_string())
            })?;
        let mut builder = AsyncSmtpTransport::<Tokio1Executor>::relay(&settings.host)
            .map_err(|err| MailerError::delivery(err.to_string()))?;
        if let (Some(username), Some(password)) = (settings.username, settings.password) {
            builder = builder.credentials(Credentials::new(username, password.to_string()));
        }
        Ok(Self {
            transport: builder.build(),
            from,
        })
    }

    fn build_message(&self, mail: &OutgoingMail, id: &str) -> Result<Message, MailerError> {
        let to: Mailbox = mail
            .to
            .as_str()
            .parse()
            .map_err(|err: lettre::address::AddressError| {
                MailerError::invalid_address(err.to_string())
            })?;
        Message::builder()
            .from(self.from.clone())
            .to(to)
            .subject(mail.subject.clone())
            .message_id(Some(id.to_owned()))
            .header(ContentType::TEXT_PLAIN)
            .body(mail.body.clone())
            .map_err(|err| MailerError::invalid_address(err.to_string()))
    }
}

#[async_trait]
impl Mailer for SmtpMailer {
    async fn send(&self, mail: &OutgoingMail) -> Result<String, MailerError> {
        let id = super::message_id();
        let message = self.build_message(mail, &id)?;
        self.transport
            .send(message)
            .await
            .map_err(|err| MailerError::delivery(err.to_string()))?;
        tracing::info!(message_id = %id, to = %mail.to.as_str(), "mail relayed");
        Ok(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::EmailAddress;

    fn settings(from: &str) -> SmtpSettings {
        SmtpSettings {
            host: "smtp.example.edu".to_owned(),
            username: Some("relay".to_owned()),
            password: Some(Zeroizing::new("secret".to_owned())),
            from: from.to_owned(),
        }
    }

    #[tokio::test]
    async fn invalid_sender_is_rejected() {
        let err = SmtpMailer::new(settings("not an address"))
            .err()
            .expect("invalid sender");
        assert!(matches!(err, MailerError::InvalidAddress { .. }));
    }

    #[tokio::test]
    async fn message_carries_assigned_id() {
        let mailer = SmtpMailer::new(settings("Registrar <no-reply@example.edu>")).expect("mailer");
        let mail = OutgoingMail {
            to: EmailAddress::parse("ada@example.edu").expect("email"),
            subject: "Reset".to_owned(),
            body: "token".to_owned(),
        };
        let message = mailer.build_message(&mail, "<abc@registrar>").expect("message");
        let raw = String::from_utf8(message.formatted()).expect("utf8");
        assert!(raw.contains("Message-ID: <abc@registrar>"));
        assert!(raw.contains("To: ada@example.edu"));
    }
}
