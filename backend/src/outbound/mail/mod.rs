//! Mail adapters implementing the `Mailer` port.
//!
//! [`SmtpMailer`] relays through an SMTP server with lettre. When no relay is
//! configured [`LoggingMailer`] records each message through `tracing`
//! instead, which keeps password reset usable in development.

mod logging;
mod smtp;

pub use logging::LoggingMailer;
pub use smtp::{SmtpMailer, SmtpSettings};

fn message_id() -> String {
    format!("<{}@registrar>", uuid::Uuid::new_v4())
}
