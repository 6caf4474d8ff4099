//! Server settings loaded via OrthoConfig.
//!
//! Values come from CLI flags, `REGISTRAR_*` environment variables, and an
//! optional configuration file, in that order of precedence.

use std::net::SocketAddr;
use std::path::PathBuf;

use chrono::Duration;
use ortho_config::OrthoConfig;
use serde::Deserialize;
use zeroize::Zeroizing;

use registrar::domain::{AccountPolicy, CapacityMode, LockoutPolicy};
use registrar::outbound::mail::SmtpSettings;

const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8080";
const DEFAULT_DB_MAX_CONNECTIONS: u32 = 10;
const DEFAULT_TOKEN_TTL_HOURS: u32 = 24;
const DEFAULT_LOCKOUT_MAX_ATTEMPTS: u32 = 5;
const DEFAULT_LOCKOUT_MINUTES: u32 = 60;
const DEFAULT_RESET_TOKEN_TTL_MINUTES: u32 = 60;

/// Configuration values for the registrar server.
#[derive(Debug, Clone, Deserialize, OrthoConfig)]
#[ortho_config(prefix = "REGISTRAR")]
pub struct AppSettings {
    /// Socket address to listen on.
    pub bind_addr: Option<String>,
    /// PostgreSQL URL. Without it the server keeps data in memory.
    pub database_url: Option<String>,
    pub db_max_connections: Option<u32>,
    /// HS256 signing secret for bearer tokens.
    pub token_secret: Option<String>,
    /// File holding the signing secret; read when `token_secret` is unset.
    pub token_secret_file: Option<PathBuf>,
    pub token_ttl_hours: Option<u32>,
    /// Failed logins before the account locks.
    pub lockout_max_attempts: Option<u32>,
    pub lockout_minutes: Option<u32>,
    pub reset_token_ttl_minutes: Option<u32>,
    /// Reject enrollment writes that lost a race for the last seat.
    #[ortho_config(default = false)]
    pub strict_capacity: bool,
    pub smtp_host: Option<String>,
    pub smtp_username: Option<String>,
    pub smtp_password: Option<String>,
    pub mail_from: Option<String>,
}

impl AppSettings {
    /// Parse the listen address.
    pub fn bind_addr(&self) -> Result<SocketAddr, std::io::Error> {
        let raw = self.bind_addr.as_deref().unwrap_or(DEFAULT_BIND_ADDR);
        raw.parse().map_err(|err| {
            std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                format!("invalid bind address {raw}: {err}"),
            )
        })
    }

    pub fn db_max_connections(&self) -> u32 {
        self.db_max_connections.unwrap_or(DEFAULT_DB_MAX_CONNECTIONS)
    }

    pub fn token_ttl(&self) -> Duration {
        Duration::hours(i64::from(
            self.token_ttl_hours.unwrap_or(DEFAULT_TOKEN_TTL_HOURS).max(1),
        ))
    }

    pub fn account_policy(&self) -> AccountPolicy {
        let max_attempts = self
            .lockout_max_attempts
            .unwrap_or(DEFAULT_LOCKOUT_MAX_ATTEMPTS)
            .max(1);
        let lock_minutes = self.lockout_minutes.unwrap_or(DEFAULT_LOCKOUT_MINUTES);
        let reset_minutes = self
            .reset_token_ttl_minutes
            .unwrap_or(DEFAULT_RESET_TOKEN_TTL_MINUTES);
        AccountPolicy {
            lockout: LockoutPolicy {
                max_attempts,
                lock_duration: Duration::minutes(i64::from(lock_minutes)),
            },
            reset_token_ttl: Duration::minutes(i64::from(reset_minutes)),
        }
    }

    pub fn capacity_mode(&self) -> CapacityMode {
        CapacityMode::from_strict(self.strict_capacity)
    }

    /// SMTP relay settings, present only when a host and sender are both
    /// configured.
    pub fn smtp(&self) -> Option<SmtpSettings> {
        let host = self.smtp_host.as_deref().map(str::trim).filter(|h| !h.is_empty())?;
        let from = self.mail_from.as_deref().map(str::trim).filter(|f| !f.is_empty())?;
        Some(SmtpSettings {
            host: host.to_owned(),
            username: self.smtp_username.clone(),
            password: self.smtp_password.clone().map(Zeroizing::new),
            from: from.to_owned(),
        })
    }
}
