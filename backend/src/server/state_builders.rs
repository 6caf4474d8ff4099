//! Builders wiring adapters into the HTTP state.
//!
//! With a database URL the Diesel repositories back every port and the pool
//! doubles as the readiness probe. Without one the in-memory store is used,
//! which suits local development and demos.

use std::io;
use std::sync::Arc;

use async_trait::async_trait;
use mockable::{Clock, DefaultClock};
use rand::RngCore;
use tracing::{info, warn};
use zeroize::Zeroizing;

use registrar::domain::ports::Mailer;
use registrar::inbound::http::health::ReadinessProbe;
use registrar::inbound::http::state::{Collaborators, HttpState, Repositories};
use registrar::outbound::mail::{LoggingMailer, SmtpMailer};
use registrar::outbound::memory::MemoryStore;
use registrar::outbound::persistence::{
    DbPool, DieselCourseRepository, DieselFacultyRepository, DieselIdentityRepository,
    DieselStudentRepository, PoolConfig, apply_migrations,
};
use registrar::outbound::security::{Argon2PasswordHasher, JwtTokenService, MIN_SECRET_LEN};

use super::AppSettings;

/// Everything the server needs from the adapter layer.
pub struct AppComponents {
    pub http_state: HttpState,
    pub probe: Option<Arc<dyn ReadinessProbe>>,
}

/// Readiness probe that checks a pooled connection can reach PostgreSQL.
struct DatabaseProbe(DbPool);

#[async_trait]
impl ReadinessProbe for DatabaseProbe {
    fn name(&self) -> &'static str {
        "postgres"
    }

    async fn check(&self) -> Result<(), String> {
        self.0.ping().await.map_err(|err| err.to_string())
    }
}

/// Resolve the token signing secret.
///
/// `token_secret` wins over `token_secret_file`. With neither set, debug
/// builds fall back to a random per-process secret; release builds refuse
/// to start.
pub(crate) fn load_token_secret(settings: &AppSettings) -> io::Result<Zeroizing<Vec<u8>>> {
    let secret = if let Some(raw) = settings.token_secret.as_deref() {
        Zeroizing::new(raw.trim().as_bytes().to_vec())
    } else if let Some(path) = settings.token_secret_file.as_deref() {
        let bytes = Zeroizing::new(std::fs::read(path).map_err(|err| {
            io::Error::other(format!(
                "failed to read token secret at {}: {err}",
                path.display()
            ))
        })?);
        Zeroizing::new(bytes.trim_ascii_end().to_vec())
    } else if cfg!(debug_assertions) {
        warn!("using an ephemeral token secret (dev only); tokens will not survive a restart");
        let mut bytes = Zeroizing::new(vec![0_u8; MIN_SECRET_LEN]);
        rand::thread_rng().fill_bytes(bytes.as_mut_slice());
        bytes
    } else {
        return Err(io::Error::new(
            io::ErrorKind::InvalidInput,
            "a token secret is required: set REGISTRAR_TOKEN_SECRET or REGISTRAR_TOKEN_SECRET_FILE",
        ));
    };

    if secret.len() < MIN_SECRET_LEN {
        return Err(io::Error::new(
            io::ErrorKind::InvalidInput,
            format!("token secret must be at least {MIN_SECRET_LEN} bytes"),
        ));
    }
    Ok(secret)
}

fn build_mailer(settings: &AppSettings) -> io::Result<Arc<dyn Mailer>> {
    match settings.smtp() {
        Some(smtp) => {
            info!(host = %smtp.host, "sending mail through SMTP relay");
            let mailer = SmtpMailer::new(smtp).map_err(|err| io::Error::other(err.to_string()))?;
            Ok(Arc::new(mailer))
        }
        None => {
            warn!("no SMTP relay configured; outgoing mail is only logged");
            Ok(Arc::new(LoggingMailer))
        }
    }
}

fn build_collaborators(settings: &AppSettings) -> io::Result<Collaborators> {
    let clock: Arc<dyn Clock> = Arc::new(DefaultClock);
    let secret = load_token_secret(settings)?;
    let tokens = JwtTokenService::new(&secret, settings.token_ttl(), clock.clone())
        .map_err(|err| io::Error::other(err.to_string()))?;
    Ok(Collaborators {
        hasher: Arc::new(Argon2PasswordHasher::new()),
        tokens: Arc::new(tokens),
        mailer: build_mailer(settings)?,
        clock,
    })
}

/// Open the pool after bringing the schema up to date.
async fn connect_database(settings: &AppSettings, url: &str) -> io::Result<DbPool> {
    apply_migrations(url)
        .await
        .map_err(|err| io::Error::other(err.to_string()))?;
    let config = PoolConfig::new(url).with_max_size(settings.db_max_connections());
    DbPool::new(config)
        .await
        .map_err(|err| io::Error::other(err.to_string()))
}

/// Build the HTTP state and readiness probe from settings.
///
/// # Errors
/// Returns [`io::Error`] when the secret is missing or too short, the SMTP
/// relay is misconfigured, or the database cannot be migrated.
pub async fn build_components(settings: &AppSettings) -> io::Result<AppComponents> {
    let collaborators = build_collaborators(settings)?;
    let policy = settings.account_policy();
    let capacity = settings.capacity_mode();

    match settings.database_url.as_deref() {
        Some(url) => {
            let pool = connect_database(settings, url).await?;
            info!(
                max_connections = settings.db_max_connections(),
                "connected to PostgreSQL"
            );
            let http_state = HttpState::assemble(
                Repositories {
                    identities: Arc::new(DieselIdentityRepository::new(pool.clone())),
                    students: Arc::new(DieselStudentRepository::new(pool.clone())),
                    faculty: Arc::new(DieselFacultyRepository::new(pool.clone())),
                    courses: Arc::new(DieselCourseRepository::new(pool.clone())),
                },
                collaborators,
                policy,
                capacity,
            );
            Ok(AppComponents {
                http_state,
                probe: Some(Arc::new(DatabaseProbe(pool))),
            })
        }
        None => {
            warn!("no database configured; records are held in memory");
            let store = Arc::new(MemoryStore::new());
            let http_state = HttpState::assemble(
                Repositories {
                    identities: store.clone(),
                    students: store.clone(),
                    faculty: store.clone(),
                    courses: store,
                },
                collaborators,
                policy,
                capacity,
            );
            Ok(AppComponents {
                http_state,
                probe: None,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::ffi::OsString;
    use std::io::Write;

    use env_lock::lock_env;
    use ortho_config::OrthoConfig;
    use rstest::rstest;

    const SECRET_VARS: [&str; 4] = [
        "REGISTRAR_TOKEN_SECRET",
        "REGISTRAR_TOKEN_SECRET_FILE",
        "REGISTRAR_DATABASE_URL",
        "REGISTRAR_SMTP_HOST",
    ];

    fn settings() -> AppSettings {
        AppSettings::load_from_iter([OsString::from("registrar")]).expect("config should load")
    }

    #[rstest]
    fn inline_secret_is_used() {
        let secret = "s".repeat(MIN_SECRET_LEN);
        let _guard = lock_env([
            ("REGISTRAR_TOKEN_SECRET", Some(secret.clone())),
            ("REGISTRAR_TOKEN_SECRET_FILE", None),
        ]);
        let loaded = load_token_secret(&settings()).expect("secret");
        assert_eq!(loaded.as_slice(), secret.as_bytes());
    }

    #[rstest]
    fn secret_file_is_read_without_trailing_newline() {
        let mut file = tempfile::NamedTempFile::new().expect("temp file");
        writeln!(file, "{}", "f".repeat(MIN_SECRET_LEN)).expect("write secret");
        let path = file.path().to_string_lossy().into_owned();
        let _guard = lock_env([
            ("REGISTRAR_TOKEN_SECRET", None),
            ("REGISTRAR_TOKEN_SECRET_FILE", Some(path)),
        ]);
        let loaded = load_token_secret(&settings()).expect("secret");
        assert_eq!(loaded.len(), MIN_SECRET_LEN);
    }

    #[rstest]
    fn short_secrets_are_rejected() {
        let _guard = lock_env([
            ("REGISTRAR_TOKEN_SECRET", Some("short".to_owned())),
            ("REGISTRAR_TOKEN_SECRET_FILE", None),
        ]);
        let err = load_token_secret(&settings()).expect_err("too short");
        assert_eq!(err.kind(), io::ErrorKind::InvalidInput);
    }

    #[rstest]
    fn missing_secret_file_is_reported() {
        let _guard = lock_env([
            ("REGISTRAR_TOKEN_SECRET", None),
            (
                "REGISTRAR_TOKEN_SECRET_FILE",
                Some("/nonexistent/registrar/secret".to_owned()),
            ),
        ]);
        let err = load_token_secret(&settings()).expect_err("missing file");
        assert!(err.to_string().contains("/nonexistent/registrar/secret"));
    }

    #[rstest]
    #[actix_rt::test]
    async fn memory_backend_is_used_without_a_database() {
        let _guard = lock_env(SECRET_VARS.map(|name| (name, None::<String>)));
        let components = build_components(&settings()).await.expect("components");
        assert!(components.probe.is_none());
    }
}
