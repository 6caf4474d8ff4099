//! Embedded schema migrations, applied at start-up.

use diesel::{Connection, PgConnection};
use diesel_migrations::{EmbeddedMigrations, MigrationHarness, embed_migrations};
use tracing::info;

const MIGRATIONS: EmbeddedMigrations = embed_migrations!("migrations");

/// Error raised while bringing the schema up to date.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("schema migration failed: {message}")]
pub struct MigrationError {
    message: String,
}

impl MigrationError {
    fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

fn run_blocking(database_url: &str) -> Result<usize, MigrationError> {
    let mut conn = PgConnection::establish(database_url)
        .map_err(|err| MigrationError::new(format!("connect: {err}")))?;
    let applied = conn
        .run_pending_migrations(MIGRATIONS)
        .map_err(|err| MigrationError::new(err.to_string()))?;
    Ok(applied.len())
}

/// Apply any pending migrations over a dedicated synchronous connection.
///
/// The migration harness is blocking, so the work runs on Tokio's blocking
/// pool.
pub async fn apply_migrations(database_url: &str) -> Result<(), MigrationError> {
    let url = database_url.to_owned();
    let applied = tokio::task::spawn_blocking(move || run_blocking(&url))
        .await
        .map_err(|err| MigrationError::new(format!("migration task: {err}")))??;
    info!(applied, "database schema is up to date");
    Ok(())
}
