//! Provision an admin identity directly in the database.
//!
//! Admins can only be created over HTTP by another admin, so the first one
//! comes from here.
#![cfg_attr(not(any(test, doctest)), deny(clippy::unwrap_used))]
#![cfg_attr(not(any(test, doctest)), deny(clippy::expect_used))]

use std::env;
use std::io;
use std::sync::Arc;

use clap::Parser;
use mockable::DefaultClock;
use tokio::runtime::Builder;
use zeroize::Zeroizing;

use registrar::domain::ports::AdminRegistration;
use registrar::domain::{AccountManager, AccountPolicy, EmailAddress, NewPassword, Username};
use registrar::outbound::mail::LoggingMailer;
use registrar::outbound::persistence::{
    DbPool, DieselIdentityRepository, PoolConfig, apply_migrations,
};
use registrar::outbound::security::Argon2PasswordHasher;

const PASSWORD_ENV: &str = "REGISTRAR_ADMIN_PASSWORD";
const DATABASE_URL_ENV: &str = "REGISTRAR_DATABASE_URL";

/// `create-admin` command arguments.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "create-admin",
    about = "Create an admin identity; the password is read from REGISTRAR_ADMIN_PASSWORD",
    version
)]
struct CliArgs {
    #[arg(long, value_name = "name")]
    username: String,
    #[arg(long, value_name = "address")]
    email: String,
    /// Database connection URL. Falls back to `REGISTRAR_DATABASE_URL` when omitted.
    #[arg(long = "database-url", value_name = "url")]
    database_url: Option<String>,
}

fn main() -> io::Result<()> {
    let runtime = Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(|error| io::Error::other(format!("create Tokio runtime: {error}")))?;
    runtime.block_on(async_main())
}

async fn async_main() -> io::Result<()> {
    let args = CliArgs::try_parse().map_err(io::Error::other)?;
    let password = Zeroizing::new(env::var(PASSWORD_ENV).map_err(|_| {
        io::Error::new(
            io::ErrorKind::InvalidInput,
            format!("admin password missing: set {PASSWORD_ENV}"),
        )
    })?);
    let registration = parse_registration(&args, &password)?;
    let database_url = resolve_database_url(args.database_url)?;

    apply_migrations(&database_url)
        .await
        .map_err(|error| io::Error::other(format!("migrate database: {error}")))?;
    let pool = DbPool::new(PoolConfig::new(&database_url).with_max_size(1))
        .await
        .map_err(|error| io::Error::other(format!("create database pool: {error}")))?;

    let accounts = AccountManager::new(
        Arc::new(DieselIdentityRepository::new(pool)),
        Arc::new(Argon2PasswordHasher::new()),
        Arc::new(LoggingMailer),
        Arc::new(DefaultClock),
        AccountPolicy::default(),
    );
    let identity = accounts
        .bootstrap_admin(registration)
        .await
        .map_err(|error| io::Error::other(format!("create admin failed: {error}")))?;

    println!("id={}", identity.id);
    println!("username={}", identity.username);
    Ok(())
}

fn invalid_input(message: String) -> io::Error {
    io::Error::new(io::ErrorKind::InvalidInput, message)
}

fn parse_registration(args: &CliArgs, password: &str) -> io::Result<AdminRegistration> {
    Ok(AdminRegistration {
        username: Username::parse(&args.username)
            .map_err(|error| invalid_input(format!("--username: {error}")))?,
        email: EmailAddress::parse(&args.email)
            .map_err(|error| invalid_input(format!("--email: {error}")))?,
        password: NewPassword::new(password)
            .map_err(|error| invalid_input(format!("{PASSWORD_ENV}: {error}")))?,
    })
}

fn resolve_database_url(explicit: Option<String>) -> io::Result<String> {
    let value = match explicit {
        Some(value) => value,
        None => env::var(DATABASE_URL_ENV).map_err(|_| {
            invalid_input(format!(
                "database URL missing: set --database-url or {DATABASE_URL_ENV}"
            ))
        })?,
    };
    if value.trim().is_empty() {
        return Err(invalid_input("database URL must not be empty".to_owned()));
    }
    Ok(value)
}

#[cfg(test)]
mod tests {
    //! Unit tests for argument validation.

    use rstest::rstest;

    use super::*;

    fn args(username: &str, email: &str) -> CliArgs {
        CliArgs {
            username: username.to_owned(),
            email: email.to_owned(),
            database_url: None,
        }
    }

    #[rstest]
    fn valid_arguments_build_a_registration() {
        let registration = parse_registration(
            &args("registrar", "registrar@example.edu"),
            "correct-horse-battery",
        )
        .expect("valid registration");
        assert_eq!(registration.username.as_str(), "registrar");
    }

    #[rstest]
    #[case("x", "registrar@example.edu", "correct-horse-battery", "--username")]
    #[case("registrar", "not-an-email", "correct-horse-battery", "--email")]
    #[case("registrar", "registrar@example.edu", "short", PASSWORD_ENV)]
    fn invalid_arguments_name_the_source(
        #[case] username: &str,
        #[case] email: &str,
        #[case] password: &str,
        #[case] source: &str,
    ) {
        let error = parse_registration(&args(username, email), password)
            .expect_err("registration should be rejected");
        assert_eq!(error.kind(), io::ErrorKind::InvalidInput);
        assert!(error.to_string().starts_with(source));
    }

    #[rstest]
    fn blank_database_url_is_rejected() {
        let error = resolve_database_url(Some("  ".to_owned())).expect_err("blank url");
        assert_eq!(error.kind(), io::ErrorKind::InvalidInput);
    }
}
