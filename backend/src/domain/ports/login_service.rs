//! Driving port for login and bearer-token resolution.
//!
//! Inbound adapters call it to exchange credentials for a token and to turn
//! a presented token back into a [`Principal`] without knowing how identities
//! are stored.

use async_trait::async_trait;

use crate::domain::{Error, Identity, IssuedToken, LoginCredentials, Principal};

/// Result of a successful login.
#[derive(Debug, Clone)]
pub struct LoginOutcome {
    pub token: IssuedToken,
    pub identity: Identity,
}

/// Domain use-case port for authentication.
#[async_trait]
pub trait LoginService: Send + Sync {
    /// Check credentials, apply lockout bookkeeping, and issue a token.
    ///
    /// Unknown usernames and wrong passwords both fail with `unauthorized`;
    /// a locked account fails with `account_locked` whatever the password.
    async fn authenticate(&self, credentials: &LoginCredentials) -> Result<LoginOutcome, Error>;

    /// Verify `token` and reload its identity.
    ///
    /// Deleted or inactive identities are rejected with `unauthorized`.
    async fn resolve(&self, token: &str) -> Result<Principal, Error>;
}
