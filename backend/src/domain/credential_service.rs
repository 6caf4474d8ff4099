//! Login and bearer-token resolution.
//!
//! Implements [`LoginService`]. Lockout bookkeeping lives on
//! [`Identity`]; this service decides when to consult it and persists the
//! outcome of every attempt.

use std::sync::{Arc, OnceLock};

use async_trait::async_trait;
use mockable::Clock;
use serde_json::json;

use crate::domain::ports::{
    IdentityRepository, LoginOutcome, LoginService, PasswordHasher, TokenService,
};
use crate::domain::{
    AccountPolicy, Error, Identity, LoginCredentials, PasswordHash, Principal,
};

const INVALID_CREDENTIALS: &str = "invalid username or password";

/// Hashed once per service so rejected usernames pay for a verification too.
const DECOY_PASSWORD: &str = "registrar-decoy-password";

/// Credential checking service implementing [`LoginService`].
#[derive(Clone)]
pub struct CredentialService<I> {
    identities: Arc<I>,
    hasher: Arc<dyn PasswordHasher>,
    tokens: Arc<dyn TokenService>,
    clock: Arc<dyn Clock>,
    policy: AccountPolicy,
    decoy: OnceLock<PasswordHash>,
}

impl<I> CredentialService<I> {
    /// Create the service.
    ///
    /// # Examples
    /// ```ignore
    /// use std::sync::Arc;
    /// use mockable::DefaultClock;
    /// use registrar::domain::{AccountPolicy, CredentialService};
    ///
    /// let service = CredentialService::new(
    ///     Arc::new(store),
    ///     Arc::new(hasher),
    ///     Arc::new(tokens),
    ///     Arc::new(DefaultClock),
    ///     AccountPolicy::default(),
    /// );
    /// ```
    pub fn new(
        identities: Arc<I>,
        hasher: Arc<dyn PasswordHasher>,
        tokens: Arc<dyn TokenService>,
        clock: Arc<dyn Clock>,
        policy: AccountPolicy,
    ) -> Self {
        Self {
            identities,
            hasher,
            tokens,
            clock,
            policy,
            decoy: OnceLock::new(),
        }
    }
}

impl<I> CredentialService<I>
where
    I: IdentityRepository,
{
    fn locked_error(identity: &Identity) -> Error {
        let error = Error::account_locked("account is temporarily locked");
        match identity.lock_until {
            Some(until) => error.with_details(json!({ "lockedUntil": until })),
            None => error,
        }
    }

    /// Run a verification whose answer is ignored, so logins for unknown or
    /// inactive identities take as long as a wrong password.
    fn verify_decoy(&self, password: &str) -> Result<(), Error> {
        let decoy = match self.decoy.get() {
            Some(hash) => hash,
            None => {
                let hash = self.hasher.hash(DECOY_PASSWORD)?;
                self.decoy.get_or_init(|| hash)
            }
        };
        self.hasher.verify(password, decoy)?;
        Ok(())
    }

    async fn reject_attempt(&self, mut identity: Identity) -> Result<LoginOutcome, Error> {
        let now = self.clock.utc();
        let locked_now = identity.record_failed_login(&self.policy.lockout, now);
        self.identities.update(&identity).await?;
        if locked_now {
            tracing::warn!(
                identity_id = %identity.id,
                attempts = identity.failed_login_attempts,
                "account locked after repeated failed logins"
            );
            return Err(Self::locked_error(&identity));
        }
        tracing::info!(
            identity_id = %identity.id,
            attempts = identity.failed_login_attempts,
            "failed login"
        );
        Err(Error::unauthorized(INVALID_CREDENTIALS))
    }
}

#[async_trait]
impl<I> LoginService for CredentialService<I>
where
    I: IdentityRepository,
{
    async fn authenticate(&self, credentials: &LoginCredentials) -> Result<LoginOutcome, Error> {
        let Some(mut identity) = self
            .identities
            .find_by_username(credentials.username())
            .await?
        else {
            tracing::info!("login attempt for unknown username");
            self.verify_decoy(credentials.password())?;
            return Err(Error::unauthorized(INVALID_CREDENTIALS));
        };
        if !identity.active {
            tracing::info!(identity_id = %identity.id, "login attempt for inactive identity");
            self.verify_decoy(credentials.password())?;
            return Err(Error::unauthorized(INVALID_CREDENTIALS));
        }

        let now = self.clock.utc();
        if identity.is_locked(now) {
            tracing::info!(identity_id = %identity.id, "login attempt while locked");
            return Err(Self::locked_error(&identity));
        }

        let matches = self
            .hasher
            .verify(credentials.password(), &identity.password_hash)?;
        if !matches {
            return self.reject_attempt(identity).await;
        }

        identity.record_successful_login(now);
        self.identities.update(&identity).await?;
        let token = self.tokens.issue(&identity, now)?;
        tracing::info!(identity_id = %identity.id, role = %identity.role, "login succeeded");
        Ok(LoginOutcome { token, identity })
    }

    async fn resolve(&self, token: &str) -> Result<Principal, Error> {
        let claims = self.tokens.verify(token)?;
        let identity = self
            .identities
            .find_by_id(&claims.sub)
            .await?
            .filter(|identity| identity.active)
            .ok_or_else(|| Error::unauthorized("identity is no longer active"))?;
        Ok(Principal {
            identity_id: identity.id,
            username: identity.username.as_str().to_owned(),
            role: identity.role,
            profile: identity.profile,
        })
    }
}

#[cfg(test)]
#[path = "credential_service_tests.rs"]
mod tests;
