//! Identity management, password changes, and password reset.

use std::sync::Arc;

use async_trait::async_trait;
use mockable::Clock;
use pagination::Page;
use rand::RngCore;
use rand::rngs::OsRng;
use sha2::{Digest, Sha256};
use zeroize::Zeroizing;

use crate::domain::ports::{
    AccountService, AdminRegistration, IdentityQuery, IdentityRepository, IdentityUpdate, Mailer,
    OutgoingMail, PasswordHasher,
};
use crate::domain::provisioning::{
    build_identity, ensure_email_available, ensure_identity_available,
};
use crate::domain::{
    AccountPolicy, Action, EmailAddress, Error, Identity, IdentityId, NewIdentity, NewPassword,
    Principal, Role, require,
};

/// Number of random bytes in a password reset token.
const RESET_TOKEN_BYTES: usize = 32;

/// SHA-256 digest of a reset token, hex encoded. Only this digest is stored.
///
/// # Examples
/// ```
/// use registrar::domain::hash_reset_token;
///
/// let digest = hash_reset_token("abc");
/// assert_eq!(digest.len(), 64);
/// assert_eq!(digest, hash_reset_token("abc"));
/// ```
pub fn hash_reset_token(token: &str) -> String {
    hex::encode(Sha256::digest(token.as_bytes()))
}

fn generate_reset_token() -> Zeroizing<String> {
    let mut bytes = Zeroizing::new([0_u8; RESET_TOKEN_BYTES]);
    OsRng.fill_bytes(&mut *bytes);
    Zeroizing::new(hex::encode(&*bytes))
}

/// Identity administration service implementing [`AccountService`].
#[derive(Clone)]
pub struct AccountManager<I> {
    identities: Arc<I>,
    hasher: Arc<dyn PasswordHasher>,
    mailer: Arc<dyn Mailer>,
    clock: Arc<dyn Clock>,
    policy: AccountPolicy,
}

impl<I> AccountManager<I> {
    /// Create the service.
    pub fn new(
        identities: Arc<I>,
        hasher: Arc<dyn PasswordHasher>,
        mailer: Arc<dyn Mailer>,
        clock: Arc<dyn Clock>,
        policy: AccountPolicy,
    ) -> Self {
        Self {
            identities,
            hasher,
            mailer,
            clock,
            policy,
        }
    }
}

impl<I> AccountManager<I>
where
    I: IdentityRepository,
{
    /// Create an admin identity without a calling principal.
    ///
    /// Used by the bootstrap command to provision the first admin; the HTTP
    /// surface goes through [`AccountService::register_admin`].
    pub async fn bootstrap_admin(
        &self,
        registration: AdminRegistration,
    ) -> Result<Identity, Error> {
        let AdminRegistration {
            username,
            email,
            password,
        } = registration;
        ensure_identity_available(self.identities.as_ref(), &username, &email).await?;
        let mut identity = build_identity(
            self.hasher.as_ref(),
            NewIdentity {
                username,
                email,
                role: Role::Admin,
                profile: None,
            },
            &password,
            self.clock.utc(),
        )?;
        identity.verified = true;
        self.identities.insert(&identity).await?;
        tracing::info!(identity_id = %identity.id, "admin identity created");
        Ok(identity)
    }

    async fn load(&self, id: &IdentityId) -> Result<Identity, Error> {
        self.identities
            .find_by_id(id)
            .await?
            .ok_or_else(|| Error::not_found("identity not found"))
    }

    fn reset_mail(identity: &Identity, token: &str, ttl_minutes: i64) -> OutgoingMail {
        OutgoingMail {
            to: identity.email.clone(),
            subject: "Password reset requested".to_owned(),
            body: format!(
                "Hello {username},\n\n\
                 A password reset was requested for your account. Use the token \
                 below within {ttl_minutes} minutes to choose a new password:\n\n\
                 {token}\n\n\
                 If you did not ask for this, you can ignore this message.\n",
                username = identity.username,
            ),
        }
    }
}

#[async_trait]
impl<I> AccountService for AccountManager<I>
where
    I: IdentityRepository,
{
    async fn register_admin(
        &self,
        principal: &Principal,
        registration: AdminRegistration,
    ) -> Result<Identity, Error> {
        require(Some(principal), Action::ManageIdentities)?;
        self.bootstrap_admin(registration).await
    }

    async fn get(&self, principal: &Principal, id: IdentityId) -> Result<Identity, Error> {
        require(Some(principal), Action::ManageIdentities)?;
        self.load(&id).await
    }

    async fn list(
        &self,
        principal: &Principal,
        query: &IdentityQuery,
    ) -> Result<Page<Identity>, Error> {
        require(Some(principal), Action::ManageIdentities)?;
        Ok(self.identities.list(query).await?)
    }

    async fn update(
        &self,
        principal: &Principal,
        id: IdentityId,
        update: IdentityUpdate,
    ) -> Result<Identity, Error> {
        require(Some(principal), Action::ManageIdentities)?;
        let mut identity = self.load(&id).await?;
        if update.active == Some(false) && id == principal.identity_id {
            return Err(Error::invalid_request("cannot deactivate your own identity"));
        }
        if let Some(email) = update.email {
            if email != identity.email {
                if identity.profile.is_some() {
                    return Err(Error::invalid_request(
                        "email of a linked identity follows its profile; update the profile",
                    ));
                }
                ensure_email_available(self.identities.as_ref(), &email, Some(identity.id))
                    .await?;
                identity.email = email;
            }
        }
        if let Some(active) = update.active {
            identity.active = active;
        }
        if let Some(verified) = update.verified {
            identity.verified = verified;
        }
        identity.updated_at = self.clock.utc();
        self.identities.update(&identity).await?;
        Ok(identity)
    }

    async fn delete(&self, principal: &Principal, id: IdentityId) -> Result<(), Error> {
        require(Some(principal), Action::ManageIdentities)?;
        if id == principal.identity_id {
            return Err(Error::invalid_request("cannot delete your own identity"));
        }
        let identity = self.load(&id).await?;
        if identity.profile.is_some() {
            return Err(Error::invalid_request(
                "identity is linked to a profile; delete the profile instead",
            ));
        }
        if !self.identities.delete(&id).await? {
            return Err(Error::not_found("identity not found"));
        }
        tracing::info!(identity_id = %id, "identity deleted");
        Ok(())
    }

    async fn me(&self, principal: &Principal) -> Result<Identity, Error> {
        require(Some(principal), Action::ManageOwnAccount)?;
        self.identities
            .find_by_id(&principal.identity_id)
            .await?
            .ok_or_else(|| Error::unauthorized("identity is no longer active"))
    }

    async fn change_password(
        &self,
        principal: &Principal,
        current: &str,
        new_password: NewPassword,
    ) -> Result<(), Error> {
        let mut identity = self.me(principal).await?;
        if !self.hasher.verify(current, &identity.password_hash)? {
            tracing::info!(
                identity_id = %identity.id,
                "password change rejected: wrong current password"
            );
            return Err(Error::unauthorized("current password is incorrect"));
        }
        let hash = self.hasher.hash(new_password.expose())?;
        identity.set_password(hash, self.clock.utc());
        self.identities.update(&identity).await?;
        tracing::info!(identity_id = %identity.id, "password changed");
        Ok(())
    }

    async fn request_password_reset(&self, email: &EmailAddress) -> Result<(), Error> {
        let Some(mut identity) = self.identities.find_by_email(email.as_str()).await? else {
            tracing::info!("password reset requested for unknown email");
            return Ok(());
        };
        if !identity.active {
            tracing::info!(
                identity_id = %identity.id,
                "password reset requested for inactive identity"
            );
            return Ok(());
        }

        let token = generate_reset_token();
        let now = self.clock.utc();
        let expires_at = now + self.policy.reset_token_ttl;
        identity.begin_password_reset(hash_reset_token(token.as_str()), expires_at);
        identity.updated_at = now;
        self.identities.update(&identity).await?;

        let mail = Self::reset_mail(
            &identity,
            token.as_str(),
            self.policy.reset_token_ttl.num_minutes(),
        );
        let message_id = self.mailer.send(&mail).await?;
        tracing::info!(identity_id = %identity.id, %message_id, "password reset token issued");
        Ok(())
    }

    async fn reset_password(&self, token: &str, new_password: NewPassword) -> Result<(), Error> {
        let digest = hash_reset_token(token.trim());
        let now = self.clock.utc();
        let mut identity = self
            .identities
            .find_by_reset_token_hash(&digest)
            .await?
            .filter(|identity| identity.reset_token_valid(&digest, now))
            .ok_or_else(|| Error::invalid_request("reset token is invalid or has expired"))?;
        let hash = self.hasher.hash(new_password.expose())?;
        identity.set_password(hash, now);
        self.identities.update(&identity).await?;
        tracing::info!(identity_id = %identity.id, "password reset completed");
        Ok(())
    }
}

#[cfg(test)]
#[path = "account_service_tests.rs"]
mod tests;
