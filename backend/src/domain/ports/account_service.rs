//! Driving port for identity management and credential upkeep.

use async_trait::async_trait;
use pagination::Page;

use crate::domain::{EmailAddress, Error, Identity, IdentityId, NewPassword, Principal, Username};

use super::IdentityQuery;

/// Fields for a standalone admin identity.
#[derive(Debug, Clone)]
pub struct AdminRegistration {
    pub username: Username,
    pub email: EmailAddress,
    pub password: NewPassword,
}

/// Partial update of identity flags and contact email.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IdentityUpdate {
    pub email: Option<EmailAddress>,
    pub active: Option<bool>,
    pub verified: Option<bool>,
}

/// Domain use-case port for identities.
#[async_trait]
pub trait AccountService: Send + Sync {
    /// Register another admin. Admin only.
    async fn register_admin(
        &self,
        principal: &Principal,
        registration: AdminRegistration,
    ) -> Result<Identity, Error>;

    async fn get(&self, principal: &Principal, id: IdentityId) -> Result<Identity, Error>;

    async fn list(&self, principal: &Principal, query: &IdentityQuery)
    -> Result<Page<Identity>, Error>;

    async fn update(
        &self,
        principal: &Principal,
        id: IdentityId,
        update: IdentityUpdate,
    ) -> Result<Identity, Error>;

    /// Delete an identity with no linked profile. Admins cannot delete
    /// themselves.
    async fn delete(&self, principal: &Principal, id: IdentityId) -> Result<(), Error>;

    /// The caller's own identity.
    async fn me(&self, principal: &Principal) -> Result<Identity, Error>;

    /// Replace the caller's password after checking the current one.
    async fn change_password(
        &self,
        principal: &Principal,
        current: &str,
        new_password: NewPassword,
    ) -> Result<(), Error>;

    /// Mail a reset token to `email`. Unknown addresses succeed silently.
    async fn request_password_reset(&self, email: &EmailAddress) -> Result<(), Error>;

    /// Set a new password using an emailed reset token.
    async fn reset_password(&self, token: &str, new_password: NewPassword) -> Result<(), Error>;
}
