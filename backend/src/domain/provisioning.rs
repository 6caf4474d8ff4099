//! Identity provisioning shared by the account, student, and faculty services.
//!
//! A student or faculty profile is never created without its login, so the
//! services build both here and undo the identity if the profile write fails.

use chrono::{DateTime, Utc};

use crate::domain::ports::{IdentityRepository, PasswordHasher};
use crate::domain::{EmailAddress, Error, Identity, NewIdentity, NewPassword, Username};

/// Fail with `duplicate` when the username or email is already taken.
pub(crate) async fn ensure_identity_available<I>(
    identities: &I,
    username: &Username,
    email: &EmailAddress,
) -> Result<(), Error>
where
    I: IdentityRepository + ?Sized,
{
    if identities.find_by_username(username.as_str()).await?.is_some() {
        return Err(Error::duplicate("username"));
    }
    ensure_email_available(identities, email, None).await
}

/// Fail with `duplicate` when `email` belongs to an identity other than
/// `owner`.
pub(crate) async fn ensure_email_available<I>(
    identities: &I,
    email: &EmailAddress,
    owner: Option<crate::domain::IdentityId>,
) -> Result<(), Error>
where
    I: IdentityRepository + ?Sized,
{
    match identities.find_by_email(email.as_str()).await? {
        Some(existing) if Some(existing.id) != owner => Err(Error::duplicate("email")),
        _ => Ok(()),
    }
}

/// Hash `password` and assemble a fresh identity.
pub(crate) fn build_identity(
    hasher: &dyn PasswordHasher,
    fields: NewIdentity,
    password: &NewPassword,
    now: DateTime<Utc>,
) -> Result<Identity, Error> {
    let hash = hasher.hash(password.expose())?;
    Identity::new(fields, hash, now)
}

/// Delete an identity created for a profile whose write then failed.
pub(crate) async fn roll_back_identity<I>(identities: &I, identity: &Identity)
where
    I: IdentityRepository + ?Sized,
{
    if let Err(error) = identities.delete(&identity.id).await {
        tracing::error!(
            identity_id = %identity.id,
            %error,
            "failed to roll back identity after profile write failed"
        );
    }
}
