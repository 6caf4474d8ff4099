//! Port abstraction for password hashing.
//!
//! Hashing is CPU bound and synchronous; adapters are expected to be cheap
//! to share behind an `Arc`.

use crate::domain::PasswordHash;

use super::define_port_error;

define_port_error! {
    /// Errors raised by password hashing adapters.
    pub enum PasswordHashError {
        /// Hashing a plaintext password failed.
        Hash { message: String } => "password hashing failed: {message}",
        /// The stored hash could not be parsed.
        MalformedHash { message: String } => "stored password hash is malformed: {message}",
    }
}

/// Salted one-way password hashing.
#[cfg_attr(test, mockall::automock)]
pub trait PasswordHasher: Send + Sync {
    /// Produce a salted hash of `password`.
    fn hash(&self, password: &str) -> Result<PasswordHash, PasswordHashError>;

    /// Check `password` against `hash`. A mismatch is `Ok(false)`.
    fn verify(&self, password: &str, hash: &PasswordHash) -> Result<bool, PasswordHashError>;
}

impl From<PasswordHashError> for crate::domain::Error {
    fn from(value: PasswordHashError) -> Self {
        tracing::error!(error = %value, "password hasher failed");
        Self::internal("credential processing failed")
    }
}
