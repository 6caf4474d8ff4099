//! Port abstraction for identity persistence.

use async_trait::async_trait;
use pagination::{Page, PageRequest, Sort};

use crate::domain::{Identity, IdentityId, Role};

use super::RepositoryError;

/// Sortable identity columns.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum IdentitySortField {
    #[default]
    Username,
    Email,
    CreatedAt,
}

/// Filter, search, sort, and window for identity listings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdentityQuery {
    /// Restrict to one role.
    pub role: Option<Role>,
    /// Restrict by active flag.
    pub active: Option<bool>,
    /// Case-insensitive substring over username and email.
    pub search: Option<String>,
    pub sort: Sort<IdentitySortField>,
    pub page: PageRequest,
}

impl Default for IdentityQuery {
    fn default() -> Self {
        Self {
            role: None,
            active: None,
            search: None,
            sort: Sort::asc(IdentitySortField::default()),
            page: PageRequest::default(),
        }
    }
}

/// Identity store. Username and email are unique; violations surface as
/// [`RepositoryError::Duplicate`] naming the field.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait IdentityRepository: Send + Sync {
    /// Insert a new identity.
    async fn insert(&self, identity: &Identity) -> Result<(), RepositoryError>;

    /// Overwrite an existing identity.
    async fn update(&self, identity: &Identity) -> Result<(), RepositoryError>;

    async fn find_by_id(&self, id: &IdentityId) -> Result<Option<Identity>, RepositoryError>;

    /// Lookup by normalised username.
    async fn find_by_username(&self, username: &str)
    -> Result<Option<Identity>, RepositoryError>;

    /// Lookup by normalised email.
    async fn find_by_email(&self, email: &str) -> Result<Option<Identity>, RepositoryError>;

    /// Lookup by the digest of an outstanding reset token.
    async fn find_by_reset_token_hash(
        &self,
        token_hash: &str,
    ) -> Result<Option<Identity>, RepositoryError>;

    async fn list(&self, query: &IdentityQuery) -> Result<Page<Identity>, RepositoryError>;

    /// Delete an identity; returns whether a row was removed.
    async fn delete(&self, id: &IdentityId) -> Result<bool, RepositoryError>;
}
