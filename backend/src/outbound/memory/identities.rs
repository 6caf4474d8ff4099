//! Identity repository over the in-memory store.

use async_trait::async_trait;
use pagination::Page;

use super::{MemoryStore, matches_search, matches_value};
use crate::domain::ports::{
    IdentityQuery, IdentityRepository, IdentitySortField, RepositoryError,
};
use crate::domain::{Identity, IdentityId};

fn check_identity_unique<'a>(
    identities: impl Iterator<Item = &'a Identity>,
    candidate: &Identity,
) -> Result<(), RepositoryError> {
    for existing in identities.filter(|existing| existing.id != candidate.id) {
        if existing.username == candidate.username {
            return Err(RepositoryError::duplicate("username"));
        }
        if existing.email == candidate.email {
            return Err(RepositoryError::duplicate("email"));
        }
    }
    Ok(())
}

#[async_trait]
impl IdentityRepository for MemoryStore {
    async fn insert(&self, identity: &Identity) -> Result<(), RepositoryError> {
        let mut state = self.lock()?;
        if state.identities.contains_key(&identity.id) {
            return Err(RepositoryError::duplicate("id"));
        }
        check_identity_unique(state.identities.values(), identity)?;
        state.identities.insert(identity.id, identity.clone());
        Ok(())
    }

    async fn update(&self, identity: &Identity) -> Result<(), RepositoryError> {
        let mut state = self.lock()?;
        if !state.identities.contains_key(&identity.id) {
            return Err(RepositoryError::query(format!(
                "identity {} does not exist",
                identity.id
            )));
        }
        check_identity_unique(state.identities.values(), identity)?;
        state.identities.insert(identity.id, identity.clone());
        Ok(())
    }

    async fn find_by_id(&self, id: &IdentityId) -> Result<Option<Identity>, RepositoryError> {
        Ok(self.lock()?.identities.get(id).cloned())
    }

    async fn find_by_username(
        &self,
        username: &str,
    ) -> Result<Option<Identity>, RepositoryError> {
        let wanted = username.trim().to_lowercase();
        Ok(self
            .lock()?
            .identities
            .values()
            .find(|identity| identity.username.as_str() == wanted)
            .cloned())
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<Identity>, RepositoryError> {
        let wanted = email.trim().to_lowercase();
        Ok(self
            .lock()?
            .identities
            .values()
            .find(|identity| identity.email.as_str() == wanted)
            .cloned())
    }

    async fn find_by_reset_token_hash(
        &self,
        token_hash: &str,
    ) -> Result<Option<Identity>, RepositoryError> {
        Ok(self
            .lock()?
            .identities
            .values()
            .find(|identity| {
                identity
                    .password_reset
                    .as_ref()
                    .is_some_and(|reset| reset.token_hash == token_hash)
            })
            .cloned())
    }

    async fn list(&self, query: &IdentityQuery) -> Result<Page<Identity>, RepositoryError> {
        let state = self.lock()?;
        let mut matches: Vec<Identity> = state
            .identities
            .values()
            .filter(|identity| {
                matches_value(query.role.as_ref(), &identity.role)
                    && matches_value(query.active.as_ref(), &identity.active)
                    && matches_search(
                        query.search.as_deref(),
                        &[identity.username.as_str(), identity.email.as_str()],
                    )
            })
            .cloned()
            .collect();
        drop(state);
        matches.sort_by(|a, b| {
            let ordering = match query.sort.field {
                IdentitySortField::Username => a.username.as_str().cmp(b.username.as_str()),
                IdentitySortField::Email => a.email.as_str().cmp(b.email.as_str()),
                IdentitySortField::CreatedAt => a.created_at.cmp(&b.created_at),
            };
            query.sort.direction.apply(ordering).then_with(|| a.id.cmp(&b.id))
        });
        Ok(Page::from_slice(&matches, query.page))
    }

    async fn delete(&self, id: &IdentityId) -> Result<bool, RepositoryError> {
        Ok(self.lock()?.identities.remove(id).is_some())
    }
}
