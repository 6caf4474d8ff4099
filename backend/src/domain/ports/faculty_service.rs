//! Driving port for faculty profiles.

use async_trait::async_trait;
use pagination::Page;

use crate::domain::{
    Error, Faculty, FacultyDraft, FacultyId, FacultyUpdate, NewPassword, Principal, Username,
};

use super::FacultyQuery;

/// A faculty profile together with the login it is provisioned with.
///
/// The identity email is taken from the profile email.
#[derive(Debug, Clone)]
pub struct FacultyRegistration {
    pub username: Username,
    pub password: NewPassword,
    pub profile: FacultyDraft,
}

/// Domain use-case port for faculty.
#[async_trait]
pub trait FacultyService: Send + Sync {
    /// Create the profile and its faculty identity together. Admin only.
    async fn create(
        &self,
        principal: &Principal,
        registration: FacultyRegistration,
    ) -> Result<Faculty, Error>;

    async fn get(&self, principal: &Principal, id: FacultyId) -> Result<Faculty, Error>;

    async fn list(&self, principal: &Principal, query: &FacultyQuery)
    -> Result<Page<Faculty>, Error>;

    async fn update(
        &self,
        principal: &Principal,
        id: FacultyId,
        update: FacultyUpdate,
    ) -> Result<Faculty, Error>;

    /// Remove the member from every course, then delete the profile and its
    /// identity.
    async fn delete(&self, principal: &Principal, id: FacultyId) -> Result<(), Error>;
}
