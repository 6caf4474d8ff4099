//! Faculty profile service.

use std::sync::Arc;

use async_trait::async_trait;
use mockable::Clock;
use pagination::Page;

use crate::domain::ports::{
    CourseRepository, FacultyQuery, FacultyRegistration, FacultyRepository, FacultyService,
    IdentityRepository, PasswordHasher,
};
use crate::domain::provisioning::{
    build_identity, ensure_email_available, ensure_identity_available, roll_back_identity,
};
use crate::domain::{
    Action, Error, Faculty, FacultyId, FacultyUpdate, NewIdentity, Principal, ProfileRef, Role,
    require,
};

/// Faculty profile service implementing [`FacultyService`].
#[derive(Clone)]
pub struct FacultyDirectory<I, F, C> {
    identities: Arc<I>,
    faculty: Arc<F>,
    courses: Arc<C>,
    hasher: Arc<dyn PasswordHasher>,
    clock: Arc<dyn Clock>,
}

impl<I, F, C> FacultyDirectory<I, F, C> {
    /// Create the service.
    pub fn new(
        identities: Arc<I>,
        faculty: Arc<F>,
        courses: Arc<C>,
        hasher: Arc<dyn PasswordHasher>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            identities,
            faculty,
            courses,
            hasher,
            clock,
        }
    }
}

impl<I, F, C> FacultyDirectory<I, F, C>
where
    I: IdentityRepository,
    F: FacultyRepository,
    C: CourseRepository,
{
    async fn load(&self, id: &FacultyId) -> Result<Faculty, Error> {
        self.faculty
            .find_by_id(id)
            .await?
            .ok_or_else(|| Error::not_found("faculty member not found"))
    }

    fn check_restricted_fields(principal: &Principal, update: &FacultyUpdate) -> Result<(), Error> {
        if principal.is_admin() {
            return Ok(());
        }
        if update.employee_id.is_some()
            || update.department.is_some()
            || update.position.is_some()
            || update.join_date.is_some()
            || update.active.is_some()
        {
            return Err(Error::forbidden(
                "employment details and status are managed by administrators",
            ));
        }
        Ok(())
    }

    async fn sync_identity_email(&self, member: &Faculty) -> Result<(), Error> {
        let Some(mut identity) = self.identities.find_by_id(&member.identity_id).await? else {
            tracing::warn!(faculty_id = %member.id, "faculty profile has no identity");
            return Ok(());
        };
        if identity.email == member.email {
            return Ok(());
        }
        identity.email = member.email.clone();
        identity.updated_at = member.updated_at;
        self.identities.update(&identity).await?;
        Ok(())
    }
}

#[async_trait]
impl<I, F, C> FacultyService for FacultyDirectory<I, F, C>
where
    I: IdentityRepository,
    F: FacultyRepository,
    C: CourseRepository,
{
    async fn create(
        &self,
        principal: &Principal,
        registration: FacultyRegistration,
    ) -> Result<Faculty, Error> {
        require(Some(principal), Action::CreateFaculty)?;
        let FacultyRegistration {
            username,
            password,
            profile,
        } = registration;
        profile.validate().into_result()?;
        let email = profile.email.clone();
        ensure_identity_available(self.identities.as_ref(), &username, &email).await?;

        let now = self.clock.utc();
        let faculty_id = FacultyId::generate();
        let identity = build_identity(
            self.hasher.as_ref(),
            NewIdentity {
                username,
                email,
                role: Role::Faculty,
                profile: Some(ProfileRef::Faculty(faculty_id)),
            },
            &password,
            now,
        )?;
        self.identities.insert(&identity).await?;

        let member = Faculty::from_draft(faculty_id, identity.id, profile, now);
        if let Err(error) = self.faculty.insert(&member).await {
            roll_back_identity(self.identities.as_ref(), &identity).await;
            return Err(error.into());
        }
        tracing::info!(faculty_id = %member.id, identity_id = %identity.id, "faculty created");
        Ok(member)
    }

    async fn get(&self, principal: &Principal, id: FacultyId) -> Result<Faculty, Error> {
        require(Some(principal), Action::ReadFaculty)?;
        self.load(&id).await
    }

    async fn list(
        &self,
        principal: &Principal,
        query: &FacultyQuery,
    ) -> Result<Page<Faculty>, Error> {
        require(Some(principal), Action::ReadFaculty)?;
        Ok(self.faculty.list(query).await?)
    }

    async fn update(
        &self,
        principal: &Principal,
        id: FacultyId,
        update: FacultyUpdate,
    ) -> Result<Faculty, Error> {
        require(Some(principal), Action::UpdateFaculty(id))?;
        Self::check_restricted_fields(principal, &update)?;
        let mut member = self.load(&id).await?;
        if let Some(email) = &update.email {
            ensure_email_available(self.identities.as_ref(), email, Some(member.identity_id))
                .await?;
        }
        member.apply(update, self.clock.utc())?;
        self.faculty.update(&member).await?;
        self.sync_identity_email(&member).await?;
        Ok(member)
    }

    async fn delete(&self, principal: &Principal, id: FacultyId) -> Result<(), Error> {
        require(Some(principal), Action::DeleteFaculty)?;
        let member = self.load(&id).await?;
        let courses = self.courses.remove_faculty_everywhere(&id).await?;
        if !self.faculty.delete(&id).await? {
            return Err(Error::not_found("faculty member not found"));
        }
        self.identities.delete(&member.identity_id).await?;
        tracing::info!(
            faculty_id = %id,
            identity_id = %member.identity_id,
            courses,
            "faculty deleted"
        );
        Ok(())
    }
}

#[cfg(test)]
#[path = "faculty_service_tests.rs"]
mod tests;
