//! Student profile service.
//!
//! A student profile and its login are created together and deleted
//! together. Enrollment lives on course rosters, so the course list returned
//! here is always derived from them.

use std::sync::Arc;

use async_trait::async_trait;
use mockable::Clock;
use pagination::Page;

use crate::domain::ports::{
    CourseRepository, IdentityRepository, PasswordHasher, StudentCourse, StudentQuery,
    StudentRegistration, StudentRepository, StudentService,
};
use crate::domain::provisioning::{
    build_identity, ensure_email_available, ensure_identity_available, roll_back_identity,
};
use crate::domain::{
    Action, Error, NewIdentity, Principal, ProfileRef, Role, Student, StudentId, StudentUpdate,
    require,
};

/// Student profile service implementing [`StudentService`].
#[derive(Clone)]
pub struct StudentDirectory<I, S, C> {
    identities: Arc<I>,
    students: Arc<S>,
    courses: Arc<C>,
    hasher: Arc<dyn PasswordHasher>,
    clock: Arc<dyn Clock>,
}

impl<I, S, C> StudentDirectory<I, S, C> {
    /// Create the service.
    pub fn new(
        identities: Arc<I>,
        students: Arc<S>,
        courses: Arc<C>,
        hasher: Arc<dyn PasswordHasher>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            identities,
            students,
            courses,
            hasher,
            clock,
        }
    }
}

impl<I, S, C> StudentDirectory<I, S, C>
where
    I: IdentityRepository,
    S: StudentRepository,
    C: CourseRepository,
{
    async fn load(&self, id: &StudentId) -> Result<Student, Error> {
        self.students
            .find_by_id(id)
            .await?
            .ok_or_else(|| Error::not_found("student not found"))
    }

    /// Only admins may change the fields that identify a student or decide
    /// their standing.
    fn check_restricted_fields(principal: &Principal, update: &StudentUpdate) -> Result<(), Error> {
        if principal.is_admin() {
            return Ok(());
        }
        if update.roll_number.is_some() || update.academic.is_some() || update.active.is_some() {
            return Err(Error::forbidden(
                "roll number, academic record, and status are managed by administrators",
            ));
        }
        Ok(())
    }

    /// Keep the login email in step with the profile contact email.
    async fn sync_identity_email(&self, student: &Student) -> Result<(), Error> {
        let Some(mut identity) = self.identities.find_by_id(&student.identity_id).await? else {
            tracing::warn!(student_id = %student.id, "student profile has no identity");
            return Ok(());
        };
        if identity.email == student.contact.email {
            return Ok(());
        }
        identity.email = student.contact.email.clone();
        identity.updated_at = student.updated_at;
        self.identities.update(&identity).await?;
        Ok(())
    }
}

#[async_trait]
impl<I, S, C> StudentService for StudentDirectory<I, S, C>
where
    I: IdentityRepository,
    S: StudentRepository,
    C: CourseRepository,
{
    async fn create(
        &self,
        principal: &Principal,
        registration: StudentRegistration,
    ) -> Result<Student, Error> {
        require(Some(principal), Action::CreateStudent)?;
        let StudentRegistration {
            username,
            password,
            profile,
        } = registration;
        profile.validate().into_result()?;
        let email = profile.contact.email.clone();
        ensure_identity_available(self.identities.as_ref(), &username, &email).await?;

        let now = self.clock.utc();
        let student_id = StudentId::generate();
        let identity = build_identity(
            self.hasher.as_ref(),
            NewIdentity {
                username,
                email,
                role: Role::Student,
                profile: Some(ProfileRef::Student(student_id)),
            },
            &password,
            now,
        )?;
        self.identities.insert(&identity).await?;

        let student = Student::from_draft(student_id, identity.id, profile, now);
        if let Err(error) = self.students.insert(&student).await {
            roll_back_identity(self.identities.as_ref(), &identity).await;
            return Err(error.into());
        }
        tracing::info!(student_id = %student.id, identity_id = %identity.id, "student created");
        Ok(student)
    }

    async fn get(&self, principal: &Principal, id: StudentId) -> Result<Student, Error> {
        require(Some(principal), Action::ReadStudent(id))?;
        self.load(&id).await
    }

    async fn list(
        &self,
        principal: &Principal,
        query: &StudentQuery,
    ) -> Result<Page<Student>, Error> {
        require(Some(principal), Action::ListStudents)?;
        Ok(self.students.list(query).await?)
    }

    async fn update(
        &self,
        principal: &Principal,
        id: StudentId,
        update: StudentUpdate,
    ) -> Result<Student, Error> {
        require(Some(principal), Action::UpdateStudent(id))?;
        Self::check_restricted_fields(principal, &update)?;
        let mut student = self.load(&id).await?;
        if let Some(contact) = &update.contact {
            ensure_email_available(
                self.identities.as_ref(),
                &contact.email,
                Some(student.identity_id),
            )
            .await?;
        }
        student.apply(update, self.clock.utc())?;
        self.students.update(&student).await?;
        self.sync_identity_email(&student).await?;
        Ok(student)
    }

    async fn delete(&self, principal: &Principal, id: StudentId) -> Result<(), Error> {
        require(Some(principal), Action::DeleteStudent)?;
        let student = self.load(&id).await?;
        let rosters = self.courses.remove_student_everywhere(&id).await?;
        if !self.students.delete(&id).await? {
            return Err(Error::not_found("student not found"));
        }
        self.identities.delete(&student.identity_id).await?;
        tracing::info!(
            student_id = %id,
            identity_id = %student.identity_id,
            rosters,
            "student deleted"
        );
        Ok(())
    }

    async fn courses(
        &self,
        principal: &Principal,
        id: StudentId,
    ) -> Result<Vec<StudentCourse>, Error> {
        require(Some(principal), Action::ReadStudent(id))?;
        self.load(&id).await?;
        let courses = self.courses.list_by_student(&id).await?;
        Ok(courses
            .into_iter()
            .filter_map(|course| {
                let entry = course.entry(id)?.clone();
                Some(StudentCourse {
                    course_id: course.id,
                    code: course.code,
                    name: course.name,
                    credits: course.credits,
                    semester: course.semester,
                    grade: entry.grade,
                    attendance: entry.attendance,
                    attendance_percentage: entry.attendance.percentage(),
                    enrolled_at: entry.enrolled_at,
                })
            })
            .collect())
    }
}

#[cfg(test)]
#[path = "student_service_tests.rs"]
mod tests;
