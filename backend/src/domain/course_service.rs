//! Course catalogue service.
//!
//! Reads are open to anonymous callers. Roster details are only expanded for
//! staff.

use std::sync::Arc;

use async_trait::async_trait;
use mockable::Clock;
use pagination::Page;

use crate::domain::ports::{
    CourseDetails, CourseQuery, CourseRepository, CourseService, FacultyRepository,
    FacultySummary, StudentRepository, StudentSummary,
};
use crate::domain::{
    Action, CapacityMode, Course, CourseDraft, CourseId, CourseUpdate, Error, Principal, Role,
    require,
};

/// Course catalogue service implementing [`CourseService`].
#[derive(Clone)]
pub struct CourseCatalogue<C, F, S> {
    courses: Arc<C>,
    faculty: Arc<F>,
    students: Arc<S>,
    clock: Arc<dyn Clock>,
    capacity_mode: CapacityMode,
}

impl<C, F, S> CourseCatalogue<C, F, S> {
    /// Create the service.
    pub fn new(
        courses: Arc<C>,
        faculty: Arc<F>,
        students: Arc<S>,
        clock: Arc<dyn Clock>,
        capacity_mode: CapacityMode,
    ) -> Self {
        Self {
            courses,
            faculty,
            students,
            clock,
            capacity_mode,
        }
    }
}

impl<C, F, S> CourseCatalogue<C, F, S>
where
    C: CourseRepository,
    F: FacultyRepository,
    S: StudentRepository,
{
    async fn load(&self, id: &CourseId) -> Result<Course, Error> {
        self.courses
            .find_by_id(id)
            .await?
            .ok_or_else(|| Error::not_found("course not found"))
    }

    async fn ensure_prerequisites_exist(
        &self,
        course: Option<CourseId>,
        prerequisites: &[CourseId],
    ) -> Result<(), Error> {
        if prerequisites.is_empty() {
            return Ok(());
        }
        if course.is_some_and(|id| prerequisites.contains(&id)) {
            return Err(Error::invalid_request("a course cannot be its own prerequisite"));
        }
        let found = self.courses.find_many(prerequisites).await?;
        if let Some(missing) = prerequisites
            .iter()
            .find(|id| !found.iter().any(|course| course.id == **id))
        {
            return Err(Error::invalid_request(format!(
                "prerequisite course {missing} does not exist"
            )));
        }
        Ok(())
    }

    async fn faculty_summaries(&self, course: &Course) -> Result<Vec<FacultySummary>, Error> {
        let members = self.faculty.find_many(&course.faculty).await?;
        Ok(course
            .faculty
            .iter()
            .filter_map(|id| members.iter().find(|member| member.id == *id))
            .map(|member| FacultySummary {
                id: member.id,
                employee_id: member.employee_id.clone(),
                name: member.full_name(),
                email: member.email.clone(),
                department: member.department.clone(),
            })
            .collect())
    }

    async fn student_summaries(&self, course: &Course) -> Result<Vec<StudentSummary>, Error> {
        let ids: Vec<_> = course.roster.iter().map(|entry| entry.student_id).collect();
        let students = self.students.find_many(&ids).await?;
        Ok(course
            .roster
            .iter()
            .filter_map(|entry| {
                let student = students.iter().find(|s| s.id == entry.student_id)?;
                Some(StudentSummary {
                    id: student.id,
                    roll_number: student.roll_number.clone(),
                    name: student.full_name(),
                    email: student.contact.email.clone(),
                    grade: entry.grade,
                    attendance: entry.attendance,
                    enrolled_at: entry.enrolled_at,
                })
            })
            .collect())
    }
}

#[async_trait]
impl<C, F, S> CourseService for CourseCatalogue<C, F, S>
where
    C: CourseRepository,
    F: FacultyRepository,
    S: StudentRepository,
{
    async fn create(&self, principal: &Principal, draft: CourseDraft) -> Result<Course, Error> {
        require(Some(principal), Action::CreateCourse)?;
        draft.validate().into_result()?;
        self.ensure_prerequisites_exist(None, &draft.prerequisites)
            .await?;
        let course = Course::from_draft(CourseId::generate(), draft, self.clock.utc());
        self.courses.insert(&course).await?;
        tracing::info!(course_id = %course.id, code = %course.code.as_str(), "course created");
        Ok(course)
    }

    async fn get(
        &self,
        principal: Option<&Principal>,
        id: CourseId,
    ) -> Result<CourseDetails, Error> {
        require(principal, Action::ReadCourse)?;
        let course = self.load(&id).await?;
        let faculty = self.faculty_summaries(&course).await?;
        let staff = principal.is_some_and(|p| matches!(p.role, Role::Admin | Role::Faculty));
        let students = if staff {
            Some(self.student_summaries(&course).await?)
        } else {
            None
        };
        Ok(CourseDetails {
            course,
            faculty,
            students,
        })
    }

    async fn list(
        &self,
        principal: Option<&Principal>,
        query: &CourseQuery,
    ) -> Result<Page<Course>, Error> {
        require(principal, Action::ReadCourse)?;
        Ok(self.courses.list(query).await?)
    }

    async fn update(
        &self,
        principal: &Principal,
        id: CourseId,
        update: CourseUpdate,
    ) -> Result<Course, Error> {
        let mut course = self.load(&id).await?;
        require(
            Some(principal),
            Action::UpdateCourse {
                faculty: &course.faculty,
            },
        )?;
        if let Some(prerequisites) = &update.prerequisites {
            self.ensure_prerequisites_exist(Some(id), prerequisites)
                .await?;
        }
        let revision = course.revision;
        course.apply(update, self.clock.utc())?;
        let saved = self
            .courses
            .save(&course, self.capacity_mode.expected_revision(revision))
            .await?;
        Ok(saved)
    }

    async fn delete(&self, principal: &Principal, id: CourseId) -> Result<(), Error> {
        require(Some(principal), Action::DeleteCourse)?;
        let course = self.load(&id).await?;
        course.ensure_deletable()?;
        // An enrollment landing after the check bumps the revision.
        if !self.courses.delete(&id, Some(course.revision)).await? {
            return Err(Error::not_found("course not found"));
        }
        let detached = self.faculty.remove_course_everywhere(&id).await?;
        tracing::info!(course_id = %id, detached, "course deleted");
        Ok(())
    }
}

#[cfg(test)]
#[path = "course_service_tests.rs"]
mod tests;
