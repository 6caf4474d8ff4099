//! Enrollment, grading, and staffing workflow.
//!
//! Per (student, course) the lifecycle is unenrolled, enrolled, graded, and
//! back to unenrolled; re-enrolling starts again at grade `I`. Each operation
//! re-reads the course, checks the rules against that snapshot, then writes
//! only the roster or faculty entry it changes. Under
//! [`CapacityMode::BestEffort`] two enrollments racing for the last seat can
//! both land. Under [`CapacityMode::Strict`] each write is conditional on the
//! revision read, so a concurrent writer surfaces as
//! `concurrent_modification` instead.

use std::sync::Arc;

use async_trait::async_trait;
use mockable::Clock;

use crate::domain::ports::{
    CourseRepository, CourseWrite, EnrollmentService, FacultyRepository, StudentRepository,
};
use crate::domain::{
    Action, CapacityMode, Course, CourseError, CourseId, Error, Faculty, FacultyId, Grade,
    Principal, RosterEntry, StudentId, require,
};

/// Enrollment workflow service implementing [`EnrollmentService`].
#[derive(Clone)]
pub struct EnrollmentCoordinator<C, S, F> {
    courses: Arc<C>,
    students: Arc<S>,
    faculty: Arc<F>,
    clock: Arc<dyn Clock>,
    capacity_mode: CapacityMode,
}

impl<C, S, F> EnrollmentCoordinator<C, S, F> {
    /// Create the service.
    pub fn new(
        courses: Arc<C>,
        students: Arc<S>,
        faculty: Arc<F>,
        clock: Arc<dyn Clock>,
        capacity_mode: CapacityMode,
    ) -> Self {
        Self {
            courses,
            students,
            faculty,
            clock,
            capacity_mode,
        }
    }

    /// Single-entry write against the snapshot `course`, guarded on its
    /// revision in strict mode.
    fn write_to(&self, course: &Course) -> CourseWrite {
        CourseWrite {
            course: course.id,
            expected_revision: self.capacity_mode.expected_revision(course.revision),
            at: self.clock.utc(),
        }
    }
}

impl<C, S, F> EnrollmentCoordinator<C, S, F>
where
    C: CourseRepository,
    S: StudentRepository,
    F: FacultyRepository,
{
    async fn load_course(&self, id: &CourseId) -> Result<Course, Error> {
        self.courses
            .find_by_id(id)
            .await?
            .ok_or_else(|| Error::not_found("course not found"))
    }

    async fn ensure_student(&self, id: &StudentId) -> Result<(), Error> {
        match self.students.find_by_id(id).await? {
            Some(_) => Ok(()),
            None => Err(Error::not_found("student not found")),
        }
    }

    async fn load_faculty(&self, id: &FacultyId) -> Result<Faculty, Error> {
        self.faculty
            .find_by_id(id)
            .await?
            .ok_or_else(|| Error::not_found("faculty member not found"))
    }

    async fn enroll_student(
        &self,
        course_id: CourseId,
        student: StudentId,
    ) -> Result<RosterEntry, Error> {
        self.ensure_student(&student).await?;
        let course = self.load_course(&course_id).await?;
        let write = self.write_to(&course);
        let entry = course.admit(student, write.at)?;
        if !self.courses.add_roster_entry(write, &entry).await? {
            return Err(CourseError::AlreadyEnrolled.into());
        }
        tracing::info!(
            course_id = %course_id,
            student_id = %student,
            enrolled = course.enrolled_count() + 1,
            capacity = course.capacity,
            "student enrolled"
        );
        Ok(entry)
    }

    /// Load the course and check the caller may record results on it.
    async fn load_for_results(
        &self,
        principal: &Principal,
        course_id: &CourseId,
    ) -> Result<Course, Error> {
        let course = self.load_course(course_id).await?;
        require(
            Some(principal),
            Action::RecordResults {
                faculty: &course.faculty,
            },
        )?;
        Ok(course)
    }
}

#[async_trait]
impl<C, S, F> EnrollmentService for EnrollmentCoordinator<C, S, F>
where
    C: CourseRepository,
    S: StudentRepository,
    F: FacultyRepository,
{
    async fn self_enroll(
        &self,
        principal: &Principal,
        course: CourseId,
    ) -> Result<RosterEntry, Error> {
        require(Some(principal), Action::SelfEnroll)?;
        let student = principal
            .profile
            .and_then(|profile| profile.student())
            .ok_or_else(|| Error::forbidden("caller has no student profile"))?;
        self.enroll_student(course, student).await
    }

    async fn enroll(
        &self,
        principal: &Principal,
        course: CourseId,
        student: StudentId,
    ) -> Result<RosterEntry, Error> {
        require(Some(principal), Action::ManageEnrollment)?;
        self.enroll_student(course, student).await
    }

    async fn unenroll(
        &self,
        principal: &Principal,
        course: CourseId,
        student: StudentId,
    ) -> Result<(), Error> {
        require(Some(principal), Action::ManageEnrollment)?;
        self.ensure_student(&student).await?;
        let loaded = self.load_course(&course).await?;
        if !self
            .courses
            .remove_roster_entry(self.write_to(&loaded), student)
            .await?
        {
            return Err(CourseError::NotEnrolled.into());
        }
        tracing::info!(course_id = %course, student_id = %student, "student unenrolled");
        Ok(())
    }

    async fn assign_grade(
        &self,
        principal: &Principal,
        course: CourseId,
        student: StudentId,
        grade: &str,
    ) -> Result<RosterEntry, Error> {
        let loaded = self.load_for_results(principal, &course).await?;
        let grade: Grade = grade.parse().map_err(CourseError::from)?;
        let entry = self
            .courses
            .set_grade(self.write_to(&loaded), student, grade)
            .await?
            .ok_or(CourseError::NotInRoster)?;
        tracing::info!(course_id = %course, student_id = %student, %grade, "grade assigned");
        Ok(entry)
    }

    async fn record_attendance(
        &self,
        principal: &Principal,
        course: CourseId,
        student: StudentId,
        present: bool,
    ) -> Result<RosterEntry, Error> {
        let loaded = self.load_for_results(principal, &course).await?;
        let entry = self
            .courses
            .record_attendance(self.write_to(&loaded), student, present)
            .await?
            .ok_or(CourseError::NotInRoster)?;
        Ok(entry)
    }

    async fn assign_faculty(
        &self,
        principal: &Principal,
        course: CourseId,
        faculty: FacultyId,
    ) -> Result<Course, Error> {
        require(Some(principal), Action::ManageCourseFaculty)?;
        let mut member = self.load_faculty(&faculty).await?;
        let loaded = self.load_course(&course).await?;
        let write = self.write_to(&loaded);
        if !self.courses.add_faculty(write, faculty).await? {
            return Err(CourseError::AlreadyAssigned.into());
        }
        if member.add_course(course) {
            member.updated_at = write.at;
            self.faculty.update(&member).await?;
        }
        tracing::info!(course_id = %course, faculty_id = %faculty, "faculty assigned");
        self.load_course(&course).await
    }

    async fn remove_faculty(
        &self,
        principal: &Principal,
        course: CourseId,
        faculty: FacultyId,
    ) -> Result<Course, Error> {
        require(Some(principal), Action::ManageCourseFaculty)?;
        let mut member = self.load_faculty(&faculty).await?;
        let loaded = self.load_course(&course).await?;
        let write = self.write_to(&loaded);
        if !self.courses.remove_faculty(write, faculty).await? {
            return Err(CourseError::NotAssigned.into());
        }
        if member.remove_course(course) {
            member.updated_at = write.at;
            self.faculty.update(&member).await?;
        }
        tracing::info!(course_id = %course, faculty_id = %faculty, "faculty removed");
        self.load_course(&course).await
    }
}

#[cfg(test)]
#[path = "enrollment_service_tests.rs"]
mod tests;
