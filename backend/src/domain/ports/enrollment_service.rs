//! Driving port for the enrollment, grading, and staffing workflow.
//!
//! The course roster is the only enrollment ledger; every operation here
//! reads the course, mutates it through the aggregate, and saves it back.

use async_trait::async_trait;

use crate::domain::{Course, CourseId, Error, FacultyId, Principal, RosterEntry, StudentId};

/// Domain use-case port for enrollment.
#[async_trait]
pub trait EnrollmentService: Send + Sync {
    /// Enroll the calling student's own profile.
    async fn self_enroll(&self, principal: &Principal, course: CourseId)
    -> Result<RosterEntry, Error>;

    /// Enroll any student. Admin or faculty.
    async fn enroll(
        &self,
        principal: &Principal,
        course: CourseId,
        student: StudentId,
    ) -> Result<RosterEntry, Error>;

    /// Remove a student from the roster. Admin or faculty.
    async fn unenroll(
        &self,
        principal: &Principal,
        course: CourseId,
        student: StudentId,
    ) -> Result<(), Error>;

    /// Overwrite a grade given as its canonical literal.
    async fn assign_grade(
        &self,
        principal: &Principal,
        course: CourseId,
        student: StudentId,
        grade: &str,
    ) -> Result<RosterEntry, Error>;

    /// Count one session, present or absent.
    async fn record_attendance(
        &self,
        principal: &Principal,
        course: CourseId,
        student: StudentId,
        present: bool,
    ) -> Result<RosterEntry, Error>;

    /// Add teaching staff and mirror the course on the faculty profile.
    async fn assign_faculty(
        &self,
        principal: &Principal,
        course: CourseId,
        faculty: FacultyId,
    ) -> Result<Course, Error>;

    /// Remove teaching staff and mirror the change on the faculty profile.
    async fn remove_faculty(
        &self,
        principal: &Principal,
        course: CourseId,
        faculty: FacultyId,
    ) -> Result<Course, Error>;
}
