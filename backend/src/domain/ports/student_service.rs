//! Driving port for student profiles.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use pagination::Page;
use serde::Serialize;
use utoipa::ToSchema;

use crate::domain::{
    Attendance, CourseCode, CourseId, Error, Grade, NewPassword, Principal, Student,
    StudentDraft, StudentId, StudentUpdate, Username,
};

use super::StudentQuery;

/// A student profile together with the login it is provisioned with.
///
/// The identity email is taken from the profile contact email.
#[derive(Debug, Clone)]
pub struct StudentRegistration {
    pub username: Username,
    pub password: NewPassword,
    pub profile: StudentDraft,
}

/// One row of a student's course list, derived from course rosters.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct StudentCourse {
    #[schema(value_type = String, format = Uuid)]
    pub course_id: CourseId,
    #[schema(value_type = String)]
    pub code: CourseCode,
    pub name: String,
    pub credits: u8,
    pub semester: u8,
    pub grade: Grade,
    pub attendance: Attendance,
    /// Present sessions as a percentage of recorded sessions.
    pub attendance_percentage: f64,
    pub enrolled_at: DateTime<Utc>,
}

/// Domain use-case port for students.
#[async_trait]
pub trait StudentService: Send + Sync {
    /// Create the profile and its student identity together. Admin only.
    async fn create(
        &self,
        principal: &Principal,
        registration: StudentRegistration,
    ) -> Result<Student, Error>;

    async fn get(&self, principal: &Principal, id: StudentId) -> Result<Student, Error>;

    async fn list(&self, principal: &Principal, query: &StudentQuery)
    -> Result<Page<Student>, Error>;

    async fn update(
        &self,
        principal: &Principal,
        id: StudentId,
        update: StudentUpdate,
    ) -> Result<Student, Error>;

    /// Remove the student from every roster, then delete the profile and
    /// its identity.
    async fn delete(&self, principal: &Principal, id: StudentId) -> Result<(), Error>;

    /// Courses the student is enrolled in, ordered by course code.
    async fn courses(
        &self,
        principal: &Principal,
        id: StudentId,
    ) -> Result<Vec<StudentCourse>, Error>;
}
