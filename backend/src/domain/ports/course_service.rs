//! Driving port for the course catalogue.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use pagination::Page;
use serde::Serialize;
use utoipa::ToSchema;

use crate::domain::{
    Attendance, Course, CourseDraft, CourseId, CourseUpdate, EmailAddress, EmployeeId, Error,
    FacultyId, Grade, Principal, RollNumber, StudentId,
};

use super::CourseQuery;

/// Teaching staff as shown on a course page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct FacultySummary {
    #[schema(value_type = String, format = Uuid)]
    pub id: FacultyId,
    #[schema(value_type = String)]
    pub employee_id: EmployeeId,
    pub name: String,
    #[schema(value_type = String, format = Email)]
    pub email: EmailAddress,
    pub department: String,
}

/// An enrolled student as shown to staff on a course page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct StudentSummary {
    #[schema(value_type = String, format = Uuid)]
    pub id: StudentId,
    #[schema(value_type = String)]
    pub roll_number: RollNumber,
    pub name: String,
    #[schema(value_type = String, format = Email)]
    pub email: EmailAddress,
    pub grade: Grade,
    pub attendance: Attendance,
    pub enrolled_at: DateTime<Utc>,
}

/// A course with its references expanded.
#[derive(Debug, Clone, PartialEq)]
pub struct CourseDetails {
    pub course: Course,
    pub faculty: Vec<FacultySummary>,
    /// Present only for admins and faculty.
    pub students: Option<Vec<StudentSummary>>,
}

/// Domain use-case port for courses.
#[async_trait]
pub trait CourseService: Send + Sync {
    /// Create a course with an empty roster. Admin only.
    async fn create(&self, principal: &Principal, draft: CourseDraft) -> Result<Course, Error>;

    /// Read one course. Open to anonymous callers.
    async fn get(&self, principal: Option<&Principal>, id: CourseId)
    -> Result<CourseDetails, Error>;

    /// List the catalogue. Open to anonymous callers.
    async fn list(
        &self,
        principal: Option<&Principal>,
        query: &CourseQuery,
    ) -> Result<Page<Course>, Error>;

    /// Edit catalogue fields. Admin or assigned faculty.
    async fn update(
        &self,
        principal: &Principal,
        id: CourseId,
        update: CourseUpdate,
    ) -> Result<Course, Error>;

    /// Delete a course with an empty roster and detach it from faculty.
    async fn delete(&self, principal: &Principal, id: CourseId) -> Result<(), Error>;
}
