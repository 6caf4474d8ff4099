//! Internal Diesel row structs for database operations.
//!
//! These types are implementation details of the persistence layer and must
//! never be exposed to the domain. Each aggregate has a read row and a write
//! record; write records borrow from the domain value being stored.

use chrono::{DateTime, NaiveDate, Utc};
use diesel::prelude::*;
use uuid::Uuid;

use super::schema::{course_enrollments, course_faculty, courses, faculty, identities, students};

// ---------------------------------------------------------------------------
// Identities
// ---------------------------------------------------------------------------

/// Row struct for reading from the identities table.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = identities)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct IdentityRow {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub role: String,
    pub student_id: Option<Uuid>,
    pub faculty_id: Option<Uuid>,
    pub active: bool,
    pub verified: bool,
    pub failed_login_attempts: i32,
    pub lock_until: Option<DateTime<Utc>>,
    pub reset_token_hash: Option<String>,
    pub reset_expires_at: Option<DateTime<Utc>>,
    pub last_login_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Full identity record used for inserts and updates.
///
/// `None` clears the column on update so lock and reset state can be reset.
#[derive(Debug, Clone, Insertable, AsChangeset)]
#[diesel(table_name = identities)]
#[diesel(treat_none_as_null = true)]
pub(crate) struct IdentityRecord<'a> {
    pub id: Uuid,
    pub username: &'a str,
    pub email: &'a str,
    pub password_hash: &'a str,
    pub role: &'a str,
    pub student_id: Option<Uuid>,
    pub faculty_id: Option<Uuid>,
    pub active: bool,
    pub verified: bool,
    pub failed_login_attempts: i32,
    pub lock_until: Option<DateTime<Utc>>,
    pub reset_token_hash: Option<&'a str>,
    pub reset_expires_at: Option<DateTime<Utc>>,
    pub last_login_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// Students
// ---------------------------------------------------------------------------

/// Row struct for reading a stored student profile.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = students)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct StudentRow {
    pub id: Uuid,
    pub document: serde_json::Value,
}

/// Student record with projected filter columns.
#[derive(Debug, Clone, Insertable, AsChangeset)]
#[diesel(table_name = students)]
#[diesel(treat_none_as_null = true)]
pub(crate) struct StudentRecord<'a> {
    pub id: Uuid,
    pub identity_id: Uuid,
    pub roll_number: &'a str,
    pub email: &'a str,
    pub full_name: String,
    pub last_name: &'a str,
    pub branch: &'a str,
    pub semester: i16,
    pub batch: &'a str,
    pub section: Option<&'a str>,
    pub cgpa: f64,
    pub active: bool,
    pub document: serde_json::Value,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// Faculty
// ---------------------------------------------------------------------------

/// Row struct for reading a stored faculty profile.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = faculty)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct FacultyRow {
    pub id: Uuid,
    pub course_ids: Vec<Uuid>,
    pub document: serde_json::Value,
}

/// Faculty record with projected filter columns.
#[derive(Debug, Clone, Insertable, AsChangeset)]
#[diesel(table_name = faculty)]
pub(crate) struct FacultyRecord<'a> {
    pub id: Uuid,
    pub identity_id: Uuid,
    pub employee_id: &'a str,
    pub email: &'a str,
    pub full_name: String,
    pub last_name: &'a str,
    pub department: &'a str,
    pub position: &'a str,
    pub join_date: NaiveDate,
    pub specializations: &'a [String],
    pub course_ids: Vec<Uuid>,
    pub active: bool,
    pub document: serde_json::Value,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// Courses
// ---------------------------------------------------------------------------

/// Row struct for reading course catalogue data.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = courses)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct CourseRow {
    pub id: Uuid,
    pub revision: i32,
    pub document: serde_json::Value,
    /// Moves on roster and staffing writes, which leave the document alone.
    pub updated_at: DateTime<Utc>,
}

/// Course record; roster and staffing are written to their own tables.
#[derive(Debug, Clone, Insertable, AsChangeset)]
#[diesel(table_name = courses)]
pub(crate) struct CourseRecord<'a> {
    pub id: Uuid,
    pub code: &'a str,
    pub name: &'a str,
    pub department: &'a str,
    pub description: &'a str,
    pub credits: i16,
    pub semester: i16,
    pub capacity: i32,
    pub status: &'a str,
    pub revision: i32,
    pub document: serde_json::Value,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// One teaching assignment.
#[derive(Debug, Clone, Queryable, Selectable, Insertable)]
#[diesel(table_name = course_faculty)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct CourseFacultyRow {
    pub course_id: Uuid,
    pub faculty_id: Uuid,
    pub position: i32,
}

/// One roster entry.
#[derive(Debug, Clone, Queryable, Selectable, Insertable)]
#[diesel(table_name = course_enrollments)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct EnrollmentRow {
    pub course_id: Uuid,
    pub student_id: Uuid,
    pub position: i32,
    pub enrolled_at: DateTime<Utc>,
    pub grade: String,
    pub attendance_present: i32,
    pub attendance_total: i32,
}
