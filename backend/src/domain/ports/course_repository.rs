//! Port abstraction for course persistence, including the roster.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use pagination::{Page, PageRequest, Sort};

use crate::domain::{Course, CourseId, CourseStatus, FacultyId, Grade, RosterEntry, StudentId};

use super::RepositoryError;

/// Sortable course columns.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum CourseSortField {
    #[default]
    Code,
    Name,
    Semester,
    Credits,
}

/// Filter, search, sort, and window for course listings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CourseQuery {
    pub department: Option<String>,
    pub semester: Option<u8>,
    pub status: Option<CourseStatus>,
    /// Restrict to courses taught by this faculty member.
    pub faculty: Option<FacultyId>,
    /// Case-insensitive substring over code, name, and description.
    pub search: Option<String>,
    pub sort: Sort<CourseSortField>,
    pub page: PageRequest,
}

impl Default for CourseQuery {
    fn default() -> Self {
        Self {
            department: None,
            semester: None,
            status: None,
            faculty: None,
            search: None,
            sort: Sort::asc(CourseSortField::default()),
            page: PageRequest::default(),
        }
    }
}

/// Target of a single roster or faculty-list write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CourseWrite {
    pub course: CourseId,
    /// Apply only while the stored revision still equals this value.
    pub expected_revision: Option<u32>,
    /// Stamped as the course's `updated_at` when the write changes something.
    pub at: DateTime<Utc>,
}

/// Course store. Course code is unique.
///
/// Every successful write bumps the stored revision by one. Roster and
/// faculty-list writes touch a single entry, so concurrent writers on
/// different entries never overwrite each other. They fail with
/// [`RepositoryError::Missing`] when the course is gone and with
/// [`RepositoryError::RevisionMismatch`] when a guard is set and stale.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CourseRepository: Send + Sync {
    /// Insert a new course.
    async fn insert(&self, course: &Course) -> Result<(), RepositoryError>;

    /// Overwrite the catalogue fields of an existing course. The stored
    /// roster and faculty list are kept as they are.
    ///
    /// With `expected_revision` set, the write only succeeds if the stored
    /// revision still equals it; otherwise
    /// [`RepositoryError::RevisionMismatch`] is returned and nothing changes.
    /// Returns the course as stored, carrying its new revision.
    async fn save(
        &self,
        course: &Course,
        expected_revision: Option<u32>,
    ) -> Result<Course, RepositoryError>;

    async fn find_by_id(&self, id: &CourseId) -> Result<Option<Course>, RepositoryError>;

    /// Fetch several courses; missing ids are skipped.
    async fn find_many(&self, ids: &[CourseId]) -> Result<Vec<Course>, RepositoryError>;

    async fn list(&self, query: &CourseQuery) -> Result<Page<Course>, RepositoryError>;

    /// Courses whose roster contains `student`, ordered by code.
    async fn list_by_student(&self, student: &StudentId) -> Result<Vec<Course>, RepositoryError>;

    /// Append a roster entry; `false` when the student is already enrolled.
    async fn add_roster_entry(
        &self,
        write: CourseWrite,
        entry: &RosterEntry,
    ) -> Result<bool, RepositoryError>;

    /// Remove a roster entry; `false` when the student was not enrolled.
    async fn remove_roster_entry(
        &self,
        write: CourseWrite,
        student: StudentId,
    ) -> Result<bool, RepositoryError>;

    /// Overwrite one grade; `None` when the student is not on the roster.
    async fn set_grade(
        &self,
        write: CourseWrite,
        student: StudentId,
        grade: Grade,
    ) -> Result<Option<RosterEntry>, RepositoryError>;

    /// Count one session for one student; `None` when not on the roster.
    async fn record_attendance(
        &self,
        write: CourseWrite,
        student: StudentId,
        present: bool,
    ) -> Result<Option<RosterEntry>, RepositoryError>;

    /// Append a teaching assignment; `false` when already assigned.
    async fn add_faculty(
        &self,
        write: CourseWrite,
        faculty: FacultyId,
    ) -> Result<bool, RepositoryError>;

    /// Remove a teaching assignment; `false` when it was not assigned.
    async fn remove_faculty(
        &self,
        write: CourseWrite,
        faculty: FacultyId,
    ) -> Result<bool, RepositoryError>;

    /// Delete a course; returns whether a row was removed.
    ///
    /// With `expected_revision` set, a course written since it was read is
    /// kept and [`RepositoryError::RevisionMismatch`] is returned.
    async fn delete(
        &self,
        id: &CourseId,
        expected_revision: Option<u32>,
    ) -> Result<bool, RepositoryError>;

    /// Drop `student` from every roster; returns the number of courses changed.
    async fn remove_student_everywhere(
        &self,
        student: &StudentId,
    ) -> Result<usize, RepositoryError>;

    /// Drop `faculty` from every teaching list; returns the number of
    /// courses changed.
    async fn remove_faculty_everywhere(
        &self,
        faculty: &FacultyId,
    ) -> Result<usize, RepositoryError>;
}
