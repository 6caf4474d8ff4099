//! Port abstraction for faculty profile persistence.

use async_trait::async_trait;
use pagination::{Page, PageRequest, Sort};

use crate::domain::{CourseId, Faculty, FacultyId, IdentityId, Position};

use super::RepositoryError;

/// Sortable faculty columns.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum FacultySortField {
    #[default]
    EmployeeId,
    LastName,
    Department,
    JoinDate,
}

/// Filter, search, sort, and window for faculty listings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FacultyQuery {
    pub department: Option<String>,
    pub position: Option<Position>,
    pub active: Option<bool>,
    /// Case-insensitive substring over employee id, name, email, and
    /// specializations.
    pub search: Option<String>,
    pub sort: Sort<FacultySortField>,
    pub page: PageRequest,
}

impl Default for FacultyQuery {
    fn default() -> Self {
        Self {
            department: None,
            position: None,
            active: None,
            search: None,
            sort: Sort::asc(FacultySortField::default()),
            page: PageRequest::default(),
        }
    }
}

/// Faculty profile store. Employee id and email are unique.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait FacultyRepository: Send + Sync {
    async fn insert(&self, faculty: &Faculty) -> Result<(), RepositoryError>;

    async fn update(&self, faculty: &Faculty) -> Result<(), RepositoryError>;

    async fn find_by_id(&self, id: &FacultyId) -> Result<Option<Faculty>, RepositoryError>;

    /// Profile owned by `identity`, if any.
    async fn find_by_identity(
        &self,
        identity: &IdentityId,
    ) -> Result<Option<Faculty>, RepositoryError>;

    /// Fetch several profiles; missing ids are skipped.
    async fn find_many(&self, ids: &[FacultyId]) -> Result<Vec<Faculty>, RepositoryError>;

    async fn list(&self, query: &FacultyQuery) -> Result<Page<Faculty>, RepositoryError>;

    /// Delete a profile; returns whether a row was removed.
    async fn delete(&self, id: &FacultyId) -> Result<bool, RepositoryError>;

    /// Remove `course` from every faculty course list; returns the number
    /// of profiles changed.
    async fn remove_course_everywhere(&self, course: &CourseId) -> Result<usize, RepositoryError>;
}
