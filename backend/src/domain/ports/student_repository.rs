//! Port abstraction for student profile persistence.

use async_trait::async_trait;
use pagination::{Page, PageRequest, Sort};

use crate::domain::{IdentityId, Student, StudentId};

use super::RepositoryError;

/// Sortable student columns.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum StudentSortField {
    #[default]
    RollNumber,
    LastName,
    Semester,
    Cgpa,
    CreatedAt,
}

/// Filter, search, sort, and window for student listings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StudentQuery {
    pub branch: Option<String>,
    pub semester: Option<u8>,
    pub batch: Option<String>,
    pub section: Option<String>,
    pub active: Option<bool>,
    /// Case-insensitive substring over roll number, name, and email.
    pub search: Option<String>,
    pub sort: Sort<StudentSortField>,
    pub page: PageRequest,
}

impl Default for StudentQuery {
    fn default() -> Self {
        Self {
            branch: None,
            semester: None,
            batch: None,
            section: None,
            active: None,
            search: None,
            sort: Sort::asc(StudentSortField::default()),
            page: PageRequest::default(),
        }
    }
}

/// Student profile store. Roll number and contact email are unique.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait StudentRepository: Send + Sync {
    async fn insert(&self, student: &Student) -> Result<(), RepositoryError>;

    async fn update(&self, student: &Student) -> Result<(), RepositoryError>;

    async fn find_by_id(&self, id: &StudentId) -> Result<Option<Student>, RepositoryError>;

    /// Profile owned by `identity`, if any.
    async fn find_by_identity(
        &self,
        identity: &IdentityId,
    ) -> Result<Option<Student>, RepositoryError>;

    /// Fetch several profiles; missing ids are skipped.
    async fn find_many(&self, ids: &[StudentId]) -> Result<Vec<Student>, RepositoryError>;

    async fn list(&self, query: &StudentQuery) -> Result<Page<Student>, RepositoryError>;

    /// Delete a profile; returns whether a row was removed.
    async fn delete(&self, id: &StudentId) -> Result<bool, RepositoryError>;
}
