//! In-memory adapter implementing every repository port.
//!
//! Used when no database is configured and throughout the test suites. All
//! four aggregates share one mutex so multi-record checks (uniqueness,
//! reference cleanup) see a consistent snapshot. The lock is never held
//! across an `.await`.

mod courses;
mod identities;
mod profiles;

use std::cmp::Ordering;
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use crate::domain::ports::RepositoryError;
use crate::domain::{
    Course, CourseId, Faculty, FacultyId, Identity, IdentityId, Student, StudentId,
};

#[derive(Debug, Default)]
struct State {
    identities: HashMap<IdentityId, Identity>,
    students: HashMap<StudentId, Student>,
    faculty: HashMap<FacultyId, Faculty>,
    courses: HashMap<CourseId, Course>,
}

/// Process-local store for identities, profiles, and courses.
///
/// # Examples
/// ```
/// use std::sync::Arc;
/// use registrar::outbound::memory::MemoryStore;
///
/// let store = Arc::new(MemoryStore::new());
/// assert_eq!(store.len(), 0);
/// ```
#[derive(Debug, Default)]
pub struct MemoryStore {
    state: Mutex<State>,
}

impl MemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Total number of stored records across all aggregates.
    pub fn len(&self) -> usize {
        self.lock()
            .map(|state| {
                state.identities.len()
                    + state.students.len()
                    + state.faculty.len()
                    + state.courses.len()
            })
            .unwrap_or_default()
    }

    /// Whether the store holds no records.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock(&self) -> Result<MutexGuard<'_, State>, RepositoryError> {
        self.state
            .lock()
            .map_err(|_| RepositoryError::connection("in-memory store lock poisoned"))
    }
}

/// Case-insensitive substring match over any of `fields`; no needle matches
/// everything.
fn matches_search(needle: Option<&str>, fields: &[&str]) -> bool {
    let Some(needle) = needle.map(str::trim).filter(|n| !n.is_empty()) else {
        return true;
    };
    let needle = needle.to_lowercase();
    fields
        .iter()
        .any(|field| field.to_lowercase().contains(&needle))
}

/// Case-insensitive equality for optional text filters.
fn matches_text(filter: Option<&str>, value: &str) -> bool {
    filter.is_none_or(|wanted| wanted.trim().eq_ignore_ascii_case(value.trim()))
}

fn matches_value<T: PartialEq>(filter: Option<&T>, value: &T) -> bool {
    filter.is_none_or(|wanted| wanted == value)
}

fn compare_f64(a: f64, b: f64) -> Ordering {
    a.partial_cmp(&b).unwrap_or(Ordering::Equal)
}

#[cfg(test)]
mod tests;
