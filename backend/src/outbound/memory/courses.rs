//! Course repository over the in-memory store.

use async_trait::async_trait;
use pagination::Page;

use super::{MemoryStore, State, matches_search, matches_text, matches_value};
use crate::domain::ports::{
    CourseQuery, CourseRepository, CourseSortField, CourseWrite, RepositoryError,
};
use crate::domain::{Course, CourseId, FacultyId, Grade, RosterEntry, StudentId};

fn check_code_unique<'a>(
    courses: impl Iterator<Item = &'a Course>,
    candidate: &Course,
) -> Result<(), RepositoryError> {
    if courses
        .filter(|existing| existing.id != candidate.id)
        .any(|existing| existing.code == candidate.code)
    {
        return Err(RepositoryError::duplicate("code"));
    }
    Ok(())
}

fn check_revision(current: &Course, expected: Option<u32>) -> Result<(), RepositoryError> {
    match expected {
        Some(expected) if expected != current.revision => Err(RepositoryError::revision_mismatch(
            expected,
            current.revision,
        )),
        _ => Ok(()),
    }
}

/// Apply `change` to the targeted course under the store lock. The change
/// reports whether it altered the course; only then is the revision bumped.
fn apply_write<T>(
    state: &mut State,
    write: CourseWrite,
    change: impl FnOnce(&mut Course) -> Option<T>,
) -> Result<Option<T>, RepositoryError> {
    let course = state
        .courses
        .get_mut(&write.course)
        .ok_or_else(|| RepositoryError::missing("course"))?;
    check_revision(course, write.expected_revision)?;
    let outcome = change(course);
    if outcome.is_some() {
        course.revision = course.revision.saturating_add(1);
        course.updated_at = write.at;
    }
    Ok(outcome)
}

fn course_matches(course: &Course, query: &CourseQuery) -> bool {
    matches_text(query.department.as_deref(), &course.department)
        && matches_value(query.semester.as_ref(), &course.semester)
        && matches_value(query.status.as_ref(), &course.status)
        && query
            .faculty
            .is_none_or(|faculty| course.is_taught_by(faculty))
        && matches_search(
            query.search.as_deref(),
            &[
                course.code.as_str(),
                course.name.as_str(),
                course.description.as_str(),
            ],
        )
}

#[async_trait]
impl CourseRepository for MemoryStore {
    async fn insert(&self, course: &Course) -> Result<(), RepositoryError> {
        let mut state = self.lock()?;
        if state.courses.contains_key(&course.id) {
            return Err(RepositoryError::duplicate("id"));
        }
        check_code_unique(state.courses.values(), course)?;
        state.courses.insert(course.id, course.clone());
        Ok(())
    }

    async fn save(
        &self,
        course: &Course,
        expected_revision: Option<u32>,
    ) -> Result<Course, RepositoryError> {
        let mut state = self.lock()?;
        let Some(current) = state.courses.get(&course.id) else {
            return Err(RepositoryError::missing("course"));
        };
        check_revision(current, expected_revision)?;
        let mut stored = course.clone();
        stored.roster = current.roster.clone();
        stored.faculty = current.faculty.clone();
        stored.revision = current.revision.saturating_add(1);
        check_code_unique(state.courses.values(), &stored)?;
        state.courses.insert(stored.id, stored.clone());
        Ok(stored)
    }

    async fn find_by_id(&self, id: &CourseId) -> Result<Option<Course>, RepositoryError> {
        Ok(self.lock()?.courses.get(id).cloned())
    }

    async fn find_many(&self, ids: &[CourseId]) -> Result<Vec<Course>, RepositoryError> {
        let state = self.lock()?;
        Ok(ids
            .iter()
            .filter_map(|id| state.courses.get(id).cloned())
            .collect())
    }

    async fn list(&self, query: &CourseQuery) -> Result<Page<Course>, RepositoryError> {
        let state = self.lock()?;
        let mut matches: Vec<Course> = state
            .courses
            .values()
            .filter(|course| course_matches(course, query))
            .cloned()
            .collect();
        drop(state);
        matches.sort_by(|a, b| {
            let ordering = match query.sort.field {
                CourseSortField::Code => a.code.cmp(&b.code),
                CourseSortField::Name => a.name.to_lowercase().cmp(&b.name.to_lowercase()),
                CourseSortField::Semester => a.semester.cmp(&b.semester),
                CourseSortField::Credits => a.credits.cmp(&b.credits),
            };
            query
                .sort
                .direction
                .apply(ordering)
                .then_with(|| a.code.cmp(&b.code))
        });
        Ok(Page::from_slice(&matches, query.page))
    }

    async fn list_by_student(&self, student: &StudentId) -> Result<Vec<Course>, RepositoryError> {
        let state = self.lock()?;
        let mut courses: Vec<Course> = state
            .courses
            .values()
            .filter(|course| course.is_enrolled(*student))
            .cloned()
            .collect();
        drop(state);
        courses.sort_by(|a, b| a.code.cmp(&b.code));
        Ok(courses)
    }

    async fn add_roster_entry(
        &self,
        write: CourseWrite,
        entry: &RosterEntry,
    ) -> Result<bool, RepositoryError> {
        let mut state = self.lock()?;
        let added = apply_write(&mut state, write, |course| {
            (!course.is_enrolled(entry.student_id)).then(|| course.roster.push(entry.clone()))
        })?;
        Ok(added.is_some())
    }

    async fn remove_roster_entry(
        &self,
        write: CourseWrite,
        student: StudentId,
    ) -> Result<bool, RepositoryError> {
        let mut state = self.lock()?;
        let removed = apply_write(&mut state, write, |course| {
            course.unenroll(student, write.at).ok()
        })?;
        Ok(removed.is_some())
    }

    async fn set_grade(
        &self,
        write: CourseWrite,
        student: StudentId,
        grade: Grade,
    ) -> Result<Option<RosterEntry>, RepositoryError> {
        let mut state = self.lock()?;
        apply_write(&mut state, write, |course| {
            course.set_grade(student, grade, write.at).ok()?;
            course.entry(student).cloned()
        })
    }

    async fn record_attendance(
        &self,
        write: CourseWrite,
        student: StudentId,
        present: bool,
    ) -> Result<Option<RosterEntry>, RepositoryError> {
        let mut state = self.lock()?;
        apply_write(&mut state, write, |course| {
            course.record_attendance(student, present, write.at).ok()?;
            course.entry(student).cloned()
        })
    }

    async fn add_faculty(
        &self,
        write: CourseWrite,
        faculty: FacultyId,
    ) -> Result<bool, RepositoryError> {
        let mut state = self.lock()?;
        let added = apply_write(&mut state, write, |course| {
            course.assign_faculty(faculty, write.at).ok()
        })?;
        Ok(added.is_some())
    }

    async fn remove_faculty(
        &self,
        write: CourseWrite,
        faculty: FacultyId,
    ) -> Result<bool, RepositoryError> {
        let mut state = self.lock()?;
        let removed = apply_write(&mut state, write, |course| {
            course.remove_faculty(faculty, write.at).ok()
        })?;
        Ok(removed.is_some())
    }

    async fn delete(
        &self,
        id: &CourseId,
        expected_revision: Option<u32>,
    ) -> Result<bool, RepositoryError> {
        let mut state = self.lock()?;
        let Some(current) = state.courses.get(id) else {
            return Ok(false);
        };
        check_revision(current, expected_revision)?;
        Ok(state.courses.remove(id).is_some())
    }

    async fn remove_student_everywhere(
        &self,
        student: &StudentId,
    ) -> Result<usize, RepositoryError> {
        let mut state = self.lock()?;
        let mut changed = 0;
        for course in state.courses.values_mut() {
            if course.purge_student(*student) {
                course.revision = course.revision.saturating_add(1);
                changed += 1;
            }
        }
        Ok(changed)
    }

    async fn remove_faculty_everywhere(
        &self,
        faculty: &FacultyId,
    ) -> Result<usize, RepositoryError> {
        let mut state = self.lock()?;
        let mut changed = 0;
        for course in state.courses.values_mut() {
            if course.purge_faculty(*faculty) {
                course.revision = course.revision.saturating_add(1);
                changed += 1;
            }
        }
        Ok(changed)
    }
}
