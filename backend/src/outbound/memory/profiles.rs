//! Student and faculty repositories over the in-memory store.

use async_trait::async_trait;
use pagination::Page;

use super::{MemoryStore, compare_f64, matches_search, matches_text, matches_value};
use crate::domain::ports::{
    FacultyQuery, FacultyRepository, FacultySortField, RepositoryError, StudentQuery,
    StudentRepository, StudentSortField,
};
use crate::domain::{CourseId, Faculty, FacultyId, IdentityId, Student, StudentId};

fn check_student_unique<'a>(
    students: impl Iterator<Item = &'a Student>,
    candidate: &Student,
) -> Result<(), RepositoryError> {
    for existing in students.filter(|existing| existing.id != candidate.id) {
        if existing.roll_number == candidate.roll_number {
            return Err(RepositoryError::duplicate("rollNumber"));
        }
        if existing.contact.email == candidate.contact.email {
            return Err(RepositoryError::duplicate("email"));
        }
    }
    Ok(())
}

fn check_faculty_unique<'a>(
    members: impl Iterator<Item = &'a Faculty>,
    candidate: &Faculty,
) -> Result<(), RepositoryError> {
    for existing in members.filter(|existing| existing.id != candidate.id) {
        if existing.employee_id == candidate.employee_id {
            return Err(RepositoryError::duplicate("employeeId"));
        }
        if existing.email == candidate.email {
            return Err(RepositoryError::duplicate("email"));
        }
    }
    Ok(())
}

fn student_matches(student: &Student, query: &StudentQuery) -> bool {
    let academic = &student.academic;
    let full_name = student.full_name();
    matches_text(query.branch.as_deref(), &academic.branch)
        && matches_value(query.semester.as_ref(), &academic.semester)
        && matches_text(query.batch.as_deref(), &academic.batch)
        && query.section.as_deref().is_none_or(|wanted| {
            academic
                .section
                .as_deref()
                .is_some_and(|section| section.eq_ignore_ascii_case(wanted.trim()))
        })
        && matches_value(query.active.as_ref(), &student.active)
        && matches_search(
            query.search.as_deref(),
            &[
                student.roll_number.as_str(),
                full_name.as_str(),
                student.contact.email.as_str(),
            ],
        )
}

fn faculty_matches(member: &Faculty, query: &FacultyQuery) -> bool {
    let full_name = member.full_name();
    let mut haystack = vec![
        member.employee_id.as_str(),
        full_name.as_str(),
        member.email.as_str(),
    ];
    haystack.extend(member.specializations.iter().map(String::as_str));
    matches_text(query.department.as_deref(), &member.department)
        && matches_value(query.position.as_ref(), &member.position)
        && matches_value(query.active.as_ref(), &member.active)
        && matches_search(query.search.as_deref(), &haystack)
}

#[async_trait]
impl StudentRepository for MemoryStore {
    async fn insert(&self, student: &Student) -> Result<(), RepositoryError> {
        let mut state = self.lock()?;
        if state.students.contains_key(&student.id) {
            return Err(RepositoryError::duplicate("id"));
        }
        check_student_unique(state.students.values(), student)?;
        state.students.insert(student.id, student.clone());
        Ok(())
    }

    async fn update(&self, student: &Student) -> Result<(), RepositoryError> {
        let mut state = self.lock()?;
        if !state.students.contains_key(&student.id) {
            return Err(RepositoryError::query(format!(
                "student {} does not exist",
                student.id
            )));
        }
        check_student_unique(state.students.values(), student)?;
        state.students.insert(student.id, student.clone());
        Ok(())
    }

    async fn find_by_id(&self, id: &StudentId) -> Result<Option<Student>, RepositoryError> {
        Ok(self.lock()?.students.get(id).cloned())
    }

    async fn find_by_identity(
        &self,
        identity: &IdentityId,
    ) -> Result<Option<Student>, RepositoryError> {
        Ok(self
            .lock()?
            .students
            .values()
            .find(|student| student.identity_id == *identity)
            .cloned())
    }

    async fn find_many(&self, ids: &[StudentId]) -> Result<Vec<Student>, RepositoryError> {
        let state = self.lock()?;
        Ok(ids
            .iter()
            .filter_map(|id| state.students.get(id).cloned())
            .collect())
    }

    async fn list(&self, query: &StudentQuery) -> Result<Page<Student>, RepositoryError> {
        let state = self.lock()?;
        let mut matches: Vec<Student> = state
            .students
            .values()
            .filter(|student| student_matches(student, query))
            .cloned()
            .collect();
        drop(state);
        matches.sort_by(|a, b| {
            let ordering = match query.sort.field {
                StudentSortField::RollNumber => a.roll_number.cmp(&b.roll_number),
                StudentSortField::LastName => a
                    .name
                    .last
                    .to_lowercase()
                    .cmp(&b.name.last.to_lowercase()),
                StudentSortField::Semester => a.academic.semester.cmp(&b.academic.semester),
                StudentSortField::Cgpa => compare_f64(a.academic.cgpa, b.academic.cgpa),
                StudentSortField::CreatedAt => a.created_at.cmp(&b.created_at),
            };
            query
                .sort
                .direction
                .apply(ordering)
                .then_with(|| a.roll_number.cmp(&b.roll_number))
        });
        Ok(Page::from_slice(&matches, query.page))
    }

    async fn delete(&self, id: &StudentId) -> Result<bool, RepositoryError> {
        Ok(self.lock()?.students.remove(id).is_some())
    }
}

#[async_trait]
impl FacultyRepository for MemoryStore {
    async fn insert(&self, faculty: &Faculty) -> Result<(), RepositoryError> {
        let mut state = self.lock()?;
        if state.faculty.contains_key(&faculty.id) {
            return Err(RepositoryError::duplicate("id"));
        }
        check_faculty_unique(state.faculty.values(), faculty)?;
        state.faculty.insert(faculty.id, faculty.clone());
        Ok(())
    }

    async fn update(&self, faculty: &Faculty) -> Result<(), RepositoryError> {
        let mut state = self.lock()?;
        if !state.faculty.contains_key(&faculty.id) {
            return Err(RepositoryError::query(format!(
                "faculty {} does not exist",
                faculty.id
            )));
        }
        check_faculty_unique(state.faculty.values(), faculty)?;
        state.faculty.insert(faculty.id, faculty.clone());
        Ok(())
    }

    async fn find_by_id(&self, id: &FacultyId) -> Result<Option<Faculty>, RepositoryError> {
        Ok(self.lock()?.faculty.get(id).cloned())
    }

    async fn find_by_identity(
        &self,
        identity: &IdentityId,
    ) -> Result<Option<Faculty>, RepositoryError> {
        Ok(self
            .lock()?
            .faculty
            .values()
            .find(|member| member.identity_id == *identity)
            .cloned())
    }

    async fn find_many(&self, ids: &[FacultyId]) -> Result<Vec<Faculty>, RepositoryError> {
        let state = self.lock()?;
        Ok(ids
            .iter()
            .filter_map(|id| state.faculty.get(id).cloned())
            .collect())
    }

    async fn list(&self, query: &FacultyQuery) -> Result<Page<Faculty>, RepositoryError> {
        let state = self.lock()?;
        let mut matches: Vec<Faculty> = state
            .faculty
            .values()
            .filter(|member| faculty_matches(member, query))
            .cloned()
            .collect();
        drop(state);
        matches.sort_by(|a, b| {
            let ordering = match query.sort.field {
                FacultySortField::EmployeeId => a.employee_id.cmp(&b.employee_id),
                FacultySortField::LastName => a
                    .name
                    .last
                    .to_lowercase()
                    .cmp(&b.name.last.to_lowercase()),
                FacultySortField::Department => a.department.cmp(&b.department),
                FacultySortField::JoinDate => a.join_date.cmp(&b.join_date),
            };
            query
                .sort
                .direction
                .apply(ordering)
                .then_with(|| a.employee_id.cmp(&b.employee_id))
        });
        Ok(Page::from_slice(&matches, query.page))
    }

    async fn delete(&self, id: &FacultyId) -> Result<bool, RepositoryError> {
        Ok(self.lock()?.faculty.remove(id).is_some())
    }

    async fn remove_course_everywhere(&self, course: &CourseId) -> Result<usize, RepositoryError> {
        let mut state = self.lock()?;
        Ok(state
            .faculty
            .values_mut()
            .map(|member| member.remove_course(*course))
            .filter(|removed| *removed)
            .count())
    }
}
