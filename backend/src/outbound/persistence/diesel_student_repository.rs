//! PostgreSQL-backed `StudentRepository` implementation using Diesel ORM.
//!
//! The profile is stored whole as a JSONB document; the columns used for
//! uniqueness, filtering, and sorting are projected next to it on every
//! write.

use async_trait::async_trait;
use diesel::prelude::*;
use diesel_async::RunQueryDsl;
use pagination::Page;
use uuid::Uuid;

use crate::domain::ports::{RepositoryError, StudentQuery, StudentRepository, StudentSortField};
use crate::domain::{IdentityId, Student, StudentId};

use super::diesel_helpers::{
    from_document, map_diesel_error, map_pool_error, order_by_direction, search_pattern,
    to_document, total_from_db, window,
};
use super::models::{StudentRecord, StudentRow};
use super::pool::DbPool;
use super::schema::students;

/// Diesel-backed implementation of the `StudentRepository` port.
#[derive(Clone)]
pub struct DieselStudentRepository {
    pool: DbPool,
}

impl DieselStudentRepository {
    /// Create a new repository with the given connection pool.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn row_to_student(row: StudentRow) -> Result<Student, RepositoryError> {
    let student: Student = from_document(row.document)?;
    if *student.id.as_uuid() != row.id {
        return Err(RepositoryError::query(format!(
            "student document {} stored under {}",
            student.id, row.id
        )));
    }
    Ok(student)
}

fn student_to_record(student: &Student) -> Result<StudentRecord<'_>, RepositoryError> {
    let academic = &student.academic;
    Ok(StudentRecord {
        id: *student.id.as_uuid(),
        identity_id: *student.identity_id.as_uuid(),
        roll_number: student.roll_number.as_str(),
        email: student.contact.email.as_str(),
        full_name: student.full_name(),
        last_name: student.name.last.as_str(),
        branch: academic.branch.as_str(),
        semester: i16::from(academic.semester),
        batch: academic.batch.as_str(),
        section: academic.section.as_deref(),
        cgpa: academic.cgpa,
        active: student.active,
        document: to_document(student)?,
        created_at: student.created_at,
        updated_at: student.updated_at,
    })
}

fn filtered(query: &StudentQuery) -> students::BoxedQuery<'static, diesel::pg::Pg> {
    let mut boxed = students::table.into_boxed();
    if let Some(branch) = query.branch.as_deref().map(str::trim) {
        boxed = boxed.filter(students::branch.ilike(branch.to_owned()));
    }
    if let Some(semester) = query.semester {
        boxed = boxed.filter(students::semester.eq(i16::from(semester)));
    }
    if let Some(batch) = query.batch.as_deref().map(str::trim) {
        boxed = boxed.filter(students::batch.ilike(batch.to_owned()));
    }
    if let Some(section) = query.section.as_deref().map(str::trim) {
        boxed = boxed.filter(students::section.ilike(section.to_owned()));
    }
    if let Some(active) = query.active {
        boxed = boxed.filter(students::active.eq(active));
    }
    if let Some(pattern) = search_pattern(query.search.as_deref()) {
        boxed = boxed.filter(
            students::roll_number
                .ilike(pattern.clone())
                .or(students::full_name.ilike(pattern.clone()))
                .or(students::email.ilike(pattern)),
        );
    }
    boxed
}

impl DieselStudentRepository {
    async fn load(
        &self,
        boxed: students::BoxedQuery<'static, diesel::pg::Pg>,
    ) -> Result<Vec<Student>, RepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let rows: Vec<StudentRow> = boxed
            .select(StudentRow::as_select())
            .load(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        rows.into_iter().map(row_to_student).collect()
    }
}

#[async_trait]
impl StudentRepository for DieselStudentRepository {
    async fn insert(&self, student: &Student) -> Result<(), RepositoryError> {
        let record = student_to_record(student)?;
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        diesel::insert_into(students::table)
            .values(&record)
            .execute(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        Ok(())
    }

    async fn update(&self, student: &Student) -> Result<(), RepositoryError> {
        let record = student_to_record(student)?;
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let updated = diesel::update(students::table.find(record.id))
            .set(&record)
            .execute(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        if updated == 0 {
            return Err(RepositoryError::query(format!(
                "student {} does not exist",
                student.id
            )));
        }
        Ok(())
    }

    async fn find_by_id(&self, id: &StudentId) -> Result<Option<Student>, RepositoryError> {
        let found = self
            .load(
                students::table
                    .filter(students::id.eq(*id.as_uuid()))
                    .into_boxed(),
            )
            .await?;
        Ok(found.into_iter().next())
    }

    async fn find_by_identity(
        &self,
        identity: &IdentityId,
    ) -> Result<Option<Student>, RepositoryError> {
        let found = self
            .load(
                students::table
                    .filter(students::identity_id.eq(*identity.as_uuid()))
                    .limit(1)
                    .into_boxed(),
            )
            .await?;
        Ok(found.into_iter().next())
    }

    async fn find_many(&self, ids: &[StudentId]) -> Result<Vec<Student>, RepositoryError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let wanted: Vec<Uuid> = ids.iter().map(|id| *id.as_uuid()).collect();
        self.load(
            students::table
                .filter(students::id.eq_any(wanted))
                .into_boxed(),
        )
        .await
    }

    async fn list(&self, query: &StudentQuery) -> Result<Page<Student>, RepositoryError> {
        let total: i64 = {
            let mut conn = self.pool.get().await.map_err(map_pool_error)?;
            filtered(query)
                .count()
                .get_result(&mut conn)
                .await
                .map_err(map_diesel_error)?
        };

        let boxed = filtered(query);
        let direction = query.sort.direction;
        let ordered = match query.sort.field {
            StudentSortField::RollNumber => {
                order_by_direction!(boxed, direction, students::roll_number)
            }
            StudentSortField::LastName => {
                order_by_direction!(boxed, direction, students::last_name)
            }
            StudentSortField::Semester => order_by_direction!(boxed, direction, students::semester),
            StudentSortField::Cgpa => order_by_direction!(boxed, direction, students::cgpa),
            StudentSortField::CreatedAt => {
                order_by_direction!(boxed, direction, students::created_at)
            }
        };
        let (skip, limit) = window(query.page);
        let items = self
            .load(
                ordered
                    .then_order_by(students::roll_number.asc())
                    .offset(skip)
                    .limit(limit),
            )
            .await?;
        Ok(Page::new(items, total_from_db(total), query.page))
    }

    async fn delete(&self, id: &StudentId) -> Result<bool, RepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let deleted = diesel::delete(students::table.find(*id.as_uuid()))
            .execute(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        Ok(deleted > 0)
    }
}

#[cfg(test)]
mod tests {
    //! Document and projection coverage.
    use super::*;
    use crate::domain::student::fixtures::draft;
    use crate::test_support::fixture_timestamp;
    use rstest::rstest;

    fn student() -> Student {
        Student::from_draft(
            StudentId::generate(),
            IdentityId::generate(),
            draft("CS001", "ada@example.edu"),
            fixture_timestamp(),
        )
    }

    #[rstest]
    fn record_projects_filter_columns() {
        let student = student();
        let record = student_to_record(&student).expect("record");
        assert_eq!(record.roll_number, "CS001");
        assert_eq!(record.email, "ada@example.edu");
        assert_eq!(record.full_name, student.full_name());
        assert_eq!(record.semester, i16::from(student.academic.semester));
    }

    #[rstest]
    fn document_round_trips() {
        let student = student();
        let record = student_to_record(&student).expect("record");
        let row = StudentRow {
            id: record.id,
            document: record.document,
        };
        assert_eq!(row_to_student(row).expect("student"), student);
    }

    #[rstest]
    fn mismatched_document_id_is_rejected() {
        let student = student();
        let record = student_to_record(&student).expect("record");
        let row = StudentRow {
            id: Uuid::nil(),
            document: record.document,
        };
        assert!(row_to_student(row).is_err());
    }
}
