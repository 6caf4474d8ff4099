//! PostgreSQL-backed `FacultyRepository` implementation using Diesel ORM.
//!
//! `course_ids` is the authoritative copy of a member's teaching list; the
//! document's own list is overwritten from it on read so bulk removals only
//! touch the array column.

use async_trait::async_trait;
use diesel::dsl::sql;
use diesel::prelude::*;
use diesel::sql_types::{Bool, Text};
use diesel_async::RunQueryDsl;
use pagination::Page;
use uuid::Uuid;

use crate::domain::ports::{FacultyQuery, FacultyRepository, FacultySortField, RepositoryError};
use crate::domain::{CourseId, Faculty, FacultyId, IdentityId};

use super::diesel_helpers::{
    from_document, map_diesel_error, map_pool_error, order_by_direction, search_pattern,
    to_document, total_from_db, window,
};
use super::models::{FacultyRecord, FacultyRow};
use super::pool::DbPool;
use super::schema::faculty;

/// Diesel-backed implementation of the `FacultyRepository` port.
#[derive(Clone)]
pub struct DieselFacultyRepository {
    pool: DbPool,
}

impl DieselFacultyRepository {
    /// Create a new repository with the given connection pool.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn row_to_faculty(row: FacultyRow) -> Result<Faculty, RepositoryError> {
    let mut member: Faculty = from_document(row.document)?;
    if *member.id.as_uuid() != row.id {
        return Err(RepositoryError::query(format!(
            "faculty document {} stored under {}",
            member.id, row.id
        )));
    }
    member.courses = row.course_ids.into_iter().map(CourseId::from_uuid).collect();
    Ok(member)
}

fn faculty_to_record(member: &Faculty) -> Result<FacultyRecord<'_>, RepositoryError> {
    Ok(FacultyRecord {
        id: *member.id.as_uuid(),
        identity_id: *member.identity_id.as_uuid(),
        employee_id: member.employee_id.as_str(),
        email: member.email.as_str(),
        full_name: member.full_name(),
        last_name: member.name.last.as_str(),
        department: member.department.as_str(),
        position: member.position.as_str(),
        join_date: member.join_date,
        specializations: &member.specializations,
        course_ids: member.courses.iter().map(|id| *id.as_uuid()).collect(),
        active: member.active,
        document: to_document(member)?,
        created_at: member.created_at,
        updated_at: member.updated_at,
    })
}

fn filtered(query: &FacultyQuery) -> faculty::BoxedQuery<'static, diesel::pg::Pg> {
    let mut boxed = faculty::table.into_boxed();
    if let Some(department) = query.department.as_deref().map(str::trim) {
        boxed = boxed.filter(faculty::department.ilike(department.to_owned()));
    }
    if let Some(position) = query.position {
        boxed = boxed.filter(faculty::position.eq(position.as_str()));
    }
    if let Some(active) = query.active {
        boxed = boxed.filter(faculty::active.eq(active));
    }
    if let Some(pattern) = search_pattern(query.search.as_deref()) {
        let in_specializations = sql::<Bool>(
            "EXISTS (SELECT 1 FROM unnest(faculty.specializations) AS s WHERE s ILIKE ",
        )
        .bind::<Text, _>(pattern.clone())
        .sql(")");
        boxed = boxed.filter(
            faculty::employee_id
                .ilike(pattern.clone())
                .or(faculty::full_name.ilike(pattern.clone()))
                .or(faculty::email.ilike(pattern))
                .or(in_specializations),
        );
    }
    boxed
}

impl DieselFacultyRepository {
    async fn load(
        &self,
        boxed: faculty::BoxedQuery<'static, diesel::pg::Pg>,
    ) -> Result<Vec<Faculty>, RepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let rows: Vec<FacultyRow> = boxed
            .select(FacultyRow::as_select())
            .load(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        rows.into_iter().map(row_to_faculty).collect()
    }
}

#[async_trait]
impl FacultyRepository for DieselFacultyRepository {
    async fn insert(&self, member: &Faculty) -> Result<(), RepositoryError> {
        let record = faculty_to_record(member)?;
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        diesel::insert_into(faculty::table)
            .values(&record)
            .execute(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        Ok(())
    }

    async fn update(&self, member: &Faculty) -> Result<(), RepositoryError> {
        let record = faculty_to_record(member)?;
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let updated = diesel::update(faculty::table.find(record.id))
            .set(&record)
            .execute(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        if updated == 0 {
            return Err(RepositoryError::query(format!(
                "faculty member {} does not exist",
                member.id
            )));
        }
        Ok(())
    }

    async fn find_by_id(&self, id: &FacultyId) -> Result<Option<Faculty>, RepositoryError> {
        let found = self
            .load(
                faculty::table
                    .filter(faculty::id.eq(*id.as_uuid()))
                    .into_boxed(),
            )
            .await?;
        Ok(found.into_iter().next())
    }

    async fn find_by_identity(
        &self,
        identity: &IdentityId,
    ) -> Result<Option<Faculty>, RepositoryError> {
        let found = self
            .load(
                faculty::table
                    .filter(faculty::identity_id.eq(*identity.as_uuid()))
                    .limit(1)
                    .into_boxed(),
            )
            .await?;
        Ok(found.into_iter().next())
    }

    async fn find_many(&self, ids: &[FacultyId]) -> Result<Vec<Faculty>, RepositoryError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let wanted: Vec<Uuid> = ids.iter().map(|id| *id.as_uuid()).collect();
        self.load(faculty::table.filter(faculty::id.eq_any(wanted)).into_boxed())
            .await
    }

    async fn list(&self, query: &FacultyQuery) -> Result<Page<Faculty>, RepositoryError> {
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
            FacultySortField::EmployeeId => {
                order_by_direction!(boxed, direction, faculty::employee_id)
            }
            FacultySortField::LastName => order_by_direction!(boxed, direction, faculty::last_name),
            FacultySortField::Department => {
                order_by_direction!(boxed, direction, faculty::department)
            }
            FacultySortField::JoinDate => order_by_direction!(boxed, direction, faculty::join_date),
        };
        let (skip, limit) = window(query.page);
        let items = self
            .load(
                ordered
                    .then_order_by(faculty::employee_id.asc())
                    .offset(skip)
                    .limit(limit),
            )
            .await?;
        Ok(Page::new(items, total_from_db(total), query.page))
    }

    async fn delete(&self, id: &FacultyId) -> Result<bool, RepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let deleted = diesel::delete(faculty::table.find(*id.as_uuid()))
            .execute(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        Ok(deleted > 0)
    }

    async fn remove_course_everywhere(&self, course: &CourseId) -> Result<usize, RepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        diesel::sql_query(
            "UPDATE faculty SET course_ids = array_remove(course_ids, $1) \
             WHERE $1 = ANY(course_ids)",
        )
        .bind::<diesel::sql_types::Uuid, _>(*course.as_uuid())
        .execute(&mut conn)
        .await
        .map_err(map_diesel_error)
    }
}
