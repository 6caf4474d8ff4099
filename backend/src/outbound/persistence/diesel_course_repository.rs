//! PostgreSQL-backed `CourseRepository` implementation using Diesel ORM.
//!
//! A course is stored across three tables: the `courses` row (projected
//! columns plus the JSONB document), `course_faculty` for teaching
//! assignments, and `course_enrollments` for the roster. Reads reassemble
//! the aggregate from all three; the join tables are authoritative for the
//! faculty list and roster.
//!
//! Every write locks the course row, checks the stored revision when the
//! caller asks for it, and bumps the revision when something changed.
//! Catalogue saves leave the join tables alone; roster and staffing writes
//! insert, update, or delete exactly one join row.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use diesel::dsl::max;
use diesel::prelude::*;
use diesel::result::Error as DieselError;
use diesel_async::scoped_futures::ScopedFutureExt;
use diesel_async::{AsyncConnection, AsyncPgConnection, RunQueryDsl};
use pagination::Page;
use tracing::debug;
use uuid::Uuid;

use crate::domain::ports::{
    CourseQuery, CourseRepository, CourseSortField, CourseWrite, RepositoryError,
};
use crate::domain::{Attendance, Course, CourseId, FacultyId, Grade, RosterEntry, StudentId};

use super::diesel_helpers::{
    count_from_db, count_to_db, from_document, map_diesel_error, map_pool_error,
    order_by_direction, position_to_db, revision_from_db, revision_to_db, search_pattern,
    to_document, total_from_db, window,
};
use super::models::{CourseFacultyRow, CourseRecord, CourseRow, EnrollmentRow};
use super::pool::DbPool;
use super::schema::{course_enrollments, course_faculty, courses};

/// Diesel-backed implementation of the `CourseRepository` port.
#[derive(Clone)]
pub struct DieselCourseRepository {
    pool: DbPool,
}

impl DieselCourseRepository {
    /// Create a new repository with the given connection pool.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

/// Everything needed to insert one course.
struct CourseRows<'a> {
    record: CourseRecord<'a>,
    faculty: Vec<CourseFacultyRow>,
    roster: Vec<EnrollmentRow>,
}

fn course_to_rows(course: &Course, revision: u32) -> Result<CourseRows<'_>, RepositoryError> {
    let id = *course.id.as_uuid();
    let record = CourseRecord {
        id,
        code: course.code.as_str(),
        name: course.name.as_str(),
        department: course.department.as_str(),
        description: course.description.as_str(),
        credits: i16::from(course.credits),
        semester: i16::from(course.semester),
        capacity: count_to_db(course.capacity, "capacity")?,
        status: course.status.as_str(),
        revision: revision_to_db(revision)?,
        document: to_document(course)?,
        created_at: course.created_at,
        updated_at: course.updated_at,
    };
    let faculty = course
        .faculty
        .iter()
        .enumerate()
        .map(|(index, member)| {
            Ok(CourseFacultyRow {
                course_id: id,
                faculty_id: *member.as_uuid(),
                position: position_to_db(index)?,
            })
        })
        .collect::<Result<Vec<_>, RepositoryError>>()?;
    let roster = course
        .roster
        .iter()
        .enumerate()
        .map(|(index, entry)| {
            Ok(EnrollmentRow {
                course_id: id,
                student_id: *entry.student_id.as_uuid(),
                position: position_to_db(index)?,
                enrolled_at: entry.enrolled_at,
                grade: entry.grade.as_str().to_owned(),
                attendance_present: count_to_db(entry.attendance.present, "attendance_present")?,
                attendance_total: count_to_db(entry.attendance.total, "attendance_total")?,
            })
        })
        .collect::<Result<Vec<_>, RepositoryError>>()?;
    Ok(CourseRows {
        record,
        faculty,
        roster,
    })
}

fn row_to_entry(row: EnrollmentRow) -> Result<RosterEntry, RepositoryError> {
    let grade: Grade = row
        .grade
        .parse()
        .map_err(|err| RepositoryError::query(format!("stored grade: {err}")))?;
    Ok(RosterEntry {
        student_id: StudentId::from_uuid(row.student_id),
        enrolled_at: row.enrolled_at,
        grade,
        attendance: Attendance {
            present: count_from_db(row.attendance_present, "attendance_present")?,
            total: count_from_db(row.attendance_total, "attendance_total")?,
        },
    })
}

/// Rebuild a course from its row and its join rows, each already in
/// position order.
fn assemble(
    row: CourseRow,
    faculty: Vec<CourseFacultyRow>,
    roster: Vec<EnrollmentRow>,
) -> Result<Course, RepositoryError> {
    let mut course: Course = from_document(row.document)?;
    if *course.id.as_uuid() != row.id {
        return Err(RepositoryError::query(format!(
            "course document {} stored under {}",
            course.id, row.id
        )));
    }
    course.revision = revision_from_db(row.revision)?;
    course.updated_at = row.updated_at;
    course.faculty = faculty
        .into_iter()
        .map(|assignment| FacultyId::from_uuid(assignment.faculty_id))
        .collect();
    course.roster = roster
        .into_iter()
        .map(row_to_entry)
        .collect::<Result<Vec<_>, _>>()?;
    Ok(course)
}

fn filtered(query: &CourseQuery) -> courses::BoxedQuery<'static, diesel::pg::Pg> {
    let mut boxed = courses::table.into_boxed();
    if let Some(department) = query.department.as_deref().map(str::trim) {
        boxed = boxed.filter(courses::department.ilike(department.to_owned()));
    }
    if let Some(semester) = query.semester {
        boxed = boxed.filter(courses::semester.eq(i16::from(semester)));
    }
    if let Some(status) = query.status {
        boxed = boxed.filter(courses::status.eq(status.as_str()));
    }
    if let Some(member) = query.faculty {
        boxed = boxed.filter(
            courses::id.eq_any(
                course_faculty::table
                    .filter(course_faculty::faculty_id.eq(*member.as_uuid()))
                    .select(course_faculty::course_id),
            ),
        );
    }
    if let Some(pattern) = search_pattern(query.search.as_deref()) {
        boxed = boxed.filter(
            courses::code
                .ilike(pattern.clone())
                .or(courses::name.ilike(pattern.clone()))
                .or(courses::description.ilike(pattern)),
        );
    }
    boxed
}

/// Failure inside a write transaction; anything but `Diesel` is a
/// business outcome that still rolls the transaction back.
enum WriteFailure {
    Diesel(DieselError),
    Missing,
    Mismatch { expected: u32, actual: u32 },
    Invalid(RepositoryError),
}

impl From<DieselError> for WriteFailure {
    fn from(error: DieselError) -> Self {
        Self::Diesel(error)
    }
}

impl From<RepositoryError> for WriteFailure {
    fn from(error: RepositoryError) -> Self {
        Self::Invalid(error)
    }
}

impl WriteFailure {
    fn into_repository(self, course: Uuid) -> RepositoryError {
        match self {
            Self::Diesel(error) => map_diesel_error(error),
            Self::Missing => RepositoryError::missing("course"),
            Self::Mismatch { expected, actual } => {
                debug!(%course, expected, actual, "course revision moved on");
                RepositoryError::revision_mismatch(expected, actual)
            }
            Self::Invalid(error) => error,
        }
    }
}

/// Lock the course row and check the revision guard; returns the stored
/// revision.
async fn lock_course(
    conn: &mut AsyncPgConnection,
    id: Uuid,
    expected: Option<u32>,
) -> Result<u32, WriteFailure> {
    let current: Option<i32> = courses::table
        .find(id)
        .select(courses::revision)
        .for_update()
        .first(conn)
        .await
        .optional()?;
    let actual = revision_from_db(current.ok_or(WriteFailure::Missing)?)?;
    match expected {
        Some(expected) if expected != actual => Err(WriteFailure::Mismatch { expected, actual }),
        _ => Ok(actual),
    }
}

/// Record a join-row change on the locked course row.
async fn touch_course(
    conn: &mut AsyncPgConnection,
    id: Uuid,
    revision: u32,
    at: DateTime<Utc>,
) -> Result<(), WriteFailure> {
    let next = revision_to_db(revision.saturating_add(1))?;
    diesel::update(courses::table.find(id))
        .set((courses::revision.eq(next), courses::updated_at.eq(at)))
        .execute(conn)
        .await?;
    Ok(())
}

async fn insert_join_rows(
    conn: &mut AsyncPgConnection,
    faculty: &[CourseFacultyRow],
    roster: &[EnrollmentRow],
) -> Result<(), DieselError> {
    if !faculty.is_empty() {
        diesel::insert_into(course_faculty::table)
            .values(faculty)
            .execute(conn)
            .await?;
    }
    if !roster.is_empty() {
        diesel::insert_into(course_enrollments::table)
            .values(roster)
            .execute(conn)
            .await?;
    }
    Ok(())
}

impl DieselCourseRepository {
    /// Load courses matching `boxed` together with their join rows.
    async fn load(
        &self,
        boxed: courses::BoxedQuery<'static, diesel::pg::Pg>,
    ) -> Result<Vec<Course>, RepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let rows: Vec<CourseRow> = boxed
            .select(CourseRow::as_select())
            .load(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        if rows.is_empty() {
            return Ok(Vec::new());
        }
        let ids: Vec<Uuid> = rows.iter().map(|row| row.id).collect();

        let assignments: Vec<CourseFacultyRow> = course_faculty::table
            .filter(course_faculty::course_id.eq_any(&ids))
            .order((course_faculty::course_id, course_faculty::position))
            .select(CourseFacultyRow::as_select())
            .load(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        let entries: Vec<EnrollmentRow> = course_enrollments::table
            .filter(course_enrollments::course_id.eq_any(&ids))
            .order((course_enrollments::course_id, course_enrollments::position))
            .select(EnrollmentRow::as_select())
            .load(&mut conn)
            .await
            .map_err(map_diesel_error)?;

        let mut faculty_by_course: HashMap<Uuid, Vec<CourseFacultyRow>> = HashMap::new();
        for assignment in assignments {
            faculty_by_course
                .entry(assignment.course_id)
                .or_default()
                .push(assignment);
        }
        let mut roster_by_course: HashMap<Uuid, Vec<EnrollmentRow>> = HashMap::new();
        for entry in entries {
            roster_by_course
                .entry(entry.course_id)
                .or_default()
                .push(entry);
        }

        rows.into_iter()
            .map(|row| {
                let faculty = faculty_by_course.remove(&row.id).unwrap_or_default();
                let roster = roster_by_course.remove(&row.id).unwrap_or_default();
                assemble(row, faculty, roster)
            })
            .collect()
    }

    /// Bump the revision of every course in `ids` after a join-table purge.
    async fn bump_revisions(
        conn: &mut AsyncPgConnection,
        ids: &[Uuid],
    ) -> Result<usize, DieselError> {
        if ids.is_empty() {
            return Ok(0);
        }
        diesel::update(courses::table.filter(courses::id.eq_any(ids)))
            .set(courses::revision.eq(courses::revision + 1))
            .execute(conn)
            .await
    }
}

#[async_trait]
impl CourseRepository for DieselCourseRepository {
    async fn insert(&self, course: &Course) -> Result<(), RepositoryError> {
        let rows = course_to_rows(course, course.revision)?;
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        conn.transaction(|conn| {
            async move {
                diesel::insert_into(courses::table)
                    .values(&rows.record)
                    .execute(conn)
                    .await?;
                insert_join_rows(conn, &rows.faculty, &rows.roster).await
            }
            .scope_boxed()
        })
        .await
        .map_err(map_diesel_error)
    }

    async fn save(
        &self,
        course: &Course,
        expected_revision: Option<u32>,
    ) -> Result<Course, RepositoryError> {
        let id = *course.id.as_uuid();
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        conn.transaction::<(), WriteFailure, _>(|conn| {
            async move {
                let actual = lock_course(conn, id, expected_revision).await?;
                let rows = course_to_rows(course, actual.saturating_add(1))?;
                diesel::update(courses::table.find(id))
                    .set(&rows.record)
                    .execute(conn)
                    .await?;
                Ok(())
            }
            .scope_boxed()
        })
        .await
        .map_err(|failure| failure.into_repository(id))?;
        drop(conn);

        self.find_by_id(&course.id)
            .await?
            .ok_or_else(|| RepositoryError::missing("course"))
    }

    async fn find_by_id(&self, id: &CourseId) -> Result<Option<Course>, RepositoryError> {
        let found = self
            .load(
                courses::table
                    .filter(courses::id.eq(*id.as_uuid()))
                    .into_boxed(),
            )
            .await?;
        Ok(found.into_iter().next())
    }

    async fn find_many(&self, ids: &[CourseId]) -> Result<Vec<Course>, RepositoryError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let wanted: Vec<Uuid> = ids.iter().map(|id| *id.as_uuid()).collect();
        self.load(courses::table.filter(courses::id.eq_any(wanted)).into_boxed())
            .await
    }

    async fn list(&self, query: &CourseQuery) -> Result<Page<Course>, RepositoryError> {
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
            CourseSortField::Code => order_by_direction!(boxed, direction, courses::code),
            CourseSortField::Name => order_by_direction!(boxed, direction, courses::name),
            CourseSortField::Semester => order_by_direction!(boxed, direction, courses::semester),
            CourseSortField::Credits => order_by_direction!(boxed, direction, courses::credits),
        };
        let (skip, limit) = window(query.page);
        let items = self
            .load(
                ordered
                    .then_order_by(courses::code.asc())
                    .offset(skip)
                    .limit(limit),
            )
            .await?;
        Ok(Page::new(items, total_from_db(total), query.page))
    }

    async fn list_by_student(&self, student: &StudentId) -> Result<Vec<Course>, RepositoryError> {
        self.load(
            courses::table
                .filter(
                    courses::id.eq_any(
                        course_enrollments::table
                            .filter(course_enrollments::student_id.eq(*student.as_uuid()))
                            .select(course_enrollments::course_id),
                    ),
                )
                .order(courses::code.asc())
                .into_boxed(),
        )
        .await
    }

    async fn add_roster_entry(
        &self,
        write: CourseWrite,
        entry: &RosterEntry,
    ) -> Result<bool, RepositoryError> {
        let id = *write.course.as_uuid();
        let mut row = EnrollmentRow {
            course_id: id,
            student_id: *entry.student_id.as_uuid(),
            position: 0,
            enrolled_at: entry.enrolled_at,
            grade: entry.grade.as_str().to_owned(),
            attendance_present: count_to_db(entry.attendance.present, "attendance_present")?,
            attendance_total: count_to_db(entry.attendance.total, "attendance_total")?,
        };
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        conn.transaction::<bool, WriteFailure, _>(|conn| {
            async move {
                let revision = lock_course(conn, id, write.expected_revision).await?;
                let last: Option<i32> = course_enrollments::table
                    .filter(course_enrollments::course_id.eq(id))
                    .select(max(course_enrollments::position))
                    .get_result(conn)
                    .await?;
                row.position = last.map_or(0, |position| position.saturating_add(1));
                let inserted = diesel::insert_into(course_enrollments::table)
                    .values(&row)
                    .on_conflict_do_nothing()
                    .execute(conn)
                    .await?;
                if inserted > 0 {
                    touch_course(conn, id, revision, write.at).await?;
                }
                Ok(inserted > 0)
            }
            .scope_boxed()
        })
        .await
        .map_err(|failure| failure.into_repository(id))
    }

    async fn remove_roster_entry(
        &self,
        write: CourseWrite,
        student: StudentId,
    ) -> Result<bool, RepositoryError> {
        let id = *write.course.as_uuid();
        let student = *student.as_uuid();
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        conn.transaction::<bool, WriteFailure, _>(|conn| {
            async move {
                let revision = lock_course(conn, id, write.expected_revision).await?;
                let removed = diesel::delete(course_enrollments::table.find((id, student)))
                    .execute(conn)
                    .await?;
                if removed > 0 {
                    touch_course(conn, id, revision, write.at).await?;
                }
                Ok(removed > 0)
            }
            .scope_boxed()
        })
        .await
        .map_err(|failure| failure.into_repository(id))
    }

    async fn set_grade(
        &self,
        write: CourseWrite,
        student: StudentId,
        grade: Grade,
    ) -> Result<Option<RosterEntry>, RepositoryError> {
        let id = *write.course.as_uuid();
        let student = *student.as_uuid();
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let updated = conn
            .transaction::<Option<EnrollmentRow>, WriteFailure, _>(|conn| {
                async move {
                    let revision = lock_course(conn, id, write.expected_revision).await?;
                    let updated = diesel::update(course_enrollments::table.find((id, student)))
                        .set(course_enrollments::grade.eq(grade.as_str()))
                        .returning(EnrollmentRow::as_returning())
                        .get_result(conn)
                        .await
                        .optional()?;
                    if updated.is_some() {
                        touch_course(conn, id, revision, write.at).await?;
                    }
                    Ok(updated)
                }
                .scope_boxed()
            })
            .await
            .map_err(|failure| failure.into_repository(id))?;
        updated.map(row_to_entry).transpose()
    }

    async fn record_attendance(
        &self,
        write: CourseWrite,
        student: StudentId,
        present: bool,
    ) -> Result<Option<RosterEntry>, RepositoryError> {
        let id = *write.course.as_uuid();
        let student = *student.as_uuid();
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let updated = conn
            .transaction::<Option<EnrollmentRow>, WriteFailure, _>(|conn| {
                async move {
                    let revision = lock_course(conn, id, write.expected_revision).await?;
                    let updated = diesel::update(course_enrollments::table.find((id, student)))
                        .set((
                            course_enrollments::attendance_total
                                .eq(course_enrollments::attendance_total + 1),
                            course_enrollments::attendance_present
                                .eq(course_enrollments::attendance_present + i32::from(present)),
                        ))
                        .returning(EnrollmentRow::as_returning())
                        .get_result(conn)
                        .await
                        .optional()?;
                    if updated.is_some() {
                        touch_course(conn, id, revision, write.at).await?;
                    }
                    Ok(updated)
                }
                .scope_boxed()
            })
            .await
            .map_err(|failure| failure.into_repository(id))?;
        updated.map(row_to_entry).transpose()
    }

    async fn add_faculty(
        &self,
        write: CourseWrite,
        faculty: FacultyId,
    ) -> Result<bool, RepositoryError> {
        let id = *write.course.as_uuid();
        let member = *faculty.as_uuid();
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        conn.transaction::<bool, WriteFailure, _>(|conn| {
            async move {
                let revision = lock_course(conn, id, write.expected_revision).await?;
                let last: Option<i32> = course_faculty::table
                    .filter(course_faculty::course_id.eq(id))
                    .select(max(course_faculty::position))
                    .get_result(conn)
                    .await?;
                let row = CourseFacultyRow {
                    course_id: id,
                    faculty_id: member,
                    position: last.map_or(0, |position| position.saturating_add(1)),
                };
                let inserted = diesel::insert_into(course_faculty::table)
                    .values(&row)
                    .on_conflict_do_nothing()
                    .execute(conn)
                    .await?;
                if inserted > 0 {
                    touch_course(conn, id, revision, write.at).await?;
                }
                Ok(inserted > 0)
            }
            .scope_boxed()
        })
        .await
        .map_err(|failure| failure.into_repository(id))
    }

    async fn remove_faculty(
        &self,
        write: CourseWrite,
        faculty: FacultyId,
    ) -> Result<bool, RepositoryError> {
        let id = *write.course.as_uuid();
        let member = *faculty.as_uuid();
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        conn.transaction::<bool, WriteFailure, _>(|conn| {
            async move {
                let revision = lock_course(conn, id, write.expected_revision).await?;
                let removed = diesel::delete(course_faculty::table.find((id, member)))
                    .execute(conn)
                    .await?;
                if removed > 0 {
                    touch_course(conn, id, revision, write.at).await?;
                }
                Ok(removed > 0)
            }
            .scope_boxed()
        })
        .await
        .map_err(|failure| failure.into_repository(id))
    }

    async fn delete(
        &self,
        id: &CourseId,
        expected_revision: Option<u32>,
    ) -> Result<bool, RepositoryError> {
        let id = *id.as_uuid();
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let outcome = conn
            .transaction::<(), WriteFailure, _>(|conn| {
                async move {
                    lock_course(conn, id, expected_revision).await?;
                    diesel::delete(courses::table.find(id)).execute(conn).await?;
                    Ok(())
                }
                .scope_boxed()
            })
            .await;
        match outcome {
            Ok(()) => Ok(true),
            Err(WriteFailure::Missing) => Ok(false),
            Err(failure) => Err(failure.into_repository(id)),
        }
    }

    async fn remove_student_everywhere(
        &self,
        student: &StudentId,
    ) -> Result<usize, RepositoryError> {
        let student = *student.as_uuid();
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        conn.transaction(|conn| {
            async move {
                let touched: Vec<Uuid> = diesel::delete(
                    course_enrollments::table.filter(course_enrollments::student_id.eq(student)),
                )
                .returning(course_enrollments::course_id)
                .get_results(conn)
                .await?;
                Self::bump_revisions(conn, &touched).await
            }
            .scope_boxed()
        })
        .await
        .map_err(map_diesel_error)
    }

    async fn remove_faculty_everywhere(
        &self,
        member: &FacultyId,
    ) -> Result<usize, RepositoryError> {
        let member = *member.as_uuid();
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        conn.transaction(|conn| {
            async move {
                let touched: Vec<Uuid> = diesel::delete(
                    course_faculty::table.filter(course_faculty::faculty_id.eq(member)),
                )
                .returning(course_faculty::course_id)
                .get_results(conn)
                .await?;
                Self::bump_revisions(conn, &touched).await
            }
            .scope_boxed()
        })
        .await
        .map_err(map_diesel_error)
    }
}

#[cfg(test)]
mod tests {
    //! Assembly coverage; transactional behaviour is exercised against the
    //! in-memory adapter.
    use super::*;
    use crate::domain::course::fixtures::draft;
    use crate::test_support::fixture_timestamp;
    use rstest::rstest;

    fn course_with_roster() -> Course {
        let mut course = Course::from_draft(
            CourseId::generate(),
            draft("CS101", 3),
            fixture_timestamp(),
        );
        course.faculty.push(FacultyId::generate());
        for _ in 0..2 {
            course
                .enroll(StudentId::generate(), fixture_timestamp())
                .expect("enroll");
        }
        course.roster[1].grade = Grade::BPlus;
        course.roster[1].attendance = Attendance { present: 2, total: 3 };
        course
    }

    fn course_row(rows: &CourseRows<'_>) -> CourseRow {
        CourseRow {
            id: rows.record.id,
            revision: rows.record.revision,
            document: rows.record.document.clone(),
            updated_at: rows.record.updated_at,
        }
    }

    fn reassemble(course: &Course, revision: u32) -> Course {
        let rows = course_to_rows(course, revision).expect("rows");
        assemble(course_row(&rows), rows.faculty, rows.roster).expect("course")
    }

    #[rstest]
    fn join_rows_keep_list_order() {
        let course = course_with_roster();
        let rows = course_to_rows(&course, 0).expect("rows");
        let positions: Vec<i32> = rows.roster.iter().map(|row| row.position).collect();
        assert_eq!(positions, vec![0, 1]);
        assert_eq!(rows.roster[1].grade, "B+");
    }

    #[rstest]
    fn course_reassembles_from_rows() {
        let course = course_with_roster();
        let mut expected = course.clone();
        expected.revision = 4;
        assert_eq!(reassemble(&course, 4), expected);
    }

    #[rstest]
    fn join_tables_override_document_lists() {
        let course = course_with_roster();
        let rows = course_to_rows(&course, 1).expect("rows");
        let loaded = assemble(course_row(&rows), Vec::new(), Vec::new()).expect("course");
        assert!(loaded.roster.is_empty());
        assert!(loaded.faculty.is_empty());
    }

    #[rstest]
    fn row_timestamp_overrides_document() {
        let course = course_with_roster();
        let rows = course_to_rows(&course, 2).expect("rows");
        let mut row = course_row(&rows);
        row.updated_at = fixture_timestamp() + chrono::Duration::minutes(5);
        let loaded = assemble(row.clone(), Vec::new(), Vec::new()).expect("course");
        assert_eq!(loaded.updated_at, row.updated_at);
    }

    #[rstest]
    fn write_failures_map_to_repository_errors() {
        let id = Uuid::nil();
        assert_eq!(
            WriteFailure::Missing.into_repository(id),
            RepositoryError::missing("course")
        );
        assert_eq!(
            WriteFailure::Mismatch {
                expected: 2,
                actual: 3
            }
            .into_repository(id),
            RepositoryError::revision_mismatch(2_u32, 3_u32)
        );
    }

    #[rstest]
    fn unknown_grade_is_a_query_error() {
        let row = EnrollmentRow {
            course_id: Uuid::nil(),
            student_id: Uuid::nil(),
            position: 0,
            enrolled_at: fixture_timestamp(),
            grade: "Z".to_owned(),
            attendance_present: 0,
            attendance_total: 0,
        };
        assert!(matches!(row_to_entry(row), Err(RepositoryError::Query { .. })));
    }
}
