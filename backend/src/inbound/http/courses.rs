//! Course catalogue, enrollment, grading, and staffing handlers.
//!
//! ```text
//! GET    /api/v1/courses?department=CSE&semester=3&status=active
//! POST   /api/v1/courses {"code":"CS301","name":"Compilers",...}
//! GET    /api/v1/courses/{id}
//! PUT    /api/v1/courses/{id} {"capacity":80}
//! DELETE /api/v1/courses/{id}
//! POST   /api/v1/courses/{id}/enroll
//! PUT    /api/v1/courses/{id}/grade/{studentId} {"grade":"A+"}
//! PUT    /api/v1/courses/{id}/attendance/{studentId} {"present":true}
//! POST   /api/v1/courses/{id}/faculty/{facultyId}
//! DELETE /api/v1/courses/{id}/faculty/{facultyId}
//! ```

use actix_web::{HttpResponse, delete, get, post, put, web};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::domain::ports::{
    CourseDetails, CourseQuery, CourseSortField, FacultySummary, StudentSummary,
};
use crate::domain::{
    Assessment, Course, CourseCode, CourseDraft, CourseId, CourseStatus, CourseUpdate, Error,
    FacultyId, RosterEntry, Schedule, StudentId, Syllabus,
};
use crate::inbound::http::ApiResult;
use crate::inbound::http::bearer::{Authenticated, MaybeAuthenticated};
use crate::inbound::http::listing::{ListParams, PageResponse, filter_text};
use crate::inbound::http::state::HttpState;
use crate::inbound::http::validation::{FieldName, invalid_value_error, parse_id};

const SORT_FIELDS: &[(&str, CourseSortField)] = &[
    ("code", CourseSortField::Code),
    ("name", CourseSortField::Name),
    ("semester", CourseSortField::Semester),
    ("credits", CourseSortField::Credits),
];

/// Catalogue view of a course. The roster itself is never listed here;
/// staff read it through [`CourseDetailsResponse::students`].
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CourseResponse {
    #[schema(value_type = String, format = Uuid)]
    pub id: CourseId,
    #[schema(value_type = String)]
    pub code: CourseCode,
    pub name: String,
    pub department: String,
    pub credits: u8,
    #[schema(value_type = Vec<String>)]
    pub faculty_ids: Vec<FacultyId>,
    pub description: String,
    #[schema(value_type = Vec<String>)]
    pub prerequisites: Vec<CourseId>,
    pub semester: u8,
    pub capacity: u32,
    pub enrolled_count: usize,
    pub available_seats: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub schedule: Option<Schedule>,
    pub status: CourseStatus,
    pub syllabus: Syllabus,
    pub assessments: Vec<Assessment>,
    pub revision: u32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Course> for CourseResponse {
    fn from(course: Course) -> Self {
        let enrolled_count = course.enrolled_count();
        let available_seats = course.available_seats();
        Self {
            id: course.id,
            code: course.code,
            name: course.name,
            department: course.department,
            credits: course.credits,
            faculty_ids: course.faculty,
            description: course.description,
            prerequisites: course.prerequisites,
            semester: course.semester,
            capacity: course.capacity,
            enrolled_count,
            available_seats,
            schedule: course.schedule,
            status: course.status,
            syllabus: course.syllabus,
            assessments: course.assessments,
            revision: course.revision,
            created_at: course.created_at,
            updated_at: course.updated_at,
        }
    }
}

/// A course with its teaching staff and, for staff callers, its roster.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CourseDetailsResponse {
    #[serde(flatten)]
    pub course: CourseResponse,
    pub faculty: Vec<FacultySummary>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub students: Option<Vec<StudentSummary>>,
}

impl From<CourseDetails> for CourseDetailsResponse {
    fn from(details: CourseDetails) -> Self {
        Self {
            course: details.course.into(),
            faculty: details.faculty,
            students: details.students,
        }
    }
}

/// Filters specific to course listings.
#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct CourseFilters {
    pub department: Option<String>,
    pub semester: Option<u8>,
    /// `active`, `inactive`, or `archived`.
    pub status: Option<String>,
    /// Only courses taught by this faculty id.
    pub faculty: Option<String>,
}

fn course_query(filters: CourseFilters, list: &ListParams) -> Result<CourseQuery, Error> {
    let status = filter_text(filters.status)
        .map(|raw| {
            CourseStatus::parse(&raw.to_lowercase()).ok_or_else(|| {
                invalid_value_error(FieldName::new("status"), &raw, "unknown course status")
            })
        })
        .transpose()?;
    let faculty = filter_text(filters.faculty)
        .map(|raw| parse_id(&raw, FieldName::new("faculty")))
        .transpose()?;
    Ok(CourseQuery {
        department: filter_text(filters.department),
        semester: filters.semester,
        status,
        faculty,
        search: list.search(),
        sort: list.sort(SORT_FIELDS)?,
        page: list.page()?,
    })
}

fn course_id(raw: &str) -> Result<CourseId, Error> {
    parse_id(raw, FieldName::new("id"))
}

fn roster_path(path: &(String, String)) -> Result<(CourseId, StudentId), Error> {
    Ok((
        course_id(&path.0)?,
        parse_id(&path.1, FieldName::new("studentId"))?,
    ))
}

fn staffing_path(path: &(String, String)) -> Result<(CourseId, FacultyId), Error> {
    Ok((
        course_id(&path.0)?,
        parse_id(&path.1, FieldName::new("facultyId"))?,
    ))
}

/// Browse the catalogue. Open to anonymous callers.
#[utoipa::path(
    get,
    path = "/api/v1/courses",
    params(ListParams, CourseFilters),
    responses(
        (status = 200, description = "One page of courses", body = PageResponse<CourseResponse>),
        (status = 400, description = "Invalid query", body = Error),
        (status = 401, description = "Bearer token presented but invalid", body = Error)
    ),
    tags = ["courses"],
    operation_id = "listCourses",
    security([], ("BearerAuth" = []))
)]
#[get("/courses")]
pub async fn list_courses(
    state: web::Data<HttpState>,
    caller: MaybeAuthenticated,
    list: web::Query<ListParams>,
    filters: web::Query<CourseFilters>,
) -> ApiResult<web::Json<PageResponse<CourseResponse>>> {
    let query = course_query(filters.into_inner(), &list)?;
    let page = state.courses.list(caller.principal(), &query).await?;
    Ok(web::Json(PageResponse::from_page(page, CourseResponse::from)))
}

/// Create a course with an empty roster. Admin only.
#[utoipa::path(
    post,
    path = "/api/v1/courses",
    request_body = CourseDraft,
    responses(
        (status = 201, description = "Course created", body = CourseResponse),
        (status = 400, description = "Invalid request or duplicate code", body = Error),
        (status = 401, description = "Unauthorised", body = Error),
        (status = 403, description = "Forbidden", body = Error)
    ),
    tags = ["courses"],
    operation_id = "createCourse"
)]
#[post("/courses")]
pub async fn create_course(
    state: web::Data<HttpState>,
    caller: Authenticated,
    payload: web::Json<CourseDraft>,
) -> ApiResult<HttpResponse> {
    let course = state
        .courses
        .create(caller.principal(), payload.into_inner())
        .await?;
    Ok(HttpResponse::Created().json(CourseResponse::from(course)))
}

/// Read one course with faculty summaries; staff also see the roster.
#[utoipa::path(
    get,
    path = "/api/v1/courses/{id}",
    params(("id" = String, Path, description = "Course id")),
    responses(
        (status = 200, description = "Course", body = CourseDetailsResponse),
        (status = 401, description = "Bearer token presented but invalid", body = Error),
        (status = 404, description = "Not found", body = Error)
    ),
    tags = ["courses"],
    operation_id = "getCourse",
    security([], ("BearerAuth" = []))
)]
#[get("/courses/{id}")]
pub async fn get_course(
    state: web::Data<HttpState>,
    caller: MaybeAuthenticated,
    path: web::Path<String>,
) -> ApiResult<web::Json<CourseDetailsResponse>> {
    let id = course_id(&path)?;
    let details = state.courses.get(caller.principal(), id).await?;
    Ok(web::Json(details.into()))
}

/// Edit catalogue fields. Admin or assigned faculty.
#[utoipa::path(
    put,
    path = "/api/v1/courses/{id}",
    params(("id" = String, Path, description = "Course id")),
    request_body = CourseUpdate,
    responses(
        (status = 200, description = "Updated course", body = CourseResponse),
        (status = 400, description = "Invalid request or duplicate code", body = Error),
        (status = 401, description = "Unauthorised", body = Error),
        (status = 403, description = "Forbidden", body = Error),
        (status = 404, description = "Not found", body = Error),
        (status = 409, description = "Course changed concurrently", body = Error)
    ),
    tags = ["courses"],
    operation_id = "updateCourse"
)]
#[put("/courses/{id}")]
pub async fn update_course(
    state: web::Data<HttpState>,
    caller: Authenticated,
    path: web::Path<String>,
    payload: web::Json<CourseUpdate>,
) -> ApiResult<web::Json<CourseResponse>> {
    let id = course_id(&path)?;
    let course = state
        .courses
        .update(caller.principal(), id, payload.into_inner())
        .await?;
    Ok(web::Json(course.into()))
}

/// Delete a course with an empty roster. Admin only.
#[utoipa::path(
    delete,
    path = "/api/v1/courses/{id}",
    params(("id" = String, Path, description = "Course id")),
    responses(
        (status = 204, description = "Deleted"),
        (status = 400, description = "Students still enrolled", body = Error),
        (status = 401, description = "Unauthorised", body = Error),
        (status = 403, description = "Forbidden", body = Error),
        (status = 404, description = "Not found", body = Error)
    ),
    tags = ["courses"],
    operation_id = "deleteCourse"
)]
#[delete("/courses/{id}")]
pub async fn delete_course(
    state: web::Data<HttpState>,
    caller: Authenticated,
    path: web::Path<String>,
) -> ApiResult<HttpResponse> {
    let id = course_id(&path)?;
    state.courses.delete(caller.principal(), id).await?;
    Ok(HttpResponse::NoContent().finish())
}

/// Enroll the calling student. Students only.
#[utoipa::path(
    post,
    path = "/api/v1/courses/{id}/enroll",
    params(("id" = String, Path, description = "Course id")),
    responses(
        (status = 201, description = "Enrolled", body = RosterEntry),
        (status = 400, description = "Course full or already enrolled", body = Error),
        (status = 401, description = "Unauthorised", body = Error),
        (status = 403, description = "Caller is not a student", body = Error),
        (status = 404, description = "Not found", body = Error),
        (status = 409, description = "Roster changed concurrently", body = Error)
    ),
    tags = ["courses"],
    operation_id = "selfEnroll"
)]
#[post("/courses/{id}/enroll")]
pub async fn self_enroll(
    state: web::Data<HttpState>,
    caller: Authenticated,
    path: web::Path<String>,
) -> ApiResult<HttpResponse> {
    let id = course_id(&path)?;
    let entry = state.enrollment.self_enroll(caller.principal(), id).await?;
    Ok(HttpResponse::Created().json(entry))
}

/// Request body for the grade endpoint.
#[derive(Debug, Deserialize, ToSchema)]
pub struct GradeRequest {
    /// One of `A+`, `A`, `B+`, `B`, `C+`, `C`, `D`, `F`, `I`, `W`.
    pub grade: String,
}

/// Overwrite a student's grade. Admin or assigned faculty.
#[utoipa::path(
    put,
    path = "/api/v1/courses/{id}/grade/{studentId}",
    params(
        ("id" = String, Path, description = "Course id"),
        ("studentId" = String, Path, description = "Student id")
    ),
    request_body = GradeRequest,
    responses(
        (status = 200, description = "Updated roster entry", body = RosterEntry),
        (status = 400, description = "Invalid grade or student not enrolled", body = Error),
        (status = 401, description = "Unauthorised", body = Error),
        (status = 403, description = "Forbidden", body = Error),
        (status = 404, description = "Not found", body = Error),
        (status = 409, description = "Roster changed concurrently", body = Error)
    ),
    tags = ["courses"],
    operation_id = "assignGrade"
)]
#[put("/courses/{id}/grade/{studentId}")]
pub async fn assign_grade(
    state: web::Data<HttpState>,
    caller: Authenticated,
    path: web::Path<(String, String)>,
    payload: web::Json<GradeRequest>,
) -> ApiResult<web::Json<RosterEntry>> {
    let (course, student) = roster_path(&path)?;
    let entry = state
        .enrollment
        .assign_grade(caller.principal(), course, student, &payload.grade)
        .await?;
    Ok(web::Json(entry))
}

/// Request body for the attendance endpoint.
#[derive(Debug, Deserialize, ToSchema)]
pub struct AttendanceRequest {
    pub present: bool,
}

/// Record one session for a student. Admin or assigned faculty.
#[utoipa::path(
    put,
    path = "/api/v1/courses/{id}/attendance/{studentId}",
    params(
        ("id" = String, Path, description = "Course id"),
        ("studentId" = String, Path, description = "Student id")
    ),
    request_body = AttendanceRequest,
    responses(
        (status = 200, description = "Updated roster entry", body = RosterEntry),
        (status = 400, description = "Student not enrolled", body = Error),
        (status = 401, description = "Unauthorised", body = Error),
        (status = 403, description = "Forbidden", body = Error),
        (status = 404, description = "Not found", body = Error),
        (status = 409, description = "Roster changed concurrently", body = Error)
    ),
    tags = ["courses"],
    operation_id = "recordAttendance"
)]
#[put("/courses/{id}/attendance/{studentId}")]
pub async fn record_attendance(
    state: web::Data<HttpState>,
    caller: Authenticated,
    path: web::Path<(String, String)>,
    payload: web::Json<AttendanceRequest>,
) -> ApiResult<web::Json<RosterEntry>> {
    let (course, student) = roster_path(&path)?;
    let entry = state
        .enrollment
        .record_attendance(caller.principal(), course, student, payload.present)
        .await?;
    Ok(web::Json(entry))
}

/// Add a faculty member to the course. Admin or faculty.
#[utoipa::path(
    post,
    path = "/api/v1/courses/{id}/faculty/{facultyId}",
    params(
        ("id" = String, Path, description = "Course id"),
        ("facultyId" = String, Path, description = "Faculty id")
    ),
    responses(
        (status = 200, description = "Updated course", body = CourseResponse),
        (status = 400, description = "Already assigned", body = Error),
        (status = 401, description = "Unauthorised", body = Error),
        (status = 403, description = "Forbidden", body = Error),
        (status = 404, description = "Not found", body = Error),
        (status = 409, description = "Course changed concurrently", body = Error)
    ),
    tags = ["courses"],
    operation_id = "assignFaculty"
)]
#[post("/courses/{id}/faculty/{facultyId}")]
pub async fn assign_faculty(
    state: web::Data<HttpState>,
    caller: Authenticated,
    path: web::Path<(String, String)>,
) -> ApiResult<web::Json<CourseResponse>> {
    let (course, faculty) = staffing_path(&path)?;
    let course = state
        .enrollment
        .assign_faculty(caller.principal(), course, faculty)
        .await?;
    Ok(web::Json(course.into()))
}

/// Remove a faculty member from the course. Admin or faculty.
#[utoipa::path(
    delete,
    path = "/api/v1/courses/{id}/faculty/{facultyId}",
    params(
        ("id" = String, Path, description = "Course id"),
        ("facultyId" = String, Path, description = "Faculty id")
    ),
    responses(
        (status = 200, description = "Updated course", body = CourseResponse),
        (status = 400, description = "Not assigned", body = Error),
        (status = 401, description = "Unauthorised", body = Error),
        (status = 403, description = "Forbidden", body = Error),
        (status = 404, description = "Not found", body = Error),
        (status = 409, description = "Course changed concurrently", body = Error)
    ),
    tags = ["courses"],
    operation_id = "removeFaculty"
)]
#[delete("/courses/{id}/faculty/{facultyId}")]
pub async fn remove_faculty(
    state: web::Data<HttpState>,
    caller: Authenticated,
    path: web::Path<(String, String)>,
) -> ApiResult<web::Json<CourseResponse>> {
    let (course, faculty) = staffing_path(&path)?;
    let course = state
        .enrollment
        .remove_faculty(caller.principal(), course, faculty)
        .await?;
    Ok(web::Json(course.into()))
}
