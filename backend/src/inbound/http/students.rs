//! Student profile handlers.
//!
//! ```text
//! GET    /api/v1/students?branch=CSE&semester=3&sort=cgpa&order=desc
//! POST   /api/v1/students {"username":"ada","password":"...","rollNumber":"CS21001",...}
//! GET    /api/v1/students/{id}
//! PUT    /api/v1/students/{id} {"academic":{...}}
//! DELETE /api/v1/students/{id}
//! GET    /api/v1/students/{id}/courses
//! POST   /api/v1/students/{id}/courses/{courseId}
//! DELETE /api/v1/students/{id}/courses/{courseId}
//! ```

use actix_web::{HttpResponse, delete, get, post, put, web};
use serde::Deserialize;
use utoipa::{IntoParams, ToSchema};
use zeroize::Zeroizing;

use crate::domain::ports::{StudentCourse, StudentQuery, StudentRegistration, StudentSortField};
use crate::domain::{CourseId, Error, RosterEntry, Student, StudentDraft, StudentId, StudentUpdate};
use crate::inbound::http::ApiResult;
use crate::inbound::http::bearer::Authenticated;
use crate::inbound::http::listing::{ListParams, PageResponse, filter_text};
use crate::inbound::http::state::HttpState;
use crate::inbound::http::validation::{
    FieldName, parse_id, parse_new_password, parse_username,
};

const SORT_FIELDS: &[(&str, StudentSortField)] = &[
    ("rollNumber", StudentSortField::RollNumber),
    ("lastName", StudentSortField::LastName),
    ("semester", StudentSortField::Semester),
    ("cgpa", StudentSortField::Cgpa),
    ("createdAt", StudentSortField::CreatedAt),
];

/// Filters specific to student listings.
#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct StudentFilters {
    pub branch: Option<String>,
    pub semester: Option<u8>,
    pub batch: Option<String>,
    pub section: Option<String>,
    pub active: Option<bool>,
}

fn student_query(filters: StudentFilters, list: &ListParams) -> Result<StudentQuery, Error> {
    Ok(StudentQuery {
        branch: filter_text(filters.branch),
        semester: filters.semester,
        batch: filter_text(filters.batch),
        section: filter_text(filters.section),
        active: filters.active,
        search: list.search(),
        sort: list.sort(SORT_FIELDS)?,
        page: list.page()?,
    })
}

/// Request body for `POST /api/v1/students`: login credentials plus the
/// profile fields.
#[derive(Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateStudentRequest {
    pub username: String,
    #[schema(value_type = String, format = Password)]
    pub password: Zeroizing<String>,
    #[serde(flatten)]
    pub profile: StudentDraft,
}

impl TryFrom<CreateStudentRequest> for StudentRegistration {
    type Error = Error;

    fn try_from(value: CreateStudentRequest) -> Result<Self, Self::Error> {
        Ok(Self {
            username: parse_username(&value.username)?,
            password: parse_new_password(&value.password, FieldName::new("password"))?,
            profile: value.profile,
        })
    }
}

fn student_id(raw: &str) -> Result<StudentId, Error> {
    parse_id(raw, FieldName::new("id"))
}

/// List students. Admin or faculty.
#[utoipa::path(
    get,
    path = "/api/v1/students",
    params(ListParams, StudentFilters),
    responses(
        (status = 200, description = "One page of students", body = PageResponse<Student>),
        (status = 400, description = "Invalid query", body = Error),
        (status = 401, description = "Unauthorised", body = Error),
        (status = 403, description = "Forbidden", body = Error)
    ),
    tags = ["students"],
    operation_id = "listStudents"
)]
#[get("/students")]
pub async fn list_students(
    state: web::Data<HttpState>,
    caller: Authenticated,
    list: web::Query<ListParams>,
    filters: web::Query<StudentFilters>,
) -> ApiResult<web::Json<PageResponse<Student>>> {
    let query = student_query(filters.into_inner(), &list)?;
    let page = state.students.list(caller.principal(), &query).await?;
    Ok(web::Json(PageResponse::from_page(page, |student| student)))
}

/// Create a student profile together with its login. Admin only.
#[utoipa::path(
    post,
    path = "/api/v1/students",
    request_body = CreateStudentRequest,
    responses(
        (status = 201, description = "Student created", body = Student),
        (status = 400, description = "Invalid request or duplicate", body = Error),
        (status = 401, description = "Unauthorised", body = Error),
        (status = 403, description = "Forbidden", body = Error)
    ),
    tags = ["students"],
    operation_id = "createStudent"
)]
#[post("/students")]
pub async fn create_student(
    state: web::Data<HttpState>,
    caller: Authenticated,
    payload: web::Json<CreateStudentRequest>,
) -> ApiResult<HttpResponse> {
    let registration = StudentRegistration::try_from(payload.into_inner())?;
    let student = state
        .students
        .create(caller.principal(), registration)
        .await?;
    Ok(HttpResponse::Created().json(student))
}

/// Fetch one student. Staff, or the student themselves.
#[utoipa::path(
    get,
    path = "/api/v1/students/{id}",
    params(("id" = String, Path, description = "Student id")),
    responses(
        (status = 200, description = "Student", body = Student),
        (status = 401, description = "Unauthorised", body = Error),
        (status = 403, description = "Forbidden", body = Error),
        (status = 404, description = "Not found", body = Error)
    ),
    tags = ["students"],
    operation_id = "getStudent"
)]
#[get("/students/{id}")]
pub async fn get_student(
    state: web::Data<HttpState>,
    caller: Authenticated,
    path: web::Path<String>,
) -> ApiResult<web::Json<Student>> {
    let id = student_id(&path)?;
    let student = state.students.get(caller.principal(), id).await?;
    Ok(web::Json(student))
}

/// Update a student profile.
///
/// Admins may change anything; a student may edit their own contact
/// details, guardians, and documents.
#[utoipa::path(
    put,
    path = "/api/v1/students/{id}",
    params(("id" = String, Path, description = "Student id")),
    request_body = StudentUpdate,
    responses(
        (status = 200, description = "Updated student", body = Student),
        (status = 400, description = "Invalid request or duplicate", body = Error),
        (status = 401, description = "Unauthorised", body = Error),
        (status = 403, description = "Forbidden", body = Error),
        (status = 404, description = "Not found", body = Error)
    ),
    tags = ["students"],
    operation_id = "updateStudent"
)]
#[put("/students/{id}")]
pub async fn update_student(
    state: web::Data<HttpState>,
    caller: Authenticated,
    path: web::Path<String>,
    payload: web::Json<StudentUpdate>,
) -> ApiResult<web::Json<Student>> {
    let id = student_id(&path)?;
    let student = state
        .students
        .update(caller.principal(), id, payload.into_inner())
        .await?;
    Ok(web::Json(student))
}

/// Delete a student, their roster entries, and their login. Admin only.
#[utoipa::path(
    delete,
    path = "/api/v1/students/{id}",
    params(("id" = String, Path, description = "Student id")),
    responses(
        (status = 204, description = "Deleted"),
        (status = 401, description = "Unauthorised", body = Error),
        (status = 403, description = "Forbidden", body = Error),
        (status = 404, description = "Not found", body = Error)
    ),
    tags = ["students"],
    operation_id = "deleteStudent"
)]
#[delete("/students/{id}")]
pub async fn delete_student(
    state: web::Data<HttpState>,
    caller: Authenticated,
    path: web::Path<String>,
) -> ApiResult<HttpResponse> {
    let id = student_id(&path)?;
    state.students.delete(caller.principal(), id).await?;
    Ok(HttpResponse::NoContent().finish())
}

/// Courses the student is enrolled in, with grade and attendance.
#[utoipa::path(
    get,
    path = "/api/v1/students/{id}/courses",
    params(("id" = String, Path, description = "Student id")),
    responses(
        (status = 200, description = "Enrolled courses", body = [StudentCourse]),
        (status = 401, description = "Unauthorised", body = Error),
        (status = 403, description = "Forbidden", body = Error),
        (status = 404, description = "Not found", body = Error)
    ),
    tags = ["students"],
    operation_id = "listStudentCourses"
)]
#[get("/students/{id}/courses")]
pub async fn student_courses(
    state: web::Data<HttpState>,
    caller: Authenticated,
    path: web::Path<String>,
) -> ApiResult<web::Json<Vec<StudentCourse>>> {
    let id = student_id(&path)?;
    let courses = state.students.courses(caller.principal(), id).await?;
    Ok(web::Json(courses))
}

fn enrollment_path(path: &(String, String)) -> Result<(StudentId, CourseId), Error> {
    let student = student_id(&path.0)?;
    let course = parse_id(&path.1, FieldName::new("courseId"))?;
    Ok((student, course))
}

/// Enroll a student on a course. Admin or faculty.
#[utoipa::path(
    post,
    path = "/api/v1/students/{id}/courses/{courseId}",
    params(
        ("id" = String, Path, description = "Student id"),
        ("courseId" = String, Path, description = "Course id")
    ),
    responses(
        (status = 201, description = "Enrolled", body = RosterEntry),
        (status = 400, description = "Course full, inactive, or already enrolled", body = Error),
        (status = 401, description = "Unauthorised", body = Error),
        (status = 403, description = "Forbidden", body = Error),
        (status = 404, description = "Not found", body = Error),
        (status = 409, description = "Roster changed concurrently", body = Error)
    ),
    tags = ["students"],
    operation_id = "enrollStudent"
)]
#[post("/students/{id}/courses/{courseId}")]
pub async fn enroll_student(
    state: web::Data<HttpState>,
    caller: Authenticated,
    path: web::Path<(String, String)>,
) -> ApiResult<HttpResponse> {
    let (student, course) = enrollment_path(&path)?;
    let entry = state
        .enrollment
        .enroll(caller.principal(), course, student)
        .await?;
    Ok(HttpResponse::Created().json(entry))
}

/// Remove a student from a course roster. Admin or faculty.
#[utoipa::path(
    delete,
    path = "/api/v1/students/{id}/courses/{courseId}",
    params(
        ("id" = String, Path, description = "Student id"),
        ("courseId" = String, Path, description = "Course id")
    ),
    responses(
        (status = 204, description = "Unenrolled"),
        (status = 400, description = "Student not enrolled", body = Error),
        (status = 401, description = "Unauthorised", body = Error),
        (status = 403, description = "Forbidden", body = Error),
        (status = 404, description = "Not found", body = Error),
        (status = 409, description = "Roster changed concurrently", body = Error)
    ),
    tags = ["students"],
    operation_id = "unenrollStudent"
)]
#[delete("/students/{id}/courses/{courseId}")]
pub async fn unenroll_student(
    state: web::Data<HttpState>,
    caller: Authenticated,
    path: web::Path<(String, String)>,
) -> ApiResult<HttpResponse> {
    let (student, course) = enrollment_path(&path)?;
    state
        .enrollment
        .unenroll(caller.principal(), course, student)
        .await?;
    Ok(HttpResponse::NoContent().finish())
}
