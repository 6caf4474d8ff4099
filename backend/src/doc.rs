//! OpenAPI documentation configuration.
//!
//! [`ApiDoc`] gathers every handler annotated with `#[utoipa::path]` plus the
//! request and response schemas, and adds the bearer security scheme. The
//! document is served by Swagger UI in debug builds and printed by the
//! `openapi-dump` binary.

use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};

use crate::domain::ports::{FacultySummary, StudentCourse, StudentSummary};
use crate::domain::{
    Course, CourseDraft, CourseUpdate, Error, ErrorCode, Faculty, FacultyUpdate, ProfileRef,
    RosterEntry, Role, Student, StudentUpdate,
};
use crate::inbound::http::auth::{
    ChangePasswordRequest, ForgotPasswordRequest, LoginRequest, LoginResponse,
    ResetPasswordRequest,
};
use crate::inbound::http::courses::{
    AttendanceRequest, CourseDetailsResponse, CourseResponse, GradeRequest,
};
use crate::inbound::http::faculty::CreateFacultyRequest;
use crate::inbound::http::students::CreateStudentRequest;
use crate::inbound::http::users::{CreateAdminRequest, IdentityResponse, UpdateIdentityRequest};

/// Name of the bearer security scheme referenced by handlers.
pub const BEARER_SCHEME: &str = "BearerAuth";

/// Enrich the generated document with the bearer token security scheme.
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi
            .components
            .get_or_insert_with(utoipa::openapi::Components::default);

        components.add_security_scheme(
            BEARER_SCHEME,
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .description(Some("Access token issued by POST /api/v1/auth/login."))
                    .build(),
            ),
        );
    }
}

/// OpenAPI document for the REST API.
#[derive(OpenApi)]
#[openapi(
    modifiers(&SecurityAddon),
    info(
        title = "Registrar API",
        description = "Student information management: identities, student and faculty \
                       profiles, the course catalogue, enrollment, and grading."
    ),
    servers(
        (url = "/", description = "Relative to the deployment base URL")
    ),
    security(("BearerAuth" = [])),
    paths(
        crate::inbound::http::auth::login,
        crate::inbound::http::auth::me,
        crate::inbound::http::auth::change_password,
        crate::inbound::http::auth::forgot_password,
        crate::inbound::http::auth::reset_password,
        crate::inbound::http::users::list_users,
        crate::inbound::http::users::create_user,
        crate::inbound::http::users::get_user,
        crate::inbound::http::users::update_user,
        crate::inbound::http::users::delete_user,
        crate::inbound::http::students::list_students,
        crate::inbound::http::students::create_student,
        crate::inbound::http::students::get_student,
        crate::inbound::http::students::update_student,
        crate::inbound::http::students::delete_student,
        crate::inbound::http::students::student_courses,
        crate::inbound::http::students::enroll_student,
        crate::inbound::http::students::unenroll_student,
        crate::inbound::http::faculty::list_faculty,
        crate::inbound::http::faculty::create_faculty,
        crate::inbound::http::faculty::get_faculty,
        crate::inbound::http::faculty::update_faculty,
        crate::inbound::http::faculty::delete_faculty,
        crate::inbound::http::courses::list_courses,
        crate::inbound::http::courses::create_course,
        crate::inbound::http::courses::get_course,
        crate::inbound::http::courses::update_course,
        crate::inbound::http::courses::delete_course,
        crate::inbound::http::courses::self_enroll,
        crate::inbound::http::courses::assign_grade,
        crate::inbound::http::courses::record_attendance,
        crate::inbound::http::courses::assign_faculty,
        crate::inbound::http::courses::remove_faculty,
        crate::inbound::http::health::ready,
        crate::inbound::http::health::live,
    ),
    components(schemas(
        Error,
        ErrorCode,
        Role,
        ProfileRef,
        LoginRequest,
        LoginResponse,
        ChangePasswordRequest,
        ForgotPasswordRequest,
        ResetPasswordRequest,
        IdentityResponse,
        CreateAdminRequest,
        UpdateIdentityRequest,
        Student,
        StudentUpdate,
        CreateStudentRequest,
        StudentCourse,
        Faculty,
        FacultyUpdate,
        CreateFacultyRequest,
        Course,
        CourseDraft,
        CourseUpdate,
        CourseResponse,
        CourseDetailsResponse,
        FacultySummary,
        StudentSummary,
        RosterEntry,
        GradeRequest,
        AttendanceRequest,
    )),
    tags(
        (name = "auth", description = "Login, current identity, and password management"),
        (name = "users", description = "Identity administration"),
        (name = "students", description = "Student profiles and their enrollments"),
        (name = "faculty", description = "Faculty profiles"),
        (name = "courses", description = "Course catalogue, enrollment, grading, and staffing"),
        (name = "health", description = "Endpoints for health checks")
    )
)]
pub struct ApiDoc;
