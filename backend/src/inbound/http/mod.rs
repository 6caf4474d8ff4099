//! HTTP inbound adapter exposing the REST API under `/api/v1`.
//!
//! Handlers parse and validate transport input, call one driving port from
//! [`state::HttpState`], and map the result back to JSON. Authorisation
//! decisions stay in the domain services.

pub mod auth;
pub mod bearer;
pub mod courses;
pub mod error;
pub mod faculty;
pub mod health;
pub mod listing;
pub mod state;
pub mod students;
#[cfg(test)]
pub mod test_utils;
pub mod users;
pub mod validation;

pub use error::ApiResult;

use actix_web::dev::{ServiceFactory, ServiceRequest, ServiceResponse};
use actix_web::{App, HttpResponse, web};

use crate::domain::Error;
use crate::middleware::Trace;

use self::error::{json_error_handler, query_error_handler};
use self::health::{HealthState, live, ready};
use self::state::HttpState;

/// Register every API handler on `cfg`. Mount under `/api/v1`.
///
/// Health probes are registered separately so they can be served without
/// the domain services.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(auth::login)
        .service(auth::me)
        .service(auth::change_password)
        .service(auth::forgot_password)
        .service(auth::reset_password)
        .service(users::list_users)
        .service(users::create_user)
        .service(users::get_user)
        .service(users::update_user)
        .service(users::delete_user)
        .service(students::list_students)
        .service(students::create_student)
        .service(students::student_courses)
        .service(students::enroll_student)
        .service(students::unenroll_student)
        .service(students::get_student)
        .service(students::update_student)
        .service(students::delete_student)
        .service(faculty::list_faculty)
        .service(faculty::create_faculty)
        .service(faculty::get_faculty)
        .service(faculty::update_faculty)
        .service(faculty::delete_faculty)
        .service(courses::list_courses)
        .service(courses::create_course)
        .service(courses::self_enroll)
        .service(courses::assign_grade)
        .service(courses::record_attendance)
        .service(courses::assign_faculty)
        .service(courses::remove_faculty)
        .service(courses::get_course)
        .service(courses::update_course)
        .service(courses::delete_course);
}

async fn route_not_found() -> ApiResult<HttpResponse> {
    Err(Error::not_found("no such route"))
}

/// Assemble the application: JSON error envelopes for malformed bodies and
/// query strings, the trace middleware, and every route under `/api/v1`.
///
/// The server adds metrics and Swagger UI on top; tests use it as is.
pub fn build_app(
    http_state: web::Data<HttpState>,
    health_state: web::Data<HealthState>,
) -> App<
    impl ServiceFactory<
        ServiceRequest,
        Config = (),
        Response = ServiceResponse,
        Error = actix_web::Error,
        InitError = (),
    >,
> {
    let api = web::scope("/api/v1")
        .service(ready)
        .service(live)
        .configure(configure);

    App::new()
        .app_data(http_state)
        .app_data(health_state)
        .app_data(web::JsonConfig::default().error_handler(json_error_handler))
        .app_data(web::QueryConfig::default().error_handler(query_error_handler))
        .wrap(Trace)
        .service(api)
        .default_service(web::to(route_not_found))
}
