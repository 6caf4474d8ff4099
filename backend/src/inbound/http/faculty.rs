//! Faculty profile handlers.
//!
//! ```text
//! GET    /api/v1/faculty?department=Physics&position=lecturer
//! POST   /api/v1/faculty {"username":"turing","password":"...","employeeId":"EMP001",...}
//! GET    /api/v1/faculty/{id}
//! PUT    /api/v1/faculty/{id} {"officeHours":[...]}
//! DELETE /api/v1/faculty/{id}
//! ```

use actix_web::{HttpResponse, delete, get, post, put, web};
use serde::Deserialize;
use utoipa::{IntoParams, ToSchema};
use zeroize::Zeroizing;

use crate::domain::ports::{FacultyQuery, FacultyRegistration, FacultySortField};
use crate::domain::{Error, Faculty, FacultyDraft, FacultyId, FacultyUpdate, Position};
use crate::inbound::http::ApiResult;
use crate::inbound::http::bearer::Authenticated;
use crate::inbound::http::listing::{ListParams, PageResponse, filter_text};
use crate::inbound::http::state::HttpState;
use crate::inbound::http::validation::{
    FieldName, invalid_value_error, parse_id, parse_new_password, parse_username,
};

const SORT_FIELDS: &[(&str, FacultySortField)] = &[
    ("employeeId", FacultySortField::EmployeeId),
    ("lastName", FacultySortField::LastName),
    ("department", FacultySortField::Department),
    ("joinDate", FacultySortField::JoinDate),
];

/// Filters specific to faculty listings.
#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct FacultyFilters {
    pub department: Option<String>,
    /// `professor`, `associate_professor`, `assistant_professor`,
    /// `lecturer`, or `visiting_faculty`.
    pub position: Option<String>,
    pub active: Option<bool>,
}

fn faculty_query(filters: FacultyFilters, list: &ListParams) -> Result<FacultyQuery, Error> {
    let position = filter_text(filters.position)
        .map(|raw| {
            Position::parse(&raw.to_lowercase()).ok_or_else(|| {
                invalid_value_error(FieldName::new("position"), &raw, "unknown position")
            })
        })
        .transpose()?;
    Ok(FacultyQuery {
        department: filter_text(filters.department),
        position,
        active: filters.active,
        search: list.search(),
        sort: list.sort(SORT_FIELDS)?,
        page: list.page()?,
    })
}

/// Request body for `POST /api/v1/faculty`: login credentials plus the
/// profile fields.
#[derive(Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateFacultyRequest {
    pub username: String,
    #[schema(value_type = String, format = Password)]
    pub password: Zeroizing<String>,
    #[serde(flatten)]
    pub profile: FacultyDraft,
}

impl TryFrom<CreateFacultyRequest> for FacultyRegistration {
    type Error = Error;

    fn try_from(value: CreateFacultyRequest) -> Result<Self, Self::Error> {
        Ok(Self {
            username: parse_username(&value.username)?,
            password: parse_new_password(&value.password, FieldName::new("password"))?,
            profile: value.profile,
        })
    }
}

fn faculty_id(raw: &str) -> Result<FacultyId, Error> {
    parse_id(raw, FieldName::new("id"))
}

/// List faculty. Any authenticated caller.
#[utoipa::path(
    get,
    path = "/api/v1/faculty",
    params(ListParams, FacultyFilters),
    responses(
        (status = 200, description = "One page of faculty", body = PageResponse<Faculty>),
        (status = 400, description = "Invalid query", body = Error),
        (status = 401, description = "Unauthorised", body = Error)
    ),
    tags = ["faculty"],
    operation_id = "listFaculty"
)]
#[get("/faculty")]
pub async fn list_faculty(
    state: web::Data<HttpState>,
    caller: Authenticated,
    list: web::Query<ListParams>,
    filters: web::Query<FacultyFilters>,
) -> ApiResult<web::Json<PageResponse<Faculty>>> {
    let query = faculty_query(filters.into_inner(), &list)?;
    let page = state.faculty.list(caller.principal(), &query).await?;
    Ok(web::Json(PageResponse::from_page(page, |member| member)))
}

/// Create a faculty profile together with its login. Admin only.
#[utoipa::path(
    post,
    path = "/api/v1/faculty",
    request_body = CreateFacultyRequest,
    responses(
        (status = 201, description = "Faculty created", body = Faculty),
        (status = 400, description = "Invalid request or duplicate", body = Error),
        (status = 401, description = "Unauthorised", body = Error),
        (status = 403, description = "Forbidden", body = Error)
    ),
    tags = ["faculty"],
    operation_id = "createFaculty"
)]
#[post("/faculty")]
pub async fn create_faculty(
    state: web::Data<HttpState>,
    caller: Authenticated,
    payload: web::Json<CreateFacultyRequest>,
) -> ApiResult<HttpResponse> {
    let registration = FacultyRegistration::try_from(payload.into_inner())?;
    let member = state
        .faculty
        .create(caller.principal(), registration)
        .await?;
    Ok(HttpResponse::Created().json(member))
}

#[utoipa::path(
    get,
    path = "/api/v1/faculty/{id}",
    params(("id" = String, Path, description = "Faculty id")),
    responses(
        (status = 200, description = "Faculty member", body = Faculty),
        (status = 401, description = "Unauthorised", body = Error),
        (status = 404, description = "Not found", body = Error)
    ),
    tags = ["faculty"],
    operation_id = "getFaculty"
)]
#[get("/faculty/{id}")]
pub async fn get_faculty(
    state: web::Data<HttpState>,
    caller: Authenticated,
    path: web::Path<String>,
) -> ApiResult<web::Json<Faculty>> {
    let id = faculty_id(&path)?;
    let member = state.faculty.get(caller.principal(), id).await?;
    Ok(web::Json(member))
}

/// Update a faculty profile.
///
/// Admins may change anything; a faculty member may edit their own contact
/// details, research fields, and office hours.
#[utoipa::path(
    put,
    path = "/api/v1/faculty/{id}",
    params(("id" = String, Path, description = "Faculty id")),
    request_body = FacultyUpdate,
    responses(
        (status = 200, description = "Updated faculty member", body = Faculty),
        (status = 400, description = "Invalid request or duplicate", body = Error),
        (status = 401, description = "Unauthorised", body = Error),
        (status = 403, description = "Forbidden", body = Error),
        (status = 404, description = "Not found", body = Error)
    ),
    tags = ["faculty"],
    operation_id = "updateFaculty"
)]
#[put("/faculty/{id}")]
pub async fn update_faculty(
    state: web::Data<HttpState>,
    caller: Authenticated,
    path: web::Path<String>,
    payload: web::Json<FacultyUpdate>,
) -> ApiResult<web::Json<Faculty>> {
    let id = faculty_id(&path)?;
    let member = state
        .faculty
        .update(caller.principal(), id, payload.into_inner())
        .await?;
    Ok(web::Json(member))
}

/// Delete a faculty member, detaching them from every course. Admin only.
#[utoipa::path(
    delete,
    path = "/api/v1/faculty/{id}",
    params(("id" = String, Path, description = "Faculty id")),
    responses(
        (status = 204, description = "Deleted"),
        (status = 401, description = "Unauthorised", body = Error),
        (status = 403, description = "Forbidden", body = Error),
        (status = 404, description = "Not found", body = Error)
    ),
    tags = ["faculty"],
    operation_id = "deleteFaculty"
)]
#[delete("/faculty/{id}")]
pub async fn delete_faculty(
    state: web::Data<HttpState>,
    caller: Authenticated,
    path: web::Path<String>,
) -> ApiResult<HttpResponse> {
    let id = faculty_id(&path)?;
    state.faculty.delete(caller.principal(), id).await?;
    Ok(HttpResponse::NoContent().finish())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn filters(position: &str) -> FacultyFilters {
        FacultyFilters {
            position: Some(position.to_owned()),
            ..FacultyFilters::default()
        }
    }

    #[rstest]
    #[case("lecturer", Position::Lecturer)]
    #[case(" Associate_Professor ", Position::AssociateProfessor)]
    fn positions_parse_case_insensitively(#[case] raw: &str, #[case] expected: Position) {
        let query = faculty_query(filters(raw), &ListParams::default()).expect("query");
        assert_eq!(query.position, Some(expected));
    }

    #[rstest]
    fn unknown_positions_are_rejected() {
        let err = faculty_query(filters("dean"), &ListParams::default()).expect_err("invalid");
        let details = err.details().expect("details");
        assert_eq!(details["field"], "position");
        assert_eq!(details["value"], "dean");
    }

    #[rstest]
    fn sort_defaults_to_employee_id() {
        let query = faculty_query(FacultyFilters::default(), &ListParams::default())
            .expect("query");
        assert_eq!(query.sort.field, FacultySortField::EmployeeId);
    }
}
