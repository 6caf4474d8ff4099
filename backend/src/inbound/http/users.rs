//! Identity management handlers.
//!
//! ```text
//! GET    /api/v1/users?role=faculty&active=true&search=ada
//! POST   /api/v1/users {"username":"registrar","email":"r@example.edu","password":"..."}
//! GET    /api/v1/users/{id}
//! PUT    /api/v1/users/{id} {"active":false}
//! DELETE /api/v1/users/{id}
//! ```

use actix_web::{HttpResponse, delete, get, post, put, web};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::domain::ports::{AdminRegistration, IdentityQuery, IdentitySortField, IdentityUpdate};
use crate::domain::{Error, Identity, IdentityId, ProfileRef, Role};
use crate::inbound::http::ApiResult;
use crate::inbound::http::bearer::Authenticated;
use crate::inbound::http::listing::{ListParams, PageResponse};
use crate::inbound::http::state::HttpState;
use crate::inbound::http::validation::{
    FieldName, invalid_value_error, parse_email, parse_id, parse_new_password, parse_username,
};

const SORT_FIELDS: &[(&str, IdentitySortField)] = &[
    ("username", IdentitySortField::Username),
    ("email", IdentitySortField::Email),
    ("createdAt", IdentitySortField::CreatedAt),
];

/// Public view of a login identity. Credential and reset state stay
/// server-side.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct IdentityResponse {
    #[schema(value_type = String, format = Uuid)]
    pub id: IdentityId,
    pub username: String,
    pub email: String,
    pub role: Role,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub profile: Option<ProfileRef>,
    pub active: bool,
    pub verified: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub locked_until: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_login_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Identity> for IdentityResponse {
    fn from(identity: Identity) -> Self {
        Self {
            id: identity.id,
            username: identity.username.as_str().to_owned(),
            email: identity.email.as_str().to_owned(),
            role: identity.role,
            profile: identity.profile,
            active: identity.active,
            verified: identity.verified,
            locked_until: identity.lock_until,
            last_login_at: identity.last_login_at,
            created_at: identity.created_at,
            updated_at: identity.updated_at,
        }
    }
}

/// Filters specific to identity listings.
#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct IdentityFilters {
    /// `student`, `faculty`, or `admin`.
    pub role: Option<String>,
    pub active: Option<bool>,
}

fn identity_query(filters: IdentityFilters, list: &ListParams) -> Result<IdentityQuery, Error> {
    let role = filters
        .role
        .as_deref()
        .map(str::trim)
        .filter(|raw| !raw.is_empty())
        .map(|raw| {
            raw.to_lowercase()
                .parse::<Role>()
                .map_err(|err| invalid_value_error(FieldName::new("role"), raw, err.to_string()))
        })
        .transpose()?;
    Ok(IdentityQuery {
        role,
        active: filters.active,
        search: list.search(),
        sort: list.sort(SORT_FIELDS)?,
        page: list.page()?,
    })
}

/// Request body for `POST /api/v1/users`; always creates an admin.
#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateAdminRequest {
    pub username: String,
    pub email: String,
    pub password: String,
}

/// Request body for `PUT /api/v1/users/{id}`.
#[derive(Debug, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase", default)]
pub struct UpdateIdentityRequest {
    pub email: Option<String>,
    pub active: Option<bool>,
    pub verified: Option<bool>,
}

impl TryFrom<UpdateIdentityRequest> for IdentityUpdate {
    type Error = Error;

    fn try_from(value: UpdateIdentityRequest) -> Result<Self, Self::Error> {
        Ok(Self {
            email: value
                .email
                .as_deref()
                .map(|raw| parse_email(raw, FieldName::new("email")))
                .transpose()?,
            active: value.active,
            verified: value.verified,
        })
    }
}

fn identity_id(raw: &str) -> Result<IdentityId, Error> {
    parse_id(raw, FieldName::new("id"))
}

/// List identities. Admin only.
#[utoipa::path(
    get,
    path = "/api/v1/users",
    params(ListParams, IdentityFilters),
    responses(
        (status = 200, description = "One page of identities", body = PageResponse<IdentityResponse>),
        (status = 400, description = "Invalid query", body = Error),
        (status = 401, description = "Unauthorised", body = Error),
        (status = 403, description = "Forbidden", body = Error)
    ),
    tags = ["users"],
    operation_id = "listUsers"
)]
#[get("/users")]
pub async fn list_users(
    state: web::Data<HttpState>,
    caller: Authenticated,
    list: web::Query<ListParams>,
    filters: web::Query<IdentityFilters>,
) -> ApiResult<web::Json<PageResponse<IdentityResponse>>> {
    let query = identity_query(filters.into_inner(), &list)?;
    let page = state.accounts.list(caller.principal(), &query).await?;
    Ok(web::Json(PageResponse::from_page(page, IdentityResponse::from)))
}

/// Register another admin identity. Admin only.
#[utoipa::path(
    post,
    path = "/api/v1/users",
    request_body = CreateAdminRequest,
    responses(
        (status = 201, description = "Admin created", body = IdentityResponse),
        (status = 400, description = "Invalid request or duplicate", body = Error),
        (status = 401, description = "Unauthorised", body = Error),
        (status = 403, description = "Forbidden", body = Error)
    ),
    tags = ["users"],
    operation_id = "createUser"
)]
#[post("/users")]
pub async fn create_user(
    state: web::Data<HttpState>,
    caller: Authenticated,
    payload: web::Json<CreateAdminRequest>,
) -> ApiResult<HttpResponse> {
    let payload = payload.into_inner();
    let registration = AdminRegistration {
        username: parse_username(&payload.username)?,
        email: parse_email(&payload.email, FieldName::new("email"))?,
        password: parse_new_password(&payload.password, FieldName::new("password"))?,
    };
    let identity = state
        .accounts
        .register_admin(caller.principal(), registration)
        .await?;
    Ok(HttpResponse::Created().json(IdentityResponse::from(identity)))
}

/// Fetch one identity. Admins may read any; others only themselves.
#[utoipa::path(
    get,
    path = "/api/v1/users/{id}",
    params(("id" = String, Path, description = "Identity id")),
    responses(
        (status = 200, description = "Identity", body = IdentityResponse),
        (status = 401, description = "Unauthorised", body = Error),
        (status = 403, description = "Forbidden", body = Error),
        (status = 404, description = "Not found", body = Error)
    ),
    tags = ["users"],
    operation_id = "getUser"
)]
#[get("/users/{id}")]
pub async fn get_user(
    state: web::Data<HttpState>,
    caller: Authenticated,
    path: web::Path<String>,
) -> ApiResult<web::Json<IdentityResponse>> {
    let id = identity_id(&path)?;
    let identity = state.accounts.get(caller.principal(), id).await?;
    Ok(web::Json(identity.into()))
}

/// Update identity flags or email. Admin only.
#[utoipa::path(
    put,
    path = "/api/v1/users/{id}",
    params(("id" = String, Path, description = "Identity id")),
    request_body = UpdateIdentityRequest,
    responses(
        (status = 200, description = "Updated identity", body = IdentityResponse),
        (status = 400, description = "Invalid request", body = Error),
        (status = 401, description = "Unauthorised", body = Error),
        (status = 403, description = "Forbidden", body = Error),
        (status = 404, description = "Not found", body = Error)
    ),
    tags = ["users"],
    operation_id = "updateUser"
)]
#[put("/users/{id}")]
pub async fn update_user(
    state: web::Data<HttpState>,
    caller: Authenticated,
    path: web::Path<String>,
    payload: web::Json<UpdateIdentityRequest>,
) -> ApiResult<web::Json<IdentityResponse>> {
    let id = identity_id(&path)?;
    let update = IdentityUpdate::try_from(payload.into_inner())?;
    let identity = state
        .accounts
        .update(caller.principal(), id, update)
        .await?;
    Ok(web::Json(identity.into()))
}

/// Delete an identity with no linked profile. Admin only.
#[utoipa::path(
    delete,
    path = "/api/v1/users/{id}",
    params(("id" = String, Path, description = "Identity id")),
    responses(
        (status = 204, description = "Deleted"),
        (status = 400, description = "Identity is linked to a profile", body = Error),
        (status = 401, description = "Unauthorised", body = Error),
        (status = 403, description = "Forbidden", body = Error),
        (status = 404, description = "Not found", body = Error)
    ),
    tags = ["users"],
    operation_id = "deleteUser"
)]
#[delete("/users/{id}")]
pub async fn delete_user(
    state: web::Data<HttpState>,
    caller: Authenticated,
    path: web::Path<String>,
) -> ApiResult<HttpResponse> {
    let id = identity_id(&path)?;
    state.accounts.delete(caller.principal(), id).await?;
    Ok(HttpResponse::NoContent().finish())
}

#[cfg(test)]
mod tests;
