//! Authentication and credential handlers.
//!
//! ```text
//! POST /api/v1/auth/login {"username":"ada","password":"..."}
//! GET  /api/v1/auth/me
//! POST /api/v1/auth/password {"currentPassword":"...","newPassword":"..."}
//! POST /api/v1/auth/forgot-password {"email":"ada@example.edu"}
//! POST /api/v1/auth/reset-password {"token":"...","newPassword":"..."}
//! ```

use actix_web::{HttpResponse, get, post, web};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;
use utoipa::ToSchema;
use zeroize::Zeroizing;

use crate::domain::{Error, LoginCredentials, LoginValidationError};
use crate::inbound::http::ApiResult;
use crate::inbound::http::bearer::Authenticated;
use crate::inbound::http::state::HttpState;
use crate::inbound::http::users::IdentityResponse;
use crate::inbound::http::validation::{
    FieldName, missing_field_error, parse_email, parse_new_password,
};

/// Login request body for `POST /api/v1/auth/login`.
#[derive(Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest {
    pub username: String,
    #[schema(value_type = String, format = Password)]
    pub password: Zeroizing<String>,
}

impl TryFrom<&LoginRequest> for LoginCredentials {
    type Error = LoginValidationError;

    fn try_from(value: &LoginRequest) -> Result<Self, Self::Error> {
        Self::try_from_parts(&value.username, &value.password)
    }
}

fn map_login_validation_error(err: LoginValidationError) -> Error {
    match err {
        LoginValidationError::EmptyUsername => Error::invalid_request("username must not be empty")
            .with_details(json!({ "field": "username", "code": "empty_username" })),
        LoginValidationError::EmptyPassword => Error::invalid_request("password must not be empty")
            .with_details(json!({ "field": "password", "code": "empty_password" })),
    }
}

/// Successful login.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    /// Bearer token for the `Authorization` header.
    pub token: String,
    pub expires_at: DateTime<Utc>,
    pub identity: IdentityResponse,
}

/// Authenticate and issue a bearer token.
///
/// Five consecutive failures lock the account for an hour; while locked,
/// every attempt fails with `account_locked`.
#[utoipa::path(
    post,
    path = "/api/v1/auth/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login success", body = LoginResponse),
        (status = 400, description = "Invalid request", body = Error),
        (status = 401, description = "Invalid credentials or account locked", body = Error)
    ),
    tags = ["auth"],
    operation_id = "login",
    security([])
)]
#[post("/auth/login")]
pub async fn login(
    state: web::Data<HttpState>,
    payload: web::Json<LoginRequest>,
) -> ApiResult<web::Json<LoginResponse>> {
    let credentials =
        LoginCredentials::try_from(&payload.into_inner()).map_err(map_login_validation_error)?;
    let outcome = state.login.authenticate(&credentials).await?;
    Ok(web::Json(LoginResponse {
        token: outcome.token.token,
        expires_at: outcome.token.expires_at,
        identity: outcome.identity.into(),
    }))
}

/// The authenticated caller's identity.
#[utoipa::path(
    get,
    path = "/api/v1/auth/me",
    responses(
        (status = 200, description = "Current identity", body = IdentityResponse),
        (status = 401, description = "Unauthorised", body = Error)
    ),
    tags = ["auth"],
    operation_id = "currentIdentity"
)]
#[get("/auth/me")]
pub async fn me(
    state: web::Data<HttpState>,
    caller: Authenticated,
) -> ApiResult<web::Json<IdentityResponse>> {
    let identity = state.accounts.me(caller.principal()).await?;
    Ok(web::Json(identity.into()))
}

/// Request body for `POST /api/v1/auth/password`.
#[derive(Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ChangePasswordRequest {
    #[schema(value_type = String, format = Password)]
    pub current_password: Zeroizing<String>,
    #[schema(value_type = String, format = Password)]
    pub new_password: Zeroizing<String>,
}

/// Replace the caller's password.
#[utoipa::path(
    post,
    path = "/api/v1/auth/password",
    request_body = ChangePasswordRequest,
    responses(
        (status = 204, description = "Password changed"),
        (status = 400, description = "New password too weak", body = Error),
        (status = 401, description = "Current password wrong or not logged in", body = Error)
    ),
    tags = ["auth"],
    operation_id = "changePassword"
)]
#[post("/auth/password")]
pub async fn change_password(
    state: web::Data<HttpState>,
    caller: Authenticated,
    payload: web::Json<ChangePasswordRequest>,
) -> ApiResult<HttpResponse> {
    if payload.current_password.is_empty() {
        return Err(missing_field_error(FieldName::new("currentPassword")));
    }
    let new_password = parse_new_password(&payload.new_password, FieldName::new("newPassword"))?;
    state
        .accounts
        .change_password(caller.principal(), &payload.current_password, new_password)
        .await?;
    Ok(HttpResponse::NoContent().finish())
}

/// Request body for `POST /api/v1/auth/forgot-password`.
#[derive(Debug, Deserialize, ToSchema)]
pub struct ForgotPasswordRequest {
    pub email: String,
}

/// Mail a password-reset token.
///
/// Always answers 202 for a well-formed address so the endpoint cannot be
/// used to discover registered emails.
#[utoipa::path(
    post,
    path = "/api/v1/auth/forgot-password",
    request_body = ForgotPasswordRequest,
    responses(
        (status = 202, description = "Reset mail queued if the address is registered"),
        (status = 400, description = "Malformed email", body = Error),
        (status = 500, description = "Mail delivery failed", body = Error)
    ),
    tags = ["auth"],
    operation_id = "forgotPassword",
    security([])
)]
#[post("/auth/forgot-password")]
pub async fn forgot_password(
    state: web::Data<HttpState>,
    payload: web::Json<ForgotPasswordRequest>,
) -> ApiResult<HttpResponse> {
    let email = parse_email(&payload.email, FieldName::new("email"))?;
    state.accounts.request_password_reset(&email).await?;
    Ok(HttpResponse::Accepted().finish())
}

/// Request body for `POST /api/v1/auth/reset-password`.
#[derive(Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ResetPasswordRequest {
    #[schema(value_type = String)]
    pub token: Zeroizing<String>,
    #[schema(value_type = String, format = Password)]
    pub new_password: Zeroizing<String>,
}

/// Set a new password with an emailed reset token.
#[utoipa::path(
    post,
    path = "/api/v1/auth/reset-password",
    request_body = ResetPasswordRequest,
    responses(
        (status = 204, description = "Password reset"),
        (status = 400, description = "Token invalid or expired, or password too weak", body = Error)
    ),
    tags = ["auth"],
    operation_id = "resetPassword",
    security([])
)]
#[post("/auth/reset-password")]
pub async fn reset_password(
    state: web::Data<HttpState>,
    payload: web::Json<ResetPasswordRequest>,
) -> ApiResult<HttpResponse> {
    let token = payload.token.trim();
    if token.is_empty() {
        return Err(missing_field_error(FieldName::new("token")));
    }
    let new_password = parse_new_password(&payload.new_password, FieldName::new("newPassword"))?;
    state.accounts.reset_password(token, new_password).await?;
    Ok(HttpResponse::NoContent().finish())
}
