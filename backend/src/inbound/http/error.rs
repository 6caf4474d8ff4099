//! HTTP adapter mapping for domain errors.
//!
//! The domain error stays transport agnostic; this module picks the status
//! code for each [`ErrorCode`] and hides collaborator failures from clients.

use actix_web::{HttpResponse, ResponseError, http::StatusCode};
use tracing::{error, warn};

use crate::domain::{Error, ErrorCode, TRACE_ID_HEADER};

/// Convenient result alias for HTTP handlers.
pub type ApiResult<T> = Result<T, Error>;

fn status_for(code: ErrorCode) -> StatusCode {
    match code {
        ErrorCode::InvalidRequest
        | ErrorCode::Duplicate
        | ErrorCode::CourseFull
        | ErrorCode::AlreadyEnrolled
        | ErrorCode::NotEnrolled
        | ErrorCode::HasEnrollments
        | ErrorCode::InvalidGrade
        | ErrorCode::AlreadyAssigned
        | ErrorCode::NotAssigned => StatusCode::BAD_REQUEST,
        ErrorCode::Unauthorized | ErrorCode::AccountLocked => StatusCode::UNAUTHORIZED,
        ErrorCode::Forbidden => StatusCode::FORBIDDEN,
        ErrorCode::NotFound => StatusCode::NOT_FOUND,
        ErrorCode::ConcurrentModification => StatusCode::CONFLICT,
        ErrorCode::DependencyFailure | ErrorCode::InternalError => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

/// Replace the message of a redacted error, keeping only its code and
/// trace id.
fn redact(error: &Error) -> Error {
    if !error.is_redacted() {
        return error.clone();
    }
    error!(
        code = ?error.code(),
        message = error.message(),
        trace_id = error.trace_id(),
        "request failed inside a collaborator"
    );
    let message = match error.code() {
        ErrorCode::DependencyFailure => "A required service is unavailable",
        _ => "Internal server error",
    };
    let mut redacted = Error::new(error.code(), message);
    if let Some(id) = error.trace_id() {
        redacted = redacted.with_trace_id(id.to_owned());
    }
    redacted
}

impl ResponseError for Error {
    fn status_code(&self) -> StatusCode {
        status_for(self.code())
    }

    fn error_response(&self) -> HttpResponse {
        let mut builder = HttpResponse::build(self.status_code());
        if let Some(id) = self.trace_id() {
            builder.insert_header((TRACE_ID_HEADER, id.to_owned()));
        }

        builder.json(redact(self))
    }
}

impl From<actix_web::Error> for Error {
    fn from(err: actix_web::Error) -> Self {
        error!(error = %err, "actix error promoted to domain error");
        Error::internal("Internal server error")
    }
}

/// Turn body and query deserialisation failures into the JSON envelope.
pub fn json_error_handler(
    err: actix_web::error::JsonPayloadError,
    _req: &actix_web::HttpRequest,
) -> actix_web::Error {
    warn!(error = %err, "rejected request body");
    Error::invalid_request(format!("invalid request body: {err}")).into()
}

/// Query-string counterpart of [`json_error_handler`].
pub fn query_error_handler(
    err: actix_web::error::QueryPayloadError,
    _req: &actix_web::HttpRequest,
) -> actix_web::Error {
    Error::invalid_request(format!("invalid query string: {err}")).into()
}

#[cfg(test)]
mod tests;
