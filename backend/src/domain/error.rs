//! Domain-level error types.
//!
//! These errors are transport agnostic. Inbound adapters map them to HTTP
//! responses or any other protocol-specific envelope. Every error captures the
//! request trace identifier when one is in scope so payloads correlate with
//! logs automatically.

use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use utoipa::ToSchema;

use crate::domain::TraceId;

/// Stable machine-readable error code describing the failure category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[non_exhaustive]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    /// The request is malformed or fails validation.
    InvalidRequest,
    /// A unique field (username, email, roll number, code) is already taken.
    Duplicate,
    /// Authentication failed or is missing.
    Unauthorized,
    /// Credentials were rejected because the account is temporarily locked.
    AccountLocked,
    /// Authenticated but not permitted to perform this action.
    Forbidden,
    /// The requested resource does not exist.
    NotFound,
    /// The course roster has reached capacity.
    CourseFull,
    /// The student already appears in the course roster.
    AlreadyEnrolled,
    /// The student does not appear in the course roster.
    NotEnrolled,
    /// The course still has enrolled students.
    HasEnrollments,
    /// The grade literal is outside the canonical set.
    InvalidGrade,
    /// The faculty member already teaches the course.
    AlreadyAssigned,
    /// The faculty member does not teach the course.
    NotAssigned,
    /// A concurrent writer changed the record first.
    ConcurrentModification,
    /// A collaborator (database, mail relay) failed.
    DependencyFailure,
    /// An unexpected error occurred inside the domain.
    InternalError,
}

/// Domain error payload.
///
/// # Examples
/// ```
/// use registrar::domain::{Error, ErrorCode};
///
/// let err = Error::not_found("course not found");
/// assert_eq!(err.code(), ErrorCode::NotFound);
/// assert_eq!(err.message(), "course not found");
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Error {
    #[schema(example = "invalid_request")]
    code: ErrorCode,
    #[schema(example = "Something went wrong")]
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[schema(example = "3fa85f64-5717-4562-b3fc-2c963f66afa6")]
    trace_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<Value>,
}

impl Error {
    /// Create a new error, capturing the trace identifier in scope.
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            trace_id: TraceId::current().map(|id| id.to_string()),
            details: None,
        }
    }

    /// Stable machine-readable error code.
    pub fn code(&self) -> ErrorCode {
        self.code
    }

    /// Human-readable message returned to adapters.
    pub fn message(&self) -> &str {
        self.message.as_str()
    }

    /// Correlation identifier captured when the error was raised.
    pub fn trace_id(&self) -> Option<&str> {
        self.trace_id.as_deref()
    }

    /// Supplementary error details for adapters.
    pub fn details(&self) -> Option<&Value> {
        self.details.as_ref()
    }

    /// Attach a trace identifier to the error.
    pub fn with_trace_id(mut self, id: impl Into<String>) -> Self {
        self.trace_id = Some(id.into());
        self
    }

    /// Attach structured details to the error.
    ///
    /// # Examples
    /// ```
    /// use registrar::domain::Error;
    /// use serde_json::json;
    ///
    /// let err = Error::invalid_request("bad").with_details(json!({ "field": "name" }));
    /// assert!(err.details().is_some());
    /// ```
    pub fn with_details(mut self, details: Value) -> Self {
        self.details = Some(details);
        self
    }

    /// Convenience constructor for [`ErrorCode::InvalidRequest`].
    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InvalidRequest, message)
    }

    /// Convenience constructor for [`ErrorCode::Duplicate`] naming the field.
    pub fn duplicate(field: impl Into<String>) -> Self {
        let field = field.into();
        Self::new(ErrorCode::Duplicate, format!("{field} already exists"))
            .with_details(json!({ "field": field }))
    }

    /// Convenience constructor for [`ErrorCode::Unauthorized`].
    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::Unauthorized, message)
    }

    /// Convenience constructor for [`ErrorCode::AccountLocked`].
    pub fn account_locked(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::AccountLocked, message)
    }

    /// Convenience constructor for [`ErrorCode::Forbidden`].
    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::Forbidden, message)
    }

    /// Convenience constructor for [`ErrorCode::NotFound`].
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::NotFound, message)
    }

    /// Convenience constructor for [`ErrorCode::ConcurrentModification`].
    pub fn concurrent_modification(expected: u32, actual: u32) -> Self {
        Self::new(
            ErrorCode::ConcurrentModification,
            "record was modified concurrently; retry the request",
        )
        .with_details(json!({
            "expectedRevision": expected,
            "actualRevision": actual,
        }))
    }

    /// Convenience constructor for [`ErrorCode::DependencyFailure`].
    pub fn dependency_failure(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::DependencyFailure, message)
    }

    /// Convenience constructor for [`ErrorCode::InternalError`].
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InternalError, message)
    }

    /// Whether adapters must hide the message from clients.
    pub fn is_redacted(&self) -> bool {
        matches!(
            self.code,
            ErrorCode::InternalError | ErrorCode::DependencyFailure
        )
    }
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for Error {}

#[cfg(test)]
mod tests {
    //! Regression coverage for this module.
    use super::*;
    use rstest::rstest;
    use uuid::Uuid;

    #[rstest]
    #[case(Error::invalid_request("x"), ErrorCode::InvalidRequest)]
    #[case(Error::unauthorized("x"), ErrorCode::Unauthorized)]
    #[case(Error::account_locked("x"), ErrorCode::AccountLocked)]
    #[case(Error::forbidden("x"), ErrorCode::Forbidden)]
    #[case(Error::not_found("x"), ErrorCode::NotFound)]
    #[case(Error::dependency_failure("x"), ErrorCode::DependencyFailure)]
    #[case(Error::internal("x"), ErrorCode::InternalError)]
    fn constructors_set_codes(#[case] err: Error, #[case] expected: ErrorCode) {
        assert_eq!(err.code(), expected);
    }

    #[rstest]
    fn duplicate_names_the_field() {
        let err = Error::duplicate("username");
        assert_eq!(err.code(), ErrorCode::Duplicate);
        assert_eq!(err.message(), "username already exists");
        assert_eq!(
            err.details().and_then(|d| d.get("field")),
            Some(&json!("username"))
        );
    }

    #[rstest]
    fn serialises_camel_case_and_omits_empty_fields() {
        let value = serde_json::to_value(Error::not_found("missing")).expect("serialise");
        assert_eq!(value, json!({ "code": "not_found", "message": "missing" }));
    }

    #[rstest]
    fn codes_serialise_as_snake_case() {
        let value = serde_json::to_value(ErrorCode::HasEnrollments).expect("serialise");
        assert_eq!(value, json!("has_enrollments"));
    }

    #[rstest]
    #[case(ErrorCode::InternalError, true)]
    #[case(ErrorCode::DependencyFailure, true)]
    #[case(ErrorCode::CourseFull, false)]
    fn redaction_covers_server_side_failures(#[case] code: ErrorCode, #[case] redacted: bool) {
        assert_eq!(Error::new(code, "boom").is_redacted(), redacted);
    }

    #[tokio::test]
    async fn captures_trace_id_in_scope() {
        let trace_id = TraceId::from_uuid(Uuid::nil());
        let err = TraceId::scope(trace_id, async { Error::forbidden("nope") }).await;
        assert_eq!(err.trace_id(), Some(Uuid::nil().to_string().as_str()));
    }
}
