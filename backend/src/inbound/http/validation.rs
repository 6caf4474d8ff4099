//! Shared validation helpers for inbound HTTP adapters.
//!
//! Every failure becomes an `invalid_request` error whose details name the
//! offending field and a machine-readable code.

use serde_json::json;
use uuid::Uuid;

use crate::domain::{EmailAddress, Error, NewPassword, Username};

/// Validation error codes for HTTP request failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ErrorCode {
    MissingField,
    InvalidUuid,
    InvalidValue,
    WeakPassword,
}

impl ErrorCode {
    fn as_str(self) -> &'static str {
        match self {
            ErrorCode::MissingField => "missing_field",
            ErrorCode::InvalidUuid => "invalid_uuid",
            ErrorCode::InvalidValue => "invalid_value",
            ErrorCode::WeakPassword => "weak_password",
        }
    }
}

/// Newtype wrapper for HTTP field names to provide type safety.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct FieldName(&'static str);

impl FieldName {
    pub(crate) const fn new(name: &'static str) -> Self {
        Self(name)
    }

    fn as_str(self) -> &'static str {
        self.0
    }
}

fn field_error(field: FieldName, code: ErrorCode, message: String, value: Option<&str>) -> Error {
    let details = match value {
        Some(value) => json!({
            "field": field.as_str(),
            "value": value,
            "code": code.as_str(),
        }),
        None => json!({
            "field": field.as_str(),
            "code": code.as_str(),
        }),
    };
    Error::invalid_request(message).with_details(details)
}

pub(crate) fn missing_field_error(field: FieldName) -> Error {
    let name = field.as_str();
    field_error(
        field,
        ErrorCode::MissingField,
        format!("missing required field: {name}"),
        None,
    )
}

pub(crate) fn invalid_value_error(field: FieldName, value: &str, message: impl Into<String>) -> Error {
    field_error(field, ErrorCode::InvalidValue, message.into(), Some(value))
}

/// Parse a path or body identifier into one of the typed domain ids.
pub(crate) fn parse_id<T: From<Uuid>>(value: &str, field: FieldName) -> Result<T, Error> {
    Uuid::parse_str(value.trim())
        .map(T::from)
        .map_err(|_| {
            let name = field.as_str();
            field_error(
                field,
                ErrorCode::InvalidUuid,
                format!("{name} must be a valid UUID"),
                Some(value),
            )
        })
}

pub(crate) fn parse_username(value: &str) -> Result<Username, Error> {
    const FIELD: FieldName = FieldName::new("username");
    Username::parse(value).map_err(|err| invalid_value_error(FIELD, value, err.to_string()))
}

pub(crate) fn parse_email(value: &str, field: FieldName) -> Result<EmailAddress, Error> {
    EmailAddress::parse(value).map_err(|err| invalid_value_error(field, value, err.to_string()))
}

/// Check a new password against the strength policy. The value is never
/// echoed back.
pub(crate) fn parse_new_password(value: &str, field: FieldName) -> Result<NewPassword, Error> {
    NewPassword::new(value)
        .map_err(|err| field_error(field, ErrorCode::WeakPassword, err.to_string(), None))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::StudentId;
    use rstest::rstest;

    #[rstest]
    fn invalid_ids_name_the_field() {
        let err = parse_id::<StudentId>("nope", FieldName::new("studentId")).expect_err("invalid");
        let details = err.details().expect("details");
        assert_eq!(details["field"], "studentId");
        assert_eq!(details["code"], "invalid_uuid");
        assert_eq!(details["value"], "nope");
    }

    #[rstest]
    fn valid_ids_parse() {
        let id = StudentId::generate();
        let parsed: StudentId =
            parse_id(&id.to_string(), FieldName::new("studentId")).expect("valid");
        assert_eq!(parsed, id);
    }

    #[rstest]
    fn weak_passwords_are_not_echoed() {
        let err = parse_new_password("short", FieldName::new("newPassword")).expect_err("weak");
        let details = err.details().expect("details");
        assert_eq!(details["code"], "weak_password");
        assert!(details.get("value").is_none());
    }

    #[rstest]
    #[case("  Ada.Lovelace@Example.edu ", true)]
    #[case("not-an-email", false)]
    fn emails_are_normalised_or_rejected(#[case] raw: &str, #[case] ok: bool) {
        let parsed = parse_email(raw, FieldName::new("email"));
        assert_eq!(parsed.is_ok(), ok);
        if let Ok(email) = parsed {
            assert_eq!(email.as_str(), "ada.lovelace@example.edu");
        }
    }
}
