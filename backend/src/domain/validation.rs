//! Field-level validation collected into a single `invalid_request` error.

use serde::Serialize;
use serde_json::json;

use crate::domain::Error;

/// A single rejected field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldViolation {
    /// Dotted path of the offending field, e.g. `academic.semester`.
    pub field: String,
    /// Human-readable reason.
    pub message: String,
}

/// Accumulates violations so clients see every problem at once.
///
/// # Examples
/// ```
/// use registrar::domain::{ErrorCode, Violations};
///
/// let mut violations = Violations::default();
/// violations.check(false, "credits", "credits must be between 1 and 6");
/// let err = violations.into_result().expect_err("one violation");
/// assert_eq!(err.code(), ErrorCode::InvalidRequest);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Violations(Vec<FieldViolation>);

impl Violations {
    /// Record a violation.
    pub fn push(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.0.push(FieldViolation {
            field: field.into(),
            message: message.into(),
        });
    }

    /// Record a violation unless `ok` holds.
    pub fn check(&mut self, ok: bool, field: &str, message: &str) {
        if !ok {
            self.push(field, message);
        }
    }

    /// Record a violation when `value` is blank once trimmed.
    pub fn require(&mut self, value: &str, field: &str) {
        if value.trim().is_empty() {
            self.push(field, format!("{field} must not be empty"));
        }
    }

    /// Merge violations reported by a nested value under `prefix`.
    pub fn nest(&mut self, prefix: &str, other: Self) {
        for violation in other.0 {
            self.push(format!("{prefix}.{}", violation.field), violation.message);
        }
    }

    /// Whether no violations were recorded.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Recorded violations.
    pub fn as_slice(&self) -> &[FieldViolation] {
        &self.0
    }

    /// Convert into a domain error when anything was recorded.
    pub fn into_result(self) -> Result<(), Error> {
        let Some(first) = self.0.first() else {
            return Ok(());
        };
        let message = if self.0.len() == 1 {
            first.message.clone()
        } else {
            format!("{} (and {} more)", first.message, self.0.len() - 1)
        };
        Err(Error::invalid_request(message).with_details(json!({ "errors": self.0 })))
    }
}

/// Whether `value` looks like `local@domain.tld`.
pub(crate) fn is_plausible_email(value: &str) -> bool {
    let Some((local, domain)) = value.split_once('@') else {
        return false;
    };
    !local.is_empty()
        && !domain.contains('@')
        && domain.contains('.')
        && !domain.starts_with('.')
        && !domain.ends_with('.')
        && !value.chars().any(char::is_whitespace)
}

/// Whether `value` is a phone number of 7 to 15 digits, allowing a leading
/// `+` and space, dash, or parenthesis separators.
pub(crate) fn is_plausible_phone(value: &str) -> bool {
    let trimmed = value.trim();
    let body = trimmed.strip_prefix('+').unwrap_or(trimmed);
    let mut digits = 0_usize;
    for ch in body.chars() {
        match ch {
            '0'..='9' => digits += 1,
            ' ' | '-' | '(' | ')' => {}
            _ => return false,
        }
    }
    (7..=15).contains(&digits)
}
