//! Authentication primitives: roles, credentials, principals, token claims.
//!
//! Keep inbound payload parsing outside the domain by exposing constructors
//! that validate string inputs before a handler talks to a port or service.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use zeroize::Zeroizing;

use crate::domain::{IdentityId, ProfileRef};

/// Minimum accepted password length, in characters.
pub const MIN_PASSWORD_LEN: usize = 8;

/// Role carried by every identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// Enrolled student; owns a student profile.
    Student,
    /// Teaching staff; owns a faculty profile.
    Faculty,
    /// Administrator; owns no profile.
    Admin,
}

impl Role {
    /// Stable lowercase label used in tokens and storage.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Student => "student",
            Self::Faculty => "faculty",
            Self::Admin => "admin",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when a role label is unknown.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown role: {0}")]
pub struct UnknownRole(pub String);

impl FromStr for Role {
    type Err = UnknownRole;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "student" => Ok(Self::Student),
            "faculty" => Ok(Self::Faculty),
            "admin" => Ok(Self::Admin),
            other => Err(UnknownRole(other.to_owned())),
        }
    }
}

/// Domain error returned when login payload values are invalid.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoginValidationError {
    /// Username was missing or blank once trimmed.
    EmptyUsername,
    /// Password was blank.
    EmptyPassword,
}

impl fmt::Display for LoginValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyUsername => write!(f, "username must not be empty"),
            Self::EmptyPassword => write!(f, "password must not be empty"),
        }
    }
}

impl std::error::Error for LoginValidationError {}

/// Validated login credentials used by authentication services.
///
/// ## Invariants
/// - `username` is trimmed, lowercased, and non-empty.
/// - `password` is non-empty and keeps caller-provided whitespace.
///
/// # Examples
/// ```
/// use registrar::domain::LoginCredentials;
///
/// let creds = LoginCredentials::try_from_parts(" Ada ", "password").unwrap();
/// assert_eq!(creds.username(), "ada");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoginCredentials {
    username: String,
    password: Zeroizing<String>,
}

impl LoginCredentials {
    /// Construct credentials from raw username/password inputs.
    pub fn try_from_parts(username: &str, password: &str) -> Result<Self, LoginValidationError> {
        let normalized = username.trim();
        if normalized.is_empty() {
            return Err(LoginValidationError::EmptyUsername);
        }
        if password.is_empty() {
            return Err(LoginValidationError::EmptyPassword);
        }
        Ok(Self {
            username: normalized.to_lowercase(),
            password: Zeroizing::new(password.to_owned()),
        })
    }

    /// Username string suitable for identity lookups.
    pub fn username(&self) -> &str {
        self.username.as_str()
    }

    /// Password string provided by the caller.
    pub fn password(&self) -> &str {
        self.password.as_str()
    }
}

/// Error returned when a new password fails the strength policy.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("password must be at least {min} characters")]
pub struct WeakPassword {
    /// Minimum accepted length.
    pub min: usize,
}

/// A plaintext password that satisfies the strength policy.
///
/// The buffer is zeroed on drop.
#[derive(Clone, PartialEq, Eq)]
pub struct NewPassword(Zeroizing<String>);

impl NewPassword {
    /// Validate a candidate password.
    pub fn new(raw: &str) -> Result<Self, WeakPassword> {
        if raw.chars().count() < MIN_PASSWORD_LEN {
            return Err(WeakPassword {
                min: MIN_PASSWORD_LEN,
            });
        }
        Ok(Self(Zeroizing::new(raw.to_owned())))
    }

    /// Plaintext for handing to the hasher.
    pub fn expose(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Debug for NewPassword {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("NewPassword(**redacted**)")
    }
}

/// Authenticated caller resolved for a single request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Principal {
    /// Identity the request acts as.
    pub identity_id: IdentityId,
    /// Username at resolution time.
    pub username: String,
    /// Role at resolution time.
    pub role: Role,
    /// Linked profile, if any.
    pub profile: Option<ProfileRef>,
}

impl Principal {
    /// Whether the principal holds the admin role.
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}

/// Claims carried by a signed access token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenClaims {
    /// Identity id as a string.
    pub sub: IdentityId,
    /// Role at issue time.
    pub role: Role,
    /// Username at issue time.
    pub username: String,
    /// Issued-at, seconds since the epoch.
    pub iat: i64,
    /// Expiry, seconds since the epoch.
    pub exp: i64,
}

/// A freshly issued access token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IssuedToken {
    /// Encoded bearer token.
    pub token: String,
    /// Instant after which verification fails.
    pub expires_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    //! Regression coverage for this module.
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("", "pw", LoginValidationError::EmptyUsername)]
    #[case("   ", "pw", LoginValidationError::EmptyUsername)]
    #[case("user", "", LoginValidationError::EmptyPassword)]
    fn invalid_credentials(
        #[case] username: &str,
        #[case] password: &str,
        #[case] expected: LoginValidationError,
    ) {
        let err = LoginCredentials::try_from_parts(username, password)
            .expect_err("invalid inputs must fail");
        assert_eq!(err, expected);
    }

    #[rstest]
    fn credentials_normalise_username_but_keep_password() {
        let creds = LoginCredentials::try_from_parts("  Ada.Lovelace ", " secret ")
            .expect("valid inputs should succeed");
        assert_eq!(creds.username(), "ada.lovelace");
        assert_eq!(creds.password(), " secret ");
    }

    #[rstest]
    #[case("short", false)]
    #[case("exactly8", true)]
    #[case("correct horse battery staple", true)]
    fn new_password_enforces_minimum_length(#[case] raw: &str, #[case] accepted: bool) {
        assert_eq!(NewPassword::new(raw).is_ok(), accepted);
    }

    #[rstest]
    fn new_password_debug_is_redacted() {
        let password = NewPassword::new("hunter2hunter2").expect("valid");
        assert!(!format!("{password:?}").contains("hunter2"));
    }

    #[rstest]
    #[case("student", Role::Student)]
    #[case("faculty", Role::Faculty)]
    #[case(" admin ", Role::Admin)]
    fn role_parses_labels(#[case] raw: &str, #[case] expected: Role) {
        assert_eq!(raw.parse::<Role>(), Ok(expected));
    }

    #[rstest]
    fn role_rejects_unknown_labels() {
        assert_eq!("dean".parse::<Role>(), Err(UnknownRole("dean".to_owned())));
    }
}
