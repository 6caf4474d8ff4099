//! Login identities, credential state, and lockout bookkeeping.
//!
//! An [`Identity`] owns credentials and a role. Profile data lives in the
//! student and faculty aggregates, linked through [`ProfileRef`]. Lockout and
//! password-reset state are mutated through methods here so services never
//! poke at the counters directly.

use std::fmt;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::domain::{EmailAddress, Error, FacultyId, IdentityId, Role, StudentId};

/// Error returned when a username is malformed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum UsernameError {
    /// Fewer than [`Username::MIN_LEN`] or more than [`Username::MAX_LEN`] characters.
    #[error("username must be between 3 and 32 characters")]
    Length,
    /// Contains characters outside `a-z`, `0-9`, `.`, `_`, `-`.
    #[error("username may only contain letters, digits, '.', '_' or '-'")]
    Characters,
}

/// Lowercased login name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(try_from = "String", into = "String")]
#[schema(value_type = String)]
pub struct Username(String);

impl Username {
    /// Shortest accepted username.
    pub const MIN_LEN: usize = 3;
    /// Longest accepted username.
    pub const MAX_LEN: usize = 32;

    /// Normalise and validate a username.
    ///
    /// # Examples
    /// ```
    /// use registrar::domain::Username;
    ///
    /// assert_eq!(Username::parse(" Ada.L ").unwrap().as_str(), "ada.l");
    /// assert!(Username::parse("a").is_err());
    /// ```
    pub fn parse(raw: &str) -> Result<Self, UsernameError> {
        let normalized = raw.trim().to_lowercase();
        let len = normalized.chars().count();
        if !(Self::MIN_LEN..=Self::MAX_LEN).contains(&len) {
            return Err(UsernameError::Length);
        }
        let allowed = |c: char| c.is_ascii_lowercase() || c.is_ascii_digit() || "._-".contains(c);
        if !normalized.chars().all(allowed) {
            return Err(UsernameError::Characters);
        }
        Ok(Self(normalized))
    }

    /// Borrow the normalised username.
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl TryFrom<String> for Username {
    type Error = UsernameError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<Username> for String {
    fn from(value: Username) -> Self {
        value.0
    }
}

impl fmt::Display for Username {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Encoded one-way password hash (PHC string). Never serialised.
#[derive(Clone, PartialEq, Eq)]
pub struct PasswordHash(String);

impl PasswordHash {
    /// Wrap an encoded hash produced by a hasher or read from storage.
    pub fn new(encoded: impl Into<String>) -> Self {
        Self(encoded.into())
    }

    /// Encoded hash for storage and verification.
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Debug for PasswordHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("PasswordHash(**redacted**)")
    }
}

/// Discriminated link from an identity to its profile record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(tag = "kind", content = "id", rename_all = "snake_case")]
pub enum ProfileRef {
    /// Linked student profile.
    Student(StudentId),
    /// Linked faculty profile.
    Faculty(FacultyId),
}

impl ProfileRef {
    /// Whether this reference kind agrees with `role`.
    pub const fn matches_role(self, role: Role) -> bool {
        matches!(
            (self, role),
            (Self::Student(_), Role::Student) | (Self::Faculty(_), Role::Faculty)
        )
    }

    /// Student profile id, when this is a student link.
    pub const fn student(self) -> Option<StudentId> {
        match self {
            Self::Student(id) => Some(id),
            Self::Faculty(_) => None,
        }
    }

    /// Faculty profile id, when this is a faculty link.
    pub const fn faculty(self) -> Option<FacultyId> {
        match self {
            Self::Faculty(id) => Some(id),
            Self::Student(_) => None,
        }
    }
}

/// Failed-login lockout thresholds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LockoutPolicy {
    /// Consecutive failures that trigger a lock.
    pub max_attempts: u32,
    /// How long a lock lasts.
    pub lock_duration: Duration,
}

impl Default for LockoutPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            lock_duration: Duration::hours(1),
        }
    }
}

/// Outstanding password-reset request. Only the token digest is kept.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PasswordReset {
    /// Hex-encoded SHA-256 of the emailed token.
    pub token_hash: String,
    /// Instant after which the token is rejected.
    pub expires_at: DateTime<Utc>,
}

/// Fields required to register an identity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewIdentity {
    pub username: Username,
    pub email: EmailAddress,
    pub role: Role,
    pub profile: Option<ProfileRef>,
}

/// Login identity with credential and lockout state.
#[derive(Debug, Clone, PartialEq)]
pub struct Identity {
    pub id: IdentityId,
    pub username: Username,
    pub email: EmailAddress,
    pub password_hash: PasswordHash,
    pub role: Role,
    pub profile: Option<ProfileRef>,
    pub active: bool,
    pub verified: bool,
    pub failed_login_attempts: u32,
    pub lock_until: Option<DateTime<Utc>>,
    pub password_reset: Option<PasswordReset>,
    pub last_login_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Identity {
    /// Build a fresh, active identity.
    ///
    /// Fails when the role and profile reference disagree: students and
    /// faculty need a matching profile, admins must have none.
    pub fn new(
        fields: NewIdentity,
        password_hash: PasswordHash,
        now: DateTime<Utc>,
    ) -> Result<Self, Error> {
        let NewIdentity {
            username,
            email,
            role,
            profile,
        } = fields;
        let agrees = match (role, profile) {
            (Role::Admin, None) => true,
            (_, Some(link)) => link.matches_role(role),
            (_, None) => false,
        };
        if !agrees {
            return Err(Error::invalid_request(format!(
                "role {role} does not match the linked profile"
            )));
        }
        Ok(Self {
            id: IdentityId::generate(),
            username,
            email,
            password_hash,
            role,
            profile,
            active: true,
            verified: false,
            failed_login_attempts: 0,
            lock_until: None,
            password_reset: None,
            last_login_at: None,
            created_at: now,
            updated_at: now,
        })
    }

    /// Whether a lock is in force at `now`.
    pub fn is_locked(&self, now: DateTime<Utc>) -> bool {
        self.lock_until.is_some_and(|until| until > now)
    }

    /// Count a failed password check and lock once the threshold is reached.
    ///
    /// An expired lock is cleared first and the counter restarts at one.
    /// Callers must reject attempts while [`Identity::is_locked`] holds
    /// instead of calling this. Returns `true` when this attempt locked the
    /// account.
    pub fn record_failed_login(&mut self, policy: &LockoutPolicy, now: DateTime<Utc>) -> bool {
        if self.lock_until.is_some_and(|until| until <= now) {
            self.lock_until = None;
            self.failed_login_attempts = 0;
        }
        self.failed_login_attempts = self.failed_login_attempts.saturating_add(1);
        self.updated_at = now;
        if self.failed_login_attempts >= policy.max_attempts && self.lock_until.is_none() {
            self.lock_until = Some(now + policy.lock_duration);
            return true;
        }
        false
    }

    /// Clear lockout state after a successful login.
    pub fn record_successful_login(&mut self, now: DateTime<Utc>) {
        self.failed_login_attempts = 0;
        self.lock_until = None;
        self.last_login_at = Some(now);
        self.updated_at = now;
    }

    /// Store a reset request, replacing any earlier one.
    pub fn begin_password_reset(&mut self, token_hash: String, expires_at: DateTime<Utc>) {
        self.password_reset = Some(PasswordReset {
            token_hash,
            expires_at,
        });
    }

    /// Whether `token_hash` matches an unexpired reset request.
    pub fn reset_token_valid(&self, token_hash: &str, now: DateTime<Utc>) -> bool {
        self.password_reset
            .as_ref()
            .is_some_and(|reset| reset.token_hash == token_hash && reset.expires_at > now)
    }

    /// Replace the password hash and clear reset and lockout state.
    pub fn set_password(&mut self, password_hash: PasswordHash, now: DateTime<Utc>) {
        self.password_hash = password_hash;
        self.password_reset = None;
        self.failed_login_attempts = 0;
        self.lock_until = None;
        self.updated_at = now;
    }
}

#[cfg(test)]
mod tests {
    //! Regression coverage for this module.
    use super::*;
    use chrono::TimeZone;
    use rstest::{fixture, rstest};

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 1, 5, 9, 0, 0)
            .single()
            .expect("valid timestamp")
    }

    #[fixture]
    fn identity() -> Identity {
        Identity::new(
            NewIdentity {
                username: Username::parse("ada").expect("username"),
                email: EmailAddress::parse("ada@example.edu").expect("email"),
                role: Role::Admin,
                profile: None,
            },
            PasswordHash::new("$argon2id$fixture"),
            now(),
        )
        .expect("admin without profile is valid")
    }

    #[rstest]
    #[case(Role::Admin, Some(ProfileRef::Student(StudentId::generate())))]
    #[case(Role::Student, None)]
    #[case(Role::Student, Some(ProfileRef::Faculty(FacultyId::generate())))]
    #[case(Role::Faculty, Some(ProfileRef::Student(StudentId::generate())))]
    fn role_and_profile_must_agree(#[case] role: Role, #[case] profile: Option<ProfileRef>) {
        let result = Identity::new(
            NewIdentity {
                username: Username::parse("grace").expect("username"),
                email: EmailAddress::parse("grace@example.edu").expect("email"),
                role,
                profile,
            },
            PasswordHash::new("x"),
            now(),
        );
        assert!(result.is_err());
    }

    #[rstest]
    fn four_failures_do_not_lock(mut identity: Identity) {
        let policy = LockoutPolicy::default();
        for _ in 0..4 {
            assert!(!identity.record_failed_login(&policy, now()));
        }
        assert_eq!(identity.failed_login_attempts, 4);
        assert!(!identity.is_locked(now()));
    }

    #[rstest]
    fn fifth_failure_locks_for_an_hour(mut identity: Identity) {
        let policy = LockoutPolicy::default();
        for _ in 0..4 {
            identity.record_failed_login(&policy, now());
        }
        assert!(identity.record_failed_login(&policy, now()));
        assert_eq!(identity.lock_until, Some(now() + Duration::hours(1)));
        assert!(identity.is_locked(now() + Duration::minutes(59)));
        assert!(!identity.is_locked(now() + Duration::hours(1)));
    }

    #[rstest]
    fn failure_after_expired_lock_restarts_counter(mut identity: Identity) {
        let policy = LockoutPolicy::default();
        for _ in 0..5 {
            identity.record_failed_login(&policy, now());
        }
        let later = now() + Duration::hours(2);
        assert!(!identity.record_failed_login(&policy, later));
        assert_eq!(identity.failed_login_attempts, 1);
        assert_eq!(identity.lock_until, None);
    }

    #[rstest]
    fn success_clears_lockout_state(mut identity: Identity) {
        let policy = LockoutPolicy::default();
        for _ in 0..5 {
            identity.record_failed_login(&policy, now());
        }
        identity.record_successful_login(now() + Duration::hours(2));
        assert_eq!(identity.failed_login_attempts, 0);
        assert_eq!(identity.lock_until, None);
        assert_eq!(identity.last_login_at, Some(now() + Duration::hours(2)));
    }

    #[rstest]
    fn reset_token_expires(mut identity: Identity) {
        identity.begin_password_reset("abc".to_owned(), now() + Duration::hours(1));
        assert!(identity.reset_token_valid("abc", now()));
        assert!(!identity.reset_token_valid("abd", now()));
        assert!(!identity.reset_token_valid("abc", now() + Duration::hours(1)));
    }

    #[rstest]
    fn set_password_clears_reset_request(mut identity: Identity) {
        identity.begin_password_reset("abc".to_owned(), now() + Duration::hours(1));
        identity.set_password(PasswordHash::new("new"), now());
        assert!(identity.password_reset.is_none());
        assert_eq!(identity.password_hash.as_str(), "new");
    }

    #[rstest]
    fn profile_ref_serialises_with_kind_tag() {
        let id = StudentId::generate();
        let value = serde_json::to_value(ProfileRef::Student(id)).expect("serialise");
        assert_eq!(value, serde_json::json!({ "kind": "student", "id": id.to_string() }));
    }

    #[rstest]
    #[case("ab", UsernameError::Length)]
    #[case("ada lovelace", UsernameError::Characters)]
    #[case("ada!", UsernameError::Characters)]
    fn username_rejects_bad_input(#[case] raw: &str, #[case] expected: UsernameError) {
        assert_eq!(Username::parse(raw), Err(expected));
    }
}
