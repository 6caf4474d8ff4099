//! Test doubles shared by unit tests (in `src/`) and integration tests (in
//! `tests/`). Compiled only for tests or with the `test-support` feature.

use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::{DateTime, Local, TimeDelta, TimeZone, Utc};
use mockable::Clock;

use crate::domain::ports::{
    AdminRegistration, Mailer, MailerError, OutgoingMail, PasswordHashError, PasswordHasher,
};
use crate::domain::{
    AccountManager, AccountPolicy, CapacityMode, EmailAddress, Error, Identity, IdentityId,
    NewPassword, PasswordHash, Principal, ProfileRef, Role, Username,
};
use crate::inbound::http::state::{Collaborators, HttpState, Repositories};
use crate::outbound::memory::MemoryStore;
use crate::outbound::security::JwtTokenService;

/// Clock whose current instant is set by the test.
pub struct MutableClock(Mutex<DateTime<Utc>>);

impl MutableClock {
    pub fn new(now: DateTime<Utc>) -> Self {
        Self(Mutex::new(now))
    }

    pub fn advance(&self, delta: TimeDelta) {
        *self.lock_clock() += delta;
    }

    pub fn advance_minutes(&self, minutes: i64) {
        self.advance(TimeDelta::minutes(minutes));
    }

    fn lock_clock(&self) -> MutexGuard<'_, DateTime<Utc>> {
        match self.0.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

impl Default for MutableClock {
    fn default() -> Self {
        Self::new(fixture_timestamp())
    }
}

impl Clock for MutableClock {
    fn local(&self) -> DateTime<Local> {
        self.utc().with_timezone(&Local)
    }

    fn utc(&self) -> DateTime<Utc> {
        *self.lock_clock()
    }
}

/// A fixed instant used as "now" across test suites.
pub fn fixture_timestamp() -> DateTime<Utc> {
    match Utc.with_ymd_and_hms(2025, 1, 15, 9, 0, 0) {
        chrono::LocalResult::Single(value) => value,
        _ => DateTime::<Utc>::UNIX_EPOCH,
    }
}

/// Principal for `role` with an optional linked profile.
pub fn principal(role: Role, profile: Option<ProfileRef>) -> Principal {
    Principal {
        identity_id: IdentityId::generate(),
        username: format!("{role}-caller"),
        role,
        profile,
    }
}

/// An admin principal.
pub fn admin() -> Principal {
    principal(Role::Admin, None)
}

/// Reversible stand-in for the argon2 adapter so suites stay fast.
#[derive(Debug, Default, Clone, Copy)]
pub struct PlainHasher;

impl PasswordHasher for PlainHasher {
    fn hash(&self, password: &str) -> Result<PasswordHash, PasswordHashError> {
        Ok(PasswordHash::new(format!("plain${password}")))
    }

    fn verify(&self, password: &str, hash: &PasswordHash) -> Result<bool, PasswordHashError> {
        hash.as_str()
            .strip_prefix("plain$")
            .map(|stored| stored == password)
            .ok_or_else(|| PasswordHashError::malformed_hash("missing plain$ prefix"))
    }
}

/// Mailer that keeps every message in memory.
#[derive(Debug, Default)]
pub struct RecordingMailer {
    sent: Mutex<Vec<OutgoingMail>>,
}

impl RecordingMailer {
    pub fn sent(&self) -> Vec<OutgoingMail> {
        self.lock_sent().clone()
    }

    /// The hex reset token carried by the most recent message, if any.
    pub fn last_reset_token(&self) -> Option<String> {
        self.lock_sent().last().and_then(|mail| {
            mail.body
                .lines()
                .map(str::trim)
                .find(|line| line.len() >= 32 && line.chars().all(|c| c.is_ascii_hexdigit()))
                .map(str::to_owned)
        })
    }

    fn lock_sent(&self) -> MutexGuard<'_, Vec<OutgoingMail>> {
        match self.sent.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

#[async_trait]
impl Mailer for RecordingMailer {
    async fn send(&self, mail: &OutgoingMail) -> Result<String, MailerError> {
        let mut sent = self.lock_sent();
        sent.push(mail.clone());
        Ok(format!("<recorded-{}@registrar>", sent.len()))
    }
}

/// Signing secret used by [`Harness`].
pub const TEST_TOKEN_SECRET: &[u8] = b"registrar-test-secret-registrar-test-secret";

/// Every service wired over one in-memory store, with a settable clock and
/// a recording mailer.
pub struct Harness {
    pub store: Arc<MemoryStore>,
    pub clock: Arc<MutableClock>,
    pub mailer: Arc<RecordingMailer>,
    pub state: HttpState,
    accounts: AccountManager<MemoryStore>,
}

impl Harness {
    pub fn new(capacity_mode: CapacityMode) -> Result<Self, Error> {
        let store = Arc::new(MemoryStore::new());
        let clock = Arc::new(MutableClock::default());
        let mailer = Arc::new(RecordingMailer::default());
        let hasher: Arc<dyn PasswordHasher> = Arc::new(PlainHasher);
        let secret = zeroize::Zeroizing::new(TEST_TOKEN_SECRET.to_vec());
        let tokens = JwtTokenService::new(&secret, chrono::Duration::hours(24), clock.clone())
            .map_err(|err| Error::internal(err.to_string()))?;
        let policy = AccountPolicy::default();
        let state = HttpState::assemble(
            Repositories {
                identities: store.clone(),
                students: store.clone(),
                faculty: store.clone(),
                courses: store.clone(),
            },
            Collaborators {
                hasher: hasher.clone(),
                tokens: Arc::new(tokens),
                mailer: mailer.clone(),
                clock: clock.clone(),
            },
            policy,
            capacity_mode,
        );
        let accounts = AccountManager::new(
            store.clone(),
            hasher,
            mailer.clone(),
            clock.clone(),
            policy,
        );
        Ok(Self {
            store,
            clock,
            mailer,
            state,
            accounts,
        })
    }

    /// Provision an admin directly, as the bootstrap CLI does.
    pub async fn seed_admin(&self, username: &str, password: &str) -> Result<Identity, Error> {
        let invalid = |err: &dyn std::fmt::Display| Error::invalid_request(err.to_string());
        let registration = AdminRegistration {
            username: Username::parse(username).map_err(|err| invalid(&err))?,
            email: EmailAddress::parse(&format!("{username}@registrar.test"))
                .map_err(|err| invalid(&err))?,
            password: NewPassword::new(password).map_err(|err| invalid(&err))?,
        };
        self.accounts.bootstrap_admin(registration).await
    }
}

/// `POST /students` body with valid profile fields.
pub fn student_payload(username: &str, roll_number: &str, password: &str) -> serde_json::Value {
    serde_json::json!({
        "username": username,
        "password": password,
        "rollNumber": roll_number,
        "name": { "first": "Ada", "last": username },
        "dateOfBirth": "2004-12-10",
        "gender": "female",
        "contact": {
            "email": format!("{username}@students.registrar.test"),
            "phone": "+44 20 7946 0018"
        },
        "academic": { "branch": "CSE", "semester": 3, "batch": "2023", "cgpa": 8.4 }
    })
}

/// `POST /faculty` body with valid profile fields.
pub fn faculty_payload(username: &str, employee_id: &str, password: &str) -> serde_json::Value {
    serde_json::json!({
        "username": username,
        "password": password,
        "employeeId": employee_id,
        "name": { "first": "Alan", "last": username },
        "email": format!("{username}@staff.registrar.test"),
        "department": "CSE",
        "position": "lecturer",
        "joinDate": "2019-08-01",
        "specializations": ["compilers"]
    })
}

/// `POST /courses` body with the given code and capacity.
pub fn course_payload(code: &str, capacity: u32) -> serde_json::Value {
    serde_json::json!({
        "code": code,
        "name": format!("Course {code}"),
        "department": "CSE",
        "credits": 4,
        "semester": 3,
        "capacity": capacity
    })
}
