//! Domain primitives, aggregates, and services.
//!
//! Purpose: define the strongly typed registrar model (identities, student
//! and faculty profiles, courses with their rosters) together with the
//! access policy and the services implementing the driving ports. Nothing in
//! here knows about HTTP or SQL.
//!
//! Public surface:
//! - Error / ErrorCode: transport-agnostic failure payload.
//! - Identity, Student, Faculty, Course: the persisted aggregates.
//! - `access::authorize`: the role and ownership policy.
//! - `*Service` structs: implementations of the `ports` driving traits.

pub mod access;
pub mod auth;
pub mod course;
pub mod error;
pub mod faculty;
pub mod grade;
pub mod identity;
pub mod ids;
pub mod person;
pub mod policy;
pub mod ports;
pub mod schedule;
pub mod student;
pub mod trace_id;
pub mod validation;

mod account_service;
mod course_service;
mod credential_service;
mod enrollment_service;
mod faculty_service;
mod provisioning;
mod student_service;

pub use self::access::{Action, Decision, DenyReason, authorize, require};
pub use self::account_service::{AccountManager, hash_reset_token};
pub use self::auth::{
    IssuedToken, LoginCredentials, LoginValidationError, MIN_PASSWORD_LEN, NewPassword,
    Principal, Role, TokenClaims, UnknownRole, WeakPassword,
};
pub use self::course::{
    Assessment, AssessmentKind, Attendance, Course, CourseCode, CourseDraft, CourseError,
    CourseStatus, CourseUpdate, MAX_CREDITS, MIN_CREDITS, RosterEntry, Syllabus,
};
pub use self::course_service::CourseCatalogue;
pub use self::credential_service::CredentialService;
pub use self::enrollment_service::EnrollmentCoordinator;
pub use self::error::{Error, ErrorCode};
pub use self::faculty::{
    EmployeeId, Faculty, FacultyDraft, FacultyUpdate, Position, Publication, Qualification,
};
pub use self::faculty_service::FacultyDirectory;
pub use self::grade::{Grade, InvalidGrade};
pub use self::identity::{
    Identity, LockoutPolicy, NewIdentity, PasswordHash, PasswordReset, ProfileRef, Username,
    UsernameError,
};
pub use self::ids::{CourseId, FacultyId, IdentityId, StudentId};
pub use self::person::{Address, ContactInfo, EmailAddress, Gender, InvalidEmail, PersonName};
pub use self::policy::{AccountPolicy, CapacityMode};
pub use self::schedule::{ClockTime, InvalidClockTime, OfficeHour, Schedule, Weekday};
pub use self::student::{
    AcademicRecord, DocumentRecord, FeeRecord, Guardian, RollNumber, Student, StudentDraft,
    StudentUpdate,
};
pub use self::student_service::StudentDirectory;
pub use self::trace_id::{TRACE_ID_HEADER, TraceId};
pub use self::validation::{FieldViolation, Violations};

