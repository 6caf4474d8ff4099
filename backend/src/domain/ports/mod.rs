//! Domain ports and supporting types for the hexagonal boundary.
//!
//! Driven ports (repositories, hashing, tokens, mail) are implemented in
//! `outbound`; driving ports (the `*Service` traits) are implemented by the
//! domain services and called from `inbound`.

mod macros;
pub(crate) use macros::define_port_error;

mod account_service;
mod course_repository;
mod course_service;
mod enrollment_service;
mod faculty_repository;
mod faculty_service;
mod identity_repository;
mod login_service;
mod mailer;
mod password_hasher;
mod repository_error;
mod student_repository;
mod student_service;
mod token_service;

pub use account_service::{AccountService, AdminRegistration, IdentityUpdate};
#[cfg(test)]
pub use course_repository::MockCourseRepository;
pub use course_repository::{CourseQuery, CourseRepository, CourseSortField, CourseWrite};
pub use course_service::{CourseDetails, CourseService, FacultySummary, StudentSummary};
pub use enrollment_service::EnrollmentService;
#[cfg(test)]
pub use faculty_repository::MockFacultyRepository;
pub use faculty_repository::{FacultyQuery, FacultyRepository, FacultySortField};
pub use faculty_service::{FacultyRegistration, FacultyService};
#[cfg(test)]
pub use identity_repository::MockIdentityRepository;
pub use identity_repository::{IdentityQuery, IdentityRepository, IdentitySortField};
pub use login_service::{LoginOutcome, LoginService};
#[cfg(test)]
pub use mailer::MockMailer;
pub use mailer::{Mailer, MailerError, OutgoingMail};
#[cfg(test)]
pub use password_hasher::MockPasswordHasher;
pub use password_hasher::{PasswordHashError, PasswordHasher};
pub use repository_error::RepositoryError;
#[cfg(test)]
pub use student_repository::MockStudentRepository;
pub use student_repository::{StudentQuery, StudentRepository, StudentSortField};
pub use student_service::{StudentCourse, StudentRegistration, StudentService};
#[cfg(test)]
pub use token_service::MockTokenService;
pub use token_service::{TokenError, TokenService};
