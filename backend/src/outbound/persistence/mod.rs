//! PostgreSQL persistence adapters using Diesel ORM.
//!
//! Concrete implementations of the repository ports backed by PostgreSQL
//! through `diesel-async` with `bb8` pooling.
//!
//! - Repositories only translate between rows and domain aggregates.
//! - Row structs (`models.rs`) and table definitions (`schema.rs`) stay
//!   private to this module.
//! - Every database failure is mapped to a `RepositoryError`.
//!
//! ```ignore
//! use registrar::outbound::persistence::{DbPool, DieselCourseRepository, PoolConfig};
//!
//! let pool = DbPool::new(PoolConfig::new("postgres://localhost/registrar")).await?;
//! let courses = DieselCourseRepository::new(pool);
//! ```

mod diesel_course_repository;
mod diesel_faculty_repository;
mod diesel_helpers;
mod diesel_identity_repository;
mod diesel_student_repository;
mod migrations;
mod models;
mod pool;
mod schema;

pub use diesel_course_repository::DieselCourseRepository;
pub use diesel_faculty_repository::DieselFacultyRepository;
pub use diesel_identity_repository::DieselIdentityRepository;
pub use diesel_student_repository::DieselStudentRepository;
pub use migrations::{MigrationError, apply_migrations};
pub use pool::{
    DEFAULT_CONNECTION_TIMEOUT, DEFAULT_MAX_CONNECTIONS, DbPool, PoolConfig, PoolError,
};
