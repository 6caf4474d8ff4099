//! Outbound adapters implementing domain ports for external infrastructure.
//!
//! - **persistence**: PostgreSQL-backed repositories using Diesel ORM
//! - **memory**: process-local repositories for development and tests
//! - **security**: Argon2id password hashing and HS256 bearer tokens
//! - **mail**: SMTP delivery through lettre, or a logging fallback
//!
//! Adapters are thin translators between domain types and
//! infrastructure-specific representations. They contain no business logic.

pub mod mail;
pub mod memory;
pub mod persistence;
pub mod security;
