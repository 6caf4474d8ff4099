//! Registrar backend library.
//!
//! Hexagonal layout: [`domain`] holds the model, policy, and services behind
//! the `domain::ports` traits; [`inbound`] adapts HTTP onto the driving
//! ports; [`outbound`] implements the driven ports over PostgreSQL, memory,
//! Argon2/JWT, and SMTP.

pub mod doc;
pub mod domain;
pub mod inbound;
pub mod middleware;
pub mod outbound;
#[cfg(any(test, feature = "test-support"))]
pub mod test_support;

/// Public OpenAPI surface used by Swagger UI and tooling.
pub use doc::ApiDoc;
pub use middleware::Trace;
