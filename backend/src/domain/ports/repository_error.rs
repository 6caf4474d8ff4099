//! Error shared by the identity, student, faculty, and course repositories.
//!
//! All four aggregates live in the same store, so they fail the same ways.

use super::define_port_error;

define_port_error! {
    /// Persistence errors raised by repository adapters.
    pub enum RepositoryError {
        /// Store connection could not be established.
        Connection { message: String } => "repository connection failed: {message}",
        /// Query or mutation failed during execution.
        Query { message: String } => "repository query failed: {message}",
        /// The record a write targets no longer exists.
        Missing { entity: String } => "{entity} not found",
        /// A unique constraint rejected the write.
        Duplicate { field: String } => "duplicate value for {field}",
        /// A conditional save found a newer revision.
        RevisionMismatch { expected: u32, actual: u32 } =>
            "revision mismatch: expected {expected}, found {actual}",
    }
}

impl RepositoryError {
    /// Map into the domain error taxonomy, logging server-side failures.
    pub fn into_domain(self) -> crate::domain::Error {
        use crate::domain::Error;
        match self {
            Self::Connection { message } => {
                tracing::error!(%message, "repository connection failed");
                Error::dependency_failure(format!("store unavailable: {message}"))
            }
            Self::Query { message } => {
                tracing::error!(%message, "repository query failed");
                Error::dependency_failure(format!("store query failed: {message}"))
            }
            Self::Missing { entity } => Error::not_found(format!("{entity} not found")),
            Self::Duplicate { field } => Error::duplicate(field),
            Self::RevisionMismatch { expected, actual } => {
                Error::concurrent_modification(expected, actual)
            }
        }
    }
}

impl From<RepositoryError> for crate::domain::Error {
    fn from(value: RepositoryError) -> Self {
        value.into_domain()
    }
}

#[cfg(test)]
mod tests {
    //! Regression coverage for this module.
    use super::*;
    use crate::domain::ErrorCode;
    use rstest::rstest;

    #[rstest]
    #[case(RepositoryError::connection("refused"), ErrorCode::DependencyFailure)]
    #[case(RepositoryError::query("syntax"), ErrorCode::DependencyFailure)]
    #[case(RepositoryError::missing("course"), ErrorCode::NotFound)]
    #[case(RepositoryError::duplicate("username"), ErrorCode::Duplicate)]
    #[case(RepositoryError::revision_mismatch(1_u32, 2_u32), ErrorCode::ConcurrentModification)]
    fn maps_to_domain_codes(#[case] err: RepositoryError, #[case] expected: ErrorCode) {
        assert_eq!(crate::domain::Error::from(err).code(), expected);
    }
}
