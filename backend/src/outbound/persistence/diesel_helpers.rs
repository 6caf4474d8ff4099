//! Shared helpers for the Diesel repositories.
//!
//! - Pool and Diesel error mapping into [`RepositoryError`], including the
//!   unique-constraint to field-name table.
//! - Checked integer casts between domain and column types.
//! - JSONB document encoding.
//! - Search pattern and pagination window helpers.

use diesel::result::{DatabaseErrorKind, Error as DieselError};
use pagination::PageRequest;
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use crate::domain::ports::RepositoryError;

use super::pool::PoolError;

/// Unique constraint names and the API field each one protects.
const UNIQUE_CONSTRAINTS: &[(&str, &str)] = &[
    ("identities_username_key", "username"),
    ("identities_email_key", "email"),
    ("students_roll_number_key", "rollNumber"),
    ("students_email_key", "email"),
    ("faculty_employee_id_key", "employeeId"),
    ("faculty_email_key", "email"),
    ("courses_code_key", "code"),
];

/// Map pool errors to repository connection errors.
pub fn map_pool_error(error: PoolError) -> RepositoryError {
    match error {
        PoolError::Checkout { message } | PoolError::Build { message } => {
            RepositoryError::connection(message)
        }
    }
}

fn map_unique_violation(constraint_name: Option<&str>, message: &str) -> RepositoryError {
    let field = constraint_name.and_then(|name| {
        UNIQUE_CONSTRAINTS
            .iter()
            .find(|(constraint, _)| *constraint == name)
            .map(|(_, field)| *field)
    });
    match field {
        Some(field) => RepositoryError::duplicate(field),
        None => {
            warn!(
                message,
                constraint_name = ?constraint_name,
                "unrecognised unique violation"
            );
            RepositoryError::duplicate("id")
        }
    }
}

/// Map Diesel errors to repository errors.
pub fn map_diesel_error(error: DieselError) -> RepositoryError {
    match &error {
        DieselError::DatabaseError(kind, info) => {
            debug!(?kind, message = info.message(), "diesel operation failed");
        }
        _ => debug!(
            error_type = %std::any::type_name_of_val(&error),
            "diesel operation failed"
        ),
    }

    match error {
        DieselError::NotFound => RepositoryError::query("record not found"),
        DieselError::QueryBuilderError(_) => RepositoryError::query("database query error"),
        DieselError::DatabaseError(kind, info) => match kind {
            DatabaseErrorKind::UniqueViolation => {
                map_unique_violation(info.constraint_name(), info.message())
            }
            DatabaseErrorKind::ClosedConnection => {
                RepositoryError::connection("database connection error")
            }
            _ => RepositoryError::query("database error"),
        },
        _ => RepositoryError::query("database error"),
    }
}

/// Cast a domain revision to its column type.
pub fn revision_to_db(revision: u32) -> Result<i32, RepositoryError> {
    i32::try_from(revision).map_err(|_| RepositoryError::query("revision out of range"))
}

/// Cast a stored revision back to the domain type.
pub fn revision_from_db(revision: i32) -> Result<u32, RepositoryError> {
    u32::try_from(revision).map_err(|_| RepositoryError::query("negative revision in store"))
}

/// Cast an unsigned counter to a column integer.
pub fn count_to_db(value: u32, column: &str) -> Result<i32, RepositoryError> {
    i32::try_from(value).map_err(|_| RepositoryError::query(format!("{column} out of range")))
}

/// Cast a stored counter back to an unsigned value.
pub fn count_from_db(value: i32, column: &str) -> Result<u32, RepositoryError> {
    u32::try_from(value).map_err(|_| RepositoryError::query(format!("negative {column} in store")))
}

/// Cast a list position to a column integer.
pub fn position_to_db(index: usize) -> Result<i32, RepositoryError> {
    i32::try_from(index).map_err(|_| RepositoryError::query("list position out of range"))
}

/// Serialise an aggregate into its JSONB document.
pub fn to_document<T: Serialize>(value: &T) -> Result<serde_json::Value, RepositoryError> {
    serde_json::to_value(value)
        .map_err(|err| RepositoryError::query(format!("encode document: {err}")))
}

/// Decode a stored JSONB document.
pub fn from_document<T: DeserializeOwned>(
    document: serde_json::Value,
) -> Result<T, RepositoryError> {
    serde_json::from_value(document)
        .map_err(|err| RepositoryError::query(format!("decode document: {err}")))
}

/// Build an `ILIKE` pattern for a free-text search, escaping wildcards.
/// Blank input yields `None`.
pub fn search_pattern(search: Option<&str>) -> Option<String> {
    let needle = search.map(str::trim).filter(|needle| !needle.is_empty())?;
    let mut escaped = String::with_capacity(needle.len() + 2);
    escaped.push('%');
    for c in needle.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped.push('%');
    Some(escaped)
}

/// Offset and limit of a page window as SQL integers.
pub fn window(page: PageRequest) -> (i64, i64) {
    let skip = i64::try_from(page.skip()).unwrap_or(i64::MAX);
    let limit = i64::try_from(page.limit()).unwrap_or(i64::MAX);
    (skip, limit)
}

/// Convert a `COUNT(*)` result.
pub fn total_from_db(total: i64) -> usize {
    usize::try_from(total).unwrap_or_default()
}

/// Apply an ascending or descending `ORDER BY` on a boxed query.
macro_rules! order_by_direction {
    ($query:expr, $direction:expr, $column:expr) => {
        match $direction {
            ::pagination::SortDirection::Asc => $query.order($column.asc()),
            ::pagination::SortDirection::Desc => $query.order($column.desc()),
        }
    };
}

pub(crate) use order_by_direction;

#[cfg(test)]
mod tests {
    //! Regression coverage for error and value mapping helpers.
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(Some("identities_username_key"), RepositoryError::duplicate("username"))]
    #[case(Some("students_roll_number_key"), RepositoryError::duplicate("rollNumber"))]
    #[case(Some("courses_code_key"), RepositoryError::duplicate("code"))]
    #[case(Some("something_else"), RepositoryError::duplicate("id"))]
    #[case(None, RepositoryError::duplicate("id"))]
    fn unique_violations_name_the_field(
        #[case] constraint: Option<&str>,
        #[case] expected: RepositoryError,
    ) {
        assert_eq!(map_unique_violation(constraint, "duplicate key"), expected);
    }

    #[rstest]
    fn pool_errors_become_connection_errors() {
        assert_eq!(
            map_pool_error(PoolError::checkout("timed out")),
            RepositoryError::connection("timed out")
        );
    }

    #[rstest]
    fn not_found_maps_to_query_error() {
        assert!(matches!(
            map_diesel_error(DieselError::NotFound),
            RepositoryError::Query { .. }
        ));
    }

    #[rstest]
    #[case(None, None)]
    #[case(Some("   "), None)]
    #[case(Some(" ada "), Some("%ada%"))]
    #[case(Some("100%_a\\b"), Some("%100\\%\\_a\\\\b%"))]
    fn search_patterns_escape_wildcards(#[case] input: Option<&str>, #[case] expected: Option<&str>) {
        assert_eq!(search_pattern(input).as_deref(), expected);
    }

    #[rstest]
    fn negative_revision_is_rejected() {
        assert!(revision_from_db(-1).is_err());
        assert_eq!(revision_to_db(3).expect("cast"), 3);
    }
}
