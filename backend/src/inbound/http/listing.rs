//! Query-string parsing shared by the list endpoints.
//!
//! ```text
//! GET /api/v1/students?search=ada&branch=CSE&sort=cgpa&order=desc&skip=20&limit=10
//! ```

use pagination::{Page, PageRequest, Sort, SortDirection};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::domain::Error;

use super::validation::{FieldName, invalid_value_error};

/// Paging, search, and sort parameters accepted by every list endpoint.
#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct ListParams {
    /// Case-insensitive substring search.
    pub search: Option<String>,
    /// Field to sort by; each endpoint documents its own set.
    pub sort: Option<String>,
    /// `asc` (default) or `desc`.
    pub order: Option<String>,
    /// Items to skip; defaults to 0.
    pub skip: Option<usize>,
    /// Page size from 1 to 100; defaults to 20.
    pub limit: Option<usize>,
}

impl ListParams {
    /// Paging window; a `limit` of 0 or above 100 is a field error on
    /// `limit`.
    pub fn page(&self) -> Result<PageRequest, Error> {
        PageRequest::from_query(self.skip, self.limit).map_err(|err| {
            let raw = self.limit.map(|limit| limit.to_string()).unwrap_or_default();
            invalid_value_error(FieldName::new("limit"), &raw, err.to_string())
        })
    }

    /// Trimmed search text, if any.
    pub fn search(&self) -> Option<String> {
        self.search
            .as_deref()
            .map(str::trim)
            .filter(|needle| !needle.is_empty())
            .map(str::to_owned)
    }

    /// Resolve `sort` and `order` against a table of accepted field names.
    pub fn sort<F: Copy + Default>(&self, fields: &[(&str, F)]) -> Result<Sort<F>, Error> {
        let field = match self.sort.as_deref().map(str::trim) {
            None | Some("") => F::default(),
            Some(raw) => fields
                .iter()
                .find(|(name, _)| name.eq_ignore_ascii_case(raw))
                .map(|(_, field)| *field)
                .ok_or_else(|| {
                    let accepted: Vec<&str> = fields.iter().map(|(name, _)| *name).collect();
                    invalid_value_error(
                        FieldName::new("sort"),
                        raw,
                        format!("sort must be one of: {}", accepted.join(", ")),
                    )
                })?,
        };
        let direction = match self.order.as_deref().map(str::trim) {
            None | Some("") => SortDirection::Asc,
            Some(raw) if raw.eq_ignore_ascii_case("asc") => SortDirection::Asc,
            Some(raw) if raw.eq_ignore_ascii_case("desc") => SortDirection::Desc,
            Some(raw) => {
                return Err(invalid_value_error(
                    FieldName::new("order"),
                    raw,
                    "order must be asc or desc",
                ));
            }
        };
        Ok(Sort { field, direction })
    }
}

/// Trim an optional filter, dropping blanks.
pub(crate) fn filter_text(value: Option<String>) -> Option<String> {
    value
        .map(|raw| raw.trim().to_owned())
        .filter(|raw| !raw.is_empty())
}

/// JSON envelope for one page of a listing.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PageResponse<T> {
    pub items: Vec<T>,
    pub total: usize,
    pub skip: usize,
    pub limit: usize,
}

impl<T> PageResponse<T> {
    /// Convert a domain page, mapping each item to its response shape.
    pub fn from_page<U>(page: Page<U>, f: impl FnMut(U) -> T) -> Self {
        let page = page.map(f);
        Self {
            items: page.items,
            total: page.total,
            skip: page.skip,
            limit: page.limit,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pagination::{DEFAULT_LIMIT, MAX_LIMIT};
    use rstest::rstest;

    #[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
    enum Field {
        #[default]
        Code,
        Name,
    }

    const FIELDS: &[(&str, Field)] = &[("code", Field::Code), ("name", Field::Name)];

    fn params(sort: Option<&str>, order: Option<&str>) -> ListParams {
        ListParams {
            sort: sort.map(str::to_owned),
            order: order.map(str::to_owned),
            ..ListParams::default()
        }
    }

    #[rstest]
    #[case(None, None, Field::Code, SortDirection::Asc)]
    #[case(Some("Name"), Some("DESC"), Field::Name, SortDirection::Desc)]
    #[case(Some(""), Some("asc"), Field::Code, SortDirection::Asc)]
    fn sort_resolves_known_fields(
        #[case] sort: Option<&str>,
        #[case] order: Option<&str>,
        #[case] field: Field,
        #[case] direction: SortDirection,
    ) {
        let resolved = params(sort, order).sort(FIELDS).expect("sort");
        assert_eq!(resolved.field, field);
        assert_eq!(resolved.direction, direction);
    }

    #[rstest]
    #[case(Some("password"), None, "sort")]
    #[case(None, Some("sideways"), "order")]
    fn sort_rejects_unknown_values(
        #[case] sort: Option<&str>,
        #[case] order: Option<&str>,
        #[case] field: &str,
    ) {
        let err = params(sort, order).sort(FIELDS).expect_err("rejected");
        assert_eq!(err.details().expect("details")["field"], field);
    }

    #[rstest]
    fn page_defaults_when_omitted() {
        let page = ListParams::default().page().expect("defaults");
        assert_eq!(page.limit(), DEFAULT_LIMIT);
        assert_eq!(page.skip(), 0);
    }

    #[rstest]
    #[case(0)]
    #[case(MAX_LIMIT + 1)]
    fn out_of_range_limit_is_a_field_error(#[case] limit: usize) {
        let params = ListParams {
            limit: Some(limit),
            ..ListParams::default()
        };
        let err = params.page().expect_err("rejected");
        assert_eq!(err.code(), crate::domain::ErrorCode::InvalidRequest);
        let details = err.details().expect("details");
        assert_eq!(details["field"], "limit");
        assert_eq!(details["value"], limit.to_string());
    }

    #[rstest]
    fn largest_limit_is_accepted() {
        let params = ListParams {
            limit: Some(MAX_LIMIT),
            skip: Some(40),
            ..ListParams::default()
        };
        let page = params.page().expect("within bounds");
        assert_eq!((page.skip(), page.limit()), (40, MAX_LIMIT));
    }

    #[rstest]
    fn blank_search_is_dropped() {
        let blank = ListParams {
            search: Some("   ".to_owned()),
            ..ListParams::default()
        };
        assert_eq!(blank.search(), None);
        assert_eq!(filter_text(Some(" CSE ".to_owned())).as_deref(), Some("CSE"));
    }
}
