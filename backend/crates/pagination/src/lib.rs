//! Offset pagination and sorting primitives shared by registrar list endpoints.
//!
//! List operations accept a [`PageRequest`] (skip/limit window) and an
//! optional [`Sort`] over a resource-specific field enum, and return a
//! [`Page`] envelope carrying the window alongside the total match count.
//!
//! ```
//! use pagination::{Page, PageRequest};
//!
//! let request = PageRequest::new(0, 2).expect("valid window");
//! let page = Page::from_slice(&[1, 2, 3], request);
//! assert_eq!(page.items, vec![1, 2]);
//! assert_eq!(page.total, 3);
//! ```

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Default number of items returned when a caller omits `limit`.
pub const DEFAULT_LIMIT: usize = 20;

/// Upper bound on `limit` accepted from callers.
pub const MAX_LIMIT: usize = 100;

/// Errors raised when a pagination window is out of range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum PageRequestError {
    /// `limit` was zero.
    #[error("limit must be at least 1")]
    ZeroLimit,
    /// `limit` exceeded [`MAX_LIMIT`].
    #[error("limit must not exceed {max}")]
    LimitTooLarge {
        /// Largest accepted limit.
        max: usize,
    },
}

/// Requested skip/limit window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageRequest {
    skip: usize,
    limit: usize,
}

impl PageRequest {
    /// Validate and build a window.
    ///
    /// # Errors
    ///
    /// Returns [`PageRequestError`] when `limit` is zero or above
    /// [`MAX_LIMIT`].
    pub const fn new(skip: usize, limit: usize) -> Result<Self, PageRequestError> {
        if limit == 0 {
            return Err(PageRequestError::ZeroLimit);
        }
        if limit > MAX_LIMIT {
            return Err(PageRequestError::LimitTooLarge { max: MAX_LIMIT });
        }
        Ok(Self { skip, limit })
    }

    /// Build a window from optional query values, applying defaults.
    /// Out-of-range limits are rejected, never clamped.
    ///
    /// # Errors
    ///
    /// Propagates [`PageRequest::new`] validation failures.
    pub fn from_query(
        skip: Option<usize>,
        limit: Option<usize>,
    ) -> Result<Self, PageRequestError> {
        Self::new(skip.unwrap_or(0), limit.unwrap_or(DEFAULT_LIMIT))
    }

    /// Number of leading matches to skip.
    #[must_use]
    pub const fn skip(&self) -> usize {
        self.skip
    }

    /// Maximum number of items to return.
    #[must_use]
    pub const fn limit(&self) -> usize {
        self.limit
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            skip: 0,
            limit: DEFAULT_LIMIT,
        }
    }
}

/// A window of results plus the total number of matches.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Page<T> {
    /// Items inside the requested window.
    pub items: Vec<T>,
    /// Total number of matches before windowing.
    pub total: usize,
    /// Echo of the applied skip.
    pub skip: usize,
    /// Echo of the applied limit.
    pub limit: usize,
}

impl<T> Page<T> {
    /// Wrap an already-windowed result set.
    #[must_use]
    pub const fn new(items: Vec<T>, total: usize, request: PageRequest) -> Self {
        Self {
            items,
            total,
            skip: request.skip,
            limit: request.limit,
        }
    }

    /// Window an in-memory, already-sorted slice.
    #[must_use]
    pub fn from_slice(all: &[T], request: PageRequest) -> Self
    where
        T: Clone,
    {
        let items = all
            .iter()
            .skip(request.skip)
            .take(request.limit)
            .cloned()
            .collect();
        Self::new(items, all.len(), request)
    }

    /// Convert each item while keeping the window metadata.
    #[must_use]
    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            items: self.items.into_iter().map(f).collect(),
            total: self.total,
            skip: self.skip,
            limit: self.limit,
        }
    }
}

/// Sort direction for list endpoints.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    /// Smallest first.
    #[default]
    Asc,
    /// Largest first.
    Desc,
}

impl SortDirection {
    /// Apply the direction to an ascending comparison result.
    #[must_use]
    pub const fn apply(self, ordering: std::cmp::Ordering) -> std::cmp::Ordering {
        match self {
            Self::Asc => ordering,
            Self::Desc => ordering.reverse(),
        }
    }
}

/// Sort order over a resource-specific field enum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sort<F> {
    /// Field to order by.
    pub field: F,
    /// Ordering direction.
    pub direction: SortDirection,
}

impl<F> Sort<F> {
    /// Ascending sort on `field`.
    #[must_use]
    pub const fn asc(field: F) -> Self {
        Self {
            field,
            direction: SortDirection::Asc,
        }
    }

    /// Descending sort on `field`.
    #[must_use]
    pub const fn desc(field: F) -> Self {
        Self {
            field,
            direction: SortDirection::Desc,
        }
    }
}
