//! Page/limit pagination primitives shared by list endpoints.
//!
//! A [`PageRequest`] is validated once at the edge and then carried through
//! services and repositories. Repositories report the total row count and the
//! slice they loaded; [`Paginated::new`] derives the envelope metadata so every
//! endpoint computes `totalPages` the same way.

use serde::{Deserialize, Serialize};

/// Page number used when the client omits `page`.
pub const DEFAULT_PAGE: u32 = 1;
/// Page size used when the client omits `limit`.
pub const DEFAULT_LIMIT: u32 = 10;
/// Largest page size a client may request.
pub const MAX_LIMIT: u32 = 100;

/// Validation failures for page requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum PaginationError {
    /// `page` was zero.
    #[error("page must be at least 1")]
    PageOutOfRange,
    /// `limit` was zero or above [`MAX_LIMIT`].
    #[error("limit must be between 1 and {max}")]
    LimitOutOfRange {
        /// Largest accepted limit.
        max: u32,
    },
}

/// Validated one-based page request.
///
/// # Examples
/// ```
/// use pagination::PageRequest;
///
/// let request = PageRequest::new(Some(3), Some(20)).expect("valid request");
/// assert_eq!(request.offset(), 40);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PageRequest {
    page: u32,
    limit: u32,
}

impl PageRequest {
    /// Build a request, substituting defaults for missing values.
    ///
    /// # Errors
    ///
    /// Returns [`PaginationError`] when `page` is zero or `limit` falls outside
    /// `1..=MAX_LIMIT`.
    pub fn new(page: Option<u32>, limit: Option<u32>) -> Result<Self, PaginationError> {
        let page = page.unwrap_or(DEFAULT_PAGE);
        let limit = limit.unwrap_or(DEFAULT_LIMIT);
        if page == 0 {
            return Err(PaginationError::PageOutOfRange);
        }
        if limit == 0 || limit > MAX_LIMIT {
            return Err(PaginationError::LimitOutOfRange { max: MAX_LIMIT });
        }
        Ok(Self { page, limit })
    }

    /// One-based page number.
    #[must_use]
    pub const fn page(&self) -> u32 {
        self.page
    }

    /// Maximum number of items on the page.
    #[must_use]
    pub const fn limit(&self) -> u32 {
        self.limit
    }

    /// Number of rows to skip before the page starts.
    #[must_use]
    pub const fn offset(&self) -> u64 {
        (self.page as u64 - 1) * self.limit as u64
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            page: DEFAULT_PAGE,
            limit: DEFAULT_LIMIT,
        }
    }
}

/// Pagination metadata returned alongside a page of items.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageInfo {
    /// One-based page number that was served.
    pub page: u32,
    /// Requested page size.
    pub limit: u32,
    /// Total number of items across all pages.
    pub total: u64,
    /// Number of pages needed to list `total` items at `limit` per page.
    pub total_pages: u64,
}

impl PageInfo {
    /// Derive metadata for `request` given the total item count.
    #[must_use]
    pub const fn new(request: PageRequest, total: u64) -> Self {
        Self {
            page: request.page,
            limit: request.limit,
            total,
            total_pages: total.div_ceil(request.limit as u64),
        }
    }
}

/// A single page of items plus its metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Paginated<T> {
    /// Items on the current page.
    pub items: Vec<T>,
    /// Metadata describing the page.
    pub pagination: PageInfo,
}

impl<T> Paginated<T> {
    /// Wrap a loaded slice with metadata derived from `request` and `total`.
    #[must_use]
    pub const fn new(items: Vec<T>, request: PageRequest, total: u64) -> Self {
        Self {
            items,
            pagination: PageInfo::new(request, total),
        }
    }

    /// Transform every item while keeping the metadata.
    #[must_use]
    pub fn map<U, F>(self, f: F) -> Paginated<U>
    where
        F: FnMut(T) -> U,
    {
        Paginated {
            items: self.items.into_iter().map(f).collect(),
            pagination: self.pagination,
        }
    }
}
