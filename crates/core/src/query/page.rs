//! Page request/response types.
//!
//! [`PageRequest`] is the directive handed to a repository (offset, limit,
//! sort); [`PageResponse`] is the uniform paged envelope returned to the
//! caller, with metadata derived from the total match count.

use serde::Serialize;

use crate::query::params::{QueryParams, SortDirection};
use crate::query::validate::DEFAULT_PAGE_SIZE;

/// A sort directive resolved by validation (field is allow-listed).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SortSpec {
    pub field: String,
    pub direction: SortDirection,
}

/// Retrieval window handed to a repository.
#[derive(Debug, Clone, PartialEq)]
pub struct PageRequest {
    /// Number of leading matches to skip.
    pub offset: i64,
    /// Window size; `None` retrieves everything after `offset`.
    pub limit: Option<i64>,
    pub sort: Option<SortSpec>,
}

impl PageRequest {
    /// Derive a window from validated [`QueryParams`].
    pub fn from_query(params: &QueryParams) -> Self {
        let size = params.size.unwrap_or(DEFAULT_PAGE_SIZE);
        Self {
            offset: params.page * size,
            limit: Some(size),
            sort: params.sort_by.as_ref().map(|field| SortSpec {
                field: field.clone(),
                direction: params.sort_dir,
            }),
        }
    }

    /// An unbounded request (used by `find_all`), optionally sorted.
    pub fn unpaged(sort: Option<SortSpec>) -> Self {
        Self {
            offset: 0,
            limit: None,
            sort,
        }
    }
}

/// One retrieval result: the requested window plus the total match count.
#[derive(Debug, Clone)]
pub struct PageSlice<E> {
    pub items: Vec<E>,
    pub total: i64,
}

/// Uniform paged response envelope.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PageResponse<T> {
    pub content: Vec<T>,
    /// Zero-based page number.
    pub page: i64,
    pub size: i64,
    pub total_elements: i64,
    pub total_pages: i64,
    pub has_previous: bool,
    pub has_next: bool,
}

impl<T> PageResponse<T> {
    /// Assemble a page, deriving metadata from the totals.
    ///
    /// `total_pages` is `ceil(total_elements / size)` (0 when `size` is 0);
    /// `has_previous` is `page > 0`; `has_next` is `page + 1 < total_pages`.
    pub fn new(content: Vec<T>, page: i64, size: i64, total_elements: i64) -> Self {
        let total_pages = if size > 0 {
            (total_elements + size - 1) / size
        } else {
            0
        };
        Self {
            content,
            page,
            size,
            total_elements,
            total_pages,
            has_previous: page > 0,
            has_next: page + 1 < total_pages,
        }
    }

    /// Transform the content while keeping the page metadata.
    pub fn map<U>(self, f: impl FnMut(T) -> U) -> PageResponse<U> {
        PageResponse {
            content: self.content.into_iter().map(f).collect(),
            page: self.page,
            size: self.size,
            total_elements: self.total_elements,
            total_pages: self.total_pages,
            has_previous: self.has_previous,
            has_next: self.has_next,
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
