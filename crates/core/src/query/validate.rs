//! Parameter validation against an entity's allow-list.
//!
//! The policy is deliberately asymmetric:
//!
//! - **Filters reject loudly.** An unknown filter field changes result
//!   semantics in ways the caller must know about, so it fails the request
//!   with [`QueryError::UnknownFilterField`].
//! - **Sort, size, and search degrade silently.** A bad sort field is
//!   replaced with a default, an oversized page is clamped, and unknown
//!   search fields are dropped (clearing the query when none remain) —
//!   search refinement is best-effort.

use crate::error::QueryError;
use crate::query::params::{FilterParams, QueryParams, SearchParams, ALL_FIELDS};
use crate::query::supported::SupportedParams;

/// Page size used when the caller does not request one.
pub const DEFAULT_PAGE_SIZE: i64 = 20;

/// Sort field used when an entity declares no sort fields at all.
pub const FALLBACK_SORT_FIELD: &str = "created_at";

/// Sanitize pagination and sorting in place.
///
/// - Negative page numbers become 0.
/// - A missing size defaults to [`DEFAULT_PAGE_SIZE`]; any size is clamped
///   to `1..=max_page_size`.
/// - A missing or non-allow-listed sort field is replaced with the entity's
///   default ([`SupportedParams::default_sort_field`]).
pub fn validate_query_params(params: &mut QueryParams, supported: &SupportedParams) {
    if params.page < 0 {
        params.page = 0;
    }

    let size = params.size.unwrap_or(DEFAULT_PAGE_SIZE);
    params.size = Some(size.clamp(1, supported.max_page_size.max(1)));

    let sort_allowed = params
        .sort_by
        .as_deref()
        .is_some_and(|field| supported.allows_sort(field));
    if !sort_allowed {
        params.sort_by = Some(supported.default_sort_field().to_string());
    }
}

/// Check every filter criterion against the allow-list.
///
/// The `_all` pseudo-field is exempt: it expands over the entity's search
/// fields rather than naming a real column.
pub fn validate_filter_params(
    params: &FilterParams,
    supported: &SupportedParams,
) -> Result<(), QueryError> {
    for criterion in params.iter() {
        if criterion.field != ALL_FIELDS && !supported.allows_filter(&criterion.field) {
            return Err(QueryError::UnknownFilterField {
                field: criterion.field.clone(),
            });
        }
    }
    Ok(())
}

/// Sanitize search parameters in place.
///
/// Non-allow-listed fields are removed without error; if no fields remain
/// (or the query is blank), the query is cleared and search becomes a no-op.
pub fn validate_search_params(params: &mut SearchParams, supported: &SupportedParams) {
    params.fields.retain(|field| supported.allows_search(field));

    let blank = params.query.as_deref().map_or(true, |q| q.trim().is_empty());
    if params.fields.is_empty() || blank {
        params.query = None;
    }
}

/// Run all three validations for one request.
///
/// Silent corrections are applied first; the strict filter check is the only
/// fallible step.
pub fn validate(
    query: &mut QueryParams,
    filters: &FilterParams,
    search: &mut SearchParams,
    supported: &SupportedParams,
) -> Result<(), QueryError> {
    validate_query_params(query, supported);
    validate_search_params(search, supported);
    validate_filter_params(filters, supported)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
