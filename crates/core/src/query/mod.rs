//! Criteria model, validation, and specification building.
//!
//! The pipeline: raw [`params`] from the caller → [`validate`] against the
//! entity's [`supported`] allow-list → [`spec`] compiles a composable
//! predicate → a repository executes it with a [`page`] window.

pub mod page;
pub mod params;
pub mod spec;
pub mod supported;
pub mod validate;

pub use page::{PageRequest, PageResponse, PageSlice, SortSpec};
pub use params::{
    FilterCriterion, FilterOperator, FilterParams, FilterValue, QueryParams, SearchParams,
    SortDirection, Value, ALL_FIELDS,
};
pub use spec::{build_specification, CompareOp, FieldAccess, MatchKind, Specification};
pub use supported::{ParamsRegistry, SupportedParams};
pub use validate::{validate, DEFAULT_PAGE_SIZE, FALLBACK_SORT_FIELD};
