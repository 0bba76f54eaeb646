//! Generic, entity-agnostic search orchestration.
//!
//! A [`SearchService`] validates the caller's raw parameters against the
//! entity's allow-list, compiles them into a [`Specification`], delegates
//! retrieval to the repository port, and wraps the result in a uniform
//! [`PageResponse`]. Services hold no per-entity configuration: the
//! allow-list is passed with every call, so a cached instance can be shared
//! freely across request threads.

use std::sync::Arc;

use crate::error::QueryError;
use crate::query::page::{PageRequest, PageResponse, SortSpec};
use crate::query::params::{FilterParams, QueryParams, SearchParams};
use crate::query::spec::{build_specification, Specification};
use crate::query::supported::SupportedParams;
use crate::query::validate::validate;
use crate::search::repository::SearchRepository;

/// Raw caller input for one search: pagination/sort, filters, free text.
#[derive(Debug, Clone, Default)]
pub struct SearchRequest {
    pub query: QueryParams,
    pub filters: FilterParams,
    pub search: SearchParams,
}

impl SearchRequest {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn query(mut self, query: QueryParams) -> Self {
        self.query = query;
        self
    }

    pub fn filters(mut self, filters: FilterParams) -> Self {
        self.filters = filters;
        self
    }

    pub fn search(mut self, search: SearchParams) -> Self {
        self.search = search;
        self
    }
}

/// Entity-agnostic search execution over a repository port.
///
/// Read-only: nothing here writes to storage.
pub struct SearchService<E> {
    entity_type: String,
    repository: Arc<dyn SearchRepository<E>>,
}

impl<E> SearchService<E> {
    pub fn new(entity_type: impl Into<String>, repository: Arc<dyn SearchRepository<E>>) -> Self {
        Self {
            entity_type: entity_type.into(),
            repository,
        }
    }

    pub fn entity_type(&self) -> &str {
        &self.entity_type
    }

    /// Execute a paginated search.
    pub async fn search(
        &self,
        supported: &SupportedParams,
        request: SearchRequest,
    ) -> Result<PageResponse<E>, QueryError> {
        let (spec, query) = prepare(request, supported)?;
        let page_request = PageRequest::from_query(&query);

        let slice = self.repository.find_all(&spec, &page_request).await?;
        tracing::debug!(
            entity = %self.entity_type,
            total = slice.total,
            returned = slice.items.len(),
            page = query.page,
            "Search executed",
        );

        let size = page_request.limit.unwrap_or(0);
        Ok(PageResponse::new(slice.items, query.page, size, slice.total))
    }

    /// Execute a paginated search, mapping each result element.
    pub async fn search_mapped<D>(
        &self,
        supported: &SupportedParams,
        request: SearchRequest,
        map: impl FnMut(E) -> D,
    ) -> Result<PageResponse<D>, QueryError> {
        Ok(self.search(supported, request).await?.map(map))
    }

    /// Count the entities matching the request's criteria.
    pub async fn count(
        &self,
        supported: &SupportedParams,
        request: SearchRequest,
    ) -> Result<i64, QueryError> {
        let (spec, _) = prepare(request, supported)?;
        Ok(self.repository.count(&spec).await?)
    }

    /// Retrieve every matching entity (no pagination), sorted.
    pub async fn find_all(
        &self,
        supported: &SupportedParams,
        request: SearchRequest,
    ) -> Result<Vec<E>, QueryError> {
        let (spec, query) = prepare(request, supported)?;
        let sort = query.sort_by.as_ref().map(|field| SortSpec {
            field: field.clone(),
            direction: query.sort_dir,
        });

        let slice = self
            .repository
            .find_all(&spec, &PageRequest::unpaged(sort))
            .await?;
        Ok(slice.items)
    }
}

/// Validate the request in place and compile its specification.
fn prepare(
    mut request: SearchRequest,
    supported: &SupportedParams,
) -> Result<(Specification, QueryParams), QueryError> {
    validate(
        &mut request.query,
        &request.filters,
        &mut request.search,
        supported,
    )?;
    let spec = build_specification(&request.filters, &request.search, supported)?;
    Ok((spec, request.query))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
