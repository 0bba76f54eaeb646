//! Repository port for specification-based retrieval.
//!
//! The search service talks to storage exclusively through this trait; the
//! predicate stays an opaque [`Specification`] so adapters decide how to
//! execute it (translate to SQL, evaluate in memory, ...).

use async_trait::async_trait;

use crate::error::RepositoryError;
use crate::query::page::{PageRequest, PageSlice};
use crate::query::spec::Specification;

/// Read-only access to one entity collection.
#[async_trait]
pub trait SearchRepository<E>: Send + Sync {
    /// Retrieve the entities matching `spec` within the requested window,
    /// together with the total match count.
    async fn find_all(
        &self,
        spec: &Specification,
        page: &PageRequest,
    ) -> Result<PageSlice<E>, RepositoryError>;

    /// Count the entities matching `spec`.
    async fn count(&self, spec: &Specification) -> Result<i64, RepositoryError>;
}
