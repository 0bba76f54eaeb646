//! Cache of one search service per entity type.
//!
//! Services are immutable (allow-lists travel with each call), so a cached
//! instance can be handed to any number of request threads. The cache keys
//! on the entity's Rust type, which makes the downcast below infallible by
//! construction.

use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use crate::search::repository::SearchRepository;
use crate::search::service::SearchService;

/// Lazily constructs and caches [`SearchService`] instances.
#[derive(Default)]
pub struct SearchServiceFactory {
    services: Mutex<HashMap<TypeId, Arc<dyn Any + Send + Sync>>>,
}

impl SearchServiceFactory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fetch the service for an entity type, constructing it on first use.
    ///
    /// The repository closure runs only when the cache is cold; subsequent
    /// calls return the same instance and ignore both arguments. Lookup and
    /// insertion happen under one lock, so concurrent first calls still
    /// construct exactly once.
    pub fn get_or_create<E>(
        &self,
        entity_type: &str,
        repository: impl FnOnce() -> Arc<dyn SearchRepository<E>>,
    ) -> Arc<SearchService<E>>
    where
        E: Send + Sync + 'static,
    {
        let mut services = self.services.lock().expect("service cache lock poisoned");
        let entry = services
            .entry(TypeId::of::<E>())
            .or_insert_with(|| Arc::new(SearchService::new(entity_type, repository())));
        Arc::clone(entry)
            .downcast::<SearchService<E>>()
            .expect("service cache keyed by entity TypeId")
    }

    /// Number of cached services.
    pub fn len(&self) -> usize {
        self.services.lock().expect("service cache lock poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
