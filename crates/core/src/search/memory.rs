//! In-memory repository adapter.
//!
//! Evaluates specifications directly against entities via [`FieldAccess`].
//! Useful as the reference implementation of the port semantics and as the
//! test vehicle for everything above the storage layer.

use async_trait::async_trait;

use crate::error::RepositoryError;
use crate::query::page::{PageRequest, PageSlice};
use crate::query::params::{SortDirection, Value};
use crate::query::spec::{FieldAccess, Specification};
use crate::search::repository::SearchRepository;

/// A fixed in-memory collection of entities.
pub struct InMemoryRepository<E> {
    items: Vec<E>,
}

impl<E> InMemoryRepository<E> {
    pub fn new(items: Vec<E>) -> Self {
        Self { items }
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

#[async_trait]
impl<E> SearchRepository<E> for InMemoryRepository<E>
where
    E: FieldAccess + Clone + Send + Sync,
{
    async fn find_all(
        &self,
        spec: &Specification,
        page: &PageRequest,
    ) -> Result<PageSlice<E>, RepositoryError> {
        let mut matches: Vec<E> = self
            .items
            .iter()
            .filter(|item| spec.evaluate(*item))
            .cloned()
            .collect();
        let total = matches.len() as i64;

        if let Some(sort) = &page.sort {
            matches.sort_by(|a, b| compare_by_field(a, b, &sort.field));
            if sort.direction == SortDirection::Desc {
                matches.reverse();
            }
        }

        let offset = page.offset.max(0) as usize;
        let items: Vec<E> = match page.limit {
            Some(limit) => matches
                .into_iter()
                .skip(offset)
                .take(limit.max(0) as usize)
                .collect(),
            None => matches.into_iter().skip(offset).collect(),
        };

        Ok(PageSlice { items, total })
    }

    async fn count(&self, spec: &Specification) -> Result<i64, RepositoryError> {
        Ok(self.items.iter().filter(|item| spec.evaluate(*item)).count() as i64)
    }
}

/// Ascending comparison on one attribute; null/missing values sort last,
/// matching the Postgres default.
fn compare_by_field<E: FieldAccess>(a: &E, b: &E, field: &str) -> std::cmp::Ordering {
    use std::cmp::Ordering;

    let left = a.field(field).filter(|v| !v.is_null());
    let right = b.field(field).filter(|v| !v.is_null());
    match (left, right) {
        (Some(l), Some(r)) => Value::compare(&l, &r).unwrap_or(Ordering::Equal),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
