//! End-to-end tests for the search flow:
//! registry -> validator -> specification builder -> service -> repository.
//!
//! Uses the in-memory adapter so the full pipeline runs without a database.

use std::sync::Arc;

use lexika_core::error::QueryError;
use lexika_core::query::{
    FilterOperator, FilterParams, ParamsRegistry, QueryParams, SearchParams, SortDirection,
    SupportedParams, Value,
};
use lexika_core::query::spec::FieldAccess;
use lexika_core::search::{
    InMemoryRepository, SearchRepository, SearchRequest, SearchService, SearchServiceFactory,
};

// ---------------------------------------------------------------------------
// Fixture entities
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
struct VocabularySet {
    id: i64,
    name: &'static str,
    category: &'static str,
    word_count: i64,
    description: Option<&'static str>,
}

impl FieldAccess for VocabularySet {
    fn field(&self, name: &str) -> Option<Value> {
        match name {
            "id" => Some(Value::Int(self.id)),
            "name" => Some(Value::Str(self.name.to_string())),
            "category" => Some(Value::Str(self.category.to_string())),
            "word_count" => Some(Value::Int(self.word_count)),
            "description" => Some(
                self.description
                    .map(|d| Value::Str(d.to_string()))
                    .unwrap_or(Value::Null),
            ),
            _ => None,
        }
    }
}

fn sets() -> Vec<VocabularySet> {
    vec![
        VocabularySet {
            id: 1,
            name: "Everyday verbs",
            category: "verbs",
            word_count: 120,
            description: Some("High-frequency verbs for daily use"),
        },
        VocabularySet {
            id: 2,
            name: "Kitchen nouns",
            category: "nouns",
            word_count: 45,
            description: None,
        },
        VocabularySet {
            id: 3,
            name: "Travel phrases",
            category: "phrases",
            word_count: 80,
            description: Some("Getting around town"),
        },
        VocabularySet {
            id: 4,
            name: "Irregular verbs",
            category: "verbs",
            word_count: 60,
            description: Some("The awkward ones"),
        },
    ]
}

fn registry() -> ParamsRegistry {
    ParamsRegistry::new().register(
        "vocabulary_set",
        SupportedParams::new()
            .sort_fields(&["name", "word_count", "created_at"])
            .filter_fields(&["category", "word_count", "description"])
            .search_fields(&["name", "description"])
            .max_page_size(50),
    )
}

fn service() -> Arc<SearchService<VocabularySet>> {
    let factory = SearchServiceFactory::new();
    factory.get_or_create("vocabulary_set", || {
        Arc::new(InMemoryRepository::new(sets())) as Arc<dyn SearchRepository<VocabularySet>>
    })
}

// ---------------------------------------------------------------------------
// Full pipeline
// ---------------------------------------------------------------------------

#[tokio::test]
async fn filter_search_sort_and_paginate() {
    let registry = registry();
    let supported = registry.get("vocabulary_set").unwrap();

    let request = SearchRequest::new()
        .query(QueryParams::new(0, 10).sorted_by("word_count", SortDirection::Desc))
        .filters(FilterParams::new().with("category", FilterOperator::Eq, "verbs"))
        .search(SearchParams::new("verbs", &["name"]));

    let page = service().search(&supported, request).await.unwrap();
    assert_eq!(page.total_elements, 2);
    let ids: Vec<i64> = page.content.iter().map(|s| s.id).collect();
    assert_eq!(ids, vec![1, 4]);
    assert!(!page.has_next);
}

#[tokio::test]
async fn the_degradation_scenario() {
    // sortBy not allowed, size over the max, a search field that is not
    // searchable: every correction is silent, and the request still runs.
    let registry = registry();
    let supported = registry.get("vocabulary_set").unwrap();

    let request = SearchRequest::new()
        .query(QueryParams::new(0, 500).sorted_by("price", SortDirection::Asc))
        .search(SearchParams::new("verbs", &["category"]));

    let page = service().search(&supported, request).await.unwrap();
    // Search degraded to a no-op, so everything matched.
    assert_eq!(page.total_elements, 4);
    // Effective size is the entity max.
    assert_eq!(page.size, 50);
    // Effective sort is the first allow-listed field ("name").
    assert_eq!(page.content[0].name, "Everyday verbs");
}

#[tokio::test]
async fn strict_filter_rejection_names_the_field() {
    let registry = registry();
    let supported = registry.get("vocabulary_set").unwrap();

    let request = SearchRequest::new()
        .filters(FilterParams::new().with("owner", FilterOperator::Eq, "x"));

    let err = service().search(&supported, request).await.unwrap_err();
    match err {
        QueryError::UnknownFilterField { field } => assert_eq!(field, "owner"),
        other => panic!("expected UnknownFilterField, got {other:?}"),
    }
}

#[tokio::test]
async fn all_pseudo_field_searches_configured_fields() {
    let registry = registry();
    let supported = registry.get("vocabulary_set").unwrap();

    // "_all" expands over search_fields (name, description): "around"
    // appears only in set 3's description.
    let request = SearchRequest::new()
        .filters(FilterParams::new().with("_all", FilterOperator::Contains, "around"));

    let page = service().search(&supported, request).await.unwrap();
    assert_eq!(page.total_elements, 1);
    assert_eq!(page.content[0].id, 3);
}

#[tokio::test]
async fn null_description_filter() {
    let registry = registry();
    let supported = registry.get("vocabulary_set").unwrap();

    let request = SearchRequest::new()
        .filters(FilterParams::new().with_unary("description", FilterOperator::IsNull));

    let page = service().search(&supported, request).await.unwrap();
    assert_eq!(page.total_elements, 1);
    assert_eq!(page.content[0].id, 2);
}

#[tokio::test]
async fn empty_criteria_round_trip_equals_unfiltered_find_all() {
    let registry = registry();
    let supported = registry.get("vocabulary_set").unwrap();
    let svc = service();

    let all = svc
        .find_all(&supported, SearchRequest::new())
        .await
        .unwrap();
    assert_eq!(all.len(), sets().len());

    let counted = svc.count(&supported, SearchRequest::new()).await.unwrap();
    assert_eq!(counted, sets().len() as i64);
}

#[tokio::test]
async fn pagination_metadata_across_pages() {
    let registry = registry();
    let supported = registry.get("vocabulary_set").unwrap();
    let svc = service();

    let first = svc
        .search(
            &supported,
            SearchRequest::new().query(QueryParams::new(0, 3)),
        )
        .await
        .unwrap();
    assert_eq!(first.total_pages, 2);
    assert!(!first.has_previous);
    assert!(first.has_next);
    assert_eq!(first.content.len(), 3);

    let second = svc
        .search(
            &supported,
            SearchRequest::new().query(QueryParams::new(1, 3)),
        )
        .await
        .unwrap();
    assert!(second.has_previous);
    assert!(!second.has_next);
    assert_eq!(second.content.len(), 1);
}

#[tokio::test]
async fn unknown_entity_type_is_rejected_by_the_registry() {
    let err = registry().get("lesson").unwrap_err();
    match err {
        QueryError::UnknownEntityType { entity } => assert_eq!(entity, "lesson"),
        other => panic!("expected UnknownEntityType, got {other:?}"),
    }
}
