//! Per-entity allow-lists for sortable, filterable, and searchable fields.
//!
//! Allow-lists live in an explicit registry built at startup and read-only
//! at request time. Deployments declare them in code or deserialize them
//! from configuration JSON; nothing is discovered reflectively.

use std::collections::HashMap;
use std::sync::Arc;

use serde::Deserialize;

use crate::error::QueryError;

/// Default cap on page size when an entity does not declare its own.
pub const DEFAULT_MAX_PAGE_SIZE: i64 = 100;

fn default_max_page_size() -> i64 {
    DEFAULT_MAX_PAGE_SIZE
}

/// Allow-listed query surface of one entity type.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SupportedParams {
    /// Fields results may be sorted by. The first entry is the default sort.
    #[serde(default)]
    pub sort_fields: Vec<String>,
    /// Fields filter criteria may reference.
    #[serde(default)]
    pub filter_fields: Vec<String>,
    /// Fields free-text search (and `_all` expansion) may target.
    #[serde(default)]
    pub search_fields: Vec<String>,
    /// Maximum permitted page size.
    #[serde(default = "default_max_page_size")]
    pub max_page_size: i64,
}

impl Default for SupportedParams {
    fn default() -> Self {
        Self {
            sort_fields: Vec::new(),
            filter_fields: Vec::new(),
            search_fields: Vec::new(),
            max_page_size: DEFAULT_MAX_PAGE_SIZE,
        }
    }
}

impl SupportedParams {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sort_fields(mut self, fields: &[&str]) -> Self {
        self.sort_fields = fields.iter().map(|f| f.to_string()).collect();
        self
    }

    pub fn filter_fields(mut self, fields: &[&str]) -> Self {
        self.filter_fields = fields.iter().map(|f| f.to_string()).collect();
        self
    }

    pub fn search_fields(mut self, fields: &[&str]) -> Self {
        self.search_fields = fields.iter().map(|f| f.to_string()).collect();
        self
    }

    pub fn max_page_size(mut self, max: i64) -> Self {
        self.max_page_size = max;
        self
    }

    pub fn allows_sort(&self, field: &str) -> bool {
        self.sort_fields.iter().any(|f| f == field)
    }

    pub fn allows_filter(&self, field: &str) -> bool {
        self.filter_fields.iter().any(|f| f == field)
    }

    pub fn allows_search(&self, field: &str) -> bool {
        self.search_fields.iter().any(|f| f == field)
    }

    /// The sort field used when the requested one is absent or rejected:
    /// first allow-listed field, falling back to `created_at`.
    pub fn default_sort_field(&self) -> &str {
        self.sort_fields
            .first()
            .map(String::as_str)
            .unwrap_or(super::validate::FALLBACK_SORT_FIELD)
    }
}

/// Registry mapping entity-type identifiers to their allow-lists.
///
/// Built once at startup, then shared read-only across request threads.
#[derive(Debug, Default)]
pub struct ParamsRegistry {
    entries: HashMap<String, Arc<SupportedParams>>,
}

impl ParamsRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare the allow-list for an entity type. Re-registering replaces
    /// the previous entry.
    pub fn register(mut self, entity_type: impl Into<String>, params: SupportedParams) -> Self {
        self.entries.insert(entity_type.into(), Arc::new(params));
        self
    }

    /// Build a registry from deserialized configuration.
    pub fn from_map(entries: HashMap<String, SupportedParams>) -> Self {
        Self {
            entries: entries
                .into_iter()
                .map(|(k, v)| (k, Arc::new(v)))
                .collect(),
        }
    }

    /// Look up an entity's allow-list.
    pub fn get(&self, entity_type: &str) -> Result<Arc<SupportedParams>, QueryError> {
        self.entries
            .get(entity_type)
            .cloned()
            .ok_or_else(|| QueryError::UnknownEntityType {
                entity: entity_type.to_string(),
            })
    }

    pub fn contains(&self, entity_type: &str) -> bool {
        self.entries.contains_key(entity_type)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn word_params() -> SupportedParams {
        SupportedParams::new()
            .sort_fields(&["name", "created_at"])
            .filter_fields(&["category", "level"])
            .search_fields(&["name", "translation"])
            .max_page_size(50)
    }

    // -- SupportedParams -----------------------------------------------------

    #[test]
    fn membership_checks() {
        let params = word_params();
        assert!(params.allows_sort("name"));
        assert!(!params.allows_sort("category"));
        assert!(params.allows_filter("level"));
        assert!(!params.allows_filter("name"));
        assert!(params.allows_search("translation"));
        assert!(!params.allows_search("level"));
    }

    #[test]
    fn default_sort_is_first_allowed_field() {
        assert_eq!(word_params().default_sort_field(), "name");
    }

    #[test]
    fn default_sort_falls_back_when_no_sort_fields() {
        assert_eq!(SupportedParams::new().default_sort_field(), "created_at");
    }

    #[test]
    fn deserialize_fills_defaults() {
        let params: SupportedParams =
            serde_json::from_str(r#"{"sort_fields": ["name"]}"#).unwrap();
        assert_eq!(params.sort_fields, vec!["name"]);
        assert!(params.filter_fields.is_empty());
        assert_eq!(params.max_page_size, DEFAULT_MAX_PAGE_SIZE);
    }

    // -- ParamsRegistry ------------------------------------------------------

    #[test]
    fn registry_lookup() {
        let registry = ParamsRegistry::new().register("word", word_params());
        assert!(registry.contains("word"));
        assert_eq!(registry.get("word").unwrap().max_page_size, 50);
    }

    #[test]
    fn registry_rejects_unknown_entity() {
        let registry = ParamsRegistry::new();
        let err = registry.get("verb").unwrap_err();
        assert!(matches!(
            err,
            QueryError::UnknownEntityType { entity } if entity == "verb"
        ));
    }

    #[test]
    fn registry_from_config_json() {
        let json = r#"{
            "word": {"sort_fields": ["name"], "filter_fields": ["level"], "max_page_size": 25},
            "user": {"search_fields": ["email"]}
        }"#;
        let entries: HashMap<String, SupportedParams> = serde_json::from_str(json).unwrap();
        let registry = ParamsRegistry::from_map(entries);
        assert_eq!(registry.get("word").unwrap().max_page_size, 25);
        assert!(registry.get("user").unwrap().allows_search("email"));
    }
}
