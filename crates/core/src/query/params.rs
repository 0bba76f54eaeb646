//! Criteria model: filter, search, and pagination parameter types.
//!
//! These are the value objects a caller hands to the search service. They
//! carry raw, untrusted input; `query::validate` checks them against an
//! entity's [`SupportedParams`](super::supported::SupportedParams) before
//! anything reaches a repository.

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::QueryError;
use crate::types::Timestamp;

/// Pseudo-field that expands a criterion into an OR of pattern matches
/// across every configured search field.
pub const ALL_FIELDS: &str = "_all";

// ---------------------------------------------------------------------------
// Scalar values
// ---------------------------------------------------------------------------

/// A scalar value in a criterion or an entity attribute.
///
/// JSON input maps onto `Null`/`Bool`/`Int`/`Float`/`Str`; `Timestamp` is
/// constructed programmatically (via `From<Timestamp>`) since JSON carries
/// timestamps as strings.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    Timestamp(Timestamp),
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// The string payload, if this is a `Str`.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }

    /// Ordering comparison with numeric coercion between `Int` and `Float`.
    ///
    /// Returns `None` for cross-kind comparisons and anything involving
    /// `Null`; callers treat that as "does not match".
    pub fn compare(&self, other: &Value) -> Option<Ordering> {
        match (self, other) {
            (Value::Int(a), Value::Int(b)) => Some(a.cmp(b)),
            (Value::Float(a), Value::Float(b)) => a.partial_cmp(b),
            (Value::Int(a), Value::Float(b)) => (*a as f64).partial_cmp(b),
            (Value::Float(a), Value::Int(b)) => a.partial_cmp(&(*b as f64)),
            (Value::Str(a), Value::Str(b)) => Some(a.cmp(b)),
            (Value::Bool(a), Value::Bool(b)) => Some(a.cmp(b)),
            (Value::Timestamp(a), Value::Timestamp(b)) => Some(a.cmp(b)),
            _ => None,
        }
    }
}

impl<'de> Deserialize<'de> for Value {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let raw = serde_json::Value::deserialize(deserializer)?;
        Value::try_from(raw).map_err(serde::de::Error::custom)
    }
}

impl TryFrom<serde_json::Value> for Value {
    type Error = String;

    fn try_from(raw: serde_json::Value) -> Result<Self, Self::Error> {
        match raw {
            serde_json::Value::Null => Ok(Value::Null),
            serde_json::Value::Bool(b) => Ok(Value::Bool(b)),
            serde_json::Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    Ok(Value::Int(i))
                } else if let Some(f) = n.as_f64() {
                    Ok(Value::Float(f))
                } else {
                    Err(format!("number out of range: {n}"))
                }
            }
            serde_json::Value::String(s) => Ok(Value::Str(s)),
            other => Err(format!("expected a scalar value, got {other}")),
        }
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Int(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Float(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Str(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Str(v)
    }
}

impl From<Timestamp> for Value {
    fn from(v: Timestamp) -> Self {
        Value::Timestamp(v)
    }
}

// ---------------------------------------------------------------------------
// Filter criteria
// ---------------------------------------------------------------------------

/// Operand of a single criterion: one scalar or a list of scalars.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FilterValue {
    List(Vec<Value>),
    Scalar(Value),
}

impl From<Value> for FilterValue {
    fn from(v: Value) -> Self {
        FilterValue::Scalar(v)
    }
}

impl From<Vec<Value>> for FilterValue {
    fn from(v: Vec<Value>) -> Self {
        FilterValue::List(v)
    }
}

impl From<bool> for FilterValue {
    fn from(v: bool) -> Self {
        FilterValue::Scalar(v.into())
    }
}

impl From<i64> for FilterValue {
    fn from(v: i64) -> Self {
        FilterValue::Scalar(v.into())
    }
}

impl From<f64> for FilterValue {
    fn from(v: f64) -> Self {
        FilterValue::Scalar(v.into())
    }
}

impl From<&str> for FilterValue {
    fn from(v: &str) -> Self {
        FilterValue::Scalar(v.into())
    }
}

impl From<String> for FilterValue {
    fn from(v: String) -> Self {
        FilterValue::Scalar(v.into())
    }
}

impl From<Timestamp> for FilterValue {
    fn from(v: Timestamp) -> Self {
        FilterValue::Scalar(v.into())
    }
}

/// Filter operator codes.
///
/// The wire codes (`eq`, `nin`, `is_null`, ...) are fixed; an unknown code
/// fails parsing with [`QueryError::UnknownOperator`] before any repository
/// call is made.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FilterOperator {
    Eq,
    Ne,
    Gt,
    Gte,
    Lt,
    Lte,
    In,
    #[serde(rename = "nin")]
    NotIn,
    Between,
    Like,
    Exists,
    Contains,
    StartsWith,
    EndsWith,
    IsNull,
    IsNotNull,
}

impl FilterOperator {
    /// The wire code for this operator.
    pub fn code(&self) -> &'static str {
        match self {
            FilterOperator::Eq => "eq",
            FilterOperator::Ne => "ne",
            FilterOperator::Gt => "gt",
            FilterOperator::Gte => "gte",
            FilterOperator::Lt => "lt",
            FilterOperator::Lte => "lte",
            FilterOperator::In => "in",
            FilterOperator::NotIn => "nin",
            FilterOperator::Between => "between",
            FilterOperator::Like => "like",
            FilterOperator::Exists => "exists",
            FilterOperator::Contains => "contains",
            FilterOperator::StartsWith => "starts_with",
            FilterOperator::EndsWith => "ends_with",
            FilterOperator::IsNull => "is_null",
            FilterOperator::IsNotNull => "is_not_null",
        }
    }
}

impl fmt::Display for FilterOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for FilterOperator {
    type Err = QueryError;

    fn from_str(code: &str) -> Result<Self, Self::Err> {
        match code {
            "eq" => Ok(FilterOperator::Eq),
            "ne" => Ok(FilterOperator::Ne),
            "gt" => Ok(FilterOperator::Gt),
            "gte" => Ok(FilterOperator::Gte),
            "lt" => Ok(FilterOperator::Lt),
            "lte" => Ok(FilterOperator::Lte),
            "in" => Ok(FilterOperator::In),
            "nin" => Ok(FilterOperator::NotIn),
            "between" => Ok(FilterOperator::Between),
            "like" => Ok(FilterOperator::Like),
            "exists" => Ok(FilterOperator::Exists),
            "contains" => Ok(FilterOperator::Contains),
            "starts_with" => Ok(FilterOperator::StartsWith),
            "ends_with" => Ok(FilterOperator::EndsWith),
            "is_null" => Ok(FilterOperator::IsNull),
            "is_not_null" => Ok(FilterOperator::IsNotNull),
            other => Err(QueryError::UnknownOperator {
                code: other.to_string(),
            }),
        }
    }
}

/// A single (field, operator, value) filter condition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilterCriterion {
    pub field: String,
    pub op: FilterOperator,
    /// Absent for `is_null` / `is_not_null`; optional for `exists`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<FilterValue>,
}

/// Ordered collection of filter criteria, combined with AND.
///
/// Serializes as a JSON array of criteria.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FilterParams {
    criteria: Vec<FilterCriterion>,
}

impl FilterParams {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a criterion with an operand.
    pub fn with(
        mut self,
        field: impl Into<String>,
        op: FilterOperator,
        value: impl Into<FilterValue>,
    ) -> Self {
        self.criteria.push(FilterCriterion {
            field: field.into(),
            op,
            value: Some(value.into()),
        });
        self
    }

    /// Append an operand-less criterion (`is_null` / `is_not_null` / bare `exists`).
    pub fn with_unary(mut self, field: impl Into<String>, op: FilterOperator) -> Self {
        self.criteria.push(FilterCriterion {
            field: field.into(),
            op,
            value: None,
        });
        self
    }

    pub fn push(&mut self, criterion: FilterCriterion) {
        self.criteria.push(criterion);
    }

    pub fn is_empty(&self) -> bool {
        self.criteria.is_empty()
    }

    pub fn len(&self) -> usize {
        self.criteria.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &FilterCriterion> {
        self.criteria.iter()
    }
}

// ---------------------------------------------------------------------------
// Free-text search
// ---------------------------------------------------------------------------

/// A free-text query plus the fields it should match against.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SearchParams {
    /// Free-text search query.
    pub query: Option<String>,
    /// Target fields, in order of declaration.
    #[serde(default)]
    pub fields: Vec<String>,
}

impl SearchParams {
    pub fn new(query: impl Into<String>, fields: &[&str]) -> Self {
        Self {
            query: Some(query.into()),
            fields: fields.iter().map(|f| f.to_string()).collect(),
        }
    }

    /// Whether this search still contributes to the result set.
    pub fn is_active(&self) -> bool {
        self.query.as_deref().is_some_and(|q| !q.trim().is_empty()) && !self.fields.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Pagination & sorting
// ---------------------------------------------------------------------------

/// Ordering direction for sorted queries.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

/// Pagination and sorting directives.
///
/// `page` is zero-based. `size` and `sort_by` are optional; validation
/// fills in defaults and clamps against the entity's allow-list.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QueryParams {
    /// Zero-based page number.
    #[serde(default)]
    pub page: i64,
    /// Requested page size; clamped to the entity's maximum.
    pub size: Option<i64>,
    /// Sort field; replaced with a default when absent or not allow-listed.
    pub sort_by: Option<String>,
    #[serde(default)]
    pub sort_dir: SortDirection,
}

impl QueryParams {
    pub fn new(page: i64, size: i64) -> Self {
        Self {
            page,
            size: Some(size),
            ..Default::default()
        }
    }

    pub fn sorted_by(mut self, field: impl Into<String>, dir: SortDirection) -> Self {
        self.sort_by = Some(field.into());
        self.sort_dir = dir;
        self
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
