//! Specification: a storage-agnostic, composable predicate over entity
//! attributes.
//!
//! [`build_specification`] compiles validated filter/search parameters into
//! an expression tree. Operand shapes are checked here, at build time, so a
//! malformed criterion fails before any repository is touched. The tree can
//! be evaluated directly against in-memory entities (via [`FieldAccess`]) or
//! translated by a storage adapter into a native query.

use crate::error::QueryError;
use crate::query::params::{
    FilterCriterion, FilterOperator, FilterParams, FilterValue, SearchParams, Value, ALL_FIELDS,
};
use crate::query::supported::SupportedParams;

// ---------------------------------------------------------------------------
// Tree
// ---------------------------------------------------------------------------

/// Ordering/equality comparison against a single scalar.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareOp {
    Eq,
    Ne,
    Gt,
    Gte,
    Lt,
    Lte,
}

/// Pattern-match flavor. `Like` interprets SQL `%`/`_` wildcards; the rest
/// match a literal term. All matching is case-insensitive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchKind {
    Like,
    Contains,
    StartsWith,
    EndsWith,
}

/// Composable predicate over an entity's attributes.
///
/// Criteria combine with `And`; `Or` appears only where the `_all`
/// pseudo-field or a free-text query spans multiple search fields.
#[derive(Debug, Clone, PartialEq)]
pub enum Specification {
    /// Matches every entity (the empty criteria set).
    All,
    And(Vec<Specification>),
    Or(Vec<Specification>),
    Compare {
        field: String,
        op: CompareOp,
        value: Value,
    },
    Membership {
        field: String,
        values: Vec<Value>,
        negated: bool,
    },
    Range {
        field: String,
        low: Value,
        high: Value,
    },
    Pattern {
        field: String,
        kind: MatchKind,
        term: String,
    },
    Null {
        field: String,
        negated: bool,
    },
}

impl Specification {
    /// Whether this is the match-everything predicate.
    pub fn is_all(&self) -> bool {
        matches!(self, Specification::All)
    }
}

// ---------------------------------------------------------------------------
// Builder
// ---------------------------------------------------------------------------

/// Compile validated filter and search parameters into one predicate.
///
/// Expects inputs already passed through `query::validate`; operand shapes
/// are still checked here and fail with [`QueryError::InvalidOperand`].
pub fn build_specification(
    filters: &FilterParams,
    search: &SearchParams,
    supported: &SupportedParams,
) -> Result<Specification, QueryError> {
    let mut fragments = Vec::new();

    for criterion in filters.iter() {
        if criterion.field == ALL_FIELDS {
            let term = require_string(criterion)?;
            if let Some(group) = fields_group(&term, &supported.search_fields) {
                fragments.push(group);
            }
        } else {
            fragments.push(criterion_fragment(criterion)?);
        }
    }

    if search.is_active() {
        // Validation guarantees query is Some and fields are allow-listed.
        if let Some(query) = search.query.as_deref() {
            if let Some(group) = fields_group(query.trim(), &search.fields) {
                fragments.push(group);
            }
        }
    }

    Ok(match fragments.len() {
        0 => Specification::All,
        1 => fragments.remove(0),
        _ => Specification::And(fragments),
    })
}

/// OR-of-contains across a field list; `None` when the list is empty.
fn fields_group(term: &str, fields: &[String]) -> Option<Specification> {
    if term.is_empty() || fields.is_empty() {
        return None;
    }
    let matches: Vec<Specification> = fields
        .iter()
        .map(|field| Specification::Pattern {
            field: field.clone(),
            kind: MatchKind::Contains,
            term: term.to_string(),
        })
        .collect();
    Some(match matches.len() {
        1 => matches.into_iter().next().unwrap_or(Specification::All),
        _ => Specification::Or(matches),
    })
}

/// Map one criterion to its predicate fragment.
fn criterion_fragment(criterion: &FilterCriterion) -> Result<Specification, QueryError> {
    let field = criterion.field.clone();
    match criterion.op {
        FilterOperator::Eq => {
            let value = require_scalar(criterion)?;
            // `eq null` / `ne null` read as null checks; `col = NULL` would
            // match nothing in SQL.
            if value.is_null() {
                Ok(Specification::Null {
                    field,
                    negated: false,
                })
            } else {
                Ok(Specification::Compare {
                    field,
                    op: CompareOp::Eq,
                    value,
                })
            }
        }
        FilterOperator::Ne => {
            let value = require_scalar(criterion)?;
            if value.is_null() {
                Ok(Specification::Null {
                    field,
                    negated: true,
                })
            } else {
                Ok(Specification::Compare {
                    field,
                    op: CompareOp::Ne,
                    value,
                })
            }
        }
        FilterOperator::Gt | FilterOperator::Gte | FilterOperator::Lt | FilterOperator::Lte => {
            let value = require_ordered_scalar(criterion)?;
            let op = match criterion.op {
                FilterOperator::Gt => CompareOp::Gt,
                FilterOperator::Gte => CompareOp::Gte,
                FilterOperator::Lt => CompareOp::Lt,
                _ => CompareOp::Lte,
            };
            Ok(Specification::Compare { field, op, value })
        }
        FilterOperator::In | FilterOperator::NotIn => {
            let values = require_list(criterion)?;
            Ok(Specification::Membership {
                field,
                values,
                negated: criterion.op == FilterOperator::NotIn,
            })
        }
        FilterOperator::Between => {
            let mut values = require_list(criterion)?;
            if values.len() != 2 {
                return Err(QueryError::InvalidOperand {
                    op: criterion.op.code(),
                    expected: "a [low, high] pair",
                });
            }
            let high = values.remove(1);
            let low = values.remove(0);
            Ok(Specification::Range { field, low, high })
        }
        FilterOperator::Like
        | FilterOperator::Contains
        | FilterOperator::StartsWith
        | FilterOperator::EndsWith => {
            let term = require_string(criterion)?;
            let kind = match criterion.op {
                FilterOperator::Like => MatchKind::Like,
                FilterOperator::Contains => MatchKind::Contains,
                FilterOperator::StartsWith => MatchKind::StartsWith,
                _ => MatchKind::EndsWith,
            };
            Ok(Specification::Pattern { field, kind, term })
        }
        FilterOperator::Exists => {
            // Presence check: `exists` / `exists: true` means IS NOT NULL.
            let present = match &criterion.value {
                None => true,
                Some(FilterValue::Scalar(Value::Bool(b))) => *b,
                Some(_) => {
                    return Err(QueryError::InvalidOperand {
                        op: criterion.op.code(),
                        expected: "an optional boolean",
                    })
                }
            };
            Ok(Specification::Null {
                field,
                negated: present,
            })
        }
        FilterOperator::IsNull => Ok(Specification::Null {
            field,
            negated: false,
        }),
        FilterOperator::IsNotNull => Ok(Specification::Null {
            field,
            negated: true,
        }),
    }
}

fn require_scalar(criterion: &FilterCriterion) -> Result<Value, QueryError> {
    match &criterion.value {
        Some(FilterValue::Scalar(value)) => Ok(value.clone()),
        _ => Err(QueryError::InvalidOperand {
            op: criterion.op.code(),
            expected: "a single value",
        }),
    }
}

fn require_ordered_scalar(criterion: &FilterCriterion) -> Result<Value, QueryError> {
    let value = require_scalar(criterion)?;
    if value.is_null() {
        return Err(QueryError::InvalidOperand {
            op: criterion.op.code(),
            expected: "a non-null value",
        });
    }
    Ok(value)
}

fn require_list(criterion: &FilterCriterion) -> Result<Vec<Value>, QueryError> {
    let values = match &criterion.value {
        Some(FilterValue::List(values)) => values.clone(),
        _ => {
            return Err(QueryError::InvalidOperand {
                op: criterion.op.code(),
                expected: "a list of values",
            })
        }
    };
    if values.is_empty() || values.iter().any(Value::is_null) {
        return Err(QueryError::InvalidOperand {
            op: criterion.op.code(),
            expected: "a non-empty list of non-null values",
        });
    }
    Ok(values)
}

fn require_string(criterion: &FilterCriterion) -> Result<String, QueryError> {
    match &criterion.value {
        Some(FilterValue::Scalar(Value::Str(s))) => Ok(s.clone()),
        _ => Err(QueryError::InvalidOperand {
            op: criterion.op.code(),
            expected: "a string value",
        }),
    }
}

// ---------------------------------------------------------------------------
// In-memory evaluation
// ---------------------------------------------------------------------------

/// Read-only attribute view an entity exposes for in-memory filtering and
/// sorting. Attributes the entity does not expose behave like SQL NULL.
pub trait FieldAccess {
    fn field(&self, name: &str) -> Option<Value>;
}

impl Specification {
    /// Evaluate this predicate against one entity.
    pub fn evaluate(&self, entity: &dyn FieldAccess) -> bool {
        match self {
            Specification::All => true,
            Specification::And(specs) => specs.iter().all(|s| s.evaluate(entity)),
            Specification::Or(specs) => specs.iter().any(|s| s.evaluate(entity)),
            Specification::Compare { field, op, value } => {
                match non_null_field(entity, field) {
                    Some(actual) => match actual.compare(value) {
                        Some(ordering) => match op {
                            CompareOp::Eq => ordering.is_eq(),
                            CompareOp::Ne => !ordering.is_eq(),
                            CompareOp::Gt => ordering.is_gt(),
                            CompareOp::Gte => ordering.is_ge(),
                            CompareOp::Lt => ordering.is_lt(),
                            CompareOp::Lte => ordering.is_le(),
                        },
                        None => false,
                    },
                    // NULL compares to nothing, matching SQL semantics.
                    None => false,
                }
            }
            Specification::Membership {
                field,
                values,
                negated,
            } => match non_null_field(entity, field) {
                Some(actual) => {
                    let found = values
                        .iter()
                        .any(|v| actual.compare(v).map_or(false, |o| o.is_eq()));
                    found != *negated
                }
                None => false,
            },
            Specification::Range { field, low, high } => match non_null_field(entity, field) {
                Some(actual) => {
                    let above = actual.compare(low).map_or(false, |o| o.is_ge());
                    let below = actual.compare(high).map_or(false, |o| o.is_le());
                    above && below
                }
                None => false,
            },
            Specification::Pattern { field, kind, term } => {
                match non_null_field(entity, field) {
                    Some(Value::Str(actual)) => matches_pattern(&actual, *kind, term),
                    _ => false,
                }
            }
            Specification::Null { field, negated } => {
                let is_null = non_null_field(entity, field).is_none();
                is_null != *negated
            }
        }
    }
}

/// Missing attributes and explicit `Null` values collapse to `None`.
fn non_null_field(entity: &dyn FieldAccess, field: &str) -> Option<Value> {
    entity.field(field).filter(|v| !v.is_null())
}

fn matches_pattern(actual: &str, kind: MatchKind, term: &str) -> bool {
    let actual_lower = actual.to_lowercase();
    let term_lower = term.to_lowercase();
    match kind {
        MatchKind::Contains => actual_lower.contains(&term_lower),
        MatchKind::StartsWith => actual_lower.starts_with(&term_lower),
        MatchKind::EndsWith => actual_lower.ends_with(&term_lower),
        MatchKind::Like => like_regex(term)
            .map(|re| re.is_match(actual))
            .unwrap_or(false),
    }
}

/// Translate a SQL LIKE pattern (`%` any run, `_` one char) into an anchored
/// case-insensitive regex.
fn like_regex(pattern: &str) -> Result<regex::Regex, regex::Error> {
    let mut translated = String::with_capacity(pattern.len() + 8);
    translated.push_str("(?is)^");
    for ch in pattern.chars() {
        match ch {
            '%' => translated.push_str(".*"),
            '_' => translated.push('.'),
            other => translated.push_str(&regex::escape(&other.to_string())),
        }
    }
    translated.push('$');
    regex::Regex::new(&translated)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
