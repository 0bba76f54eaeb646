//! Error types for the query subsystem.
//!
//! Strict validation and build failures surface as [`QueryError`]; storage
//! failures from repository adapters are wrapped in [`RepositoryError`] so
//! the core stays independent of any particular storage crate.

/// A rejected query, filter, or search input.
///
/// These are caller errors: they are raised synchronously before any data
/// is touched and are never retried. Silent corrections (sort fallback,
/// page-size clamping, dropped search fields) do not produce errors.
#[derive(Debug, thiserror::Error)]
pub enum QueryError {
    /// A filter referenced a field outside the entity's allow-list.
    #[error("Unknown filter field: {field}")]
    UnknownFilterField { field: String },

    /// A filter operator code could not be parsed.
    #[error("Unknown filter operator: {code}")]
    UnknownOperator { code: String },

    /// A filter value did not match the shape its operator requires.
    #[error("Operator `{op}` requires {expected}")]
    InvalidOperand {
        op: &'static str,
        expected: &'static str,
    },

    /// No allow-list is registered for the entity type.
    #[error("Unknown entity type: {entity}")]
    UnknownEntityType { entity: String },

    /// The underlying repository failed.
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

/// An opaque storage-layer failure.
///
/// Adapters construct this from their native error type (e.g. `sqlx::Error`)
/// via [`RepositoryError::from_source`], keeping the port signature free of
/// storage-engine types.
#[derive(Debug, thiserror::Error)]
#[error("Repository error: {message}")]
pub struct RepositoryError {
    message: String,
    #[source]
    source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl RepositoryError {
    /// Create an error from a plain message (no underlying cause).
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            source: None,
        }
    }

    /// Wrap a native storage error, preserving it as the source.
    pub fn from_source(source: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self {
            message: source.to_string(),
            source: Some(Box::new(source)),
        }
    }
}
