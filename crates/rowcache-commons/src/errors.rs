//! Error taxonomy for the rowcache subsystem.
//!
//! Every user-visible error carries a stable message prefix (`type mismatch`,
//! `empty list supplied`, `negative limit`, `backend unavailable`) so callers
//! can pattern-match on the prefix without depending on the full text.

use thiserror::Error;

use crate::table_name::TableName;

/// Result type alias using CacheError.
pub type Result<T> = std::result::Result<T, CacheError>;

/// Main error type for rowcache operations.
#[derive(Error, Debug)]
pub enum CacheError {
    /// A primary-key component's runtime kind disagrees with the declared
    /// column type. Never retried, never coerced.
    #[error("type mismatch: column '{column}' expects {expected}, got {actual}")]
    TypeMismatch {
        column: String,
        expected: &'static str,
        actual: &'static str,
    },

    /// An IN-list predicate resolved to zero elements. Zero cache keys is
    /// ambiguous with "not yet resolved", so the query is rejected.
    #[error("empty list supplied: IN predicate on table '{0}' has no values")]
    EmptyList(TableName),

    /// A row-limiting clause carried a negative limit.
    #[error("negative limit: {0}")]
    NegativeLimit(i64),

    /// Malformed request that is neither a type nor a limit problem
    /// (e.g. key arity disagreeing with the primary-key column count).
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// Table is not present in the schema registry.
    #[error("table not found: {0}")]
    TableNotFound(TableName),

    /// The backend failed during fetch-on-miss or write-path refresh. The
    /// cache never papers over this by serving stale or fabricated data.
    #[error(transparent)]
    Backend(#[from] BackendError),

    /// Row payload serialization failure.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl CacheError {
    /// Creates an InvalidArgument error with a message.
    pub fn invalid_argument(msg: impl Into<String>) -> Self {
        Self::InvalidArgument(msg.into())
    }
}

/// Errors surfaced by a `RowBackend` implementation.
#[derive(Error, Debug, Clone)]
pub enum BackendError {
    /// The backend could not be reached or timed out.
    #[error("backend unavailable: {0}")]
    Unavailable(String),

    /// The backend rejected or failed the fetch itself.
    #[error("backend query failed: {0}")]
    Query(String),
}

impl BackendError {
    /// Creates an Unavailable error with a message.
    pub fn unavailable(msg: impl Into<String>) -> Self {
        Self::Unavailable(msg.into())
    }

    /// Creates a Query error with a message.
    pub fn query(msg: impl Into<String>) -> Self {
        Self::Query(msg.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stable_error_prefixes() {
        let err = CacheError::TypeMismatch {
            column: "eid".to_string(),
            expected: "int",
            actual: "text",
        };
        assert!(err.to_string().starts_with("type mismatch"));
        assert_eq!(
            err.to_string(),
            "type mismatch: column 'eid' expects int, got text"
        );

        let err = CacheError::EmptyList(TableName::new("accounts"));
        assert!(err.to_string().starts_with("empty list supplied"));

        let err = CacheError::NegativeLimit(-1);
        assert_eq!(err.to_string(), "negative limit: -1");

        let err = CacheError::Backend(BackendError::unavailable("connection refused"));
        assert!(err.to_string().starts_with("backend unavailable"));
    }

    #[test]
    fn test_backend_error_conversion() {
        fn fetch() -> Result<()> {
            Err(BackendError::query("bad fetch"))?
        }
        assert!(matches!(fetch(), Err(CacheError::Backend(_))));
    }
}
