//! Error taxonomy of the memory subsystem.

use mnemo_types::{RecordKind, ValidationError};
use thiserror::Error;

/// Every failure a memory operation can surface.
///
/// The variants are distinct so a caller can decide whether to retry, skip,
/// or report; see [`MemoryError::is_retryable`].
#[derive(Error, Debug)]
pub enum MemoryError {
    #[error("Embedding provider unavailable: {0}")]
    EmbeddingUnavailable(String),

    #[error("Record store unavailable: {0}")]
    StoreUnavailable(String),

    #[error("{kind} record not found: {id}")]
    NotFound { kind: RecordKind, id: String },

    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    /// A uniqueness constraint rejected a write (e.g. a second relationship
    /// entry for the same person).
    #[error("Conflicting {kind} record: {key}")]
    Conflict { kind: RecordKind, key: String },

    #[error("Context aggregation failed in {part}: {source}")]
    PartialAggregationFailure {
        part: &'static str,
        #[source]
        source: Box<MemoryError>,
    },

    #[error("{operation} timed out after {timeout_ms} ms")]
    Timeout {
        operation: &'static str,
        timeout_ms: u64,
    },
}

impl MemoryError {
    /// `true` for transient failures worth retrying at the transport layer.
    pub fn is_retryable(&self) -> bool {
        match self {
            MemoryError::EmbeddingUnavailable(_)
            | MemoryError::StoreUnavailable(_)
            | MemoryError::Timeout { .. } => true,
            MemoryError::PartialAggregationFailure { source, .. } => source.is_retryable(),
            MemoryError::NotFound { .. }
            | MemoryError::Validation(_)
            | MemoryError::Conflict { .. } => false,
        }
    }

    pub(crate) fn not_found(kind: RecordKind, id: impl ToString) -> Self {
        MemoryError::NotFound {
            kind,
            id: id.to_string(),
        }
    }
}

impl From<rusqlite::Error> for MemoryError {
    fn from(e: rusqlite::Error) -> Self {
        MemoryError::StoreUnavailable(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transient_errors_are_retryable() {
        assert!(MemoryError::StoreUnavailable("locked".into()).is_retryable());
        assert!(MemoryError::EmbeddingUnavailable("refused".into()).is_retryable());
        assert!(
            MemoryError::Timeout {
                operation: "embed",
                timeout_ms: 10
            }
            .is_retryable()
        );
    }

    #[test]
    fn caller_errors_are_not_retryable() {
        assert!(!MemoryError::not_found(RecordKind::Todo, "abc").is_retryable());
        let v = ValidationError::MissingField("content");
        assert!(!MemoryError::from(v).is_retryable());
    }

    #[test]
    fn aggregation_failure_inherits_cause() {
        let err = MemoryError::PartialAggregationFailure {
            part: "recent_summary",
            source: Box::new(MemoryError::StoreUnavailable("gone".into())),
        };
        assert!(err.is_retryable());
        assert!(err.to_string().contains("recent_summary"));
    }

    #[test]
    fn sqlite_errors_map_to_store_unavailable() {
        let err: MemoryError = rusqlite::Error::QueryReturnedNoRows.into();
        assert!(matches!(err, MemoryError::StoreUnavailable(_)));
    }
}
