//! Record store seam.
//!
//! [`RecordStore`] is the narrow interface the engine uses for persistence:
//! one logical table per [`RecordKind`], per-record atomic create / update /
//! delete, and two query primitives (similarity and time range).
//! [`SqliteStore`][crate::sqlite::SqliteStore] is the shipped implementation.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use mnemo_types::{Channel, Metadata, Record, RecordBody, RecordKind, ValidationError};
use serde::Serialize;
use uuid::Uuid;

use crate::error::MemoryError;

/// A record paired with its similarity to a query vector.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoredRecord {
    pub record: Record,
    pub score: f32,
}

/// Row filter over a record's scope (see [`RecordBody::scope`]).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecordFilter {
    /// Keep only rows whose scope equals this value.
    pub scope: Option<String>,
    /// Drop rows whose scope equals this value.
    pub exclude_scope: Option<String>,
}

impl RecordFilter {
    /// Matches every row.
    pub fn all() -> Self {
        Self::default()
    }

    pub fn scope(scope: impl Into<String>) -> Self {
        Self {
            scope: Some(scope.into()),
            exclude_scope: None,
        }
    }

    pub fn channel(channel: Channel) -> Self {
        Self::scope(channel.as_str())
    }

    pub fn excluding_channel(channel: Channel) -> Self {
        Self {
            scope: None,
            exclude_scope: Some(channel.as_str().to_string()),
        }
    }

    /// In-process evaluation, for stores without a query language.
    pub fn matches(&self, record: &Record) -> bool {
        let scope = record.body.scope();
        self.scope.as_deref().is_none_or(|s| s == scope)
            && self.exclude_scope.as_deref().is_none_or(|s| s != scope)
    }
}

/// Selects records for [`RecordStore::delete_where`].
///
/// A record matches when it was created strictly before `created_before`
/// **and** its importance is strictly below `importance_below`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DeletePredicate {
    pub created_before: DateTime<Utc>,
    pub importance_below: f32,
}

impl DeletePredicate {
    pub fn matches(&self, record: &Record) -> bool {
        record.created_at < self.created_before && record.importance < self.importance_below
    }
}

/// In-place changes to a stored record.  `None` leaves a field untouched.
///
/// `created_at` and `id` are never patchable.  `metadata` is merged key by
/// key; `body` replaces the kind-specific fields and must keep the kind.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RecordPatch {
    pub content: Option<String>,
    pub embedding: Option<Vec<f32>>,
    pub importance: Option<f32>,
    pub metadata: Option<Metadata>,
    pub body: Option<RecordBody>,
}

impl RecordPatch {
    /// Apply the patch to `record`, bumping `updated_at` to `now`.
    pub fn apply(self, record: &mut Record, now: DateTime<Utc>) -> Result<(), MemoryError> {
        if let Some(body) = &self.body
            && body.kind() != record.kind()
        {
            return Err(ValidationError::KindMismatch {
                field: "body",
                expected: record.kind(),
            }
            .into());
        }
        let importance = self
            .importance
            .map(|v| mnemo_types::check_unit("importance", v))
            .transpose()?;

        if let Some(content) = self.content {
            record.content = content;
        }
        if let Some(embedding) = self.embedding {
            record.embedding = embedding;
        }
        if let Some(importance) = importance {
            record.importance = importance;
        }
        if let Some(metadata) = self.metadata {
            record.metadata.extend(metadata);
        }
        if let Some(body) = self.body {
            record.body = body;
        }
        record.updated_at = now;
        Ok(())
    }
}

/// Durable, table-per-kind record storage with similarity queries.
///
/// # Contract
///
/// * Create, update and delete are atomic per record.
/// * `query_by_similarity` returns at most `limit` rows ordered by score
///   descending, ties broken by `created_at` descending.  Rows whose
///   embedding dimension differs from the query are skipped.
/// * `query_by_time_range` returns rows with `start <= created_at <= end`,
///   newest first, at most `limit`.
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Persist `record` into the `kind` table and return its id.
    async fn insert(&self, kind: RecordKind, record: &Record) -> Result<Uuid, MemoryError>;

    /// Fetch a record; [`MemoryError::NotFound`] when absent.
    async fn get(&self, kind: RecordKind, id: Uuid) -> Result<Record, MemoryError>;

    /// Apply `patch` and return the updated record.
    async fn update(
        &self,
        kind: RecordKind,
        id: Uuid,
        patch: RecordPatch,
    ) -> Result<Record, MemoryError>;

    /// Permanently delete a record.  Returns `false` when it did not exist.
    async fn delete(&self, kind: RecordKind, id: Uuid) -> Result<bool, MemoryError>;

    async fn query_by_similarity(
        &self,
        kind: RecordKind,
        vector: &[f32],
        filter: &RecordFilter,
        limit: usize,
    ) -> Result<Vec<ScoredRecord>, MemoryError>;

    async fn query_by_time_range(
        &self,
        kind: RecordKind,
        filter: &RecordFilter,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        limit: usize,
    ) -> Result<Vec<Record>, MemoryError>;

    /// Permanently delete every record matching `predicate`; returns the count.
    async fn delete_where(
        &self,
        kind: RecordKind,
        predicate: &DeletePredicate,
    ) -> Result<usize, MemoryError>;

    /// Number of records of `kind`.
    async fn count(&self, kind: RecordKind) -> Result<usize, MemoryError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use mnemo_types::{MemoryFields, TodoFields, TodoStatus};

    fn memory(channel: Channel, importance: f32) -> Record {
        Record::new(
            "m".into(),
            vec![1.0],
            importance,
            RecordBody::Memory(MemoryFields { channel }),
        )
    }

    #[test]
    fn filter_by_channel() {
        let r = memory(Channel::Coding, 0.5);
        assert!(RecordFilter::all().matches(&r));
        assert!(RecordFilter::channel(Channel::Coding).matches(&r));
        assert!(!RecordFilter::channel(Channel::X).matches(&r));
        assert!(!RecordFilter::excluding_channel(Channel::Coding).matches(&r));
        assert!(RecordFilter::excluding_channel(Channel::X).matches(&r));
    }

    #[test]
    fn delete_predicate_requires_both_conditions() {
        let now = Utc::now();
        let pred = DeletePredicate {
            created_before: now - Duration::days(7),
            importance_below: 0.4,
        };

        let mut old_low = memory(Channel::X, 0.2);
        old_low.created_at = now - Duration::days(8);
        assert!(pred.matches(&old_low));

        let mut old_high = memory(Channel::X, 0.4);
        old_high.created_at = now - Duration::days(100);
        assert!(!pred.matches(&old_high));

        let fresh_zero = memory(Channel::X, 0.0);
        assert!(!pred.matches(&fresh_zero));
    }

    #[test]
    fn patch_merges_metadata_and_bumps_updated_at() {
        let mut r = memory(Channel::X, 0.5);
        r.metadata.insert("a".into(), serde_json::json!(1));
        r.metadata.insert("b".into(), serde_json::json!(2));
        let created = r.created_at;

        let mut meta = Metadata::new();
        meta.insert("b".into(), serde_json::json!(20));
        meta.insert("c".into(), serde_json::json!(30));
        let later = created + Duration::seconds(5);
        RecordPatch {
            metadata: Some(meta),
            ..RecordPatch::default()
        }
        .apply(&mut r, later)
        .unwrap();

        assert_eq!(r.metadata["a"], 1);
        assert_eq!(r.metadata["b"], 20);
        assert_eq!(r.metadata["c"], 30);
        assert_eq!(r.created_at, created);
        assert_eq!(r.updated_at, later);
    }

    #[test]
    fn patch_rejects_kind_change() {
        let mut r = memory(Channel::X, 0.5);
        let err = RecordPatch {
            body: Some(RecordBody::Todo(TodoFields {
                title: "t".into(),
                description: None,
                status: TodoStatus::Pending,
                priority: Default::default(),
                category: Default::default(),
                project: None,
            })),
            ..RecordPatch::default()
        }
        .apply(&mut r, Utc::now())
        .unwrap_err();
        assert!(matches!(err, MemoryError::Validation(_)));
    }

    #[test]
    fn patch_rejects_out_of_range_importance() {
        let mut r = memory(Channel::X, 0.5);
        let err = RecordPatch {
            importance: Some(2.0),
            ..RecordPatch::default()
        }
        .apply(&mut r, Utc::now())
        .unwrap_err();
        assert!(matches!(err, MemoryError::Validation(_)));
        assert!((r.importance - 0.5).abs() < f32::EPSILON);
    }
}
