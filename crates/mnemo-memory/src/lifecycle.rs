//! Creation defaults and pruning.
//!
//! Every creation path goes through [`MemoryEngine::create`]: the request is
//! validated first, then its content is embedded, then the record is stamped
//! and persisted.  A request that fails validation never reaches the
//! embedding provider or the store.

use chrono::{DateTime, Duration, Utc};
use mnemo_types::input::DEFAULT_IMPORTANCE;
use mnemo_types::record::timestamp_now;
use mnemo_types::{
    NewJournalEntry, NewKnowledgeItem, NewMemory, NewRecord, NewThought, Record, RecordKind,
    check_unit,
};
use serde::Serialize;
use tracing::{debug, info, instrument};

use crate::engine::MemoryEngine;
use crate::error::MemoryError;
use crate::retrieval::span_start;
use crate::store::DeletePredicate;

/// Options of [`MemoryEngine::prune`]; `None` falls back to [`MemoryConfig`][crate::MemoryConfig].
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct PruneOptions {
    pub older_than_days: Option<u32>,
    pub importance_threshold: Option<f32>,
}

/// Outcome of a prune run.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PruneReport {
    pub deleted: usize,
    pub cutoff: DateTime<Utc>,
    pub importance_threshold: f32,
}

impl MemoryEngine {
    /// Validate, embed and persist a creation request.
    pub async fn create<R: NewRecord + Send>(&self, request: R) -> Result<Record, MemoryError> {
        request.validate()?;
        let kind = R::KIND;
        let draft = request.into_draft();

        let embedding = if kind.is_embeddable() {
            self.embed(&draft.content).await?
        } else {
            Vec::new()
        };

        let mut record = Record::new(
            draft.content,
            embedding,
            draft.importance.unwrap_or(DEFAULT_IMPORTANCE),
            draft.body,
        );
        record.metadata = draft.metadata;

        self.bounded("insert", self.store.insert(kind, &record))
            .await?;
        info!(
            kind = %kind,
            id = %record.id,
            scope = %record.body.scope(),
            importance = record.importance,
            "record stored"
        );
        Ok(record)
    }

    /// Store a conversational memory.
    pub async fn store(&self, memory: NewMemory) -> Result<Record, MemoryError> {
        self.create(memory).await
    }

    pub async fn think(&self, thought: NewThought) -> Result<Record, MemoryError> {
        self.create(thought).await
    }

    pub async fn learn(&self, item: NewKnowledgeItem) -> Result<Record, MemoryError> {
        self.create(item).await
    }

    pub async fn journal(&self, entry: NewJournalEntry) -> Result<Record, MemoryError> {
        self.create(entry).await
    }

    /// Delete every memory older than the cutoff whose importance is strictly
    /// below the threshold.
    ///
    /// Irreversible.  Running it again with the same options deletes nothing
    /// new, so an interrupted run can simply be repeated.
    #[instrument(skip(self))]
    pub async fn prune(&self, options: PruneOptions) -> Result<PruneReport, MemoryError> {
        let days = options
            .older_than_days
            .unwrap_or(self.config.prune_after_days);
        let importance_threshold = check_unit(
            "importance_threshold",
            options
                .importance_threshold
                .unwrap_or(self.config.prune_importance_threshold),
        )?;

        let cutoff = span_start(timestamp_now(), Duration::days(i64::from(days)));
        let predicate = DeletePredicate {
            created_before: cutoff,
            importance_below: importance_threshold,
        };
        debug!(%cutoff, importance_threshold, "pruning memories");

        let deleted = self
            .bounded(
                "delete_where",
                self.store.delete_where(RecordKind::Memory, &predicate),
            )
            .await?;
        info!(deleted, days, importance_threshold, "prune complete");

        Ok(PruneReport {
            deleted,
            cutoff,
            importance_threshold,
        })
    }
}
