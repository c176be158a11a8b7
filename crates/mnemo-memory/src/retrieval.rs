//! Similarity search and time-window scans.
//!
//! Similarity operations embed the query, ask the store for scored
//! candidates and then apply the same ranking rule everywhere: drop scores
//! below the threshold, sort by score descending with ties broken by
//! `created_at` descending, truncate to the limit.

use std::cmp::Ordering;

use chrono::{DateTime, Duration, Utc};
use mnemo_types::record::timestamp_now;
use mnemo_types::{Channel, Record, RecordKind, ThoughtType, check_unit, require_text};
use tracing::{debug, instrument};

use crate::engine::MemoryEngine;
use crate::error::MemoryError;
use crate::store::{RecordFilter, ScoredRecord};

/// Options of [`MemoryEngine::recall`].  `None` falls back to the engine
/// configuration.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct RecallOptions {
    pub channel: Option<Channel>,
    pub limit: Option<usize>,
    pub threshold: Option<f32>,
}

/// Options of the similarity searches that do not filter by channel.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct SearchOptions {
    pub limit: Option<usize>,
    pub threshold: Option<f32>,
}

/// Options of the time-window scans.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct WindowOptions {
    pub hours: Option<u32>,
    pub limit: Option<usize>,
}

/// Order of two scored records: higher score first, then newer first.
fn by_rank(a: &ScoredRecord, b: &ScoredRecord) -> Ordering {
    b.score
        .total_cmp(&a.score)
        .then_with(|| b.record.created_at.cmp(&a.record.created_at))
}

/// Apply the ranking rule to an unordered candidate set.
pub(crate) fn rank(mut hits: Vec<ScoredRecord>, threshold: f32, limit: usize) -> Vec<ScoredRecord> {
    hits.retain(|h| h.score >= threshold);
    hits.sort_by(by_rank);
    hits.truncate(limit);
    hits
}

/// Bounds of a time-range query that should see every record.
pub(crate) const ALL_TIME: (DateTime<Utc>, DateTime<Utc>) =
    (DateTime::<Utc>::MIN_UTC, DateTime::<Utc>::MAX_UTC);

/// `end - span`, saturating at the earliest representable instant.
pub(crate) fn span_start(end: DateTime<Utc>, span: Duration) -> DateTime<Utc> {
    end.checked_sub_signed(span).unwrap_or(DateTime::<Utc>::MIN_UTC)
}

impl MemoryEngine {
    fn limit_or_default(&self, limit: Option<usize>) -> usize {
        limit.unwrap_or(self.config.recall_limit)
    }

    fn threshold_or_default(&self, threshold: Option<f32>) -> Result<f32, MemoryError> {
        Ok(check_unit(
            "threshold",
            threshold.unwrap_or(self.config.similarity_threshold),
        )?)
    }

    /// Score the `kind` table against an already-embedded query.
    async fn ranked(
        &self,
        kind: RecordKind,
        vector: &[f32],
        filter: &RecordFilter,
        threshold: f32,
        limit: usize,
    ) -> Result<Vec<ScoredRecord>, MemoryError> {
        if limit == 0 {
            return Ok(Vec::new());
        }
        let hits = self
            .bounded(
                "query_by_similarity",
                self.store.query_by_similarity(kind, vector, filter, limit),
            )
            .await?;
        Ok(rank(hits, threshold, limit))
    }

    /// Memories most similar to `query`, optionally restricted to one channel.
    ///
    /// An empty result is a success.
    #[instrument(skip(self, query), fields(query_len = query.len()))]
    pub async fn recall(
        &self,
        query: &str,
        options: RecallOptions,
    ) -> Result<Vec<ScoredRecord>, MemoryError> {
        require_text("query", query)?;
        let threshold = self.threshold_or_default(options.threshold)?;
        let limit = self.limit_or_default(options.limit);
        let filter = options
            .channel
            .map(RecordFilter::channel)
            .unwrap_or_default();

        let vector = self.embed(query).await?;
        let hits = self
            .ranked(RecordKind::Memory, &vector, &filter, threshold, limit)
            .await?;
        debug!(hits = hits.len(), threshold, limit, "recall complete");
        Ok(hits)
    }

    /// Records of `kind` created within the trailing window, newest first.
    async fn window(
        &self,
        kind: RecordKind,
        filter: &RecordFilter,
        options: WindowOptions,
    ) -> Result<Vec<Record>, MemoryError> {
        let hours = options.hours.unwrap_or(self.config.summary_hours);
        let limit = options.limit.unwrap_or(self.config.summary_limit);
        let end = timestamp_now();
        let start = span_start(end, Duration::hours(i64::from(hours)));
        self.bounded(
            "query_by_time_range",
            self.store
                .query_by_time_range(kind, filter, start, end, limit),
        )
        .await
    }

    /// Recent memories of one channel, newest first.  No scoring.
    pub async fn summarize(
        &self,
        channel: Channel,
        options: WindowOptions,
    ) -> Result<Vec<Record>, MemoryError> {
        self.window(RecordKind::Memory, &RecordFilter::channel(channel), options)
            .await
    }

    /// Recent memories of every channel except `channel`, newest first.
    pub async fn summarize_elsewhere(
        &self,
        channel: Channel,
        options: WindowOptions,
    ) -> Result<Vec<Record>, MemoryError> {
        self.window(
            RecordKind::Memory,
            &RecordFilter::excluding_channel(channel),
            options,
        )
        .await
    }

    /// Thoughts and journal entries similar to `query`, merged into one
    /// ranking.
    ///
    /// On equal score a thought ranks before a journal entry; within a kind,
    /// newer ranks first.
    #[instrument(skip(self, query), fields(query_len = query.len()))]
    pub async fn reflect(
        &self,
        query: &str,
        options: SearchOptions,
    ) -> Result<Vec<ScoredRecord>, MemoryError> {
        require_text("query", query)?;
        let threshold = self.threshold_or_default(options.threshold)?;
        let limit = self.limit_or_default(options.limit);

        let vector = self.embed(query).await?;
        let all = RecordFilter::all();
        let thoughts = self
            .ranked(RecordKind::Thought, &vector, &all, threshold, limit)
            .await?;
        let journal = self
            .ranked(RecordKind::Journal, &vector, &all, threshold, limit)
            .await?;

        let mut merged: Vec<ScoredRecord> = thoughts.into_iter().chain(journal).collect();
        merged.sort_by(|a, b| {
            b.score
                .total_cmp(&a.score)
                .then_with(|| kind_rank(a).cmp(&kind_rank(b)))
                .then_with(|| b.record.created_at.cmp(&a.record.created_at))
        });
        merged.truncate(limit);
        Ok(merged)
    }

    /// Knowledge items similar to `query`, optionally within one topic.
    pub async fn search_knowledge(
        &self,
        query: &str,
        topic: Option<&str>,
        options: SearchOptions,
    ) -> Result<Vec<ScoredRecord>, MemoryError> {
        require_text("query", query)?;
        let threshold = self.threshold_or_default(options.threshold)?;
        let limit = self.limit_or_default(options.limit);
        let filter = topic.map(RecordFilter::scope).unwrap_or_default();

        let vector = self.embed(query).await?;
        self.ranked(RecordKind::Knowledge, &vector, &filter, threshold, limit)
            .await
    }

    /// Most recent thoughts, optionally of one type.
    pub async fn thoughts(
        &self,
        thought_type: Option<ThoughtType>,
        limit: Option<usize>,
    ) -> Result<Vec<Record>, MemoryError> {
        let filter = thought_type
            .map(|t| RecordFilter::scope(t.as_str()))
            .unwrap_or_default();
        let (start, end) = ALL_TIME;
        self.bounded(
            "query_by_time_range",
            self.store.query_by_time_range(
                RecordKind::Thought,
                &filter,
                start,
                end,
                self.limit_or_default(limit),
            ),
        )
        .await
    }

    /// Most recent journal entries.
    pub async fn journal_recent(&self, limit: Option<usize>) -> Result<Vec<Record>, MemoryError> {
        let (start, end) = ALL_TIME;
        self.bounded(
            "query_by_time_range",
            self.store.query_by_time_range(
                RecordKind::Journal,
                &RecordFilter::all(),
                start,
                end,
                self.limit_or_default(limit),
            ),
        )
        .await
    }
}

fn kind_rank(hit: &ScoredRecord) -> u8 {
    match hit.record.kind() {
        RecordKind::Thought => 0,
        _ => 1,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mnemo_types::{MemoryFields, RecordBody};

    fn hit(score: f32, age_secs: i64) -> ScoredRecord {
        let mut record = Record::new(
            format!("{score}/{age_secs}"),
            vec![1.0],
            0.5,
            RecordBody::Memory(MemoryFields {
                channel: Channel::X,
            }),
        );
        record.created_at -= Duration::seconds(age_secs);
        ScoredRecord { record, score }
    }

    #[test]
    fn rank_drops_below_threshold() {
        let ranked = rank(vec![hit(0.4, 0), hit(0.9, 0), hit(0.5, 0)], 0.5, 10);
        assert_eq!(ranked.len(), 2);
        assert!(ranked.iter().all(|h| h.score >= 0.5));
    }

    #[test]
    fn rank_breaks_ties_by_recency() {
        let ranked = rank(vec![hit(0.7, 100), hit(0.7, 5), hit(0.8, 500)], 0.0, 10);
        assert_eq!(ranked[0].record.content, "0.8/500");
        assert_eq!(ranked[1].record.content, "0.7/5");
        assert_eq!(ranked[2].record.content, "0.7/100");
    }

    #[test]
    fn span_start_saturates() {
        let now = timestamp_now();
        assert_eq!(span_start(now, Duration::hours(2)), now - Duration::hours(2));
        assert_eq!(
            span_start(now, Duration::hours(i64::from(u32::MAX))),
            DateTime::<Utc>::MIN_UTC
        );
        assert_eq!(
            span_start(now, Duration::days(i64::from(u32::MAX))),
            DateTime::<Utc>::MIN_UTC
        );
    }

    #[test]
    fn rank_truncates() {
        let ranked = rank((0..5).map(|i| hit(0.9, i)).collect(), 0.5, 2);
        assert_eq!(ranked.len(), 2);
    }
}
