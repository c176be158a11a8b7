//! Engine defaults.
//!
//! Every operation option that the caller leaves unset falls back to the
//! value configured here.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Retrieval, lifecycle and ledger defaults for a [`MemoryEngine`][crate::MemoryEngine].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemoryConfig {
    /// Maximum results of a similarity search.
    #[serde(default = "default_recall_limit")]
    pub recall_limit: usize,

    /// Minimum similarity score for a candidate to be returned.
    #[serde(default = "default_similarity_threshold")]
    pub similarity_threshold: f32,

    /// Lookback window of a time-window scan, in hours.
    #[serde(default = "default_summary_hours")]
    pub summary_hours: u32,

    /// Maximum results of a time-window scan.
    #[serde(default = "default_summary_limit")]
    pub summary_limit: usize,

    /// Age after which low-importance memories become prunable, in days.
    #[serde(default = "default_prune_after_days")]
    pub prune_after_days: u32,

    /// Memories strictly below this importance are prunable once aged.
    #[serde(default = "default_prune_importance")]
    pub prune_importance_threshold: f32,

    /// Maximum retained notes and moments per relationship entry.
    #[serde(default = "default_relationship_history_cap")]
    pub relationship_history_cap: usize,

    /// Upper bound on every single store or embedding call, in milliseconds.
    #[serde(default = "default_call_timeout_ms")]
    pub call_timeout_ms: u64,
}

fn default_recall_limit() -> usize {
    10
}
fn default_similarity_threshold() -> f32 {
    0.5
}
fn default_summary_hours() -> u32 {
    6
}
fn default_summary_limit() -> usize {
    20
}
fn default_prune_after_days() -> u32 {
    7
}
fn default_prune_importance() -> f32 {
    0.4
}
fn default_relationship_history_cap() -> usize {
    50
}
fn default_call_timeout_ms() -> u64 {
    10_000
}

impl MemoryConfig {
    pub fn call_timeout(&self) -> Duration {
        Duration::from_millis(self.call_timeout_ms)
    }
}

impl Default for MemoryConfig {
    fn default() -> Self {
        Self {
            recall_limit: default_recall_limit(),
            similarity_threshold: default_similarity_threshold(),
            summary_hours: default_summary_hours(),
            summary_limit: default_summary_limit(),
            prune_after_days: default_prune_after_days(),
            prune_importance_threshold: default_prune_importance(),
            relationship_history_cap: default_relationship_history_cap(),
            call_timeout_ms: default_call_timeout_ms(),
        }
    }
}
