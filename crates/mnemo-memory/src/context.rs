//! Context aggregation.
//!
//! [`MemoryEngine::context`] is the only operation that issues concurrent
//! work: three retrieval calls run side by side and are joined fail-fast.
//! Either all three succeed and a [`ContextBundle`] is returned, or the
//! first failure is reported as [`MemoryError::PartialAggregationFailure`]
//! and the remaining in-flight calls are dropped.

use mnemo_types::{Channel, Record, require_text};
use serde::Serialize;
use tracing::{info, instrument, warn};

use crate::engine::MemoryEngine;
use crate::error::MemoryError;
use crate::retrieval::{RecallOptions, WindowOptions};
use crate::store::ScoredRecord;

/// Everything an agent needs before answering a message on one channel.
///
/// The three parts are not deduplicated against each other.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ContextBundle {
    /// Memories from any channel similar to the incoming message.
    pub relevant_memories: Vec<ScoredRecord>,
    /// Recent memories of the target channel.
    pub recent_summary: Vec<Record>,
    /// Recent memories of every other channel.
    pub cross_channel_context: Vec<Record>,
}

fn part_failed(part: &'static str) -> impl FnOnce(MemoryError) -> MemoryError {
    move |source| {
        warn!(part, error = %source, "context part failed");
        MemoryError::PartialAggregationFailure {
            part,
            source: Box::new(source),
        }
    }
}

impl MemoryEngine {
    /// Build the context bundle for `message` arriving on `channel`.
    #[instrument(skip(self, message), fields(channel = %channel))]
    pub async fn context(
        &self,
        channel: Channel,
        message: &str,
    ) -> Result<ContextBundle, MemoryError> {
        require_text("message", message)?;

        let relevant = async {
            self.recall(message, RecallOptions::default())
                .await
                .map_err(part_failed("relevant_memories"))
        };
        let recent = async {
            self.summarize(channel, WindowOptions::default())
                .await
                .map_err(part_failed("recent_summary"))
        };
        let elsewhere = async {
            self.summarize_elsewhere(channel, WindowOptions::default())
                .await
                .map_err(part_failed("cross_channel_context"))
        };

        let (relevant_memories, recent_summary, cross_channel_context) =
            tokio::try_join!(relevant, recent, elsewhere)?;

        info!(
            relevant = relevant_memories.len(),
            recent = recent_summary.len(),
            cross_channel = cross_channel_context.len(),
            "context assembled"
        );
        Ok(ContextBundle {
            relevant_memories,
            recent_summary,
            cross_channel_context,
        })
    }
}
