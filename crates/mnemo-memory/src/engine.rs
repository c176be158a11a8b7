//! The [`MemoryEngine`] handle.
//!
//! The engine owns nothing but shared handles to its two collaborators and
//! its configuration; it is cheap to clone and every operation on it is
//! independent of every other.  Operations are grouped by concern in
//! sibling modules:
//!
//! | module                                | operations                                        |
//! |---------------------------------------|---------------------------------------------------|
//! | [`lifecycle`][crate::lifecycle]       | `store`, `think`, `learn`, `journal`, `prune`     |
//! | [`retrieval`][crate::retrieval]       | `recall`, `summarize`, `reflect`, `search_knowledge`, … |
//! | [`context`][crate::context]           | `context`                                         |
//! | [`relationships`][crate::relationships] | `relate`, `people`, `person`                    |
//! | [`todos`][crate::todos]               | `add_todo`, `todos`, `update_todo`, …             |

use std::collections::BTreeMap;
use std::future::Future;
use std::sync::Arc;

use mnemo_types::RecordKind;
use tracing::{info, warn};
use uuid::Uuid;

use crate::config::MemoryConfig;
use crate::embedding::EmbeddingProvider;
use crate::error::MemoryError;
use crate::store::RecordStore;

/// Entry point of the memory subsystem.
#[derive(Clone)]
pub struct MemoryEngine {
    pub(crate) store: Arc<dyn RecordStore>,
    pub(crate) embedder: Arc<dyn EmbeddingProvider>,
    pub(crate) config: MemoryConfig,
}

impl MemoryEngine {
    pub fn new(
        store: Arc<dyn RecordStore>,
        embedder: Arc<dyn EmbeddingProvider>,
        config: MemoryConfig,
    ) -> Self {
        Self {
            store,
            embedder,
            config,
        }
    }

    pub fn config(&self) -> &MemoryConfig {
        &self.config
    }

    /// Run `fut` under the configured per-call timeout.
    pub(crate) async fn bounded<T, F>(&self, operation: &'static str, fut: F) -> Result<T, MemoryError>
    where
        F: Future<Output = Result<T, MemoryError>>,
    {
        match tokio::time::timeout(self.config.call_timeout(), fut).await {
            Ok(result) => result,
            Err(_) => {
                warn!(
                    operation,
                    timeout_ms = self.config.call_timeout_ms,
                    "call timed out"
                );
                Err(MemoryError::Timeout {
                    operation,
                    timeout_ms: self.config.call_timeout_ms,
                })
            }
        }
    }

    pub(crate) async fn embed(&self, text: &str) -> Result<Vec<f32>, MemoryError> {
        self.bounded("embed", self.embedder.embed(text)).await
    }

    /// Permanently delete one record.
    ///
    /// Fails with [`MemoryError::NotFound`] when no record of `kind` has `id`.
    pub async fn forget(&self, kind: RecordKind, id: Uuid) -> Result<(), MemoryError> {
        let deleted = self.bounded("delete", self.store.delete(kind, id)).await?;
        if !deleted {
            return Err(MemoryError::not_found(kind, id));
        }
        info!(kind = %kind, id = %id, "record forgotten");
        Ok(())
    }

    /// Record count per kind.
    pub async fn stats(&self) -> Result<BTreeMap<RecordKind, usize>, MemoryError> {
        let mut counts = BTreeMap::new();
        for kind in RecordKind::ALL {
            let n = self.bounded("count", self.store.count(kind)).await?;
            counts.insert(kind, n);
        }
        Ok(counts)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use async_trait::async_trait;

    use crate::sqlite::SqliteStore;

    struct SlowEmbedder;

    #[async_trait]
    impl EmbeddingProvider for SlowEmbedder {
        async fn embed(&self, _text: &str) -> Result<Vec<f32>, MemoryError> {
            tokio::time::sleep(Duration::from_secs(60)).await;
            Ok(vec![1.0])
        }
    }

    fn engine(timeout_ms: u64) -> MemoryEngine {
        let config = MemoryConfig {
            call_timeout_ms: timeout_ms,
            ..MemoryConfig::default()
        };
        MemoryEngine::new(
            Arc::new(SqliteStore::open_in_memory().unwrap()),
            Arc::new(SlowEmbedder),
            config,
        )
    }

    #[tokio::test(start_paused = true)]
    async fn slow_embedding_times_out() {
        let err = engine(50).embed("hello").await.unwrap_err();
        assert!(matches!(
            err,
            MemoryError::Timeout {
                operation: "embed",
                timeout_ms: 50
            }
        ));
    }

    #[tokio::test]
    async fn forget_unknown_id_is_not_found() {
        let err = engine(1_000)
            .forget(RecordKind::Memory, Uuid::new_v4())
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            MemoryError::NotFound {
                kind: RecordKind::Memory,
                ..
            }
        ));
    }

    #[tokio::test]
    async fn stats_on_empty_store_lists_every_kind() {
        let stats = engine(1_000).stats().await.unwrap();
        assert_eq!(stats.len(), RecordKind::ALL.len());
        assert!(stats.values().all(|&n| n == 0));
    }
}
