//! `mnemo-memory` – The Memory Engine.
//!
//! Gives an agent persistent, channel-aware recall over a local SQLite
//! substrate and an embedding provider.
//!
//! # Modules
//!
//! - [`engine`] – [`MemoryEngine`]: the handle every operation hangs off.
//! - [`lifecycle`] – creation defaults and pruning.
//! - [`retrieval`] – similarity search (`recall`, `reflect`,
//!   `search_knowledge`) and time-window scans (`summarize`).
//! - [`context`] – [`ContextBundle`][context::ContextBundle]: three
//!   retrieval calls joined concurrently, fail-fast.
//! - [`relationships`] – the per-person upsert-merge ledger.
//! - [`todos`] – todo listing and in-place updates.
//! - [`store`] / [`sqlite`] – the [`RecordStore`][store::RecordStore] seam
//!   and its SQLite implementation.
//! - [`embedding`] – the [`EmbeddingProvider`][embedding::EmbeddingProvider]
//!   seam and its Ollama implementation.
//!
//! # Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//!
//! use mnemo_memory::embedding::OllamaEmbedder;
//! use mnemo_memory::retrieval::RecallOptions;
//! use mnemo_memory::sqlite::SqliteStore;
//! use mnemo_memory::{MemoryConfig, MemoryEngine};
//! use mnemo_types::{Channel, NewMemory};
//!
//! # async fn demo() -> Result<(), mnemo_memory::MemoryError> {
//! let engine = MemoryEngine::new(
//!     Arc::new(SqliteStore::open("mnemo.db")?),
//!     Arc::new(OllamaEmbedder::new("http://localhost:11434", "nomic-embed-text")),
//!     MemoryConfig::default(),
//! );
//!
//! engine
//!     .store(NewMemory::new("Chat voted for a cozy game night", Channel::StreamChat))
//!     .await?;
//! let hits = engine.recall("what did chat want to play?", RecallOptions::default()).await?;
//! for hit in hits {
//!     println!("{:.2} {}", hit.score, hit.record.content);
//! }
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod context;
pub mod embedding;
pub mod engine;
pub mod error;
pub mod lifecycle;
pub mod relationships;
pub mod retrieval;
pub mod sqlite;
pub mod store;
pub mod todos;

pub use config::MemoryConfig;
pub use engine::MemoryEngine;
pub use error::MemoryError;
