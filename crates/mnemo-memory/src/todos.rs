//! Todo list.
//!
//! Todos are ordinary records of kind [`RecordKind::Todo`] whose scope is
//! their status, so listing by status is an indexed scan.

use mnemo_types::input::todo_content;
use mnemo_types::{NewTodo, Record, RecordBody, RecordKind, TodoStatus, TodoUpdate};
use tracing::info;
use uuid::Uuid;

use crate::engine::MemoryEngine;
use crate::error::MemoryError;
use crate::retrieval::ALL_TIME;
use crate::store::{RecordFilter, RecordPatch};

/// Filter of [`MemoryEngine::todos`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TodoQuery {
    pub status: Option<TodoStatus>,
    pub project: Option<String>,
}

impl MemoryEngine {
    pub async fn add_todo(&self, todo: NewTodo) -> Result<Record, MemoryError> {
        self.create(todo).await
    }

    /// Todos matching `query`, most urgent first, then oldest first.
    pub async fn todos(&self, query: &TodoQuery) -> Result<Vec<Record>, MemoryError> {
        let filter = query
            .status
            .map(|s| RecordFilter::scope(s.as_str()))
            .unwrap_or_default();
        let (start, end) = ALL_TIME;
        let mut rows = self
            .bounded(
                "query_by_time_range",
                self.store
                    .query_by_time_range(RecordKind::Todo, &filter, start, end, usize::MAX),
            )
            .await?;

        if let Some(project) = &query.project {
            rows.retain(|r| {
                r.as_todo()
                    .is_some_and(|t| t.project.as_deref() == Some(project.as_str()))
            });
        }
        rows.sort_by(|a, b| {
            let pa = a.as_todo().map(|t| t.priority);
            let pb = b.as_todo().map(|t| t.priority);
            pa.cmp(&pb).then_with(|| a.created_at.cmp(&b.created_at))
        });
        Ok(rows)
    }

    /// Apply `update` to one todo.
    ///
    /// A new title changes the todo's content, so its embedding is recomputed
    /// before the write; status, priority and category changes keep it.
    pub async fn update_todo(&self, id: Uuid, update: TodoUpdate) -> Result<Record, MemoryError> {
        update.validate()?;
        let current = self
            .bounded("get", self.store.get(RecordKind::Todo, id))
            .await?;
        let mut fields = match current.body {
            RecordBody::Todo(fields) => fields,
            _ => return Err(MemoryError::not_found(RecordKind::Todo, id)),
        };

        let mut patch = RecordPatch::default();
        if let Some(title) = update.title
            && title != fields.title
        {
            let content = todo_content(&title, fields.description.as_deref());
            patch.embedding = Some(self.embed(&content).await?);
            patch.content = Some(content);
            fields.title = title;
        }
        if let Some(status) = update.status {
            fields.status = status;
        }
        if let Some(priority) = update.priority {
            fields.priority = priority;
        }
        if let Some(category) = update.category {
            fields.category = category;
        }
        if let Some(project) = update.project {
            fields.project = Some(project);
        }
        patch.body = Some(RecordBody::Todo(fields));

        let record = self
            .bounded("update", self.store.update(RecordKind::Todo, id, patch))
            .await?;
        info!(id = %id, status = %record.body.scope(), "todo updated");
        Ok(record)
    }

    pub async fn complete_todo(&self, id: Uuid) -> Result<Record, MemoryError> {
        self.update_todo(id, TodoUpdate::status(TodoStatus::Completed))
            .await
    }

    pub async fn delete_todo(&self, id: Uuid) -> Result<(), MemoryError> {
        self.forget(RecordKind::Todo, id).await
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;
    use mnemo_types::{Priority, ValidationError};

    use super::*;
    use crate::config::MemoryConfig;
    use crate::embedding::EmbeddingProvider;
    use crate::sqlite::SqliteStore;

    #[derive(Default)]
    struct CountingEmbedder {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl EmbeddingProvider for CountingEmbedder {
        async fn embed(&self, text: &str) -> Result<Vec<f32>, MemoryError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(vec![text.len() as f32, 1.0])
        }
    }

    fn engine() -> (MemoryEngine, Arc<CountingEmbedder>) {
        let embedder = Arc::new(CountingEmbedder::default());
        let engine = MemoryEngine::new(
            Arc::new(SqliteStore::open_in_memory().unwrap()),
            embedder.clone(),
            MemoryConfig::default(),
        );
        (engine, embedder)
    }

    #[tokio::test]
    async fn todos_sorted_by_priority_then_age() {
        let (engine, _) = engine();
        let low = engine
            .add_todo(NewTodo::new("polish README").with_priority(Priority::P3))
            .await
            .unwrap();
        let urgent = engine
            .add_todo(NewTodo::new("fix crash on start").with_priority(Priority::P0))
            .await
            .unwrap();
        let also_low = engine
            .add_todo(NewTodo::new("update badges").with_priority(Priority::P3))
            .await
            .unwrap();

        let ids: Vec<Uuid> = engine
            .todos(&TodoQuery::default())
            .await
            .unwrap()
            .into_iter()
            .map(|r| r.id)
            .collect();
        assert_eq!(ids, vec![urgent.id, low.id, also_low.id]);
    }

    #[tokio::test]
    async fn status_filter_and_project_filter() {
        let (engine, _) = engine();
        let a = engine
            .add_todo(NewTodo::new("overlay").with_project("stream"))
            .await
            .unwrap();
        engine.add_todo(NewTodo::new("taxes")).await.unwrap();
        engine.complete_todo(a.id).await.unwrap();

        let done = engine
            .todos(&TodoQuery {
                status: Some(TodoStatus::Completed),
                project: None,
            })
            .await
            .unwrap();
        assert_eq!(done.len(), 1);
        assert_eq!(done[0].id, a.id);

        let stream = engine
            .todos(&TodoQuery {
                status: None,
                project: Some("stream".into()),
            })
            .await
            .unwrap();
        assert_eq!(stream.len(), 1);
    }

    #[tokio::test]
    async fn only_title_change_reembeds() {
        let (engine, embedder) = engine();
        let todo = engine.add_todo(NewTodo::new("ship v1")).await.unwrap();
        assert_eq!(embedder.calls.load(Ordering::SeqCst), 1);

        let done = engine.complete_todo(todo.id).await.unwrap();
        assert_eq!(embedder.calls.load(Ordering::SeqCst), 1);
        assert_eq!(done.embedding, todo.embedding);
        assert_eq!(done.created_at, todo.created_at);
        assert!(done.updated_at >= todo.updated_at);

        let renamed = engine
            .update_todo(
                todo.id,
                TodoUpdate {
                    title: Some("ship v1.0.0".into()),
                    ..TodoUpdate::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(embedder.calls.load(Ordering::SeqCst), 2);
        assert_eq!(renamed.content, "ship v1.0.0");
        assert_eq!(renamed.as_todo().unwrap().status, TodoStatus::Completed);
    }

    #[tokio::test]
    async fn empty_update_is_rejected() {
        let (engine, _) = engine();
        let err = engine
            .update_todo(Uuid::new_v4(), TodoUpdate::default())
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            MemoryError::Validation(ValidationError::MissingField(_))
        ));
    }

    #[tokio::test]
    async fn delete_todo_twice_is_not_found() {
        let (engine, _) = engine();
        let todo = engine.add_todo(NewTodo::new("stretch")).await.unwrap();
        engine.delete_todo(todo.id).await.unwrap();
        let err = engine.delete_todo(todo.id).await.unwrap_err();
        assert!(matches!(err, MemoryError::NotFound { .. }));
    }
}
