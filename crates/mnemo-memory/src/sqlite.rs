//! SQLite record store.
//!
//! Persists every [`RecordKind`] to its own table in a local SQLite database
//! and ranks similarity candidates in-process by cosine similarity.
//!
//! # Storage layout
//!
//! One table per kind (`memories`, `thoughts`, `todos`, `relationships`,
//! `journal_entries`, `knowledge_items`), each with the columns:
//!
//! | column      | type    | description                                    |
//! |-------------|---------|------------------------------------------------|
//! | id          | TEXT    | UUID v4 primary key                            |
//! | created_at  | INTEGER | Creation time, µs since the Unix epoch (UTC)   |
//! | updated_at  | INTEGER | Last in-place update, µs since the Unix epoch  |
//! | scope       | TEXT    | Indexed lookup key (channel, person id, …)     |
//! | content     | TEXT    | Embeddable text                                |
//! | importance  | REAL    | Retention priority in `[0, 1]`                 |
//! | embedding   | BLOB    | Little-endian f32 vector (4 × N bytes)         |
//! | metadata    | TEXT    | JSON object                                    |
//! | fields      | TEXT    | JSON kind-specific fields                      |
//!
//! `relationships.scope` (the person id) carries a unique index.
//!
//! # Example
//!
//! ```rust
//! use mnemo_memory::sqlite::SqliteStore;
//! use mnemo_memory::store::{RecordFilter, RecordStore};
//! use mnemo_types::{Channel, MemoryFields, Record, RecordBody, RecordKind};
//!
//! # tokio::runtime::Builder::new_current_thread().build().unwrap().block_on(async {
//! let store = SqliteStore::open_in_memory().unwrap();
//!
//! let record = Record::new(
//!     "The robot navigated around the desk.".to_string(),
//!     vec![0.1, 0.9, 0.3],
//!     0.5,
//!     RecordBody::Memory(MemoryFields { channel: Channel::Internal }),
//! );
//! store.insert(RecordKind::Memory, &record).await.unwrap();
//!
//! let hits = store
//!     .query_by_similarity(RecordKind::Memory, &[0.1, 0.9, 0.3], &RecordFilter::all(), 5)
//!     .await
//!     .unwrap();
//! assert_eq!(hits[0].record.id, record.id);
//! # });
//! ```

use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use mnemo_types::{Metadata, Record, RecordBody, RecordKind, ValidationError};
use rusqlite::types::Value;
use rusqlite::{Connection, ErrorCode, params, params_from_iter};
use tokio::task;
use tracing::debug;
use uuid::Uuid;

use crate::embedding::cosine_similarity;
use crate::error::MemoryError;
use crate::store::{DeletePredicate, RecordFilter, RecordPatch, RecordStore, ScoredRecord};

const COLUMNS: &str = "id, created_at, updated_at, content, embedding, importance, metadata, fields";

// ─────────────────────────────────────────────────────────────────────────────
// Embedding serialisation helpers
// ─────────────────────────────────────────────────────────────────────────────

fn embedding_to_bytes(embedding: &[f32]) -> Vec<u8> {
    embedding.iter().flat_map(|f| f.to_le_bytes()).collect()
}

fn bytes_to_embedding(bytes: &[u8]) -> Vec<f32> {
    bytes
        .chunks_exact(4)
        .map(|c| f32::from_le_bytes([c[0], c[1], c[2], c[3]]))
        .collect()
}

// ─────────────────────────────────────────────────────────────────────────────
// SqliteStore
// ─────────────────────────────────────────────────────────────────────────────

/// SQLite-backed [`RecordStore`].
///
/// rusqlite is synchronous, so every call runs on Tokio's blocking pool.
/// The awaiting future stays pending while SQLite works or waits on a lock,
/// which lets a caller's timeout fire and lets independent calls overlap.
pub struct SqliteStore {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteStore {
    /// Open (or create) a persistent SQLite database at `path`.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, MemoryError> {
        let conn = Connection::open(path)?;
        conn.busy_timeout(Duration::from_secs(5))?;
        Self::with_connection(conn)
    }

    /// Open a temporary in-memory database (useful for testing).
    pub fn open_in_memory() -> Result<Self, MemoryError> {
        Self::with_connection(Connection::open_in_memory()?)
    }

    fn with_connection(conn: Connection) -> Result<Self, MemoryError> {
        init_schema(&conn)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Run `f` against the connection on the blocking pool.
    async fn run<T, F>(&self, f: F) -> Result<T, MemoryError>
    where
        T: Send + 'static,
        F: FnOnce(&Connection) -> Result<T, MemoryError> + Send + 'static,
    {
        let conn = Arc::clone(&self.conn);
        task::spawn_blocking(move || {
            let guard = conn
                .lock()
                .map_err(|_| MemoryError::StoreUnavailable("connection mutex poisoned".into()))?;
            f(&guard)
        })
        .await
        .map_err(|e| MemoryError::StoreUnavailable(format!("store task failed: {e}")))?
    }
}

fn init_schema(conn: &Connection) -> Result<(), MemoryError> {
    for kind in RecordKind::ALL {
        let table = kind.table();
        conn.execute_batch(&format!(
            "CREATE TABLE IF NOT EXISTS {table} (
                id         TEXT    NOT NULL PRIMARY KEY,
                created_at INTEGER NOT NULL,
                updated_at INTEGER NOT NULL,
                scope      TEXT    NOT NULL,
                content    TEXT    NOT NULL,
                importance REAL    NOT NULL,
                embedding  BLOB    NOT NULL,
                metadata   TEXT    NOT NULL,
                fields     TEXT    NOT NULL
            );
            CREATE INDEX IF NOT EXISTS idx_{table}_scope_created
                ON {table} (scope, created_at);
            CREATE INDEX IF NOT EXISTS idx_{table}_created
                ON {table} (created_at);"
        ))?;
    }
    conn.execute_batch(
        "CREATE UNIQUE INDEX IF NOT EXISTS idx_relationships_person
             ON relationships (scope);",
    )?;
    Ok(())
}

// ─────────────────────────────────────────────────────────────────────────────
// Row mapping
// ─────────────────────────────────────────────────────────────────────────────

fn conversion_error(
    column: usize,
    e: impl std::error::Error + Send + Sync + 'static,
) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(column, rusqlite::types::Type::Text, Box::new(e))
}

fn micros_to_time(column: usize, micros: i64) -> rusqlite::Result<DateTime<Utc>> {
    DateTime::from_timestamp_micros(micros)
        .ok_or(rusqlite::Error::IntegralValueOutOfRange(column, micros))
}

fn row_to_record(row: &rusqlite::Row<'_>) -> rusqlite::Result<Record> {
    let id_str: String = row.get(0)?;
    let created_at: i64 = row.get(1)?;
    let updated_at: i64 = row.get(2)?;
    let content: String = row.get(3)?;
    let blob: Vec<u8> = row.get(4)?;
    let importance: f64 = row.get(5)?;
    let metadata: String = row.get(6)?;
    let fields: String = row.get(7)?;

    let id = Uuid::parse_str(&id_str).map_err(|e| conversion_error(0, e))?;
    let metadata: Metadata = serde_json::from_str(&metadata).map_err(|e| conversion_error(6, e))?;
    let body: RecordBody = serde_json::from_str(&fields).map_err(|e| conversion_error(7, e))?;

    Ok(Record {
        id,
        created_at: micros_to_time(1, created_at)?,
        updated_at: micros_to_time(2, updated_at)?,
        content,
        embedding: bytes_to_embedding(&blob),
        importance: importance as f32,
        metadata,
        body,
    })
}

/// Column values of `record`, in `COLUMNS` order followed by `scope`.
fn record_values(record: &Record) -> Result<[Value; 9], MemoryError> {
    let metadata = serde_json::to_string(&record.metadata)
        .map_err(|e| MemoryError::StoreUnavailable(format!("metadata encoding: {e}")))?;
    let fields = serde_json::to_string(&record.body)
        .map_err(|e| MemoryError::StoreUnavailable(format!("fields encoding: {e}")))?;
    Ok([
        Value::Text(record.id.to_string()),
        Value::Integer(record.created_at.timestamp_micros()),
        Value::Integer(record.updated_at.timestamp_micros()),
        Value::Text(record.content.clone()),
        Value::Blob(embedding_to_bytes(&record.embedding)),
        Value::Real(f64::from(record.importance)),
        Value::Text(metadata),
        Value::Text(fields),
        Value::Text(record.body.scope()),
    ])
}

/// Append the filter's conditions to `clauses`/`args`.
fn push_filter(filter: &RecordFilter, clauses: &mut Vec<String>, args: &mut Vec<Value>) {
    if let Some(scope) = &filter.scope {
        args.push(Value::Text(scope.clone()));
        clauses.push(format!("scope = ?{}", args.len()));
    }
    if let Some(scope) = &filter.exclude_scope {
        args.push(Value::Text(scope.clone()));
        clauses.push(format!("scope != ?{}", args.len()));
    }
}

fn where_sql(clauses: &[String]) -> String {
    if clauses.is_empty() {
        String::new()
    } else {
        format!("WHERE {}", clauses.join(" AND "))
    }
}

fn sql_limit(limit: usize) -> i64 {
    i64::try_from(limit).unwrap_or(i64::MAX)
}

fn is_constraint_violation(e: &rusqlite::Error) -> bool {
    matches!(e, rusqlite::Error::SqliteFailure(f, _) if f.code == ErrorCode::ConstraintViolation)
}

fn fetch(conn: &Connection, kind: RecordKind, id: Uuid) -> Result<Option<Record>, MemoryError> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {COLUMNS} FROM {} WHERE id = ?1",
        kind.table()
    ))?;
    let mut rows = stmt.query_map(params![id.to_string()], row_to_record)?;
    Ok(rows.next().transpose()?)
}

// ─────────────────────────────────────────────────────────────────────────────
// RecordStore
// ─────────────────────────────────────────────────────────────────────────────

#[async_trait]
impl RecordStore for SqliteStore {
    async fn insert(&self, kind: RecordKind, record: &Record) -> Result<Uuid, MemoryError> {
        if record.kind() != kind {
            return Err(ValidationError::KindMismatch {
                field: "record",
                expected: kind,
            }
            .into());
        }
        let values = record_values(record)?;
        let id = record.id;
        let scope = record.body.scope();
        self.run(move |conn| {
            conn.execute(
                &format!(
                    "INSERT INTO {} ({COLUMNS}, scope) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
                    kind.table()
                ),
                params_from_iter(values),
            )
            .map_err(|e| {
                if is_constraint_violation(&e) {
                    MemoryError::Conflict { kind, key: scope }
                } else {
                    e.into()
                }
            })
        })
        .await?;
        debug!(kind = %kind, id = %id, "record inserted");
        Ok(id)
    }

    async fn get(&self, kind: RecordKind, id: Uuid) -> Result<Record, MemoryError> {
        self.run(move |conn| fetch(conn, kind, id)?.ok_or_else(|| MemoryError::not_found(kind, id)))
            .await
    }

    async fn update(
        &self,
        kind: RecordKind,
        id: Uuid,
        patch: RecordPatch,
    ) -> Result<Record, MemoryError> {
        let record = self
            .run(move |conn| {
                let mut record =
                    fetch(conn, kind, id)?.ok_or_else(|| MemoryError::not_found(kind, id))?;
                patch.apply(&mut record, mnemo_types::record::timestamp_now())?;

                let [_, _, updated_at, content, embedding, importance, metadata, fields, scope] =
                    record_values(&record)?;
                conn.execute(
                    &format!(
                        "UPDATE {} SET updated_at = ?1, content = ?2, embedding = ?3, importance = ?4,
                             metadata = ?5, fields = ?6, scope = ?7
                         WHERE id = ?8",
                        kind.table()
                    ),
                    params![
                        updated_at,
                        content,
                        embedding,
                        importance,
                        metadata,
                        fields,
                        scope,
                        id.to_string()
                    ],
                )?;
                Ok(record)
            })
            .await?;
        debug!(kind = %kind, id = %id, "record updated");
        Ok(record)
    }

    async fn delete(&self, kind: RecordKind, id: Uuid) -> Result<bool, MemoryError> {
        self.run(move |conn| {
            let n = conn.execute(
                &format!("DELETE FROM {} WHERE id = ?1", kind.table()),
                params![id.to_string()],
            )?;
            Ok(n > 0)
        })
        .await
    }

    async fn query_by_similarity(
        &self,
        kind: RecordKind,
        vector: &[f32],
        filter: &RecordFilter,
        limit: usize,
    ) -> Result<Vec<ScoredRecord>, MemoryError> {
        if vector.is_empty() {
            return Err(ValidationError::MissingField("query embedding").into());
        }
        let mut clauses = Vec::new();
        let mut args = Vec::new();
        push_filter(filter, &mut clauses, &mut args);
        let vector = vector.to_vec();

        self.run(move |conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {COLUMNS} FROM {} {}",
                kind.table(),
                where_sql(&clauses)
            ))?;
            let rows = stmt.query_map(params_from_iter(args), row_to_record)?;
            let records = rows.collect::<Result<Vec<_>, _>>()?;

            let mut scored: Vec<ScoredRecord> = records
                .into_iter()
                .filter(|r| r.embedding.len() == vector.len())
                .map(|r| {
                    let score = cosine_similarity(&r.embedding, &vector);
                    ScoredRecord { record: r, score }
                })
                .collect();
            scored.sort_by(|a, b| {
                b.score
                    .total_cmp(&a.score)
                    .then_with(|| b.record.created_at.cmp(&a.record.created_at))
            });
            scored.truncate(limit);
            Ok(scored)
        })
        .await
    }

    async fn query_by_time_range(
        &self,
        kind: RecordKind,
        filter: &RecordFilter,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        limit: usize,
    ) -> Result<Vec<Record>, MemoryError> {
        let mut args = vec![
            Value::Integer(start.timestamp_micros()),
            Value::Integer(end.timestamp_micros()),
        ];
        let mut clauses = vec!["created_at >= ?1".to_string(), "created_at <= ?2".to_string()];
        push_filter(filter, &mut clauses, &mut args);
        args.push(Value::Integer(sql_limit(limit)));
        let limit_param = args.len();

        self.run(move |conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {COLUMNS} FROM {} {} ORDER BY created_at DESC LIMIT ?{limit_param}",
                kind.table(),
                where_sql(&clauses)
            ))?;
            let rows = stmt.query_map(params_from_iter(args), row_to_record)?;
            Ok(rows.collect::<Result<Vec<_>, _>>()?)
        })
        .await
    }

    async fn delete_where(
        &self,
        kind: RecordKind,
        predicate: &DeletePredicate,
    ) -> Result<usize, MemoryError> {
        let predicate = *predicate;
        self.run(move |conn| {
            let n = conn.execute(
                &format!(
                    "DELETE FROM {} WHERE created_at < ?1 AND importance < ?2",
                    kind.table()
                ),
                params![
                    predicate.created_before.timestamp_micros(),
                    f64::from(predicate.importance_below)
                ],
            )?;
            Ok(n)
        })
        .await
    }

    async fn count(&self, kind: RecordKind) -> Result<usize, MemoryError> {
        self.run(move |conn| {
            let n: i64 = conn.query_row(
                &format!("SELECT COUNT(*) FROM {}", kind.table()),
                [],
                |row| row.get(0),
            )?;
            Ok(usize::try_from(n).unwrap_or_default())
        })
        .await
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration as ChronoDuration;
    use mnemo_types::{Channel, MemoryFields, RelationshipFields};

    fn memory(channel: Channel, content: &str, embedding: Vec<f32>) -> Record {
        Record::new(
            content.to_string(),
            embedding,
            0.5,
            RecordBody::Memory(MemoryFields { channel }),
        )
    }

    fn person(id: &str) -> Record {
        Record::new(
            id.to_string(),
            Vec::new(),
            0.5,
            RecordBody::Relationship(RelationshipFields {
                person_id: id.to_string(),
                affection: 0.0,
                relationship_type: "friend".into(),
                notes: vec![],
                moments: vec![],
            }),
        )
    }

    // ── embedding round-trip ─────────────────────────────────────────────────

    #[test]
    fn embedding_bytes_roundtrip() {
        let original = vec![1.5f32, -0.25, 0.0, 42.0];
        let bytes = embedding_to_bytes(&original);
        let recovered = bytes_to_embedding(&bytes);
        assert_eq!(original, recovered);
    }

    // ── SqliteStore ──────────────────────────────────────────────────────────

    #[tokio::test]
    async fn insert_and_get_roundtrip() {
        let store = SqliteStore::open_in_memory().unwrap();
        let mut r = memory(Channel::Telegram, "first memory", vec![1.0, 0.0]);
        r.metadata.insert("user".into(), serde_json::json!("alice"));
        store.insert(RecordKind::Memory, &r).await.unwrap();

        let back = store.get(RecordKind::Memory, r.id).await.unwrap();
        assert_eq!(back, r);
    }

    #[tokio::test]
    async fn insert_into_wrong_table_is_rejected() {
        let store = SqliteStore::open_in_memory().unwrap();
        let r = memory(Channel::X, "m", vec![1.0]);
        let err = store.insert(RecordKind::Thought, &r).await.unwrap_err();
        assert!(matches!(err, MemoryError::Validation(_)));
    }

    #[tokio::test]
    async fn get_missing_is_not_found() {
        let store = SqliteStore::open_in_memory().unwrap();
        let err = store.get(RecordKind::Todo, Uuid::new_v4()).await.unwrap_err();
        assert!(matches!(err, MemoryError::NotFound { kind: RecordKind::Todo, .. }));
    }

    #[tokio::test]
    async fn similarity_returns_best_match_first() {
        let store = SqliteStore::open_in_memory().unwrap();
        let near = memory(Channel::X, "near", vec![1.0, 0.0, 0.0]);
        let far = memory(Channel::X, "far", vec![0.0, 0.0, 1.0]);
        store.insert(RecordKind::Memory, &near).await.unwrap();
        store.insert(RecordKind::Memory, &far).await.unwrap();

        let hits = store
            .query_by_similarity(RecordKind::Memory, &[1.0, 0.0, 0.0], &RecordFilter::all(), 1)
            .await
            .unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].record.id, near.id);
        assert!((hits[0].score - 1.0).abs() < 1e-6);
    }

    #[tokio::test]
    async fn similarity_skips_dimension_mismatch() {
        let store = SqliteStore::open_in_memory().unwrap();
        let r = memory(Channel::X, "3d", vec![1.0, 0.0, 0.0]);
        store.insert(RecordKind::Memory, &r).await.unwrap();
        let hits = store
            .query_by_similarity(RecordKind::Memory, &[1.0, 0.0], &RecordFilter::all(), 5)
            .await
            .unwrap();
        assert!(hits.is_empty());
    }

    #[tokio::test]
    async fn similarity_with_empty_query_is_rejected() {
        let store = SqliteStore::open_in_memory().unwrap();
        let err = store
            .query_by_similarity(RecordKind::Memory, &[], &RecordFilter::all(), 5)
            .await
            .unwrap_err();
        assert!(matches!(err, MemoryError::Validation(_)));
    }

    #[tokio::test]
    async fn similarity_respects_channel_filter() {
        let store = SqliteStore::open_in_memory().unwrap();
        let a = memory(Channel::Telegram, "a", vec![1.0, 0.0]);
        let b = memory(Channel::Coding, "b", vec![1.0, 0.0]);
        store.insert(RecordKind::Memory, &a).await.unwrap();
        store.insert(RecordKind::Memory, &b).await.unwrap();

        let hits = store
            .query_by_similarity(
                RecordKind::Memory,
                &[1.0, 0.0],
                &RecordFilter::channel(Channel::Coding),
                10,
            )
            .await
            .unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].record.id, b.id);
    }

    #[tokio::test]
    async fn time_range_is_newest_first_and_limited() {
        let store = SqliteStore::open_in_memory().unwrap();
        let now = Utc::now();
        for i in 0..5 {
            let mut r = memory(Channel::Coding, &format!("m{i}"), vec![1.0]);
            r.created_at = now - ChronoDuration::minutes(i * 10);
            store.insert(RecordKind::Memory, &r).await.unwrap();
        }
        let out = store
            .query_by_time_range(
                RecordKind::Memory,
                &RecordFilter::channel(Channel::Coding),
                now - ChronoDuration::hours(1),
                now,
                3,
            )
            .await
            .unwrap();
        let contents: Vec<_> = out.iter().map(|r| r.content.as_str()).collect();
        assert_eq!(contents, vec!["m0", "m1", "m2"]);
    }

    #[tokio::test]
    async fn time_range_excluding_channel() {
        let store = SqliteStore::open_in_memory().unwrap();
        store
            .insert(RecordKind::Memory, &memory(Channel::Telegram, "t", vec![1.0]))
            .await
            .unwrap();
        store
            .insert(RecordKind::Memory, &memory(Channel::X, "x", vec![1.0]))
            .await
            .unwrap();
        let now = Utc::now();
        let out = store
            .query_by_time_range(
                RecordKind::Memory,
                &RecordFilter::excluding_channel(Channel::Telegram),
                now - ChronoDuration::hours(1),
                now + ChronoDuration::seconds(1),
                10,
            )
            .await
            .unwrap();
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].content, "x");
    }

    #[tokio::test]
    async fn update_keeps_created_at() {
        let store = SqliteStore::open_in_memory().unwrap();
        let r = memory(Channel::X, "before", vec![1.0]);
        store.insert(RecordKind::Memory, &r).await.unwrap();

        let updated = store
            .update(
                RecordKind::Memory,
                r.id,
                RecordPatch {
                    content: Some("after".into()),
                    ..RecordPatch::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.content, "after");
        assert_eq!(updated.created_at, r.created_at);

        let back = store.get(RecordKind::Memory, r.id).await.unwrap();
        assert_eq!(back.content, "after");
        assert_eq!(back.updated_at, updated.updated_at);
    }

    #[tokio::test]
    async fn update_missing_is_not_found() {
        let store = SqliteStore::open_in_memory().unwrap();
        let err = store
            .update(RecordKind::Memory, Uuid::new_v4(), RecordPatch::default())
            .await
            .unwrap_err();
        assert!(matches!(err, MemoryError::NotFound { .. }));
    }

    #[tokio::test]
    async fn delete_reports_existence() {
        let store = SqliteStore::open_in_memory().unwrap();
        let r = memory(Channel::X, "gone", vec![1.0]);
        store.insert(RecordKind::Memory, &r).await.unwrap();
        assert!(store.delete(RecordKind::Memory, r.id).await.unwrap());
        assert!(!store.delete(RecordKind::Memory, r.id).await.unwrap());
        assert_eq!(store.count(RecordKind::Memory).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn delete_where_applies_both_conditions() {
        let store = SqliteStore::open_in_memory().unwrap();
        let now = Utc::now();
        let mut old_low = memory(Channel::X, "old low", vec![1.0]);
        old_low.created_at = now - ChronoDuration::days(8);
        old_low.importance = 0.2;
        let mut old_high = memory(Channel::X, "old high", vec![1.0]);
        old_high.created_at = now - ChronoDuration::days(100);
        old_high.importance = 0.4;
        let mut new_low = memory(Channel::X, "new low", vec![1.0]);
        new_low.importance = 0.0;
        for r in [&old_low, &old_high, &new_low] {
            store.insert(RecordKind::Memory, r).await.unwrap();
        }

        let pred = DeletePredicate {
            created_before: now - ChronoDuration::days(7),
            importance_below: 0.4,
        };
        assert_eq!(store.delete_where(RecordKind::Memory, &pred).await.unwrap(), 1);
        assert_eq!(store.delete_where(RecordKind::Memory, &pred).await.unwrap(), 0);
        assert_eq!(store.count(RecordKind::Memory).await.unwrap(), 2);
    }

    #[tokio::test]
    async fn second_entry_for_same_person_conflicts() {
        let store = SqliteStore::open_in_memory().unwrap();
        store
            .insert(RecordKind::Relationship, &person("alice"))
            .await
            .unwrap();
        let err = store
            .insert(RecordKind::Relationship, &person("alice"))
            .await
            .unwrap_err();
        assert!(matches!(err, MemoryError::Conflict { .. }));
    }

    #[tokio::test]
    async fn file_database_persists_across_reopen() {
        let dir = tempfile::tempdir().expect("tmp dir");
        let path = dir.path().join("mnemo.db");
        let r = memory(Channel::Discord, "persisted", vec![0.5, 0.5]);
        {
            let store = SqliteStore::open(&path).unwrap();
            store.insert(RecordKind::Memory, &r).await.unwrap();
        }
        let store = SqliteStore::open(&path).unwrap();
        let back = store.get(RecordKind::Memory, r.id).await.unwrap();
        assert_eq!(back.content, "persisted");
    }
}
