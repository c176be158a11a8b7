//! Stored record shape.
//!
//! Every kind shares the base fields of [`Record`]; the kind-specific fields
//! live in [`RecordBody`].  A record's kind is derived from its body, so a
//! record can never disagree with itself about what it is.

use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, SubsecRound, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::enums::{
    Channel, JournalType, KnowledgeType, Mood, Priority, ThoughtType, TodoCategory, TodoStatus,
};

/// Open key-value map attached to every record.
///
/// On in-place updates, patch keys overwrite existing keys and keys absent
/// from the patch are retained.
pub type Metadata = BTreeMap<String, serde_json::Value>;

/// The current time at microsecond precision, the resolution records are
/// persisted at.
pub fn timestamp_now() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(6)
}

// ─────────────────────────────────────────────────────────────────────────────
// RecordKind
// ─────────────────────────────────────────────────────────────────────────────

/// The six record kinds, one logical table each.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordKind {
    Memory,
    Thought,
    Todo,
    Relationship,
    Journal,
    Knowledge,
}

impl RecordKind {
    pub const ALL: [RecordKind; 6] = [
        RecordKind::Memory,
        RecordKind::Thought,
        RecordKind::Todo,
        RecordKind::Relationship,
        RecordKind::Journal,
        RecordKind::Knowledge,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            RecordKind::Memory => "memory",
            RecordKind::Thought => "thought",
            RecordKind::Todo => "todo",
            RecordKind::Relationship => "relationship",
            RecordKind::Journal => "journal",
            RecordKind::Knowledge => "knowledge",
        }
    }

    /// Name of the backing table.
    pub fn table(&self) -> &'static str {
        match self {
            RecordKind::Memory => "memories",
            RecordKind::Thought => "thoughts",
            RecordKind::Todo => "todos",
            RecordKind::Relationship => "relationships",
            RecordKind::Journal => "journal_entries",
            RecordKind::Knowledge => "knowledge_items",
        }
    }

    /// Whether records of this kind carry a content embedding.
    ///
    /// Relationship entries are looked up by person, never by similarity.
    pub fn is_embeddable(&self) -> bool {
        !matches!(self, RecordKind::Relationship)
    }
}

impl std::fmt::Display for RecordKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for RecordKind {
    type Err = crate::ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "memory" | "memories" => Ok(RecordKind::Memory),
            "thought" | "thoughts" => Ok(RecordKind::Thought),
            "todo" | "todos" => Ok(RecordKind::Todo),
            "relationship" | "relationships" | "person" => Ok(RecordKind::Relationship),
            "journal" => Ok(RecordKind::Journal),
            "knowledge" => Ok(RecordKind::Knowledge),
            _ => Err(crate::ValidationError::UnknownVariant {
                field: "record kind",
                value: s.to_string(),
            }),
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Kind-specific fields
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemoryFields {
    pub channel: Channel,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ThoughtFields {
    #[serde(rename = "type")]
    pub thought_type: ThoughtType,
    pub mood: Mood,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TodoFields {
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub status: TodoStatus,
    pub priority: Priority,
    pub category: TodoCategory,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project: Option<String>,
}

/// A timestamped moment shared with a person.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Moment {
    pub at: DateTime<Utc>,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RelationshipFields {
    pub person_id: String,
    /// Always within `[-1, 1]`.
    pub affection: f32,
    pub relationship_type: String,
    /// Oldest first.
    #[serde(default)]
    pub notes: Vec<String>,
    /// Oldest first.
    #[serde(default)]
    pub moments: Vec<Moment>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JournalFields {
    #[serde(rename = "type")]
    pub journal_type: JournalType,
    pub mood: Mood,
    pub energy: f32,
    #[serde(default)]
    pub highlights: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KnowledgeFields {
    pub topic: String,
    #[serde(rename = "type")]
    pub knowledge_type: KnowledgeType,
    pub source: String,
    pub confidence: f32,
    #[serde(default)]
    pub tags: BTreeSet<String>,
}

/// Kind-specific part of a [`Record`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RecordBody {
    Memory(MemoryFields),
    Thought(ThoughtFields),
    Todo(TodoFields),
    Relationship(RelationshipFields),
    Journal(JournalFields),
    Knowledge(KnowledgeFields),
}

impl RecordBody {
    pub fn kind(&self) -> RecordKind {
        match self {
            RecordBody::Memory(_) => RecordKind::Memory,
            RecordBody::Thought(_) => RecordKind::Thought,
            RecordBody::Todo(_) => RecordKind::Todo,
            RecordBody::Relationship(_) => RecordKind::Relationship,
            RecordBody::Journal(_) => RecordKind::Journal,
            RecordBody::Knowledge(_) => RecordKind::Knowledge,
        }
    }

    /// The indexed lookup key of this record within its table.
    ///
    /// | kind         | scope          |
    /// |--------------|----------------|
    /// | memory       | channel        |
    /// | thought      | thought type   |
    /// | todo         | status         |
    /// | relationship | person id      |
    /// | journal      | journal type   |
    /// | knowledge    | topic          |
    pub fn scope(&self) -> String {
        match self {
            RecordBody::Memory(m) => m.channel.as_str().to_string(),
            RecordBody::Thought(t) => t.thought_type.as_str().to_string(),
            RecordBody::Todo(t) => t.status.as_str().to_string(),
            RecordBody::Relationship(r) => r.person_id.clone(),
            RecordBody::Journal(j) => j.journal_type.as_str().to_string(),
            RecordBody::Knowledge(k) => k.topic.clone(),
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Record
// ─────────────────────────────────────────────────────────────────────────────

/// A single stored record of any kind.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    pub id: Uuid,
    /// Assigned once at creation; never mutated.
    pub created_at: DateTime<Utc>,
    /// Equal to `created_at` until the first in-place update.
    pub updated_at: DateTime<Utc>,
    pub content: String,
    /// Empty for kinds that are not embeddable.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub embedding: Vec<f32>,
    pub importance: f32,
    #[serde(default)]
    pub metadata: Metadata,
    pub body: RecordBody,
}

impl Record {
    /// Build a record stamped with a fresh UUID and the current time.
    pub fn new(content: String, embedding: Vec<f32>, importance: f32, body: RecordBody) -> Self {
        let now = timestamp_now();
        Self {
            id: Uuid::new_v4(),
            created_at: now,
            updated_at: now,
            content,
            embedding,
            importance,
            metadata: Metadata::new(),
            body,
        }
    }

    pub fn kind(&self) -> RecordKind {
        self.body.kind()
    }

    pub fn channel(&self) -> Option<Channel> {
        match &self.body {
            RecordBody::Memory(m) => Some(m.channel),
            _ => None,
        }
    }

    pub fn as_todo(&self) -> Option<&TodoFields> {
        match &self.body {
            RecordBody::Todo(t) => Some(t),
            _ => None,
        }
    }

    pub fn as_relationship(&self) -> Option<&RelationshipFields> {
        match &self.body {
            RecordBody::Relationship(r) => Some(r),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn memory(channel: Channel) -> Record {
        Record::new(
            "hello chat".into(),
            vec![1.0, 0.0],
            0.5,
            RecordBody::Memory(MemoryFields { channel }),
        )
    }

    #[test]
    fn kind_follows_body() {
        let r = memory(Channel::Telegram);
        assert_eq!(r.kind(), RecordKind::Memory);
        assert_eq!(r.channel(), Some(Channel::Telegram));
        assert!(r.as_todo().is_none());
    }

    #[test]
    fn new_record_has_equal_timestamps() {
        let r = memory(Channel::X);
        assert_eq!(r.created_at, r.updated_at);
    }

    #[test]
    fn body_serializes_with_kind_tag() {
        let body = RecordBody::Thought(ThoughtFields {
            thought_type: ThoughtType::ShowerThought,
            mood: Mood::Curious,
        });
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["kind"], "thought");
        assert_eq!(json["type"], "shower_thought");
        assert_eq!(json["mood"], "curious");
        let back: RecordBody = serde_json::from_value(json).unwrap();
        assert_eq!(back, body);
    }

    #[test]
    fn scope_per_kind() {
        let rel = RecordBody::Relationship(RelationshipFields {
            person_id: "alice".into(),
            affection: 0.0,
            relationship_type: "friend".into(),
            notes: vec![],
            moments: vec![],
        });
        assert_eq!(rel.scope(), "alice");
        let mem = RecordBody::Memory(MemoryFields {
            channel: Channel::StreamChat,
        });
        assert_eq!(mem.scope(), "stream_chat");
    }

    #[test]
    fn relationships_are_not_embeddable() {
        assert!(!RecordKind::Relationship.is_embeddable());
        assert!(RecordKind::Memory.is_embeddable());
        assert!(RecordKind::Todo.is_embeddable());
    }

    #[test]
    fn record_kind_parses_plurals() {
        assert_eq!("memories".parse::<RecordKind>(), Ok(RecordKind::Memory));
        assert_eq!("Todo".parse::<RecordKind>(), Ok(RecordKind::Todo));
        assert!("widgets".parse::<RecordKind>().is_err());
    }
}
