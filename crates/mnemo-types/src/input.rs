//! Creation and merge requests.
//!
//! Each request validates itself before the engine touches the embedding
//! provider or the store, so a rejected request never produces a partial
//! write.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::enums::{
    Channel, JournalType, KnowledgeType, Mood, Priority, ThoughtType, TodoCategory, TodoStatus,
};
use crate::record::{
    JournalFields, KnowledgeFields, MemoryFields, Metadata, RecordBody, RecordKind, ThoughtFields,
    TodoFields,
};
use crate::{ValidationError, check_range, check_unit, require_text};

/// Importance assigned when the caller does not supply one.
pub const DEFAULT_IMPORTANCE: f32 = 0.5;

/// Relationship type assigned to a person seen for the first time.
pub const DEFAULT_RELATIONSHIP_TYPE: &str = "acquaintance";

/// Validated content of a record that has not been embedded or stored yet.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordDraft {
    pub content: String,
    pub importance: Option<f32>,
    pub metadata: Metadata,
    pub body: RecordBody,
}

/// A creation request for one record kind.
pub trait NewRecord {
    const KIND: RecordKind;

    fn validate(&self) -> Result<(), ValidationError>;

    fn into_draft(self) -> RecordDraft;
}

fn check_importance(importance: Option<f32>) -> Result<(), ValidationError> {
    match importance {
        Some(v) => check_unit("importance", v).map(|_| ()),
        None => Ok(()),
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Memory
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewMemory {
    pub content: String,
    pub channel: Channel,
    #[serde(default)]
    pub importance: Option<f32>,
    #[serde(default)]
    pub metadata: Metadata,
}

impl NewMemory {
    pub fn new(content: impl Into<String>, channel: Channel) -> Self {
        Self {
            content: content.into(),
            channel,
            importance: None,
            metadata: Metadata::new(),
        }
    }

    pub fn with_importance(mut self, importance: f32) -> Self {
        self.importance = Some(importance);
        self
    }

    pub fn with_metadata(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.metadata.insert(key.into(), value);
        self
    }
}

impl NewRecord for NewMemory {
    const KIND: RecordKind = RecordKind::Memory;

    fn validate(&self) -> Result<(), ValidationError> {
        require_text("content", &self.content)?;
        check_importance(self.importance)
    }

    fn into_draft(self) -> RecordDraft {
        RecordDraft {
            content: self.content,
            importance: self.importance,
            metadata: self.metadata,
            body: RecordBody::Memory(MemoryFields {
                channel: self.channel,
            }),
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Thought
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewThought {
    pub content: String,
    pub thought_type: ThoughtType,
    #[serde(default)]
    pub mood: Mood,
    #[serde(default)]
    pub importance: Option<f32>,
    #[serde(default)]
    pub metadata: Metadata,
}

impl NewThought {
    pub fn new(content: impl Into<String>, thought_type: ThoughtType) -> Self {
        Self {
            content: content.into(),
            thought_type,
            mood: Mood::default(),
            importance: None,
            metadata: Metadata::new(),
        }
    }

    pub fn with_mood(mut self, mood: Mood) -> Self {
        self.mood = mood;
        self
    }

    pub fn with_importance(mut self, importance: f32) -> Self {
        self.importance = Some(importance);
        self
    }
}

impl NewRecord for NewThought {
    const KIND: RecordKind = RecordKind::Thought;

    fn validate(&self) -> Result<(), ValidationError> {
        require_text("content", &self.content)?;
        check_importance(self.importance)
    }

    fn into_draft(self) -> RecordDraft {
        RecordDraft {
            content: self.content,
            importance: self.importance,
            metadata: self.metadata,
            body: RecordBody::Thought(ThoughtFields {
                thought_type: self.thought_type,
                mood: self.mood,
            }),
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Todo
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewTodo {
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub priority: Priority,
    #[serde(default)]
    pub category: TodoCategory,
    #[serde(default)]
    pub project: Option<String>,
    #[serde(default)]
    pub importance: Option<f32>,
    #[serde(default)]
    pub metadata: Metadata,
}

impl NewTodo {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            description: None,
            priority: Priority::default(),
            category: TodoCategory::default(),
            project: None,
            importance: None,
            metadata: Metadata::new(),
        }
    }

    pub fn with_priority(mut self, priority: Priority) -> Self {
        self.priority = priority;
        self
    }

    pub fn with_category(mut self, category: TodoCategory) -> Self {
        self.category = category;
        self
    }

    pub fn with_project(mut self, project: impl Into<String>) -> Self {
        self.project = Some(project.into());
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

/// Embeddable text of a todo: the title, followed by the description if any.
pub fn todo_content(title: &str, description: Option<&str>) -> String {
    match description {
        Some(d) if !d.trim().is_empty() => format!("{title}\n\n{d}"),
        _ => title.to_string(),
    }
}

impl NewRecord for NewTodo {
    const KIND: RecordKind = RecordKind::Todo;

    fn validate(&self) -> Result<(), ValidationError> {
        require_text("title", &self.title)?;
        check_importance(self.importance)
    }

    fn into_draft(self) -> RecordDraft {
        RecordDraft {
            content: todo_content(&self.title, self.description.as_deref()),
            importance: self.importance,
            metadata: self.metadata,
            body: RecordBody::Todo(TodoFields {
                title: self.title,
                description: self.description,
                status: TodoStatus::Pending,
                priority: self.priority,
                category: self.category,
                project: self.project,
            }),
        }
    }
}

/// In-place changes to an existing todo.  `None` leaves a field untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TodoUpdate {
    pub status: Option<TodoStatus>,
    pub priority: Option<Priority>,
    pub category: Option<TodoCategory>,
    pub title: Option<String>,
    pub project: Option<String>,
}

impl TodoUpdate {
    pub fn status(status: TodoStatus) -> Self {
        Self {
            status: Some(status),
            ..Self::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.status.is_none()
            && self.priority.is_none()
            && self.category.is_none()
            && self.title.is_none()
            && self.project.is_none()
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.is_empty() {
            return Err(ValidationError::MissingField("todo update"));
        }
        if let Some(title) = &self.title {
            require_text("title", title)?;
        }
        Ok(())
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Journal
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewJournalEntry {
    pub content: String,
    pub journal_type: JournalType,
    #[serde(default)]
    pub mood: Mood,
    pub energy: f32,
    #[serde(default)]
    pub highlights: Vec<String>,
    #[serde(default)]
    pub importance: Option<f32>,
    #[serde(default)]
    pub metadata: Metadata,
}

impl NewJournalEntry {
    pub fn new(content: impl Into<String>, journal_type: JournalType) -> Self {
        Self {
            content: content.into(),
            journal_type,
            mood: Mood::default(),
            energy: 0.5,
            highlights: Vec::new(),
            importance: None,
            metadata: Metadata::new(),
        }
    }

    pub fn with_mood(mut self, mood: Mood) -> Self {
        self.mood = mood;
        self
    }

    pub fn with_energy(mut self, energy: f32) -> Self {
        self.energy = energy;
        self
    }

    pub fn with_highlight(mut self, highlight: impl Into<String>) -> Self {
        self.highlights.push(highlight.into());
        self
    }
}

impl NewRecord for NewJournalEntry {
    const KIND: RecordKind = RecordKind::Journal;

    fn validate(&self) -> Result<(), ValidationError> {
        require_text("content", &self.content)?;
        check_unit("energy", self.energy)?;
        for h in &self.highlights {
            require_text("highlight", h)?;
        }
        check_importance(self.importance)
    }

    fn into_draft(self) -> RecordDraft {
        RecordDraft {
            content: self.content,
            importance: self.importance,
            metadata: self.metadata,
            body: RecordBody::Journal(JournalFields {
                journal_type: self.journal_type,
                mood: self.mood,
                energy: self.energy,
                highlights: self.highlights,
            }),
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Knowledge
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewKnowledgeItem {
    pub content: String,
    pub topic: String,
    #[serde(default)]
    pub knowledge_type: KnowledgeType,
    pub source: String,
    pub confidence: f32,
    #[serde(default)]
    pub tags: BTreeSet<String>,
    #[serde(default)]
    pub importance: Option<f32>,
    #[serde(default)]
    pub metadata: Metadata,
}

impl NewKnowledgeItem {
    pub fn new(content: impl Into<String>, topic: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            topic: topic.into(),
            knowledge_type: KnowledgeType::default(),
            source: "conversation".to_string(),
            confidence: 0.8,
            tags: BTreeSet::new(),
            importance: None,
            metadata: Metadata::new(),
        }
    }

    pub fn with_type(mut self, knowledge_type: KnowledgeType) -> Self {
        self.knowledge_type = knowledge_type;
        self
    }

    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = source.into();
        self
    }

    pub fn with_confidence(mut self, confidence: f32) -> Self {
        self.confidence = confidence;
        self
    }

    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tags.insert(tag.into());
        self
    }
}

impl NewRecord for NewKnowledgeItem {
    const KIND: RecordKind = RecordKind::Knowledge;

    fn validate(&self) -> Result<(), ValidationError> {
        require_text("content", &self.content)?;
        require_text("topic", &self.topic)?;
        require_text("source", &self.source)?;
        check_unit("confidence", self.confidence)?;
        check_importance(self.importance)
    }

    fn into_draft(self) -> RecordDraft {
        RecordDraft {
            content: self.content,
            importance: self.importance,
            metadata: self.metadata,
            body: RecordBody::Knowledge(KnowledgeFields {
                topic: self.topic,
                knowledge_type: self.knowledge_type,
                source: self.source,
                confidence: self.confidence,
                tags: self.tags,
            }),
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Relationships
// ─────────────────────────────────────────────────────────────────────────────

/// How a `relate` call changes a person's affection.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "mode", content = "value")]
pub enum AffectionChange {
    /// Added to the current value.  Must lie in `[-2, 2]`.
    Delta(f32),
    /// Replaces the current value.  Must lie in `[-1, 1]`.
    Set(f32),
}

impl AffectionChange {
    pub fn validate(&self) -> Result<(), ValidationError> {
        match *self {
            AffectionChange::Delta(d) => check_range("affection delta", d, -2.0, 2.0).map(|_| ()),
            AffectionChange::Set(v) => check_range("affection", v, -1.0, 1.0).map(|_| ()),
        }
    }

    /// Apply to `current`, clamping the result to `[-1, 1]`.
    pub fn apply(&self, current: f32) -> f32 {
        let next = match *self {
            AffectionChange::Delta(d) => current + d,
            AffectionChange::Set(v) => v,
        };
        next.clamp(-1.0, 1.0)
    }
}

/// Upsert-merge request for one person's relationship entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RelateRequest {
    pub person_id: String,
    #[serde(default)]
    pub note: Option<String>,
    #[serde(default)]
    pub affection: Option<AffectionChange>,
    #[serde(default)]
    pub relationship_type: Option<String>,
    #[serde(default)]
    pub moment: Option<String>,
    #[serde(default)]
    pub metadata: Metadata,
}

impl RelateRequest {
    pub fn new(person_id: impl Into<String>) -> Self {
        Self {
            person_id: person_id.into(),
            note: None,
            affection: None,
            relationship_type: None,
            moment: None,
            metadata: Metadata::new(),
        }
    }

    pub fn note(mut self, note: impl Into<String>) -> Self {
        self.note = Some(note.into());
        self
    }

    pub fn affection(mut self, change: AffectionChange) -> Self {
        self.affection = Some(change);
        self
    }

    pub fn relationship_type(mut self, relationship_type: impl Into<String>) -> Self {
        self.relationship_type = Some(relationship_type.into());
        self
    }

    pub fn moment(mut self, moment: impl Into<String>) -> Self {
        self.moment = Some(moment.into());
        self
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        require_text("person_id", &self.person_id)?;
        if let Some(note) = &self.note {
            require_text("note", note)?;
        }
        if let Some(moment) = &self.moment {
            require_text("moment", moment)?;
        }
        if let Some(t) = &self.relationship_type {
            require_text("relationship_type", t)?;
        }
        if let Some(change) = &self.affection {
            change.validate()?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memory_with_excess_importance_is_rejected() {
        let m = NewMemory::new("hi", Channel::Telegram).with_importance(1.5);
        assert!(matches!(
            m.validate(),
            Err(ValidationError::OutOfRange { field: "importance", .. })
        ));
    }

    #[test]
    fn memory_without_importance_is_valid() {
        let m = NewMemory::new("hi", Channel::Telegram);
        assert!(m.validate().is_ok());
        let draft = m.into_draft();
        assert_eq!(draft.importance, None);
        assert_eq!(draft.body.kind(), RecordKind::Memory);
    }

    #[test]
    fn blank_memory_is_missing_content() {
        let m = NewMemory::new("  ", Channel::X);
        assert_eq!(m.validate(), Err(ValidationError::MissingField("content")));
    }

    #[test]
    fn todo_content_includes_description() {
        let t = NewTodo::new("Fix overlay").with_description("flickers on resize");
        let draft = t.into_draft();
        assert_eq!(draft.content, "Fix overlay\n\nflickers on resize");
        match draft.body {
            RecordBody::Todo(f) => assert_eq!(f.status, TodoStatus::Pending),
            other => panic!("unexpected body: {other:?}"),
        }
    }

    #[test]
    fn journal_energy_is_bounded() {
        let j = NewJournalEntry::new("long day", JournalType::MoodCheck).with_energy(1.2);
        assert!(j.validate().is_err());
    }

    #[test]
    fn knowledge_confidence_is_bounded() {
        let k = NewKnowledgeItem::new("Rust has no GC", "rust").with_confidence(-0.1);
        assert!(k.validate().is_err());
        let k = NewKnowledgeItem::new("Rust has no GC", "").with_confidence(0.9);
        assert_eq!(k.validate(), Err(ValidationError::MissingField("topic")));
    }

    #[test]
    fn affection_delta_accumulates_and_clamps() {
        let after_first = AffectionChange::Delta(0.3).apply(0.0);
        let after_second = AffectionChange::Delta(-0.9).apply(after_first);
        assert!((after_second - (-0.6)).abs() < 1e-6);
        assert_eq!(AffectionChange::Delta(1.5).apply(0.8), 1.0);
        assert_eq!(AffectionChange::Delta(-2.0).apply(0.5), -1.0);
    }

    #[test]
    fn affection_set_replaces_value() {
        assert_eq!(AffectionChange::Set(0.25).apply(-0.7), 0.25);
        assert!(AffectionChange::Set(1.1).validate().is_err());
    }

    #[test]
    fn relate_requires_person() {
        assert!(RelateRequest::new("").validate().is_err());
        assert!(RelateRequest::new("alice").note("likes tea").validate().is_ok());
    }

    #[test]
    fn empty_todo_update_is_rejected() {
        assert!(TodoUpdate::default().validate().is_err());
        assert!(TodoUpdate::status(TodoStatus::Completed).validate().is_ok());
    }
}
