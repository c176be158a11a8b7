//! Relationship ledger.
//!
//! One entry per person, created on first contact and merged on every
//! subsequent [`MemoryEngine::relate`] call:
//!
//! * a note is appended to `notes`;
//! * a moment is appended to `moments` with the current timestamp;
//! * both sequences keep at most `relationship_history_cap` items, dropping
//!   the oldest first;
//! * a supplied relationship type overwrites the previous one;
//! * the affection change is applied and the result clamped to `[-1, 1]`.
//!
//! Concurrent calls for the same person resolve last-write-wins.

use std::str::FromStr;

use chrono::{DateTime, Utc};
use mnemo_types::input::{DEFAULT_IMPORTANCE, DEFAULT_RELATIONSHIP_TYPE};
use mnemo_types::record::timestamp_now;
use mnemo_types::{
    Moment, Record, RecordBody, RecordKind, RelateRequest, RelationshipFields, ValidationError,
    require_text,
};
use tracing::{debug, info, instrument};

use crate::engine::MemoryEngine;
use crate::error::MemoryError;
use crate::retrieval::ALL_TIME;
use crate::store::{RecordFilter, RecordPatch};

/// Ordering of [`MemoryEngine::people`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum PeopleOrder {
    /// Highest affection first.
    #[default]
    Favorites,
    /// Most recently updated first.
    Recent,
}

impl FromStr for PeopleOrder {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "favorites" | "favourites" => Ok(PeopleOrder::Favorites),
            "recent" => Ok(PeopleOrder::Recent),
            _ => Err(ValidationError::UnknownVariant {
                field: "people order",
                value: s.to_string(),
            }),
        }
    }
}

fn push_capped<T>(items: &mut Vec<T>, item: T, cap: usize) {
    items.push(item);
    if items.len() > cap {
        let excess = items.len() - cap;
        items.drain(..excess);
    }
}

/// Fold `request` into `fields`.
pub fn merge_relationship(
    fields: &mut RelationshipFields,
    request: &RelateRequest,
    now: DateTime<Utc>,
    cap: usize,
) {
    if let Some(note) = &request.note {
        push_capped(&mut fields.notes, note.clone(), cap);
    }
    if let Some(text) = &request.moment {
        push_capped(
            &mut fields.moments,
            Moment {
                at: now,
                text: text.clone(),
            },
            cap,
        );
    }
    if let Some(t) = &request.relationship_type {
        fields.relationship_type = t.clone();
    }
    if let Some(change) = request.affection {
        fields.affection = change.apply(fields.affection);
    }
}

/// Searchable one-line summary of an entry.
fn person_content(fields: &RelationshipFields) -> String {
    let mut content = format!(
        "{} ({}), affection {:+.2}",
        fields.person_id, fields.relationship_type, fields.affection
    );
    if let Some(note) = fields.notes.last() {
        content.push_str(": ");
        content.push_str(note);
    }
    content
}

fn new_entry(person_id: &str) -> RelationshipFields {
    RelationshipFields {
        person_id: person_id.to_string(),
        affection: 0.0,
        relationship_type: DEFAULT_RELATIONSHIP_TYPE.to_string(),
        notes: Vec::new(),
        moments: Vec::new(),
    }
}

impl MemoryEngine {
    async fn find_person(&self, person_id: &str) -> Result<Option<Record>, MemoryError> {
        let (start, end) = ALL_TIME;
        let mut rows = self
            .bounded(
                "query_by_time_range",
                self.store.query_by_time_range(
                    RecordKind::Relationship,
                    &RecordFilter::scope(person_id),
                    start,
                    end,
                    1,
                ),
            )
            .await?;
        Ok(rows.pop())
    }

    async fn merge_into(
        &self,
        existing: Record,
        request: &RelateRequest,
    ) -> Result<Record, MemoryError> {
        let mut fields = match existing.body {
            RecordBody::Relationship(fields) => fields,
            _ => {
                return Err(ValidationError::KindMismatch {
                    field: "body",
                    expected: RecordKind::Relationship,
                }
                .into());
            }
        };
        merge_relationship(
            &mut fields,
            request,
            timestamp_now(),
            self.config.relationship_history_cap,
        );
        let patch = RecordPatch {
            content: Some(person_content(&fields)),
            metadata: (!request.metadata.is_empty()).then(|| request.metadata.clone()),
            body: Some(RecordBody::Relationship(fields)),
            ..RecordPatch::default()
        };
        self.bounded(
            "update",
            self.store
                .update(RecordKind::Relationship, existing.id, patch),
        )
        .await
    }

    /// Create or merge the relationship entry of `request.person_id`.
    #[instrument(skip(self, request), fields(person_id = %request.person_id))]
    pub async fn relate(&self, request: RelateRequest) -> Result<Record, MemoryError> {
        request.validate()?;

        if let Some(existing) = self.find_person(&request.person_id).await? {
            let record = self.merge_into(existing, &request).await?;
            debug!(id = %record.id, "relationship merged");
            return Ok(record);
        }

        let mut fields = new_entry(&request.person_id);
        merge_relationship(
            &mut fields,
            &request,
            timestamp_now(),
            self.config.relationship_history_cap,
        );
        let mut record = Record::new(
            person_content(&fields),
            Vec::new(),
            DEFAULT_IMPORTANCE,
            RecordBody::Relationship(fields),
        );
        record.metadata = request.metadata.clone();

        match self
            .bounded("insert", self.store.insert(RecordKind::Relationship, &record))
            .await
        {
            Ok(_) => {
                info!(id = %record.id, "relationship created");
                Ok(record)
            }
            // Lost a creation race for this person: merge into the winner.
            Err(MemoryError::Conflict { .. }) => {
                let existing = self
                    .find_person(&request.person_id)
                    .await?
                    .ok_or_else(|| MemoryError::not_found(RecordKind::Relationship, &request.person_id))?;
                self.merge_into(existing, &request).await
            }
            Err(e) => Err(e),
        }
    }

    /// Known people, ordered by `order`, at most `limit`.
    pub async fn people(
        &self,
        order: PeopleOrder,
        limit: Option<usize>,
    ) -> Result<Vec<Record>, MemoryError> {
        let (start, end) = ALL_TIME;
        let mut rows = self
            .bounded(
                "query_by_time_range",
                self.store.query_by_time_range(
                    RecordKind::Relationship,
                    &RecordFilter::all(),
                    start,
                    end,
                    usize::MAX,
                ),
            )
            .await?;

        let affection = |r: &Record| r.as_relationship().map_or(0.0, |f| f.affection);
        match order {
            PeopleOrder::Favorites => rows.sort_by(|a, b| {
                affection(b)
                    .total_cmp(&affection(a))
                    .then_with(|| b.updated_at.cmp(&a.updated_at))
            }),
            PeopleOrder::Recent => rows.sort_by(|a, b| b.updated_at.cmp(&a.updated_at)),
        }
        rows.truncate(limit.unwrap_or(self.config.recall_limit));
        Ok(rows)
    }

    /// The entry of one person; [`MemoryError::NotFound`] if never related.
    pub async fn person(&self, person_id: &str) -> Result<Record, MemoryError> {
        require_text("person_id", person_id)?;
        self.find_person(person_id)
            .await?
            .ok_or_else(|| MemoryError::not_found(RecordKind::Relationship, person_id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mnemo_types::AffectionChange;

    #[test]
    fn merge_appends_and_caps_history() {
        let mut fields = new_entry("alice");
        let now = Utc::now();
        for i in 0..5 {
            merge_relationship(
                &mut fields,
                &RelateRequest::new("alice").note(format!("note {i}")).moment(format!("m {i}")),
                now,
                3,
            );
        }
        assert_eq!(fields.notes, vec!["note 2", "note 3", "note 4"]);
        assert_eq!(fields.moments.len(), 3);
        assert_eq!(fields.moments[0].text, "m 2");
        assert_eq!(fields.moments[2].at, now);
    }

    #[test]
    fn merge_applies_affection_and_type() {
        let mut fields = new_entry("bob");
        let now = Utc::now();
        merge_relationship(
            &mut fields,
            &RelateRequest::new("bob").affection(AffectionChange::Delta(0.3)),
            now,
            50,
        );
        merge_relationship(
            &mut fields,
            &RelateRequest::new("bob")
                .affection(AffectionChange::Delta(-0.9))
                .relationship_type("moderator"),
            now,
            50,
        );
        assert!((fields.affection - -0.6).abs() < 1e-6);
        assert_eq!(fields.relationship_type, "moderator");

        merge_relationship(
            &mut fields,
            &RelateRequest::new("bob").affection(AffectionChange::Delta(-2.0)),
            now,
            50,
        );
        assert_eq!(fields.affection, -1.0);
    }

    #[test]
    fn merge_without_type_keeps_previous() {
        let mut fields = new_entry("carol");
        merge_relationship(&mut fields, &RelateRequest::new("carol").note("hi"), Utc::now(), 50);
        assert_eq!(fields.relationship_type, DEFAULT_RELATIONSHIP_TYPE);
    }

    #[test]
    fn people_order_parses() {
        assert_eq!("recent".parse::<PeopleOrder>(), Ok(PeopleOrder::Recent));
        assert_eq!("Favorites".parse::<PeopleOrder>(), Ok(PeopleOrder::Favorites));
        assert!("loudest".parse::<PeopleOrder>().is_err());
    }

    #[test]
    fn content_mentions_latest_note() {
        let mut fields = new_entry("dave");
        fields.notes.push("first".into());
        fields.notes.push("likes rust".into());
        assert_eq!(person_content(&fields), "dave (acquaintance), affection +0.00: likes rust");
    }
}
