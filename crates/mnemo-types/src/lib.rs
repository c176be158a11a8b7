//! `mnemo-types` – shared record model for the Mnemo memory subsystem.
//!
//! # Modules
//!
//! - [`enums`] – closed enumerations ([`Channel`], [`Mood`], [`Priority`], …)
//!   parsed and validated at the boundary.
//! - [`record`] – the stored [`Record`] shape and its per-kind
//!   [`RecordBody`] specializations.
//! - [`input`] – creation requests ([`NewMemory`], [`NewTodo`], …) and the
//!   [`RelateRequest`] merge request, each with a `validate` step that runs
//!   before any provider or store call.

use thiserror::Error;

pub mod enums;
pub mod input;
pub mod record;

pub use enums::{
    Channel, JournalType, KnowledgeType, Mood, Priority, ThoughtType, TodoCategory, TodoStatus,
};
pub use input::{
    AffectionChange, NewJournalEntry, NewKnowledgeItem, NewMemory, NewRecord, NewThought,
    NewTodo, RecordDraft, RelateRequest, TodoUpdate,
};
pub use record::{
    JournalFields, KnowledgeFields, MemoryFields, Metadata, Moment, Record, RecordBody,
    RecordKind, RelationshipFields, ThoughtFields, TodoFields,
};

/// Rejection of a caller-supplied value, raised before any side effect.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValidationError {
    #[error("{field} must be within [{min}, {max}], got {value}")]
    OutOfRange {
        field: &'static str,
        value: f32,
        min: f32,
        max: f32,
    },

    #[error("unknown {field} value: {value:?}")]
    UnknownVariant { field: &'static str, value: String },

    #[error("missing required field: {0}")]
    MissingField(&'static str),

    #[error("{field} does not belong to a {expected} record")]
    KindMismatch {
        field: &'static str,
        expected: RecordKind,
    },
}

/// Ensure `value` lies in the closed interval `[min, max]`.
///
/// NaN is always rejected.
pub fn check_range(field: &'static str, value: f32, min: f32, max: f32) -> Result<f32, ValidationError> {
    if (min..=max).contains(&value) {
        Ok(value)
    } else {
        Err(ValidationError::OutOfRange {
            field,
            value,
            min,
            max,
        })
    }
}

/// Shorthand for [`check_range`] over `[0, 1]`.
pub fn check_unit(field: &'static str, value: f32) -> Result<f32, ValidationError> {
    check_range(field, value, 0.0, 1.0)
}

/// Reject empty or whitespace-only text.
pub fn require_text(field: &'static str, value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        Err(ValidationError::MissingField(field))
    } else {
        Ok(())
    }
}
