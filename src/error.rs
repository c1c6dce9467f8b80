//! Error taxonomy for the graph core.
//!
//! [`ValidationError`] rejects a single malformed item and never aborts a batch.
//! [`RepositoryError`] is anything the backing store reports. [`GraphError`]
//! wraps both, plus the internal stale-request signal used by reloads.

use thiserror::Error;

use crate::note::{CategoryId, NoteId, OwnerId};

pub type Result<T> = std::result::Result<T, GraphError>;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("note content must not be empty")]
    EmptyContent,

    #[error("note title must not be empty")]
    EmptyTitle,

    #[error("a category is required")]
    MissingCategory,

    #[error("category name must not be empty")]
    EmptyCategoryName,

    #[error("importance must be between 1 and 5, got {0}")]
    ImportanceOutOfRange(i64),

    #[error("note {0} cannot relate to itself")]
    SelfLoop(NoteId),

    #[error("relation {source_id} -> {target_id} references a missing note")]
    DanglingRelation { source_id: NoteId, target_id: NoteId },

    #[error("note {id} belongs to owner {found}, expected {expected}")]
    OwnerMismatch {
        id: NoteId,
        expected: OwnerId,
        found: OwnerId,
    },

    #[error("duplicate note id: {0}")]
    DuplicateNote(NoteId),

    #[error("unknown category: {0}")]
    UnknownCategory(CategoryId),
}

#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("database error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("{kind} not found: {id}")]
    NotFound { kind: &'static str, id: String },

    #[error("rejected by store: {0}")]
    Invalid(#[from] ValidationError),

    #[error("store unavailable: {0}")]
    Unavailable(String),
}

#[derive(Debug, Error)]
pub enum GraphError {
    #[error("validation failed: {0}")]
    Validation(#[from] ValidationError),

    #[error("request {requested} superseded by {current}")]
    StaleRequest { requested: u64, current: u64 },

    #[error("adapter error: {0}")]
    Adapter(#[from] RepositoryError),

    #[error("unknown note: {0}")]
    UnknownNote(NoteId),
}
