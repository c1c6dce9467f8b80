//! Data-access contract the graph core consumes.
//!
//! Every call is scoped to one owner. Implementations are blocking; the
//! engine runs them on the blocking thread pool.

pub mod sqlite;

use serde::{Deserialize, Serialize};

use crate::error::RepositoryError;
use crate::note::{Category, CategoryId, NewNote, Note, NoteId, NotePatch, OwnerId, Relation};

pub use sqlite::SqliteRepository;

/// Everything needed to build one owner's graph.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Snapshot {
    pub notes: Vec<Note>,
    #[serde(default)]
    pub relations: Vec<Relation>,
    #[serde(default)]
    pub categories: Vec<Category>,
}

pub trait NoteRepository: Send + Sync {
    /// Notes newest first, with the category name joined in.
    fn list_notes(&self, owner: &OwnerId) -> Result<Vec<Note>, RepositoryError>;

    /// Directed relation rows. Both directions of each relation are listed.
    fn list_relations(&self, owner: &OwnerId) -> Result<Vec<Relation>, RepositoryError>;

    /// Categories ordered by name.
    fn list_categories(&self, owner: &OwnerId) -> Result<Vec<Category>, RepositoryError>;

    /// Store a new note. The store assigns the id and timestamps.
    fn create_note(&self, note: &NewNote) -> Result<Note, RepositoryError>;

    /// Apply `patch` and return the note as stored.
    fn update_note(
        &self,
        owner: &OwnerId,
        id: &NoteId,
        patch: &NotePatch,
    ) -> Result<Note, RepositoryError>;

    /// Delete a note. Its relations go with it.
    fn delete_note(&self, owner: &OwnerId, id: &NoteId) -> Result<(), RepositoryError>;

    /// Replace every relation of `id` with relations to `targets`, writing both
    /// directions. Unknown, foreign and self targets are skipped; the accepted
    /// targets are returned.
    fn replace_relations(
        &self,
        owner: &OwnerId,
        id: &NoteId,
        targets: &[NoteId],
    ) -> Result<Vec<NoteId>, RepositoryError>;

    fn create_category(&self, owner: &OwnerId, name: &str) -> Result<Category, RepositoryError>;

    fn rename_category(
        &self,
        owner: &OwnerId,
        id: &CategoryId,
        name: &str,
    ) -> Result<Category, RepositoryError>;

    /// Fetch notes, relations and categories in one go.
    fn snapshot(&self, owner: &OwnerId) -> Result<Snapshot, RepositoryError> {
        Ok(Snapshot {
            notes: self.list_notes(owner)?,
            relations: self.list_relations(owner)?,
            categories: self.list_categories(owner)?,
        })
    }
}
