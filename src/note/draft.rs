//! Note drafts as submitted by the save and edit dialogs.

use serde::{Deserialize, Serialize};

use super::types::{CategoryId, Importance, NewNote, NoteId, OwnerId};
use crate::error::ValidationError;

/// Unvalidated user input for a new note.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NoteDraft {
    pub title: String,
    pub content: String,
    pub category_id: Option<CategoryId>,
    #[serde(default)]
    pub importance: Importance,
    /// Notes this one should relate to once saved.
    #[serde(default)]
    pub related: Vec<NoteId>,
}

impl NoteDraft {
    /// Trim and check the required fields, producing a store request plus
    /// the relation targets.
    pub fn validate(self, owner_id: &OwnerId) -> Result<(NewNote, Vec<NoteId>), ValidationError> {
        let title = self.title.trim().to_string();
        let content = self.content.trim().to_string();

        if title.is_empty() {
            return Err(ValidationError::EmptyTitle);
        }
        if content.is_empty() {
            return Err(ValidationError::EmptyContent);
        }
        let category_id = self.category_id.ok_or(ValidationError::MissingCategory)?;

        let mut related = self.related;
        related.sort();
        related.dedup();

        Ok((
            NewNote {
                owner_id: owner_id.clone(),
                category_id,
                title,
                content,
                importance: self.importance,
            },
            related,
        ))
    }
}
