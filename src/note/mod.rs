pub mod conversation;
pub mod draft;
pub mod types;

pub use draft::NoteDraft;
pub use types::{
    Category, CategoryId, Importance, NewNote, Note, NoteId, NotePatch, OwnerId, Relation,
};
