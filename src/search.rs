//! Live free-text filtering of the note collection.
//!
//! Matching is a case-insensitive substring test against title, content and
//! category name. [`filter_notes`] is pure; [`NoteSearch`] adds a memo keyed on
//! the model revision and the query, so results are re-derived whenever either
//! one moves and never served stale.

use crate::graph::GraphModel;
use crate::note::Note;

/// Does `note` match an already lower-cased, trimmed query?
pub fn matches(note: &Note, lowered_query: &str) -> bool {
    note.title.to_lowercase().contains(lowered_query)
        || note.content.to_lowercase().contains(lowered_query)
        || note
            .category_name
            .as_deref()
            .is_some_and(|name| name.to_lowercase().contains(lowered_query))
}

/// Filter `notes` by `query`, preserving order. A blank query returns every note.
pub fn filter_notes(notes: &[Note], query: &str) -> Vec<Note> {
    let lowered = query.trim().to_lowercase();
    if lowered.is_empty() {
        return notes.to_vec();
    }
    notes
        .iter()
        .filter(|note| matches(note, &lowered))
        .cloned()
        .collect()
}

struct Memo {
    revision: u64,
    query: String,
    results: Vec<Note>,
}

/// The list-view search box: a current query plus memoized results.
#[derive(Default)]
pub struct NoteSearch {
    query: String,
    memo: Option<Memo>,
}

impl NoteSearch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn set_query(&mut self, query: impl Into<String>) {
        self.query = query.into();
    }

    /// Current results against `model`, recomputed if the model or the query
    /// changed since the last call.
    pub fn results(&mut self, model: &GraphModel) -> &[Note] {
        let fresh = self
            .memo
            .as_ref()
            .is_some_and(|m| m.revision == model.revision() && m.query == self.query);

        if !fresh {
            let results = filter_notes(model.notes(), &self.query);
            tracing::debug!(
                query = %self.query,
                matched = results.len(),
                total = model.len(),
                "search re-derived"
            );
            self.memo = Some(Memo {
                revision: model.revision(),
                query: self.query.clone(),
                results,
            });
        }

        match &self.memo {
            Some(memo) => &memo.results,
            None => &[],
        }
    }
}
