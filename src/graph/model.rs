//! In-memory graph of one owner's notes and their symmetric relations.
//!
//! Notes keep the order the caller supplied them in. Adjacency is a map from
//! note id to the set of directly related ids and always holds both directions
//! of every relation, so [`GraphModel::neighbors_of`] is a single lookup.

use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet, HashMap};

use crate::error::{GraphError, Result, ValidationError};
use crate::note::{Category, CategoryId, Note, NoteId, OwnerId, Relation};

/// A single logical relation, normalized so that `a < b`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct Edge {
    pub a: NoteId,
    pub b: NoteId,
}

impl Edge {
    pub fn new(x: NoteId, y: NoteId) -> Self {
        if x <= y {
            Self { a: x, b: y }
        } else {
            Self { a: y, b: x }
        }
    }

    pub fn touches(&self, id: &NoteId) -> bool {
        &self.a == id || &self.b == id
    }
}

/// Outcome of a full [`GraphModel::load`].
#[derive(Debug, Default, Serialize)]
pub struct LoadReport {
    pub notes: usize,
    pub edges: usize,
    #[serde(skip)]
    pub rejected: Vec<ValidationError>,
}

/// Outcome of [`GraphModel::set_relations`].
#[derive(Debug, Default)]
pub struct RelationUpdate {
    pub related: BTreeSet<NoteId>,
    pub rejected: Vec<ValidationError>,
}

#[derive(Debug, Clone)]
pub struct GraphModel {
    owner: OwnerId,
    notes: Vec<Note>,
    index: HashMap<NoteId, usize>,
    adjacency: HashMap<NoteId, BTreeSet<NoteId>>,
    categories: BTreeMap<CategoryId, Category>,
    revision: u64,
}

impl GraphModel {
    pub fn new(owner: OwnerId) -> Self {
        Self {
            owner,
            notes: Vec::new(),
            index: HashMap::new(),
            adjacency: HashMap::new(),
            categories: BTreeMap::new(),
            revision: 0,
        }
    }

    pub fn owner(&self) -> &OwnerId {
        &self.owner
    }

    /// Bumped by every mutation. Derived views compare against it.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn notes(&self) -> &[Note] {
        &self.notes
    }

    pub fn note(&self, id: &NoteId) -> Option<&Note> {
        self.index.get(id).map(|&i| &self.notes[i])
    }

    pub fn contains(&self, id: &NoteId) -> bool {
        self.index.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.notes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.notes.is_empty()
    }

    pub fn categories(&self) -> impl Iterator<Item = &Category> {
        self.categories.values()
    }

    pub fn category(&self, id: &CategoryId) -> Option<&Category> {
        self.categories.get(id)
    }

    /// Replace the whole model.
    ///
    /// Bad records are rejected one by one and reported; the rest still load.
    pub fn load(
        &mut self,
        notes: Vec<Note>,
        relations: &[Relation],
        categories: Vec<Category>,
    ) -> LoadReport {
        let mut report = LoadReport::default();

        self.notes.clear();
        self.index.clear();
        self.adjacency.clear();
        self.categories.clear();

        for category in categories {
            if category.owner_id != self.owner {
                tracing::warn!(category = %category.id, "skipping category of another owner");
                continue;
            }
            self.categories.insert(category.id.clone(), category);
        }

        for mut note in notes {
            if let Err(e) = self.check_note(&note) {
                tracing::warn!(note = %note.id, error = %e, "rejected note on load");
                report.rejected.push(e);
                continue;
            }
            if self.index.contains_key(&note.id) {
                tracing::warn!(note = %note.id, "duplicate note on load");
                report.rejected.push(ValidationError::DuplicateNote(note.id));
                continue;
            }
            if let Some(category) = self.categories.get(&note.category_id) {
                note.category_name = Some(category.name.clone());
            }
            self.index.insert(note.id.clone(), self.notes.len());
            self.notes.push(note);
        }

        for rel in relations {
            match self.check_relation(&rel.source_id, &rel.target_id) {
                Ok(()) => {
                    self.link(&rel.source_id, &rel.target_id);
                }
                Err(e) => {
                    tracing::warn!(
                        source = %rel.source_id,
                        target = %rel.target_id,
                        error = %e,
                        "dropping stale relation"
                    );
                    report.rejected.push(e);
                }
            }
        }

        report.notes = self.notes.len();
        report.edges = self.edge_count();
        self.revision += 1;

        tracing::info!(
            notes = report.notes,
            edges = report.edges,
            rejected = report.rejected.len(),
            "graph loaded"
        );
        report
    }

    /// Insert a note or replace the note with the same id. Adjacency is untouched.
    pub fn upsert_note(&mut self, mut note: Note) -> Result<()> {
        self.check_note(&note)?;
        if let Some(category) = self.categories.get(&note.category_id) {
            note.category_name = Some(category.name.clone());
        }
        match self.index.get(&note.id) {
            Some(&i) => self.notes[i] = note,
            None => {
                self.index.insert(note.id.clone(), self.notes.len());
                self.notes.push(note);
            }
        }
        self.revision += 1;
        Ok(())
    }

    /// Remove a note and every relation touching it. Returns the removed note.
    pub fn remove_note(&mut self, id: &NoteId) -> Option<Note> {
        let pos = self.index.remove(id)?;
        let note = self.notes.remove(pos);
        for i in pos..self.notes.len() {
            self.index.insert(self.notes[i].id.clone(), i);
        }

        if let Some(neighbors) = self.adjacency.remove(id) {
            for n in neighbors {
                self.detach(&n, id);
            }
        }

        self.revision += 1;
        Some(note)
    }

    /// Replace every relation of `id` with relations to `targets`.
    ///
    /// Targets that are unknown or equal to `id` are rejected individually.
    pub fn set_relations(&mut self, id: &NoteId, targets: &[NoteId]) -> Result<RelationUpdate> {
        if !self.contains(id) {
            return Err(GraphError::UnknownNote(id.clone()));
        }

        let mut update = RelationUpdate::default();
        let mut accepted = BTreeSet::new();
        for target in targets {
            match self.check_relation(id, target) {
                Ok(()) => {
                    accepted.insert(target.clone());
                }
                Err(e) => update.rejected.push(e),
            }
        }

        if let Some(previous) = self.adjacency.remove(id) {
            for n in previous {
                self.detach(&n, id);
            }
        }
        for target in &accepted {
            self.link(id, target);
        }

        self.revision += 1;
        update.related = accepted;
        Ok(update)
    }

    /// Add one symmetric relation. Returns `false` if it already existed.
    pub fn relate(&mut self, a: &NoteId, b: &NoteId) -> Result<bool> {
        self.check_relation(a, b)?;
        let added = self.link(a, b);
        if added {
            self.revision += 1;
        }
        Ok(added)
    }

    /// Remove one symmetric relation. Returns `false` if there was none.
    pub fn unrelate(&mut self, a: &NoteId, b: &NoteId) -> bool {
        let removed = self.detach(a, b);
        self.detach(b, a);
        if removed {
            self.revision += 1;
        }
        removed
    }

    /// Directly related ids. Empty for isolated or unknown notes.
    pub fn neighbors_of(&self, id: &NoteId) -> BTreeSet<NoteId> {
        self.adjacency.get(id).cloned().unwrap_or_default()
    }

    pub fn are_related(&self, a: &NoteId, b: &NoteId) -> bool {
        self.adjacency.get(a).is_some_and(|set| set.contains(b))
    }

    pub fn degree(&self, id: &NoteId) -> usize {
        self.adjacency.get(id).map_or(0, BTreeSet::len)
    }

    /// Every logical relation exactly once.
    pub fn edges(&self) -> BTreeSet<Edge> {
        self.adjacency
            .iter()
            .flat_map(|(a, set)| {
                set.iter()
                    .filter(move |b| a < *b)
                    .map(move |b| Edge::new(a.clone(), b.clone()))
            })
            .collect()
    }

    pub fn edge_count(&self) -> usize {
        self.adjacency.values().map(BTreeSet::len).sum::<usize>() / 2
    }

    /// Replace the category list and re-join every note's category name.
    pub fn set_categories(&mut self, categories: Vec<Category>) {
        self.categories = categories
            .into_iter()
            .filter(|c| c.owner_id == self.owner)
            .map(|c| (c.id.clone(), c))
            .collect();
        self.rejoin_category_names();
        self.revision += 1;
    }

    pub fn upsert_category(&mut self, category: Category) -> Result<()> {
        if category.name.trim().is_empty() {
            return Err(ValidationError::EmptyCategoryName.into());
        }
        self.categories.insert(category.id.clone(), category);
        self.rejoin_category_names();
        self.revision += 1;
        Ok(())
    }

    pub fn rename_category(&mut self, id: &CategoryId, name: &str) -> Result<()> {
        let name = name.trim();
        if name.is_empty() {
            return Err(ValidationError::EmptyCategoryName.into());
        }
        let category = self
            .categories
            .get_mut(id)
            .ok_or_else(|| ValidationError::UnknownCategory(id.clone()))?;
        category.name = name.to_string();
        self.rejoin_category_names();
        self.revision += 1;
        Ok(())
    }

    fn rejoin_category_names(&mut self) {
        for note in &mut self.notes {
            note.category_name = self.categories.get(&note.category_id).map(|c| c.name.clone());
        }
    }

    fn check_note(&self, note: &Note) -> std::result::Result<(), ValidationError> {
        if note.owner_id != self.owner {
            return Err(ValidationError::OwnerMismatch {
                id: note.id.clone(),
                expected: self.owner.clone(),
                found: note.owner_id.clone(),
            });
        }
        if note.content.trim().is_empty() {
            return Err(ValidationError::EmptyContent);
        }
        Ok(())
    }

    fn check_relation(&self, a: &NoteId, b: &NoteId) -> std::result::Result<(), ValidationError> {
        if a == b {
            return Err(ValidationError::SelfLoop(a.clone()));
        }
        if !self.contains(a) || !self.contains(b) {
            return Err(ValidationError::DanglingRelation {
                source_id: a.clone(),
                target_id: b.clone(),
            });
        }
        Ok(())
    }

    /// Insert both directions. Returns `true` if the edge is new.
    fn link(&mut self, a: &NoteId, b: &NoteId) -> bool {
        let added = self.adjacency.entry(a.clone()).or_default().insert(b.clone());
        self.adjacency.entry(b.clone()).or_default().insert(a.clone());
        added
    }

    /// Remove `b` from `a`'s neighbor set, dropping empty sets.
    fn detach(&mut self, a: &NoteId, b: &NoteId) -> bool {
        let Some(set) = self.adjacency.get_mut(a) else {
            return false;
        };
        let removed = set.remove(b);
        if set.is_empty() {
            self.adjacency.remove(a);
        }
        removed
    }
}
