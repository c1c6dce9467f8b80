#![allow(dead_code)]

use chrono::{Duration as ChronoDuration, TimeZone, Utc};
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use memograph::error::RepositoryError;
use memograph::note::{
    Category, CategoryId, Importance, NewNote, Note, NoteId, NotePatch, OwnerId, Relation,
};
use memograph::repository::{NoteRepository, Snapshot, SqliteRepository};

pub const OWNER: &str = "alice";

pub fn owner() -> OwnerId {
    OWNER.into()
}

/// A note with a fixed timestamp offset by `seq` seconds.
pub fn note(id: &str, title: &str, content: &str, category: &str) -> Note {
    let base = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
    let seq: i64 = id.bytes().map(i64::from).sum();
    let at = base + ChronoDuration::seconds(seq);
    Note {
        id: id.into(),
        owner_id: owner(),
        category_id: category.into(),
        category_name: None,
        title: title.into(),
        content: content.into(),
        importance: Importance::default(),
        created_at: at,
        updated_at: at,
    }
}

pub fn category(id: &str, name: &str) -> Category {
    Category {
        id: id.into(),
        owner_id: owner(),
        name: name.into(),
    }
}

/// Notes `n0..n{count}` in category `c`, no relations.
pub fn numbered_notes(count: usize) -> Vec<Note> {
    (0..count)
        .map(|i| note(&format!("n{i}"), &format!("Note {i}"), &format!("body {i}"), "c"))
        .collect()
}

pub fn ids(raw: &[&str]) -> Vec<NoteId> {
    raw.iter().map(|s| NoteId::from(*s)).collect()
}

/// Open a fresh in-memory repository.
pub fn test_repo() -> SqliteRepository {
    SqliteRepository::in_memory().unwrap()
}

/// Create a category and `titles.len()` notes in it. Returns the note ids in
/// creation order.
pub fn seed(repo: &impl NoteRepository, titles: &[&str]) -> (Category, Vec<NoteId>) {
    let category = repo.create_category(&owner(), "General").unwrap();
    let ids = titles
        .iter()
        .map(|title| {
            repo.create_note(&NewNote {
                owner_id: owner(),
                category_id: category.id.clone(),
                title: (*title).into(),
                content: format!("about {title}"),
                importance: Importance::default(),
            })
            .unwrap()
            .id
        })
        .collect();
    (category, ids)
}

/// Wraps a real repository with injectable latency and failures.
pub struct FlakyRepository<R> {
    pub inner: R,
    /// Sleep this long inside the first snapshot, after reading.
    pub first_snapshot_delay: Option<Duration>,
    first_done: AtomicBool,
    pub fail_writes: AtomicBool,
    pub fail_relations: AtomicBool,
}

impl<R: NoteRepository> FlakyRepository<R> {
    pub fn new(inner: R) -> Self {
        Self {
            inner,
            first_snapshot_delay: None,
            first_done: AtomicBool::new(false),
            fail_writes: AtomicBool::new(false),
            fail_relations: AtomicBool::new(false),
        }
    }

    pub fn with_slow_first_snapshot(mut self, delay: Duration) -> Self {
        self.first_snapshot_delay = Some(delay);
        self
    }

    fn check_writes(&self) -> Result<(), RepositoryError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            Err(RepositoryError::Unavailable("injected failure".into()))
        } else {
            Ok(())
        }
    }
}

impl<R: NoteRepository> NoteRepository for FlakyRepository<R> {
    fn list_notes(&self, owner: &OwnerId) -> Result<Vec<Note>, RepositoryError> {
        self.inner.list_notes(owner)
    }

    fn list_relations(&self, owner: &OwnerId) -> Result<Vec<Relation>, RepositoryError> {
        self.inner.list_relations(owner)
    }

    fn list_categories(&self, owner: &OwnerId) -> Result<Vec<Category>, RepositoryError> {
        self.inner.list_categories(owner)
    }

    fn create_note(&self, note: &NewNote) -> Result<Note, RepositoryError> {
        self.check_writes()?;
        self.inner.create_note(note)
    }

    fn update_note(
        &self,
        owner: &OwnerId,
        id: &NoteId,
        patch: &NotePatch,
    ) -> Result<Note, RepositoryError> {
        self.check_writes()?;
        self.inner.update_note(owner, id, patch)
    }

    fn delete_note(&self, owner: &OwnerId, id: &NoteId) -> Result<(), RepositoryError> {
        self.check_writes()?;
        self.inner.delete_note(owner, id)
    }

    fn replace_relations(
        &self,
        owner: &OwnerId,
        id: &NoteId,
        targets: &[NoteId],
    ) -> Result<Vec<NoteId>, RepositoryError> {
        self.check_writes()?;
        if self.fail_relations.load(Ordering::SeqCst) {
            return Err(RepositoryError::Unavailable("relations unavailable".into()));
        }
        self.inner.replace_relations(owner, id, targets)
    }

    fn create_category(&self, owner: &OwnerId, name: &str) -> Result<Category, RepositoryError> {
        self.check_writes()?;
        self.inner.create_category(owner, name)
    }

    fn rename_category(
        &self,
        owner: &OwnerId,
        id: &CategoryId,
        name: &str,
    ) -> Result<Category, RepositoryError> {
        self.check_writes()?;
        self.inner.rename_category(owner, id, name)
    }

    fn snapshot(&self, owner: &OwnerId) -> Result<Snapshot, RepositoryError> {
        let snapshot = Snapshot {
            notes: self.inner.list_notes(owner)?,
            relations: self.inner.list_relations(owner)?,
            categories: self.inner.list_categories(owner)?,
        };
        if let Some(delay) = self.first_snapshot_delay {
            if !self.first_done.swap(true, Ordering::SeqCst) {
                std::thread::sleep(delay);
            }
        }
        Ok(snapshot)
    }
}
