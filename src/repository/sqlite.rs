//! [`NoteRepository`] over a single SQLite connection.

use chrono::{DateTime, Utc};
use rusqlite::types::Type;
use rusqlite::{params, Connection, OptionalExtension, Row};
use serde::Serialize;
use std::collections::BTreeSet;
use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use super::{NoteRepository, Snapshot};
use crate::error::{RepositoryError, ValidationError};
use crate::note::{
    Category, CategoryId, Importance, NewNote, Note, NoteId, NotePatch, OwnerId, Relation,
};

const NOTE_COLUMNS: &str = "n.id, n.owner_id, n.category_id, c.name, n.title, n.content, \
     n.importance, n.created_at, n.updated_at";

/// Counts from [`SqliteRepository::import_snapshot`].
#[derive(Debug, Default, Serialize)]
pub struct ImportReport {
    pub categories: usize,
    pub notes: usize,
    pub relations: usize,
    pub skipped: usize,
}

pub struct SqliteRepository {
    conn: Mutex<Connection>,
}

impl SqliteRepository {
    pub fn new(conn: Connection) -> Self {
        Self {
            conn: Mutex::new(conn),
        }
    }

    pub fn open(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        Ok(Self::new(crate::db::open_database(path)?))
    }

    pub fn in_memory() -> anyhow::Result<Self> {
        Ok(Self::new(crate::db::open_memory_database()?))
    }

    fn conn(&self) -> Result<MutexGuard<'_, Connection>, RepositoryError> {
        self.conn
            .lock()
            .map_err(|_| RepositoryError::Unavailable("connection lock poisoned".into()))
    }

    fn get_note(conn: &Connection, owner: &OwnerId, id: &NoteId) -> Result<Note, RepositoryError> {
        conn.query_row(
            &format!(
                "SELECT {NOTE_COLUMNS} FROM notes n \
                 LEFT JOIN categories c ON c.id = n.category_id \
                 WHERE n.id = ?1 AND n.owner_id = ?2"
            ),
            params![id.as_str(), owner.as_str()],
            note_from_row,
        )
        .optional()?
        .ok_or_else(|| not_found("note", id))
    }

    fn note_exists(conn: &Connection, owner: &OwnerId, id: &NoteId) -> rusqlite::Result<bool> {
        conn.query_row(
            "SELECT COUNT(*) > 0 FROM notes WHERE id = ?1 AND owner_id = ?2",
            params![id.as_str(), owner.as_str()],
            |row| row.get(0),
        )
    }

    fn check_category(
        conn: &Connection,
        owner: &OwnerId,
        id: &CategoryId,
    ) -> Result<(), RepositoryError> {
        let exists: bool = conn.query_row(
            "SELECT COUNT(*) > 0 FROM categories WHERE id = ?1 AND owner_id = ?2",
            params![id.as_str(), owner.as_str()],
            |row| row.get(0),
        )?;
        if exists {
            Ok(())
        } else {
            Err(ValidationError::UnknownCategory(id.clone()).into())
        }
    }

    /// Load an exported snapshot, keeping ids. Notes whose id already exists
    /// under any owner are skipped; relations are written in both directions
    /// when both endpoints exist and belong to the same owner.
    pub fn import_snapshot(&self, snapshot: &Snapshot) -> Result<ImportReport, RepositoryError> {
        let mut conn = self.conn()?;
        let tx = conn.transaction()?;
        let mut report = ImportReport::default();

        for category in &snapshot.categories {
            report.categories += tx.execute(
                "INSERT OR IGNORE INTO categories (id, owner_id, name, created_at) \
                 VALUES (?1, ?2, ?3, ?4)",
                params![
                    category.id.as_str(),
                    category.owner_id.as_str(),
                    category.name,
                    Utc::now().to_rfc3339()
                ],
            )?;
        }

        for note in &snapshot.notes {
            let taken: bool = tx.query_row(
                "SELECT COUNT(*) > 0 FROM notes WHERE id = ?1",
                params![note.id.as_str()],
                |row| row.get(0),
            )?;
            if note.content.trim().is_empty() || taken {
                report.skipped += 1;
                continue;
            }
            tx.execute(
                "INSERT INTO notes (id, owner_id, category_id, title, content, importance, created_at, updated_at) \
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
                params![
                    note.id.as_str(),
                    note.owner_id.as_str(),
                    note.category_id.as_str(),
                    note.title,
                    note.content,
                    i64::from(note.importance),
                    note.created_at.to_rfc3339(),
                    note.updated_at.to_rfc3339(),
                ],
            )?;
            report.notes += 1;
        }

        let now = Utc::now().to_rfc3339();
        for relation in &snapshot.relations {
            let (endpoints, owners): (i64, i64) = tx.query_row(
                "SELECT COUNT(*), COUNT(DISTINCT owner_id) FROM notes WHERE id IN (?1, ?2)",
                params![relation.source_id.as_str(), relation.target_id.as_str()],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )?;
            if relation.source_id == relation.target_id || endpoints < 2 || owners != 1 {
                tracing::warn!(
                    source = %relation.source_id,
                    target = %relation.target_id,
                    "skipping imported relation"
                );
                report.skipped += 1;
                continue;
            }
            report.relations += insert_pair(&tx, &relation.source_id, &relation.target_id, &now)?;
        }

        tx.commit()?;
        tracing::info!(
            notes = report.notes,
            relations = report.relations,
            skipped = report.skipped,
            "snapshot imported"
        );
        Ok(report)
    }
}

impl NoteRepository for SqliteRepository {
    fn list_notes(&self, owner: &OwnerId) -> Result<Vec<Note>, RepositoryError> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {NOTE_COLUMNS} FROM notes n \
             LEFT JOIN categories c ON c.id = n.category_id \
             WHERE n.owner_id = ?1 ORDER BY n.created_at DESC, n.id DESC"
        ))?;
        let notes = stmt
            .query_map(params![owner.as_str()], note_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(notes)
    }

    fn list_relations(&self, owner: &OwnerId) -> Result<Vec<Relation>, RepositoryError> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            "SELECT r.source_id, r.target_id FROM note_relations r \
             JOIN notes n ON n.id = r.source_id \
             WHERE n.owner_id = ?1 ORDER BY r.source_id, r.target_id",
        )?;
        let relations = stmt
            .query_map(params![owner.as_str()], |row| {
                Ok(Relation::new(row.get::<_, String>(0)?, row.get::<_, String>(1)?))
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(relations)
    }

    fn list_categories(&self, owner: &OwnerId) -> Result<Vec<Category>, RepositoryError> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            "SELECT id, owner_id, name FROM categories WHERE owner_id = ?1 ORDER BY name, id",
        )?;
        let categories = stmt
            .query_map(params![owner.as_str()], category_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(categories)
    }

    fn create_note(&self, note: &NewNote) -> Result<Note, RepositoryError> {
        if note.content.trim().is_empty() {
            return Err(ValidationError::EmptyContent.into());
        }
        let conn = self.conn()?;
        Self::check_category(&conn, &note.owner_id, &note.category_id)?;

        let id = NoteId::generate();
        let now = Utc::now().to_rfc3339();
        conn.execute(
            "INSERT INTO notes (id, owner_id, category_id, title, content, importance, created_at, updated_at) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?7)",
            params![
                id.as_str(),
                note.owner_id.as_str(),
                note.category_id.as_str(),
                note.title,
                note.content,
                i64::from(note.importance),
                now,
            ],
        )?;
        tracing::debug!(id = %id, "note created");
        Self::get_note(&conn, &note.owner_id, &id)
    }

    fn update_note(
        &self,
        owner: &OwnerId,
        id: &NoteId,
        patch: &NotePatch,
    ) -> Result<Note, RepositoryError> {
        patch.validate()?;
        let conn = self.conn()?;
        if let Some(category_id) = &patch.category_id {
            Self::check_category(&conn, owner, category_id)?;
        }

        let changed = conn.execute(
            "UPDATE notes SET title = COALESCE(?1, title), content = COALESCE(?2, content), \
             category_id = COALESCE(?3, category_id), importance = COALESCE(?4, importance), \
             updated_at = ?5 WHERE id = ?6 AND owner_id = ?7",
            params![
                patch.title,
                patch.content,
                patch.category_id.as_ref().map(CategoryId::as_str),
                patch.importance.map(i64::from),
                Utc::now().to_rfc3339(),
                id.as_str(),
                owner.as_str(),
            ],
        )?;
        if changed == 0 {
            return Err(not_found("note", id));
        }
        Self::get_note(&conn, owner, id)
    }

    fn delete_note(&self, owner: &OwnerId, id: &NoteId) -> Result<(), RepositoryError> {
        let conn = self.conn()?;
        let deleted = conn.execute(
            "DELETE FROM notes WHERE id = ?1 AND owner_id = ?2",
            params![id.as_str(), owner.as_str()],
        )?;
        if deleted == 0 {
            return Err(not_found("note", id));
        }
        tracing::debug!(id = %id, "note deleted");
        Ok(())
    }

    fn replace_relations(
        &self,
        owner: &OwnerId,
        id: &NoteId,
        targets: &[NoteId],
    ) -> Result<Vec<NoteId>, RepositoryError> {
        let mut conn = self.conn()?;
        let tx = conn.transaction()?;
        if !Self::note_exists(&tx, owner, id)? {
            return Err(not_found("note", id));
        }

        tx.execute(
            "DELETE FROM note_relations WHERE source_id = ?1 OR target_id = ?1",
            params![id.as_str()],
        )?;

        let now = Utc::now().to_rfc3339();
        let mut accepted = Vec::new();
        let unique: BTreeSet<&NoteId> = targets.iter().collect();
        for target in unique {
            if target == id || !Self::note_exists(&tx, owner, target)? {
                tracing::warn!(source = %id, target = %target, "skipping invalid relation target");
                continue;
            }
            insert_pair(&tx, id, target, &now)?;
            accepted.push(target.clone());
        }

        tx.commit()?;
        Ok(accepted)
    }

    fn create_category(&self, owner: &OwnerId, name: &str) -> Result<Category, RepositoryError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(ValidationError::EmptyCategoryName.into());
        }
        let conn = self.conn()?;
        let id = CategoryId::generate();
        conn.execute(
            "INSERT INTO categories (id, owner_id, name, created_at) VALUES (?1, ?2, ?3, ?4)",
            params![id.as_str(), owner.as_str(), name, Utc::now().to_rfc3339()],
        )?;
        Ok(Category {
            id,
            owner_id: owner.clone(),
            name: name.to_string(),
        })
    }

    fn rename_category(
        &self,
        owner: &OwnerId,
        id: &CategoryId,
        name: &str,
    ) -> Result<Category, RepositoryError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(ValidationError::EmptyCategoryName.into());
        }
        let conn = self.conn()?;
        let changed = conn.execute(
            "UPDATE categories SET name = ?1 WHERE id = ?2 AND owner_id = ?3",
            params![name, id.as_str(), owner.as_str()],
        )?;
        if changed == 0 {
            return Err(not_found("category", id));
        }
        Ok(Category {
            id: id.clone(),
            owner_id: owner.clone(),
            name: name.to_string(),
        })
    }
}

/// Write both directions of a relation. Returns 1 if the pair is new.
fn insert_pair(
    conn: &Connection,
    a: &NoteId,
    b: &NoteId,
    now: &str,
) -> rusqlite::Result<usize> {
    let forward = conn.execute(
        "INSERT OR IGNORE INTO note_relations (source_id, target_id, created_at) VALUES (?1, ?2, ?3)",
        params![a.as_str(), b.as_str(), now],
    )?;
    let reverse = conn.execute(
        "INSERT OR IGNORE INTO note_relations (source_id, target_id, created_at) VALUES (?1, ?2, ?3)",
        params![b.as_str(), a.as_str(), now],
    )?;
    Ok(usize::from(forward + reverse > 0))
}

fn not_found(kind: &'static str, id: &impl ToString) -> RepositoryError {
    RepositoryError::NotFound {
        kind,
        id: id.to_string(),
    }
}

fn conversion_error(
    idx: usize,
    err: impl std::error::Error + Send + Sync + 'static,
) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(err))
}

fn timestamp(row: &Row<'_>, idx: usize) -> rusqlite::Result<DateTime<Utc>> {
    let raw: String = row.get(idx)?;
    DateTime::parse_from_rfc3339(&raw)
        .map(|t| t.with_timezone(&Utc))
        .map_err(|e| conversion_error(idx, e))
}

fn note_from_row(row: &Row<'_>) -> rusqlite::Result<Note> {
    let importance: i64 = row.get(6)?;
    Ok(Note {
        id: row.get::<_, String>(0)?.into(),
        owner_id: row.get::<_, String>(1)?.into(),
        category_id: row.get::<_, String>(2)?.into(),
        category_name: row.get(3)?,
        title: row.get(4)?,
        content: row.get(5)?,
        importance: Importance::try_from(importance).map_err(|e| conversion_error(6, e))?,
        created_at: timestamp(row, 7)?,
        updated_at: timestamp(row, 8)?,
    })
}

fn category_from_row(row: &Row<'_>) -> rusqlite::Result<Category> {
    Ok(Category {
        id: row.get::<_, String>(0)?.into(),
        owner_id: row.get::<_, String>(1)?.into(),
        name: row.get(2)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn repo_with_category() -> (SqliteRepository, OwnerId, Category) {
        let repo = SqliteRepository::in_memory().unwrap();
        let owner = OwnerId::from("alice");
        let category = repo.create_category(&owner, "Fruit").unwrap();
        (repo, owner, category)
    }

    fn new_note(owner: &OwnerId, category: &Category, title: &str) -> NewNote {
        NewNote {
            owner_id: owner.clone(),
            category_id: category.id.clone(),
            title: title.into(),
            content: format!("{title} body"),
            importance: Importance::default(),
        }
    }

    #[test]
    fn create_joins_category_name() {
        let (repo, owner, category) = repo_with_category();
        let note = repo.create_note(&new_note(&owner, &category, "Alpha")).unwrap();
        assert_eq!(note.category_name.as_deref(), Some("Fruit"));
        assert_eq!(repo.list_notes(&owner).unwrap(), vec![note]);
    }

    #[test]
    fn create_rejects_unknown_category() {
        let (repo, owner, category) = repo_with_category();
        let mut note = new_note(&owner, &category, "Alpha");
        note.category_id = "nope".into();
        assert!(matches!(
            repo.create_note(&note),
            Err(RepositoryError::Invalid(ValidationError::UnknownCategory(_)))
        ));
    }

    #[test]
    fn replace_relations_writes_both_directions() {
        let (repo, owner, category) = repo_with_category();
        let a = repo.create_note(&new_note(&owner, &category, "A")).unwrap();
        let b = repo.create_note(&new_note(&owner, &category, "B")).unwrap();
        let c = repo.create_note(&new_note(&owner, &category, "C")).unwrap();

        let accepted = repo
            .replace_relations(&owner, &a.id, &[b.id.clone(), a.id.clone(), "ghost".into()])
            .unwrap();
        assert_eq!(accepted, vec![b.id.clone()]);
        assert_eq!(repo.list_relations(&owner).unwrap().len(), 2);

        repo.replace_relations(&owner, &a.id, &[c.id.clone()]).unwrap();
        let relations = repo.list_relations(&owner).unwrap();
        assert_eq!(relations.len(), 2);
        assert!(relations.contains(&Relation::new(c.id.clone(), a.id.clone())));
        assert!(!relations.iter().any(|r| r.source_id == b.id || r.target_id == b.id));
    }

    #[test]
    fn delete_cascades_relations() {
        let (repo, owner, category) = repo_with_category();
        let a = repo.create_note(&new_note(&owner, &category, "A")).unwrap();
        let b = repo.create_note(&new_note(&owner, &category, "B")).unwrap();
        repo.replace_relations(&owner, &a.id, &[b.id.clone()]).unwrap();

        repo.delete_note(&owner, &b.id).unwrap();
        assert!(repo.list_relations(&owner).unwrap().is_empty());
        assert!(matches!(
            repo.delete_note(&owner, &b.id),
            Err(RepositoryError::NotFound { kind: "note", .. })
        ));
    }

    #[test]
    fn update_is_owner_scoped() {
        let (repo, owner, category) = repo_with_category();
        let a = repo.create_note(&new_note(&owner, &category, "A")).unwrap();
        let patch = NotePatch {
            title: Some("Renamed".into()),
            ..Default::default()
        };
        assert!(repo.update_note(&"mallory".into(), &a.id, &patch).is_err());

        let updated = repo.update_note(&owner, &a.id, &patch).unwrap();
        assert_eq!(updated.title, "Renamed");
        assert_eq!(updated.content, a.content);
    }

    #[test]
    fn rename_category_shows_in_notes() {
        let (repo, owner, category) = repo_with_category();
        repo.create_note(&new_note(&owner, &category, "A")).unwrap();
        repo.rename_category(&owner, &category.id, "  Produce ").unwrap();
        let notes = repo.list_notes(&owner).unwrap();
        assert_eq!(notes[0].category_name.as_deref(), Some("Produce"));
        assert!(repo.create_category(&owner, "   ").is_err());
    }
}
