mod helpers;

use rusqlite::{params, Connection};

use helpers::{category, note, owner, seed, test_repo};
use memograph::db::{self, migrations};
use memograph::error::RepositoryError;
use memograph::graph::GraphModel;
use memograph::note::{Importance, NotePatch, OwnerId, Relation};
use memograph::repository::{NoteRepository, Snapshot, SqliteRepository};

#[test]
fn notes_and_relations_survive_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("data").join("notes.db");

    let ids = {
        let repo = SqliteRepository::open(&path).unwrap();
        let (_, ids) = seed(&repo, &["one", "two", "three"]);
        repo.replace_relations(&owner(), &ids[0], &ids[1..]).unwrap();
        ids
    };

    let repo = SqliteRepository::open(&path).unwrap();
    let snapshot = repo.snapshot(&owner()).unwrap();
    assert_eq!(snapshot.notes.len(), 3);
    assert_eq!(snapshot.relations.len(), 4);
    assert!(snapshot
        .notes
        .iter()
        .all(|n| n.category_name.as_deref() == Some("General")));

    let mut model = GraphModel::new(owner());
    let report = model.load(snapshot.notes, &snapshot.relations, snapshot.categories);
    assert!(report.rejected.is_empty());
    assert_eq!(model.edge_count(), 2);
    assert!(model.are_related(&ids[2], &ids[0]));
}

#[test]
fn notes_list_newest_first() {
    let repo = test_repo();
    let (_, ids) = seed(&repo, &["first", "second", "third"]);
    let listed: Vec<_> = repo
        .list_notes(&owner())
        .unwrap()
        .into_iter()
        .map(|n| n.id)
        .collect();
    let mut expected = ids.clone();
    expected.reverse();
    assert_eq!(listed, expected);
}

#[test]
fn owners_are_isolated() {
    let repo = test_repo();
    let (_, ids) = seed(&repo, &["mine"]);
    let other: OwnerId = "bob".into();

    assert!(repo.list_notes(&other).unwrap().is_empty());
    assert!(repo.list_categories(&other).unwrap().is_empty());
    assert!(matches!(
        repo.delete_note(&other, &ids[0]),
        Err(RepositoryError::NotFound { .. })
    ));
    assert_eq!(repo.list_notes(&owner()).unwrap().len(), 1);
}

#[test]
fn update_touches_only_patched_fields() {
    let repo = test_repo();
    let (_, ids) = seed(&repo, &["draft"]);
    let before = repo.list_notes(&owner()).unwrap().remove(0);

    let patch = NotePatch {
        importance: Some(Importance::try_from(4).unwrap()),
        ..NotePatch::default()
    };
    let after = repo.update_note(&owner(), &ids[0], &patch).unwrap();

    assert_eq!(after.title, before.title);
    assert_eq!(after.content, before.content);
    assert_eq!(after.importance.get(), 4);
    assert!(after.updated_at >= before.updated_at);
    assert_eq!(after.created_at, before.created_at);
}

#[test]
fn export_then_import_into_fresh_store() {
    let source = test_repo();
    let (_, ids) = seed(&source, &["a", "b", "c"]);
    source
        .replace_relations(&owner(), &ids[1], &[ids[0].clone(), ids[2].clone()])
        .unwrap();
    let snapshot = source.snapshot(&owner()).unwrap();
    let json = serde_json::to_string(&snapshot).unwrap();

    let target = test_repo();
    let report = target
        .import_snapshot(&serde_json::from_str(&json).unwrap())
        .unwrap();
    assert_eq!(report.categories, 1);
    assert_eq!(report.notes, 3);

    let imported = target.snapshot(&owner()).unwrap();
    assert_eq!(imported.notes.len(), 3);
    assert_eq!(imported.relations.len(), 4);

    let again = target.import_snapshot(&snapshot).unwrap();
    assert_eq!(again.notes, 0);
    assert_eq!(again.skipped, 3);
    assert_eq!(target.list_notes(&owner()).unwrap().len(), 3);
}

#[test]
fn import_drops_relations_between_owners() {
    let bob: OwnerId = "bob".into();
    let mut theirs = note("b", "Theirs", "bob's note", "bc");
    theirs.owner_id = bob.clone();
    let mut their_category = category("bc", "Bob's");
    their_category.owner_id = bob.clone();

    let snapshot = Snapshot {
        notes: vec![note("a", "Mine", "alice's note", "ac"), theirs],
        relations: vec![Relation::new("a", "b"), Relation::new("b", "a")],
        categories: vec![category("ac", "Alice's"), their_category],
    };
    let repo = test_repo();
    let report = repo.import_snapshot(&snapshot).unwrap();

    assert_eq!(report.notes, 2);
    assert_eq!(report.relations, 0);
    assert_eq!(report.skipped, 2);
    assert!(repo.list_relations(&owner()).unwrap().is_empty());
    assert!(repo.list_relations(&bob).unwrap().is_empty());
}

#[test]
fn import_skips_an_id_held_by_another_owner() {
    let repo = test_repo();
    let mut theirs = note("shared", "Theirs", "bob's note", "bc");
    theirs.owner_id = "bob".into();
    repo.import_snapshot(&Snapshot {
        notes: vec![theirs],
        relations: Vec::new(),
        categories: Vec::new(),
    })
    .unwrap();

    let report = repo
        .import_snapshot(&Snapshot {
            notes: vec![note("shared", "Mine", "alice's note", "ac")],
            relations: Vec::new(),
            categories: Vec::new(),
        })
        .unwrap();
    assert_eq!(report.notes, 0);
    assert_eq!(report.skipped, 1);
    assert!(repo.list_notes(&owner()).unwrap().is_empty());
}

#[test]
fn legacy_database_gets_mirror_rows_on_open() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("legacy.db");

    {
        let conn = Connection::open(&path).unwrap();
        db::schema::init_schema(&conn).unwrap();
        let now = "2024-01-01T00:00:00+00:00";
        conn.execute(
            "INSERT INTO categories (id, owner_id, name, created_at) VALUES ('c', ?1, 'Old', ?2)",
            params![helpers::OWNER, now],
        )
        .unwrap();
        for id in ["x", "y", "z"] {
            conn.execute(
                "INSERT INTO notes (id, owner_id, category_id, title, content, importance, created_at, updated_at) \
                 VALUES (?1, ?2, 'c', ?1, 'legacy body', 1, ?3, ?3)",
                params![id, helpers::OWNER, now],
            )
            .unwrap();
        }
        conn.execute(
            "INSERT INTO note_relations (source_id, target_id, created_at) VALUES ('x', 'y', ?1), ('y', 'z', ?1), ('z', 'y', ?1)",
            params![now],
        )
        .unwrap();
        assert_eq!(migrations::get_schema_version(&conn).unwrap(), 1);
    }

    let conn = db::open_database(&path).unwrap();
    let health = db::check_database_health(&conn).unwrap();
    assert_eq!(health.schema_version, migrations::CURRENT_SCHEMA_VERSION);
    assert_eq!(health.relation_rows, 4);
    assert_eq!(health.one_sided_relations, 0);
    assert!(health.integrity_ok);
    drop(conn);

    let repo = SqliteRepository::open(&path).unwrap();
    let relations = repo.list_relations(&owner()).unwrap();
    assert!(relations
        .iter()
        .any(|r| r.source_id.as_str() == "y" && r.target_id.as_str() == "x"));
}
