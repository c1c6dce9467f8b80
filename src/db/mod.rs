pub mod migrations;
pub mod schema;

use anyhow::{Context, Result};
use rusqlite::Connection;
use serde::Serialize;
use std::path::Path;

/// Open (or create) the memograph database at the given path with the schema
/// initialized and migrations applied.
pub fn open_database(path: impl AsRef<Path>) -> Result<Connection> {
    let path = path.as_ref();

    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create directory {}", parent.display()))?;
    }

    let mut conn = Connection::open(path)
        .with_context(|| format!("failed to open database at {}", path.display()))?;

    conn.pragma_update(None, "journal_mode", "WAL")?;
    conn.pragma_update(None, "foreign_keys", "ON")?;
    conn.pragma_update(None, "busy_timeout", 5000)?;

    schema::init_schema(&conn).context("failed to initialize schema")?;
    migrations::run_migrations(&mut conn).context("failed to run migrations")?;

    tracing::info!(path = %path.display(), "database initialized");
    Ok(conn)
}

/// Open a migrated in-memory database. Used by tests.
pub fn open_memory_database() -> Result<Connection> {
    let mut conn = Connection::open_in_memory().context("failed to open in-memory database")?;
    conn.pragma_update(None, "foreign_keys", "ON")?;
    schema::init_schema(&conn).context("failed to initialize schema")?;
    migrations::run_migrations(&mut conn).context("failed to run migrations")?;
    Ok(conn)
}

/// Snapshot of database health for `doctor`.
#[derive(Debug, Serialize)]
pub struct HealthReport {
    pub schema_version: u32,
    pub note_count: i64,
    pub category_count: i64,
    /// Directed rows; each logical relation contributes two.
    pub relation_rows: i64,
    /// Rows without their mirror.
    pub one_sided_relations: i64,
    /// Notes whose category row is missing.
    pub orphaned_notes: i64,
    pub integrity_ok: bool,
    pub integrity_details: String,
}

pub fn check_database_health(conn: &Connection) -> Result<HealthReport> {
    let count = |sql: &str| -> Result<i64> {
        conn.query_row(sql, [], |row| row.get(0))
            .with_context(|| format!("health query failed: {sql}"))
    };

    let integrity_details: String = conn
        .query_row("PRAGMA integrity_check", [], |row| row.get(0))
        .context("integrity_check failed")?;

    Ok(HealthReport {
        schema_version: migrations::get_schema_version(conn)?,
        note_count: count("SELECT COUNT(*) FROM notes")?,
        category_count: count("SELECT COUNT(*) FROM categories")?,
        relation_rows: count("SELECT COUNT(*) FROM note_relations")?,
        one_sided_relations: count(
            "SELECT COUNT(*) FROM note_relations r WHERE NOT EXISTS ( \
             SELECT 1 FROM note_relations m \
             WHERE m.source_id = r.target_id AND m.target_id = r.source_id)",
        )?,
        orphaned_notes: count(
            "SELECT COUNT(*) FROM notes n \
             WHERE NOT EXISTS (SELECT 1 FROM categories c WHERE c.id = n.category_id)",
        )?,
        integrity_ok: integrity_details == "ok",
        integrity_details,
    })
}
