pub mod add;
pub mod category;
pub mod doctor;
pub mod export;
pub mod import;
pub mod layout;
pub mod relate;
pub mod search;
pub mod stats;

use anyhow::{bail, Context, Result};
use std::sync::Arc;

use memograph::config::MemographConfig;
use memograph::engine::GraphEngine;
use memograph::note::{CategoryId, NoteId};
use memograph::repository::SqliteRepository;
use memograph::session::GraphSession;

pub fn open_repository(config: &MemographConfig) -> Result<SqliteRepository> {
    let db_path = config.resolved_db_path();
    SqliteRepository::open(&db_path)
        .with_context(|| format!("failed to open database at {}", db_path.display()))
}

/// Open the store and load the configured owner's graph.
pub async fn open_engine(config: &MemographConfig) -> Result<GraphEngine<SqliteRepository>> {
    let repo = Arc::new(open_repository(config)?);
    let session = GraphSession::new(config.storage.owner.as_str().into(), config);
    let engine = GraphEngine::new(repo, session);
    let report = engine
        .reload()
        .await?
        .context("initial load was superseded")?;
    tracing::debug!(notes = report.notes, edges = report.edges, "graph ready");
    Ok(engine)
}

/// Match a category by id, or by name ignoring case.
pub fn resolve_category(
    engine: &GraphEngine<SqliteRepository>,
    wanted: &str,
) -> Result<CategoryId> {
    let found = engine.with_session(|s| {
        s.model()
            .categories()
            .find(|c| c.id.as_str() == wanted || c.name.eq_ignore_ascii_case(wanted))
            .map(|c| c.id.clone())
    });
    match found {
        Some(id) => Ok(id),
        None => bail!("no category named {wanted:?}; create it with `memograph category add`"),
    }
}

/// Check that a note id exists in the loaded graph.
pub fn resolve_note(engine: &GraphEngine<SqliteRepository>, id: &str) -> Result<NoteId> {
    let id = NoteId::from(id);
    if engine.with_session(|s| s.model().contains(&id)) {
        Ok(id)
    } else {
        bail!("note not found: {id}")
    }
}
