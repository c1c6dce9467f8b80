use anyhow::Result;

use memograph::config::MemographConfig;
use memograph::note::NoteId;

/// Replace every relation of `id` with relations to `targets`.
pub async fn relate(config: &MemographConfig, id: &str, targets: Vec<String>) -> Result<()> {
    let engine = super::open_engine(config).await?;
    let id = super::resolve_note(&engine, id)?;
    let targets: Vec<NoteId> = targets.into_iter().map(Into::into).collect();

    let update = engine.replace_relations(&id, targets).await?;
    for rejected in &update.rejected {
        eprintln!("skipped: {rejected}");
    }
    println!("{} now relates to {} note(s)", id, update.related.len());
    Ok(())
}

pub async fn neighbors(config: &MemographConfig, id: &str) -> Result<()> {
    let engine = super::open_engine(config).await?;
    let id = super::resolve_note(&engine, id)?;
    let rows = engine.with_session(|s| {
        s.model()
            .neighbors_of(&id)
            .iter()
            .filter_map(|n| s.model().note(n))
            .map(|n| (n.id.clone(), n.title.clone()))
            .collect::<Vec<_>>()
    });

    if rows.is_empty() {
        println!("No related notes.");
    }
    for (id, title) in rows {
        println!("{id}  {title}");
    }
    Ok(())
}
