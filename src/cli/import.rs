use anyhow::{Context, Result};
use std::path::Path;

use memograph::config::MemographConfig;
use memograph::repository::Snapshot;

/// Import an export file. Existing note ids are skipped; relations are
/// recreated in both directions when both endpoints exist.
pub fn import(config: &MemographConfig, file: &Path) -> Result<()> {
    let json = std::fs::read_to_string(file)
        .with_context(|| format!("failed to read import file: {}", file.display()))?;
    let snapshot: Snapshot = serde_json::from_str(&json).context("failed to parse import JSON")?;

    println!(
        "Importing {} notes and {} relation rows...",
        snapshot.notes.len(),
        snapshot.relations.len()
    );

    let repo = super::open_repository(config)?;
    let report = repo.import_snapshot(&snapshot)?;

    println!(
        "Imported {} notes, {} relations and {} categories ({} skipped).",
        report.notes, report.relations, report.categories, report.skipped
    );
    Ok(())
}
