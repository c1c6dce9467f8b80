use anyhow::Result;

use memograph::config::MemographConfig;
use memograph::note::OwnerId;
use memograph::repository::NoteRepository;

/// Export the owner's notes, relations and categories as JSON to stdout.
pub fn export(config: &MemographConfig) -> Result<()> {
    let repo = super::open_repository(config)?;
    let owner = OwnerId::from(config.storage.owner.as_str());
    let snapshot = repo.snapshot(&owner)?;

    let json = serde_json::to_string_pretty(&snapshot)?;
    println!("{json}");

    eprintln!(
        "Exported {} notes, {} relation rows and {} categories.",
        snapshot.notes.len(),
        snapshot.relations.len(),
        snapshot.categories.len()
    );
    Ok(())
}
