use anyhow::Result;

use memograph::config::MemographConfig;

const SNIPPET_CHARS: usize = 80;

/// Print notes whose title, content or category name contains `query`.
pub async fn search(config: &MemographConfig, query: &str) -> Result<()> {
    let engine = super::open_engine(config).await?;
    let results = engine.with_session(|s| s.set_search_query(query));

    if results.is_empty() {
        println!("No results found.");
        return Ok(());
    }

    println!("Found {} note(s)\n", results.len());
    for (i, note) in results.iter().enumerate() {
        let snippet: String = note.content.chars().take(SNIPPET_CHARS).collect();
        println!(
            "{}. {} [{}] (importance {})",
            i + 1,
            note.title,
            note.category_name.as_deref().unwrap_or("-"),
            note.importance
        );
        println!("   {}", snippet.replace('\n', " "));
        println!("   id: {}", note.id);
    }
    Ok(())
}
