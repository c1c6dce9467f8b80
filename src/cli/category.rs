use anyhow::Result;
use std::collections::HashMap;

use memograph::config::MemographConfig;

pub async fn add(config: &MemographConfig, name: &str) -> Result<()> {
    let engine = super::open_engine(config).await?;
    let category = engine.create_category(name).await?;
    println!("{}", category.id);
    Ok(())
}

/// List categories with the number of notes in each.
pub async fn list(config: &MemographConfig) -> Result<()> {
    let engine = super::open_engine(config).await?;
    let rows = engine.with_session(|s| {
        let mut counts: HashMap<_, usize> = HashMap::new();
        for note in s.model().notes() {
            *counts.entry(note.category_id.clone()).or_default() += 1;
        }
        s.model()
            .categories()
            .map(|c| (c.id.clone(), c.name.clone(), counts.get(&c.id).copied().unwrap_or(0)))
            .collect::<Vec<_>>()
    });

    if rows.is_empty() {
        println!("No categories.");
        return Ok(());
    }
    for (id, name, count) in rows {
        println!("{:<24} {:>5}  {}", name, count, id);
    }
    Ok(())
}
