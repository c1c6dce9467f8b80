use anyhow::Result;
use std::collections::BTreeMap;

use memograph::config::MemographConfig;

/// Display graph statistics in the terminal.
pub async fn stats(config: &MemographConfig) -> Result<()> {
    let engine = super::open_engine(config).await?;

    engine.with_session(|s| {
        let model = s.model();
        let notes = model.notes();
        let isolated = notes.iter().filter(|n| model.degree(&n.id) == 0).count();

        let mut by_category: BTreeMap<String, usize> = BTreeMap::new();
        let mut by_importance = [0usize; 5];
        for note in notes {
            let name = note.category_name.clone().unwrap_or_else(|| "(missing)".into());
            *by_category.entry(name).or_default() += 1;
            by_importance[usize::from(note.importance.get() - 1)] += 1;
        }

        println!("Graph Statistics");
        println!("{}", "=".repeat(40));
        println!("  Owner:               {}", model.owner());
        println!("  Notes:               {}", notes.len());
        println!("  Relations:           {}", model.edge_count());
        println!("  Isolated notes:      {isolated}");
        println!();

        println!("By Category:");
        for (name, count) in &by_category {
            println!("  {:<20} {}", name, count);
        }
        println!();

        println!("By Importance:");
        for (i, count) in by_importance.iter().enumerate() {
            println!("  {:<20} {}", i + 1, count);
        }

        if let Some(hub) = notes.iter().max_by_key(|n| model.degree(&n.id)) {
            let degree = model.degree(&hub.id);
            if degree > 0 {
                println!();
                println!("Most connected:        {} ({degree} relations)", hub.title);
            }
        }
    });

    Ok(())
}
