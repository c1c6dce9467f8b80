//! CLI `doctor` command: run database diagnostics and print a health report.

use anyhow::{Context, Result};

use memograph::config::MemographConfig;
use memograph::db;

pub fn doctor(config: &MemographConfig) -> Result<()> {
    let db_path = config.resolved_db_path();

    if !db_path.exists() {
        println!("Database: not found at {}", db_path.display());
        println!("Run `memograph category add <name>` to initialize.");
        return Ok(());
    }

    let file_size = std::fs::metadata(&db_path).map(|m| m.len()).unwrap_or(0);

    let conn = db::open_database(&db_path).context("failed to open database (may be corrupt)")?;
    let report = db::check_database_health(&conn).context("failed to run health check")?;

    println!("Memograph Health Report");
    println!("=======================");
    println!();
    println!("Database:          {}", db_path.display());
    println!("File size:         {}", format_bytes(file_size));
    println!("Schema version:    {}", report.schema_version);
    println!();
    println!("Row counts:");
    println!("  Notes:           {}", report.note_count);
    println!("  Categories:      {}", report.category_count);
    println!("  Relation rows:   {}", report.relation_rows);
    println!();
    if report.one_sided_relations > 0 {
        println!(
            "WARNING: {} relation row(s) lack their mirror; the graph will symmetrize them on load.",
            report.one_sided_relations
        );
    }
    if report.orphaned_notes > 0 {
        println!(
            "WARNING: {} note(s) reference a missing category.",
            report.orphaned_notes
        );
    }
    if report.integrity_ok {
        println!("Integrity check:   PASSED");
    } else {
        println!("Integrity check:   FAILED ({})", report.integrity_details);
        println!();
        println!("Recovery steps:");
        println!("  1. Restore from a backup: cp backup.db ~/.memograph/notes.db");
        println!("  2. Or export from a good copy and reimport:");
        println!("     memograph export > backup.json");
        println!("     memograph import backup.json");
    }

    Ok(())
}

fn format_bytes(bytes: u64) -> String {
    if bytes < 1024 {
        format!("{bytes} B")
    } else if bytes < 1024 * 1024 {
        format!("{:.1} KB", bytes as f64 / 1024.0)
    } else {
        format!("{:.1} MB", bytes as f64 / (1024.0 * 1024.0))
    }
}
