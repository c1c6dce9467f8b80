//! CLI `add` command: save a note from text or from a chat log.

use anyhow::{bail, Context, Result};
use clap::Args;
use std::path::PathBuf;

use memograph::config::MemographConfig;
use memograph::note::conversation::{recent_transcript, ChatMessage, DEFAULT_TRANSCRIPT_MESSAGES};
use memograph::note::{Importance, NoteDraft};

#[derive(Args)]
pub struct AddArgs {
    /// Note body. Omit when using --chat.
    content: Option<String>,
    #[arg(long)]
    title: String,
    /// Category id or name
    #[arg(long)]
    category: String,
    /// 1 to 5
    #[arg(long, default_value_t = 1)]
    importance: i64,
    /// Ids of notes to relate to
    #[arg(long = "related", num_args = 1..)]
    related: Vec<String>,
    /// JSON array of `{role, content}` messages; the recent tail becomes the body
    #[arg(long, conflicts_with = "content")]
    chat: Option<PathBuf>,
}

pub async fn add(config: &MemographConfig, args: AddArgs) -> Result<()> {
    let content = match (&args.content, &args.chat) {
        (Some(content), _) => content.clone(),
        (None, Some(path)) => {
            let json = std::fs::read_to_string(path)
                .with_context(|| format!("failed to read chat log: {}", path.display()))?;
            let messages: Vec<ChatMessage> =
                serde_json::from_str(&json).context("failed to parse chat log JSON")?;
            recent_transcript(&messages, DEFAULT_TRANSCRIPT_MESSAGES)
        }
        (None, None) => bail!("provide note content or --chat <file>"),
    };

    let engine = super::open_engine(config).await?;
    let category_id = super::resolve_category(&engine, &args.category)?;

    let draft = NoteDraft {
        title: args.title,
        content,
        category_id: Some(category_id),
        importance: Importance::try_from(args.importance)?,
        related: args.related.into_iter().map(Into::into).collect(),
    };

    let (note, update) = engine.save_note(draft).await?;
    println!("{}", note.id);
    for rejected in &update.rejected {
        eprintln!("skipped relation: {rejected}");
    }
    eprintln!(
        "Saved {:?} with {} relation(s).",
        note.title,
        update.related.len()
    );
    Ok(())
}
