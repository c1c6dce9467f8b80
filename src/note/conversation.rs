//! Chat history trimming for conversation-to-note conversion.
//!
//! The summarizer itself is an external service; this module only decides
//! which part of the conversation it gets to see.

use serde::{Deserialize, Serialize};

/// Number of trailing messages handed to the summarizer.
pub const DEFAULT_TRANSCRIPT_MESSAGES: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChatRole {
    User,
    Assistant,
}

impl ChatRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Assistant => "assistant",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: ChatRole,
    pub content: String,
}

/// Render the last `limit` messages as `role: content` blocks separated by a
/// blank line. Returns an empty string for an empty history.
pub fn recent_transcript(messages: &[ChatMessage], limit: usize) -> String {
    let start = messages.len().saturating_sub(limit);
    messages[start..]
        .iter()
        .map(|m| format!("{}: {}", m.role.as_str(), m.content))
        .collect::<Vec<_>>()
        .join("\n\n")
}
