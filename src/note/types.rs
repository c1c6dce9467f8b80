//! Core note type definitions.
//!
//! Defines the opaque identifiers, [`Importance`], [`Note`] (a graph node),
//! [`Category`], and [`Relation`] (one directed storage record of a symmetric
//! relation).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

macro_rules! id_type {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            /// Fresh time-sortable identifier.
            pub fn generate() -> Self {
                Self(uuid::Uuid::now_v7().to_string())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(s: &str) -> Self {
                Self(s.to_string())
            }
        }

        impl From<String> for $name {
            fn from(s: String) -> Self {
                Self(s)
            }
        }
    };
}

id_type!(
    /// Stable identifier of a note for its whole lifetime.
    NoteId
);
id_type!(
    /// Identifier of a category.
    CategoryId
);
id_type!(
    /// The user whose notes form one isolated graph.
    OwnerId
);

/// Note importance on a 1–5 scale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "i64")]
pub struct Importance(u8);

impl Importance {
    pub const MIN: u8 = 1;
    pub const MAX: u8 = 5;

    pub fn get(self) -> u8 {
        self.0
    }

    /// Radius of the node circle in world units.
    pub fn display_radius(self) -> f64 {
        (f64::from(self.0) * 2.5).min(15.0)
    }
}

impl Default for Importance {
    fn default() -> Self {
        Self(Self::MIN)
    }
}

impl TryFrom<i64> for Importance {
    type Error = ValidationError;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        if (i64::from(Self::MIN)..=i64::from(Self::MAX)).contains(&value) {
            Ok(Self(value as u8))
        } else {
            Err(ValidationError::ImportanceOutOfRange(value))
        }
    }
}

impl From<Importance> for i64 {
    fn from(value: Importance) -> Self {
        i64::from(value.0)
    }
}

impl std::fmt::Display for Importance {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A note record with its category name joined in.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Note {
    pub id: NoteId,
    pub owner_id: OwnerId,
    pub category_id: CategoryId,
    /// Joined category name. `None` when the category no longer exists.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category_name: Option<String>,
    /// May be empty before a conversation has been summarized.
    #[serde(default)]
    pub title: String,
    pub content: String,
    #[serde(default)]
    pub importance: Importance,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Note {
    /// Title cut to `max_chars` characters with an ellipsis, as used for node labels.
    pub fn label(&self, max_chars: usize) -> String {
        if self.title.chars().count() > max_chars {
            let head: String = self.title.chars().take(max_chars).collect();
            format!("{head}...")
        } else {
            self.title.clone()
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub id: CategoryId,
    pub owner_id: OwnerId,
    pub name: String,
}

/// One directed record of a relation, as the store keeps it.
///
/// The store holds both `(a, b)` and `(b, a)`; the graph model folds them
/// into a single undirected edge.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Relation {
    pub source_id: NoteId,
    pub target_id: NoteId,
}

impl Relation {
    pub fn new(source_id: impl Into<NoteId>, target_id: impl Into<NoteId>) -> Self {
        Self {
            source_id: source_id.into(),
            target_id: target_id.into(),
        }
    }
}

/// A validated create request. The store assigns `id` and `created_at`.
#[derive(Debug, Clone)]
pub struct NewNote {
    pub owner_id: OwnerId,
    pub category_id: CategoryId,
    pub title: String,
    pub content: String,
    pub importance: Importance,
}

/// Partial update of a note's mutable fields.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NotePatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category_id: Option<CategoryId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub importance: Option<Importance>,
}

impl NotePatch {
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.content.is_none()
            && self.category_id.is_none()
            && self.importance.is_none()
    }

    /// Reject patches that would leave the note without content.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if let Some(content) = &self.content {
            if content.trim().is_empty() {
                return Err(ValidationError::EmptyContent);
            }
        }
        Ok(())
    }
}
