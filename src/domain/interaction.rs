use std::fmt;

use serde::{Deserialize, Serialize};

/// Identity of the signed-in user.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ActorId(String);

impl ActorId {
    /// Returns `None` for blank identifiers.
    pub fn new(id: impl Into<String>) -> Option<Self> {
        let id = id.into();
        let trimmed = id.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(Self(trimmed.to_string()))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ActorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Aggregate counters denormalised onto a note.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CounterField {
    Likes,
    Downloads,
    Bookmarks,
}

impl CounterField {
    pub fn column(self) -> &'static str {
        match self {
            CounterField::Likes => "likes",
            CounterField::Downloads => "downloads",
            CounterField::Bookmarks => "bookmarks",
        }
    }
}

/// Per-user membership relations that carry an aggregate counter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum InteractionKind {
    Like,
    Bookmark,
}

impl InteractionKind {
    pub fn table(self) -> &'static str {
        match self {
            InteractionKind::Like => "notes_likes",
            InteractionKind::Bookmark => "notes_bookmarks",
        }
    }

    pub fn counter(self) -> CounterField {
        match self {
            InteractionKind::Like => CounterField::Likes,
            InteractionKind::Bookmark => CounterField::Bookmarks,
        }
    }

    pub fn sign_in_message(self) -> &'static str {
        match self {
            InteractionKind::Like => "Please sign in to like notes.",
            InteractionKind::Bookmark => "Please sign in to bookmark notes.",
        }
    }

    pub fn failure_message(self) -> &'static str {
        match self {
            InteractionKind::Like => "Failed to update like.",
            InteractionKind::Bookmark => "Failed to update bookmark.",
        }
    }

    pub fn hydration_message(self) -> &'static str {
        match self {
            InteractionKind::Like => "Failed to check like status.",
            InteractionKind::Bookmark => "Failed to check bookmark status.",
        }
    }

    /// Label for the control given its current state
    pub fn label(self, active: bool) -> &'static str {
        match (self, active) {
            (InteractionKind::Like, false) => "Like",
            (InteractionKind::Like, true) => "Unlike",
            (InteractionKind::Bookmark, false) => "Bookmark",
            (InteractionKind::Bookmark, true) => "Remove bookmark",
        }
    }
}

impl fmt::Display for InteractionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InteractionKind::Like => write!(f, "like"),
            InteractionKind::Bookmark => write!(f, "bookmark"),
        }
    }
}
