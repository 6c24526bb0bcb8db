use std::fmt;

use thiserror::Error;

/// Which half of a toggle's remote write failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteStage {
    Membership,
    Counter,
}

impl fmt::Display for WriteStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WriteStage::Membership => write!(f, "membership"),
            WriteStage::Counter => write!(f, "counter"),
        }
    }
}

#[derive(Error, Debug)]
pub enum NotehubError {
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("{0}")]
    NotAuthenticated(String),

    #[error("{0}")]
    Validation(String),

    #[error("Failed to update {stage}: {message}")]
    RemoteWrite { stage: WriteStage, message: String },

    #[error("{0}")]
    Hydration(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Note not found: {0}")]
    NoteNotFound(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("{0}")]
    Other(String),
}

impl NotehubError {
    /// Collapse a collaborator failure into a remote-write error for `stage`.
    pub fn remote_write(stage: WriteStage, err: NotehubError) -> Self {
        match err {
            already @ NotehubError::RemoteWrite { .. } => already,
            other => NotehubError::RemoteWrite {
                stage,
                message: other.to_string(),
            },
        }
    }

    /// True when the membership write went through but the counter did not.
    pub fn is_partial_write(&self) -> bool {
        matches!(
            self,
            NotehubError::RemoteWrite {
                stage: WriteStage::Counter,
                ..
            }
        )
    }
}

pub type Result<T> = std::result::Result<T, NotehubError>;
