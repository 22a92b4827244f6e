use std::path::PathBuf;

use thiserror::Error;

use crate::{
    session::{FailureKind, Phase},
    types::CaptionId,
};

#[derive(Error, Debug)]
pub enum ReelsubError {
    #[error("Failed to read media file {path}: {reason}")]
    MediaReadFailed { path: PathBuf, reason: String },

    #[error("Unsupported media file {path}: not a recognized video container")]
    UnsupportedMedia { path: PathBuf },

    #[error("Transcription failed: {reason}")]
    TranscriptionFailed { reason: String },

    #[error("No caption with id {id}")]
    UnknownCaption { id: CaptionId },

    #[error("Cannot {action} while session is {phase}")]
    IllegalTransition { action: &'static str, phase: Phase },

    #[error("Clipboard copy failed: {reason}")]
    ClipboardFailed { reason: String },

    #[error("Missing API key: {env_var} environment variable is not set")]
    MissingApiKey { env_var: &'static str },

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("JSON parse error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("API request failed: {0}")]
    ApiError(#[from] reqwest::Error),
}

impl ReelsubError {
    /// Collapse any error onto the session's flat two-kind failure taxonomy.
    pub fn failure_kind(&self) -> FailureKind {
        match self {
            ReelsubError::MediaReadFailed { .. }
            | ReelsubError::UnsupportedMedia { .. }
            | ReelsubError::IoError(_) => FailureKind::MediaRead,
            _ => FailureKind::Transcription,
        }
    }
}

pub type Result<T> = std::result::Result<T, ReelsubError>;
