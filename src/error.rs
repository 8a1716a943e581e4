use std::error::Error as StdError;

use thiserror::Error;

use crate::plan::ModelProfile;

/// Recite's crate-wide result type.
pub type Result<T> = std::result::Result<T, Error>;

/// Recite's crate-wide error type.
///
/// This is intentionally decoupled from `anyhow` so downstream libraries aren't forced to
/// adopt `anyhow` in their own public APIs. The variants mirror the pipeline's failure
/// taxonomy: bad caller input, model initialization failure, and per-window inference
/// failure. Everything else (IO, serialization) flows through `Other`.
#[derive(Debug, Error)]
pub enum Error {
    /// The caller broke the input contract (negative duration, malformed upload, zero
    /// sample rate). Surfaced immediately; never retried.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// A transcription model failed to initialize. Fatal for the current call, but the
    /// registry stays usable for other profiles.
    #[error("failed to load model for profile '{profile}': {message}")]
    ModelLoad {
        profile: ModelProfile,
        message: String,
    },

    /// Inference failed on a specific window. The request fails as a whole; remaining
    /// windows are not attempted.
    #[error("transcription failed on window {window}: {message}")]
    Transcription { window: usize, message: String },

    #[error(transparent)]
    Other(#[from] Box<dyn StdError + Send + Sync>),
}

impl Error {
    pub(crate) fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput(message.into())
    }

    pub(crate) fn model_load(profile: ModelProfile, err: anyhow::Error) -> Self {
        Self::ModelLoad {
            profile,
            message: format!("{err:#}"),
        }
    }

    pub(crate) fn transcription(window: usize, err: anyhow::Error) -> Self {
        Self::Transcription {
            window,
            message: format!("{err:#}"),
        }
    }

    /// Whether this error was caused by out-of-contract caller input.
    ///
    /// Serving layers use this to distinguish client failures (4xx) from pipeline
    /// failures (5xx).
    pub fn is_invalid_input(&self) -> bool {
        matches!(self, Self::InvalidInput(_))
    }
}

impl From<anyhow::Error> for Error {
    fn from(err: anyhow::Error) -> Self {
        Self::Other(err.into())
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Self::Other(Box::new(err))
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Self::Other(Box::new(err))
    }
}
