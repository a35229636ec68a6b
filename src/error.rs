use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, NarrationError>;

#[derive(Error, Debug)]
pub enum NarrationError {
    #[error("speech synthesis failed for '{key}': {reason}")]
    Synthesis { key: String, reason: String },

    #[error("could not read duration of {}: {source}", path.display())]
    DurationProbe {
        path: PathBuf,
        #[source]
        source: hound::Error,
    },

    #[error("could not create storage directory {}: {source}", path.display())]
    Storage {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("WAV error: {0}")]
    Wav(#[from] hound::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("translation failed: {0}")]
    Translation(String),

    #[error("invalid configuration: {0}")]
    Config(String),
}

impl NarrationError {
    pub fn synthesis(key: impl Into<String>, reason: impl ToString) -> Self {
        NarrationError::Synthesis {
            key: key.into(),
            reason: reason.to_string(),
        }
    }
}
