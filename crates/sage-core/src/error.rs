use thiserror::Error;

/// Top-level error type for the Sage system.
///
/// Collaborator implementations (note source, calendar, moderation,
/// generation) surface their failures through these variants so that the
/// `?` operator works seamlessly across crate boundaries. The dialog engine
/// defines its own taxonomy and converts from this one.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum SageError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Note not found: {0}")]
    NoteNotFound(String),

    #[error("Note source error: {0}")]
    NoteSource(String),

    #[error("Calendar error: {0}")]
    Calendar(String),

    #[error("Moderation error: {0}")]
    Moderation(String),

    #[error("Generation error: {0}")]
    Generation(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<toml::de::Error> for SageError {
    fn from(err: toml::de::Error) -> Self {
        SageError::Config(err.to_string())
    }
}

impl From<toml::ser::Error> for SageError {
    fn from(err: toml::ser::Error) -> Self {
        SageError::Config(err.to_string())
    }
}

impl From<serde_json::Error> for SageError {
    fn from(err: serde_json::Error) -> Self {
        SageError::Serialization(err.to_string())
    }
}

/// A specialized `Result` type for Sage operations.
pub type Result<T> = std::result::Result<T, SageError>;
