//! Error taxonomy for the dialog engine.

use sage_core::SageError;

/// Errors from the dialog engine.
///
/// "No matching exam" and "ambiguous exam" are normal branches of the plan
/// flow and are handled as state transitions, so they do not appear here.
/// Every variant maps to a recovery the controller applies locally; none is
/// fatal to the process.
#[derive(Debug, thiserror::Error)]
pub enum DialogError {
    #[error("request throttled")]
    RateLimited,
    #[error("a previous request for this user is still in flight")]
    Busy,
    #[error("note not found: {0}")]
    NoteNotFound(String),
    #[error("content blocked by moderation")]
    ModerationBlocked,
    #[error("invalid date: {0}")]
    InvalidDate(String),
    #[error("unexpected input for current state: {expected}")]
    UnexpectedInput { expected: &'static str },
    #[error("generation failed: {0}")]
    Generation(String),
    #[error("collaborator error: {0}")]
    Collaborator(String),
    #[error("session error: {0}")]
    Session(String),
}

impl From<SageError> for DialogError {
    fn from(err: SageError) -> Self {
        match err {
            SageError::NoteNotFound(title) => DialogError::NoteNotFound(title),
            SageError::Generation(msg) => DialogError::Generation(msg),
            other => DialogError::Collaborator(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        assert_eq!(DialogError::RateLimited.to_string(), "request throttled");
        assert_eq!(
            DialogError::NoteNotFound("Biology".to_string()).to_string(),
            "note not found: Biology"
        );
        assert_eq!(
            DialogError::InvalidDate("someday".to_string()).to_string(),
            "invalid date: someday"
        );
        assert_eq!(
            DialogError::ModerationBlocked.to_string(),
            "content blocked by moderation"
        );
    }

    #[test]
    fn test_from_sage_error_note_not_found() {
        let err: DialogError = SageError::NoteNotFound("Chemistry".to_string()).into();
        assert!(matches!(err, DialogError::NoteNotFound(ref t) if t == "Chemistry"));
    }

    #[test]
    fn test_from_sage_error_generation() {
        let err: DialogError = SageError::Generation("upstream 500".to_string()).into();
        assert!(matches!(err, DialogError::Generation(_)));
    }

    #[test]
    fn test_from_sage_error_other_becomes_collaborator() {
        let err: DialogError = SageError::Calendar("auth failed".to_string()).into();
        assert!(matches!(err, DialogError::Collaborator(_)));
        assert!(err.to_string().contains("auth failed"));
    }
}
