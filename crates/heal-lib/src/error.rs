//! Error types shared by the store, gateway and services

use thiserror::Error;

/// Errors surfaced by the heal library
#[derive(Debug, Error)]
pub enum HealError {
    /// The referenced screening document does not exist
    #[error("Screening not found")]
    ScreeningNotFound {
        user_id: String,
        screening_id: String,
    },

    /// The referenced user document does not exist
    #[error("User not found: {0}")]
    UserNotFound(String),

    /// A document path segment was empty or contained a separator
    #[error("invalid document path segment: {0:?}")]
    InvalidPath(String),

    /// A stored document could not be decoded into its entity
    #[error("malformed document at {path}: {reason}")]
    MalformedDocument { path: String, reason: String },

    /// No usable store credentials could be resolved
    #[error("credentials error: {0}")]
    Credentials(String),

    /// The document store failed to read or write
    #[error("storage error: {0}")]
    Storage(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

impl HealError {
    pub fn malformed(path: impl ToString, reason: impl Into<String>) -> Self {
        HealError::MalformedDocument {
            path: path.to_string(),
            reason: reason.into(),
        }
    }

    /// True for errors that mean "the referenced record does not exist"
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            HealError::ScreeningNotFound { .. } | HealError::UserNotFound(_)
        )
    }

    /// True for errors caused by the caller's identifiers rather than the service
    pub fn is_request_error(&self) -> bool {
        self.is_not_found() || matches!(self, HealError::InvalidPath(_))
    }
}

pub type Result<T> = std::result::Result<T, HealError>;
