//! Generation failures and their classification

use thiserror::Error;

/// Markers of a temporarily overloaded service
const TRANSIENT_MARKERS: &[&str] = &["503", "429", "high demand", "UNAVAILABLE", "overloaded"];

/// Markers of a rejected credential
const CREDENTIAL_MARKERS: &[&str] = &[
    "API key not valid",
    "API_KEY_INVALID",
    "PERMISSION_DENIED",
    "401",
    "403",
];

/// Errors returned by a generation client
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GenerationError {
    /// The service is busy; worth retrying
    #[error("Service overloaded: {0}")]
    Overloaded(String),

    /// The credential was rejected
    #[error("Invalid credential: {0}")]
    InvalidCredential(String),

    /// No credential has been configured
    #[error("No API key configured")]
    MissingCredential,

    /// Anything else, with the raw message
    #[error("{0}")]
    Other(String),
}

impl GenerationError {
    /// Classify a raw service or transport error message
    ///
    /// Transient markers are checked first so that a 429 carrying a
    /// permission hint is still retried.
    pub fn classify(message: impl Into<String>) -> Self {
        let message = message.into();
        if TRANSIENT_MARKERS.iter().any(|m| message.contains(m)) {
            GenerationError::Overloaded(message)
        } else if CREDENTIAL_MARKERS.iter().any(|m| message.contains(m)) {
            GenerationError::InvalidCredential(message)
        } else {
            GenerationError::Other(message)
        }
    }

    /// Whether a retry may succeed
    pub fn is_transient(&self) -> bool {
        matches!(self, GenerationError::Overloaded(_))
    }
}
