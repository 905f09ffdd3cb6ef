//! Session errors and the user-facing notices built from them

use crate::generation::GenerationError;
use std::fmt;
use thiserror::Error;

/// Errors returned by session operations
#[derive(Error, Debug)]
pub enum SessionError {
    /// Generation needs a topic and none is set
    #[error("No topic set")]
    MissingTopic,

    /// The generation client failed (after retries)
    #[error(transparent)]
    Generation(#[from] GenerationError),

    /// No section with this id exists
    #[error("Section not found: {0}")]
    SectionNotFound(String),

    /// The operation only applies to chapters
    #[error("Section {0} is not a chapter")]
    NotAChapter(String),

    /// The operation does not apply to the author profile
    #[error("Section {0} has no rich content")]
    NotRichContent(String),

    /// An image file could not be read
    #[error("Could not read image {path}: {source}")]
    ImageRead {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

/// Category of a user-facing notice
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeKind {
    /// The service stayed busy through every retry
    Overloaded,
    /// The credential was rejected
    InvalidCredential,
    /// No credential is configured
    MissingCredential,
    /// No topic is set
    MissingTopic,
    /// Anything else, carrying the raw message
    Other,
}

/// A blocking message for the user
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub kind: NoticeKind,
    pub message: String,
}

impl Notice {
    fn new(kind: NoticeKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

impl fmt::Display for Notice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl From<&SessionError> for Notice {
    fn from(error: &SessionError) -> Self {
        match error {
            SessionError::MissingTopic => Notice::new(
                NoticeKind::MissingTopic,
                "Harap isi topik atau masalah ebook terlebih dahulu.",
            ),
            SessionError::Generation(GenerationError::Overloaded(_)) => Notice::new(
                NoticeKind::Overloaded,
                "Server AI sedang sibuk (permintaan tinggi). Silakan coba lagi beberapa saat lagi.",
            ),
            SessionError::Generation(GenerationError::InvalidCredential(_)) => Notice::new(
                NoticeKind::InvalidCredential,
                "Kunci API Gemini tidak valid. Periksa kembali kunci Anda di pengaturan.",
            ),
            SessionError::Generation(GenerationError::MissingCredential) => Notice::new(
                NoticeKind::MissingCredential,
                "Harap masukkan Kunci API Gemini Anda di pengaturan.",
            ),
            SessionError::Generation(GenerationError::Other(message)) => {
                Notice::new(NoticeKind::Other, format!("Terjadi kesalahan: {}", message))
            }
            other => Notice::new(NoticeKind::Other, other.to_string()),
        }
    }
}

impl SessionError {
    /// The notice to show for this error
    pub fn notice(&self) -> Notice {
        Notice::from(self)
    }
}
