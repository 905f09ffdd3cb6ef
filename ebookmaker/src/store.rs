//! Persisted application state
//!
//! The document and the API credential are stored as two independent files
//! in the data directory. Both are read once at startup and rewritten after
//! every change.

use crate::document::Document;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// File holding the serialized document
pub const STATE_FILE: &str = "ebook_maker_state.json";

/// File holding the API credential
pub const CREDENTIAL_FILE: &str = "gemini_api_key";

/// State store errors
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("IO error on {path}: {source}")]
    IoError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid state in {path}: {source}")]
    ParseError {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Could not serialize state: {0}")]
    SerializeError(#[from] serde_json::Error),
}

/// File-backed store for the document and the credential
#[derive(Debug, Clone)]
pub struct StateStore {
    dir: PathBuf,
}

impl StateStore {
    /// Create a store rooted at `dir` (created on first save)
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn state_path(&self) -> PathBuf {
        self.dir.join(STATE_FILE)
    }

    fn credential_path(&self) -> PathBuf {
        self.dir.join(CREDENTIAL_FILE)
    }

    /// Load the saved document
    ///
    /// # Returns
    /// * `Ok(Some(Document))` - A document was saved before
    /// * `Ok(None)` - Nothing saved yet
    /// * `Err(StoreError)` - The file exists but could not be read or parsed
    pub fn load_document(&self) -> Result<Option<Document>, StoreError> {
        let path = self.state_path();
        let Some(content) = read_optional(&path)? else {
            return Ok(None);
        };
        let document =
            serde_json::from_str(&content).map_err(|source| StoreError::ParseError { path, source })?;
        Ok(Some(document))
    }

    /// Save the document
    pub fn save_document(&self, document: &Document) -> Result<(), StoreError> {
        let content = serde_json::to_string_pretty(document)?;
        self.write(&self.state_path(), &content)
    }

    /// Load the saved credential (empty when none)
    pub fn load_credential(&self) -> Result<String, StoreError> {
        Ok(read_optional(&self.credential_path())?
            .map(|key| key.trim().to_string())
            .unwrap_or_default())
    }

    /// Save the credential
    pub fn save_credential(&self, key: &str) -> Result<(), StoreError> {
        self.write(&self.credential_path(), key.trim())
    }

    /// Delete the saved document (the credential is kept)
    pub fn reset(&self) -> Result<(), StoreError> {
        let path = self.state_path();
        match fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(source) => Err(StoreError::IoError { path, source }),
        }
    }

    fn write(&self, path: &Path, content: &str) -> Result<(), StoreError> {
        fs::create_dir_all(&self.dir).map_err(|source| StoreError::IoError {
            path: self.dir.clone(),
            source,
        })?;
        fs::write(path, content).map_err(|source| StoreError::IoError {
            path: path.to_path_buf(),
            source,
        })
    }
}

fn read_optional(path: &Path) -> Result<Option<String>, StoreError> {
    match fs::read_to_string(path) {
        Ok(content) => Ok(Some(content)),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(source) => Err(StoreError::IoError {
            path: path.to_path_buf(),
            source,
        }),
    }
}
