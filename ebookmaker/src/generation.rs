//! Text generation boundary
//!
//! The session talks to a [`GenerationClient`]; [`GeminiClient`] is the real
//! implementation and [`RetryingClient`] wraps any client with exponential
//! backoff for transient failures.

pub mod error;
pub mod gemini;
pub mod prompts;
pub mod retry;

pub use error::GenerationError;
pub use gemini::{GeminiClient, GeminiConfig};
pub use retry::{call_with_retry, RetryPolicy, RetryingClient};

use crate::document::EbookStyle;
use async_trait::async_trait;
use std::sync::Arc;

/// What is being generated
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GenerationKind {
    Title,
    Introduction,
    ChapterTitles,
    NextChapterTitle,
    ChapterContent,
    Extend,
    Summary,
    Conclusion,
}

/// One generation request
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationRequest {
    pub kind: GenerationKind,
    pub topic: String,
    pub style: EbookStyle,
    pub chapter_title: Option<String>,
    /// Plain text of the content being extended
    pub existing_content: Option<String>,
    pub existing_titles: Vec<String>,
    pub count: Option<u32>,
}

impl GenerationRequest {
    pub fn new(kind: GenerationKind, topic: impl Into<String>, style: EbookStyle) -> Self {
        Self {
            kind,
            topic: topic.into(),
            style,
            chapter_title: None,
            existing_content: None,
            existing_titles: Vec::new(),
            count: None,
        }
    }

    pub fn with_chapter_title(mut self, title: impl Into<String>) -> Self {
        self.chapter_title = Some(title.into());
        self
    }

    pub fn with_existing_content(mut self, content: impl Into<String>) -> Self {
        self.existing_content = Some(content.into());
        self
    }

    pub fn with_existing_titles(mut self, titles: Vec<String>) -> Self {
        self.existing_titles = titles;
        self
    }

    pub fn with_count(mut self, count: u32) -> Self {
        self.count = Some(count);
        self
    }
}

/// Produces text for ebook sections
#[async_trait]
pub trait GenerationClient: Send + Sync {
    /// Plain text for one section or title
    async fn generate_text(&self, request: &GenerationRequest) -> Result<String, GenerationError>;

    /// An ordered list of strings (chapter titles)
    async fn generate_list(&self, request: &GenerationRequest) -> Result<Vec<String>, GenerationError>;
}

#[async_trait]
impl<C: GenerationClient + ?Sized> GenerationClient for Arc<C> {
    async fn generate_text(&self, request: &GenerationRequest) -> Result<String, GenerationError> {
        (**self).generate_text(request).await
    }

    async fn generate_list(&self, request: &GenerationRequest) -> Result<Vec<String>, GenerationError> {
        (**self).generate_list(request).await
    }
}
