//! Per-section operations

use super::loading::LoadingGuard;
use super::{clean_generated_title, EbookSession, SessionError};
use crate::document::{FormattingUpdate, SectionKey};
use crate::generation::{GenerationClient, GenerationKind, GenerationRequest};
use crate::rich_content::{escape_text, format_text, strip_tags};
use crate::surface::CapturedRange;

/// Separator placed between existing content and an extension
pub const EXTEND_SEPARATOR: &str = "<br/><br/>";

/// Target and insertion point of an image insert, captured at trigger time
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingImageInsert {
    pub target: SectionKey,
    pub range: Option<CapturedRange>,
}

/// Operations on one section of a session
pub struct SectionHandle<'a, C> {
    pub(super) session: &'a EbookSession<C>,
    pub(super) key: SectionKey,
}

impl<C: GenerationClient> SectionHandle<'_, C> {
    pub fn key(&self) -> &SectionKey {
        &self.key
    }

    /// Replace the section content with generated text
    ///
    /// The title gets a single cleaned line; every other section gets the
    /// text wrapped into paragraphs. A chapter removed while the call is in
    /// flight is left alone.
    pub async fn generate(&self) -> Result<(), SessionError> {
        let request = {
            let state = self.session.lock();
            let doc = &state.document;
            let kind = match &self.key {
                SectionKey::Title => GenerationKind::Title,
                SectionKey::Introduction => GenerationKind::Introduction,
                SectionKey::Chapter(_) => GenerationKind::ChapterContent,
                SectionKey::Summary => GenerationKind::Summary,
                SectionKey::Conclusion => GenerationKind::Conclusion,
                SectionKey::AuthorBio => {
                    return Err(SessionError::NotRichContent(self.key.to_string()))
                }
            };
            let request = GenerationRequest::new(kind, doc.topic.clone(), doc.style);
            match &self.key {
                SectionKey::Chapter(id) => {
                    let chapter = doc
                        .chapter(id)
                        .ok_or_else(|| SessionError::SectionNotFound(id.clone()))?;
                    request.with_chapter_title(chapter.display_title())
                }
                _ if doc.topic.trim().is_empty() => return Err(SessionError::MissingTopic),
                _ => request,
            }
        };

        let _loading = LoadingGuard::acquire(&self.session.state, self.key.as_str());
        log::info!("Generating {}", self.key);
        let text = self.session.client.generate_text(&request).await?;

        let html = match self.key {
            SectionKey::Title => escape_text(&clean_generated_title(&text)),
            _ => format_text(&text),
        };
        self.session.lock().write_section(&self.key, html);
        Ok(())
    }

    /// Append generated continuation text to a chapter
    ///
    /// The generator sees the plain text of the content at trigger time; the
    /// result is appended to whatever the content is when the call completes.
    pub async fn extend(&self) -> Result<(), SessionError> {
        let SectionKey::Chapter(id) = &self.key else {
            return Err(SessionError::NotAChapter(self.key.to_string()));
        };
        let request = {
            let state = self.session.lock();
            let doc = &state.document;
            let chapter = doc
                .chapter(id)
                .ok_or_else(|| SessionError::SectionNotFound(id.clone()))?;
            GenerationRequest::new(GenerationKind::Extend, doc.topic.clone(), doc.style)
                .with_chapter_title(chapter.display_title())
                .with_existing_content(strip_tags(&chapter.section.content))
        };

        let _loading = LoadingGuard::acquire(&self.session.state, id);
        log::info!("Extending {}", id);
        let text = self.session.client.generate_text(&request).await?;

        let mut state = self.session.lock();
        let current = state
            .document
            .chapter(id)
            .map(|chapter| chapter.section.content.clone())
            .unwrap_or_default();
        let extended = format!("{}{}{}", current, EXTEND_SEPARATOR, format_text(&text));
        state.write_section(&self.key, extended);
        Ok(())
    }

    /// Snapshot the target and the surface's last range before a file read
    pub fn prepare_image_insert(&self) -> Result<PendingImageInsert, SessionError> {
        let mut state = self.session.lock();
        let content = state
            .document
            .section(&self.key)
            .map(|section| section.content.clone())
            .ok_or_else(|| self.missing())?;
        let surface = state.surfaces.mount(self.key.as_str(), &content);
        Ok(PendingImageInsert {
            target: self.key.clone(),
            range: surface.capture_range(),
        })
    }

    /// Apply a partial formatting update
    pub fn update_formatting(&self, update: FormattingUpdate) -> Result<(), SessionError> {
        let mut state = self.session.lock();
        let formatting = match &self.key {
            SectionKey::AuthorBio => &mut state.document.author_formatting,
            key => {
                &mut state
                    .document
                    .section_mut(key)
                    .ok_or_else(|| SessionError::SectionNotFound(key.to_string()))?
                    .formatting
            }
        };
        formatting.merge(update);
        Ok(())
    }

    /// Remove a chapter and unmount its surface
    pub fn remove(&self) -> Result<(), SessionError> {
        let SectionKey::Chapter(id) = &self.key else {
            return Err(SessionError::NotAChapter(self.key.to_string()));
        };
        let mut state = self.session.lock();
        let chapter = state
            .document
            .remove_chapter(id)
            .ok_or_else(|| SessionError::SectionNotFound(id.clone()))?;
        state.surfaces.unmount(id);
        log::info!("Removed chapter {}", chapter.display_title());
        Ok(())
    }

    fn missing(&self) -> SessionError {
        match self.key {
            SectionKey::AuthorBio => SessionError::NotRichContent(self.key.to_string()),
            _ => SessionError::SectionNotFound(self.key.to_string()),
        }
    }
}
