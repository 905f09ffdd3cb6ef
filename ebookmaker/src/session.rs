//! Section orchestrator
//!
//! An [`EbookSession`] owns the canonical [`Document`], the mounted editing
//! surfaces and the generation client. Every operation takes `&self`; the
//! state sits behind a mutex that is never held across an await, so
//! overlapping generation calls interleave freely and the last write to a
//! section wins.

mod loading;
pub mod notice;
pub mod section;

pub use notice::{Notice, NoticeKind, SessionError};
pub use section::{PendingImageInsert, SectionHandle, EXTEND_SEPARATOR};

use crate::document::{
    Chapter, Document, EbookStyle, SectionKey, CHAPTER_COUNT_RANGE, MANUAL_CHAPTER_TITLE,
};
use crate::generation::{GenerationClient, GenerationKind, GenerationRequest};
use crate::rich_content::{clean_chapter_title, data_url, ImageNode};
use crate::surface::{EditableSurface, FocusTarget, SurfaceRegistry, SyncPolicy};
use loading::LoadingGuard;
use std::collections::HashMap;
use std::path::Path;
use std::sync::{Mutex, MutexGuard, PoisonError};

/// Title used when generation returns nothing usable
pub const FALLBACK_TITLE: &str = "Ebook Tanpa Judul";

/// Chapter title used when next-title generation fails
pub const FALLBACK_CHAPTER_TITLE: &str = "Bab Tambahan";

/// Loading id of the chapter list itself
pub const CHAPTER_LIST_ID: &str = "chapters";

/// Strip emphasis and quotes from a generated title
pub fn clean_generated_title(text: &str) -> String {
    let title = text.replace(['*', '"'], "").trim().to_string();
    if title.is_empty() {
        FALLBACK_TITLE.to_string()
    } else {
        title
    }
}

fn clean_next_chapter_title(text: &str) -> String {
    let title = clean_chapter_title(text);
    if title.is_empty() {
        FALLBACK_CHAPTER_TITLE.to_string()
    } else {
        title
    }
}

pub(crate) struct SessionState {
    pub(crate) document: Document,
    pub(crate) surfaces: SurfaceRegistry,
    in_flight: HashMap<String, usize>,
}

pub(crate) fn lock_state(state: &Mutex<SessionState>) -> MutexGuard<'_, SessionState> {
    state.lock().unwrap_or_else(PoisonError::into_inner)
}

impl SessionState {
    fn new(document: Document, policy: SyncPolicy) -> Self {
        let mut state = Self {
            document,
            surfaces: SurfaceRegistry::new(policy),
            in_flight: HashMap::new(),
        };
        state.sync_surfaces();
        state
    }

    /// Mount a surface for every rich section and drop the orphans
    fn sync_surfaces(&mut self) {
        let doc = &self.document;
        let sections: Vec<(String, String)> = [&doc.title, &doc.introduction]
            .into_iter()
            .chain(doc.chapters.iter().map(|chapter| &chapter.section))
            .chain([&doc.summary, &doc.conclusion])
            .map(|section| (section.id.clone(), section.content.clone()))
            .collect();

        self.surfaces
            .retain(|id| sections.iter().any(|(section_id, _)| section_id == id));
        for (id, content) in &sections {
            self.surfaces.mount(id, content);
        }
    }

    /// Set canonical content and push it to the section's surface
    ///
    /// # Returns
    /// * `true` - Content written
    /// * `false` - The section no longer exists; the write was discarded
    pub(crate) fn write_section(&mut self, key: &SectionKey, html: String) -> bool {
        let Some(section) = self.document.section_mut(key) else {
            log::warn!("Section {} no longer exists, discarding write", key);
            return false;
        };
        section.content = html;
        let content = section.content.clone();
        self.surfaces.mount(key.as_str(), &content);
        true
    }

    pub(crate) fn begin_loading(&mut self, id: &str) {
        *self.in_flight.entry(id.to_string()).or_insert(0) += 1;
        self.set_loading(id, true);
    }

    pub(crate) fn end_loading(&mut self, id: &str) {
        let remaining = match self.in_flight.get_mut(id) {
            Some(count) => {
                *count = count.saturating_sub(1);
                *count
            }
            None => 0,
        };
        if remaining == 0 {
            self.in_flight.remove(id);
        }
        self.set_loading(id, remaining > 0);
    }

    fn set_loading(&mut self, id: &str, loading: bool) {
        if let Some(section) = self.document.section_mut(&SectionKey::parse(id)) {
            section.loading = loading;
        }
    }
}

/// An editing session over one document
pub struct EbookSession<C> {
    state: Mutex<SessionState>,
    client: C,
}

impl<C: GenerationClient> EbookSession<C> {
    /// Start a session and mount a surface for every section
    pub fn new(document: Document, client: C, policy: SyncPolicy) -> Self {
        Self {
            state: Mutex::new(SessionState::new(document, policy)),
            client,
        }
    }

    pub(crate) fn lock(&self) -> MutexGuard<'_, SessionState> {
        lock_state(&self.state)
    }

    pub fn client(&self) -> &C {
        &self.client
    }

    /// Snapshot of the canonical document
    pub fn document(&self) -> Document {
        self.lock().document.clone()
    }

    /// Whether a generation call for `id` is in flight
    pub fn is_loading(&self, id: &str) -> bool {
        self.lock().in_flight.contains_key(id)
    }

    /// Operations on one section
    pub fn section(&self, key: SectionKey) -> SectionHandle<'_, C> {
        SectionHandle { session: self, key }
    }

    /// Run `f` on the section's mounted surface
    pub fn with_surface<R>(&self, key: &SectionKey, f: impl FnOnce(&mut EditableSurface) -> R) -> Option<R> {
        let mut state = self.lock();
        state.surfaces.get_mut(key.as_str()).map(f)
    }

    /// Run an edit on the section's surface and commit the markup it returns
    ///
    /// # Returns
    /// * `true` - The edit produced new canonical content
    /// * `false` - No surface is mounted or the edit changed nothing
    pub fn edit_surface(
        &self,
        key: &SectionKey,
        edit: impl FnOnce(&mut EditableSurface) -> Option<String>,
    ) -> bool {
        let mut state = self.lock();
        let Some(surface) = state.surfaces.get_mut(key.as_str()) else {
            log::warn!("No surface mounted for {}", key);
            return false;
        };
        match edit(surface) {
            Some(html) => state.write_section(key, html),
            None => false,
        }
    }

    /// Focus left the section's surface
    pub fn blur(&self, key: &SectionKey, target: FocusTarget) -> bool {
        let mut state = self.lock();
        let Some(canonical) = state.document.section(key).map(|s| s.content.clone()) else {
            return false;
        };
        let Some(surface) = state.surfaces.get_mut(key.as_str()) else {
            return false;
        };
        match surface.blur(target, &canonical) {
            Some(html) => state.write_section(key, html),
            None => false,
        }
    }

    /// Read an image file and insert it at the pending position
    ///
    /// # Returns
    /// * `Ok(true)` - Image inserted
    /// * `Ok(false)` - The target surface went away during the read; the image was discarded
    /// * `Err(SessionError)` - The file could not be read
    pub async fn insert_image(&self, pending: &PendingImageInsert, path: &Path) -> Result<bool, SessionError> {
        let bytes = tokio::fs::read(path)
            .await
            .map_err(|source| SessionError::ImageRead {
                path: path.display().to_string(),
                source,
            })?;
        let mime = image_mime(&bytes, path);
        Ok(self.insert_image_data(pending, mime, &bytes))
    }

    /// Insert already-loaded image bytes at the pending position
    pub fn insert_image_data(&self, pending: &PendingImageInsert, mime: &str, bytes: &[u8]) -> bool {
        let image = ImageNode::inserted(data_url(mime, bytes));
        let mut state = self.lock();
        let Some(surface) = state.surfaces.get_mut(pending.target.as_str()) else {
            log::warn!("Surface {} is gone, discarding image", pending.target);
            return false;
        };
        let html = surface.insert_image(image, pending.range.as_ref());
        state.write_section(&pending.target, html)
    }

    /// Replace the chapter list with generated titles
    ///
    /// # Returns
    /// * `Ok(usize)` - Number of chapters now in the document
    pub async fn generate_chapter_titles(&self) -> Result<usize, SessionError> {
        let request = {
            let state = self.lock();
            let doc = &state.document;
            if doc.topic.trim().is_empty() {
                return Err(SessionError::MissingTopic);
            }
            GenerationRequest::new(GenerationKind::ChapterTitles, doc.topic.clone(), doc.style)
                .with_count(doc.chapter_count)
        };

        let _loading = LoadingGuard::acquire(&self.state, CHAPTER_LIST_ID);
        log::info!("Generating {} chapter title(s)", request.count.unwrap_or_default());
        let titles = self.client.generate_list(&request).await?;

        let mut state = self.lock();
        if titles.is_empty() {
            log::warn!("Generator returned no chapter titles, keeping the current chapters");
            return Ok(state.document.chapters.len());
        }
        state.document.chapters = titles.into_iter().map(Chapter::new).collect();
        state.sync_surfaces();
        Ok(state.document.chapters.len())
    }

    /// Append an empty chapter
    ///
    /// # Returns
    /// * `String` - Id of the new chapter
    pub fn add_chapter(&self, title: Option<&str>) -> String {
        let chapter = Chapter::new(title.unwrap_or(MANUAL_CHAPTER_TITLE));
        let id = chapter.id().to_string();
        let mut state = self.lock();
        state.document.chapters.push(chapter);
        state.sync_surfaces();
        id
    }

    /// Append a chapter whose title is generated to follow the existing ones
    ///
    /// The chapter is added at once with a placeholder title and stays
    /// loading until the title arrives. A failed call falls back to
    /// [`FALLBACK_CHAPTER_TITLE`].
    pub async fn add_generated_chapter(&self) -> Result<String, SessionError> {
        let (request, id) = {
            let mut state = self.lock();
            let doc = &state.document;
            if doc.topic.trim().is_empty() {
                return Err(SessionError::MissingTopic);
            }
            let request = GenerationRequest::new(GenerationKind::NextChapterTitle, doc.topic.clone(), doc.style)
                .with_existing_titles(doc.chapter_titles());
            let chapter = Chapter::new(MANUAL_CHAPTER_TITLE);
            let id = chapter.id().to_string();
            state.document.chapters.push(chapter);
            state.sync_surfaces();
            (request, id)
        };

        let _loading = LoadingGuard::acquire(&self.state, &id);
        let title = match self.client.generate_text(&request).await {
            Ok(text) => clean_next_chapter_title(&text),
            Err(e) => {
                log::warn!("Next chapter title failed, using fallback: {}", e);
                FALLBACK_CHAPTER_TITLE.to_string()
            }
        };

        let mut state = self.lock();
        match state.document.chapter_mut(&id) {
            Some(chapter) => {
                log::info!("Added chapter {}", title);
                chapter.section.title = Some(title);
            }
            None => log::warn!("Chapter {} was removed before its title arrived", id),
        }
        Ok(id)
    }

    pub fn set_topic(&self, topic: &str) {
        self.lock().document.topic = topic.to_string();
    }

    pub fn set_style(&self, style: EbookStyle) {
        self.lock().document.style = style;
    }

    /// Set the target chapter count, clamped to the allowed range
    pub fn set_chapter_count(&self, count: u32) -> u32 {
        let count = count.clamp(*CHAPTER_COUNT_RANGE.start(), *CHAPTER_COUNT_RANGE.end());
        self.lock().document.chapter_count = count;
        count
    }

    pub fn set_author_bio(&self, bio: &str) {
        self.lock().document.author_bio = bio.to_string();
    }

    /// Start over with an empty document
    pub fn reset(&self) {
        let mut state = self.lock();
        state.document = Document::new();
        state.sync_surfaces();
        log::info!("Session reset");
    }
}

/// MIME type of an image, from its content or else its extension
fn image_mime(bytes: &[u8], path: &Path) -> &'static str {
    match imagesize::image_type(bytes) {
        Ok(imagesize::ImageType::Png) => "image/png",
        Ok(imagesize::ImageType::Jpeg) => "image/jpeg",
        Ok(imagesize::ImageType::Gif) => "image/gif",
        Ok(imagesize::ImageType::Webp) => "image/webp",
        Ok(imagesize::ImageType::Bmp) => "image/bmp",
        _ => match path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(str::to_ascii_lowercase)
            .as_deref()
        {
            Some("png") => "image/png",
            Some("jpg" | "jpeg") => "image/jpeg",
            Some("gif") => "image/gif",
            Some("webp") => "image/webp",
            Some("svg") => "image/svg+xml",
            _ => "application/octet-stream",
        },
    }
}
