//! Ebook document model
//!
//! The whole document is one plain serde structure. It is owned by the
//! session, persisted wholesale by the store, and read by the PDF exporter.

use crate::rich_content::clean_chapter_title;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Placeholder title for a chapter added by hand
pub const MANUAL_CHAPTER_TITLE: &str = "Judul Bab Baru";

/// Default chapter count for a new document
pub const DEFAULT_CHAPTER_COUNT: u32 = 3;

/// Allowed chapter count range
pub const CHAPTER_COUNT_RANGE: std::ops::RangeInclusive<u32> = 1..=10;

/// Paragraph alignment of a section body
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Alignment {
    #[default]
    Left,
    Center,
    Right,
    Justify,
}

/// Font family of a section body
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FontFamily {
    #[default]
    Sans,
    Serif,
    Mono,
}

impl FontFamily {
    /// CSS class the editing surface uses for this family
    pub fn css_class(self) -> &'static str {
        match self {
            FontFamily::Sans => "font-sans",
            FontFamily::Serif => "font-serif",
            FontFamily::Mono => "font-mono",
        }
    }
}

/// Formatting of one section
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Formatting {
    /// Paragraph alignment
    pub align: Alignment,

    /// Font family
    pub font: FontFamily,

    /// Line spacing multiplier
    pub spacing: f32,
}

impl Default for Formatting {
    fn default() -> Self {
        Self {
            align: Alignment::Left,
            font: FontFamily::Sans,
            spacing: 1.7,
        }
    }
}

/// A partial formatting update; unset fields keep their value
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct FormattingUpdate {
    pub align: Option<Alignment>,
    pub font: Option<FontFamily>,
    pub spacing: Option<f32>,
}

impl Formatting {
    /// Apply a partial update
    pub fn merge(&mut self, update: FormattingUpdate) {
        if let Some(align) = update.align {
            self.align = align;
        }
        if let Some(font) = update.font {
            self.font = font;
        }
        if let Some(spacing) = update.spacing {
            self.spacing = spacing;
        }
    }
}

/// Writing style requested from the generator
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EbookStyle {
    #[default]
    Profesional,
    Santai,
    Serius,
    Inspiratif,
    Akademis,
}

impl fmt::Display for EbookStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            EbookStyle::Profesional => "profesional",
            EbookStyle::Santai => "santai",
            EbookStyle::Serius => "serius",
            EbookStyle::Inspiratif => "inspiratif",
            EbookStyle::Akademis => "akademis",
        };
        f.write_str(name)
    }
}

/// One addressable content block
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Section {
    /// Stable identifier (also the surface anchor id)
    pub id: String,

    /// Optional display title (raw; chapters may carry a generator prefix)
    #[serde(default)]
    pub title: Option<String>,

    /// Canonical HTML fragment
    #[serde(default)]
    pub content: String,

    /// Body formatting
    #[serde(default)]
    pub formatting: Formatting,

    /// Whether a generation call is in flight (never persisted)
    #[serde(skip)]
    pub loading: bool,
}

impl Section {
    /// Create an empty section
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: None,
            content: String::new(),
            formatting: Formatting::default(),
            loading: false,
        }
    }

    /// Whether the canonical content is blank
    pub fn is_empty(&self) -> bool {
        self.content.trim().is_empty()
    }
}

/// A chapter: a section with a position in the chapter list
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Chapter {
    #[serde(flatten)]
    pub section: Section,
}

impl Chapter {
    /// Create an empty chapter with a fresh unique id
    pub fn new(title: impl Into<String>) -> Self {
        let mut section = Section::new(format!("ch-{}", uuid::Uuid::new_v4().simple()));
        section.title = Some(title.into());
        Self { section }
    }

    /// Stable chapter id
    pub fn id(&self) -> &str {
        &self.section.id
    }

    /// Raw stored title
    pub fn raw_title(&self) -> &str {
        self.section.title.as_deref().unwrap_or_default()
    }

    /// Title with any generator prefix removed
    pub fn display_title(&self) -> String {
        clean_chapter_title(self.raw_title())
    }

    /// Heading for the chapter at zero-based `index`
    pub fn heading(&self, index: usize) -> String {
        format!("Bab {}: {}", index + 1, self.display_title())
    }
}

/// Address of a section inside the document
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum SectionKey {
    Title,
    Introduction,
    Chapter(String),
    Summary,
    Conclusion,
    AuthorBio,
}

impl SectionKey {
    /// Parse an anchor id; anything that is not a fixed name is a chapter id
    pub fn parse(id: &str) -> Self {
        match id {
            "title" => SectionKey::Title,
            "intro" | "introduction" => SectionKey::Introduction,
            "summary" => SectionKey::Summary,
            "conclusion" => SectionKey::Conclusion,
            "author" | "bio" => SectionKey::AuthorBio,
            other => SectionKey::Chapter(other.to_string()),
        }
    }

    /// Anchor id of the section
    pub fn as_str(&self) -> &str {
        match self {
            SectionKey::Title => "title",
            SectionKey::Introduction => "intro",
            SectionKey::Chapter(id) => id,
            SectionKey::Summary => "summary",
            SectionKey::Conclusion => "conclusion",
            SectionKey::AuthorBio => "author",
        }
    }
}

impl fmt::Display for SectionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The whole ebook
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    /// Topic (the problem the ebook addresses)
    #[serde(default)]
    pub topic: String,

    /// Writing style
    #[serde(default)]
    pub style: EbookStyle,

    /// Target number of chapters for title-list generation
    #[serde(default = "default_chapter_count")]
    pub chapter_count: u32,

    /// Title section
    pub title: Section,

    /// Introduction section
    pub introduction: Section,

    /// Ordered chapters
    #[serde(default)]
    pub chapters: Vec<Chapter>,

    /// Key takeaways section
    pub summary: Section,

    /// Closing words section
    pub conclusion: Section,

    /// Author biography (plain text)
    #[serde(default)]
    pub author_bio: String,

    /// Formatting of the author profile block
    #[serde(default)]
    pub author_formatting: Formatting,
}

fn default_chapter_count() -> u32 {
    DEFAULT_CHAPTER_COUNT
}

impl Default for Document {
    fn default() -> Self {
        Self {
            topic: String::new(),
            style: EbookStyle::default(),
            chapter_count: DEFAULT_CHAPTER_COUNT,
            title: Section::new("title"),
            introduction: Section::new("intro"),
            chapters: Vec::new(),
            summary: Section::new("summary"),
            conclusion: Section::new("conclusion"),
            author_bio: String::new(),
            author_formatting: Formatting::default(),
        }
    }
}

impl Document {
    /// Create an empty document
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up a section by key (the author bio is not a rich section)
    pub fn section(&self, key: &SectionKey) -> Option<&Section> {
        match key {
            SectionKey::Title => Some(&self.title),
            SectionKey::Introduction => Some(&self.introduction),
            SectionKey::Chapter(id) => self.chapter(id).map(|c| &c.section),
            SectionKey::Summary => Some(&self.summary),
            SectionKey::Conclusion => Some(&self.conclusion),
            SectionKey::AuthorBio => None,
        }
    }

    /// Mutable lookup of a section by key
    pub fn section_mut(&mut self, key: &SectionKey) -> Option<&mut Section> {
        match key {
            SectionKey::Title => Some(&mut self.title),
            SectionKey::Introduction => Some(&mut self.introduction),
            SectionKey::Chapter(id) => self.chapter_mut(id).map(|c| &mut c.section),
            SectionKey::Summary => Some(&mut self.summary),
            SectionKey::Conclusion => Some(&mut self.conclusion),
            SectionKey::AuthorBio => None,
        }
    }

    /// Look up a chapter by id
    pub fn chapter(&self, id: &str) -> Option<&Chapter> {
        self.chapters.iter().find(|c| c.id() == id)
    }

    /// Mutable lookup of a chapter by id
    pub fn chapter_mut(&mut self, id: &str) -> Option<&mut Chapter> {
        self.chapters.iter_mut().find(|c| c.id() == id)
    }

    /// Zero-based position of a chapter
    pub fn chapter_index(&self, id: &str) -> Option<usize> {
        self.chapters.iter().position(|c| c.id() == id)
    }

    /// Remove a chapter; returns it if it existed
    pub fn remove_chapter(&mut self, id: &str) -> Option<Chapter> {
        let index = self.chapter_index(id)?;
        Some(self.chapters.remove(index))
    }

    /// Cleaned titles of every chapter, in order
    pub fn chapter_titles(&self) -> Vec<String> {
        self.chapters.iter().map(Chapter::display_title).collect()
    }

    /// Whether the chapter ids are pairwise distinct
    pub fn has_unique_chapter_ids(&self) -> bool {
        let mut seen = std::collections::HashSet::new();
        self.chapters.iter().all(|c| seen.insert(c.id()))
    }
}
