//! PDF export
//!
//! Lays out the whole document in fixed order (title, introduction, each
//! chapter, summary, conclusion, author profile) and serializes it with
//! pdf-writer using the standard Helvetica fonts:
//! - Each section after the title starts on a fresh page with a bold heading
//! - Chapters always get a page; other sections only when non-empty
//! - Images keep their size tier, alignment and aspect ratio
//! - Undecodable images are skipped with a warning

pub mod images;
pub mod layout;
pub mod metrics;
pub mod tokens;
pub mod writer;

pub use layout::{DrawOp, LaidOutDocument, LayoutEngine, Page, PlacedImage, TextLine, TextStyle};

use crate::document::{Document, Section};
use crate::rich_content::{format_text, strip_tags};
use layout::{HEADING_GAP, TITLE_GAP};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Heading of the introduction page
pub const INTRODUCTION_HEADING: &str = "Pendahuluan";
/// Heading of the summary page
pub const SUMMARY_HEADING: &str = "Poin-Poin Penting";
/// Heading of the conclusion page
pub const CONCLUSION_HEADING: &str = "Kata Penutup";
/// Heading of the author profile page
pub const AUTHOR_HEADING: &str = "Profil Penulis";

/// File stem used when the title is empty
pub const FALLBACK_FILE_STEM: &str = "ebook";

/// PDF export errors
#[derive(Error, Debug)]
pub enum PdfExportError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Image loading error: {0}")]
    ImageError(String),
}

/// Lay out every section of the document onto pages
pub fn layout_document(doc: &Document) -> LaidOutDocument {
    let mut engine = LayoutEngine::new();

    if !doc.title.is_empty() {
        engine.body(&doc.title.content, doc.title.formatting.align, TextStyle::TITLE);
        engine.skip(TITLE_GAP);
    }

    optional_section(&mut engine, INTRODUCTION_HEADING, &doc.introduction);

    for (index, chapter) in doc.chapters.iter().enumerate() {
        section_page(&mut engine, &chapter.heading(index), &chapter.section);
    }

    optional_section(&mut engine, SUMMARY_HEADING, &doc.summary);
    optional_section(&mut engine, CONCLUSION_HEADING, &doc.conclusion);

    if !doc.author_bio.trim().is_empty() {
        engine.fresh_page();
        engine.heading(AUTHOR_HEADING, TextStyle::HEADING, HEADING_GAP);
        engine.body(
            &format_text(&doc.author_bio),
            doc.author_formatting.align,
            TextStyle::BODY,
        );
    }

    let laid_out = engine.finish();
    log::info!(
        "Laid out {} page(s) with {} image(s)",
        laid_out.pages.len(),
        laid_out.images.len()
    );
    laid_out
}

fn optional_section(engine: &mut LayoutEngine, heading: &str, section: &Section) {
    if !section.is_empty() {
        section_page(engine, heading, section);
    }
}

fn section_page(engine: &mut LayoutEngine, heading: &str, section: &Section) {
    engine.fresh_page();
    engine.heading(heading, TextStyle::HEADING, HEADING_GAP);
    engine.body(&section.content, section.formatting.align, TextStyle::BODY);
}

/// Render the document to PDF bytes
pub fn render_pdf(doc: &Document) -> Vec<u8> {
    let laid_out = layout_document(doc);
    writer::write_pdf(&laid_out, &strip_tags(&doc.title.content))
}

/// Output file name derived from the plain-text title
///
/// Path separators and characters invalid in file names are replaced.
pub fn export_file_name(doc: &Document) -> String {
    let title = strip_tags(&doc.title.content);
    let stem: String = title
        .chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect();
    let stem = stem.trim();
    if stem.is_empty() {
        format!("{}.pdf", FALLBACK_FILE_STEM)
    } else {
        format!("{}.pdf", stem)
    }
}

/// Export the document to a PDF file
///
/// # Parameters
/// * `doc` - The document to export
/// * `output` - Target file, or a directory to place the title-named file in
///
/// # Returns
/// * `Ok(PathBuf)` - Path of the written file
/// * `Err(PdfExportError)` - Error writing the file
pub fn export_pdf(doc: &Document, output: &Path) -> Result<PathBuf, PdfExportError> {
    let path = if output.is_dir() {
        output.join(export_file_name(doc))
    } else {
        output.to_path_buf()
    };

    let bytes = render_pdf(doc);
    std::fs::write(&path, &bytes)?;
    log::info!("Wrote {} ({} bytes)", path.display(), bytes.len());
    Ok(path)
}
