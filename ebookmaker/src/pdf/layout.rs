//! Line wrapping and pagination
//!
//! The engine works top-down in millimetres on A4 pages and produces a
//! [`LaidOutDocument`]: pages of positioned text lines and images. The writer
//! turns that into PDF operators; tests inspect it directly.

use super::images::{self, EmbeddedImage};
use super::metrics::{text_width, ASCENT};
use super::tokens::{buffer_lines, flatten, Token};
use crate::document::Alignment;
use crate::rich_content::{ImageAlignment, ImageNode, ImageSize, RichDocument};

/// Points to millimetres
pub const PT_TO_MM: f32 = 25.4 / 72.0;

/// CSS pixels to millimetres (96 dpi)
pub const PX_TO_MM: f32 = 25.4 / 96.0;

/// Line height as a multiple of the font size
pub const LINE_HEIGHT_FACTOR: f32 = 1.15;

pub const PAGE_WIDTH: f32 = 210.0;
pub const PAGE_HEIGHT: f32 = 297.0;
pub const MARGIN: f32 = 20.0;
pub const CONTENT_WIDTH: f32 = PAGE_WIDTH - 2.0 * MARGIN;

/// Lowest y a line or image may reach
pub const BOTTOM_LIMIT: f32 = PAGE_HEIGHT - MARGIN;

pub const BODY_SIZE: f32 = 12.0;
pub const HEADING_SIZE: f32 = 18.0;
pub const TITLE_SIZE: f32 = 26.0;

pub const HEADING_GAP: f32 = 5.0;
pub const TITLE_GAP: f32 = 10.0;
pub const IMAGE_GAP: f32 = 6.0;

/// Vertical advance of one line at `size` points
pub fn line_height(size: f32) -> f32 {
    size * PT_TO_MM * LINE_HEIGHT_FACTOR
}

/// Space added after every paragraph at `size` points
pub fn paragraph_spacing(size: f32) -> f32 {
    0.5 * line_height(size)
}

/// Font selection for a run of lines
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TextStyle {
    pub size: f32,
    pub bold: bool,
}

impl TextStyle {
    pub const BODY: TextStyle = TextStyle {
        size: BODY_SIZE,
        bold: false,
    };
    pub const HEADING: TextStyle = TextStyle {
        size: HEADING_SIZE,
        bold: true,
    };
    pub const TITLE: TextStyle = TextStyle {
        size: TITLE_SIZE,
        bold: true,
    };
}

/// One positioned line of text
#[derive(Debug, Clone, PartialEq)]
pub struct TextLine {
    /// Left edge in mm
    pub x: f32,
    /// Top of the line box in mm from the page top
    pub top: f32,
    /// Baseline in mm from the page top
    pub baseline: f32,
    pub text: String,
    pub style: TextStyle,
    /// Extra space added to every space character, in mm
    pub word_spacing: f32,
}

impl TextLine {
    /// Bottom of the line box in mm from the page top
    pub fn bottom(&self) -> f32 {
        self.top + line_height(self.style.size)
    }
}

/// One positioned image
#[derive(Debug, Clone, PartialEq)]
pub struct PlacedImage {
    /// Index into [`LaidOutDocument::images`]
    pub image: usize,
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

/// A drawing operation on a page
#[derive(Debug, Clone, PartialEq)]
pub enum DrawOp {
    Text(TextLine),
    Image(PlacedImage),
}

/// One output page
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Page {
    pub ops: Vec<DrawOp>,
}

impl Page {
    /// Text lines of the page in drawing order
    pub fn lines(&self) -> impl Iterator<Item = &TextLine> {
        self.ops.iter().filter_map(|op| match op {
            DrawOp::Text(line) => Some(line),
            DrawOp::Image(_) => None,
        })
    }

    /// Images of the page in drawing order
    pub fn images(&self) -> impl Iterator<Item = &PlacedImage> {
        self.ops.iter().filter_map(|op| match op {
            DrawOp::Image(image) => Some(image),
            DrawOp::Text(_) => None,
        })
    }

    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }
}

/// Result of laying out a whole document
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LaidOutDocument {
    pub pages: Vec<Page>,
    pub images: Vec<EmbeddedImage>,
}

/// A wrapped line before placement
#[derive(Debug, Clone, PartialEq)]
struct WrappedLine {
    words: Vec<String>,
    /// Last line of a hard line (ends at `\n` or the end of the paragraph)
    hard_end: bool,
}

impl WrappedLine {
    fn text(&self) -> String {
        self.words.join(" ")
    }
}

/// Greedy word wrap of `text` to `max_width` mm
///
/// Explicit newlines always break. Words wider than a whole line are split
/// by character.
pub fn wrap_text(text: &str, max_width: f32, style: TextStyle) -> Vec<String> {
    wrap(&buffer_lines(text), max_width, style)
        .iter()
        .map(WrappedLine::text)
        .collect()
}

fn wrap(hard_lines: &[String], max_width: f32, style: TextStyle) -> Vec<WrappedLine> {
    let space = text_width(" ", style.size, style.bold);
    let mut out = Vec::new();

    for hard_line in hard_lines {
        let mut current: Vec<String> = Vec::new();
        let mut current_width = 0.0;

        for word in hard_line.split(' ').filter(|w| !w.is_empty()) {
            for piece in split_long_word(word, max_width, style) {
                let width = text_width(&piece, style.size, style.bold);
                let needed = if current.is_empty() {
                    width
                } else {
                    current_width + space + width
                };
                if needed > max_width && !current.is_empty() {
                    out.push(WrappedLine {
                        words: std::mem::take(&mut current),
                        hard_end: false,
                    });
                    current_width = width;
                } else {
                    current_width = needed;
                }
                current.push(piece);
            }
        }

        out.push(WrappedLine {
            words: current,
            hard_end: true,
        });
    }
    out
}

fn split_long_word(word: &str, max_width: f32, style: TextStyle) -> Vec<String> {
    if text_width(word, style.size, style.bold) <= max_width {
        return vec![word.to_string()];
    }
    let mut pieces = Vec::new();
    let mut piece = String::new();
    for c in word.chars() {
        piece.push(c);
        if text_width(&piece, style.size, style.bold) > max_width && piece.chars().count() > 1 {
            piece.pop();
            pieces.push(std::mem::take(&mut piece));
            piece.push(c);
        }
    }
    if !piece.is_empty() {
        pieces.push(piece);
    }
    pieces
}

/// Lays out sections onto pages
#[derive(Debug)]
pub struct LayoutEngine {
    pages: Vec<Page>,
    images: Vec<EmbeddedImage>,
    y: f32,
}

impl Default for LayoutEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl LayoutEngine {
    /// Start with one empty page
    pub fn new() -> Self {
        Self {
            pages: vec![Page::default()],
            images: Vec::new(),
            y: MARGIN,
        }
    }

    /// Current vertical cursor in mm
    pub fn cursor(&self) -> f32 {
        self.y
    }

    /// Move the cursor down by `mm`
    pub fn skip(&mut self, mm: f32) {
        self.y += mm;
    }

    /// Begin a new page
    pub fn new_page(&mut self) {
        self.pages.push(Page::default());
        self.y = MARGIN;
    }

    /// Begin a new page unless the current one is still blank
    pub fn fresh_page(&mut self) {
        if self.current_page().is_empty() {
            self.y = MARGIN;
        } else {
            self.new_page();
        }
    }

    /// Lay out a heading line (wrapped, left aligned) followed by `gap` mm
    pub fn heading(&mut self, text: &str, style: TextStyle, gap: f32) {
        let lines = wrap(&buffer_lines(text), CONTENT_WIDTH, style);
        self.place_lines(&lines, Alignment::Left, style);
        self.y += gap;
    }

    /// Lay out a section body
    ///
    /// # Parameters
    /// * `html` - Canonical section content
    /// * `align` - The section's stored alignment
    /// * `style` - Font used for the text runs
    pub fn body(&mut self, html: &str, align: Alignment, style: TextStyle) {
        let doc = RichDocument::parse(html);
        let mut buffer = String::new();
        for token in flatten(&doc) {
            match token {
                Token::Text(text) => buffer.push_str(&text),
                Token::BlockBreak => {
                    self.flush(&buffer, align, style);
                    buffer.clear();
                }
                Token::Image(node) => {
                    self.flush(&buffer, align, style);
                    buffer.clear();
                    self.image(&node);
                }
            }
        }
        self.flush(&buffer, align, style);
    }

    /// Lay out one buffered paragraph
    fn flush(&mut self, buffer: &str, align: Alignment, style: TextStyle) {
        let hard_lines = buffer_lines(buffer);
        if hard_lines.is_empty() {
            return;
        }
        let lines = wrap(&hard_lines, CONTENT_WIDTH, style);
        self.place_lines(&lines, align, style);
        self.y += paragraph_spacing(style.size);
    }

    /// Place wrapped lines, breaking pages as needed
    fn place_lines(&mut self, lines: &[WrappedLine], align: Alignment, style: TextStyle) {
        let height = line_height(style.size);
        let mut remaining = lines;

        while !remaining.is_empty() {
            let mut fit = ((BOTTOM_LIMIT - self.y) / height + 1e-4).floor().max(0.0) as usize;
            if fit == 0 {
                if self.y > MARGIN {
                    self.new_page();
                    continue;
                }
                // Nothing fits on an empty page; draw one line anyway
                fit = 1;
            }
            let (chunk, rest) = remaining.split_at(fit.min(remaining.len()));
            for line in chunk {
                self.place_line(line, align, style);
            }
            remaining = rest;
            if !remaining.is_empty() {
                self.new_page();
            }
        }
    }

    fn place_line(&mut self, line: &WrappedLine, align: Alignment, style: TextStyle) {
        let text = line.text();
        let width = text_width(&text, style.size, style.bold);
        let slack = (CONTENT_WIDTH - width).max(0.0);
        let gaps = line.words.len().saturating_sub(1);

        let (x, word_spacing) = match align {
            Alignment::Left => (MARGIN, 0.0),
            Alignment::Center => (MARGIN + slack / 2.0, 0.0),
            Alignment::Right => (MARGIN + slack, 0.0),
            Alignment::Justify if !line.hard_end && gaps > 0 => (MARGIN, slack / gaps as f32),
            Alignment::Justify => (MARGIN, 0.0),
        };

        if !text.is_empty() {
            let top = self.y;
            self.current_page_mut().ops.push(DrawOp::Text(TextLine {
                x,
                top,
                baseline: top + style.size * PT_TO_MM * ASCENT,
                text,
                style,
                word_spacing,
            }));
        }
        self.y += line_height(style.size);
    }

    /// Place an inline image; undecodable images are skipped
    pub fn image(&mut self, node: &ImageNode) {
        let image = match images::load(node) {
            Ok(image) => image,
            Err(e) => {
                log::warn!("Skipping image in export: {}", e);
                return;
            }
        };

        let (width, height) = image_box(node, &image);
        if self.y + height > BOTTOM_LIMIT && self.y > MARGIN {
            self.new_page();
        }

        let x = match node.alignment() {
            Some(ImageAlignment::Left) => MARGIN,
            Some(ImageAlignment::Right) => MARGIN + (CONTENT_WIDTH - width),
            Some(ImageAlignment::Center) | None => MARGIN + (CONTENT_WIDTH - width) / 2.0,
        };

        let index = self.images.len();
        self.images.push(image);
        let y = self.y;
        self.current_page_mut().ops.push(DrawOp::Image(PlacedImage {
            image: index,
            x,
            y,
            width,
            height,
        }));
        self.y += height + IMAGE_GAP;
    }

    /// Finish layout
    pub fn finish(self) -> LaidOutDocument {
        LaidOutDocument {
            pages: self.pages,
            images: self.images,
        }
    }

    fn current_page(&self) -> &Page {
        // The page list is never empty
        &self.pages[self.pages.len() - 1]
    }

    fn current_page_mut(&mut self) -> &mut Page {
        let last = self.pages.len() - 1;
        &mut self.pages[last]
    }
}

/// Rendered size in mm of an image node
///
/// Tier classes map to a fraction of the content width; an explicit pixel
/// width wins over tiers. The intrinsic aspect ratio is kept, and images
/// taller than the usable page height are scaled down to fit.
pub fn image_box(node: &ImageNode, image: &EmbeddedImage) -> (f32, f32) {
    let width = match (node.pixel_width(), node.size()) {
        (Some(px), _) => (px * PX_TO_MM).min(CONTENT_WIDTH),
        (None, Some(size)) => CONTENT_WIDTH * size.width_fraction(),
        (None, None) => CONTENT_WIDTH * ImageSize::Medium.width_fraction(),
    };
    let height = width * image.aspect_ratio();

    let usable = BOTTOM_LIMIT - MARGIN;
    if height > usable {
        (usable / image.aspect_ratio(), usable)
    } else {
        (width, height)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pdf::images::tests::png_bytes;
    use crate::rich_content::data_url;

    fn long_text(words: usize) -> String {
        (0..words).map(|i| format!("kata{}", i)).collect::<Vec<_>>().join(" ")
    }

    #[test]
    fn test_numeric_contract() {
        assert!((line_height(12.0) - 12.0 * 25.4 / 72.0 * 1.15).abs() < 1e-6);
        assert!((paragraph_spacing(12.0) - line_height(12.0) / 2.0).abs() < 1e-6);
        assert_eq!(CONTENT_WIDTH, 170.0);
    }

    #[test]
    fn test_wrap_respects_width_and_hard_breaks() {
        let lines = wrap_text(&long_text(200), CONTENT_WIDTH, TextStyle::BODY);
        assert!(lines.len() > 5);
        for line in &lines {
            assert!(text_width(line, BODY_SIZE, false) <= CONTENT_WIDTH + 1e-3);
        }
        assert_eq!(wrap_text("a\nb", CONTENT_WIDTH, TextStyle::BODY), vec!["a", "b"]);
    }

    #[test]
    fn test_long_word_is_split() {
        let word = "x".repeat(400);
        let lines = wrap_text(&word, CONTENT_WIDTH, TextStyle::BODY);
        assert!(lines.len() > 1);
        assert_eq!(lines.concat(), word);
    }

    #[test]
    fn test_pagination_never_crosses_bottom_margin() {
        let html = format!("<p>{}</p>", long_text(3000));
        let mut engine = LayoutEngine::new();
        engine.body(&html, Alignment::Left, TextStyle::BODY);
        let doc = engine.finish();
        assert!(doc.pages.len() > 1);
        for page in &doc.pages {
            for line in page.lines() {
                assert!(line.top >= MARGIN - 1e-3);
                assert!(line.bottom() <= BOTTOM_LIMIT + 1e-3, "line at {}", line.top);
            }
        }
    }

    #[test]
    fn test_justify_spares_last_line() {
        let html = format!("<p>{}</p>", long_text(60));
        let mut engine = LayoutEngine::new();
        engine.body(&html, Alignment::Justify, TextStyle::BODY);
        let doc = engine.finish();
        let lines: Vec<_> = doc.pages[0].lines().collect();
        assert!(lines.len() > 1);
        let (last, rest) = lines.split_last().unwrap();
        assert!(rest.iter().all(|l| l.word_spacing > 0.0));
        assert_eq!(last.word_spacing, 0.0);
    }

    #[test]
    fn test_alignment_offsets() {
        let mut engine = LayoutEngine::new();
        engine.body("<p>Halo</p>", Alignment::Right, TextStyle::BODY);
        engine.body("<p>Halo</p>", Alignment::Center, TextStyle::BODY);
        let doc = engine.finish();
        let lines: Vec<_> = doc.pages[0].lines().collect();
        let width = text_width("Halo", BODY_SIZE, false);
        assert!((lines[0].x - (MARGIN + CONTENT_WIDTH - width)).abs() < 1e-3);
        assert!((lines[1].x - (MARGIN + (CONTENT_WIDTH - width) / 2.0)).abs() < 1e-3);
    }

    #[test]
    fn test_image_sizes_and_aspect_ratio() {
        let src = data_url("image/png", &png_bytes(400, 300, 255));
        let html = format!(
            "<img src=\"{0}\" class=\"img-large\"/><img src=\"{0}\" class=\"img-small img-left\"/>",
            src
        );
        let mut engine = LayoutEngine::new();
        engine.body(&html, Alignment::Left, TextStyle::BODY);
        let doc = engine.finish();
        let placed: Vec<_> = doc.pages.iter().flat_map(|p| p.images()).collect();
        assert_eq!(placed.len(), 2);

        assert!((placed[0].width - CONTENT_WIDTH).abs() < 1e-3);
        assert!((placed[1].width - 0.3 * CONTENT_WIDTH).abs() < 1e-3);
        assert_eq!(placed[1].x, MARGIN);
        for image in placed {
            assert!((image.height / image.width - 0.75).abs() < 1e-4);
        }
    }

    #[test]
    fn test_overflowing_image_moves_to_next_page() {
        let src = data_url("image/png", &png_bytes(100, 100, 255));
        let html = format!(
            "<p>{}</p><img src=\"{}\" class=\"img-large\"/>",
            long_text(400),
            src
        );
        let mut engine = LayoutEngine::new();
        engine.body(&html, Alignment::Left, TextStyle::BODY);
        let doc = engine.finish();
        let last = doc.pages.last().unwrap();
        let image = last.images().next().expect("image on last page");
        assert_eq!(image.y, MARGIN);
        assert!(image.y + image.height <= BOTTOM_LIMIT);
    }

    #[test]
    fn test_tall_image_is_scaled_to_page() {
        let node = ImageNode::new(data_url("image/png", &png_bytes(10, 100, 255)));
        let image = images::load(&node).unwrap();
        let mut node = node;
        node.apply_size(ImageSize::Large);
        let (width, height) = image_box(&node, &image);
        assert!((height - (BOTTOM_LIMIT - MARGIN)).abs() < 1e-3);
        assert!((height / width - 10.0).abs() < 1e-3);
    }

    #[test]
    fn test_pixel_width_wins_and_is_capped() {
        let node_src = data_url("image/png", &png_bytes(20, 10, 255));
        let image = images::load(&ImageNode::new(node_src.clone())).unwrap();
        let mut node = ImageNode::inserted(node_src);
        node.set_pixel_width(96);
        let (width, _) = image_box(&node, &image);
        assert!((width - 25.4).abs() < 1e-3);
        node.set_pixel_width(5000);
        assert_eq!(image_box(&node, &image).0, CONTENT_WIDTH);
    }

    #[test]
    fn test_broken_image_is_skipped() {
        let mut engine = LayoutEngine::new();
        engine.body(
            "<p>a</p><img src=\"data:image/png;base64,AAAA\"/><p>b</p>",
            Alignment::Left,
            TextStyle::BODY,
        );
        let doc = engine.finish();
        assert_eq!(doc.images.len(), 0);
        assert_eq!(doc.pages[0].lines().count(), 2);
    }

    #[test]
    fn test_fresh_page_reuses_blank_page() {
        let mut engine = LayoutEngine::new();
        engine.fresh_page();
        engine.heading("Pendahuluan", TextStyle::HEADING, HEADING_GAP);
        engine.fresh_page();
        let doc = engine.finish();
        assert_eq!(doc.pages.len(), 2);
    }
}
