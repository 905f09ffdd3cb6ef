//! Serialization of a laid-out document with pdf-writer

use super::images;
use super::layout::{DrawOp, LaidOutDocument, PAGE_HEIGHT, PAGE_WIDTH, PT_TO_MM};
use super::metrics::encode_win_ansi;
use pdf_writer::{Content, Filter, Name, Pdf, Rect, Ref, Str, TextStr};
use std::collections::BTreeSet;

const FONT_REGULAR: Name<'static> = Name(b"F1");
const FONT_BOLD: Name<'static> = Name(b"F2");

fn to_pt(mm: f32) -> f32 {
    mm / PT_TO_MM
}

/// Serialize pages and images into PDF bytes
///
/// # Parameters
/// * `doc` - The laid-out document
/// * `title` - Plain-text document title for the info dictionary
///
/// # Returns
/// * `Vec<u8>` - A complete PDF file
pub fn write_pdf(doc: &LaidOutDocument, title: &str) -> Vec<u8> {
    let mut pdf = Pdf::new();
    let mut next_id = 1;
    let mut alloc = move || {
        let id = Ref::new(next_id);
        next_id += 1;
        id
    };

    let catalog_id = alloc();
    let pages_id = alloc();
    let info_id = alloc();
    let regular_id = alloc();
    let bold_id = alloc();

    pdf.type1_font(regular_id)
        .base_font(Name(b"Helvetica"))
        .encoding_predefined(Name(b"WinAnsiEncoding"));
    pdf.type1_font(bold_id)
        .base_font(Name(b"Helvetica-Bold"))
        .encoding_predefined(Name(b"WinAnsiEncoding"));

    let image_ids: Vec<Ref> = doc
        .images
        .iter()
        .map(|image| images::write_xobject(&mut pdf, &mut alloc, image))
        .collect();

    let mut page_ids = Vec::with_capacity(doc.pages.len());
    for page in &doc.pages {
        let page_id = alloc();
        let content_id = alloc();
        page_ids.push(page_id);

        let mut content = Content::new();
        let mut used_images = BTreeSet::new();
        for op in &page.ops {
            match op {
                DrawOp::Text(line) => {
                    let font = if line.style.bold { FONT_BOLD } else { FONT_REGULAR };
                    let bytes = encode_win_ansi(&line.text);
                    content
                        .begin_text()
                        .set_font(font, line.style.size)
                        .set_word_spacing(to_pt(line.word_spacing))
                        .next_line(to_pt(line.x), to_pt(PAGE_HEIGHT - line.baseline))
                        .show(Str(&bytes))
                        .end_text();
                }
                DrawOp::Image(placed) => {
                    used_images.insert(placed.image);
                    content.save_state();
                    content.transform([
                        to_pt(placed.width),
                        0.0,
                        0.0,
                        to_pt(placed.height),
                        to_pt(placed.x),
                        to_pt(PAGE_HEIGHT - placed.y - placed.height),
                    ]);
                    content.x_object(Name(image_name(placed.image).as_bytes()));
                    content.restore_state();
                }
            }
        }

        let raw = content.finish();
        let compressed = miniz_oxide::deflate::compress_to_vec_zlib(raw.as_slice(), 6);
        pdf.stream(content_id, &compressed).filter(Filter::FlateDecode);

        let mut page_writer = pdf.page(page_id);
        page_writer
            .media_box(Rect::new(0.0, 0.0, to_pt(PAGE_WIDTH), to_pt(PAGE_HEIGHT)))
            .parent(pages_id)
            .contents(content_id);
        let mut resources = page_writer.resources();
        resources
            .fonts()
            .pair(FONT_REGULAR, regular_id)
            .pair(FONT_BOLD, bold_id);
        if !used_images.is_empty() {
            let mut x_objects = resources.x_objects();
            for index in used_images {
                x_objects.pair(Name(image_name(index).as_bytes()), image_ids[index]);
            }
        }
    }

    pdf.catalog(catalog_id).pages(pages_id);
    pdf.pages(pages_id)
        .count(page_ids.len() as i32)
        .kids(page_ids);
    pdf.document_info(info_id)
        .title(TextStr(title))
        .creator(TextStr("ebookmaker"));

    pdf.finish()
}

fn image_name(index: usize) -> String {
    format!("Im{}", index + 1)
}
