use async_trait::async_trait;
use ebookmaker::document::{Document, EbookStyle, SectionKey};
use ebookmaker::generation::{GenerationClient, GenerationError, GenerationKind, GenerationRequest};
use ebookmaker::pdf::layout::{BOTTOM_LIMIT, TITLE_SIZE};
use ebookmaker::pdf::{export_pdf, layout_document, render_pdf};
use ebookmaker::session::EbookSession;
use ebookmaker::store::StateStore;
use ebookmaker::surface::{Caret, FocusTarget, SyncPolicy};
use std::io::Cursor;
use std::sync::Mutex;

/// Answers every request with canned text and records what was asked
#[derive(Default)]
struct ScriptedClient {
    requests: Mutex<Vec<GenerationRequest>>,
}

impl ScriptedClient {
    fn requests(&self) -> Vec<GenerationRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl GenerationClient for ScriptedClient {
    async fn generate_text(&self, request: &GenerationRequest) -> Result<String, GenerationError> {
        self.requests.lock().unwrap().push(request.clone());
        let text = match request.kind {
            GenerationKind::Title => "**Rahasia Fotografi Pemula**".to_string(),
            GenerationKind::Introduction => {
                "Fotografi adalah seni melukis dengan cahaya.\n\nEbook ini memandu kamu dari nol.".to_string()
            }
            GenerationKind::ChapterContent => format!(
                "Di bab ini kita membahas {}.\nMulai dari dasar.",
                request.chapter_title.clone().unwrap_or_default()
            ),
            GenerationKind::Extend => "Latihan tambahan untuk dicoba.".to_string(),
            GenerationKind::Summary => "Kenali kameramu.\n\nBermainlah dengan cahaya.".to_string(),
            GenerationKind::Conclusion => "Teruslah memotret setiap hari.".to_string(),
            GenerationKind::NextChapterTitle => "Bab 3: Komposisi".to_string(),
            GenerationKind::ChapterTitles => unreachable!("lists go through generate_list"),
        };
        Ok(text)
    }

    async fn generate_list(&self, request: &GenerationRequest) -> Result<Vec<String>, GenerationError> {
        self.requests.lock().unwrap().push(request.clone());
        let titles = ["Bab 1: Mengenal Kamera", "Bab 2: Cahaya", "Bab 3: Komposisi"];
        Ok(titles
            .iter()
            .take(request.count.unwrap_or(3) as usize)
            .map(|t| t.to_string())
            .collect())
    }
}

fn png(width: u32, height: u32) -> Vec<u8> {
    let image = image::RgbImage::from_pixel(width, height, image::Rgb([200, 120, 40]));
    let mut bytes = Cursor::new(Vec::new());
    image
        .write_to(&mut bytes, image::ImageFormat::Png)
        .unwrap();
    bytes.into_inner()
}

fn first_line(doc: &ebookmaker::pdf::LaidOutDocument, page: usize) -> String {
    doc.pages[page].lines().next().unwrap().text.clone()
}

#[tokio::test]
async fn test_belajar_fotografi_end_to_end() {
    let session = EbookSession::new(Document::new(), ScriptedClient::default(), SyncPolicy::default());
    session.set_topic("Belajar Fotografi");
    session.set_style(EbookStyle::Santai);
    session.set_chapter_count(2);
    session.set_author_bio("Fotografer lepas dan pengajar.");

    session.section(SectionKey::Title).generate().await.unwrap();
    session.section(SectionKey::Introduction).generate().await.unwrap();
    assert_eq!(session.generate_chapter_titles().await.unwrap(), 2);
    for chapter in session.document().chapters {
        let key = SectionKey::Chapter(chapter.id().to_string());
        session.section(key).generate().await.unwrap();
    }
    session.section(SectionKey::Summary).generate().await.unwrap();
    session.section(SectionKey::Conclusion).generate().await.unwrap();

    let doc = session.document();
    assert_eq!(doc.title.content, "Rahasia Fotografi Pemula");
    assert_eq!(
        doc.introduction.content,
        "<p class=\"mb-4\">Fotografi adalah seni melukis dengan cahaya.</p>\
         <p class=\"mb-4\">Ebook ini memandu kamu dari nol.</p>"
    );
    assert_eq!(doc.chapter_titles(), vec!["Mengenal Kamera", "Cahaya"]);
    assert!(doc.chapters[1].section.content.contains("membahas Cahaya.<br/>Mulai"));

    let requests = session.client().requests();
    assert_eq!(requests.len(), 7);
    assert!(requests.iter().all(|r| r.style == EbookStyle::Santai));
    assert!(requests.iter().all(|r| r.topic == "Belajar Fotografi"));
    assert_eq!(requests[2].count, Some(2));

    let laid_out = layout_document(&doc);
    assert_eq!(laid_out.pages.len(), 7);
    let title = laid_out.pages[0].lines().next().unwrap();
    assert_eq!(title.text, "Rahasia Fotografi Pemula");
    assert!(title.style.bold);
    assert_eq!(title.style.size, TITLE_SIZE);

    let headings: Vec<String> = (1..7).map(|page| first_line(&laid_out, page)).collect();
    assert_eq!(
        headings,
        vec![
            "Pendahuluan",
            "Bab 1: Mengenal Kamera",
            "Bab 2: Cahaya",
            "Poin-Poin Penting",
            "Kata Penutup",
            "Profil Penulis",
        ]
    );

    let dir = tempfile::tempdir().unwrap();
    let path = export_pdf(&doc, dir.path()).unwrap();
    assert_eq!(path.file_name().unwrap(), "Rahasia Fotografi Pemula.pdf");
    let bytes = std::fs::read(&path).unwrap();
    assert!(bytes.starts_with(b"%PDF-"));
    assert_eq!(bytes, render_pdf(&doc));

    let store = StateStore::new(dir.path().join("state"));
    store.save_document(&doc).unwrap();
    assert_eq!(store.load_document().unwrap(), Some(doc));
}

#[tokio::test]
async fn test_chapter_editing_flow() {
    let session = EbookSession::new(Document::new(), ScriptedClient::default(), SyncPolicy::default());
    session.set_topic("Belajar Fotografi");

    let manual = session.add_chapter(None);
    let generated = session.add_generated_chapter().await.unwrap();
    let key = SectionKey::Chapter(generated.clone());
    session.section(key.clone()).generate().await.unwrap();
    session.section(key.clone()).extend().await.unwrap();

    let doc = session.document();
    assert_eq!(doc.chapter_titles(), vec!["Judul Bab Baru", "Komposisi"]);
    let content = &doc.chapter(&generated).unwrap().section.content;
    assert!(content.contains("<br/><br/><p class=\"mb-4\">Latihan tambahan untuk dicoba.</p>"));

    // Place the caret at the end of the first paragraph and insert an image there
    session.with_surface(&key, |surface| {
        surface.focus();
        let caret = Caret::end_of_block(surface.tree(), 0).unwrap();
        surface.set_caret(caret);
    });
    let pending = session.section(key.clone()).prepare_image_insert().unwrap();
    assert!(session.insert_image_data(&pending, "image/png", &png(40, 20)));

    let content = session.document().chapter(&generated).unwrap().section.content.clone();
    let image_at = content.find("<img").unwrap();
    assert!(image_at < content.find("Latihan").unwrap());

    // Typing on the focused surface commits at once; blur to the toolbar does not
    assert!(session.edit_surface(&key, |surface| Some(surface.insert_text(" Lihat gambar."))));
    assert!(!session.blur(&key, FocusTarget::OwnToolbar));

    session.section(SectionKey::Chapter(manual)).remove().unwrap();
    let doc = session.document();
    assert_eq!(doc.chapters.len(), 1);

    let laid_out = layout_document(&doc);
    assert_eq!(laid_out.images.len(), 1);
    for page in &laid_out.pages {
        assert!(page.lines().all(|line| line.bottom() <= BOTTOM_LIMIT + 1e-3));
    }
    let placed = laid_out.pages.iter().flat_map(|page| page.images()).next().unwrap();
    // Medium tier keeps the 2:1 aspect ratio
    assert!((placed.width - 102.0).abs() < 1e-3);
    assert!((placed.height - 51.0).abs() < 1e-3);
}
