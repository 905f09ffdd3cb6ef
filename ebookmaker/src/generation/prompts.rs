//! Prompt text sent to the generation service

use super::{GenerationKind, GenerationRequest};
use crate::document::EbookStyle;

const BASE_INSTRUCTION: &str = "Anda adalah seorang penulis ahli dan mentor yang handal dalam memecahkan masalah. \
Tugas Anda adalah membuat konten ebook yang sangat praktis, actionable, dan mudah dipahami. \
Fokus pada langkah-langkah konkret, contoh nyata, dan tips yang bisa langsung diterapkan. \
Gunakan bahasa Indonesia yang jelas dan memotivasi. \
JANGAN gunakan format Markdown Heading (#) atau garis pemisah. Gunakan paragraf pendek.";

/// System instruction for a writing style
pub fn system_instruction(style: EbookStyle) -> String {
    let tone = match style {
        EbookStyle::Santai => "Gunakan gaya santai, akrab, menyapa pembaca dengan 'kamu'.",
        EbookStyle::Profesional => {
            "Gunakan gaya profesional, terstruktur, menyapa pembaca dengan 'Anda'."
        }
        EbookStyle::Serius => "Gunakan gaya serius, mendalam, dan formal.",
        EbookStyle::Inspiratif => "Gunakan gaya inspiratif, penuh semangat, dan menggugah.",
        EbookStyle::Akademis => "Gunakan gaya akademis, formal, dan analitis.",
    };
    format!("{} {}", BASE_INSTRUCTION, tone)
}

/// User prompt for a request
pub fn user_prompt(request: &GenerationRequest) -> String {
    let topic = &request.topic;
    let chapter_title = request.chapter_title.as_deref().unwrap_or_default();
    match request.kind {
        GenerationKind::Title => format!(
            "Buatkan satu judul menarik untuk ebook tentang masalah: \"{}\". \
             Jawab HANYA dengan teks judulnya saja tanpa tanda kutip.",
            topic
        ),
        GenerationKind::Introduction => format!(
            "Buatkan sebuah teks Pendahuluan (minimal 3 paragraf) untuk ebook yang membahas: \"{}\".",
            topic
        ),
        GenerationKind::ChapterTitles => format!(
            "Buatkan daftar {} judul bab untuk ebook masalah: \"{}\".",
            request.count.unwrap_or(crate::document::DEFAULT_CHAPTER_COUNT),
            topic
        ),
        GenerationKind::NextChapterTitle => format!(
            "Topik Ebook: \"{}\".\nDaftar Bab yang sudah ada: {}.\n\n\
             Tugas: Buatkan SATU judul bab selanjutnya yang logis untuk melanjutkan pembahasan, \
             relevan dengan topik, dan PASTI BERBEDA dari judul yang sudah ada.\n\
             Jawab HANYA teks judulnya saja tanpa penomoran atau tanda kutip.",
            topic,
            serde_json::to_string(&request.existing_titles).unwrap_or_else(|_| "[]".to_string())
        ),
        GenerationKind::ChapterContent => format!(
            "Tuliskan isi lengkap bab \"{}\" untuk ebook masalah \"{}\". \
             Berikan konten yang edukatif dan praktis.",
            chapter_title, topic
        ),
        GenerationKind::Extend => format!(
            "Lanjutkan dan perpanjang konten bab \"{}\" berikut ini agar lebih detail: \"{}\". \
             Fokus pada konteks masalah: \"{}\".",
            chapter_title,
            request.existing_content.as_deref().unwrap_or_default(),
            topic
        ),
        GenerationKind::Summary => format!(
            "Buatkan ringkasan poin-poin kunci yang bisa diambil dari ebook tentang: \"{}\".",
            topic
        ),
        GenerationKind::Conclusion => format!(
            "Buatkan sebuah kata penutup yang kuat dan memotivasi untuk ebook tentang: \"{}\".",
            topic
        ),
    }
}
