//! ebookmaker - AI-assisted ebook authoring tool
//!
//! A CLI for writing an ebook section by section with the Gemini API and
//! exporting it to PDF. State is kept in the configured data directory
//! between invocations.

#![deny(unsafe_code)]

mod cli;

use anyhow::{Context, Result};
use clap::Parser;
use cli::{Cli, Commands};
use ebookmaker::app_config::AppConfig;
use ebookmaker::document::{Document, FormattingUpdate, Section, SectionKey};
use ebookmaker::generation::{GeminiClient, GenerationClient, RetryingClient};
use ebookmaker::pdf::export_pdf;
use ebookmaker::rich_content::{strip_tags, RichDocument};
use ebookmaker::session::{EbookSession, SessionError};
use ebookmaker::store::StateStore;
use ebookmaker::surface::Caret;
use itertools::Itertools;
use std::path::PathBuf;

/// Main entry point for the ebookmaker CLI application
fn main() {
    if let Err(e) = run() {
        eprintln!("Error: {:?}", e);
        std::process::exit(1);
    }
}

/// Run the CLI application
fn run() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let config = AppConfig::load_or_default(&cli.config)
        .with_context(|| format!("Failed to load configuration from {}", cli.config.display()))?;
    let store = StateStore::new(&config.storage.data_dir);

    match &cli.command {
        Commands::ApiKey { key } => {
            store
                .save_credential(key)
                .context("Failed to save the API key")?;
            println!("✓ API key saved to {}", store.dir().display());
            return Ok(());
        }
        Commands::Reset => {
            store.reset().context("Failed to clear the saved ebook")?;
            println!("✓ Ebook cleared");
            return Ok(());
        }
        _ => {}
    }

    let document = store
        .load_document()
        .context("Failed to load the saved ebook")?
        .unwrap_or_default();
    let api_key = store.load_credential().context("Failed to load the API key")?;

    let client = GeminiClient::new(config.generation.gemini(), api_key)
        .context("Failed to create the generation client")?;
    let client = RetryingClient::new(client, config.generation.retry_policy());
    let session = EbookSession::new(document, client, config.editor.sync_policy());

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("Failed to start the async runtime")?;
    let changed = runtime.block_on(execute(&session, cli.command))?;

    if changed {
        store
            .save_document(&session.document())
            .context("Failed to save the ebook")?;
    }

    Ok(())
}

/// Initialize logging; `--verbose` forces info level
fn init_logging(verbose: bool) {
    let mut builder = env_logger::Builder::from_default_env();
    if verbose {
        builder.filter_level(log::LevelFilter::Info);
    }
    builder.init();
}

/// Turn a session error into an error carrying its user notice
fn notify(error: SessionError) -> anyhow::Error {
    let notice = error.notice();
    anyhow::Error::new(error).context(notice.message)
}

/// Execute one command against the session
///
/// # Returns
/// * `Ok(true)` - The document changed and must be saved
/// * `Ok(false)` - Nothing to save
async fn execute<C: GenerationClient>(session: &EbookSession<C>, command: Commands) -> Result<bool> {
    match command {
        Commands::Configure {
            topic,
            style,
            chapters,
            bio,
        } => {
            if let Some(topic) = topic {
                session.set_topic(&topic);
            }
            if let Some(style) = style {
                session.set_style(style.into());
            }
            if let Some(count) = chapters {
                let applied = session.set_chapter_count(count);
                if applied != count {
                    println!("Chapter count limited to {}", applied);
                }
            }
            if let Some(bio) = bio {
                session.set_author_bio(&bio);
            }
            print_outline(&session.document());
        }

        Commands::Generate { target } => {
            if target == "chapters" {
                let count = session.generate_chapter_titles().await.map_err(notify)?;
                println!("✓ Generated {} chapter title(s)", count);
            } else {
                let key = resolve_section(&session.document(), &target)?;
                session.section(key.clone()).generate().await.map_err(notify)?;
                println!("✓ Generated {}", key);
            }
        }

        Commands::Extend { chapter } => {
            let key = resolve_section(&session.document(), &chapter)?;
            session.section(key.clone()).extend().await.map_err(notify)?;
            println!("✓ Extended {}", key);
        }

        Commands::AddChapter { title, ai } => {
            let id = if ai {
                session.add_generated_chapter().await.map_err(notify)?
            } else {
                session.add_chapter(title.as_deref())
            };
            let doc = session.document();
            if let Some(index) = doc.chapter_index(&id) {
                println!("✓ Added {} [{}]", doc.chapters[index].heading(index), id);
            }
        }

        Commands::RemoveChapter { chapter } => {
            let key = resolve_section(&session.document(), &chapter)?;
            session.section(key.clone()).remove().map_err(notify)?;
            println!("✓ Removed {}", key);
        }

        Commands::InsertImage {
            section,
            file,
            paragraph,
        } => {
            let key = resolve_section(&session.document(), &section)?;
            if let Some(paragraph) = paragraph {
                let placed = session
                    .with_surface(&key, |surface| {
                        let caret = Caret::end_of_block(surface.tree(), paragraph.saturating_sub(1))?;
                        surface.set_caret(caret);
                        Some(())
                    })
                    .flatten();
                if placed.is_none() {
                    log::warn!("Paragraph {} not found in {}, appending", paragraph, key);
                }
            }
            let pending = session.section(key.clone()).prepare_image_insert().map_err(notify)?;
            let inserted = session.insert_image(&pending, &file).await.map_err(notify)?;
            if !inserted {
                anyhow::bail!("Section {} is no longer available", key);
            }
            println!("✓ Inserted {} into {}", file.display(), key);
        }

        Commands::Format {
            section,
            align,
            font,
            spacing,
        } => {
            let key = resolve_section(&session.document(), &section)?;
            session
                .section(key.clone())
                .update_formatting(FormattingUpdate {
                    align: align.map(Into::into),
                    font: font.map(Into::into),
                    spacing,
                })
                .map_err(notify)?;
            println!("✓ Updated formatting of {}", key);
        }

        Commands::Show => {
            print_outline(&session.document());
            return Ok(false);
        }

        Commands::Export { output } => {
            let output = output.unwrap_or_else(|| PathBuf::from("."));
            let path = export_pdf(&session.document(), &output)
                .with_context(|| format!("Failed to export PDF to {}", output.display()))?;
            println!("✓ Successfully wrote: {}", path.display());
            return Ok(false);
        }

        Commands::ApiKey { .. } | Commands::Reset => return Ok(false),
    }

    Ok(true)
}

/// Resolve a section argument: a fixed name, a chapter id or a 1-based chapter number
fn resolve_section(doc: &Document, arg: &str) -> Result<SectionKey> {
    if let Ok(number) = arg.parse::<usize>() {
        let chapter = number
            .checked_sub(1)
            .and_then(|index| doc.chapters.get(index))
            .with_context(|| format!("No chapter {} (the ebook has {})", number, doc.chapters.len()))?;
        return Ok(SectionKey::Chapter(chapter.id().to_string()));
    }

    let key = SectionKey::parse(arg);
    if let SectionKey::Chapter(id) = &key {
        if doc.chapter(id).is_none() {
            anyhow::bail!(
                "Unknown section '{}'. Use title, intro, summary, conclusion, author, or a chapter id or number",
                arg
            );
        }
    }
    Ok(key)
}

/// Print the document outline
fn print_outline(doc: &Document) {
    let title = strip_tags(&doc.title.content);
    println!("Title: {}", if title.is_empty() { "(none)" } else { &title });
    println!("Topic: {}", doc.topic);
    println!("Style: {}", doc.style);
    println!("Chapters to generate: {}", doc.chapter_count);

    print_section("intro", "Pendahuluan", &doc.introduction);
    for (index, chapter) in doc.chapters.iter().enumerate() {
        print_section(chapter.id(), &chapter.heading(index), &chapter.section);
    }
    print_section("summary", "Poin-Poin Penting", &doc.summary);
    print_section("conclusion", "Kata Penutup", &doc.conclusion);

    if !doc.author_bio.trim().is_empty() {
        println!("\nProfil Penulis: {}", doc.author_bio.trim());
    }
    if !doc.chapters.is_empty() {
        println!("\nOutline: {}", doc.chapter_titles().iter().join(" / "));
    }
}

fn print_section(id: &str, heading: &str, section: &Section) {
    let tree = RichDocument::parse(&section.content);
    let words = tree.text_content().split_whitespace().count();
    let images = tree.image_paths().len();
    println!("\n[{}] {}", id, heading);
    if section.is_empty() {
        println!("  (empty)");
    } else {
        println!("  {} word(s), {} image(s)", words, images);
    }
}
