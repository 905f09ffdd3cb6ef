//! Command-line interface definitions for ebookmaker

use ebookmaker::app_config::CONFIG_FILE_NAME;
use clap::{Parser, Subcommand, ValueEnum};
use ebookmaker::document::{Alignment, EbookStyle, FontFamily};
use std::path::PathBuf;

/// Writing style accepted on the command line
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum StyleArg {
    /// Formal and practical
    Profesional,
    /// Relaxed, conversational
    Santai,
    /// Serious and in depth
    Serius,
    /// Motivating
    Inspiratif,
    /// Academic
    Akademis,
}

impl From<StyleArg> for EbookStyle {
    fn from(style: StyleArg) -> Self {
        match style {
            StyleArg::Profesional => EbookStyle::Profesional,
            StyleArg::Santai => EbookStyle::Santai,
            StyleArg::Serius => EbookStyle::Serius,
            StyleArg::Inspiratif => EbookStyle::Inspiratif,
            StyleArg::Akademis => EbookStyle::Akademis,
        }
    }
}

/// Paragraph alignment accepted on the command line
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum AlignArg {
    Left,
    Center,
    Right,
    Justify,
}

impl From<AlignArg> for Alignment {
    fn from(align: AlignArg) -> Self {
        match align {
            AlignArg::Left => Alignment::Left,
            AlignArg::Center => Alignment::Center,
            AlignArg::Right => Alignment::Right,
            AlignArg::Justify => Alignment::Justify,
        }
    }
}

/// Font family accepted on the command line
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum FontArg {
    Sans,
    Serif,
    Mono,
}

impl From<FontArg> for FontFamily {
    fn from(font: FontArg) -> Self {
        match font {
            FontArg::Sans => FontFamily::Sans,
            FontArg::Serif => FontFamily::Serif,
            FontArg::Mono => FontFamily::Mono,
        }
    }
}

/// CLI structure for the ebookmaker application
#[derive(Parser)]
#[command(name = "ebookmaker")]
#[command(version)]
#[command(about = "AI-assisted ebook authoring tool", long_about = None)]
pub struct Cli {
    /// Configuration file
    #[arg(long, global = true, default_value = CONFIG_FILE_NAME)]
    pub config: PathBuf,

    /// Verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// The subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands for ebookmaker
#[derive(Subcommand)]
pub enum Commands {
    /// Set the topic, style, chapter count or author profile
    Configure {
        /// Topic or problem the ebook addresses
        #[arg(short, long)]
        topic: Option<String>,

        /// Writing style
        #[arg(short, long, value_enum)]
        style: Option<StyleArg>,

        /// Number of chapters to generate (1-10)
        #[arg(short, long)]
        chapters: Option<u32>,

        /// Author profile text
        #[arg(short, long)]
        bio: Option<String>,
    },

    /// Store the Gemini API key
    ApiKey {
        /// The key
        key: String,
    },

    /// Generate a section with AI
    Generate {
        /// title, intro, chapters, summary, conclusion, or a chapter id or number
        target: String,
    },

    /// Extend a chapter with more AI-written content
    Extend {
        /// Chapter id or number
        chapter: String,
    },

    /// Append a chapter
    AddChapter {
        /// Chapter title
        #[arg(short, long, conflicts_with = "ai")]
        title: Option<String>,

        /// Let AI pick the next chapter title
        #[arg(long)]
        ai: bool,
    },

    /// Remove a chapter
    RemoveChapter {
        /// Chapter id or number
        chapter: String,
    },

    /// Insert an image file into a section
    InsertImage {
        /// Section: title, intro, summary, conclusion, or a chapter id or number
        section: String,

        /// Image file
        file: PathBuf,

        /// Place the image at the end of this paragraph (1-based) instead of appending
        #[arg(short, long)]
        paragraph: Option<usize>,
    },

    /// Change the formatting of a section
    Format {
        /// Section: title, intro, summary, conclusion, author, or a chapter id or number
        section: String,

        /// Paragraph alignment
        #[arg(short, long, value_enum)]
        align: Option<AlignArg>,

        /// Font family
        #[arg(short, long, value_enum)]
        font: Option<FontArg>,

        /// Line spacing multiplier
        #[arg(short, long)]
        spacing: Option<f32>,
    },

    /// Print the current document outline
    Show,

    /// Export the ebook to PDF
    Export {
        /// Output file or directory (defaults to the title-named file in the current directory)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Discard the document and start over
    Reset,
}
