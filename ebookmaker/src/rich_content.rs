//! Rich content model for one editable section
//!
//! A section's canonical content is an HTML fragment. This module turns that
//! fragment into a small node tree that can be edited in memory and
//! serialized back, and holds the text helpers shared by the editing
//! surface, the session and the PDF exporter.

// Submodules
mod error;
mod image;
mod node;
mod parser;
mod serializer;
mod text;

// Re-export public types
pub use error::{ImageDataError, ParseError};
pub use image::{
    data_url, ImageAlignment, ImageNode, ImageSize, INSERTED_IMAGE_CLASSES, SELECTED_CLASS,
};
pub use node::{BlockKind, Element, Node, NodePath, RichDocument};
pub use text::{
    clean_chapter_title, decode_entities, escape_attribute, escape_text, format_text, strip_tags,
    PARAGRAPH_CLASS,
};
