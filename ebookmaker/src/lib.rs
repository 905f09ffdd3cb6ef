//! ebookmaker - AI-assisted ebook authoring
//!
//! Builds an ebook section by section: a generation client writes the
//! title, introduction, chapters, summary and conclusion, the user edits
//! them through editable surfaces with inline images, and the result is
//! exported to a paginated A4 PDF.

#![deny(unsafe_code)]
#![cfg_attr(all(not(debug_assertions), not(test)), deny(clippy::all))]
#![cfg_attr(all(not(debug_assertions), not(test)), deny(clippy::pedantic))]
// Allow some pedantic lints that are too strict for this project
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::enum_variant_names)]
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_precision_loss)]
#![allow(clippy::cast_sign_loss)]

pub mod app_config;
pub mod document;
pub mod generation;
pub mod pdf;
pub mod rich_content;
pub mod session;
pub mod store;
pub mod surface;
