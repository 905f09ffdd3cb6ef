//! Text helpers shared by the session, the surface and the exporter

use itertools::Itertools;
use regex::{Captures, Regex};
use std::sync::OnceLock;

/// Class put on every paragraph produced from generated text
pub const PARAGRAPH_CLASS: &str = "mb-4";

/// Blank-line separator between generated paragraphs
fn blank_line() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\n[ \t]*\n").expect("valid regex"))
}

/// Leading "Bab N:" / "Chapter N." label produced by the generator
fn chapter_prefix() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?i)^(?:bab|chapter)\s+\d+\s*[:.\-–]\s*").expect("valid regex")
    })
}

fn tag() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"<[^>]*>").expect("valid regex"))
}

fn entity() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"&(#[0-9]+|#[xX][0-9a-fA-F]+|[A-Za-z][A-Za-z0-9]*);").expect("valid regex"))
}

/// Wrap generated plain text into paragraph markup
///
/// Each blank-line-delimited block becomes one `<p class="mb-4">`; single
/// newlines inside a block become `<br/>`. Whitespace-only blocks are
/// dropped and the text is escaped so the result is always well formed.
///
/// # Parameters
/// * `text` - Plain text as returned by the generator
///
/// # Returns
/// * `String` - Paragraph markup (empty for blank input)
pub fn format_text(text: &str) -> String {
    let normalized = text.replace("\r\n", "\n");
    blank_line()
        .split(&normalized)
        .map(|block| block.trim_matches('\n'))
        .filter(|block| !block.trim().is_empty())
        .map(|block| {
            let body = block.split('\n').map(escape_text).join("<br/>");
            format!("<p class=\"{}\">{}</p>", PARAGRAPH_CLASS, body)
        })
        .collect()
}

/// Strip a generator-provided "Bab N:" label from a chapter title
///
/// Also drops markdown emphasis stars and double quotes. Applying it to an
/// already-clean title returns the title unchanged.
pub fn clean_chapter_title(raw: &str) -> String {
    let mut title = raw.replace(['*', '"'], "").trim().to_string();
    while let Some(found) = chapter_prefix().find(&title) {
        title = title[found.end()..].trim().to_string();
    }
    title
}

/// Plain text of an HTML fragment (tags removed, entities decoded, trimmed)
pub fn strip_tags(html: &str) -> String {
    decode_entities(&tag().replace_all(html, "")).trim().to_string()
}

/// Decode HTML character references; unknown names are kept verbatim
pub fn decode_entities(text: &str) -> String {
    if !text.contains('&') {
        return text.to_string();
    }
    entity()
        .replace_all(text, |caps: &Captures| resolve_entity(&caps[1]))
        .into_owned()
}

/// Resolve an entity name (without `&` and `;`)
pub(super) fn resolve_entity(name: &str) -> String {
    if let Some(number) = name.strip_prefix('#') {
        let code = match number.strip_prefix(['x', 'X']) {
            Some(hex) => u32::from_str_radix(hex, 16).ok(),
            None => number.parse::<u32>().ok(),
        };
        return code
            .and_then(char::from_u32)
            .map(String::from)
            .unwrap_or_default();
    }
    let resolved = match name {
        "amp" => "&",
        "lt" => "<",
        "gt" => ">",
        "quot" => "\"",
        "apos" => "'",
        "nbsp" => "\u{a0}",
        "ndash" => "\u{2013}",
        "mdash" => "\u{2014}",
        "hellip" => "\u{2026}",
        "lsquo" => "\u{2018}",
        "rsquo" => "\u{2019}",
        "ldquo" => "\u{201c}",
        "rdquo" => "\u{201d}",
        "laquo" => "\u{ab}",
        "raquo" => "\u{bb}",
        "copy" => "\u{a9}",
        "reg" => "\u{ae}",
        "bull" => "\u{2022}",
        _ => return format!("&{};", name),
    };
    resolved.to_string()
}

/// Escape text content the way a live editing region serializes it
pub fn escape_text(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '\u{a0}' => out.push_str("&nbsp;"),
            _ => out.push(c),
        }
    }
    out
}

/// Escape an attribute value for double-quoted output
pub fn escape_attribute(value: &str) -> String {
    value
        .replace('&', "&amp;")
        .replace('"', "&quot;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}
