//! Flattening of a section tree into layout tokens

use crate::rich_content::{ImageNode, Node, RichDocument};

/// One item of the linear layout stream
#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    /// Inline text; explicit line breaks appear as `\n`
    Text(String),
    /// A standalone image
    Image(ImageNode),
    /// End of a block container
    BlockBreak,
}

/// Flatten a section tree into text, image and block-break tokens
///
/// Whitespace inside text nodes collapses the way a browser renders it.
/// Block containers emit a break after their children; inline elements are
/// transparent.
pub fn flatten(doc: &RichDocument) -> Vec<Token> {
    let mut tokens = Vec::new();
    for node in &doc.nodes {
        flatten_node(node, &mut tokens);
    }
    tokens
}

fn flatten_node(node: &Node, tokens: &mut Vec<Token>) {
    match node {
        Node::Text(text) => {
            let collapsed = collapse_whitespace(text);
            if !collapsed.is_empty() {
                push_text(tokens, &collapsed);
            }
        }
        Node::LineBreak => push_text(tokens, "\n"),
        Node::Image(image) => tokens.push(Token::Image(image.clone())),
        Node::Element(element) => {
            for child in &element.children {
                flatten_node(child, tokens);
            }
            if element.block_kind().is_some() {
                tokens.push(Token::BlockBreak);
            }
        }
    }
}

fn push_text(tokens: &mut Vec<Token>, text: &str) {
    if let Some(Token::Text(previous)) = tokens.last_mut() {
        previous.push_str(text);
    } else {
        tokens.push(Token::Text(text.to_string()));
    }
}

/// Collapse runs of ASCII whitespace into one space (non-breaking spaces kept)
fn collapse_whitespace(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut in_space = false;
    for c in text.chars() {
        if c.is_ascii_whitespace() {
            if !in_space {
                out.push(' ');
            }
            in_space = true;
        } else {
            out.push(c);
            in_space = false;
        }
    }
    out
}

/// Normalize a flushed text buffer into its hard lines
///
/// Leading and trailing blank space is dropped, each line is trimmed of
/// spaces, and interior empty lines are kept. A blank buffer yields nothing.
pub fn buffer_lines(buffer: &str) -> Vec<String> {
    let trimmed = buffer.trim_matches(|c: char| c.is_ascii_whitespace());
    if trimmed.is_empty() {
        return Vec::new();
    }
    trimmed
        .split('\n')
        .map(|line| line.trim_matches(' ').to_string())
        .collect()
}

/// The paragraphs an export would lay out for `html`, as plain text
///
/// Each flushed buffer becomes one paragraph with its hard lines joined by
/// `\n`; images are skipped.
pub fn plain_paragraphs(html: &str) -> Vec<String> {
    let mut paragraphs = Vec::new();
    let mut buffer = String::new();
    let flush = |buffer: &mut String, paragraphs: &mut Vec<String>| {
        let lines = buffer_lines(buffer);
        if !lines.is_empty() {
            paragraphs.push(lines.join("\n"));
        }
        buffer.clear();
    };
    for token in flatten(&RichDocument::parse(html)) {
        match token {
            Token::Text(text) => buffer.push_str(&text),
            Token::Image(_) | Token::BlockBreak => flush(&mut buffer, &mut paragraphs),
        }
    }
    flush(&mut buffer, &mut paragraphs);
    paragraphs
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rich_content::format_text;

    #[test]
    fn test_flatten_paragraphs_breaks_and_images() {
        let doc = RichDocument::parse(
            "<p class=\"mb-4\">Satu<br/>Dua</p><img src=\"data:x\"/><div>Tiga <b>tebal</b></div>",
        );
        let tokens = flatten(&doc);
        assert_eq!(tokens.len(), 5);
        assert_eq!(tokens[0], Token::Text("Satu\nDua".to_string()));
        assert_eq!(tokens[1], Token::BlockBreak);
        assert!(matches!(tokens[2], Token::Image(_)));
        assert_eq!(tokens[3], Token::Text("Tiga tebal".to_string()));
        assert_eq!(tokens[4], Token::BlockBreak);
    }

    #[test]
    fn test_whitespace_collapses() {
        let doc = RichDocument::parse("<p>  a \n\t b\u{a0}c </p>");
        assert_eq!(flatten(&doc)[0], Token::Text(" a b\u{a0}c ".to_string()));
        assert_eq!(buffer_lines(" a b\u{a0}c "), vec!["a b\u{a0}c"]);
        assert!(buffer_lines(" \n ").is_empty());
    }

    #[test]
    fn test_wrapping_is_idempotent_through_flatten() {
        let text = "Paragraf satu\nbaris dua\n\nParagraf dua\n\nTiga";
        let html = format_text(text);
        let paragraphs = plain_paragraphs(&html);
        assert_eq!(
            paragraphs,
            vec!["Paragraf satu\nbaris dua", "Paragraf dua", "Tiga"]
        );
        assert_eq!(format_text(&paragraphs.join("\n\n")), html);
    }
}
