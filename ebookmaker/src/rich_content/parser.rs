//! Tolerant HTML fragment parser
//!
//! Built on quick-xml's event reader with end-name checking disabled so that
//! the markup produced by an editing region (`<br>`, `<img ...>` without a
//! closing slash, stray end tags) still yields a tree.

use super::error::ParseError;
use super::image::ImageNode;
use super::node::{Element, Node};
use super::text::{decode_entities, resolve_entity};
use quick_xml::events::{BytesStart, Event};
use quick_xml::reader::Reader;

/// Elements that never have children
const VOID_TAGS: &[&str] = &["br", "img", "hr", "wbr", "input", "meta", "link"];

/// Parse an HTML fragment into top-level nodes
///
/// # Parameters
/// * `html` - The fragment to parse
///
/// # Returns
/// * `Ok(Vec<Node>)` - Parsed top-level nodes; unclosed elements are closed at the end
/// * `Err(ParseError)` - The tokenizer rejected the input
pub(super) fn parse_fragment(html: &str) -> Result<Vec<Node>, ParseError> {
    let mut reader = Reader::from_str(html);
    {
        let config = reader.config_mut();
        config.trim_text(false);
        config.check_end_names = false;
        config.allow_unmatched_ends = true;
    }

    let mut builder = TreeBuilder::default();

    loop {
        let event = reader.read_event().map_err(|e| ParseError::Malformed {
            position: reader.buffer_position() as u64,
            message: e.to_string(),
        })?;

        match event {
            Event::Start(start) => {
                let tag = tag_name(&reader, &start);
                if VOID_TAGS.contains(&tag.as_str()) {
                    builder.push_void(&reader, tag, &start);
                } else {
                    builder.open(Element {
                        tag,
                        attributes: attributes(&reader, &start),
                        children: Vec::new(),
                    });
                }
            }
            Event::Empty(start) => {
                let tag = tag_name(&reader, &start);
                if VOID_TAGS.contains(&tag.as_str()) {
                    builder.push_void(&reader, tag, &start);
                } else {
                    builder.push(Node::Element(Element {
                        tag,
                        attributes: attributes(&reader, &start),
                        children: Vec::new(),
                    }));
                }
            }
            Event::End(end) => {
                let tag = reader
                    .decoder()
                    .decode(end.name().as_ref())
                    .map(|name| name.to_ascii_lowercase())
                    .unwrap_or_default();
                builder.close(&tag);
            }
            Event::Text(text) => {
                let decoded = text.decode().map_err(|e| ParseError::Malformed {
                    position: reader.buffer_position() as u64,
                    message: e.to_string(),
                })?;
                builder.push_text(&decoded);
            }
            Event::CData(data) => {
                let decoded = reader.decoder().decode(&data).unwrap_or_default();
                builder.push_text(&decoded);
            }
            Event::GeneralRef(reference) => {
                let name = reference.decode().map_err(|e| ParseError::Malformed {
                    position: reader.buffer_position() as u64,
                    message: e.to_string(),
                })?;
                builder.push_text(&resolve_entity(&name));
            }
            Event::Eof => break,
            // Comments, declarations, processing instructions and doctypes
            _ => {}
        }
    }

    Ok(builder.finish())
}

/// Stack of open elements plus the finished top-level nodes
#[derive(Default)]
struct TreeBuilder {
    open: Vec<Element>,
    root: Vec<Node>,
}

impl TreeBuilder {
    fn current(&mut self) -> &mut Vec<Node> {
        match self.open.last_mut() {
            Some(element) => &mut element.children,
            None => &mut self.root,
        }
    }

    fn push(&mut self, node: Node) {
        self.current().push(node);
    }

    fn push_text(&mut self, text: &str) {
        if text.is_empty() {
            return;
        }
        let children = self.current();
        if let Some(Node::Text(previous)) = children.last_mut() {
            previous.push_str(text);
        } else {
            children.push(Node::Text(text.to_string()));
        }
    }

    fn push_void(&mut self, reader: &Reader<&[u8]>, tag: String, start: &BytesStart<'_>) {
        match tag.as_str() {
            "br" => self.push(Node::LineBreak),
            "img" => self.push(Node::Image(image_node(attributes(reader, start)))),
            _ => self.push(Node::Element(Element {
                tag,
                attributes: attributes(reader, start),
                children: Vec::new(),
            })),
        }
    }

    fn open(&mut self, element: Element) {
        self.open.push(element);
    }

    /// Close the innermost open element named `tag`; unmatched ends are ignored
    fn close(&mut self, tag: &str) {
        if !self.open.iter().any(|element| element.tag == tag) {
            return;
        }
        while let Some(element) = self.open.pop() {
            let matched = element.tag == tag;
            self.push(Node::Element(element));
            if matched {
                break;
            }
        }
    }

    fn finish(mut self) -> Vec<Node> {
        while let Some(element) = self.open.pop() {
            self.push(Node::Element(element));
        }
        self.root
    }
}

fn tag_name(reader: &Reader<&[u8]>, start: &BytesStart<'_>) -> String {
    reader
        .decoder()
        .decode(start.name().as_ref())
        .map(|name| name.to_ascii_lowercase())
        .unwrap_or_default()
}

fn attributes(reader: &Reader<&[u8]>, start: &BytesStart<'_>) -> Vec<(String, String)> {
    start
        .html_attributes()
        .flatten()
        .filter_map(|attr| {
            let key = reader.decoder().decode(attr.key.as_ref()).ok()?;
            let value = reader.decoder().decode(&attr.value).ok()?;
            Some((key.to_ascii_lowercase(), decode_entities(&value)))
        })
        .collect()
}

fn image_node(attributes: Vec<(String, String)>) -> ImageNode {
    let mut image = ImageNode::new(String::new());
    for (key, value) in attributes {
        match key.as_str() {
            "src" => image.src = value,
            "class" => image.classes = value.split_whitespace().map(str::to_string).collect(),
            "style" => image.style = Some(value),
            _ => image.attributes.push((key, value)),
        }
    }
    image
}
