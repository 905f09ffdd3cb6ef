//! HTML serialization of the node tree

use super::image::ImageNode;
use super::node::{Element, Node};
use super::text::{escape_attribute, escape_text};

/// Append the markup for `nodes` to `out`
pub(super) fn write_nodes(out: &mut String, nodes: &[Node]) {
    for node in nodes {
        write_node(out, node);
    }
}

fn write_node(out: &mut String, node: &Node) {
    match node {
        Node::Text(text) => out.push_str(&escape_text(text)),
        Node::LineBreak => out.push_str("<br/>"),
        Node::Image(image) => write_image(out, image),
        Node::Element(element) => write_element(out, element),
    }
}

fn write_element(out: &mut String, element: &Element) {
    out.push('<');
    out.push_str(&element.tag);
    write_attributes(out, &element.attributes);
    out.push('>');
    write_nodes(out, &element.children);
    out.push_str("</");
    out.push_str(&element.tag);
    out.push('>');
}

fn write_image(out: &mut String, image: &ImageNode) {
    out.push_str("<img src=\"");
    out.push_str(&escape_attribute(&image.src));
    out.push('"');
    if !image.classes.is_empty() {
        out.push_str(" class=\"");
        out.push_str(&escape_attribute(&image.classes.join(" ")));
        out.push('"');
    }
    if let Some(style) = &image.style {
        out.push_str(" style=\"");
        out.push_str(&escape_attribute(style));
        out.push('"');
    }
    write_attributes(out, &image.attributes);
    out.push_str("/>");
}

fn write_attributes(out: &mut String, attributes: &[(String, String)]) {
    for (key, value) in attributes {
        out.push(' ');
        out.push_str(key);
        out.push_str("=\"");
        out.push_str(&escape_attribute(value));
        out.push('"');
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rich_content::{ImageSize, RichDocument};

    #[test]
    fn test_serialize_escapes_text_and_attributes() {
        let mut element = Element::new("p");
        element.attributes.push(("title".to_string(), "a \"b\"".to_string()));
        element.children.push(Node::text("x < y\u{a0}z"));
        let mut out = String::new();
        write_nodes(&mut out, &[Node::Element(element)]);
        assert_eq!(out, "<p title=\"a &quot;b&quot;\">x &lt; y&nbsp;z</p>");
    }

    #[test]
    fn test_serialize_image_after_class_change() {
        let mut image = ImageNode::inserted("data:image/png;base64,AA==");
        image.apply_size(ImageSize::Small);
        let doc = RichDocument {
            nodes: vec![Node::Image(image)],
        };
        let html = doc.to_html();
        assert!(html.starts_with("<img src=\"data:image/png;base64,AA==\" class=\""));
        assert!(html.contains("img-small"));
        assert!(!html.contains("img-medium"));
        assert!(html.ends_with("/>"));
    }
}
