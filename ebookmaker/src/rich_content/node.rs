//! Node tree for section content

use super::image::ImageNode;

/// Child-index path from the fragment root to a node
///
/// `[2, 0]` is the first child of the third top-level node.
pub type NodePath = Vec<usize>;

/// A node in the rich content tree
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    /// Plain text (entities already decoded)
    Text(String),

    /// An explicit line break (`<br>`)
    LineBreak,

    /// An inline image with its size/alignment classes
    Image(ImageNode),

    /// Any other element; paragraphs and divs are the common case
    Element(Element),
}

impl Node {
    /// Create a text node
    pub fn text(text: impl Into<String>) -> Self {
        Node::Text(text.into())
    }

    /// Create a `<p>` element holding the given children
    pub fn paragraph(children: Vec<Node>) -> Self {
        Node::Element(Element {
            tag: "p".to_string(),
            attributes: Vec::new(),
            children,
        })
    }

    /// Whether this node is a block-level container
    pub fn is_block(&self) -> bool {
        matches!(self, Node::Element(element) if element.block_kind().is_some())
    }

    /// Concatenated text of this node and its descendants
    ///
    /// Line breaks contribute a newline; images contribute nothing.
    pub fn text_content(&self) -> String {
        let mut out = String::new();
        self.collect_text(&mut out);
        out
    }

    fn collect_text(&self, out: &mut String) {
        match self {
            Node::Text(text) => out.push_str(text),
            Node::LineBreak => out.push('\n'),
            Node::Image(_) => {}
            Node::Element(element) => {
                for child in &element.children {
                    child.collect_text(out);
                }
            }
        }
    }
}

/// Block-level container kinds recognised by the editor and the exporter
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockKind {
    Paragraph,
    Division,
    Heading(u8),
    ListItem,
    List,
    BlockQuote,
}

impl BlockKind {
    /// Classify a lowercase tag name
    pub fn from_tag(tag: &str) -> Option<Self> {
        match tag {
            "p" => Some(BlockKind::Paragraph),
            "div" => Some(BlockKind::Division),
            "li" => Some(BlockKind::ListItem),
            "ul" | "ol" => Some(BlockKind::List),
            "blockquote" => Some(BlockKind::BlockQuote),
            _ => {
                let level = tag.strip_prefix('h')?.parse::<u8>().ok()?;
                (1..=6).contains(&level).then_some(BlockKind::Heading(level))
            }
        }
    }
}

/// A generic element with attributes and children
#[derive(Debug, Clone, PartialEq)]
pub struct Element {
    /// Lowercase tag name
    pub tag: String,

    /// Attributes in source order (values already entity-decoded)
    pub attributes: Vec<(String, String)>,

    /// Child nodes
    pub children: Vec<Node>,
}

impl Element {
    /// Create an element with no attributes or children
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            attributes: Vec::new(),
            children: Vec::new(),
        }
    }

    /// Look up an attribute value by name
    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    /// Block kind of this element, if it is a block container
    pub fn block_kind(&self) -> Option<BlockKind> {
        BlockKind::from_tag(&self.tag)
    }
}

/// The parsed content of one section
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RichDocument {
    /// Top-level nodes of the fragment
    pub nodes: Vec<Node>,
}

impl RichDocument {
    /// Create an empty document
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a fragment, degrading to its plain text if it cannot be tokenized
    ///
    /// # Parameters
    /// * `html` - The canonical HTML fragment of a section
    ///
    /// # Returns
    /// * `RichDocument` - The parsed tree (never fails)
    pub fn parse(html: &str) -> Self {
        match Self::try_parse(html) {
            Ok(doc) => doc,
            Err(e) => {
                log::warn!("Falling back to plain text for malformed content: {}", e);
                let text = super::text::strip_tags(html);
                let mut doc = Self::new();
                if !text.is_empty() {
                    doc.nodes.push(Node::Text(text));
                }
                doc
            }
        }
    }

    /// Parse a fragment, reporting tokenizer errors
    pub fn try_parse(html: &str) -> Result<Self, super::ParseError> {
        let nodes = super::parser::parse_fragment(html)?;
        Ok(Self { nodes })
    }

    /// Serialize the tree back to an HTML fragment
    pub fn to_html(&self) -> String {
        let mut out = String::new();
        super::serializer::write_nodes(&mut out, &self.nodes);
        out
    }

    /// Whether the fragment has no nodes at all
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Plain text of the whole fragment
    pub fn text_content(&self) -> String {
        self.nodes.iter().map(Node::text_content).collect()
    }

    /// Append a node at the end of the fragment
    pub fn push(&mut self, node: Node) {
        self.nodes.push(node);
    }

    /// Resolve a path to a node
    pub fn node(&self, path: &[usize]) -> Option<&Node> {
        let (&last, parent) = path.split_last()?;
        self.children(parent)?.get(last)
    }

    /// Resolve a path to a mutable node
    pub fn node_mut(&mut self, path: &[usize]) -> Option<&mut Node> {
        let (&last, parent) = path.split_last()?;
        self.children_mut(parent)?.get_mut(last)
    }

    /// Children of the node at `parent` (the root list for an empty path)
    pub fn children(&self, parent: &[usize]) -> Option<&Vec<Node>> {
        let mut children = &self.nodes;
        for &index in parent {
            match children.get(index)? {
                Node::Element(element) => children = &element.children,
                _ => return None,
            }
        }
        Some(children)
    }

    /// Mutable children of the node at `parent`
    pub fn children_mut(&mut self, parent: &[usize]) -> Option<&mut Vec<Node>> {
        let mut children = &mut self.nodes;
        for &index in parent {
            match children.get_mut(index)? {
                Node::Element(element) => children = &mut element.children,
                _ => return None,
            }
        }
        Some(children)
    }

    /// Remove and return the node at `path`
    pub fn remove(&mut self, path: &[usize]) -> Option<Node> {
        let (&last, parent) = path.split_last()?;
        let children = self.children_mut(parent)?;
        (last < children.len()).then(|| children.remove(last))
    }

    /// Mutable access to the image at `path`
    pub fn image_mut(&mut self, path: &[usize]) -> Option<&mut ImageNode> {
        match self.node_mut(path)? {
            Node::Image(image) => Some(image),
            _ => None,
        }
    }

    /// The image at `path`
    pub fn image(&self, path: &[usize]) -> Option<&ImageNode> {
        match self.node(path)? {
            Node::Image(image) => Some(image),
            _ => None,
        }
    }

    /// Paths of every image in document order
    pub fn image_paths(&self) -> Vec<NodePath> {
        let mut paths = Vec::new();
        let mut prefix = Vec::new();
        collect_image_paths(&self.nodes, &mut prefix, &mut paths);
        paths
    }

    /// Paths of the top-level block containers in document order
    pub fn block_paths(&self) -> Vec<NodePath> {
        self.nodes
            .iter()
            .enumerate()
            .filter(|(_, node)| node.is_block())
            .map(|(index, _)| vec![index])
            .collect()
    }
}

fn collect_image_paths(nodes: &[Node], prefix: &mut Vec<usize>, out: &mut Vec<NodePath>) {
    for (index, node) in nodes.iter().enumerate() {
        prefix.push(index);
        match node {
            Node::Image(_) => out.push(prefix.clone()),
            Node::Element(element) => collect_image_paths(&element.children, prefix, out),
            _ => {}
        }
        prefix.pop();
    }
}
