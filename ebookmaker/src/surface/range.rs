//! Caret positions and captured insertion ranges
//!
//! A caret addresses either a character offset inside a text node or a child
//! index inside a container (the fragment root for an empty path).

use crate::rich_content::{Node, NodePath, RichDocument};

/// One caret position inside a section's tree
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Caret {
    /// Path to a text node or a container element
    pub path: NodePath,

    /// Character offset (text node) or child index (container)
    pub offset: usize,
}

impl Caret {
    /// Create a caret
    pub fn new(path: NodePath, offset: usize) -> Self {
        Self { path, offset }
    }

    /// Caret at the very end of the fragment
    pub fn end_of(tree: &RichDocument) -> Self {
        Self::new(Vec::new(), tree.nodes.len())
    }

    /// Caret at the end of the `index`-th top-level block
    ///
    /// # Returns
    /// * `Some(Caret)` - Positioned after the block's last child
    /// * `None` - There is no such block
    pub fn end_of_block(tree: &RichDocument, index: usize) -> Option<Self> {
        let path = tree.block_paths().into_iter().nth(index)?;
        let len = tree.children(&path)?.len();
        Some(Self::new(path, len))
    }

    /// Whether the caret still resolves inside `tree`
    pub fn is_valid(&self, tree: &RichDocument) -> bool {
        match self.resolve(tree) {
            Some(Position::Text { len, .. }) => self.offset <= len,
            Some(Position::Container { len }) => self.offset <= len,
            None => false,
        }
    }

    pub(crate) fn resolve(&self, tree: &RichDocument) -> Option<Position> {
        if self.path.is_empty() {
            return Some(Position::Container {
                len: tree.nodes.len(),
            });
        }
        match tree.node(&self.path)? {
            Node::Text(text) => Some(Position::Text {
                len: text.chars().count(),
            }),
            Node::Element(element) => Some(Position::Container {
                len: element.children.len(),
            }),
            _ => None,
        }
    }
}

/// What a caret path points at
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Position {
    Text { len: usize },
    Container { len: usize },
}

/// A selection snapshot taken inside one section's surface
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CapturedRange {
    /// Section the range was captured in
    pub section_id: String,

    pub start: Caret,
    pub end: Caret,
}

impl CapturedRange {
    /// A collapsed range at one caret
    pub fn collapsed(section_id: impl Into<String>, caret: Caret) -> Self {
        Self {
            section_id: section_id.into(),
            start: caret.clone(),
            end: caret,
        }
    }

    /// Whether start and end coincide
    pub fn is_collapsed(&self) -> bool {
        self.start == self.end
    }

    /// Whether the range can be used on `tree` belonging to `section_id`
    pub fn is_valid_in(&self, section_id: &str, tree: &RichDocument) -> bool {
        self.section_id == section_id && self.start.is_valid(tree) && self.end.is_valid(tree)
    }
}

/// Remove the selected contents and return the collapsed caret
///
/// Text outside the range is kept. When the range ends inside a different
/// block than it starts in, the rest of the end block joins the start block.
pub(crate) fn delete_contents(tree: &mut RichDocument, range: &CapturedRange) -> Caret {
    let (start, end) = if boundary_key(&range.start) <= boundary_key(&range.end) {
        (&range.start, &range.end)
    } else {
        (&range.end, &range.start)
    };
    if start == end {
        return start.clone();
    }
    let (from, to) = (boundary_key(start), boundary_key(end));
    delete_between(&mut tree.nodes, Some(from.as_slice()), Some(to.as_slice()));
    start.clone()
}

/// Document-order key: the caret path followed by its offset
fn boundary_key(caret: &Caret) -> Vec<usize> {
    let mut key = caret.path.clone();
    key.push(caret.offset);
    key
}

/// Delete between two boundaries relative to `children`
///
/// A key of one index is the position before that child; a longer key points
/// inside the child. `None` stands for the start or the end of the list.
fn delete_between(children: &mut Vec<Node>, start: Option<&[usize]>, end: Option<&[usize]>) {
    let (first, start_inner) = split_boundary(start, 0);
    let (last, end_inner) = split_boundary(end, children.len());
    let first = first.min(children.len());
    let last = last.min(children.len());

    if let (Some(from), Some(to)) = (start_inner, end_inner) {
        if first == last {
            if let Some(child) = children.get_mut(first) {
                delete_inside(child, Some(from), Some(to));
            }
            return;
        }
    }

    let mut drain_from = first;
    if let Some(from) = start_inner {
        if let Some(child) = children.get_mut(first) {
            delete_inside(child, Some(from), None);
        }
        drain_from += 1;
    }
    if let Some(to) = end_inner {
        if let Some(child) = children.get_mut(last) {
            delete_inside(child, None, Some(to));
        }
    }
    if drain_from < last {
        children.drain(drain_from..last);
    }
    if start_inner.is_some() && end_inner.is_some() {
        join_with_next(children, first);
    }
}

fn split_boundary(key: Option<&[usize]>, default: usize) -> (usize, Option<&[usize]>) {
    match key {
        Some([index, rest @ ..]) => (*index, (!rest.is_empty()).then_some(rest)),
        _ => (default, None),
    }
}

fn delete_inside(node: &mut Node, from: Option<&[usize]>, to: Option<&[usize]>) {
    match node {
        Node::Text(text) => {
            let len = text.chars().count();
            let from = from.and_then(|key| key.first().copied()).unwrap_or(0).min(len);
            let to = to.and_then(|key| key.first().copied()).unwrap_or(len).min(len);
            if from < to {
                *text = text.chars().take(from).chain(text.chars().skip(to)).collect();
            }
        }
        Node::Element(element) => delete_between(&mut element.children, from, to),
        Node::LineBreak | Node::Image(_) => {}
    }
}

/// Pull the node after `index` into it: elements adopt its children, texts concatenate
fn join_with_next(children: &mut Vec<Node>, index: usize) {
    let joinable = matches!(
        (children.get(index), children.get(index + 1)),
        (Some(Node::Element(_)), Some(Node::Element(_))) | (Some(Node::Text(_)), Some(Node::Text(_)))
    );
    if !joinable {
        return;
    }
    let next = children.remove(index + 1);
    match (&mut children[index], next) {
        (Node::Element(element), Node::Element(next)) => {
            let seam = element.children.len();
            element.children.extend(next.children);
            if seam > 0
                && matches!(element.children.get(seam - 1), Some(Node::Text(_)))
                && matches!(element.children.get(seam), Some(Node::Text(_)))
            {
                join_with_next(&mut element.children, seam - 1);
            }
        }
        (Node::Text(text), Node::Text(next)) => text.push_str(&next),
        _ => {}
    }
}

/// Insert `node` at `caret`, splitting a text node when needed
///
/// # Returns
/// * `Some(Caret)` - The container position just after the inserted node
/// * `None` - The caret no longer resolves; nothing was inserted
pub(crate) fn insert_node(tree: &mut RichDocument, caret: &Caret, node: Node) -> Option<Caret> {
    match caret.resolve(tree)? {
        Position::Container { len } => {
            let index = caret.offset.min(len);
            tree.children_mut(&caret.path)?.insert(index, node);
            Some(Caret::new(caret.path.clone(), index + 1))
        }
        Position::Text { len } => {
            let (&index, parent) = caret.path.split_last()?;
            let parent = parent.to_vec();
            let offset = caret.offset.min(len);
            let siblings = tree.children_mut(&parent)?;
            let Node::Text(text) = &mut siblings[index] else {
                return None;
            };
            if offset == 0 {
                siblings.insert(index, node);
                return Some(Caret::new(parent, index + 1));
            }
            if offset == len {
                siblings.insert(index + 1, node);
                return Some(Caret::new(parent, index + 2));
            }
            let tail: String = text.chars().skip(offset).collect();
            *text = text.chars().take(offset).collect();
            siblings.insert(index + 1, node);
            siblings.insert(index + 2, Node::Text(tail));
            Some(Caret::new(parent, index + 2))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rich_content::ImageNode;

    fn tree() -> RichDocument {
        RichDocument::parse("<p>Halo dunia</p><p>Kedua</p>")
    }

    #[test]
    fn test_caret_validity() {
        let doc = tree();
        assert!(Caret::new(vec![0, 0], 10).is_valid(&doc));
        assert!(!Caret::new(vec![0, 0], 11).is_valid(&doc));
        assert!(!Caret::new(vec![5], 0).is_valid(&doc));
        assert!(Caret::end_of(&doc).is_valid(&doc));
        assert_eq!(Caret::end_of_block(&doc, 1), Some(Caret::new(vec![1], 1)));
        assert_eq!(Caret::end_of_block(&doc, 2), None);
    }

    #[test]
    fn test_range_validity_is_scoped_to_section() {
        let doc = tree();
        let range = CapturedRange::collapsed("ch-1", Caret::new(vec![0, 0], 4));
        assert!(range.is_valid_in("ch-1", &doc));
        assert!(!range.is_valid_in("ch-2", &doc));
    }

    #[test]
    fn test_insert_splits_text_node() {
        let mut doc = tree();
        let caret = insert_node(
            &mut doc,
            &Caret::new(vec![0, 0], 4),
            Node::Image(ImageNode::new("data:x")),
        )
        .unwrap();
        assert_eq!(caret, Caret::new(vec![0], 2));
        assert_eq!(
            doc.to_html(),
            "<p>Halo<img src=\"data:x\"/> dunia</p><p>Kedua</p>"
        );
    }

    #[test]
    fn test_insert_at_text_edges_does_not_leave_empty_text() {
        let mut doc = tree();
        insert_node(&mut doc, &Caret::new(vec![1, 0], 0), Node::LineBreak).unwrap();
        insert_node(&mut doc, &Caret::new(vec![0, 0], 10), Node::LineBreak).unwrap();
        assert_eq!(doc.to_html(), "<p>Halo dunia<br/></p><p><br/>Kedua</p>");
    }

    #[test]
    fn test_delete_contents_within_one_text_node() {
        let mut doc = tree();
        let range = CapturedRange {
            section_id: "intro".to_string(),
            start: Caret::new(vec![0, 0], 4),
            end: Caret::new(vec![0, 0], 10),
        };
        let caret = delete_contents(&mut doc, &range);
        assert_eq!(caret, Caret::new(vec![0, 0], 4));
        assert_eq!(doc.to_html(), "<p>Halo</p><p>Kedua</p>");
    }

    #[test]
    fn test_delete_contents_across_paragraphs_joins_them() {
        let mut doc = RichDocument::parse("<p>Satu dua</p><p>Tiga empat</p>");
        let range = CapturedRange {
            section_id: "intro".to_string(),
            start: Caret::new(vec![0, 0], 4),
            end: Caret::new(vec![1, 0], 4),
        };
        let caret = delete_contents(&mut doc, &range);
        assert_eq!(caret, Caret::new(vec![0, 0], 4));
        assert_eq!(doc.to_html(), "<p>Satu empat</p>");
    }

    #[test]
    fn test_delete_contents_backwards_selection_removes_middle_blocks() {
        let mut doc = RichDocument::parse("<p>Halo <b>dunia</b></p><p>Tengah</p><p>Akhir<br/>baris</p>");
        let range = CapturedRange {
            section_id: "intro".to_string(),
            start: Caret::new(vec![2, 2], 2),
            end: Caret::new(vec![0, 1, 0], 2),
        };
        let caret = delete_contents(&mut doc, &range);
        assert_eq!(caret, Caret::new(vec![0, 1, 0], 2));
        assert_eq!(doc.to_html(), "<p>Halo <b>du</b>ris</p>");
    }

    #[test]
    fn test_delete_contents_between_container_positions() {
        let mut doc = RichDocument::parse("<p>A</p><p>B</p><p>C</p>");
        let range = CapturedRange {
            section_id: "intro".to_string(),
            start: Caret::new(Vec::new(), 1),
            end: Caret::new(Vec::new(), 3),
        };
        assert_eq!(delete_contents(&mut doc, &range), Caret::new(Vec::new(), 1));
        assert_eq!(doc.to_html(), "<p>A</p>");
    }
}
