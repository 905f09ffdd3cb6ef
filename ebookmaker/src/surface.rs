//! Editable surface controller
//!
//! An [`EditableSurface`] is the live editing region of one section. It holds
//! its own node tree, decides when a canonical content change may overwrite
//! that tree, turns user input into new canonical markup, and owns the
//! ephemeral state of the section: caret, captured range and image overlay.

pub mod overlay;
pub mod range;

pub use overlay::{ImageOverlay, LayoutProbe, OverlayGeometry, OverlayState, Rect, ToolbarPosition};
pub use range::{CapturedRange, Caret};

use crate::rich_content::{ImageAlignment, ImageNode, ImageSize, Node, NodePath, RichDocument};
use range::Position;
use std::collections::HashMap;

/// Default length delta above which a focused surface accepts an overwrite
pub const DEFAULT_BULK_REPLACE_THRESHOLD: usize = 50;

/// When a canonical change may clobber a focused surface
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SyncPolicy {
    /// Character-length delta treated as a bulk replacement
    pub bulk_replace_threshold: usize,
}

impl Default for SyncPolicy {
    fn default() -> Self {
        Self {
            bulk_replace_threshold: DEFAULT_BULK_REPLACE_THRESHOLD,
        }
    }
}

/// Result of pushing canonical content into a surface
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncOutcome {
    /// New section identity; surface rebuilt and ephemeral state reset
    Remounted,
    /// Surface already shows this content
    Unchanged,
    /// A drag-resize is in progress; the surface was left alone
    Deferred,
    /// Surface replaced by the canonical content
    Overwritten,
    /// Focused incremental edit; the surface keeps its own state
    Preserved,
}

/// Where focus went when the surface lost it
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FocusTarget {
    /// A control of the section's own floating toolbar
    OwnToolbar,
    /// Anywhere else
    Elsewhere,
}

/// What a pointer click landed on
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClickTarget {
    /// An inline image
    Image(NodePath),
    /// Text, placing the caret
    Text(Caret),
}

/// The live editing region of one section
#[derive(Debug, Clone)]
pub struct EditableSurface {
    section_id: String,
    tree: RichDocument,
    policy: SyncPolicy,
    focused: bool,
    scroll_top: f32,
    last_range: Option<CapturedRange>,
    overlay: ImageOverlay,
}

impl EditableSurface {
    /// Mount a surface for a section from its canonical content
    pub fn mount(section_id: impl Into<String>, canonical: &str, policy: SyncPolicy) -> Self {
        Self {
            section_id: section_id.into(),
            tree: RichDocument::parse(canonical),
            policy,
            focused: false,
            scroll_top: 0.0,
            last_range: None,
            overlay: ImageOverlay::new(),
        }
    }

    pub fn section_id(&self) -> &str {
        &self.section_id
    }

    pub fn tree(&self) -> &RichDocument {
        &self.tree
    }

    /// Current serialized markup of the surface
    pub fn html(&self) -> String {
        self.tree.to_html()
    }

    pub fn is_focused(&self) -> bool {
        self.focused
    }

    pub fn is_resizing(&self) -> bool {
        self.overlay.is_resizing()
    }

    pub fn scroll_top(&self) -> f32 {
        self.scroll_top
    }

    pub fn overlay(&self) -> &ImageOverlay {
        &self.overlay
    }

    /// Most recent valid caret/selection, if any
    pub fn last_range(&self) -> Option<&CapturedRange> {
        self.last_range.as_ref()
    }

    /// Push canonical content into the surface
    ///
    /// # Parameters
    /// * `section_id` - Identity of the section now bound to this surface
    /// * `canonical` - The section's canonical HTML
    ///
    /// # Returns
    /// * `SyncOutcome` - What happened to the live tree
    pub fn sync_from_canonical(&mut self, section_id: &str, canonical: &str) -> SyncOutcome {
        if section_id != self.section_id {
            log::debug!("Remounting surface {} as {}", self.section_id, section_id);
            *self = Self::mount(section_id, canonical, self.policy);
            return SyncOutcome::Remounted;
        }

        let current = self.html();
        if canonical == current {
            return SyncOutcome::Unchanged;
        }
        if self.is_resizing() {
            log::debug!("Deferring sync of {} while resizing", self.section_id);
            return SyncOutcome::Deferred;
        }

        let delta = canonical.chars().count().abs_diff(current.chars().count());
        if !self.focused || delta > self.policy.bulk_replace_threshold || canonical.is_empty() {
            log::debug!(
                "Overwriting surface {} (focused: {}, delta: {})",
                self.section_id,
                self.focused,
                delta
            );
            self.tree = RichDocument::parse(canonical);
            self.last_range = None;
            self.overlay.clear();
            SyncOutcome::Overwritten
        } else {
            SyncOutcome::Preserved
        }
    }

    /// The surface gained focus
    pub fn focus(&mut self) {
        self.focused = true;
    }

    /// The surface lost focus
    ///
    /// # Returns
    /// * `Some(html)` - Serialized markup to propagate when it differs from `canonical`
    /// * `None` - Focus moved to the section's toolbar, a resize is running, or nothing changed
    pub fn blur(&mut self, target: FocusTarget, canonical: &str) -> Option<String> {
        if target == FocusTarget::OwnToolbar {
            return None;
        }
        self.focused = false;
        if self.is_resizing() {
            return None;
        }
        let html = self.html();
        (html != canonical).then_some(html)
    }

    /// Record the caret/selection after a click, key or mouse-up
    ///
    /// Ranges that do not resolve inside this surface are ignored.
    pub fn track_selection(&mut self, range: CapturedRange) {
        if range.is_valid_in(&self.section_id, &self.tree) {
            self.last_range = Some(range);
        }
    }

    /// Place a collapsed caret
    pub fn set_caret(&mut self, caret: Caret) {
        self.track_selection(CapturedRange::collapsed(self.section_id.clone(), caret));
    }

    /// Snapshot the current range for a later image insertion
    pub fn capture_range(&self) -> Option<CapturedRange> {
        self.last_range.clone()
    }

    /// Handle a pointer click
    ///
    /// A click on an image selects it instead of placing the caret; any other
    /// click places the caret and drops the image selection.
    pub fn click(&mut self, target: ClickTarget, probe: &dyn LayoutProbe) -> bool {
        match target {
            ClickTarget::Image(path) => self.overlay.select(&mut self.tree, path, probe),
            ClickTarget::Text(caret) => {
                self.set_caret(caret);
                self.overlay.clear();
                false
            }
        }
    }

    /// Scroll the surface and keep the overlay on its image
    pub fn scroll_to(&mut self, scroll_top: f32, probe: &dyn LayoutProbe) {
        self.scroll_top = scroll_top;
        self.overlay.refresh(&self.tree, probe);
    }

    /// Window resize or other layout change
    pub fn viewport_changed(&mut self, probe: &dyn LayoutProbe) {
        self.overlay.refresh(&self.tree, probe);
    }

    /// Type text at the caret, replacing any selection
    ///
    /// # Returns
    /// * `String` - The new canonical markup
    pub fn insert_text(&mut self, text: &str) -> String {
        self.overlay.clear();
        let caret = self.take_caret();
        let caret = match caret.resolve(&self.tree) {
            Some(Position::Text { len }) => {
                let offset = caret.offset.min(len);
                if let Some(Node::Text(existing)) = self.tree.node_mut(&caret.path) {
                    let byte = char_to_byte(existing, offset);
                    existing.insert_str(byte, text);
                }
                Caret::new(caret.path, offset + text.chars().count())
            }
            _ => self.insert_text_node(&caret, text),
        };
        self.set_caret(caret);
        self.html()
    }

    /// Insert an explicit line break at the caret
    pub fn insert_line_break(&mut self) -> String {
        self.overlay.clear();
        let caret = self.take_caret();
        if let Some(after) = range::insert_node(&mut self.tree, &caret, Node::LineBreak) {
            self.set_caret(after);
        }
        self.html()
    }

    /// Delete the selection, or the character or node before the caret
    pub fn delete_backward(&mut self) -> String {
        self.overlay.clear();
        let had_selection = self.last_range.as_ref().is_some_and(|r| !r.is_collapsed());
        let caret = self.take_caret();
        if had_selection {
            self.set_caret(caret);
            return self.html();
        }

        let caret = match caret.resolve(&self.tree) {
            Some(Position::Text { len }) if caret.offset > 0 => {
                if len > 1 {
                    if let Some(Node::Text(text)) = self.tree.node_mut(&caret.path) {
                        let byte = char_to_byte(text, caret.offset.min(len) - 1);
                        text.remove(byte);
                    }
                    Caret::new(caret.path, caret.offset.min(len) - 1)
                } else {
                    self.tree.remove(&caret.path);
                    container_caret(caret.path)
                }
            }
            Some(Position::Text { .. }) => {
                let before = container_caret(caret.path.clone());
                if before.offset == 0 {
                    caret
                } else {
                    self.delete_before(before.path, before.offset)
                }
            }
            Some(Position::Container { .. }) if caret.offset > 0 => {
                self.delete_before(caret.path, caret.offset)
            }
            _ => caret,
        };
        self.set_caret(caret);
        self.html()
    }

    /// Delete one step back from the container position `(parent, index)`
    ///
    /// Breaks, images and empty elements go whole; a text loses its last
    /// character; a non-empty element is entered at its end.
    fn delete_before(&mut self, parent: NodePath, index: usize) -> Caret {
        if index == 0 {
            return Caret::new(parent, 0);
        }
        let mut child = parent.clone();
        child.push(index - 1);
        let nested = match self.tree.node_mut(&child) {
            Some(Node::Text(text)) if text.chars().count() > 1 => {
                text.pop();
                let len = text.chars().count();
                return Caret::new(child, len);
            }
            Some(Node::Text(text)) if text.is_empty() => {
                self.tree.remove(&child);
                return self.delete_before(parent, index - 1);
            }
            Some(Node::Element(element)) if !element.children.is_empty() => element.children.len(),
            Some(_) => {
                self.tree.remove(&child);
                return Caret::new(parent, index - 1);
            }
            None => return Caret::new(parent, index),
        };
        self.delete_before(child, nested)
    }

    /// Splice an image at a captured range, or append it at the end
    ///
    /// The range is used only if it was captured in this surface and still
    /// resolves in the current tree.
    pub fn insert_image(&mut self, image: ImageNode, range: Option<&CapturedRange>) -> String {
        let usable = range.filter(|r| r.is_valid_in(&self.section_id, &self.tree));
        let placed = usable.and_then(|range| {
            let caret = range::delete_contents(&mut self.tree, range);
            range::insert_node(&mut self.tree, &caret, Node::Image(image.clone()))
        });
        match placed {
            Some(after) => self.set_caret(after),
            None => {
                if range.is_some() {
                    log::warn!(
                        "Captured range no longer valid in {}, appending image",
                        self.section_id
                    );
                }
                self.tree.push(Node::Image(image));
            }
        }
        self.html()
    }

    /// Click on the image at `path`
    pub fn select_image(&mut self, path: NodePath, probe: &dyn LayoutProbe) -> bool {
        self.click(ClickTarget::Image(path), probe)
    }

    /// Apply a size tier to the selected image; returns markup to commit
    pub fn apply_image_size(&mut self, size: ImageSize, probe: &dyn LayoutProbe) -> Option<String> {
        self.overlay
            .apply_size(&mut self.tree, size, probe)
            .then(|| self.html())
    }

    /// Apply an alignment to the selected image; returns markup to commit
    pub fn apply_image_alignment(
        &mut self,
        alignment: ImageAlignment,
        probe: &dyn LayoutProbe,
    ) -> Option<String> {
        self.overlay
            .apply_alignment(&mut self.tree, alignment, probe)
            .then(|| self.html())
    }

    /// Delete the selected image; returns markup to commit
    pub fn delete_selected_image(&mut self) -> Option<String> {
        if !self.overlay.delete(&mut self.tree) {
            return None;
        }
        self.last_range = self
            .last_range
            .take()
            .filter(|r| r.is_valid_in(&self.section_id, &self.tree));
        Some(self.html())
    }

    /// Pointer-down on a resize handle
    pub fn begin_resize(&mut self, pointer_x: f32, probe: &dyn LayoutProbe) -> bool {
        self.overlay.begin_resize(&mut self.tree, pointer_x, probe)
    }

    /// Pointer-move during a resize
    pub fn drag_resize(&mut self, pointer_x: f32, probe: &dyn LayoutProbe) -> Option<u32> {
        self.overlay.drag(&mut self.tree, pointer_x, probe)
    }

    /// Pointer-up; returns the markup to commit when a resize ended
    pub fn end_resize(&mut self) -> Option<String> {
        self.overlay.end_resize().then(|| self.html())
    }

    /// Take the caret for an edit, collapsing and deleting any selection
    fn take_caret(&mut self) -> Caret {
        match self.last_range.take() {
            Some(range) if range.is_valid_in(&self.section_id, &self.tree) => {
                range::delete_contents(&mut self.tree, &range)
            }
            _ => self.default_caret(),
        }
    }

    /// End of the last top-level block, or end of the fragment
    fn default_caret(&self) -> Caret {
        match self.tree.nodes.last() {
            Some(Node::Element(element)) if element.block_kind().is_some() => Caret::new(
                vec![self.tree.nodes.len() - 1],
                element.children.len(),
            ),
            _ => Caret::end_of(&self.tree),
        }
    }

    /// Insert text at a container caret, merging into a neighbouring text node
    fn insert_text_node(&mut self, caret: &Caret, text: &str) -> Caret {
        let Some(children) = self.tree.children_mut(&caret.path) else {
            self.tree.push(Node::text(text));
            return Caret::end_of(&self.tree);
        };
        let index = caret.offset.min(children.len());
        if index > 0 {
            if let Some(Node::Text(previous)) = children.get_mut(index - 1) {
                previous.push_str(text);
                let mut path = caret.path.clone();
                path.push(index - 1);
                return Caret::new(path, previous.chars().count());
            }
        }
        children.insert(index, Node::text(text));
        let mut path = caret.path.clone();
        path.push(index);
        Caret::new(path, text.chars().count())
    }
}

/// Container position of the node at `path`
fn container_caret(mut path: NodePath) -> Caret {
    let index = path.pop().unwrap_or_default();
    Caret::new(path, index)
}

fn char_to_byte(text: &str, offset: usize) -> usize {
    text.char_indices()
        .nth(offset)
        .map(|(byte, _)| byte)
        .unwrap_or(text.len())
}

/// The mounted surfaces, keyed by section id
#[derive(Debug, Default)]
pub struct SurfaceRegistry {
    surfaces: HashMap<String, EditableSurface>,
    policy: SyncPolicy,
}

impl SurfaceRegistry {
    pub fn new(policy: SyncPolicy) -> Self {
        Self {
            surfaces: HashMap::new(),
            policy,
        }
    }

    /// Mount (or re-sync) the surface of a section
    pub fn mount(&mut self, section_id: &str, canonical: &str) -> &mut EditableSurface {
        let policy = self.policy;
        let surface = self
            .surfaces
            .entry(section_id.to_string())
            .or_insert_with(|| EditableSurface::mount(section_id, canonical, policy));
        surface.sync_from_canonical(section_id, canonical);
        surface
    }

    /// Unmount a surface, dropping its ephemeral state
    pub fn unmount(&mut self, section_id: &str) -> Option<EditableSurface> {
        self.surfaces.remove(section_id)
    }

    /// Unmount every surface whose section id fails `keep`
    pub fn retain(&mut self, keep: impl Fn(&str) -> bool) {
        self.surfaces.retain(|id, _| keep(id));
    }

    pub fn get(&self, section_id: &str) -> Option<&EditableSurface> {
        self.surfaces.get(section_id)
    }

    pub fn get_mut(&mut self, section_id: &str) -> Option<&mut EditableSurface> {
        self.surfaces.get_mut(section_id)
    }

    pub fn len(&self) -> usize {
        self.surfaces.len()
    }

    pub fn is_empty(&self) -> bool {
        self.surfaces.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct NoLayout;

    impl LayoutProbe for NoLayout {
        fn surface_rect(&self) -> Rect {
            Rect::default()
        }

        fn scroll_top(&self) -> f32 {
            0.0
        }

        fn image_rect(&self, _path: &[usize]) -> Option<Rect> {
            Some(Rect::new(0.0, 0.0, 200.0, 100.0))
        }
    }

    fn surface(html: &str) -> EditableSurface {
        EditableSurface::mount("ch-1", html, SyncPolicy::default())
    }

    #[test]
    fn test_identity_change_remounts() {
        let mut s = surface("<p>Satu</p>");
        s.focus();
        s.set_caret(Caret::new(vec![0, 0], 2));
        assert_eq!(s.sync_from_canonical("ch-2", "<p>Dua</p>"), SyncOutcome::Remounted);
        assert_eq!(s.section_id(), "ch-2");
        assert_eq!(s.html(), "<p>Dua</p>");
        assert!(!s.is_focused());
        assert!(s.last_range().is_none());
    }

    #[test]
    fn test_focused_small_delta_is_preserved() {
        let mut s = surface("<p>Halo</p>");
        s.focus();
        assert_eq!(s.sync_from_canonical("ch-1", "<p>Halo!</p>"), SyncOutcome::Preserved);
        assert_eq!(s.html(), "<p>Halo</p>");
    }

    #[test]
    fn test_empty_content_always_overwrites() {
        let mut s = surface("<p>Halo</p>");
        s.focus();
        assert_eq!(s.sync_from_canonical("ch-1", ""), SyncOutcome::Overwritten);
        assert_eq!(s.html(), "");
    }

    #[test]
    fn test_resizing_defers_sync() {
        let mut s = surface("<p>a</p><img src=\"data:x\" class=\"img-medium\"/>");
        assert!(s.select_image(vec![1], &NoLayout));
        assert!(s.begin_resize(10.0, &NoLayout));
        assert_eq!(s.sync_from_canonical("ch-1", ""), SyncOutcome::Deferred);
        assert_eq!(s.drag_resize(60.0, &NoLayout), Some(250));
        let committed = s.end_resize().unwrap();
        assert!(committed.contains("width: 250px"));
        assert!(!committed.contains("img-medium"));
    }

    #[test]
    fn test_input_propagates_markup() {
        let mut s = surface("<p>Halo</p>");
        s.focus();
        s.set_caret(Caret::new(vec![0, 0], 4));
        assert_eq!(s.insert_text(" dunia"), "<p>Halo dunia</p>");
        assert_eq!(s.insert_line_break(), "<p>Halo dunia<br/></p>");
        assert_eq!(s.insert_text("x"), "<p>Halo dunia<br/>x</p>");
        assert_eq!(s.delete_backward(), "<p>Halo dunia<br/></p>");
        assert_eq!(s.delete_backward(), "<p>Halo dunia</p>");
        assert_eq!(s.delete_backward(), "<p>Halo duni</p>");
    }

    #[test]
    fn test_typing_without_caret_goes_to_last_block() {
        let mut s = surface("<p>A</p><p>B</p>");
        assert_eq!(s.insert_text("C"), "<p>A</p><p>BC</p>");
    }

    #[test]
    fn test_selection_is_replaced_by_typing() {
        let mut s = surface("<p>Halo dunia</p>");
        s.track_selection(CapturedRange {
            section_id: "ch-1".to_string(),
            start: Caret::new(vec![0, 0], 5),
            end: Caret::new(vec![0, 0], 10),
        });
        assert_eq!(s.insert_text("kawan"), "<p>Halo kawan</p>");
    }

    #[test]
    fn test_typing_over_selection_across_paragraphs() {
        let mut s = surface("<p>Satu dua</p><p>Tiga empat</p>");
        s.track_selection(CapturedRange {
            section_id: "ch-1".to_string(),
            start: Caret::new(vec![0, 0], 4),
            end: Caret::new(vec![1, 0], 4),
        });
        assert_eq!(s.insert_text("X"), "<p>SatuX empat</p>");
    }

    #[test]
    fn test_backspace_over_selection_across_paragraphs() {
        let mut s = surface("<p>Satu dua</p><p>Tiga empat</p>");
        s.track_selection(CapturedRange {
            section_id: "ch-1".to_string(),
            start: Caret::new(vec![0, 0], 4),
            end: Caret::new(vec![1, 0], 4),
        });
        assert_eq!(s.delete_backward(), "<p>Satu empat</p>");
        assert_eq!(s.last_range().unwrap().start, Caret::new(vec![0, 0], 4));
    }

    #[test]
    fn test_image_replaces_selection_across_paragraphs() {
        let mut s = surface("<p>Satu dua</p><p>Tiga empat</p>");
        let range = CapturedRange {
            section_id: "ch-1".to_string(),
            start: Caret::new(vec![0, 0], 4),
            end: Caret::new(vec![1, 0], 4),
        };
        let html = s.insert_image(ImageNode::new("data:a"), Some(&range));
        assert_eq!(html, "<p>Satu<img src=\"data:a\"/> empat</p>");
    }

    #[test]
    fn test_backspace_after_paragraph_deletes_one_character() {
        let mut s = surface("<p>Satu</p><p>Dua panjang sekali</p>");
        s.set_caret(Caret::end_of(s.tree()));
        assert_eq!(s.delete_backward(), "<p>Satu</p><p>Dua panjang sekal</p>");
        assert_eq!(s.delete_backward(), "<p>Satu</p><p>Dua panjang seka</p>");
    }

    #[test]
    fn test_backspace_at_text_start_enters_previous_element() {
        let mut s = surface("<p><b>Tebal</b>biasa</p>");
        s.set_caret(Caret::new(vec![0, 1], 0));
        assert_eq!(s.delete_backward(), "<p><b>Teba</b>biasa</p>");
    }

    #[test]
    fn test_backspace_removes_empty_element_and_image_whole() {
        let mut s = surface("<p>Satu</p><img src=\"data:x\"/><p></p>");
        s.set_caret(Caret::end_of(s.tree()));
        assert_eq!(s.delete_backward(), "<p>Satu</p><img src=\"data:x\"/>");
        assert_eq!(s.delete_backward(), "<p>Satu</p>");
        assert_eq!(s.delete_backward(), "<p>Sat</p>");
    }

    #[test]
    fn test_focused_sync_threshold_boundary() {
        let current = "<p>Halo</p>";
        let grown = |extra: usize| format!("<p>Halo{}</p>", "x".repeat(extra));

        let mut s = surface(current);
        s.focus();
        assert_eq!(s.sync_from_canonical("ch-1", &grown(50)), SyncOutcome::Preserved);
        assert_eq!(s.html(), current);

        let mut s = surface(current);
        s.focus();
        s.set_caret(Caret::new(vec![0, 0], 2));
        let canonical = grown(51);
        assert_eq!(s.sync_from_canonical("ch-1", &canonical), SyncOutcome::Overwritten);
        assert_eq!(s.html(), canonical);
        assert!(s.last_range().is_none());
    }

    #[test]
    fn test_unfocused_surface_always_follows_canonical() {
        let mut s = surface("<p>Halo</p>");
        assert_eq!(s.sync_from_canonical("ch-1", "<p>Halo!</p>"), SyncOutcome::Overwritten);
        assert_eq!(s.html(), "<p>Halo!</p>");
        assert_eq!(s.sync_from_canonical("ch-1", "<p>Halo!</p>"), SyncOutcome::Unchanged);
    }

    #[test]
    fn test_custom_bulk_replace_threshold() {
        let policy = SyncPolicy {
            bulk_replace_threshold: 5,
        };
        let mut s = EditableSurface::mount("ch-1", "<p>Halo</p>", policy);
        s.focus();
        assert_eq!(s.sync_from_canonical("ch-1", "<p>Halo duni</p>"), SyncOutcome::Preserved);
        assert_eq!(s.html(), "<p>Halo</p>");
        assert_eq!(s.sync_from_canonical("ch-1", "<p>Halo dunia</p>"), SyncOutcome::Overwritten);
        assert_eq!(s.html(), "<p>Halo dunia</p>");
    }

    #[test]
    fn test_blur_rules() {
        let mut s = surface("<p>Halo</p>");
        s.focus();
        s.set_caret(Caret::new(vec![0, 0], 4));
        s.insert_text("!");
        assert_eq!(s.blur(FocusTarget::OwnToolbar, "<p>Halo</p>"), None);
        assert!(s.is_focused());
        assert_eq!(
            s.blur(FocusTarget::Elsewhere, "<p>Halo</p>"),
            Some("<p>Halo!</p>".to_string())
        );
        assert!(!s.is_focused());
        assert_eq!(s.blur(FocusTarget::Elsewhere, "<p>Halo!</p>"), None);
    }

    #[test]
    fn test_foreign_range_is_not_tracked() {
        let mut s = surface("<p>Halo</p>");
        s.track_selection(CapturedRange::collapsed("intro", Caret::new(vec![0, 0], 1)));
        assert!(s.last_range().is_none());
    }

    #[test]
    fn test_insert_image_at_range_or_append() {
        let mut s = surface("<p>Halo dunia</p>");
        let range = CapturedRange::collapsed("ch-1", Caret::new(vec![0, 0], 4));
        let html = s.insert_image(ImageNode::new("data:a"), Some(&range));
        assert_eq!(html, "<p>Halo<img src=\"data:a\"/> dunia</p>");

        let stale = CapturedRange::collapsed("ch-1", Caret::new(vec![7, 0], 0));
        let html = s.insert_image(ImageNode::new("data:b"), Some(&stale));
        assert!(html.ends_with("<img src=\"data:b\"/>"));
    }

    #[test]
    fn test_image_click_and_text_click() {
        let mut s = surface("<p>a</p><img src=\"data:x\" class=\"img-medium img-center\"/>");
        assert!(s.click(ClickTarget::Image(vec![1]), &NoLayout));
        assert!(s.last_range().is_none(), "image clicks do not place the caret");
        let html = s.apply_image_size(ImageSize::Large, &NoLayout).unwrap();
        assert!(html.contains("img-large img-center") || html.contains("img-center img-large"));

        s.click(ClickTarget::Text(Caret::new(vec![0, 0], 1)), &NoLayout);
        assert!(s.overlay().selected_path().is_none());
        assert!(s.apply_image_size(ImageSize::Small, &NoLayout).is_none());
    }

    #[test]
    fn test_registry_mounts_once_per_section() {
        let mut registry = SurfaceRegistry::new(SyncPolicy::default());
        registry.mount("intro", "<p>x</p>").focus();
        let surface = registry.mount("intro", "<p>xy</p>");
        assert!(surface.is_focused());
        assert_eq!(surface.html(), "<p>x</p>");
        assert_eq!(registry.len(), 1);
        assert!(registry.unmount("intro").is_some());
        assert!(registry.get("intro").is_none());
    }
}
