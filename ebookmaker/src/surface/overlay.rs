//! Image manipulation overlay
//!
//! Tracks the one selected image of a surface, the floating toolbar and the
//! resize frame around it. Screen geometry comes from a [`LayoutProbe`], the
//! adapter a rendering frontend implements over its live layout.

use crate::rich_content::{
    ImageAlignment, ImageSize, Node, NodePath, RichDocument, SELECTED_CLASS,
};

/// Vertical distance between the toolbar and the top of the image
pub const TOOLBAR_OFFSET: f32 = 50.0;

/// Smallest horizontal toolbar position
pub const TOOLBAR_MIN_LEFT: f32 = 10.0;

/// An axis-aligned rectangle in screen pixels
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Rect {
    pub left: f32,
    pub top: f32,
    pub width: f32,
    pub height: f32,
}

impl Rect {
    pub fn new(left: f32, top: f32, width: f32, height: f32) -> Self {
        Self {
            left,
            top,
            width,
            height,
        }
    }
}

/// Read access to the rendered layout of one surface
pub trait LayoutProbe {
    /// Bounding box of the surface itself
    fn surface_rect(&self) -> Rect;

    /// Current vertical scroll offset of the surface
    fn scroll_top(&self) -> f32;

    /// Bounding box of the image at `path`, or `None` if it is not rendered
    fn image_rect(&self, path: &[usize]) -> Option<Rect>;
}

/// Toolbar anchor, relative to the surface's scrolled content
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ToolbarPosition {
    pub top: f32,
    pub left: f32,
}

/// Toolbar and resize frame placement for the selected image
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OverlayGeometry {
    pub toolbar: ToolbarPosition,
    pub frame: Rect,
}

impl OverlayGeometry {
    /// Compute the overlay placement from screen rectangles
    pub fn compute(surface: Rect, image: Rect, scroll_top: f32) -> Self {
        let relative_top = image.top - surface.top;
        let relative_left = image.left - surface.left;
        Self {
            toolbar: ToolbarPosition {
                top: relative_top - TOOLBAR_OFFSET + scroll_top,
                left: (relative_left + image.width / 2.0).max(TOOLBAR_MIN_LEFT),
            },
            frame: Rect::new(relative_left, relative_top + scroll_top, image.width, image.height),
        }
    }
}

/// Overlay state machine
#[derive(Debug, Clone, Default, PartialEq)]
pub enum OverlayState {
    #[default]
    Idle,
    Selected {
        path: NodePath,
        geometry: OverlayGeometry,
    },
    Resizing {
        path: NodePath,
        geometry: OverlayGeometry,
        start_x: f32,
        start_width: f32,
    },
}

/// The selected-image overlay of one surface
#[derive(Debug, Clone, Default)]
pub struct ImageOverlay {
    state: OverlayState,
}

impl ImageOverlay {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &OverlayState {
        &self.state
    }

    /// Path of the selected image, if any
    pub fn selected_path(&self) -> Option<&NodePath> {
        match &self.state {
            OverlayState::Idle => None,
            OverlayState::Selected { path, .. } | OverlayState::Resizing { path, .. } => Some(path),
        }
    }

    /// Current placement, if an image is selected
    pub fn geometry(&self) -> Option<&OverlayGeometry> {
        match &self.state {
            OverlayState::Idle => None,
            OverlayState::Selected { geometry, .. } | OverlayState::Resizing { geometry, .. } => {
                Some(geometry)
            }
        }
    }

    pub fn is_resizing(&self) -> bool {
        matches!(self.state, OverlayState::Resizing { .. })
    }

    /// Drop the selection
    pub fn clear(&mut self) {
        self.state = OverlayState::Idle;
    }

    /// Select the image at `path`
    ///
    /// Any leftover selection markers on other images are cleared first.
    ///
    /// # Returns
    /// * `true` - The image exists and is now selected
    /// * `false` - No rendered image at `path`; the overlay is idle
    pub fn select(&mut self, tree: &mut RichDocument, path: NodePath, probe: &dyn LayoutProbe) -> bool {
        for image_path in tree.image_paths() {
            if let Some(image) = tree.image_mut(&image_path) {
                image.remove_class(SELECTED_CLASS);
            }
        }
        self.state = match place(tree, &path, probe) {
            Some(geometry) => OverlayState::Selected { path, geometry },
            None => OverlayState::Idle,
        };
        self.selected_path().is_some()
    }

    /// Recompute geometry after a scroll, window resize or content change
    ///
    /// Returns to idle when the selected image is gone.
    pub fn refresh(&mut self, tree: &RichDocument, probe: &dyn LayoutProbe) {
        let Some(path) = self.selected_path().cloned() else {
            return;
        };
        match place(tree, &path, probe) {
            Some(updated) => match &mut self.state {
                OverlayState::Selected { geometry, .. } | OverlayState::Resizing { geometry, .. } => {
                    *geometry = updated;
                }
                OverlayState::Idle => {}
            },
            None => {
                log::debug!("Selected image at {:?} is gone, clearing overlay", path);
                self.state = OverlayState::Idle;
            }
        }
    }

    /// Apply a size tier to the selected image
    ///
    /// # Returns
    /// * `true` - The tree changed and should be committed
    pub fn apply_size(&mut self, tree: &mut RichDocument, size: ImageSize, probe: &dyn LayoutProbe) -> bool {
        let Some(path) = self.selected_path().cloned() else {
            return false;
        };
        let Some(image) = tree.image_mut(&path) else {
            self.clear();
            return false;
        };
        image.apply_size(size);
        self.refresh(tree, probe);
        true
    }

    /// Apply an alignment to the selected image
    pub fn apply_alignment(
        &mut self,
        tree: &mut RichDocument,
        alignment: ImageAlignment,
        probe: &dyn LayoutProbe,
    ) -> bool {
        let Some(path) = self.selected_path().cloned() else {
            return false;
        };
        let Some(image) = tree.image_mut(&path) else {
            self.clear();
            return false;
        };
        image.apply_alignment(alignment);
        self.refresh(tree, probe);
        true
    }

    /// Remove the selected image from the tree
    pub fn delete(&mut self, tree: &mut RichDocument) -> bool {
        let Some(path) = self.selected_path().cloned() else {
            return false;
        };
        self.clear();
        matches!(tree.remove(&path), Some(Node::Image(_)))
    }

    /// Start a drag-resize at pointer position `pointer_x`
    ///
    /// The size tier classes are dropped immediately; the start width is the
    /// image's rendered width.
    pub fn begin_resize(&mut self, tree: &mut RichDocument, pointer_x: f32, probe: &dyn LayoutProbe) -> bool {
        let OverlayState::Selected { path, geometry } = &self.state else {
            return false;
        };
        let (path, geometry) = (path.clone(), *geometry);
        let Some(image) = tree.image_mut(&path) else {
            self.clear();
            return false;
        };
        for tier in ImageSize::ALL {
            image.remove_class(tier.class());
        }
        let start_width = probe
            .image_rect(&path)
            .map(|rect| rect.width)
            .unwrap_or(geometry.frame.width);
        self.state = OverlayState::Resizing {
            path,
            geometry,
            start_x: pointer_x,
            start_width,
        };
        true
    }

    /// One pointer-move step of a drag-resize
    ///
    /// # Returns
    /// * `Some(width)` - The pixel width now set on the image
    /// * `None` - Not resizing, or the image is gone
    pub fn drag(&mut self, tree: &mut RichDocument, pointer_x: f32, probe: &dyn LayoutProbe) -> Option<u32> {
        let OverlayState::Resizing {
            path,
            start_x,
            start_width,
            ..
        } = &self.state
        else {
            return None;
        };
        let path = path.clone();
        let width = (start_width + (pointer_x - start_x)).round().max(0.0) as u32;
        let Some(image) = tree.image_mut(&path) else {
            self.clear();
            return None;
        };
        image.set_pixel_width(width);
        let applied = image.pixel_width().map(|w| w as u32);
        self.refresh(tree, probe);
        applied
    }

    /// Finish a drag-resize (pointer-up)
    ///
    /// # Returns
    /// * `true` - A resize was in progress and should now be committed
    pub fn end_resize(&mut self) -> bool {
        match std::mem::take(&mut self.state) {
            OverlayState::Resizing { path, geometry, .. } => {
                self.state = OverlayState::Selected { path, geometry };
                true
            }
            other => {
                self.state = other;
                false
            }
        }
    }
}

fn place(tree: &RichDocument, path: &[usize], probe: &dyn LayoutProbe) -> Option<OverlayGeometry> {
    tree.image(path)?;
    let image = probe.image_rect(path)?;
    Some(OverlayGeometry::compute(
        probe.surface_rect(),
        image,
        probe.scroll_top(),
    ))
}
