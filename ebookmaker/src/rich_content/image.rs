//! Inline image nodes and their class vocabulary

use super::error::ImageDataError;
use base64::{engine::general_purpose::STANDARD, Engine as _};

/// Class used by older surfaces to mark the selected image (always cleared)
pub const SELECTED_CLASS: &str = "selected-img";

/// Classes given to a freshly inserted image
pub const INSERTED_IMAGE_CLASSES: &str = "img-medium img-center rounded-xl shadow-lg cursor-pointer my-6";

/// Minimum pixel width a drag-resize may produce
pub const MIN_PIXEL_WIDTH: u32 = 50;

/// Size tier of an inline image
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageSize {
    Small,
    Medium,
    Large,
}

impl ImageSize {
    /// Every tier, in class-removal order
    pub const ALL: [ImageSize; 3] = [ImageSize::Small, ImageSize::Medium, ImageSize::Large];

    /// CSS class for this tier
    pub fn class(self) -> &'static str {
        match self {
            ImageSize::Small => "img-small",
            ImageSize::Medium => "img-medium",
            ImageSize::Large => "img-large",
        }
    }

    /// Parse a class name into a tier
    pub fn from_class(class: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|size| size.class() == class)
    }

    /// Fraction of the content width the exporter gives this tier
    pub fn width_fraction(self) -> f32 {
        match self {
            ImageSize::Small => 0.3,
            ImageSize::Medium => 0.6,
            ImageSize::Large => 1.0,
        }
    }
}

/// Horizontal placement of an inline image
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageAlignment {
    Left,
    Center,
    Right,
}

impl ImageAlignment {
    /// Every alignment, in class-removal order
    pub const ALL: [ImageAlignment; 3] = [
        ImageAlignment::Left,
        ImageAlignment::Center,
        ImageAlignment::Right,
    ];

    /// CSS class for this alignment
    pub fn class(self) -> &'static str {
        match self {
            ImageAlignment::Left => "img-left",
            ImageAlignment::Center => "img-center",
            ImageAlignment::Right => "img-right",
        }
    }

    /// Parse a class name into an alignment
    pub fn from_class(class: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|align| align.class() == class)
    }
}

/// An `<img>` node
#[derive(Debug, Clone, PartialEq)]
pub struct ImageNode {
    /// Image source, normally a `data:` URL
    pub src: String,

    /// Class list in source order
    pub classes: Vec<String>,

    /// Inline style attribute, if any
    pub style: Option<String>,

    /// Any other attributes (alt, title, ...) preserved verbatim
    pub attributes: Vec<(String, String)>,
}

impl ImageNode {
    /// Create an image with no classes
    pub fn new(src: impl Into<String>) -> Self {
        Self {
            src: src.into(),
            classes: Vec::new(),
            style: None,
            attributes: Vec::new(),
        }
    }

    /// Create an image carrying the default classes for a new insertion
    pub fn inserted(src: impl Into<String>) -> Self {
        let mut image = Self::new(src);
        image.classes = INSERTED_IMAGE_CLASSES
            .split_whitespace()
            .map(str::to_string)
            .collect();
        image
    }

    /// Whether the class list contains `class`
    pub fn has_class(&self, class: &str) -> bool {
        self.classes.iter().any(|c| c == class)
    }

    /// Add a class if missing
    pub fn add_class(&mut self, class: &str) {
        if !self.has_class(class) {
            self.classes.push(class.to_string());
        }
    }

    /// Remove every occurrence of a class
    pub fn remove_class(&mut self, class: &str) {
        self.classes.retain(|c| c != class);
    }

    /// Current size tier, if any tier class is present
    pub fn size(&self) -> Option<ImageSize> {
        self.classes.iter().find_map(|c| ImageSize::from_class(c))
    }

    /// Current alignment, if any alignment class is present
    pub fn alignment(&self) -> Option<ImageAlignment> {
        self.classes.iter().find_map(|c| ImageAlignment::from_class(c))
    }

    /// Switch to a size tier
    ///
    /// Clears the other tiers and any free-form pixel width; alignment
    /// classes are left untouched.
    pub fn apply_size(&mut self, size: ImageSize) {
        for tier in ImageSize::ALL {
            self.remove_class(tier.class());
        }
        self.add_class(size.class());
        self.style = None;
    }

    /// Switch to an alignment; size classes are left untouched
    pub fn apply_alignment(&mut self, alignment: ImageAlignment) {
        for align in ImageAlignment::ALL {
            self.remove_class(align.class());
        }
        self.add_class(alignment.class());
    }

    /// Give the image an explicit pixel width (free sizing)
    ///
    /// Free sizing supersedes tier sizing, so the tier classes are removed.
    pub fn set_pixel_width(&mut self, width: u32) {
        for tier in ImageSize::ALL {
            self.remove_class(tier.class());
        }
        let width = width.max(MIN_PIXEL_WIDTH);
        self.style = Some(format!("width: {}px; max-width: 100%; height: auto;", width));
    }

    /// Explicit pixel width from the inline style, if set
    pub fn pixel_width(&self) -> Option<f32> {
        let style = self.style.as_deref()?;
        style.split(';').find_map(|declaration| {
            let (property, value) = declaration.split_once(':')?;
            if property.trim() != "width" {
                return None;
            }
            value
                .trim()
                .strip_suffix("px")?
                .trim()
                .parse::<f32>()
                .ok()
                .filter(|width| width.is_finite() && *width > 0.0)
        })
    }

    /// Decode the `data:` URL into its mime type and bytes
    pub fn decode_data(&self) -> Result<(String, Vec<u8>), ImageDataError> {
        let rest = self
            .src
            .trim()
            .strip_prefix("data:")
            .ok_or(ImageDataError::NotDataUrl)?;
        let (header, payload) = rest.split_once(',').ok_or(ImageDataError::NotDataUrl)?;
        let (mime, encoding) = header.split_once(';').unwrap_or((header, ""));
        if encoding != "base64" {
            return Err(ImageDataError::UnsupportedEncoding(encoding.to_string()));
        }
        let bytes = STANDARD
            .decode(payload.trim())
            .map_err(|e| ImageDataError::InvalidBase64(e.to_string()))?;
        Ok((mime.to_string(), bytes))
    }
}

/// Build a `data:` URL for embedding image bytes
pub fn data_url(mime_type: &str, bytes: &[u8]) -> String {
    format!("data:{};base64,{}", mime_type, STANDARD.encode(bytes))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_size_and_alignment_groups_are_independent() {
        let mut image = ImageNode::inserted("x");
        assert_eq!(image.size(), Some(ImageSize::Medium));
        assert_eq!(image.alignment(), Some(ImageAlignment::Center));

        image.apply_alignment(ImageAlignment::Right);
        assert_eq!(image.size(), Some(ImageSize::Medium));
        assert_eq!(image.alignment(), Some(ImageAlignment::Right));
        assert!(!image.has_class("img-center"));

        image.apply_size(ImageSize::Large);
        assert_eq!(image.size(), Some(ImageSize::Large));
        assert_eq!(image.alignment(), Some(ImageAlignment::Right));
        assert!(!image.has_class("img-medium"));
        assert!(image.has_class("rounded-xl"));
    }

    #[test]
    fn test_pixel_width_supersedes_tiers() {
        let mut image = ImageNode::inserted("x");
        image.set_pixel_width(320);
        assert_eq!(image.size(), None);
        assert_eq!(image.alignment(), Some(ImageAlignment::Center));
        assert_eq!(image.pixel_width(), Some(320.0));

        image.set_pixel_width(10);
        assert_eq!(image.pixel_width(), Some(50.0));

        image.apply_size(ImageSize::Small);
        assert_eq!(image.pixel_width(), None);
    }

    #[test]
    fn test_unusable_pixel_widths_are_ignored() {
        for style in ["width: NaNpx", "width: infpx", "width: -20px", "width: 0px"] {
            let mut image = ImageNode::new("x");
            image.style = Some(style.to_string());
            assert_eq!(image.pixel_width(), None, "{}", style);
        }
    }

    #[test]
    fn test_max_width_is_not_width() {
        let mut image = ImageNode::new("x");
        image.style = Some("max-width: 100%".to_string());
        assert_eq!(image.pixel_width(), None);
    }

    #[test]
    fn test_data_url_decoding() {
        let image = ImageNode::new(data_url("image/png", &[1, 2, 3]));
        let (mime, bytes) = image.decode_data().unwrap();
        assert_eq!(mime, "image/png");
        assert_eq!(bytes, vec![1, 2, 3]);

        assert_eq!(
            ImageNode::new("https://example.com/a.png").decode_data(),
            Err(ImageDataError::NotDataUrl)
        );
        assert!(matches!(
            ImageNode::new("data:image/png;base64,@@@").decode_data(),
            Err(ImageDataError::InvalidBase64(_))
        ));
    }
}
