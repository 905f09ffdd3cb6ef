//! Image decoding and PDF image objects

use super::PdfExportError;
use crate::rich_content::ImageNode;
use pdf_writer::{Filter, Pdf, Ref};

/// Pixel data ready to be written as an image XObject
#[derive(Debug, Clone, PartialEq)]
pub enum ImagePayload {
    /// Baseline JPEG passed through with DCTDecode
    Jpeg { data: Vec<u8>, gray: bool },
    /// Decoded 8-bit RGB with an optional alpha channel
    Raw { rgb: Vec<u8>, alpha: Option<Vec<u8>> },
}

/// A decoded image with its intrinsic size
#[derive(Debug, Clone, PartialEq)]
pub struct EmbeddedImage {
    pub pixel_width: u32,
    pub pixel_height: u32,
    pub payload: ImagePayload,
}

impl EmbeddedImage {
    /// Intrinsic height over width
    pub fn aspect_ratio(&self) -> f32 {
        self.pixel_height as f32 / self.pixel_width as f32
    }
}

/// Decode the `data:` URL of an image node
///
/// # Parameters
/// * `node` - The image node from a section tree
///
/// # Returns
/// * `Ok(EmbeddedImage)` - Decoded pixels and intrinsic size
/// * `Err(PdfExportError)` - Not a data URL, bad base64, unknown size or undecodable pixels
pub fn load(node: &ImageNode) -> Result<EmbeddedImage, PdfExportError> {
    let (mime, bytes) = node
        .decode_data()
        .map_err(|e| PdfExportError::ImageError(e.to_string()))?;

    let size = imagesize::blob_size(&bytes)
        .map_err(|e| PdfExportError::ImageError(format!("Could not read dimensions ({}): {}", mime, e)))?;
    if size.width == 0 || size.height == 0 {
        return Err(PdfExportError::ImageError(format!(
            "Image has no area ({}x{})",
            size.width, size.height
        )));
    }

    let decoded = image::load_from_memory(&bytes)
        .map_err(|e| PdfExportError::ImageError(format!("Could not decode {}: {}", mime, e)))?;

    // DCT data is only passed through when PDF can read its colour space as-is
    let payload = match jpeg_components(&bytes) {
        Some(1) => ImagePayload::Jpeg {
            data: bytes,
            gray: true,
        },
        Some(3) => ImagePayload::Jpeg {
            data: bytes,
            gray: false,
        },
        _ => {
            let rgba = decoded.to_rgba8();
            let has_alpha = rgba.pixels().any(|p| p.0[3] < 255);
            let rgb = rgba.pixels().flat_map(|p| [p.0[0], p.0[1], p.0[2]]).collect();
            let alpha = has_alpha.then(|| rgba.pixels().map(|p| p.0[3]).collect());
            ImagePayload::Raw { rgb, alpha }
        }
    };

    Ok(EmbeddedImage {
        pixel_width: decoded.width(),
        pixel_height: decoded.height(),
        payload,
    })
}

/// Component count from the first SOF header of a JPEG stream
///
/// # Returns
/// * `Some(n)` - 1 for grayscale, 3 for YCbCr, 4 for CMYK/YCCK
/// * `None` - Not a JPEG, or no frame header before the scan data
fn jpeg_components(bytes: &[u8]) -> Option<u8> {
    if !bytes.starts_with(&[0xFF, 0xD8]) {
        return None;
    }
    let mut pos = 2;
    while pos + 1 < bytes.len() {
        if bytes[pos] != 0xFF {
            return None;
        }
        let marker = bytes[pos + 1];
        pos += 2;
        match marker {
            0xFF => pos -= 1,
            0x01 | 0xD0..=0xD7 => {}
            0xD9 | 0xDA => return None,
            _ => {
                let length = u16::from_be_bytes([*bytes.get(pos)?, *bytes.get(pos + 1)?]) as usize;
                let is_frame = matches!(marker, 0xC0..=0xCF) && !matches!(marker, 0xC4 | 0xC8 | 0xCC);
                if is_frame {
                    return bytes.get(pos + 7).copied();
                }
                pos += length;
            }
        }
    }
    None
}

/// Write an image XObject (plus soft mask when needed) and return its id
pub(super) fn write_xobject(pdf: &mut Pdf, alloc: &mut impl FnMut() -> Ref, image: &EmbeddedImage) -> Ref {
    let id = alloc();
    let width = image.pixel_width as i32;
    let height = image.pixel_height as i32;

    match &image.payload {
        ImagePayload::Jpeg { data, gray } => {
            let mut xobject = pdf.image_xobject(id, data);
            xobject.filter(Filter::DctDecode);
            xobject.width(width);
            xobject.height(height);
            if *gray {
                xobject.color_space().device_gray();
            } else {
                xobject.color_space().device_rgb();
            }
            xobject.bits_per_component(8);
        }
        ImagePayload::Raw { rgb, alpha } => {
            let mask = alpha.as_ref().map(|alpha| {
                let mask_id = alloc();
                let compressed = miniz_oxide::deflate::compress_to_vec_zlib(alpha, 6);
                let mut mask = pdf.image_xobject(mask_id, &compressed);
                mask.filter(Filter::FlateDecode);
                mask.width(width);
                mask.height(height);
                mask.color_space().device_gray();
                mask.bits_per_component(8);
                mask_id
            });

            let compressed = miniz_oxide::deflate::compress_to_vec_zlib(rgb, 6);
            let mut xobject = pdf.image_xobject(id, &compressed);
            xobject.filter(Filter::FlateDecode);
            xobject.width(width);
            xobject.height(height);
            xobject.color_space().device_rgb();
            xobject.bits_per_component(8);
            if let Some(mask_id) = mask {
                xobject.s_mask(mask_id);
            }
        }
    }
    id
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::rich_content::data_url;
    use std::io::Cursor;

    /// Encode a solid-colour PNG of the given size
    pub(crate) fn png_bytes(width: u32, height: u32, alpha: u8) -> Vec<u8> {
        let img = image::RgbaImage::from_pixel(width, height, image::Rgba([200, 100, 50, alpha]));
        let mut out = Cursor::new(Vec::new());
        img.write_to(&mut out, image::ImageFormat::Png).unwrap();
        out.into_inner()
    }

    #[test]
    fn test_load_png_reads_intrinsic_size() {
        let node = ImageNode::new(data_url("image/png", &png_bytes(40, 20, 255)));
        let image = load(&node).unwrap();
        assert_eq!((image.pixel_width, image.pixel_height), (40, 20));
        assert_eq!(image.aspect_ratio(), 0.5);
        let ImagePayload::Raw { rgb, alpha } = &image.payload else {
            panic!("expected raw payload");
        };
        assert_eq!(rgb.len(), 40 * 20 * 3);
        assert!(alpha.is_none());
    }

    #[test]
    fn test_load_keeps_alpha_channel() {
        let node = ImageNode::new(data_url("image/png", &png_bytes(4, 4, 128)));
        let image = load(&node).unwrap();
        assert!(matches!(image.payload, ImagePayload::Raw { alpha: Some(_), .. }));
    }

    #[test]
    fn test_load_passes_baseline_jpeg_through() {
        let img = image::RgbImage::from_pixel(8, 4, image::Rgb([10, 200, 30]));
        let mut out = Cursor::new(Vec::new());
        img.write_to(&mut out, image::ImageFormat::Jpeg).unwrap();
        let bytes = out.into_inner();

        let image = load(&ImageNode::new(data_url("image/jpeg", &bytes))).unwrap();
        assert_eq!(
            image.payload,
            ImagePayload::Jpeg {
                data: bytes,
                gray: false
            }
        );
    }

    #[test]
    fn test_jpeg_component_count_from_frame_header() {
        // SOI, an APP0 segment, then SOF0 for a 16x16 four-component frame
        let cmyk = [
            0xFF, 0xD8, 0xFF, 0xE0, 0x00, 0x04, 0x00, 0x00, 0xFF, 0xC0, 0x00, 0x14, 0x08, 0x00,
            0x10, 0x00, 0x10, 0x04,
        ];
        assert_eq!(jpeg_components(&cmyk), Some(4));

        let mut gray = cmyk;
        gray[17] = 1;
        assert_eq!(jpeg_components(&gray), Some(1));

        assert_eq!(jpeg_components(&png_bytes(2, 2, 255)), None);
        assert_eq!(jpeg_components(&[0xFF, 0xD8, 0xFF, 0xDA, 0x00]), None);
    }

    #[test]
    fn test_load_rejects_garbage() {
        assert!(load(&ImageNode::new("https://example.com/x.png")).is_err());
        assert!(load(&ImageNode::new(data_url("image/png", b"not an image"))).is_err());
    }
}
