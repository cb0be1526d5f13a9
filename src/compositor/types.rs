// Core types shared by the compositor and the capture/journey services

use image::RgbaImage;
use serde::{Deserialize, Serialize};
use std::io::Cursor;

/// A captured raster image: PNG-encoded bytes plus pixel dimensions.
///
/// Immutable once produced. The compositor always returns a *new*
/// `RasterImage`; it never mutates the input in place.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RasterImage {
    /// Width in physical pixels
    pub width: u32,
    /// Height in physical pixels
    pub height: u32,
    /// PNG-encoded image data
    pub data: Vec<u8>,
}

impl RasterImage {
    /// Build a `RasterImage` from PNG bytes, reading dimensions from the header
    pub fn from_png_bytes(data: Vec<u8>) -> Result<Self, image::ImageError> {
        let img = image::load_from_memory(&data)?;
        Ok(Self {
            width: img.width(),
            height: img.height(),
            data,
        })
    }

    /// Encode an RGBA buffer into a new `RasterImage`
    pub fn from_rgba(img: &RgbaImage) -> Result<Self, image::ImageError> {
        let mut data = Vec::new();
        img.write_to(&mut Cursor::new(&mut data), image::ImageFormat::Png)?;
        Ok(Self {
            width: img.width(),
            height: img.height(),
            data,
        })
    }

    /// Decode the PNG payload into an RGBA buffer
    pub fn decode(&self) -> Result<RgbaImage, image::ImageError> {
        Ok(image::load_from_memory(&self.data)?.to_rgba8())
    }
}

/// A click location in CSS pixels as reported by the page.
///
/// The compositor scales it by `device_pixel_ratio` exactly once to obtain
/// physical-pixel coordinates; everything downstream works in physical pixels.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Border style of the fallback circle marker
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MarkerShape {
    Solid,
    Dashed,
    Dotted,
}

impl Default for MarkerShape {
    fn default() -> Self {
        MarkerShape::Solid
    }
}

/// Visual style of the burned-in marker, resolved once per capture
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MarkerStyle {
    /// Hex color string, e.g. `#3b82f6`
    pub color: String,
    /// Marker opacity in `0.0..=1.0`
    pub opacity: f64,
    /// Diameter of the fallback circle in pixels
    pub size: f64,
    /// Border style of the fallback circle
    pub style: MarkerShape,
}

impl Default for MarkerStyle {
    fn default() -> Self {
        Self {
            color: "#3b82f6".to_string(),
            opacity: 1.0,
            size: 24.0,
            style: MarkerShape::Solid,
        }
    }
}

impl MarkerStyle {
    /// Marker fill color as RGBA, with `opacity` folded into the alpha channel.
    /// Unparseable hex falls back to the default blue.
    pub fn fill_rgba(&self) -> image::Rgba<u8> {
        let [r, g, b] = parse_hex_color(&self.color).unwrap_or([0x3b, 0x82, 0xf6]);
        let a = (self.opacity.clamp(0.0, 1.0) * 255.0).round() as u8;
        image::Rgba([r, g, b, a])
    }
}

/// Parse a `#rrggbb` hex color string
pub fn parse_hex_color(hex: &str) -> Option<[u8; 3]> {
    let digits = hex.strip_prefix('#')?;
    if digits.len() != 6 || !digits.chars().all(|c| c.is_ascii_hexdigit()) {
        return None;
    }
    let r = u8::from_str_radix(&digits[0..2], 16).ok()?;
    let g = u8::from_str_radix(&digits[2..4], 16).ok()?;
    let b = u8::from_str_radix(&digits[4..6], 16).ok()?;
    Some([r, g, b])
}

/// Outcome of a compositing pass.
///
/// Compositing never fails outright: on any drawing or codec error the
/// original image comes back and the flags report what was actually drawn.
#[derive(Debug, Clone)]
pub struct CompositeResult {
    /// The composited image, or the unmodified input on failure
    pub image: RasterImage,
    /// Whether a marker (icon or fallback circle) was burned in
    pub marker_drawn: bool,
    /// Whether the speech bubble was burned in
    pub annotation_drawn: bool,
}
