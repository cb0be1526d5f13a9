//! Marker rendering: themed icon with drop shadow, or the deterministic
//! fallback circle when no icon is available.

use image::{Rgba, RgbaImage};

use crate::compositor::surface::Frame;
use crate::compositor::types::{MarkerShape, MarkerStyle};
use crate::config::CompositorConfig;

/// Dash pattern (on, off) in degrees for a dashed circle border
const DASH_PATTERN: (f64, f64) = (24.0, 16.0);

/// Dash pattern (on, off) in degrees for a dotted circle border
const DOT_PATTERN: (f64, f64) = (7.0, 13.0);

/// Burn a marker centered at `(px, py)` in physical pixels.
///
/// Prefers the themed icon; falls back to a filled circle with a white
/// border when `icon` is `None`. Never fails: out-of-bounds coordinates
/// simply clip. Returns the radius of whatever was drawn so the caller can
/// anchor the bubble tail to the marker's near edge.
pub fn draw_marker(
    frame: &mut Frame,
    config: &CompositorConfig,
    px: f64,
    py: f64,
    style: &MarkerStyle,
    icon: Option<&RgbaImage>,
) -> f64 {
    let (sx, sy) = config.shadow_offset;
    match icon {
        Some(icon) => {
            let radius = f64::from(config.icon_size) / 2.0;
            frame.fill_disc(
                px + sx,
                py + sy,
                radius,
                Rgba([0, 0, 0, config.shadow_alpha]),
            );
            frame.draw_image_centered(icon, px, py, config.icon_size);
            radius
        }
        None => {
            let radius = (style.size / 2.0).max(1.0);
            frame.fill_disc(
                px + sx,
                py + sy,
                radius + 1.0,
                Rgba([0, 0, 0, config.shadow_alpha]),
            );
            frame.fill_disc(px, py, radius, style.fill_rgba());
            let dash = match style.style {
                MarkerShape::Solid => None,
                MarkerShape::Dashed => Some(DASH_PATTERN),
                MarkerShape::Dotted => Some(DOT_PATTERN),
            };
            frame.fill_ring(
                px,
                py,
                radius,
                config.marker_border,
                Rgba([255, 255, 255, 255]),
                dash,
            );
            radius
        }
    }
}
