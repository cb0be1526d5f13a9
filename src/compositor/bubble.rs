//! Speech bubble layout and rendering.
//!
//! The bubble is a rounded rectangle with a triangular tail pointing at the
//! marker's near edge. Placement tries above the marker first, flips below
//! if the top edge would clip, and skips the bubble entirely if neither
//! direction fits: a clipped bubble is never rendered.

use image::Rgba;

use crate::compositor::surface::{Frame, GLYPH_HEIGHT};
use crate::config::CompositorConfig;

/// Word-wrapped lines plus resolved bubble geometry, all in physical pixels
#[derive(Debug, Clone, PartialEq)]
pub struct BubbleLayout {
    /// Wrapped text lines, in order
    pub lines: Vec<String>,
    /// Bubble rectangle left edge
    pub x0: f64,
    /// Bubble rectangle top edge
    pub y0: f64,
    /// Bubble rectangle right edge
    pub x1: f64,
    /// Bubble rectangle bottom edge
    pub y1: f64,
    /// Whether the bubble sits below the marker (flipped placement)
    pub below: bool,
    /// Center x of the tail base on the bubble edge
    pub tail_base_x: f64,
    /// Tail tip, anchored at the marker's near edge
    pub tail_tip: (f64, f64),
    /// Whether a single word exceeded the wrap width and overflows its line
    pub overflow: bool,
}

/// Greedy word wrap against a pixel budget using real glyph measurement.
///
/// A single word wider than `max_width` is placed on its own line without
/// truncation; the second return value reports that this happened.
pub fn wrap_text(text: &str, max_width: f64, glyph_scale: u32) -> (Vec<String>, bool) {
    let mut lines = Vec::new();
    let mut current = String::new();
    let mut overflow = false;

    for word in text.split_whitespace() {
        let word_width = f64::from(Frame::measure_text(word, glyph_scale));
        if word_width > max_width {
            overflow = true;
        }
        if current.is_empty() {
            current.push_str(word);
            continue;
        }
        let candidate_width =
            f64::from(Frame::measure_text(&current, glyph_scale)) + f64::from(Frame::measure_text(" ", glyph_scale)) + word_width;
        if candidate_width <= max_width {
            current.push(' ');
            current.push_str(word);
        } else {
            lines.push(std::mem::take(&mut current));
            current.push_str(word);
        }
    }
    if !current.is_empty() {
        lines.push(current);
    }
    (lines, overflow)
}

/// Plan bubble geometry for the given marker position and annotation text.
///
/// Returns `None` when the text is empty after trimming or when the bubble
/// fits neither above nor below the marker without clipping.
pub fn plan_bubble(
    config: &CompositorConfig,
    image_width: u32,
    image_height: u32,
    px: f64,
    py: f64,
    marker_radius: f64,
    text: &str,
) -> Option<BubbleLayout> {
    let text = text.trim();
    if text.is_empty() {
        return None;
    }

    let wrap_width = config.bubble_max_width - 2.0 * config.bubble_padding;
    let (lines, overflow) = wrap_text(text, wrap_width, config.glyph_scale);
    if lines.is_empty() {
        return None;
    }

    let widest = lines
        .iter()
        .map(|line| f64::from(Frame::measure_text(line, config.glyph_scale)))
        .fold(0.0, f64::max);
    let bubble_w = (widest + 2.0 * config.bubble_padding).max(config.bubble_min_width);
    let bubble_h = lines.len() as f64 * config.line_height + 2.0 * config.bubble_padding;

    let img_w = f64::from(image_width);
    let img_h = f64::from(image_height);
    let margin = config.edge_margin;

    // Vertical placement: above first, flip below, otherwise give up.
    let above_y0 = py - marker_radius - config.bubble_gap - bubble_h;
    let (y0, below) = if above_y0 >= margin {
        (above_y0, false)
    } else {
        let below_y0 = py + marker_radius + config.bubble_gap;
        if below_y0 + bubble_h > img_h - margin {
            return None;
        }
        (below_y0, true)
    };
    let y1 = y0 + bubble_h;

    // Horizontal clamp keeps the bubble inside the margins; when the bubble
    // is wider than the image the left margin wins.
    let mut x0 = px - bubble_w / 2.0;
    x0 = x0.min(img_w - margin - bubble_w);
    x0 = x0.max(margin);
    let x1 = x0 + bubble_w;

    // Tail base re-centers under the clamped bubble but stays out of the
    // rounded corners; the tip keeps pointing at the true marker x.
    let safe_lo = x0 + config.bubble_radius + config.tail_width / 2.0;
    let safe_hi = x1 - config.bubble_radius - config.tail_width / 2.0;
    let tail_base_x = if safe_lo <= safe_hi {
        px.clamp(safe_lo, safe_hi)
    } else {
        (x0 + x1) / 2.0
    };
    let tail_tip = if below {
        (px, py + marker_radius)
    } else {
        (px, py - marker_radius)
    };

    Some(BubbleLayout {
        lines,
        x0,
        y0,
        x1,
        y1,
        below,
        tail_base_x,
        tail_tip,
        overflow,
    })
}

/// Render a planned bubble: rounded body, tail triangle, left-aligned white text
pub fn draw_bubble(frame: &mut Frame, config: &CompositorConfig, layout: &BubbleLayout, fill: Rgba<u8>) {
    frame.fill_round_rect(
        layout.x0,
        layout.y0,
        layout.x1,
        layout.y1,
        config.bubble_radius,
        fill,
    );

    let half_tail = config.tail_width / 2.0;
    // Base edge overlaps the bubble by a pixel so no seam shows
    let base_y = if layout.below {
        layout.y0 + 1.0
    } else {
        layout.y1 - 1.0
    };
    frame.fill_triangle(
        (layout.tail_base_x - half_tail, base_y),
        (layout.tail_base_x + half_tail, base_y),
        layout.tail_tip,
        fill,
    );

    let text_color = Rgba([255, 255, 255, 255]);
    let glyph_h = f64::from(GLYPH_HEIGHT * config.glyph_scale.max(1));
    let text_x = (layout.x0 + config.bubble_padding).round() as i32;
    for (i, line) in layout.lines.iter().enumerate() {
        let line_top = layout.y0
            + config.bubble_padding
            + i as f64 * config.line_height
            + (config.line_height - glyph_h) / 2.0;
        frame.draw_text(text_x, line_top.round() as i32, line, text_color, config.glyph_scale);
    }
}
