//! RGBA drawing surface used by the compositor.
//!
//! `Frame` wraps a pixel buffer and exposes exactly the capability set the
//! compositing pipeline needs: alpha-blended discs, rings, triangles and
//! rounded rectangles, bitmap text with real per-glyph measurement, and
//! scaled image blits. All coordinates are physical pixels; every primitive
//! clamps to the buffer bounds and never panics on out-of-range input.

use font8x8::{BASIC_FONTS, UnicodeFonts};
use image::imageops::FilterType;
use image::{Rgba, RgbaImage};
use std::io::Cursor;

/// Width of one glyph in the 8x8 bitmap font
pub const GLYPH_WIDTH: u32 = 8;

/// Height of one glyph in the 8x8 bitmap font
pub const GLYPH_HEIGHT: u32 = 8;

/// A drawing surface over an RGBA pixel buffer
#[derive(Debug, Clone)]
pub struct Frame {
    img: RgbaImage,
}

impl Frame {
    /// Wrap an existing RGBA buffer
    pub fn new(img: RgbaImage) -> Self {
        Self { img }
    }

    /// Decode a PNG payload into a frame
    pub fn from_png_bytes(data: &[u8]) -> Result<Self, image::ImageError> {
        Ok(Self {
            img: image::load_from_memory(data)?.to_rgba8(),
        })
    }

    pub fn width(&self) -> u32 {
        self.img.width()
    }

    pub fn height(&self) -> u32 {
        self.img.height()
    }

    /// Read a pixel, returning transparent black outside the bounds
    pub fn get_pixel(&self, x: u32, y: u32) -> Rgba<u8> {
        if x >= self.img.width() || y >= self.img.height() {
            return Rgba([0, 0, 0, 0]);
        }
        *self.img.get_pixel(x, y)
    }

    /// Alpha-blend a color onto a single pixel
    pub fn blend_at(&mut self, x: i32, y: i32, color: Rgba<u8>) {
        if x < 0 || y < 0 || x >= self.img.width() as i32 || y >= self.img.height() as i32 {
            return;
        }
        let dst = *self.img.get_pixel(x as u32, y as u32);
        self.img.put_pixel(x as u32, y as u32, blend_pixel(dst, color));
    }

    /// Fill a disc centered at `(cx, cy)`
    pub fn fill_disc(&mut self, cx: f64, cy: f64, radius: f64, color: Rgba<u8>) {
        if radius <= 0.1 {
            self.blend_at(cx.round() as i32, cy.round() as i32, color);
            return;
        }
        let (min_x, max_x, min_y, max_y) =
            self.clip_box(cx - radius, cx + radius, cy - radius, cy + radius);
        let r2 = radius * radius;
        for y in min_y..=max_y {
            for x in min_x..=max_x {
                let dx = f64::from(x) - cx;
                let dy = f64::from(y) - cy;
                if dx * dx + dy * dy <= r2 {
                    self.blend_at(x, y, color);
                }
            }
        }
    }

    /// Fill an annular ring of the given stroke width.
    ///
    /// `dash` optionally gives an `(on, off)` arc pattern in degrees; `None`
    /// draws a solid ring.
    pub fn fill_ring(
        &mut self,
        cx: f64,
        cy: f64,
        radius: f64,
        stroke: f64,
        color: Rgba<u8>,
        dash: Option<(f64, f64)>,
    ) {
        if radius <= 0.1 || stroke <= 0.0 {
            return;
        }
        let outer = radius + stroke / 2.0;
        let inner = (radius - stroke / 2.0).max(0.0);
        let (min_x, max_x, min_y, max_y) =
            self.clip_box(cx - outer, cx + outer, cy - outer, cy + outer);
        let outer2 = outer * outer;
        let inner2 = inner * inner;
        for y in min_y..=max_y {
            for x in min_x..=max_x {
                let dx = f64::from(x) - cx;
                let dy = f64::from(y) - cy;
                let d2 = dx * dx + dy * dy;
                if d2 > outer2 || d2 < inner2 {
                    continue;
                }
                if let Some((on, off)) = dash {
                    let angle = dy.atan2(dx).to_degrees().rem_euclid(360.0);
                    if angle.rem_euclid(on + off) >= on {
                        continue;
                    }
                }
                self.blend_at(x, y, color);
            }
        }
    }

    /// Fill a triangle given its three corners
    pub fn fill_triangle(
        &mut self,
        a: (f64, f64),
        b: (f64, f64),
        c: (f64, f64),
        color: Rgba<u8>,
    ) {
        let (min_x, max_x, min_y, max_y) = self.clip_box(
            a.0.min(b.0).min(c.0),
            a.0.max(b.0).max(c.0),
            a.1.min(b.1).min(c.1),
            a.1.max(b.1).max(c.1),
        );
        for y in min_y..=max_y {
            for x in min_x..=max_x {
                let p = (f64::from(x) + 0.5, f64::from(y) + 0.5);
                if point_in_triangle(p, a, b, c, 0.8) {
                    self.blend_at(x, y, color);
                }
            }
        }
    }

    /// Fill a rounded rectangle spanning `[x0, x1) x [y0, y1)`
    pub fn fill_round_rect(
        &mut self,
        x0: f64,
        y0: f64,
        x1: f64,
        y1: f64,
        radius: f64,
        color: Rgba<u8>,
    ) {
        let rx0 = x0.floor() as i32;
        let ry0 = y0.floor() as i32;
        let rx1 = x1.ceil() as i32;
        let ry1 = y1.ceil() as i32;
        let (min_x, max_x, min_y, max_y) = self.clip_box(x0, x1, y0, y1);
        for y in min_y..=max_y {
            for x in min_x..=max_x {
                if point_in_rounded_rect(x, y, rx0, ry0, rx1, ry1, radius) {
                    self.blend_at(x, y, color);
                }
            }
        }
    }

    /// Measure the pixel width of a single line of text at the given glyph
    /// scale. The font is fixed-advance, so this is exactly the horizontal
    /// distance `draw_text` will cover.
    pub fn measure_text(text: &str, scale: u32) -> u32 {
        text.chars().count() as u32 * GLYPH_WIDTH * scale.max(1)
    }

    /// Draw a single line of text with its top-left corner at `(x, y)`.
    ///
    /// Characters outside the basic font map render as `?`.
    pub fn draw_text(&mut self, x: i32, y: i32, text: &str, color: Rgba<u8>, scale: u32) {
        let scale_i = scale.max(1) as i32;
        let mut cursor_x = x;
        for ch in text.chars() {
            let glyph = BASIC_FONTS.get(ch).or_else(|| BASIC_FONTS.get('?'));
            let Some(glyph) = glyph else {
                cursor_x += GLYPH_WIDTH as i32 * scale_i;
                continue;
            };
            for (row_idx, row) in glyph.iter().enumerate() {
                for col_idx in 0..8 {
                    // font8x8 stores LSB as leftmost pixel
                    if (row >> col_idx) & 1 == 0 {
                        continue;
                    }
                    let px = cursor_x + col_idx * scale_i;
                    let py = y + row_idx as i32 * scale_i;
                    for sy in 0..scale_i {
                        for sx in 0..scale_i {
                            self.blend_at(px + sx, py + sy, color);
                        }
                    }
                }
            }
            cursor_x += GLYPH_WIDTH as i32 * scale_i;
        }
    }

    /// Blit an image centered at `(cx, cy)`, resized so its longer side equals
    /// `size` pixels. Alpha in the source is respected.
    pub fn draw_image_centered(&mut self, src: &RgbaImage, cx: f64, cy: f64, size: u32) {
        if src.width() == 0 || src.height() == 0 || size == 0 {
            return;
        }
        let (w, h) = if src.width() >= src.height() {
            let h = (u64::from(size) * u64::from(src.height()) / u64::from(src.width())) as u32;
            (size, h.max(1))
        } else {
            let w = (u64::from(size) * u64::from(src.width()) / u64::from(src.height())) as u32;
            (w.max(1), size)
        };
        let scaled = image::imageops::resize(src, w, h, FilterType::Triangle);
        let x0 = (cx - f64::from(w) / 2.0).round() as i64;
        let y0 = (cy - f64::from(h) / 2.0).round() as i64;
        for (sx, sy, pixel) in scaled.enumerate_pixels() {
            self.blend_at((x0 + i64::from(sx)) as i32, (y0 + i64::from(sy)) as i32, *pixel);
        }
    }

    /// Encode the frame as PNG bytes
    pub fn to_png(&self) -> Result<Vec<u8>, image::ImageError> {
        let mut bytes = Vec::new();
        self.img
            .write_to(&mut Cursor::new(&mut bytes), image::ImageFormat::Png)?;
        Ok(bytes)
    }

    /// Consume the frame, returning the underlying buffer
    pub fn into_image(self) -> RgbaImage {
        self.img
    }

    /// Clip a float bounding box to valid pixel indices
    fn clip_box(&self, x0: f64, x1: f64, y0: f64, y1: f64) -> (i32, i32, i32, i32) {
        let max_x = self.img.width() as i32 - 1;
        let max_y = self.img.height() as i32 - 1;
        (
            (x0.floor() as i32).clamp(0, max_x.max(0)),
            (x1.ceil() as i32).clamp(0, max_x.max(0)),
            (y0.floor() as i32).clamp(0, max_y.max(0)),
            (y1.ceil() as i32).clamp(0, max_y.max(0)),
        )
    }
}

/// Source-over alpha blend of `src` onto `dst`
pub fn blend_pixel(dst: Rgba<u8>, src: Rgba<u8>) -> Rgba<u8> {
    let a = f64::from(src[3]) / 255.0;
    if a <= 0.0 {
        return dst;
    }
    let inv = 1.0 - a;
    let r = (f64::from(dst[0]) * inv + f64::from(src[0]) * a)
        .round()
        .clamp(0.0, 255.0) as u8;
    let g = (f64::from(dst[1]) * inv + f64::from(src[1]) * a)
        .round()
        .clamp(0.0, 255.0) as u8;
    let b = (f64::from(dst[2]) * inv + f64::from(src[2]) * a)
        .round()
        .clamp(0.0, 255.0) as u8;
    let out_a = (f64::from(src[3]) + f64::from(dst[3]) * inv)
        .round()
        .clamp(0.0, 255.0) as u8;
    Rgba([r, g, b, out_a])
}

fn triangle_area(a: (f64, f64), b: (f64, f64), c: (f64, f64)) -> f64 {
    ((a.0 * (b.1 - c.1) + b.0 * (c.1 - a.1) + c.0 * (a.1 - b.1)).abs()) / 2.0
}

fn point_in_triangle(p: (f64, f64), a: (f64, f64), b: (f64, f64), c: (f64, f64), eps: f64) -> bool {
    let total = triangle_area(a, b, c);
    if total <= eps {
        return false;
    }
    let a1 = triangle_area(p, b, c);
    let a2 = triangle_area(a, p, c);
    let a3 = triangle_area(a, b, p);
    (a1 + a2 + a3 - total).abs() <= eps
}

/// Rounded-rectangle membership test for `[x0, x1) x [y0, y1)`
pub fn point_in_rounded_rect(
    px: i32,
    py: i32,
    x0: i32,
    y0: i32,
    x1: i32,
    y1: i32,
    radius: f64,
) -> bool {
    if px < x0 || px >= x1 || py < y0 || py >= y1 {
        return false;
    }
    if radius <= 0.1 {
        return true;
    }
    let r = radius
        .min(f64::from((x1 - x0).abs()) / 2.0)
        .min(f64::from((y1 - y0).abs()) / 2.0);
    let fx = f64::from(px);
    let fy = f64::from(py);
    let left = f64::from(x0);
    let right = f64::from(x1);
    let top = f64::from(y0);
    let bottom = f64::from(y1);

    if (fx >= left + r && fx <= right - r) || (fy >= top + r && fy <= bottom - r) {
        return true;
    }

    let corners = [
        (left + r, top + r),
        (right - r, top + r),
        (left + r, bottom - r),
        (right - r, bottom - r),
    ];
    corners.iter().any(|(cx, cy)| {
        let dx = fx - cx;
        let dy = fy - cy;
        dx * dx + dy * dy <= r * r
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blend_pixel_opaque_replaces() {
        let dst = Rgba([10, 20, 30, 255]);
        let src = Rgba([200, 100, 50, 255]);
        assert_eq!(blend_pixel(dst, src), src);
    }

    #[test]
    fn test_blend_pixel_transparent_is_noop() {
        let dst = Rgba([10, 20, 30, 255]);
        let src = Rgba([200, 100, 50, 0]);
        assert_eq!(blend_pixel(dst, src), dst);
    }

    #[test]
    fn test_fill_disc_center_and_outside() {
        let mut frame = Frame::new(RgbaImage::from_pixel(40, 40, Rgba([0, 0, 0, 255])));
        frame.fill_disc(20.0, 20.0, 8.0, Rgba([255, 0, 0, 255]));
        assert_eq!(frame.get_pixel(20, 20), Rgba([255, 0, 0, 255]));
        // Corner of the bounding box stays untouched
        assert_eq!(frame.get_pixel(12, 12), Rgba([0, 0, 0, 255]));
    }

    #[test]
    fn test_fill_disc_off_edge_does_not_panic() {
        let mut frame = Frame::new(RgbaImage::from_pixel(10, 10, Rgba([0, 0, 0, 255])));
        frame.fill_disc(-5.0, -5.0, 8.0, Rgba([255, 0, 0, 255]));
        frame.fill_disc(100.0, 100.0, 8.0, Rgba([255, 0, 0, 255]));
        assert_eq!(frame.get_pixel(0, 0), Rgba([255, 0, 0, 255]));
    }

    #[test]
    fn test_fill_ring_leaves_center_open() {
        let mut frame = Frame::new(RgbaImage::from_pixel(40, 40, Rgba([0, 0, 0, 255])));
        frame.fill_ring(20.0, 20.0, 10.0, 3.0, Rgba([255, 255, 255, 255]), None);
        assert_eq!(frame.get_pixel(20, 20), Rgba([0, 0, 0, 255]));
        assert_eq!(frame.get_pixel(30, 20), Rgba([255, 255, 255, 255]));
    }

    #[test]
    fn test_fill_ring_dashed_has_gaps() {
        let mut frame = Frame::new(RgbaImage::from_pixel(60, 60, Rgba([0, 0, 0, 255])));
        frame.fill_ring(30.0, 30.0, 20.0, 3.0, Rgba([255, 255, 255, 255]), Some((20.0, 20.0)));
        let mut lit = 0;
        let mut dark = 0;
        for deg in 0..360 {
            let rad = f64::from(deg).to_radians();
            let x = (30.0 + 20.0 * rad.cos()).round() as u32;
            let y = (30.0 + 20.0 * rad.sin()).round() as u32;
            if frame.get_pixel(x, y)[0] > 128 {
                lit += 1;
            } else {
                dark += 1;
            }
        }
        assert!(lit > 0, "dashed ring should draw some arcs");
        assert!(dark > 0, "dashed ring should leave some gaps");
    }

    #[test]
    fn test_point_in_rounded_rect_corners() {
        // Square corner cells are outside once a radius is applied
        assert!(!point_in_rounded_rect(0, 0, 0, 0, 20, 20, 8.0));
        assert!(point_in_rounded_rect(10, 10, 0, 0, 20, 20, 8.0));
        assert!(point_in_rounded_rect(0, 10, 0, 0, 20, 20, 8.0));
        assert!(!point_in_rounded_rect(25, 10, 0, 0, 20, 20, 8.0));
    }

    #[test]
    fn test_measure_text_matches_advance() {
        assert_eq!(Frame::measure_text("", 1), 0);
        assert_eq!(Frame::measure_text("abc", 1), 24);
        assert_eq!(Frame::measure_text("abc", 2), 48);
    }

    #[test]
    fn test_draw_text_renders_pixels() {
        let mut frame = Frame::new(RgbaImage::from_pixel(80, 16, Rgba([0, 0, 0, 255])));
        frame.draw_text(0, 0, "Hi", Rgba([255, 255, 255, 255]), 1);
        let mut has_white = false;
        for y in 0..8 {
            for x in 0..16 {
                if frame.get_pixel(x, y) == Rgba([255, 255, 255, 255]) {
                    has_white = true;
                }
            }
        }
        assert!(has_white, "glyphs should produce foreground pixels");
    }

    #[test]
    fn test_draw_image_centered_scales_down() {
        let mut frame = Frame::new(RgbaImage::from_pixel(100, 100, Rgba([0, 0, 0, 255])));
        let icon = RgbaImage::from_pixel(128, 128, Rgba([0, 255, 0, 255]));
        frame.draw_image_centered(&icon, 50.0, 50.0, 64);
        assert_eq!(frame.get_pixel(50, 50), Rgba([0, 255, 0, 255]));
        // Outside the 64px box around the center
        assert_eq!(frame.get_pixel(10, 10), Rgba([0, 0, 0, 255]));
    }
}
