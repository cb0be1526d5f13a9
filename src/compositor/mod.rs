//! Image compositor: burns a click marker and an optional speech-bubble
//! annotation into a captured screenshot.
//!
//! Compositing is deliberately infallible from the caller's point of view.
//! Every failure mode (undecodable input, missing icon, bubble that will not
//! fit, encode error) degrades: the worst case is getting the original image
//! back untouched. The flags on [`CompositeResult`] report what was drawn.

pub mod bubble;
pub mod marker;
pub mod surface;
pub mod types;

pub use bubble::{BubbleLayout, plan_bubble, wrap_text};
pub use surface::Frame;
pub use types::{CompositeResult, MarkerShape, MarkerStyle, Point, RasterImage, parse_hex_color};

use image::Rgba;

use crate::config::CompositorConfig;

/// Alpha applied to the bubble body fill (over the marker color)
const BUBBLE_FILL_ALPHA: u8 = 230;

/// The marker/annotation compositing pipeline
#[derive(Debug, Clone, Default)]
pub struct Compositor {
    config: CompositorConfig,
}

impl Compositor {
    pub fn new(config: CompositorConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &CompositorConfig {
        &self.config
    }

    /// Composite a marker (and optionally a speech bubble) onto `raw`.
    ///
    /// `point` is in CSS pixels and is scaled by `device_pixel_ratio` here,
    /// exactly once; all drawing happens in the physical pixel space of the
    /// image. `icon` is the pre-fetched themed marker bitmap; pass `None` to
    /// get the fallback circle.
    pub fn compose(
        &self,
        raw: &RasterImage,
        point: Point,
        style: &MarkerStyle,
        annotation: Option<&str>,
        device_pixel_ratio: f64,
        icon: Option<&RasterImage>,
    ) -> CompositeResult {
        let mut frame = match Frame::from_png_bytes(&raw.data) {
            Ok(frame) => frame,
            Err(err) => {
                log::warn!("compositing degraded: could not decode capture: {}", err);
                return CompositeResult {
                    image: raw.clone(),
                    marker_drawn: false,
                    annotation_drawn: false,
                };
            }
        };

        let dpr = if device_pixel_ratio > 0.0 {
            device_pixel_ratio
        } else {
            1.0
        };
        let px = point.x * dpr;
        let py = point.y * dpr;

        let icon_img = icon.and_then(|asset| match asset.decode() {
            Ok(img) => Some(img),
            Err(err) => {
                log::warn!("marker icon undecodable, using fallback circle: {}", err);
                None
            }
        });

        let marker_radius =
            marker::draw_marker(&mut frame, &self.config, px, py, style, icon_img.as_ref());

        let mut annotation_drawn = false;
        let text = annotation.map(str::trim).unwrap_or("");
        if !text.is_empty() {
            match plan_bubble(
                &self.config,
                frame.width(),
                frame.height(),
                px,
                py,
                marker_radius,
                text,
            ) {
                Some(layout) => {
                    if layout.overflow {
                        log::warn!("annotation word exceeds bubble width, allowing overflow");
                    }
                    let fill = bubble_fill(style);
                    bubble::draw_bubble(&mut frame, &self.config, &layout, fill);
                    annotation_drawn = true;
                }
                None => {
                    log::warn!(
                        "annotation bubble skipped: no unclipped placement at ({:.0}, {:.0})",
                        px,
                        py
                    );
                }
            }
        }

        match RasterImage::from_rgba(&frame.into_image()) {
            Ok(image) => CompositeResult {
                image,
                marker_drawn: true,
                annotation_drawn,
            },
            Err(err) => {
                log::warn!("compositing degraded: could not encode result: {}", err);
                CompositeResult {
                    image: raw.clone(),
                    marker_drawn: false,
                    annotation_drawn: false,
                }
            }
        }
    }
}

/// Bubble body color derived from the marker color, near-opaque
fn bubble_fill(style: &MarkerStyle) -> Rgba<u8> {
    let [r, g, b] = parse_hex_color(&style.color).unwrap_or([0x3b, 0x82, 0xf6]);
    Rgba([r, g, b, BUBBLE_FILL_ALPHA])
}
