//! Configuration for the compositor and journey pipeline.
//!
//! All tunable pixel geometry and session limits live here as documented
//! constants, hoisted into explicit config structs that are passed into the
//! `Compositor` and `JourneyManager` constructors. Nothing in the crate
//! reads global mutable state.

// ============================================================================
// Journey Defaults
// ============================================================================

/// Maximum number of screenshots a single journey may accumulate
pub const MAX_JOURNEY_SCREENSHOTS: usize = 100;

/// Storage key under which the single journey session document is persisted
pub const JOURNEY_STORAGE_KEY: &str = "snapmark_journey";

/// Asset name of the themed marker icon requested from the icon provider
pub const MARKER_ICON_NAME: &str = "marker-64";

// ============================================================================
// Compositor Defaults
// ============================================================================

/// On-screen size of the themed marker icon (pixels, square)
pub const DEFAULT_ICON_SIZE: u32 = 64;

/// Width of the white border around the fallback circle marker
pub const DEFAULT_MARKER_BORDER: f64 = 2.5;

/// Drop shadow offset (x, y) for markers
pub const DEFAULT_SHADOW_OFFSET: (f64, f64) = (2.0, 3.0);

/// Drop shadow alpha (0-255)
pub const DEFAULT_SHADOW_ALPHA: u8 = 80;

/// Maximum speech bubble width including padding
pub const DEFAULT_BUBBLE_MAX_WIDTH: f64 = 200.0;

/// Minimum speech bubble width
pub const DEFAULT_BUBBLE_MIN_WIDTH: f64 = 80.0;

/// Inner padding between bubble border and text
pub const DEFAULT_BUBBLE_PADDING: f64 = 10.0;

/// Vertical gap between the marker edge and the bubble edge (tail spans it)
pub const DEFAULT_BUBBLE_GAP: f64 = 12.0;

/// Corner radius of the bubble rectangle
pub const DEFAULT_BUBBLE_RADIUS: f64 = 8.0;

/// Width of the tail triangle base
pub const DEFAULT_TAIL_WIDTH: f64 = 14.0;

/// Line height for bubble text
pub const DEFAULT_LINE_HEIGHT: f64 = 18.0;

/// Minimum distance kept between the bubble and the image edges
pub const DEFAULT_EDGE_MARGIN: f64 = 12.0;

/// Integer scale applied to the 8x8 glyph font when rendering bubble text
pub const DEFAULT_GLYPH_SCALE: u32 = 1;

/// Geometry and rendering parameters for the image compositor
#[derive(Debug, Clone)]
pub struct CompositorConfig {
    /// On-screen size of the themed marker icon (square, pixels)
    pub icon_size: u32,
    /// Border width of the fallback circle marker
    pub marker_border: f64,
    /// Drop shadow offset for markers
    pub shadow_offset: (f64, f64),
    /// Drop shadow alpha
    pub shadow_alpha: u8,
    /// Maximum bubble width including padding
    pub bubble_max_width: f64,
    /// Minimum bubble width
    pub bubble_min_width: f64,
    /// Inner bubble padding
    pub bubble_padding: f64,
    /// Gap between marker edge and bubble edge
    pub bubble_gap: f64,
    /// Bubble corner radius
    pub bubble_radius: f64,
    /// Tail triangle base width
    pub tail_width: f64,
    /// Text line height
    pub line_height: f64,
    /// Margin kept from the image edges when clamping the bubble
    pub edge_margin: f64,
    /// Glyph scale for bubble text (8x8 font times this factor)
    pub glyph_scale: u32,
}

impl Default for CompositorConfig {
    fn default() -> Self {
        Self {
            icon_size: DEFAULT_ICON_SIZE,
            marker_border: DEFAULT_MARKER_BORDER,
            shadow_offset: DEFAULT_SHADOW_OFFSET,
            shadow_alpha: DEFAULT_SHADOW_ALPHA,
            bubble_max_width: DEFAULT_BUBBLE_MAX_WIDTH,
            bubble_min_width: DEFAULT_BUBBLE_MIN_WIDTH,
            bubble_padding: DEFAULT_BUBBLE_PADDING,
            bubble_gap: DEFAULT_BUBBLE_GAP,
            bubble_radius: DEFAULT_BUBBLE_RADIUS,
            tail_width: DEFAULT_TAIL_WIDTH,
            line_height: DEFAULT_LINE_HEIGHT,
            edge_margin: DEFAULT_EDGE_MARGIN,
            glyph_scale: DEFAULT_GLYPH_SCALE,
        }
    }
}

/// Limits and persistence parameters for the journey session manager
#[derive(Debug, Clone)]
pub struct JourneyConfig {
    /// Maximum screenshots per journey
    pub max_screenshots: usize,
    /// Storage key for the persisted session document
    pub storage_key: String,
}

impl Default for JourneyConfig {
    fn default() -> Self {
        Self {
            max_screenshots: MAX_JOURNEY_SCREENSHOTS,
            storage_key: JOURNEY_STORAGE_KEY.to_string(),
        }
    }
}
