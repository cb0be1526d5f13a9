//! snapmark - annotated screenshot compositing and journey capture.
//!
//! This crate provides:
//! - A marker/speech-bubble compositor that burns click locations and
//!   word-wrapped annotations into captured PNG images
//! - A journey session state machine with bounded accumulation and batch
//!   export (images plus an aggregate metadata JSON)
//! - Deterministic, collision-resistant save-path derivation from URLs
//! - Schema-driven settings validation with best-effort sanitization
//! - Narrow provider traits for the host platform (capture, storage,
//!   download, icon assets), with in-process implementations for tests
//!
//! # Example
//!
//! ```rust,no_run
//! use snapmark::{Compositor, MarkerStyle, Point, RasterImage};
//!
//! let raw = RasterImage::from_png_bytes(std::fs::read("page.png").unwrap()).unwrap();
//! let compositor = Compositor::default();
//! let result = compositor.compose(
//!     &raw,
//!     Point::new(120.0, 80.0),
//!     &MarkerStyle::default(),
//!     Some("Users expect the filter here"),
//!     1.0,
//!     None,
//! );
//! std::fs::write("annotated.png", &result.image.data).unwrap();
//! ```

pub mod capture;
pub mod compositor;
pub mod config;
pub mod journey;
pub mod organizer;
pub mod providers;
pub mod settings;

// Re-export compositor types
pub use compositor::{
    CompositeResult, Compositor, Frame, MarkerShape, MarkerStyle, Point, RasterImage,
};

// Re-export configuration
pub use config::{CompositorConfig, JourneyConfig, MAX_JOURNEY_SCREENSHOTS};

// Re-export journey types
pub use journey::{
    CaptureRecord, JourneyError, JourneyManager, JourneyMetadata, JourneyResult, JourneySession,
    JourneyStats, NewCapture, SaveReport,
};

// Re-export capture service
pub use capture::{CaptureError, CaptureOutcome, CaptureService};

// Re-export path derivation
pub use organizer::{SavePath, build_path};

// Re-export settings validation
pub use settings::{ValidationReport, resolve_marker_style, validate};

// Re-export provider contracts and in-process implementations
pub use providers::{
    CaptureProvider, DownloadError, DownloadProvider, FileDownloads, IconError, IconProvider,
    MemoryDownloads, MemoryStorage, NoActiveSurfaceError, SettingsSource, StaticCapture,
    StaticIcons, StaticSettings, StorageError, StorageProvider,
};
