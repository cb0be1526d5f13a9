//! Single-capture orchestration: grab the visible surface, resolve the
//! effective marker style, composite, and hand the result to the download
//! provider.
//!
//! Degrade policy: settings retrieval and icon fetch failures fall back to
//! defaults, and a compositing failure saves the original capture. Only a
//! missing surface or a download failure surface as errors.

use chrono::Utc;

use crate::compositor::{CompositeResult, Compositor, Point, RasterImage};
use crate::config::MARKER_ICON_NAME;
use crate::journey::NewCapture;
use crate::organizer::{SavePath, build_path};
use crate::providers::{
    CaptureProvider, DownloadError, DownloadProvider, IconProvider, SettingsSource,
};
use crate::settings::resolve_marker_style;

/// Result type for single-capture operations
pub type CaptureResult<T> = Result<T, CaptureError>;

/// Error types for single-capture operations
#[derive(Debug)]
pub enum CaptureError {
    /// No visible page context to capture
    Unavailable(String),
    /// The download provider rejected or failed the save
    Download(DownloadError),
}

impl std::fmt::Display for CaptureError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CaptureError::Unavailable(msg) => write!(f, "No active page to capture: {}", msg),
            CaptureError::Download(err) => write!(f, "{}", err),
        }
    }
}

impl std::error::Error for CaptureError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CaptureError::Unavailable(_) => None,
            CaptureError::Download(err) => Some(err),
        }
    }
}

impl From<DownloadError> for CaptureError {
    fn from(err: DownloadError) -> Self {
        CaptureError::Download(err)
    }
}

/// What a successful single capture produced
#[derive(Debug, Clone)]
pub struct CaptureOutcome {
    /// Download identifier returned by the provider
    pub download_id: String,
    /// Where the file was saved
    pub path: SavePath,
    /// The composited (or original, when degraded) image
    pub image: RasterImage,
    /// Whether the marker made it into the saved image
    pub marker_drawn: bool,
    /// Whether the annotation bubble made it into the saved image
    pub annotation_drawn: bool,
}

/// One-shot capture service wired to the platform providers
#[derive(Debug)]
pub struct CaptureService<C, D, G, I> {
    capture: C,
    downloads: D,
    settings: G,
    icons: I,
    compositor: Compositor,
}

impl<C, D, G, I> CaptureService<C, D, G, I>
where
    C: CaptureProvider,
    D: DownloadProvider,
    G: SettingsSource,
    I: IconProvider,
{
    pub fn new(capture: C, downloads: D, settings: G, icons: I, compositor: Compositor) -> Self {
        Self {
            capture,
            downloads,
            settings,
            icons,
            compositor,
        }
    }

    /// Capture the visible surface, burn in the marker and optional
    /// annotation at `point`, and save the result.
    pub async fn capture_and_save(
        &self,
        source_url: &str,
        point: Point,
        annotation: Option<&str>,
        device_pixel_ratio: f64,
    ) -> CaptureResult<CaptureOutcome> {
        let CompositeResult {
            image,
            marker_drawn,
            annotation_drawn,
        } = self.composite_capture(point, annotation, device_pixel_ratio).await?;

        let path = build_path(source_url, Utc::now().timestamp_millis(), None);
        let download_id = self.downloads.download(&image.data, &path.joined()).await?;

        Ok(CaptureOutcome {
            download_id,
            path,
            image,
            marker_drawn,
            annotation_drawn,
        })
    }

    /// Capture and composite for an active journey: the same pipeline as
    /// [`Self::capture_and_save`] minus the download, returning a record
    /// ready for `JourneyManager::add_screenshot`.
    pub async fn capture_for_journey(
        &self,
        source_url: &str,
        point: Point,
        annotation: Option<&str>,
        device_pixel_ratio: f64,
    ) -> CaptureResult<NewCapture> {
        let result = self
            .composite_capture(point, annotation, device_pixel_ratio)
            .await?;
        Ok(NewCapture {
            image_bytes: result.image.data,
            source_url: source_url.to_string(),
            coordinates: point,
            annotation: annotation
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string),
            element_info: None,
        })
    }

    /// Shared capture pipeline: grab the surface, resolve the effective
    /// style, pre-fetch the icon, composite.
    async fn composite_capture(
        &self,
        point: Point,
        annotation: Option<&str>,
        device_pixel_ratio: f64,
    ) -> CaptureResult<CompositeResult> {
        let raw = self
            .capture
            .capture_visible_surface()
            .await
            .map_err(|err| CaptureError::Unavailable(err.0))?;

        let style = match self.settings.get_settings().await {
            Ok(settings) => resolve_marker_style(settings.as_ref()),
            Err(err) => {
                log::warn!("settings unavailable, using default marker style: {}", err);
                resolve_marker_style(None)
            }
        };

        let icon = match self.icons.fetch_asset(MARKER_ICON_NAME).await {
            Ok(asset) => Some(asset),
            Err(err) => {
                log::debug!("marker icon not available, using fallback circle: {}", err);
                None
            }
        };

        Ok(self.compositor.compose(
            &raw,
            point,
            &style,
            annotation,
            device_pixel_ratio,
            icon.as_ref(),
        ))
    }
}
