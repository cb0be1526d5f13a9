//! Platform provider contracts and in-process implementations.
//!
//! The capture core talks to the host platform exclusively through these
//! traits: a visible-surface capture source, a key-value persistence store
//! with distinguishable quota errors, a download sink, a themed-icon asset
//! source, and a read-only settings source. Suspension points in the whole
//! pipeline are exactly the calls into these providers.
//!
//! The in-process implementations (`MemoryStorage`, `MemoryDownloads`,
//! `FileDownloads`, `StaticCapture`, `StaticIcons`, `StaticSettings`) back
//! the CLI and the test suite.

use serde_json::Value;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::Mutex;

use crate::compositor::RasterImage;

// ============================================================================
// Errors
// ============================================================================

/// Persistence provider failure
#[derive(Debug, Clone)]
pub enum StorageError {
    /// The store rejected the write for capacity reasons; user-actionable
    QuotaExceeded(String),
    /// Any other storage failure
    Io(String),
}

impl std::fmt::Display for StorageError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StorageError::QuotaExceeded(_) => {
                write!(f, "Storage is full, try again in a moment")
            }
            StorageError::Io(msg) => write!(f, "Storage error: {}", msg),
        }
    }
}

impl std::error::Error for StorageError {}

/// Download provider failure
#[derive(Debug, Clone)]
pub enum DownloadError {
    /// The provider rejected the download request
    Rejected(String),
    /// The underlying write failed
    Io(String),
}

impl std::fmt::Display for DownloadError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DownloadError::Rejected(msg) => write!(f, "Download rejected: {}", msg),
            DownloadError::Io(msg) => write!(f, "Download failed: {}", msg),
        }
    }
}

impl std::error::Error for DownloadError {}

/// Capture provider failure: no visible surface to capture
#[derive(Debug, Clone)]
pub struct NoActiveSurfaceError(pub String);

impl std::fmt::Display for NoActiveSurfaceError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "No active page to capture: {}", self.0)
    }
}

impl std::error::Error for NoActiveSurfaceError {}

/// Icon asset provider failure
#[derive(Debug, Clone)]
pub struct IconError(pub String);

impl std::fmt::Display for IconError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Icon asset unavailable: {}", self.0)
    }
}

impl std::error::Error for IconError {}

// ============================================================================
// Provider traits
// ============================================================================

/// Captures the currently visible surface as a PNG raster
#[allow(async_fn_in_trait)]
pub trait CaptureProvider {
    async fn capture_visible_surface(&self) -> Result<RasterImage, NoActiveSurfaceError>;
}

/// Whole-document key-value persistence.
///
/// Quota failures must come back as [`StorageError::QuotaExceeded`] so
/// callers can surface a specific "storage full" condition.
#[allow(async_fn_in_trait)]
pub trait StorageProvider {
    async fn get(&self, key: &str) -> Result<Option<Value>, StorageError>;
    async fn set(&self, key: &str, value: Value) -> Result<(), StorageError>;
    async fn remove(&self, key: &str) -> Result<(), StorageError>;
}

/// Writes named files and returns an opaque download identifier
#[allow(async_fn_in_trait)]
pub trait DownloadProvider {
    async fn download(&self, bytes: &[u8], suggested_path: &str) -> Result<String, DownloadError>;
}

/// Fetches themed raster assets by name
#[allow(async_fn_in_trait)]
pub trait IconProvider {
    async fn fetch_asset(&self, name: &str) -> Result<RasterImage, IconError>;
}

/// Read side of the settings store
#[allow(async_fn_in_trait)]
pub trait SettingsSource {
    async fn get_settings(&self) -> Result<Option<Value>, StorageError>;
}

// ============================================================================
// In-process implementations
// ============================================================================

/// In-memory key-value store with an optional byte quota.
///
/// Clones share the same underlying map, so a handle kept outside a
/// consumer still observes its writes.
#[derive(Debug, Clone, Default)]
pub struct MemoryStorage {
    entries: Arc<Mutex<HashMap<String, Value>>>,
    quota_bytes: Option<usize>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// A store that rejects any single value whose JSON encoding exceeds
    /// `quota_bytes`
    pub fn with_quota(quota_bytes: usize) -> Self {
        Self {
            entries: Arc::new(Mutex::new(HashMap::new())),
            quota_bytes: Some(quota_bytes),
        }
    }
}

impl StorageProvider for MemoryStorage {
    async fn get(&self, key: &str) -> Result<Option<Value>, StorageError> {
        Ok(self.entries.lock().await.get(key).cloned())
    }

    async fn set(&self, key: &str, value: Value) -> Result<(), StorageError> {
        if let Some(quota) = self.quota_bytes {
            let size = value.to_string().len();
            if size > quota {
                return Err(StorageError::QuotaExceeded(format!(
                    "{} bytes exceeds quota of {}",
                    size, quota
                )));
            }
        }
        self.entries.lock().await.insert(key.to_string(), value);
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<(), StorageError> {
        self.entries.lock().await.remove(key);
        Ok(())
    }
}

/// In-memory download sink that records every issued file.
///
/// Clones share the same file list. Optionally rejects paths containing a
/// given substring, which lets tests exercise the skip-and-continue export
/// policy.
#[derive(Debug, Clone, Default)]
pub struct MemoryDownloads {
    files: Arc<Mutex<Vec<(String, Vec<u8>)>>>,
    reject_containing: Option<String>,
}

impl MemoryDownloads {
    pub fn new() -> Self {
        Self::default()
    }

    /// A sink that rejects any path containing `fragment`
    pub fn rejecting(fragment: impl Into<String>) -> Self {
        Self {
            files: Arc::new(Mutex::new(Vec::new())),
            reject_containing: Some(fragment.into()),
        }
    }

    /// Snapshot of every `(path, bytes)` pair written so far
    pub async fn files(&self) -> Vec<(String, Vec<u8>)> {
        self.files.lock().await.clone()
    }
}

impl DownloadProvider for MemoryDownloads {
    async fn download(&self, bytes: &[u8], suggested_path: &str) -> Result<String, DownloadError> {
        if let Some(fragment) = &self.reject_containing {
            if suggested_path.contains(fragment.as_str()) {
                return Err(DownloadError::Rejected(format!(
                    "path matches rejection filter: {}",
                    suggested_path
                )));
            }
        }
        let mut files = self.files.lock().await;
        files.push((suggested_path.to_string(), bytes.to_vec()));
        Ok(format!("dl-{}", files.len()))
    }
}

/// Download sink that writes files under a root directory
#[derive(Debug, Clone)]
pub struct FileDownloads {
    root: PathBuf,
}

impl FileDownloads {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

impl DownloadProvider for FileDownloads {
    async fn download(&self, bytes: &[u8], suggested_path: &str) -> Result<String, DownloadError> {
        let target = self.root.join(suggested_path);
        if let Some(parent) = target.parent() {
            std::fs::create_dir_all(parent).map_err(|e| DownloadError::Io(e.to_string()))?;
        }
        std::fs::write(&target, bytes).map_err(|e| DownloadError::Io(e.to_string()))?;
        Ok(target.to_string_lossy().to_string())
    }
}

/// Capture source backed by a fixed image (or nothing)
#[derive(Debug, Clone, Default)]
pub struct StaticCapture {
    image: Option<RasterImage>,
}

impl StaticCapture {
    pub fn new(image: RasterImage) -> Self {
        Self { image: Some(image) }
    }

    /// A capture source with no visible surface
    pub fn unavailable() -> Self {
        Self { image: None }
    }
}

impl CaptureProvider for StaticCapture {
    async fn capture_visible_surface(&self) -> Result<RasterImage, NoActiveSurfaceError> {
        self.image
            .clone()
            .ok_or_else(|| NoActiveSurfaceError("no visible surface".to_string()))
    }
}

/// Icon source backed by a fixed asset (or nothing)
#[derive(Debug, Clone, Default)]
pub struct StaticIcons {
    icon: Option<RasterImage>,
}

impl StaticIcons {
    pub fn new(icon: RasterImage) -> Self {
        Self { icon: Some(icon) }
    }

    /// An icon source with no assets
    pub fn empty() -> Self {
        Self { icon: None }
    }
}

impl IconProvider for StaticIcons {
    async fn fetch_asset(&self, name: &str) -> Result<RasterImage, IconError> {
        self.icon
            .clone()
            .ok_or_else(|| IconError(format!("no asset named {}", name)))
    }
}

/// Settings source backed by a fixed JSON document (or nothing)
#[derive(Debug, Clone, Default)]
pub struct StaticSettings {
    value: Option<Value>,
}

impl StaticSettings {
    pub fn new(value: Value) -> Self {
        Self { value: Some(value) }
    }

    pub fn absent() -> Self {
        Self { value: None }
    }
}

impl SettingsSource for StaticSettings {
    async fn get_settings(&self) -> Result<Option<Value>, StorageError> {
        Ok(self.value.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_memory_storage_roundtrip() {
        let storage = MemoryStorage::new();
        assert_eq!(storage.get("k").await.unwrap(), None);
        storage.set("k", json!({"a": 1})).await.unwrap();
        assert_eq!(storage.get("k").await.unwrap(), Some(json!({"a": 1})));
        storage.remove("k").await.unwrap();
        assert_eq!(storage.get("k").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_memory_storage_quota() {
        let storage = MemoryStorage::with_quota(8);
        let err = storage
            .set("k", json!("a very long string value"))
            .await
            .unwrap_err();
        assert!(matches!(err, StorageError::QuotaExceeded(_)));
        assert_eq!(storage.get("k").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_memory_downloads_records_and_rejects() {
        let downloads = MemoryDownloads::rejecting("bad");
        let id = downloads.download(b"data", "ok/file.png").await.unwrap();
        assert_eq!(id, "dl-1");
        let err = downloads.download(b"data", "bad/file.png").await.unwrap_err();
        assert!(matches!(err, DownloadError::Rejected(_)));
        assert_eq!(downloads.files().await.len(), 1);
    }

    #[tokio::test]
    async fn test_file_downloads_writes_nested_path() {
        let dir = tempfile::tempdir().unwrap();
        let downloads = FileDownloads::new(dir.path());
        let id = downloads.download(b"png", "folder/file.png").await.unwrap();
        assert!(std::path::Path::new(&id).exists());
        assert_eq!(std::fs::read(dir.path().join("folder/file.png")).unwrap(), b"png");
    }

    #[tokio::test]
    async fn test_static_capture_unavailable() {
        let capture = StaticCapture::unavailable();
        assert!(capture.capture_visible_surface().await.is_err());
    }
}
