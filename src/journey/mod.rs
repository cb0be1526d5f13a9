//! Journey session state machine: a single persisted recording session that
//! accumulates ordered captures under a capacity limit and exports them as a
//! batch.
//!
//! The persisted session is always handled as a whole document: every
//! mutating operation re-reads the latest stored state, modifies it, and
//! writes it back. Racing writers resolve last-writer-wins at the storage
//! layer; callers that need stricter ordering serialize their own calls.

pub mod types;

pub use types::{
    CaptureRecord, JourneyError, JourneyInfo, JourneyMetadata, JourneyResult, JourneySession,
    JourneyStats, MetadataEntry, NewCapture, SaveReport,
};

use chrono::Utc;

use crate::config::JourneyConfig;
use crate::organizer::build_path;
use crate::providers::{DownloadProvider, StorageProvider};

/// Filename of the aggregate export document inside the journey folder
const METADATA_FILENAME: &str = "journey_metadata.json";

/// Owns all write access to the single persisted journey session
#[derive(Debug)]
pub struct JourneyManager<S, D> {
    storage: S,
    downloads: D,
    config: JourneyConfig,
}

impl<S: StorageProvider, D: DownloadProvider> JourneyManager<S, D> {
    pub fn new(storage: S, downloads: D, config: JourneyConfig) -> Self {
        Self {
            storage,
            downloads,
            config,
        }
    }

    /// Begin a new journey.
    ///
    /// Always creates a fresh active session; an existing session, active or
    /// not, is overwritten and its unsaved contents discarded. The new
    /// session is persisted before this returns.
    pub async fn start_journey(&self) -> JourneyResult<JourneySession> {
        let session = JourneySession::started_at(now_ms());
        self.persist(&session).await?;
        log::debug!("journey started at {}", session.start_time_ms);
        Ok(session)
    }

    /// Append a capture to the active journey.
    ///
    /// Fails when no active session exists or the capacity limit is reached;
    /// otherwise assigns the next sequence number, persists, and returns the
    /// stored record.
    pub async fn add_screenshot(&self, capture: NewCapture) -> JourneyResult<CaptureRecord> {
        let mut session = self.load().await?.ok_or(JourneyError::NotActive)?;
        if !session.is_active {
            return Err(JourneyError::NotActive);
        }
        if session.screenshots.len() >= self.config.max_screenshots {
            return Err(JourneyError::CapacityReached(self.config.max_screenshots));
        }

        let timestamp_ms = now_ms();
        let sequence = session.screenshots.len() as u32 + 1;
        let record = CaptureRecord {
            id: format!("cap-{}-{:03}", timestamp_ms, sequence),
            sequence,
            image_bytes: capture.image_bytes,
            timestamp_ms,
            source_url: capture.source_url,
            coordinates: capture.coordinates,
            annotation: capture.annotation,
            element_info: capture.element_info,
        };
        session.screenshots.push(record.clone());
        self.persist(&session).await?;
        log::debug!(
            "journey screenshot {} of {} recorded",
            sequence,
            self.config.max_screenshots
        );
        Ok(record)
    }

    /// Stop the active journey, stamping its end time
    pub async fn stop_journey(&self) -> JourneyResult<JourneySession> {
        let mut session = self.load().await?.ok_or(JourneyError::NotActive)?;
        if !session.is_active {
            return Err(JourneyError::NotActive);
        }
        session.is_active = false;
        session.end_time_ms = Some(now_ms());
        self.persist(&session).await?;
        log::debug!(
            "journey stopped with {} screenshots",
            session.screenshots.len()
        );
        Ok(session)
    }

    /// Export every screenshot plus the aggregate metadata document.
    ///
    /// Per-item download failures are logged and skipped; the remaining
    /// items still go out, and the outcomes are collected in the returned
    /// [`SaveReport`]. The metadata file is best-effort: its failure never
    /// fails the save. A save where every item failed still returns `Ok`
    /// with an empty id list.
    pub async fn save_collection(&self) -> JourneyResult<SaveReport> {
        let session = self.load().await?.ok_or(JourneyError::EmptyJourney)?;
        if session.screenshots.is_empty() {
            return Err(JourneyError::EmptyJourney);
        }

        // One folder per journey, keyed on the first capture's origin and
        // the session start time.
        let folder = build_path(
            &session.screenshots[0].source_url,
            session.start_time_ms,
            Some(1),
        )
        .folder;

        let mut item_results = Vec::with_capacity(session.screenshots.len());
        for record in &session.screenshots {
            let filename = build_path(
                &record.source_url,
                record.timestamp_ms,
                Some(record.sequence),
            )
            .filename;
            let path = format!("{}/{}", folder, filename);
            let result = self.downloads.download(&record.image_bytes, &path).await;
            if let Err(err) = &result {
                log::warn!(
                    "journey item {} failed to save, continuing: {}",
                    record.sequence,
                    err
                );
            }
            item_results.push(result);
        }

        let metadata = JourneyMetadata::for_session(&session, now_ms());
        let metadata_id = match serde_json::to_vec_pretty(&metadata) {
            Ok(bytes) => {
                let path = format!("{}/{}", folder, METADATA_FILENAME);
                match self.downloads.download(&bytes, &path).await {
                    Ok(id) => Some(id),
                    Err(err) => {
                        log::warn!("journey metadata file failed to save: {}", err);
                        None
                    }
                }
            }
            Err(err) => {
                log::warn!("journey metadata could not be encoded: {}", err);
                None
            }
        };

        Ok(SaveReport {
            item_results,
            metadata_id,
        })
    }

    /// Delete the persisted session. Idempotent: clearing an absent session
    /// is not an error.
    pub async fn clear(&self) -> JourneyResult<()> {
        self.storage.remove(&self.config.storage_key).await?;
        log::debug!("journey cleared");
        Ok(())
    }

    /// Read-only snapshot of the persisted session, if any
    pub async fn get_state(&self) -> JourneyResult<Option<JourneySession>> {
        self.load().await
    }

    /// Derived stats for the persisted session, if any
    pub async fn get_stats(&self) -> JourneyResult<Option<JourneyStats>> {
        Ok(self.load().await?.map(|s| s.stats_at(now_ms())))
    }

    async fn load(&self) -> JourneyResult<Option<JourneySession>> {
        match self.storage.get(&self.config.storage_key).await? {
            Some(value) => Ok(Some(serde_json::from_value(value)?)),
            None => Ok(None),
        }
    }

    async fn persist(&self, session: &JourneySession) -> JourneyResult<()> {
        let value = serde_json::to_value(session)?;
        self.storage.set(&self.config.storage_key, value).await?;
        Ok(())
    }
}

fn now_ms() -> i64 {
    Utc::now().timestamp_millis()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compositor::Point;
    use crate::providers::{MemoryDownloads, MemoryStorage};

    fn manager() -> JourneyManager<MemoryStorage, MemoryDownloads> {
        JourneyManager::new(
            MemoryStorage::new(),
            MemoryDownloads::new(),
            JourneyConfig::default(),
        )
    }

    fn capture(url: &str) -> NewCapture {
        NewCapture {
            image_bytes: vec![0x89, 0x50, 0x4E, 0x47],
            source_url: url.to_string(),
            coordinates: Point::new(5.0, 6.0),
            annotation: None,
            element_info: None,
        }
    }

    #[tokio::test]
    async fn test_start_overwrites_existing_session() {
        let manager = manager();
        manager.start_journey().await.unwrap();
        manager
            .add_screenshot(capture("https://a.example"))
            .await
            .unwrap();
        let fresh = manager.start_journey().await.unwrap();
        assert!(fresh.screenshots.is_empty());
        let stored = manager.get_state().await.unwrap().unwrap();
        assert!(stored.screenshots.is_empty());
    }

    #[tokio::test]
    async fn test_add_after_stop_is_rejected() {
        let manager = manager();
        manager.start_journey().await.unwrap();
        manager.stop_journey().await.unwrap();
        let err = manager
            .add_screenshot(capture("https://a.example"))
            .await
            .unwrap_err();
        assert!(matches!(err, JourneyError::NotActive));
    }

    #[tokio::test]
    async fn test_stop_without_session_is_rejected() {
        let manager = manager();
        assert!(matches!(
            manager.stop_journey().await.unwrap_err(),
            JourneyError::NotActive
        ));
    }

    #[tokio::test]
    async fn test_save_empty_journey_is_rejected() {
        let manager = manager();
        manager.start_journey().await.unwrap();
        assert!(matches!(
            manager.save_collection().await.unwrap_err(),
            JourneyError::EmptyJourney
        ));
    }

    #[tokio::test]
    async fn test_save_continues_past_item_failures() {
        // Reject the image files but let the metadata JSON through.
        let manager = JourneyManager::new(
            MemoryStorage::new(),
            MemoryDownloads::rejecting(".png"),
            JourneyConfig::default(),
        );
        manager.start_journey().await.unwrap();
        manager
            .add_screenshot(capture("https://a.example"))
            .await
            .unwrap();
        manager
            .add_screenshot(capture("https://a.example"))
            .await
            .unwrap();

        let report = manager.save_collection().await.unwrap();
        assert_eq!(report.failed_count(), 2);
        assert!(report.issued_ids().is_empty());
        assert!(report.metadata_id.is_some(), "metadata still goes out");
    }

    #[tokio::test]
    async fn test_clear_is_idempotent() {
        let manager = manager();
        manager.clear().await.unwrap();
        manager.start_journey().await.unwrap();
        manager.clear().await.unwrap();
        manager.clear().await.unwrap();
        assert!(manager.get_state().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_quota_error_stays_distinguishable() {
        let manager = JourneyManager::new(
            MemoryStorage::with_quota(10),
            MemoryDownloads::new(),
            JourneyConfig::default(),
        );
        let err = manager.start_journey().await.unwrap_err();
        assert!(matches!(
            err,
            JourneyError::Storage(crate::providers::StorageError::QuotaExceeded(_))
        ));
    }
}
