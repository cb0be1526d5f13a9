//! Records, errors, and derived views for journey sessions.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashSet;

use crate::compositor::Point;
use crate::providers::{DownloadError, StorageError};

/// One accepted capture inside a journey.
///
/// Immutable after creation; the only thing that ever happens to it is
/// being appended to a session's ordered list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CaptureRecord {
    pub id: String,
    /// 1-based position within the journey
    pub sequence: u32,
    /// PNG bytes, base64 inside the persisted JSON document
    #[serde(with = "png_base64")]
    pub image_bytes: Vec<u8>,
    pub timestamp_ms: i64,
    pub source_url: String,
    pub coordinates: Point,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub annotation: Option<String>,
    /// Opaque host-provided element descriptor
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub element_info: Option<Value>,
}

/// The single persisted journey document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JourneySession {
    pub is_active: bool,
    pub start_time_ms: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_time_ms: Option<i64>,
    pub screenshots: Vec<CaptureRecord>,
}

impl JourneySession {
    /// A fresh active session starting now
    pub fn started_at(start_time_ms: i64) -> Self {
        Self {
            is_active: true,
            start_time_ms,
            end_time_ms: None,
            screenshots: Vec::new(),
        }
    }

    /// Derived read-only stats; `now_ms` supplies the duration endpoint for
    /// a still-active session.
    pub fn stats_at(&self, now_ms: i64) -> JourneyStats {
        let end = if self.is_active {
            now_ms
        } else {
            self.end_time_ms.unwrap_or(now_ms)
        };
        let unique_urls = self
            .screenshots
            .iter()
            .map(|s| s.source_url.as_str())
            .collect::<HashSet<_>>()
            .len();

        let mut timestamps: Vec<i64> = self.screenshots.iter().map(|s| s.timestamp_ms).collect();
        timestamps.sort_unstable();
        let average_gap_ms = if timestamps.len() < 2 {
            None
        } else {
            let total: i64 = timestamps.windows(2).map(|w| w[1] - w[0]).sum();
            Some(total / (timestamps.len() as i64 - 1))
        };

        JourneyStats {
            screenshot_count: self.screenshots.len(),
            duration_ms: (end - self.start_time_ms).max(0),
            unique_urls,
            average_gap_ms,
        }
    }
}

/// Read-only view over a session
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct JourneyStats {
    pub screenshot_count: usize,
    pub duration_ms: i64,
    pub unique_urls: usize,
    /// Mean interval between consecutive captures; absent below 2 captures
    pub average_gap_ms: Option<i64>,
}

/// Input for `add_screenshot`: everything but the manager-assigned fields
#[derive(Debug, Clone)]
pub struct NewCapture {
    pub image_bytes: Vec<u8>,
    pub source_url: String,
    pub coordinates: Point,
    pub annotation: Option<String>,
    pub element_info: Option<Value>,
}

/// Outcome of `save_collection`.
///
/// The per-item download outcomes are kept verbatim so the skip-and-continue
/// policy stays visible in the return type rather than being swallowed.
#[derive(Debug, Clone)]
pub struct SaveReport {
    /// One entry per screenshot, in sequence order
    pub item_results: Vec<Result<String, DownloadError>>,
    /// Identifier of the metadata file, when it was written
    pub metadata_id: Option<String>,
}

impl SaveReport {
    /// Identifiers of the downloads that were actually issued
    pub fn issued_ids(&self) -> Vec<String> {
        self.item_results
            .iter()
            .filter_map(|r| r.as_ref().ok().cloned())
            .collect()
    }

    pub fn failed_count(&self) -> usize {
        self.item_results.iter().filter(|r| r.is_err()).count()
    }
}

// ============================================================================
// Export metadata (the JSON file emitted alongside a saved journey)
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JourneyMetadata {
    pub journey_info: JourneyInfo,
    pub screenshots: Vec<MetadataEntry>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JourneyInfo {
    pub start_time: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_time: Option<i64>,
    pub screenshot_count: usize,
    pub duration: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetadataEntry {
    pub id: String,
    pub sequence: u32,
    pub timestamp: i64,
    pub url: String,
    pub coordinates: Point,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub annotation: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub element_info: Option<Value>,
}

impl JourneyMetadata {
    /// Build the aggregate export document for a session, using `now_ms` to
    /// close the duration of a session that was never stopped.
    pub fn for_session(session: &JourneySession, now_ms: i64) -> Self {
        let stats = session.stats_at(now_ms);
        Self {
            journey_info: JourneyInfo {
                start_time: session.start_time_ms,
                end_time: session.end_time_ms,
                screenshot_count: stats.screenshot_count,
                duration: stats.duration_ms,
            },
            screenshots: session
                .screenshots
                .iter()
                .map(|record| MetadataEntry {
                    id: record.id.clone(),
                    sequence: record.sequence,
                    timestamp: record.timestamp_ms,
                    url: record.source_url.clone(),
                    coordinates: record.coordinates,
                    annotation: record.annotation.clone(),
                    element_info: record.element_info.clone(),
                })
                .collect(),
        }
    }
}

// ============================================================================
// Errors
// ============================================================================

/// Result type for journey operations
pub type JourneyResult<T> = Result<T, JourneyError>;

/// Error types for journey operations
#[derive(Debug)]
pub enum JourneyError {
    /// An operation that needs an active session found none
    NotActive,
    /// The journey already holds the maximum number of screenshots
    CapacityReached(usize),
    /// `save_collection` on a session with no screenshots
    EmptyJourney,
    /// Persistence failure (quota errors stay distinguishable)
    Storage(StorageError),
    /// The persisted document could not be encoded or decoded
    Serialization(serde_json::Error),
}

impl std::fmt::Display for JourneyError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            JourneyError::NotActive => write!(f, "No active journey to add screenshot to"),
            JourneyError::CapacityReached(max) => {
                write!(f, "Maximum of {} screenshots per journey", max)
            }
            JourneyError::EmptyJourney => write!(f, "No screenshots in journey to save"),
            JourneyError::Storage(err) => write!(f, "{}", err),
            JourneyError::Serialization(err) => write!(f, "Journey data error: {}", err),
        }
    }
}

impl std::error::Error for JourneyError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            JourneyError::Storage(err) => Some(err),
            JourneyError::Serialization(err) => Some(err),
            _ => None,
        }
    }
}

impl From<StorageError> for JourneyError {
    fn from(err: StorageError) -> Self {
        JourneyError::Storage(err)
    }
}

impl From<serde_json::Error> for JourneyError {
    fn from(err: serde_json::Error) -> Self {
        JourneyError::Serialization(err)
    }
}

/// Base64 (de)serialization for PNG payloads inside JSON documents
mod png_base64 {
    use base64::Engine;
    use base64::engine::general_purpose::STANDARD;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&STANDARD.encode(bytes))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let encoded = String::deserialize(deserializer)?;
        STANDARD
            .decode(encoded.as_bytes())
            .map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn record(seq: u32, timestamp_ms: i64, url: &str) -> CaptureRecord {
        CaptureRecord {
            id: format!("cap-{}", seq),
            sequence: seq,
            image_bytes: vec![1, 2, 3],
            timestamp_ms,
            source_url: url.to_string(),
            coordinates: Point::new(10.0, 20.0),
            annotation: None,
            element_info: None,
        }
    }

    #[test]
    fn test_stats_average_gap() {
        let mut session = JourneySession::started_at(500);
        session.screenshots = vec![
            record(1, 1000, "https://a.example"),
            record(2, 3000, "https://b.example"),
            record(3, 7000, "https://a.example"),
        ];
        let stats = session.stats_at(10_000);
        assert_eq!(stats.screenshot_count, 3);
        assert_eq!(stats.average_gap_ms, Some(3000));
        assert_eq!(stats.unique_urls, 2);
    }

    #[test]
    fn test_stats_gap_undefined_below_two_captures() {
        let mut session = JourneySession::started_at(0);
        assert_eq!(session.stats_at(100).average_gap_ms, None);
        session.screenshots.push(record(1, 50, "https://a.example"));
        assert_eq!(session.stats_at(100).average_gap_ms, None);
    }

    #[test]
    fn test_stats_duration_uses_now_while_active() {
        let session = JourneySession::started_at(1000);
        assert_eq!(session.stats_at(5000).duration_ms, 4000);

        let mut stopped = session.clone();
        stopped.is_active = false;
        stopped.end_time_ms = Some(3000);
        assert_eq!(stopped.stats_at(99_000).duration_ms, 2000);
    }

    #[test]
    fn test_session_json_roundtrip_with_base64_payload() {
        let mut session = JourneySession::started_at(123);
        session.screenshots.push(record(1, 456, "https://a.example"));

        let value = serde_json::to_value(&session).unwrap();
        assert!(value["screenshots"][0]["imageBytes"].is_string());
        assert_eq!(value["isActive"], serde_json::json!(true));

        let back: JourneySession = serde_json::from_value(value).unwrap();
        assert_eq!(back, session);
    }

    #[test]
    fn test_metadata_shape() {
        let mut session = JourneySession::started_at(1000);
        session.is_active = false;
        session.end_time_ms = Some(5000);
        session.screenshots.push(record(1, 2000, "https://a.example"));

        let metadata = JourneyMetadata::for_session(&session, 99_999);
        let value = serde_json::to_value(&metadata).unwrap();
        assert_eq!(value["journeyInfo"]["duration"], serde_json::json!(4000));
        assert_eq!(value["journeyInfo"]["endTime"], serde_json::json!(5000));
        assert_eq!(value["journeyInfo"]["screenshotCount"], serde_json::json!(1));
        assert_eq!(value["screenshots"][0]["sequence"], serde_json::json!(1));
        // Image payloads never leak into the metadata file
        assert!(value["screenshots"][0].get("imageBytes").is_none());
    }

    #[test]
    fn test_metadata_omits_end_time_while_active() {
        let mut session = JourneySession::started_at(1000);
        session.screenshots.push(record(1, 2000, "https://a.example"));

        let metadata = JourneyMetadata::for_session(&session, 3000);
        let value = serde_json::to_value(&metadata).unwrap();
        assert!(value["journeyInfo"].get("endTime").is_none());
    }

    #[test]
    fn test_error_messages_are_actionable() {
        assert_eq!(
            JourneyError::NotActive.to_string(),
            "No active journey to add screenshot to"
        );
        assert_eq!(
            JourneyError::CapacityReached(100).to_string(),
            "Maximum of 100 screenshots per journey"
        );
        assert_eq!(
            JourneyError::Storage(StorageError::QuotaExceeded("x".into())).to_string(),
            "Storage is full, try again in a moment"
        );
    }
}
