//! Integration tests for the journey session lifecycle and batch export

use pretty_assertions::assert_eq;
use serde_json::Value;

use snapmark::{
    JourneyConfig, JourneyError, JourneyManager, MemoryDownloads, MemoryStorage, NewCapture, Point,
};

fn manager() -> JourneyManager<MemoryStorage, MemoryDownloads> {
    JourneyManager::new(
        MemoryStorage::new(),
        MemoryDownloads::new(),
        JourneyConfig::default(),
    )
}

fn capture(url: &str) -> NewCapture {
    NewCapture {
        image_bytes: vec![0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A],
        source_url: url.to_string(),
        coordinates: Point::new(12.0, 34.0),
        annotation: Some("first impression".to_string()),
        element_info: None,
    }
}

fn tiny_capture() -> NewCapture {
    NewCapture {
        image_bytes: vec![1],
        source_url: "https://a.example".to_string(),
        coordinates: Point::new(0.0, 0.0),
        annotation: None,
        element_info: None,
    }
}

#[tokio::test]
async fn test_full_journey_export() {
    // start -> add -> add -> stop -> save yields two images plus one
    // metadata JSON.
    let manager = manager();

    manager.start_journey().await.unwrap();
    manager
        .add_screenshot(capture("https://a.example/home"))
        .await
        .unwrap();
    manager
        .add_screenshot(capture("https://a.example/cart"))
        .await
        .unwrap();
    let stopped = manager.stop_journey().await.unwrap();
    assert!(!stopped.is_active);
    assert!(stopped.end_time_ms.is_some());

    let report = manager.save_collection().await.unwrap();
    assert_eq!(report.issued_ids().len(), 3);
    assert_eq!(report.failed_count(), 0);
    assert!(report.metadata_id.is_some());
}

#[tokio::test]
async fn test_export_paths_and_metadata_shape() {
    let downloads = MemoryDownloads::new();
    let manager = JourneyManager::new(
        MemoryStorage::new(),
        downloads.clone(),
        JourneyConfig::default(),
    );

    manager.start_journey().await.unwrap();
    manager
        .add_screenshot(capture("https://a.example/home"))
        .await
        .unwrap();
    manager
        .add_screenshot(capture("https://a.example/cart"))
        .await
        .unwrap();
    manager.stop_journey().await.unwrap();
    manager.save_collection().await.unwrap();

    let files = downloads.files().await;
    assert_eq!(files.len(), 3);

    // Every file lands in the same per-journey folder
    let folders: Vec<&str> = files
        .iter()
        .map(|(path, _)| path.split('/').next().unwrap())
        .collect();
    assert!(folders.iter().all(|f| *f == folders[0]), "{:?}", folders);

    assert!(files[0].0.ends_with("_001.png"), "{}", files[0].0);
    assert!(files[1].0.ends_with("_002.png"), "{}", files[1].0);
    assert!(files[2].0.ends_with("journey_metadata.json"));

    let metadata: Value = serde_json::from_slice(&files[2].1).unwrap();
    assert_eq!(metadata["journeyInfo"]["screenshotCount"], Value::from(2));
    let screenshots = metadata["screenshots"].as_array().unwrap();
    assert_eq!(screenshots.len(), 2);
    assert_eq!(screenshots[0]["sequence"], Value::from(1));
    assert_eq!(screenshots[1]["sequence"], Value::from(2));
    assert_eq!(screenshots[0]["url"], Value::from("https://a.example/home"));
    assert_eq!(
        screenshots[0]["annotation"],
        Value::from("first impression")
    );
}

#[tokio::test]
async fn test_add_without_start_leaves_storage_untouched() {
    let manager = manager();
    let err = manager
        .add_screenshot(capture("https://a.example"))
        .await
        .unwrap_err();
    assert!(matches!(err, JourneyError::NotActive));
    assert!(manager.get_state().await.unwrap().is_none());
}

#[tokio::test]
async fn test_sequence_monotonicity() {
    let manager = manager();
    manager.start_journey().await.unwrap();
    for expected in 1..=10u32 {
        let record = manager.add_screenshot(tiny_capture()).await.unwrap();
        assert_eq!(record.sequence, expected);
    }
}

#[tokio::test]
async fn test_capacity_limit_holds_at_100() {
    let manager = manager();
    manager.start_journey().await.unwrap();
    for _ in 0..100 {
        manager.add_screenshot(tiny_capture()).await.unwrap();
    }
    let err = manager.add_screenshot(tiny_capture()).await.unwrap_err();
    assert!(matches!(err, JourneyError::CapacityReached(100)));

    let session = manager.get_state().await.unwrap().unwrap();
    assert_eq!(session.screenshots.len(), 100);
}

#[tokio::test]
async fn test_clear_is_idempotent_and_reports_absent() {
    let manager = manager();
    manager.start_journey().await.unwrap();
    manager.clear().await.unwrap();
    manager.clear().await.unwrap();
    assert!(manager.get_state().await.unwrap().is_none());
    assert!(manager.get_stats().await.unwrap().is_none());
}

#[tokio::test]
async fn test_stats_distinct_urls() {
    let manager = manager();
    manager.start_journey().await.unwrap();
    manager
        .add_screenshot(capture("https://a.example/one"))
        .await
        .unwrap();
    manager
        .add_screenshot(capture("https://a.example/two"))
        .await
        .unwrap();
    manager
        .add_screenshot(capture("https://a.example/one"))
        .await
        .unwrap();

    let stats = manager.get_stats().await.unwrap().unwrap();
    assert_eq!(stats.screenshot_count, 3);
    assert_eq!(stats.unique_urls, 2);
}

#[tokio::test]
async fn test_partial_export_keeps_surviving_items() {
    // Reject the image files but let the metadata JSON through.
    let downloads = MemoryDownloads::rejecting(".png");
    let manager = JourneyManager::new(
        MemoryStorage::new(),
        downloads.clone(),
        JourneyConfig::default(),
    );
    manager.start_journey().await.unwrap();
    manager.add_screenshot(tiny_capture()).await.unwrap();
    manager.add_screenshot(tiny_capture()).await.unwrap();

    let report = manager.save_collection().await.unwrap();
    assert_eq!(report.failed_count(), 2);
    assert!(report.issued_ids().is_empty());
    assert!(report.metadata_id.is_some());

    let files = downloads.files().await;
    assert_eq!(files.len(), 1);
    assert!(files[0].0.ends_with("journey_metadata.json"));
}
