//! End-to-end recognition pipeline tests.
//!
//! Drives the full flow the way the UI collaborator would: recognition
//! payload in, composed outcome (item id, neighbors, price insight, sync
//! stats) out, with the index snapshot and graph store observable on the
//! side.

use snaplist_core::Config;
use snaplist_integration_tests::{recognition_payload, solid_png_data_uri, split_png_data_uri};
use snaplist_pipeline::Pipeline;
use snaplist_sync::NullRelay;
use std::sync::Arc;

fn pipeline_in(dir: &tempfile::TempDir) -> Pipeline {
    snaplist_integration_tests::init_tracing();
    let mut config = Config::default();
    config.storage.index_path = dir.path().join("vectors.json");
    config.sync.peer_id = Some("it-peer".to_string());
    Pipeline::new(config, Arc::new(NullRelay)).unwrap()
}

#[tokio::test]
async fn test_repeat_recognition_finds_first_item() {
    let dir = tempfile::tempdir().unwrap();
    let pipeline = pipeline_in(&dir);
    let uri = solid_png_data_uri(180, 20, 60);

    let first = pipeline
        .process_recognition(recognition_payload("speaker", uri.clone()))
        .await
        .unwrap();
    assert!(first.neighbors.is_empty());

    let second = pipeline
        .process_recognition(recognition_payload("speaker", uri))
        .await
        .unwrap();

    // Identical image through the deterministic fallback: the first item
    // comes back as a near-perfect match.
    assert_eq!(second.neighbors.len(), 1);
    assert_eq!(second.neighbors[0].id, first.item_id);
    assert!((second.neighbors[0].score - 1.0).abs() < 1e-5);

    // Price insight derives from the matched neighbor's $25 hint, with
    // the Electronics multiplier applied.
    let range = second.price_insight.suggested_range.as_ref().unwrap();
    assert_eq!(range.min, (0.9f64 * 25.0).floor() * 1.2);
    assert_eq!(range.max, (1.1f64 * 25.0).ceil() * 1.2);
    assert!(second.price_insight.confidence > 0.0);
}

#[tokio::test]
async fn test_dissimilar_images_fall_below_score_floor() {
    let dir = tempfile::tempdir().unwrap();
    let pipeline = pipeline_in(&dir);

    pipeline
        .process_recognition(recognition_payload("left-lit", split_png_data_uri(255, 0)))
        .await
        .unwrap();

    // The mirrored split lights up a disjoint set of fallback cells, so
    // similarity sits near zero, well under the 0.6 floor.
    let mirrored = pipeline
        .process_recognition(recognition_payload("right-lit", split_png_data_uri(0, 255)))
        .await
        .unwrap();
    assert!(mirrored.neighbors.is_empty());
    assert!(mirrored.price_insight.suggested_range.is_none());
}

#[tokio::test]
async fn test_outcome_visible_to_collaborators() {
    let dir = tempfile::tempdir().unwrap();
    let pipeline = pipeline_in(&dir);

    let outcome = pipeline
        .process_recognition(recognition_payload("keyboard", solid_png_data_uri(1, 99, 1)))
        .await
        .unwrap();

    // Item UI collaborator reads the graph store directly.
    let node = pipeline.graph().get(&outcome.item_id).unwrap();
    assert_eq!(node.value("name"), Some(&serde_json::json!("keyboard")));
    assert_eq!(node.value("kind"), Some(&serde_json::json!("item")));

    // A recognition event node was written alongside the item.
    let recognitions: Vec<_> = pipeline
        .graph()
        .all()
        .into_iter()
        .filter(|n| n.value("kind") == Some(&serde_json::json!("recognition")))
        .collect();
    assert_eq!(recognitions.len(), 1);
    assert_eq!(
        recognitions[0].value("item_id"),
        Some(&serde_json::json!(outcome.item_id))
    );

    assert_eq!(outcome.sync_stats.vectors_stored, 1);
    assert_eq!(outcome.sync_stats.items_synced, 1);
}

#[tokio::test]
async fn test_restart_preserves_similarity() {
    let dir = tempfile::tempdir().unwrap();
    let uri = solid_png_data_uri(42, 42, 200);

    let first_id = {
        let pipeline = pipeline_in(&dir);
        pipeline
            .process_recognition(recognition_payload("headphones", uri.clone()))
            .await
            .unwrap()
            .item_id
    };

    // New process, same snapshot blob.
    let pipeline = pipeline_in(&dir);
    assert!(pipeline.index().contains(&first_id));

    let outcome = pipeline
        .process_recognition(recognition_payload("headphones", uri))
        .await
        .unwrap();
    assert_eq!(outcome.neighbors[0].id, first_id);
    assert!((outcome.neighbors[0].score - 1.0).abs() < 1e-5);
}

#[tokio::test]
async fn test_delete_cascades_everywhere() {
    let dir = tempfile::tempdir().unwrap();
    let pipeline = pipeline_in(&dir);

    let mut payload = recognition_payload("tripod", solid_png_data_uri(9, 9, 9));
    payload.item_id = Some("tripod-1".to_string());
    pipeline.process_recognition(payload).await.unwrap();

    pipeline.delete_item("tripod-1").await.unwrap();

    assert!(!pipeline.index().contains("tripod-1"));
    assert!(pipeline.graph().get("tripod-1").is_none());

    let reopened = pipeline_in(&dir);
    assert!(!reopened.index().contains("tripod-1"));
}
