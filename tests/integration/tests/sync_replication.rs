//! Cross-peer replication through an in-process relay.
//!
//! Two pipelines share one `MemoryRelay`; writes on either side must
//! converge on the other without any coordination beyond the per-field
//! merge rule.

use snaplist_core::Config;
use snaplist_integration_tests::{recognition_payload, solid_png_data_uri};
use snaplist_pipeline::Pipeline;
use snaplist_sync::{MemoryRelay, PeerRelay};
use std::sync::Arc;
use std::time::Duration;

fn pipeline_for(dir: &tempfile::TempDir, peer: &str, relay: Arc<MemoryRelay>) -> Pipeline {
    snaplist_integration_tests::init_tracing();
    let mut config = Config::default();
    config.storage.index_path = dir.path().join(format!("{peer}-vectors.json"));
    config.sync.peer_id = Some(peer.to_string());
    let pipeline = Pipeline::new(config, relay.clone() as Arc<dyn PeerRelay>).unwrap();
    relay.attach(pipeline.graph().clone());
    pipeline
}

async fn wait_until(mut condition: impl FnMut() -> bool) -> bool {
    for _ in 0..100 {
        if condition() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    condition()
}

#[tokio::test]
async fn test_recognition_replicates_to_peer() {
    let dir = tempfile::tempdir().unwrap();
    let relay = Arc::new(MemoryRelay::new());
    let seller = pipeline_for(&dir, "seller", relay.clone());
    let buyer = pipeline_for(&dir, "buyer", relay.clone());

    let outcome = seller
        .process_recognition(recognition_payload("monitor", solid_png_data_uri(12, 200, 40)))
        .await
        .unwrap();

    let item_id = outcome.item_id.clone();
    assert!(
        wait_until(|| buyer.graph().get(&item_id).is_some()).await,
        "item node should reach the buyer replica"
    );

    let node = buyer.graph().get(&outcome.item_id).unwrap();
    assert_eq!(node.value("name"), Some(&serde_json::json!("monitor")));
    assert_eq!(node.value("status"), Some(&serde_json::json!("recognized")));

    // The recognition event node rides the same relay.
    assert!(
        wait_until(|| {
            buyer
                .graph()
                .all()
                .iter()
                .any(|n| n.value("kind") == Some(&serde_json::json!("recognition")))
        })
        .await
    );

    assert_eq!(outcome.sync_stats.peers_connected, 1);
}

#[tokio::test]
async fn test_tombstone_replicates_to_peer() {
    let dir = tempfile::tempdir().unwrap();
    let relay = Arc::new(MemoryRelay::new());
    let seller = pipeline_for(&dir, "seller", relay.clone());
    let buyer = pipeline_for(&dir, "buyer", relay.clone());

    let mut payload = recognition_payload("cable", solid_png_data_uri(90, 90, 90));
    payload.item_id = Some("cable-1".to_string());
    seller.process_recognition(payload).await.unwrap();

    assert!(wait_until(|| buyer.graph().get("cable-1").is_some()).await);

    seller.delete_item("cable-1").await.unwrap();

    assert!(
        wait_until(|| buyer.graph().get("cable-1").is_none()).await,
        "tombstone should hide the node on the buyer replica"
    );
    assert!(buyer.graph().replica("cable-1").unwrap().is_deleted());
}

#[tokio::test]
async fn test_concurrent_field_writes_converge() {
    let dir = tempfile::tempdir().unwrap();
    let relay = Arc::new(MemoryRelay::new());
    let seller = pipeline_for(&dir, "seller", relay.clone());
    let buyer = pipeline_for(&dir, "buyer", relay.clone());

    let mut payload = recognition_payload("desk", solid_png_data_uri(60, 30, 15));
    payload.item_id = Some("desk-1".to_string());
    seller.process_recognition(payload).await.unwrap();
    assert!(wait_until(|| buyer.graph().get("desk-1").is_some()).await);

    // Both sides edit the same node; field-level merge keeps one winner
    // per field and both replicas end identical.
    let mut seller_edit = std::collections::HashMap::new();
    seller_edit.insert("price".to_string(), serde_json::json!("$30"));
    seller.graph().put("desk-1", seller_edit);

    let mut buyer_edit = std::collections::HashMap::new();
    buyer_edit.insert("status".to_string(), serde_json::json!("listed"));
    buyer.graph().put("desk-1", buyer_edit);

    assert!(
        wait_until(|| {
            let a = seller.graph().get("desk-1");
            let b = buyer.graph().get("desk-1");
            match (a, b) {
                (Some(a), Some(b)) => {
                    a.fields == b.fields
                        && a.value("status") == Some(&serde_json::json!("listed"))
                        && a.value("price") == Some(&serde_json::json!("$30"))
                }
                _ => false,
            }
        })
        .await,
        "replicas should converge field-by-field"
    );
}
