//! Scenario: compaction clears deltas.
//!
//! Once a community crosses the delta-count threshold, `CommunityCompactor`
//! merges pending deltas into `full_content`, stamps `last_compacted_at`, and
//! leaves no pending deltas behind.

use std::sync::Arc;

use chronograph_core::CommunityCompactor;
use chronograph_e2e::harness::{StubLlmClient, TestDatabaseManager};
use chronograph_e2e::mocks::TestDataFactory;

#[tokio::test]
async fn compaction_merges_deltas_and_clears_the_pending_queue() {
    let db = TestDatabaseManager::new_temp();
    let store = db.as_graph_store();
    let scenario = TestDataFactory::seed_founder_scenario(&*store).await;

    for i in 0..6 {
        let delta = TestDataFactory::delta(
            &format!("d{i}"),
            &scenario.community_id,
            &format!("Alice shipped update {i}."),
            vec!["alice".to_string()],
        );
        store.insert_delta(&delta).await.unwrap();
    }

    let compactor = CommunityCompactor::with_thresholds(store.clone(), Arc::new(StubLlmClient), 5, 1000);
    let compacted = compactor.compact_all().await.unwrap();

    assert_eq!(compacted.len(), 1);
    assert!(compacted[0].full_content.contains("Alice founded Acme."));
    assert!(compacted[0].last_compacted_at.is_some());
    assert!(store.pending_deltas(&scenario.community_id).await.unwrap().is_empty());
}

#[tokio::test]
async fn compaction_is_a_no_op_below_threshold() {
    let db = TestDatabaseManager::new_temp();
    let store = db.as_graph_store();
    let scenario = TestDataFactory::seed_founder_scenario(&*store).await;

    let delta = TestDataFactory::delta("d0", &scenario.community_id, "Alice shipped one update.", vec!["alice".to_string()]);
    store.insert_delta(&delta).await.unwrap();

    let compactor = CommunityCompactor::with_thresholds(store.clone(), Arc::new(StubLlmClient), 5, 1000);
    let compacted = compactor.compact_all().await.unwrap();

    assert!(compacted.is_empty());
    assert_eq!(store.pending_deltas(&scenario.community_id).await.unwrap().len(), 1);
}
