//! Scenario: a DSA delta appears on read without touching the base summary.
//!
//! Processing a delta writes a `pending` `CommunityDelta` row; the
//! community's own `full_content` is untouched until compaction runs, but
//! `merge_summaries_for_read` already surfaces the new bullet to a reader.

use std::collections::HashMap;
use std::sync::Arc;

use chronograph_core::{merge_summaries_for_read, DeltaSummarizer};
use chronograph_e2e::harness::{StubLlmClient, TestDatabaseManager};
use chronograph_e2e::mocks::TestDataFactory;

#[tokio::test]
async fn pending_delta_surfaces_on_read_but_leaves_full_content_untouched() {
    let db = TestDatabaseManager::new_temp();
    let store = db.as_graph_store();
    let scenario = TestDataFactory::seed_founder_scenario(&*store).await;

    let summarizer = DeltaSummarizer::new(store.clone(), Arc::new(StubLlmClient), true);
    let mut targets = HashMap::new();
    targets.insert(scenario.community_id.clone(), vec!["alice".to_string()]);

    let deltas = summarizer.process_deltas(&targets).await.unwrap();
    assert_eq!(deltas.len(), 1);

    let community = store.get_community(&scenario.community_id).await.unwrap().unwrap();
    assert_eq!(community.full_content, "Alice founded Acme.", "base summary must not change yet");

    let pending = store.pending_deltas(&scenario.community_id).await.unwrap();
    let merged = merge_summaries_for_read(&community.full_content, &pending);
    assert!(merged.starts_with("Alice founded Acme."));
    assert!(merged.contains("[Recent Updates]:"));
    assert!(merged.contains(&deltas[0].summary));
}

#[tokio::test]
async fn entities_outside_the_community_produce_no_delta() {
    let db = TestDatabaseManager::new_temp();
    let store = db.as_graph_store();
    let scenario = TestDataFactory::seed_founder_scenario(&*store).await;

    let summarizer = DeltaSummarizer::new(store.clone(), Arc::new(StubLlmClient), true);
    let mut targets = HashMap::new();
    targets.insert(scenario.community_id.clone(), vec!["unrelated-entity".to_string()]);

    let deltas = summarizer.process_deltas(&targets).await.unwrap();
    assert!(deltas.is_empty());
    assert!(store.pending_deltas(&scenario.community_id).await.unwrap().is_empty());
}
