//! Scenario: cold ingest.
//!
//! A fresh store, written to for the first time, ends up with exactly the
//! entities/relationships passed in, sanitized labels, and a correctly
//! persisted append-only observation on the new relationship.

use chronograph_core::{MergeStrategy, TemporalEntity, TemporalKg, TemporalRelationship, TemporalWriter};
use chronograph_e2e::harness::TestDatabaseManager;

#[tokio::test]
async fn cold_ingest_persists_all_entities_and_relationships() {
    let db = TestDatabaseManager::new_temp();
    let writer = TemporalWriter::new(db.as_graph_store());

    let mut kg = TemporalKg::default();
    let mut alice = TemporalEntity::new("alice", "Alice");
    alice.label = "!!Person!!".to_string();
    kg.entities.push(alice);
    kg.entities.push(TemporalEntity::new("acme", "Acme"));

    let mut rel = TemporalRelationship::new("alice", "acme");
    rel.r#type = "founded".to_string();
    rel.observe(1704067200.0, "Alice founded Acme in 2022.");
    kg.relationships.push(rel);

    let report = writer.write_temporal_kg(&kg, MergeStrategy::Update).await.unwrap();
    assert_eq!(report.entities, 2);
    assert_eq!(report.relationships, 1);

    let store = db.store();
    let stored_alice = store.get_entity("alice").await.unwrap().unwrap();
    assert_eq!(stored_alice.label, "Person", "label must be sanitized on write");

    let stored_rel = store.get_relationship("alice", "acme", "founded").await.unwrap().unwrap();
    assert_eq!(stored_rel.t_obs, vec![1704067200.0]);
    assert_eq!(stored_rel.atomic_facts, vec!["Alice founded Acme in 2022.".to_string()]);
}

#[tokio::test]
async fn cold_ingest_of_an_empty_kg_writes_nothing() {
    let db = TestDatabaseManager::new_temp();
    let writer = TemporalWriter::new(db.as_graph_store());

    let report = writer.write_temporal_kg(&TemporalKg::default(), MergeStrategy::Update).await.unwrap();
    assert_eq!(report.entities, 0);
    assert_eq!(report.relationships, 0);

    let store = db.store();
    assert!(store.get_entity("anything").await.unwrap().is_none());
}
