//! Scenario: reobservation is additive.
//!
//! Writing a relationship a second time under `MergeStrategy::Update` appends
//! a new observation rather than replacing the first — the 5-tuple core plus
//! its append-only provenance arrays only ever grow.

use chronograph_core::{MergeStrategy, TemporalEntity, TemporalKg, TemporalRelationship, TemporalWriter};
use chronograph_e2e::harness::TestDatabaseManager;

#[tokio::test]
async fn second_observation_appends_rather_than_replaces() {
    let db = TestDatabaseManager::new_temp();
    let writer = TemporalWriter::new(db.as_graph_store());

    let mut first_kg = TemporalKg::default();
    first_kg.entities.push(TemporalEntity::new("alice", "Alice"));
    first_kg.entities.push(TemporalEntity::new("acme", "Acme"));
    let mut rel = TemporalRelationship::new("alice", "acme");
    rel.r#type = "founded".to_string();
    rel.observe(1704067200.0, "Alice founded Acme in 2022.");
    first_kg.relationships.push(rel);
    writer.write_temporal_kg(&first_kg, MergeStrategy::Update).await.unwrap();

    let mut second_kg = TemporalKg::default();
    let mut rel2 = TemporalRelationship::new("alice", "acme");
    rel2.r#type = "founded".to_string();
    rel2.observe(1717200000.0, "Alice is still listed as Acme's founder.");
    second_kg.relationships.push(rel2);
    writer.write_temporal_kg(&second_kg, MergeStrategy::Update).await.unwrap();

    let stored = db.store().get_relationship("alice", "acme", "founded").await.unwrap().unwrap();
    assert_eq!(stored.t_obs, vec![1704067200.0, 1717200000.0]);
    assert_eq!(
        stored.atomic_facts,
        vec![
            "Alice founded Acme in 2022.".to_string(),
            "Alice is still listed as Acme's founder.".to_string(),
        ]
    );
}

#[tokio::test]
async fn replace_strategy_overwrites_observations() {
    let db = TestDatabaseManager::new_temp();
    let writer = TemporalWriter::new(db.as_graph_store());

    let mut rel = TemporalRelationship::new("alice", "acme");
    rel.r#type = "founded".to_string();
    rel.observe(1704067200.0, "Alice founded Acme in 2022.");
    let mut kg = TemporalKg::default();
    kg.relationships.push(rel);
    writer.write_temporal_kg(&kg, MergeStrategy::Update).await.unwrap();

    let mut replacement = TemporalRelationship::new("alice", "acme");
    replacement.r#type = "founded".to_string();
    replacement.observe(1717200000.0, "Corrected record.");
    let mut replacement_kg = TemporalKg::default();
    replacement_kg.relationships.push(replacement);
    writer.write_temporal_kg(&replacement_kg, MergeStrategy::Replace).await.unwrap();

    let stored = db.store().get_relationship("alice", "acme", "founded").await.unwrap().unwrap();
    assert_eq!(stored.t_obs, vec![1717200000.0]);
    assert_eq!(stored.atomic_facts, vec!["Corrected record.".to_string()]);
}
