//! Test Data Factory
//!
//! Generates realistic temporal-knowledge-graph and template fixtures for
//! end-to-end scenarios:
//! - Entities/relationships/communities seeded directly into a `GraphStore`
//! - Pre-built scenarios (founder graph, evolving community) for common cases
//! - Template fixtures for the filler/embedder/migrator scenarios

use std::collections::HashMap;

use chronograph_core::{
    Community, CommunityDelta, DeltaStatus, GraphStore, PropertyValue, TemporalEntity,
    TemporalRelationship,
};
use chronograph_export::{Segment, Template, TransformSpec};
use serde_json::json;

/// Factory for creating test data.
pub struct TestDataFactory;

/// A related batch of ids created by a scenario, with labels for assertions.
#[derive(Debug, Default)]
pub struct TestScenario {
    pub entity_ids: Vec<String>,
    pub community_id: String,
    pub description: String,
    pub metadata: HashMap<String, String>,
}

impl TestDataFactory {
    // ========================================================================
    // ENTITY / RELATIONSHIP CREATION
    // ========================================================================

    pub fn entity(id: &str, name: &str, description: &str) -> TemporalEntity {
        let mut entity = TemporalEntity::new(id, name);
        entity
            .properties
            .insert("description".to_string(), PropertyValue::String(description.to_string()));
        entity
    }

    pub fn relationship(source: &str, target: &str, r#type: &str, fact: &str, t_obs: f64) -> TemporalRelationship {
        let mut rel = TemporalRelationship::new(source, target);
        rel.r#type = r#type.to_string();
        rel.observe(t_obs, fact);
        rel
    }

    pub fn community(id: &str, level: i64, title: &str, full_content: &str) -> Community {
        Community {
            id: id.to_string(),
            level,
            title: title.to_string(),
            summary: String::new(),
            full_content: full_content.to_string(),
            weight: 1.0,
            summary_tokens: 0,
            updated_at: None,
            last_compacted_at: None,
        }
    }

    pub fn delta(id: &str, community_id: &str, summary: &str, related_entities: Vec<String>) -> CommunityDelta {
        CommunityDelta {
            id: id.to_string(),
            community_id: community_id.to_string(),
            summary: summary.to_string(),
            summary_tokens: summary.split_whitespace().count() as i64,
            related_entities,
            created_at: "2024-01-01T00:00:00Z".to_string(),
            compacted_at: None,
            status: DeltaStatus::Pending,
        }
    }

    // ========================================================================
    // SCENARIOS
    // ========================================================================

    /// Alice founded Acme; one community ("Founders") with both as members.
    /// Returns once seeded so callers can immediately exercise ingest/export.
    pub async fn seed_founder_scenario(store: &dyn GraphStore) -> TestScenario {
        let alice = Self::entity("alice", "Alice", "Founder of Acme");
        let acme = Self::entity("acme", "Acme", "A startup");
        store.upsert_entity(&alice).await.unwrap();
        store.upsert_entity(&acme).await.unwrap();

        let rel = Self::relationship("alice", "acme", "FOUNDED", "Alice founded Acme in 2022.", 1704067200.0);
        store
            .upsert_relationship(&rel, chronograph_core::MergeStrategy::Update)
            .await
            .unwrap();

        let community = Self::community("c-founders", 0, "Founders", "Alice founded Acme.");
        store.upsert_community(&community).await.unwrap();
        store
            .set_community_members("c-founders", &["alice".to_string(), "acme".to_string()])
            .await
            .unwrap();

        let mut metadata = HashMap::new();
        metadata.insert("founder".to_string(), "alice".to_string());
        metadata.insert("company".to_string(), "acme".to_string());

        TestScenario {
            entity_ids: vec!["alice".to_string(), "acme".to_string()],
            community_id: "c-founders".to_string(),
            description: "Single-community founder graph".to_string(),
            metadata,
        }
    }

    // ========================================================================
    // TEMPLATE FIXTURES
    // ========================================================================

    /// A two-segment template: a required "summary" segment and an optional
    /// repeatable "events" segment with a `list-extract` transform.
    pub fn sample_template(id: &str, version: &str) -> Template {
        Template {
            id: id.to_string(),
            version: version.to_string(),
            name: Some("Company Overview".to_string()),
            description: Some("Summarizes a company and its key events".to_string()),
            metadata: HashMap::new(),
            segments: vec![
                Segment {
                    key: "summary".to_string(),
                    title: "Summary".to_string(),
                    description: Some("High-level overview".to_string()),
                    required: true,
                    repeatable: false,
                    inputs: vec![],
                    transform: None,
                    format: "markdown".to_string(),
                    constraints: Some(json!({"minLength": 1})),
                    relationships: vec![],
                },
                Segment {
                    key: "events".to_string(),
                    title: "Key Events".to_string(),
                    description: None,
                    required: false,
                    repeatable: true,
                    inputs: vec![],
                    transform: Some(TransformSpec {
                        r#type: "list-extract".to_string(),
                        params: HashMap::new(),
                    }),
                    format: "markdown".to_string(),
                    constraints: None,
                    relationships: vec![],
                },
                Segment {
                    key: "notes".to_string(),
                    title: "Notes".to_string(),
                    description: None,
                    required: false,
                    repeatable: false,
                    inputs: vec![],
                    transform: None,
                    format: "plain".to_string(),
                    constraints: None,
                    relationships: vec![],
                },
            ],
        }
    }

    /// Same shape as [`sample_template`] plus a new required segment, a
    /// rename of "events" to "timeline", and a "notes" segment that
    /// transitions from optional to required — used to exercise the
    /// migrator's breaking-change detection.
    pub fn sample_template_next_version(id: &str, version: &str) -> Template {
        let mut template = Self::sample_template(id, version);
        template.segments[1].key = "timeline".to_string();
        template.segments[2].required = true;
        template.segments.push(Segment {
            key: "risks".to_string(),
            title: "Risks".to_string(),
            description: None,
            required: true,
            repeatable: false,
            inputs: vec![],
            transform: None,
            format: "plain".to_string(),
            constraints: None,
            relationships: vec![],
        });
        template
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chronograph_core::SqliteGraphStore;

    #[tokio::test]
    async fn founder_scenario_seeds_two_entities_and_one_community() {
        let store = SqliteGraphStore::open_in_memory().unwrap();
        let scenario = TestDataFactory::seed_founder_scenario(&store).await;

        assert_eq!(scenario.entity_ids.len(), 2);
        assert!(store.get_entity("alice").await.unwrap().is_some());
        assert!(store.get_community("c-founders").await.unwrap().is_some());
    }

    #[test]
    fn sample_template_has_one_required_and_one_repeatable_segment() {
        let template = TestDataFactory::sample_template("company-overview", "1.0.0");
        assert_eq!(template.required_segments().len(), 1);
        assert_eq!(template.repeatable_segments().len(), 1);
    }

    #[test]
    fn next_version_renames_events_to_timeline_and_adds_risks() {
        let template = TestDataFactory::sample_template_next_version("company-overview", "1.1.0");
        assert!(template.get_segment("timeline").is_some());
        assert!(template.get_segment("events").is_none());
        assert_eq!(template.required_segments().len(), 3);
    }
}
