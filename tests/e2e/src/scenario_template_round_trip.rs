//! Scenario: template round trip.
//!
//! Register a template, fill it from source content, embed the resulting
//! metadata into a skill document, then extract it back out — the extracted
//! identifier must match what was embedded, and removal must leave the body
//! clean.

use std::collections::HashMap;

use chronograph_export::{create_skill_input, FillStatus, Position, TemplateEmbedder, TemplateFiller, TemplateRegistry};
use chronograph_e2e::mocks::TestDataFactory;
use serde_json::json;
use tempfile::tempdir;

#[test]
fn registered_template_fills_embeds_and_extracts_round_trip() {
    let dir = tempdir().unwrap();
    let registry = TemplateRegistry::new(dir.path());
    let template = TestDataFactory::sample_template("company-overview", "1.0.0");
    registry.register_template(&template).unwrap();

    let fetched = registry
        .get_template("company-overview", None)
        .expect("latest version should resolve");
    assert_eq!(fetched.identifier(), "company-overview@1.0.0");

    let filler = TemplateFiller::new(false);
    let mut content = HashMap::new();
    content.insert("summary".to_string(), json!("Acme is a startup founded by Alice."));
    content.insert(
        "events".to_string(),
        json!("- Founded in 2022\n- Raised seed round in 2023"),
    );
    let filled = filler.fill(&fetched, &content, None);
    assert_eq!(filled.status, FillStatus::Complete);
    assert!(filled.missing_required.is_empty());

    let skill_input = create_skill_input(&fetched, &filled, None, None);
    let summary_value = skill_input["content"]["segments"]["summary"][0]["value"].as_str().unwrap();
    let body = format!("# Company Overview\n\n{summary_value}");

    let embedder = TemplateEmbedder::new(true);
    let embedded = embedder.embed_in_skill(&body, &fetched, Position::Bottom);
    assert!(embedder.has_metadata(&embedded));

    let identifier = embedder.get_template_identifier(&embedded).unwrap();
    assert_eq!(identifier, "company-overview@1.0.0");

    let extracted = embedder.extract_from_skill(&embedded).unwrap();
    assert_eq!(extracted["id"], json!("company-overview"));
    assert_eq!(extracted["version"], json!("1.0.0"));

    let removed = embedder.remove_from_skill(&embedded);
    assert!(!embedder.has_metadata(&removed));
    assert!(removed.contains("Company Overview"));
}
