//! Scenario: migration report.
//!
//! Comparing two versions of a template detects the renamed segment, flags
//! an existing segment's optional-to-required transition as breaking, but
//! treats a brand-new required segment as a warning note only — and the
//! generated migration guide mentions all three.

use chronograph_export::TemplateMigrator;
use chronograph_e2e::mocks::TestDataFactory;

#[test]
fn migration_report_detects_rename_and_required_transition() {
    let old = TestDataFactory::sample_template("company-overview", "1.0.0");
    let new = TestDataFactory::sample_template_next_version("company-overview", "1.1.0");

    let migrator = TemplateMigrator::default();
    let report = migrator.compare(&old, &new);

    assert!(report.has_changes());
    assert!(report.is_breaking(), "notes becoming required must be breaking");

    let renamed = report
        .changes
        .iter()
        .find(|c| c.key == "events")
        .expect("the renamed segment should be reported under its old key");
    assert_eq!(renamed.renamed_to.as_deref(), Some("timeline"));

    let modified = report.modified_segments();
    let notes = modified.iter().find(|c| c.key == "notes").expect("notes should be reported as modified");
    assert!(notes.is_breaking, "an optional-to-required transition is breaking");

    let added = report.added_segments();
    assert_eq!(added.len(), 1);
    assert_eq!(added[0].key, "risks");
    assert!(!added[0].is_breaking, "a brand-new required segment is a warning note, not a breaking change");
    assert!(report.compatibility_notes.iter().any(|n| n.contains("risks")));

    let guide = migrator.generate_migration_guide(&report);
    assert!(guide.contains("timeline"));
    assert!(guide.contains("risks"));
    assert!(guide.contains("notes"));
}

#[test]
fn comparing_a_template_to_itself_reports_no_changes() {
    let template = TestDataFactory::sample_template("company-overview", "1.0.0");
    let migrator = TemplateMigrator::default();
    let report = migrator.compare(&template, &template);

    assert!(!report.has_changes());
    assert!(!report.is_breaking());
}
