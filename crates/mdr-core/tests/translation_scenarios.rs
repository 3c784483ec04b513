//! Translation integration tests
//!
//! Runs mapping lists through the translator runtime with hand-written target
//! schemas, and whole model-to-model translations through the catalog.


use mdr_core::{
    translate, Error, GraphStore, Mapping, MappingOutcome, ResolverConfig, SchemaCache,
    SourceValidation, TransformationCatalog, TranslationRuntime, Translator, TranslatorConfig,
};
use mdr_core::{Transformation, TransformationAttribute, TransformationGroup};
use serde_json::{json, Value};
use test_support::{education_snapshot, translation_snapshot, LIF_MODEL, SIS_MODEL};

fn run(schema: Value, sources: &[&str], document: Value) -> mdr_core::Result<Value> {
    TranslationRuntime::new(schema)?
        .run(&Mapping::from_sources(sources), &document)
        .map(|outcome| outcome.document)
}

#[test]
fn test_literal_mapping_with_permissive_schema() {
    let source = json!({"Person": {"Courses": {"Grade": "A", "Style": "Lecture"}}});
    let output = run(
        json!({}),
        &[r#"{"User": {"Skills": {"Genre": Person.Courses.Grade}}}"#],
        source,
    )
    .unwrap();

    assert_eq!(output, json!({"User": {"Skills": {"Genre": "A"}}}));
}

#[test]
fn test_fragment_violating_schema_is_rolled_back() {
    let schema = json!({
        "type": "object",
        "properties": {"y": {"type": "string"}}
    });
    let outcome = TranslationRuntime::new(schema)
        .unwrap()
        .run(&Mapping::from_sources(&[r#"{"x": 1}"#, r#"{"y": 123}"#]), &json!({}))
        .unwrap();

    assert_eq!(outcome.document, json!({"x": 1}));
    let entries = outcome.report.entries();
    assert_eq!(entries[0].outcome, MappingOutcome::Committed);
    match &entries[1].outcome {
        MappingOutcome::RolledBack { violations } => {
            assert!(!violations.is_empty());
            assert!(violations.iter().any(|v| v.instance_path.contains('y')));
        }
        other => panic!("expected a rollback, got {:?}", other),
    }
}

#[test]
fn test_final_validation_failure_raises() {
    let schema = json!({
        "type": "object",
        "required": ["must"],
        "properties": {"must": {"type": "string"}}
    });
    let err = run(schema, &[r#"{"x": 1}"#, r#"{"other": "value"}"#], json!({})).unwrap_err();

    match err {
        Error::SchemaValidation { violations, .. } => assert!(!violations.is_empty()),
        other => panic!("expected a schema validation error, got {:?}", other),
    }
}

#[test]
fn test_later_fragment_completes_required_fields() {
    let schema = json!({
        "type": "object",
        "required": ["must"],
        "properties": {"must": {"type": "string"}}
    });
    // Fragments are validated in full, so the fragment lacking `must` is rolled back
    let output = run(schema, &[r#"{"x": 1}"#, r#"{"must": "here"}"#], json!({})).unwrap();
    assert_eq!(output, json!({"must": "here"}));
}

#[test]
fn test_translate_between_models() {
    let snapshot = translation_snapshot();
    let document = json!({
        "Student": {
            "FullName": "Ada Lovelace",
            "Email": "ada@example.org",
            "Enrollment": [{"Grade": "A"}]
        }
    });

    let output = translate(&snapshot, SIS_MODEL, LIF_MODEL, &document).unwrap();
    assert_eq!(
        output,
        json!({
            "Person": {
                "Name": "Ada Lovelace",
                "Contact": {"Email": "ada@example.org"},
                "Course": [{"Title": "Enrolled", "Grade": "A"}]
            }
        })
    );
}

#[test]
fn test_value_outside_enum_is_rolled_back() {
    let snapshot = translation_snapshot();
    let store = GraphStore::new(&snapshot);
    let catalog = TransformationCatalog::from_snapshot(&snapshot);
    let config = ResolverConfig::default();
    let document = json!({
        "Student": {"FullName": "Ada Lovelace", "Enrollment": [{"Grade": "F"}]}
    });

    let outcome = Translator::new(&store, &catalog, &config)
        .translate(SIS_MODEL, LIF_MODEL, &document)
        .unwrap();

    assert_eq!(outcome.document, json!({"Person": {"Name": "Ada Lovelace", "Contact": {}}}));
    let summary = outcome.report.summary();
    assert_eq!(summary.committed, 2);
    assert_eq!(summary.rolled_back, 1);
    assert_eq!(outcome.metadata.mapping_count, 3);
    assert_eq!(outcome.metadata.source_data_model_id, Some(SIS_MODEL));
}

#[test]
fn test_strict_source_validation_rejects_document() {
    let snapshot = translation_snapshot();
    let store = GraphStore::new(&snapshot);
    let catalog = TransformationCatalog::from_snapshot(&snapshot);
    let config = ResolverConfig::default();
    let strict = TranslatorConfig {
        source_validation: SourceValidation::Strict,
        ..Default::default()
    };

    // FullName is required by the source model
    let result = Translator::new(&store, &catalog, &config)
        .with_config(strict)
        .translate(SIS_MODEL, LIF_MODEL, &json!({"Student": {"Email": "x@example.org"}}));
    assert!(matches!(result, Err(Error::SchemaValidation { .. })));
}

#[test]
fn test_cached_schemas_are_reused_across_translations() {
    let snapshot = translation_snapshot();
    let store = GraphStore::new(&snapshot);
    let catalog = TransformationCatalog::from_snapshot(&snapshot);
    let config = ResolverConfig::default();
    let cache = SchemaCache::new();
    let translator = Translator::new(&store, &catalog, &config).with_cache(&cache);

    for name in ["Ada", "Grace"] {
        let document = json!({"Student": {"FullName": name}});
        let outcome = translator.translate(SIS_MODEL, LIF_MODEL, &document).unwrap();
        assert_eq!(outcome.document["Person"]["Name"], json!(name));
    }

    assert_eq!(cache.len(), 2);
    assert_eq!(cache.stats().hits, 2);
}

#[test]
fn test_scalar_mappings_into_array_entity() {
    let snapshot = education_snapshot()
        .with(TransformationGroup::new(1, SIS_MODEL, LIF_MODEL, "1.0"))
        .with(Transformation::new(1, 1, "'Enrolled'").named("title"))
        .with(TransformationAttribute::source(1, 1, 10, 100, "Student"))
        .with(TransformationAttribute::target(2, 1, 22, 202, "Person.Course"))
        .with(Transformation::new(2, 1, "Student.Enrollment[0].Grade").named("grade"))
        .with(TransformationAttribute::source(3, 2, 11, 102, "Student.Enrollment"))
        .with(TransformationAttribute::target(4, 2, 22, 203, "Person.Course"));
    let store = GraphStore::new(&snapshot);
    let catalog = TransformationCatalog::from_snapshot(&snapshot);
    let config = ResolverConfig::default();
    let document = json!({
        "Student": {"FullName": "Ada Lovelace", "Enrollment": [{"Grade": "A"}]}
    });

    let outcome = Translator::new(&store, &catalog, &config)
        .translate(SIS_MODEL, LIF_MODEL, &document)
        .unwrap();

    assert_eq!(
        outcome.document,
        json!({"Person": {"Course": [{"Title": "Enrolled", "Grade": "A"}]}})
    );
    assert_eq!(outcome.report.summary().committed, 2);
}
