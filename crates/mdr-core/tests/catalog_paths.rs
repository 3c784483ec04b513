//! Entity-id path validation and transformation catalog integration tests


use mdr_core::{
    validate_path, AttributeBinding, EntityIdPath, Error, GraphStore, NewTransformation,
    PathErrorReason, PathId, ResolverConfig, TransformationCatalog, TransformationGroup,
    TransformationUpdate,
};
use serde_json::json;
use test_support::{education_snapshot, translation_snapshot, LIF_MODEL, SIS_MODEL};

fn reason(result: mdr_core::Result<EntityIdPath>) -> PathErrorReason {
    match result {
        Err(Error::InvalidPath { reason, .. }) => reason,
        other => panic!("expected an invalid path, got {:?}", other),
    }
}

#[test]
fn test_qualified_paths() {
    let snapshot = education_snapshot();

    assert!(validate_path(&snapshot, 21, "Person.Contact").is_ok());
    assert!(validate_path(&snapshot, 21, "Contact").is_ok());
    assert!(validate_path(&snapshot, 23, "Person.Organization").is_ok());
    // Extension entities resolve inside their own model
    assert!(validate_path(&snapshot, 30, "Person.Badge").is_ok());

    assert_eq!(
        reason(validate_path(&snapshot, 21, "Course.Contact")),
        PathErrorReason::Unresolvable
    );
    assert_eq!(
        reason(validate_path(&snapshot, 21, "Person.Contact.Extra")),
        PathErrorReason::Unresolvable
    );
    assert_eq!(reason(validate_path(&snapshot, 21, "Person..Contact")), PathErrorReason::Malformed);
    assert_eq!(reason(validate_path(&snapshot, 21, "   ")), PathErrorReason::Empty);
}

#[test]
fn test_id_chain_paths() {
    let snapshot = education_snapshot();

    let path = validate_path(&snapshot, 21, "20,21,-201").unwrap();
    assert_eq!(
        path,
        EntityIdPath::IdChain(vec![
            PathId::Entity(20),
            PathId::Entity(21),
            PathId::Attribute(201)
        ])
    );
    assert_eq!(path.to_string(), "20,21,-201");

    assert_eq!(reason(validate_path(&snapshot, 21, "20,abc")), PathErrorReason::NonInteger);
    assert_eq!(reason(validate_path(&snapshot, 21, "-20,21")), PathErrorReason::Malformed);
}

#[test]
fn test_unknown_entity_is_not_found() {
    let snapshot = education_snapshot();
    assert!(matches!(
        validate_path(&snapshot, 999, "Person"),
        Err(Error::NotFound { .. })
    ));
}

#[test]
fn test_create_and_run_transformation() {
    let snapshot = education_snapshot().with(TransformationGroup::new(1, SIS_MODEL, LIF_MODEL, "1.0"));
    let store = GraphStore::new(&snapshot);
    let config = ResolverConfig::default();
    let mut catalog = TransformationCatalog::from_snapshot(&snapshot);

    let created = catalog
        .create_transformation(
            &store,
            &config,
            NewTransformation {
                group_id: 1,
                name: Some("email".into()),
                expression: "$lowercase(Student.Email)".into(),
                expression_language: None,
                source_attributes: vec![AttributeBinding::new(10, 101, "Student")],
                target_attribute: AttributeBinding::new(21, 201, "Person.Contact"),
            },
        )
        .unwrap();
    assert_eq!(created.id, 1);
    assert_eq!(created.expression_language, "JSONata");

    let mappings = catalog.mappings_for(&store, &config, SIS_MODEL, LIF_MODEL, None).unwrap();
    assert_eq!(mappings.len(), 1);
    let fragment = mappings[0]
        .evaluate(&json!({"Student": {"Email": "ADA@Example.org"}}))
        .unwrap();
    assert_eq!(
        fragment,
        Some(json!({"Person": {"Contact": {"Email": "ada@example.org"}}}))
    );
}

#[test]
fn test_create_rejects_invalid_requests() {
    let snapshot = education_snapshot().with(TransformationGroup::new(1, SIS_MODEL, LIF_MODEL, "1.0"));
    let store = GraphStore::new(&snapshot);
    let config = ResolverConfig::default();
    let mut catalog = TransformationCatalog::from_snapshot(&snapshot);

    let request = |expression: &str, source: AttributeBinding| NewTransformation {
        group_id: 1,
        name: None,
        expression: expression.into(),
        expression_language: None,
        source_attributes: vec![source],
        target_attribute: AttributeBinding::new(20, 200, "Person"),
    };

    // Broken expression syntax
    assert!(matches!(
        catalog.create_transformation(
            &store,
            &config,
            request("{\"Person\": ", AttributeBinding::new(10, 100, "Student"))
        ),
        Err(Error::Expression(_))
    ));
    // Source attribute from the target model
    assert!(matches!(
        catalog.create_transformation(
            &store,
            &config,
            request("Student.FullName", AttributeBinding::new(20, 200, "Person"))
        ),
        Err(Error::Validation { .. })
    ));
    // Source path that does not reach the entity
    assert!(matches!(
        catalog.create_transformation(
            &store,
            &config,
            request("Student.FullName", AttributeBinding::new(10, 100, "Enrollment"))
        ),
        Err(Error::InvalidPath { .. })
    ));

    assert!(catalog.transformations_in(1).is_empty());
}

#[test]
fn test_update_replaces_bindings() {
    let snapshot = translation_snapshot();
    let store = GraphStore::new(&snapshot);
    let config = ResolverConfig::default();
    let mut catalog = TransformationCatalog::from_snapshot(&snapshot);

    let update = TransformationUpdate {
        expression: Some("Student.FullName & \" (SIS)\"".into()),
        target_attribute: Some(AttributeBinding::new(21, 201, "Person.Contact")),
        ..Default::default()
    };
    catalog.update_transformation(&store, &config, 1, update).unwrap();

    let target = catalog.target_binding(1).unwrap();
    assert_eq!(target.entity_id, 21);
    assert_eq!(target.entity_id_path, "Person.Contact");
    assert_eq!(catalog.source_bindings(1).len(), 1);

    let rejected = TransformationUpdate {
        target_attribute: Some(AttributeBinding::new(21, 201, "Organization")),
        ..Default::default()
    };
    assert!(catalog.update_transformation(&store, &config, 1, rejected).is_err());
    assert_eq!(catalog.target_binding(1).unwrap().entity_id_path, "Person.Contact");
}

#[test]
fn test_verify_bindings_reports_stale_paths() {
    let mut snapshot = translation_snapshot();
    for binding in &mut snapshot.transformation_attributes {
        if binding.id == 4 {
            binding.entity_id_path = "Course.Contact".into();
        }
    }
    let store = GraphStore::new(&snapshot);
    let catalog = TransformationCatalog::from_snapshot(&snapshot);

    let issues = catalog.verify_bindings(&store, &ResolverConfig::default());
    assert_eq!(issues.len(), 1);
    assert_eq!(issues[0].binding_id, 4);
    assert_eq!(issues[0].transformation_id, 2);
    assert!(matches!(issues[0].error, Error::InvalidPath { .. }));
}

#[test]
fn test_highest_group_version_is_selected() {
    let snapshot = education_snapshot()
        .with(TransformationGroup::new(1, SIS_MODEL, LIF_MODEL, "1.2"))
        .with(TransformationGroup::new(2, SIS_MODEL, LIF_MODEL, "1.10"))
        .with(TransformationGroup::new(3, SIS_MODEL, LIF_MODEL, "1.9"));
    let catalog = TransformationCatalog::from_snapshot(&snapshot);

    assert_eq!(catalog.group_for(SIS_MODEL, LIF_MODEL, None).unwrap().id, 2);
    assert_eq!(catalog.group_for(SIS_MODEL, LIF_MODEL, Some("1.9")).unwrap().id, 3);
    assert!(matches!(
        catalog.group_for(SIS_MODEL, LIF_MODEL, Some("2.0")),
        Err(Error::NotFound { .. })
    ));
}
