//! Property-based tests for document validation
//!
//! These tests verify that the fail-fast and complete validation modes agree
//! across a wide range of inputs.

use mdr_schemas::{create_document_validator, DocumentValidator, SchemaValidator};
use proptest::prelude::*;
use serde_json::{json, Value};

/// Strategy for generating random JSON values with controlled complexity
fn json_value_strategy() -> impl Strategy<Value = Value> {
    let leaf = prop_oneof![
        Just(Value::Null),
        any::<bool>().prop_map(Value::Bool),
        any::<i64>().prop_map(|n| Value::Number(n.into())),
        "[a-zA-Z0-9 ]{0,50}".prop_map(Value::String),
    ];

    leaf.prop_recursive(
        3,  // max depth
        10, // max size
        5,  // items per collection
        |inner| {
            prop_oneof![
                proptest::collection::vec(inner.clone(), 0..5).prop_map(Value::Array),
                proptest::collection::hash_map("[a-zA-Z_][a-zA-Z0-9_]{0,20}", inner, 0..5)
                    .prop_map(|m| Value::Object(m.into_iter().collect())),
            ]
        },
    )
}

/// Documents shaped like translator output for a small Person schema
fn person_document_strategy() -> impl Strategy<Value = Value> {
    (
        proptest::option::of(json_value_strategy()),
        proptest::option::of(json_value_strategy()),
        proptest::collection::vec(json_value_strategy(), 0..3),
    )
        .prop_map(|(name, age, courses)| {
            let mut person = serde_json::Map::new();
            if let Some(name) = name {
                person.insert("Name".into(), name);
            }
            if let Some(age) = age {
                person.insert("Age".into(), age);
            }
            person.insert("Course".into(), Value::Array(courses));
            json!({"Person": person})
        })
}

fn person_validator() -> DocumentValidator {
    create_document_validator(json!({
        "type": "object",
        "required": ["Person"],
        "properties": {
            "Person": {
                "type": "object",
                "required": ["Name"],
                "properties": {
                    "Name": {"type": "string"},
                    "Age": {"type": "integer"},
                    "Course": {
                        "type": "array",
                        "items": {"type": "object", "properties": {"Title": {"type": "string"}}}
                    }
                }
            }
        }
    }))
    .unwrap()
}

proptest! {
    /// Property: the permissive validator accepts every document
    #[test]
    fn prop_permissive_accepts_everything(value in json_value_strategy()) {
        let validator = DocumentValidator::permissive().unwrap();
        prop_assert!(validator.is_valid(&value));
        prop_assert!(validator.validate(&value).is_ok());
    }

    /// Property: fail-fast and complete modes reach the same verdict
    #[test]
    fn prop_modes_agree(document in person_document_strategy()) {
        let validator = person_validator();
        prop_assert_eq!(validator.is_valid(&document), validator.validate(&document).is_ok());
    }

    /// Property: a rejection always carries violations located by JSON pointers
    #[test]
    fn prop_rejections_carry_violations(document in person_document_strategy()) {
        let validator = person_validator();
        if let Err(error) = validator.validate(&document) {
            prop_assert!(!error.schema_violations.is_empty());
            for violation in &error.schema_violations {
                prop_assert!(
                    violation.instance_path.is_empty() || violation.instance_path.starts_with('/')
                );
            }
        }
    }

    /// Property: arbitrary values validate against the type they carry
    #[test]
    fn prop_string_schema_matches_strings(value in json_value_strategy()) {
        let validator = create_document_validator(json!({"type": "string"})).unwrap();
        prop_assert_eq!(validator.is_valid(&value), value.is_string());
    }
}
