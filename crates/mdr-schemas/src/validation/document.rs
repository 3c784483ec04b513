//! Validation of JSON documents against a compiled data-model schema
//!
//! The schema compiler in `mdr-core` produces draft 2020-12 JSON-Schema
//! documents. `DocumentValidator` compiles such a document once and checks
//! instances against it, either as a cheap yes/no probe or with the full list
//! of violations.
//!
//! Copyright (c) 2025 MDR Team
//! Licensed under the Apache-2.0 license

use crate::validation::base::{SchemaValidator, ValidationMode};
use crate::validation::error::{ValidationError, ValidationResult, Violation};
use serde_json::Value;
use std::fmt;
use std::sync::Arc;

/// A compiled JSON-Schema ready to validate documents
pub struct DocumentValidator {
    schema: Arc<Value>,
    compiled: jsonschema::Validator,
}

impl DocumentValidator {
    /// Compile a schema document
    pub fn new(schema: Value) -> ValidationResult<Self> {
        let compiled = jsonschema::validator_for(&schema).map_err(|e| {
            ValidationError::with_violations(
                "$",
                format!("Invalid schema document: {}", e),
                vec![ValidationError::create_violation(
                    "schema_compilation",
                    "a valid JSON-Schema document",
                    e.to_string(),
                )],
            )
        })?;

        Ok(Self {
            schema: Arc::new(schema),
            compiled,
        })
    }

    /// A validator that accepts every document
    pub fn permissive() -> ValidationResult<Self> {
        Self::new(Value::Object(serde_json::Map::new()))
    }

    /// The schema this validator was compiled from
    pub fn schema(&self) -> &Value {
        &self.schema
    }

    fn violations(&self, input: &Value) -> Vec<Violation> {
        self.compiled
            .iter_errors(input)
            .map(|error| {
                let schema_path = error.schema_path.to_string();
                let rule = schema_path
                    .rsplit('/')
                    .next()
                    .filter(|s| !s.is_empty())
                    .unwrap_or("schema")
                    .to_string();
                Violation {
                    rule,
                    expected: error.to_string(),
                    actual: error.instance.to_string(),
                    instance_path: error.instance_path.to_string(),
                }
            })
            .collect()
    }
}

impl fmt::Debug for DocumentValidator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DocumentValidator")
            .field("schema", &self.schema)
            .finish_non_exhaustive()
    }
}

impl SchemaValidator for DocumentValidator {
    type Input = Value;

    fn validate_in(&self, input: &Value, mode: ValidationMode) -> ValidationResult<()> {
        match mode {
            ValidationMode::FailFast => {
                if self.compiled.is_valid(input) {
                    Ok(())
                } else {
                    Err(ValidationError::new("$", "Document does not match schema"))
                }
            }
            ValidationMode::Complete => {
                let violations = self.violations(input);
                if violations.is_empty() {
                    Ok(())
                } else {
                    Err(ValidationError::with_violations(
                        "$",
                        format!(
                            "Document does not match schema ({} violation{})",
                            violations.len(),
                            if violations.len() == 1 { "" } else { "s" }
                        ),
                        violations,
                    ))
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn schema_requiring_string_y() -> Value {
        json!({
            "type": "object",
            "properties": {
                "x": {"type": "integer"},
                "y": {"type": "string"}
            }
        })
    }

    #[test]
    fn test_permissive_accepts_anything() {
        let validator = DocumentValidator::permissive().unwrap();
        assert!(validator.is_valid(&json!({"anything": [1, 2, 3]})));
        assert!(validator.validate(&json!({})).is_ok());
    }

    #[test]
    fn test_type_violation_reports_instance_path() {
        let validator = DocumentValidator::new(schema_requiring_string_y()).unwrap();
        let err = validator.validate(&json!({"x": 1, "y": 123})).unwrap_err();

        assert_eq!(err.schema_violations.len(), 1);
        let violation = &err.schema_violations[0];
        assert_eq!(violation.rule, "type");
        assert_eq!(violation.instance_path, "/y");
        assert_eq!(violation.actual, "123");
    }

    #[test]
    fn test_required_property_missing() {
        let validator = DocumentValidator::new(json!({
            "type": "object",
            "required": ["must"]
        }))
        .unwrap();

        assert!(!validator.is_valid(&json!({"x": 1})));
        let err = validator.validate(&json!({"x": 1})).unwrap_err();
        assert_eq!(err.schema_violations[0].rule, "required");
    }

    #[test]
    fn test_invalid_schema_is_rejected() {
        let result = DocumentValidator::new(json!({"type": 12}));
        assert!(result.is_err());
    }
}
