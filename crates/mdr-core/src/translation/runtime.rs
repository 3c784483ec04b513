//! Fragment-merge-with-rollback execution of mapping lists
//!
//! Each mapping is evaluated against the source document in order. Object
//! results are merged speculatively into a copy of the output and the copy is
//! kept only when it still satisfies the target schema. Evaluation failures,
//! undefined and non-object results are skipped. Once every mapping has run,
//! the output must satisfy the target schema in full, otherwise the run fails.
//!
//! Copyright (c) 2025 MDR Team
//! Licensed under the Apache-2.0 license

use super::mapping::Mapping;
use super::merge::merged;
use super::report::{
    MappingOutcome, SkipReason, TranslationMetadata, TranslationOutcome, TranslationReport,
};
use crate::error::{Error, Result};
use crate::expression::error::type_name;
use mdr_schemas::{DocumentValidator, SchemaValidator};
use serde_json::{Map, Value};
use std::time::Instant;
use tracing::{debug, info, warn};

/// Runs mapping lists against one target schema
#[derive(Debug)]
pub struct TranslationRuntime {
    target: DocumentValidator,
}

impl TranslationRuntime {
    /// Compile the target schema once for the whole run
    pub fn new(target_schema: Value) -> Result<Self> {
        Ok(Self {
            target: DocumentValidator::new(target_schema)?,
        })
    }

    pub fn from_validator(target: DocumentValidator) -> Self {
        Self { target }
    }

    pub fn target_schema(&self) -> &Value {
        self.target.schema()
    }

    /// Execute the mappings in order against the source document
    pub fn run(&self, mappings: &[Mapping], source: &Value) -> Result<TranslationOutcome> {
        let started = Instant::now();
        let mut output = Value::Object(Map::new());
        let mut report = TranslationReport::new();

        for mapping in mappings {
            let outcome = self.apply(mapping, source, &mut output);
            report.record(mapping.label(), mapping.transformation_id(), outcome);
        }

        if let Err(err) = self.target.validate(&output) {
            warn!(
                violations = err.schema_violations.len(),
                "Translated document does not satisfy the target schema"
            );
            return Err(Error::SchemaValidation {
                message: format!(
                    "Translated document does not satisfy the target schema: {}",
                    err.message
                ),
                violations: err.schema_violations,
            });
        }

        let summary = report.summary();
        let duration_ms = started.elapsed().as_millis() as u64;
        info!(
            mappings = mappings.len(),
            committed = summary.committed,
            skipped = summary.skipped,
            rolled_back = summary.rolled_back,
            duration_ms,
            "Translation finished"
        );

        Ok(TranslationOutcome {
            document: output,
            report,
            metadata: TranslationMetadata {
                source_data_model_id: None,
                target_data_model_id: None,
                group_version: None,
                timestamp: chrono::Utc::now().to_rfc3339(),
                duration_ms: Some(duration_ms),
                mapping_count: mappings.len(),
            },
        })
    }

    fn apply(&self, mapping: &Mapping, source: &Value, output: &mut Value) -> MappingOutcome {
        let fragment = match mapping.evaluate(source) {
            Ok(Some(fragment)) => fragment,
            Ok(None) => {
                debug!(mapping = mapping.label(), "Mapping result is undefined; skipping");
                return MappingOutcome::Skipped {
                    reason: SkipReason::Undefined,
                };
            }
            Err(err) => {
                warn!(mapping = mapping.label(), error = %err, "Mapping failed to evaluate; skipping");
                let message = match err {
                    Error::MappingEvaluation { message, .. } => message,
                    other => other.to_string(),
                };
                return MappingOutcome::Skipped {
                    reason: SkipReason::Evaluation { message },
                };
            }
        };

        if !fragment.is_object() {
            debug!(
                mapping = mapping.label(),
                found = type_name(&fragment),
                "Mapping result is not an object fragment; skipping"
            );
            return MappingOutcome::Skipped {
                reason: SkipReason::NotAnObject {
                    found: type_name(&fragment).to_string(),
                },
            };
        }

        let candidate = merged(output, &fragment);
        match self.target.validate(&candidate) {
            Ok(()) => {
                *output = candidate;
                debug!(mapping = mapping.label(), "Committed fragment");
                MappingOutcome::Committed
            }
            Err(err) => {
                warn!(
                    mapping = mapping.label(),
                    violations = err.schema_violations.len(),
                    "Merged fragment violates the target schema; rolled back"
                );
                MappingOutcome::RolledBack {
                    violations: err.schema_violations,
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn run(schema: Value, sources: &[&str], document: Value) -> Result<TranslationOutcome> {
        TranslationRuntime::new(schema)?.run(&Mapping::from_sources(sources), &document)
    }

    #[test]
    fn test_scalar_and_undefined_results_are_skipped() {
        let outcome = run(
            json!({}),
            &["\"just text\"", "missing.path", "{\"ok\": true}"],
            json!({}),
        )
        .unwrap();

        assert_eq!(outcome.document, json!({"ok": true}));
        let outcomes: Vec<&MappingOutcome> =
            outcome.report.entries().iter().map(|e| &e.outcome).collect();
        assert_eq!(
            outcomes[0],
            &MappingOutcome::Skipped {
                reason: SkipReason::NotAnObject {
                    found: "string".into()
                }
            }
        );
        assert_eq!(
            outcomes[1],
            &MappingOutcome::Skipped {
                reason: SkipReason::Undefined
            }
        );
        assert_eq!(outcomes[2], &MappingOutcome::Committed);
    }

    #[test]
    fn test_evaluation_error_is_skipped() {
        let outcome = run(
            json!({}),
            &["{\"a\": 1 / 0}", "{\"b\": $nope()}", "{\"c\": 3}"],
            json!({}),
        )
        .unwrap();
        assert_eq!(outcome.document, json!({"c": 3}));
        assert_eq!(outcome.report.summary().skipped, 2);
        assert_eq!(outcome.metadata.mapping_count, 3);
    }

    #[test]
    fn test_later_mappings_see_earlier_commits() {
        let schema = json!({
            "type": "object",
            "properties": {"User": {"type": "object", "properties": {"Name": {"type": "string"}}}}
        });
        let outcome = run(
            schema,
            &["{\"User\": {\"Name\": name}}", "{\"User\": {\"Id\": id}}"],
            json!({"name": "Ada", "id": 7}),
        )
        .unwrap();
        assert_eq!(outcome.document, json!({"User": {"Name": "Ada", "Id": 7}}));
    }

    #[test]
    fn test_invalid_target_schema() {
        assert!(matches!(
            TranslationRuntime::new(json!({"type": 5})),
            Err(Error::SchemaValidation { .. })
        ));
    }
}
