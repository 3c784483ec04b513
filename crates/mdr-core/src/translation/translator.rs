//! Translation between two data models
//!
//! Copyright (c) 2025 MDR Team
//! Licensed under the Apache-2.0 license

use super::report::TranslationOutcome;
use super::runtime::TranslationRuntime;
use crate::catalog::TransformationCatalog;
use crate::config::{ResolverConfig, SourceValidation, TranslatorConfig};
use crate::error::{Error, Result};
use crate::graph::{AccessFilters, GraphStore, SchemaCache};
use crate::schema::SchemaCompiler;
use crate::types::RowId;
use mdr_schemas::{DocumentValidator, SchemaValidator};
use serde_json::Value;
use tracing::{info_span, warn};

/// Resolves schemas and mappings for a model pair and runs them
pub struct Translator<'s, 'a> {
    store: &'s GraphStore<'a>,
    catalog: &'s TransformationCatalog,
    resolver_config: &'s ResolverConfig,
    config: TranslatorConfig,
    cache: Option<&'s SchemaCache>,
}

impl<'s, 'a> Translator<'s, 'a> {
    pub fn new(
        store: &'s GraphStore<'a>,
        catalog: &'s TransformationCatalog,
        resolver_config: &'s ResolverConfig,
    ) -> Self {
        Self {
            store,
            catalog,
            resolver_config,
            config: TranslatorConfig::default(),
            cache: None,
        }
    }

    pub fn with_config(mut self, config: TranslatorConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_cache(mut self, cache: &'s SchemaCache) -> Self {
        self.cache = Some(cache);
        self
    }

    fn compiler(&self) -> SchemaCompiler<'s, 'a> {
        let compiler = SchemaCompiler::new(self.store, self.resolver_config);
        match self.cache {
            Some(cache) => compiler.with_cache(cache),
            None => compiler,
        }
    }

    /// Translate a document conforming to the source model into the target model
    pub fn translate(
        &self,
        source_data_model_id: RowId,
        target_data_model_id: RowId,
        document: &Value,
    ) -> Result<TranslationOutcome> {
        let span = info_span!("translate", source_data_model_id, target_data_model_id);
        let _guard = span.enter();

        let compiler = self.compiler();
        let source_schema = compiler.compile_shared(source_data_model_id, AccessFilters::default())?;
        let target_schema = compiler.compile_shared(target_data_model_id, AccessFilters::default())?;

        self.check_source(&source_schema, document)?;

        let group_version = self
            .catalog
            .group_for(
                source_data_model_id,
                target_data_model_id,
                self.config.group_version.as_deref(),
            )?
            .group_version
            .clone();
        let mappings = self.catalog.mappings_for(
            self.store,
            self.resolver_config,
            source_data_model_id,
            target_data_model_id,
            Some(&group_version),
        )?;

        let runtime = TranslationRuntime::new(target_schema.as_ref().clone())?;
        let mut outcome = runtime.run(&mappings, document)?;
        outcome.metadata.source_data_model_id = Some(source_data_model_id);
        outcome.metadata.target_data_model_id = Some(target_data_model_id);
        outcome.metadata.group_version = Some(group_version);
        Ok(outcome)
    }

    fn check_source(&self, source_schema: &Value, document: &Value) -> Result<()> {
        if self.config.source_validation == SourceValidation::Off {
            return Ok(());
        }

        let validator = DocumentValidator::new(source_schema.clone())?;
        match validator.validate(document) {
            Ok(()) => Ok(()),
            Err(err) if self.config.source_validation == SourceValidation::Strict => {
                Err(Error::SchemaValidation {
                    message: format!(
                        "Source document does not satisfy the source schema: {}",
                        err.message
                    ),
                    violations: err.schema_violations,
                })
            }
            Err(err) => {
                warn!(
                    violations = err.schema_violations.len(),
                    "Source document does not satisfy the source schema; translating anyway"
                );
                Ok(())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::Snapshot;
    use crate::types::*;
    use serde_json::json;

    fn snapshot() -> Snapshot {
        Snapshot::new()
            .with(DataModel::source_schema(1, "Src", "1.0"))
            .with(DataModel::base(2, "LIF", "1.0"))
            .with(Entity::new(10, 1, "Student"))
            .with(Attribute::new(100, 1, "FullName", "string").required())
            .with(EntityAttributeAssociation::new(1, 10, 100))
            .with(Entity::new(20, 2, "Person"))
            .with(Attribute::new(200, 2, "Name", "string"))
            .with(EntityAttributeAssociation::new(2, 20, 200))
            .with(TransformationGroup::new(1, 1, 2, "1.0"))
            .with(Transformation::new(1, 1, "Student.FullName"))
            .with(TransformationAttribute::source(1, 1, 10, 100, "Student"))
            .with(TransformationAttribute::target(2, 1, 20, 200, "Person"))
    }

    #[test]
    fn test_translate_between_models() {
        let snapshot = snapshot();
        let store = GraphStore::new(&snapshot);
        let catalog = TransformationCatalog::from_snapshot(&snapshot);
        let config = ResolverConfig::default();

        let outcome = Translator::new(&store, &catalog, &config)
            .translate(1, 2, &json!({"Student": {"FullName": "Ada Lovelace"}}))
            .unwrap();
        assert_eq!(outcome.document, json!({"Person": {"Name": "Ada Lovelace"}}));
        assert_eq!(outcome.metadata.group_version.as_deref(), Some("1.0"));
        assert_eq!(outcome.metadata.target_data_model_id, Some(2));
    }

    #[test]
    fn test_strict_source_validation() {
        let snapshot = snapshot();
        let store = GraphStore::new(&snapshot);
        let catalog = TransformationCatalog::from_snapshot(&snapshot);
        let config = ResolverConfig::default();
        let document = json!({"Student": {"Other": 1}});

        let strict = TranslatorConfig {
            source_validation: SourceValidation::Strict,
            ..Default::default()
        };
        let err = Translator::new(&store, &catalog, &config)
            .with_config(strict)
            .translate(1, 2, &document)
            .unwrap_err();
        assert!(matches!(err, Error::SchemaValidation { .. }));

        // The default policy only warns; the undefined name is dropped from the fragment
        let outcome = Translator::new(&store, &catalog, &config)
            .translate(1, 2, &document)
            .unwrap();
        assert_eq!(outcome.document, json!({"Person": {}}));
    }

    #[test]
    fn test_missing_group() {
        let snapshot = snapshot();
        let store = GraphStore::new(&snapshot);
        let catalog = TransformationCatalog::from_snapshot(&snapshot);
        let config = ResolverConfig::default();
        assert!(matches!(
            Translator::new(&store, &catalog, &config).translate(2, 1, &json!({})),
            Err(Error::NotFound { .. })
        ));
    }
}
