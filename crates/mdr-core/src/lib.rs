//! MDR Core - Schema compilation and schema-driven translation over entity-association graphs
//!
//! This crate turns a snapshot of persisted metadata rows (data models,
//! entities, attributes, associations, transformations) into JSON Schema
//! documents, validates entity-id paths that locate attributes in the entity
//! tree, and translates documents between data models by running mapping
//! expressions under the target schema.
//!
//! # Main Components
//!
//! - **Graph Store**: active-row views of one data model, honoring extension layering
//! - **Tree Resolver**: the embedded-association forest and reference pinning
//! - **Transformation Catalog**: groups, bindings and entity-id path validation
//! - **Schema Compiler**: JSON Schema documents, with reduced reference copies
//! - **Translator Runtime**: fragment merge with per-mapping rollback
//!
//! # Example
//!
//! ```no_run
//! use mdr_core::{compile_schema, AccessFilters, Result, Snapshot};
//!
//! fn example(snapshot: &Snapshot) -> Result<()> {
//!     let schema = compile_schema(snapshot, 1, AccessFilters::default())?;
//!     println!("{}", schema["title"]);
//!     Ok(())
//! }
//! ```
//!
//! Copyright (c) 2025 MDR Team
//! Licensed under the Apache-2.0 license

pub mod catalog;
pub mod config;
pub mod error;
pub mod expression;
pub mod graph;
pub mod schema;
pub mod translation;
pub mod tree;
pub mod types;

// Re-export main types for convenience
pub use catalog::{
    compare_versions, AttributeBinding, BindingIssue, EntityIdPath, NewTransformation, PathId,
    TransformationCatalog, TransformationUpdate,
};
pub use config::{ResolverConfig, SourceValidation, TranslatorConfig};
pub use error::{Error, PathErrorReason, Result, RowKind};
pub use expression::{Expression, ExpressionError};
pub use graph::{
    AccessFilters, AccessScope, GraphStore, GraphView, IntegrityRule, IntegrityViolation,
    SchemaCache, Snapshot,
};
pub use schema::{reduce_to_required, SchemaCompiler};
pub use translation::{
    Mapping, MappingOutcome, TranslationMetadata, TranslationOutcome, TranslationReport,
    TranslationRuntime, Translator,
};
pub use tree::{AncestorChain, Forest, TreeNode, TreeResolver};
pub use types::*;

use serde_json::Value;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Compile the JSON Schema of a data model with default resolver settings
pub fn compile_schema(
    snapshot: &Snapshot,
    data_model_id: RowId,
    filters: AccessFilters,
) -> Result<Value> {
    let store = GraphStore::new(snapshot);
    let config = ResolverConfig::default();
    SchemaCompiler::new(&store, &config).compile(data_model_id, filters)
}

/// Check that an entity-id path locates the entity in its own data model
pub fn validate_path(snapshot: &Snapshot, entity_id: RowId, path: &str) -> Result<EntityIdPath> {
    let store = GraphStore::new(snapshot);
    catalog::validate_path(&store, &ResolverConfig::default(), entity_id, path)
}

/// Translate a document from the source data model into the target data model
///
/// Uses the snapshot's transformation groups and default settings; fails
/// when the translated document does not satisfy the target schema.
pub fn translate(
    snapshot: &Snapshot,
    source_data_model_id: RowId,
    target_data_model_id: RowId,
    document: &Value,
) -> Result<Value> {
    let store = GraphStore::new(snapshot);
    let catalog = TransformationCatalog::from_snapshot(snapshot);
    let config = ResolverConfig::default();
    Translator::new(&store, &catalog, &config)
        .translate(source_data_model_id, target_data_model_id, document)
        .map(|outcome| outcome.document)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_library_version() {
        assert!(!VERSION.is_empty());
    }

    #[test]
    fn test_compile_unknown_model() {
        let snapshot = Snapshot::new();
        assert!(matches!(
            compile_schema(&snapshot, 42, AccessFilters::default()),
            Err(Error::NotFound { .. })
        ));
    }

    #[test]
    fn test_top_level_path_validation() {
        let snapshot = Snapshot::new()
            .with(DataModel::base(1, "LIF", "1.0"))
            .with(Entity::new(10, 1, "Person"))
            .with(Entity::new(11, 1, "Contact"))
            .with(EntityAssociation::embedded(1, 10, 11));

        assert!(validate_path(&snapshot, 11, "Person.Contact").is_ok());
        assert!(matches!(
            validate_path(&snapshot, 11, ""),
            Err(Error::InvalidPath {
                reason: PathErrorReason::Empty,
                ..
            })
        ));
        assert_eq!(
            compile_schema(&snapshot, 1, AccessFilters::default()).unwrap()["title"],
            json!("LIF")
        );
    }
}
