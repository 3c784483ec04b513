//! Schema compiler
//!
//! Walks the embedded forest of a data model view and emits a draft 2020-12
//! JSON-Schema document. Attributes become typed leaf properties, embedded
//! children become nested object (or array-of-object) properties, and every
//! reference association is inlined as a reduced copy of the referenced
//! entity: its required properties only, always typed `object`.
//!
//! The document is built in two passes over the same forest. The first pass
//! yields the plain shape of each node; the second repeats the walk and, at
//! every position of a reference's parent, adds the reduced copy taken from
//! the first-pass shape of the referenced node. Reduced copies therefore
//! never contain further reference properties, which keeps mutually
//! referencing entities finite.
//!
//! Copyright (c) 2025 MDR Team
//! Licensed under the Apache-2.0 license

pub mod types;

pub use types::{DataType, JsonType};

use crate::config::ResolverConfig;
use crate::error::{Error, Result};
use crate::graph::{AccessFilters, GraphStore, GraphView, SchemaCache};
use crate::tree::{Forest, ResolvedReference, TreeNode, TreeResolver};
use crate::types::{Attribute, RowId};
use serde_json::{json, Map, Value};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{debug, instrument, warn};

/// JSON-Schema dialect of compiled documents
pub const SCHEMA_DIALECT: &str = "https://json-schema.org/draft/2020-12/schema";

/// Compiles data model views into JSON-Schema documents
pub struct SchemaCompiler<'s, 'a> {
    store: &'s GraphStore<'a>,
    config: &'s ResolverConfig,
    cache: Option<&'s SchemaCache>,
}

impl<'s, 'a> SchemaCompiler<'s, 'a> {
    pub fn new(store: &'s GraphStore<'a>, config: &'s ResolverConfig) -> Self {
        Self {
            store,
            config,
            cache: None,
        }
    }

    /// Memoize compiled documents in a shared cache
    pub fn with_cache(mut self, cache: &'s SchemaCache) -> Self {
        self.cache = Some(cache);
        self
    }

    /// Compile the schema of a data model under the given access filters
    pub fn compile(&self, data_model_id: RowId, filters: AccessFilters) -> Result<Value> {
        Ok(self.compile_shared(data_model_id, filters)?.as_ref().clone())
    }

    /// Like [`compile`](Self::compile), sharing the cached document when a cache is attached
    pub fn compile_shared(&self, data_model_id: RowId, filters: AccessFilters) -> Result<Arc<Value>> {
        let scope = filters.scope()?;
        match self.cache {
            Some(cache) => cache.get_or_try_insert_with(data_model_id, scope, self.config, || {
                self.build(data_model_id, filters)
            }),
            None => self.build(data_model_id, filters).map(Arc::new),
        }
    }

    #[instrument(skip(self), fields(data_model_id))]
    fn build(&self, data_model_id: RowId, filters: AccessFilters) -> Result<Value> {
        let view = self.store.load_view(data_model_id, filters)?;
        let resolver = TreeResolver::new(&view, self.config);
        let forest = resolver.forest()?;
        let references = resolver.resolve_references(&forest)?;

        let builder = ShapeBuilder::new(self.store, &view, &resolver, &forest, &references);
        let mut properties = Map::new();
        let mut required = Vec::new();
        for root in forest.roots() {
            let name = resolver.property_name(root)?;
            properties.insert(name.clone(), builder.node_schema(root, true)?);
            if view.entity(root.entity_id).is_some_and(|e| e.is_required) {
                required.push(name);
            }
        }

        let model = view.data_model();
        debug!(
            roots = forest.roots().len(),
            nodes = forest.node_count(),
            references = references.len(),
            "Compiled schema"
        );
        Ok(json!({
            "$schema": SCHEMA_DIALECT,
            "title": model.name,
            "description": format!("{} {} ({}, {})", model.name, model.version, model.model_type, view.scope()),
            "type": "object",
            "required": required,
            "properties": properties,
        }))
    }
}

/// Per-compilation state shared by both passes
struct ShapeBuilder<'b, 'a> {
    store: &'b GraphStore<'a>,
    view: &'b GraphView<'a>,
    resolver: &'b TreeResolver<'b, 'a>,
    forest: &'b Forest,
    references: BTreeMap<RowId, Vec<&'b ResolvedReference>>,
}

impl<'b, 'a> ShapeBuilder<'b, 'a> {
    fn new(
        store: &'b GraphStore<'a>,
        view: &'b GraphView<'a>,
        resolver: &'b TreeResolver<'b, 'a>,
        forest: &'b Forest,
        resolved: &'b [ResolvedReference],
    ) -> Self {
        let mut references: BTreeMap<RowId, Vec<&'b ResolvedReference>> = BTreeMap::new();
        for reference in resolved {
            references
                .entry(reference.parent_entity_id)
                .or_default()
                .push(reference);
        }
        Self {
            store,
            view,
            resolver,
            forest,
            references,
        }
    }

    /// Property schema of a node: its object shape, wrapped for array entities
    fn node_schema(&self, node: &TreeNode, with_references: bool) -> Result<Value> {
        let entity = self.view.entity(node.entity_id).ok_or_else(|| {
            Error::consistency(
                format!("Tree node for entity {} has no visible entity row", node.entity_id),
                None,
            )
        })?;
        let shape = self.object_shape(node, with_references)?;
        Ok(if entity.is_array {
            json!({"type": "array", "items": shape})
        } else {
            shape
        })
    }

    fn object_shape(&self, node: &TreeNode, with_references: bool) -> Result<Value> {
        let mut properties = Map::new();
        let mut required = Vec::new();

        for attribute in self.view.attributes_of(node.entity_id) {
            properties.insert(attribute.unique_name.clone(), self.attribute_schema(attribute)?);
            if attribute.is_required {
                required.push(attribute.unique_name.clone());
            }
        }

        for child in &node.children {
            let name = self.resolver.property_name(child)?;
            if properties.contains_key(&name) {
                warn!(
                    entity_id = node.entity_id,
                    property = %name,
                    "Child entity property collides with an attribute; keeping the attribute"
                );
                continue;
            }
            properties.insert(name.clone(), self.node_schema(child, with_references)?);
            if self.view.entity(child.entity_id).is_some_and(|e| e.is_required) {
                required.push(name);
            }
        }

        if with_references {
            for reference in self.references.get(&node.entity_id).into_iter().flatten() {
                if properties.contains_key(&reference.property_name) {
                    warn!(
                        entity_id = node.entity_id,
                        property = %reference.property_name,
                        "Reference property collides with an existing property; keeping the existing one"
                    );
                    continue;
                }
                properties.insert(reference.property_name.clone(), self.reduced_copy(reference)?);
            }
        }

        Ok(json!({
            "type": "object",
            "required": required,
            "properties": properties,
        }))
    }

    /// Required-only object copy of the referenced entity's first-pass shape
    fn reduced_copy(&self, reference: &ResolvedReference) -> Result<Value> {
        let target = self.forest.node_at(&reference.target).ok_or_else(|| {
            Error::consistency(
                format!(
                    "Resolved location of entity {} is missing from the forest",
                    reference.child_entity_id
                ),
                Some(format!("association {}", reference.association_id)),
            )
        })?;
        Ok(reduce_to_required(self.object_shape(target, false)?))
    }

    fn attribute_schema(&self, attribute: &Attribute) -> Result<Value> {
        let data_type = DataType::parse(&attribute.data_type);
        if !data_type.known {
            debug!(
                attribute_id = attribute.id,
                data_type = %attribute.data_type,
                "Unknown data type mapped to string"
            );
        }

        let values = match attribute.value_set_id {
            Some(value_set_id) => {
                Some(self.enum_values(attribute, data_type.json_type, value_set_id)?)
            }
            None => None,
        };
        let item = data_type.item_schema(values.as_deref());
        Ok(if attribute.is_array {
            json!({"type": "array", "items": item})
        } else {
            item
        })
    }

    fn enum_values(
        &self,
        attribute: &Attribute,
        json_type: JsonType,
        value_set_id: RowId,
    ) -> Result<Vec<Value>> {
        self.store.value_set(value_set_id).map_err(|_| {
            Error::consistency(
                format!(
                    "Attribute {} ({}) refers to missing value set {}",
                    attribute.id, attribute.unique_name, value_set_id
                ),
                Some(format!("data model {}", attribute.data_model_id)),
            )
        })?;
        self.store
            .value_set_values(value_set_id)
            .into_iter()
            .map(|entry| {
                json_type.coerce(&entry.value).ok_or_else(|| {
                    Error::consistency(
                        format!(
                            "Value '{}' of value set {} is not a valid {} for attribute {} ({})",
                            entry.value, value_set_id, json_type, attribute.id, attribute.unique_name
                        ),
                        Some(format!("value set {}", value_set_id)),
                    )
                })
            })
            .collect()
    }
}

/// Keep only the required properties of an object shape and force `type: object`
pub fn reduce_to_required(shape: Value) -> Value {
    let required: Vec<Value> = shape
        .get("required")
        .and_then(Value::as_array)
        .cloned()
        .unwrap_or_default();
    let properties: Map<String, Value> = shape
        .get("properties")
        .and_then(Value::as_object)
        .map(|all| {
            required
                .iter()
                .filter_map(Value::as_str)
                .filter_map(|name| all.get(name).map(|schema| (name.to_string(), schema.clone())))
                .collect()
        })
        .unwrap_or_default();

    json!({
        "type": "object",
        "required": required,
        "properties": properties,
    })
}
