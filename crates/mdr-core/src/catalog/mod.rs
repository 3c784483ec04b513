//! Transformation catalog
//!
//! Holds transformation groups, transformations and their attribute
//! bindings, validates every binding's entity-id path against the tree
//! resolver, and compiles a group's transformations into the ordered
//! [`Mapping`] list the translator runs.
//!
//! Copyright (c) 2025 MDR Team
//! Licensed under the Apache-2.0 license

pub mod path;

pub use path::{validate_path, validate_path_in_model, EntityIdPath, PathId};

use crate::config::ResolverConfig;
use crate::error::{Error, Result, RowKind};
use crate::expression::{is_builtin_language, Expression, ExpressionError, TargetKey};
use crate::graph::{AccessFilters, GraphStore, Snapshot};
use crate::translation::Mapping;
use crate::tree::TreeResolver;
use crate::types::{
    AttributeType, RowId, Transformation, TransformationAttribute, TransformationGroup,
};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::BTreeMap;
use tracing::{debug, info, warn};

/// Compare dotted version strings numerically, falling back to text per part
pub fn compare_versions(left: &str, right: &str) -> Ordering {
    let mut left_parts = left.split('.');
    let mut right_parts = right.split('.');
    loop {
        match (left_parts.next(), right_parts.next()) {
            (None, None) => return Ordering::Equal,
            (Some(_), None) => return Ordering::Greater,
            (None, Some(_)) => return Ordering::Less,
            (Some(l), Some(r)) => {
                let ordering = match (l.parse::<u64>(), r.parse::<u64>()) {
                    (Ok(l), Ok(r)) => l.cmp(&r),
                    _ => l.cmp(r),
                };
                if ordering != Ordering::Equal {
                    return ordering;
                }
            }
        }
    }
}

/// Where a transformation reads or writes one attribute
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttributeBinding {
    pub entity_id: RowId,
    pub attribute_id: RowId,
    pub entity_id_path: String,
}

impl AttributeBinding {
    pub fn new(entity_id: RowId, attribute_id: RowId, entity_id_path: &str) -> Self {
        Self {
            entity_id,
            attribute_id,
            entity_id_path: entity_id_path.to_string(),
        }
    }
}

/// Request to create a transformation
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewTransformation {
    pub group_id: RowId,
    #[serde(default)]
    pub name: Option<String>,
    pub expression: String,
    #[serde(default)]
    pub expression_language: Option<String>,
    #[serde(default)]
    pub source_attributes: Vec<AttributeBinding>,
    pub target_attribute: AttributeBinding,
}

/// Partial update of a transformation; unset fields are kept
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TransformationUpdate {
    pub name: Option<String>,
    pub expression: Option<String>,
    pub expression_language: Option<String>,
    pub source_attributes: Option<Vec<AttributeBinding>>,
    pub target_attribute: Option<AttributeBinding>,
}

impl TransformationUpdate {
    /// Whether the update replaces any attribute binding
    pub fn replaces_bindings(&self) -> bool {
        self.source_attributes.is_some() || self.target_attribute.is_some()
    }
}

/// A stored binding that no longer validates
#[derive(Debug)]
pub struct BindingIssue {
    pub transformation_id: RowId,
    pub binding_id: RowId,
    pub error: Error,
}

/// In-memory catalog of transformation definitions
#[derive(Debug, Clone, Default)]
pub struct TransformationCatalog {
    groups: BTreeMap<RowId, TransformationGroup>,
    transformations: BTreeMap<RowId, Transformation>,
    bindings: BTreeMap<RowId, TransformationAttribute>,
}

impl TransformationCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load the active transformation rows of a snapshot
    pub fn from_snapshot(snapshot: &Snapshot) -> Self {
        let groups: BTreeMap<RowId, TransformationGroup> = snapshot
            .active_transformation_groups()
            .map(|g| (g.id, g.clone()))
            .collect();
        let transformations: BTreeMap<RowId, Transformation> = snapshot
            .active_transformations()
            .filter(|t| groups.contains_key(&t.transformation_group_id))
            .map(|t| (t.id, t.clone()))
            .collect();
        let bindings: BTreeMap<RowId, TransformationAttribute> = snapshot
            .active_transformation_attributes()
            .filter(|b| transformations.contains_key(&b.transformation_id))
            .map(|b| (b.id, b.clone()))
            .collect();

        debug!(
            groups = groups.len(),
            transformations = transformations.len(),
            bindings = bindings.len(),
            "Loaded transformation catalog"
        );
        Self {
            groups,
            transformations,
            bindings,
        }
    }

    pub fn add_group(&mut self, group: TransformationGroup) {
        self.groups.insert(group.id, group);
    }

    pub fn groups(&self) -> impl Iterator<Item = &TransformationGroup> {
        self.groups.values()
    }

    pub fn group(&self, id: RowId) -> Result<&TransformationGroup> {
        self.groups
            .get(&id)
            .ok_or_else(|| Error::not_found(RowKind::TransformationGroup, id))
    }

    /// The group for a source → target pair: the requested version, else the highest
    pub fn group_for(
        &self,
        source_data_model_id: RowId,
        target_data_model_id: RowId,
        version: Option<&str>,
    ) -> Result<&TransformationGroup> {
        let candidates = self.groups.values().filter(|g| {
            g.source_data_model_id == source_data_model_id
                && g.target_data_model_id == target_data_model_id
        });

        let group = match version {
            Some(version) => candidates
                .filter(|g| g.group_version == version)
                .min_by_key(|g| g.id),
            None => candidates.max_by(|a, b| {
                compare_versions(&a.group_version, &b.group_version).then(b.id.cmp(&a.id))
            }),
        };

        group.ok_or_else(|| {
            Error::not_found(
                RowKind::TransformationGroup,
                match version {
                    Some(version) => format!(
                        "{} -> {} (version {})",
                        source_data_model_id, target_data_model_id, version
                    ),
                    None => format!("{} -> {}", source_data_model_id, target_data_model_id),
                },
            )
        })
    }

    pub fn transformation(&self, id: RowId) -> Result<&Transformation> {
        self.transformations
            .get(&id)
            .ok_or_else(|| Error::not_found(RowKind::Transformation, id))
    }

    /// Transformations of a group in catalog order
    pub fn transformations_in(&self, group_id: RowId) -> Vec<&Transformation> {
        self.transformations
            .values()
            .filter(|t| t.transformation_group_id == group_id)
            .collect()
    }

    /// Attribute bindings of a transformation in id order
    pub fn bindings_of(&self, transformation_id: RowId) -> Vec<&TransformationAttribute> {
        self.bindings
            .values()
            .filter(|b| b.transformation_id == transformation_id)
            .collect()
    }

    pub fn source_bindings(&self, transformation_id: RowId) -> Vec<&TransformationAttribute> {
        self.bindings_of(transformation_id)
            .into_iter()
            .filter(|b| b.attribute_type == AttributeType::Source)
            .collect()
    }

    pub fn target_binding(&self, transformation_id: RowId) -> Option<&TransformationAttribute> {
        self.bindings_of(transformation_id)
            .into_iter()
            .find(|b| b.attribute_type == AttributeType::Target)
    }

    /// Validate and store a new transformation
    pub fn create_transformation(
        &mut self,
        store: &GraphStore<'_>,
        config: &ResolverConfig,
        request: NewTransformation,
    ) -> Result<&Transformation> {
        let group = self.group(request.group_id)?.clone();
        let language = request
            .expression_language
            .unwrap_or_else(|| config.default_expression_language.clone());
        check_expression(&request.expression, &language)?;

        for binding in &request.source_attributes {
            validate_source_binding(store, config, &group, binding)?;
        }
        validate_target_binding(store, config, &group, &request.target_attribute)?;

        let id = self.next_transformation_id();
        let transformation = Transformation {
            id,
            transformation_group_id: group.id,
            name: request.name,
            expression: request.expression,
            expression_language: language,
            deleted: false,
        };
        self.transformations.insert(id, transformation);

        for binding in &request.source_attributes {
            self.insert_binding(id, AttributeType::Source, binding);
        }
        self.insert_binding(id, AttributeType::Target, &request.target_attribute);

        info!(
            transformation_id = id,
            group_id = group.id,
            sources = request.source_attributes.len(),
            "Created transformation"
        );
        self.transformation(id)
    }

    /// Apply a partial update; bindings are re-validated only when replaced
    pub fn update_transformation(
        &mut self,
        store: &GraphStore<'_>,
        config: &ResolverConfig,
        id: RowId,
        update: TransformationUpdate,
    ) -> Result<&Transformation> {
        let current = self.transformation(id)?.clone();
        let group = self.group(current.transformation_group_id)?.clone();

        let expression = update.expression.unwrap_or_else(|| current.expression.clone());
        let language = update
            .expression_language
            .unwrap_or_else(|| current.expression_language.clone());
        if expression != current.expression || language != current.expression_language {
            check_expression(&expression, &language)?;
        }

        if let Some(sources) = &update.source_attributes {
            for binding in sources {
                validate_source_binding(store, config, &group, binding)?;
            }
        }
        if let Some(target) = &update.target_attribute {
            validate_target_binding(store, config, &group, target)?;
        }

        if let Some(sources) = &update.source_attributes {
            self.remove_bindings(id, AttributeType::Source);
            for binding in sources {
                self.insert_binding(id, AttributeType::Source, binding);
            }
        }
        if let Some(target) = &update.target_attribute {
            self.remove_bindings(id, AttributeType::Target);
            self.insert_binding(id, AttributeType::Target, target);
        }

        let transformation = Transformation {
            name: update.name.or(current.name),
            expression,
            expression_language: language,
            ..current
        };
        self.transformations.insert(id, transformation);

        debug!(transformation_id = id, "Updated transformation");
        self.transformation(id)
    }

    /// Compile a group's transformations, in catalog order, into runnable mappings
    pub fn mappings_for(
        &self,
        store: &GraphStore<'_>,
        config: &ResolverConfig,
        source_data_model_id: RowId,
        target_data_model_id: RowId,
        version: Option<&str>,
    ) -> Result<Vec<Mapping>> {
        let group = self.group_for(source_data_model_id, target_data_model_id, version)?;
        let view = store.load_view(group.target_data_model_id, AccessFilters::default())?;
        let resolver = TreeResolver::new(&view, config);

        let mappings = self
            .transformations_in(group.id)
            .into_iter()
            .map(|t| self.compile_mapping(store, &resolver, t))
            .collect::<Result<Vec<_>>>()?;

        debug!(
            group_id = group.id,
            version = %group.group_version,
            mappings = mappings.len(),
            "Compiled mappings"
        );
        Ok(mappings)
    }

    /// Re-validate every stored binding against the current graph
    pub fn verify_bindings(
        &self,
        store: &GraphStore<'_>,
        config: &ResolverConfig,
    ) -> Vec<BindingIssue> {
        let mut issues = Vec::new();
        for binding in self.bindings.values() {
            let result = self
                .transformation(binding.transformation_id)
                .and_then(|t| self.group(t.transformation_group_id))
                .and_then(|group| {
                    let request = AttributeBinding::new(
                        binding.entity_id,
                        binding.attribute_id,
                        &binding.entity_id_path,
                    );
                    match binding.attribute_type {
                        AttributeType::Source => {
                            validate_source_binding(store, config, group, &request)
                        }
                        AttributeType::Target => {
                            validate_target_binding(store, config, group, &request)
                        }
                    }
                });
            if let Err(error) = result {
                issues.push(BindingIssue {
                    transformation_id: binding.transformation_id,
                    binding_id: binding.id,
                    error,
                });
            }
        }
        issues
    }

    fn compile_mapping(
        &self,
        store: &GraphStore<'_>,
        resolver: &TreeResolver<'_, '_>,
        transformation: &Transformation,
    ) -> Result<Mapping> {
        let label = transformation.label();

        if !is_builtin_language(&transformation.expression_language) {
            warn!(
                transformation_id = transformation.id,
                language = %transformation.expression_language,
                "Transformation language is not evaluated; mapping will be skipped"
            );
            let error = ExpressionError::UnsupportedLanguage {
                language: transformation.expression_language.clone(),
            };
            return Ok(Mapping::failed(label, error).for_transformation(transformation.id));
        }

        let expression = match Expression::parse(&transformation.expression) {
            Ok(expression) => expression,
            Err(error) => {
                warn!(
                    transformation_id = transformation.id,
                    error = %error,
                    "Stored expression does not parse; mapping will be skipped"
                );
                return Ok(Mapping::failed(label, error).for_transformation(transformation.id));
            }
        };

        if expression.is_object_constructor() {
            return Ok(Mapping::new(label, expression).for_transformation(transformation.id));
        }

        let Some(target) = self.target_binding(transformation.id) else {
            warn!(
                transformation_id = transformation.id,
                "Scalar expression without a target binding cannot produce a fragment"
            );
            return Ok(Mapping::new(label, expression).for_transformation(transformation.id));
        };

        let keys = target_keys(store, resolver, target)?;
        Ok(Mapping::new(label, expression.wrapped_along(&keys)).for_transformation(transformation.id))
    }

    fn next_transformation_id(&self) -> RowId {
        self.transformations.keys().next_back().map_or(1, |id| id + 1)
    }

    fn insert_binding(&mut self, transformation_id: RowId, kind: AttributeType, binding: &AttributeBinding) {
        let id = self.bindings.keys().next_back().map_or(1, |id| id + 1);
        self.bindings.insert(
            id,
            TransformationAttribute {
                id,
                transformation_id,
                entity_id: binding.entity_id,
                attribute_id: binding.attribute_id,
                attribute_type: kind,
                entity_id_path: binding.entity_id_path.clone(),
                deleted: false,
            },
        );
    }

    fn remove_bindings(&mut self, transformation_id: RowId, kind: AttributeType) {
        self.bindings
            .retain(|_, b| !(b.transformation_id == transformation_id && b.attribute_type == kind));
    }
}

fn check_expression(expression: &str, language: &str) -> Result<()> {
    if is_builtin_language(language) {
        Expression::parse(expression)?;
    }
    Ok(())
}

fn validate_source_binding(
    store: &GraphStore<'_>,
    config: &ResolverConfig,
    group: &TransformationGroup,
    binding: &AttributeBinding,
) -> Result<()> {
    let attribute = store.attribute(binding.attribute_id)?;
    if attribute.data_model_id != group.source_data_model_id {
        return Err(Error::validation(
            "sourceAttributes",
            format!(
                "Attribute {} ({}) belongs to data model {}, not the group's source model",
                attribute.id, attribute.unique_name, attribute.data_model_id
            ),
            Some(format!("data model {}", group.source_data_model_id)),
        ));
    }
    store.entity(binding.entity_id)?;
    validate_path_in_model(
        store,
        config,
        group.source_data_model_id,
        binding.entity_id,
        &binding.entity_id_path,
    )?;
    Ok(())
}

fn validate_target_binding(
    store: &GraphStore<'_>,
    config: &ResolverConfig,
    group: &TransformationGroup,
    binding: &AttributeBinding,
) -> Result<()> {
    store.entity(binding.entity_id)?;
    store.attribute(binding.attribute_id)?;
    // Target attributes may live in an included base model, so no data-model check
    if store
        .attribute_binding(binding.entity_id, binding.attribute_id)
        .is_none()
    {
        return Err(Error::not_found(
            RowKind::EntityAttributeAssociation,
            format!("entity {} / attribute {}", binding.entity_id, binding.attribute_id),
        ));
    }
    validate_path_in_model(
        store,
        config,
        group.target_data_model_id,
        binding.entity_id,
        &binding.entity_id_path,
    )?;
    Ok(())
}

/// Target location a scalar expression is nested under; array entities hold one-element arrays
fn target_keys(
    store: &GraphStore<'_>,
    resolver: &TreeResolver<'_, '_>,
    binding: &TransformationAttribute,
) -> Result<Vec<TargetKey>> {
    let attribute = store.attribute(binding.attribute_id)?;
    let path = EntityIdPath::parse(&binding.entity_id_path)?;
    let entity_key = |name: String, entity_id: RowId| -> Result<TargetKey> {
        Ok(if store.entity(entity_id)?.is_array {
            TargetKey::array(name)
        } else {
            TargetKey::object(name)
        })
    };

    let chain = if resolver.view().contains_entity(binding.entity_id) {
        let chains = resolver.find_ancestor_chains(binding.entity_id);
        path.select(resolver, &chains).cloned()
    } else {
        None
    };

    let mut keys = match (chain, &path) {
        (Some(chain), _) => resolver
            .chain_property_names(&chain)
            .into_iter()
            .zip(chain.entity_ids())
            .map(|(name, entity_id)| entity_key(name, entity_id))
            .collect::<Result<Vec<_>>>()?,
        (None, EntityIdPath::Qualified(segments)) => {
            segments.iter().map(TargetKey::object).collect()
        }
        (None, EntityIdPath::IdChain(_)) => path
            .entity_ids()
            .unwrap_or_default()
            .into_iter()
            .map(|id| entity_key(store.entity(id)?.unique_name.clone(), id))
            .collect::<Result<Vec<_>>>()?,
    };
    keys.push(TargetKey::object(attribute.unique_name.clone()));
    Ok(keys)
}
