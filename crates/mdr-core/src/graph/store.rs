//! Graph store: indexed, read-only access to a snapshot
//!
//! The store answers one question for the rest of the core: which entities,
//! attributes and associations make up a data model as seen through a given
//! access scope. Base and source-schema models own their rows directly;
//! extension models combine their own rows with the base rows they include.
//!
//! Copyright (c) 2025 MDR Team
//! Licensed under the Apache-2.0 license

use super::snapshot::Snapshot;
use crate::error::{Error, Result, RowKind};
use crate::types::*;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use tracing::{debug, instrument};

/// Caller-facing access flags; at most one may be set
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AccessFilters {
    pub public_only: bool,
    pub org_extension_only: bool,
    pub partner_only: bool,
}

/// Resolved access scope used by the loaders and as a cache key
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AccessScope {
    #[default]
    All,
    PublicOnly,
    OrgExtensionOnly,
    PartnerOnly,
}

impl AccessFilters {
    pub fn public_only() -> Self {
        Self {
            public_only: true,
            ..Self::default()
        }
    }

    pub fn org_extension_only() -> Self {
        Self {
            org_extension_only: true,
            ..Self::default()
        }
    }

    pub fn partner_only() -> Self {
        Self {
            partner_only: true,
            ..Self::default()
        }
    }

    /// Resolve the flags into a scope, rejecting combinations
    pub fn scope(&self) -> Result<AccessScope> {
        let set: Vec<&str> = [
            (self.public_only, "publicOnly"),
            (self.org_extension_only, "orgExtensionOnly"),
            (self.partner_only, "partnerOnly"),
        ]
        .into_iter()
        .filter_map(|(on, name)| on.then_some(name))
        .collect();

        match set.as_slice() {
            [] => Ok(AccessScope::All),
            ["publicOnly"] => Ok(AccessScope::PublicOnly),
            ["orgExtensionOnly"] => Ok(AccessScope::OrgExtensionOnly),
            ["partnerOnly"] => Ok(AccessScope::PartnerOnly),
            _ => Err(Error::validation(
                "filters",
                format!("Conflicting access filters: {}", set.join(", ")),
                Some("at most one of publicOnly, orgExtensionOnly, partnerOnly".to_string()),
            )),
        }
    }
}

impl From<AccessScope> for AccessFilters {
    fn from(scope: AccessScope) -> Self {
        match scope {
            AccessScope::All => Self::default(),
            AccessScope::PublicOnly => Self::public_only(),
            AccessScope::OrgExtensionOnly => Self::org_extension_only(),
            AccessScope::PartnerOnly => Self::partner_only(),
        }
    }
}

impl AccessScope {
    /// Whether an inclusion with this access level is visible in the scope
    pub fn admits(&self, level: LevelOfAccess) -> bool {
        match self {
            AccessScope::All => true,
            AccessScope::PublicOnly => level == LevelOfAccess::Public,
            AccessScope::PartnerOnly => {
                matches!(level, LevelOfAccess::Public | LevelOfAccess::Restricted)
            }
            AccessScope::OrgExtensionOnly => false,
        }
    }
}

impl fmt::Display for AccessScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AccessScope::All => write!(f, "all"),
            AccessScope::PublicOnly => write!(f, "public-only"),
            AccessScope::OrgExtensionOnly => write!(f, "org-extension-only"),
            AccessScope::PartnerOnly => write!(f, "partner-only"),
        }
    }
}

/// Indexed view over a snapshot's active rows
pub struct GraphStore<'a> {
    snapshot: &'a Snapshot,
    data_models: HashMap<RowId, &'a DataModel>,
    entities: HashMap<RowId, &'a Entity>,
    attributes: HashMap<RowId, &'a Attribute>,
    value_sets: HashMap<RowId, &'a ValueSet>,
}

impl<'a> GraphStore<'a> {
    pub fn new(snapshot: &'a Snapshot) -> Self {
        Self {
            snapshot,
            data_models: snapshot.active_data_models().map(|m| (m.id, m)).collect(),
            entities: snapshot.active_entities().map(|e| (e.id, e)).collect(),
            attributes: snapshot.active_attributes().map(|a| (a.id, a)).collect(),
            value_sets: snapshot.active_value_sets().map(|v| (v.id, v)).collect(),
        }
    }

    pub fn snapshot(&self) -> &'a Snapshot {
        self.snapshot
    }

    pub fn data_model(&self, id: RowId) -> Result<&'a DataModel> {
        self.data_models
            .get(&id)
            .copied()
            .ok_or_else(|| Error::not_found(RowKind::DataModel, id))
    }

    pub fn entity(&self, id: RowId) -> Result<&'a Entity> {
        self.entities
            .get(&id)
            .copied()
            .ok_or_else(|| Error::not_found(RowKind::Entity, id))
    }

    pub fn attribute(&self, id: RowId) -> Result<&'a Attribute> {
        self.attributes
            .get(&id)
            .copied()
            .ok_or_else(|| Error::not_found(RowKind::Attribute, id))
    }

    pub fn value_set(&self, id: RowId) -> Result<&'a ValueSet> {
        self.value_sets
            .get(&id)
            .copied()
            .ok_or_else(|| Error::not_found(RowKind::ValueSet, id))
    }

    /// Active values of a value set, in row order
    pub fn value_set_values(&self, value_set_id: RowId) -> Vec<&'a ValueSetValue> {
        self.snapshot.active_value_set_values()
            .filter(|v| v.value_set_id == value_set_id)
            .collect()
    }

    /// Active binding of an attribute to an entity, if any
    pub fn attribute_binding(
        &self,
        entity_id: RowId,
        attribute_id: RowId,
    ) -> Option<&'a EntityAttributeAssociation> {
        self.snapshot.active_entity_attribute_associations()
            .find(|b| b.entity_id == entity_id && b.attribute_id == attribute_id)
    }

    /// Active entities of a data model by unique name
    pub fn entities_named(&self, data_model_id: RowId, name: &str) -> Vec<&'a Entity> {
        self.snapshot.active_entities()
            .filter(|e| e.data_model_id == data_model_id && e.unique_name == name)
            .collect()
    }

    /// Associations visible in a data model under the given filters
    pub fn load_associations(
        &self,
        data_model_id: RowId,
        filters: AccessFilters,
    ) -> Result<Vec<&'a EntityAssociation>> {
        Ok(self.load_view(data_model_id, filters)?.associations)
    }

    /// Everything visible in a data model under the given filters
    #[instrument(skip(self), fields(scope))]
    pub fn load_view(&self, data_model_id: RowId, filters: AccessFilters) -> Result<GraphView<'a>> {
        let scope = filters.scope()?;
        tracing::Span::current().record("scope", tracing::field::display(scope));

        let model = self.data_model(data_model_id)?;
        let mut view = GraphView {
            data_model: model,
            scope,
            entities: BTreeMap::new(),
            attributes: BTreeMap::new(),
            entity_attributes: BTreeMap::new(),
            associations: Vec::new(),
        };

        if model.model_type.is_extension() {
            self.populate_extension(&mut view)?;
        } else {
            self.populate_owned(&mut view);
        }
        self.bind_attributes(&mut view);

        debug!(
            entities = view.entities.len(),
            attributes = view.attributes.len(),
            associations = view.associations.len(),
            "Loaded data model view"
        );
        Ok(view)
    }

    /// Base and source-schema models see exactly the rows they own
    fn populate_owned(&self, view: &mut GraphView<'a>) {
        let model_id = view.data_model.id;
        view.entities = self.snapshot.active_entities()
            .filter(|e| e.data_model_id == model_id)
            .map(|e| (e.id, e))
            .collect();
        view.attributes = self.snapshot.active_attributes()
            .filter(|a| a.data_model_id == model_id)
            .map(|a| (a.id, a))
            .collect();
        view.associations = self.snapshot.active_entity_associations()
            .filter(|a| a.extended_by_data_model_id.is_none())
            .filter(|a| view.connects_visible(a))
            .collect();
        view.associations.sort_by_key(|a| a.id);
    }

    fn populate_extension(&self, view: &mut GraphView<'a>) -> Result<()> {
        let model = view.data_model;
        let base_id = model.base_data_model_id.ok_or_else(|| {
            Error::consistency(
                format!("{} model {} has no base data model", model.model_type, model.id),
                None,
            )
        })?;
        self.data_model(base_id).map_err(|_| {
            Error::consistency(
                format!("Base data model {} of model {} is missing", base_id, model.id),
                None,
            )
        })?;

        for entity in self.snapshot.active_entities().filter(|e| e.data_model_id == model.id) {
            view.entities.insert(entity.id, entity);
        }
        for attribute in self.snapshot.active_attributes().filter(|a| a.data_model_id == model.id) {
            view.attributes.insert(attribute.id, attribute);
        }

        let inclusions = self.snapshot.active_ext_inclusions()
            .filter(|inc| inc.ext_data_model_id == model.id)
            .filter(|inc| view.scope.admits(inc.level_of_access));
        for inclusion in inclusions {
            let missing = || {
                Error::consistency(
                    format!(
                        "Inclusion {} of model {} points at missing {:?} {}",
                        inclusion.id, model.id, inclusion.element_type, inclusion.included_element_id
                    ),
                    Some(format!("base data model {}", base_id)),
                )
            };
            match inclusion.element_type {
                ElementType::Entity => {
                    let entity = self.entity(inclusion.included_element_id).map_err(|_| missing())?;
                    view.entities.insert(entity.id, entity);
                }
                ElementType::Attribute => {
                    let attribute = self
                        .attribute(inclusion.included_element_id)
                        .map_err(|_| missing())?;
                    view.attributes.insert(attribute.id, attribute);
                }
            }
        }

        let extension_edges: Vec<&'a EntityAssociation> = self.snapshot.active_entity_associations()
            .filter(|a| a.extended_by_data_model_id == Some(model.id))
            .collect();

        if view.scope == AccessScope::OrgExtensionOnly {
            // Base parents that anchor extension-owned children stay visible
            for edge in &extension_edges {
                if view.entities.contains_key(&edge.parent_entity_id)
                    || !view.entities.contains_key(&edge.child_entity_id)
                {
                    continue;
                }
                let anchor = self.entity(edge.parent_entity_id).map_err(|_| {
                    Error::consistency(
                        format!(
                            "Association {} anchors on missing entity {}",
                            edge.id, edge.parent_entity_id
                        ),
                        None,
                    )
                })?;
                view.entities.insert(anchor.id, anchor);
            }
        }

        let overridden: HashMap<(RowId, RowId, Option<&str>), RowId> = extension_edges
            .iter()
            .map(|a| ((a.parent_entity_id, a.child_entity_id, a.relationship()), a.id))
            .collect();

        let base_edges = self.snapshot.active_entity_associations()
            .filter(|a| a.extended_by_data_model_id.is_none())
            .filter(|a| {
                let key = (a.parent_entity_id, a.child_entity_id, a.relationship());
                match overridden.get(&key) {
                    Some(replacement) => {
                        debug!(base = a.id, replacement, "Extension association overrides base");
                        false
                    }
                    None => true,
                }
            });

        view.associations = base_edges
            .chain(extension_edges.iter().copied())
            .filter(|a| view.connects_visible(a))
            .collect();
        view.associations.sort_by_key(|a| a.id);
        Ok(())
    }

    fn bind_attributes(&self, view: &mut GraphView<'a>) {
        let model_id = view.data_model.id;
        let mut bindings: Vec<&EntityAttributeAssociation> =
            self.snapshot.active_entity_attribute_associations()
                .filter(|b| b.extended_by_data_model_id.map_or(true, |ext| ext == model_id))
                .filter(|b| view.entities.contains_key(&b.entity_id))
                .collect();
        bindings.sort_by_key(|b| b.id);

        for binding in bindings {
            if let Some(attribute) = view.attributes.get(&binding.attribute_id).copied() {
                view.entity_attributes
                    .entry(binding.entity_id)
                    .or_default()
                    .push(attribute);
            }
        }
    }
}

/// The rows of one data model visible under one access scope
#[derive(Debug, Clone)]
pub struct GraphView<'a> {
    data_model: &'a DataModel,
    scope: AccessScope,
    entities: BTreeMap<RowId, &'a Entity>,
    attributes: BTreeMap<RowId, &'a Attribute>,
    entity_attributes: BTreeMap<RowId, Vec<&'a Attribute>>,
    associations: Vec<&'a EntityAssociation>,
}

impl<'a> GraphView<'a> {
    pub fn data_model(&self) -> &'a DataModel {
        self.data_model
    }

    pub fn scope(&self) -> AccessScope {
        self.scope
    }

    pub fn entity(&self, id: RowId) -> Option<&'a Entity> {
        self.entities.get(&id).copied()
    }

    pub fn contains_entity(&self, id: RowId) -> bool {
        self.entities.contains_key(&id)
    }

    /// Visible entities in id order
    pub fn entities(&self) -> impl Iterator<Item = &'a Entity> + '_ {
        self.entities.values().copied()
    }

    pub fn entity_ids(&self) -> Vec<RowId> {
        self.entities.keys().copied().collect()
    }

    /// Name of a visible entity; a missing entity is a consistency fault
    pub fn entity_name(&self, id: RowId) -> Result<&'a str> {
        self.entity(id)
            .map(|e| e.unique_name.as_str())
            .ok_or_else(|| {
                Error::consistency(
                    format!("Entity {} is not visible in data model {}", id, self.data_model.id),
                    None,
                )
            })
    }

    /// First visible entity with the given name
    pub fn entity_named(&self, name: &str) -> Option<&'a Entity> {
        self.entities().find(|e| e.unique_name == name)
    }

    pub fn attribute(&self, id: RowId) -> Option<&'a Attribute> {
        self.attributes.get(&id).copied()
    }

    /// Attributes bound to an entity, in binding order
    pub fn attributes_of(&self, entity_id: RowId) -> &[&'a Attribute] {
        self.entity_attributes
            .get(&entity_id)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Visible associations in id order
    pub fn associations(&self) -> &[&'a EntityAssociation] {
        &self.associations
    }

    pub fn embedded_associations(&self) -> Vec<&'a EntityAssociation> {
        self.associations.iter().copied().filter(|a| a.is_embedded()).collect()
    }

    pub fn reference_associations(&self) -> Vec<&'a EntityAssociation> {
        self.associations.iter().copied().filter(|a| !a.is_embedded()).collect()
    }

    fn connects_visible(&self, association: &EntityAssociation) -> bool {
        self.entities.contains_key(&association.parent_entity_id)
            && self.entities.contains_key(&association.child_entity_id)
    }
}
