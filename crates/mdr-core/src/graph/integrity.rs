//! Snapshot-wide integrity checks
//!
//! The persistence layer is expected to enforce these rules; checking them
//! here lets tooling report a corrupted snapshot before any view is built.
//!
//! Copyright (c) 2025 MDR Team
//! Licensed under the Apache-2.0 license

use super::snapshot::Snapshot;
use crate::types::*;
use serde::Serialize;
use std::collections::{HashMap, HashSet};
use std::fmt;

/// Rule an integrity violation breaks
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum IntegrityRule {
    DuplicateDataModel,
    MissingBaseModel,
    UnexpectedBaseModel,
    DuplicateEntityName,
    DanglingReference,
    DuplicateTransformationGroup,
}

/// One broken rule, with the row it was found on
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IntegrityViolation {
    pub rule: IntegrityRule,
    pub row_kind: &'static str,
    pub row_id: RowId,
    pub message: String,
}

impl fmt::Display for IntegrityRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            IntegrityRule::DuplicateDataModel => "duplicate-data-model",
            IntegrityRule::MissingBaseModel => "missing-base-model",
            IntegrityRule::UnexpectedBaseModel => "unexpected-base-model",
            IntegrityRule::DuplicateEntityName => "duplicate-entity-name",
            IntegrityRule::DanglingReference => "dangling-reference",
            IntegrityRule::DuplicateTransformationGroup => "duplicate-transformation-group",
        };
        write!(f, "{}", name)
    }
}

impl fmt::Display for IntegrityViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}] {} {}: {}",
            self.rule, self.row_kind, self.row_id, self.message
        )
    }
}

struct Checker<'a> {
    snapshot: &'a Snapshot,
    models: HashSet<RowId>,
    entities: HashSet<RowId>,
    attributes: HashSet<RowId>,
    value_sets: HashSet<RowId>,
    groups: HashSet<RowId>,
    transformations: HashSet<RowId>,
    violations: Vec<IntegrityViolation>,
}

impl<'a> Checker<'a> {
    fn new(snapshot: &'a Snapshot) -> Self {
        Self {
            snapshot,
            models: snapshot.active_data_models().map(|r| r.id).collect(),
            entities: snapshot.active_entities().map(|r| r.id).collect(),
            attributes: snapshot.active_attributes().map(|r| r.id).collect(),
            value_sets: snapshot.active_value_sets().map(|r| r.id).collect(),
            groups: snapshot.active_transformation_groups().map(|r| r.id).collect(),
            transformations: snapshot.active_transformations().map(|r| r.id).collect(),
            violations: Vec::new(),
        }
    }

    fn report(&mut self, rule: IntegrityRule, row_kind: &'static str, row_id: RowId, message: String) {
        self.violations.push(IntegrityViolation {
            rule,
            row_kind,
            row_id,
            message,
        });
    }

    fn expect(&mut self, known: bool, row_kind: &'static str, row_id: RowId, target: &str, target_id: RowId) {
        if !known {
            self.report(
                IntegrityRule::DanglingReference,
                row_kind,
                row_id,
                format!("references missing {} {}", target, target_id),
            );
        }
    }

    fn check_data_models(&mut self) {
        let snapshot = self.snapshot;
        let mut seen: HashMap<(&str, &str, DataModelType, Option<&str>), RowId> = HashMap::new();
        for model in snapshot.active_data_models() {
            let key = (
                model.name.as_str(),
                model.version.as_str(),
                model.model_type,
                model.contributor_organization.as_deref(),
            );
            if let Some(first) = seen.insert(key, model.id) {
                self.report(
                    IntegrityRule::DuplicateDataModel,
                    "DataModel",
                    model.id,
                    format!(
                        "'{}' {} ({}) duplicates data model {}",
                        model.name, model.version, model.model_type, first
                    ),
                );
            }

            match (model.model_type.is_extension(), model.base_data_model_id) {
                (true, None) => self.report(
                    IntegrityRule::MissingBaseModel,
                    "DataModel",
                    model.id,
                    format!("{} requires a base data model", model.model_type),
                ),
                (true, Some(base)) => {
                    let known = self.models.contains(&base);
                    self.expect(known, "DataModel", model.id, "base DataModel", base);
                }
                (false, Some(base)) => self.report(
                    IntegrityRule::UnexpectedBaseModel,
                    "DataModel",
                    model.id,
                    format!("{} must not name base data model {}", model.model_type, base),
                ),
                (false, None) => {}
            }
        }
    }

    fn check_entities_and_attributes(&mut self) {
        let snapshot = self.snapshot;
        let mut names: HashMap<(RowId, &str), RowId> = HashMap::new();
        for entity in snapshot.active_entities() {
            let known = self.models.contains(&entity.data_model_id);
            self.expect(known, "Entity", entity.id, "DataModel", entity.data_model_id);
            if let Some(first) = names.insert((entity.data_model_id, entity.unique_name.as_str()), entity.id) {
                self.report(
                    IntegrityRule::DuplicateEntityName,
                    "Entity",
                    entity.id,
                    format!(
                        "name '{}' already used by entity {} in data model {}",
                        entity.unique_name, first, entity.data_model_id
                    ),
                );
            }
        }

        for attribute in snapshot.active_attributes() {
            let known = self.models.contains(&attribute.data_model_id);
            self.expect(known, "Attribute", attribute.id, "DataModel", attribute.data_model_id);
            if let Some(value_set) = attribute.value_set_id {
                let known = self.value_sets.contains(&value_set);
                self.expect(known, "Attribute", attribute.id, "ValueSet", value_set);
            }
        }
    }

    fn check_associations(&mut self) {
        let snapshot = self.snapshot;
        for binding in snapshot.active_entity_attribute_associations() {
            let entity = self.entities.contains(&binding.entity_id);
            self.expect(entity, "EntityAttributeAssociation", binding.id, "Entity", binding.entity_id);
            let attribute = self.attributes.contains(&binding.attribute_id);
            self.expect(attribute, "EntityAttributeAssociation", binding.id, "Attribute", binding.attribute_id);
        }

        for association in snapshot.active_entity_associations() {
            let parent = self.entities.contains(&association.parent_entity_id);
            self.expect(parent, "EntityAssociation", association.id, "Entity", association.parent_entity_id);
            let child = self.entities.contains(&association.child_entity_id);
            self.expect(child, "EntityAssociation", association.id, "Entity", association.child_entity_id);
            if let Some(ext) = association.extended_by_data_model_id {
                let known = self.models.contains(&ext);
                self.expect(known, "EntityAssociation", association.id, "DataModel", ext);
            }
        }

        for inclusion in snapshot.active_ext_inclusions() {
            let model = self.models.contains(&inclusion.ext_data_model_id);
            self.expect(model, "ExtInclusion", inclusion.id, "DataModel", inclusion.ext_data_model_id);
            let (known, target) = match inclusion.element_type {
                ElementType::Entity => (self.entities.contains(&inclusion.included_element_id), "Entity"),
                ElementType::Attribute => (self.attributes.contains(&inclusion.included_element_id), "Attribute"),
            };
            self.expect(known, "ExtInclusion", inclusion.id, target, inclusion.included_element_id);
        }

        for value in snapshot.active_value_set_values() {
            let known = self.value_sets.contains(&value.value_set_id);
            self.expect(known, "ValueSetValue", value.id, "ValueSet", value.value_set_id);
        }
    }

    fn check_transformations(&mut self) {
        let snapshot = self.snapshot;
        let mut seen: HashMap<(RowId, RowId, &str), RowId> = HashMap::new();
        for group in snapshot.active_transformation_groups() {
            let source = self.models.contains(&group.source_data_model_id);
            self.expect(source, "TransformationGroup", group.id, "DataModel", group.source_data_model_id);
            let target = self.models.contains(&group.target_data_model_id);
            self.expect(target, "TransformationGroup", group.id, "DataModel", group.target_data_model_id);

            let key = (
                group.source_data_model_id,
                group.target_data_model_id,
                group.group_version.as_str(),
            );
            if let Some(first) = seen.insert(key, group.id) {
                self.report(
                    IntegrityRule::DuplicateTransformationGroup,
                    "TransformationGroup",
                    group.id,
                    format!("version {} duplicates group {}", group.group_version, first),
                );
            }
        }

        for transformation in snapshot.active_transformations() {
            let known = self.groups.contains(&transformation.transformation_group_id);
            self.expect(
                known,
                "Transformation",
                transformation.id,
                "TransformationGroup",
                transformation.transformation_group_id,
            );
        }

        for binding in snapshot.active_transformation_attributes() {
            let transformation = self.transformations.contains(&binding.transformation_id);
            self.expect(transformation, "TransformationAttribute", binding.id, "Transformation", binding.transformation_id);
            let entity = self.entities.contains(&binding.entity_id);
            self.expect(entity, "TransformationAttribute", binding.id, "Entity", binding.entity_id);
            let attribute = self.attributes.contains(&binding.attribute_id);
            self.expect(attribute, "TransformationAttribute", binding.id, "Attribute", binding.attribute_id);
        }
    }
}

impl Snapshot {
    /// Check the registry invariants over the active rows, returning every violation
    pub fn check_integrity(&self) -> Vec<IntegrityViolation> {
        let mut checker = Checker::new(self);
        checker.check_data_models();
        checker.check_entities_and_attributes();
        checker.check_associations();
        checker.check_transformations();
        checker.violations
    }
}
