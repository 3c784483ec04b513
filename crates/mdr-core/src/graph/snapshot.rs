//! In-memory snapshot of the persisted registry rows
//!
//! Copyright (c) 2025 MDR Team
//! Licensed under the Apache-2.0 license

use crate::error::{Error, Result};
use crate::types::*;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Every row the core reads, as loaded from the persistence layer
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Snapshot {
    pub data_models: Vec<DataModel>,
    pub entities: Vec<Entity>,
    pub attributes: Vec<Attribute>,
    pub entity_attribute_associations: Vec<EntityAttributeAssociation>,
    pub entity_associations: Vec<EntityAssociation>,
    pub ext_inclusions: Vec<ExtInclusion>,
    pub value_sets: Vec<ValueSet>,
    pub value_set_values: Vec<ValueSetValue>,
    pub transformation_groups: Vec<TransformationGroup>,
    pub transformations: Vec<Transformation>,
    pub transformation_attributes: Vec<TransformationAttribute>,
}

/// Rows that know which snapshot collection they belong to
pub trait SnapshotRow {
    fn push_into(self, snapshot: &mut Snapshot);
}

macro_rules! impl_snapshot_row {
    ($($ty:ty => $field:ident),* $(,)?) => {
        $(
            impl SnapshotRow for $ty {
                fn push_into(self, snapshot: &mut Snapshot) {
                    snapshot.$field.push(self);
                }
            }
        )*
    };
}

impl_snapshot_row!(
    DataModel => data_models,
    Entity => entities,
    Attribute => attributes,
    EntityAttributeAssociation => entity_attribute_associations,
    EntityAssociation => entity_associations,
    ExtInclusion => ext_inclusions,
    ValueSet => value_sets,
    ValueSetValue => value_set_values,
    TransformationGroup => transformation_groups,
    Transformation => transformations,
    TransformationAttribute => transformation_attributes,
);

/// Iterate the rows that are not soft-deleted
pub fn active<T: SoftDelete>(rows: &[T]) -> impl Iterator<Item = &T> {
    rows.iter().filter(|row| row.is_active())
}

macro_rules! active_accessors {
    ($($name:ident => $field:ident: $ty:ty),* $(,)?) => {
        impl Snapshot {
            $(
                pub fn $name(&self) -> impl Iterator<Item = &$ty> {
                    active(&self.$field)
                }
            )*
        }
    };
}

active_accessors!(
    active_data_models => data_models: DataModel,
    active_entities => entities: Entity,
    active_attributes => attributes: Attribute,
    active_entity_attribute_associations => entity_attribute_associations: EntityAttributeAssociation,
    active_entity_associations => entity_associations: EntityAssociation,
    active_ext_inclusions => ext_inclusions: ExtInclusion,
    active_value_sets => value_sets: ValueSet,
    active_value_set_values => value_set_values: ValueSetValue,
    active_transformation_groups => transformation_groups: TransformationGroup,
    active_transformations => transformations: Transformation,
    active_transformation_attributes => transformation_attributes: TransformationAttribute,
);

impl Snapshot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a row, builder style
    pub fn with<R: SnapshotRow>(mut self, row: R) -> Self {
        row.push_into(&mut self);
        self
    }

    /// Add a row in place
    pub fn push<R: SnapshotRow>(&mut self, row: R) {
        row.push_into(self);
    }

    /// Parse a snapshot from JSON text
    pub fn from_json_str(text: &str) -> Result<Self> {
        Ok(serde_json::from_str(text)?)
    }

    /// Load a snapshot from a JSON file
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).map_err(|e| Error::Internal {
            message: format!("Failed to read snapshot {}", path.display()),
            source: e.into(),
        })?;
        Self::from_json_str(&text)
    }

    /// Total number of rows, including soft-deleted ones
    pub fn row_count(&self) -> usize {
        self.data_models.len()
            + self.entities.len()
            + self.attributes.len()
            + self.entity_attribute_associations.len()
            + self.entity_associations.len()
            + self.ext_inclusions.len()
            + self.value_sets.len()
            + self.value_set_values.len()
            + self.transformation_groups.len()
            + self.transformations.len()
            + self.transformation_attributes.len()
    }

    /// Active data model by name, preferring the highest version
    pub fn data_model_by_name(&self, name: &str) -> Option<&DataModel> {
        self.active_data_models()
            .filter(|model| model.name == name)
            .max_by(|a, b| crate::catalog::compare_versions(&a.version, &b.version))
    }
}
