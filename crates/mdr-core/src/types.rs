//! Core row types for the MDR metadata registry
//!
//! This module defines the persisted rows the core reads: data models,
//! entities, attributes, associations, extension inclusions, value sets and
//! transformation definitions. Rows are plain serde structs using the
//! camelCase wire names of the persistence layer, with typed constructors
//! so callers never assemble them field by field.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Row identifier as stored by the persistence layer
pub type RowId = u64;

/// Default expression language of a transformation
pub const DEFAULT_EXPRESSION_LANGUAGE: &str = "JSONata";

/// Rows that are soft-deleted rather than physically removed
pub trait SoftDelete {
    /// Whether the row carries the `deleted` flag
    fn is_deleted(&self) -> bool;

    /// Whether the row is visible to the core
    fn is_active(&self) -> bool {
        !self.is_deleted()
    }
}

macro_rules! impl_soft_delete {
    ($($ty:ty),* $(,)?) => {
        $(
            impl SoftDelete for $ty {
                fn is_deleted(&self) -> bool {
                    self.deleted
                }
            }
        )*
    };
}

/// Kind of data model
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DataModelType {
    /// The canonical, non-extended model
    BaseLIF,
    /// Organization-scoped extension of a BaseLIF
    OrgLIF,
    /// Partner-scoped extension of a BaseLIF
    PartnerLIF,
    /// A foreign schema used as a translation source or target
    SourceSchema,
}

impl DataModelType {
    /// Whether the model layers over a base model via inclusion records
    pub fn is_extension(&self) -> bool {
        matches!(self, DataModelType::OrgLIF | DataModelType::PartnerLIF)
    }

    /// Whether the model belongs to the LIF family (rooted at the canonical root entity)
    pub fn is_lif(&self) -> bool {
        !matches!(self, DataModelType::SourceSchema)
    }
}

impl fmt::Display for DataModelType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DataModelType::BaseLIF => write!(f, "BaseLIF"),
            DataModelType::OrgLIF => write!(f, "OrgLIF"),
            DataModelType::PartnerLIF => write!(f, "PartnerLIF"),
            DataModelType::SourceSchema => write!(f, "SourceSchema"),
        }
    }
}

/// Publication state of a data model
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum DataModelState {
    #[default]
    Draft,
    Published,
    Deprecated,
}

/// A data model: a named, versioned set of entities and attributes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DataModel {
    pub id: RowId,
    pub name: String,
    pub version: String,
    #[serde(rename = "type")]
    pub model_type: DataModelType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_data_model_id: Option<RowId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contributor_organization: Option<String>,
    #[serde(default)]
    pub state: DataModelState,
    #[serde(default)]
    pub deleted: bool,
}

impl DataModel {
    fn with_type(id: RowId, name: &str, version: &str, model_type: DataModelType) -> Self {
        Self {
            id,
            name: name.to_string(),
            version: version.to_string(),
            model_type,
            base_data_model_id: None,
            contributor_organization: None,
            state: DataModelState::default(),
            deleted: false,
        }
    }

    /// A BaseLIF model
    pub fn base(id: RowId, name: &str, version: &str) -> Self {
        Self::with_type(id, name, version, DataModelType::BaseLIF)
    }

    /// A source schema model
    pub fn source_schema(id: RowId, name: &str, version: &str) -> Self {
        Self::with_type(id, name, version, DataModelType::SourceSchema)
    }

    /// An OrgLIF model extending `base_id`
    pub fn org_extension(id: RowId, name: &str, version: &str, base_id: RowId) -> Self {
        let mut model = Self::with_type(id, name, version, DataModelType::OrgLIF);
        model.base_data_model_id = Some(base_id);
        model
    }

    /// A PartnerLIF model extending `base_id`
    pub fn partner_extension(id: RowId, name: &str, version: &str, base_id: RowId) -> Self {
        let mut model = Self::with_type(id, name, version, DataModelType::PartnerLIF);
        model.base_data_model_id = Some(base_id);
        model
    }

    /// Set the contributing organization
    pub fn contributed_by(mut self, organization: &str) -> Self {
        self.contributor_organization = Some(organization.to_string());
        self
    }

    /// Set the publication state
    pub fn with_state(mut self, state: DataModelState) -> Self {
        self.state = state;
        self
    }
}

/// An entity (object type) of a data model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Entity {
    pub id: RowId,
    pub data_model_id: RowId,
    pub unique_name: String,
    #[serde(default)]
    pub is_array: bool,
    #[serde(default)]
    pub is_required: bool,
    #[serde(default)]
    pub is_extension: bool,
    #[serde(default)]
    pub deleted: bool,
}

impl Entity {
    pub fn new(id: RowId, data_model_id: RowId, unique_name: &str) -> Self {
        Self {
            id,
            data_model_id,
            unique_name: unique_name.to_string(),
            is_array: false,
            is_required: false,
            is_extension: false,
            deleted: false,
        }
    }

    pub fn array(mut self) -> Self {
        self.is_array = true;
        self
    }

    pub fn required(mut self) -> Self {
        self.is_required = true;
        self
    }

    /// Mark as introduced by an extending model
    pub fn extension(mut self) -> Self {
        self.is_extension = true;
        self
    }
}

/// A typed attribute of a data model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Attribute {
    pub id: RowId,
    pub data_model_id: RowId,
    pub unique_name: String,
    pub data_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value_set_id: Option<RowId>,
    #[serde(default)]
    pub is_array: bool,
    #[serde(default)]
    pub is_required: bool,
    #[serde(default)]
    pub deleted: bool,
}

impl Attribute {
    pub fn new(id: RowId, data_model_id: RowId, unique_name: &str, data_type: &str) -> Self {
        Self {
            id,
            data_model_id,
            unique_name: unique_name.to_string(),
            data_type: data_type.to_string(),
            value_set_id: None,
            is_array: false,
            is_required: false,
            deleted: false,
        }
    }

    pub fn array(mut self) -> Self {
        self.is_array = true;
        self
    }

    pub fn required(mut self) -> Self {
        self.is_required = true;
        self
    }

    /// Restrict the attribute to the values of a value set
    pub fn with_value_set(mut self, value_set_id: RowId) -> Self {
        self.value_set_id = Some(value_set_id);
        self
    }
}

/// Binds an attribute to its owning entity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntityAttributeAssociation {
    pub id: RowId,
    pub entity_id: RowId,
    pub attribute_id: RowId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extended_by_data_model_id: Option<RowId>,
    #[serde(default)]
    pub deleted: bool,
}

impl EntityAttributeAssociation {
    pub fn new(id: RowId, entity_id: RowId, attribute_id: RowId) -> Self {
        Self {
            id,
            entity_id,
            attribute_id,
            extended_by_data_model_id: None,
            deleted: false,
        }
    }

    /// Introduce the binding only for one extension model
    pub fn extended_by(mut self, data_model_id: RowId) -> Self {
        self.extended_by_data_model_id = Some(data_model_id);
        self
    }
}

/// Where an associated child entity is placed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Placement {
    /// Nested inline under the parent
    #[default]
    Embedded,
    /// A cross-reference to a shape defined elsewhere in the tree
    Reference,
}

/// Directed parent → child association between two entities
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntityAssociation {
    pub id: RowId,
    pub parent_entity_id: RowId,
    pub child_entity_id: RowId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub relationship: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub placement: Option<Placement>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extended_by_data_model_id: Option<RowId>,
    #[serde(default)]
    pub deleted: bool,
}

impl EntityAssociation {
    fn with_placement(id: RowId, parent: RowId, child: RowId, placement: Placement) -> Self {
        Self {
            id,
            parent_entity_id: parent,
            child_entity_id: child,
            relationship: None,
            placement: Some(placement),
            extended_by_data_model_id: None,
            deleted: false,
        }
    }

    /// An embedded association
    pub fn embedded(id: RowId, parent: RowId, child: RowId) -> Self {
        Self::with_placement(id, parent, child, Placement::Embedded)
    }

    /// A reference association
    pub fn reference(id: RowId, parent: RowId, child: RowId) -> Self {
        Self::with_placement(id, parent, child, Placement::Reference)
    }

    /// Qualify the association with a relationship name
    pub fn with_relationship(mut self, relationship: &str) -> Self {
        self.relationship = Some(relationship.to_string());
        self
    }

    /// Introduce the association only for one extension model
    pub fn extended_by(mut self, data_model_id: RowId) -> Self {
        self.extended_by_data_model_id = Some(data_model_id);
        self
    }

    /// Effective placement; an unset placement means embedded
    pub fn effective_placement(&self) -> Placement {
        self.placement.unwrap_or_default()
    }

    pub fn is_embedded(&self) -> bool {
        self.effective_placement() == Placement::Embedded
    }

    /// Relationship qualifier, treating an empty string as absent
    pub fn relationship(&self) -> Option<&str> {
        self.relationship.as_deref().filter(|r| !r.is_empty())
    }
}

/// Element kind an inclusion record points at
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ElementType {
    Entity,
    Attribute,
}

/// Access level an extension grants on an included base element
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LevelOfAccess {
    Private,
    Public,
    Internal,
    Restricted,
}

/// Which base element an Org/PartnerLIF model exposes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtInclusion {
    pub id: RowId,
    pub ext_data_model_id: RowId,
    pub element_type: ElementType,
    pub included_element_id: RowId,
    pub level_of_access: LevelOfAccess,
    #[serde(default)]
    pub queryable: bool,
    #[serde(default)]
    pub modifiable: bool,
    #[serde(default)]
    pub deleted: bool,
}

impl ExtInclusion {
    fn new(id: RowId, ext: RowId, element_type: ElementType, element: RowId, level: LevelOfAccess) -> Self {
        Self {
            id,
            ext_data_model_id: ext,
            element_type,
            included_element_id: element,
            level_of_access: level,
            queryable: true,
            modifiable: false,
            deleted: false,
        }
    }

    /// Include a base entity in an extension
    pub fn entity(id: RowId, ext: RowId, entity_id: RowId, level: LevelOfAccess) -> Self {
        Self::new(id, ext, ElementType::Entity, entity_id, level)
    }

    /// Include a base attribute in an extension
    pub fn attribute(id: RowId, ext: RowId, attribute_id: RowId, level: LevelOfAccess) -> Self {
        Self::new(id, ext, ElementType::Attribute, attribute_id, level)
    }
}

/// Namespace of transformations for one source → target pair
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransformationGroup {
    pub id: RowId,
    pub source_data_model_id: RowId,
    pub target_data_model_id: RowId,
    pub group_version: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default)]
    pub deleted: bool,
}

impl TransformationGroup {
    pub fn new(id: RowId, source: RowId, target: RowId, version: &str) -> Self {
        Self {
            id,
            source_data_model_id: source,
            target_data_model_id: target,
            group_version: version.to_string(),
            name: None,
            deleted: false,
        }
    }
}

/// A declarative attribute mapping belonging to a group
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transformation {
    pub id: RowId,
    pub transformation_group_id: RowId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub expression: String,
    #[serde(default = "default_expression_language")]
    pub expression_language: String,
    #[serde(default)]
    pub deleted: bool,
}

fn default_expression_language() -> String {
    DEFAULT_EXPRESSION_LANGUAGE.to_string()
}

impl Transformation {
    pub fn new(id: RowId, group_id: RowId, expression: &str) -> Self {
        Self {
            id,
            transformation_group_id: group_id,
            name: None,
            expression: expression.to_string(),
            expression_language: default_expression_language(),
            deleted: false,
        }
    }

    pub fn named(mut self, name: &str) -> Self {
        self.name = Some(name.to_string());
        self
    }

    /// Label used in logs and reports
    pub fn label(&self) -> String {
        match &self.name {
            Some(name) => format!("{} ({})", name, self.id),
            None => self.id.to_string(),
        }
    }
}

/// Side of a transformation an attribute binding sits on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AttributeType {
    Source,
    Target,
}

/// Binds a transformation to one attribute occurrence in the entity tree
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransformationAttribute {
    pub id: RowId,
    pub transformation_id: RowId,
    pub entity_id: RowId,
    pub attribute_id: RowId,
    pub attribute_type: AttributeType,
    pub entity_id_path: String,
    #[serde(default)]
    pub deleted: bool,
}

impl TransformationAttribute {
    fn new(id: RowId, transformation: RowId, entity: RowId, attribute: RowId, kind: AttributeType, path: &str) -> Self {
        Self {
            id,
            transformation_id: transformation,
            entity_id: entity,
            attribute_id: attribute,
            attribute_type: kind,
            entity_id_path: path.to_string(),
            deleted: false,
        }
    }

    pub fn source(id: RowId, transformation: RowId, entity: RowId, attribute: RowId, path: &str) -> Self {
        Self::new(id, transformation, entity, attribute, AttributeType::Source, path)
    }

    pub fn target(id: RowId, transformation: RowId, entity: RowId, attribute: RowId, path: &str) -> Self {
        Self::new(id, transformation, entity, attribute, AttributeType::Target, path)
    }
}

/// Enumerated set of legal values for an attribute
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValueSet {
    pub id: RowId,
    pub data_model_id: RowId,
    pub name: String,
    #[serde(default)]
    pub deleted: bool,
}

impl ValueSet {
    pub fn new(id: RowId, data_model_id: RowId, name: &str) -> Self {
        Self {
            id,
            data_model_id,
            name: name.to_string(),
            deleted: false,
        }
    }
}

/// One legal value of a value set
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValueSetValue {
    pub id: RowId,
    pub value_set_id: RowId,
    pub value: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub deleted: bool,
}

impl ValueSetValue {
    pub fn new(id: RowId, value_set_id: RowId, value: &str) -> Self {
        Self {
            id,
            value_set_id,
            value: value.to_string(),
            description: None,
            deleted: false,
        }
    }
}

impl_soft_delete!(
    DataModel,
    Entity,
    Attribute,
    EntityAttributeAssociation,
    EntityAssociation,
    ExtInclusion,
    TransformationGroup,
    Transformation,
    TransformationAttribute,
    ValueSet,
    ValueSetValue,
);
