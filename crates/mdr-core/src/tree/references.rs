//! Property naming and reference resolution
//!
//! Copyright (c) 2025 MDR Team
//! Licensed under the Apache-2.0 license

use super::ancestors::AncestorChain;
use crate::config::ResolverConfig;
use crate::types::RowId;
use serde::Serialize;

/// A reference association pinned to the single tree location of its child
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolvedReference {
    pub association_id: RowId,
    pub parent_entity_id: RowId,
    pub child_entity_id: RowId,
    /// Synthesized property name under the parent
    pub property_name: String,
    /// Where the referenced entity's full shape lives
    pub target: AncestorChain,
}

/// Property name of an embedded child: the relationship qualifier prepended to the child name
pub fn embedded_property_name(relationship: Option<&str>, child_name: &str) -> String {
    match relationship {
        Some(relationship) => format!("{}{}", relationship, child_name),
        None => child_name.to_string(),
    }
}

/// Property name of a reference: `<relationship>Ref<Child>`, dropping generic linking words
pub fn reference_property_name(
    relationship: Option<&str>,
    child_name: &str,
    config: &ResolverConfig,
) -> String {
    match relationship {
        Some(relationship) if !config.is_generic_link(relationship) => {
            format!("{}Ref{}", relationship, child_name)
        }
        _ => format!("Ref{}", child_name),
    }
}

/// Whether a path segment names a step, either bare or relationship-qualified
pub fn segment_matches(segment: &str, relationship: Option<&str>, entity_name: &str) -> bool {
    if segment == entity_name {
        return true;
    }
    match relationship {
        Some(relationship) => {
            segment.len() == relationship.len() + entity_name.len()
                && segment.starts_with(relationship)
                && segment.ends_with(entity_name)
        }
        None => false,
    }
}
