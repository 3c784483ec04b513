//! Ancestor chains and the tolerant parent index
//!
//! Copyright (c) 2025 MDR Team
//! Licensed under the Apache-2.0 license

use super::forest::dedup_chains;
use crate::types::{EntityAssociation, RowId};
use serde::Serialize;
use std::collections::{BTreeMap, HashSet};

/// One hop of an ancestor chain: the entity reached and the relationship used to reach it
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChainStep {
    pub entity_id: RowId,
    pub relationship: Option<String>,
}

/// Root-first sequence of steps ending at the queried entity
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct AncestorChain {
    steps: Vec<ChainStep>,
}

impl AncestorChain {
    pub fn new(steps: Vec<ChainStep>) -> Self {
        Self { steps }
    }

    pub fn steps(&self) -> &[ChainStep] {
        &self.steps
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    pub fn entity_ids(&self) -> Vec<RowId> {
        self.steps.iter().map(|s| s.entity_id).collect()
    }

    pub fn root(&self) -> Option<RowId> {
        self.steps.first().map(|s| s.entity_id)
    }

    pub fn leaf(&self) -> Option<RowId> {
        self.steps.last().map(|s| s.entity_id)
    }
}

/// Parent pointers over embedded associations, without the forest invariant
///
/// Path validation runs against definitions that may be mid-edit, so an
/// entity with several parents yields several chains instead of an error.
#[derive(Debug, Clone, Default)]
pub struct AncestorIndex {
    parents: BTreeMap<RowId, Vec<(RowId, Option<String>)>>,
}

impl AncestorIndex {
    pub fn new(associations: &[&EntityAssociation]) -> Self {
        let mut edges: Vec<&EntityAssociation> =
            associations.iter().copied().filter(|a| a.is_embedded()).collect();
        edges.sort_by_key(|a| a.id);

        let mut parents: BTreeMap<RowId, Vec<(RowId, Option<String>)>> = BTreeMap::new();
        for edge in edges {
            parents
                .entry(edge.child_entity_id)
                .or_default()
                .push((edge.parent_entity_id, edge.relationship().map(str::to_string)));
        }
        Self { parents }
    }

    /// Add unqualified edges from a root entity to parentless entities
    pub fn with_root_edges(mut self, root: RowId, entities: impl IntoIterator<Item = RowId>) -> Self {
        for entity in entities {
            if entity != root && !self.parents.contains_key(&entity) {
                self.parents.insert(entity, vec![(root, None)]);
            }
        }
        self
    }

    pub fn has_parent(&self, entity_id: RowId) -> bool {
        self.parents.contains_key(&entity_id)
    }

    /// Every distinct root-first chain ending at the entity
    pub fn find_ancestor_chains(&self, entity_id: RowId) -> Vec<AncestorChain> {
        let mut visiting = HashSet::new();
        let chains = self
            .walk(entity_id, &mut visiting)
            .into_iter()
            .map(AncestorChain::new)
            .collect();
        dedup_chains(chains)
    }

    fn walk(&self, entity_id: RowId, visiting: &mut HashSet<RowId>) -> Vec<Vec<ChainStep>> {
        let Some(parents) = self.parents.get(&entity_id) else {
            return vec![vec![ChainStep {
                entity_id,
                relationship: None,
            }]];
        };

        // A chain that loops never reaches a root and is dropped
        if !visiting.insert(entity_id) {
            return Vec::new();
        }

        let mut chains = Vec::new();
        for (parent, relationship) in parents {
            for mut chain in self.walk(*parent, visiting) {
                chain.push(ChainStep {
                    entity_id,
                    relationship: relationship.clone(),
                });
                chains.push(chain);
            }
        }
        visiting.remove(&entity_id);
        chains
    }
}
