//! Ancestor/tree resolver
//!
//! Turns the associations of a [`GraphView`] into the embedded forest,
//! answers ancestor-chain queries and pins every reference association to the
//! single tree location of the entity it points at.
//!
//! Copyright (c) 2025 MDR Team
//! Licensed under the Apache-2.0 license

pub mod ancestors;
pub mod forest;
pub mod references;

pub use ancestors::{AncestorChain, AncestorIndex, ChainStep};
pub use forest::{build_forest, reparent_under_root, Forest, NodeKind, TreeNode};
pub use references::{
    embedded_property_name, reference_property_name, segment_matches, ResolvedReference,
};

use crate::config::ResolverConfig;
use crate::error::{Error, Result};
use crate::graph::GraphView;
use crate::types::RowId;
use tracing::debug;

/// Tree queries over one data model view
pub struct TreeResolver<'v, 'a> {
    view: &'v GraphView<'a>,
    config: &'v ResolverConfig,
}

impl<'v, 'a> TreeResolver<'v, 'a> {
    pub fn new(view: &'v GraphView<'a>, config: &'v ResolverConfig) -> Self {
        Self { view, config }
    }

    pub fn view(&self) -> &'v GraphView<'a> {
        self.view
    }

    pub fn config(&self) -> &'v ResolverConfig {
        self.config
    }

    /// The canonical root entity, when this model type is normalized under one
    pub fn canonical_root(&self) -> Option<RowId> {
        if !self.view.data_model().model_type.is_lif() {
            return None;
        }
        self.view
            .entity_named(&self.config.root_entity_name)
            .map(|entity| entity.id)
    }

    /// Embedded forest with the root normalization applied
    pub fn forest(&self) -> Result<Forest> {
        let forest = build_forest(
            &self.view.entity_ids(),
            &self.view.embedded_associations(),
        )?;
        Ok(match self.canonical_root() {
            Some(root) => reparent_under_root(forest, root),
            None => forest,
        })
    }

    /// Parent index mirroring the forest, without enforcing its invariant
    pub fn ancestor_index(&self) -> AncestorIndex {
        let index = AncestorIndex::new(self.view.associations());
        match self.canonical_root() {
            Some(root) if !index.has_parent(root) => {
                index.with_root_edges(root, self.view.entity_ids())
            }
            _ => index,
        }
    }

    pub fn find_ancestor_chains(&self, entity_id: RowId) -> Vec<AncestorChain> {
        self.ancestor_index().find_ancestor_chains(entity_id)
    }

    /// Property name a tree node is emitted under
    pub fn property_name(&self, node: &TreeNode) -> Result<String> {
        let name = self.view.entity_name(node.entity_id)?;
        Ok(embedded_property_name(node.relationship(), name))
    }

    /// Property names along a chain, root first; steps outside the view render as `#id`
    pub fn chain_property_names(&self, chain: &AncestorChain) -> Vec<String> {
        chain
            .steps()
            .iter()
            .map(|step| match self.view.entity(step.entity_id) {
                Some(entity) => embedded_property_name(step.relationship.as_deref(), &entity.unique_name),
                None => format!("#{}", step.entity_id),
            })
            .collect()
    }

    /// Dotted rendering of a chain using property names, for messages
    pub fn render_chain(&self, chain: &AncestorChain) -> String {
        self.chain_property_names(chain).join(".")
    }

    /// Whether path segments match the tail of a chain, segment by segment from the end
    pub fn chain_matches(&self, chain: &AncestorChain, segments: &[String]) -> bool {
        if segments.is_empty() || segments.len() > chain.len() {
            return false;
        }
        segments
            .iter()
            .rev()
            .zip(chain.steps().iter().rev())
            .all(|(segment, step)| match self.view.entity(step.entity_id) {
                Some(entity) => {
                    segment_matches(segment, step.relationship.as_deref(), &entity.unique_name)
                }
                None => false,
            })
    }

    /// Pin every reference association to the unique location of its child
    pub fn resolve_references(&self, forest: &Forest) -> Result<Vec<ResolvedReference>> {
        let mut resolved = Vec::new();

        for association in self.view.reference_associations() {
            let child_name = self.view.entity_name(association.child_entity_id)?;
            let mut chains = forest.chains_to(association.child_entity_id);

            let target = match chains.len() {
                1 => chains.remove(0),
                0 => {
                    return Err(Error::consistency(
                        format!(
                            "Referenced entity {} ({}) has no location in the embedded tree",
                            association.child_entity_id, child_name
                        ),
                        Some(format!("association {}", association.id)),
                    ))
                }
                _ => {
                    return Err(Error::AmbiguousReference {
                        parent_entity_id: association.parent_entity_id,
                        child_entity_id: association.child_entity_id,
                        chains: chains.iter().map(|c| self.render_chain(c)).collect(),
                    })
                }
            };

            resolved.push(ResolvedReference {
                association_id: association.id,
                parent_entity_id: association.parent_entity_id,
                child_entity_id: association.child_entity_id,
                property_name: reference_property_name(
                    association.relationship(),
                    child_name,
                    self.config,
                ),
                target,
            });
        }

        debug!(references = resolved.len(), "Resolved reference associations");
        Ok(resolved)
    }
}
