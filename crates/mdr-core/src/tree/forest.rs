//! Embedded-association forest
//!
//! Copyright (c) 2025 MDR Team
//! Licensed under the Apache-2.0 license

use super::ancestors::{AncestorChain, ChainStep};
use crate::error::{Error, Result};
use crate::types::{EntityAssociation, Placement, RowId};
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet, HashSet};
use tracing::debug;

/// How a node hangs in the forest
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum NodeKind {
    Root,
    Child {
        /// Association that placed the node; `None` for nodes moved by normalization
        association_id: Option<RowId>,
        relationship: Option<String>,
        placement: Placement,
    },
}

/// One occurrence of an entity in the forest
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TreeNode {
    pub entity_id: RowId,
    pub kind: NodeKind,
    pub depth: usize,
    pub children: Vec<TreeNode>,
}

impl TreeNode {
    pub fn is_root(&self) -> bool {
        matches!(self.kind, NodeKind::Root)
    }

    pub fn relationship(&self) -> Option<&str> {
        match &self.kind {
            NodeKind::Root => None,
            NodeKind::Child { relationship, .. } => relationship.as_deref(),
        }
    }

    /// Number of nodes in this subtree
    pub fn size(&self) -> usize {
        1 + self.children.iter().map(TreeNode::size).sum::<usize>()
    }

    fn shift_depth(&mut self, delta: usize) {
        self.depth += delta;
        for child in &mut self.children {
            child.shift_depth(delta);
        }
    }

    fn collect_chains(&self, target: RowId, path: &mut Vec<ChainStep>, out: &mut Vec<AncestorChain>) {
        path.push(ChainStep {
            entity_id: self.entity_id,
            relationship: self.relationship().map(str::to_string),
        });
        if self.entity_id == target {
            out.push(AncestorChain::new(path.clone()));
        }
        for child in &self.children {
            child.collect_chains(target, path, out);
        }
        path.pop();
    }
}

/// The embedded forest of one data model view
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Forest {
    roots: Vec<TreeNode>,
}

impl Forest {
    pub fn roots(&self) -> &[TreeNode] {
        &self.roots
    }

    pub fn node_count(&self) -> usize {
        self.roots.iter().map(TreeNode::size).sum()
    }

    /// The node a chain designates, following entity and relationship at each step
    pub fn node_at(&self, chain: &AncestorChain) -> Option<&TreeNode> {
        let (first, rest) = chain.steps().split_first()?;
        let mut node = self.roots.iter().find(|r| r.entity_id == first.entity_id)?;
        for step in rest {
            node = node.children.iter().find(|c| {
                c.entity_id == step.entity_id && c.relationship() == step.relationship.as_deref()
            })?;
        }
        Some(node)
    }

    /// Every distinct root-first chain that reaches the entity
    pub fn chains_to(&self, entity_id: RowId) -> Vec<AncestorChain> {
        let mut chains = Vec::new();
        let mut path = Vec::new();
        for root in &self.roots {
            root.collect_chains(entity_id, &mut path, &mut chains);
        }
        dedup_chains(chains)
    }
}

pub(crate) fn dedup_chains(chains: Vec<AncestorChain>) -> Vec<AncestorChain> {
    let mut seen = HashSet::new();
    chains
        .into_iter()
        .filter(|chain| seen.insert(chain.clone()))
        .collect()
}

/// Build the embedded forest over the given entities
///
/// Reference-placed associations are ignored. Roots are the entities that
/// never appear as an embedded child. A child with embedded edges from two
/// different parents, or a cycle of embedded edges, is rejected.
pub fn build_forest(entity_ids: &[RowId], associations: &[&EntityAssociation]) -> Result<Forest> {
    let mut embedded: Vec<&EntityAssociation> =
        associations.iter().copied().filter(|a| a.is_embedded()).collect();
    embedded.sort_by_key(|a| a.id);

    let mut parents: BTreeMap<RowId, BTreeSet<RowId>> = BTreeMap::new();
    let mut adjacency: BTreeMap<RowId, Vec<&EntityAssociation>> = BTreeMap::new();
    for association in &embedded {
        parents
            .entry(association.child_entity_id)
            .or_default()
            .insert(association.parent_entity_id);
        adjacency
            .entry(association.parent_entity_id)
            .or_default()
            .push(association);
    }

    for (child, child_parents) in &parents {
        if child_parents.len() > 1 {
            return Err(Error::GraphInconsistency {
                message: format!(
                    "Entity {} is embedded under {} different parents",
                    child,
                    child_parents.len()
                ),
                child_entity_id: *child,
                parent_entity_ids: child_parents.iter().copied().collect(),
            });
        }
    }

    let mut all_entities: BTreeSet<RowId> = entity_ids.iter().copied().collect();
    for association in &embedded {
        all_entities.insert(association.parent_entity_id);
        all_entities.insert(association.child_entity_id);
    }

    let roots: Vec<TreeNode> = all_entities
        .iter()
        .filter(|id| !parents.contains_key(id))
        .map(|id| build_node(*id, NodeKind::Root, 0, &adjacency))
        .collect();

    let forest = Forest { roots };

    let mut reached = HashSet::new();
    for root in &forest.roots {
        mark_reached(root, &mut reached);
    }
    if let Some((child, child_parents)) = parents.iter().find(|(child, _)| !reached.contains(*child)) {
        return Err(Error::GraphInconsistency {
            message: format!("Entity {} is part of an embedded cycle", child),
            child_entity_id: *child,
            parent_entity_ids: child_parents.iter().copied().collect(),
        });
    }

    debug!(
        roots = forest.roots.len(),
        nodes = forest.node_count(),
        "Built embedded forest"
    );
    Ok(forest)
}

fn build_node(
    entity_id: RowId,
    kind: NodeKind,
    depth: usize,
    adjacency: &BTreeMap<RowId, Vec<&EntityAssociation>>,
) -> TreeNode {
    let children = adjacency
        .get(&entity_id)
        .map(|edges| {
            edges
                .iter()
                .map(|edge| {
                    let kind = NodeKind::Child {
                        association_id: Some(edge.id),
                        relationship: edge.relationship().map(str::to_string),
                        placement: Placement::Embedded,
                    };
                    build_node(edge.child_entity_id, kind, depth + 1, adjacency)
                })
                .collect()
        })
        .unwrap_or_default();

    TreeNode {
        entity_id,
        kind,
        depth,
        children,
    }
}

fn mark_reached(node: &TreeNode, reached: &mut HashSet<RowId>) {
    reached.insert(node.entity_id);
    for child in &node.children {
        mark_reached(child, reached);
    }
}

/// Move every other top-level entity under the canonical root entity
///
/// Leaves the forest unchanged when the root entity is not itself a root.
pub fn reparent_under_root(forest: Forest, root_entity_id: RowId) -> Forest {
    let Some(position) = forest.roots.iter().position(|r| r.entity_id == root_entity_id) else {
        return forest;
    };

    let mut roots = forest.roots;
    let mut root = roots.remove(position);
    let moved = roots.len();
    for mut orphan in roots {
        orphan.kind = NodeKind::Child {
            association_id: None,
            relationship: None,
            placement: Placement::Embedded,
        };
        orphan.shift_depth(1);
        root.children.push(orphan);
    }

    debug!(root_entity_id, moved, "Re-parented top-level entities under root");
    Forest { roots: vec![root] }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn refs(associations: &[EntityAssociation]) -> Vec<&EntityAssociation> {
        associations.iter().collect()
    }

    #[test]
    fn test_roots_and_children() {
        let associations = vec![
            EntityAssociation::embedded(1, 10, 11),
            EntityAssociation::embedded(2, 11, 12),
            EntityAssociation::reference(3, 13, 12),
        ];
        let forest = build_forest(&[10, 11, 12, 13], &refs(&associations)).unwrap();

        let roots: Vec<RowId> = forest.roots().iter().map(|r| r.entity_id).collect();
        assert_eq!(roots, vec![10, 13]);
        assert_eq!(forest.roots()[0].children[0].children[0].entity_id, 12);
        assert_eq!(forest.roots()[0].children[0].children[0].depth, 2);
        assert_eq!(forest.node_count(), 4);
    }

    #[test]
    fn test_two_parents_are_rejected() {
        let associations = vec![
            EntityAssociation::embedded(1, 10, 12),
            EntityAssociation::embedded(2, 11, 12),
        ];
        let err = build_forest(&[10, 11, 12], &refs(&associations)).unwrap_err();
        match err {
            Error::GraphInconsistency {
                child_entity_id,
                parent_entity_ids,
                ..
            } => {
                assert_eq!(child_entity_id, 12);
                assert_eq!(parent_entity_ids, vec![10, 11]);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_same_parent_twice_is_legal() {
        let associations = vec![
            EntityAssociation::embedded(1, 10, 12).with_relationship("primary"),
            EntityAssociation::embedded(2, 10, 12).with_relationship("secondary"),
        ];
        let forest = build_forest(&[10, 12], &refs(&associations)).unwrap();
        assert_eq!(forest.roots().len(), 1);
        assert_eq!(forest.roots()[0].children.len(), 2);
        assert_eq!(forest.chains_to(12).len(), 2);
    }

    #[test]
    fn test_cycle_is_rejected() {
        let associations = vec![
            EntityAssociation::embedded(1, 10, 11),
            EntityAssociation::embedded(2, 11, 10),
        ];
        assert!(matches!(
            build_forest(&[10, 11], &refs(&associations)),
            Err(Error::GraphInconsistency { .. })
        ));
    }

    #[test]
    fn test_chains_are_root_first() {
        let associations = vec![
            EntityAssociation::embedded(1, 10, 11).with_relationship("home"),
            EntityAssociation::embedded(2, 11, 12),
        ];
        let forest = build_forest(&[10, 11, 12], &refs(&associations)).unwrap();
        let chains = forest.chains_to(12);
        assert_eq!(chains.len(), 1);
        assert_eq!(chains[0].entity_ids(), vec![10, 11, 12]);
        assert_eq!(chains[0].steps()[1].relationship.as_deref(), Some("home"));
    }

    #[test]
    fn test_node_at_follows_relationships() {
        let associations = vec![
            EntityAssociation::embedded(1, 10, 12).with_relationship("primary"),
            EntityAssociation::embedded(2, 10, 12).with_relationship("secondary"),
            EntityAssociation::embedded(3, 12, 13),
        ];
        let forest = build_forest(&[10, 12, 13], &refs(&associations)).unwrap();
        let chains = forest.chains_to(13);
        assert_eq!(chains.len(), 2);

        let node = forest.node_at(&chains[1]).unwrap();
        assert_eq!(node.entity_id, 13);
        assert_eq!(node.depth, 2);
        assert!(forest
            .node_at(&AncestorChain::new(vec![ChainStep {
                entity_id: 99,
                relationship: None
            }]))
            .is_none());
    }

    #[test]
    fn test_reparent_under_root() {
        let associations = vec![EntityAssociation::embedded(1, 10, 11)];
        let forest = build_forest(&[10, 11, 20, 21], &refs(&associations)).unwrap();
        let forest = reparent_under_root(forest, 10);

        assert_eq!(forest.roots().len(), 1);
        let root = &forest.roots()[0];
        let children: Vec<RowId> = root.children.iter().map(|c| c.entity_id).collect();
        assert_eq!(children, vec![11, 20, 21]);
        assert_eq!(root.children[1].depth, 1);
        assert!(matches!(
            root.children[1].kind,
            NodeKind::Child {
                association_id: None,
                ..
            }
        ));
    }

    #[test]
    fn test_reparent_without_root_is_noop() {
        let forest = build_forest(&[20, 21], &[]).unwrap();
        let unchanged = reparent_under_root(forest.clone(), 10);
        assert_eq!(unchanged, forest);
    }
}
