//! Entity-id paths and their validation
//!
//! A path locates one occurrence of an entity in the embedded tree. It comes
//! in two textual forms: dotted qualified names (`Person.Credential.issuedByOrganization`)
//! and comma-separated ids where a negated final id marks an attribute
//! (`12,34,-56`). Only the qualified form is walked against the graph.
//!
//! Copyright (c) 2025 MDR Team
//! Licensed under the Apache-2.0 license

use crate::config::ResolverConfig;
use crate::error::{Error, PathErrorReason, Result};
use crate::graph::{AccessFilters, GraphStore};
use crate::tree::{AncestorChain, TreeResolver};
use crate::types::RowId;
use regex::Regex;
use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;
use tracing::debug;

fn segment_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_\-]*$").expect("Valid regex pattern"))
}

/// One token of the id-chain form
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PathId {
    Entity(RowId),
    Attribute(RowId),
}

impl PathId {
    pub fn id(&self) -> RowId {
        match self {
            PathId::Entity(id) | PathId::Attribute(id) => *id,
        }
    }
}

/// A parsed entity-id path
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EntityIdPath {
    /// Dotted entity property names, root-most first
    Qualified(Vec<String>),
    /// Resolved ids, root-most first
    IdChain(Vec<PathId>),
}

impl EntityIdPath {
    pub fn parse(text: &str) -> Result<Self> {
        let text = text.trim();
        if text.is_empty() {
            return Err(Error::invalid_path(
                text,
                PathErrorReason::Empty,
                "path has no segments",
                None,
            ));
        }

        let id_chain = text.contains(',')
            || text.starts_with(|c: char| c.is_ascii_digit() || c == '-');
        if id_chain {
            Self::parse_id_chain(text)
        } else {
            Self::parse_qualified(text)
        }
    }

    fn parse_id_chain(text: &str) -> Result<Self> {
        let tokens: Vec<&str> = text.split(',').map(str::trim).collect();
        let last = tokens.len() - 1;
        let mut ids = Vec::with_capacity(tokens.len());

        for (index, token) in tokens.iter().enumerate() {
            let (negated, digits) = match token.strip_prefix('-') {
                Some(rest) => (true, rest),
                None => (false, *token),
            };
            let value: RowId = digits.parse().map_err(|_| {
                Error::invalid_path(
                    text,
                    PathErrorReason::NonInteger,
                    format!("token '{}' is not an integer", token),
                    None,
                )
            })?;

            if !negated {
                ids.push(PathId::Entity(value));
                continue;
            }
            if index != last {
                return Err(Error::invalid_path(
                    text,
                    PathErrorReason::Malformed,
                    format!("only the final id may be negated, found '{}'", token),
                    None,
                ));
            }
            if value == 0 {
                return Err(Error::invalid_path(
                    text,
                    PathErrorReason::Malformed,
                    "attribute id 0 cannot be negated",
                    None,
                ));
            }
            ids.push(PathId::Attribute(value));
        }
        Ok(EntityIdPath::IdChain(ids))
    }

    fn parse_qualified(text: &str) -> Result<Self> {
        let segments: Vec<String> = text.split('.').map(|s| s.trim().to_string()).collect();
        if let Some(bad) = segments.iter().find(|s| !segment_pattern().is_match(s)) {
            return Err(Error::invalid_path(
                text,
                PathErrorReason::Malformed,
                format!("segment '{}' is not a valid name", bad),
                None,
            ));
        }
        Ok(EntityIdPath::Qualified(segments))
    }

    pub fn is_id_chain(&self) -> bool {
        matches!(self, EntityIdPath::IdChain(_))
    }

    /// Entity ids of the id-chain form, without a trailing attribute
    pub fn entity_ids(&self) -> Option<Vec<RowId>> {
        match self {
            EntityIdPath::IdChain(ids) => Some(
                ids.iter()
                    .filter_map(|id| match id {
                        PathId::Entity(id) => Some(*id),
                        PathId::Attribute(_) => None,
                    })
                    .collect(),
            ),
            EntityIdPath::Qualified(_) => None,
        }
    }

    /// The chain among `chains` this path designates, if any
    pub fn select<'c>(
        &self,
        resolver: &TreeResolver<'_, '_>,
        chains: &'c [AncestorChain],
    ) -> Option<&'c AncestorChain> {
        match self {
            EntityIdPath::Qualified(segments) => {
                chains.iter().find(|chain| resolver.chain_matches(chain, segments))
            }
            EntityIdPath::IdChain(_) => {
                let ids = self.entity_ids().unwrap_or_default();
                chains
                    .iter()
                    .find(|chain| !ids.is_empty() && chain.entity_ids().ends_with(&ids))
            }
        }
    }
}

impl FromStr for EntityIdPath {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl fmt::Display for EntityIdPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EntityIdPath::Qualified(segments) => write!(f, "{}", segments.join(".")),
            EntityIdPath::IdChain(ids) => {
                let tokens: Vec<String> = ids
                    .iter()
                    .map(|id| match id {
                        PathId::Entity(id) => id.to_string(),
                        PathId::Attribute(id) => format!("-{}", id),
                    })
                    .collect();
                write!(f, "{}", tokens.join(","))
            }
        }
    }
}

/// Check that a path locates the entity in its own data model's tree
pub fn validate_path(
    store: &GraphStore<'_>,
    config: &ResolverConfig,
    entity_id: RowId,
    path: &str,
) -> Result<EntityIdPath> {
    let entity = store.entity(entity_id)?;
    validate_path_in_model(store, config, entity.data_model_id, entity_id, path)
}

/// Check a path against the tree of a given data model
///
/// Used for bindings whose entity is seen through another model, such as a
/// base entity included in an extension that a transformation group targets.
pub fn validate_path_in_model(
    store: &GraphStore<'_>,
    config: &ResolverConfig,
    data_model_id: RowId,
    entity_id: RowId,
    path: &str,
) -> Result<EntityIdPath> {
    let entity = store.entity(entity_id)?;
    let parsed = EntityIdPath::parse(path).map_err(|err| with_entity(err, entity_id))?;

    let segments = match &parsed {
        EntityIdPath::IdChain(_) => {
            // Id chains come from callers holding resolved ids and are not walked
            debug!(entity_id, path, "Accepted id-chain path without graph walk");
            return Ok(parsed);
        }
        EntityIdPath::Qualified(segments) => segments,
    };

    let view = store.load_view(data_model_id, AccessFilters::default())?;
    if !view.contains_entity(entity_id) {
        return Err(Error::invalid_path(
            path,
            PathErrorReason::Unresolvable,
            format!(
                "entity '{}' is not visible in data model {}",
                entity.unique_name, data_model_id
            ),
            Some(entity_id),
        ));
    }
    let resolver = TreeResolver::new(&view, config);
    let chains = resolver.find_ancestor_chains(entity_id);

    if chains.iter().any(|chain| resolver.chain_matches(chain, segments)) {
        return Ok(parsed);
    }

    let candidates: Vec<String> = chains.iter().map(|c| resolver.render_chain(c)).collect();
    Err(Error::invalid_path(
        path,
        PathErrorReason::Unresolvable,
        if candidates.is_empty() {
            format!("entity '{}' has no location in the tree", entity.unique_name)
        } else {
            format!(
                "no ancestor chain of '{}' matches; candidates: {}",
                entity.unique_name,
                candidates.join(", ")
            )
        },
        Some(entity_id),
    ))
}

fn with_entity(err: Error, entity: RowId) -> Error {
    match err {
        Error::InvalidPath {
            path,
            reason,
            message,
            ..
        } => Error::InvalidPath {
            path,
            reason,
            message,
            entity_id: Some(entity),
        },
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::Snapshot;
    use crate::types::*;

    fn reason(err: Error) -> PathErrorReason {
        match err {
            Error::InvalidPath { reason, .. } => reason,
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_parse_forms() {
        assert_eq!(
            EntityIdPath::parse("Person.Contact").unwrap(),
            EntityIdPath::Qualified(vec!["Person".into(), "Contact".into()])
        );
        assert_eq!(
            EntityIdPath::parse("12,34,-56").unwrap(),
            EntityIdPath::IdChain(vec![
                PathId::Entity(12),
                PathId::Entity(34),
                PathId::Attribute(56)
            ])
        );
        assert_eq!(
            EntityIdPath::parse("7").unwrap(),
            EntityIdPath::IdChain(vec![PathId::Entity(7)])
        );
    }

    #[test]
    fn test_parse_failures() {
        assert_eq!(reason(EntityIdPath::parse("  ").unwrap_err()), PathErrorReason::Empty);
        assert_eq!(reason(EntityIdPath::parse("12,x").unwrap_err()), PathErrorReason::NonInteger);
        assert_eq!(reason(EntityIdPath::parse("12,,3").unwrap_err()), PathErrorReason::NonInteger);
        assert_eq!(reason(EntityIdPath::parse("-1,2").unwrap_err()), PathErrorReason::Malformed);
        assert_eq!(reason(EntityIdPath::parse("Person..Name").unwrap_err()), PathErrorReason::Malformed);
    }

    #[test]
    fn test_ids_span_the_full_row_id_range() {
        let text = format!("{},-{}", u64::MAX, u64::MAX);
        assert_eq!(
            EntityIdPath::parse(&text).unwrap(),
            EntityIdPath::IdChain(vec![PathId::Entity(u64::MAX), PathId::Attribute(u64::MAX)])
        );

        assert_eq!(reason(EntityIdPath::parse("12,-0").unwrap_err()), PathErrorReason::Malformed);
        assert_eq!(reason(EntityIdPath::parse("12,--5").unwrap_err()), PathErrorReason::NonInteger);
        assert_eq!(reason(EntityIdPath::parse("12,-").unwrap_err()), PathErrorReason::NonInteger);
        assert_eq!(
            EntityIdPath::parse("12,0").unwrap(),
            EntityIdPath::IdChain(vec![PathId::Entity(12), PathId::Entity(0)])
        );
    }

    #[test]
    fn test_display_round_trips_text() {
        for text in ["Person.Credential.issuedByOrganization", "12,34,-56"] {
            assert_eq!(text.parse::<EntityIdPath>().unwrap().to_string(), text);
        }
    }

    fn snapshot() -> Snapshot {
        Snapshot::new()
            .with(DataModel::base(1, "LIF", "1.0"))
            .with(Entity::new(10, 1, "Person"))
            .with(Entity::new(11, 1, "Credential"))
            .with(Entity::new(12, 1, "Organization"))
            .with(EntityAssociation::embedded(1, 10, 11))
            .with(EntityAssociation::embedded(2, 11, 12).with_relationship("issuedBy"))
    }

    #[test]
    fn test_validate_qualified_path() {
        let snapshot = snapshot();
        let store = GraphStore::new(&snapshot);
        let config = ResolverConfig::default();

        assert!(validate_path(&store, &config, 12, "Person.Credential.issuedByOrganization").is_ok());
        assert!(validate_path(&store, &config, 12, "Organization").is_ok());

        let err = validate_path(&store, &config, 12, "Person.Organization").unwrap_err();
        match err {
            Error::InvalidPath {
                reason, entity_id, message, ..
            } => {
                assert_eq!(reason, PathErrorReason::Unresolvable);
                assert_eq!(entity_id, Some(12));
                assert!(message.contains("Person.Credential.issuedByOrganization"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_id_chain_is_not_walked() {
        let snapshot = snapshot();
        let store = GraphStore::new(&snapshot);
        let config = ResolverConfig::default();

        // 99 is not an entity at all, yet the id-chain form is accepted
        assert!(validate_path(&store, &config, 12, "10,99,-5").unwrap().is_id_chain());
        let err = validate_path(&store, &config, 12, "10,abc").unwrap_err();
        assert!(matches!(
            err,
            Error::InvalidPath {
                reason: PathErrorReason::NonInteger,
                entity_id: Some(12),
                ..
            }
        ));
    }

    #[test]
    fn test_unknown_entity() {
        let snapshot = snapshot();
        let store = GraphStore::new(&snapshot);
        let config = ResolverConfig::default();
        assert!(matches!(
            validate_path(&store, &config, 404, "Person"),
            Err(Error::NotFound { .. })
        ));
    }
}
