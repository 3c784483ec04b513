//! Runtime settings for graph resolution and translation

use serde::{Deserialize, Serialize};
use std::collections::hash_map::DefaultHasher;
use std::fmt;
use std::hash::{Hash, Hasher};

/// Settings consumed by the tree resolver and the schema compiler
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(default)]
pub struct ResolverConfig {
    /// Well-known entity that unrooted top-level LIF entities are re-parented under
    pub root_entity_name: String,

    /// Relationship prefixes that only express "links to" and are dropped from reference names
    pub generic_link_prefixes: Vec<String>,

    /// Expression language assumed when a transformation does not name one
    pub default_expression_language: String,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            root_entity_name: "Person".to_string(),
            generic_link_prefixes: vec!["has".to_string(), "relevant".to_string()],
            default_expression_language: crate::types::DEFAULT_EXPRESSION_LANGUAGE.to_string(),
        }
    }
}

impl ResolverConfig {
    /// Digest of the settings that shape a compiled schema, for cache keys
    pub fn fingerprint(&self) -> u64 {
        let mut hasher = DefaultHasher::new();
        self.hash(&mut hasher);
        hasher.finish()
    }

    /// Whether a relationship qualifier starts with a generic linking word
    pub fn is_generic_link(&self, relationship: &str) -> bool {
        self.generic_link_prefixes
            .iter()
            .any(|prefix| relationship.starts_with(prefix.as_str()))
    }
}

/// What to do when the input document does not satisfy the source schema
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceValidation {
    /// Reject the document
    Strict,
    /// Log the violations and translate anyway
    #[default]
    Warn,
    /// Do not check the input
    Off,
}

impl fmt::Display for SourceValidation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SourceValidation::Strict => write!(f, "strict"),
            SourceValidation::Warn => write!(f, "warn"),
            SourceValidation::Off => write!(f, "off"),
        }
    }
}

/// Settings for a translation run
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TranslatorConfig {
    /// Policy for checking the input against the source schema
    pub source_validation: SourceValidation,

    /// Transformation-group version to use; the highest version when unset
    pub group_version: Option<String>,
}
