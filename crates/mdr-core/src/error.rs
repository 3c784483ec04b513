//! Error types for the MDR core library
//!
//! This module defines the error taxonomy shared by the graph store, the
//! tree resolver, the transformation catalog, the schema compiler and the
//! translator, using thiserror for ergonomic error definitions and anyhow
//! for flexible internal contexts.

use crate::expression::ExpressionError;
use mdr_schemas::{ValidationError, Violation};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Main error type for MDR operations
#[derive(Error, Debug)]
pub enum Error {
    /// A row referenced by id is missing or soft-deleted
    #[error("{kind} {id} not found")]
    NotFound { kind: RowKind, id: String },

    /// A row that should exist does not; indicates a data-integrity bug upstream
    #[error("Consistency error: {message}")]
    Consistency {
        message: String,
        context: Option<String>,
    },

    /// The embedded-association forest invariant is violated
    #[error("Graph inconsistency: {message}")]
    GraphInconsistency {
        message: String,
        child_entity_id: u64,
        parent_entity_ids: Vec<u64>,
    },

    /// A reference association resolves to more than one tree location
    #[error(
        "Ambiguous reference from entity {parent_entity_id} to entity {child_entity_id}: {} candidate locations ({})",
        chains.len(),
        chains.join(" | ")
    )]
    AmbiguousReference {
        parent_entity_id: u64,
        child_entity_id: u64,
        chains: Vec<String>,
    },

    /// A malformed or unresolvable entity-id path
    #[error("Invalid path '{path}' ({reason}): {message}")]
    InvalidPath {
        path: String,
        reason: PathErrorReason,
        message: String,
        entity_id: Option<u64>,
    },

    /// A mapping expression failed to evaluate; recoverable inside a translation run
    #[error("Mapping '{mapping}' failed to evaluate: {message}")]
    MappingEvaluation { mapping: String, message: String },

    /// A document does not satisfy its schema
    #[error("Schema validation failed: {message}")]
    SchemaValidation {
        message: String,
        violations: Vec<Violation>,
    },

    /// Client input errors (conflicting filters, wrong data model, ...)
    #[error("Validation error: {field} - {message}")]
    Validation {
        field: String,
        message: String,
        expected: Option<String>,
    },

    /// Mapping expression parse or evaluation errors
    #[error(transparent)]
    Expression(#[from] ExpressionError),

    /// JSON parsing and serialization errors
    #[error("JSON error: {message}")]
    Json {
        message: String,
        #[source]
        source: serde_json::Error,
    },

    /// Generic internal error with context
    #[error("Internal error: {message}")]
    Internal {
        message: String,
        #[source]
        source: anyhow::Error,
    },
}

/// Convenience type alias for Results using our Error type
pub type Result<T> = std::result::Result<T, Error>;

/// The kind of persisted row an error refers to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RowKind {
    DataModel,
    Entity,
    Attribute,
    EntityAssociation,
    EntityAttributeAssociation,
    ValueSet,
    TransformationGroup,
    Transformation,
}

/// Why an entity-id path was rejected
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PathErrorReason {
    /// The path has no segments
    Empty,
    /// An id-chain token does not parse as an integer
    NonInteger,
    /// A qualified-name segment is not a valid name
    Malformed,
    /// No ancestor walk in the graph matches the path
    Unresolvable,
}

impl Error {
    /// Create a not-found error
    pub fn not_found(kind: RowKind, id: impl fmt::Display) -> Self {
        Self::NotFound {
            kind,
            id: id.to_string(),
        }
    }

    /// Create a consistency error with context
    pub fn consistency(message: impl Into<String>, context: Option<String>) -> Self {
        Self::Consistency {
            message: message.into(),
            context,
        }
    }

    /// Create a client validation error
    pub fn validation(
        field: impl Into<String>,
        message: impl Into<String>,
        expected: Option<String>,
    ) -> Self {
        Self::Validation {
            field: field.into(),
            message: message.into(),
            expected,
        }
    }

    /// Create an invalid-path error
    pub fn invalid_path(
        path: impl Into<String>,
        reason: PathErrorReason,
        message: impl Into<String>,
        entity_id: Option<u64>,
    ) -> Self {
        Self::InvalidPath {
            path: path.into(),
            reason,
            message: message.into(),
            entity_id,
        }
    }

    /// Whether the translator may swallow this error and continue with the next mapping
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Error::MappingEvaluation { .. } | Error::Expression(_))
    }
}

impl From<ValidationError> for Error {
    fn from(err: ValidationError) -> Self {
        Error::SchemaValidation {
            message: err.message,
            violations: err.schema_violations,
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Json {
            message: err.to_string(),
            source: err,
        }
    }
}

impl From<anyhow::Error> for Error {
    fn from(err: anyhow::Error) -> Self {
        Error::Internal {
            message: err.to_string(),
            source: err,
        }
    }
}

impl fmt::Display for RowKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            RowKind::DataModel => "DataModel",
            RowKind::Entity => "Entity",
            RowKind::Attribute => "Attribute",
            RowKind::EntityAssociation => "EntityAssociation",
            RowKind::EntityAttributeAssociation => "EntityAttributeAssociation",
            RowKind::ValueSet => "ValueSet",
            RowKind::TransformationGroup => "TransformationGroup",
            RowKind::Transformation => "Transformation",
        };
        write!(f, "{}", name)
    }
}

impl fmt::Display for PathErrorReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PathErrorReason::Empty => write!(f, "empty"),
            PathErrorReason::NonInteger => write!(f, "non-integer"),
            PathErrorReason::Malformed => write!(f, "malformed"),
            PathErrorReason::Unresolvable => write!(f, "unresolvable"),
        }
    }
}
