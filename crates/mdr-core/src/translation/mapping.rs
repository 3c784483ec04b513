//! Compiled mapping expressions
//!
//! Copyright (c) 2025 MDR Team
//! Licensed under the Apache-2.0 license

use crate::error::{Error, Result};
use crate::expression::{Expression, ExpressionError};
use crate::types::RowId;
use serde_json::Value;
use std::fmt;

/// One mapping ready to run against a source document
///
/// A mapping whose expression failed to compile is kept in the list so the
/// runtime can report it as skipped at its catalog position.
#[derive(Debug, Clone)]
pub struct Mapping {
    transformation_id: Option<RowId>,
    label: String,
    compiled: std::result::Result<Expression, ExpressionError>,
}

impl Mapping {
    pub fn new(label: impl Into<String>, expression: Expression) -> Self {
        Self {
            transformation_id: None,
            label: label.into(),
            compiled: Ok(expression),
        }
    }

    /// A mapping whose expression could not be compiled
    pub fn failed(label: impl Into<String>, error: ExpressionError) -> Self {
        Self {
            transformation_id: None,
            label: label.into(),
            compiled: Err(error),
        }
    }

    /// Parse expression text; a parse failure yields a mapping that is skipped at runtime
    pub fn parse(label: impl Into<String>, source: &str) -> Self {
        match Expression::parse(source) {
            Ok(expression) => Self::new(label, expression),
            Err(error) => Self::failed(label, error),
        }
    }

    /// Mappings labelled by their position, for ad-hoc expression lists
    pub fn from_sources<S: AsRef<str>>(sources: &[S]) -> Vec<Self> {
        sources
            .iter()
            .enumerate()
            .map(|(index, source)| Self::parse(format!("#{}", index), source.as_ref()))
            .collect()
    }

    pub fn for_transformation(mut self, id: RowId) -> Self {
        self.transformation_id = Some(id);
        self
    }

    pub fn transformation_id(&self) -> Option<RowId> {
        self.transformation_id
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn expression(&self) -> Option<&Expression> {
        self.compiled.as_ref().ok()
    }

    /// Evaluate against a source document
    ///
    /// Every failure, including a compile failure carried from construction,
    /// is reported as a recoverable `MappingEvaluation` error.
    pub fn evaluate(&self, document: &Value) -> Result<Option<Value>> {
        let expression = self.compiled.as_ref().map_err(|err| self.evaluation_error(err))?;
        expression
            .evaluate(document)
            .map_err(|err| self.evaluation_error(&err))
    }

    fn evaluation_error(&self, err: &ExpressionError) -> Error {
        Error::MappingEvaluation {
            mapping: self.label.clone(),
            message: err.to_string(),
        }
    }
}

impl fmt::Display for Mapping {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.compiled {
            Ok(expression) => write!(f, "{}: {}", self.label, expression),
            Err(err) => write!(f, "{}: <{}>", self.label, err),
        }
    }
}
