//! Mapping expression language
//!
//! Transformations carry their mapping logic as JSONata expressions. This
//! module parses and evaluates the subset of JSONata those mappings use:
//! object and array constructors, path navigation with index and filter
//! predicates, arithmetic, comparison, boolean and concatenation operators,
//! conditionals and a small library of built-in functions.
//!
//! Copyright (c) 2025 MDR Team
//! Licensed under the Apache-2.0 license

pub mod ast;
pub mod error;
pub mod evaluator;
pub mod functions;
pub mod parser;

pub use ast::{BinaryOperator, Node, Predicate, Step, StepKind, TargetKey};
pub use error::ExpressionError;
pub use evaluator::{EvaluationContext, Evaluator};
pub use parser::Parser;

use serde_json::Value;
use std::fmt;

/// A parsed mapping expression ready for evaluation
#[derive(Debug, Clone, PartialEq)]
pub struct Expression {
    root: Node,
    source: String,
}

impl Expression {
    /// Parse expression text
    pub fn parse(source: &str) -> Result<Self, ExpressionError> {
        let root = Parser::new(source)?.parse()?;
        Ok(Self {
            root,
            source: source.to_string(),
        })
    }

    /// Build an expression from an already constructed tree
    pub fn from_node(root: Node) -> Self {
        let source = root.to_string();
        Self { root, source }
    }

    /// Evaluate against an input document; `None` means the result is undefined
    pub fn evaluate(&self, input: &Value) -> Result<Option<Value>, ExpressionError> {
        Evaluator::new(input).evaluate(&self.root)
    }

    pub fn root(&self) -> &Node {
        &self.root
    }

    /// Original text, or the rendered tree for synthesized expressions
    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn is_object_constructor(&self) -> bool {
        self.root.is_object_constructor()
    }

    /// Nest a non-constructor expression under the given keys, outermost first
    pub fn wrapped_in<S: AsRef<str>>(self, keys: &[S]) -> Self {
        if self.is_object_constructor() || keys.is_empty() {
            return self;
        }
        Self::from_node(self.root.wrap_in_keys(keys))
    }

    /// Nest a non-constructor expression along a target location, outermost first
    pub fn wrapped_along(self, keys: &[TargetKey]) -> Self {
        if self.is_object_constructor() || keys.is_empty() {
            return self;
        }
        Self::from_node(self.root.wrap_along(keys))
    }
}

impl fmt::Display for Expression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.source)
    }
}

/// Whether a language name denotes the built-in evaluator (case-insensitive)
pub fn is_builtin_language(language: &str) -> bool {
    language.eq_ignore_ascii_case(crate::types::DEFAULT_EXPRESSION_LANGUAGE)
}

/// Parse and evaluate in one step
pub fn evaluate(source: &str, input: &Value) -> Result<Option<Value>, ExpressionError> {
    Expression::parse(source)?.evaluate(input)
}
