//! Error types for mapping-expression parsing and evaluation
//!
//! Copyright (c) 2025 MDR Team
//! Licensed under the Apache-2.0 license

use thiserror::Error;

/// Errors raised while parsing or evaluating a mapping expression
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ExpressionError {
    /// Parse errors with position information
    #[error("Parse error at position {position}: {message}")]
    Parse {
        message: String,
        position: usize,
        input: String,
    },

    /// Syntax errors listing the tokens that would have been accepted
    #[error("Syntax error at position {position}: {message} (expected {}, found {found})", expected.join(" or "))]
    Syntax {
        message: String,
        position: usize,
        expected: Vec<String>,
        found: String,
    },

    /// Call to a function the language does not define
    #[error("Unknown function: ${name}")]
    UnknownFunction { name: String },

    /// Function execution errors
    #[error("Function error: ${function}() - {message}")]
    Function { function: String, message: String },

    /// Operand or argument of the wrong type
    #[error("Type mismatch in {context}: expected {expected}, found {found}")]
    TypeMismatch {
        expected: String,
        found: String,
        context: String,
    },

    /// Runtime execution errors
    #[error("Execution error: {message}")]
    Execution { message: String },

    /// A transformation names a language this engine does not evaluate
    #[error("Unsupported expression language: {language}")]
    UnsupportedLanguage { language: String },
}

impl ExpressionError {
    /// Create a parse error
    pub fn parse(message: impl Into<String>, position: usize, input: impl Into<String>) -> Self {
        Self::Parse {
            message: message.into(),
            position,
            input: input.into(),
        }
    }

    /// Create a syntax error with expected tokens
    pub fn syntax(
        message: impl Into<String>,
        position: usize,
        expected: Vec<String>,
        found: impl Into<String>,
    ) -> Self {
        Self::Syntax {
            message: message.into(),
            position,
            expected,
            found: found.into(),
        }
    }

    /// Create a function error
    pub fn function(function: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Function {
            function: function.into(),
            message: message.into(),
        }
    }

    /// Create a type mismatch error
    pub fn type_mismatch(
        expected: impl Into<String>,
        found: impl Into<String>,
        context: impl Into<String>,
    ) -> Self {
        Self::TypeMismatch {
            expected: expected.into(),
            found: found.into(),
            context: context.into(),
        }
    }

    /// Create an execution error
    pub fn execution(message: impl Into<String>) -> Self {
        Self::Execution {
            message: message.into(),
        }
    }

    /// Whether the error was raised before evaluation started
    pub fn is_parse_error(&self) -> bool {
        matches!(self, Self::Parse { .. } | Self::Syntax { .. })
    }
}

/// Name of a JSON value's type, for error messages
pub fn type_name(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "boolean",
        serde_json::Value::Number(_) => "number",
        serde_json::Value::String(_) => "string",
        serde_json::Value::Array(_) => "array",
        serde_json::Value::Object(_) => "object",
    }
}
