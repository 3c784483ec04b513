//! Validation module for compiled data-model schemas
//!
//! Provides JSON-Schema validation of translated documents with two modes:
//!
//! - **Complete**: collect every violation with its instance path
//! - **FailFast**: stop at the first violation, for speculative checks
//!
//! Copyright (c) 2025 MDR Team
//! Licensed under the Apache-2.0 license

pub mod base;
pub mod document;
pub mod error;

// Re-export commonly used types
pub use base::{SchemaValidator, ValidationMode};
pub use document::DocumentValidator;
pub use error::{ValidationError, ValidationResult, Violation};

use serde_json::Value;

/// Convenience function to compile a document validator
///
/// # Examples
///
/// ```rust
/// use mdr_schemas::validation::{create_document_validator, SchemaValidator};
/// use serde_json::json;
///
/// let validator = create_document_validator(json!({
///     "type": "object",
///     "required": ["Person"]
/// }))
/// .unwrap();
///
/// assert!(validator.validate(&json!({"Person": {}})).is_ok());
/// assert!(validator.validate(&json!({})).is_err());
/// ```
pub fn create_document_validator(schema: Value) -> ValidationResult<DocumentValidator> {
    DocumentValidator::new(schema)
}
