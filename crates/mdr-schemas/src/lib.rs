//! MDR Schemas - JSON Schema validation for compiled data-model schemas
//!
//! The MDR schema compiler describes every data model as a JSON-Schema
//! document. This crate turns those documents into reusable validators used
//! by the translator (to accept or roll back merged fragments and to check
//! the final output) and by command-line tooling.
//!
//! ## Quick Start
//!
//! ```rust
//! use mdr_schemas::{create_document_validator, SchemaValidator};
//! use serde_json::json;
//!
//! let validator = create_document_validator(json!({
//!     "type": "object",
//!     "properties": {"y": {"type": "string"}}
//! }))
//! .unwrap();
//!
//! assert!(validator.is_valid(&json!({"y": "ok"})));
//! assert!(!validator.is_valid(&json!({"y": 123})));
//! ```
//!
//! Copyright (c) 2025 MDR Team
//! Licensed under the Apache-2.0 license

pub mod validation;

// Re-export commonly used types for convenience
pub use validation::{
    create_document_validator, DocumentValidator, SchemaValidator, ValidationError,
    ValidationMode, ValidationResult, Violation,
};
