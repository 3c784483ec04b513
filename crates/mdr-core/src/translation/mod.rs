//! Translator runtime
//!
//! Converts a document conforming to a source data model into one conforming
//! to a target data model by running the catalog's mapping expressions in
//! order, merging each object fragment only when the merged document still
//! satisfies the compiled target schema.
//!
//! Copyright (c) 2025 MDR Team
//! Licensed under the Apache-2.0 license

pub mod mapping;
pub mod merge;
pub mod report;
pub mod runtime;
pub mod translator;

pub use mapping::Mapping;
pub use merge::{deep_merge, merged};
pub use report::{
    MappingOutcome, MappingReport, ReportSummary, SkipReason, TranslationMetadata,
    TranslationOutcome, TranslationReport,
};
pub use runtime::TranslationRuntime;
pub use translator::Translator;
