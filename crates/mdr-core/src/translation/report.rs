//! Per-mapping outcomes and run metadata
//!
//! Copyright (c) 2025 MDR Team
//! Licensed under the Apache-2.0 license

use crate::types::RowId;
use mdr_schemas::Violation;
use serde::Serialize;
use serde_json::Value;
use std::fmt;

/// Why a mapping produced nothing to merge
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum SkipReason {
    /// Evaluation raised an error
    Evaluation { message: String },
    /// The expression evaluated to nothing
    Undefined,
    /// The result was not an object fragment
    NotAnObject { found: String },
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::Evaluation { message } => write!(f, "evaluation failed: {}", message),
            SkipReason::Undefined => write!(f, "result is undefined"),
            SkipReason::NotAnObject { found } => write!(f, "result is {}, not an object", found),
        }
    }
}

/// What happened to one mapping
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "camelCase")]
pub enum MappingOutcome {
    Committed,
    Skipped { reason: SkipReason },
    RolledBack { violations: Vec<Violation> },
}

/// Outcome of one mapping in a run
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MappingReport {
    pub label: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transformation_id: Option<RowId>,
    pub outcome: MappingOutcome,
}

/// Counts per outcome
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportSummary {
    pub committed: usize,
    pub skipped: usize,
    pub rolled_back: usize,
}

/// Ordered record of every mapping's outcome
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TranslationReport {
    entries: Vec<MappingReport>,
}

impl TranslationReport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, label: &str, transformation_id: Option<RowId>, outcome: MappingOutcome) {
        self.entries.push(MappingReport {
            label: label.to_string(),
            transformation_id,
            outcome,
        });
    }

    pub fn entries(&self) -> &[MappingReport] {
        &self.entries
    }

    pub fn summary(&self) -> ReportSummary {
        let mut summary = ReportSummary::default();
        for entry in &self.entries {
            match entry.outcome {
                MappingOutcome::Committed => summary.committed += 1,
                MappingOutcome::Skipped { .. } => summary.skipped += 1,
                MappingOutcome::RolledBack { .. } => summary.rolled_back += 1,
            }
        }
        summary
    }
}

/// Facts about a translation run
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TranslationMetadata {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_data_model_id: Option<RowId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target_data_model_id: Option<RowId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub group_version: Option<String>,
    pub timestamp: String,
    pub duration_ms: Option<u64>,
    pub mapping_count: usize,
}

/// Result of a successful run
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TranslationOutcome {
    pub document: Value,
    pub report: TranslationReport,
    pub metadata: TranslationMetadata,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_summary_counts() {
        let mut report = TranslationReport::new();
        report.record("#0", None, MappingOutcome::Committed);
        report.record(
            "#1",
            Some(4),
            MappingOutcome::Skipped {
                reason: SkipReason::Undefined,
            },
        );
        report.record("#2", None, MappingOutcome::RolledBack { violations: vec![] });

        assert_eq!(
            report.summary(),
            ReportSummary {
                committed: 1,
                skipped: 1,
                rolled_back: 1
            }
        );
    }

    #[test]
    fn test_report_wire_shape() {
        let mut report = TranslationReport::new();
        report.record(
            "names (3)",
            Some(3),
            MappingOutcome::Skipped {
                reason: SkipReason::NotAnObject {
                    found: "string".into(),
                },
            },
        );
        assert_eq!(
            serde_json::to_value(&report).unwrap(),
            json!({"entries": [{
                "label": "names (3)",
                "transformationId": 3,
                "outcome": {"status": "skipped", "reason": {"kind": "notAnObject", "found": "string"}}
            }]})
        );
    }
}
