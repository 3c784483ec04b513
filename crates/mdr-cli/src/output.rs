//! Output formatting and writing utilities
//!
//! This module formats command results as JSON, YAML or human-readable
//! text, with specialized renderings for translation reports, schema
//! violations and snapshot problems.

use crate::cli::OutputFormat;
use crate::error::Result;
use colored::Colorize;
use is_terminal::IsTerminal;
use mdr_core::translation::{MappingOutcome, TranslationOutcome, TranslationReport};
use mdr_core::{BindingIssue, IntegrityViolation};
use serde::Serialize;
use std::io::{self, Write};
use tracing::trace;

/// Trait for formatting output with specialized support for common types
pub trait OutputFormatter {
    /// Format a serializable value
    fn format<T: Serialize>(&self, value: &T) -> Result<String>;

    /// Format the per-mapping report of a translation
    fn format_report(&self, report: &TranslationReport) -> Result<String>;

    /// Format a translated document with its report and metadata
    fn format_translation(&self, outcome: &TranslationOutcome) -> Result<String>;
}

impl OutputFormatter for OutputFormat {
    fn format<T: Serialize>(&self, value: &T) -> Result<String> {
        match self {
            OutputFormat::Json => Ok(serde_json::to_string(value)?),
            OutputFormat::JsonPretty | OutputFormat::Human => Ok(serde_json::to_string_pretty(value)?),
            OutputFormat::Yaml => Ok(serde_yaml::to_string(value)?),
        }
    }

    fn format_report(&self, report: &TranslationReport) -> Result<String> {
        match self {
            OutputFormat::Human => Ok(format_report_human(report)),
            _ => self.format(report),
        }
    }

    fn format_translation(&self, outcome: &TranslationOutcome) -> Result<String> {
        match self {
            OutputFormat::Human => format_translation_human(outcome),
            _ => self.format(outcome),
        }
    }
}

/// Output writer that handles different output formats and colors
pub struct OutputWriter {
    format: OutputFormat,
    use_color: bool,
    quiet: bool,
    writer: Box<dyn Write>,
}

impl OutputWriter {
    /// Create a new output writer on stdout
    pub fn new(format: OutputFormat, use_color: bool, quiet: bool) -> Self {
        Self {
            format,
            use_color: use_color && io::stdout().is_terminal(),
            quiet,
            writer: Box::new(io::stdout()),
        }
    }

    /// Create an output writer with a custom writer
    pub fn with_writer(
        format: OutputFormat,
        use_color: bool,
        quiet: bool,
        writer: Box<dyn Write>,
    ) -> Self {
        Self {
            format,
            use_color,
            quiet,
            writer,
        }
    }

    /// Whether results are rendered for people rather than programs
    pub fn is_human(&self) -> bool {
        self.format == OutputFormat::Human
    }

    /// Write a line of output
    pub fn writeln(&mut self, content: &str) -> Result<()> {
        writeln!(self.writer, "{}", content)?;
        self.writer.flush()?;
        Ok(())
    }

    /// Write an info message
    pub fn info(&mut self, message: &str) -> Result<()> {
        if self.quiet || !self.is_human() {
            return Ok(());
        }
        if self.use_color {
            self.writeln(&format!("{} {}", "ℹ".blue(), message))
        } else {
            self.writeln(&format!("INFO: {}", message))
        }
    }

    /// Write a success message
    pub fn success(&mut self, message: &str) -> Result<()> {
        if self.quiet || !self.is_human() {
            return Ok(());
        }
        if self.use_color {
            self.writeln(&message.green().to_string())
        } else {
            self.writeln(message)
        }
    }

    /// Write a warning message
    pub fn warning(&mut self, message: &str) -> Result<()> {
        if !self.is_human() {
            return Ok(());
        }
        if self.use_color {
            self.writeln(&message.yellow().to_string())
        } else {
            self.writeln(&format!("WARNING: {}", message))
        }
    }

    /// Write an error message
    pub fn error(&mut self, message: &str) -> Result<()> {
        if !self.is_human() {
            return Ok(());
        }
        if self.use_color {
            self.writeln(&message.red().to_string())
        } else {
            self.writeln(&format!("ERROR: {}", message))
        }
    }

    /// Write a section header
    pub fn section(&mut self, title: &str) -> Result<()> {
        if self.quiet || !self.is_human() {
            return Ok(());
        }
        self.writeln("")?;
        if self.use_color {
            self.writeln(&format!("═══ {} ═══", title).bright_blue().to_string())
        } else {
            self.writeln(&format!("=== {} ===", title))
        }
    }

    /// Write data in the configured format
    pub fn data<T: Serialize>(&mut self, value: &T) -> Result<()> {
        let formatted = self.format.format(value)?;
        trace!(bytes = formatted.len(), "Outputting data");
        self.writeln(formatted.trim_end())
    }

    /// Write a translation outcome
    pub fn translation(&mut self, outcome: &TranslationOutcome) -> Result<()> {
        let formatted = self.format.format_translation(outcome)?;
        self.writeln(formatted.trim_end())
    }

    /// Write a per-mapping report
    pub fn report(&mut self, report: &TranslationReport) -> Result<()> {
        let formatted = self.format.format_report(report)?;
        self.writeln(formatted.trim_end())
    }

    /// Write the problems found by `mdr check`
    pub fn problems(&mut self, problems: &[Problem]) -> Result<()> {
        if !self.is_human() {
            return self.data(&problems);
        }

        let rows: Vec<Vec<String>> = problems
            .iter()
            .map(|p| vec![p.rule.clone(), p.row.clone(), p.message.clone()])
            .collect();
        self.table(&["Rule", "Row", "Problem"], rows)
    }

    /// Write a table (for human format)
    pub fn table(&mut self, headers: &[&str], rows: Vec<Vec<String>>) -> Result<()> {
        if !self.is_human() {
            return Ok(());
        }

        let mut widths = headers.iter().map(|h| h.len()).collect::<Vec<_>>();
        for row in &rows {
            for (i, cell) in row.iter().enumerate() {
                if i < widths.len() {
                    widths[i] = widths[i].max(cell.chars().count());
                }
            }
        }

        let header_row = headers
            .iter()
            .enumerate()
            .map(|(i, h)| format!("{:width$}", h, width = widths[i]))
            .collect::<Vec<_>>()
            .join(" │ ");

        if self.use_color {
            self.writeln(&header_row.bold().to_string())?;
        } else {
            self.writeln(&header_row)?;
        }

        let separator = widths
            .iter()
            .map(|w| "─".repeat(*w))
            .collect::<Vec<_>>()
            .join("─┼─");
        self.writeln(&separator)?;

        for row in rows {
            let row_str = row
                .iter()
                .enumerate()
                .map(|(i, cell)| match widths.get(i) {
                    Some(width) => format!("{:width$}", cell, width = *width),
                    None => cell.clone(),
                })
                .collect::<Vec<_>>()
                .join(" │ ");
            self.writeln(row_str.trim_end())?;
        }

        Ok(())
    }
}

/// One problem found in a snapshot
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Problem {
    pub rule: String,
    pub row: String,
    pub message: String,
}

impl From<&IntegrityViolation> for Problem {
    fn from(violation: &IntegrityViolation) -> Self {
        Self {
            rule: violation.rule.to_string(),
            row: format!("{} {}", violation.row_kind, violation.row_id),
            message: violation.message.clone(),
        }
    }
}

impl From<&BindingIssue> for Problem {
    fn from(issue: &BindingIssue) -> Self {
        Self {
            rule: "stale-binding".to_string(),
            row: format!(
                "binding {} (transformation {})",
                issue.binding_id, issue.transformation_id
            ),
            message: issue.error.to_string(),
        }
    }
}

fn format_report_human(report: &TranslationReport) -> String {
    let summary = report.summary();
    let mut output = format!(
        "Mappings: {} ({} committed, {} skipped, {} rolled back)\n",
        report.entries().len(),
        summary.committed,
        summary.skipped,
        summary.rolled_back
    );

    for entry in report.entries() {
        let label = match entry.transformation_id {
            Some(id) => format!("{} (transformation {})", entry.label, id),
            None => entry.label.clone(),
        };
        match &entry.outcome {
            MappingOutcome::Committed => output.push_str(&format!("  ✓ {}\n", label)),
            MappingOutcome::Skipped { reason } => {
                output.push_str(&format!("  - {}: skipped, {}\n", label, reason))
            }
            MappingOutcome::RolledBack { violations } => {
                output.push_str(&format!("  ✗ {}: rolled back\n", label));
                for violation in violations {
                    output.push_str(&format!("      • {}\n", violation));
                }
            }
        }
    }

    output
}

fn format_translation_human(outcome: &TranslationOutcome) -> Result<String> {
    let mut output = String::new();
    let metadata = &outcome.metadata;

    output.push_str("═══ Translation Result ═══\n\n");
    if let (Some(source), Some(target)) = (metadata.source_data_model_id, metadata.target_data_model_id) {
        output.push_str(&format!("  Data models: {} → {}\n", source, target));
    }
    if let Some(version) = &metadata.group_version {
        output.push_str(&format!("  Group version: {}\n", version));
    }
    output.push_str(&format!("  Timestamp: {}\n", metadata.timestamp));
    if let Some(duration) = metadata.duration_ms {
        output.push_str(&format!("  Duration: {}ms\n", duration));
    }
    output.push('\n');
    output.push_str(&format_report_human(&outcome.report));
    output.push('\n');
    output.push_str("Document:\n");
    output.push_str(&serde_json::to_string_pretty(&outcome.document)?);
    output.push('\n');

    Ok(output)
}
