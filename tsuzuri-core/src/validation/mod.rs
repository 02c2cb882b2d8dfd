//! Validation of input records and assembled documents
//!
//! Input: universal header rules + one rule set per document type
//! Narrative: locale-aware length caps
//! Terminology: value-set membership and coding-system checks
//! Compliance: structural and profile checks on a document Bundle

pub mod compliance;
pub mod format;
pub mod narrative;
pub mod rules;
pub mod terminology;

pub use compliance::{validate_bundle, validate_bundle_json};
pub use rules::validate_input;
pub use terminology::{CodingRole, TerminologyRegistry};

use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;

use crate::config::PipelineConfig;
use crate::operation_outcome::{IssueSeverity, IssueType, OperationOutcome, OperationOutcomeIssue};

/// Accumulated validation messages.
///
/// Append-only: once an error is recorded the result stays invalid. Messages
/// are written as `path: text`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationResult {
    is_valid: bool,
    errors: Vec<String>,
    warnings: Vec<String>,
}

impl ValidationResult {
    pub fn new() -> Self {
        Self {
            is_valid: true,
            errors: Vec::new(),
            warnings: Vec::new(),
        }
    }

    pub fn error(&mut self, message: impl Into<String>) {
        self.is_valid = false;
        self.errors.push(message.into());
    }

    pub fn warning(&mut self, message: impl Into<String>) {
        self.warnings.push(message.into());
    }

    pub fn merge(&mut self, other: ValidationResult) {
        self.is_valid &= other.is_valid;
        self.errors.extend(other.errors);
        self.warnings.extend(other.warnings);
    }

    pub fn is_valid(&self) -> bool {
        self.is_valid
    }

    pub fn errors(&self) -> &[String] {
        &self.errors
    }

    pub fn warnings(&self) -> &[String] {
        &self.warnings
    }

    pub fn to_operation_outcome(&self) -> OperationOutcome {
        if self.errors.is_empty() && self.warnings.is_empty() {
            return OperationOutcome::success();
        }

        let issues = self
            .errors
            .iter()
            .map(|m| {
                OperationOutcomeIssue::from_message(IssueSeverity::Error, IssueType::Invalid, m)
            })
            .chain(self.warnings.iter().map(|m| {
                OperationOutcomeIssue::from_message(IssueSeverity::Warning, IssueType::Value, m)
            }))
            .collect();

        OperationOutcome::from_issues(issues)
    }
}

impl Default for ValidationResult {
    fn default() -> Self {
        Self::new()
    }
}

/// Everything a rule may consult besides the record itself.
#[derive(Debug, Clone, Copy)]
pub struct ValidationContext<'a> {
    /// Reference instant for "not in the future" rules.
    pub now: DateTime<Utc>,
    pub config: &'a PipelineConfig,
    pub terminology: &'a TerminologyRegistry,
}

impl<'a> ValidationContext<'a> {
    pub fn new(
        now: DateTime<Utc>,
        config: &'a PipelineConfig,
        terminology: &'a TerminologyRegistry,
    ) -> Self {
        Self {
            now,
            config,
            terminology,
        }
    }

    /// Calendar date of `now` in the configured local offset.
    pub fn today(&self) -> NaiveDate {
        self.now.with_timezone(&self.config.offset()).date_naive()
    }
}
