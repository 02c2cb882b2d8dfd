use chrono::NaiveDate;
use thiserror::Error;

use crate::era::Era;
use crate::operation_outcome::{IssueType, OperationOutcome};
use crate::validation::ValidationResult;

/// Failures of the era (wareki) calendar converter.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EraError {
    #[error("Unknown era: '{0}'")]
    UnknownEra(String),

    #[error("Invalid calendar date: {year}-{month:02}-{day:02}")]
    InvalidDate { year: i32, month: u32, day: u32 },

    #[error("Year {year} of {era} is outside the era (month {month}, day {day})")]
    OutOfEra {
        era: Era,
        year: u32,
        month: u32,
        day: u32,
    },

    #[error("Date {0} is before the first supported era")]
    BeforeFirstEra(NaiveDate),

    #[error("Unparseable date: '{0}'")]
    Unparseable(String),
}

/// The graph builder cannot produce a consistent resource graph.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BuildError {
    #[error("Missing correlation id: {0}")]
    MissingCorrelationId(&'static str),

    #[error("Missing required field: {0}")]
    MissingField(&'static str),

    #[error("Invalid date in {field}: {source}")]
    InvalidDate {
        field: &'static str,
        #[source]
        source: EraError,
    },
}

/// Internal invariant violations detected while wiring the document together.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AssemblyError {
    #[error("Section '{section}' points at {reference}, which is not an entry of this bundle")]
    DanglingSectionEntry { section: String, reference: String },

    #[error("Composition {field} points at {reference}, which is not an entry of this bundle")]
    DanglingCompositionReference {
        field: &'static str,
        reference: String,
    },

    #[error("{resource} points at {reference}, which is not an entry of this bundle")]
    DanglingReference { resource: String, reference: String },

    #[error("Duplicate fullUrl in bundle: {0}")]
    DuplicateFullUrl(String),
}

/// Why a transform did not produce a Bundle.
#[derive(Error, Debug, Clone)]
pub enum TransformError {
    #[error("Input rejected with {} error(s)", .0.errors().len())]
    Rejected(ValidationResult),

    #[error("Assembled document is not compliant: {} error(s)", .0.errors().len())]
    NonCompliant(ValidationResult),

    #[error("Cannot build resource graph: {0}")]
    Build(#[from] BuildError),

    #[error("Cannot assemble document: {0}")]
    Assembly(#[from] AssemblyError),
}

impl TransformError {
    /// The accumulated validation report, when the failure came from validation.
    pub fn report(&self) -> Option<&ValidationResult> {
        match self {
            TransformError::Rejected(result) | TransformError::NonCompliant(result) => Some(result),
            TransformError::Build(_) | TransformError::Assembly(_) => None,
        }
    }

    pub fn to_operation_outcome(&self) -> OperationOutcome {
        match self {
            TransformError::Rejected(result) | TransformError::NonCompliant(result) => {
                result.to_operation_outcome()
            }
            TransformError::Build(e) => OperationOutcome::fatal(IssueType::Required, e.to_string()),
            TransformError::Assembly(e) => {
                OperationOutcome::fatal(IssueType::Exception, e.to_string())
            }
        }
    }
}
