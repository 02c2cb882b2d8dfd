//! tsuzuri-core - clinical document transformation pipeline
//!
//! Turns referral, discharge-summary and health-checkup records into JP-CLINS
//! style FHIR R4 document Bundles and validates the result.

pub mod assembler;
pub mod builder;
pub mod config;
pub mod constants;
pub mod era;
pub mod error;
pub mod input;
pub mod model;
pub mod operation_outcome;
pub mod text;
pub mod transform;
pub mod validation;

pub use config::PipelineConfig;
pub use era::{Era, EraDate};
pub use error::{AssemblyError, BuildError, EraError, TransformError};
pub use input::{CheckupInput, DischargeSummaryInput, DocumentKind, InputRecord, ReferralInput};
pub use model::{Bundle, ClinicalResource, CodeableConcept, Coding, Reference, ResourceType};
pub use operation_outcome::{IssueSeverity, IssueType, OperationOutcome, OperationOutcomeIssue};
pub use transform::{TransformOutcome, Transformer};
pub use validation::{TerminologyRegistry, ValidationResult};
