//! End-to-end pipeline: validate input, build the resource graph, assemble
//! the document and check the result before handing it out.

use chrono::{DateTime, Utc};
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::assembler::assemble;
use crate::builder::build_graph;
use crate::config::PipelineConfig;
use crate::error::TransformError;
use crate::input::InputRecord;
use crate::model::Bundle;
use crate::validation::{
    TerminologyRegistry, ValidationContext, ValidationResult, validate_bundle,
    validate_bundle_json, validate_input,
};

/// A compliant Bundle plus the advisory findings collected on the way.
#[derive(Debug, Clone)]
pub struct TransformOutcome {
    pub bundle: Bundle,
    /// Input warnings followed by warnings raised on the assembled Bundle.
    pub warnings: Vec<String>,
}

/// Runs the document pipeline with a fixed configuration.
#[derive(Debug, Clone)]
pub struct Transformer {
    config: PipelineConfig,
    terminology: TerminologyRegistry,
}

impl Transformer {
    pub fn new(config: PipelineConfig) -> Self {
        Self {
            config,
            terminology: TerminologyRegistry::new(),
        }
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Transform `input` using the current time as the reference clock.
    pub fn transform(&self, input: &InputRecord) -> Result<TransformOutcome, TransformError> {
        self.transform_at(input, Utc::now())
    }

    /// Transform `input` as of `now`.
    ///
    /// Returns either a complete Bundle or the full list of reasons it could
    /// not be produced; a partial Bundle is never returned.
    pub fn transform_at(
        &self,
        input: &InputRecord,
        now: DateTime<Utc>,
    ) -> Result<TransformOutcome, TransformError> {
        let kind = input.kind();
        let document_id = input.header().document_id.as_str();

        let ctx = ValidationContext::new(now, &self.config, &self.terminology);
        let mut report = validate_input(input, &ctx);
        if !report.is_valid() {
            warn!(
                document_type = %kind,
                document_id,
                errors = report.errors().len(),
                "Input rejected"
            );
            return Err(TransformError::Rejected(report));
        }

        let graph = build_graph(input, &self.config)?;
        debug!(document_type = %kind, document_id, "Resource graph built");

        let bundle = assemble(graph, now, &self.config)?;

        let compliance = validate_bundle(&bundle, &self.config);
        if !compliance.is_valid() {
            warn!(
                document_type = %kind,
                document_id,
                errors = compliance.errors().len(),
                "Assembled document failed compliance checks"
            );
            return Err(TransformError::NonCompliant(compliance));
        }
        report.merge(compliance);

        info!(
            document_type = %kind,
            document_id,
            bundle_id = %bundle.id,
            entries = bundle.entry.len(),
            warnings = report.warnings().len(),
            "Document transformed"
        );

        Ok(TransformOutcome {
            bundle,
            warnings: report.warnings().to_vec(),
        })
    }

    /// Validate an externally supplied Bundle in its JSON form.
    pub fn validate(&self, bundle: &Value) -> ValidationResult {
        validate_bundle_json(bundle, &self.config)
    }
}

impl Default for Transformer {
    fn default() -> Self {
        Self::new(PipelineConfig::default())
    }
}
