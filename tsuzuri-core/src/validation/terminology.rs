use std::collections::HashMap;

use crate::constants::{code_system, value_set};
use crate::input::ConceptInput;
use crate::validation::ValidationResult;
use crate::validation::format::code_matches_system;

/// Registry of the value sets categorical input fields are bound to.
#[derive(Debug, Clone)]
pub struct TerminologyRegistry {
    value_sets: HashMap<String, ValueSet>,
}

#[derive(Debug, Clone)]
pub struct ValueSet {
    pub url: String,
    pub codes: Vec<String>,
}

impl ValueSet {
    pub fn new(url: &str, codes: &[&str]) -> Self {
        Self {
            url: url.to_string(),
            codes: codes.iter().map(|c| c.to_string()).collect(),
        }
    }
}

impl TerminologyRegistry {
    pub fn new() -> Self {
        let mut registry = Self {
            value_sets: HashMap::new(),
        };

        registry.add_value_set(ValueSet::new(
            value_set::ADMINISTRATIVE_GENDER,
            &["male", "female", "other", "unknown"],
        ));
        registry.add_value_set(ValueSet::new(
            value_set::COMPOSITION_STATUS,
            &["preliminary", "final", "amended", "entered-in-error"],
        ));
        registry.add_value_set(ValueSet::new(
            value_set::REQUEST_PRIORITY,
            &["routine", "urgent", "asap", "stat"],
        ));
        registry.add_value_set(ValueSet::new(
            value_set::CONDITION_CLINICAL,
            &["active", "recurrence", "relapse", "inactive", "remission", "resolved"],
        ));
        registry.add_value_set(ValueSet::new(
            value_set::CONDITION_VERIFICATION,
            &[
                "unconfirmed",
                "provisional",
                "differential",
                "confirmed",
                "refuted",
                "entered-in-error",
            ],
        ));
        registry.add_value_set(ValueSet::new(
            value_set::ALLERGY_CLINICAL,
            &["active", "inactive", "resolved"],
        ));
        registry.add_value_set(ValueSet::new(
            value_set::ALLERGY_CATEGORY,
            &["food", "medication", "environment", "biologic"],
        ));
        registry.add_value_set(ValueSet::new(
            value_set::ALLERGY_CRITICALITY,
            &["low", "high", "unable-to-assess"],
        ));
        registry.add_value_set(ValueSet::new(
            value_set::MEDICATION_REQUEST_STATUS,
            &[
                "active",
                "on-hold",
                "cancelled",
                "completed",
                "entered-in-error",
                "stopped",
                "draft",
                "unknown",
            ],
        ));
        registry.add_value_set(ValueSet::new(
            value_set::OBSERVATION_STATUS,
            &[
                "registered",
                "preliminary",
                "final",
                "amended",
                "corrected",
                "cancelled",
                "entered-in-error",
                "unknown",
            ],
        ));
        registry.add_value_set(ValueSet::new(
            value_set::OBSERVATION_CATEGORY,
            &[
                "social-history",
                "vital-signs",
                "imaging",
                "laboratory",
                "procedure",
                "survey",
                "exam",
                "therapy",
                "activity",
            ],
        ));
        registry.add_value_set(ValueSet::new(
            value_set::EVENT_STATUS,
            &[
                "preparation",
                "in-progress",
                "not-done",
                "on-hold",
                "stopped",
                "completed",
                "entered-in-error",
                "unknown",
            ],
        ));
        registry.add_value_set(ValueSet::new(
            value_set::DISCHARGE_DISPOSITION,
            &[
                "home", "alt-home", "other-hcf", "hosp", "long", "aadvice", "exp", "psy",
                "rehab", "snf", "oth",
            ],
        ));
        registry.add_value_set(ValueSet::new(
            value_set::CHECKUP_TYPE,
            &["general", "specific", "workplace", "school", "comprehensive"],
        ));

        registry
    }

    pub fn add_value_set(&mut self, value_set: ValueSet) {
        self.value_sets.insert(value_set.url.clone(), value_set);
    }

    /// Validate a code against a ValueSet, ignoring ASCII case.
    pub fn validate_code(&self, value_set_url: &str, code: &str) -> bool {
        if let Some(value_set) = self.value_sets.get(value_set_url) {
            let code = code.trim();
            value_set.codes.iter().any(|c| c.eq_ignore_ascii_case(code))
        } else {
            // If ValueSet is not known, allow the code
            true
        }
    }

    /// Warn when `value` is not a member of `value_set_url`.
    pub fn check_code(
        &self,
        value_set_url: &str,
        value: &str,
        path: &str,
        result: &mut ValidationResult,
    ) {
        if !self.validate_code(value_set_url, value) {
            let allowed = self
                .value_sets
                .get(value_set_url)
                .map(|vs| vs.codes.join(", "))
                .unwrap_or_default();
            result.warning(format!(
                "{}: '{}' is not a recognized code (expected one of: {})",
                path, value, allowed
            ));
        }
    }
}

impl Default for TerminologyRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// What a coded concept is used for; decides the allowed code systems.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CodingRole {
    Diagnosis,
    Medication,
    LabOrService,
}

impl CodingRole {
    pub fn systems(self) -> &'static [&'static str] {
        match self {
            CodingRole::Diagnosis => &code_system::DIAGNOSIS_SYSTEMS,
            CodingRole::Medication => &code_system::MEDICATION_SYSTEMS,
            CodingRole::LabOrService => &code_system::LAB_SYSTEMS,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            CodingRole::Diagnosis => "ICD-10, ICD-10 (JP) or MEDIS disease codes",
            CodingRole::Medication => "HOT, YJ or receipt medication codes",
            CodingRole::LabOrService => "JLAC10, JLAC11 or LOINC codes",
        }
    }
}

/// Advisory checks on a coded concept: half-filled codings, code structure
/// and, when `role` is given, membership of an allowed code system.
pub fn check_concept(
    concept: &ConceptInput,
    path: &str,
    role: Option<CodingRole>,
    result: &mut ValidationResult,
) {
    for (idx, coding) in concept.coding.iter().enumerate() {
        let system = coding.system.trim();
        let code = coding.code.trim();
        match (system.is_empty(), code.is_empty()) {
            (true, true) => {}
            (true, false) | (false, true) => result.warning(format!(
                "{}.coding[{}]: code and system must be given together",
                path, idx
            )),
            (false, false) => {
                if !code_matches_system(system, code) {
                    result.warning(format!(
                        "{}.coding[{}]: code '{}' does not match the format of {}",
                        path, idx, code, system
                    ));
                }
            }
        }
    }

    let Some(role) = role else {
        return;
    };
    if concept.is_blank() {
        return;
    }

    let usable: Vec<_> = concept
        .coding
        .iter()
        .filter(|c| !c.system.trim().is_empty() && !c.code.trim().is_empty())
        .collect();
    if usable.is_empty() {
        result.warning(format!(
            "{}: text-only concept, expected a coding from {}",
            path,
            role.label()
        ));
    } else if !usable
        .iter()
        .any(|c| role.systems().contains(&c.system.trim()))
    {
        result.warning(format!(
            "{}: no coding from the allowed code systems ({})",
            path,
            role.label()
        ));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_terminology_registry_gender() {
        let registry = TerminologyRegistry::new();

        assert!(registry.validate_code(value_set::ADMINISTRATIVE_GENDER, "male"));
        assert!(registry.validate_code(value_set::ADMINISTRATIVE_GENDER, "Female"));
        assert!(!registry.validate_code(value_set::ADMINISTRATIVE_GENDER, "invalid"));
    }

    #[test]
    fn test_unknown_value_set_allows_code() {
        let registry = TerminologyRegistry::new();
        assert!(registry.validate_code("http://example.org/ValueSet/unknown", "anything"));
    }

    #[test]
    fn test_check_code_warns() {
        let registry = TerminologyRegistry::new();
        let mut result = ValidationResult::new();
        registry.check_code(
            value_set::REQUEST_PRIORITY,
            "whenever",
            "referral.urgency",
            &mut result,
        );
        registry.check_code(value_set::REQUEST_PRIORITY, "ROUTINE", "x", &mut result);
        assert!(result.is_valid());
        assert_eq!(result.warnings().len(), 1);
        assert!(result.warnings()[0].starts_with("referral.urgency:"));
    }

    #[test]
    fn test_check_concept_text_only() {
        let mut result = ValidationResult::new();
        check_concept(
            &ConceptInput::text("急性虫垂炎"),
            "dx",
            Some(CodingRole::Diagnosis),
            &mut result,
        );
        assert_eq!(result.warnings().len(), 1);
        assert!(result.warnings()[0].contains("text-only"));
    }

    #[test]
    fn test_check_concept_wrong_system() {
        let mut result = ValidationResult::new();
        let concept = ConceptInput::coded(code_system::LOINC, "24356-8", None);
        check_concept(&concept, "med", Some(CodingRole::Medication), &mut result);
        assert_eq!(result.warnings().len(), 1);
        assert!(result.warnings()[0].contains("allowed code systems"));
    }

    #[test]
    fn test_check_concept_malformed_code() {
        let mut result = ValidationResult::new();
        let concept = ConceptInput::coded(code_system::ICD10, "appendicitis", None);
        check_concept(&concept, "dx", Some(CodingRole::Diagnosis), &mut result);
        assert_eq!(result.warnings().len(), 1);
        assert!(result.warnings()[0].contains("does not match"));
    }

    #[test]
    fn test_check_concept_half_filled() {
        let mut result = ValidationResult::new();
        let concept = ConceptInput::coded("", "K35.8", None);
        check_concept(&concept, "dx", None, &mut result);
        assert_eq!(result.warnings().len(), 1);
        assert!(result.warnings()[0].contains("together"));
    }

    #[test]
    fn test_check_concept_clean() {
        let mut result = ValidationResult::new();
        let concept = ConceptInput::coded(code_system::ICD10, "K35.8", Some("急性虫垂炎"));
        check_concept(&concept, "dx", Some(CodingRole::Diagnosis), &mut result);
        assert!(result.warnings().is_empty());
    }
}
