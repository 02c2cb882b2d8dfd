//! Input records accepted by the pipeline, one variant per document type.
//!
//! The transport layer decodes wire JSON into these types. Unknown fields are
//! rejected here; empty identifiers and narrative are left for the business
//! rules so that every problem is reported at once.

use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::constants::profile;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "documentType", rename_all = "kebab-case")]
pub enum InputRecord {
    Referral(ReferralInput),
    DischargeSummary(DischargeSummaryInput),
    Checkup(CheckupInput),
}

impl InputRecord {
    pub fn kind(&self) -> DocumentKind {
        match self {
            InputRecord::Referral(_) => DocumentKind::Referral,
            InputRecord::DischargeSummary(_) => DocumentKind::DischargeSummary,
            InputRecord::Checkup(_) => DocumentKind::Checkup,
        }
    }

    pub fn header(&self) -> &DocumentHeader {
        match self {
            InputRecord::Referral(r) => &r.header,
            InputRecord::DischargeSummary(d) => &d.header,
            InputRecord::Checkup(c) => &c.header,
        }
    }
}

/// The three supported document kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DocumentKind {
    Referral,
    DischargeSummary,
    Checkup,
}

impl DocumentKind {
    pub const ALL: [DocumentKind; 3] = [
        DocumentKind::Referral,
        DocumentKind::DischargeSummary,
        DocumentKind::Checkup,
    ];

    pub const fn as_str(self) -> &'static str {
        match self {
            DocumentKind::Referral => "referral",
            DocumentKind::DischargeSummary => "discharge-summary",
            DocumentKind::Checkup => "checkup",
        }
    }

    pub const fn bundle_profile(self) -> &'static str {
        match self {
            DocumentKind::Referral => profile::REFERRAL_BUNDLE,
            DocumentKind::DischargeSummary => profile::DISCHARGE_SUMMARY_BUNDLE,
            DocumentKind::Checkup => profile::CHECKUP_BUNDLE,
        }
    }

    pub const fn composition_profile(self) -> &'static str {
        match self {
            DocumentKind::Referral => profile::REFERRAL_COMPOSITION,
            DocumentKind::DischargeSummary => profile::DISCHARGE_SUMMARY_COMPOSITION,
            DocumentKind::Checkup => profile::CHECKUP_COMPOSITION,
        }
    }

    /// Document type code (doc-typecodes, LOINC based).
    pub const fn type_code(self) -> &'static str {
        match self {
            DocumentKind::Referral => "57133-1",
            DocumentKind::DischargeSummary => "18842-5",
            DocumentKind::Checkup => "53576-5",
        }
    }

    pub const fn title(self) -> &'static str {
        match self {
            DocumentKind::Referral => "診療情報提供書",
            DocumentKind::DischargeSummary => "退院時サマリー",
            DocumentKind::Checkup => "健康診断結果報告書",
        }
    }
}

impl fmt::Display for DocumentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Fields shared by every document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct DocumentHeader {
    #[serde(default)]
    pub document_id: String,
    #[serde(default)]
    pub status: String,
    pub created_at: DateTime<FixedOffset>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_modified: Option<DateTime<FixedOffset>>,
    pub patient: PatientInput,
    pub author: PractitionerInput,
    pub organization: OrganizationInput,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct PatientInput {
    /// Patient id issued by the authoring facility.
    #[serde(default)]
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub family_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub given_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub family_name_kana: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub given_name_kana: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gender: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub birth_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub postal_code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub insurer_number: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct PractitionerInput {
    #[serde(default)]
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub family_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub given_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub license_number: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub department: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct OrganizationInput {
    /// Facility (medical institution) code.
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub postal_code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct CodingInput {
    #[serde(default)]
    pub system: String,
    #[serde(default)]
    pub code: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ConceptInput {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub coding: Vec<CodingInput>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
}

impl ConceptInput {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            coding: Vec::new(),
            text: Some(text.into()),
        }
    }

    pub fn coded(system: &str, code: &str, display: Option<&str>) -> Self {
        Self {
            coding: vec![CodingInput {
                system: system.to_string(),
                code: code.to_string(),
                display: display.map(str::to_string),
            }],
            text: None,
        }
    }

    /// Neither a non-empty coding nor text.
    pub fn is_blank(&self) -> bool {
        self.coding
            .iter()
            .all(|c| c.code.trim().is_empty() && c.system.trim().is_empty())
            && self.text.as_deref().is_none_or(|t| t.trim().is_empty())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ConditionInput {
    pub code: ConceptInput,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub clinical_status: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub verification_status: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub onset_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct QuantityInput {
    pub value: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ObservationValueInput {
    Quantity(QuantityInput),
    Text(String),
    Concept(ConceptInput),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ObservationInput {
    pub code: ConceptInput,
    pub status: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub effective_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<ObservationValueInput>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub interpretation: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reference_range: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct MedicationInput {
    pub medication: ConceptInput,
    pub status: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dosage_text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dose: Option<QuantityInput>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub route: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration_days: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub authored_on: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct AllergyInput {
    pub substance: ConceptInput,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub clinical_status: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub criticality: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reaction: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ProcedureInput {
    pub code: ConceptInput,
    pub status: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub performed_date: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ServiceRequestInput {
    pub code: ConceptInput,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

/// Facility the patient is referred to.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct DestinationInput {
    #[serde(default)]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub facility_code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub department: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub doctor_name: Option<String>,
    /// Absolute URI of the facility's Organization held elsewhere. When set,
    /// requested services point there and no Organization entry is built.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reference: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ReferralInput {
    pub header: DocumentHeader,
    #[serde(default)]
    pub reason: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub urgency: Option<String>,
    #[serde(default)]
    pub requested_services: Vec<ServiceRequestInput>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub destination: Option<DestinationInput>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub present_illness: Option<String>,
    #[serde(default)]
    pub conditions: Vec<ConditionInput>,
    #[serde(default)]
    pub medications: Vec<MedicationInput>,
    #[serde(default)]
    pub allergies: Vec<AllergyInput>,
    #[serde(default)]
    pub observations: Vec<ObservationInput>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct DischargeSummaryInput {
    pub header: DocumentHeader,
    #[serde(default)]
    pub admission_date: String,
    #[serde(default)]
    pub discharge_date: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub principal_diagnosis: Option<ConditionInput>,
    #[serde(default)]
    pub secondary_diagnoses: Vec<ConditionInput>,
    #[serde(default)]
    pub procedures: Vec<ProcedureInput>,
    #[serde(default)]
    pub medications: Vec<MedicationInput>,
    #[serde(default)]
    pub allergies: Vec<AllergyInput>,
    #[serde(default)]
    pub observations: Vec<ObservationInput>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hospital_course: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub discharge_disposition: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct CheckupInput {
    pub header: DocumentHeader,
    #[serde(default)]
    pub checkup_date: String,
    #[serde(default)]
    pub checkup_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub overall_assessment: Option<ConceptInput>,
    #[serde(default)]
    pub observations: Vec<ObservationInput>,
    #[serde(default)]
    pub findings: Vec<ConditionInput>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recommendations: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn header_json() -> serde_json::Value {
        json!({
            "documentId": "DOC-1",
            "status": "final",
            "createdAt": "2024-03-12T10:00:00+09:00",
            "patient": {"id": "P001", "familyName": "山田", "givenName": "太郎"},
            "author": {"id": "D001", "licenseNumber": "123456"},
            "organization": {"id": "1311234567", "name": "東京中央病院"}
        })
    }

    #[test]
    fn test_parse_referral() {
        let value = json!({
            "documentType": "referral",
            "header": header_json(),
            "reason": "abdominal pain work-up",
            "urgency": "routine",
            "requestedServices": [
                {"code": {"coding": [{"system": "http://loinc.org", "code": "24356-8"}]}}
            ]
        });
        let record: InputRecord = serde_json::from_value(value).unwrap();
        assert_eq!(record.kind(), DocumentKind::Referral);
        assert_eq!(record.header().patient.id, "P001");
        let InputRecord::Referral(referral) = record else {
            panic!("expected referral");
        };
        assert_eq!(referral.requested_services.len(), 1);
        assert!(referral.conditions.is_empty());
    }

    #[test]
    fn test_unknown_field_rejected() {
        let value = json!({
            "documentType": "checkup",
            "header": header_json(),
            "checkupDate": "2024-03-01",
            "checkupType": "general",
            "bloodType": "A"
        });
        let err = serde_json::from_value::<InputRecord>(value).unwrap_err();
        assert!(err.to_string().contains("bloodType"));
    }

    #[test]
    fn test_unknown_document_type_rejected() {
        let value = json!({"documentType": "prescription", "header": header_json()});
        assert!(serde_json::from_value::<InputRecord>(value).is_err());
    }

    #[test]
    fn test_missing_header_rejected() {
        let value = json!({"documentType": "referral", "reason": "x"});
        assert!(serde_json::from_value::<InputRecord>(value).is_err());
    }

    #[test]
    fn test_observation_value_variants() {
        let value = json!({
            "code": {"text": "HbA1c"},
            "status": "final",
            "value": {"quantity": {"value": 5.6, "unit": "%"}}
        });
        let observation: ObservationInput = serde_json::from_value(value).unwrap();
        assert_eq!(
            observation.value,
            Some(ObservationValueInput::Quantity(QuantityInput {
                value: 5.6,
                unit: Some("%".to_string())
            }))
        );
    }

    #[test]
    fn test_concept_blank() {
        assert!(ConceptInput::default().is_blank());
        assert!(ConceptInput::text("  ").is_blank());
        assert!(!ConceptInput::text("腹痛").is_blank());
        assert!(!ConceptInput::coded("http://hl7.org/fhir/sid/icd-10", "R10.4", None).is_blank());
    }

    #[test]
    fn test_document_kind_metadata() {
        assert_eq!(DocumentKind::Referral.type_code(), "57133-1");
        assert_eq!(DocumentKind::DischargeSummary.as_str(), "discharge-summary");
        assert!(DocumentKind::Checkup.bundle_profile().ends_with("JP_Bundle_eCheckupGeneral"));
    }
}
