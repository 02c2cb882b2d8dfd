//! Maps a validated input record to a graph of typed FHIR resources.
//!
//! Every resource gets a fresh UUID v4 id when it is constructed. Every
//! patient-scoped resource clones the single subject reference created for the
//! Patient. Codes are copied from the input, never invented.

use chrono::{DateTime, FixedOffset, NaiveDate, SecondsFormat};
use tracing::debug;
use uuid::Uuid;

use crate::config::PipelineConfig;
use crate::constants::{code_system, id_system, profile};
use crate::era::parse_date;
use crate::error::BuildError;
use crate::input::{
    AllergyInput, ConceptInput, ConditionInput, DestinationInput, DocumentKind,
    InputRecord, MedicationInput, ObservationInput, ObservationValueInput, OrganizationInput,
    PatientInput, PractitionerInput, ProcedureInput, ServiceRequestInput,
};
use crate::model::{
    Address, AllergyIntolerance, AllergyReaction, Annotation, CodeableConcept, Coding, Condition,
    ContactPoint, DispenseRequest, DoseAndRate, Dosage, Encounter, Hospitalization, HumanName,
    Identifier, MedicationRequest, Meta, NameRepresentation, Observation, ObservationValue,
    Organization, Patient, Period, Practitioner, Procedure, Quantity, Reference, ReferenceRange,
    ResourceType, ServiceRequest,
};
use crate::validation::format::compact;

/// The typed resources of one document, before assembly.
#[derive(Debug, Clone, PartialEq)]
pub struct ResourceGraph {
    pub kind: DocumentKind,
    pub document_id: String,
    pub status: String,
    /// Facility code of the authoring organization.
    pub facility_code: String,
    pub created_at: DateTime<FixedOffset>,
    /// Reference to the Patient; every patient-scoped resource holds a clone.
    pub subject: Reference,
    pub patient: Patient,
    pub author: Practitioner,
    pub organization: Organization,
    pub encounter: Option<Encounter>,
    pub conditions: Vec<Condition>,
    pub medications: Vec<MedicationRequest>,
    pub allergies: Vec<AllergyIntolerance>,
    pub observations: Vec<Observation>,
    pub detail: DocumentDetail,
}

/// Resources and narrative specific to one document type.
#[derive(Debug, Clone, PartialEq)]
pub enum DocumentDetail {
    Referral {
        reason: String,
        present_illness: Option<String>,
        destination: Option<Organization>,
        services: Vec<ServiceRequest>,
    },
    DischargeSummary {
        principal_diagnosis: Condition,
        secondary_diagnoses: Vec<Condition>,
        procedures: Vec<Procedure>,
        hospital_course: Option<String>,
    },
    Checkup {
        checkup_type: String,
        overall_assessment: Observation,
        findings: Vec<Condition>,
        recommendations: Option<String>,
    },
}

/// Build the resource graph for `input`.
///
/// Expects input that passed validation; still fails rather than guessing
/// when a correlation id or a mandatory date is unusable.
pub fn build_graph(
    input: &InputRecord,
    config: &PipelineConfig,
) -> Result<ResourceGraph, BuildError> {
    let header = input.header();
    require_id(&header.patient.id, "patient.id")?;
    require_id(&header.author.id, "author.id")?;
    require_id(&header.organization.id, "organization.id")?;

    let facility_code = compact(&header.organization.id);
    let patient = build_patient(&header.patient, &facility_code)?;
    let author = build_practitioner(&header.author);
    let organization = build_organization(&header.organization);

    let subject = Reference::local(ResourceType::Patient, &patient.id)
        .with_display(patient.name.first().and_then(|n| n.text.clone()));

    let mut builder = GraphBuilder {
        subject: subject.clone(),
        author: Reference::local(ResourceType::Practitioner, &author.id),
        organization: Reference::local(ResourceType::Organization, &organization.id),
        encounter: None,
    };

    let created_at = header.created_at.with_timezone(&config.offset());

    let (encounter, detail, conditions, medications, allergies, observations) = match input {
        InputRecord::Referral(referral) => {
            let external = referral
                .destination
                .as_ref()
                .and_then(|d| non_empty(d.reference.as_deref()).map(|uri| (d, uri)));
            let destination = match external {
                Some(_) => None,
                None => referral.destination.as_ref().map(build_destination),
            };
            let performer = match external {
                Some((d, uri)) => {
                    Some(Reference::external(uri).with_display(non_empty(Some(d.name.as_str()))))
                }
                None => destination
                    .as_ref()
                    .map(|d| Reference::local(ResourceType::Organization, &d.id)),
            };
            let urgency = referral.urgency.as_deref().map(code_value);
            let services = referral
                .requested_services
                .iter()
                .map(|s| {
                    builder.service_request(
                        s,
                        &referral.reason,
                        urgency.as_deref(),
                        performer.as_ref(),
                        &created_at,
                    )
                })
                .collect();
            let detail = DocumentDetail::Referral {
                reason: referral.reason.trim().to_string(),
                present_illness: non_empty(referral.present_illness.as_deref()),
                destination,
                services,
            };
            (
                None,
                detail,
                builder.conditions(&referral.conditions, "problem-list-item")?,
                builder.medications(&referral.medications)?,
                builder.allergies(&referral.allergies),
                builder.observations(&referral.observations)?,
            )
        }
        InputRecord::DischargeSummary(summary) => {
            let admission = mandatory_date(&summary.admission_date, "admissionDate")?;
            let discharge = mandatory_date(&summary.discharge_date, "dischargeDate")?;
            let encounter = builder.inpatient_encounter(
                admission,
                discharge,
                summary.discharge_disposition.as_deref(),
            );
            builder.encounter = Some(Reference::local(ResourceType::Encounter, &encounter.id));

            let principal = summary
                .principal_diagnosis
                .as_ref()
                .ok_or(BuildError::MissingField("principalDiagnosis"))?;
            let detail = DocumentDetail::DischargeSummary {
                principal_diagnosis: builder.condition(principal, "encounter-diagnosis")?,
                secondary_diagnoses: builder
                    .conditions(&summary.secondary_diagnoses, "encounter-diagnosis")?,
                procedures: builder.procedures(&summary.procedures)?,
                hospital_course: non_empty(summary.hospital_course.as_deref()),
            };
            (
                Some(encounter),
                detail,
                Vec::new(),
                builder.medications(&summary.medications)?,
                builder.allergies(&summary.allergies),
                builder.observations(&summary.observations)?,
            )
        }
        InputRecord::Checkup(checkup) => {
            let date = mandatory_date(&checkup.checkup_date, "checkupDate")?;
            let encounter = builder.checkup_encounter(date);
            builder.encounter = Some(Reference::local(ResourceType::Encounter, &encounter.id));

            let assessment = checkup
                .overall_assessment
                .as_ref()
                .ok_or(BuildError::MissingField("overallAssessment"))?;
            let detail = DocumentDetail::Checkup {
                checkup_type: checkup.checkup_type.trim().to_string(),
                overall_assessment: builder.overall_assessment(assessment, date),
                findings: builder.conditions(&checkup.findings, "encounter-diagnosis")?,
                recommendations: non_empty(checkup.recommendations.as_deref()),
            };
            (
                Some(encounter),
                detail,
                Vec::new(),
                Vec::new(),
                Vec::new(),
                builder.observations(&checkup.observations)?,
            )
        }
    };

    debug!(
        document_type = %input.kind(),
        conditions = conditions.len(),
        medications = medications.len(),
        allergies = allergies.len(),
        observations = observations.len(),
        "Resource graph built"
    );

    Ok(ResourceGraph {
        kind: input.kind(),
        document_id: header.document_id.trim().to_string(),
        status: code_value(&header.status),
        facility_code,
        created_at,
        subject,
        patient,
        author,
        organization,
        encounter,
        conditions,
        medications,
        allergies,
        observations,
        detail,
    })
}

/// References shared by the resources of one graph.
struct GraphBuilder {
    subject: Reference,
    author: Reference,
    organization: Reference,
    encounter: Option<Reference>,
}

impl GraphBuilder {
    fn inpatient_encounter(
        &self,
        admission: NaiveDate,
        discharge: NaiveDate,
        disposition: Option<&str>,
    ) -> Encounter {
        Encounter {
            id: new_id(),
            meta: Meta::profile(profile::JP_ENCOUNTER),
            status: "finished".to_string(),
            class: Coding::new(
                code_system::ACT_CODE,
                "IMP",
                Some("inpatient encounter".to_string()),
            ),
            subject: self.subject.clone(),
            period: Some(Period {
                start: Some(admission.to_string()),
                end: Some(discharge.to_string()),
            }),
            hospitalization: disposition
                .filter(|d| !d.trim().is_empty())
                .map(|d| Hospitalization {
                    discharge_disposition: CodeableConcept::from_coding(Coding::new(
                        code_system::DISCHARGE_DISPOSITION,
                        code_value(d),
                        None,
                    )),
                }),
            service_provider: Some(self.organization.clone()),
        }
    }

    fn checkup_encounter(&self, date: NaiveDate) -> Encounter {
        Encounter {
            id: new_id(),
            meta: Meta::profile(profile::JP_ENCOUNTER),
            status: "finished".to_string(),
            class: Coding::new(
                code_system::ACT_CODE,
                "AMB",
                Some("ambulatory".to_string()),
            ),
            subject: self.subject.clone(),
            period: Some(Period {
                start: Some(date.to_string()),
                end: Some(date.to_string()),
            }),
            hospitalization: None,
            service_provider: Some(self.organization.clone()),
        }
    }

    fn conditions(
        &self,
        inputs: &[ConditionInput],
        category: &str,
    ) -> Result<Vec<Condition>, BuildError> {
        inputs.iter().map(|c| self.condition(c, category)).collect()
    }

    fn condition(&self, input: &ConditionInput, category: &str) -> Result<Condition, BuildError> {
        Ok(Condition {
            id: new_id(),
            meta: Meta::profile(profile::JP_CONDITION),
            clinical_status: input
                .clinical_status
                .as_deref()
                .map(|s| status_concept(code_system::CONDITION_CLINICAL, s)),
            verification_status: input
                .verification_status
                .as_deref()
                .map(|s| status_concept(code_system::CONDITION_VERIFICATION, s)),
            category: vec![status_concept(code_system::CONDITION_CATEGORY, category)],
            code: concept(&input.code),
            subject: self.subject.clone(),
            encounter: self.encounter.clone(),
            onset_date_time: optional_date(input.onset_date.as_deref(), "onsetDate")?,
            note: annotations(input.note.as_deref()),
        })
    }

    fn medications(
        &self,
        inputs: &[MedicationInput],
    ) -> Result<Vec<MedicationRequest>, BuildError> {
        inputs.iter().map(|m| self.medication(m)).collect()
    }

    fn medication(&self, input: &MedicationInput) -> Result<MedicationRequest, BuildError> {
        let dosage = Dosage {
            text: non_empty(input.dosage_text.as_deref()),
            route: non_empty(input.route.as_deref()).map(CodeableConcept::text_only),
            dose_and_rate: input
                .dose
                .iter()
                .map(|d| DoseAndRate {
                    dose_quantity: Quantity::ucum(d.value, non_empty(d.unit.as_deref())),
                })
                .collect(),
        };
        let has_dosage =
            dosage.text.is_some() || dosage.route.is_some() || !dosage.dose_and_rate.is_empty();

        Ok(MedicationRequest {
            id: new_id(),
            meta: Meta::profile(profile::JP_MEDICATION_REQUEST),
            status: code_value(&input.status),
            intent: "order".to_string(),
            medication_codeable_concept: concept(&input.medication),
            subject: self.subject.clone(),
            encounter: self.encounter.clone(),
            authored_on: optional_date(input.authored_on.as_deref(), "authoredOn")?,
            requester: Some(self.author.clone()),
            dosage_instruction: if has_dosage { vec![dosage] } else { Vec::new() },
            dispense_request: input.duration_days.map(|days| DispenseRequest {
                expected_supply_duration: Quantity {
                    value: f64::from(days),
                    unit: Some("日".to_string()),
                    system: Some(code_system::UCUM.to_string()),
                    code: Some("d".to_string()),
                },
            }),
        })
    }

    fn allergies(&self, inputs: &[AllergyInput]) -> Vec<AllergyIntolerance> {
        inputs
            .iter()
            .map(|a| AllergyIntolerance {
                id: new_id(),
                meta: Meta::profile(profile::JP_ALLERGY_INTOLERANCE),
                clinical_status: a
                    .clinical_status
                    .as_deref()
                    .map(|s| status_concept(code_system::ALLERGY_CLINICAL, s)),
                category: a.category.as_deref().map(code_value).into_iter().collect(),
                criticality: a.criticality.as_deref().map(code_value),
                code: concept(&a.substance),
                patient: self.subject.clone(),
                reaction: non_empty(a.reaction.as_deref())
                    .map(|r| AllergyReaction {
                        manifestation: vec![CodeableConcept::text_only(r)],
                    })
                    .into_iter()
                    .collect(),
            })
            .collect()
    }

    fn observations(&self, inputs: &[ObservationInput]) -> Result<Vec<Observation>, BuildError> {
        inputs.iter().map(|o| self.observation(o)).collect()
    }

    fn observation(&self, input: &ObservationInput) -> Result<Observation, BuildError> {
        let category = input.category.as_deref().map(code_value);
        let meta = match category.as_deref() {
            Some("laboratory") => Meta::profile(profile::JP_OBSERVATION_LAB),
            _ => Meta::profile(profile::JP_OBSERVATION_COMMON),
        };
        let value = input.value.as_ref().map(|v| match v {
            ObservationValueInput::Quantity(q) => {
                ObservationValue::Quantity(Quantity::ucum(q.value, non_empty(q.unit.as_deref())))
            }
            ObservationValueInput::Text(t) => ObservationValue::String(t.trim().to_string()),
            ObservationValueInput::Concept(c) => ObservationValue::CodeableConcept(concept(c)),
        });

        Ok(Observation {
            id: new_id(),
            meta,
            status: code_value(&input.status),
            category: category
                .iter()
                .map(|c| status_concept(code_system::OBSERVATION_CATEGORY, c))
                .collect(),
            code: concept(&input.code),
            subject: self.subject.clone(),
            encounter: self.encounter.clone(),
            effective_date_time: optional_date(input.effective_date.as_deref(), "effectiveDate")?,
            performer: Vec::new(),
            value,
            interpretation: non_empty(input.interpretation.as_deref())
                .map(CodeableConcept::text_only)
                .into_iter()
                .collect(),
            reference_range: non_empty(input.reference_range.as_deref())
                .map(|text| ReferenceRange { text })
                .into_iter()
                .collect(),
        })
    }

    /// The checkup's overall judgement as an Observation whose value is the
    /// assessment concept.
    fn overall_assessment(&self, assessment: &ConceptInput, date: NaiveDate) -> Observation {
        Observation {
            id: new_id(),
            meta: Meta::profile(profile::JP_OBSERVATION_COMMON),
            status: "final".to_string(),
            category: Vec::new(),
            code: CodeableConcept::text_only("総合判定"),
            subject: self.subject.clone(),
            encounter: self.encounter.clone(),
            effective_date_time: Some(date.to_string()),
            performer: vec![self.author.clone()],
            value: Some(ObservationValue::CodeableConcept(concept(assessment))),
            interpretation: Vec::new(),
            reference_range: Vec::new(),
        }
    }

    fn procedures(&self, inputs: &[ProcedureInput]) -> Result<Vec<Procedure>, BuildError> {
        inputs
            .iter()
            .map(|p| {
                Ok(Procedure {
                    id: new_id(),
                    meta: Meta::profile(profile::JP_PROCEDURE),
                    status: code_value(&p.status),
                    code: concept(&p.code),
                    subject: self.subject.clone(),
                    encounter: self.encounter.clone(),
                    performed_date_time: optional_date(
                        p.performed_date.as_deref(),
                        "performedDate",
                    )?,
                })
            })
            .collect()
    }

    fn service_request(
        &self,
        input: &ServiceRequestInput,
        reason: &str,
        urgency: Option<&str>,
        performer: Option<&Reference>,
        created_at: &DateTime<FixedOffset>,
    ) -> ServiceRequest {
        ServiceRequest {
            id: new_id(),
            meta: Meta::default(),
            status: "active".to_string(),
            intent: "order".to_string(),
            priority: input.priority.as_deref().map(code_value).or(urgency.map(str::to_string)),
            code: concept(&input.code),
            subject: self.subject.clone(),
            authored_on: Some(timestamp(created_at)),
            requester: Some(self.author.clone()),
            performer: performer.cloned().into_iter().collect(),
            reason_code: non_empty(Some(reason))
                .map(CodeableConcept::text_only)
                .into_iter()
                .collect(),
            note: annotations(input.note.as_deref()),
        }
    }
}

fn build_patient(input: &PatientInput, facility_code: &str) -> Result<Patient, BuildError> {
    let mut identifier = vec![Identifier::new(
        format!("{}{}", id_system::PATIENT_PREFIX, facility_code),
        input.id.trim(),
    )];
    if let Some(insurer) = non_empty(input.insurer_number.as_deref()) {
        identifier.push(Identifier::new(id_system::INSURER, compact(&insurer)));
    }

    Ok(Patient {
        id: new_id(),
        meta: Meta::profile(profile::JP_PATIENT),
        identifier,
        name: names(
            input.family_name.as_deref(),
            input.given_name.as_deref(),
            input.family_name_kana.as_deref(),
            input.given_name_kana.as_deref(),
        ),
        telecom: telecom(input.phone.as_deref()),
        gender: input.gender.as_deref().map(code_value),
        birth_date: optional_date(input.birth_date.as_deref(), "birthDate")?,
        address: address(input.postal_code.as_deref(), input.address.as_deref()),
    })
}

fn build_practitioner(input: &PractitionerInput) -> Practitioner {
    Practitioner {
        id: new_id(),
        meta: Meta::profile(profile::JP_PRACTITIONER),
        identifier: non_empty(input.license_number.as_deref())
            .map(|l| Identifier::new(id_system::MEDICAL_LICENSE, compact(&l)))
            .into_iter()
            .collect(),
        name: names(
            input.family_name.as_deref(),
            input.given_name.as_deref(),
            None,
            None,
        ),
        telecom: telecom(input.phone.as_deref()),
    }
}

fn build_organization(input: &OrganizationInput) -> Organization {
    Organization {
        id: new_id(),
        meta: Meta::profile(profile::JP_ORGANIZATION),
        identifier: vec![Identifier::new(id_system::FACILITY, compact(&input.id))],
        name: non_empty(Some(input.name.as_str())),
        telecom: telecom(input.phone.as_deref()),
        address: address(input.postal_code.as_deref(), input.address.as_deref()),
    }
}

fn build_destination(input: &DestinationInput) -> Organization {
    Organization {
        id: new_id(),
        meta: Meta::profile(profile::JP_ORGANIZATION),
        identifier: non_empty(input.facility_code.as_deref())
            .map(|c| Identifier::new(id_system::FACILITY, compact(&c)))
            .into_iter()
            .collect(),
        name: non_empty(Some(input.name.as_str())),
        telecom: Vec::new(),
        address: Vec::new(),
    }
}

fn names(
    family: Option<&str>,
    given: Option<&str>,
    family_kana: Option<&str>,
    given_kana: Option<&str>,
) -> Vec<HumanName> {
    let family = family.map(str::trim).filter(|s| !s.is_empty());
    let given = given.map(str::trim).filter(|s| !s.is_empty());
    let family_kana = family_kana.map(str::trim).filter(|s| !s.is_empty());
    let given_kana = given_kana.map(str::trim).filter(|s| !s.is_empty());

    let mut names = Vec::new();
    if family.is_some() || given.is_some() {
        names.push(HumanName::official(family, given, NameRepresentation::Ideographic));
    }
    if family_kana.is_some() || given_kana.is_some() {
        names.push(HumanName::official(
            family_kana,
            given_kana,
            NameRepresentation::Syllabic,
        ));
    }
    names
}

fn telecom(phone: Option<&str>) -> Vec<ContactPoint> {
    non_empty(phone)
        .map(|p| ContactPoint::phone(p, Some("work")))
        .into_iter()
        .collect()
}

fn address(postal_code: Option<&str>, text: Option<&str>) -> Vec<Address> {
    let postal_code = non_empty(postal_code).map(|p| p.replace('〒', "").trim().to_string());
    let text = non_empty(text);
    if postal_code.is_none() && text.is_none() {
        return Vec::new();
    }
    vec![Address {
        text,
        postal_code,
        country: "JP".to_string(),
    }]
}

/// Copy the usable codings of an input concept; half-filled codings are dropped.
fn concept(input: &ConceptInput) -> CodeableConcept {
    let coding = input
        .coding
        .iter()
        .filter(|c| !c.system.trim().is_empty() && !c.code.trim().is_empty())
        .map(|c| {
            Coding::new(
                c.system.trim(),
                c.code.trim(),
                c.display.as_deref().map(str::trim).map(str::to_string),
            )
        })
        .collect();
    CodeableConcept {
        coding,
        text: non_empty(input.text.as_deref()),
    }
}

fn status_concept(system: &str, code: &str) -> CodeableConcept {
    CodeableConcept::from_coding(Coding::new(system, code_value(code), None))
}

fn annotations(text: Option<&str>) -> Vec<Annotation> {
    non_empty(text)
        .map(|text| Annotation { text })
        .into_iter()
        .collect()
}

/// Enumerated values are matched case-insensitively and emitted lower case.
fn code_value(value: &str) -> String {
    value.trim().to_ascii_lowercase()
}

fn non_empty(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

fn require_id(value: &str, field: &'static str) -> Result<(), BuildError> {
    if value.trim().is_empty() {
        Err(BuildError::MissingCorrelationId(field))
    } else {
        Ok(())
    }
}

fn mandatory_date(raw: &str, field: &'static str) -> Result<NaiveDate, BuildError> {
    parse_date(raw).map_err(|source| BuildError::InvalidDate { field, source })
}

fn optional_date(raw: Option<&str>, field: &'static str) -> Result<Option<String>, BuildError> {
    match non_empty(raw) {
        Some(raw) => Ok(Some(mandatory_date(&raw, field)?.to_string())),
        None => Ok(None),
    }
}

pub(crate) fn timestamp(at: &DateTime<FixedOffset>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Secs, false)
}

fn new_id() -> String {
    Uuid::new_v4().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ClinicalResource, ReferenceTarget};
    use serde_json::json;

    fn header() -> serde_json::Value {
        json!({
            "documentId": "DOC-1",
            "status": "Final",
            "createdAt": "2024-03-12T01:00:00Z",
            "patient": {
                "id": "P001",
                "familyName": "山田",
                "givenName": "太郎",
                "familyNameKana": "ヤマダ",
                "givenNameKana": "タロウ",
                "gender": "Male",
                "birthDate": "S55.4.1",
                "insurerNumber": "06-139994",
                "postalCode": "〒100-0001"
            },
            "author": {"id": "D001", "familyName": "佐藤", "licenseNumber": "123456"},
            "organization": {"id": "13-1-1234567", "name": "東京中央病院"}
        })
    }

    fn build(value: serde_json::Value) -> Result<ResourceGraph, BuildError> {
        let input: InputRecord = serde_json::from_value(value).unwrap();
        build_graph(&input, &PipelineConfig::default())
    }

    fn referral() -> serde_json::Value {
        json!({
            "documentType": "referral",
            "header": header(),
            "reason": "abdominal pain work-up",
            "urgency": "Routine",
            "destination": {"name": "城北総合病院", "facilityCode": "1311111111"},
            "requestedServices": [
                {"code": {"coding": [{"system": code_system::LOINC, "code": "24356-8"}]}}
            ],
            "conditions": [{"code": {"text": "腹痛"}, "clinicalStatus": "active"}],
            "medications": [{
                "medication": {"coding": [{"system": code_system::YJ, "code": "1149019F1560"}]},
                "status": "active",
                "dosageText": "1日3回 毎食後",
                "durationDays": 7
            }]
        })
    }

    #[test]
    fn test_referral_graph() {
        let graph = build(referral()).unwrap();
        assert_eq!(graph.kind, DocumentKind::Referral);
        assert_eq!(graph.status, "final");
        assert_eq!(graph.facility_code, "1311234567");
        assert_eq!(graph.created_at.to_rfc3339(), "2024-03-12T10:00:00+09:00");
        assert!(graph.encounter.is_none());

        let DocumentDetail::Referral {
            services,
            destination,
            ..
        } = &graph.detail
        else {
            panic!("expected referral detail");
        };
        assert_eq!(services.len(), 1);
        assert_eq!(services[0].priority.as_deref(), Some("routine"));
        let destination = destination.as_ref().unwrap();
        assert_eq!(
            services[0].performer[0],
            Reference::local(ResourceType::Organization, &destination.id)
        );
    }

    #[test]
    fn test_external_destination() {
        let mut value = referral();
        value["destination"] = json!({
            "name": "城北総合病院",
            "reference": "https://fhir.johoku.example.jp/Organization/42"
        });
        let graph = build(value).unwrap();

        let DocumentDetail::Referral {
            services,
            destination,
            ..
        } = &graph.detail
        else {
            panic!("expected referral detail");
        };
        assert!(destination.is_none());
        let performer = &services[0].performer[0];
        assert!(!performer.is_local());
        assert_eq!(
            serde_json::to_value(performer).unwrap(),
            json!({
                "reference": "https://fhir.johoku.example.jp/Organization/42",
                "display": "城北総合病院"
            })
        );
    }

    #[test]
    fn test_subject_is_shared() {
        let graph = build(referral()).unwrap();
        assert_eq!(
            graph.subject.target,
            ReferenceTarget::Local {
                resource_type: ResourceType::Patient,
                id: graph.patient.id.clone()
            }
        );
        assert_eq!(graph.conditions[0].subject, graph.subject);
        assert_eq!(graph.medications[0].subject, graph.subject);
        assert_eq!(graph.subject.display.as_deref(), Some("山田 太郎"));
    }

    #[test]
    fn test_ids_are_unique_uuids() {
        let graph = build(referral()).unwrap();
        let ids = [
            graph.patient.id.as_str(),
            graph.author.id.as_str(),
            graph.organization.id.as_str(),
            graph.conditions[0].id.as_str(),
            graph.medications[0].id.as_str(),
        ];
        for id in ids {
            assert!(Uuid::parse_str(id).is_ok());
        }
        let unique: std::collections::HashSet<_> = ids.iter().collect();
        assert_eq!(unique.len(), ids.len());
    }

    #[test]
    fn test_patient_locale_details() {
        let graph = build(referral()).unwrap();
        let patient = &graph.patient;
        assert_eq!(
            patient.identifier[0].system,
            format!("{}1311234567", id_system::PATIENT_PREFIX)
        );
        assert_eq!(patient.identifier[0].value, "P001");
        assert_eq!(patient.identifier[1].value, "06139994");
        assert_eq!(patient.name.len(), 2);
        assert_eq!(patient.gender.as_deref(), Some("male"));
        assert_eq!(patient.birth_date.as_deref(), Some("1980-04-01"));
        assert_eq!(patient.address[0].postal_code.as_deref(), Some("100-0001"));
        assert_eq!(graph.author.identifier[0].system, id_system::MEDICAL_LICENSE);
    }

    #[test]
    fn test_text_only_concept_never_invents_codes() {
        let graph = build(referral()).unwrap();
        let code = &graph.conditions[0].code;
        assert!(code.coding.is_empty());
        assert_eq!(code.text.as_deref(), Some("腹痛"));
        assert!(graph.conditions[0].verification_status.is_none());
        assert!(graph.conditions[0].onset_date_time.is_none());
    }

    #[test]
    fn test_medication_details() {
        let graph = build(referral()).unwrap();
        let medication = &graph.medications[0];
        assert_eq!(medication.intent, "order");
        assert_eq!(medication.dosage_instruction.len(), 1);
        assert_eq!(
            medication
                .dispense_request
                .as_ref()
                .unwrap()
                .expected_supply_duration
                .value,
            7.0
        );
        let value = serde_json::to_value(ClinicalResource::MedicationRequest(medication.clone()))
            .unwrap();
        assert!(value.get("authoredOn").is_none());
    }

    #[test]
    fn test_missing_patient_id_aborts() {
        let mut value = referral();
        value["header"]["patient"]["id"] = json!(" ");
        assert_eq!(
            build(value).unwrap_err(),
            BuildError::MissingCorrelationId("patient.id")
        );
    }

    #[test]
    fn test_discharge_encounter() {
        let value = json!({
            "documentType": "discharge-summary",
            "header": header(),
            "admissionDate": "令和6年2月20日",
            "dischargeDate": "2024/03/01",
            "dischargeDisposition": "home",
            "principalDiagnosis": {"code": {"coding": [{"system": code_system::ICD10, "code": "K35.8"}]}},
            "procedures": [{"code": {"text": "虫垂切除術"}, "status": "completed", "performedDate": "R6.2.21"}]
        });
        let graph = build(value).unwrap();
        let encounter = graph.encounter.as_ref().unwrap();
        assert_eq!(encounter.class.code.as_deref(), Some("IMP"));
        let period = encounter.period.as_ref().unwrap();
        assert_eq!(period.start.as_deref(), Some("2024-02-20"));
        assert_eq!(period.end.as_deref(), Some("2024-03-01"));

        let DocumentDetail::DischargeSummary {
            principal_diagnosis,
            procedures,
            ..
        } = &graph.detail
        else {
            panic!("expected discharge summary detail");
        };
        let encounter_ref = Reference::local(ResourceType::Encounter, &encounter.id);
        assert_eq!(principal_diagnosis.encounter.as_ref(), Some(&encounter_ref));
        assert_eq!(procedures[0].performed_date_time.as_deref(), Some("2024-02-21"));
    }

    #[test]
    fn test_unparseable_mandatory_date_aborts() {
        let value = json!({
            "documentType": "checkup",
            "header": header(),
            "checkupDate": "someday",
            "checkupType": "general",
            "overallAssessment": {"text": "A"}
        });
        assert!(matches!(
            build(value),
            Err(BuildError::InvalidDate {
                field: "checkupDate",
                ..
            })
        ));
    }

    #[test]
    fn test_checkup_overall_assessment() {
        let value = json!({
            "documentType": "checkup",
            "header": header(),
            "checkupDate": "R6.3.1",
            "checkupType": "general",
            "overallAssessment": {"text": "異常なし"}
        });
        let graph = build(value).unwrap();
        let DocumentDetail::Checkup {
            overall_assessment, ..
        } = &graph.detail
        else {
            panic!("expected checkup detail");
        };
        assert_eq!(overall_assessment.effective_date_time.as_deref(), Some("2024-03-01"));
        assert_eq!(
            overall_assessment.value,
            Some(ObservationValue::CodeableConcept(CodeableConcept::text_only(
                "異常なし"
            )))
        );
        assert_eq!(
            graph.encounter.as_ref().unwrap().class.code.as_deref(),
            Some("AMB")
        );
    }
}
