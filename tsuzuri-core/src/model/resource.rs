use serde::Serialize;

use super::datatypes::{
    Address, Annotation, CodeableConcept, Coding, ContactPoint, HumanName, Identifier, Narrative,
    Period, Quantity, Reference, ResourceType,
};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct Meta {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_updated: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub profile: Vec<String>,
}

impl Meta {
    pub fn profile(url: &str) -> Self {
        Self {
            last_updated: None,
            profile: vec![url.to_string()],
        }
    }

    pub fn is_empty(&self) -> bool {
        self.last_updated.is_none() && self.profile.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Patient {
    pub id: String,
    #[serde(skip_serializing_if = "Meta::is_empty")]
    pub meta: Meta,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub identifier: Vec<Identifier>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub name: Vec<HumanName>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub telecom: Vec<ContactPoint>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gender: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub birth_date: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub address: Vec<Address>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Practitioner {
    pub id: String,
    #[serde(skip_serializing_if = "Meta::is_empty")]
    pub meta: Meta,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub identifier: Vec<Identifier>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub name: Vec<HumanName>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub telecom: Vec<ContactPoint>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Organization {
    pub id: String,
    #[serde(skip_serializing_if = "Meta::is_empty")]
    pub meta: Meta,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub identifier: Vec<Identifier>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub telecom: Vec<ContactPoint>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub address: Vec<Address>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Hospitalization {
    pub discharge_disposition: CodeableConcept,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Encounter {
    pub id: String,
    #[serde(skip_serializing_if = "Meta::is_empty")]
    pub meta: Meta,
    pub status: String,
    pub class: Coding,
    pub subject: Reference,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub period: Option<Period>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hospitalization: Option<Hospitalization>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub service_provider: Option<Reference>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Condition {
    pub id: String,
    #[serde(skip_serializing_if = "Meta::is_empty")]
    pub meta: Meta,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub clinical_status: Option<CodeableConcept>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub verification_status: Option<CodeableConcept>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub category: Vec<CodeableConcept>,
    pub code: CodeableConcept,
    pub subject: Reference,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub encounter: Option<Reference>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub onset_date_time: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub note: Vec<Annotation>,
}

/// `Observation.value[x]`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum ObservationValue {
    #[serde(rename = "valueQuantity")]
    Quantity(Quantity),
    #[serde(rename = "valueString")]
    String(String),
    #[serde(rename = "valueCodeableConcept")]
    CodeableConcept(CodeableConcept),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReferenceRange {
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Observation {
    pub id: String,
    #[serde(skip_serializing_if = "Meta::is_empty")]
    pub meta: Meta,
    pub status: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub category: Vec<CodeableConcept>,
    pub code: CodeableConcept,
    pub subject: Reference,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub encounter: Option<Reference>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub effective_date_time: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub performer: Vec<Reference>,
    #[serde(flatten)]
    pub value: Option<ObservationValue>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub interpretation: Vec<CodeableConcept>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub reference_range: Vec<ReferenceRange>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DoseAndRate {
    pub dose_quantity: Quantity,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Dosage {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub route: Option<CodeableConcept>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub dose_and_rate: Vec<DoseAndRate>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DispenseRequest {
    pub expected_supply_duration: Quantity,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MedicationRequest {
    pub id: String,
    #[serde(skip_serializing_if = "Meta::is_empty")]
    pub meta: Meta,
    pub status: String,
    pub intent: String,
    pub medication_codeable_concept: CodeableConcept,
    pub subject: Reference,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub encounter: Option<Reference>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub authored_on: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub requester: Option<Reference>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub dosage_instruction: Vec<Dosage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dispense_request: Option<DispenseRequest>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AllergyReaction {
    pub manifestation: Vec<CodeableConcept>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AllergyIntolerance {
    pub id: String,
    #[serde(skip_serializing_if = "Meta::is_empty")]
    pub meta: Meta,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub clinical_status: Option<CodeableConcept>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub category: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub criticality: Option<String>,
    pub code: CodeableConcept,
    pub patient: Reference,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub reaction: Vec<AllergyReaction>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Procedure {
    pub id: String,
    #[serde(skip_serializing_if = "Meta::is_empty")]
    pub meta: Meta,
    pub status: String,
    pub code: CodeableConcept,
    pub subject: Reference,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub encounter: Option<Reference>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub performed_date_time: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceRequest {
    pub id: String,
    #[serde(skip_serializing_if = "Meta::is_empty")]
    pub meta: Meta,
    pub status: String,
    pub intent: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub priority: Option<String>,
    pub code: CodeableConcept,
    pub subject: Reference,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub authored_on: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub requester: Option<Reference>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub performer: Vec<Reference>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub reason_code: Vec<CodeableConcept>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub note: Vec<Annotation>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Section {
    pub title: String,
    pub code: CodeableConcept,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<Narrative>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub entry: Vec<Reference>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Composition {
    pub id: String,
    #[serde(skip_serializing_if = "Meta::is_empty")]
    pub meta: Meta,
    pub identifier: Identifier,
    pub status: String,
    #[serde(rename = "type")]
    pub document_type: CodeableConcept,
    pub subject: Reference,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub encounter: Option<Reference>,
    pub date: String,
    pub author: Vec<Reference>,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub custodian: Option<Reference>,
    pub section: Vec<Section>,
}

/// Every resource kind a document may carry.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "resourceType")]
pub enum ClinicalResource {
    Composition(Composition),
    Patient(Patient),
    Practitioner(Practitioner),
    Organization(Organization),
    Encounter(Encounter),
    Condition(Condition),
    Observation(Observation),
    MedicationRequest(MedicationRequest),
    AllergyIntolerance(AllergyIntolerance),
    Procedure(Procedure),
    ServiceRequest(ServiceRequest),
}

impl ClinicalResource {
    pub fn id(&self) -> &str {
        match self {
            ClinicalResource::Composition(r) => &r.id,
            ClinicalResource::Patient(r) => &r.id,
            ClinicalResource::Practitioner(r) => &r.id,
            ClinicalResource::Organization(r) => &r.id,
            ClinicalResource::Encounter(r) => &r.id,
            ClinicalResource::Condition(r) => &r.id,
            ClinicalResource::Observation(r) => &r.id,
            ClinicalResource::MedicationRequest(r) => &r.id,
            ClinicalResource::AllergyIntolerance(r) => &r.id,
            ClinicalResource::Procedure(r) => &r.id,
            ClinicalResource::ServiceRequest(r) => &r.id,
        }
    }

    pub fn resource_type(&self) -> ResourceType {
        match self {
            ClinicalResource::Composition(_) => ResourceType::Composition,
            ClinicalResource::Patient(_) => ResourceType::Patient,
            ClinicalResource::Practitioner(_) => ResourceType::Practitioner,
            ClinicalResource::Organization(_) => ResourceType::Organization,
            ClinicalResource::Encounter(_) => ResourceType::Encounter,
            ClinicalResource::Condition(_) => ResourceType::Condition,
            ClinicalResource::Observation(_) => ResourceType::Observation,
            ClinicalResource::MedicationRequest(_) => ResourceType::MedicationRequest,
            ClinicalResource::AllergyIntolerance(_) => ResourceType::AllergyIntolerance,
            ClinicalResource::Procedure(_) => ResourceType::Procedure,
            ClinicalResource::ServiceRequest(_) => ResourceType::ServiceRequest,
        }
    }

    /// A same-document reference to this resource.
    pub fn reference(&self) -> Reference {
        Reference::local(self.resource_type(), self.id())
    }

    /// Every reference embedded in this resource, in field order.
    pub fn references(&self) -> Vec<&Reference> {
        match self {
            ClinicalResource::Composition(c) => {
                let mut refs = vec![&c.subject];
                refs.extend(c.encounter.iter());
                refs.extend(c.author.iter());
                refs.extend(c.custodian.iter());
                refs.extend(c.section.iter().flat_map(|s| s.entry.iter()));
                refs
            }
            ClinicalResource::Patient(_)
            | ClinicalResource::Practitioner(_)
            | ClinicalResource::Organization(_) => Vec::new(),
            ClinicalResource::Encounter(e) => {
                let mut refs = vec![&e.subject];
                refs.extend(e.service_provider.iter());
                refs
            }
            ClinicalResource::Condition(c) => {
                let mut refs = vec![&c.subject];
                refs.extend(c.encounter.iter());
                refs
            }
            ClinicalResource::Observation(o) => {
                let mut refs = vec![&o.subject];
                refs.extend(o.encounter.iter());
                refs.extend(o.performer.iter());
                refs
            }
            ClinicalResource::MedicationRequest(m) => {
                let mut refs = vec![&m.subject];
                refs.extend(m.encounter.iter());
                refs.extend(m.requester.iter());
                refs
            }
            ClinicalResource::AllergyIntolerance(a) => vec![&a.patient],
            ClinicalResource::Procedure(p) => {
                let mut refs = vec![&p.subject];
                refs.extend(p.encounter.iter());
                refs
            }
            ClinicalResource::ServiceRequest(s) => {
                let mut refs = vec![&s.subject];
                refs.extend(s.requester.iter());
                refs.extend(s.performer.iter());
                refs
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn patient_ref() -> Reference {
        Reference::local(ResourceType::Patient, "p-1")
    }

    #[test]
    fn test_resource_type_tag() {
        let procedure = ClinicalResource::Procedure(Procedure {
            id: "proc-1".to_string(),
            meta: Meta::default(),
            status: "completed".to_string(),
            code: CodeableConcept::text_only("腹腔鏡下虫垂切除術"),
            subject: patient_ref(),
            encounter: None,
            performed_date_time: Some("2024-03-02".to_string()),
        });
        let value = serde_json::to_value(&procedure).unwrap();
        assert_eq!(value["resourceType"], "Procedure");
        assert_eq!(value["id"], "proc-1");
        assert_eq!(value["performedDateTime"], "2024-03-02");
        assert!(value.get("meta").is_none());
        assert!(value.get("encounter").is_none());
    }

    #[test]
    fn test_observation_value_flattened() {
        let observation = Observation {
            id: "obs-1".to_string(),
            meta: Meta::default(),
            status: "final".to_string(),
            category: Vec::new(),
            code: CodeableConcept::text_only("HbA1c"),
            subject: patient_ref(),
            encounter: None,
            effective_date_time: None,
            performer: Vec::new(),
            value: Some(ObservationValue::Quantity(Quantity::ucum(
                5.6,
                Some("%".to_string()),
            ))),
            interpretation: Vec::new(),
            reference_range: Vec::new(),
        };
        let value = serde_json::to_value(ClinicalResource::Observation(observation)).unwrap();
        assert_eq!(value["valueQuantity"]["value"], 5.6);
        assert!(value.get("value").is_none());
    }

    #[test]
    fn test_references_of_allergy() {
        let allergy = ClinicalResource::AllergyIntolerance(AllergyIntolerance {
            id: "a-1".to_string(),
            meta: Meta::default(),
            clinical_status: None,
            category: vec!["medication".to_string()],
            criticality: None,
            code: CodeableConcept::text_only("ペニシリン"),
            patient: patient_ref(),
            reaction: Vec::new(),
        });
        let refs = allergy.references();
        assert_eq!(refs.len(), 1);
        assert_eq!(refs[0], &patient_ref());
        assert_eq!(allergy.reference(), Reference::local(ResourceType::AllergyIntolerance, "a-1"));
    }
}
