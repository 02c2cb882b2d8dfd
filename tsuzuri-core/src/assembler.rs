//! Wires a resource graph into a document Bundle.
//!
//! Entry 0 is the Composition, followed by the Patient, the author, the
//! organization(s), the encounter and then the clinical resources in section
//! order. Sections are emitted in a fixed order per document type and only
//! when they have content.

use chrono::{DateTime, Datelike, Utc};
use std::collections::HashSet;
use tracing::debug;
use uuid::Uuid;

use crate::builder::{DocumentDetail, ResourceGraph, timestamp};
use crate::config::PipelineConfig;
use crate::constants::{code_system, id_system};
use crate::error::AssemblyError;
use crate::model::{
    AllergyIntolerance, Bundle, BundleEntry, ClinicalResource, CodeableConcept, Coding,
    Composition, Condition, Identifier, MedicationRequest, Meta, Narrative, Observation,
    ObservationValue, Reference, Section,
};

/// Document sections, in the order they appear within their document type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SectionKind {
    ReferralReason,
    PresentIllness,
    ProblemList,
    CurrentMedications,
    Allergies,
    LabResults,
    RequestedServices,
    AdmissionDetail,
    PrincipalDiagnosis,
    SecondaryDiagnoses,
    HospitalCourse,
    Procedures,
    DischargeMedications,
    OverallAssessment,
    CheckupResults,
    Findings,
    Recommendations,
}

impl SectionKind {
    pub const fn code(self) -> &'static str {
        match self {
            SectionKind::ReferralReason => "950",
            SectionKind::PresentIllness => "360",
            SectionKind::ProblemList => "340",
            SectionKind::CurrentMedications => "440",
            SectionKind::Allergies => "510",
            SectionKind::LabResults => "520",
            SectionKind::RequestedServices => "960",
            SectionKind::AdmissionDetail => "312",
            SectionKind::PrincipalDiagnosis => "342",
            SectionKind::SecondaryDiagnoses => "344",
            SectionKind::HospitalCourse => "352",
            SectionKind::Procedures => "354",
            SectionKind::DischargeMedications => "444",
            SectionKind::OverallAssessment => "610",
            SectionKind::CheckupResults => "620",
            SectionKind::Findings => "630",
            SectionKind::Recommendations => "640",
        }
    }

    pub const fn title(self) -> &'static str {
        match self {
            SectionKind::ReferralReason => "紹介目的",
            SectionKind::PresentIllness => "現病歴",
            SectionKind::ProblemList => "傷病名・主訴",
            SectionKind::CurrentMedications => "現在の処方",
            SectionKind::Allergies => "アレルギー・不耐性反応",
            SectionKind::LabResults => "検査結果",
            SectionKind::RequestedServices => "依頼内容",
            SectionKind::AdmissionDetail => "入院詳細",
            SectionKind::PrincipalDiagnosis => "主たる診断",
            SectionKind::SecondaryDiagnoses => "副診断",
            SectionKind::HospitalCourse => "入院中経過",
            SectionKind::Procedures => "入院中の手術・処置",
            SectionKind::DischargeMedications => "退院時処方",
            SectionKind::OverallAssessment => "総合判定",
            SectionKind::CheckupResults => "健診結果",
            SectionKind::Findings => "所見",
            SectionKind::Recommendations => "指導・勧告",
        }
    }
}

/// Section content before its entries are added to the bundle.
struct SectionDraft {
    kind: SectionKind,
    narrative: Option<String>,
    resources: Vec<ClinicalResource>,
    /// Entries already added elsewhere (the encounter).
    existing: Vec<Reference>,
}

impl SectionDraft {
    fn narrative(kind: SectionKind, text: Option<String>) -> Self {
        Self {
            kind,
            narrative: text,
            resources: Vec::new(),
            existing: Vec::new(),
        }
    }

    fn entries(kind: SectionKind, resources: Vec<ClinicalResource>) -> Self {
        Self {
            kind,
            narrative: None,
            resources,
            existing: Vec::new(),
        }
    }

    fn is_empty(&self) -> bool {
        self.narrative.is_none() && self.resources.is_empty() && self.existing.is_empty()
    }
}

/// Bundle entries in insertion order, with the fullUrls added so far.
#[derive(Default)]
struct EntryCollector {
    entries: Vec<BundleEntry>,
    full_urls: HashSet<String>,
}

impl EntryCollector {
    fn push(&mut self, resource: ClinicalResource) -> Result<Reference, AssemblyError> {
        let entry = BundleEntry::new(resource);
        if !self.full_urls.insert(entry.full_url.clone()) {
            return Err(AssemblyError::DuplicateFullUrl(entry.full_url));
        }
        let reference = entry.resource.reference();
        self.entries.push(entry);
        Ok(reference)
    }

    fn contains(&self, reference: &Reference) -> bool {
        self.full_urls.contains(&reference.reference_string())
    }
}

/// Assemble `graph` into a document Bundle stamped at `now`.
pub fn assemble(
    graph: ResourceGraph,
    now: DateTime<Utc>,
    config: &PipelineConfig,
) -> Result<Bundle, AssemblyError> {
    let ResourceGraph {
        kind,
        document_id,
        status,
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
        mut detail,
    } = graph;

    let mut collector = EntryCollector::default();
    collector.push(ClinicalResource::Patient(patient))?;
    let author_ref = collector.push(ClinicalResource::Practitioner(author))?;
    let organization_ref = collector.push(ClinicalResource::Organization(organization))?;

    if let DocumentDetail::Referral { destination, .. } = &mut detail
        && let Some(destination) = destination.take()
    {
        collector.push(ClinicalResource::Organization(destination))?;
    }

    let encounter_ref = match encounter {
        Some(encounter) => Some(collector.push(ClinicalResource::Encounter(encounter))?),
        None => None,
    };

    let drafts = section_drafts(
        detail,
        encounter_ref.clone(),
        conditions,
        medications,
        allergies,
        observations,
    );

    let mut sections = Vec::new();
    for draft in drafts.into_iter().filter(|d| !d.is_empty()) {
        let narrative = draft
            .narrative
            .clone()
            .or_else(|| summarize(&draft.resources));
        let mut entry = draft.existing;
        for resource in draft.resources {
            entry.push(collector.push(resource)?);
        }
        sections.push(Section {
            title: draft.kind.title().to_string(),
            code: CodeableConcept::from_coding(Coding::new(
                code_system::DOCUMENT_SECTION,
                draft.kind.code(),
                Some(draft.kind.title().to_string()),
            )),
            text: narrative.as_deref().map(Narrative::generated),
            entry,
        });
    }

    let identifier = Identifier::new(
        id_system::RESOURCE_INSTANCE,
        format!("{}^{}^{}", facility_code, created_at.year(), document_id),
    );

    let composition = Composition {
        id: Uuid::new_v4().to_string(),
        meta: Meta::profile(kind.composition_profile()),
        identifier: identifier.clone(),
        status,
        document_type: CodeableConcept::from_coding(Coding::new(
            code_system::DOCUMENT_TYPE,
            kind.type_code(),
            Some(kind.title().to_string()),
        )),
        subject,
        encounter: encounter_ref,
        date: timestamp(&created_at),
        author: vec![author_ref, organization_ref.clone()],
        title: kind.title().to_string(),
        custodian: Some(organization_ref),
        section: sections,
    };

    verify_composition(&composition, &collector)?;
    verify_references(&collector)?;

    let composition_entry = BundleEntry::new(ClinicalResource::Composition(composition));
    if collector.full_urls.contains(&composition_entry.full_url) {
        return Err(AssemblyError::DuplicateFullUrl(composition_entry.full_url));
    }
    let mut entry = Vec::with_capacity(collector.entries.len() + 1);
    entry.push(composition_entry);
    entry.extend(collector.entries);

    let stamped = timestamp(&now.with_timezone(&config.offset()));
    debug!(
        document_type = %kind,
        entries = entry.len(),
        "Document assembled"
    );

    Ok(Bundle {
        id: Uuid::new_v4().to_string(),
        meta: Meta {
            last_updated: Some(stamped.clone()),
            profile: vec![kind.bundle_profile().to_string()],
        },
        identifier,
        bundle_type: "document".to_string(),
        timestamp: stamped,
        entry,
    })
}

fn section_drafts(
    detail: DocumentDetail,
    encounter: Option<Reference>,
    conditions: Vec<Condition>,
    medications: Vec<MedicationRequest>,
    allergies: Vec<AllergyIntolerance>,
    observations: Vec<Observation>,
) -> Vec<SectionDraft> {
    let medications: Vec<_> = medications
        .into_iter()
        .map(ClinicalResource::MedicationRequest)
        .collect();
    let allergies: Vec<_> = allergies
        .into_iter()
        .map(ClinicalResource::AllergyIntolerance)
        .collect();
    let observations: Vec<_> = observations
        .into_iter()
        .map(ClinicalResource::Observation)
        .collect();
    let conditions: Vec<_> = conditions
        .into_iter()
        .map(ClinicalResource::Condition)
        .collect();

    match detail {
        DocumentDetail::Referral {
            reason,
            present_illness,
            services,
            ..
        } => vec![
            SectionDraft::narrative(
                SectionKind::ReferralReason,
                Some(reason).filter(|r| !r.is_empty()),
            ),
            SectionDraft::narrative(SectionKind::PresentIllness, present_illness),
            SectionDraft::entries(SectionKind::ProblemList, conditions),
            SectionDraft::entries(SectionKind::CurrentMedications, medications),
            SectionDraft::entries(SectionKind::Allergies, allergies),
            SectionDraft::entries(SectionKind::LabResults, observations),
            SectionDraft::entries(
                SectionKind::RequestedServices,
                services
                    .into_iter()
                    .map(ClinicalResource::ServiceRequest)
                    .collect(),
            ),
        ],
        DocumentDetail::DischargeSummary {
            principal_diagnosis,
            secondary_diagnoses,
            procedures,
            hospital_course,
        } => vec![
            SectionDraft {
                kind: SectionKind::AdmissionDetail,
                narrative: None,
                resources: Vec::new(),
                existing: encounter.into_iter().collect(),
            },
            SectionDraft::entries(
                SectionKind::PrincipalDiagnosis,
                vec![ClinicalResource::Condition(principal_diagnosis)],
            ),
            SectionDraft::entries(
                SectionKind::SecondaryDiagnoses,
                secondary_diagnoses
                    .into_iter()
                    .map(ClinicalResource::Condition)
                    .collect(),
            ),
            SectionDraft::narrative(SectionKind::HospitalCourse, hospital_course),
            SectionDraft::entries(
                SectionKind::Procedures,
                procedures
                    .into_iter()
                    .map(ClinicalResource::Procedure)
                    .collect(),
            ),
            SectionDraft::entries(SectionKind::DischargeMedications, medications),
            SectionDraft::entries(SectionKind::Allergies, allergies),
            SectionDraft::entries(SectionKind::LabResults, observations),
        ],
        DocumentDetail::Checkup {
            checkup_type,
            overall_assessment,
            findings,
            recommendations,
        } => {
            let assessment = ClinicalResource::Observation(overall_assessment);
            let narrative = summary_line(&assessment)
                .map(|line| format!("健診種別: {}\n{}", checkup_type, line));
            vec![
                SectionDraft {
                    kind: SectionKind::OverallAssessment,
                    narrative,
                    resources: vec![assessment],
                    existing: Vec::new(),
                },
                SectionDraft::entries(SectionKind::CheckupResults, observations),
                SectionDraft::entries(
                    SectionKind::Findings,
                    findings.into_iter().map(ClinicalResource::Condition).collect(),
                ),
                SectionDraft::narrative(SectionKind::Recommendations, recommendations),
            ]
        }
    }
}

fn verify_composition(
    composition: &Composition,
    collector: &EntryCollector,
) -> Result<(), AssemblyError> {
    let fields = std::iter::once(("subject", &composition.subject))
        .chain(composition.encounter.iter().map(|r| ("encounter", r)))
        .chain(composition.author.iter().map(|r| ("author", r)))
        .chain(composition.custodian.iter().map(|r| ("custodian", r)));
    for (field, reference) in fields {
        if reference.is_local() && !collector.contains(reference) {
            return Err(AssemblyError::DanglingCompositionReference {
                field,
                reference: reference.reference_string(),
            });
        }
    }

    for section in &composition.section {
        for reference in &section.entry {
            if !collector.contains(reference) {
                return Err(AssemblyError::DanglingSectionEntry {
                    section: section.title.clone(),
                    reference: reference.reference_string(),
                });
            }
        }
    }
    Ok(())
}

fn verify_references(collector: &EntryCollector) -> Result<(), AssemblyError> {
    for entry in &collector.entries {
        for reference in entry.resource.references() {
            if reference.is_local() && !collector.contains(reference) {
                return Err(AssemblyError::DanglingReference {
                    resource: format!("{}/{}", entry.resource.resource_type(), entry.resource.id()),
                    reference: reference.reference_string(),
                });
            }
        }
    }
    Ok(())
}

/// One narrative line per resource, for sections without free text.
fn summarize(resources: &[ClinicalResource]) -> Option<String> {
    let lines: Vec<String> = resources.iter().filter_map(summary_line).collect();
    (!lines.is_empty()).then(|| lines.join("\n"))
}

fn summary_line(resource: &ClinicalResource) -> Option<String> {
    match resource {
        ClinicalResource::Condition(c) => concept_label(&c.code),
        ClinicalResource::MedicationRequest(m) => {
            let label = concept_label(&m.medication_codeable_concept)?;
            match m.dosage_instruction.first().and_then(|d| d.text.as_deref()) {
                Some(dosage) => Some(format!("{} {}", label, dosage)),
                None => Some(label),
            }
        }
        ClinicalResource::AllergyIntolerance(a) => concept_label(&a.code),
        ClinicalResource::Observation(o) => {
            let label = concept_label(&o.code)?;
            let value = match &o.value {
                Some(ObservationValue::Quantity(q)) => match &q.unit {
                    Some(unit) => Some(format!("{} {}", q.value, unit)),
                    None => Some(q.value.to_string()),
                },
                Some(ObservationValue::String(s)) => Some(s.clone()),
                Some(ObservationValue::CodeableConcept(c)) => concept_label(c),
                None => None,
            };
            match value {
                Some(value) => Some(format!("{}: {}", label, value)),
                None => Some(label),
            }
        }
        ClinicalResource::Procedure(p) => concept_label(&p.code),
        ClinicalResource::ServiceRequest(s) => concept_label(&s.code),
        _ => None,
    }
}

fn concept_label(concept: &CodeableConcept) -> Option<String> {
    concept.text.clone().or_else(|| {
        concept.coding.first().map(|c| {
            c.display
                .clone()
                .or_else(|| c.code.clone())
                .unwrap_or_default()
        })
    })
}
