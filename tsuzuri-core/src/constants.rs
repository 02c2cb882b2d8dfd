//! Read-only lookup tables: profile URLs, code systems, identifier systems
//! and document section codes used by the JP-CLINS document profiles.

pub const FHIR_VERSION: &str = "4.0.1";

/// Bundle profiles, one per document kind.
pub mod profile {
    pub const REFERRAL_BUNDLE: &str =
        "http://jpfhir.jp/fhir/eReferral/StructureDefinition/JP_Bundle_eReferral";
    pub const DISCHARGE_SUMMARY_BUNDLE: &str =
        "http://jpfhir.jp/fhir/eDischargeSummary/StructureDefinition/JP_Bundle_eDischargeSummary";
    pub const CHECKUP_BUNDLE: &str =
        "http://jpfhir.jp/fhir/eCheckup/StructureDefinition/JP_Bundle_eCheckupGeneral";

    pub const REFERRAL_COMPOSITION: &str =
        "http://jpfhir.jp/fhir/eReferral/StructureDefinition/JP_Composition_eReferral";
    pub const DISCHARGE_SUMMARY_COMPOSITION: &str =
        "http://jpfhir.jp/fhir/eDischargeSummary/StructureDefinition/JP_Composition_eDischargeSummary";
    pub const CHECKUP_COMPOSITION: &str =
        "http://jpfhir.jp/fhir/eCheckup/StructureDefinition/JP_Composition_eCheckupGeneral";

    pub const JP_PATIENT: &str = "http://jpfhir.jp/fhir/core/StructureDefinition/JP_Patient";
    pub const JP_PRACTITIONER: &str =
        "http://jpfhir.jp/fhir/core/StructureDefinition/JP_Practitioner";
    pub const JP_ORGANIZATION: &str =
        "http://jpfhir.jp/fhir/core/StructureDefinition/JP_Organization";
    pub const JP_ENCOUNTER: &str = "http://jpfhir.jp/fhir/core/StructureDefinition/JP_Encounter";
    pub const JP_CONDITION: &str = "http://jpfhir.jp/fhir/core/StructureDefinition/JP_Condition";
    pub const JP_OBSERVATION_COMMON: &str =
        "http://jpfhir.jp/fhir/core/StructureDefinition/JP_Observation_Common";
    pub const JP_OBSERVATION_LAB: &str =
        "http://jpfhir.jp/fhir/core/StructureDefinition/JP_Observation_LabResult";
    pub const JP_MEDICATION_REQUEST: &str =
        "http://jpfhir.jp/fhir/core/StructureDefinition/JP_MedicationRequest";
    pub const JP_ALLERGY_INTOLERANCE: &str =
        "http://jpfhir.jp/fhir/core/StructureDefinition/JP_AllergyIntolerance";
    pub const JP_PROCEDURE: &str = "http://jpfhir.jp/fhir/core/StructureDefinition/JP_Procedure";

    /// Document bundle profiles accepted by the compliance validator.
    pub const DOCUMENT_BUNDLE_PROFILES: [&str; 3] =
        [REFERRAL_BUNDLE, DISCHARGE_SUMMARY_BUNDLE, CHECKUP_BUNDLE];
}

/// Coding system URIs.
pub mod code_system {
    pub const ICD10: &str = "http://hl7.org/fhir/sid/icd-10";
    pub const ICD10_JP: &str = "http://jpfhir.jp/fhir/core/CodeSystem/icd-10-jp";
    pub const MEDIS_DISEASE: &str = "urn:oid:1.2.392.200119.4.101.6";

    pub const HOT9: &str = "urn:oid:1.2.392.200119.4.403.1";
    pub const HOT13: &str = "urn:oid:1.2.392.200119.4.402.1";
    pub const YJ: &str = "urn:oid:1.2.392.100495.20.1.73";
    pub const RECEIPT_MEDICATION: &str = "urn:oid:1.2.392.100495.20.2.74";

    pub const JLAC10: &str = "urn:oid:1.2.392.200119.4.504";
    pub const JLAC11: &str =
        "http://jpfhir.jp/fhir/core/CodeSystem/JP_ObservationLabResultCode_CS";
    pub const LOINC: &str = "http://loinc.org";

    pub const DOCUMENT_TYPE: &str = "http://jpfhir.jp/fhir/Common/CodeSystem/doc-typecodes";
    pub const DOCUMENT_SECTION: &str =
        "http://jpfhir.jp/fhir/clins/CodeSystem/document-section";

    pub const CONDITION_CLINICAL: &str =
        "http://terminology.hl7.org/CodeSystem/condition-clinical";
    pub const CONDITION_VERIFICATION: &str =
        "http://terminology.hl7.org/CodeSystem/condition-ver-status";
    pub const CONDITION_CATEGORY: &str =
        "http://terminology.hl7.org/CodeSystem/condition-category";
    pub const ALLERGY_CLINICAL: &str =
        "http://terminology.hl7.org/CodeSystem/allergyintolerance-clinical";
    pub const OBSERVATION_CATEGORY: &str =
        "http://terminology.hl7.org/CodeSystem/observation-category";
    pub const ACT_CODE: &str = "http://terminology.hl7.org/CodeSystem/v3-ActCode";
    pub const DISCHARGE_DISPOSITION: &str =
        "http://terminology.hl7.org/CodeSystem/discharge-disposition";
    pub const UCUM: &str = "http://unitsofmeasure.org";

    /// Diagnoses must carry at least one coding from these systems.
    pub const DIAGNOSIS_SYSTEMS: [&str; 3] = [ICD10, ICD10_JP, MEDIS_DISEASE];
    /// Medications must carry at least one coding from these systems.
    pub const MEDICATION_SYSTEMS: [&str; 4] = [HOT9, HOT13, YJ, RECEIPT_MEDICATION];
    /// Lab results and requested services.
    pub const LAB_SYSTEMS: [&str; 3] = [JLAC10, JLAC11, LOINC];
}

/// Identifier system URIs.
pub mod id_system {
    /// Patient ids are scoped by the issuing facility: append the 10-digit facility code.
    pub const PATIENT_PREFIX: &str = "urn:oid:1.2.392.100495.20.3.51.1";
    pub const MEDICAL_LICENSE: &str = "urn:oid:1.2.392.100495.20.3.31";
    pub const FACILITY: &str =
        "http://jpfhir.jp/fhir/core/IdSystem/insurance-medical-institution-no";
    pub const INSURER: &str = "urn:oid:1.2.392.100495.20.3.61";
    pub const RESOURCE_INSTANCE: &str =
        "http://jpfhir.jp/fhir/core/IdSystem/resourceInstance-identifier";
}

/// Value sets for categorical input fields. Membership is checked case-insensitively.
pub mod value_set {
    pub const ADMINISTRATIVE_GENDER: &str = "http://hl7.org/fhir/ValueSet/administrative-gender";
    pub const COMPOSITION_STATUS: &str = "http://hl7.org/fhir/ValueSet/composition-status";
    pub const REQUEST_PRIORITY: &str = "http://hl7.org/fhir/ValueSet/request-priority";
    pub const CONDITION_CLINICAL: &str = "http://hl7.org/fhir/ValueSet/condition-clinical";
    pub const CONDITION_VERIFICATION: &str = "http://hl7.org/fhir/ValueSet/condition-ver-status";
    pub const ALLERGY_CLINICAL: &str = "http://hl7.org/fhir/ValueSet/allergyintolerance-clinical";
    pub const ALLERGY_CATEGORY: &str = "http://hl7.org/fhir/ValueSet/allergy-intolerance-category";
    pub const ALLERGY_CRITICALITY: &str =
        "http://hl7.org/fhir/ValueSet/allergy-intolerance-criticality";
    pub const MEDICATION_REQUEST_STATUS: &str =
        "http://hl7.org/fhir/ValueSet/medicationrequest-status";
    pub const OBSERVATION_STATUS: &str = "http://hl7.org/fhir/ValueSet/observation-status";
    pub const OBSERVATION_CATEGORY: &str = "http://hl7.org/fhir/ValueSet/observation-category";
    pub const EVENT_STATUS: &str = "http://hl7.org/fhir/ValueSet/event-status";
    pub const DISCHARGE_DISPOSITION: &str =
        "http://hl7.org/fhir/ValueSet/encounter-discharge-disposition";
    pub const CHECKUP_TYPE: &str = "http://jpfhir.jp/fhir/eCheckup/ValueSet/checkup-type";
}

pub mod extension {
    pub const NAME_REPRESENTATION: &str =
        "http://hl7.org/fhir/StructureDefinition/iso21090-EN-representation";
}
