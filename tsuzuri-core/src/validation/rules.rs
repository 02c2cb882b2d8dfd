//! Business rules for input records.
//!
//! Errors block the transform: missing mandatory data, unparseable or
//! impossible dates, date ordering. Everything about coding systems, code
//! formats, enumerations, identifier formats and narrative length is a warning.

use chrono::NaiveDate;
use tracing::debug;

use crate::constants::value_set;
use crate::era::parse_date;
use crate::input::{
    AllergyInput, CheckupInput, ConceptInput, ConditionInput, DischargeSummaryInput,
    DocumentHeader, InputRecord, MedicationInput, ObservationInput, ObservationValueInput,
    ProcedureInput, ReferralInput, ServiceRequestInput,
};
use crate::text::is_katakana;
use crate::validation::compliance::is_absolute_uri;
use crate::validation::format::{
    is_valid_facility_code, is_valid_insurer_number, is_valid_license_number,
    is_valid_phone_number, is_valid_postal_code,
};
use crate::validation::narrative::check_narrative;
use crate::validation::terminology::{CodingRole, check_concept};
use crate::validation::{ValidationContext, ValidationResult};

/// Run the universal rules and the rules of the record's document type.
pub fn validate_input(input: &InputRecord, ctx: &ValidationContext<'_>) -> ValidationResult {
    let mut result = ValidationResult::new();

    validate_universal(input.header(), ctx, &mut result);
    match input {
        InputRecord::Referral(referral) => validate_referral(referral, ctx, &mut result),
        InputRecord::DischargeSummary(summary) => {
            validate_discharge_summary(summary, ctx, &mut result)
        }
        InputRecord::Checkup(checkup) => validate_checkup(checkup, ctx, &mut result),
    }

    debug!(
        document_type = %input.kind(),
        errors = result.errors().len(),
        warnings = result.warnings().len(),
        "Input validation finished"
    );
    result
}

/// Rules every document type shares: ids, status, timestamps and the
/// patient/author/organization blocks.
pub fn validate_universal(
    header: &DocumentHeader,
    ctx: &ValidationContext<'_>,
    result: &mut ValidationResult,
) {
    require_text(&header.document_id, "header.documentId", result);
    if require_text(&header.status, "header.status", result) {
        ctx.terminology.check_code(
            value_set::COMPOSITION_STATUS,
            &header.status,
            "header.status",
            result,
        );
    }
    require_text(&header.patient.id, "header.patient.id", result);
    require_text(&header.author.id, "header.author.id", result);
    require_text(&header.organization.id, "header.organization.id", result);

    if header.created_at > ctx.now {
        result.error(format!(
            "header.createdAt: {} is in the future",
            header.created_at.to_rfc3339()
        ));
    }
    if let Some(last_modified) = header.last_modified {
        if last_modified > ctx.now {
            result.error(format!(
                "header.lastModified: {} is in the future",
                last_modified.to_rfc3339()
            ));
        } else if last_modified < header.created_at {
            result.error(format!(
                "header.lastModified: {} is before createdAt {}",
                last_modified.to_rfc3339(),
                header.created_at.to_rfc3339()
            ));
        }
    }

    let patient = &header.patient;
    if let Some(birth_date) = patient.birth_date.as_deref() {
        check_date(birth_date, "header.patient.birthDate", ctx, result);
    }
    if let Some(gender) = patient.gender.as_deref() {
        ctx.terminology.check_code(
            value_set::ADMINISTRATIVE_GENDER,
            gender,
            "header.patient.gender",
            result,
        );
    }
    if patient.family_name.is_none() && patient.given_name.is_none() {
        result.warning("header.patient: no name given");
    }
    for (value, path) in [
        (&patient.family_name_kana, "header.patient.familyNameKana"),
        (&patient.given_name_kana, "header.patient.givenNameKana"),
    ] {
        if let Some(kana) = value.as_deref()
            && !is_katakana(kana)
        {
            result.warning(format!("{}: '{}' is not written in katakana", path, kana));
        }
    }
    if let Some(insurer) = patient.insurer_number.as_deref()
        && !is_valid_insurer_number(insurer)
    {
        result.warning(format!(
            "header.patient.insurerNumber: '{}' is not a valid insurer number",
            insurer
        ));
    }
    check_postal(patient.postal_code.as_deref(), "header.patient.postalCode", result);
    check_phone(patient.phone.as_deref(), "header.patient.phone", result);

    let author = &header.author;
    match author.license_number.as_deref() {
        Some(license) if !is_valid_license_number(license) => result.warning(format!(
            "header.author.licenseNumber: '{}' is not a valid license number",
            license
        )),
        Some(_) => {}
        None => result.warning("header.author.licenseNumber: not given"),
    }
    check_phone(author.phone.as_deref(), "header.author.phone", result);

    let organization = &header.organization;
    if !organization.id.trim().is_empty() {
        check_facility(&organization.id, "header.organization.id", ctx, result);
    }
    if organization.name.trim().is_empty() {
        result.warning("header.organization.name: not given");
    }
    check_postal(
        organization.postal_code.as_deref(),
        "header.organization.postalCode",
        result,
    );
    check_phone(organization.phone.as_deref(), "header.organization.phone", result);
}

pub fn validate_referral(
    referral: &ReferralInput,
    ctx: &ValidationContext<'_>,
    result: &mut ValidationResult,
) {
    if require_text(&referral.reason, "referral.reason", result) {
        check_narrative("reason", "referral.reason", &referral.reason, ctx.config, result);
    }

    if referral.requested_services.is_empty() {
        result.error("referral.requestedServices: at least one requested service is required");
    }
    for (idx, service) in referral.requested_services.iter().enumerate() {
        check_service(service, &format!("referral.requestedServices[{}]", idx), ctx, result);
    }

    match referral.urgency.as_deref() {
        Some(urgency) => ctx.terminology.check_code(
            value_set::REQUEST_PRIORITY,
            urgency,
            "referral.urgency",
            result,
        ),
        None => result.warning("referral.urgency: not given"),
    }

    if let Some(destination) = &referral.destination {
        if destination.name.trim().is_empty() {
            result.warning("referral.destination.name: not given");
        }
        if let Some(code) = destination.facility_code.as_deref() {
            check_facility(code, "referral.destination.facilityCode", ctx, result);
        }
        if let Some(uri) = destination.reference.as_deref()
            && !is_absolute_uri(uri.trim())
        {
            result.error(format!(
                "referral.destination.reference: '{}' is not a valid absolute URI",
                uri
            ));
        }
    }

    if let Some(text) = referral.present_illness.as_deref() {
        check_narrative("presentIllness", "referral.presentIllness", text, ctx.config, result);
    }

    check_clinical_lists(
        "referral",
        &referral.conditions,
        &referral.medications,
        &referral.allergies,
        &referral.observations,
        ctx,
        result,
    );
}

pub fn validate_discharge_summary(
    summary: &DischargeSummaryInput,
    ctx: &ValidationContext<'_>,
    result: &mut ValidationResult,
) {
    let admission = required_date(
        &summary.admission_date,
        "dischargeSummary.admissionDate",
        ctx,
        result,
    );
    let discharge = required_date(
        &summary.discharge_date,
        "dischargeSummary.dischargeDate",
        ctx,
        result,
    );
    if let (Some(admission), Some(discharge)) = (admission, discharge)
        && admission >= discharge
    {
        result.error(format!(
            "dischargeSummary.admissionDate: date ordering violated, admission {} must be before discharge {}",
            admission, discharge
        ));
    }

    match &summary.principal_diagnosis {
        Some(diagnosis) => check_condition(
            diagnosis,
            "dischargeSummary.principalDiagnosis",
            ctx,
            result,
        ),
        None => result.error("dischargeSummary.principalDiagnosis: must be given"),
    }
    for (idx, diagnosis) in summary.secondary_diagnoses.iter().enumerate() {
        check_condition(
            diagnosis,
            &format!("dischargeSummary.secondaryDiagnoses[{}]", idx),
            ctx,
            result,
        );
    }
    for (idx, procedure) in summary.procedures.iter().enumerate() {
        check_procedure(
            procedure,
            &format!("dischargeSummary.procedures[{}]", idx),
            ctx,
            result,
        );
    }

    if let Some(text) = summary.hospital_course.as_deref() {
        check_narrative(
            "hospitalCourse",
            "dischargeSummary.hospitalCourse",
            text,
            ctx.config,
            result,
        );
    }
    if let Some(disposition) = summary.discharge_disposition.as_deref() {
        ctx.terminology.check_code(
            value_set::DISCHARGE_DISPOSITION,
            disposition,
            "dischargeSummary.dischargeDisposition",
            result,
        );
    }

    check_clinical_lists(
        "dischargeSummary",
        &[],
        &summary.medications,
        &summary.allergies,
        &summary.observations,
        ctx,
        result,
    );
}

pub fn validate_checkup(
    checkup: &CheckupInput,
    ctx: &ValidationContext<'_>,
    result: &mut ValidationResult,
) {
    required_date(&checkup.checkup_date, "checkup.checkupDate", ctx, result);

    if require_text(&checkup.checkup_type, "checkup.checkupType", result) {
        ctx.terminology.check_code(
            value_set::CHECKUP_TYPE,
            &checkup.checkup_type,
            "checkup.checkupType",
            result,
        );
    }

    match &checkup.overall_assessment {
        Some(assessment) => require_concept(assessment, "checkup.overallAssessment", None, result),
        None => result.error("checkup.overallAssessment: must be given"),
    }

    if let Some(text) = checkup.recommendations.as_deref() {
        check_narrative("recommendations", "checkup.recommendations", text, ctx.config, result);
    }

    for (idx, finding) in checkup.findings.iter().enumerate() {
        check_condition(finding, &format!("checkup.findings[{}]", idx), ctx, result);
    }
    for (idx, observation) in checkup.observations.iter().enumerate() {
        check_observation(
            observation,
            &format!("checkup.observations[{}]", idx),
            ctx,
            result,
        );
    }
}

fn check_clinical_lists(
    prefix: &str,
    conditions: &[ConditionInput],
    medications: &[MedicationInput],
    allergies: &[AllergyInput],
    observations: &[ObservationInput],
    ctx: &ValidationContext<'_>,
    result: &mut ValidationResult,
) {
    for (idx, condition) in conditions.iter().enumerate() {
        check_condition(condition, &format!("{}.conditions[{}]", prefix, idx), ctx, result);
    }
    for (idx, medication) in medications.iter().enumerate() {
        check_medication(medication, &format!("{}.medications[{}]", prefix, idx), ctx, result);
    }
    for (idx, allergy) in allergies.iter().enumerate() {
        check_allergy(allergy, &format!("{}.allergies[{}]", prefix, idx), ctx, result);
    }
    for (idx, observation) in observations.iter().enumerate() {
        check_observation(
            observation,
            &format!("{}.observations[{}]", prefix, idx),
            ctx,
            result,
        );
    }
}

fn check_condition(
    condition: &ConditionInput,
    path: &str,
    ctx: &ValidationContext<'_>,
    result: &mut ValidationResult,
) {
    require_concept(
        &condition.code,
        &format!("{}.code", path),
        Some(CodingRole::Diagnosis),
        result,
    );
    if let Some(status) = condition.clinical_status.as_deref() {
        ctx.terminology.check_code(
            value_set::CONDITION_CLINICAL,
            status,
            &format!("{}.clinicalStatus", path),
            result,
        );
    }
    if let Some(status) = condition.verification_status.as_deref() {
        ctx.terminology.check_code(
            value_set::CONDITION_VERIFICATION,
            status,
            &format!("{}.verificationStatus", path),
            result,
        );
    }
    if let Some(onset) = condition.onset_date.as_deref() {
        check_date(onset, &format!("{}.onsetDate", path), ctx, result);
    }
    if let Some(note) = condition.note.as_deref() {
        check_narrative("note", &format!("{}.note", path), note, ctx.config, result);
    }
}

fn check_medication(
    medication: &MedicationInput,
    path: &str,
    ctx: &ValidationContext<'_>,
    result: &mut ValidationResult,
) {
    require_concept(
        &medication.medication,
        &format!("{}.medication", path),
        Some(CodingRole::Medication),
        result,
    );
    ctx.terminology.check_code(
        value_set::MEDICATION_REQUEST_STATUS,
        &medication.status,
        &format!("{}.status", path),
        result,
    );
    if let Some(text) = medication.dosage_text.as_deref() {
        check_narrative(
            "dosageText",
            &format!("{}.dosageText", path),
            text,
            ctx.config,
            result,
        );
    }
    if let Some(dose) = &medication.dose
        && !(dose.value.is_finite() && dose.value > 0.0)
    {
        result.warning(format!(
            "{}.dose: {} is not a positive quantity",
            path, dose.value
        ));
    }
    if medication.duration_days == Some(0) {
        result.warning(format!("{}.durationDays: must be at least 1", path));
    }
    if let Some(authored_on) = medication.authored_on.as_deref() {
        check_date(authored_on, &format!("{}.authoredOn", path), ctx, result);
    }
}

fn check_allergy(
    allergy: &AllergyInput,
    path: &str,
    ctx: &ValidationContext<'_>,
    result: &mut ValidationResult,
) {
    require_concept(&allergy.substance, &format!("{}.substance", path), None, result);
    for (value, value_set_url, field) in [
        (&allergy.clinical_status, value_set::ALLERGY_CLINICAL, "clinicalStatus"),
        (&allergy.category, value_set::ALLERGY_CATEGORY, "category"),
        (&allergy.criticality, value_set::ALLERGY_CRITICALITY, "criticality"),
    ] {
        if let Some(value) = value.as_deref() {
            ctx.terminology.check_code(
                value_set_url,
                value,
                &format!("{}.{}", path, field),
                result,
            );
        }
    }
    if let Some(reaction) = allergy.reaction.as_deref() {
        check_narrative("note", &format!("{}.reaction", path), reaction, ctx.config, result);
    }
}

fn check_observation(
    observation: &ObservationInput,
    path: &str,
    ctx: &ValidationContext<'_>,
    result: &mut ValidationResult,
) {
    require_concept(
        &observation.code,
        &format!("{}.code", path),
        Some(CodingRole::LabOrService),
        result,
    );
    ctx.terminology.check_code(
        value_set::OBSERVATION_STATUS,
        &observation.status,
        &format!("{}.status", path),
        result,
    );
    if let Some(category) = observation.category.as_deref() {
        ctx.terminology.check_code(
            value_set::OBSERVATION_CATEGORY,
            category,
            &format!("{}.category", path),
            result,
        );
    }
    if let Some(effective) = observation.effective_date.as_deref() {
        check_date(effective, &format!("{}.effectiveDate", path), ctx, result);
    }
    match &observation.value {
        Some(ObservationValueInput::Quantity(q)) if !q.value.is_finite() => {
            result.error(format!("{}.value: {} is not a finite number", path, q.value));
        }
        Some(ObservationValueInput::Concept(concept)) => {
            check_concept(concept, &format!("{}.value", path), None, result);
        }
        _ => {}
    }
}

fn check_procedure(
    procedure: &ProcedureInput,
    path: &str,
    ctx: &ValidationContext<'_>,
    result: &mut ValidationResult,
) {
    require_concept(&procedure.code, &format!("{}.code", path), None, result);
    ctx.terminology.check_code(
        value_set::EVENT_STATUS,
        &procedure.status,
        &format!("{}.status", path),
        result,
    );
    if let Some(performed) = procedure.performed_date.as_deref() {
        check_date(performed, &format!("{}.performedDate", path), ctx, result);
    }
}

fn check_service(
    service: &ServiceRequestInput,
    path: &str,
    ctx: &ValidationContext<'_>,
    result: &mut ValidationResult,
) {
    require_concept(
        &service.code,
        &format!("{}.code", path),
        Some(CodingRole::LabOrService),
        result,
    );
    if let Some(priority) = service.priority.as_deref() {
        ctx.terminology.check_code(
            value_set::REQUEST_PRIORITY,
            priority,
            &format!("{}.priority", path),
            result,
        );
    }
    if let Some(note) = service.note.as_deref() {
        check_narrative("note", &format!("{}.note", path), note, ctx.config, result);
    }
}

/// Error when `value` is blank. Returns whether it was given.
fn require_text(value: &str, path: &str, result: &mut ValidationResult) -> bool {
    if value.trim().is_empty() {
        result.error(format!("{}: must not be empty", path));
        false
    } else {
        true
    }
}

/// Error when the concept has neither a coding nor text, then the advisory checks.
fn require_concept(
    concept: &ConceptInput,
    path: &str,
    role: Option<CodingRole>,
    result: &mut ValidationResult,
) {
    if concept.is_blank() {
        result.error(format!("{}: must have a coding or text", path));
        return;
    }
    check_concept(concept, path, role, result);
}

/// Parse a date and reject future dates. Errors are recorded, not returned.
fn check_date(
    raw: &str,
    path: &str,
    ctx: &ValidationContext<'_>,
    result: &mut ValidationResult,
) -> Option<NaiveDate> {
    match parse_date(raw) {
        Ok(date) if date > ctx.today() => {
            result.error(format!("{}: {} is in the future", path, date));
            None
        }
        Ok(date) => Some(date),
        Err(e) => {
            result.error(format!("{}: {}", path, e));
            None
        }
    }
}

fn required_date(
    raw: &str,
    path: &str,
    ctx: &ValidationContext<'_>,
    result: &mut ValidationResult,
) -> Option<NaiveDate> {
    if require_text(raw, path, result) {
        check_date(raw, path, ctx, result)
    } else {
        None
    }
}

fn check_postal(value: Option<&str>, path: &str, result: &mut ValidationResult) {
    if let Some(postal) = value
        && !is_valid_postal_code(postal)
    {
        result.warning(format!("{}: '{}' is not a valid postal code", path, postal));
    }
}

fn check_phone(value: Option<&str>, path: &str, result: &mut ValidationResult) {
    if let Some(phone) = value
        && !is_valid_phone_number(phone)
    {
        result.warning(format!("{}: '{}' is not a valid phone number", path, phone));
    }
}

fn check_facility(
    code: &str,
    path: &str,
    ctx: &ValidationContext<'_>,
    result: &mut ValidationResult,
) {
    if !is_valid_facility_code(code, ctx.config.facility_code_length) {
        result.warning(format!(
            "{}: '{}' is not a valid {}-digit facility code",
            path, code, ctx.config.facility_code_length
        ));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PipelineConfig;
    use crate::constants::code_system;
    use crate::validation::TerminologyRegistry;
    use chrono::{TimeZone, Utc};
    use serde_json::json;

    fn header() -> serde_json::Value {
        json!({
            "documentId": "DOC-2024-001",
            "status": "final",
            "createdAt": "2024-03-12T10:00:00+09:00",
            "patient": {
                "id": "P001",
                "familyName": "山田",
                "givenName": "太郎",
                "familyNameKana": "ヤマダ",
                "givenNameKana": "タロウ",
                "gender": "male",
                "birthDate": "昭和55年4月1日"
            },
            "author": {"id": "D001", "licenseNumber": "123456"},
            "organization": {"id": "1311234567", "name": "東京中央病院"}
        })
    }

    fn validate(value: serde_json::Value) -> ValidationResult {
        let input: InputRecord = serde_json::from_value(value).unwrap();
        let config = PipelineConfig::default();
        let terminology = TerminologyRegistry::new();
        let now = Utc.with_ymd_and_hms(2024, 4, 1, 0, 0, 0).unwrap();
        validate_input(&input, &ValidationContext::new(now, &config, &terminology))
    }

    fn referral() -> serde_json::Value {
        json!({
            "documentType": "referral",
            "header": header(),
            "reason": "abdominal pain work-up",
            "urgency": "routine",
            "requestedServices": [
                {"code": {"coding": [{"system": code_system::LOINC, "code": "24356-8"}]}}
            ]
        })
    }

    fn discharge(admission: &str, discharge: &str) -> serde_json::Value {
        json!({
            "documentType": "discharge-summary",
            "header": header(),
            "admissionDate": admission,
            "dischargeDate": discharge,
            "principalDiagnosis": {
                "code": {"coding": [{"system": code_system::ICD10, "code": "K35.8"}], "text": "急性虫垂炎"}
            }
        })
    }

    #[test]
    fn test_clean_referral() {
        let result = validate(referral());
        assert!(result.is_valid(), "{:?}", result.errors());
        assert!(result.warnings().is_empty(), "{:?}", result.warnings());
    }

    #[test]
    fn test_referral_without_reason_or_services() {
        let mut value = referral();
        value["reason"] = json!("   ");
        value["requestedServices"] = json!([]);
        let result = validate(value);
        assert_eq!(result.errors().len(), 2);
        assert!(result.errors()[0].starts_with("referral.reason:"));
        assert!(result.errors()[1].starts_with("referral.requestedServices:"));
    }

    #[test]
    fn test_universal_errors_are_aggregated() {
        let mut value = referral();
        value["header"]["documentId"] = json!("");
        value["header"]["patient"]["id"] = json!("");
        value["header"]["createdAt"] = json!("2030-01-01T00:00:00+09:00");
        let result = validate(value);
        assert_eq!(result.errors().len(), 3, "{:?}", result.errors());
    }

    #[test]
    fn test_last_modified_before_created() {
        let mut value = referral();
        value["header"]["lastModified"] = json!("2024-03-11T10:00:00+09:00");
        let result = validate(value);
        assert_eq!(result.errors().len(), 1);
        assert!(result.errors()[0].starts_with("header.lastModified:"));
    }

    #[test]
    fn test_future_last_modified() {
        let mut value = referral();
        value["header"]["lastModified"] = json!("2099-01-01T00:00:00+09:00");
        let result = validate(value);
        assert_eq!(result.errors().len(), 1, "{:?}", result.errors());
        assert!(result.errors()[0].starts_with("header.lastModified:"));
        assert!(result.errors()[0].contains("in the future"));

        let mut value = referral();
        value["header"]["lastModified"] = json!("2024-03-20T09:00:00+09:00");
        assert!(validate(value).is_valid());
    }

    #[test]
    fn test_destination_reference_must_be_absolute() {
        let mut value = referral();
        value["destination"] =
            json!({"name": "城北総合病院", "reference": "https://fhir.johoku.example.jp/Organization/42"});
        assert!(validate(value).is_valid());

        let mut value = referral();
        value["destination"] = json!({"name": "城北総合病院", "reference": "Organization/42"});
        let result = validate(value);
        assert_eq!(result.errors().len(), 1, "{:?}", result.errors());
        assert!(result.errors()[0].starts_with("referral.destination.reference:"));
    }

    #[test]
    fn test_future_birth_date() {
        let mut value = referral();
        value["header"]["patient"]["birthDate"] = json!("令和9年1月1日");
        let result = validate(value);
        assert_eq!(result.errors().len(), 1);
        assert!(result.errors()[0].contains("future"));
    }

    #[test]
    fn test_format_problems_are_warnings() {
        let mut value = referral();
        value["header"]["author"]["licenseNumber"] = json!("006456");
        value["header"]["organization"]["id"] = json!("9911234567");
        value["header"]["patient"]["postalCode"] = json!("12-34");
        value["header"]["patient"]["phone"] = json!("12345");
        value["header"]["patient"]["insurerNumber"] = json!("05130012");
        value["header"]["patient"]["gender"] = json!("M");
        value["urgency"] = json!("whenever");
        let result = validate(value);
        assert!(result.is_valid(), "{:?}", result.errors());
        assert_eq!(result.warnings().len(), 7, "{:?}", result.warnings());
    }

    #[test]
    fn test_enum_case_insensitive() {
        let mut value = referral();
        value["urgency"] = json!("URGENT");
        value["header"]["status"] = json!("Final");
        let result = validate(value);
        assert!(result.warnings().is_empty(), "{:?}", result.warnings());
    }

    #[test]
    fn test_text_only_service_is_warning() {
        let mut value = referral();
        value["requestedServices"] = json!([{"code": {"text": "腹部CT"}}]);
        let result = validate(value);
        assert!(result.is_valid());
        assert_eq!(result.warnings().len(), 1);
        assert!(result.warnings()[0].contains("text-only"));
    }

    #[test]
    fn test_blank_service_code_is_error() {
        let mut value = referral();
        value["requestedServices"] = json!([{"code": {}}]);
        let result = validate(value);
        assert_eq!(result.errors().len(), 1);
        assert!(result.errors()[0].starts_with("referral.requestedServices[0].code:"));
    }

    #[test]
    fn test_discharge_date_ordering() {
        let result = validate(discharge("2024-03-10", "2024-03-01"));
        assert_eq!(result.errors().len(), 1, "{:?}", result.errors());
        assert!(result.errors()[0].contains("date ordering"));
    }

    #[test]
    fn test_discharge_same_day_is_rejected() {
        let result = validate(discharge("2024-03-01", "2024-03-01"));
        assert_eq!(result.errors().len(), 1);
    }

    #[test]
    fn test_discharge_mixed_notation() {
        let result = validate(discharge("R6.2.20", "令和6年3月1日"));
        assert!(result.is_valid(), "{:?}", result.errors());
    }

    #[test]
    fn test_discharge_unparseable_and_future() {
        let result = validate(discharge("yesterday", "2030-01-01"));
        assert_eq!(result.errors().len(), 2, "{:?}", result.errors());
        assert!(result.errors()[0].starts_with("dischargeSummary.admissionDate:"));
        assert!(result.errors()[1].contains("future"));
    }

    #[test]
    fn test_discharge_missing_principal_diagnosis() {
        let mut value = discharge("2024-02-20", "2024-03-01");
        value.as_object_mut().unwrap().remove("principalDiagnosis");
        let result = validate(value);
        assert_eq!(result.errors().len(), 1);
        assert!(result.errors()[0].starts_with("dischargeSummary.principalDiagnosis:"));
    }

    #[test]
    fn test_checkup_rules() {
        let value = json!({
            "documentType": "checkup",
            "header": header(),
            "checkupDate": "",
            "checkupType": ""
        });
        let result = validate(value);
        assert_eq!(result.errors().len(), 3, "{:?}", result.errors());
    }

    #[test]
    fn test_valid_checkup() {
        let value = json!({
            "documentType": "checkup",
            "header": header(),
            "checkupDate": "R6.3.1",
            "checkupType": "specific",
            "overallAssessment": {"text": "異常なし"},
            "observations": [{
                "code": {"coding": [{"system": code_system::JLAC10, "code": "3D046000001906202"}]},
                "status": "final",
                "value": {"quantity": {"value": 5.6, "unit": "%"}}
            }]
        });
        let result = validate(value);
        assert!(result.is_valid(), "{:?}", result.errors());
        assert!(result.warnings().is_empty(), "{:?}", result.warnings());
    }

    #[test]
    fn test_long_japanese_reason_warns() {
        let mut value = referral();
        value["reason"] = json!("腹痛".repeat(300));
        let result = validate(value);
        assert!(result.is_valid());
        assert_eq!(result.warnings().len(), 1);
    }
}
