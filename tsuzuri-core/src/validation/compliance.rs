//! Structural and profile checks on a document Bundle.
//!
//! Works on the JSON form so bundles produced elsewhere can be checked too.

use serde_json::{Map, Value};
use std::collections::{HashMap, HashSet};
use std::sync::LazyLock;
use tracing::debug;

use crate::config::PipelineConfig;
use crate::model::Bundle;
use crate::validation::ValidationResult;

/// Fields each entry resource must carry (FHIR R4 min=1 plus the JP-CLINS
/// document profiles).
///
/// Data-driven; new resource types are added here.
static REQUIRED_FIELDS: LazyLock<HashMap<&str, &[&str]>> = LazyLock::new(|| {
    let mut m = HashMap::new();
    m.insert(
        "Composition",
        ["status", "type", "subject", "date", "author", "title"].as_slice(),
    );
    m.insert("Patient", ["identifier"].as_slice());
    m.insert("Organization", ["identifier"].as_slice());
    m.insert("Encounter", ["status", "class", "subject"].as_slice());
    m.insert("Condition", ["code", "subject"].as_slice());
    m.insert("Observation", ["status", "code", "subject"].as_slice());
    m.insert(
        "MedicationRequest",
        ["status", "intent", "medicationCodeableConcept", "subject"].as_slice(),
    );
    m.insert("AllergyIntolerance", ["code", "patient"].as_slice());
    m.insert("Procedure", ["status", "code", "subject"].as_slice());
    m.insert("ServiceRequest", ["status", "intent", "code", "subject"].as_slice());
    m
});

/// Serialize `bundle` and check it.
pub fn validate_bundle(bundle: &Bundle, config: &PipelineConfig) -> ValidationResult {
    match bundle.to_value() {
        Ok(value) => validate_bundle_json(&value, config),
        Err(e) => {
            let mut result = ValidationResult::new();
            result.error(format!("Bundle: cannot serialize document: {}", e));
            result
        }
    }
}

pub fn validate_bundle_json(bundle: &Value, config: &PipelineConfig) -> ValidationResult {
    let mut result = ValidationResult::new();

    if bundle.get("resourceType").and_then(Value::as_str) != Some("Bundle") {
        result.error("Bundle.resourceType: expected 'Bundle'");
        return result;
    }

    match bundle.get("type").and_then(Value::as_str) {
        Some("document") => {}
        Some(other) => result.error(format!(
            "Bundle.type: expected 'document', found '{}'",
            other
        )),
        None => result.error("Bundle.type: missing"),
    }

    check_profile(bundle, config, &mut result);

    if is_missing(bundle.get("identifier")) {
        result.error("Bundle.identifier: missing");
    }
    if is_missing(bundle.get("timestamp")) {
        result.error("Bundle.timestamp: missing");
    }

    let entries = match bundle.get("entry").and_then(Value::as_array) {
        Some(entries) if !entries.is_empty() => entries,
        _ => {
            result.error("Bundle.entry: a document must contain at least a Composition");
            return result;
        }
    };

    let index = check_entries(entries, &mut result);
    for (idx, entry) in entries.iter().enumerate() {
        if let Some(resource) = entry.get("resource") {
            let path = format!("Bundle.entry[{}].resource", idx);
            check_references(resource, &path, &index, &mut result);
        }
    }

    check_participants(&index, &mut result);

    debug!(
        entries = entries.len(),
        errors = result.errors().len(),
        warnings = result.warnings().len(),
        "Bundle compliance check finished"
    );
    result
}

fn check_profile(bundle: &Value, config: &PipelineConfig, result: &mut ValidationResult) {
    let profiles: Vec<&str> = bundle
        .pointer("/meta/profile")
        .and_then(Value::as_array)
        .map(|ps| ps.iter().filter_map(Value::as_str).collect())
        .unwrap_or_default();

    if !profiles
        .iter()
        .any(|p| config.recognized_profiles.iter().any(|r| r == p))
    {
        result.error(format!(
            "Bundle.meta.profile: no recognized document profile (found: [{}])",
            profiles.join(", ")
        ));
    }
}

/// Addresses entries can be reached by.
#[derive(Debug, Default)]
struct EntryIndex {
    full_urls: HashSet<String>,
    /// `Type/id` of every resource with an id
    relative: HashSet<String>,
    resource_types: Vec<String>,
}

fn check_entries(entries: &[Value], result: &mut ValidationResult) -> EntryIndex {
    let mut index = EntryIndex::default();
    let mut composition_seen = false;

    for (idx, entry) in entries.iter().enumerate() {
        let path = format!("Bundle.entry[{}]", idx);

        match entry.get("fullUrl").and_then(Value::as_str) {
            Some(url) if !url.trim().is_empty() => {
                if !index.full_urls.insert(url.to_string()) {
                    result.error(format!("{}.fullUrl: duplicate fullUrl '{}'", path, url));
                }
            }
            _ => result.error(format!("{}.fullUrl: missing", path)),
        }

        let Some(resource) = entry.get("resource").and_then(Value::as_object) else {
            result.error(format!("{}.resource: missing", path));
            continue;
        };

        let Some(resource_type) = resource.get("resourceType").and_then(Value::as_str) else {
            result.error(format!("{}.resource.resourceType: missing", path));
            continue;
        };

        if idx == 0 && resource_type != "Composition" {
            result.error(format!(
                "{}.resource: the first entry must be a Composition, found {}",
                path, resource_type
            ));
        }
        if resource_type == "Composition" {
            if composition_seen {
                result.error(format!(
                    "{}.resource: a document contains exactly one Composition",
                    path
                ));
            }
            composition_seen = true;
        }

        if let Some(id) = resource.get("id").and_then(Value::as_str) {
            index.relative.insert(format!("{}/{}", resource_type, id));
        }
        index.resource_types.push(resource_type.to_string());

        check_required_fields(resource, resource_type, &path, result);
    }

    index
}

fn check_required_fields(
    resource: &Map<String, Value>,
    resource_type: &str,
    path: &str,
    result: &mut ValidationResult,
) {
    if let Some(fields) = REQUIRED_FIELDS.get(resource_type) {
        for field in *fields {
            if is_missing(resource.get(*field)) {
                result.error(format!(
                    "{}.{}: missing required field for {}",
                    path, field, resource_type
                ));
            }
        }
    }
}

fn is_missing(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => true,
        Some(Value::String(s)) => s.trim().is_empty(),
        Some(Value::Array(a)) => a.is_empty(),
        Some(Value::Object(o)) => o.is_empty(),
        Some(_) => false,
    }
}

/// Walk every `reference` in `value` and check it resolves.
fn check_references(value: &Value, path: &str, index: &EntryIndex, result: &mut ValidationResult) {
    match value {
        Value::Object(map) => {
            if let Some(reference) = map.get("reference").and_then(Value::as_str) {
                check_reference(reference, path, index, result);
            }
            for (key, child) in map {
                if key != "reference" {
                    check_references(child, &format!("{}.{}", path, key), index, result);
                }
            }
        }
        Value::Array(items) => {
            for (idx, item) in items.iter().enumerate() {
                check_references(item, &format!("{}[{}]", path, idx), index, result);
            }
        }
        _ => {}
    }
}

fn check_reference(reference: &str, path: &str, index: &EntryIndex, result: &mut ValidationResult) {
    if reference.starts_with('#') || index.full_urls.contains(reference) {
        return;
    }

    if reference.starts_with("urn:uuid:") {
        result.error(format!(
            "{}.reference: broken reference '{}', no entry has this fullUrl",
            path, reference
        ));
    } else if reference.contains("://") || reference.starts_with("urn:") {
        if !is_absolute_uri(reference) {
            result.error(format!(
                "{}.reference: '{}' is not a valid absolute URI",
                path, reference
            ));
        }
    } else if is_relative_reference(reference) {
        if !index.relative.contains(reference) {
            result.error(format!(
                "{}.reference: broken reference '{}', no entry has this resource",
                path, reference
            ));
        }
    } else {
        result.error(format!("{}.reference: malformed reference '{}'", path, reference));
    }
}

pub(crate) fn is_absolute_uri(uri: &str) -> bool {
    if uri.chars().any(char::is_whitespace) {
        return false;
    }
    if let Some(rest) = uri.strip_prefix("urn:") {
        return rest.split_once(':').is_some_and(|(nid, nss)| {
            !nid.is_empty() && !nss.is_empty() && nid.chars().all(|c| c.is_ascii_alphanumeric())
        });
    }
    let Some((scheme, rest)) = uri.split_once("://") else {
        return false;
    };
    let scheme_ok = scheme
        .chars()
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic())
        && scheme
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'));
    let host = rest.split(['/', '?', '#']).next().unwrap_or("");
    scheme_ok && !host.is_empty()
}

/// `Type/id`, optionally followed by `/_history/version`.
fn is_relative_reference(reference: &str) -> bool {
    let mut parts = reference.split('/');
    let (Some(resource_type), Some(id)) = (parts.next(), parts.next()) else {
        return false;
    };
    let type_ok = resource_type
        .chars()
        .next()
        .is_some_and(|c| c.is_ascii_uppercase())
        && resource_type.chars().all(|c| c.is_ascii_alphabetic());
    let id_ok = !id.is_empty()
        && id.len() <= 64
        && id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '.'));
    let rest: Vec<_> = parts.collect();
    type_ok && id_ok && (rest.is_empty() || (rest.len() == 2 && rest[0] == "_history"))
}

fn check_participants(index: &EntryIndex, result: &mut ValidationResult) {
    let has = |types: &[&str]| index.resource_types.iter().any(|t| types.contains(&t.as_str()));

    if !has(&["Patient"]) {
        result.warning("Bundle.entry: no Patient entry");
    }
    if !has(&["Practitioner", "PractitionerRole"]) {
        result.warning("Bundle.entry: no Practitioner entry");
    }
    if !has(&["Organization"]) {
        result.warning("Bundle.entry: no Organization entry");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::profile;
    use serde_json::json;

    fn minimal_bundle() -> Value {
        json!({
            "resourceType": "Bundle",
            "meta": {"profile": [profile::REFERRAL_BUNDLE]},
            "identifier": {"system": "urn:x", "value": "1"},
            "type": "document",
            "timestamp": "2024-03-12T10:00:00+09:00",
            "entry": [
                {
                    "fullUrl": "urn:uuid:c-1",
                    "resource": {
                        "resourceType": "Composition",
                        "id": "c-1",
                        "status": "final",
                        "type": {"text": "診療情報提供書"},
                        "subject": {"reference": "urn:uuid:p-1"},
                        "date": "2024-03-12T10:00:00+09:00",
                        "author": [{"reference": "urn:uuid:d-1"}, {"reference": "urn:uuid:o-1"}],
                        "title": "診療情報提供書",
                        "section": [{"title": "x", "entry": [{"reference": "Patient/p-1"}]}]
                    }
                },
                {
                    "fullUrl": "urn:uuid:p-1",
                    "resource": {
                        "resourceType": "Patient",
                        "id": "p-1",
                        "identifier": [{"system": "urn:oid:1.2", "value": "P001"}]
                    }
                },
                {
                    "fullUrl": "urn:uuid:d-1",
                    "resource": {"resourceType": "Practitioner", "id": "d-1"}
                },
                {
                    "fullUrl": "urn:uuid:o-1",
                    "resource": {
                        "resourceType": "Organization",
                        "id": "o-1",
                        "identifier": [{"system": "urn:oid:1.2", "value": "1311234567"}]
                    }
                }
            ]
        })
    }

    fn check(bundle: &Value) -> ValidationResult {
        validate_bundle_json(bundle, &PipelineConfig::default())
    }

    #[test]
    fn test_minimal_bundle_is_valid() {
        let result = check(&minimal_bundle());
        assert!(result.is_valid(), "{:?}", result.errors());
        assert!(result.warnings().is_empty(), "{:?}", result.warnings());
    }

    #[test]
    fn test_not_a_bundle() {
        let result = check(&json!({"resourceType": "Patient"}));
        assert_eq!(result.errors().len(), 1);
    }

    #[test]
    fn test_wrong_type_and_profile() {
        let mut bundle = minimal_bundle();
        bundle["type"] = json!("collection");
        bundle["meta"]["profile"] = json!(["http://example.org/other"]);
        let result = check(&bundle);
        assert_eq!(result.errors().len(), 2, "{:?}", result.errors());
        assert!(result.errors()[0].starts_with("Bundle.type:"));
        assert!(result.errors()[1].starts_with("Bundle.meta.profile:"));
    }

    #[test]
    fn test_broken_reference_detected() {
        let mut bundle = minimal_bundle();
        bundle["entry"][0]["resource"]["subject"]["reference"] = json!("urn:uuid:missing");
        let result = check(&bundle);
        assert_eq!(result.errors().len(), 1);
        assert!(result.errors()[0].contains("broken reference"));
        assert!(
            result.errors()[0].starts_with("Bundle.entry[0].resource.subject.reference:")
        );
    }

    #[test]
    fn test_broken_relative_reference() {
        let mut bundle = minimal_bundle();
        bundle["entry"][0]["resource"]["section"][0]["entry"][0]["reference"] =
            json!("Patient/p-2");
        let result = check(&bundle);
        assert_eq!(result.errors().len(), 1);
        assert!(result.errors()[0].contains("section[0].entry[0]"));
    }

    #[test]
    fn test_external_and_contained_references() {
        let mut bundle = minimal_bundle();
        bundle["entry"][0]["resource"]["custodian"] =
            json!({"reference": "https://fhir.example.jp/Organization/9"});
        bundle["entry"][0]["resource"]["encounter"] = json!({"reference": "#enc"});
        assert!(check(&bundle).is_valid());

        bundle["entry"][0]["resource"]["custodian"] = json!({"reference": "https:// bad host"});
        let result = check(&bundle);
        assert_eq!(result.errors().len(), 1);
        assert!(result.errors()[0].contains("absolute URI"));
    }

    #[test]
    fn test_composition_must_be_first_and_unique() {
        let mut bundle = minimal_bundle();
        let entries = bundle["entry"].as_array_mut().unwrap();
        let composition = entries.remove(0);
        entries.push(composition);
        let result = check(&bundle);
        assert_eq!(result.errors().len(), 1, "{:?}", result.errors());
        assert!(result.errors()[0].contains("first entry"));

        let mut bundle = minimal_bundle();
        let mut second = bundle["entry"][0].clone();
        second["fullUrl"] = json!("urn:uuid:c-2");
        second["resource"]["id"] = json!("c-2");
        bundle["entry"].as_array_mut().unwrap().push(second);
        let result = check(&bundle);
        assert_eq!(result.errors().len(), 1, "{:?}", result.errors());
        assert!(result.errors()[0].contains("exactly one Composition"));
    }

    #[test]
    fn test_second_composition_flagged_when_not_first() {
        let mut bundle = minimal_bundle();
        let entries = bundle["entry"].as_array_mut().unwrap();
        let composition = entries.remove(0);
        let mut second = composition.clone();
        second["fullUrl"] = json!("urn:uuid:c-2");
        second["resource"]["id"] = json!("c-2");
        entries.insert(1, composition);
        entries.insert(2, second);

        let result = check(&bundle);
        assert_eq!(result.errors().len(), 2, "{:?}", result.errors());
        assert!(result.errors()[0].starts_with("Bundle.entry[0].resource"));
        assert!(result.errors()[0].contains("first entry"));
        assert!(result.errors()[1].starts_with("Bundle.entry[2].resource"));
        assert!(result.errors()[1].contains("exactly one Composition"));
    }

    #[test]
    fn test_duplicate_and_missing_full_url() {
        let mut bundle = minimal_bundle();
        bundle["entry"][2]["fullUrl"] = json!("urn:uuid:p-1");
        let result = check(&bundle);
        assert!(result.errors().iter().any(|e| e.contains("duplicate fullUrl")));

        let mut bundle = minimal_bundle();
        bundle["entry"][3].as_object_mut().unwrap().remove("fullUrl");
        let result = check(&bundle);
        assert!(result.errors().iter().any(|e| e == "Bundle.entry[3].fullUrl: missing"));
    }

    #[test]
    fn test_required_fields() {
        let mut bundle = minimal_bundle();
        bundle["entry"].as_array_mut().unwrap().push(json!({
            "fullUrl": "urn:uuid:obs-1",
            "resource": {
                "resourceType": "Observation",
                "id": "obs-1",
                "subject": {"reference": "urn:uuid:p-1"}
            }
        }));
        let result = check(&bundle);
        assert_eq!(result.errors().len(), 2, "{:?}", result.errors());
        assert!(result.errors()[0].ends_with("missing required field for Observation"));
    }

    #[test]
    fn test_missing_participants_are_warnings() {
        let mut bundle = minimal_bundle();
        bundle["entry"].as_array_mut().unwrap().truncate(2);
        bundle["entry"][0]["resource"]["author"] = json!([{"reference": "urn:uuid:p-1"}]);
        let result = check(&bundle);
        assert!(result.is_valid(), "{:?}", result.errors());
        assert_eq!(result.warnings().len(), 2);
    }

    #[test]
    fn test_relative_reference_syntax() {
        assert!(is_relative_reference("Patient/123"));
        assert!(is_relative_reference("Patient/123/_history/2"));
        assert!(!is_relative_reference("patient/123"));
        assert!(!is_relative_reference("Patient"));
        assert!(!is_relative_reference("Patient/"));
        assert!(is_absolute_uri("urn:oid:1.2.392"));
        assert!(!is_absolute_uri("urn:"));
    }
}
