use serde::ser::{SerializeMap, Serializer};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::constants::{code_system, extension};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Coding {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub system: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display: Option<String>,
}

impl Coding {
    pub fn new(
        system: impl Into<String>,
        code: impl Into<String>,
        display: Option<String>,
    ) -> Self {
        Self {
            system: Some(system.into()),
            code: Some(code.into()),
            display,
        }
    }
}

/// A clinical concept: one or more codings plus optional free text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct CodeableConcept {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub coding: Vec<Coding>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
}

impl CodeableConcept {
    pub fn from_coding(coding: Coding) -> Self {
        Self {
            coding: vec![coding],
            text: None,
        }
    }

    pub fn text_only(text: impl Into<String>) -> Self {
        Self {
            coding: Vec::new(),
            text: Some(text.into()),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.coding.is_empty() && self.text.as_deref().is_none_or(str::is_empty)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Identifier {
    pub system: String,
    pub value: String,
}

impl Identifier {
    pub fn new(system: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            system: system.into(),
            value: value.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Extension {
    pub url: String,
    #[serde(rename = "valueCode")]
    pub value_code: String,
}

/// How a Japanese name is written.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NameRepresentation {
    /// Kanji (ideographic)
    Ideographic,
    /// Katakana reading (syllabic)
    Syllabic,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Default)]
pub struct HumanName {
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub extension: Vec<Extension>,
    #[serde(rename = "use")]
    pub name_use: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub family: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub given: Vec<String>,
}

impl HumanName {
    pub fn official(
        family: Option<&str>,
        given: Option<&str>,
        representation: NameRepresentation,
    ) -> Self {
        let value_code = match representation {
            NameRepresentation::Ideographic => "IDE",
            NameRepresentation::Syllabic => "SYL",
        };
        let text = match (family, given) {
            (Some(f), Some(g)) => Some(format!("{} {}", f, g)),
            (Some(f), None) => Some(f.to_string()),
            (None, Some(g)) => Some(g.to_string()),
            (None, None) => None,
        };
        Self {
            extension: vec![Extension {
                url: extension::NAME_REPRESENTATION.to_string(),
                value_code: value_code.to_string(),
            }],
            name_use: "official".to_string(),
            text,
            family: family.map(str::to_string),
            given: given.map(|g| vec![g.to_string()]).unwrap_or_default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ContactPoint {
    pub system: String,
    pub value: String,
    #[serde(rename = "use", skip_serializing_if = "Option::is_none")]
    pub contact_use: Option<String>,
}

impl ContactPoint {
    pub fn phone(value: impl Into<String>, contact_use: Option<&str>) -> Self {
        Self {
            system: "phone".to_string(),
            value: value.into(),
            contact_use: contact_use.map(str::to_string),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Address {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub postal_code: Option<String>,
    pub country: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Quantity {
    pub value: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub system: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
}

impl Quantity {
    /// A UCUM quantity; the unit doubles as the UCUM code.
    pub fn ucum(value: f64, unit: Option<String>) -> Self {
        Self {
            value,
            system: unit.as_ref().map(|_| code_system::UCUM.to_string()),
            code: unit.clone(),
            unit,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Default)]
pub struct Period {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Narrative {
    pub status: String,
    pub div: String,
}

impl Narrative {
    pub fn generated(text: &str) -> Self {
        Self {
            status: "generated".to_string(),
            div: crate::text::xhtml_div(text),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Annotation {
    pub text: String,
}

/// Kinds of resources a document can contain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ResourceType {
    Composition,
    Patient,
    Practitioner,
    Organization,
    Encounter,
    Condition,
    Observation,
    MedicationRequest,
    AllergyIntolerance,
    Procedure,
    ServiceRequest,
}

impl ResourceType {
    pub const fn as_str(self) -> &'static str {
        match self {
            ResourceType::Composition => "Composition",
            ResourceType::Patient => "Patient",
            ResourceType::Practitioner => "Practitioner",
            ResourceType::Organization => "Organization",
            ResourceType::Encounter => "Encounter",
            ResourceType::Condition => "Condition",
            ResourceType::Observation => "Observation",
            ResourceType::MedicationRequest => "MedicationRequest",
            ResourceType::AllergyIntolerance => "AllergyIntolerance",
            ResourceType::Procedure => "Procedure",
            ResourceType::ServiceRequest => "ServiceRequest",
        }
    }
}

impl fmt::Display for ResourceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Where a reference points.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ReferenceTarget {
    /// Another entry of the same document, addressed by its resource id.
    Local {
        resource_type: ResourceType,
        id: String,
    },
    /// An absolute URI outside the document.
    External(String),
}

/// A typed pointer from one resource to another.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reference {
    pub target: ReferenceTarget,
    pub display: Option<String>,
}

impl Reference {
    pub fn local(resource_type: ResourceType, id: impl Into<String>) -> Self {
        Self {
            target: ReferenceTarget::Local {
                resource_type,
                id: id.into(),
            },
            display: None,
        }
    }

    pub fn external(uri: impl Into<String>) -> Self {
        Self {
            target: ReferenceTarget::External(uri.into()),
            display: None,
        }
    }

    pub fn with_display(mut self, display: Option<String>) -> Self {
        self.display = display;
        self
    }

    /// The `reference` string as written on the wire.
    pub fn reference_string(&self) -> String {
        match &self.target {
            ReferenceTarget::Local { id, .. } => full_url_for(id),
            ReferenceTarget::External(uri) => uri.clone(),
        }
    }

    pub fn is_local(&self) -> bool {
        matches!(self.target, ReferenceTarget::Local { .. })
    }
}

impl Serialize for Reference {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(None)?;
        map.serialize_entry("reference", &self.reference_string())?;
        if let ReferenceTarget::Local { resource_type, .. } = &self.target {
            map.serialize_entry("type", resource_type.as_str())?;
        }
        if let Some(display) = &self.display {
            map.serialize_entry("display", display)?;
        }
        map.end()
    }
}

/// Bundle fullUrl of the entry holding the resource with `id`.
pub fn full_url_for(id: &str) -> String {
    format!("urn:uuid:{}", id)
}
