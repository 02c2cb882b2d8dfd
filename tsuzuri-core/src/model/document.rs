use serde::Serialize;

use super::datatypes::{Identifier, full_url_for};
use super::resource::{ClinicalResource, Composition, Meta};

/// A FHIR document Bundle: the Composition first, then everything it references.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "resourceType", rename = "Bundle")]
pub struct Bundle {
    pub id: String,
    pub meta: Meta,
    pub identifier: Identifier,
    #[serde(rename = "type")]
    pub bundle_type: String,
    pub timestamp: String,
    pub entry: Vec<BundleEntry>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BundleEntry {
    pub full_url: String,
    pub resource: ClinicalResource,
}

impl BundleEntry {
    pub fn new(resource: ClinicalResource) -> Self {
        Self {
            full_url: full_url_for(resource.id()),
            resource,
        }
    }
}

impl Bundle {
    pub fn composition(&self) -> Option<&Composition> {
        match self.entry.first().map(|e| &e.resource) {
            Some(ClinicalResource::Composition(c)) => Some(c),
            _ => None,
        }
    }

    /// Entries other than the Composition.
    pub fn resources(&self) -> impl Iterator<Item = &ClinicalResource> {
        self.entry
            .iter()
            .map(|e| &e.resource)
            .filter(|r| !matches!(r, ClinicalResource::Composition(_)))
    }

    pub fn to_value(&self) -> Result<serde_json::Value, serde_json::Error> {
        serde_json::to_value(self)
    }
}
