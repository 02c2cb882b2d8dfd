use axum::{
    extract::State,
    response::{IntoResponse, Json},
};
use serde_json::{Value, json};
use std::sync::Arc;
use tsuzuri_core::DocumentKind;
use tsuzuri_core::constants::FHIR_VERSION;

use crate::AppState;

/// Health check (GET /health)
pub async fn health_check() -> impl IntoResponse {
    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
        "fhirVersion": FHIR_VERSION
    }))
}

/// Supported document types and operations (GET /metadata)
pub async fn capability_statement(State(state): State<Arc<AppState>>) -> Json<Value> {
    let documents: Vec<Value> = DocumentKind::ALL
        .iter()
        .map(|kind| {
            json!({
                "documentType": kind.as_str(),
                "title": kind.title(),
                "typeCode": kind.type_code(),
                "bundleProfile": kind.bundle_profile(),
                "compositionProfile": kind.composition_profile(),
            })
        })
        .collect();

    Json(json!({
        "resourceType": "CapabilityStatement",
        "status": "active",
        "kind": "instance",
        "fhirVersion": FHIR_VERSION,
        "format": ["json"],
        "software": {
            "name": "tsuzuri",
            "version": env!("CARGO_PKG_VERSION")
        },
        "document": documents,
        "recognizedProfiles": state.transformer.config().recognized_profiles,
        "operation": [
            {"name": "transform", "path": "/$transform"},
            {"name": "validate", "path": "/Bundle/$validate"},
            {"name": "wareki", "path": "/$wareki"}
        ]
    }))
}
