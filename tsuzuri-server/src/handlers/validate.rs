use axum::{
    extract::{Request, State},
    http::StatusCode,
    response::Response,
};
use serde_json::Value;
use std::sync::Arc;
use tsuzuri_core::operation_outcome::IssueType;

use super::{ApiError, fhir_response, outcome_error, read_body};
use crate::AppState;

/// $validate operation (POST /Bundle/$validate)
///
/// Always returns 200 OK with an OperationOutcome.
/// Success: severity=information, Failure: severity=error.
pub async fn validate(
    State(state): State<Arc<AppState>>,
    request: Request,
) -> Result<Response, ApiError> {
    let bytes = read_body(request).await?;
    let value: Value = serde_json::from_slice(&bytes)
        .map_err(|e| outcome_error(StatusCode::BAD_REQUEST, IssueType::Invalid, e))?;

    // If wrapped in Parameters, extract the resource parameter
    let bundle = if value.get("resourceType").and_then(Value::as_str) == Some("Parameters") {
        extract_resource_from_parameters(&value).unwrap_or(value)
    } else {
        value
    };

    let result = state.transformer.validate(&bundle);
    tracing::debug!(
        valid = result.is_valid(),
        errors = result.errors().len(),
        warnings = result.warnings().len(),
        "Bundle validated"
    );

    Ok(fhir_response(StatusCode::OK, &result.to_operation_outcome()))
}

/// Extract a resource from a FHIR Parameters wrapper.
/// Looks for parameter with name "resource".
fn extract_resource_from_parameters(params: &Value) -> Option<Value> {
    params
        .get("parameter")
        .and_then(Value::as_array)
        .and_then(|arr| {
            arr.iter()
                .find(|p| p.get("name").and_then(Value::as_str) == Some("resource"))
        })
        .and_then(|p| p.get("resource"))
        .cloned()
}
