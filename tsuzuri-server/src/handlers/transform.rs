use axum::{
    extract::{Request, State},
    http::StatusCode,
    response::Response,
};
use std::sync::Arc;
use tsuzuri_core::{InputRecord, TransformError, operation_outcome::IssueType};

use super::{ApiError, fhir_response, outcome_error, read_body};
use crate::AppState;

/// $transform operation (POST /$transform)
///
/// 200 with the document Bundle, 422 with an OperationOutcome listing every
/// rule violation, 400 when the body is not a valid input record.
pub async fn transform(
    State(state): State<Arc<AppState>>,
    request: Request,
) -> Result<Response, ApiError> {
    let bytes = read_body(request).await?;
    let input: InputRecord = serde_json::from_slice(&bytes)
        .map_err(|e| outcome_error(StatusCode::BAD_REQUEST, IssueType::Structure, e))?;

    match state.transformer.transform(&input) {
        Ok(outcome) => {
            if !outcome.warnings.is_empty() {
                tracing::debug!(
                    warnings = outcome.warnings.len(),
                    "Transform finished with warnings"
                );
            }
            Ok(fhir_response(StatusCode::OK, &outcome.bundle))
        }
        Err(e @ TransformError::Rejected(_)) => Ok(fhir_response(
            StatusCode::UNPROCESSABLE_ENTITY,
            &e.to_operation_outcome(),
        )),
        Err(e) => {
            tracing::error!("Transform failed: {}", e);
            Ok(fhir_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                &e.to_operation_outcome(),
            ))
        }
    }
}
