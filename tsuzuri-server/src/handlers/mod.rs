pub mod metadata;
pub mod transform;
pub mod validate;
pub mod wareki;

use axum::{
    body::Bytes,
    extract::Request,
    http::{HeaderValue, StatusCode, header},
    response::{IntoResponse, Json, Response},
};
use http_body_util::BodyExt;
use serde::Serialize;
use serde_json::{Value, json};
use tsuzuri_core::{OperationOutcome, operation_outcome::IssueType};

const FHIR_JSON: &str = "application/fhir+json; charset=utf-8";

/// Handler error: a status code with an OperationOutcome body.
pub type ApiError = (StatusCode, Json<Value>);

/// Serialize `body` as `application/fhir+json`.
pub fn fhir_response(status: StatusCode, body: &impl Serialize) -> Response {
    let value = match serde_json::to_value(body) {
        Ok(value) => value,
        Err(e) => {
            return outcome_error(StatusCode::INTERNAL_SERVER_ERROR, IssueType::Exception, e)
                .into_response();
        }
    };
    let mut response = (status, Json(value)).into_response();
    response
        .headers_mut()
        .insert(header::CONTENT_TYPE, HeaderValue::from_static(FHIR_JSON));
    response
}

/// A single-issue OperationOutcome error response.
pub fn outcome_error(status: StatusCode, code: IssueType, message: impl ToString) -> ApiError {
    (
        status,
        Json(json!(OperationOutcome::error(code, message.to_string()))),
    )
}

/// Collect the request body.
pub async fn read_body(request: Request) -> Result<Bytes, ApiError> {
    Ok(request
        .into_body()
        .collect()
        .await
        .map_err(|e| outcome_error(StatusCode::BAD_REQUEST, IssueType::Invalid, e))?
        .to_bytes())
}
