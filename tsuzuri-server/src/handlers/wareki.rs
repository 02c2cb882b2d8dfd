use axum::{
    extract::Query,
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use serde::Deserialize;
use serde_json::json;
use tsuzuri_core::era::{gregorian_to_era, parse_date};
use tsuzuri_core::operation_outcome::IssueType;

use super::{ApiError, outcome_error};

#[derive(Debug, Deserialize)]
pub struct WarekiQuery {
    pub date: Option<String>,
}

/// Era conversion (GET /$wareki?date=...)
///
/// Accepts either notation and answers with both.
pub async fn wareki(Query(query): Query<WarekiQuery>) -> Result<Response, ApiError> {
    let input = query
        .date
        .filter(|d| !d.trim().is_empty())
        .ok_or_else(|| {
            outcome_error(
                StatusCode::BAD_REQUEST,
                IssueType::Required,
                "Query parameter 'date' is required",
            )
        })?;

    let gregorian = parse_date(&input)
        .map_err(|e| outcome_error(StatusCode::BAD_REQUEST, IssueType::Value, e))?;
    let era_date = gregorian_to_era(gregorian)
        .map_err(|e| outcome_error(StatusCode::BAD_REQUEST, IssueType::Value, e))?;

    Ok(Json(json!({
        "input": input,
        "gregorian": gregorian.to_string(),
        "era": {
            "name": era_date.era.kanji(),
            "romaji": era_date.era.romaji(),
            "symbol": era_date.era.symbol().to_string(),
            "year": era_date.year,
            "month": era_date.month,
            "day": era_date.day
        },
        "kanji": era_date.to_kanji(),
        "abbreviated": era_date.to_abbreviated()
    }))
    .into_response())
}
