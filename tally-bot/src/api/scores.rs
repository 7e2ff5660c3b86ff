//! Direct score submission

use axum::{
    extract::{Path, State},
    Json,
};
use serde::{Deserialize, Serialize};
use tally_common::ledger::RecordResult;

use super::{ApiError, JsonBody};
use crate::render;
use crate::AppState;

#[derive(Debug, Clone, Deserialize)]
pub struct ScoreRequest {
    pub rater_id: String,
    /// Any JSON number; non-integers are rejected as invalid scores
    pub score: serde_json::Number,
}

#[derive(Debug, Serialize)]
pub struct ScoreResponse {
    #[serde(flatten)]
    pub result: RecordResult,
    /// Confirmation text for the rater
    pub message: String,
}

/// POST /api/episodes/:episode_id/scores
///
/// 400 for a non-integer or out-of-range score, 404 for an unknown episode.
pub async fn submit_score(
    State(state): State<AppState>,
    Path(episode_id): Path<String>,
    JsonBody(request): JsonBody<ScoreRequest>,
) -> Result<Json<ScoreResponse>, ApiError> {
    let score = request.score.as_i64().ok_or_else(|| {
        ApiError::BadRequest(format!(
            "Invalid score: {} (must be an integer from 1 to 10)",
            request.score
        ))
    })?;

    let result = state
        .ledger
        .record_score(&episode_id, &request.rater_id, score)
        .await?;

    Ok(Json(ScoreResponse {
        message: render::score_confirmation(&result),
        result,
    }))
}
