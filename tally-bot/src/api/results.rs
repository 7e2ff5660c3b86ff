//! Result views: JSON summaries and the text `results` command

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Deserialize;
use tally_common::ledger::{EpisodeSummary, LedgerOverview};
use tally_common::Error;

use super::ApiError;
use crate::render;
use crate::AppState;

/// GET /api/episodes/:episode_id/summary
pub async fn episode_summary(
    State(state): State<AppState>,
    Path(episode_id): Path<String>,
) -> Result<Json<EpisodeSummary>, ApiError> {
    state
        .ledger
        .summarize(&episode_id)
        .await
        .map(Json)
        .ok_or_else(|| Error::UnknownEpisode(episode_id).into())
}

/// GET /api/summaries
///
/// Every episode in creation order; unrated episodes carry `"state": "no_data"`.
pub async fn all_summaries(State(state): State<AppState>) -> Json<Vec<EpisodeSummary>> {
    Json(state.ledger.summarize_all().await)
}

/// GET /api/summaries/by-ordinal/:ordinal
pub async fn summary_by_ordinal(
    State(state): State<AppState>,
    Path(ordinal): Path<u32>,
) -> Result<Json<EpisodeSummary>, ApiError> {
    state
        .ledger
        .find_by_ordinal(ordinal)
        .await
        .map(Json)
        .ok_or_else(|| Error::UnknownEpisode(format!("episode {}", ordinal)).into())
}

/// GET /api/overview
pub async fn overview(State(state): State<AppState>) -> Json<LedgerOverview> {
    Json(state.ledger.overview().await)
}

#[derive(Debug, Deserialize)]
pub struct ResultsQuery {
    /// Episode ordinal; all episodes when absent
    pub episode: Option<u32>,
}

/// GET /api/results[?episode=n]
///
/// Text rendering of the chat `results` command.
pub async fn results_text(
    State(state): State<AppState>,
    Query(query): Query<ResultsQuery>,
) -> Response {
    match query.episode {
        None => render::all_results(&state.ledger.summarize_all().await).into_response(),
        Some(ordinal) => {
            let summary = state.ledger.find_by_ordinal(ordinal).await;
            let status = if summary.is_some() {
                StatusCode::OK
            } else {
                StatusCode::NOT_FOUND
            };
            (status, render::ordinal_results(ordinal, summary.as_ref())).into_response()
        }
    }
}
