//! Server-Sent Events for ledger activity

use crate::AppState;
use axum::{
    extract::State,
    response::sse::{Event, Sse},
};
use futures::stream::Stream;
use std::convert::Infallible;

/// GET /api/events - SSE event stream
///
/// Streams events:
/// - ConnectionStatus (once, on connect)
/// - EpisodeCreated
/// - ScoreRecorded
pub async fn event_stream(
    State(state): State<AppState>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    tally_common::sse::ledger_event_stream("tally-bot", state.ledger.subscribe())
}
