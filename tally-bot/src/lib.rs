//! tally-bot library - intake and presentation adapters around the rating ledger
//!
//! Posts arriving in the intake channel become episodes; control presses
//! become scores; result requests are rendered as text.

use std::sync::Arc;

use axum::Router;
use tally_common::config::PlatformId;
use tally_common::LedgerService;
use tower_http::trace::TraceLayer;

pub mod api;
pub mod render;

/// Application state shared across HTTP handlers
#[derive(Clone)]
pub struct AppState {
    /// Sole owner of the ledger
    pub ledger: Arc<LedgerService>,
    /// Only posts in this channel create episodes
    pub intake_channel: PlatformId,
}

impl AppState {
    /// Create new application state
    pub fn new(ledger: Arc<LedgerService>, intake_channel: PlatformId) -> Self {
        Self {
            ledger,
            intake_channel,
        }
    }
}

/// Build application router
pub fn build_router(state: AppState) -> Router {
    use axum::routing::{get, post};

    let ledger_routes = Router::new()
        .route("/api/intake/posts", post(api::receive_post))
        .route("/api/interactions", post(api::handle_interaction))
        .route("/api/episodes/:episode_id/scores", post(api::submit_score))
        .route("/api/episodes/:episode_id/summary", get(api::episode_summary))
        .route("/api/summaries", get(api::all_summaries))
        .route("/api/summaries/by-ordinal/:ordinal", get(api::summary_by_ordinal))
        .route("/api/overview", get(api::overview))
        .route("/api/results", get(api::results_text))
        .route("/api/events", get(api::event_stream));

    Router::new()
        .merge(ledger_routes)
        .merge(api::health_routes())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
