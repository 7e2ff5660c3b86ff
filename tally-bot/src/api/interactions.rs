//! Presentation adapter for control presses
//!
//! Every press is answered with a private (ephemeral) message.

use axum::{
    extract::State,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use tally_common::Error;
use tracing::debug;

use super::{ApiError, JsonBody};
use crate::render::{self, Control};
use crate::AppState;

#[derive(Debug, Clone, Deserialize)]
pub struct Interaction {
    /// Custom id of the pressed button
    pub custom_id: String,
    /// Opaque identity of the rater pressing it
    pub user_id: String,
}

#[derive(Debug, Serialize)]
pub struct InteractionReply {
    pub content: String,
    pub ephemeral: bool,
}

impl InteractionReply {
    fn private(content: String) -> Self {
        Self {
            content,
            ephemeral: true,
        }
    }
}

/// POST /api/interactions
pub async fn handle_interaction(
    State(state): State<AppState>,
    JsonBody(interaction): JsonBody<Interaction>,
) -> Result<Response, ApiError> {
    let Some(control) = Control::parse(&interaction.custom_id) else {
        debug!("Unrecognized control id {:?}", interaction.custom_id);
        return Err(ApiError::BadRequest(format!(
            "Unknown control: {}",
            interaction.custom_id
        )));
    };

    let content = match control {
        Control::Rate { episode_id, score } => {
            match state
                .ledger
                .record_score(&episode_id, &interaction.user_id, score)
                .await
            {
                Ok(result) => render::score_confirmation(&result),
                Err(Error::UnknownEpisode(_)) => "⚠️ This episode no longer exists.".to_string(),
                Err(e) => return Err(e.into()),
            }
        }
        Control::Results { episode_id } => match state.ledger.summarize(&episode_id).await {
            Some(summary) => render::episode_results(&summary),
            None => "⚠️ This episode no longer exists.".to_string(),
        },
        Control::AllResults => render::all_results(&state.ledger.summarize_all().await),
    };

    Ok(Json(InteractionReply::private(content)).into_response())
}
