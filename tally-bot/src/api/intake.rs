//! Intake adapter
//!
//! Receives posts observed by the platform gateway and turns qualifying
//! ones into episodes. A post qualifies when it was not written by a bot,
//! was posted in the configured intake channel and carries at least one
//! attachment.

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tally_common::config::PlatformId;
use tracing::debug;

use super::{ApiError, JsonBody};
use crate::render::{self, Button};
use crate::AppState;

/// A post seen by the platform gateway
#[derive(Debug, Clone, Deserialize)]
pub struct PostEvent {
    /// Platform message id; becomes the episode id
    pub post_id: PlatformId,
    pub channel_id: PlatformId,
    #[serde(default)]
    pub author_is_bot: bool,
    #[serde(default)]
    pub attachment_count: u32,
}

/// Why a post did not create an episode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Ignored {
    BotAuthor,
    OtherChannel,
    NoAttachments,
}

impl Ignored {
    pub fn reason(&self) -> &'static str {
        match self {
            Ignored::BotAuthor => "author is a bot",
            Ignored::OtherChannel => "not the intake channel",
            Ignored::NoAttachments => "post has no attachments",
        }
    }
}

/// Gate applied before any ledger work
pub fn qualifies(post: &PostEvent, intake_channel: &PlatformId) -> Result<(), Ignored> {
    if post.author_is_bot {
        return Err(Ignored::BotAuthor);
    }
    if !intake_channel.matches(post.channel_id.as_str()) {
        return Err(Ignored::OtherChannel);
    }
    if post.attachment_count == 0 {
        return Err(Ignored::NoAttachments);
    }
    Ok(())
}

/// New episode plus everything needed to post its rating controls
#[derive(Debug, Serialize)]
pub struct EpisodeAnnouncement {
    pub episode_id: String,
    pub title: String,
    pub ordinal: u32,
    pub content: String,
    pub controls: Vec<Button>,
}

/// POST /api/intake/posts
///
/// 201 with the announcement when an episode was created, 202 when the
/// post was ignored.
pub async fn receive_post(
    State(state): State<AppState>,
    JsonBody(post): JsonBody<PostEvent>,
) -> Result<Response, ApiError> {
    if let Err(ignored) = qualifies(&post, &state.intake_channel) {
        debug!("Ignoring post {}: {}", post.post_id.as_str(), ignored.reason());
        return Ok((StatusCode::ACCEPTED, Json(json!({ "ignored": ignored.reason() }))).into_response());
    }

    let created = state.ledger.create_episode(post.post_id.as_str()).await?;

    let announcement = EpisodeAnnouncement {
        content: render::announcement(&created.title),
        controls: render::rating_controls(&created.episode_id),
        episode_id: created.episode_id,
        title: created.title,
        ordinal: created.ordinal,
    };
    Ok((StatusCode::CREATED, Json(announcement)).into_response())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn post(channel: &str, bot: bool, attachments: u32) -> PostEvent {
        PostEvent {
            post_id: PlatformId::new("1"),
            channel_id: PlatformId::new(channel),
            author_is_bot: bot,
            attachment_count: attachments,
        }
    }

    #[test]
    fn test_qualifies() {
        let intake = PlatformId::new("42");

        assert_eq!(qualifies(&post("42", false, 1), &intake), Ok(()));
        assert_eq!(qualifies(&post("42", true, 1), &intake), Err(Ignored::BotAuthor));
        assert_eq!(qualifies(&post("43", false, 1), &intake), Err(Ignored::OtherChannel));
        assert_eq!(qualifies(&post("42", false, 0), &intake), Err(Ignored::NoAttachments));
    }

    #[test]
    fn test_numeric_ids_deserialize() {
        let post: PostEvent = serde_json::from_str(
            r#"{"post_id": 1400000000000000001, "channel_id": "42", "attachment_count": 2}"#,
        )
        .unwrap();

        assert_eq!(post.post_id.as_str(), "1400000000000000001");
        assert!(!post.author_is_bot);
    }
}
