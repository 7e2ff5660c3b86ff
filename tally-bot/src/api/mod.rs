//! HTTP API handlers for tally-bot

pub mod error;
pub mod health;
pub mod intake;
pub mod interactions;
pub mod results;
pub mod scores;
pub mod sse;

pub use error::{ApiError, JsonBody};
pub use health::health_routes;
pub use intake::receive_post;
pub use interactions::handle_interaction;
pub use results::{all_summaries, episode_summary, overview, results_text, summary_by_ordinal};
pub use scores::submit_score;
pub use sse::event_stream;
