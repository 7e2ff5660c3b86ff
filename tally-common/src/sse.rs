//! Server-Sent Events (SSE) utilities
//!
//! Turns a ledger event subscription into an SSE response.

use axum::response::sse::{Event, KeepAlive, Sse};
use futures::stream::Stream;
use std::convert::Infallible;
use std::time::Duration;
use tokio::sync::broadcast::{self, error::RecvError};
use tracing::{info, warn};

use crate::events::LedgerEvent;

/// SSE stream of ledger events with a 15 second heartbeat
///
/// The first frame is a `ConnectionStatus` event so clients can show a
/// connected state before any ledger activity happens.
///
/// # Example
/// ```rust,ignore
/// pub async fn event_stream(
///     State(state): State<AppState>,
/// ) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
///     tally_common::sse::ledger_event_stream("tally-bot", state.ledger.subscribe())
/// }
/// ```
pub fn ledger_event_stream(
    service_name: &'static str,
    mut rx: broadcast::Receiver<LedgerEvent>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    info!("New SSE client connected to {} ledger events", service_name);

    let stream = async_stream::stream! {
        yield Ok(Event::default()
            .event("ConnectionStatus")
            .data("connected"));

        loop {
            match rx.recv().await {
                Ok(event) => match serde_json::to_string(&event) {
                    Ok(json) => {
                        yield Ok(Event::default().event(event.event_type()).data(json));
                    }
                    Err(e) => warn!("SSE: failed to serialize {}: {}", event.event_type(), e),
                },
                Err(RecvError::Lagged(skipped)) => {
                    warn!("SSE: {} client lagged, skipped {} events", service_name, skipped);
                }
                Err(RecvError::Closed) => {
                    info!("SSE: {} event stream closed", service_name);
                    break;
                }
            }
        }
    };

    Sse::new(stream).keep_alive(
        KeepAlive::new()
            .interval(Duration::from_secs(15))
            .text("heartbeat"),
    )
}
