//! Ledger events and the EventBus
//!
//! Events are emitted by the ledger service after a mutation has been
//! persisted, and forwarded to SSE subscribers by the bot front end.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

/// Ledger event types
///
/// Serialized with a `type` tag for SSE transmission.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum LedgerEvent {
    /// A qualifying post produced a new episode
    ///
    /// Triggers:
    /// - Presentation: post the rating controls
    EpisodeCreated {
        episode_id: String,
        title: String,
        ordinal: u32,
        timestamp: DateTime<Utc>,
    },

    /// A rater submitted (or replaced) a score
    ScoreRecorded {
        episode_id: String,
        rater_id: String,
        score: u8,
        /// Score this submission replaced, if the rater had one
        replaced: Option<u8>,
        timestamp: DateTime<Utc>,
    },
}

impl LedgerEvent {
    /// Event name used as the SSE `event:` field
    pub fn event_type(&self) -> &'static str {
        match self {
            LedgerEvent::EpisodeCreated { .. } => "EpisodeCreated",
            LedgerEvent::ScoreRecorded { .. } => "ScoreRecorded",
        }
    }
}

/// Fan-out of ledger events to any number of subscribers
///
/// Backed by `tokio::broadcast`: publishing never blocks, slow subscribers
/// observe `Lagged` instead of holding up the ledger.
#[derive(Clone)]
pub struct EventBus {
    tx: broadcast::Sender<LedgerEvent>,
}

impl EventBus {
    /// Creates a new EventBus with specified channel capacity
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx }
    }

    /// Subscribe to all future events
    pub fn subscribe(&self) -> broadcast::Receiver<LedgerEvent> {
        self.tx.subscribe()
    }

    /// Emit an event, ignoring if no subscribers are listening
    pub fn emit_lossy(&self, event: LedgerEvent) {
        let _ = self.tx.send(event);
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(256)
    }
}
