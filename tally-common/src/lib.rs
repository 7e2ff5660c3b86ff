//! # Tally Common Library
//!
//! Core of the episode rating bot, shared by every front end:
//! - Rating ledger (store, sequencer, recorder, aggregator)
//! - Ledger service owning the single-writer critical section
//! - Ledger events (LedgerEvent enum) and the EventBus
//! - Configuration loading
//! - SSE helpers

pub mod config;
pub mod error;
pub mod events;
pub mod ledger;
pub mod service;
pub mod sse;

pub use error::{Error, Result};
pub use ledger::{Ledger, Score};
pub use service::LedgerService;
