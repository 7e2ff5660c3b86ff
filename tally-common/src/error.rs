//! Common error types for the rating ledger

use thiserror::Error;

/// Common result type for ledger operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error taxonomy shared by the ledger core and its adapters
#[derive(Error, Debug)]
pub enum Error {
    /// Score outside the accepted 1..=10 range; the request is rejected without mutation
    #[error("Invalid score: {0} (must be an integer from 1 to 10)")]
    InvalidScore(i64),

    /// Referenced episode does not exist in the ledger
    #[error("Unknown episode: {0}")]
    UnknownEpisode(String),

    /// An episode with this id was already created; ids are never reused
    #[error("Episode already exists: {0}")]
    DuplicateEpisode(String),

    /// Durable state could not be parsed; startup must halt rather than
    /// continue with an empty ledger that would overwrite real history
    #[error("Corrupt ledger state: {0}")]
    CorruptState(String),

    /// Durable write failed after an in-memory mutation
    #[error("Persistence error: {0}")]
    Persistence(String),

    /// Configuration loading or validation error
    #[error("Configuration error: {0}")]
    Config(String),
}
